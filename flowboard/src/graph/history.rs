//! Bounded linear undo/redo log
//!
//! Every structural mutation of the store is recorded as one `HistoryEntry`.
//! The cursor points at the last applied entry; recording after an undo
//! discards the redo tail (no branching).

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::edge::Edge;
use super::node::{Node, NodeData, NodeSize};
use super::store::WorkflowSnapshot;

/// Mutable part of a node touched by `update_node_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub data: NodeData,
    pub style: NodeSize,
}

impl From<&Node> for NodeState {
    fn from(node: &Node) -> Self {
        Self {
            data: node.data.clone(),
            style: node.style,
        }
    }
}

/// Edge together with the list position it was removed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedEdge {
    pub index: usize,
    pub edge: Edge,
}

/// One recorded mutation. Payloads carry the forward effect and whatever
/// prior state is needed to reverse it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryAction {
    AddNode {
        node: Node,
    },
    /// Paste or duplicate
    AddNodes {
        nodes: Vec<Node>,
    },
    DeleteNode {
        node: Node,
        index: usize,
        /// Cascaded edges, ascending by index
        edges: Vec<IndexedEdge>,
    },
    UpdateNode {
        id: String,
        before: NodeState,
        after: NodeState,
    },
    AddEdge {
        edge: Edge,
    },
    DeleteEdge {
        edge: Edge,
        index: usize,
    },
    Clear {
        before: WorkflowSnapshot,
        counter_before: u64,
    },
    Load {
        before: WorkflowSnapshot,
        after: WorkflowSnapshot,
        counter_before: u64,
        counter_after: u64,
    },
}

impl HistoryAction {
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryAction::AddNode { .. } => "add_node",
            HistoryAction::AddNodes { .. } => "add_nodes",
            HistoryAction::DeleteNode { .. } => "delete_node",
            HistoryAction::UpdateNode { .. } => "update_node",
            HistoryAction::AddEdge { .. } => "add_edge",
            HistoryAction::DeleteEdge { .. } => "delete_edge",
            HistoryAction::Clear { .. } => "clear",
            HistoryAction::Load { .. } => "load",
        }
    }

    /// Short human readable description
    pub fn describe(&self) -> String {
        match self {
            HistoryAction::AddNode { node } => format!("add node {}", node.id),
            HistoryAction::AddNodes { nodes } => format!("add {} nodes", nodes.len()),
            HistoryAction::DeleteNode { node, edges, .. } => {
                format!("delete node {} ({} edges)", node.id, edges.len())
            }
            HistoryAction::UpdateNode { id, .. } => format!("update node {}", id),
            HistoryAction::AddEdge { edge } => {
                format!("add edge {} ({} -> {})", edge.id, edge.source, edge.target)
            }
            HistoryAction::DeleteEdge { edge, .. } => format!("delete edge {}", edge.id),
            HistoryAction::Clear { before, .. } => {
                format!("clear {} nodes, {} edges", before.nodes.len(), before.edges.len())
            }
            HistoryAction::Load { after, .. } => {
                format!("load {} nodes, {} edges", after.nodes.len(), after.edges.len())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(action: HistoryAction) -> Self {
        Self {
            action,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    /// Number of entries currently applied (cursor + 1)
    applied: usize,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            applied: 0,
            limit: limit.max(1),
        }
    }

    /// Append an entry, discarding the redo tail and evicting the oldest
    /// entries beyond the limit
    pub fn record(&mut self, action: HistoryAction) {
        self.entries.truncate(self.applied);
        self.entries.push_back(HistoryEntry::new(action));

        while self.entries.len() > self.limit {
            if let Some(evicted) = self.entries.pop_front() {
                trace!(kind = evicted.action.kind(), "history entry evicted");
            }
        }

        self.applied = self.entries.len();
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    /// Index of the last applied entry, -1 when nothing is applied
    pub fn cursor(&self) -> isize {
        self.applied as isize - 1
    }

    /// Move the cursor back, returning the entry to revert
    pub fn step_back(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.applied -= 1;
        self.entries.get(self.applied)
    }

    /// Move the cursor forward, returning the entry to re-apply
    pub fn step_forward(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        self.applied += 1;
        self.entries.get(self.applied - 1)
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of undo steps currently available
    pub fn undo_depth(&self) -> usize {
        self.applied
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}

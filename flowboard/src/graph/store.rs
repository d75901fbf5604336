use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{OrphanEdgePolicy, StoreConfig};
use crate::document::WorkflowDocument;
use crate::error::{Result, StoreError};

use super::changes::{EdgeChange, NodeChange};
use super::edge::{generate_edge_id, Connection, Edge};
use super::history::{History, HistoryAction, IndexedEdge, NodeState};
use super::node::{Node, NodePatch, Position, ShapeType};

const INITIAL_COUNTER: u64 = 1;

/// Nodes and edges by value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl WorkflowSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// `max(numeric id suffix) + 1`, or 1 when no id carries a suffix
    pub fn next_counter(&self) -> u64 {
        next_counter(&self.nodes)
    }
}

fn next_counter(nodes: &[Node]) -> u64 {
    nodes
        .iter()
        .filter_map(Node::counter_suffix)
        .max()
        .map_or(INITIAL_COUNTER, |max| max.saturating_add(1))
}

/// Single source of truth for one editing session's graph.
///
/// Every structural mutation goes through this type and is recorded in a
/// bounded undo/redo log. No edge ever references a missing node after a
/// store operation.
pub struct WorkflowStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_counter: u64,
    selected_node_id: Option<String>,
    clipboard: Vec<Node>,
    history: History,
    config: StoreConfig,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_counter: INITIAL_COUNTER,
            selected_node_id: None,
            clipboard: Vec::new(),
            history: History::new(config.history_limit),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == edge_id)
    }

    fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == node_id)
    }

    /// Edges with `node_id` as source or target
    pub fn incident_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.touches(node_id)).collect()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot::new(self.nodes.clone(), self.edges.clone())
    }

    /// Export document stamped with the current time
    pub fn export_document(&self) -> WorkflowDocument {
        WorkflowDocument::from_snapshot(self.snapshot())
    }

    /// Load an export document; see `load_workflow`
    pub fn import_document(&mut self, document: WorkflowDocument) -> Result<()> {
        self.load_workflow(document.into_snapshot())
    }

    /// Counter value the next allocated node id will use
    pub fn node_counter(&self) -> u64 {
        self.node_counter
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn allocate_id(&mut self, shape: &ShapeType) -> String {
        loop {
            let id = format!("{}-{}", shape, self.node_counter);
            // wraps only after u64::MAX; the lookup below keeps ids unique
            self.node_counter = self.node_counter.checked_add(1).unwrap_or(INITIAL_COUNTER);
            if self.node(&id).is_none() {
                return id;
            }
        }
    }

    fn fresh_edge_id(&self) -> String {
        loop {
            let id = generate_edge_id();
            if self.edge(&id).is_none() {
                return id;
            }
        }
    }

    /// Add a node with the shape's default size and style
    pub fn add_node(&mut self, shape: impl Into<ShapeType>, position: Position) -> Node {
        let shape = shape.into();
        let id = self.allocate_id(&shape);
        let node = Node::new(id, shape, position);

        self.nodes.push(node.clone());
        self.history.record(HistoryAction::AddNode { node: node.clone() });
        debug!(node_id = %node.id, "node added");

        node
    }

    /// Remove a node and every edge touching it. Returns `false` when the id
    /// is unknown.
    pub fn delete_node(&mut self, node_id: &str) -> bool {
        let Some(index) = self.nodes.iter().position(|n| n.id == node_id) else {
            warn!(node_id, "delete_node: node not found");
            return false;
        };

        let node = self.nodes.remove(index);
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.edges.len());
        for (index, edge) in std::mem::take(&mut self.edges).into_iter().enumerate() {
            if edge.touches(node_id) {
                removed.push(IndexedEdge { index, edge });
            } else {
                kept.push(edge);
            }
        }
        self.edges = kept;

        if self.selected_node_id.as_deref() == Some(node_id) {
            self.selected_node_id = None;
        }

        debug!(node_id, cascaded = removed.len(), "node deleted");
        self.history.record(HistoryAction::DeleteNode {
            node,
            index,
            edges: removed,
        });

        true
    }

    /// Shallow-merge `patch` into the node's data. Width/height are clamped to
    /// the shape minimum and mirrored into the node style.
    pub fn update_node_data(&mut self, node_id: &str, patch: NodePatch) -> bool {
        let Some(node) = self.node_mut(node_id) else {
            warn!(node_id, "update_node_data: node not found");
            return false;
        };

        let before = NodeState::from(&*node);
        node.apply_patch(&patch);
        let after = NodeState::from(&*node);

        if before == after {
            debug!(node_id, "update_node_data: nothing changed");
            return true;
        }

        self.history.record(HistoryAction::UpdateNode {
            id: node_id.to_string(),
            before,
            after,
        });
        debug!(node_id, "node updated");

        true
    }

    /// Move a node. Positions are presentation state and are not recorded.
    pub fn move_node(&mut self, node_id: &str, position: Position) -> bool {
        match self.node_mut(node_id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => {
                warn!(node_id, "move_node: node not found");
                false
            }
        }
    }

    /// Create an edge for a connection. Requested handles are kept exactly.
    pub fn add_edge(&mut self, connection: Connection) -> Result<Edge> {
        for endpoint in [&connection.source, &connection.target] {
            if self.node(endpoint).is_none() {
                return Err(StoreError::NodeNotFound(endpoint.clone()));
            }
        }

        if self.edges.iter().any(|e| e.matches(&connection)) {
            return Err(StoreError::DuplicateEdge {
                from: connection.source,
                to: connection.target,
            });
        }

        let edge = Edge::from_connection(self.fresh_edge_id(), &connection);
        self.edges.push(edge.clone());
        self.history.record(HistoryAction::AddEdge { edge: edge.clone() });
        debug!(edge_id = %edge.id, source = %edge.source, target = %edge.target, "edge added");

        Ok(edge)
    }

    /// Renderer entry point for connection attempts
    pub fn connect(&mut self, connection: Connection) -> Result<Edge> {
        self.add_edge(connection)
    }

    pub fn delete_edge(&mut self, edge_id: &str) -> bool {
        let Some(index) = self.edges.iter().position(|e| e.id == edge_id) else {
            warn!(edge_id, "delete_edge: edge not found");
            return false;
        };

        let edge = self.edges.remove(index);
        self.history.record(HistoryAction::DeleteEdge { edge, index });
        debug!(edge_id, "edge deleted");

        true
    }

    /// Remove everything and reset the id counter
    pub fn clear_workflow(&mut self) {
        let before = WorkflowSnapshot::new(
            std::mem::take(&mut self.nodes),
            std::mem::take(&mut self.edges),
        );
        let counter_before = self.node_counter;

        self.node_counter = INITIAL_COUNTER;
        self.selected_node_id = None;

        info!(nodes = before.nodes.len(), edges = before.edges.len(), "workflow cleared");
        self.history.record(HistoryAction::Clear {
            before,
            counter_before,
        });
    }

    /// Replace the whole graph. The payload is validated first; on error the
    /// current graph is left untouched.
    pub fn load_workflow(&mut self, snapshot: WorkflowSnapshot) -> Result<()> {
        let after = self.validate_load(snapshot)?;
        let counter_after = after.next_counter();

        let before = WorkflowSnapshot::new(
            std::mem::replace(&mut self.nodes, after.nodes.clone()),
            std::mem::replace(&mut self.edges, after.edges.clone()),
        );
        let counter_before = self.node_counter;

        self.node_counter = counter_after;
        self.selected_node_id = None;

        info!(nodes = after.nodes.len(), edges = after.edges.len(), "workflow loaded");
        self.history.record(HistoryAction::Load {
            before,
            after,
            counter_before,
            counter_after,
        });

        Ok(())
    }

    fn validate_load(&self, mut snapshot: WorkflowSnapshot) -> Result<WorkflowSnapshot> {
        let mut node_ids = HashSet::new();
        for node in &snapshot.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(StoreError::InvalidWorkflow(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
            // the counter must be able to move past every suffix
            if node.counter_suffix() == Some(u64::MAX) {
                return Err(StoreError::InvalidWorkflow(format!(
                    "node id {} exhausts the id counter",
                    node.id
                )));
            }
        }

        let mut edge_ids = HashSet::new();
        for edge in &snapshot.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(StoreError::InvalidWorkflow(format!(
                    "duplicate edge id {}",
                    edge.id
                )));
            }
        }

        let missing_endpoint = |edge: &Edge| -> Option<String> {
            [&edge.source, &edge.target]
                .into_iter()
                .find(|id| !node_ids.contains(id.as_str()))
                .cloned()
        };

        match self.config.orphan_edges {
            OrphanEdgePolicy::Reject => {
                if let Some((edge, node)) = snapshot
                    .edges
                    .iter()
                    .find_map(|e| missing_endpoint(e).map(|node| (e.id.clone(), node)))
                {
                    return Err(StoreError::OrphanEdge { edge, node });
                }
            }
            OrphanEdgePolicy::Drop => {
                let before = snapshot.edges.len();
                snapshot.edges.retain(|e| missing_endpoint(e).is_none());
                let dropped = before - snapshot.edges.len();
                if dropped > 0 {
                    warn!(dropped, "load_workflow: dropped orphan edges");
                }
            }
        }

        Ok(snapshot)
    }

    pub fn selected_node_id(&self) -> Option<&str> {
        self.selected_node_id.as_deref()
    }

    /// Set the active node for the details panel. Unknown ids are ignored.
    pub fn set_selected_node_id(&mut self, node_id: Option<String>) {
        match node_id {
            Some(id) if self.node(&id).is_none() => {
                warn!(node_id = %id, "set_selected_node_id: node not found");
            }
            other => self.selected_node_id = other,
        }
    }

    /// Nodes the renderer currently reports as selected
    pub fn selected_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.selected).collect()
    }

    pub fn set_node_selected(&mut self, node_id: &str, selected: bool) -> bool {
        match self.node_mut(node_id) {
            Some(node) => {
                node.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn clipboard(&self) -> &[Node] {
        &self.clipboard
    }

    /// Copy the selected nodes to the clipboard, returning how many were copied
    pub fn copy_selection(&mut self) -> usize {
        self.clipboard = self.nodes.iter().filter(|n| n.selected).cloned().collect();
        debug!(count = self.clipboard.len(), "selection copied");
        self.clipboard.len()
    }

    /// Insert offset clones of the clipboard nodes with fresh ids
    pub fn paste_clipboard(&mut self) -> Vec<Node> {
        if self.clipboard.is_empty() {
            return vec![];
        }
        let sources = self.clipboard.clone();
        self.insert_clones(sources)
    }

    /// Insert offset clones of the selected nodes with fresh ids
    pub fn duplicate_selection(&mut self) -> Vec<Node> {
        let sources: Vec<Node> = self.nodes.iter().filter(|n| n.selected).cloned().collect();
        if sources.is_empty() {
            return vec![];
        }
        self.insert_clones(sources)
    }

    fn insert_clones(&mut self, sources: Vec<Node>) -> Vec<Node> {
        let offset = self.config.paste_offset;
        let clones: Vec<Node> = sources
            .into_iter()
            .map(|node| Node {
                id: self.allocate_id(&node.shape),
                position: node.position.offset(offset, offset),
                selected: false,
                ..node
            })
            .collect();

        self.nodes.extend(clones.iter().cloned());
        self.history.record(HistoryAction::AddNodes { nodes: clones.clone() });
        debug!(count = clones.len(), "nodes pasted");

        clones
    }

    /// Revert the entry at the cursor. Returns `false` when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.step_back() else {
            debug!("undo: nothing to undo");
            return false;
        };
        let action = entry.action.clone();
        debug!(kind = action.kind(), "undo");

        self.revert(action);
        self.settle_after_replay();
        true
    }

    /// Re-apply the entry after the cursor. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.step_forward() else {
            debug!("redo: nothing to redo");
            return false;
        };
        let action = entry.action.clone();
        debug!(kind = action.kind(), "redo");

        self.reapply(action);
        self.settle_after_replay();
        true
    }

    fn revert(&mut self, action: HistoryAction) {
        match action {
            HistoryAction::AddNode { node } => {
                self.nodes.retain(|n| n.id != node.id);
            }
            HistoryAction::AddNodes { nodes } => {
                let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
                self.nodes.retain(|n| !ids.contains(n.id.as_str()));
            }
            HistoryAction::DeleteNode { node, index, edges } => {
                let index = index.min(self.nodes.len());
                self.nodes.insert(index, node);
                for IndexedEdge { index, edge } in edges {
                    let index = index.min(self.edges.len());
                    self.edges.insert(index, edge);
                }
            }
            HistoryAction::UpdateNode { id, before, .. } => {
                self.restore_node_state(&id, before);
            }
            HistoryAction::AddEdge { edge } => {
                self.edges.retain(|e| e.id != edge.id);
            }
            HistoryAction::DeleteEdge { edge, index } => {
                let index = index.min(self.edges.len());
                self.edges.insert(index, edge);
            }
            HistoryAction::Clear {
                before,
                counter_before,
            }
            | HistoryAction::Load {
                before,
                counter_before,
                ..
            } => {
                self.nodes = before.nodes;
                self.edges = before.edges;
                self.node_counter = counter_before;
            }
        }
    }

    fn reapply(&mut self, action: HistoryAction) {
        match action {
            HistoryAction::AddNode { node } => {
                self.nodes.push(node);
            }
            HistoryAction::AddNodes { nodes } => {
                self.nodes.extend(nodes);
            }
            HistoryAction::DeleteNode { node, edges, .. } => {
                self.nodes.retain(|n| n.id != node.id);
                let ids: HashSet<&str> = edges.iter().map(|e| e.edge.id.as_str()).collect();
                self.edges.retain(|e| !ids.contains(e.id.as_str()));
            }
            HistoryAction::UpdateNode { id, after, .. } => {
                self.restore_node_state(&id, after);
            }
            HistoryAction::AddEdge { edge } => {
                self.edges.push(edge);
            }
            HistoryAction::DeleteEdge { edge, .. } => {
                self.edges.retain(|e| e.id != edge.id);
            }
            HistoryAction::Clear { .. } => {
                self.nodes.clear();
                self.edges.clear();
                self.node_counter = INITIAL_COUNTER;
            }
            HistoryAction::Load {
                after,
                counter_after,
                ..
            } => {
                self.nodes = after.nodes;
                self.edges = after.edges;
                self.node_counter = counter_after;
            }
        }
    }

    fn restore_node_state(&mut self, node_id: &str, state: NodeState) {
        if let Some(node) = self.node_mut(node_id) {
            node.data = state.data;
            node.style = state.style;
        }
    }

    /// Drop a dangling selection and keep the counter ahead of present ids
    fn settle_after_replay(&mut self) {
        if let Some(id) = &self.selected_node_id {
            if !self.nodes.iter().any(|n| &n.id == id) {
                self.selected_node_id = None;
            }
        }
        self.node_counter = self.node_counter.max(next_counter(&self.nodes));
    }

    /// Translate renderer node changes into store operations
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        for change in changes {
            match change {
                NodeChange::Position { id, position, .. } => {
                    self.move_node(id, *position);
                }
                NodeChange::Dimensions { id, width, height } => {
                    self.update_node_data(id, NodePatch::new().size(*width, *height));
                }
                NodeChange::Select { id, selected } => {
                    self.set_node_selected(id, *selected);
                }
                NodeChange::Remove { id } => {
                    self.delete_node(id);
                }
            }
        }
    }

    /// Translate renderer edge changes into store operations
    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        for change in changes {
            match change {
                EdgeChange::Select { id, selected } => {
                    if let Some(edge) = self.edges.iter_mut().find(|e| &e.id == id) {
                        edge.selected = *selected;
                    }
                }
                EdgeChange::Remove { id } => {
                    self.delete_edge(id);
                }
            }
        }
    }
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

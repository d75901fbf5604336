use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};

use super::task::{task_id_for, BoardTask, TaskStatus};
use crate::graph::WorkflowSnapshot;

const EPIC_COLORS: [&str; 5] = ["blue", "green", "purple", "orange", "red"];

/// Group of tasks generated from one connected component of the workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epic {
    pub id: String,
    pub name: String,
    pub description: String,
    pub color: String,
    /// Percentage of done tasks, rounded
    pub progress: u8,
    pub tasks: Vec<String>,
}

/// Node ids grouped by undirected reachability.
///
/// Components come in order of their first node; members keep node order.
/// Edges with an endpoint outside the snapshot are ignored.
pub fn connected_components(snapshot: &WorkflowSnapshot) -> Vec<Vec<String>> {
    let mut graph: UnGraph<&str, ()> = UnGraph::new_undirected();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::new();

    for node in &snapshot.nodes {
        let idx = graph.add_node(node.id.as_str());
        indices.insert(node.id.as_str(), idx);
    }

    for edge in &snapshot.edges {
        if let (Some(&a), Some(&b)) = (
            indices.get(edge.source.as_str()),
            indices.get(edge.target.as_str()),
        ) {
            graph.add_edge(a, b, ());
        }
    }

    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut components = vec![];

    for start in graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }

        let mut members = vec![];
        let mut dfs = Dfs::new(&graph, start);
        while let Some(idx) = dfs.next(&graph) {
            visited.insert(idx);
            members.push(idx);
        }
        // node indices follow insertion order
        members.sort();

        components.push(
            members
                .into_iter()
                .filter_map(|idx| graph.node_weight(idx).map(|id| id.to_string()))
                .collect(),
        );
    }

    components
}

#[derive(Debug, Clone, Default)]
pub struct BoardFilter {
    pub status: Option<TaskStatus>,
    pub search: Option<String>,
    pub epic_id: Option<String>,
}

impl BoardFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_epic(mut self, epic_id: impl Into<String>) -> Self {
        self.epic_id = Some(epic_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardStats {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub review: usize,
    pub done: usize,
    pub blocked: usize,
}

impl BoardStats {
    /// Done tasks as a rounded percentage, 0 for an empty board
    pub fn completion_rate(&self) -> u8 {
        percent(self.done, self.total)
    }
}

fn percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u8
}

/// Serializable board report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub total_tasks: usize,
    pub total_epics: usize,
    pub completion_rate: u8,
    pub nodes: usize,
    pub connections: usize,
    pub epics: Vec<Epic>,
    pub tasks: Vec<BoardTask>,
}

/// Task board derived read-only from a workflow snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskBoard {
    pub epics: Vec<Epic>,
    pub tasks: Vec<BoardTask>,
    nodes: usize,
    connections: usize,
}

impl TaskBoard {
    /// Build epics from connected components and one task per node.
    /// `today` is the creation date; task `i` is due `i + 1` days later.
    pub fn derive(snapshot: &WorkflowSnapshot, today: NaiveDate) -> Self {
        let mut board = Self::default();
        board.refresh(snapshot, today);
        board
    }

    /// Re-derive from a new snapshot, keeping the status of tasks whose node
    /// still exists
    pub fn refresh(&mut self, snapshot: &WorkflowSnapshot, today: NaiveDate) {
        let previous: HashMap<String, TaskStatus> = self
            .tasks
            .iter()
            .map(|t| (t.node_id.clone(), t.status))
            .collect();

        let tasks: Vec<BoardTask> = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let due = today + Duration::days(index as i64 + 1);
                let mut task = BoardTask::from_node(node, today, due);

                task.status = match previous.get(&node.id) {
                    Some(status) => *status,
                    None if index == 0 => TaskStatus::InProgress,
                    None => TaskStatus::Todo,
                };
                task.parent_id = snapshot
                    .edges
                    .iter()
                    .find(|e| e.target == node.id)
                    .map(|e| task_id_for(&e.source));
                task.subtasks = snapshot
                    .edges
                    .iter()
                    .filter(|e| e.source == node.id)
                    .map(|e| task_id_for(&e.target))
                    .collect();
                task
            })
            .collect();

        let epics = connected_components(snapshot)
            .into_iter()
            .enumerate()
            .map(|(index, component)| Epic {
                id: format!("epic-{}", index),
                name: format!("Workflow Epic {}", index + 1),
                description: format!("Epic containing {} related tasks", component.len()),
                color: EPIC_COLORS[index % EPIC_COLORS.len()].to_string(),
                progress: 0,
                tasks: component.iter().map(|id| task_id_for(id)).collect(),
            })
            .collect();

        self.tasks = tasks;
        self.epics = epics;
        self.nodes = snapshot.nodes.len();
        self.connections = snapshot.edges.len();
        self.update_progress();
    }

    pub fn task(&self, task_id: &str) -> Option<&BoardTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn epic(&self, epic_id: &str) -> Option<&Epic> {
        self.epics.iter().find(|e| e.id == epic_id)
    }

    /// Epic containing a task
    pub fn epic_of(&self, task_id: &str) -> Option<&Epic> {
        self.epics.iter().find(|e| e.tasks.iter().any(|t| t == task_id))
    }

    /// Rounded percentage of done tasks in an epic
    pub fn epic_progress(&self, epic_id: &str) -> Option<u8> {
        self.epic(epic_id).map(|e| e.progress)
    }

    /// Returns `false` when the task is unknown
    pub fn set_status(&mut self, task_id: &str, status: TaskStatus) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return false;
        };
        task.status = status;
        self.update_progress();
        true
    }

    fn update_progress(&mut self) {
        let done: HashSet<&str> = self
            .tasks
            .iter()
            .filter(|t| t.is_done())
            .map(|t| t.id.as_str())
            .collect();

        for epic in &mut self.epics {
            let finished = epic.tasks.iter().filter(|t| done.contains(t.as_str())).count();
            epic.progress = percent(finished, epic.tasks.len());
        }
    }

    pub fn filter(&self, filter: &BoardFilter) -> Vec<&BoardTask> {
        let epic = filter.epic_id.as_deref().map(|id| self.epic(id));

        self.tasks
            .iter()
            .filter(|task| filter.status.map_or(true, |s| task.status == s))
            .filter(|task| {
                filter
                    .search
                    .as_deref()
                    .map_or(true, |term| task.matches_search(term))
            })
            .filter(|task| match epic {
                None => true,
                Some(Some(epic)) => epic.tasks.contains(&task.id),
                Some(None) => false,
            })
            .collect()
    }

    pub fn stats(&self) -> BoardStats {
        let count = |status: TaskStatus| self.tasks.iter().filter(|t| t.status == status).count();

        BoardStats {
            total: self.tasks.len(),
            todo: count(TaskStatus::Todo),
            in_progress: count(TaskStatus::InProgress),
            review: count(TaskStatus::Review),
            done: count(TaskStatus::Done),
            blocked: count(TaskStatus::Blocked),
        }
    }

    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            title: "Workflow Documentation".to_string(),
            generated_at: Utc::now(),
            total_tasks: self.tasks.len(),
            total_epics: self.epics.len(),
            completion_rate: self.stats().completion_rate(),
            nodes: self.nodes,
            connections: self.connections,
            epics: self.epics.clone(),
            tasks: self.tasks.clone(),
        }
    }
}

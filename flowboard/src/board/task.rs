use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::graph::{Node, ShapeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
            TaskStatus::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "in-progress" | "in_progress" => Some(TaskStatus::InProgress),
            "review" => Some(TaskStatus::Review),
            "done" => Some(TaskStatus::Done),
            "blocked" => Some(TaskStatus::Blocked),
            _ => None,
        }
    }

    /// Board column marker used by the CLI
    pub fn marker(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "[ ]",
            TaskStatus::InProgress => "[~]",
            TaskStatus::Review => "[?]",
            TaskStatus::Done => "[✓]",
            TaskStatus::Blocked => "[✗]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

/// Priority and story points implied by a node's shape
fn shape_weight(shape: &ShapeType) -> (TaskPriority, u32) {
    match shape {
        ShapeType::Triangle => (TaskPriority::Highest, 8),
        ShapeType::Diamond => (TaskPriority::High, 5),
        ShapeType::Hexagon => (TaskPriority::Medium, 3),
        ShapeType::Rectangle => (TaskPriority::Low, 2),
        ShapeType::Circle | ShapeType::TextNote | ShapeType::Custom(_) => (TaskPriority::Lowest, 1),
    }
}

fn shape_labels(shape: &ShapeType) -> &'static [&'static str] {
    match shape {
        ShapeType::Triangle => &["urgent", "critical"],
        ShapeType::Diamond => &["decision", "review"],
        ShapeType::Hexagon => &["preparation", "setup"],
        ShapeType::Rectangle => &["process", "development"],
        ShapeType::Circle => &["milestone", "endpoint"],
        ShapeType::TextNote | ShapeType::Custom(_) => &["general"],
    }
}

/// A task generated from one workflow node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee: String,
    pub reporter: String,
    pub due_date: NaiveDate,
    pub created_date: NaiveDate,
    pub node_id: String,
    pub node_type: String,
    /// Task of the source of the node's first incoming edge
    pub parent_id: Option<String>,
    /// Tasks of the targets of the node's outgoing edges
    pub subtasks: Vec<String>,
    pub story_points: u32,
    pub labels: Vec<String>,
}

impl BoardTask {
    pub fn from_node(node: &Node, created: NaiveDate, due: NaiveDate) -> Self {
        let (priority, story_points) = shape_weight(&node.shape);
        let title = if node.data.label.is_empty() {
            format!("{} Task", node.shape)
        } else {
            node.data.label.clone()
        };
        let label_text = if node.data.label.is_empty() { "Untitled" } else { node.data.label.as_str() };

        Self {
            id: task_id_for(&node.id),
            title,
            description: format!("Task generated from {} node: {}", node.shape, label_text),
            status: TaskStatus::Todo,
            priority,
            assignee: "Unassigned".to_string(),
            reporter: "System".to_string(),
            due_date: due,
            created_date: created,
            node_id: node.id.clone(),
            node_type: node.shape.to_string(),
            parent_id: None,
            subtasks: vec![],
            story_points,
            labels: shape_labels(&node.shape).iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.status, TaskStatus::Done)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.status, TaskStatus::Blocked)
    }

    pub fn start(&mut self) {
        self.status = TaskStatus::InProgress;
    }

    pub fn complete(&mut self) {
        self.status = TaskStatus::Done;
    }

    /// Case-insensitive match against title and description
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term) || self.description.to_lowercase().contains(&term)
    }
}

pub fn task_id_for(node_id: &str) -> String {
    format!("task-{}", node_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodePatch, Position};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn test_task_from_node() {
        let node = Node::new("triangle-4", ShapeType::Triangle, Position::default());
        let task = BoardTask::from_node(&node, date(1), date(2));

        assert_eq!(task.id, "task-triangle-4");
        assert_eq!(task.title, "Warning");
        assert_eq!(task.priority, TaskPriority::Highest);
        assert_eq!(task.story_points, 8);
        assert_eq!(task.labels, vec!["urgent", "critical"]);
        assert_eq!(task.description, "Task generated from triangle node: Warning");
    }

    #[test]
    fn test_untitled_node() {
        let mut node = Node::new("cloud-1", ShapeType::from("cloud"), Position::default());
        node.apply_patch(&NodePatch::new().label(""));
        let task = BoardTask::from_node(&node, date(1), date(2));

        assert_eq!(task.title, "cloud Task");
        assert!(task.description.ends_with("Untitled"));
        assert_eq!(task.labels, vec!["general"]);
    }

    #[test]
    fn test_task_lifecycle() {
        let node = Node::new("rectangle-1", ShapeType::Rectangle, Position::default());
        let mut task = BoardTask::from_node(&node, date(1), date(2));
        assert_eq!(task.status, TaskStatus::Todo);

        task.start();
        assert_eq!(task.status, TaskStatus::InProgress);

        task.complete();
        assert!(task.is_done());
    }

    #[test]
    fn test_status_names() {
        assert_eq!(TaskStatus::parse("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::InProgress.as_str(), "in-progress");
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), "in-progress");
        assert!(TaskPriority::Highest > TaskPriority::Low);
    }
}

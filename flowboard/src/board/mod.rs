//! Task board derived from the workflow graph
//!
//! Read-only view over a `WorkflowSnapshot`: every node becomes a task and
//! every connected component (undirected reachability) becomes an epic.

mod task;
mod derive;

pub use task::{task_id_for, BoardTask, TaskPriority, TaskStatus};
pub use derive::{connected_components, BoardFilter, BoardStats, BoardSummary, Epic, TaskBoard};

pub mod board;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod graph;

pub use board::{BoardFilter, BoardStats, BoardTask, Epic, TaskBoard, TaskPriority, TaskStatus};
pub use config::{OrphanEdgePolicy, StoreConfig};
pub use document::WorkflowDocument;
pub use error::{Result, StoreError};
pub use graph::{
    Connection, Edge, Node, NodePatch, Position, ShapeType, WorkflowSnapshot, WorkflowStore,
};

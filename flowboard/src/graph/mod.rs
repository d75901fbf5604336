mod node;
mod edge;
mod history;
mod changes;
mod store;

pub use node::{Node, NodeData, NodePatch, NodeSize, Position, ShapeType};
pub use edge::{generate_edge_id, Connection, Edge, EdgeMarker, EdgeStyle};
pub use history::{History, HistoryAction, HistoryEntry, IndexedEdge, NodeState};
pub use changes::{EdgeChange, NodeChange};
pub use store::{WorkflowSnapshot, WorkflowStore};

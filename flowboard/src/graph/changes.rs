use serde::{Deserialize, Serialize};

use super::node::Position;

/// Raw node change reported by the rendering surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeChange {
    /// Pointer drag; presentation state, not recorded in history
    Position {
        id: String,
        position: Position,
        #[serde(default)]
        dragging: bool,
    },
    /// Resize; routed through `update_node_data`
    Dimensions { id: String, width: f64, height: f64 },
    Select { id: String, selected: bool },
    /// Routed through `delete_node`
    Remove { id: String },
}

/// Raw edge change reported by the rendering surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeChange {
    Select { id: String, selected: bool },
    /// Routed through `delete_edge`
    Remove { id: String },
}

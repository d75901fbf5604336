use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_EDGE_COLOR: &str = "#64748b";

/// A connection attempt reported by the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_handles(mut self, source_handle: Option<&str>, target_handle: Option<&str>) -> Self {
        self.source_handle = source_handle.map(str::to_string);
        self.target_handle = target_handle.map(str::to_string);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMarker {
    #[serde(rename = "type")]
    pub kind: String,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

impl Default for EdgeMarker {
    fn default() -> Self {
        Self {
            kind: "arrowclosed".to_string(),
            width: 20.0,
            height: 20.0,
            color: DEFAULT_EDGE_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: String,
    pub stroke_width: f64,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            stroke: DEFAULT_EDGE_COLOR.to_string(),
            stroke_width: 2.0,
        }
    }
}

/// Directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(rename = "type", default = "default_edge_kind")]
    pub kind: String,
    #[serde(default)]
    pub animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<EdgeMarker>,
    #[serde(default)]
    pub style: EdgeStyle,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

fn default_edge_kind() -> String {
    "smoothstep".to_string()
}

impl Edge {
    /// Build an edge from a connection with default presentation.
    /// Handles are copied exactly as requested.
    pub fn from_connection(id: impl Into<String>, connection: &Connection) -> Self {
        Self {
            id: id.into(),
            source: connection.source.clone(),
            target: connection.target.clone(),
            source_handle: connection.source_handle.clone(),
            target_handle: connection.target_handle.clone(),
            kind: default_edge_kind(),
            animated: true,
            marker_end: Some(EdgeMarker::default()),
            style: EdgeStyle::default(),
            selected: false,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// Same endpoints and handles as the connection
    pub fn matches(&self, connection: &Connection) -> bool {
        self.source == connection.source
            && self.target == connection.target
            && self.source_handle == connection.source_handle
            && self.target_handle == connection.target_handle
    }
}

/// Random edge id of the form `edge-<12 hex>`
pub fn generate_edge_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("edge-{}", &uuid[..12])
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shape of a diagram node. Only affects default geometry and styling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShapeType {
    Rectangle,
    Circle,
    Diamond,
    Triangle,
    Hexagon,
    TextNote,
    /// Any other shape name; styled with the generic defaults
    Custom(String),
}

impl ShapeType {
    pub fn as_str(&self) -> &str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Circle => "circle",
            ShapeType::Diamond => "diamond",
            ShapeType::Triangle => "triangle",
            ShapeType::Hexagon => "hexagon",
            ShapeType::TextNote => "textNote",
            ShapeType::Custom(name) => name,
        }
    }

    /// Smallest width and height a node of this shape may be resized to
    pub fn min_size(&self) -> (f64, f64) {
        match self {
            ShapeType::Rectangle => (50.0, 30.0),
            ShapeType::Circle => (50.0, 50.0),
            ShapeType::Diamond | ShapeType::Triangle => (60.0, 40.0),
            ShapeType::Hexagon => (80.0, 60.0),
            ShapeType::TextNote => (100.0, 60.0),
            ShapeType::Custom(_) => (50.0, 50.0),
        }
    }

    /// Default data for a freshly created node of this shape
    pub fn default_data(&self) -> NodeData {
        let (width, height, background, border, label) = match self {
            ShapeType::Rectangle => (180.0, 80.0, "#3b82f6", "#1d4ed8", "Process"),
            ShapeType::Circle => (120.0, 120.0, "#10b981", "#047857", "Start/End"),
            ShapeType::Diamond => (140.0, 100.0, "#f59e0b", "#d97706", "Decision"),
            ShapeType::Triangle => (120.0, 100.0, "#ef4444", "#dc2626", "Warning"),
            ShapeType::Hexagon => (140.0, 120.0, "#8b5cf6", "#7c3aed", "Preparation"),
            ShapeType::TextNote => (200.0, 100.0, "#fef3c7", "#f59e0b", "Add your notes here..."),
            ShapeType::Custom(_) => (150.0, 80.0, "#64748b", "#475569", "Node"),
        };

        let text_color = match self {
            ShapeType::TextNote => "#92400e",
            _ => "#ffffff",
        };

        NodeData {
            label: label.to_string(),
            width,
            height,
            background_color: background.to_string(),
            border_color: border.to_string(),
            text_color: text_color.to_string(),
            ..NodeData::default()
        }
    }
}

impl From<&str> for ShapeType {
    fn from(s: &str) -> Self {
        match s {
            "rectangle" => ShapeType::Rectangle,
            "circle" => ShapeType::Circle,
            "diamond" => ShapeType::Diamond,
            "triangle" => ShapeType::Triangle,
            "hexagon" => ShapeType::Hexagon,
            "textNote" => ShapeType::TextNote,
            other => ShapeType::Custom(other.to_string()),
        }
    }
}

impl From<String> for ShapeType {
    fn from(s: String) -> Self {
        ShapeType::from(s.as_str())
    }
}

impl From<ShapeType> for String {
    fn from(shape: ShapeType) -> Self {
        shape.as_str().to_string()
    }
}

impl FromStr for ShapeType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ShapeType::from(s))
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Presentation size mirror kept next to `NodeData` for renderers that read
/// the node style instead of its data
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeSize {
    pub width: f64,
    pub height: f64,
}

/// Style and label payload of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    pub width: f64,
    pub height: f64,
    pub background_color: String,
    pub border_color: String,
    pub border_width: f64,
    pub text_color: String,
    pub font_size: f64,
    pub font_weight: String,
    /// Keys this crate does not model, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            label: "Node".to_string(),
            width: 150.0,
            height: 80.0,
            background_color: "#64748b".to_string(),
            border_color: "#475569".to_string(),
            border_width: 2.0,
            text_color: "#ffffff".to_string(),
            font_size: 14.0,
            font_weight: "medium".to_string(),
            extra: Map::new(),
        }
    }
}

impl NodeData {
    /// Shallow merge: only fields present in the patch are overwritten
    pub fn merge(&mut self, patch: &NodePatch) {
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(color) = &patch.background_color {
            self.background_color = color.clone();
        }
        if let Some(color) = &patch.border_color {
            self.border_color = color.clone();
        }
        if let Some(width) = patch.border_width {
            self.border_width = width;
        }
        if let Some(color) = &patch.text_color {
            self.text_color = color.clone();
        }
        if let Some(size) = patch.font_size {
            self.font_size = size;
        }
        if let Some(weight) = &patch.font_weight {
            self.font_weight = weight.clone();
        }
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// Partial node data update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn border_color(mut self, color: impl Into<String>) -> Self {
        self.border_color = Some(color.into());
        self
    }

    pub fn text_color(mut self, color: impl Into<String>) -> Self {
        self.text_color = Some(color.into());
        self
    }

    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn font_weight(mut self, weight: impl Into<String>) -> Self {
        self.font_weight = Some(weight.into());
        self
    }

    /// Set an arbitrary key not modelled by `NodeData`
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeRecord")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub shape: ShapeType,
    pub position: Position,
    pub data: NodeData,
    pub style: NodeSize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

/// Node as it appears in an imported document. Missing data keys fall back
/// to the shape defaults and a missing `style` mirrors the data size.
#[derive(Deserialize)]
struct NodeRecord {
    id: String,
    #[serde(rename = "type")]
    shape: ShapeType,
    position: Position,
    #[serde(default)]
    data: NodePatch,
    style: Option<NodeSize>,
    #[serde(default)]
    selected: bool,
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        let mut data = record.shape.default_data();
        data.merge(&record.data);
        let style = record.style.unwrap_or(NodeSize {
            width: data.width,
            height: data.height,
        });

        Self {
            id: record.id,
            shape: record.shape,
            position: record.position,
            data,
            style,
            selected: record.selected,
        }
    }
}

impl Node {
    /// Build a node with the shape's default data and a matching size mirror
    pub fn new(id: impl Into<String>, shape: ShapeType, position: Position) -> Self {
        let data = shape.default_data();
        let style = NodeSize { width: data.width, height: data.height };
        Self {
            id: id.into(),
            shape,
            position,
            data,
            style,
            selected: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }

    /// Merge a patch into the node. Width/height are clamped to the shape
    /// minimum and mirrored into `style`.
    pub fn apply_patch(&mut self, patch: &NodePatch) {
        let (min_width, min_height) = self.shape.min_size();
        let mut patch = patch.clone();
        patch.width = patch.width.map(|w| w.max(min_width));
        patch.height = patch.height.map(|h| h.max(min_height));

        self.data.merge(&patch);
        if let Some(width) = patch.width {
            self.style.width = width;
        }
        if let Some(height) = patch.height {
            self.style.height = height;
        }
    }

    /// Numeric suffix of a `<shape>-<counter>` id, if it has one
    pub fn counter_suffix(&self) -> Option<u64> {
        id_counter_suffix(&self.id)
    }
}

pub(crate) fn id_counter_suffix(id: &str) -> Option<u64> {
    let (_, suffix) = id.rsplit_once('-')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_roundtrip_names() {
        assert_eq!(ShapeType::from("textNote"), ShapeType::TextNote);
        assert_eq!(ShapeType::from("cloud"), ShapeType::Custom("cloud".to_string()));
        assert_eq!(ShapeType::Hexagon.to_string(), "hexagon");

        let json = serde_json::to_value(ShapeType::TextNote).unwrap();
        assert_eq!(json, json!("textNote"));
    }

    #[test]
    fn test_default_data_per_shape() {
        let note = ShapeType::TextNote.default_data();
        assert_eq!(note.width, 200.0);
        assert_eq!(note.text_color, "#92400e");

        let custom = ShapeType::Custom("cloud".into()).default_data();
        assert_eq!(custom.label, "Node");
        assert_eq!(custom.width, 150.0);
        assert_eq!(custom.border_width, 2.0);
    }

    #[test]
    fn test_patch_merges_not_replaces() {
        let mut node = Node::new("rectangle-1", ShapeType::Rectangle, Position::default());
        node.apply_patch(&NodePatch::new().label("X"));
        node.apply_patch(&NodePatch::new().width(200.0));

        assert_eq!(node.data.label, "X");
        assert_eq!(node.data.width, 200.0);
        assert_eq!(node.style.width, 200.0);
        assert_eq!(node.data.height, 80.0);
        assert_eq!(node.data.background_color, "#3b82f6");
    }

    #[test]
    fn test_patch_clamps_to_min_size() {
        let mut node = Node::new("rectangle-1", ShapeType::Rectangle, Position::default());
        node.apply_patch(&NodePatch::new().size(10.0, 10.0));

        assert_eq!(node.data.width, 50.0);
        assert_eq!(node.data.height, 30.0);
        assert_eq!(node.style, NodeSize { width: 50.0, height: 30.0 });
    }

    #[test]
    fn test_unknown_data_keys_survive() {
        let raw = json!({
            "id": "cloud-3",
            "type": "cloud",
            "position": {"x": 1.0, "y": 2.0},
            "data": {"label": "Sky", "opacity": 0.5}
        });
        let node: Node = serde_json::from_value(raw).unwrap();
        assert_eq!(node.data.extra.get("opacity"), Some(&json!(0.5)));
        assert_eq!(node.data.font_size, 14.0);

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back["data"]["opacity"], json!(0.5));
        assert!(back.get("selected").is_none());
    }

    #[test]
    fn test_sparse_node_takes_shape_defaults() {
        let node: Node = serde_json::from_value(json!({
            "id": "diamond-3",
            "type": "diamond",
            "position": { "x": 0, "y": 0 },
            "data": { "label": "Approve?" }
        }))
        .unwrap();

        assert_eq!(node.label(), "Approve?");
        assert_eq!(node.data.background_color, "#f59e0b");
        assert_eq!((node.data.width, node.data.height), (140.0, 100.0));
        assert_eq!((node.style.width, node.style.height), (140.0, 100.0));
        assert!(!node.selected);
    }

    #[test]
    fn test_node_json_round_trip_keeps_style() {
        let mut node = Node::new("hexagon-2", ShapeType::Hexagon, Position::new(5.0, 6.0));
        node.style = NodeSize { width: 90.0, height: 70.0 };

        let back: Node = serde_json::from_value(serde_json::to_value(&node).unwrap()).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_counter_suffix() {
        assert_eq!(id_counter_suffix("rectangle-7"), Some(7));
        assert_eq!(id_counter_suffix("textNote-12"), Some(12));
        assert_eq!(id_counter_suffix("imported"), None);
        assert_eq!(id_counter_suffix("node-x1"), None);
    }
}

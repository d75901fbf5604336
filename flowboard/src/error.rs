//! Error types for the workflow store
//!
//! Unknown ids on delete/update are not errors (those operations report a
//! `bool`); this type covers the cases a caller has to react to: rejected
//! connections, corrupt imports and bad configuration.

use thiserror::Error;

/// Main error type for store, document and config operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A referenced node is not in the store
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The same connection (endpoints and handles) already exists
    #[error("Edge already exists: {from} -> {to}")]
    DuplicateEdge { from: String, to: String },

    /// An incoming edge references a node that is not part of the payload
    #[error("Edge {edge} references unknown node {node}")]
    OrphanEdge { edge: String, node: String },

    /// Structurally inconsistent workflow (duplicate ids etc.)
    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// Import payload is missing `nodes`/`edges` or is not JSON
    #[error("Malformed workflow payload: {0}")]
    MalformedPayload(String),

    /// Export document from an incompatible format version
    #[error("Unsupported workflow format version: {0}")]
    UnsupportedVersion(String),

    /// Configuration failed validation
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StoreError::NodeNotFound("rectangle-9".to_string());
        assert_eq!(error.to_string(), "Node not found: rectangle-9");

        let orphan = StoreError::OrphanEdge {
            edge: "edge-1".to_string(),
            node: "circle-4".to_string(),
        };
        assert!(orphan.to_string().contains("references unknown node circle-4"));

        let dup = StoreError::DuplicateEdge {
            from: "a".to_string(),
            to: "b".to_string(),
        };
        assert_eq!(dup.to_string(), "Edge already exists: a -> b");
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: StoreError = json_err.into();
        assert!(matches!(error, StoreError::Serialization(_)));
    }
}

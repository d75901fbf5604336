//! Export/import document
//!
//! The only wire format of the store: `{nodes, edges, exportedAt, version}`
//! as JSON. `load_workflow` accepts exactly what `export_document` writes.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::graph::{Edge, Node, WorkflowSnapshot};

/// Format version written by this crate
pub const FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

impl WorkflowDocument {
    /// Wrap a snapshot, stamped with the current time
    pub fn from_snapshot(snapshot: WorkflowSnapshot) -> Self {
        Self {
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            exported_at: Some(Utc::now()),
            version: default_version(),
        }
    }

    pub fn into_snapshot(self) -> WorkflowSnapshot {
        WorkflowSnapshot::new(self.nodes, self.edges)
    }

    /// Parse an export document.
    ///
    /// Fails with `MalformedPayload` when the text is not JSON or `nodes` /
    /// `edges` are missing or not arrays, and with `UnsupportedVersion` for a
    /// major version other than 1.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| StoreError::MalformedPayload(e.to_string()))?;

        for field in ["nodes", "edges"] {
            match value.get(field) {
                Some(Value::Array(_)) => {}
                Some(_) => {
                    return Err(StoreError::MalformedPayload(format!(
                        "`{}` must be an array",
                        field
                    )))
                }
                None => {
                    return Err(StoreError::MalformedPayload(format!(
                        "missing `{}` array",
                        field
                    )))
                }
            }
        }

        let document: WorkflowDocument = serde_json::from_value(value)
            .map_err(|e| StoreError::MalformedPayload(e.to_string()))?;
        document.check_version()?;

        Ok(document)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check_version(&self) -> Result<()> {
        let major = self.version.split('.').next().unwrap_or_default();
        if major != "1" {
            return Err(StoreError::UnsupportedVersion(self.version.clone()));
        }
        Ok(())
    }

    /// Read and parse a document file
    pub fn read_from(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write the document as pretty JSON
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

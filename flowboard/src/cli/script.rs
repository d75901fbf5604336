use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};

use crate::graph::{Connection, NodePatch, Position, WorkflowStore};

/// One line of a store script
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Add { shape: String, x: f64, y: f64 },
    Connect {
        source: String,
        target: String,
        source_handle: Option<String>,
        target_handle: Option<String>,
    },
    DeleteNode(String),
    DeleteEdge(String),
    Update { id: String, patch: NodePatch },
    Move { id: String, x: f64, y: f64 },
    /// Mark nodes as selected; the last one becomes the active node
    Select(Vec<String>),
    Deselect,
    Copy,
    Paste,
    Duplicate,
    Undo,
    Redo,
    Clear,
}

impl ScriptCommand {
    /// Parse one script line. Blank lines and `#` comments yield `None`.
    ///
    /// ```text
    /// add rectangle 100 200
    /// connect rectangle-1 circle-2 [source-handle] [target-handle]
    /// update rectangle-1 {"label": "Build"}
    /// ```
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match verb {
            "add" => {
                let [shape, x, y] = args.as_slice() else {
                    bail!("usage: add <shape> <x> <y>");
                };
                ScriptCommand::Add {
                    shape: shape.to_string(),
                    x: parse_coord(x)?,
                    y: parse_coord(y)?,
                }
            }
            "connect" => match args.as_slice() {
                [source, target] => ScriptCommand::Connect {
                    source: source.to_string(),
                    target: target.to_string(),
                    source_handle: None,
                    target_handle: None,
                },
                [source, target, source_handle, target_handle] => ScriptCommand::Connect {
                    source: source.to_string(),
                    target: target.to_string(),
                    source_handle: handle(source_handle),
                    target_handle: handle(target_handle),
                },
                _ => bail!("usage: connect <source> <target> [<source-handle> <target-handle>]"),
            },
            "delete-node" => ScriptCommand::DeleteNode(single_id(&args, "delete-node")?),
            "delete-edge" => ScriptCommand::DeleteEdge(single_id(&args, "delete-edge")?),
            "update" => {
                let (id, json) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("usage: update <id> <json>"))?;
                let patch: NodePatch = serde_json::from_str(json.trim())
                    .with_context(|| format!("invalid patch for {}", id))?;
                ScriptCommand::Update { id: id.to_string(), patch }
            }
            "move" => {
                let [id, x, y] = args.as_slice() else {
                    bail!("usage: move <id> <x> <y>");
                };
                ScriptCommand::Move {
                    id: id.to_string(),
                    x: parse_coord(x)?,
                    y: parse_coord(y)?,
                }
            }
            "select" if !args.is_empty() => {
                ScriptCommand::Select(args.iter().map(|s| s.to_string()).collect())
            }
            "select" => bail!("usage: select <id>..."),
            "deselect" => ScriptCommand::Deselect,
            "copy" => ScriptCommand::Copy,
            "paste" => ScriptCommand::Paste,
            "duplicate" => ScriptCommand::Duplicate,
            "undo" => ScriptCommand::Undo,
            "redo" => ScriptCommand::Redo,
            "clear" => ScriptCommand::Clear,
            other => bail!("unknown command: {}", other),
        };

        Ok(Some(command))
    }
}

fn parse_coord(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .with_context(|| format!("invalid coordinate: {}", s))
}

// "-" stands for "no handle"
fn handle(s: &str) -> Option<String> {
    (s != "-").then(|| s.to_string())
}

fn single_id(args: &[&str], verb: &str) -> Result<String> {
    match args {
        [id] => Ok(id.to_string()),
        _ => bail!("usage: {} <id>", verb),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    /// Commands that changed the store
    pub applied: usize,
    /// Commands that did nothing (unknown id, empty history, empty clipboard)
    pub skipped: usize,
    pub messages: Vec<String>,
}

/// Runs script commands against one store, so undo, redo and the clipboard
/// carry across lines
pub struct ScriptSession {
    store: WorkflowStore,
}

impl ScriptSession {
    pub fn new(store: WorkflowStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &WorkflowStore {
        &self.store
    }

    pub fn into_store(self) -> WorkflowStore {
        self.store
    }

    /// Run a whole script. Parse errors and store errors abort with the
    /// offending line number; no-op commands are only counted.
    pub fn run(&mut self, script: &str) -> Result<ScriptReport> {
        let mut report = ScriptReport::default();

        for (number, line) in script.lines().enumerate() {
            let Some(command) = ScriptCommand::parse(line)
                .with_context(|| format!("line {}", number + 1))?
            else {
                continue;
            };

            let (changed, message) = self
                .execute(command)
                .with_context(|| format!("line {}", number + 1))?;
            if changed {
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
            report.messages.push(message);
        }

        info!(applied = report.applied, skipped = report.skipped, "script finished");
        Ok(report)
    }

    /// Execute a single command, returning whether the store changed and a
    /// short description
    pub fn execute(&mut self, command: ScriptCommand) -> Result<(bool, String)> {
        debug!(?command, "executing");
        let store = &mut self.store;

        let outcome = match command {
            ScriptCommand::Add { shape, x, y } => {
                let node = store.add_node(shape.as_str(), Position::new(x, y));
                (true, format!("added {}", node.id))
            }
            ScriptCommand::Connect { source, target, source_handle, target_handle } => {
                let connection = Connection::new(source, target)
                    .with_handles(source_handle.as_deref(), target_handle.as_deref());
                let edge = store.add_edge(connection)?;
                (true, format!("connected {} -> {} ({})", edge.source, edge.target, edge.id))
            }
            ScriptCommand::DeleteNode(id) => {
                let removed = store.delete_node(&id);
                (removed, format!("delete node {}", id))
            }
            ScriptCommand::DeleteEdge(id) => {
                let removed = store.delete_edge(&id);
                (removed, format!("delete edge {}", id))
            }
            ScriptCommand::Update { id, patch } => {
                let updated = store.update_node_data(&id, patch);
                (updated, format!("update {}", id))
            }
            ScriptCommand::Move { id, x, y } => {
                let moved = store.move_node(&id, Position::new(x, y));
                (moved, format!("move {}", id))
            }
            ScriptCommand::Select(ids) => {
                let mut found = 0;
                for id in &ids {
                    if store.set_node_selected(id, true) {
                        found += 1;
                        store.set_selected_node_id(Some(id.clone()));
                    }
                }
                (found > 0, format!("selected {}/{}", found, ids.len()))
            }
            ScriptCommand::Deselect => {
                let ids: Vec<String> = store.selected_nodes().iter().map(|n| n.id.clone()).collect();
                for id in &ids {
                    store.set_node_selected(id, false);
                }
                store.set_selected_node_id(None);
                (!ids.is_empty(), format!("deselected {}", ids.len()))
            }
            ScriptCommand::Copy => {
                let count = store.copy_selection();
                (count > 0, format!("copied {}", count))
            }
            ScriptCommand::Paste => {
                let pasted = store.paste_clipboard();
                (!pasted.is_empty(), format!("pasted {}", pasted.len()))
            }
            ScriptCommand::Duplicate => {
                let copies = store.duplicate_selection();
                (!copies.is_empty(), format!("duplicated {}", copies.len()))
            }
            ScriptCommand::Undo => (store.undo(), "undo".to_string()),
            ScriptCommand::Redo => (store.redo(), "redo".to_string()),
            ScriptCommand::Clear => {
                store.clear_workflow();
                (true, "cleared".to_string())
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ScriptCommand::parse("   ").unwrap(), None);
        assert_eq!(ScriptCommand::parse("# comment").unwrap(), None);
        assert_eq!(
            ScriptCommand::parse("add diamond 10 -20.5").unwrap(),
            Some(ScriptCommand::Add { shape: "diamond".into(), x: 10.0, y: -20.5 })
        );
        assert_eq!(
            ScriptCommand::parse("connect a b right -").unwrap(),
            Some(ScriptCommand::Connect {
                source: "a".into(),
                target: "b".into(),
                source_handle: Some("right".into()),
                target_handle: None,
            })
        );
        assert_eq!(ScriptCommand::parse("undo").unwrap(), Some(ScriptCommand::Undo));
    }

    #[test]
    fn test_parse_update_json() {
        let command = ScriptCommand::parse(r#"update rectangle-1 {"label": "Build", "width": 300}"#)
            .unwrap()
            .unwrap();
        let ScriptCommand::Update { id, patch } = command else {
            panic!("expected update");
        };
        assert_eq!(id, "rectangle-1");
        assert_eq!(patch.label.as_deref(), Some("Build"));
        assert_eq!(patch.width, Some(300.0));
    }

    #[test]
    fn test_parse_errors() {
        assert!(ScriptCommand::parse("add rectangle 1").is_err());
        assert!(ScriptCommand::parse("add rectangle x 1").is_err());
        assert!(ScriptCommand::parse("update rectangle-1 {bad").is_err());
        assert!(ScriptCommand::parse("explode").is_err());
        assert!(ScriptCommand::parse("select").is_err());
    }

    #[test]
    fn test_session_run() {
        let mut session = ScriptSession::new(WorkflowStore::new());
        let report = session
            .run("add rectangle 0 0\nadd circle 100 0\nconnect rectangle-1 circle-2\nundo\nredo\ndelete-node missing")
            .unwrap();

        assert_eq!(report.applied, 5);
        assert_eq!(report.skipped, 1);
        assert_eq!(session.store().edges().len(), 1);
    }

    #[test]
    fn test_session_error_has_line() {
        let mut session = ScriptSession::new(WorkflowStore::new());
        let err = session.run("add rectangle 0 0\nconnect rectangle-1 ghost").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}

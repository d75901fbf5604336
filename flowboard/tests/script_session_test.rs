//! Store scripts run in one session

use anyhow::Result;
use tempfile::TempDir;

use flowboard::cli::{ScriptCommand, ScriptSession};
use flowboard::{StoreConfig, WorkflowDocument, WorkflowStore};

const BUILD_SCRIPT: &str = r##"
# three-step pipeline
add circle 0 0
add rectangle 200 0
add diamond 400 0
connect circle-1 rectangle-2 right left
connect rectangle-2 diamond-3
update rectangle-2 {"label": "Compile", "backgroundColor": "#111827"}

# clone the decision and drop the clone again
select diamond-3
copy
paste
undo
redo
"##;

#[test]
fn test_script_builds_workflow() -> Result<()> {
    let mut session = ScriptSession::new(WorkflowStore::new());
    let report = session.run(BUILD_SCRIPT)?;

    assert_eq!(report.skipped, 0);
    let store = session.store();
    assert_eq!(store.nodes().len(), 4);
    assert_eq!(store.edges().len(), 2);
    assert_eq!(store.node("rectangle-2").map(|n| n.label()), Some("Compile"));
    assert_eq!(store.node("diamond-4").map(|n| n.position.x), Some(450.0));
    assert_eq!(store.edges()[0].source_handle.as_deref(), Some("right"));
    Ok(())
}

#[test]
fn test_script_round_trips_through_file() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("pipeline.json");

    let mut session = ScriptSession::new(WorkflowStore::new());
    session.run(BUILD_SCRIPT)?;
    session.store().export_document().write_to(&path)?;

    let mut store = WorkflowStore::new();
    store.import_document(WorkflowDocument::read_from(&path)?)?;
    let mut session = ScriptSession::new(store);
    session.run("delete-node rectangle-2\nadd rectangle 0 300")?;

    let store = session.into_store();
    assert!(store.edges().is_empty());
    assert!(store.node("rectangle-5").is_some());
    Ok(())
}

#[test]
fn test_clear_and_undo_in_script() -> Result<()> {
    let mut session = ScriptSession::new(WorkflowStore::new());
    session.run(BUILD_SCRIPT)?;
    let before = session.store().snapshot();

    let report = session.run("clear\nundo\nundo\nredo")?;
    assert_eq!(report.applied, 4);
    assert_eq!(session.store().snapshot(), before);
    Ok(())
}

#[test]
fn test_noop_commands_are_skipped() -> Result<()> {
    let config = StoreConfig::builder().paste_offset(10.0).build();
    let mut session = ScriptSession::new(WorkflowStore::with_config(config));

    let report = session.run("undo\npaste\nduplicate\ndelete-edge edge-1\nadd hexagon 0 0")?;
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 4);
    Ok(())
}

#[test]
fn test_script_stops_at_bad_line() {
    let mut session = ScriptSession::new(WorkflowStore::new());
    let err = session
        .run("add rectangle 0 0\nadd rectangle 0 0\nfly rectangle-1\nadd circle 0 0")
        .unwrap_err();

    assert!(format!("{:#}", err).contains("line 3"));
    // lines before the failure stay applied
    assert_eq!(session.store().nodes().len(), 2);
}

#[test]
fn test_execute_single_command() -> Result<()> {
    let mut session = ScriptSession::new(WorkflowStore::new());
    let command = ScriptCommand::parse("add textNote 5 5")?.expect("command");

    let (changed, message) = session.execute(command)?;
    assert!(changed);
    assert_eq!(message, "added textNote-1");
    Ok(())
}

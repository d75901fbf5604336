//! Demo: editing a workflow with undo/redo and deriving its task board
//!
//! Run with:
//! ```
//! cargo run --example demo_undo_board
//! ```

use anyhow::Result;
use flowboard::{Connection, NodePatch, Position, ShapeType, TaskBoard, WorkflowStore};

fn main() -> Result<()> {
    println!("╔══════════════════════════════════════════╗");
    println!("║   Flowboard Undo + Task Board Demo       ║");
    println!("╚══════════════════════════════════════════╝\n");

    let mut store = WorkflowStore::new();

    println!("Step 1: Building a small release pipeline...\n");
    let start = store.add_node(ShapeType::Circle, Position::new(0.0, 0.0));
    let build = store.add_node(ShapeType::Rectangle, Position::new(200.0, 0.0));
    let gate = store.add_node(ShapeType::Diamond, Position::new(400.0, 0.0));
    store.update_node_data(&build.id, NodePatch::new().label("Build"));
    store.add_edge(Connection::new(&start.id, &build.id))?;
    store.add_edge(Connection::new(&build.id, &gate.id))?;

    for node in store.nodes() {
        println!("  {} ({})", node.id, node.label());
    }

    println!("\nStep 2: Deleting {} cascades its edges...", build.id);
    store.delete_node(&build.id);
    println!("  nodes: {}, edges: {}", store.nodes().len(), store.edges().len());

    println!("\nStep 3: Undo brings both back...");
    store.undo();
    println!("  nodes: {}, edges: {}", store.nodes().len(), store.edges().len());

    println!("\nHistory ({} entries):", store.history().len());
    for entry in store.history().entries() {
        println!("  {}", entry.action.describe());
    }

    println!("\nStep 4: Task board\n");
    let board = TaskBoard::derive(&store.snapshot(), chrono::Local::now().date_naive());
    for epic in &board.epics {
        println!("{} ({} tasks)", epic.name, epic.tasks.len());
        for task_id in &epic.tasks {
            if let Some(task) = board.task(task_id) {
                println!("  {} {} due {}", task.status.marker(), task.title, task.due_date);
            }
        }
    }

    Ok(())
}

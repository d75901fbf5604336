use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowboard::cli::ScriptSession;
use flowboard::graph::NodePatch;
use flowboard::{
    Connection, Position, StoreConfig, TaskBoard, TaskStatus, WorkflowDocument, WorkflowStore,
};

#[derive(Parser)]
#[command(name = "flowboard")]
#[command(about = "Workflow diagram store with undo/redo and a derived task board", long_about = None)]
struct Cli {
    /// Store config (YAML). Defaults to the user config dir when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty workflow document
    New {
        file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List nodes and edges
    Show { file: PathBuf },

    /// Add a node
    AddNode {
        file: PathBuf,

        /// rectangle, circle, diamond, triangle, hexagon, textNote or any custom name
        shape: String,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        x: f64,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        y: f64,
    },

    /// Connect two nodes
    Connect {
        file: PathBuf,
        source: String,
        target: String,

        #[arg(long)]
        source_handle: Option<String>,

        #[arg(long)]
        target_handle: Option<String>,
    },

    /// Delete a node and its edges
    DeleteNode { file: PathBuf, id: String },

    /// Delete an edge
    DeleteEdge { file: PathBuf, id: String },

    /// Merge a JSON patch into a node's data
    Update {
        file: PathBuf,
        id: String,

        /// e.g. '{"label": "Review", "width": 220}'
        patch: String,
    },

    /// Show the task board derived from the workflow
    Board {
        file: PathBuf,

        /// Only tasks with this status (todo, in-progress, review, done, blocked)
        #[arg(short, long)]
        status: Option<String>,

        /// Print the board summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show workflow and board statistics
    Stats { file: PathBuf },

    /// Run a store script against a document and save the result
    Run {
        file: PathBuf,
        script: PathBuf,

        /// Execute without writing the document back
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "flowboard=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::New { ref file, force } => {
            if file.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", file.display());
            }
            WorkflowStore::with_config(config).export_document().write_to(file)?;
            println!("Created {}", file.display());
        }

        Commands::Show { ref file } => {
            let store = open_store(file, config)?;
            if store.nodes().is_empty() {
                println!("Empty workflow.");
                return Ok(());
            }

            println!("Nodes:");
            for node in store.nodes() {
                println!(
                    "  {:<16} {:<10} ({:>7.1}, {:>7.1})  {}x{}  {}",
                    node.id,
                    node.shape,
                    node.position.x,
                    node.position.y,
                    node.data.width,
                    node.data.height,
                    node.label()
                );
            }
            if !store.edges().is_empty() {
                println!("\nEdges:");
                for edge in store.edges() {
                    let handles = match (&edge.source_handle, &edge.target_handle) {
                        (None, None) => String::new(),
                        (s, t) => format!(
                            "  [{} -> {}]",
                            s.as_deref().unwrap_or("-"),
                            t.as_deref().unwrap_or("-")
                        ),
                    };
                    println!("  {}  {} -> {}{}", edge.id, edge.source, edge.target, handles);
                }
            }
        }

        Commands::AddNode { ref file, ref shape, x, y } => {
            let mut store = open_store(file, config)?;
            let node = store.add_node(shape.as_str(), Position::new(x, y));
            save_store(&store, file)?;
            println!("Added {}", node.id);
        }

        Commands::Connect { ref file, ref source, ref target, ref source_handle, ref target_handle } => {
            let mut store = open_store(file, config)?;
            let connection = Connection::new(source, target)
                .with_handles(source_handle.as_deref(), target_handle.as_deref());
            let edge = store.add_edge(connection)?;
            save_store(&store, file)?;
            println!("Connected {} -> {} ({})", edge.source, edge.target, edge.id);
        }

        Commands::DeleteNode { ref file, ref id } => {
            let mut store = open_store(file, config)?;
            let edges = store.incident_edges(id).len();
            if !store.delete_node(id) {
                bail!("node not found: {}", id);
            }
            save_store(&store, file)?;
            println!("Deleted {} ({} edges removed)", id, edges);
        }

        Commands::DeleteEdge { ref file, ref id } => {
            let mut store = open_store(file, config)?;
            if !store.delete_edge(id) {
                bail!("edge not found: {}", id);
            }
            save_store(&store, file)?;
            println!("Deleted {}", id);
        }

        Commands::Update { ref file, ref id, ref patch } => {
            let patch: NodePatch = serde_json::from_str(patch).context("Invalid JSON patch")?;
            let mut store = open_store(file, config)?;
            if store.node(id).is_none() {
                bail!("node not found: {}", id);
            }
            if store.update_node_data(id, patch) {
                save_store(&store, file)?;
                println!("Updated {}", id);
            } else {
                println!("No changes for {}", id);
            }
        }

        Commands::Board { ref file, ref status, json } => {
            let store = open_store(file, config)?;
            let board = TaskBoard::derive(&store.snapshot(), chrono::Local::now().date_naive());

            if json {
                println!("{}", serde_json::to_string_pretty(&board.summary())?);
                return Ok(());
            }

            let status = match status {
                Some(s) => Some(
                    TaskStatus::parse(s).with_context(|| format!("Unknown status: {}", s))?,
                ),
                None => None,
            };

            if board.tasks.is_empty() {
                println!("No tasks. Add nodes to the workflow first.");
                return Ok(());
            }

            for epic in &board.epics {
                println!("{} ({}, {}%)", epic.name, epic.color, epic.progress);
                println!("{}", "=".repeat(50));
                for task_id in &epic.tasks {
                    let Some(task) = board.task(task_id) else { continue };
                    if status.is_some_and(|s| s != task.status) {
                        continue;
                    }
                    println!(
                        "  {} {:<24} {:<8} {:>2}pt  due {}",
                        task.status.marker(),
                        task.title,
                        format!("{:?}", task.priority).to_lowercase(),
                        task.story_points,
                        task.due_date
                    );
                    if !task.subtasks.is_empty() {
                        println!("      -> {}", task.subtasks.join(", "));
                    }
                }
                println!();
            }
        }

        Commands::Stats { ref file } => {
            let store = open_store(file, config)?;
            let board = TaskBoard::derive(&store.snapshot(), chrono::Local::now().date_naive());
            let stats = board.stats();

            println!("Workflow Statistics:");
            println!("  Nodes:       {}", store.nodes().len());
            println!("  Edges:       {}", store.edges().len());
            println!("  Epics:       {}", board.epics.len());
            println!("\nTasks:");
            println!("  Total:       {}", stats.total);
            println!("  Todo:        {}", stats.todo);
            println!("  In progress: {}", stats.in_progress);
            println!("  Review:      {}", stats.review);
            println!("  Done:        {}", stats.done);
            println!("  Blocked:     {}", stats.blocked);
            println!("  Completion:  {}%", stats.completion_rate());
        }

        Commands::Run { ref file, ref script, dry_run } => {
            let source = std::fs::read_to_string(script)
                .with_context(|| format!("Failed to read script {}", script.display()))?;
            let store = if file.exists() {
                open_store(file, config)?
            } else {
                WorkflowStore::with_config(config)
            };

            let mut session = ScriptSession::new(store);
            let report = session.run(&source)?;
            for message in &report.messages {
                println!("  {}", message);
            }
            println!("\n{} applied, {} skipped", report.applied, report.skipped);

            if !dry_run {
                save_store(session.store(), file)?;
                println!("Saved {}", file.display());
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<StoreConfig> {
    StoreConfig::load(path).with_context(|| match path {
        Some(path) => format!("Failed to load config {}", path.display()),
        None => "Failed to load default config".to_string(),
    })
}

fn open_store(file: &Path, config: StoreConfig) -> Result<WorkflowStore> {
    let document = WorkflowDocument::read_from(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let mut store = WorkflowStore::with_config(config);
    store.import_document(document)?;
    Ok(store)
}

fn save_store(store: &WorkflowStore, file: &Path) -> Result<()> {
    store
        .export_document()
        .write_to(file)
        .with_context(|| format!("Failed to write {}", file.display()))
}

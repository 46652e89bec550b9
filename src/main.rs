//! image-properties - inspect image metrics the way the property nodes show them

use clap::{Parser, Subcommand};
use egui::Pos2;
use image_properties::constants::widget::IMAGE;
use image_properties::host::{DirtyCanvas, NoOverlay};
use image_properties::metrics::{GenerationMetadata, ImageAnalysis, PropertiesMode};
use image_properties::nodes::{NodeGraph, SharedNode, WatcherState, WidgetValue};
use image_properties::persistence::FileManager;
use image_properties::{EngineConfig, Error, ImageReference, MetricsResult, Result};
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

const LOAD_NODE: &str = "LoadImageandviewPropertiesSG";

#[derive(Parser)]
#[command(name = "image-properties", version, about = "Image property metrics for graph editor nodes")]
struct Cli {
    /// Engine config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve image references with the configured probe and print their lines
    Probe {
        #[arg(required = true)]
        references: Vec<String>,
    },
    /// Print the execution message a server-side analysis of FILE would deliver
    Analyze {
        file: PathBuf,
        #[arg(long, default_value = "both")]
        mode: PropertiesMode,
        /// Workflow prompt JSON to read generation metadata from
        #[arg(long)]
        prompt: Option<PathBuf>,
    },
    /// Pick each reference in turn on a load node and print the lines it ends up showing
    Watch {
        #[arg(required = true)]
        references: Vec<String>,
    },
    /// Restore a workflow document and print the display lines of every node
    Inspect { workflow: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let local = tokio::task::LocalSet::new();
    match local.block_on(&runtime, run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every item succeeded
async fn run(cli: Cli) -> Result<bool> {
    let config = EngineConfig::load(cli.config.as_deref())?;
    debug!("Using config {:?}", config);

    match cli.command {
        Command::Probe { references } => probe(&config, &references).await,
        Command::Analyze { file, mode, prompt } => analyze(&file, mode, prompt.as_deref()),
        Command::Watch { references } => watch(&config, &references).await,
        Command::Inspect { workflow } => inspect(&config, &workflow),
    }
}

async fn probe(config: &EngineConfig, references: &[String]) -> Result<bool> {
    let probe = config.probe();
    let mut all_ok = true;

    for value in references {
        let Some(reference) = ImageReference::parse(Some(value.as_str())) else {
            println!("(empty reference): nothing to show");
            continue;
        };
        match probe.probe(&reference).await {
            Ok(dimensions) => {
                println!("{}", reference);
                for line in MetricsResult::compute(dimensions).display_lines() {
                    println!("  {}", line);
                }
            }
            Err(e) => {
                error!("Failed to load image: {} ({})", probe.describe(&reference), e);
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn analyze(file: &Path, mode: PropertiesMode, prompt: Option<&Path>) -> Result<bool> {
    let image = image::open(file)?;
    let channels = u32::from(image.color().channel_count());
    let Some(analysis) = ImageAnalysis::from_shape(1, image.height(), image.width(), channels) else {
        error!("{} has no pixels", file.display());
        return Ok(false);
    };
    debug!("Outputs: {:?}", analysis.outputs());

    let metadata = match prompt {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            let prompt: serde_json::Value = serde_json::from_str(&content)?;
            Some(GenerationMetadata::from_prompt(&prompt))
        }
        None => None,
    };

    let message = analysis.execution_message(mode, metadata.as_ref());
    println!("{}", serde_json::to_string_pretty(&message)?);
    Ok(true)
}

async fn watch(config: &EngineConfig, references: &[String]) -> Result<bool> {
    let services = Rc::new(config.services(Rc::new(DirtyCanvas::new()), Rc::new(NoOverlay)));
    let runtime = config.runtime(services.clone());
    let mut graph = NodeGraph::new(config.registry());

    let id = graph.create_node(LOAD_NODE, Pos2::ZERO, &services.context())?;
    let node = graph.get(id).ok_or(Error::NodeNotFound(id))?;
    let handle = runtime
        .spawn(&node, config.poll_trigger())
        .ok_or_else(|| Error::Config(format!("{} has no watched slot", LOAD_NODE)))?;
    graph.attach_watcher(id, handle)?;
    info!("Watching node {} every {:?}", id, config.poll_interval());

    for value in references {
        node.borrow_mut()
            .node
            .set_widget_value(IMAGE, WidgetValue::from(value.as_str()));
        while !settled(&node, value) {
            tokio::time::sleep(config.poll_interval()).await;
        }

        println!("{}", value);
        print_lines(node.borrow().display().lines());
    }
    Ok(true)
}

/// The watcher has seen `value` and has no probe left in flight
fn settled(node: &SharedNode, value: &str) -> bool {
    let node = node.borrow();
    node.watcher().map_or(true, |watcher| {
        watcher.state() != WatcherState::Computing && watcher.last_observed() == Some(value)
    })
}

fn print_lines(lines: &[String]) {
    if lines.is_empty() {
        println!("  (no metrics yet)");
    }
    for line in lines {
        println!("  {}", line);
    }
}

fn inspect(config: &EngineConfig, workflow: &Path) -> Result<bool> {
    let services = config.services(Rc::new(DirtyCanvas::new()), Rc::new(NoOverlay));
    let graph = FileManager::new().load_from_file(workflow, config.registry(), &services.context())?;

    for id in graph.node_ids() {
        let Some(node) = graph.get(id) else {
            continue;
        };
        let node = node.borrow();
        println!("#{} {}", id, node.node.node_type);
        print_lines(node.display().lines());
    }
    Ok(true)
}

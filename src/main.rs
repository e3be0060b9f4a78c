//! Chestward - Command Line Entry Point
//!
//! Loads an item catalog and category definitions, then inspects the
//! category graph or sorts a JSON world fixture. Results are printed as
//! JSON on stdout; logs go to stderr.

use chestward::audit::{AuditEvent, AuditQueue};
use chestward::category::{CategoryRegistry, ConfigSource};
use chestward::core::error::{Result, SortError};
use chestward::core::{config, set_config, BlockPos, SorterConfig};
use chestward::item::{ItemCatalog, ItemId};
use chestward::sorting::Sorter;
use chestward::storage::GridWorld;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

/// Sort items into labelled storage by category
#[derive(Parser, Debug)]
#[command(name = "chestward")]
#[command(about = "Classify items by category and sort them into labelled storage")]
struct Args {
    /// Item catalog (TOML)
    #[arg(long)]
    catalog: PathBuf,

    /// Category definitions (TOML), loaded in the order given
    #[arg(long = "categories", required = true)]
    categories: Vec<PathBuf>,

    /// Sorter settings (TOML with a [sorter] table)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List categories with their priority and resolved item count
    Categories,

    /// Show the categories an item routes to, in priority order
    Classify { item: String },

    /// Sort the contents of the [input] storage in a world fixture
    Sort {
        /// World fixture (JSON)
        #[arg(long)]
        world: PathBuf,

        /// Compute the outcome without moving anything
        #[arg(long)]
        preview: bool,

        /// Scan center as x,y,z
        #[arg(long, default_value = "0,64,0")]
        center: BlockPos,

        /// Write the sorted world here
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Find every container in range holding an item
    Locate {
        /// World fixture (JSON)
        #[arg(long)]
        world: PathBuf,

        /// Scan center as x,y,z
        #[arg(long, default_value = "0,64,0")]
        center: BlockPos,

        item: String,
    },
}

#[derive(Serialize)]
struct Classification {
    category: String,
    priority: i32,
}

#[derive(Serialize)]
struct Location {
    pos: String,
    count: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Some(path) = &args.config {
        let loaded = SorterConfig::parse_toml(&std::fs::read_to_string(path)?)?;
        if set_config(loaded).is_err() {
            tracing::warn!("Sorter config already set, ignoring {}", path.display());
        }
    }

    let catalog = ItemCatalog::load_from_toml(&args.catalog)?;
    let sources = args
        .categories
        .iter()
        .map(|path| read_source(path))
        .collect::<Result<Vec<_>>>()?;

    let (graph, report) = CategoryRegistry::build(&sources, &catalog, config())?;
    for cycle in &report.cycles {
        tracing::warn!("Include cycle rejected: {}", cycle.join(" -> "));
    }
    for name in &report.empty {
        tracing::warn!("Category '{}' matches no items", name);
    }
    tracing::info!("{} categories ready ({} resolved)", graph.len(), report.resolved);

    match args.command {
        Command::Categories => print_json(&graph.summary()),

        Command::Classify { item } => {
            let id = ItemId::new(&item);
            if !catalog.contains(&id) {
                return Err(SortError::UnknownItem(id.to_string()));
            }
            let matches: Vec<Classification> = graph
                .matching_categories(&id)
                .into_iter()
                .map(|c| Classification {
                    category: c.name.clone(),
                    priority: c.priority,
                })
                .collect();
            print_json(&matches)
        }

        Command::Sort {
            world,
            preview,
            center,
            output,
        } => {
            let mut world = GridWorld::load_from_file(&world)?;
            let rt = Runtime::new()?;

            let (queue, mut receiver) = AuditQueue::bounded(config().audit_queue_capacity);
            let consumer = rt.spawn(async move {
                while let Some(event) = receiver.recv().await {
                    tracing::info!(
                        "Audit: {} moved {} items in {} moves (preview: {})",
                        event.operation,
                        event.moved(),
                        event.moves.len(),
                        event.preview
                    );
                }
            });

            let mut sorter = Sorter::new(&graph, &catalog, &mut world, center);
            let result = sorter.sort_input(preview);
            let moves = sorter.take_moves();
            queue.publish(AuditEvent::new("sort_input", preview, result.clone(), moves));
            drop(queue);
            if let Err(err) = rt.block_on(consumer) {
                tracing::error!("Audit consumer failed: {}", err);
            }

            print_json(&result)?;
            if let Some(path) = output {
                if preview {
                    tracing::warn!("Preview run, not writing {}", path.display());
                } else {
                    std::fs::write(&path, world.to_json()?)?;
                    tracing::info!("Wrote sorted world to {}", path.display());
                }
            }
            Ok(())
        }

        Command::Locate {
            world,
            center,
            item,
        } => {
            let mut world = GridWorld::load_from_file(&world)?;
            let mut sorter = Sorter::new(&graph, &catalog, &mut world, center);
            let found: Vec<Location> = sorter
                .locate(&ItemId::new(&item))
                .into_iter()
                .map(|(pos, count)| Location {
                    pos: pos.to_string(),
                    count,
                })
                .collect();
            print_json(&found)
        }
    }
}

fn read_source(path: &Path) -> Result<ConfigSource> {
    let content = std::fs::read_to_string(path)?;
    Ok(ConfigSource::new(path.display().to_string(), content))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Crafting Planner
//!
//! Stores craftable items in a SQLite database and computes build lists.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use craft_planner::parse::{InputParser, format_recipe_line};
use craft_planner::report::{OutputsReport, StackSize, TieredReport};
use craft_planner::{Inventory, Recipe, Target, db, import, resolve};

#[derive(Parser)]
#[command(name = "craft-planner")]
#[command(about = "Build-list planner for batch crafting recipes")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "CRAFT_PLANNER_DB", default_value = "craft_planner.db")]
    database: PathBuf,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Import items from a JSON item database, a .recipes listing, or a directory of them
    Import {
        path: PathBuf,

        /// Clear existing items before importing
        #[arg(long)]
        clear: bool,
    },

    /// Export all items as a JSON item database
    Export { path: PathBuf },

    /// Add or overwrite an item
    Add {
        name: String,

        /// Units produced per batch
        #[arg(short = 'y', long = "yield", default_value_t = 1)]
        batch_yield: u64,

        /// Ingredient per batch as "QTY NAME" (repeatable, in order)
        #[arg(short, long = "ingredient")]
        ingredients: Vec<String>,
    },

    /// Replace an item's recipe, optionally renaming it everywhere it is used
    Edit {
        name: String,

        /// New name; recipes using the item are updated
        #[arg(long)]
        rename: Option<String>,

        /// New batch yield (kept if omitted)
        #[arg(short = 'y', long = "yield")]
        batch_yield: Option<u64>,

        /// Replacement ingredient list as "QTY NAME" (kept if omitted)
        #[arg(short, long = "ingredient")]
        ingredients: Vec<String>,

        /// Make the item a raw material
        #[arg(long, conflicts_with = "ingredients")]
        raw: bool,
    },

    /// Remove an item that no recipe uses
    Remove { name: String },

    /// Show an item, or every item whose name contains the query
    Lookup { query: String },

    /// List all items
    List {
        /// Only raw materials
        #[arg(long, conflicts_with = "craftable")]
        raw: bool,

        /// Only craftable items
        #[arg(long)]
        craftable: bool,
    },

    /// Calculate the build list for one or more targets
    Plan {
        /// Targets as "QTY NAME" (e.g. "3 Hopper")
        #[arg(required = true)]
        targets: Vec<String>,

        /// Items already on hand as "QTY NAME" (repeatable)
        #[arg(long)]
        have: Vec<String>,

        /// JSON object of items on hand, e.g. {"Coal": 12}
        #[arg(long)]
        inventory: Option<PathBuf>,

        /// Write leftover surplus to this JSON file
        #[arg(long)]
        save_extras: Option<PathBuf>,

        /// Only list what has to be produced, deepest items first
        #[arg(short, long)]
        outputs_only: bool,

        /// Stack size used to annotate quantities in the outputs view
        #[arg(long, env = "CRAFT_PLANNER_STACK_SIZE", default_value_t = StackSize::default())]
        stack_size: StackSize,
    },

    /// Load a small sample catalog for testing
    LoadSample,
}

const SAMPLE_RECIPES: &str = "\
# raw materials
Log
Coal
Iron Ingot
Redstone

# wood
Planks x4: 1 Log
Stick x4: 2 Planks

# crafted
Torch x4: 1 Stick, 1 Coal
Chest: 8 Planks
Hopper: 1 Chest, 5 Iron Ingot
Rail x16: 6 Iron Ingot, 1 Stick
Powered Rail x6: 6 Iron Ingot, 1 Stick, 1 Redstone
";

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::Import { path, clear } => {
            if clear {
                println!("Clearing existing items...");
                db::clear_items(&conn)?;
            }

            let stats = import::import_to_database(&conn, &path)?;
            println!("{}", stats);
        }

        Commands::Export { path } => {
            let count = import::export_json(&conn, &path)?;
            println!("Exported {} items to {}", count, path.display());
        }

        Commands::Add {
            name,
            batch_yield,
            ingredients,
        } => {
            let parser = InputParser::new()?;
            let ingredients = ingredients
                .iter()
                .map(|spec| parser.parse_ingredient(spec))
                .collect::<Result<Vec<_>>>()?;
            let recipe = Recipe::new(name, batch_yield, ingredients);

            db::upsert_item(&conn, &recipe)?;
            println!("Saved: {}", format_recipe_line(&recipe));
        }

        Commands::Edit {
            name,
            rename,
            batch_yield,
            ingredients,
            raw,
        } => {
            let Some(current) = db::get_item(&conn, &name)? else {
                bail!("item '{}' not found", name);
            };

            let parser = InputParser::new()?;
            let ingredients = if raw {
                Vec::new()
            } else if ingredients.is_empty() {
                current.ingredients.clone()
            } else {
                ingredients
                    .iter()
                    .map(|spec| parser.parse_ingredient(spec))
                    .collect::<Result<Vec<_>>>()?
            };
            let recipe = Recipe::new(
                rename.unwrap_or_else(|| current.name.clone()),
                batch_yield.unwrap_or(current.batch_yield),
                ingredients,
            );

            db::replace_item(&conn, &current.name, &recipe)?;
            println!("Replaced: {}", format_recipe_line(&current));
            println!("    with: {}", format_recipe_line(&recipe));
        }

        Commands::Remove { name } => {
            db::remove_item(&conn, &name)?;
            println!("Removed {}", name);
        }

        Commands::Lookup { query } => {
            if let Some(item) = db::get_item(&conn, &query)? {
                print_item(&conn, &item)?;
            } else {
                let matches = db::search_items(&conn, &query)?;
                if matches.is_empty() {
                    println!("No item matching '{}'", query);
                }
                for item in matches {
                    println!("{}", format_recipe_line(&item));
                }
            }
        }

        Commands::List { raw, craftable } => {
            let items = db::list_items(&conn)?;
            if items.is_empty() {
                println!("No items in database. Run 'import' or 'load-sample' first.");
            }
            for item in items
                .iter()
                .filter(|i| !raw || i.is_raw())
                .filter(|i| !craftable || !i.is_raw())
            {
                println!("{}", format_recipe_line(item));
            }
        }

        Commands::Plan {
            targets,
            have,
            inventory,
            save_extras,
            outputs_only,
            stack_size,
        } => {
            let parser = InputParser::new()?;
            let targets = targets
                .iter()
                .map(|spec| parser.parse_target(spec))
                .collect::<Result<Vec<Target>>>()?;
            let inventory = load_inventory(&parser, inventory.as_deref(), &have)?;

            let catalog = db::load_catalog(&conn)?;
            let plan = resolve(&catalog, &targets, &inventory)?;

            if outputs_only {
                print!("{}", OutputsReport::new(&plan, stack_size));
            } else {
                print!("{}", TieredReport::new(&plan));
            }

            if let Some(path) = save_extras {
                let json = serde_json::to_string_pretty(&plan.extras)?;
                fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("\nSaved {} leftover items to {}", plan.extras.len(), path.display());
            }
        }

        Commands::LoadSample => {
            db::clear_items(&conn)?;
            let stats = import::import_recipe_text(&conn, SAMPLE_RECIPES)?;
            println!("Loaded {} sample items", stats.items);
        }
    }

    Ok(())
}

fn print_item(conn: &Connection, item: &Recipe) -> Result<()> {
    println!("Item: {}", item.name);
    println!("  Yield per batch: {}", item.batch_yield);
    if item.is_raw() {
        println!("  Raw material");
    } else {
        println!("  Ingredients:");
        for ingredient in &item.ingredients {
            println!("    {} {}", ingredient.quantity, ingredient.name);
        }
    }

    let users = db::get_consumers(conn, &item.name)?;
    if !users.is_empty() {
        println!("  Used by: {}", users.join(", "));
    }
    Ok(())
}

/// Merge a JSON inventory file with `--have` entries
fn load_inventory(parser: &InputParser, file: Option<&Path>, have: &[String]) -> Result<Inventory> {
    let mut entries: Vec<(String, i64)> = Vec::new();

    if let Some(path) = file {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let stock: std::collections::BTreeMap<String, i64> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid inventory file {}", path.display()))?;
        entries.extend(stock);
    }

    for spec in have {
        entries.push(parser.parse_stock(spec)?);
    }

    Ok(Inventory::from_signed(entries)?)
}

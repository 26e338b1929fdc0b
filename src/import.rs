//! Bulk import and export of the item database
//!
//! Accepts JSON item databases (`{"items": [...]}`) and `.recipes`
//! listings with one item per line, either as single files or anywhere
//! below a directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::{ItemDatabase, Recipe};
use crate::parse::InputParser;

const JSON_EXT: &str = "json";
const LISTING_EXT: &str = "recipes";

fn is_catalog_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == JSON_EXT || ext == LISTING_EXT)
}

/// Find all importable files below `dir`, in a stable order.
/// Entries that cannot be read are skipped.
pub fn find_catalog_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_catalog_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files
}

/// Parse a single catalog file
fn read_catalog_file(parser: &InputParser, path: &Path) -> Result<Vec<Recipe>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == JSON_EXT) {
        let database: ItemDatabase = serde_json::from_str(&content)
            .with_context(|| format!("Invalid item database {}", path.display()))?;
        for recipe in &database.items {
            recipe.validate()?;
        }
        Ok(database.items)
    } else {
        parser.parse_recipe_text(&content)
    }
}

/// Store one file's recipes atomically
fn store(conn: &Connection, recipes: &[Recipe], stats: &mut ImportStats) -> Result<()> {
    db::upsert_items(conn, recipes)?;
    stats.items += recipes.len();
    stats.ingredients += recipes.iter().map(|r| r.ingredients.len()).sum::<usize>();
    Ok(())
}

/// Import a file, or every catalog file below a directory
pub fn import_to_database(conn: &Connection, path: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    let parser = InputParser::new()?;

    let files = if path.is_dir() {
        info!(dir = %path.display(), "scanning for catalog files");
        find_catalog_files(path)
    } else {
        vec![path.to_path_buf()]
    };

    for file in &files {
        let imported = read_catalog_file(&parser, file)
            .and_then(|recipes| store(conn, &recipes, &mut stats).map(|()| recipes.len()));
        match imported {
            Ok(items) => {
                stats.files += 1;
                info!(file = %file.display(), items, "imported");
            }
            Err(e) => {
                warn!(file = %file.display(), error = %format!("{e:#}"), "skipping catalog file");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

/// Import a recipe listing held in memory
pub fn import_recipe_text(conn: &Connection, text: &str) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    let recipes = InputParser::new()?.parse_recipe_text(text)?;
    store(conn, &recipes, &mut stats)?;
    stats.files = 1;
    Ok(stats)
}

/// Where the previous contents of `path` are kept: `data.json` becomes
/// `data-old-<sha256 prefix>.json`, so identical contents share one copy.
pub fn backup_path(path: &Path, contents: &[u8]) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let digest = hex::encode(hasher.finalize());

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "items".to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!("{stem}-old-{}{ext}", &digest[..12]))
}

/// Write the whole database as JSON, first keeping the previous file
/// under a content-addressed backup name
pub fn export_json(conn: &Connection, path: &Path) -> Result<usize> {
    let database = ItemDatabase {
        items: db::list_items(conn)?,
    };
    let json = serde_json::to_string_pretty(&database)?;

    if path.exists() {
        let previous =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let backup = backup_path(path, &previous);
        if !backup.exists() {
            fs::write(&backup, &previous)
                .with_context(|| format!("Failed to back up {}", path.display()))?;
        }
    }
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), items = database.items.len(), "exported item database");
    Ok(database.items.len())
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub files: usize,
    pub items: usize,
    pub ingredients: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} items ({} ingredient lines) from {} files. Errors: {}",
            self.items, self.ingredients, self.files, self.errors
        )
    }
}

//! Database schema and operations

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::catalog::Catalog;
use crate::models::{Ingredient, Quantity, Recipe};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Every known item; items without ingredients are raw materials
        CREATE TABLE IF NOT EXISTS items (
            name TEXT PRIMARY KEY,
            batch_yield INTEGER NOT NULL DEFAULT 1 CHECK (batch_yield >= 1)
        );

        -- Ingredients consumed per batch, in declared order
        CREATE TABLE IF NOT EXISTS item_ingredients (
            item_name TEXT NOT NULL,
            position INTEGER NOT NULL,
            ingredient_name TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity >= 1),
            PRIMARY KEY (item_name, position)
        );

        CREATE INDEX IF NOT EXISTS idx_item_ingredients_ingredient ON item_ingredients(ingredient_name);
        "#,
    )?;
    Ok(())
}

fn to_sql_quantity(quantity: Quantity, what: &str) -> Result<i64> {
    i64::try_from(quantity).with_context(|| format!("{what} {quantity} is too large to store"))
}

fn from_sql_quantity(value: i64, what: &str) -> Result<Quantity> {
    Quantity::try_from(value).with_context(|| format!("stored {what} {value} is negative"))
}

fn write_item(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (name, batch_yield) VALUES (?1, ?2)",
        (&recipe.name, to_sql_quantity(recipe.batch_yield, "batch yield")?),
    )?;
    conn.execute("DELETE FROM item_ingredients WHERE item_name = ?1", [&recipe.name])?;

    let mut stmt = conn.prepare(
        "INSERT INTO item_ingredients (item_name, position, ingredient_name, quantity)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, ingredient) in recipe.ingredients.iter().enumerate() {
        stmt.execute((
            &recipe.name,
            i64::try_from(position)?,
            &ingredient.name,
            to_sql_quantity(ingredient.quantity, "ingredient quantity")?,
        ))?;
    }
    Ok(())
}

/// Insert or replace an item together with its ingredient list
pub fn upsert_item(conn: &Connection, recipe: &Recipe) -> Result<()> {
    recipe.validate()?;
    let tx = conn.unchecked_transaction()?;
    write_item(&tx, recipe)?;
    tx.commit()?;
    Ok(())
}

/// Insert or replace several items in one transaction; nothing is
/// stored if any of them is invalid
pub fn upsert_items(conn: &Connection, recipes: &[Recipe]) -> Result<()> {
    for recipe in recipes {
        recipe.validate()?;
    }
    let tx = conn.unchecked_transaction()?;
    for recipe in recipes {
        write_item(&tx, recipe).with_context(|| format!("Failed to store '{}'", recipe.name))?;
    }
    tx.commit()?;
    Ok(())
}

/// Replace `old_name` with `recipe`, pointing every recipe that used the
/// old item at the new one.
pub fn replace_item(conn: &Connection, old_name: &str, recipe: &Recipe) -> Result<()> {
    recipe.validate()?;
    if get_item(conn, old_name)?.is_none() {
        bail!("item '{}' not found", old_name);
    }
    if recipe.name != old_name && get_item(conn, &recipe.name)?.is_some() {
        bail!("item '{}' already exists", recipe.name);
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM item_ingredients WHERE item_name = ?1", [old_name])?;
    tx.execute("DELETE FROM items WHERE name = ?1", [old_name])?;
    let renamed = tx.execute(
        "UPDATE item_ingredients SET ingredient_name = ?1 WHERE ingredient_name = ?2",
        (&recipe.name, old_name),
    )?;
    write_item(&tx, recipe)?;
    tx.commit()?;

    info!(old = old_name, new = %recipe.name, references = renamed, "replaced item");
    Ok(())
}

/// Remove an item. Fails while other recipes still use it.
pub fn remove_item(conn: &Connection, name: &str) -> Result<()> {
    let users = get_consumers(conn, name)?;
    if !users.is_empty() {
        bail!("item '{}' is still used by: {}", name, users.join(", "));
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM item_ingredients WHERE item_name = ?1", [name])?;
    let removed = tx.execute("DELETE FROM items WHERE name = ?1", [name])?;
    tx.commit()?;

    if removed == 0 {
        bail!("item '{}' not found", name);
    }
    Ok(())
}

/// Clear all items (for re-import)
pub fn clear_items(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM item_ingredients;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

fn get_ingredients(conn: &Connection, item_name: &str) -> Result<Vec<Ingredient>> {
    let mut stmt = conn.prepare(
        "SELECT ingredient_name, quantity
         FROM item_ingredients
         WHERE item_name = ?1
         ORDER BY position",
    )?;

    let rows = stmt.query_map([item_name], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

    let mut results = Vec::new();
    for row in rows {
        let (name, quantity) = row?;
        results.push(Ingredient::new(name, from_sql_quantity(quantity, "ingredient quantity")?));
    }
    Ok(results)
}

fn load_items(conn: &Connection, sql: &str, param: Option<&str>) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(sql)?;
    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(String, i64)> {
        Ok((row.get(0)?, row.get(1)?))
    };
    let rows = match param {
        Some(p) => stmt.query_map([p], map_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
        None => stmt.query_map([], map_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
    };

    let mut results = Vec::with_capacity(rows.len());
    for (name, batch_yield) in rows {
        let ingredients = get_ingredients(conn, &name)?;
        results.push(Recipe::new(
            name,
            from_sql_quantity(batch_yield, "batch yield")?,
            ingredients,
        ));
    }
    Ok(results)
}

/// Get a single item by exact name
pub fn get_item(conn: &Connection, name: &str) -> Result<Option<Recipe>> {
    let row = conn
        .query_row("SELECT name, batch_yield FROM items WHERE name = ?1", [name], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .optional()?;

    match row {
        Some((name, batch_yield)) => {
            let ingredients = get_ingredients(conn, &name)?;
            Ok(Some(Recipe::new(
                name,
                from_sql_quantity(batch_yield, "batch yield")?,
                ingredients,
            )))
        }
        None => Ok(None),
    }
}

/// List all items in the database
pub fn list_items(conn: &Connection) -> Result<Vec<Recipe>> {
    load_items(conn, "SELECT name, batch_yield FROM items ORDER BY name", None)
}

/// Case-insensitive substring search over item names
pub fn search_items(conn: &Connection, needle: &str) -> Result<Vec<Recipe>> {
    let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    load_items(
        conn,
        "SELECT name, batch_yield FROM items
         WHERE name LIKE '%' || ?1 || '%' ESCAPE '\\'
         ORDER BY name",
        Some(&escaped),
    )
}

/// Names of items whose recipes use `name` as an ingredient
pub fn get_consumers(conn: &Connection, name: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT item_name FROM item_ingredients WHERE ingredient_name = ?1 ORDER BY item_name",
    )?;

    let rows = stmt.query_map([name], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Load every item into an in-memory catalog for planning
pub fn load_catalog(conn: &Connection) -> Result<Catalog> {
    let items = list_items(conn)?;
    let catalog = Catalog::from_recipes(items)?;
    info!(items = catalog.len(), "loaded catalog");
    Ok(catalog)
}

//! Parsing of `QTY NAME` quantity entries and one-line recipe listings
//!
//! A recipe listing has one item per line:
//!
//! ```text
//! # comment
//! Log
//! Planks x4: 1 Log
//! Torch x4: 1 Stick, 1 Coal
//! ```

use anyhow::{Context, Result, anyhow};
use regex::Regex;

use crate::error::PlanError;
use crate::models::{Ingredient, Quantity, Recipe, Target};

pub struct InputParser {
    quantity_re: Regex,
    recipe_re: Regex,
}

impl InputParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // "12 Iron Plate", "12x Iron Plate", "-3 Coal"
            quantity_re: Regex::new(r"^\s*(-?\d+)\s*[xX]?\s+(\S.*?)\s*$")?,
            // "Torch x4: 1 Stick, 1 Coal" / "Log" / "Log:"
            recipe_re: Regex::new(r"^\s*([^:]+?)(?:\s+[xX](\d+))?\s*(?::\s*(.*?))?\s*$")?,
        })
    }

    /// Split `"QTY NAME"` into its name and signed quantity.
    pub fn parse_quantity(&self, spec: &str) -> Result<(String, i64)> {
        let caps = self
            .quantity_re
            .captures(spec)
            .ok_or_else(|| anyhow!("expected 'QTY NAME', got '{}'", spec.trim()))?;
        let quantity = caps[1]
            .parse::<i64>()
            .with_context(|| format!("quantity out of range in '{}'", spec.trim()))?;
        Ok((caps[2].to_string(), quantity))
    }

    pub fn parse_target(&self, spec: &str) -> Result<Target> {
        let (item, quantity) = self.parse_quantity(spec)?;
        match Quantity::try_from(quantity) {
            Ok(q) if q >= 1 => Ok(Target::new(item, q)),
            _ => Err(PlanError::InvalidTarget { item, quantity }.into()),
        }
    }

    pub fn parse_ingredient(&self, spec: &str) -> Result<Ingredient> {
        let (name, quantity) = self.parse_quantity(spec)?;
        match Quantity::try_from(quantity) {
            Ok(q) if q >= 1 => Ok(Ingredient::new(name, q)),
            _ => Err(anyhow!("ingredient quantity must be at least 1 in '{}'", spec.trim())),
        }
    }

    /// Parse a stock entry; negative counts are kept so the inventory can
    /// reject them with the item name attached.
    pub fn parse_stock(&self, spec: &str) -> Result<(String, i64)> {
        self.parse_quantity(spec)
    }

    pub fn parse_recipe_line(&self, line: &str) -> Result<Recipe> {
        let caps = self
            .recipe_re
            .captures(line)
            .ok_or_else(|| anyhow!("unrecognised recipe line '{}'", line.trim()))?;

        let name = caps[1].to_string();
        let batch_yield = match caps.get(2) {
            Some(m) => m
                .as_str()
                .parse::<Quantity>()
                .with_context(|| format!("batch yield out of range for '{name}'"))?,
            None => 1,
        };

        let mut ingredients = Vec::new();
        if let Some(list) = caps.get(3) {
            for part in list.as_str().split(',').filter(|p| !p.trim().is_empty()) {
                let ingredient = self
                    .parse_ingredient(part)
                    .with_context(|| format!("in recipe for '{name}'"))?;
                ingredients.push(ingredient);
            }
        }

        let recipe = Recipe::new(name, batch_yield, ingredients);
        recipe.validate()?;
        Ok(recipe)
    }

    /// Parse a whole listing, skipping blank lines and `#` comments.
    pub fn parse_recipe_text(&self, text: &str) -> Result<Vec<Recipe>> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with('#')
            })
            .map(|(n, line)| self.parse_recipe_line(line).with_context(|| format!("line {}", n + 1)))
            .collect()
    }
}

/// Render a recipe in listing form, the inverse of `parse_recipe_line`.
pub fn format_recipe_line(recipe: &Recipe) -> String {
    let mut line = recipe.name.clone();
    if recipe.batch_yield != 1 {
        line.push_str(&format!(" x{}", recipe.batch_yield));
    }
    if !recipe.is_raw() {
        let parts: Vec<String> = recipe
            .ingredients
            .iter()
            .map(|i| format!("{} {}", i.quantity, i.name))
            .collect();
        line.push_str(": ");
        line.push_str(&parts.join(", "));
    }
    line
}

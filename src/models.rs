//! Data models for craftable items and build targets

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

pub type Quantity = u64;

/// One line of a recipe: `quantity` units of `name` consumed per batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: Quantity,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: Quantity) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// A named item and how one batch of it is built.
///
/// An item without ingredients is a raw material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(rename = "batchYield", alias = "yield", default = "default_yield")]
    pub batch_yield: Quantity,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

fn default_yield() -> Quantity {
    1
}

impl Recipe {
    pub fn raw(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batch_yield: 1,
            ingredients: Vec::new(),
        }
    }

    pub fn new(name: impl Into<String>, batch_yield: Quantity, ingredients: Vec<Ingredient>) -> Self {
        Self {
            name: name.into(),
            batch_yield,
            ingredients,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.ingredients.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_yield < 1 {
            return Err(PlanError::InvalidRecipe {
                item: self.name.clone(),
                reason: "batch yield must be at least 1".to_string(),
            });
        }
        if let Some(bad) = self.ingredients.iter().find(|i| i.quantity < 1) {
            return Err(PlanError::InvalidRecipe {
                item: self.name.clone(),
                reason: format!("ingredient '{}' has quantity 0", bad.name),
            });
        }
        Ok(())
    }
}

/// A desired top-level output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub item: String,
    pub quantity: Quantity,
}

impl Target {
    pub fn new(item: impl Into<String>, quantity: Quantity) -> Self {
        Self {
            item: item.into(),
            quantity,
        }
    }
}

/// On-disk JSON shape of the item database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDatabase {
    pub items: Vec<Recipe>,
}

//! In-memory recipe catalog

use std::collections::{BTreeMap, HashMap};

use crate::error::{PlanError, Result};
use crate::models::Recipe;

/// Read-only lookup from item name to recipe for the duration of a plan.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    recipes: BTreeMap<String, Recipe>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_recipes(recipes: impl IntoIterator<Item = Recipe>) -> Result<Self> {
        let mut catalog = Self::new();
        for recipe in recipes {
            catalog.insert(recipe)?;
        }
        Ok(catalog)
    }

    /// Add a recipe; names must be unique.
    pub fn insert(&mut self, recipe: Recipe) -> Result<()> {
        if self.recipes.contains_key(&recipe.name) {
            return Err(PlanError::DuplicateItem(recipe.name));
        }
        self.recipes.insert(recipe.name.clone(), recipe);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Recipe> {
        self.recipes.get(name)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Fail if any recipe reachable from `roots` depends on itself.
    ///
    /// Names missing from the catalog are skipped; the resolver reports
    /// them together with the depth they were needed at.
    pub fn check_acyclic<'a>(&'a self, roots: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let mut visits: HashMap<&str, Visit> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();
        for root in roots {
            self.visit(root, &mut visits, &mut path)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        visits: &mut HashMap<&'a str, Visit>,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        match visits.get(name) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = path.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());
                return Err(PlanError::CyclicRecipe { cycle });
            }
            None => {}
        }

        let Some(recipe) = self.lookup(name) else {
            return Ok(());
        };

        visits.insert(name, Visit::InProgress);
        path.push(name);
        for ingredient in &recipe.ingredients {
            self.visit(&ingredient.name, visits, path)?;
        }
        path.pop();
        visits.insert(name, Visit::Done);
        Ok(())
    }
}

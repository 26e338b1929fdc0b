//! Crafting planner
//!
//! Works out every intermediate build and raw material needed to reach a
//! set of target items, given recipes that produce fixed-size batches.

pub mod calculator;
pub mod catalog;
pub mod db;
pub mod error;
pub mod import;
pub mod ledger;
pub mod models;
pub mod parse;
pub mod report;

pub use calculator::{BuildPlan, resolve};
pub use catalog::Catalog;
pub use error::PlanError;
pub use ledger::Inventory;
pub use models::{Ingredient, Quantity, Recipe, Target};

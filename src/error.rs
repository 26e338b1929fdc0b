//! Errors raised by the build resolver and its data structures

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanError>;

/// A resolution either fully succeeds or fails with one of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("unknown item '{name}' (required at depth {depth})")]
    UnknownItem { name: String, depth: usize },

    #[error("invalid recipe for '{item}': {reason}")]
    InvalidRecipe { item: String, reason: String },

    #[error("invalid target quantity {quantity} for '{item}' (must be at least 1)")]
    InvalidTarget { item: String, quantity: i64 },

    #[error("negative inventory quantity {quantity} for '{item}'")]
    NegativeInventory { item: String, quantity: i64 },

    #[error("item '{0}' is already defined")]
    DuplicateItem(String),

    #[error("cyclic recipe: {}", cycle.join(" -> "))]
    CyclicRecipe { cycle: Vec<String> },

    #[error("quantity overflow while planning '{item}'")]
    QuantityOverflow { item: String },
}

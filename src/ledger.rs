//! Demand queue and inventory ledger used by a single resolution run

use std::collections::{BTreeMap, VecDeque};

use crate::error::{PlanError, Result};
use crate::models::{Quantity, Target};

/// A pending production request at a given tree depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemandRequest {
    pub item: String,
    pub quantity: Quantity,
    pub depth: usize,
}

/// Strict FIFO work list. Processing order decides which request sees
/// which surplus, so nothing may reorder it.
#[derive(Debug, Default)]
pub struct DemandQueue {
    pending: VecDeque<DemandRequest>,
}

impl DemandQueue {
    /// Seed with the targets at depth 0, in the order given.
    pub fn seeded(targets: &[Target]) -> Self {
        let pending = targets
            .iter()
            .map(|t| DemandRequest {
                item: t.item.clone(),
                quantity: t.quantity,
                depth: 0,
            })
            .collect();
        Self { pending }
    }

    pub fn push(&mut self, item: impl Into<String>, quantity: Quantity, depth: usize) {
        self.pending.push_back(DemandRequest {
            item: item.into(),
            quantity,
            depth,
        });
    }

    pub fn pop(&mut self) -> Option<DemandRequest> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Available surplus per item. Zero entries are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    stock: BTreeMap<String, Quantity>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from user input, rejecting negative counts.
    /// Repeated names are summed.
    pub fn from_signed<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut inventory = Self::new();
        for (name, quantity) in entries {
            let name = name.into();
            let quantity = Quantity::try_from(quantity).map_err(|_| PlanError::NegativeInventory {
                item: name.clone(),
                quantity,
            })?;
            inventory.credit(&name, quantity)?;
        }
        Ok(inventory)
    }

    pub fn get(&self, name: &str) -> Quantity {
        self.stock.get(name).copied().unwrap_or(0)
    }

    /// Add surplus for `name`.
    pub fn credit(&mut self, name: &str, quantity: Quantity) -> Result<()> {
        if quantity == 0 {
            return Ok(());
        }
        let entry = self.stock.entry(name.to_string()).or_insert(0);
        *entry = entry
            .checked_add(quantity)
            .ok_or_else(|| PlanError::QuantityOverflow { item: name.to_string() })?;
        Ok(())
    }

    /// Take up to `needed` units of `name` from stock and return what is
    /// still unmet.
    pub fn offset(&mut self, name: &str, needed: Quantity) -> Quantity {
        let available = self.get(name);
        if available == 0 {
            return needed;
        }
        if available >= needed {
            let left = available - needed;
            if left == 0 {
                self.stock.remove(name);
            } else {
                self.stock.insert(name.to_string(), left);
            }
            0
        } else {
            self.stock.remove(name);
            needed - available
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
    }

    pub fn into_extras(self) -> BTreeMap<String, Quantity> {
        self.stock.into_iter().filter(|(_, q)| *q > 0).collect()
    }
}

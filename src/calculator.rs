//! Build list resolution
//!
//! Expands a set of targets breadth-first through the recipe catalog,
//! rounding every build up to whole batches and crediting the surplus of
//! each batch to an inventory ledger that later demand draws from.
//!
//! The ledger is only consulted for ingredient lines, never for a dequeued
//! request itself. A top-level target is therefore built in full even when
//! an earlier target left surplus of the same item; that surplus still
//! offsets any later ingredient demand and ends up in `extras`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{PlanError, Result};
use crate::ledger::{DemandQueue, Inventory};
use crate::models::{Quantity, Target};

/// Quantities per item name, sorted by name
pub type ItemCounts = BTreeMap<String, Quantity>;

/// Result of resolving a set of targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    /// Raw materials that must be acquired.
    pub needs: ItemCounts,
    /// Surplus left over once every request was served.
    pub extras: ItemCounts,
    /// Demanded quantity per item at each tree depth, before batching
    /// and before inventory offsets.
    pub tiers: BTreeMap<usize, ItemCounts>,
    /// Number of batches built per craftable item.
    pub batches: ItemCounts,
}

impl BuildPlan {
    /// Deepest tier reached, if anything was planned.
    pub fn max_depth(&self) -> Option<usize> {
        self.tiers.keys().next_back().copied()
    }
}

fn accumulate(counts: &mut ItemCounts, item: &str, quantity: Quantity) -> Result<()> {
    let entry = counts.entry(item.to_string()).or_insert(0);
    *entry = entry
        .checked_add(quantity)
        .ok_or_else(|| PlanError::QuantityOverflow { item: item.to_string() })?;
    Ok(())
}

/// Resolve `targets` against `catalog`, starting from `inventory`.
///
/// The caller's inventory is left untouched; surplus that nothing consumed
/// is returned in [`BuildPlan::extras`]. Any error aborts the whole run.
pub fn resolve(catalog: &Catalog, targets: &[Target], inventory: &Inventory) -> Result<BuildPlan> {
    if let Some(bad) = targets.iter().find(|t| t.quantity < 1) {
        return Err(PlanError::InvalidTarget {
            item: bad.item.clone(),
            quantity: 0,
        });
    }
    catalog.check_acyclic(targets.iter().map(|t| t.item.as_str()))?;

    let mut queue = DemandQueue::seeded(targets);
    let mut ledger = inventory.clone();
    let mut plan = BuildPlan::default();

    while let Some(request) = queue.pop() {
        let recipe = catalog
            .lookup(&request.item)
            .ok_or_else(|| PlanError::UnknownItem {
                name: request.item.clone(),
                depth: request.depth,
            })?;
        recipe.validate()?;

        let overflow = || PlanError::QuantityOverflow {
            item: request.item.clone(),
        };
        let batches = request.quantity.div_ceil(recipe.batch_yield);
        let produced = batches.checked_mul(recipe.batch_yield).ok_or_else(overflow)?;

        debug!(
            item = %request.item,
            quantity = request.quantity,
            depth = request.depth,
            batches,
            pending = queue.len(),
            "expanding demand"
        );

        accumulate(
            plan.tiers.entry(request.depth).or_default(),
            &request.item,
            request.quantity,
        )?;

        if recipe.is_raw() {
            accumulate(&mut plan.needs, &request.item, request.quantity)?;
        } else {
            accumulate(&mut plan.batches, &request.item, batches)?;
            let next_depth = request.depth + 1;
            for ingredient in &recipe.ingredients {
                let needed = batches.checked_mul(ingredient.quantity).ok_or_else(overflow)?;
                let unmet = ledger.offset(&ingredient.name, needed);
                if unmet > 0 {
                    queue.push(ingredient.name.as_str(), unmet, next_depth);
                } else {
                    debug!(ingredient = %ingredient.name, needed, "covered by inventory");
                }
            }
        }

        ledger.credit(&request.item, produced - request.quantity)?;
    }

    plan.extras = ledger.into_extras();
    Ok(plan)
}

//! Rendering of build plans

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use crate::calculator::BuildPlan;
use crate::models::Quantity;

/// Per-slot capacity used to annotate large quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackSize(NonZeroU64);

impl StackSize {
    /// 64 per slot
    pub const DEFAULT: StackSize = StackSize(NonZeroU64::new(64).unwrap());

    pub fn new(size: Quantity) -> Option<Self> {
        NonZeroU64::new(size).map(Self)
    }

    pub fn get(self) -> Quantity {
        self.0.get()
    }

    /// `(full stacks, remainder)` for `quantity`.
    pub fn split(self, quantity: Quantity) -> (Quantity, Quantity) {
        (quantity / self.get(), quantity % self.get())
    }
}

impl Default for StackSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for StackSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let size: Quantity = s.trim().parse().map_err(|e| format!("invalid stack size '{s}': {e}"))?;
        Self::new(size).ok_or_else(|| "stack size must be at least 1".to_string())
    }
}

impl fmt::Display for StackSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Full plan: every tier in depth order, then builds, needs and extras.
pub struct TieredReport<'a> {
    plan: &'a BuildPlan,
}

impl<'a> TieredReport<'a> {
    pub fn new(plan: &'a BuildPlan) -> Self {
        Self { plan }
    }
}

fn write_counts<'a>(
    f: &mut fmt::Formatter<'_>,
    counts: impl IntoIterator<Item = (&'a String, &'a Quantity)>,
) -> fmt::Result {
    let mut any = false;
    for (name, quantity) in counts {
        writeln!(f, "  {} {}", quantity, name)?;
        any = true;
    }
    if !any {
        writeln!(f, "  (none)")?;
    }
    Ok(())
}

impl fmt::Display for TieredReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Build Plan ===")?;
        for (depth, items) in &self.plan.tiers {
            writeln!(f, "Tier {}:", depth)?;
            write_counts(f, items)?;
        }
        writeln!(f)?;

        writeln!(f, "Builds:")?;
        write_counts(f, &self.plan.batches)?;
        writeln!(f)?;

        writeln!(f, "Needs:")?;
        write_counts(f, &self.plan.needs)?;
        writeln!(f)?;

        writeln!(f, "Extras:")?;
        write_counts(f, self.plan.extras.iter().filter(|(_, q)| **q > 0))?;

        Ok(())
    }
}

/// One deduplicated entry of the outputs-only view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub item: String,
    pub quantity: Quantity,
    /// Deepest tier the item appears at.
    pub depth: usize,
}

/// Everything that has to be produced, deepest items first, with each
/// item's quantity summed over all tiers.
pub fn outputs_only(plan: &BuildPlan) -> Vec<OutputLine> {
    let mut totals: BTreeMap<&str, Quantity> = BTreeMap::new();
    for items in plan.tiers.values() {
        for (name, quantity) in items {
            let total = totals.entry(name.as_str()).or_insert(0);
            *total = total.saturating_add(*quantity);
        }
    }

    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(totals.len());
    for (depth, items) in plan.tiers.iter().rev() {
        for name in items.keys() {
            if seen.insert(name.as_str()) {
                lines.push(OutputLine {
                    item: name.clone(),
                    quantity: totals.get(name.as_str()).copied().unwrap_or(0),
                    depth: *depth,
                });
            }
        }
    }
    lines
}

/// Formats `quantity` as `"130 (2x64 + 2)"` once it exceeds a stack.
pub fn format_quantity(quantity: Quantity, stack: StackSize) -> String {
    if quantity > stack.get() {
        let (stacks, remainder) = stack.split(quantity);
        format!("{} ({}x{} + {})", quantity, stacks, stack, remainder)
    } else {
        quantity.to_string()
    }
}

pub struct OutputsReport<'a> {
    plan: &'a BuildPlan,
    stack: StackSize,
}

impl<'a> OutputsReport<'a> {
    pub fn new(plan: &'a BuildPlan, stack: StackSize) -> Self {
        Self { plan, stack }
    }
}

impl fmt::Display for OutputsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Outputs (stack size {}) ===", self.stack)?;
        for line in outputs_only(self.plan) {
            writeln!(f, "  {} {}", format_quantity(line.quantity, self.stack), line.item)?;
        }
        Ok(())
    }
}

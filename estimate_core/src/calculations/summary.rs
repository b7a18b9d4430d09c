//! # Estimate Summarizer
//!
//! Rolls priced lines up into a [`ProjectEstimate`].
//!
//! ## Formulas
//!
//! - `base = Σ total_material_cost + Σ total_labor_cost` (exact, no rounding)
//! - `overhead = round(base * overhead_rate, 2)`
//! - `profit = round(base * profit_rate, 2)`
//! - `final = base + overhead + profit`
//!
//! Markup is applied here and only here; line items never carry it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{EstimateError, EstimateResult};
use crate::takeoff::ComputedLineItem;
use crate::units::{Money, Rate};

/// Overhead and profit applied to the base cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkupPolicy {
    /// Overhead fraction (0.15 = 15%)
    pub overhead_rate: Rate,
    /// Profit fraction (0.10 = 10%)
    pub profit_rate: Rate,
}

impl MarkupPolicy {
    /// 15% overhead, 10% profit
    pub fn reference() -> Self {
        MarkupPolicy {
            overhead_rate: Rate::percent(15),
            profit_rate: Rate::percent(10),
        }
    }

    /// Create a policy from explicit rates
    pub fn new(overhead_rate: Rate, profit_rate: Rate) -> Self {
        MarkupPolicy {
            overhead_rate,
            profit_rate,
        }
    }

    /// Reject rates below zero or above [`MAX_RATE`](crate::units::MAX_RATE).
    pub fn validate(&self) -> EstimateResult<()> {
        for (field, rate) in [("overhead_rate", self.overhead_rate), ("profit_rate", self.profit_rate)] {
            Rate::try_new(rate.value())
                .map_err(|reason| EstimateError::invalid_input(field, rate.to_string(), reason))?;
        }
        Ok(())
    }
}

impl Default for MarkupPolicy {
    fn default() -> Self {
        Self::reference()
    }
}

/// Costs rolled up for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub line_count: usize,
    pub element_count: usize,
    pub total_material_cost: Money,
    pub total_labor_cost: Money,
    pub total_cost: Money,
}

/// Project-level totals for one batch of priced lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEstimate {
    /// Σ line material costs
    pub total_material_cost: Money,
    /// Σ line labor costs
    pub total_labor_cost: Money,
    /// material + labor, before markup
    pub base_total_cost: Money,
    pub overhead_rate: Rate,
    pub profit_rate: Rate,
    pub overhead_amount: Money,
    pub profit_amount: Money,
    /// base + overhead + profit
    pub final_cost: Money,
    /// Number of priced lines
    pub line_count: usize,
    /// Number of source elements behind those lines
    pub element_count: usize,
    /// Lines priced with the fallback unit cost
    pub fallback_line_count: usize,
    /// Per-category rollup, ordered by category name
    pub category_totals: Vec<CategoryTotal>,
}

/// The `summary` block of the structured report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateSummary {
    pub total_material_cost: Money,
    pub total_labor_cost: Money,
    pub grand_total: Money,
    pub item_count: usize,
    pub element_count: usize,
}

/// The markup document emitted next to the structured report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupSummary {
    pub base_cost: Money,
    pub overhead: Money,
    pub profit: Money,
    pub final_cost: Money,
}

impl ProjectEstimate {
    /// Pre-markup totals in report form
    pub fn summary(&self) -> EstimateSummary {
        EstimateSummary {
            total_material_cost: self.total_material_cost,
            total_labor_cost: self.total_labor_cost,
            grand_total: self.base_total_cost,
            item_count: self.line_count,
            element_count: self.element_count,
        }
    }

    /// Markup breakdown in report form
    pub fn markup(&self) -> MarkupSummary {
        MarkupSummary {
            base_cost: self.base_total_cost,
            overhead: self.overhead_amount,
            profit: self.profit_amount,
            final_cost: self.final_cost,
        }
    }
}

fn overflow(field: &str) -> EstimateError {
    EstimateError::invalid_input(field, "overflow", "Total exceeds the representable amount")
}

/// Exact sum of amounts, failing instead of overflowing.
fn checked_total(mut amounts: impl Iterator<Item = Money>, field: &str) -> EstimateResult<Money> {
    amounts
        .try_fold(Money::zero(), Money::checked_add)
        .ok_or_else(|| overflow(field))
}

/// Summarize priced lines into a project estimate.
///
/// # Errors
///
/// - `EmptyBatch` if `items` is empty
/// - `InvalidInput` if a markup rate is out of range, or a total would
///   overflow
///
/// # Example
///
/// ```rust
/// use estimate_core::calculations::summary::{summarize, MarkupPolicy};
///
/// let err = summarize(&[], &MarkupPolicy::reference()).unwrap_err();
/// assert_eq!(err.error_code(), "EMPTY_BATCH");
/// ```
pub fn summarize(items: &[ComputedLineItem], markup: &MarkupPolicy) -> EstimateResult<ProjectEstimate> {
    if items.is_empty() {
        return Err(EstimateError::empty_batch("No priced line items to summarize"));
    }
    markup.validate()?;

    let mut categories: BTreeMap<&str, CategoryTotal> = BTreeMap::new();
    for item in items {
        let total = categories
            .entry(item.category.as_str())
            .or_insert_with(|| CategoryTotal {
                category: item.category.clone(),
                line_count: 0,
                element_count: 0,
                total_material_cost: Money::zero(),
                total_labor_cost: Money::zero(),
                total_cost: Money::zero(),
            });
        total.line_count += 1;
        total.element_count += item.element_count;
        total.total_material_cost = checked_total(
            [total.total_material_cost, item.total_material_cost].into_iter(),
            "total_material_cost",
        )?;
        total.total_labor_cost =
            checked_total([total.total_labor_cost, item.total_labor_cost].into_iter(), "total_labor_cost")?;
        total.total_cost = checked_total([total.total_cost, item.total_cost].into_iter(), "total_cost")?;
    }

    let total_material_cost = checked_total(items.iter().map(|i| i.total_material_cost), "total_material_cost")?;
    let total_labor_cost = checked_total(items.iter().map(|i| i.total_labor_cost), "total_labor_cost")?;
    let base_total_cost = checked_total([total_material_cost, total_labor_cost].into_iter(), "base_total_cost")?;

    let overhead_amount = base_total_cost
        .apply_rate(markup.overhead_rate)
        .ok_or_else(|| overflow("overhead_amount"))?;
    let profit_amount = base_total_cost
        .apply_rate(markup.profit_rate)
        .ok_or_else(|| overflow("profit_amount"))?;
    let final_cost = checked_total([base_total_cost, overhead_amount, profit_amount].into_iter(), "final_cost")?;

    let estimate = ProjectEstimate {
        total_material_cost,
        total_labor_cost,
        base_total_cost,
        overhead_rate: markup.overhead_rate,
        profit_rate: markup.profit_rate,
        overhead_amount,
        profit_amount,
        final_cost,
        line_count: items.len(),
        element_count: items.iter().map(|i| i.element_count).sum(),
        fallback_line_count: items.iter().filter(|i| i.priced_by_fallback).count(),
        category_totals: categories.into_values().collect(),
    };

    info!(
        lines = estimate.line_count,
        elements = estimate.element_count,
        fallback = estimate.fallback_line_count,
        base = %estimate.base_total_cost,
        final_cost = %estimate.final_cost,
        "Estimate summarized"
    );

    Ok(estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::line_item::compute_batch;
    use crate::catalog::CostCatalog;
    use crate::takeoff::TakeoffLineItem;
    use crate::units::{Quantity, MAX_RATE};
    use rust_decimal::Decimal;

    fn priced(rows: &[(&str, &str, &str)]) -> Vec<ComputedLineItem> {
        let items: Vec<_> = rows
            .iter()
            .map(|(c, m, q)| TakeoffLineItem::new(*c, *m, Quantity::parse(q).unwrap()))
            .collect();
        compute_batch(CostCatalog::reference(), &items)
    }

    #[test]
    fn test_reference_markup_on_round_base() {
        // Two fallback lines at 20 * (10 + 15) = 500.00 each.
        let items = priced(&[("Gizmo", "A", "20"), ("Gizmo", "B", "20")]);
        let estimate = summarize(&items, &MarkupPolicy::reference()).unwrap();

        assert_eq!(estimate.base_total_cost, Money::from_cents(100_000));
        assert_eq!(estimate.overhead_amount, Money::from_cents(15_000));
        assert_eq!(estimate.profit_amount, Money::from_cents(10_000));
        assert_eq!(estimate.final_cost, Money::from_cents(125_000));
        assert_eq!(estimate.fallback_line_count, 2);
    }

    #[test]
    fn test_final_cost_formula() {
        let items = priced(&[
            ("Pipe", "Copper", "12.34"),
            ("Cable", "Data", "333.333"),
            ("Floor", "Tile", "77.7"),
        ]);
        let markup = MarkupPolicy::new(Rate::parse("0.0725").unwrap(), Rate::parse("0.125").unwrap());
        let estimate = summarize(&items, &markup).unwrap();

        let base = estimate.base_total_cost;
        assert_eq!(estimate.overhead_amount, Money::rounded(base.value() * markup.overhead_rate.value()));
        assert_eq!(estimate.profit_amount, Money::rounded(base.value() * markup.profit_rate.value()));
        assert_eq!(estimate.final_cost, base + estimate.overhead_amount + estimate.profit_amount);
    }

    #[test]
    fn test_totals_are_exact_sums() {
        let items = priced(&[("Wall", "Drywall", "100"), ("Gizmo", "X", "5")]);
        let estimate = summarize(&items, &MarkupPolicy::reference()).unwrap();

        assert_eq!(estimate.total_material_cost, Money::from_cents(18_500 + 5_000));
        assert_eq!(estimate.total_labor_cost, Money::from_cents(32_500 + 7_500));
        assert_eq!(estimate.base_total_cost, Money::from_cents(51_000 + 12_500));
        assert_eq!(estimate.line_count, 2);
        assert_eq!(estimate.element_count, 2);
    }

    #[test]
    fn test_order_independent() {
        let mut items = priced(&[
            ("Pipe", "PVC", "10.5"),
            ("Door", "Exterior", "3"),
            ("Pipe", "PEX", "0.15"),
            ("Ceiling", "Acoustic", "421.7"),
        ]);
        let forward = summarize(&items, &MarkupPolicy::reference()).unwrap();
        items.reverse();
        let backward = summarize(&items, &MarkupPolicy::reference()).unwrap();
        items.swap(0, 2);
        let shuffled = summarize(&items, &MarkupPolicy::reference()).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_category_totals_grouped_and_sorted() {
        let items = priced(&[("Pipe", "PVC", "10"), ("Door", "Interior", "1"), ("Pipe", "Copper", "1")]);
        let estimate = summarize(&items, &MarkupPolicy::reference()).unwrap();

        let names: Vec<_> = estimate.category_totals.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, ["Door", "Pipe"]);

        let pipe = &estimate.category_totals[1];
        assert_eq!(pipe.line_count, 2);
        let category_sum: Money = estimate.category_totals.iter().map(|c| c.total_cost).sum();
        assert_eq!(category_sum, estimate.base_total_cost);
    }

    #[test]
    fn test_element_count_from_aggregated_lines() {
        let mut items = priced(&[("IfcDoor", "Generic", "4")]);
        items[0].element_count = 4;
        let estimate = summarize(&items, &MarkupPolicy::reference()).unwrap();
        assert_eq!(estimate.line_count, 1);
        assert_eq!(estimate.element_count, 4);
        assert_eq!(estimate.summary().item_count, 1);
        assert_eq!(estimate.summary().element_count, 4);
    }

    #[test]
    fn test_empty_batch() {
        let err = summarize(&[], &MarkupPolicy::reference()).unwrap_err();
        assert!(matches!(err, EstimateError::EmptyBatch { .. }));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let items = priced(&[("Wall", "Drywall", "1")]);
        let markup = MarkupPolicy::new(Rate(Decimal::new(-1, 1)), Rate::percent(10));
        let err = summarize(&items, &markup).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_huge_rate_rejected_not_overflowed() {
        let items = priced(&[("Wall", "Drywall", "100")]);
        let markup = MarkupPolicy::new(Rate(Decimal::MAX), Rate::percent(10));
        let err = summarize(&items, &markup).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let at_ceiling = MarkupPolicy::new(Rate(MAX_RATE), Rate::percent(0));
        let estimate = summarize(&items, &at_ceiling).unwrap();
        assert_eq!(estimate.overhead_amount, Money::from_cents(510_000));
    }

    #[test]
    fn test_overflowing_totals_rejected() {
        let mut items = priced(&[("Wall", "Drywall", "1"), ("Wall", "Drywall", "1")]);
        for item in &mut items {
            item.total_material_cost = Money(Decimal::MAX);
        }
        let err = summarize(&items, &MarkupPolicy::reference()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_zero_markup() {
        let items = priced(&[("Wall", "Drywall", "100")]);
        let estimate = summarize(&items, &MarkupPolicy::new(Rate::percent(0), Rate::percent(0))).unwrap();
        assert_eq!(estimate.final_cost, estimate.base_total_cost);
    }

    #[test]
    fn test_markup_summary_json() {
        let items = priced(&[("Gizmo", "A", "40")]);
        let estimate = summarize(&items, &MarkupPolicy::reference()).unwrap();
        let json = serde_json::to_string(&estimate.markup()).unwrap();
        assert_eq!(
            json,
            r#"{"base_cost":1000.00,"overhead":150.00,"profit":100.00,"final_cost":1250.00}"#
        );
    }
}

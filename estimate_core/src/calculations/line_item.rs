//! # Line-Item Calculator
//!
//! Prices one takeoff line against the catalog.
//!
//! ## Algorithm
//!
//! 1. Resolve unit prices for `(category, material)`; unknown pairs get the
//!    fallback unit cost rather than an error.
//! 2. `total_material_cost = round(quantity * material_unit_price, 2)`
//! 3. `total_labor_cost = round(quantity * labor_unit_price, 2)`
//! 4. `total_cost = total_material_cost + total_labor_cost` (the sum is not
//!    rounded again)
//!
//! Rounding is half-up on exact decimals.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::calculations::line_item::compute;
//! use estimate_core::catalog::CostCatalog;
//! use estimate_core::takeoff::TakeoffLineItem;
//! use estimate_core::units::Quantity;
//!
//! let item = TakeoffLineItem::new("Wall", "Drywall", Quantity::parse("100").unwrap());
//! let priced = compute(CostCatalog::reference(), &item);
//!
//! assert_eq!(priced.total_material_cost.to_string(), "185.00");
//! assert_eq!(priced.total_labor_cost.to_string(), "325.00");
//! assert_eq!(priced.total_cost.to_string(), "510.00");
//! ```

use tracing::debug;

use crate::catalog::CostCatalog;
use crate::takeoff::{ComputedLineItem, TakeoffLineItem};

/// Price a single takeoff line.
///
/// Never fails: quantities are validated when the line is built, and
/// out-of-catalog pairs are priced with the fallback unit cost.
pub fn compute(catalog: &CostCatalog, item: &TakeoffLineItem) -> ComputedLineItem {
    let unit_cost = catalog.lookup(&item.category, &item.material);

    if unit_cost.is_fallback {
        debug!(
            category = %item.category,
            material = %item.material,
            tag = %item.tag,
            "No catalog entry, using fallback unit cost"
        );
    }

    let total_material_cost = item.quantity.extend(unit_cost.material_unit_price);
    let total_labor_cost = item.quantity.extend(unit_cost.labor_unit_price);

    ComputedLineItem {
        tag: item.tag.clone(),
        category: item.category.clone(),
        item_type: item.item_type.clone(),
        quantity: item.quantity,
        unit: item.unit.clone(),
        material: item.material.clone(),
        notes: item.notes.clone(),
        material_unit_price: unit_cost.material_unit_price,
        labor_unit_price: unit_cost.labor_unit_price,
        total_material_cost,
        total_labor_cost,
        total_cost: total_material_cost + total_labor_cost,
        cost_unit: unit_cost.unit.code().to_string(),
        element_count: item.element_count,
        priced_by_fallback: unit_cost.is_fallback,
    }
}

/// Price a sequence of lines, preserving order.
pub fn compute_batch<'a>(
    catalog: &CostCatalog,
    items: impl IntoIterator<Item = &'a TakeoffLineItem>,
) -> Vec<ComputedLineItem> {
    items.into_iter().map(|item| compute(catalog, item)).collect()
}

//! # Quantity Aggregator
//!
//! Turns element records from a BIM export into one takeoff line per
//! category.
//!
//! The measure summed for a category comes from the catalog's
//! [`MeasureKind`] for it:
//!
//! | Kind   | Quantity                        | Missing measure      |
//! |--------|---------------------------------|----------------------|
//! | Area   | sum of element areas            | default area (10.0)  |
//! | Length | sum of element lengths          | default length (3.0) |
//! | Volume | sum of element volumes          | default volume (1.0) |
//! | Count  | number of elements              | n/a                  |
//!
//! Elements with a missing (or unusable) measure are priced at the default
//! rather than dropped. Categories with no elements produce no line. When a
//! group's elements name different materials, the line is priced at the
//! catalog's default material and its notes say so.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::calculations::aggregate::{aggregate, AggregationDefaults};
//! use estimate_core::catalog::CostCatalog;
//! use estimate_core::takeoff::ElementRecord;
//! use estimate_core::units::Quantity;
//!
//! let elements = vec![
//!     ElementRecord::new("IfcWall").with_area(Quantity::parse("12.5").unwrap()),
//!     ElementRecord::new("IfcWall"), // no area annotation
//!     ElementRecord::new("IfcDoor"),
//! ];
//!
//! let lines = aggregate(CostCatalog::reference(), &elements, &AggregationDefaults::default()).unwrap();
//! assert_eq!(lines.len(), 2);
//! assert_eq!(lines[0].category, "IfcDoor");
//! assert_eq!(lines[1].quantity.to_string(), "22.5");
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::line_item::compute_batch;
use crate::catalog::CostCatalog;
use crate::errors::{EstimateError, EstimateResult};
use crate::takeoff::{ComputedLineItem, ElementRecord, TakeoffLineItem};
use crate::units::{MeasureKind, Quantity};

/// Category assigned to elements that arrive without one
pub const UNCLASSIFIED_CATEGORY: &str = "Unclassified";

/// Measures substituted for elements that carry no quantity annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationDefaults {
    /// Default area per element
    pub area: Quantity,
    /// Default length per element
    pub length: Quantity,
    /// Default volume per element
    pub volume: Quantity,
}

impl Default for AggregationDefaults {
    fn default() -> Self {
        AggregationDefaults {
            area: Quantity(rust_decimal::Decimal::new(100, 1)),
            length: Quantity(rust_decimal::Decimal::new(30, 1)),
            volume: Quantity(rust_decimal::Decimal::new(10, 1)),
        }
    }
}

impl AggregationDefaults {
    /// Each default must be a positive, in-range quantity.
    pub fn validate(&self) -> EstimateResult<()> {
        for (field, value) in [("area", self.area), ("length", self.length), ("volume", self.volume)] {
            let field = format!("aggregation.{}", field);
            let checked = Quantity::try_new(value.value())
                .map_err(|reason| EstimateError::invalid_input(field.as_str(), value.to_string(), reason))?;
            if checked.value().is_zero() {
                return Err(EstimateError::invalid_input(
                    field,
                    value.to_string(),
                    "Default measure must be greater than zero",
                ));
            }
        }
        Ok(())
    }

    fn for_kind(&self, kind: MeasureKind) -> Quantity {
        match kind {
            MeasureKind::Area => self.area,
            MeasureKind::Length => self.length,
            MeasureKind::Volume => self.volume,
            MeasureKind::Count => Quantity::from_count(1),
        }
    }
}

/// Measure of one element for the given kind, or `None` if the default
/// must be used.
fn element_measure(element: &ElementRecord, kind: MeasureKind) -> Option<Quantity> {
    let raw = match kind {
        MeasureKind::Area => element.area,
        MeasureKind::Length => element.length,
        MeasureKind::Volume => element.volume,
        MeasureKind::Count => return Some(Quantity::from_count(1)),
    }?;

    match Quantity::try_new(raw.value()) {
        Ok(q) => Some(q),
        Err(reason) => {
            warn!(
                category = %element.category,
                name = element.name.as_deref().unwrap_or(""),
                %reason,
                "Unusable {} annotation, substituting default", kind
            );
            None
        }
    }
}

/// Material shared by every element of a group, if they agree on one.
fn shared_material<'a>(elements: &[&'a ElementRecord]) -> Option<&'a str> {
    let first = elements.first()?.material.as_deref()?;
    elements
        .iter()
        .all(|e| e.material.as_deref() == Some(first))
        .then_some(first)
}

/// Distinct materials named by a group's elements, sorted.
fn named_materials<'a>(elements: &[&'a ElementRecord]) -> BTreeSet<&'a str> {
    elements
        .iter()
        .filter_map(|e| e.material.as_deref())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .collect()
}

fn aggregate_group(
    catalog: &CostCatalog,
    category: &str,
    group: &[&ElementRecord],
    defaults: &AggregationDefaults,
) -> EstimateResult<TakeoffLineItem> {
    let kind = catalog.measure_kind(category);
    let count = group.len();

    let mut material_note = None;
    let material = match shared_material(group) {
        Some(shared) => shared.to_string(),
        None => {
            let fallback = catalog.default_material(category);
            let named = named_materials(group);
            if !named.is_empty() {
                let named = named.into_iter().collect::<Vec<_>>().join("/");
                warn!(category, materials = %named, priced_as = %fallback, "Elements disagree on material");
                material_note = Some(format!("mixed materials {} priced as {}", named, fallback));
            }
            fallback
        }
    };

    let mut defaulted = 0usize;
    let mut quantity = Quantity::zero();
    for element in group {
        let measure = element_measure(element, kind).unwrap_or_else(|| {
            defaulted += 1;
            defaults.for_kind(kind)
        });
        quantity = quantity.checked_add(measure).map_err(|reason| {
            EstimateError::invalid_input(format!("{}.quantity", category), measure.to_string(), reason)
        })?;
    }

    let mut notes = vec![format!("{} elements by {}", count, kind)];
    if defaulted > 0 {
        notes.push(format!("{} used default {}", defaulted, kind));
    }
    notes.extend(material_note);

    debug!(category, count, defaulted, %quantity, "Aggregated category");

    let unit = catalog.lookup(category, &material).unit;
    Ok(TakeoffLineItem::new(category, material, quantity)
        .with_unit(unit.code())
        .with_notes(notes.join("; "))
        .with_element_count(count))
}

/// Group elements by category and emit one takeoff line per category.
///
/// Lines are ordered by category name.
///
/// # Errors
///
/// `InvalidInput` if a default measure is not positive, or a category's
/// summed quantity exceeds [`MAX_QUANTITY`](crate::units::MAX_QUANTITY).
pub fn aggregate(
    catalog: &CostCatalog,
    elements: &[ElementRecord],
    defaults: &AggregationDefaults,
) -> EstimateResult<Vec<TakeoffLineItem>> {
    defaults.validate()?;

    let mut groups: BTreeMap<&str, Vec<&ElementRecord>> = BTreeMap::new();
    for element in elements {
        let category = element.category.trim();
        let key = if category.is_empty() { UNCLASSIFIED_CATEGORY } else { category };
        groups.entry(key).or_default().push(element);
    }

    groups
        .into_iter()
        .map(|(category, group)| aggregate_group(catalog, category, &group, defaults))
        .collect()
}

/// Aggregate elements, then price each category line.
pub fn aggregate_and_compute(
    catalog: &CostCatalog,
    elements: &[ElementRecord],
    defaults: &AggregationDefaults,
) -> EstimateResult<Vec<ComputedLineItem>> {
    let lines = aggregate(catalog, elements, defaults)?;
    Ok(compute_batch(catalog, &lines))
}

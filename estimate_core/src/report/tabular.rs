//! CSV output: priced lines with a closing `TOTAL` row, and the catalog listing.

use csv::Writer;

use crate::catalog::CostCatalog;
use crate::errors::{EstimateError, EstimateResult};
use crate::takeoff::ComputedLineItem;
use crate::units::Money;

/// Column header of the line-item table
pub const LINE_ITEM_HEADER: [&str; 12] = [
    "tag",
    "category",
    "type",
    "quantity",
    "unit",
    "material",
    "notes",
    "material_cost_per_unit",
    "labor_cost_per_unit",
    "total_material_cost",
    "total_labor_cost",
    "total_cost",
];

const CATALOG_HEADER: [&str; 6] = [
    "category",
    "material",
    "material_unit_price",
    "labor_unit_price",
    "unit",
    "measure_kind",
];

fn csv_error(e: impl std::fmt::Display) -> EstimateError {
    EstimateError::serialization(format!("CSV output failed: {}", e))
}

fn finish(writer: Writer<Vec<u8>>) -> EstimateResult<String> {
    let bytes = writer.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(|e| EstimateError::Internal {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

/// Render priced lines as CSV.
///
/// The last row is `TOTAL` with blank descriptive columns and the three cost
/// sums at two decimal places.
pub fn render_csv(items: &[ComputedLineItem]) -> EstimateResult<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(LINE_ITEM_HEADER).map_err(csv_error)?;

    for item in items {
        writer
            .write_record([
                item.tag.clone(),
                item.category.clone(),
                item.item_type.clone(),
                item.quantity.to_string(),
                item.unit.clone(),
                item.material.clone(),
                item.notes.clone(),
                item.material_unit_price.to_string(),
                item.labor_unit_price.to_string(),
                item.total_material_cost.to_string(),
                item.total_labor_cost.to_string(),
                item.total_cost.to_string(),
            ])
            .map_err(csv_error)?;
    }

    let material: Money = items.iter().map(|i| i.total_material_cost).sum();
    let labor: Money = items.iter().map(|i| i.total_labor_cost).sum();
    let total: Money = items.iter().map(|i| i.total_cost).sum();

    let mut totals = vec![String::new(); LINE_ITEM_HEADER.len()];
    totals[0] = "TOTAL".to_string();
    totals[9] = material.to_string();
    totals[10] = labor.to_string();
    totals[11] = total.to_string();
    writer.write_record(&totals).map_err(csv_error)?;

    finish(writer)
}

/// Render a catalog as CSV, ordered by category then material.
pub fn render_catalog_csv(catalog: &CostCatalog) -> EstimateResult<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CATALOG_HEADER).map_err(csv_error)?;

    for entry in catalog.entries() {
        writer
            .write_record([
                entry.category.as_str(),
                entry.material.as_str(),
                &entry.material_unit_price.to_string(),
                &entry.labor_unit_price.to_string(),
                entry.unit.code(),
                entry.measure_kind.name(),
            ])
            .map_err(csv_error)?;
    }

    finish(writer)
}

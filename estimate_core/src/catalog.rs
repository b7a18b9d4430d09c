//! # Cost Catalog
//!
//! Unit material and labor prices keyed by `(category, material)`.
//!
//! The catalog is read-only configuration: it is built once (either the
//! built-in [`CostCatalog::reference`] table or a JSON file loaded through
//! [`crate::file_io::load_catalog`]) and then passed by reference into the
//! calculator and aggregator.
//!
//! ## Fallback Pricing
//!
//! A pair that is not in the catalog is never an error. [`CostCatalog::lookup`]
//! returns [`UnitCost::fallback`] (material 10.00, labor 15.00, unit `UN`) so
//! one unknown material cannot abort a batch.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::catalog::CostCatalog;
//! use estimate_core::units::MeasurementUnit;
//!
//! let catalog = CostCatalog::reference();
//!
//! let drywall = catalog.lookup("Wall", "Drywall");
//! assert_eq!(drywall.material_unit_price.to_string(), "1.85");
//! assert_eq!(drywall.unit, MeasurementUnit::SquareFoot);
//!
//! let unknown = catalog.lookup("Gizmo", "X");
//! assert!(unknown.is_fallback);
//! assert_eq!(unknown.unit.code(), "UN");
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{EstimateError, EstimateResult};
use crate::units::{MeasureKind, MeasurementUnit, UnitPrice};

/// Current schema version for catalog files
pub const CATALOG_SCHEMA_VERSION: &str = "0.1.0";

/// Material name used for catalog rows that apply to a whole category
pub const GENERIC_MATERIAL: &str = "Generic";

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    /// Category (e.g. "Pipe", "Wall", "IfcDoor")
    pub category: String,
    /// Material within the category (e.g. "Copper", "Drywall")
    pub material: String,
    /// Material price per unit
    pub material_unit_price: UnitPrice,
    /// Labor price per unit
    pub labor_unit_price: UnitPrice,
    /// Unit the prices are quoted in
    pub unit: MeasurementUnit,
    /// Measure summed when aggregating elements of this category
    pub measure_kind: MeasureKind,
}

impl CostEntry {
    /// Create an entry whose measure kind follows from its unit.
    pub fn new(
        category: impl Into<String>,
        material: impl Into<String>,
        material_unit_price: UnitPrice,
        labor_unit_price: UnitPrice,
        unit: MeasurementUnit,
    ) -> Self {
        CostEntry {
            category: category.into(),
            material: material.into(),
            material_unit_price,
            labor_unit_price,
            unit,
            measure_kind: unit.measure_kind(),
        }
    }

    /// Override the measure kind
    pub fn with_measure_kind(mut self, kind: MeasureKind) -> Self {
        self.measure_kind = kind;
        self
    }

    fn unit_cost(&self) -> UnitCost {
        UnitCost {
            material_unit_price: self.material_unit_price,
            labor_unit_price: self.labor_unit_price,
            unit: self.unit,
            is_fallback: false,
        }
    }
}

/// Result of a catalog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCost {
    /// Material price per unit
    pub material_unit_price: UnitPrice,
    /// Labor price per unit
    pub labor_unit_price: UnitPrice,
    /// Unit the prices are quoted in
    pub unit: MeasurementUnit,
    /// True when the pair was not in the catalog
    pub is_fallback: bool,
}

impl UnitCost {
    /// Pricing used for pairs the catalog does not know.
    pub fn fallback() -> Self {
        UnitCost {
            material_unit_price: UnitPrice::from_cents(1000),
            labor_unit_price: UnitPrice::from_cents(1500),
            unit: MeasurementUnit::Unspecified,
            is_fallback: true,
        }
    }
}

/// On-disk catalog format.
///
/// ```json
/// {
///   "version": "0.1.0",
///   "entries": [
///     { "category": "Wall", "material": "Drywall",
///       "material_unit_price": 1.85, "labor_unit_price": 3.25, "unit": "SF" }
///   ]
/// }
/// ```
///
/// `measure_kind` is optional per entry and defaults to the unit's kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Schema version
    pub version: String,
    /// Catalog rows
    pub entries: Vec<CatalogDocumentEntry>,
}

/// A catalog row as written in a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocumentEntry {
    pub category: String,
    pub material: String,
    pub material_unit_price: UnitPrice,
    pub labor_unit_price: UnitPrice,
    pub unit: MeasurementUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_kind: Option<MeasureKind>,
}

impl From<CatalogDocumentEntry> for CostEntry {
    fn from(doc: CatalogDocumentEntry) -> Self {
        let entry = CostEntry::new(
            doc.category,
            doc.material,
            doc.material_unit_price,
            doc.labor_unit_price,
            doc.unit,
        );
        match doc.measure_kind {
            Some(kind) => entry.with_measure_kind(kind),
            None => entry,
        }
    }
}

/// Immutable unit-cost table.
///
/// Stored as category -> material -> entry, both levels ordered, so listing
/// and report output are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostCatalog {
    categories: BTreeMap<String, BTreeMap<String, CostEntry>>,
}

impl CostCatalog {
    /// Build a catalog from entries.
    ///
    /// Rejects duplicate `(category, material)` pairs, empty category names,
    /// out-of-range prices, and categories whose entries disagree on
    /// measure kind.
    pub fn from_entries(entries: impl IntoIterator<Item = CostEntry>) -> EstimateResult<Self> {
        let mut catalog = CostCatalog::default();

        for entry in entries {
            if entry.category.trim().is_empty() {
                return Err(EstimateError::invalid_input(
                    "category",
                    format!("{:?}", entry.category),
                    "Catalog category must not be empty",
                ));
            }

            for (field, price) in [
                ("material_unit_price", entry.material_unit_price),
                ("labor_unit_price", entry.labor_unit_price),
            ] {
                UnitPrice::try_new(price.value()).map_err(|reason| {
                    EstimateError::invalid_input(
                        format!("{}/{}.{}", entry.category, entry.material, field),
                        price.to_string(),
                        reason,
                    )
                })?;
            }

            if let Some(kind) = catalog.category_kind(&entry.category) {
                if kind != entry.measure_kind {
                    return Err(EstimateError::invalid_input(
                        format!("{}/{}.measure_kind", entry.category, entry.material),
                        entry.measure_kind.to_string(),
                        format!("Category '{}' is already measured by {}", entry.category, kind),
                    ));
                }
            }

            if catalog.entry(&entry.category, &entry.material).is_some() {
                return Err(EstimateError::invalid_input(
                    "entries",
                    format!("{}/{}", entry.category, entry.material),
                    "Duplicate (category, material) pair",
                ));
            }

            catalog.insert(entry);
        }

        Ok(catalog)
    }

    /// Build a catalog from a parsed catalog file
    pub fn from_document(doc: CatalogDocument) -> EstimateResult<Self> {
        CostCatalog::from_entries(doc.entries.into_iter().map(CostEntry::from))
    }

    /// Convert back to the on-disk format
    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            version: CATALOG_SCHEMA_VERSION.to_string(),
            entries: self
                .entries()
                .map(|e| CatalogDocumentEntry {
                    category: e.category.clone(),
                    material: e.material.clone(),
                    material_unit_price: e.material_unit_price,
                    labor_unit_price: e.labor_unit_price,
                    unit: e.unit,
                    measure_kind: Some(e.measure_kind),
                })
                .collect(),
        }
    }

    /// The built-in reference catalog.
    pub fn reference() -> &'static CostCatalog {
        &REFERENCE_CATALOG
    }

    fn insert(&mut self, entry: CostEntry) {
        self.categories
            .entry(entry.category.clone())
            .or_default()
            .insert(entry.material.clone(), entry);
    }

    fn category_kind(&self, category: &str) -> Option<MeasureKind> {
        self.categories
            .get(category)
            .and_then(|materials| materials.values().next())
            .map(|e| e.measure_kind)
    }

    /// Exact entry for a pair, if present
    pub fn entry(&self, category: &str, material: &str) -> Option<&CostEntry> {
        self.categories.get(category).and_then(|m| m.get(material))
    }

    /// Unit prices for a pair, falling back to [`UnitCost::fallback`].
    pub fn lookup(&self, category: &str, material: &str) -> UnitCost {
        self.entry(category, material)
            .map(CostEntry::unit_cost)
            .unwrap_or_else(UnitCost::fallback)
    }

    /// Measure used to quantify elements of a category.
    ///
    /// Unknown categories are counted: a count needs no geometry and never
    /// drops an element.
    pub fn measure_kind(&self, category: &str) -> MeasureKind {
        self.category_kind(category).unwrap_or(MeasureKind::Count)
    }

    /// Material used to price a category when elements don't name one.
    ///
    /// The [`GENERIC_MATERIAL`] row if the category has one, otherwise its
    /// alphabetically first material, otherwise [`GENERIC_MATERIAL`].
    pub fn default_material(&self, category: &str) -> String {
        match self.categories.get(category) {
            Some(materials) if materials.contains_key(GENERIC_MATERIAL) => GENERIC_MATERIAL.to_string(),
            Some(materials) => materials
                .keys()
                .next()
                .cloned()
                .unwrap_or_else(|| GENERIC_MATERIAL.to_string()),
            None => GENERIC_MATERIAL.to_string(),
        }
    }

    /// All entries, ordered by category then material
    pub fn entries(&self) -> impl Iterator<Item = &CostEntry> {
        self.categories.values().flat_map(|m| m.values())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    /// Whether the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// ============================================================================
// Reference Data
// ============================================================================

use crate::units::MeasurementUnit::{
    CubicYard as CY, Each as EA, LinearFoot as LF, Meter as M, SquareFoot as SF, SquareMeter as M2,
};

/// (category, material, material cents, labor cents, unit)
const REFERENCE_ROWS: &[(&str, &str, i64, i64, MeasurementUnit)] = &[
    // Linear (per linear foot)
    ("Pipe", "Copper", 850, 1200, LF),
    ("Pipe", "PVC", 225, 650, LF),
    ("Pipe", "Steel", 675, 1050, LF),
    ("Pipe", "PEX", 185, 500, LF),
    ("Cable", "Electrical", 125, 350, LF),
    ("Cable", "Data", 85, 275, LF),
    ("Cable", "Fiber", 250, 500, LF),
    ("Framing", "Wood", 350, 800, LF),
    ("Framing", "Steel", 525, 1250, LF),
    ("Framing", "Aluminum", 700, 1000, LF),
    // Area (per square foot)
    ("Wall", "Drywall", 185, 325, SF),
    ("Wall", "Plaster", 350, 600, SF),
    ("Wall", "Tile", 850, 1200, SF),
    ("Wall", "Paint", 35, 125, SF),
    ("Floor", "Concrete", 450, 650, SF),
    ("Floor", "Tile", 900, 1400, SF),
    ("Floor", "Hardwood", 1250, 800, SF),
    ("Floor", "Carpet", 325, 250, SF),
    ("Floor", "Vinyl", 400, 300, SF),
    ("Ceiling", "Drywall", 200, 350, SF),
    ("Ceiling", "Drop Ceiling", 450, 500, SF),
    ("Ceiling", "Paint", 40, 150, SF),
    // Volume (per cubic yard)
    ("Concrete", "Concrete", 12500, 4500, CY),
    ("Concrete", "Reinforced", 16500, 6000, CY),
    ("Excavation", "Earth", 1500, 3500, CY),
    ("Excavation", "Rock", 2500, 7500, CY),
    // Count (each)
    ("Fixture", "Plumbing", 28500, 12500, EA),
    ("Fixture", "Electrical", 9500, 6500, EA),
    ("Door", "Hardware", 45000, 18000, EA),
    ("Door", "Interior", 32500, 15000, EA),
    ("Door", "Exterior", 85000, 25000, EA),
    ("Window", "Glass", 42500, 17500, EA),
    ("Window", "Vinyl", 37500, 15000, EA),
    ("Window", "Wood", 62500, 20000, EA),
    // BIM element classes (metric, whole-category pricing)
    ("IfcWall", GENERIC_MATERIAL, 2500, 1500, M2),
    ("IfcSlab", GENERIC_MATERIAL, 3000, 2000, M2),
    ("IfcRoof", GENERIC_MATERIAL, 4500, 2500, M2),
    ("IfcBeam", GENERIC_MATERIAL, 15000, 7500, M),
    ("IfcColumn", GENERIC_MATERIAL, 20000, 10000, M),
    ("IfcDoor", GENERIC_MATERIAL, 80000, 15000, EA),
    ("IfcWindow", GENERIC_MATERIAL, 60000, 10000, EA),
];

static REFERENCE_CATALOG: Lazy<CostCatalog> = Lazy::new(|| {
    let mut catalog = CostCatalog::default();
    for &(category, material, material_cents, labor_cents, unit) in REFERENCE_ROWS {
        catalog.insert(CostEntry::new(
            category,
            material,
            UnitPrice::from_cents(material_cents),
            UnitPrice::from_cents(labor_cents),
            unit,
        ));
    }
    catalog
});

#[cfg(test)]
mod tests {
    use super::*;

    fn price(cents: i64) -> UnitPrice {
        UnitPrice::from_cents(cents)
    }

    #[test]
    fn test_reference_lookup() {
        let catalog = CostCatalog::reference();
        let copper = catalog.lookup("Pipe", "Copper");
        assert_eq!(copper.material_unit_price, price(850));
        assert_eq!(copper.labor_unit_price, price(1200));
        assert_eq!(copper.unit, MeasurementUnit::LinearFoot);
        assert!(!copper.is_fallback);
    }

    #[test]
    fn test_reference_has_unique_pairs() {
        let catalog = CostCatalog::reference();
        assert_eq!(catalog.len(), REFERENCE_ROWS.len());
    }

    #[test]
    fn test_fallback_for_unknown_pair() {
        let catalog = CostCatalog::reference();
        for (category, material) in [("Gizmo", "X"), ("Wall", "Unobtainium"), ("", "")] {
            let cost = catalog.lookup(category, material);
            assert!(cost.is_fallback);
            assert_eq!(cost.material_unit_price.to_string(), "10.00");
            assert_eq!(cost.labor_unit_price.to_string(), "15.00");
            assert_eq!(cost.unit, MeasurementUnit::Unspecified);
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        // Source data keys are matched exactly
        assert!(CostCatalog::reference().lookup("wall", "drywall").is_fallback);
    }

    #[test]
    fn test_measure_kind_from_catalog_data() {
        let catalog = CostCatalog::reference();
        assert_eq!(catalog.measure_kind("IfcWall"), MeasureKind::Area);
        assert_eq!(catalog.measure_kind("IfcBeam"), MeasureKind::Length);
        assert_eq!(catalog.measure_kind("IfcDoor"), MeasureKind::Count);
        assert_eq!(catalog.measure_kind("Excavation"), MeasureKind::Volume);
        assert_eq!(catalog.measure_kind("IfcFurniture"), MeasureKind::Count);
    }

    #[test]
    fn test_new_category_is_catalog_only_change() {
        let catalog = CostCatalog::from_entries([CostEntry::new(
            "IfcCovering",
            GENERIC_MATERIAL,
            price(1200),
            price(800),
            MeasurementUnit::SquareMeter,
        )])
        .unwrap();
        assert_eq!(catalog.measure_kind("IfcCovering"), MeasureKind::Area);
    }

    #[test]
    fn test_default_material() {
        let catalog = CostCatalog::reference();
        assert_eq!(catalog.default_material("IfcSlab"), GENERIC_MATERIAL);
        assert_eq!(catalog.default_material("Door"), "Exterior");
        assert_eq!(catalog.default_material("Nothing"), GENERIC_MATERIAL);
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let entry = CostEntry::new("Wall", "Drywall", price(185), price(325), MeasurementUnit::SquareFoot);
        let err = CostCatalog::from_entries([entry.clone(), entry]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_conflicting_measure_kind_rejected() {
        let area = CostEntry::new("Wall", "Drywall", price(185), price(325), MeasurementUnit::SquareFoot);
        let length = CostEntry::new("Wall", "Trim", price(100), price(200), MeasurementUnit::LinearFoot);
        assert!(CostCatalog::from_entries([area, length]).is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let entry = CostEntry::new(
            "Wall",
            "Drywall",
            UnitPrice(rust_decimal::Decimal::new(-185, 2)),
            price(325),
            MeasurementUnit::SquareFoot,
        );
        assert!(CostCatalog::from_entries([entry]).is_err());
    }

    #[test]
    fn test_price_above_ceiling_rejected() {
        let over = UnitPrice(crate::units::MAX_UNIT_PRICE + rust_decimal::Decimal::ONE);
        let entry = CostEntry::new("Wall", "Drywall", price(185), over, MeasurementUnit::SquareFoot);
        let err = CostCatalog::from_entries([entry]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_document_roundtrip() {
        let json = r#"{
            "version": "0.1.0",
            "entries": [
                { "category": "Wall", "material": "Drywall",
                  "material_unit_price": 1.85, "labor_unit_price": 3.25, "unit": "SF" },
                { "category": "Trench", "material": "Earth",
                  "material_unit_price": 4, "labor_unit_price": 9.5, "unit": "LF",
                  "measure_kind": "Volume" }
            ]
        }"#;
        let doc: CatalogDocument = serde_json::from_str(json).unwrap();
        let catalog = CostCatalog::from_document(doc).unwrap();

        assert_eq!(catalog.lookup("Wall", "Drywall").material_unit_price.to_string(), "1.85");
        assert_eq!(catalog.measure_kind("Trench"), MeasureKind::Volume);

        let again = CostCatalog::from_document(catalog.to_document()).unwrap();
        assert_eq!(again, catalog);
    }
}

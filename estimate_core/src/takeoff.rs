//! # Takeoff Data Model
//!
//! Records flowing through the engine:
//!
//! ```text
//! ElementRecord ──aggregate──▶ TakeoffLineItem ──compute──▶ ComputedLineItem
//!                  (CSV row) ──────────┘
//! ```
//!
//! All of them are plain values: created once, never mutated, owned by the
//! batch that produced them.

use serde::{Deserialize, Serialize};

use crate::units::{Money, Quantity, UnitPrice};

fn one() -> usize {
    1
}

/// One entry of a quantity takeoff.
///
/// Built from a CSV row or from one aggregated category of BIM elements.
/// `unit` is whatever the source declared and is informational only; the
/// unit prices are quoted in comes from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeoffLineItem {
    /// Free-text identifier, may be empty
    pub tag: String,
    /// Category used for catalog lookup (e.g. "Pipe", "IfcWall")
    pub category: String,
    /// Sub-kind (e.g. IFC element class, or the source's "Type" column)
    #[serde(rename = "type")]
    pub item_type: String,
    /// Measured quantity
    pub quantity: Quantity,
    /// Unit as declared by the source
    pub unit: String,
    /// Material used for catalog lookup
    pub material: String,
    /// Free-text notes
    pub notes: String,
    /// Source elements this line stands for (1 for a tabular row)
    #[serde(default = "one")]
    pub element_count: usize,
}

impl TakeoffLineItem {
    /// Create a single-element line with empty tag, unit and notes.
    ///
    /// ```rust
    /// use estimate_core::takeoff::TakeoffLineItem;
    /// use estimate_core::units::Quantity;
    ///
    /// let item = TakeoffLineItem::new("Wall", "Drywall", Quantity::parse("100").unwrap())
    ///     .with_tag("W-101")
    ///     .with_unit("SF");
    /// assert_eq!(item.element_count, 1);
    /// ```
    pub fn new(category: impl Into<String>, material: impl Into<String>, quantity: Quantity) -> Self {
        let category = category.into();
        TakeoffLineItem {
            tag: String::new(),
            item_type: category.clone(),
            category,
            quantity,
            unit: String::new(),
            material: material.into(),
            notes: String::new(),
            element_count: 1,
        }
    }

    /// Set the tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the item type
    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = item_type.into();
        self
    }

    /// Set the declared unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Set how many source elements the line represents
    pub fn with_element_count(mut self, count: usize) -> Self {
        self.element_count = count;
        self
    }
}

/// A priced takeoff line.
///
/// Field names in JSON follow the tabular report columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedLineItem {
    pub tag: String,
    pub category: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub quantity: Quantity,
    pub unit: String,
    pub material: String,
    pub notes: String,
    /// Catalog material price per unit
    #[serde(rename = "material_cost_per_unit")]
    pub material_unit_price: UnitPrice,
    /// Catalog labor price per unit
    #[serde(rename = "labor_cost_per_unit")]
    pub labor_unit_price: UnitPrice,
    /// `round(quantity * material_unit_price, 2)`
    pub total_material_cost: Money,
    /// `round(quantity * labor_unit_price, 2)`
    pub total_labor_cost: Money,
    /// `total_material_cost + total_labor_cost`, not rounded again
    pub total_cost: Money,
    /// Unit the catalog quotes prices in ("UN" for fallback pricing)
    pub cost_unit: String,
    /// Source elements this line stands for
    pub element_count: usize,
    /// True when the (category, material) pair was not in the catalog
    pub priced_by_fallback: bool,
}

/// One building element as reported by an external BIM parser.
///
/// Only derived scalar measures are consumed; geometry stays with the parser.
/// A measure is `None` when the model carried no quantity annotation for it.
///
/// ## JSON Example
///
/// ```json
/// { "category": "IfcWall", "name": "Basic Wall:Interior", "area": 12.5 }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementRecord {
    /// Structural category (e.g. "IfcWall", "IfcDoor")
    pub category: String,
    /// Element name or identifier, informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Material, when the model assigns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Area annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<Quantity>,
    /// Length annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<Quantity>,
    /// Volume annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Quantity>,
}

impl ElementRecord {
    /// Create an element with no measures
    pub fn new(category: impl Into<String>) -> Self {
        ElementRecord {
            category: category.into(),
            ..Default::default()
        }
    }

    /// Set the area annotation
    pub fn with_area(mut self, area: Quantity) -> Self {
        self.area = Some(area);
        self
    }

    /// Set the length annotation
    pub fn with_length(mut self, length: Quantity) -> Self {
        self.length = Some(length);
        self
    }

    /// Set the volume annotation
    pub fn with_volume(mut self, volume: Quantity) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Set the material
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }
}

//! # Estimate Calculations
//!
//! The pricing pipeline, leaf-first:
//!
//! - [`line_item`] - one takeoff line priced against the catalog
//! - [`aggregate`] - BIM element records grouped into one line per category
//! - [`summary`] - priced lines rolled up into a project estimate with markup
//!
//! Every function here is pure: inputs in, values out, no I/O. The catalog is
//! always passed in explicitly.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::calculations::{compute_batch, summarize, MarkupPolicy};
//! use estimate_core::catalog::CostCatalog;
//! use estimate_core::takeoff::TakeoffLineItem;
//! use estimate_core::units::Quantity;
//!
//! let items = vec![TakeoffLineItem::new("Wall", "Drywall", Quantity::parse("100").unwrap())];
//! let priced = compute_batch(CostCatalog::reference(), &items);
//! let estimate = summarize(&priced, &MarkupPolicy::reference()).unwrap();
//!
//! assert_eq!(estimate.base_total_cost.to_string(), "510.00");
//! assert_eq!(estimate.final_cost.to_string(), "637.50");
//! ```

pub mod aggregate;
pub mod line_item;
pub mod summary;

pub use aggregate::{aggregate, aggregate_and_compute, AggregationDefaults};
pub use line_item::{compute, compute_batch};
pub use summary::{summarize, CategoryTotal, EstimateSummary, MarkupPolicy, MarkupSummary, ProjectEstimate};

//! # estimate_core - Takeoff Cost Estimation Engine
//!
//! `estimate_core` turns a construction quantity takeoff into an itemized
//! cost breakdown and a project estimate with overhead and profit. All
//! inputs and outputs are JSON-serializable, and every amount is an exact
//! decimal rounded half-up to cents.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **Exact**: Quantities and money are `Decimal`, never `f64`
//! - **Forgiving**: A bad row is skipped, an unknown material gets fallback
//!   pricing; neither aborts a batch
//! - **Rich Errors**: Structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use estimate_core::calculations::{compute_batch, summarize, MarkupPolicy};
//! use estimate_core::catalog::CostCatalog;
//! use estimate_core::ingest::read_takeoff_csv;
//!
//! let csv = "Tag,Category,Type,Quantity,Unit,Material,Notes\n\
//!            W-1,Wall,Partition,100,SF,Drywall,\n\
//!            X-1,Gizmo,,5,EA,X,\n";
//!
//! let batch = read_takeoff_csv(csv.as_bytes()).unwrap();
//! let priced = compute_batch(CostCatalog::reference(), &batch.items);
//! let estimate = summarize(&priced, &MarkupPolicy::reference()).unwrap();
//!
//! assert_eq!(estimate.base_total_cost.to_string(), "635.00");
//! assert_eq!(estimate.final_cost.to_string(), "793.75");
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Unit-cost table keyed by (category, material)
//! - [`takeoff`] - Line items, priced line items and BIM element records
//! - [`calculations`] - Pricing, aggregation and summarization
//! - [`ingest`] - CSV takeoff reader
//! - [`report`] - CSV, JSON, text and PDF output
//! - [`project`] - Project container and settings
//! - [`units`] - Type-safe decimal wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - File loading and atomic writes

pub mod calculations;
pub mod catalog;
pub mod errors;
pub mod file_io;
pub mod ingest;
pub mod project;
pub mod report;
pub mod takeoff;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{MarkupPolicy, ProjectEstimate};
pub use catalog::CostCatalog;
pub use errors::{EstimateError, EstimateResult};
pub use project::{EstimateProject, EstimateSettings};
pub use takeoff::{ComputedLineItem, ElementRecord, TakeoffLineItem};

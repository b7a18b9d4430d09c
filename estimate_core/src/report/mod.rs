//! # Report Rendering
//!
//! Turns an estimate and its priced lines into output documents:
//!
//! | Format       | Module         | Output                                    |
//! |--------------|----------------|-------------------------------------------|
//! | `csv`        | [`tabular`]    | one row per line plus a `TOTAL` row       |
//! | `json`       | [`structured`] | `{ estimates, summary }`                  |
//! | `text`       | [`text`]       | plain-text summary and breakdown          |
//! | `pdf`        | `pdf`          | Typst document, plain text if unavailable |
//!
//! Rendering never changes a number: every amount printed is one the
//! calculator or summarizer already produced.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::calculations::{compute_batch, summarize, MarkupPolicy};
//! use estimate_core::catalog::CostCatalog;
//! use estimate_core::report::{render, ReportContext, ReportFormat};
//! use estimate_core::takeoff::TakeoffLineItem;
//! use estimate_core::units::Quantity;
//!
//! let items = vec![TakeoffLineItem::new("Wall", "Drywall", Quantity::parse("100").unwrap())];
//! let priced = compute_batch(CostCatalog::reference(), &items);
//! let estimate = summarize(&priced, &MarkupPolicy::reference()).unwrap();
//!
//! let report = render(&estimate, &priced, ReportFormat::Tabular, &ReportContext::new("Demo")).unwrap();
//! assert!(String::from_utf8(report.into_bytes()).unwrap().contains("TOTAL"));
//! ```

#[cfg(feature = "pdf")]
mod pdf;
pub mod structured;
pub mod tabular;
pub mod text;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::calculations::ProjectEstimate;
use crate::errors::{EstimateError, EstimateResult};
use crate::project::EstimateProject;
use crate::takeoff::ComputedLineItem;

pub use structured::{ProjectReport, StructuredReport};

/// Output format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// CSV
    #[serde(rename = "csv")]
    Tabular,
    /// JSON
    #[serde(rename = "json")]
    Structured,
    /// Plain text
    Text,
    /// PDF
    #[serde(rename = "pdf")]
    Document,
}

impl ReportFormat {
    /// Short name as accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            ReportFormat::Tabular => "csv",
            ReportFormat::Structured => "json",
            ReportFormat::Text => "text",
            ReportFormat::Document => "pdf",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ReportFormat {
    type Err = EstimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "tabular" => Ok(ReportFormat::Tabular),
            "json" | "structured" => Ok(ReportFormat::Structured),
            "text" | "txt" => Ok(ReportFormat::Text),
            "pdf" | "document" => Ok(ReportFormat::Document),
            other => Err(EstimateError::invalid_input(
                "format",
                other,
                "Expected one of: csv, json, text, pdf",
            )),
        }
    }
}

/// Who and when a report is for.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext {
    pub project_id: Uuid,
    pub project_name: String,
    pub currency_symbol: String,
    pub generated_at: DateTime<Utc>,
}

impl ReportContext {
    /// New context with a fresh project id, `$` and the current time
    pub fn new(project_name: impl Into<String>) -> Self {
        ReportContext {
            project_id: Uuid::new_v4(),
            project_name: project_name.into(),
            currency_symbol: "$".to_string(),
            generated_at: Utc::now(),
        }
    }

    /// Context for an existing project, using its id, name and currency.
    ///
    /// Dated when the project's estimate was attached, or now if it has none.
    pub fn for_project(project: &EstimateProject) -> Self {
        ReportContext {
            project_id: project.meta.id,
            project_name: project.meta.name.clone(),
            currency_symbol: project.settings.currency_symbol.clone(),
            generated_at: project
                .estimate
                .as_ref()
                .map(|attached| attached.estimated_at)
                .unwrap_or_else(Utc::now),
        }
    }
}

/// A rendered report.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedReport {
    Csv(String),
    Json(String),
    Text(String),
    Pdf(Vec<u8>),
}

impl RenderedReport {
    /// Format actually produced (a document request may come back as text)
    pub fn format(&self) -> ReportFormat {
        match self {
            RenderedReport::Csv(_) => ReportFormat::Tabular,
            RenderedReport::Json(_) => ReportFormat::Structured,
            RenderedReport::Text(_) => ReportFormat::Text,
            RenderedReport::Pdf(_) => ReportFormat::Document,
        }
    }

    /// Raw bytes, ready to write
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RenderedReport::Csv(s) | RenderedReport::Json(s) | RenderedReport::Text(s) => s.as_bytes(),
            RenderedReport::Pdf(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            RenderedReport::Csv(s) | RenderedReport::Json(s) | RenderedReport::Text(s) => s.into_bytes(),
            RenderedReport::Pdf(bytes) => bytes,
        }
    }
}

/// Render an estimate in the requested format.
///
/// A `Document` request degrades to `Text` when the PDF backend is missing
/// or fails; the failure is logged, not returned.
pub fn render(
    estimate: &ProjectEstimate,
    items: &[ComputedLineItem],
    format: ReportFormat,
    context: &ReportContext,
) -> EstimateResult<RenderedReport> {
    match format {
        ReportFormat::Tabular => tabular::render_csv(items).map(RenderedReport::Csv),
        ReportFormat::Structured => structured::render_json(estimate, items).map(RenderedReport::Json),
        ReportFormat::Text => Ok(RenderedReport::Text(text::render_text(estimate, items, context))),
        ReportFormat::Document => Ok(render_document(estimate, items, context)),
    }
}

fn render_document(estimate: &ProjectEstimate, items: &[ComputedLineItem], context: &ReportContext) -> RenderedReport {
    document_or_text(try_render_pdf(estimate, items, context), estimate, items, context)
}

/// The PDF if the backend produced one, the plain-text report otherwise.
fn document_or_text(
    attempt: EstimateResult<Vec<u8>>,
    estimate: &ProjectEstimate,
    items: &[ComputedLineItem],
    context: &ReportContext,
) -> RenderedReport {
    match attempt {
        Ok(bytes) => RenderedReport::Pdf(bytes),
        Err(err) => {
            warn!(error = %err, "Document renderer unavailable, writing plain-text report");
            RenderedReport::Text(text::render_text(estimate, items, context))
        }
    }
}

#[cfg(feature = "pdf")]
fn try_render_pdf(estimate: &ProjectEstimate, items: &[ComputedLineItem], context: &ReportContext) -> EstimateResult<Vec<u8>> {
    pdf::render_pdf(estimate, items, context)
}

#[cfg(not(feature = "pdf"))]
fn try_render_pdf(_estimate: &ProjectEstimate, _items: &[ComputedLineItem], _context: &ReportContext) -> EstimateResult<Vec<u8>> {
    Err(EstimateError::renderer_unavailable(
        "typst",
        "built without the `pdf` feature",
    ))
}

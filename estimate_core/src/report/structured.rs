//! # Structured (JSON) Reports
//!
//! Two documents for the line-item path:
//!
//! ```json
//! { "estimates": [ ...priced lines... ],
//!   "summary": { "total_material_cost": 185.00, "total_labor_cost": 325.00,
//!                "grand_total": 510.00, "item_count": 1, "element_count": 1 } }
//! ```
//!
//! and the markup sibling `{ base_cost, overhead, profit, final_cost }`.
//!
//! The element path produces a single [`ProjectReport`] holding quantities,
//! summary and markup together.
//!
//! Amounts are exact JSON numbers (`510.00`, never `510.0000001` or
//! `"510.00"`). Output depends only on its inputs, so rendering the same
//! estimate twice gives identical bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ReportContext;
use crate::calculations::{EstimateSummary, MarkupSummary, ProjectEstimate};
use crate::errors::EstimateResult;
use crate::takeoff::ComputedLineItem;

/// Line-item estimate document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReport {
    pub estimates: Vec<ComputedLineItem>,
    pub summary: EstimateSummary,
}

impl StructuredReport {
    pub fn new(estimate: &ProjectEstimate, items: &[ComputedLineItem]) -> Self {
        StructuredReport {
            estimates: items.to_vec(),
            summary: estimate.summary(),
        }
    }
}

/// Aggregated-element report for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub project_id: Uuid,
    pub project_name: String,
    pub processed_at: DateTime<Utc>,
    /// One priced line per element category
    pub quantities: Vec<ComputedLineItem>,
    pub summary: EstimateSummary,
    /// Markup applied to the summary's grand total
    pub estimate: MarkupSummary,
}

impl ProjectReport {
    pub fn new(context: &ReportContext, estimate: &ProjectEstimate, items: &[ComputedLineItem]) -> Self {
        ProjectReport {
            project_id: context.project_id,
            project_name: context.project_name.clone(),
            processed_at: context.generated_at,
            quantities: items.to_vec(),
            summary: estimate.summary(),
            estimate: estimate.markup(),
        }
    }
}

/// Render `{ estimates, summary }` as pretty JSON.
pub fn render_json(estimate: &ProjectEstimate, items: &[ComputedLineItem]) -> EstimateResult<String> {
    Ok(serde_json::to_string_pretty(&StructuredReport::new(estimate, items))?)
}

/// Render the markup document as pretty JSON.
pub fn render_markup_json(estimate: &ProjectEstimate) -> EstimateResult<String> {
    Ok(serde_json::to_string_pretty(&estimate.markup())?)
}

/// Render a [`ProjectReport`] as pretty JSON.
pub fn render_project_json(
    context: &ReportContext,
    estimate: &ProjectEstimate,
    items: &[ComputedLineItem],
) -> EstimateResult<String> {
    Ok(serde_json::to_string_pretty(&ProjectReport::new(context, estimate, items))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample;
    use crate::units::Money;

    #[test]
    fn test_json_shape_and_exact_numbers() {
        let (estimate, items) = sample();
        let json = render_json(&estimate, &items).unwrap();

        assert!(json.contains("\"estimates\": ["));
        assert!(json.contains("\"material_cost_per_unit\": 1.85"));
        assert!(json.contains("\"total_cost\": 510.00"));
        assert!(json.contains("\"grand_total\": 635.00"));
        assert!(json.contains("\"item_count\": 2"));
        assert!(json.contains("\"element_count\": 2"));
    }

    #[test]
    fn test_json_idempotent() {
        let (estimate, items) = sample();
        let first = render_json(&estimate, &items).unwrap();
        let second = render_json(&estimate, &items).unwrap();
        assert_eq!(first, second);

        let ctx = ReportContext::new("Demo");
        assert_eq!(
            render_project_json(&ctx, &estimate, &items).unwrap(),
            render_project_json(&ctx, &estimate, &items).unwrap()
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let (estimate, items) = sample();
        let json = render_json(&estimate, &items).unwrap();
        let parsed: StructuredReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, StructuredReport::new(&estimate, &items));
    }

    #[test]
    fn test_markup_json() {
        let (estimate, _) = sample();
        let json = render_markup_json(&estimate).unwrap();
        // 635.00 * 0.15 = 95.25, 635.00 * 0.10 = 63.50
        assert!(json.contains("\"base_cost\": 635.00"));
        assert!(json.contains("\"overhead\": 95.25"));
        assert!(json.contains("\"profit\": 63.50"));
        assert!(json.contains("\"final_cost\": 793.75"));
    }

    #[test]
    fn test_project_report() {
        let (estimate, items) = sample();
        let ctx = ReportContext::new("Clinic");
        let report = ProjectReport::new(&ctx, &estimate, &items);

        assert_eq!(report.project_id, ctx.project_id);
        assert_eq!(report.quantities.len(), 2);
        assert_eq!(report.estimate.final_cost, Money::from_cents(79_375));

        let json = render_project_json(&ctx, &estimate, &items).unwrap();
        assert!(json.contains("\"project_name\": \"Clinic\""));
        assert!(json.contains("\"processed_at\""));
    }
}

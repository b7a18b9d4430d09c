//! Plain-text report, used directly and as the document fallback.

use std::fmt::{self, Write};

use super::ReportContext;
use crate::calculations::ProjectEstimate;
use crate::takeoff::ComputedLineItem;

const RULE: &str = "------------------------------------------------------------";

/// Render a human-readable report.
///
/// Output depends only on the arguments (the timestamp comes from the
/// context), so equal inputs give equal text.
pub fn render_text(estimate: &ProjectEstimate, items: &[ComputedLineItem], context: &ReportContext) -> String {
    let mut out = String::new();
    // Writing into a String never fails
    let _ = write_report(&mut out, estimate, items, context);
    out
}

fn write_report(
    out: &mut String,
    estimate: &ProjectEstimate,
    items: &[ComputedLineItem],
    context: &ReportContext,
) -> fmt::Result {
    let sym = context.currency_symbol.as_str();

    writeln!(out, "Takeoff Cost Estimate")?;
    writeln!(out, "Project: {}", context.project_name)?;
    writeln!(out, "Generated: {}", context.generated_at.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(out)?;

    let overhead_label = format!("Overhead ({})", estimate.overhead_rate.as_percent_string());
    let profit_label = format!("Profit ({})", estimate.profit_rate.as_percent_string());

    writeln!(out, "Cost Summary")?;
    writeln!(out, "{}", RULE)?;
    for (label, amount) in [
        ("Total Material Cost", estimate.total_material_cost),
        ("Total Labor Cost", estimate.total_labor_cost),
        ("Base Cost", estimate.base_total_cost),
        (overhead_label.as_str(), estimate.overhead_amount),
        (profit_label.as_str(), estimate.profit_amount),
        ("Final Cost", estimate.final_cost),
    ] {
        writeln!(out, "{:<28}{:>20}", label, amount.to_currency_string(sym))?;
    }
    writeln!(out, "{:<28}{:>20}", "Line Items", estimate.line_count)?;
    writeln!(out, "{:<28}{:>20}", "Total Elements", estimate.element_count)?;
    if estimate.fallback_line_count > 0 {
        writeln!(out, "{:<28}{:>20}", "Priced by Fallback", estimate.fallback_line_count)?;
    }
    writeln!(out)?;

    writeln!(out, "Category Totals")?;
    writeln!(out, "{}", RULE)?;
    for total in &estimate.category_totals {
        writeln!(
            out,
            "{}: {} lines, {} items, {}",
            total.category,
            total.line_count,
            total.element_count,
            total.total_cost.to_currency_string(sym)
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Detailed Breakdown")?;
    writeln!(out, "{}", RULE)?;
    for item in items {
        let tag = if item.tag.is_empty() { "-" } else { item.tag.as_str() };
        writeln!(
            out,
            "{} {} / {}: {} {} @ {} + {} = {}{}",
            tag,
            item.category,
            item.material,
            item.quantity,
            item.cost_unit,
            item.material_unit_price,
            item.labor_unit_price,
            item.total_cost.to_currency_string(sym),
            if item.priced_by_fallback { " *" } else { "" }
        )?;
    }
    if estimate.fallback_line_count > 0 {
        writeln!(out)?;
        writeln!(out, "* not in catalog, priced at the fallback unit cost")?;
    }

    Ok(())
}

//! # PDF Generation
//!
//! Renders an estimate to PDF with Typst.
//!
//! - The template is an embedded string constant
//! - Data is injected by a single pass over `{{NAME}}` placeholders, so text
//!   that looks like a placeholder is never expanded
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! Any failure comes back as `RendererUnavailable`; the caller falls back to
//! the plain-text report.

use chrono::{DateTime, Datelike, Utc};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use super::ReportContext;
use crate::calculations::ProjectEstimate;
use crate::errors::{EstimateError, EstimateResult};
use crate::takeoff::ComputedLineItem;
use crate::units::Money;

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world for compiling one in-memory document.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    library: LazyHash<Library>,
    /// Date reported to the document, taken from the report context
    today: DateTime<Utc>,
}

impl PdfWorld {
    fn new(source: String, today: DateTime<Utc>) -> Self {
        let fonts = Self::load_fonts();
        let book = FontBook::from_fonts(&fonts);

        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
            today,
        }
    }

    /// Fonts bundled with typst-assets
    fn load_fonts() -> Vec<Font> {
        typst_assets::fonts()
            .flat_map(|font_bytes| Font::iter(Bytes::new(font_bytes.to_vec())))
            .collect()
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        Datetime::from_ymd(
            self.today.year(),
            u8::try_from(self.today.month()).ok()?,
            u8::try_from(self.today.day()).ok()?,
        )
    }
}

// ============================================================================
// Template
// ============================================================================

const ESTIMATE_TEMPLATE: &str = r##"
#set page(
  paper: "us-letter",
  margin: (top: 0.9in, bottom: 0.9in, left: 0.75in, right: 0.75in),
  header: align(right)[
    #text(size: 9pt, fill: gray)[Takeoff Cost Estimate]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 9pt)[{{PROJECT}}]],
      align(center)[#text(size: 9pt)[Page #counter(page).display()]],
      align(right)[#text(size: 9pt)[{{DATE}}]],
    )
  ]
)

#set text(size: 10pt)

#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 12pt, radius: 4pt)[
    #text(size: 18pt, weight: "bold")[Cost Estimate]
    #v(4pt)
    #text(size: 14pt)[{{PROJECT}}]
  ]
]

#v(12pt)

#text(size: 13pt, weight: "bold")[Cost Summary]

#table(
  columns: (1fr, auto),
  stroke: none,
  align: (left, right),
{{SUMMARY_ROWS}}
)

#v(8pt)

#text(size: 13pt, weight: "bold")[Category Totals]

#table(
  columns: (1fr, auto, auto, auto),
  align: (left, right, right, right),
  table.header([*Category*], [*Lines*], [*Elements*], [*Total*]),
{{CATEGORY_ROWS}}
)

#v(8pt)

#text(size: 13pt, weight: "bold")[Detailed Breakdown]

#text(size: 8pt)[
#table(
  columns: (auto, 1fr, 1fr, auto, auto, auto, auto, auto),
  align: (left, left, left, right, left, right, right, right),
  table.header([*Tag*], [*Category*], [*Material*], [*Qty*], [*Unit*], [*Mat./Unit*], [*Labor/Unit*], [*Total*]),
{{LINE_ROWS}}
)
]

{{FALLBACK_NOTE}}
"##;

/// Escape characters with markup meaning in user-provided text
fn escape_typst(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' | '\r' => out.push(' '),
            '*' | '_' | '#' | '$' | '@' | '<' | '>' | '\\' | '`' | '[' | ']' | '/' | '=' | '-' | '+' | '~'
            | '"' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Replace each `{{KEY}}` in `template` with its value in one pass.
///
/// Substituted values are copied verbatim and never rescanned. Unknown
/// placeholders are left as written.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = &after[..end];
        match values.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

fn cell(s: &str) -> String {
    format!("[{}]", escape_typst(s))
}

fn build_summary_rows(estimate: &ProjectEstimate, sym: &str) -> String {
    let money = |m: Money| cell(&m.to_currency_string(sym));
    [
        (cell("Total Material Cost"), money(estimate.total_material_cost)),
        (cell("Total Labor Cost"), money(estimate.total_labor_cost)),
        (cell("Base Cost"), money(estimate.base_total_cost)),
        (
            cell(&format!("Overhead ({})", estimate.overhead_rate.as_percent_string())),
            money(estimate.overhead_amount),
        ),
        (
            cell(&format!("Profit ({})", estimate.profit_rate.as_percent_string())),
            money(estimate.profit_amount),
        ),
        ("[*Final Cost*]".to_string(), format!("[*{}*]", escape_typst(&estimate.final_cost.to_currency_string(sym)))),
        (cell("Line Items"), cell(&estimate.line_count.to_string())),
        (cell("Total Elements"), cell(&estimate.element_count.to_string())),
    ]
    .iter()
    .map(|(label, value)| format!("  {}, {},", label, value))
    .collect::<Vec<_>>()
    .join("\n")
}

fn build_category_rows(estimate: &ProjectEstimate, sym: &str) -> String {
    estimate
        .category_totals
        .iter()
        .map(|t| {
            format!(
                "  {}, {}, {}, {},",
                cell(&t.category),
                cell(&t.line_count.to_string()),
                cell(&t.element_count.to_string()),
                cell(&t.total_cost.to_currency_string(sym))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_line_rows(items: &[ComputedLineItem], sym: &str) -> String {
    items
        .iter()
        .map(|item| {
            let total = if item.priced_by_fallback {
                format!("{} \\*", escape_typst(&item.total_cost.to_currency_string(sym)))
            } else {
                escape_typst(&item.total_cost.to_currency_string(sym))
            };
            format!(
                "  {}, {}, {}, {}, {}, {}, {}, [{}],",
                cell(&item.tag),
                cell(&item.category),
                cell(&item.material),
                cell(&item.quantity.to_string()),
                cell(&item.cost_unit),
                cell(&item.material_unit_price.to_string()),
                cell(&item.labor_unit_price.to_string()),
                total
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render an estimate to PDF bytes.
pub(super) fn render_pdf(
    estimate: &ProjectEstimate,
    items: &[ComputedLineItem],
    context: &ReportContext,
) -> EstimateResult<Vec<u8>> {
    let sym = context.currency_symbol.as_str();
    let fallback_note = if estimate.fallback_line_count > 0 {
        "#text(size: 8pt)[\\* not in catalog, priced at the fallback unit cost]"
    } else {
        ""
    };

    let project = escape_typst(&context.project_name);
    let date = context.generated_at.format("%Y-%m-%d").to_string();
    let summary_rows = build_summary_rows(estimate, sym);
    let category_rows = build_category_rows(estimate, sym);
    let line_rows = build_line_rows(items, sym);

    let source = fill_template(
        ESTIMATE_TEMPLATE,
        &[
            ("PROJECT", project.as_str()),
            ("DATE", date.as_str()),
            ("SUMMARY_ROWS", summary_rows.as_str()),
            ("CATEGORY_ROWS", category_rows.as_str()),
            ("LINE_ROWS", line_rows.as_str()),
            ("FALLBACK_NOTE", fallback_note),
        ],
    );

    let world = PdfWorld::new(source, context.generated_at);

    let warned = typst::compile(&world);
    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        EstimateError::renderer_unavailable("typst", format!("compilation failed: {}", error_msgs.join("; ")))
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        EstimateError::renderer_unavailable("typst", format!("PDF export failed: {}", error_msgs.join("; ")))
    })
}

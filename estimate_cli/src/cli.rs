use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use estimate_core::calculations::{aggregate_and_compute, compute_batch, summarize};
use estimate_core::catalog::CostCatalog;
use estimate_core::errors::EstimateError;
use estimate_core::file_io::{load_catalog, load_elements, load_settings, load_takeoff_csv, write_atomic};
use estimate_core::project::{EstimateProject, EstimateSettings};
use estimate_core::report::structured::{render_markup_json, render_project_json};
use estimate_core::report::tabular::render_catalog_csv;
use estimate_core::report::{render, RenderedReport, ReportContext, ReportFormat};
use estimate_core::units::Rate;

#[derive(Parser, Debug)]
#[command(name = "takeoff-estimate")]
#[command(about = "Price construction quantity takeoffs against a unit-cost catalog")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Price a CSV takeoff, CSV report to stdout
    takeoff-estimate estimate takeoff.csv

    # JSON report plus the markup document
    takeoff-estimate estimate takeoff.csv --format json -o estimate.json --markup-output markup.json

    # Aggregate BIM element records into a PDF report
    takeoff-estimate aggregate elements.json --project-name "Riverside Clinic" --format pdf -o report.pdf

    # Custom catalog and markup
    takeoff-estimate --catalog prices.json --overhead 0.12 --profit 0.08 estimate takeoff.csv

    # Show the built-in catalog
    takeoff-estimate catalog --format csv

EXIT CODES:
    0  success
    2  input file missing or unreadable
    3  nothing in the input could be estimated
    1  any other failure
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON cost catalog (defaults to the built-in reference catalog)
    #[arg(long, global = true, env = "TAKEOFF_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// JSON settings file (markup, aggregation defaults, currency)
    #[arg(long, global = true, env = "TAKEOFF_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Overhead rate, e.g. 0.15 (0 to 10)
    #[arg(long, global = true, value_parser = Rate::parse)]
    pub overhead: Option<Rate>,

    /// Profit rate, e.g. 0.10 (0 to 10)
    #[arg(long, global = true, value_parser = Rate::parse)]
    pub profit: Option<Rate>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Price an itemized CSV takeoff
    Estimate {
        /// CSV with Tag, Category, Type, Quantity, Unit, Material, Notes columns
        input: PathBuf,

        /// Report format: csv, json, text or pdf
        #[arg(long, short = 'f', default_value = "csv")]
        format: ReportFormat,

        /// Write the report here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Also write the markup document (base, overhead, profit, final) as JSON
        #[arg(long)]
        markup_output: Option<PathBuf>,
    },

    /// Aggregate BIM element records by category and price them
    Aggregate {
        /// JSON array of element records
        input: PathBuf,

        /// Project name for the report (defaults to the input file name)
        #[arg(long)]
        project_name: Option<String>,

        /// Report format: json, csv, text or pdf
        #[arg(long, short = 'f', default_value = "json")]
        format: ReportFormat,

        /// Write the report here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Print the active cost catalog
    Catalog {
        /// json or csv
        #[arg(long, short = 'f', default_value = "json")]
        format: ReportFormat,
    },
}

/// Run one command.
pub fn run(cli: Cli) -> Result<()> {
    let settings = resolve_settings(&cli)?;

    let loaded_catalog;
    let catalog = match &cli.catalog {
        Some(path) => {
            loaded_catalog = load_catalog(path)?;
            &loaded_catalog
        }
        None => CostCatalog::reference(),
    };

    match cli.command {
        Commands::Estimate {
            input,
            format,
            output,
            markup_output,
        } => estimate(catalog, &settings, &input, format, output.as_deref(), markup_output.as_deref()),
        Commands::Aggregate {
            input,
            project_name,
            format,
            output,
        } => aggregate(catalog, &settings, &input, project_name, format, output.as_deref()),
        Commands::Catalog { format } => print_catalog(catalog, format),
    }
}

/// Settings file (if any) with command-line rate overrides applied.
fn resolve_settings(cli: &Cli) -> Result<EstimateSettings> {
    let mut settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => EstimateSettings::default(),
    };
    if let Some(rate) = cli.overhead {
        settings.markup.overhead_rate = rate;
    }
    if let Some(rate) = cli.profit {
        settings.markup.profit_rate = rate;
    }
    Ok(settings)
}

fn estimate(
    catalog: &CostCatalog,
    settings: &EstimateSettings,
    input: &Path,
    format: ReportFormat,
    output: Option<&Path>,
    markup_output: Option<&Path>,
) -> Result<()> {
    let batch = load_takeoff_csv(input)?;
    if !batch.skipped.is_empty() {
        warn!(
            skipped = batch.skipped.len(),
            read = batch.records_read,
            "Some takeoff rows were skipped"
        );
    }
    if batch.is_empty() {
        return Err(EstimateError::empty_batch(format!(
            "No valid line items in {} ({} rows read, {} skipped)",
            input.display(),
            batch.records_read,
            batch.skipped.len()
        ))
        .into());
    }

    let priced = compute_batch(catalog, &batch.items);
    let estimate = summarize(&priced, &settings.markup)?;

    let mut project = project_for(input, None, settings);
    project.attach_estimate(estimate.clone());
    let context = ReportContext::for_project(&project);
    let report = render(&estimate, &priced, format, &context)?;
    emit(report.as_bytes(), output)?;

    if let Some(path) = markup_output {
        let markup = render_markup_json(&estimate)?;
        write_atomic(path, markup.as_bytes())
            .with_context(|| format!("writing markup document to {}", path.display()))?;
    }

    info!(
        project = %project.meta.id,
        lines = estimate.line_count,
        final_cost = %estimate.final_cost,
        format = %report.format(),
        "Estimate complete"
    );
    Ok(())
}

fn aggregate(
    catalog: &CostCatalog,
    settings: &EstimateSettings,
    input: &Path,
    project_name: Option<String>,
    format: ReportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let elements = load_elements(input)?;
    let priced = aggregate_and_compute(catalog, &elements, &settings.aggregation)?;
    let estimate = summarize(&priced, &settings.markup)?;

    let mut project = project_for(input, project_name, settings);
    project.attach_estimate(estimate.clone());
    let context = ReportContext::for_project(&project);
    let report = match format {
        ReportFormat::Structured => RenderedReport::Json(render_project_json(&context, &estimate, &priced)?),
        other => render(&estimate, &priced, other, &context)?,
    };
    emit(report.as_bytes(), output)?;

    info!(
        project = %project.meta.id,
        elements = elements.len(),
        categories = priced.len(),
        final_cost = %estimate.final_cost,
        "Aggregated estimate complete"
    );
    Ok(())
}

fn print_catalog(catalog: &CostCatalog, format: ReportFormat) -> Result<()> {
    let text = match format {
        ReportFormat::Structured => serde_json::to_string_pretty(&catalog.to_document())?,
        ReportFormat::Tabular => render_catalog_csv(catalog)?,
        other => {
            return Err(EstimateError::invalid_input("format", other.name(), "Catalog can be printed as json or csv").into())
        }
    };
    emit(text.as_bytes(), None)
}

/// Project the run's estimate is attached to, named after the input file
/// unless a name is given.
fn project_for(input: &Path, project_name: Option<String>, settings: &EstimateSettings) -> EstimateProject {
    let name = project_name.unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    });
    let mut project = EstimateProject::new(name, "", "");
    project.settings = settings.clone();
    project
}

/// Write output to a file atomically, or to stdout.
fn emit(bytes: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_atomic(path, bytes).with_context(|| format!("writing report to {}", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes).context("writing report to stdout")?;
            if !bytes.ends_with(b"\n") && std::str::from_utf8(bytes).is_ok() {
                stdout.write_all(b"\n").context("writing report to stdout")?;
            }
            stdout.flush().context("writing report to stdout")?;
        }
    }
    Ok(())
}

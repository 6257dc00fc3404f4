pub mod cli;
pub mod data;
pub mod derive;
pub mod filter;
pub mod group;
pub mod ingest;
pub mod insight;
pub mod schema;
pub mod stats;
pub mod table;

use std::{env, fs::File, io::Write as _, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("datascope", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Schema(args) => handle_schema(&args),
        Commands::Insights(args) => handle_insights(&args),
        Commands::Process(args) => handle_process(&args),
    }
}

fn handle_schema(args: &cli::SchemaArgs) -> Result<()> {
    let dataset = ingest::load_path(&args.input, args.format.map(|f| f.as_source()))
        .with_context(|| format!("Loading dataset from {:?}", args.input))?;
    let columns = schema::analyze(&dataset);
    info!(
        "Analyzed {} column(s) across {} row(s) in '{}'",
        columns.len(),
        dataset.row_count(),
        args.input.display()
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&columns)?);
        return Ok(());
    }
    let headers = vec![
        "column".to_string(),
        "type".to_string(),
        "distinct".to_string(),
        "values".to_string(),
    ];
    let rows = columns
        .iter()
        .map(|info| {
            let preview = info
                .distinct_values
                .iter()
                .take(5)
                .map(|value| value.as_display())
                .join(", ");
            vec![
                info.name.clone(),
                info.column_type.to_string(),
                info.distinct_values.len().to_string(),
                preview,
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    Ok(())
}

fn handle_insights(args: &cli::InsightsArgs) -> Result<()> {
    let dataset = ingest::load_path(&args.input, args.format.map(|f| f.as_source()))
        .with_context(|| format!("Loading dataset from {:?}", args.input))?;
    let insights = insight::generate_insights(&dataset);
    info!(
        "Generated {} insight(s) from {} row(s)",
        insights.len(),
        dataset.row_count()
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }
    let headers = vec![
        "kind".to_string(),
        "confidence".to_string(),
        "finding".to_string(),
    ];
    let rows = insights
        .iter()
        .map(|item| {
            vec![
                format!("{:?}", item.kind).to_lowercase(),
                format!("{:.2}", item.confidence),
                item.description.clone(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    Ok(())
}

fn handle_process(args: &cli::ProcessArgs) -> Result<()> {
    if args.table && args.output.is_some() {
        return Err(anyhow!("--table cannot be combined with --output"));
    }
    let dataset = ingest::load_path(&args.input, args.format.map(|f| f.as_source()))
        .with_context(|| format!("Loading dataset from {:?}", args.input))?;

    let rules = filter::parse_filters(&args.filters)?;
    let mut dataset = filter::apply_filters(&dataset, &rules)?;

    let fields = derive::parse_computed_fields(&args.derives)?;
    if !fields.is_empty() {
        dataset = derive::add_computed_fields(&dataset, &fields);
    }

    if !args.group_by.is_empty() || !args.aggregations.is_empty() {
        let aggregations = group::parse_aggregations(&args.aggregations)?;
        dataset = group::group_and_aggregate(&dataset, &args.group_by, &aggregations)?;
    }

    if let Some(limit) = args.limit {
        dataset.rows.truncate(limit);
    }

    info!(
        "Emitting {} row(s) across {} column(s)",
        dataset.row_count(),
        dataset.columns.len()
    );
    if args.table {
        table::print_table(&dataset.columns, &table::dataset_cells(&dataset));
        return Ok(());
    }
    match &args.output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
            write_csv(&dataset, file)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            write_csv(&dataset, &mut stdout)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn write_csv<W: std::io::Write>(dataset: &data::Dataset, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(&dataset.columns)
        .context("Writing CSV header")?;
    for row in table::dataset_cells(dataset) {
        writer.write_record(&row).context("Writing CSV row")?;
    }
    writer.flush().context("Flushing CSV output")?;
    Ok(())
}

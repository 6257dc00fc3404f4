use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::ingest::SourceFormat;

#[derive(Debug, Parser)]
#[command(author, version, about = "Analyze tabular data: schema, insights, and transforms", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer column types and distinct values for a CSV or JSON dataset
    Schema(SchemaArgs),
    /// Generate ranked statistical insights for a dataset
    Insights(InsightsArgs),
    /// Filter, derive, and aggregate a dataset
    Process(ProcessArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    pub fn as_source(self) -> SourceFormat {
        match self {
            InputFormat::Csv => SourceFormat::Csv,
            InputFormat::Json => SourceFormat::Json,
        }
    }
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Input dataset (.csv or .json array of records)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Override format detection by file extension
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,
    /// Emit the schema as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct InsightsArgs {
    /// Input dataset (.csv or .json array of records)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Override format detection by file extension
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,
    /// Emit insights as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Input dataset (.csv or .json array of records)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Override format detection by file extension
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,
    /// Row filters such as `amount>100`, `status=shipped`, or `score in 0..10`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Computed fields using `name=expression`
    #[arg(long = "derive", action = clap::ArgAction::Append)]
    pub derives: Vec<String>,
    /// Comma-separated columns to group by
    #[arg(long = "group-by", value_delimiter = ',')]
    pub group_by: Vec<String>,
    /// Aggregations of the form `column:sum|avg|count|min|max`
    #[arg(long = "agg", action = clap::ArgAction::Append)]
    pub aggregations: Vec<String>,
    /// Limit number of rows emitted
    #[arg(long)]
    pub limit: Option<usize>,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Render an aligned table on stdout instead of CSV
    #[arg(long)]
    pub table: bool,
}

//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect legacy variable data as a wide entity × time table
#[derive(Debug, Parser)]
#[command(name = "datavis", version)]
pub struct Args {
    /// Legacy variables JSON (`-` reads stdin)
    #[arg(long, short)]
    pub input: PathBuf,

    /// Ingestion config JSON
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Entity populations, `.csv` (entity,population) or JSON object
    #[arg(long)]
    pub population: Option<PathBuf>,

    /// Keep rows at or after this time
    #[arg(long, allow_negative_numbers = true)]
    pub start: Option<i64>,

    /// Keep rows at or before this time
    #[arg(long, allow_negative_numbers = true)]
    pub end: Option<i64>,

    /// Drop entities below this population (needs --population)
    #[arg(long = "min-population", requires = "population")]
    pub min_population: Option<f64>,

    /// Entities that survive the population filter; repeatable
    #[arg(long = "keep")]
    pub keep: Vec<String>,

    /// Only these entities; repeatable
    #[arg(long = "entity")]
    pub entities: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Summarize the table and its columns
    Stats {
        /// Rows shown in the preview
        #[arg(long, default_value_t = 10)]
        preview: usize,
    },

    /// Write the table as delimited text
    Export {
        /// Field delimiter
        #[arg(long, default_value_t = ',')]
        delimiter: char,

        /// Export only the first rows
        #[arg(long)]
        limit: Option<usize>,

        /// Output file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List the available times and resolve timeline handles against them
    Times {
        /// Only times where these columns have values; repeatable
        #[arg(long = "column")]
        columns: Vec<String>,

        /// Start handle (`-inf` for the earliest time)
        #[arg(long, allow_negative_numbers = true, default_value_t = f64::NEG_INFINITY)]
        from: f64,

        /// End handle (`inf` for the latest time)
        #[arg(long, allow_negative_numbers = true, default_value_t = f64::INFINITY)]
        to: f64,

        /// Collapse both handles onto the end handle
        #[arg(long)]
        single: bool,
    },

    /// Values per entity nearest the target times
    Values {
        /// Column slug
        #[arg(long)]
        column: String,

        /// Target times; defaults to the latest time. Repeatable
        #[arg(long = "at", allow_negative_numbers = true)]
        at: Vec<f64>,

        /// Override the column tolerance
        #[arg(long)]
        tolerance: Option<i64>,
    },

    /// Pair the observation times of two columns per entity
    Pairs {
        /// First column slug
        #[arg(long)]
        a: String,

        /// Second column slug
        #[arg(long)]
        b: String,

        /// Maximum time distance of a pair
        #[arg(long = "max-diff")]
        max_diff: Option<i64>,
    },
}

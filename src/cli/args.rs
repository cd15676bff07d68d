use crate::models::Source;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "poi-ingest")]
#[command(about = "Normalize point-of-interest exports to GeoJSON and load them into PostGIS")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide progress bars")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Settings file [default: poi-ingest.toml if present]"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert, transcode and load every recognised export in a directory
    Ingest {
        #[arg(short, long, help = "Directory holding the raw exports")]
        path: PathBuf,

        #[arg(short = 'k', long, help = "MIDB category code applied to every record")]
        category: String,

        #[arg(long, help = "PostgreSQL connection URL (overrides settings)")]
        database_url: Option<String>,

        #[arg(long, help = "Target table (overrides settings)")]
        table: Option<String>,

        #[arg(long, help = "Create the PostGIS extension and table if missing")]
        create_table: bool,

        #[arg(long, help = "Run every stage but keep records in memory")]
        dry_run: bool,
    },

    /// Convert a text or KML export to delimited CSV
    Convert {
        #[arg(short, long, value_enum)]
        source: Source,

        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transcode a CSV to GeoJSON with a source's field table
    Transcode {
        #[arg(short, long, value_enum)]
        source: Source,

        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Load a single GeoJSON file
    Load {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short = 'l', long, help = "Provenance label, e.g. \"OpenStreetMap\"")]
        source_label: String,

        #[arg(short = 'k', long)]
        category: String,

        #[arg(long, default_value = "name")]
        name_key: String,

        #[arg(long)]
        database_url: Option<String>,

        #[arg(long)]
        table: Option<String>,

        #[arg(long)]
        create_table: bool,

        #[arg(long)]
        dry_run: bool,
    },

    /// List the supported sources and the filename suffix each is matched by
    Sources,
}

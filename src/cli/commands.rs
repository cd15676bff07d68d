use crate::cli::args::{Cli, Commands};
use crate::error::{IngestError, Result};
use crate::models::{InputFormat, Source};
use crate::processors::{CategoryRule, Dispatcher, FeatureLoader};
use crate::readers::{KmlConverter, TextConverter};
use crate::settings::Settings;
use crate::store::{MemoryStore, PostgisStore};
use crate::utils::progress::ProgressReporter;
use crate::writers::CsvToGeoJson;
use clap::ValueEnum;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Ingest {
            path,
            category,
            database_url,
            table,
            create_table,
            dry_run,
        } => {
            let settings = load_settings(cli.config.as_deref(), database_url, table, create_table)?;
            let dispatcher = Dispatcher::new(&settings).with_silent(cli.quiet);

            println!("Ingesting exports from {}", path.display());
            println!("Category code: {}", category);

            let report = if dry_run {
                println!("Dry run: records are not written to the database");
                let mut store = MemoryStore::new();
                dispatcher.ingest_directory(&path, &category, &mut store).await?
            } else {
                let mut store = open_store(&settings).await?;
                let report = dispatcher.ingest_directory(&path, &category, &mut store).await?;
                store.close().await;
                report
            };

            println!("\n{}", report.summary());
        }

        Commands::Convert {
            source,
            input,
            output,
        } => {
            let rows = match source.input_format() {
                InputFormat::DelimitedText => TextConverter::new().convert(&input, &output)?,
                InputFormat::Kml => KmlConverter::new().convert(&input, &output)?,
                InputFormat::Csv | InputFormat::GeoJson => {
                    return Err(IngestError::Config(format!(
                        "{} exports need no conversion to CSV",
                        source
                    )))
                }
            };
            println!("Wrote {} rows to {}", rows, output.display());
        }

        Commands::Transcode {
            source,
            input,
            output,
        } => {
            if source.input_format() == InputFormat::GeoJson {
                return Err(IngestError::Config(format!(
                    "{} exports are already GeoJSON",
                    source
                )));
            }
            let report = CsvToGeoJson::new(source.field_names(), source.csv_delimiter())
                .transcode(&input, &output)?;
            println!(
                "Wrote {} features to {} ({} rows skipped)",
                report.written,
                output.display(),
                report.skipped
            );
        }

        Commands::Load {
            input,
            source_label,
            category,
            name_key,
            database_url,
            table,
            create_table,
            dry_run,
        } => {
            let loader = FeatureLoader::new(&source_label, CategoryRule::Fixed(category))
                .with_name_key(&name_key);
            let progress = ProgressReporter::new_spinner(
                &format!("Loading {}...", input.display()),
                cli.quiet,
            );

            let report = if dry_run {
                let mut store = MemoryStore::new();
                loader.load_file(&input, &mut store).await?
            } else {
                let settings =
                    load_settings(cli.config.as_deref(), database_url, table, create_table)?;
                let mut store = open_store(&settings).await?;
                let report = loader.load_file(&input, &mut store).await?;
                store.close().await;
                report
            };

            progress.finish_with_message(&format!("Loaded {}", input.display()));
            println!(
                "Inserted {} points from {} ({} skipped)",
                report.inserted,
                input.display(),
                report.skipped
            );
        }

        Commands::Sources => {
            println!("{:<20} {:<16} {}", "SOURCE", "SUFFIX", "LABEL");
            for source in Source::ALL {
                let name = source
                    .to_possible_value()
                    .map(|v| v.get_name().to_string())
                    .unwrap_or_default();
                println!("{:<20} {:<16} {}", name, source.file_suffix(), source.label());
            }
        }
    }

    Ok(())
}

fn load_settings(
    path: Option<&Path>,
    database_url: Option<String>,
    table: Option<String>,
    create_table: bool,
) -> Result<Settings> {
    let mut settings = Settings::load(path)?;
    if database_url.is_some() {
        settings.database_url = database_url;
    }
    if let Some(table) = table {
        settings.table = table;
    }
    settings.create_table |= create_table;
    Ok(settings)
}

async fn open_store(settings: &Settings) -> Result<PostgisStore> {
    let store = PostgisStore::connect(settings.require_database_url()?, &settings.table).await?;
    if settings.create_table {
        store.ensure_schema().await?;
    }
    info!(table = %store.table(), "connected to database");
    Ok(store)
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| IngestError::Config(format!("failed to initialise logging: {}", e)))
}

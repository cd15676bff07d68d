use crate::error::{IngestError, Result};
use crate::models::{InputFormat, Source};
use crate::processors::loader::{CategoryRule, FeatureLoader, LoadReport};
use crate::processors::shapefile::{find_poi_shapefiles, ShapefileConverter};
use crate::readers::{KmlConverter, TextConverter};
use crate::settings::Settings;
use crate::store::PointStore;
use crate::utils::constants::{SHAPEFILE_CATEGORY_KEY, SHAPEFILE_NAME_KEY, SHAPEFILE_SOURCE_LABEL};
use crate::utils::progress::ProgressReporter;
use crate::utils::{intermediate_csv, intermediate_geojson};
use crate::writers::{CsvToGeoJson, TranscodeReport};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub enum FileStatus {
    Loaded {
        transcode: Option<TranscodeReport>,
        load: LoadReport,
    },
    /// `inserted` counts the records stored before the failure
    Failed { reason: String, inserted: usize },
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub file: PathBuf,
    pub source: String,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub outcomes: Vec<FileOutcome>,
    pub ignored: Vec<PathBuf>,
}

impl IngestReport {
    /// Includes records stored by files that failed part way through
    pub fn inserted(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match &o.status {
                FileStatus::Loaded { load, .. } => load.inserted,
                FileStatus::Failed { inserted, .. } => *inserted,
            })
            .sum()
    }

    /// Rows dropped while transcoding plus features dropped while loading
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match &o.status {
                FileStatus::Loaded { transcode, load } => {
                    load.skipped + transcode.map_or(0, |t| t.skipped)
                }
                FileStatus::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Failed { .. }))
            .count()
    }

    pub fn summary(&self) -> String {
        let mut lines = Vec::with_capacity(self.outcomes.len() + 2);
        for outcome in &self.outcomes {
            let name = outcome
                .file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| outcome.file.display().to_string());
            let line = match &outcome.status {
                FileStatus::Loaded { transcode, load } => {
                    let dropped = transcode.map_or(0, |t| t.skipped);
                    format!(
                        "  {:<40} {:<15} inserted {:>7}  skipped {:>6}",
                        name,
                        outcome.source,
                        load.inserted,
                        load.skipped + dropped
                    )
                }
                FileStatus::Failed { reason, inserted } => format!(
                    "  {:<40} {:<15} inserted {:>7}  FAILED: {}",
                    name, outcome.source, inserted, reason
                ),
            };
            lines.push(line);
        }
        lines.push(format!(
            "Import complete: {} files, {} points inserted, {} skipped, {} failed, {} ignored",
            self.outcomes.len(),
            self.inserted(),
            self.skipped(),
            self.failed(),
            self.ignored.len()
        ));
        lines.join("\n")
    }
}

/// Walks an export directory and pushes every recognised file through
/// its converter, the transcoder and the loader.
pub struct Dispatcher {
    csv_dir: String,
    geojson_dir: String,
    shapefile_dir: String,
    shapefiles: ShapefileConverter,
    silent: bool,
}

impl Dispatcher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            csv_dir: settings.csv_dir.clone(),
            geojson_dir: settings.geojson_dir.clone(),
            shapefile_dir: settings.shapefile_dir.clone(),
            shapefiles: ShapefileConverter::new(&settings.ogr2ogr),
            silent: false,
        }
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub async fn ingest_directory<S: PointStore>(
        &self,
        path: &Path,
        category_code: &str,
        store: &mut S,
    ) -> Result<IngestReport> {
        if !path.is_dir() {
            return Err(IngestError::Config(format!(
                "not a directory: {}",
                path.display()
            )));
        }

        let csv_dir = path.join(&self.csv_dir);
        let geojson_dir = path.join(&self.geojson_dir);
        fs::create_dir_all(&csv_dir)?;
        fs::create_dir_all(&geojson_dir)?;

        let mut report = IngestReport::default();
        let mut matched = Vec::new();

        for (file, file_name) in list_files(path)? {
            match Source::from_filename(&file_name) {
                Some(source) => matched.push((source, file)),
                None => {
                    debug!(file = %file.display(), "no source matches, ignoring");
                    report.ignored.push(file);
                }
            }
        }

        let shapefile_root = path.join(&self.shapefile_dir);
        let shapefiles = if shapefile_root.is_dir() {
            find_poi_shapefiles(&shapefile_root)
        } else {
            Vec::new()
        };

        info!(
            dir = %path.display(),
            files = matched.len(),
            shapefiles = shapefiles.len(),
            "starting ingest"
        );

        let progress = ProgressReporter::new(
            (matched.len() + shapefiles.len()) as u64,
            "Ingesting exports...",
            self.silent,
        );

        let category = CategoryRule::Fixed(category_code.to_string());
        for (source, file) in matched {
            progress.set_message(&format!("{} ({})", file.display(), source));
            let loader = FeatureLoader::new(source.label(), category.clone());
            let status = self
                .ingest_file(source, &file, &csv_dir, &geojson_dir, &loader, store)
                .await;
            report.outcomes.push(FileOutcome {
                file,
                source: source.label().to_string(),
                status,
            });
            progress.increment(1);
        }

        let loader = FeatureLoader::new(
            SHAPEFILE_SOURCE_LABEL,
            CategoryRule::Property(SHAPEFILE_CATEGORY_KEY.to_string()),
        )
        .with_name_key(SHAPEFILE_NAME_KEY);
        for shapefile in shapefiles {
            progress.set_message(&format!("{} ({})", shapefile.display(), SHAPEFILE_SOURCE_LABEL));
            let status = self
                .ingest_shapefile(&shapefile, &geojson_dir, &loader, store)
                .await;
            report.outcomes.push(FileOutcome {
                file: shapefile,
                source: SHAPEFILE_SOURCE_LABEL.to_string(),
                status,
            });
            progress.increment(1);
        }

        progress.finish_with_message(&format!("Inserted {} points", report.inserted()));
        info!(
            inserted = report.inserted(),
            skipped = report.skipped(),
            failed = report.failed(),
            "import complete"
        );
        Ok(report)
    }

    /// Convert one raw export as far as GeoJSON, then load it
    pub async fn ingest_file<S: PointStore>(
        &self,
        source: Source,
        input: &Path,
        csv_dir: &Path,
        geojson_dir: &Path,
        loader: &FeatureLoader,
        store: &mut S,
    ) -> FileStatus {
        let mut load = LoadReport::default();
        let result = async {
            let (geojson, transcode) = prepare_geojson(source, input, csv_dir, geojson_dir)?;
            loader.load_file_into(&geojson, store, &mut load).await?;
            Ok::<_, IngestError>(transcode)
        }
        .await;
        file_status(input, result, load)
    }

    async fn ingest_shapefile<S: PointStore>(
        &self,
        shapefile: &Path,
        geojson_dir: &Path,
        loader: &FeatureLoader,
        store: &mut S,
    ) -> FileStatus {
        let mut load = LoadReport::default();
        let result = async {
            let geojson = self.shapefiles.to_geojson(shapefile, geojson_dir)?;
            loader.load_file_into(&geojson, store, &mut load).await?;
            Ok::<_, IngestError>(None)
        }
        .await;
        file_status(shapefile, result, load)
    }
}

fn file_status(file: &Path, result: Result<Option<TranscodeReport>>, load: LoadReport) -> FileStatus {
    match result {
        Ok(transcode) => FileStatus::Loaded { transcode, load },
        Err(e) => {
            error!(file = %file.display(), inserted = load.inserted, error = %e, "file failed");
            FileStatus::Failed {
                reason: e.to_string(),
                inserted: load.inserted,
            }
        }
    }
}

/// Run the converter and transcoder stages a source needs.
///
/// Returns the GeoJSON to load, which is the input itself for GeoJSON
/// sources.
pub fn prepare_geojson(
    source: Source,
    input: &Path,
    csv_dir: &Path,
    geojson_dir: &Path,
) -> Result<(PathBuf, Option<TranscodeReport>)> {
    let csv = match source.input_format() {
        InputFormat::GeoJson => return Ok((input.to_path_buf(), None)),
        InputFormat::Csv => input.to_path_buf(),
        InputFormat::DelimitedText => {
            let csv = intermediate_csv(csv_dir, input);
            TextConverter::new().convert(input, &csv)?;
            csv
        }
        InputFormat::Kml => {
            let csv = intermediate_csv(csv_dir, input);
            KmlConverter::new().convert(input, &csv)?;
            csv
        }
    };

    let geojson = intermediate_geojson(geojson_dir, input);
    let report = CsvToGeoJson::new(source.field_names(), source.csv_delimiter())
        .transcode(&csv, &geojson)?;
    Ok((geojson, Some(report)))
}

/// Regular files directly inside `dir`, symlinks followed, sorted by name
fn list_files(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push((entry.path(), name));
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConflatedPoint;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    const QQ_MAPS: &str = "id,name,address,poi,lng,lat,dist,type,geom\n\
        1,Kim Chaek University,Pyongyang,school,125.7476,39.0265,0,3,\n\
        2,Grand People's Study House,Pyongyang,library,125.7497,39.0196,0,3,\n\
        3,Kim Il Sung Stadium,Pyongyang,stadium,125.7536,39.0436,0,3,\n";

    /// Accepts `capacity` points, then fails every insert
    struct FullStore {
        accepted: usize,
        capacity: usize,
    }

    impl PointStore for FullStore {
        async fn insert(&mut self, _point: &ConflatedPoint) -> Result<()> {
            if self.accepted == self.capacity {
                return Err(IngestError::Config("store is full".to_string()));
            }
            self.accepted += 1;
            Ok(())
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(&Settings::default()).with_silent(true)
    }

    #[test]
    fn test_prepare_geojson_passthrough() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("x_OSM.geojson");
        let (out, report) =
            prepare_geojson(Source::OpenStreetMap, &input, dir.path(), dir.path())?;
        assert_eq!(out, input);
        assert!(report.is_none());
        Ok(())
    }

    #[test]
    fn test_prepare_geojson_wikipedia() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("kp_wikipedia.txt");
        fs::write(
            &input,
            "title\tname\ttype\tlat\tlng\tabstract\twikipedia_id\ttime_pulled\n\
             Arch_of_Triumph\tArch of Triumph\tlandmark\t39.0425\t125.7603\tA triumphal arch\t1234\t2016-05-01\n",
        )?;

        let (out, report) = prepare_geojson(Source::Wikipedia, &input, dir.path(), dir.path())?;
        assert_eq!(out, dir.path().join("kp_wikipedia.geojson"));
        assert_eq!(report.map(|r| r.written), Some(1));
        assert!(dir.path().join("kp_wikipedia.csv").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_ingest_directory_records_failures_and_continues() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("a_yandex.json"), "{ not json")?;
        fs::write(
            dir.path().join("b_qq_maps.csv"),
            "id,name,address,poi,lng,lat,dist,type,geom\n\
             9,Kim Chaek University,Pyongyang,school,125.7476,39.0265,0,3,\n",
        )?;
        fs::write(dir.path().join("readme.md"), "notes")?;

        let mut store = MemoryStore::new();
        let report = dispatcher()
            .ingest_directory(dir.path(), "2201", &mut store)
            .await?;

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.inserted(), 1);
        assert_eq!(report.ignored.len(), 1);
        assert_eq!(store.points()[0].source, "QQ Maps");
        assert_eq!(store.points()[0].midb_cat, "2201");
        assert!(dir.path().join("CSV").is_dir());
        assert!(dir.path().join("GeoJSON").join("b_qq_maps.geojson").exists());
        assert!(report.summary().contains("Import complete"));
        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_keeps_partial_count() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("kp_qq_maps.csv"), QQ_MAPS)?;

        let mut store = FullStore {
            accepted: 0,
            capacity: 2,
        };
        let report = dispatcher()
            .ingest_directory(dir.path(), "2201", &mut store)
            .await?;

        assert_eq!(report.failed(), 1);
        assert_eq!(report.inserted(), 2);
        assert!(matches!(
            &report.outcomes[0].status,
            FileStatus::Failed { inserted: 2, reason } if reason.contains("store is full")
        ));
        assert!(report.summary().contains("2 points inserted"));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_export_is_ingested() -> Result<()> {
        let exports = TempDir::new()?;
        let target = exports.path().join("download.csv");
        fs::write(&target, QQ_MAPS)?;

        let dir = TempDir::new()?;
        std::os::unix::fs::symlink(&target, dir.path().join("kp_qq_maps.csv"))?;

        let mut store = MemoryStore::new();
        let report = dispatcher()
            .ingest_directory(dir.path(), "2201", &mut store)
            .await?;

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.inserted(), 3);
        assert!(report.ignored.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_ingest_requires_directory() {
        let mut store = MemoryStore::new();
        let result = dispatcher()
            .ingest_directory(Path::new("/definitely/not/here"), "1", &mut store)
            .await;
        assert!(matches!(result, Err(IngestError::Config(_))));
    }
}

use crate::error::{IngestError, Result};
use crate::models::{Feature, FeatureCollection};
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, LATITUDE_KEYS, LONGITUDE_KEYS};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeReport {
    pub written: usize,
    pub skipped: usize,
}

/// Turns a delimited CSV into a GeoJSON `FeatureCollection` of points.
///
/// The first row is always a header. With explicit field names it is
/// skipped; without, it names the columns.
pub struct CsvToGeoJson {
    field_names: Option<Vec<String>>,
    delimiter: u8,
}

impl CsvToGeoJson {
    pub fn new(field_names: Option<&[&str]>, delimiter: u8) -> Self {
        Self {
            field_names: field_names.map(|f| f.iter().map(|s| s.to_string()).collect()),
            delimiter,
        }
    }

    pub fn transcode(&self, input: &Path, output: &Path) -> Result<TranscodeReport> {
        let file = File::open(input)?;
        let (collection, report) =
            self.to_collection(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))?;

        let out = File::create(output)?;
        let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, out);
        serde_json::to_writer(&mut writer, &collection)?;
        writer.flush()?;

        debug!(
            input = %input.display(),
            written = report.written,
            skipped = report.skipped,
            "transcoded CSV to GeoJSON"
        );
        Ok(report)
    }

    pub fn to_collection<R: Read>(&self, reader: R) -> Result<(FeatureCollection, TranscodeReport)> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = csv_reader.byte_records();
        let header = match records.next() {
            Some(row) => row?,
            None => return Ok((FeatureCollection::new(Vec::new()), TranscodeReport::default())),
        };

        let field_names = match &self.field_names {
            Some(names) => names.clone(),
            None => header.iter().map(decode).collect(),
        };
        if field_names.is_empty() {
            return Err(IngestError::InvalidFormat(
                "CSV header row has no columns".to_string(),
            ));
        }

        let mut features = Vec::new();
        let mut report = TranscodeReport::default();

        for row in records {
            let row = row?;
            let properties = row_to_properties(&field_names, &row);

            match coordinates(&properties) {
                Some((lon, lat)) => {
                    features.push(Feature::point(lon, lat, properties));
                    report.written += 1;
                }
                None => report.skipped += 1,
            }
        }

        Ok((FeatureCollection::new(features), report))
    }
}

fn decode(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

fn row_to_properties(field_names: &[String], row: &csv::ByteRecord) -> Map<String, Value> {
    let mut properties = Map::with_capacity(field_names.len());
    for (i, name) in field_names.iter().enumerate() {
        let value = row
            .get(i)
            .map(|v| Value::String(decode(v)))
            .unwrap_or(Value::Null);
        properties.insert(name.clone(), value);
    }
    properties
}

/// `(lon, lat)` from the first present coordinate keys
fn coordinates(properties: &Map<String, Value>) -> Option<(f64, f64)> {
    let lat = lookup_float(properties, LATITUDE_KEYS)?;
    let lon = lookup_float(properties, LONGITUDE_KEYS)?;
    Some((lon, lat))
}

fn lookup_float(properties: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let raw = keys
        .iter()
        .find_map(|key| properties.get(*key).and_then(Value::as_str))?;
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::read_feature_collection;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const QQ_FIELDS: &[&str] = &["id", "name", "address", "poi", "lng", "lat", "dist", "type", "geom"];

    #[test]
    fn test_explicit_fields_skip_header() -> Result<()> {
        let csv = "id,name,address,poi,lng,lat,dist,type,geom\n\
                   1,Ryugyong Hotel,Pyongyang,hotel,125.7306,39.0364,0,1,\n\
                   2,Broken,Pyongyang,hotel,,39.0,0,1,\n\
                   3,Mansudae,Pyongyang,monument,125.7533,39.0317,0,2,\n";

        let (fc, report) = CsvToGeoJson::new(Some(QQ_FIELDS), b',').to_collection(csv.as_bytes())?;

        assert_eq!(report, TranscodeReport { written: 2, skipped: 1 });
        assert_eq!(fc.features.len(), 2);
        assert_eq!(fc.features[0].representative_point(), Some((125.7306, 39.0364)));
        assert_eq!(
            fc.features[1].property("name").and_then(Value::as_str),
            Some("Mansudae")
        );
        Ok(())
    }

    #[test]
    fn test_header_names_columns() -> Result<()> {
        let csv = "geonameid;name;latitude;longitude\n\
                   1871859;Pyongyang;39.03385;125.75432\n";

        let (fc, report) = CsvToGeoJson::new(None, b';').to_collection(csv.as_bytes())?;

        assert_eq!(report.written, 1);
        let f = &fc.features[0];
        assert_eq!(f.property("geonameid").and_then(Value::as_str), Some("1871859"));
        assert_eq!(f.representative_point(), Some((125.75432, 39.03385)));
        Ok(())
    }

    #[test]
    fn test_lon_column_is_a_longitude() -> Result<()> {
        let csv = "name;lat;lon\n\
                   Wonsan;39.1528;127.4436\n";

        let (fc, report) = CsvToGeoJson::new(None, b';').to_collection(csv.as_bytes())?;

        assert_eq!(report, TranscodeReport { written: 1, skipped: 0 });
        assert_eq!(fc.features[0].representative_point(), Some((127.4436, 39.1528)));
        Ok(())
    }

    #[test]
    fn test_short_and_long_rows() -> Result<()> {
        let csv = "h\n\
                   A;1.0;2.0\n\
                   B;3.0;4.0;extra;values\n";
        let fields: &[&str] = &["name", "lat", "lng", "note"];

        let (fc, _) = CsvToGeoJson::new(Some(fields), b';').to_collection(csv.as_bytes())?;

        let first = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(first.get("note"), Some(&Value::Null));
        let second = fc.features[1].properties.as_ref().unwrap();
        assert_eq!(second.len(), 4);
        assert_eq!(second.get("note").and_then(Value::as_str), Some("extra"));
        Ok(())
    }

    #[test]
    fn test_non_finite_coordinates_skipped() -> Result<()> {
        let csv = "h\nA;NaN;1\nB;inf;1\nC;abc;1\n";
        let fields: &[&str] = &["name", "lat", "lng"];

        let (fc, report) = CsvToGeoJson::new(Some(fields), b';').to_collection(csv.as_bytes())?;
        assert!(fc.features.is_empty());
        assert_eq!(report.skipped, 3);
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<()> {
        let (fc, report) = CsvToGeoJson::new(None, b',').to_collection("".as_bytes())?;
        assert!(fc.features.is_empty());
        assert_eq!(report, TranscodeReport::default());
        Ok(())
    }

    #[test]
    fn test_output_stays_valid_when_last_row_skipped() -> Result<()> {
        let mut input = NamedTempFile::new()?;
        write!(input, "h\nA;39.0;125.7\nB;;\n")?;
        let output = NamedTempFile::new()?;
        let fields: &[&str] = &["name", "lat", "lng"];

        let report = CsvToGeoJson::new(Some(fields), b';').transcode(input.path(), output.path())?;
        assert_eq!(report, TranscodeReport { written: 1, skipped: 1 });

        let fc = read_feature_collection(output.path())?;
        assert_eq!(fc.features.len(), 1);
        Ok(())
    }
}

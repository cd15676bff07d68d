use crate::error::Result;
use crate::readers::text_reader::read_text;
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, KML_ELEMENTS};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

const PLACEMARK: &str = "Placemark";
const LONGITUDE: usize = 1;
const LATITUDE: usize = 2;
const COORDINATES: usize = 8;

/// Flattens KML placemarks into CSV, one column per element of interest.
pub struct KmlConverter {
    delimiter: u8,
}

impl KmlConverter {
    pub fn new() -> Self {
        Self { delimiter: b';' }
    }

    pub fn convert(&self, input: &Path, output: &Path) -> Result<usize> {
        let content = read_text(input)?;
        let placemarks = parse_placemarks(&content)?;

        let file = File::create(output)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file));

        writer.write_record(KML_ELEMENTS)?;
        for row in &placemarks {
            writer.write_record(row)?;
        }
        writer.flush()?;

        debug!(input = %input.display(), placemarks = placemarks.len(), "converted KML");
        Ok(placemarks.len())
    }
}

impl Default for KmlConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// One row per `Placemark`, columns ordered as `KML_ELEMENTS`.
///
/// Each column takes the first descendant element of that local name, so
/// `kml:name` and `name` are the same column.
pub fn parse_placemarks(content: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut rows = Vec::new();
    let mut current: Option<Vec<Option<String>>> = None;
    let mut capture: Option<usize> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == PLACEMARK {
                    current = Some(vec![None; KML_ELEMENTS.len()]);
                    capture = None;
                } else if let Some(ref fields) = current {
                    if capture.is_none() {
                        if let Some(idx) = KML_ELEMENTS.iter().position(|el| *el == name) {
                            if fields[idx].is_none() {
                                capture = Some(idx);
                                text.clear();
                            }
                        }
                    }
                }
            }
            Event::Text(ref e) => {
                if capture.is_some() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if capture.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == PLACEMARK {
                    if let Some(fields) = current.take() {
                        rows.push(finish_row(fields));
                    }
                    capture = None;
                } else if let (Some(idx), Some(fields)) = (capture, current.as_mut()) {
                    if KML_ELEMENTS[idx] == name {
                        fields[idx] = Some(normalize_whitespace(&text));
                        capture = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}

fn finish_row(mut fields: Vec<Option<String>>) -> Vec<String> {
    let missing = |v: &Option<String>| v.as_deref().map_or(true, str::is_empty);

    if missing(&fields[LONGITUDE]) || missing(&fields[LATITUDE]) {
        if let Some((lon, lat)) = fields[COORDINATES].as_deref().and_then(first_tuple) {
            fields[LONGITUDE] = Some(lon);
            fields[LATITUDE] = Some(lat);
        }
    }

    fields.into_iter().map(Option::unwrap_or_default).collect()
}

/// First `lon,lat[,alt]` tuple of a KML coordinates string
fn first_tuple(coordinates: &str) -> Option<(String, String)> {
    let tuple = coordinates.split_whitespace().next()?;
    let mut parts = tuple.split(',');
    let lon = parts.next()?.trim();
    let lat = parts.next()?.trim();
    if lon.is_empty() || lat.is_empty() {
        return None;
    }
    Some((lon.to_string(), lat.to_string()))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

use crate::error::Result;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Converts tab-separated text exports (DBpedia, GeoNames, Wikimapia,
/// Wikipedia) into delimited CSV, one row per non-blank line.
pub struct TextConverter {
    delimiter: u8,
}

impl TextConverter {
    pub fn new() -> Self {
        Self { delimiter: b';' }
    }

    pub fn convert(&self, input: &Path, output: &Path) -> Result<usize> {
        let content = read_text(input)?;

        let file = File::create(output)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_writer(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file));

        let mut rows = 0;
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            writer.write_record(line.split('\t'))?;
            rows += 1;
        }
        writer.flush()?;

        debug!(input = %input.display(), rows, "converted text export");
        Ok(rows)
    }
}

impl Default for TextConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a whole export as UTF-8, dropping a BOM and replacing invalid bytes
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let (text, malformed) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    if malformed {
        debug!(path = %path.display(), "replaced malformed UTF-8 sequences");
    }
    Ok(text.into_owned())
}

use std::path::{Path, PathBuf};

/// File stem of a raw input, used to name its intermediates
pub fn input_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("input")
        .to_string()
}

/// `<dir>/<stem>.csv`
pub fn intermediate_csv(dir: &Path, input: &Path) -> PathBuf {
    dir.join(format!("{}.csv", input_stem(input)))
}

/// `<dir>/<stem>.geojson`
pub fn intermediate_geojson(dir: &Path, input: &Path) -> PathBuf {
    dir.join(format!("{}.geojson", input_stem(input)))
}

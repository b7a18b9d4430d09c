//! # File I/O Module
//!
//! Loading inputs and writing outputs, the only place the library touches
//! the file system:
//! - **Takeoffs**: CSV (`load_takeoff_csv`) or BIM element JSON (`load_elements`)
//! - **Configuration**: catalog and settings JSON, with version validation
//! - **Atomic writes**: Write to .tmp, sync, rename, so a report is never
//!   left half-written
//!
//! A primary input that cannot be opened is `InputUnavailable`; everything
//! else maps to `FileError` or `SerializationError`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use estimate_core::file_io::{load_catalog, load_takeoff_csv};
//! use std::path::Path;
//!
//! let catalog = load_catalog(Path::new("catalog.json"))?;
//! let batch = load_takeoff_csv(Path::new("takeoff.csv"))?;
//! println!("{} lines, {} catalog entries", batch.items.len(), catalog.len());
//! # Ok::<(), estimate_core::errors::EstimateError>(())
//! ```

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::{CatalogDocument, CostCatalog, CATALOG_SCHEMA_VERSION};
use crate::errors::{EstimateError, EstimateResult};
use crate::ingest::{read_takeoff_csv, TakeoffBatch};
use crate::project::{EstimateSettings, SCHEMA_VERSION};
use crate::takeoff::ElementRecord;

/// Open a primary input, mapping failure to `InputUnavailable`.
fn open_input(path: &Path) -> EstimateResult<File> {
    File::open(path).map_err(|e| EstimateError::input_unavailable(path.display().to_string(), e.to_string()))
}

/// Read a whole configuration file as text.
fn read_to_string(path: &Path) -> EstimateResult<String> {
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut file| file.read_to_string(&mut contents))
        .map_err(|e| EstimateError::file_error("read", path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

/// Load a CSV takeoff.
///
/// # Returns
///
/// * `Ok(TakeoffBatch)` - Rows read; malformed ones are in `skipped`
/// * `Err(EstimateError::InputUnavailable)` - File missing or unreadable
pub fn load_takeoff_csv(path: &Path) -> EstimateResult<TakeoffBatch> {
    let file = open_input(path)?;
    debug!(path = %path.display(), "Reading takeoff");
    read_takeoff_csv(BufReader::new(file))
}

/// Load a JSON array of BIM element records.
///
/// # Returns
///
/// * `Ok(Vec<ElementRecord>)` - Parsed elements
/// * `Err(EstimateError::InputUnavailable)` - File missing or unreadable
/// * `Err(EstimateError::SerializationError)` - Invalid JSON
pub fn load_elements(path: &Path) -> EstimateResult<Vec<ElementRecord>> {
    let file = open_input(path)?;
    let elements: Vec<ElementRecord> = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        EstimateError::serialization(format!("Invalid element JSON in {}: {}", path.display(), e))
    })?;
    debug!(path = %path.display(), count = elements.len(), "Loaded element records");
    Ok(elements)
}

/// Load a cost catalog file.
///
/// # Returns
///
/// * `Ok(CostCatalog)` - Validated catalog
/// * `Err(EstimateError::VersionMismatch)` - File version is incompatible
/// * `Err(EstimateError::InvalidInput)` - Duplicate pair or bad price
/// * `Err(EstimateError::SerializationError)` - Invalid JSON
/// * `Err(EstimateError::FileError)` - I/O error
pub fn load_catalog(path: &Path) -> EstimateResult<CostCatalog> {
    let contents = read_to_string(path)?;
    let doc: CatalogDocument = serde_json::from_str(&contents).map_err(|e| {
        EstimateError::serialization(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    validate_version(&doc.version, CATALOG_SCHEMA_VERSION)?;

    let catalog = CostCatalog::from_document(doc)?;
    debug!(path = %path.display(), entries = catalog.len(), "Loaded catalog");
    Ok(catalog)
}

/// Load estimation settings. Keys not present take their defaults.
///
/// Markup rates and aggregation defaults are range-checked here, so a bad
/// file fails before any element is priced.
pub fn load_settings(path: &Path) -> EstimateResult<EstimateSettings> {
    let contents = read_to_string(path)?;
    let settings: EstimateSettings = serde_json::from_str(&contents).map_err(|e| {
        EstimateError::serialization(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    validate_version(&settings.version, SCHEMA_VERSION)?;
    settings.markup.validate()?;
    settings.aggregation.validate()?;

    Ok(settings)
}

/// Write bytes to a file with atomic write semantics.
///
/// The write process:
/// 1. Write to a temporary file next to the target (`<name>.tmp`)
/// 2. Sync to disk (fsync)
/// 3. Rename over the target (atomic on most filesystems)
///
/// # Example
///
/// ```rust,no_run
/// use estimate_core::file_io::write_atomic;
/// use std::path::Path;
///
/// write_atomic(Path::new("estimate.csv"), b"tag,category\n")?;
/// # Ok::<(), estimate_core::errors::EstimateError>(())
/// ```
pub fn write_atomic(path: &Path, contents: &[u8]) -> EstimateResult<()> {
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        EstimateError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(contents).map_err(|e| {
        EstimateError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        EstimateError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        EstimateError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    debug!(path = %path.display(), bytes = contents.len(), "Wrote output");
    Ok(())
}

/// `report.csv` -> `report.csv.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Validate that a file version is compatible with the version we write.
fn validate_version(file_version: &str, current: &str) -> EstimateResult<()> {
    let mismatch = || EstimateError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: current.to_string(),
    };

    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = current.split('.').filter_map(|p| p.parse().ok()).collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // For 0.x versions, a newer minor is unsupported
    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{MeasureKind, Quantity, Rate};
    use tempfile::tempdir;

    #[test]
    fn test_missing_takeoff_is_input_unavailable() {
        let dir = tempdir().unwrap();
        let err = load_takeoff_csv(&dir.path().join("nope.csv")).unwrap_err();
        assert_eq!(err.error_code(), "INPUT_UNAVAILABLE");
        assert_eq!(err.exit_code(), 2);

        let err = load_elements(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.error_code(), "INPUT_UNAVAILABLE");
    }

    #[test]
    fn test_load_takeoff_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("takeoff.csv");
        fs::write(&path, "Tag,Category,Type,Quantity,Unit,Material,Notes\nW1,Wall,,100,SF,Drywall,\n").unwrap();

        let batch = load_takeoff_csv(&path).unwrap();
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].material, "Drywall");
    }

    #[test]
    fn test_load_elements() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("elements.json");
        fs::write(&path, r#"[{"category":"IfcWall","area":12.5},{"category":"IfcDoor"}]"#).unwrap();

        let elements = load_elements(&path).unwrap();
        assert_eq!(elements.len(), 2);

        fs::write(&path, "{not json").unwrap();
        assert_eq!(load_elements(&path).unwrap_err().error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_catalog_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let json = serde_json::to_string_pretty(&CostCatalog::reference().to_document()).unwrap();
        write_atomic(&path, json.as_bytes()).unwrap();

        let loaded = load_catalog(&path).unwrap();
        assert_eq!(&loaded, CostCatalog::reference());
    }

    #[test]
    fn test_catalog_measure_kind_defaults_from_unit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"{"version":"0.1.0","entries":[
                {"category":"Slab","material":"Topping","material_unit_price":4.10,
                 "labor_unit_price":2.00,"unit":"CY"}
            ]}"#,
        )
        .unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.measure_kind("Slab"), MeasureKind::Volume);
        assert_eq!(catalog.lookup("Slab", "Topping").material_unit_price.to_string(), "4.10");
    }

    #[test]
    fn test_catalog_rejects_newer_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"{"version":"0.2.0","entries":[]}"#).unwrap();
        assert_eq!(load_catalog(&path).unwrap_err().error_code(), "VERSION_MISMATCH");
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let entry = r#"{"category":"Wall","material":"Drywall","material_unit_price":1,"labor_unit_price":1,"unit":"SF"}"#;
        fs::write(&path, format!(r#"{{"version":"0.1.0","entries":[{},{}]}}"#, entry, entry)).unwrap();
        assert_eq!(load_catalog(&path).unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_load_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"markup":{"overhead_rate":0.2,"profit_rate":0.05},"currency_symbol":"€"}"#).unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.markup.overhead_rate, Rate::percent(20));
        assert_eq!(settings.currency_symbol, "€");

        fs::write(&path, r#"{"markup":{"overhead_rate":-0.2,"profit_rate":0.05}}"#).unwrap();
        assert_eq!(load_settings(&path).unwrap_err().error_code(), "INVALID_INPUT");

        fs::write(&path, r#"{"markup":{"overhead_rate":1000,"profit_rate":0.05}}"#).unwrap();
        assert_eq!(load_settings(&path).unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_load_settings_rejects_bad_aggregation_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        fs::write(&path, r#"{"aggregation":{"area":-10,"length":3,"volume":1}}"#).unwrap();
        let err = load_settings(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.to_string().contains("aggregation.area"));

        fs::write(&path, r#"{"aggregation":{"area":10,"length":0,"volume":1}}"#).unwrap();
        assert_eq!(load_settings(&path).unwrap_err().error_code(), "INVALID_INPUT");

        fs::write(&path, r#"{"aggregation":{"area":2.5,"length":1,"volume":0.5}}"#).unwrap();
        assert_eq!(load_settings(&path).unwrap().aggregation.area, Quantity::parse("2.5").unwrap());
    }

    #[test]
    fn test_missing_config_is_file_error() {
        let dir = tempdir().unwrap();
        let err = load_settings(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_atomic_write_creates_no_tmp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert!(!tmp_path_for(&path).exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version("0.1.0", "0.1.0").is_ok());
        assert!(validate_version("0.1.5", "0.1.0").is_ok());
        assert!(validate_version("0.0.9", "0.1.0").is_ok());
        assert!(validate_version("1.0.0", "0.1.0").is_err());
        assert!(validate_version("0.2.0", "0.1.0").is_err());
        assert!(validate_version("garbage", "0.1.0").is_err());
    }
}

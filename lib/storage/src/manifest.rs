//! Training manifest CSV
//!
//! One labeled location per row with the columns `Latitude, Longitude,
//! Elevation, AverageTemperature, Trewartha, ClimateZone, Class`. Columns are
//! looked up by name, so their order and any extra columns do not matter.

use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tourfusion_core::{Error, LabeledLocation, Result};
use tracing::{debug, info};

use crate::columns::{csv_error, feature_fields, Columns, FEATURE_COLUMNS};

pub const CLASS_COLUMN: &str = "Class";

pub fn read_manifest(path: &Path) -> Result<Vec<LabeledLocation>> {
    let file = File::open(path)?;
    let rows = read_manifest_from(file, &path.display().to_string())?;
    info!(path = %path.display(), rows = rows.len(), "loaded manifest");
    Ok(rows)
}

/// Parse a manifest from any reader; `source` names it in error messages
pub fn read_manifest_from<R: Read>(reader: R, source: &str) -> Result<Vec<LabeledLocation>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers().map_err(|e| csv_error(source, e))?.clone();

    let mut required = FEATURE_COLUMNS.to_vec();
    required.push(CLASS_COLUMN);
    let columns = Columns::resolve(source, &headers, &required)?;

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record).map_err(|e| csv_error(source, e))? {
        let features = columns.features(&record)?;
        let class = columns.text(&record, CLASS_COLUMN)?;
        if class.is_empty() {
            return Err(Error::ManifestFormat(format!(
                "{} line {}: empty {}",
                source,
                record.position().map_or(0, |p| p.line()),
                CLASS_COLUMN
            )));
        }
        rows.push(LabeledLocation::new(features, class));
    }

    if rows.is_empty() {
        return Err(Error::ManifestFormat(format!("{}: manifest has no rows", source)));
    }
    debug!(source, rows = rows.len(), "parsed manifest");
    Ok(rows)
}

pub fn write_manifest(path: &Path, rows: &[LabeledLocation]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_manifest_to(File::create(path)?, rows)?;
    info!(path = %path.display(), rows = rows.len(), "wrote manifest");
    Ok(())
}

pub fn write_manifest_to<W: Write>(writer: W, rows: &[LabeledLocation]) -> Result<()> {
    let source = "manifest";
    let mut writer = Writer::from_writer(writer);

    let mut header = FEATURE_COLUMNS.to_vec();
    header.push(CLASS_COLUMN);
    writer.write_record(&header).map_err(|e| csv_error(source, e))?;

    for row in rows {
        let fields = feature_fields(&row.features);
        writer
            .write_record(fields.iter().map(String::as_str).chain([row.class.as_str()]))
            .map_err(|e| csv_error(source, e))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tourfusion_core::LocationFeatures;

    const MANIFEST: &str = "\
Class,Latitude,Longitude,Elevation,AverageTemperature,Trewartha,ClimateZone
\"Cairo, Egypt\",30.04,31.24,23,22.1,BW,Desert or Arid
\"Oslo, Norway\", 59.91 ,10.75,23,6.3,Do,Temperate Oceanic
";

    #[test]
    fn test_read_columns_by_name() {
        let rows = read_manifest_from(MANIFEST.as_bytes(), "inline").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].class, "Cairo, Egypt");
        assert_eq!(rows[1].features.latitude, 59.91);
        assert_eq!(rows[1].features.climate_zone, "Temperate Oceanic");
    }

    #[test]
    fn test_zero_rows() {
        let header_only = "Latitude,Longitude,Elevation,AverageTemperature,Trewartha,ClimateZone,Class\n";
        assert!(matches!(
            read_manifest_from(header_only.as_bytes(), "inline"),
            Err(Error::ManifestFormat(_))
        ));
    }

    #[test]
    fn test_missing_class_column() {
        let data = "Latitude,Longitude,Elevation,AverageTemperature,Trewartha,ClimateZone\n1,2,3,4,Ar,Tropical Wet\n";
        assert!(matches!(
            read_manifest_from(data.as_bytes(), "inline"),
            Err(Error::ManifestFormat(_))
        ));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let data = "Latitude,Longitude,Elevation,AverageTemperature,Trewartha,ClimateZone,Class\n\
                    1,2,3,4,Ar,Tropical Wet,A\n\
                    north,2,3,4,Ar,Tropical Wet,B\n";
        match read_manifest_from(data.as_bytes(), "inline") {
            Err(Error::ManifestFormat(message)) => assert!(message.contains("line 3"), "{message}"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("manifest.csv");
        let rows = vec![LabeledLocation::new(
            LocationFeatures {
                latitude: -33.8688,
                longitude: 151.2093,
                elevation: 58.0,
                average_temperature: 17.7,
                trewartha: "Cf".to_string(),
                climate_zone: "Subtropical Humid".to_string(),
            },
            "Sydney, Australia",
        )];

        write_manifest(&path, &rows).unwrap();
        assert_eq!(read_manifest(&path).unwrap(), rows);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_manifest(&dir.path().join("absent.csv")),
            Err(Error::Io(_))
        ));
    }
}

//! Header lookup and typed field access shared by the CSV readers

use ahash::AHashMap;
use csv::StringRecord;
use tourfusion_core::{Error, LocationFeatures, Result};

/// Columns describing a location, in encoding order
pub const FEATURE_COLUMNS: [&str; 6] = [
    "Latitude",
    "Longitude",
    "Elevation",
    "AverageTemperature",
    "Trewartha",
    "ClimateZone",
];

/// Header name to column position, resolved once per file
pub(crate) struct Columns {
    source: String,
    positions: AHashMap<String, usize>,
}

impl Columns {
    /// Index `headers`, failing if any of `required` is absent
    pub(crate) fn resolve(source: &str, headers: &StringRecord, required: &[&str]) -> Result<Self> {
        let positions: AHashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect();

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| !positions.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(Error::ManifestFormat(format!(
                "{}: missing column(s) {:?}, found {:?}",
                source,
                missing,
                headers.iter().collect::<Vec<_>>()
            )));
        }

        Ok(Self {
            source: source.to_string(),
            positions,
        })
    }

    pub(crate) fn text<'r>(&self, record: &'r StringRecord, column: &str) -> Result<&'r str> {
        let position = self.positions.get(column).copied().ok_or_else(|| {
            Error::ManifestFormat(format!("{}: unknown column {:?}", self.source, column))
        })?;
        record.get(position).map(str::trim).ok_or_else(|| {
            Error::ManifestFormat(format!(
                "{} line {}: missing field {}",
                self.source,
                line_of(record),
                column
            ))
        })
    }

    pub(crate) fn number<T: std::str::FromStr>(&self, record: &StringRecord, column: &str) -> Result<T> {
        let raw = self.text(record, column)?;
        raw.parse::<T>().map_err(|_| {
            Error::ManifestFormat(format!(
                "{} line {}: {} is not a number: {:?}",
                self.source,
                line_of(record),
                column,
                raw
            ))
        })
    }

    pub(crate) fn features(&self, record: &StringRecord) -> Result<LocationFeatures> {
        Ok(LocationFeatures {
            latitude: self.number(record, "Latitude")?,
            longitude: self.number(record, "Longitude")?,
            elevation: self.number(record, "Elevation")?,
            average_temperature: self.number(record, "AverageTemperature")?,
            trewartha: self.text(record, "Trewartha")?.to_string(),
            climate_zone: self.text(record, "ClimateZone")?.to_string(),
        })
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

pub(crate) fn feature_fields(features: &LocationFeatures) -> [String; 6] {
    [
        features.latitude.to_string(),
        features.longitude.to_string(),
        features.elevation.to_string(),
        features.average_temperature.to_string(),
        features.trewartha.clone(),
        features.climate_zone.clone(),
    ]
}

/// Map a csv error, keeping IO failures as IO
pub(crate) fn csv_error(source: &str, err: csv::Error) -> Error {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(io) = err.into_kind() {
            return Error::Io(io);
        }
        return Error::ManifestFormat(format!("{}: unreadable", source));
    }
    Error::ManifestFormat(format!("{}: {}", source, err))
}

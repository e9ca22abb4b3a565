//! Destination class table CSV
//!
//! Columns: `Rank, City, Country, Latitude, Longitude, Elevation,
//! AverageTemperature, Trewartha, ClimateZone`. Row order is significant:
//! earlier rows are the more popular destinations.

use ahash::AHashMap;
use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tourfusion_core::{Destination, Error, Result};
use tracing::{info, warn};

use crate::columns::{csv_error, feature_fields, Columns, FEATURE_COLUMNS};

const IDENTITY_COLUMNS: [&str; 3] = ["Rank", "City", "Country"];

/// Recognised destinations, indexed by their `"City, Country"` label
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    destinations: Vec<Destination>,
    by_label: AHashMap<String, usize>,
}

impl ClassTable {
    /// Build from destinations in table order; a repeated label keeps its first row
    pub fn new(destinations: Vec<Destination>) -> Self {
        let mut by_label = AHashMap::with_capacity(destinations.len());
        for (idx, destination) in destinations.iter().enumerate() {
            let label = destination.label();
            if by_label.contains_key(&label) {
                warn!(label = %label, row = idx, "duplicate destination in class table");
                continue;
            }
            by_label.insert(label, idx);
        }
        Self {
            destinations,
            by_label,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let table = Self::from_reader(File::open(path)?, &path.display().to_string())?;
        info!(path = %path.display(), destinations = table.len(), "loaded class table");
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = reader.headers().map_err(|e| csv_error(source, e))?.clone();

        let mut required = IDENTITY_COLUMNS.to_vec();
        required.extend(FEATURE_COLUMNS);
        let columns = Columns::resolve(source, &headers, &required)?;

        let mut destinations = Vec::new();
        let mut record = StringRecord::new();
        while reader.read_record(&mut record).map_err(|e| csv_error(source, e))? {
            destinations.push(Destination {
                rank: columns.number(&record, "Rank")?,
                city: columns.text(&record, "City")?.to_string(),
                country: columns.text(&record, "Country")?.to_string(),
                features: columns.features(&record)?,
            });
        }
        Ok(Self::new(destinations))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    /// Destinations in table order
    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn get(&self, label: &str) -> Option<&Destination> {
        self.by_label.get(label).map(|&idx| &self.destinations[idx])
    }

    /// Like [`get`](Self::get), failing with `UnknownDestination`
    pub fn lookup(&self, label: &str) -> Result<&Destination> {
        self.get(label)
            .ok_or_else(|| Error::UnknownDestination(label.to_string()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.write_to(File::create(path)?)?;
        info!(path = %path.display(), destinations = self.len(), "wrote class table");
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let source = "class table";
        let mut writer = Writer::from_writer(writer);

        let mut header = IDENTITY_COLUMNS.to_vec();
        header.extend(FEATURE_COLUMNS);
        writer.write_record(&header).map_err(|e| csv_error(source, e))?;

        for destination in &self.destinations {
            let identity = [
                destination.rank.to_string(),
                destination.city.clone(),
                destination.country.clone(),
            ];
            writer
                .write_record(identity.iter().chain(feature_fields(&destination.features).iter()))
                .map_err(|e| csv_error(source, e))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// A ranked destination before its features are known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CityEntry {
    pub rank: u32,
    pub city: String,
    pub country: String,
}

impl CityEntry {
    /// Geocoding query, `"City, Country"`
    pub fn query(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

/// Read the `Rank, City, Country` columns of a city list
pub fn read_city_list(path: &Path) -> Result<Vec<CityEntry>> {
    read_city_list_from(File::open(path)?, &path.display().to_string())
}

pub fn read_city_list_from<R: Read>(reader: R, source: &str) -> Result<Vec<CityEntry>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers().map_err(|e| csv_error(source, e))?.clone();
    let columns = Columns::resolve(source, &headers, &IDENTITY_COLUMNS)?;

    let mut cities = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record).map_err(|e| csv_error(source, e))? {
        cities.push(CityEntry {
            rank: columns.number(&record, "Rank")?,
            city: columns.text(&record, "City")?.to_string(),
            country: columns.text(&record, "Country")?.to_string(),
        });
    }
    Ok(cities)
}

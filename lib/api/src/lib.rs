//! Network adapters: the location graph service and geocoding

pub mod geocode;
pub mod graph;

pub use geocode::{Coordinates, Geocoder, GeocoderConfig, NOMINATIM_ENDPOINT};
pub use graph::{
    GraphClient, GraphConfig, LocationName, LocationRecord, Point, DEFAULT_ENDPOINT, FAILURE_SENTINEL,
};

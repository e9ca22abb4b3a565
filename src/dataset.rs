//! Training data preparation against the live location graph
//!
//! Both workflows use a throwaway user account on the graph service: the
//! service is the only source of elevation, temperature and climate data
//! for a coordinate, so a location is added, read back, and used from there.

use anyhow::{bail, Context, Result};
use rand::Rng;
use tourfusion_api::{Geocoder, GraphClient, LocationName};
use tourfusion_core::{label_by_nearest, Destination, LabeledLocation};
use tourfusion_storage::{CityEntry, ClassTable};
use tracing::{info, warn};

/// Register a user with random credentials, returning its id
pub async fn create_random_user<R: Rng + ?Sized>(graph: &GraphClient, rng: &mut R) -> Result<String> {
    let email = format!("{}@gmail.com", random_token(rng));
    let username = random_token(rng);
    let password = random_token(rng);

    let user_id = graph.add_user(&email, &username, &password).await?;
    info!(user_id = %user_id, "created dataset user");
    Ok(user_id)
}

fn random_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("x{}", rng.random::<u64>())
}

/// Add `count` uniformly random coordinates to `user_id`'s account
///
/// Individual failures are logged and skipped. Returns how many were added.
pub async fn add_random_locations<R: Rng + ?Sized>(
    graph: &GraphClient,
    user_id: &str,
    count: usize,
    rng: &mut R,
) -> usize {
    let mut added = 0;
    for idx in 0..count {
        let latitude = rng.random::<f64>() * 180.0 - 90.0;
        let longitude = rng.random::<f64>() * 360.0 - 180.0;
        match graph
            .add_location(user_id, &LocationName::placeholder(idx), latitude, longitude)
            .await
        {
            Ok(_) => added += 1,
            Err(err) => warn!(idx, latitude, longitude, error = %err, "failed to add random location"),
        }
    }
    info!(user_id, requested = count, added, "added random locations");
    added
}

/// Build a labeled manifest from `size` random land locations
///
/// Each location is labeled with its nearest class table destination.
/// Ocean points (elevation 0) are dropped, so the manifest is usually
/// shorter than `size`.
pub async fn fabricate_dataset<R: Rng + ?Sized>(
    graph: &GraphClient,
    classes: &ClassTable,
    user_id: &str,
    size: usize,
    rng: &mut R,
) -> Result<Vec<LabeledLocation>> {
    if classes.is_empty() {
        bail!("class table is empty, nothing to label locations with");
    }
    add_random_locations(graph, user_id, size, rng).await;

    let locations: Vec<_> = graph
        .history(user_id)
        .await
        .context("failed to read back generated locations")?;
    let manifest = label_by_nearest(&locations, classes.destinations())?;

    info!(
        fetched = locations.len(),
        labeled = manifest.len(),
        classes = classes.len(),
        "fabricated dataset"
    );
    Ok(manifest)
}

/// Fill in coordinates and climate features for a ranked city list
///
/// Cities that cannot be geocoded or stored are logged and left out.
pub async fn enrich_classes(
    graph: &GraphClient,
    geocoder: &Geocoder,
    user_id: &str,
    cities: &[CityEntry],
) -> Result<ClassTable> {
    let mut destinations = Vec::with_capacity(cities.len());

    for (idx, city) in cities.iter().enumerate() {
        match enrich_city(graph, geocoder, user_id, idx, city).await {
            Ok(destination) => {
                info!(label = %destination.label(), "enriched destination");
                destinations.push(destination);
            }
            Err(err) => warn!(city = %city.query(), error = %err, "skipping destination"),
        }
    }

    if destinations.is_empty() && !cities.is_empty() {
        bail!("no destination could be enriched");
    }
    Ok(ClassTable::new(destinations))
}

async fn enrich_city(
    graph: &GraphClient,
    geocoder: &Geocoder,
    user_id: &str,
    idx: usize,
    city: &CityEntry,
) -> Result<Destination> {
    let coordinates = geocoder
        .locate(&city.query())
        .await?
        .with_context(|| format!("no geocoding match for {}", city.query()))?;

    let name = LocationName::for_city(idx, &city.city, &city.country);
    graph
        .add_location(user_id, &name, coordinates.latitude, coordinates.longitude)
        .await?;

    let stored = graph
        .locations(user_id)
        .await?
        .into_iter()
        .next()
        .context("stored location was not returned")?;
    graph.delete_location(&stored.id).await?;

    let mut features = stored.features();
    features.latitude = coordinates.latitude;
    features.longitude = coordinates.longitude;

    Ok(Destination {
        rank: city.rank,
        city: city.city.clone(),
        country: city.country.clone(),
        features,
    })
}

//! The destination classifier: training, inference and persistence
//!
//! [`ClassifierModel`] owns the configured ensemble and the frozen label
//! table. Labels are frozen when a manifest is prepared, so class ids are
//! stable across runs and survive a save/load cycle. A prepared table only
//! replaces the live one when `train` succeeds with it.

use rand::Rng;
use std::path::Path;
use tourfusion_core::{
    flatten_encoded, EncodedRow, Error, LabeledLocation, LocationFeatures, QuadSampler, Result,
};
use tracing::{debug, info};

use crate::artifact::ModelArtifact;
use crate::classifier::{ClassifierConfig, Ensemble};
use crate::labels::LabelTable;
use crate::matrix::FeatureMatrix;

/// Training inputs and their class ids
pub type TrainingSet = (Vec<Vec<f64>>, Vec<usize>);

#[derive(Debug, Clone, Default)]
pub struct ClassifierModel {
    config: ClassifierConfig,
    ensemble: Option<Ensemble>,
    labels: Option<LabelTable>,
    /// Table frozen by the last `prepare`, committed by the next successful `train`
    prepared: Option<LabelTable>,
}

impl ClassifierModel {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            ensemble: None,
            labels: None,
            prepared: None,
        }
    }

    /// Restore a model straight from an artifact file
    pub fn open(path: &Path) -> Result<Self> {
        let mut model = Self::default();
        model.load(path)?;
        Ok(model)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// True once `train` or `load` has succeeded
    pub fn is_trained(&self) -> bool {
        self.ensemble.is_some()
    }

    /// Label table of the trained ensemble
    pub fn labels(&self) -> Option<&LabelTable> {
        self.labels.as_ref()
    }

    /// Label table waiting for the next `train`
    pub fn prepared_labels(&self) -> Option<&LabelTable> {
        self.prepared.as_ref()
    }

    /// Input width of the trained ensemble
    pub fn feature_dim(&self) -> Option<usize> {
        self.ensemble.as_ref().map(Ensemble::n_features)
    }

    /// Encode a labeled manifest, freeze its label table and sample quads
    pub fn prepare<R: Rng + ?Sized>(
        &mut self,
        manifest: &[LabeledLocation],
        sampler: &QuadSampler,
        rng: &mut R,
    ) -> Result<TrainingSet> {
        let (table, rows) = encode_manifest(manifest)?;
        let quads = sampler.sample(&rows, rng)?;
        self.prepared = Some(table);
        Ok(quads.into_iter().map(|q| (q.features, q.label)).unzip())
    }

    /// Same as [`prepare`](Self::prepare), sampling rounds in parallel from `seed`
    pub fn prepare_parallel(
        &mut self,
        manifest: &[LabeledLocation],
        sampler: &QuadSampler,
        seed: u64,
    ) -> Result<TrainingSet> {
        let (table, rows) = encode_manifest(manifest)?;
        let quads = sampler.sample_parallel(&rows, seed)?;
        self.prepared = Some(table);
        Ok(quads.into_iter().map(|q| (q.features, q.label)).unzip())
    }

    /// Fit the configured ensemble
    ///
    /// Uses the table frozen by the last `prepare`. Without one the class
    /// ids double as labels. On error the model is left untouched.
    pub fn train(&mut self, inputs: &[Vec<f64>], labels: &[usize]) -> Result<()> {
        if inputs.len() != labels.len() {
            return Err(Error::InvalidInput(format!(
                "{} inputs but {} labels",
                inputs.len(),
                labels.len()
            )));
        }
        let x = FeatureMatrix::from_rows(inputs)?;

        let n_classes = labels.iter().max().map_or(0, |max| max + 1);
        let table = match &self.prepared {
            Some(table) if !table.is_empty() => table.clone(),
            _ => LabelTable::numeric(n_classes),
        };
        if n_classes > table.len() {
            return Err(Error::IndexOutOfRange {
                index: n_classes - 1,
                len: table.len(),
            });
        }

        let ensemble = self.config.fit(&x, labels, table.len())?;
        info!(
            kind = ensemble.kind(),
            rows = x.n_rows(),
            features = x.n_features(),
            classes = table.len(),
            "trained classifier"
        );

        self.labels = Some(table);
        self.ensemble = Some(ensemble);
        self.prepared = None;
        Ok(())
    }

    /// Predict the class id of every input row
    pub fn predict(&self, inputs: &[Vec<f64>]) -> Result<Vec<usize>> {
        inputs.iter().map(|row| self.predict_one(row)).collect()
    }

    pub fn predict_one(&self, row: &[f64]) -> Result<usize> {
        let ensemble = self.ensemble.as_ref().ok_or(Error::ModelNotTrained)?;
        if row.len() != ensemble.n_features() {
            return Err(Error::InvalidDimension {
                expected: ensemble.n_features(),
                actual: row.len(),
            });
        }
        Ok(ensemble.predict_row(row))
    }

    /// Label string for a class id
    pub fn decode_label(&self, id: usize) -> Result<&str> {
        self.labels.as_ref().ok_or(Error::ModelNotTrained)?.label(id)
    }

    /// Predict the destination label for one window of recent locations
    pub fn infer(&self, recent: &[LocationFeatures]) -> Result<String> {
        let window: Vec<&LocationFeatures> = recent.iter().collect();
        let id = self.predict_one(&flatten_encoded(&window)?)?;
        let label = self.decode_label(id)?;
        debug!(id, label, "inferred destination");
        Ok(label.to_string())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let (Some(ensemble), Some(labels)) = (&self.ensemble, &self.labels) else {
            return Err(Error::ModelNotTrained);
        };
        ModelArtifact::new(labels.clone(), ensemble.clone()).save(path)
    }

    /// Replace the current parameters with those stored at `path`
    ///
    /// On error the model is left untouched.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let artifact = ModelArtifact::load(path)?;
        self.labels = Some(artifact.labels);
        self.ensemble = Some(artifact.ensemble);
        Ok(())
    }
}

/// Freeze the label table and encode each row against it
fn encode_manifest(manifest: &[LabeledLocation]) -> Result<(LabelTable, Vec<EncodedRow>)> {
    if manifest.is_empty() {
        return Err(Error::ManifestFormat("manifest has no rows".to_string()));
    }

    let table = LabelTable::from_observed(manifest.iter().map(|row| row.class.as_str()));
    let rows = manifest
        .iter()
        .map(|row| {
            let class_id = table
                .id_of(&row.class)
                .ok_or_else(|| Error::UnknownDestination(row.class.clone()))?;
            Ok(EncodedRow::new(row.features.encode()?, class_id))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(rows = rows.len(), classes = table.len(), "encoded manifest");
    Ok((table, rows))
}

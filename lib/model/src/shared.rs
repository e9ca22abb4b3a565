use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::path::Path;
use std::sync::Arc;
use tourfusion_core::{LocationFeatures, Result};

use crate::suggestor::ClassifierModel;

/// Thread-safe handle to a [`ClassifierModel`]
///
/// Predictions take the read lock and run concurrently; training and
/// reloading take the write lock.
#[derive(Debug, Clone, Default)]
pub struct SharedModel {
    inner: Arc<RwLock<ClassifierModel>>,
}

impl SharedModel {
    pub fn new(model: ClassifierModel) -> Self {
        Self {
            inner: Arc::new(RwLock::new(model)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ClassifierModel> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ClassifierModel> {
        self.inner.write()
    }

    pub fn predict(&self, inputs: &[Vec<f64>]) -> Result<Vec<usize>> {
        self.inner.read().predict(inputs)
    }

    pub fn infer(&self, recent: &[LocationFeatures]) -> Result<String> {
        self.inner.read().infer(recent)
    }

    pub fn train(&self, inputs: &[Vec<f64>], labels: &[usize]) -> Result<()> {
        self.inner.write().train(inputs, labels)
    }

    /// Swap in the artifact at `path`; readers see the old model until it is loaded
    pub fn reload(&self, path: &Path) -> Result<()> {
        let mut fresh = ClassifierModel::new(*self.inner.read().config());
        fresh.load(path)?;
        *self.inner.write() = fresh;
        Ok(())
    }
}

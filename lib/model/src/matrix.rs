use tourfusion_core::{Error, Result};

/// Dense row-major feature matrix
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f64>,
    n_features: usize,
}

impl FeatureMatrix {
    /// Build from rows that must all share one width
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows
            .first()
            .ok_or_else(|| Error::InvalidInput("no input rows".to_string()))?;
        let n_features = first.len();
        if n_features == 0 {
            return Err(Error::InvalidInput("rows have no features".to_string()));
        }

        let mut data = Vec::with_capacity(rows.len() * n_features);
        for row in rows {
            if row.len() != n_features {
                return Err(Error::InvalidDimension {
                    expected: n_features,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }

        Ok(Self { data, n_features })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.data.len() / self.n_features
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[inline]
    pub fn row(&self, idx: usize) -> &[f64] {
        &self.data[idx * self.n_features..(idx + 1) * self.n_features]
    }

    #[inline]
    pub fn value(&self, row: usize, feature: usize) -> f64 {
        self.data[row * self.n_features + feature]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.n_features)
    }
}

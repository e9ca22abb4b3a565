use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tourfusion_core::{Error, Result};

/// Frozen mapping between class ids and destination labels
///
/// Labels are de-duplicated and sorted once, so the id of a label depends
/// only on the set of labels observed, never on the order they were seen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Build from observed labels in any order, with repeats
    pub fn from_observed<I, S>(observed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = observed.into_iter().map(Into::into).collect();
        Self {
            labels: unique.into_iter().collect(),
        }
    }

    /// Labels named after their own ids (`"0"`, `"1"`, ...)
    pub fn numeric(n_classes: usize) -> Self {
        Self {
            labels: (0..n_classes).map(|id| id.to_string()).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Class id of `label`, if known
    pub fn id_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|known| known == label)
    }

    /// Label for class id `id`
    pub fn label(&self, id: usize) -> Result<&str> {
        self.labels
            .get(id)
            .map(String::as_str)
            .ok_or(Error::IndexOutOfRange {
                index: id,
                len: self.labels.len(),
            })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_independent_ids() {
        let a = LabelTable::from_observed(["Lima, Peru", "Oslo, Norway", "Lima, Peru", "Cairo, Egypt"]);
        let b = LabelTable::from_observed(["Oslo, Norway", "Cairo, Egypt", "Lima, Peru"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.label(0).unwrap(), "Cairo, Egypt");
        assert_eq!(a.id_of("Oslo, Norway"), Some(2));
        assert_eq!(a.id_of("Rome, Italy"), None);
    }

    #[test]
    fn test_out_of_range() {
        let table = LabelTable::from_observed(["a", "b", "c", "d", "e"]);
        assert!(matches!(
            table.label(99),
            Err(Error::IndexOutOfRange { index: 99, len: 5 })
        ));
    }

    #[test]
    fn test_numeric() {
        let table = LabelTable::numeric(12);
        assert_eq!(table.label(2).unwrap(), "2");
        assert_eq!(table.id_of("10"), Some(10));
        assert_eq!(table.id_of("2"), Some(2));
    }
}

//! Synthetic pre/post samples

use serde::{Deserialize, Serialize};

/// One experimental unit of a two-group pre/post design
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: usize,
    pub treated: bool,
    pub pre: f64,
    pub post: f64,
}

impl Unit {
    /// Treatment indicator as a regressor value
    #[inline]
    pub fn treatment(&self) -> f64 {
        if self.treated { 1.0 } else { 0.0 }
    }
}

/// A tidy table of units ordered by id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyntheticSample {
    units: Vec<Unit>,
}

impl SyntheticSample {
    pub fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn treated_count(&self) -> usize {
        self.units.iter().filter(|u| u.treated).count()
    }
}

impl<'a> IntoIterator for &'a SyntheticSample {
    type Item = &'a Unit;
    type IntoIter = std::slice::Iter<'a, Unit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

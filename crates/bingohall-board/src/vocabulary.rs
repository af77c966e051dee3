//! The label pool boards are drawn from.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::FREE_CELL;

/// Highest number in the classic pool.
const CLASSIC_MAX: u32 = 75;

/// An ordered set of distinct labels.
///
/// Duplicates, blank labels and the free-cell marker are dropped on
/// construction, so a board drawn from a vocabulary never repeats a value
/// and only its centre reads as free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary(Vec<String>);

impl Vocabulary {
    /// Builds a vocabulary, keeping the first occurrence of each label.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let values = labels
            .into_iter()
            .map(Into::into)
            .map(|label: String| label.trim().to_string())
            .filter(|label| {
                !label.is_empty() && label != FREE_CELL && seen.insert(label.clone())
            })
            .collect();
        Self(values)
    }

    /// The numbers 1 through 75.
    pub fn classic() -> Self {
        Self::new((1..=CLASSIC_MAX).map(|n| n.to_string()))
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no labels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The labels in insertion order.
    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::classic()
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(labels: Vec<String>) -> Self {
        Self::new(labels)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.0
    }
}

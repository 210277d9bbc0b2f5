use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::{
    error::RteError,
    sentence_pair::{RtePair, RteSample},
};

/// Labelled premise/hypothesis pairs, in a fixed order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RteDataset {
    samples: Vec<RteSample>,
}

impl RteDataset {
    pub fn new(samples: Vec<RteSample>) -> Self { Self { samples } }

    /// Zip pairs with their labels; both lists must have the same length.
    pub fn from_pairs<L: Into<String>>(pairs: Vec<RtePair>, labels: Vec<L>) -> Result<Self, RteError> {
        if pairs.len() != labels.len() {
            return Err(RteError::LengthMismatch { inputs: pairs.len(), labels: labels.len() });
        }
        let samples = pairs
            .into_iter()
            .zip(labels)
            .map(|(pair, label)| RteSample::new(pair, label))
            .collect();
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[RteSample] { &self.samples }

    pub fn pairs(&self) -> Vec<RtePair> {
        self.samples.iter().map(|s| s.pair.clone()).collect()
    }
}

impl Dataset<RteSample> for RteDataset {
    fn get(&self, index: usize) -> Option<RteSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

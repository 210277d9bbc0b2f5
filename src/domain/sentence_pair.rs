// ============================================================
// Layer 3 — Sentence Pair Domain Types
// ============================================================
// A premise/hypothesis pair is the unit the model classifies.
// Each sentence is a list of words, and each word is later
// read character by character, so words are kept as Strings
// rather than token ids.
//
// Example:
//   premise:    ["a", "man", "is", "sleeping"]
//   hypothesis: ["a", "person", "rests"]
//   label:      "entailment"

use serde::{Deserialize, Serialize};

/// An unlabelled premise/hypothesis pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtePair {
    /// Words of the premise sentence
    pub premise: Vec<String>,

    /// Words of the hypothesis sentence
    pub hypothesis: Vec<String>,
}

impl RtePair {
    /// Create a pair from already-split words.
    pub fn new<P, H>(premise: P, hypothesis: H) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        H: IntoIterator,
        H::Item: Into<String>,
    {
        Self {
            premise: premise.into_iter().map(Into::into).collect(),
            hypothesis: hypothesis.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a pair by splitting both sentences on whitespace.
    ///
    /// Example:
    ///   let pair = RtePair::from_text("a b", "a");
    pub fn from_text(premise: &str, hypothesis: &str) -> Self {
        Self::new(premise.split_whitespace(), hypothesis.split_whitespace())
    }
}

/// A labelled pair used for training and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RteSample {
    pub pair: RtePair,

    /// One of the keys of `CLASSES_2_IX`
    pub label: String,
}

impl RteSample {
    pub fn new(pair: RtePair, label: impl Into<String>) -> Self {
        Self {
            pair,
            label: label.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_splits_words() {
        let pair = RtePair::from_text("a  man sleeps", "a person");
        assert_eq!(pair.premise, vec!["a", "man", "sleeps"]);
        assert_eq!(pair.hypothesis, vec!["a", "person"]);
    }
}

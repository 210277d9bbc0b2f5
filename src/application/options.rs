// ============================================================
// Layer 2 — Model and Training Options
// ============================================================
// Every recognised option for a run, serialisable to JSON with
// the upper-case keys used throughout the project:
//
//   {
//     "EMBEDDING_DIM": 50,
//     "HIDDEN_DIM": 150,
//     "CLASSES_2_IX": { "entailment": 0, "neutral": 1, "contradiction": 2 },
//     "DROPOUT": 0.1,
//     "LAST_NON_LINEAR": false,
//     "LR": 0.0003,
//     "L2": 0.0,
//     "BATCH_SIZE": 32,
//     "SAVE_PREFIX": "checkpoints/char_mgru"
//   }
//
// Options are validated once, before anything is built; a bad
// value never reaches the model.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::error::RteError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RteOptions {
    /// Width of the character embeddings and of the word vectors
    pub embedding_dim: usize,

    /// Width of the sentence encoders and the match decoder.
    /// Odd values are rounded down to the next even number.
    pub hidden_dim: usize,

    /// Label → class index; indices must be exactly 0..n
    pub classes_2_ix: BTreeMap<String, usize>,

    /// Dropout on character embeddings, training mode only
    pub dropout: f64,

    /// Apply leaky ReLU to the class scores before log-softmax
    pub last_non_linear: bool,

    pub lr: f64,

    /// Adam weight decay
    pub l2: f64,

    pub batch_size: usize,

    /// Checkpoints are written as `<SAVE_PREFIX>_epoch_<n>_val_acc_<acc>.model`
    pub save_prefix: String,

    /// When set, `fit` never writes checkpoints
    #[serde(default)]
    pub debug: bool,

    /// Directory for the per-epoch metrics CSV; disabled when absent
    #[serde(default)]
    pub metrics_dir: Option<String>,
}

impl Default for RteOptions {
    fn default() -> Self {
        let classes_2_ix = [("entailment", 0), ("neutral", 1), ("contradiction", 2)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self {
            embedding_dim:   50,
            hidden_dim:      150,
            classes_2_ix,
            dropout:         0.1,
            last_non_linear: false,
            lr:              3e-4,
            l2:              0.0,
            batch_size:      32,
            save_prefix:     "checkpoints/char_mgru".to_string(),
            debug:           false,
            metrics_dir:     None,
        }
    }
}

impl RteOptions {
    /// Check every option and report the first problem found.
    pub fn validate(&self) -> Result<(), RteError> {
        if self.embedding_dim == 0 {
            return Err(RteError::invalid_config("EMBEDDING_DIM", "must be positive"));
        }
        if self.effective_hidden_dim() == 0 {
            return Err(RteError::invalid_config(
                "HIDDEN_DIM",
                format!("{} rounds down to 0; use at least 2", self.hidden_dim),
            ));
        }
        if self.classes_2_ix.is_empty() {
            return Err(RteError::invalid_config("CLASSES_2_IX", "needs at least one label"));
        }
        let mut seen = vec![false; self.classes_2_ix.len()];
        for (label, &ix) in &self.classes_2_ix {
            match seen.get_mut(ix) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(RteError::invalid_config(
                        "CLASSES_2_IX",
                        format!("index {ix} of '{label}' is used twice"),
                    ))
                }
                None => {
                    return Err(RteError::invalid_config(
                        "CLASSES_2_IX",
                        format!(
                            "index {ix} of '{label}' is outside 0..{}",
                            self.classes_2_ix.len()
                        ),
                    ))
                }
            }
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(RteError::invalid_config(
                "DROPOUT",
                format!("{} is outside [0, 1)", self.dropout),
            ));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(RteError::invalid_config("LR", "must be a positive number"));
        }
        if !(self.l2.is_finite() && self.l2 >= 0.0) {
            return Err(RteError::invalid_config("L2", "must be zero or positive"));
        }
        if self.batch_size == 0 {
            return Err(RteError::invalid_config("BATCH_SIZE", "must be positive"));
        }
        if self.save_prefix.trim().is_empty() {
            return Err(RteError::invalid_config("SAVE_PREFIX", "must not be empty"));
        }
        Ok(())
    }

    /// `HIDDEN_DIM` rounded down to an even number.
    pub fn effective_hidden_dim(&self) -> usize {
        self.hidden_dim - self.hidden_dim % 2
    }

    pub fn num_classes(&self) -> usize {
        self.classes_2_ix.len()
    }

    /// Class index of `label`.
    pub fn label_index(&self, label: &str) -> Result<usize, RteError> {
        self.classes_2_ix
            .get(label)
            .copied()
            .ok_or_else(|| RteError::UnknownLabel(label.to_string()))
    }

    /// Read options from a JSON file and validate them.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read options from '{}'", path.display()))?;
        let options: Self = serde_json::from_str(&json)
            .with_context(|| format!("Malformed options in '{}'", path.display()))?;
        options.validate()?;
        Ok(options)
    }

    /// Write options to a JSON file, pretty-printed.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write options to '{}'", path.display()))?;
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn option_of(err: RteError) -> &'static str {
        match err {
            RteError::InvalidConfig { option, .. } => option,
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(RteOptions::default().validate().is_ok());
    }

    #[test]
    fn test_hidden_dim_rounds_down_to_even() {
        let mut o = RteOptions::default();
        o.hidden_dim = 7;
        assert_eq!(o.effective_hidden_dim(), 6);
        o.hidden_dim = 8;
        assert_eq!(o.effective_hidden_dim(), 8);
        o.hidden_dim = 1;
        assert_eq!(option_of(o.validate().unwrap_err()), "HIDDEN_DIM");
    }

    #[test]
    fn test_class_indices_must_be_dense() {
        let mut o = RteOptions::default();
        o.classes_2_ix.insert("neutral".into(), 5);
        assert_eq!(option_of(o.validate().unwrap_err()), "CLASSES_2_IX");

        let mut o = RteOptions::default();
        o.classes_2_ix.insert("neutral".into(), 0);
        assert_eq!(option_of(o.validate().unwrap_err()), "CLASSES_2_IX");
    }

    #[test]
    fn test_dropout_range() {
        let mut o = RteOptions::default();
        o.dropout = 1.0;
        assert_eq!(option_of(o.validate().unwrap_err()), "DROPOUT");
        o.dropout = 0.0;
        assert!(o.validate().is_ok());
    }

    #[test]
    fn test_label_lookup() {
        let o = RteOptions::default();
        assert_eq!(o.label_index("neutral"), Ok(1));
        assert_eq!(o.label_index("contradiction"), Ok(2));
        assert_eq!(
            o.label_index("maybe"),
            Err(RteError::UnknownLabel("maybe".into()))
        );
    }

    #[test]
    fn test_json_uses_upper_case_keys() {
        let json = r#"{
            "EMBEDDING_DIM": 4, "HIDDEN_DIM": 5,
            "CLASSES_2_IX": {"entail": 0, "contradict": 1},
            "DROPOUT": 0.0, "LAST_NON_LINEAR": true,
            "LR": 0.001, "L2": 0.0, "BATCH_SIZE": 2,
            "SAVE_PREFIX": "out/run"
        }"#;
        let o: RteOptions = serde_json::from_str(json).unwrap();
        assert_eq!(o.effective_hidden_dim(), 4);
        assert!(o.last_non_linear);
        assert!(!o.debug);
        assert_eq!(o.metrics_dir, None);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        let o = RteOptions::default();
        o.save_json(&path).unwrap();
        assert_eq!(RteOptions::load_json(&path).unwrap(), o);
    }
}

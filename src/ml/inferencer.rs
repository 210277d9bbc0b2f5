// ============================================================
// Layer 5 — Inferencer
// ============================================================
use std::{path::Path, sync::Arc};

use anyhow::Result;
use burn::prelude::*;

use crate::data::batcher::RteBatcher;
use crate::domain::{
    sentence_pair::{RtePair, RteSample},
    traits::CharVocabulary,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    context::{ComputeContext, Mode},
    model::{CharGruRte, CharGruRteConfig},
};

/// Output of `Inferencer::predict`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predictions {
    /// Arg-max class index per pair
    Labels(Vec<usize>),
    /// Class probabilities per pair (exp of the log-probabilities)
    Probabilities(Vec<Vec<f32>>),
}

pub struct Inferencer<B: Backend> {
    model:      CharGruRte<B>,
    batcher:    RteBatcher,
    ctx:        ComputeContext<B>,
    batch_size: usize,
}

impl<B: Backend> Inferencer<B> {
    /// `batch_size` is the default used when `predict` is not given one.
    pub fn new(model: CharGruRte<B>, batcher: RteBatcher, ctx: ComputeContext<B>, batch_size: usize) -> Self {
        Self { model, batcher, ctx, batch_size: batch_size.max(1) }
    }

    /// Rebuild a model from saved options and load a checkpoint into it.
    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        checkpoint:   impl AsRef<Path>,
        vocab:        Arc<dyn CharVocabulary>,
        ctx:          ComputeContext<B>,
    ) -> Result<Self> {
        let options = ckpt_manager.load_options()?;
        let model = CharGruRteConfig::from_options(&options, vocab.as_ref())?.init(&ctx);
        let model = ckpt_manager.load_model(model, checkpoint, ctx.device())?;
        let batcher = RteBatcher::new(vocab, &options);
        Ok(Self::new(model, batcher, ctx, options.batch_size))
    }

    /// Predict in batches of `batch_size` (default: the configured batch size).
    pub fn predict(
        &self,
        pairs:                &[RtePair],
        batch_size:           Option<usize>,
        return_probabilities: bool,
    ) -> Result<Predictions> {
        Ok(if return_probabilities {
            Predictions::Probabilities(self.predict_probabilities(pairs, batch_size)?)
        } else {
            Predictions::Labels(self.predict_labels(pairs, batch_size)?)
        })
    }

    /// Arg-max class index per pair.
    pub fn predict_labels(&self, pairs: &[RtePair], batch_size: Option<usize>) -> Result<Vec<usize>> {
        let mut labels = Vec::with_capacity(pairs.len());
        for chunk in pairs.chunks(self.resolve_batch_size(batch_size)) {
            let log_probs = self.log_probs(chunk)?;
            let [rows, _] = log_probs.dims();
            let ix = log_probs.argmax(1).reshape([rows]).into_data();
            labels.extend(ix.iter::<i64>().map(|i| i as usize));
        }
        Ok(labels)
    }

    /// Class probabilities per pair.
    pub fn predict_probabilities(&self, pairs: &[RtePair], batch_size: Option<usize>) -> Result<Vec<Vec<f32>>> {
        let mut probs = Vec::with_capacity(pairs.len());
        for chunk in pairs.chunks(self.resolve_batch_size(batch_size)) {
            let log_probs = self.log_probs(chunk)?;
            let [_, classes] = log_probs.dims();
            let flat: Vec<f32> = log_probs.exp().into_data().iter::<f32>().collect();
            probs.extend(flat.chunks(classes).map(<[f32]>::to_vec));
        }
        Ok(probs)
    }

    /// Fraction of samples whose predicted class matches the label.
    pub fn accuracy(&self, samples: &[RteSample], batch_size: Option<usize>) -> Result<f64> {
        if samples.is_empty() {
            return Ok(0.0);
        }
        let truth = self.batcher.label_indices(samples.iter().map(|s| s.label.as_str()))?;
        let pairs: Vec<RtePair> = samples.iter().map(|s| s.pair.clone()).collect();
        let predicted = self.predict_labels(&pairs, batch_size)?;
        let correct = truth.iter().zip(&predicted).filter(|(t, p)| t == p).count();
        Ok(correct as f64 / samples.len() as f64)
    }

    fn resolve_batch_size(&self, batch_size: Option<usize>) -> usize {
        batch_size.unwrap_or(self.batch_size).max(1)
    }

    fn log_probs(&self, pairs: &[RtePair]) -> Result<Tensor<B, 2>> {
        let batch = self.batcher.batch(&self.ctx, pairs)?;
        Ok(self.model.forward(batch.premise, batch.hypothesis, Mode::Eval))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::options::RteOptions;
    use crate::domain::vocabulary::CharVocab;
    use crate::ml::test_util::TestBackend;

    fn inferencer() -> Inferencer<TestBackend> {
        let mut options = RteOptions::default();
        options.embedding_dim = 4;
        options.hidden_dim = 4;
        options.batch_size = 2;
        options.classes_2_ix = [("entail".to_string(), 0), ("contradict".to_string(), 1)].into();

        let vocab: Arc<dyn CharVocabulary> = Arc::new(CharVocab::from_texts(["abc"]));
        let ctx = ComputeContext::<TestBackend>::default();
        let model = CharGruRteConfig::from_options(&options, vocab.as_ref()).unwrap().init(&ctx);
        Inferencer::new(model, RteBatcher::new(vocab, &options), ctx, options.batch_size)
    }

    fn pairs() -> Vec<RtePair> {
        vec![
            RtePair::from_text("a b", "a"),
            RtePair::from_text("c", "b c"),
            RtePair::from_text("abc cab", "ba"),
        ]
    }

    #[test]
    fn test_labels_and_probabilities_agree() {
        let inf = inferencer();
        let labels = inf.predict_labels(&pairs(), None).unwrap();
        assert_eq!(labels.len(), 3);

        let Predictions::Probabilities(probs) = inf.predict(&pairs(), Some(1), true).unwrap() else {
            panic!("expected probabilities");
        };
        assert_eq!(probs.len(), 3);
        for (row, label) in probs.iter().zip(&labels) {
            assert_eq!(row.len(), 2);
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
            let best = if row[0] >= row[1] { 0 } else { 1 };
            assert_eq!(best, *label);
        }
    }

    #[test]
    fn test_batch_size_does_not_change_predictions() {
        let inf = inferencer();
        let one = inf.predict(&pairs(), Some(1), true).unwrap();
        let all = inf.predict(&pairs(), Some(3), true).unwrap();
        let (Predictions::Probabilities(one), Predictions::Probabilities(all)) = (one, all) else {
            panic!("expected probabilities");
        };
        for (a, b) in one.iter().flatten().zip(all.iter().flatten()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_accuracy_of_empty_set_is_zero() {
        assert_eq!(inferencer().accuracy(&[], None).unwrap(), 0.0);
    }
}

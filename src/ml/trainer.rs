// ============================================================
// Layer 5 — Training Loop
// ============================================================
// One Adam step per batch on the NLL of the model's
// log-probabilities; after the last step of each epoch, score
// the held-out set and checkpoint when validation accuracy
// reaches the running maximum.
//
//   - Training runs on an AutodiffBackend in Mode::Train
//   - Validation runs on model.valid() (the inner backend) in Mode::Eval
//   - The optimizer and loss are built before the trainer and
//     handed to it; the trainer never creates them lazily
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::path::PathBuf;

use anyhow::Result;
use burn::{
    data::dataset::Dataset,
    module::AutodiffModule,
    nn::loss::CrossEntropyLoss,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::options::RteOptions;
use crate::data::{batcher::RteBatcher, dataset::RteDataset};
use crate::domain::error::RteError;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    context::{ComputeContext, Mode},
    inferencer::Inferencer,
    loss::{accuracy, nll_loss},
    model::CharGruRte,
};

/// What a call to `fit` did.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    /// Best validation accuracy seen, if any epoch ran
    pub best_val_acc: Option<f64>,
    /// One entry per epoch
    pub history: Vec<EpochMetrics>,
    /// Checkpoints written, in order
    pub saved: Vec<PathBuf>,
}

/// Build a trainer with Adam(β1 = 0.9, β2 = 0.999, ε = 1e-8) and weight decay `L2`.
pub fn adam_trainer<B: AutodiffBackend>(
    model:   CharGruRte<B>,
    batcher: RteBatcher,
    ctx:     ComputeContext<B>,
    options: RteOptions,
) -> Result<RteTrainer<B, impl Optimizer<CharGruRte<B>, B>>> {
    // m = β1*m + (1-β1)*g
    // v = β2*v + (1-β2)*g²
    // θ = θ - lr * m / (√v + ε)
    let optimizer = AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.999)
        .with_epsilon(1e-8)
        .with_weight_decay(Some(WeightDecayConfig::new(options.l2 as f32)))
        .init::<B, CharGruRte<B>>();
    let loss = nll_loss(ctx.device());
    RteTrainer::new(model, optimizer, loss, batcher, ctx, options)
}

pub struct RteTrainer<B: AutodiffBackend, O> {
    model:       CharGruRte<B>,
    optimizer:   O,
    loss:        CrossEntropyLoss<B>,
    batcher:     RteBatcher,
    ctx:         ComputeContext<B>,
    options:     RteOptions,
    checkpoints: CheckpointManager,
    metrics:     Option<MetricsLogger>,
}

impl<B, O> RteTrainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<CharGruRte<B>, B>,
{
    pub fn new(
        model:     CharGruRte<B>,
        optimizer: O,
        loss:      CrossEntropyLoss<B>,
        batcher:   RteBatcher,
        ctx:       ComputeContext<B>,
        options:   RteOptions,
    ) -> Result<Self> {
        options.validate()?;
        let checkpoints = CheckpointManager::new(options.save_prefix.clone());
        let metrics = options
            .metrics_dir
            .as_ref()
            .map(|dir| MetricsLogger::new(dir.clone()))
            .transpose()?;
        Ok(Self { model, optimizer, loss, batcher, ctx, options, checkpoints, metrics })
    }

    /// One optimizer step on a padded batch. Returns (loss, accuracy) before the update.
    pub fn fit_batch(
        &mut self,
        premise:    Tensor<B, 3, Int>,
        hypothesis: Tensor<B, 3, Int>,
        labels:     Tensor<B, 1, Int>,
    ) -> (f64, f64) {
        let log_probs = self.model.forward(premise, hypothesis, Mode::Train);
        let loss = self.loss.forward(log_probs.clone(), labels.clone());

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        let acc = accuracy(log_probs, labels);

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optimizer.step(self.options.lr, self.model.clone(), grads);

        (loss_val, acc)
    }

    /// Accuracy of the current weights on `dataset`, evaluated without autodiff.
    pub fn evaluate(&self, dataset: &RteDataset) -> Result<f64> {
        let inferencer = Inferencer::new(
            self.model.valid(),
            self.batcher.clone(),
            self.ctx.inner(),
            self.options.batch_size,
        );
        inferencer.accuracy(dataset.samples(), None)
    }

    /// Train for `n_epochs`.
    ///
    /// Each epoch runs `steps_epoch` batches (default: enough to cover the
    /// training set once). The batch cursor continues across epochs and
    /// wraps to the start when the next batch would begin past the end.
    pub fn fit(
        &mut self,
        train:       &RteDataset,
        val:         &RteDataset,
        n_epochs:    usize,
        steps_epoch: Option<usize>,
    ) -> Result<FitSummary> {
        if train.is_empty() {
            return Err(RteError::EmptyBatch.into());
        }
        let batch_size = self.options.batch_size;
        let steps_epoch = steps_epoch.unwrap_or_else(|| train.len().div_ceil(batch_size));
        tracing::info!(
            "Training: {} samples, {} validation, batch_size={}, steps/epoch={}, epochs={}",
            train.len(), val.len(), batch_size, steps_epoch, n_epochs
        );

        let mut summary = FitSummary { best_val_acc: None, history: Vec::new(), saved: Vec::new() };
        if steps_epoch == 0 {
            // Validation only follows a step, so nothing is scored or saved
            tracing::warn!("steps_epoch is 0: no training steps, no validation");
            return Ok(summary);
        }
        let mut cursor = 0usize;

        for epoch in 1..=n_epochs {
            let mut loss_sum = 0.0f64;
            let mut acc_sum  = 0.0f64;

            for step in 0..steps_epoch {
                let end = (cursor + batch_size).min(train.len());
                let (batch, labels) = self.batcher.batch_samples(&self.ctx, &train.samples()[cursor..end])?;
                let (loss, acc) = self.fit_batch(batch.premise, batch.hypothesis, labels);
                loss_sum += loss;
                acc_sum  += acc;

                cursor = if cursor + batch_size < train.len() { cursor + batch_size } else { 0 };
                tracing::debug!(
                    "Epoch {} step {}/{}: train_loss={:.4} train_acc={:.4}",
                    epoch, step + 1, steps_epoch, loss, acc
                );
            }

            let steps = steps_epoch as f64;
            let val_acc = self.evaluate(val)?;
            let metrics = EpochMetrics::new(epoch, loss_sum / steps, acc_sum / steps, val_acc);
            tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_acc={:.1}%",
                epoch, n_epochs, metrics.train_loss, metrics.train_acc * 100.0, val_acc * 100.0,
            );
            if let Some(logger) = &self.metrics {
                logger.log(&metrics)?;
            }

            if !self.options.debug && metrics.is_improvement(summary.best_val_acc) {
                summary.best_val_acc = Some(val_acc);
                let path = self.checkpoints.save_model(&self.model, epoch, val_acc)?;
                tracing::info!("Checkpoint saved: '{}'", path.display());
                summary.saved.push(path);
            }
            summary.history.push(metrics);
        }

        Ok(summary)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::{sentence_pair::RtePair, vocabulary::CharVocab};
    use crate::ml::{model::CharGruRteConfig, test_util::TestAutodiffBackend};

    fn options(prefix: &std::path::Path) -> RteOptions {
        let mut o = RteOptions::default();
        o.embedding_dim = 4;
        o.hidden_dim = 4;
        o.dropout = 0.0;
        o.lr = 0.05;
        o.batch_size = 2;
        o.classes_2_ix = [("entail".to_string(), 0), ("contradict".to_string(), 1)].into();
        o.save_prefix = prefix.join("run").to_string_lossy().into_owned();
        o
    }

    fn dataset() -> RteDataset {
        let pairs = vec![
            RtePair::from_text("a b", "a"),
            RtePair::from_text("a b", "c"),
            RtePair::from_text("c", "c"),
        ];
        RteDataset::from_pairs(pairs, vec!["entail", "contradict", "entail"]).unwrap()
    }

    fn trainer(o: RteOptions) -> RteTrainer<TestAutodiffBackend, impl Optimizer<CharGruRte<TestAutodiffBackend>, TestAutodiffBackend>> {
        let vocab = Arc::new(CharVocab::from_texts(["abc"]));
        let ctx = ComputeContext::<TestAutodiffBackend>::default();
        let model = CharGruRteConfig::from_options(&o, vocab.as_ref()).unwrap().init(&ctx);
        let batcher = RteBatcher::new(vocab, &o);
        adam_trainer(model, batcher, ctx, o).unwrap()
    }

    #[test]
    fn test_fit_batch_reduces_loss_on_a_fixed_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(options(dir.path()));
        let ds = dataset();
        let (batch, labels) = t.batcher.batch_samples(&t.ctx, ds.samples()).unwrap();

        let (first, acc) = t.fit_batch(batch.premise.clone(), batch.hypothesis.clone(), labels.clone());
        assert!(first.is_finite());
        assert!((0.0..=1.0).contains(&acc));

        let mut last = first;
        for _ in 0..30 {
            last = t.fit_batch(batch.premise.clone(), batch.hypothesis.clone(), labels.clone()).0;
        }
        assert!(last < first, "loss went from {first} to {last}");
    }

    #[test]
    fn test_fit_saves_first_epoch_and_every_tie_or_better() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(options(dir.path()));
        let ds = dataset();

        let summary = t.fit(&ds, &ds, 3, None).unwrap();
        assert_eq!(summary.history.len(), 3);
        assert!(!summary.saved.is_empty());
        assert!(summary.saved[0].to_string_lossy().contains("run_epoch_1_val_acc_"));

        // Saves happen exactly when val_acc reaches the running max
        let mut best: Option<f64> = None;
        let mut expected = 0;
        for m in &summary.history {
            if best.map_or(true, |b| m.val_acc >= b) {
                best = Some(m.val_acc);
                expected += 1;
            }
        }
        assert_eq!(summary.saved.len(), expected);
        assert!(summary.saved.iter().all(|p| p.exists()));
        assert_eq!(summary.best_val_acc, best);
    }

    #[test]
    fn test_debug_mode_never_writes_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let mut o = options(dir.path());
        o.debug = true;
        let mut t = trainer(o);
        let summary = t.fit(&dataset(), &dataset(), 1, Some(1)).unwrap();
        assert!(summary.saved.is_empty());
        assert_eq!(summary.best_val_acc, None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_zero_steps_per_epoch_never_validates_or_saves() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(options(dir.path()));
        let summary = t.fit(&dataset(), &dataset(), 2, Some(0)).unwrap();
        assert!(summary.history.is_empty());
        assert!(summary.saved.is_empty());
        assert_eq!(summary.best_val_acc, None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_fit_rejects_empty_training_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(options(dir.path()));
        let err = t.fit(&RteDataset::default(), &dataset(), 1, None).unwrap_err();
        assert_eq!(err.downcast_ref::<RteError>(), Some(&RteError::EmptyBatch));
    }
}

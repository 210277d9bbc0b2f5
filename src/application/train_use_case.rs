// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Validate options
//   Step 2: Pick the compute device        (once, here)
//   Step 3: Build the model                (Layer 5 - ml)
//   Step 4: Save options for inference     (Layer 6 - infra)
//   Step 5: Build Adam + trainer           (Layer 5 - ml)
//   Step 6: Run fit                        (Layer 5 - ml)
//
// Loading datasets and building the vocabulary happen before
// this use case; it receives both ready-made.

use std::sync::Arc;

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;

use crate::application::options::RteOptions;
use crate::data::{batcher::RteBatcher, dataset::RteDataset};
use crate::domain::traits::CharVocabulary;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    context::ComputeContext,
    model::CharGruRteConfig,
    trainer::{adam_trainer, FitSummary},
};

#[cfg(not(feature = "wgpu"))]
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
#[cfg(feature = "wgpu")]
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

pub struct TrainUseCase {
    options: RteOptions,
    vocab:   Arc<dyn CharVocabulary>,
}

impl TrainUseCase {
    /// Fails with a configuration error before anything is built.
    pub fn new(options: RteOptions, vocab: Arc<dyn CharVocabulary>) -> Result<Self> {
        options.validate()?;
        Ok(Self { options, vocab })
    }

    /// Train on the default backend and device.
    pub fn execute(&self, train: &RteDataset, val: &RteDataset, n_epochs: usize) -> Result<FitSummary> {
        self.execute_on(ComputeContext::<TrainBackend>::default(), train, val, n_epochs)
    }

    /// Train on an explicit backend and device.
    pub fn execute_on<B: AutodiffBackend>(
        &self,
        ctx:      ComputeContext<B>,
        train:    &RteDataset,
        val:      &RteDataset,
        n_epochs: usize,
    ) -> Result<FitSummary> {
        let cfg = &self.options;
        tracing::info!("Using device: {:?}", ctx.device());

        // ── Build model ───────────────────────────────────────────────────────
        let model_cfg = CharGruRteConfig::from_options(cfg, self.vocab.as_ref())?;
        let model = model_cfg.init(&ctx);

        // ── Save options so the checkpoint can be rebuilt ─────────────────────
        if !cfg.debug {
            CheckpointManager::new(cfg.save_prefix.clone()).save_options(cfg)?;
        }

        // ── Train ─────────────────────────────────────────────────────────────
        let batcher = RteBatcher::new(self.vocab.clone(), cfg);
        let mut trainer = adam_trainer(model, batcher, ctx, cfg.clone())?;
        let summary = trainer.fit(train, val, n_epochs, None)?;

        match summary.best_val_acc {
            Some(acc) => tracing::info!("Training complete! best val_acc={:.4}", acc),
            None => tracing::info!("Training complete!"),
        }
        Ok(summary)
    }
}

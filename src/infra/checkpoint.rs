// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights as a named parameter record
// (MessagePack, full precision), plus the options used to build
// the model.
//
// File naming convention, for SAVE_PREFIX = "runs/char_mgru":
//   runs/
//     char_mgru_epoch_1_val_acc_0.6120.model
//     char_mgru_epoch_3_val_acc_0.6485.model
//     char_mgru_options.json
//
// Loading needs the options file: the architecture (dimensions,
// class count) has to be rebuilt before weights can be loaded
// into it.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};

use crate::application::options::RteOptions;
use crate::ml::model::CharGruRte;

type ModelRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

/// Writes checkpoints next to a path prefix.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    prefix: String,
}

impl CheckpointManager {
    /// Create a manager for `prefix`, creating its parent directory if needed.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if let Some(parent) = Path::new(&prefix).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).ok();
            }
        }
        Self { prefix }
    }

    /// `<prefix>_epoch_<epoch>_val_acc_<val_acc:.4>.model`
    pub fn checkpoint_path(&self, epoch: usize, val_acc: f64) -> PathBuf {
        PathBuf::from(format!("{}_epoch_{}_val_acc_{:.4}.model", self.prefix, epoch, val_acc))
    }

    /// `<prefix>_options.json`
    pub fn options_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_options.json", self.prefix))
    }

    /// Save model weights for an epoch and return the file written.
    pub fn save_model<B: Backend>(
        &self,
        model:   &CharGruRte<B>,
        epoch:   usize,
        val_acc: f64,
    ) -> Result<PathBuf> {
        let path = self.checkpoint_path(epoch, val_acc);

        let bytes = <ModelRecorder as Recorder<B>>::record(
            &ModelRecorder::default(),
            model.clone().into_record(),
            (),
        )
        .map_err(|e| anyhow::anyhow!("Failed to encode checkpoint: {e:?}"))?;

        fs::write(&path, bytes)
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(path)
    }

    /// Load weights from `path` into a model of the same architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  CharGruRte<B>,
        path:   impl AsRef<Path>,
        device: &B::Device,
    ) -> Result<CharGruRte<B>> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Cannot read checkpoint '{}'", path.display()))?;

        let record = <ModelRecorder as Recorder<B>>::load(&ModelRecorder::default(), bytes, device)
            .map_err(|e| anyhow::anyhow!("Cannot decode checkpoint '{}': {e:?}", path.display()))?;

        tracing::info!("Loaded checkpoint '{}'", path.display());
        Ok(model.load_record(record))
    }

    /// Save the options the model was built from.
    pub fn save_options(&self, options: &RteOptions) -> Result<()> {
        let path = self.options_path();
        options.save_json(&path)?;
        tracing::debug!("Saved options to '{}'", path.display());
        Ok(())
    }

    /// Load (and validate) the saved options.
    pub fn load_options(&self) -> Result<RteOptions> {
        RteOptions::load_json(self.options_path()).with_context(|| {
            format!("No usable options next to checkpoints with prefix '{}'", self.prefix)
        })
    }
}

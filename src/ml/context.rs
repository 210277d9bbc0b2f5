// ============================================================
// Layer 5 — Compute Context and Run Mode
// ============================================================
// The device is chosen once at startup and carried in a
// ComputeContext; training vs. evaluation is an explicit Mode
// argument on every forward call. Nothing in the model keeps a
// hidden mode flag.

use burn::{prelude::*, tensor::backend::AutodiffBackend};

/// Whether a forward pass is part of training.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Dropout active
    Train,
    /// Deterministic
    Eval,
}

impl Mode {
    pub fn is_train(self) -> bool {
        matches!(self, Mode::Train)
    }
}

/// The device every tensor of a run is created on.
#[derive(Debug, Clone)]
pub struct ComputeContext<B: Backend> {
    device: B::Device,
}

impl<B: Backend> ComputeContext<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }
}

impl<B: Backend> Default for ComputeContext<B> {
    fn default() -> Self {
        Self::new(B::Device::default())
    }
}

impl<B: AutodiffBackend> ComputeContext<B> {
    /// Same device, without gradient tracking.
    pub fn inner(&self) -> ComputeContext<B::InnerBackend> {
        ComputeContext::new(self.device.clone())
    }
}

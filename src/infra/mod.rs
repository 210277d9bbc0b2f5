// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
//   checkpoint.rs — model weights and options on disk
//   metrics.rs    — per-epoch metrics CSV
//   logging.rs    — tracing subscriber setup
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Tracing subscriber setup
pub mod logging;

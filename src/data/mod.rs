// ============================================================
// Layer 4 — Data
// ============================================================
//   RteDataset  → labelled pairs, implements Burn's Dataset trait
//       │
//       ▼
//   RteBatcher  → padded character-index tensors + label indices
//       │
//       ▼
//   CharGruRte::forward
//
// Reference: Burn Book §4 (Datasets)

/// Labelled sentence pairs
pub mod dataset;

/// Padding and index lookup
pub mod batcher;

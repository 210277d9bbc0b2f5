// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no model math, no file formats.
//
// Reference: Clean Architecture pattern

// Run options and their validation
pub mod options;

// The training workflow
pub mod train_use_case;

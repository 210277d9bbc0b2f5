// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe the problem: sentence pairs,
// the vocabulary contract, and the error taxonomy.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Premise/hypothesis pairs and labelled samples
pub mod sentence_pair;

// The character vocabulary contract
pub mod traits;

// A small in-memory vocabulary implementation
pub mod vocabulary;

// Typed errors
pub mod error;

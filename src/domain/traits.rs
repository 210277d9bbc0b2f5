// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The model never builds its own vocabulary. It only needs a
// collaborator that maps characters to embedding rows, so that
// contract lives here as a trait.

// ─── CharVocabulary ──────────────────────────────────────────────────────────
/// Maps characters to embedding-table indices.
///
/// Index 0 is reserved for padding: implementations must never
/// return `Some(0)`. The embedding table is sized
/// `vocabulary_size() + 1` so the largest index is always valid.
///
/// Implementations:
///   - CharVocab → in-memory table built from text
pub trait CharVocabulary: Send + Sync {
    /// Number of real characters known to this vocabulary.
    fn vocabulary_size(&self) -> usize;

    /// Index of `c`, or `None` when the character is unknown.
    /// The mapping must be stable across calls.
    fn char_index(&self, c: char) -> Option<usize>;
}

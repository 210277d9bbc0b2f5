// ============================================================
// Layer 3 — In-Memory Character Vocabulary
// ============================================================
// Assigns indices 1, 2, 3, ... to characters in order of first
// appearance. 0 stays free for padding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::traits::CharVocabulary;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharVocab {
    index: HashMap<char, usize>,
}

impl CharVocab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary from every character in `texts`.
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut vocab = Self::new();
        for text in texts {
            for c in text.chars().filter(|c| !c.is_whitespace()) {
                vocab.insert(c);
            }
        }
        vocab
    }

    /// Add `c` if it is new and return its index.
    pub fn insert(&mut self, c: char) -> usize {
        let next = self.index.len() + 1;
        *self.index.entry(c).or_insert(next)
    }
}

impl CharVocabulary for CharVocab {
    fn vocabulary_size(&self) -> usize {
        self.index.len()
    }

    fn char_index(&self, c: char) -> Option<usize> {
        self.index.get(&c).copied()
    }
}

// ============================================================
// Layer 4 — RTE Batcher
// ============================================================
// Turns sentence pairs into padded character-index tensors.
//
//   Input:  N pairs, each side a list of words
//   Output: premise    [N, max_words_p, max_chars_p]
//           hypothesis [N, max_words_h, max_chars_h]
//
// Sizes are the batch maxima, per side. Every slot past a
// sentence's last word, and every position past a word's last
// character, holds the padding index 0.
//
// Example (a = 1, b = 2), premise side of ["a b", "ab"]:
//   [[1, 0], [2, 0]]
//   [[1, 2], [0, 0]]

use std::{fmt, sync::Arc};

use anyhow::Result;
use burn::prelude::*;

use crate::application::options::RteOptions;
use crate::domain::{
    error::RteError,
    sentence_pair::{RtePair, RteSample},
    traits::CharVocabulary,
};
use crate::ml::{context::ComputeContext, model::PAD_INDEX};

/// A padded batch of pairs ready for the model.
#[derive(Debug, Clone)]
pub struct RteBatch<B: Backend> {
    /// [batch, max_words_p, max_chars_p]
    pub premise: Tensor<B, 3, Int>,
    /// [batch, max_words_h, max_chars_h]
    pub hypothesis: Tensor<B, 3, Int>,
}

impl<B: Backend> RteBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.premise.dims()[0]
    }
}

#[derive(Clone)]
pub struct RteBatcher {
    vocab:   Arc<dyn CharVocabulary>,
    options: RteOptions,
}

impl fmt::Debug for RteBatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RteBatcher")
            .field("vocabulary_size", &self.vocab.vocabulary_size())
            .field("classes", &self.options.classes_2_ix)
            .finish()
    }
}

impl RteBatcher {
    pub fn new(vocab: Arc<dyn CharVocabulary>, options: &RteOptions) -> Self {
        Self {
            vocab,
            options: options.clone(),
        }
    }

    /// Pad unlabelled pairs.
    pub fn batch<B: Backend>(&self, ctx: &ComputeContext<B>, pairs: &[RtePair]) -> Result<RteBatch<B>> {
        self.batch_refs(ctx, pairs.iter())
    }

    /// Pad labelled samples; labels come back as class indices [batch].
    pub fn batch_samples<B: Backend>(
        &self,
        ctx:     &ComputeContext<B>,
        samples: &[RteSample],
    ) -> Result<(RteBatch<B>, Tensor<B, 1, Int>)> {
        let batch = self.batch_refs(ctx, samples.iter().map(|s| &s.pair))?;
        let labels = self.label_indices(samples.iter().map(|s| s.label.as_str()))?;
        let labels = labels.into_iter().map(|ix| ix as i64).collect::<Vec<_>>();
        let n = labels.len();
        let labels = Tensor::from_data(TensorData::new(labels, [n]), ctx.device());
        Ok((batch, labels))
    }

    /// Map labels to class indices through `CLASSES_2_IX`.
    pub fn label_indices<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> Result<Vec<usize>, RteError> {
        labels
            .into_iter()
            .map(|label| self.options.label_index(label))
            .collect()
    }

    fn batch_refs<'a, B: Backend>(
        &self,
        ctx:   &ComputeContext<B>,
        pairs: impl Iterator<Item = &'a RtePair> + Clone,
    ) -> Result<RteBatch<B>> {
        let premise = self.pad_side(ctx, pairs.clone().map(|p| p.premise.as_slice()), "premise")?;
        let hypothesis = self.pad_side(ctx, pairs.map(|p| p.hypothesis.as_slice()), "hypothesis")?;
        Ok(RteBatch { premise, hypothesis })
    }

    fn pad_side<'a, B: Backend>(
        &self,
        ctx:       &ComputeContext<B>,
        sentences: impl Iterator<Item = &'a [String]> + Clone,
        side:      &'static str,
    ) -> Result<Tensor<B, 3, Int>> {
        let batch_size = sentences.clone().count();
        if batch_size == 0 {
            return Err(RteError::EmptyBatch.into());
        }

        // At least one slot in each dimension, so an empty word never yields a 0-wide tensor
        let max_words = sentences.clone().map(|s| s.len()).max().unwrap_or(0).max(1);
        let max_chars = sentences
            .clone()
            .flat_map(|s| s.iter().map(|w| w.chars().count()))
            .max()
            .unwrap_or(0)
            .max(1);

        let mut flat = vec![PAD_INDEX; batch_size * max_words * max_chars];
        for (row, sentence) in sentences.enumerate() {
            if sentence.iter().all(|w| w.is_empty()) {
                return Err(RteError::EmptySentence { side, row }.into());
            }
            for (slot, word) in sentence.iter().enumerate() {
                let base = (row * max_words + slot) * max_chars;
                for (pos, c) in word.chars().enumerate() {
                    let ix = self
                        .vocab
                        .char_index(c)
                        .filter(|&ix| ix != 0)
                        .ok_or(RteError::UnknownCharacter(c))?;
                    flat[base + pos] = ix as i64;
                }
            }
        }

        tracing::trace!(
            "Padded {} {} sentences to [{}, {}, {}]",
            batch_size, side, batch_size, max_words, max_chars
        );
        Ok(Tensor::from_data(
            TensorData::new(flat, [batch_size, max_words, max_chars]),
            ctx.device(),
        ))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vocabulary::CharVocab;
    use crate::ml::test_util::TestBackend;

    fn batcher() -> RteBatcher {
        let mut options = RteOptions::default();
        options.classes_2_ix = [("entail".to_string(), 0), ("contradict".to_string(), 1)].into();
        RteBatcher::new(Arc::new(CharVocab::from_texts(["ab"])), &options)
    }

    fn ints(t: Tensor<TestBackend, 3, Int>) -> Vec<i64> {
        t.into_data().iter::<i64>().collect()
    }

    #[test]
    fn test_pads_words_and_characters() {
        let ctx = ComputeContext::<TestBackend>::default();
        let pairs = vec![RtePair::from_text("a b", "ab"), RtePair::from_text("ab", "b")];
        let batch = batcher().batch(&ctx, &pairs).unwrap();

        assert_eq!(batch.batch_size(), 2);
        assert_eq!(batch.premise.dims(), [2, 2, 2]);
        assert_eq!(ints(batch.premise), vec![1, 0, 2, 0, 1, 2, 0, 0]);
        assert_eq!(batch.hypothesis.dims(), [2, 1, 2]);
        assert_eq!(ints(batch.hypothesis), vec![1, 2, 2, 0]);
    }

    #[test]
    fn test_labels_follow_class_map() {
        let ctx = ComputeContext::<TestBackend>::default();
        let samples = vec![
            RteSample::new(RtePair::from_text("a", "b"), "contradict"),
            RteSample::new(RtePair::from_text("a", "a"), "entail"),
        ];
        let (_, labels) = batcher().batch_samples(&ctx, &samples).unwrap();
        assert_eq!(labels.into_data().iter::<i64>().collect::<Vec<_>>(), vec![1, 0]);
    }

    #[test]
    fn test_rejects_unknown_inputs() {
        let ctx = ComputeContext::<TestBackend>::default();
        let b = batcher();

        let err = b.batch(&ctx, &[RtePair::from_text("a z", "a")]).unwrap_err();
        assert_eq!(err.downcast_ref::<RteError>(), Some(&RteError::UnknownCharacter('z')));

        let samples = vec![RteSample::new(RtePair::from_text("a", "b"), "neutral")];
        let err = b.batch_samples(&ctx, &samples).unwrap_err();
        assert_eq!(err.downcast_ref::<RteError>(), Some(&RteError::UnknownLabel("neutral".into())));
    }

    #[test]
    fn test_rejects_empty_sentences_and_batches() {
        let ctx = ComputeContext::<TestBackend>::default();
        let b = batcher();

        let pairs = vec![RtePair::from_text("a", "b"), RtePair::from_text("b", "")];
        let err = b.batch(&ctx, &pairs).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RteError>(),
            Some(&RteError::EmptySentence { side: "hypothesis", row: 1 })
        );

        let err = b.batch(&ctx, &[]).unwrap_err();
        assert_eq!(err.downcast_ref::<RteError>(), Some(&RteError::EmptyBatch));
    }
}

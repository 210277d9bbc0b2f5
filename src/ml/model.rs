// ============================================================
// Layer 5 — Character-Level Match-GRU Entailment Model
// ============================================================
// premise, hypothesis: [batch, T, W] character indices (0 = pad)
//
//   chars ──embed──dropout──► char GRU ──last step──► word vectors
//   word vectors ──► premise GRU     ──► Y   [T_p, batch, n]
//   word vectors ──► hypothesis GRU  ──► H   [T_h, batch, n]
//   for each hypothesis step t:
//       a_t, alpha_t = attention(Y, h_t, r_{t-1})
//       r_t          = match GRU([a_t ; h_t], r_{t-1})   (masked)
//   r_T ──► linear ──(leaky ReLU)──► log-softmax
//
// Reference: Wang & Jiang (2016) Learning Natural Language
//            Inference with LSTM (match-LSTM)

use burn::{
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
    tensor::{
        activation::{leaky_relu, log_softmax},
        Distribution,
    },
};

use crate::application::options::RteOptions;
use crate::domain::{error::RteError, traits::CharVocabulary};
use crate::ml::{
    attention::{MatchAttention, MatchAttentionConfig},
    context::{ComputeContext, Mode},
    gru::{mask_blend, GruCell, GruCellConfig},
};

/// Character index reserved for padding.
pub const PAD_INDEX: i64 = 0;

/// Negative slope of the optional leaky ReLU on class scores.
pub const LEAKY_SLOPE: f64 = 0.01;

#[derive(Config, Debug)]
pub struct CharGruRteConfig {
    /// Number of real characters; the embedding table has one extra row for padding
    pub vocab_size:    usize,
    pub embedding_dim: usize,
    /// Must be even; `from_options` rounds for you
    pub hidden_dim:    usize,
    pub num_classes:   usize,
    #[config(default = 0.0)]
    pub dropout:       f64,
    #[config(default = false)]
    pub last_non_linear: bool,
}

impl CharGruRteConfig {
    /// Architecture for validated options and a vocabulary.
    pub fn from_options(
        options: &RteOptions,
        vocab:   &dyn CharVocabulary,
    ) -> Result<Self, RteError> {
        options.validate()?;
        Ok(Self::new(
            vocab.vocabulary_size(),
            options.embedding_dim,
            options.effective_hidden_dim(),
            options.num_classes(),
        )
        .with_dropout(options.dropout)
        .with_last_non_linear(options.last_non_linear))
    }

    pub fn init<B: Backend>(&self, ctx: &ComputeContext<B>) -> CharGruRte<B> {
        let device = ctx.device();
        let (e, n) = (self.embedding_dim, self.hidden_dim);

        let model = CharGruRte {
            embedding:      EmbeddingConfig::new(self.vocab_size + 1, e).init(device),
            dropout:        self.dropout,
            char_gru:       GruCellConfig::new(e, e).init(device),
            premise_gru:    GruCellConfig::new(e, n).init(device),
            hypothesis_gru: GruCellConfig::new(e, n).init(device),
            attention:      MatchAttentionConfig::new(n).init(device),
            match_gru:      GruCellConfig::new(n + n, n).init(device),
            output:         LinearConfig::new(n, self.num_classes).init(device),
            embedding_dim:  e,
            hidden_dim:     n,
            last_non_linear: self.last_non_linear,
        };
        tracing::info!(
            "Model ready: vocab={}, embedding_dim={}, hidden_dim={}, classes={}, params={}",
            self.vocab_size, e, n, self.num_classes, model.num_params()
        );
        model
    }
}

#[derive(Module, Debug)]
pub struct CharGruRte<B: Backend> {
    pub embedding:       Embedding<B>,
    /// Drop probability for character embeddings in `Mode::Train`
    pub dropout:         f64,
    pub char_gru:        GruCell<B>,
    pub premise_gru:     GruCell<B>,
    pub hypothesis_gru:  GruCell<B>,
    pub attention:       MatchAttention<B>,
    pub match_gru:       GruCell<B>,
    pub output:          Linear<B>,
    pub embedding_dim:   usize,
    pub hidden_dim:      usize,
    pub last_non_linear: bool,
}

pub struct RteOutput<B: Backend> {
    /// [batch, num_classes]
    pub log_probs: Tensor<B, 2>,
    /// Attention over the premise at every hypothesis step: [T_h, batch, T_p]
    pub attention: Tensor<B, 3>,
}

impl<B: Backend> CharGruRte<B> {
    /// premise: [batch, T_p, W_p], hypothesis: [batch, T_h, W_h] → log-probs [batch, num_classes]
    pub fn forward(
        &self,
        premise:    Tensor<B, 3, Int>,
        hypothesis: Tensor<B, 3, Int>,
        mode:       Mode,
    ) -> Tensor<B, 2> {
        self.forward_with_attention(premise, hypothesis, mode).log_probs
    }

    /// Same as `forward`, also returning the attention weights of every decoder step.
    pub fn forward_with_attention(
        &self,
        premise:    Tensor<B, 3, Int>,
        hypothesis: Tensor<B, 3, Int>,
        mode:       Mode,
    ) -> RteOutput<B> {
        let [batch, _, _] = premise.dims();
        let device = premise.device();

        let (words_p, mask_p) = self.encode_words(premise, mode);
        let (words_h, mask_h) = self.encode_words(hypothesis, mode);

        let h_0 = Tensor::zeros([batch, self.hidden_dim], &device);
        let (o_p, _) = self.premise_gru.forward_masked(words_p, mask_p.clone(), h_0.clone());
        let (o_h, _) = self.hypothesis_gru.forward_masked(words_h, mask_h.clone(), h_0);

        let (h_star, attention) = self.match_forward(o_h, mask_h, o_p, mask_p);
        RteOutput {
            log_probs: self.classify(h_star),
            attention,
        }
    }

    /// Character encoder. Every word slot is its own character sequence.
    ///
    /// chars: [batch, T, W] → (word vectors [T, batch, embedding_dim], word mask [T, batch])
    pub fn encode_words(&self, chars: Tensor<B, 3, Int>, mode: Mode) -> (Tensor<B, 3>, Tensor<B, 2>) {
        let [batch, seq_len, word_len] = chars.dims();
        let slots = batch * seq_len;
        let e = self.embedding_dim;
        let device = chars.device();

        let flat = chars.reshape([slots, word_len]);
        let char_mask = flat.clone().equal_elem(PAD_INDEX).bool_not().float(); // [slots, W]

        let embedded = self.char_dropout(self.embedding.forward(flat), mode); // [slots, W, e]

        let c_0 = Tensor::zeros([slots, e], &device);
        let (outputs, _) = self.char_gru.forward_masked(
            embedded.swap_dims(0, 1),
            char_mask.clone().transpose(),
            c_0,
        );
        let words = outputs
            .slice([word_len - 1..word_len, 0..slots, 0..e])
            .reshape([batch, seq_len, e])
            .swap_dims(0, 1);

        let word_mask = word_mask_from_chars(char_mask, batch, seq_len);
        (words, word_mask)
    }

    /// Inverted dropout, driven by `mode` alone so it applies on any backend.
    fn char_dropout(&self, embedded: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        if !mode.is_train() || self.dropout <= 0.0 {
            return embedded;
        }
        let keep = 1.0 - self.dropout;
        let mask = Tensor::random(embedded.shape(), Distribution::Bernoulli(keep), &embedded.device());
        embedded * mask.div_scalar(keep)
    }

    /// Attention-GRU decoder over the hypothesis, attending to the premise at every step.
    ///
    /// o_h: [T_h, batch, n], mask_h: [T_h, batch], o_p: [T_p, batch, n], mask_p: [T_p, batch]
    /// → (final state [batch, n], attention [T_h, batch, T_p])
    pub fn match_forward(
        &self,
        o_h:    Tensor<B, 3>,
        mask_h: Tensor<B, 2>,
        o_p:    Tensor<B, 3>,
        mask_p: Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 3>) {
        let [len_h, batch, n] = o_h.dims();
        let premise = self.attention.project_premise(o_p, mask_p);

        let mut r_prev = Tensor::zeros([batch, n], &o_h.device());
        let mut alphas = Vec::with_capacity(len_h);

        for t in 0..len_h {
            let h_t = o_h.clone().slice([t..t + 1, 0..batch, 0..n]).reshape([batch, n]);
            let m_t = mask_h.clone().slice([t..t + 1, 0..batch]).reshape([batch, 1]);

            let (a_t, alpha) = self.attention.attend(&premise, h_t.clone(), Some(r_prev.clone()));
            alphas.push(alpha);

            let r_raw = self.match_gru.step(Tensor::cat(vec![a_t, h_t], 1), r_prev.clone());
            r_prev = mask_blend(r_raw, r_prev, m_t);
        }

        (r_prev, Tensor::stack(alphas, 0))
    }

    /// h_star: [batch, n] → log-probs [batch, num_classes]
    pub fn classify(&self, h_star: Tensor<B, 2>) -> Tensor<B, 2> {
        let scores = self.output.forward(h_star);
        let scores = if self.last_non_linear {
            leaky_relu(scores, LEAKY_SLOPE)
        } else {
            scores
        };
        log_softmax(scores, 1)
    }
}

/// A word slot is real when any of its characters is.
/// char_mask: [batch * T, W] → [T, batch]
fn word_mask_from_chars<B: Backend>(char_mask: Tensor<B, 2>, batch: usize, seq_len: usize) -> Tensor<B, 2> {
    char_mask
        .sum_dim(1)
        .greater_elem(0.0)
        .float()
        .reshape([batch, seq_len])
        .transpose()
}

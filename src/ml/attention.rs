// ============================================================
// Layer 5 — Word-by-Word Attention over the Premise
// ============================================================
// At each hypothesis step, score every premise position
// against the current hypothesis state (and the match
// decoder's previous output), then return the
// attention-weighted premise vector.
//
//   M     = tanh(Y W_y + (h W_h + r_{t-1} W_r) ⊗ 1_T)
//   score = M W_alpha                 one scalar per premise position
//   alpha = softmax(score - 1000 (1 - mask))
//   a     = Σ_t alpha_t Y_t
//
// Scores are bounded by |W_alpha|₁ since M ∈ (-1, 1), so a
// 1000 shift leaves padded positions with exp(-1000) ≈ 0 mass.
//
// Reference: Rocktäschel et al. (2016) §2.4

use burn::{
    module::Param,
    prelude::*,
    tensor::{activation::{softmax, tanh}, Distribution},
};

/// Subtracted from the score of every padded premise position.
pub const MASK_PENALTY: f64 = 1000.0;

#[derive(Config, Debug)]
pub struct MatchAttentionConfig {
    pub d_model: usize,
}

impl MatchAttentionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MatchAttention<B> {
        let n = self.d_model;
        let normal = |shape: [usize; 2]| {
            Param::from_tensor(Tensor::random(shape, Distribution::Normal(0.0, 1.0), device))
        };
        MatchAttention {
            w_y:     normal([n, n]),
            w_h:     normal([n, n]),
            w_r:     normal([n, n]),
            w_alpha: normal([n, 1]),
        }
    }
}

#[derive(Module, Debug)]
pub struct MatchAttention<B: Backend> {
    pub w_y:     Param<Tensor<B, 2>>, // n × n
    pub w_h:     Param<Tensor<B, 2>>, // n × n
    pub w_r:     Param<Tensor<B, 2>>, // n × n
    pub w_alpha: Param<Tensor<B, 2>>, // n × 1
}

/// Premise encodings laid out batch-major, with their W_y projection.
/// Neither depends on the decoder step, so both are computed once per pass.
#[derive(Debug, Clone)]
pub struct ProjectedPremise<B: Backend> {
    /// [batch, T_p, n]
    pub states: Tensor<B, 3>,
    /// Y W_y: [batch, T_p, n]
    pub projected: Tensor<B, 3>,
    /// [batch, T_p] of 0/1
    pub mask: Tensor<B, 2>,
}

impl<B: Backend> MatchAttention<B> {
    /// y: [T_p, batch, n], mask_y: [T_p, batch]
    pub fn project_premise(&self, y: Tensor<B, 3>, mask_y: Tensor<B, 2>) -> ProjectedPremise<B> {
        let [seq_len, batch, n] = y.dims();
        let states = y.swap_dims(0, 1);
        let projected = states
            .clone()
            .reshape([batch * seq_len, n])
            .matmul(self.w_y.val())
            .reshape([batch, seq_len, n]);
        ProjectedPremise {
            states,
            projected,
            mask: mask_y.transpose(),
        }
    }

    /// Attend over an already projected premise.
    ///
    /// h: [batch, n], r_prev: [batch, n]
    /// → (context [batch, n], alpha [batch, T_p])
    pub fn attend(
        &self,
        premise: &ProjectedPremise<B>,
        h:       Tensor<B, 2>,
        r_prev:  Option<Tensor<B, 2>>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let [batch, seq_len, n] = premise.states.dims();

        let mut query = h.matmul(self.w_h.val());
        if let Some(r) = r_prev {
            query = query + r.matmul(self.w_r.val());
        }

        let m = tanh(premise.projected.clone() + query.unsqueeze_dim::<3>(1));
        let scores = m
            .reshape([batch * seq_len, n])
            .matmul(self.w_alpha.val())
            .reshape([batch, seq_len]);

        let penalty = premise.mask.clone().neg().add_scalar(1.0).mul_scalar(MASK_PENALTY);
        let alpha = softmax(scores - penalty, 1);

        let context = (premise.states.clone() * alpha.clone().unsqueeze_dim::<3>(2))
            .sum_dim(1)
            .reshape([batch, n]);
        (context, alpha)
    }

    /// One-shot attention: project `y` and attend with `h`.
    ///
    /// y: [T_p, batch, n], mask_y: [T_p, batch], h: [batch, n], r_prev: [batch, n]
    pub fn forward(
        &self,
        y:      Tensor<B, 3>,
        mask_y: Tensor<B, 2>,
        h:      Tensor<B, 2>,
        r_prev: Option<Tensor<B, 2>>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let premise = self.project_premise(y, mask_y);
        self.attend(&premise, h, r_prev)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::test_util::{assert_close, to_vec, TestBackend};

    fn setup(n: usize) -> MatchAttention<TestBackend> {
        MatchAttentionConfig::new(n).init(&Default::default())
    }

    #[test]
    fn test_alpha_is_a_distribution_over_real_positions() {
        let device = Default::default();
        let attn = setup(4);
        let y = Tensor::<TestBackend, 3>::random([5, 3, 4], Distribution::Normal(0.0, 1.0), &device);
        // T_p = 5, batch = 3; lengths 5, 2 and 1
        let mask = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(
                vec![
                    1.0f32, 1.0, 1.0,
                    1.0, 1.0, 0.0,
                    1.0, 0.0, 0.0,
                    1.0, 0.0, 0.0,
                    1.0, 0.0, 0.0,
                ],
                [5, 3],
            ),
            &device,
        );
        let h = Tensor::<TestBackend, 2>::random([3, 4], Distribution::Normal(0.0, 1.0), &device);
        let r = Tensor::<TestBackend, 2>::random([3, 4], Distribution::Normal(0.0, 1.0), &device);

        let (context, alpha) = attn.forward(y, mask, h, Some(r));
        assert_eq!(context.dims(), [3, 4]);
        assert_eq!(alpha.dims(), [3, 5]);

        let alpha = to_vec(alpha);
        let lengths = [5, 2, 1];
        for (row, &len) in lengths.iter().enumerate() {
            let probs = &alpha[row * 5..(row + 1) * 5];
            let total: f32 = probs.iter().sum();
            assert!((total - 1.0).abs() < 1e-5, "row {row} sums to {total}");
            assert!(probs[len..].iter().all(|&p| p < 1e-6), "row {row} leaks mass: {probs:?}");
        }
    }

    #[test]
    fn test_single_real_position_returns_that_state() {
        let device = Default::default();
        let attn = setup(2);
        let y = Tensor::<TestBackend, 3>::random([3, 1, 2], Distribution::Normal(0.0, 1.0), &device);
        let mask = Tensor::<TestBackend, 2>::from_data(TensorData::new(vec![1.0f32, 0.0, 0.0], [3, 1]), &device);
        let h = Tensor::<TestBackend, 2>::zeros([1, 2], &device);

        let (context, _) = attn.forward(y.clone(), mask, h, None);
        let first = y.slice([0..1, 0..1, 0..2]).reshape([1, 2]);
        assert_close(&to_vec(context), &to_vec(first), 1e-5);
    }

    #[test]
    fn test_projection_reuse_matches_one_shot() {
        let device = Default::default();
        let attn = setup(3);
        let y = Tensor::<TestBackend, 3>::random([4, 2, 3], Distribution::Normal(0.0, 1.0), &device);
        let mask = Tensor::<TestBackend, 2>::ones([4, 2], &device);
        let h = Tensor::<TestBackend, 2>::random([2, 3], Distribution::Normal(0.0, 1.0), &device);

        let premise = attn.project_premise(y.clone(), mask.clone());
        let (ctx_a, alpha_a) = attn.attend(&premise, h.clone(), None);
        let (ctx_b, alpha_b) = attn.forward(y, mask, h, None);
        assert_close(&to_vec(ctx_a), &to_vec(ctx_b), 1e-6);
        assert_close(&to_vec(alpha_a), &to_vec(alpha_b), 1e-6);
    }
}

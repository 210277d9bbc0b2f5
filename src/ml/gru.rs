// ============================================================
// Layer 5 — Gated Recurrent Unit with Step Masks
// ============================================================
// One GRU cell plus a masked forward pass over a whole padded
// sequence. The same pass encodes characters into words and
// words into sentences.
//
// Cell update (reset r, update z, candidate n):
//   r  = σ(W_ir x + b_ir + W_hr h + b_hr)
//   z  = σ(W_iz x + b_iz + W_hz h + b_hz)
//   n  = tanh(W_in x + b_in + r ⊙ (W_hn h + b_hn))
//   h' = (1 - z) ⊙ n + z ⊙ h
//
// Masked pass: padded steps leave state untouched,
//   h_t = m_t · h_raw + (1 - m_t) · h_{t-1}
// so the last real step's state is what later steps carry.
//
// Reference: Cho et al. (2014) Learning Phrase Representations
//            using RNN Encoder-Decoder

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::{sigmoid, tanh},
};

#[derive(Config, Debug)]
pub struct GruCellConfig {
    pub d_input:  usize,
    pub d_hidden: usize,
}

impl GruCellConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> GruCell<B> {
        GruCell {
            input_gates:  LinearConfig::new(self.d_input, 3 * self.d_hidden).init(device),
            hidden_gates: LinearConfig::new(self.d_hidden, 3 * self.d_hidden).init(device),
            d_hidden:     self.d_hidden,
        }
    }
}

/// Single-layer, unidirectional GRU cell.
/// Gate weights are packed as [reset | update | candidate].
#[derive(Module, Debug)]
pub struct GruCell<B: Backend> {
    pub input_gates:  Linear<B>,
    pub hidden_gates: Linear<B>,
    pub d_hidden:     usize,
}

impl<B: Backend> GruCell<B> {
    /// One update. x: [batch, d_input], h: [batch, d_hidden] → [batch, d_hidden]
    pub fn step(&self, x: Tensor<B, 2>, h: Tensor<B, 2>) -> Tensor<B, 2> {
        let gi = self.input_gates.forward(x);
        let gh = self.hidden_gates.forward(h.clone());

        let r = sigmoid(self.gate(&gi, 0) + self.gate(&gh, 0));
        let z = sigmoid(self.gate(&gi, 1) + self.gate(&gh, 1));
        let n = tanh(self.gate(&gi, 2) + r * self.gate(&gh, 2));

        z.clone().neg().add_scalar(1.0) * n + z * h
    }

    /// Masked pass over a padded sequence.
    ///
    /// inputs: [T, batch, d_input], mask: [T, batch] of 0/1, h_0: [batch, d_hidden]
    /// → (outputs [T, batch, d_hidden], final hidden [batch, d_hidden])
    ///
    /// The output of step 0 is taken as-is; later outputs are blended
    /// with the previous output under the step mask, like the hidden state.
    pub fn forward_masked(
        &self,
        inputs: Tensor<B, 3>,
        mask:   Tensor<B, 2>,
        h_0:    Tensor<B, 2>,
    ) -> (Tensor<B, 3>, Tensor<B, 2>) {
        let [seq_len, batch, d_input] = inputs.dims();
        if seq_len == 0 {
            let empty = Tensor::zeros([0, batch, self.d_hidden], &h_0.device());
            return (empty, h_0);
        }

        let mut h_prev = h_0;
        let mut o_prev: Option<Tensor<B, 2>> = None;
        let mut outputs = Vec::with_capacity(seq_len);

        for t in 0..seq_len {
            let x_t = inputs
                .clone()
                .slice([t..t + 1, 0..batch, 0..d_input])
                .reshape([batch, d_input]);
            let m_t = mask.clone().slice([t..t + 1, 0..batch]).reshape([batch, 1]);

            let h_raw = self.step(x_t, h_prev.clone());
            let o_t = match o_prev {
                None => h_raw.clone(),
                Some(o) => mask_blend(h_raw.clone(), o, m_t.clone()),
            };
            h_prev = mask_blend(h_raw, h_prev, m_t);

            outputs.push(o_t.clone());
            o_prev = Some(o_t);
        }

        (Tensor::stack(outputs, 0), h_prev)
    }

    fn gate(&self, packed: &Tensor<B, 2>, k: usize) -> Tensor<B, 2> {
        let [batch, _] = packed.dims();
        let d = self.d_hidden;
        packed.clone().slice([0..batch, k * d..(k + 1) * d])
    }
}

/// `new` where mask is 1, `prev` where mask is 0.
/// new, prev: [batch, n]; mask: [batch, 1]
pub fn mask_blend<B: Backend>(
    new:  Tensor<B, 2>,
    prev: Tensor<B, 2>,
    mask: Tensor<B, 2>,
) -> Tensor<B, 2> {
    new * mask.clone() + prev * mask.neg().add_scalar(1.0)
}

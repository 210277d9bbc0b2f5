// ============================================================
// Layer 5 — Loss and Accuracy
// ============================================================
// The model already ends in log-softmax. Burn's cross-entropy
// applies log-softmax to its input again, which leaves
// log-probabilities unchanged, so on model output it is the
// negative log-likelihood:
//
//   loss = -(1/N) Σ_i log_probs[i, y_i]

use burn::{
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    prelude::*,
};

/// NLL on log-probabilities: unweighted, no label smoothing.
pub fn nll_loss<B: Backend>(device: &B::Device) -> CrossEntropyLoss<B> {
    CrossEntropyLossConfig::new().init(device)
}

/// Fraction of rows whose arg-max equals the target.
pub fn accuracy<B: Backend>(log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> f64 {
    let [batch] = targets.dims();
    if batch == 0 {
        return 0.0;
    }
    let correct: i64 = log_probs
        .argmax(1)
        .reshape([batch])
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as f64 / batch as f64
}

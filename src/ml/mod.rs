// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here.
//
//   context.rs    — ComputeContext (device) and Mode (train/eval)
//   gru.rs        — GRU cell and the masked sequence pass
//   attention.rs  — attention of hypothesis states over the premise
//   model.rs      — character encoder, sentence encoders,
//                   match decoder, classifier head
//   loss.rs       — NLL via burn cross-entropy, batch accuracy
//   trainer.rs    — fit_batch / fit with Adam and checkpointing
//   inferencer.rs — batched prediction
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Device handle and explicit run mode
pub mod context;

/// Masked GRU
pub mod gru;

/// Premise attention
pub mod attention;

/// The entailment model
pub mod model;

/// Loss and accuracy
pub mod loss;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Batched prediction
pub mod inferencer;

#[cfg(test)]
pub(crate) mod test_util {
    use burn::prelude::*;

    pub type TestBackend = burn::backend::NdArray;
    pub type TestAutodiffBackend = burn::backend::Autodiff<TestBackend>;

    pub fn to_vec<B: Backend, const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
        t.into_data().iter::<f32>().collect()
    }

    pub fn int_tensor<B: Backend>(values: Vec<i64>, shape: [usize; 3], device: &B::Device) -> Tensor<B, 3, Int> {
        Tensor::from_data(TensorData::new(values, shape), device)
    }

    pub fn assert_close(a: &[f32], b: &[f32], tol: f32) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).abs() <= tol, "index {i}: {x} vs {y}");
        }
    }
}

#![recursion_limit = "256"]

// ============================================================
// char-mgru-rte
// ============================================================
// Character-level match-GRU model for recognizing textual
// entailment (RTE): given a premise and a hypothesis sentence,
// predict the relationship class between them.
//
// Layers, from the outside in:
//
//   application/ — options and the training use case
//   domain/      — sentence pairs, the vocabulary contract, errors
//   data/        — labelled datasets and padded tensor batches
//   ml/          — the model, its recurrent pieces, training, inference
//   infra/       — checkpoints, metrics CSV, tracing setup
//
// Reference: Rocktäschel et al. (2016) Reasoning about Entailment
//            with Neural Attention
//            Wang & Jiang (2016) Learning Natural Language
//            Inference with LSTM

pub mod application;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;

pub use application::options::RteOptions;
pub use application::train_use_case::TrainUseCase;
pub use data::batcher::{RteBatch, RteBatcher};
pub use data::dataset::RteDataset;
pub use domain::error::RteError;
pub use domain::sentence_pair::{RtePair, RteSample};
pub use domain::traits::CharVocabulary;
pub use domain::vocabulary::CharVocab;
pub use infra::logging::init_tracing;
pub use ml::context::{ComputeContext, Mode};
pub use ml::inferencer::{Inferencer, Predictions};
pub use ml::model::{CharGruRte, CharGruRteConfig, RteOutput};
pub use ml::trainer::{adam_trainer, FitSummary, RteTrainer};

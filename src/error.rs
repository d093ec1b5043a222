use thiserror::Error;

use crate::input::InputError;
use crate::model::features::SchemaError;
use crate::pipeline::stage2_label::LabelError;
use crate::pipeline::stage3_context::ContextError;
use crate::pipeline::stage4_classify::ClassifyError;
use crate::trainer::ModelError;

/// Errors surfaced by a training or classification run.
///
/// Every variant aborts the run; there is no fallback labeling.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

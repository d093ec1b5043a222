use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

pub mod reader;
pub mod telemetry;

use crate::model::features::{FeatureSchema, FeatureVector, SchemaError};
use reader::open_maybe_gz;
use telemetry::parse_telemetry;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("telemetry line {line}: {source}")]
    SchemaMismatch {
        line: usize,
        #[source]
        source: SchemaError,
    },
    #[error("no sessions found in {0}")]
    Empty(PathBuf),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryOptions {
    pub has_header: bool,
}

/// Sessions read from one telemetry file, in file order.
#[derive(Debug, Clone)]
pub struct TelemetrySet {
    pub path: PathBuf,
    pub sessions: Vec<FeatureVector>,
    /// 1-based source line of each session.
    pub lines: Vec<usize>,
}

impl TelemetrySet {
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

pub fn load_telemetry(
    path: &Path,
    schema: &FeatureSchema,
    options: TelemetryOptions,
) -> Result<TelemetrySet, InputError> {
    let reader = open_maybe_gz(path)?;
    let (sessions, lines) = parse_telemetry(reader, schema, options)?;
    let set = TelemetrySet {
        path: path.to_path_buf(),
        sessions,
        lines,
    };
    if set.is_empty() {
        return Err(InputError::Empty(set.path));
    }

    info!(
        path = %path.display(),
        sessions = set.len(),
        features = schema.n_features(),
        "loaded telemetry"
    );
    Ok(set)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;

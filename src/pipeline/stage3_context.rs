//! Label context persistence.
//!
//! The artifact is two comma-delimited lines, `Good,<id>` then `Bad,<id>`,
//! with 1-based cluster ids and no header.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::model::cluster_id::ClusterId;
use crate::model::label_context::LabelContext;

pub const CONTEXT_FILE_NAME: &str = "ClusterContext.txt";

const GOOD_TAG: &str = "Good";
const BAD_TAG: &str = "Bad";

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("label context parse error: {0}")]
    Parse(String),
}

pub fn render_context(ctx: &LabelContext) -> String {
    format!("{},{}\n{},{}\n", GOOD_TAG, ctx.good, BAD_TAG, ctx.bad)
}

pub fn parse_context(text: &str) -> Result<LabelContext, ContextError> {
    let mut good: Option<ClusterId> = None;
    let mut bad: Option<ClusterId> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (tag, value) = line.split_once(',').ok_or_else(|| {
            ContextError::Parse(format!("line {}: expected `Tag,Integer`", line_no))
        })?;
        let id = value
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(ClusterId::new)
            .ok_or_else(|| {
                ContextError::Parse(format!(
                    "line {}: {:?} is not a 1-based cluster id",
                    line_no,
                    value.trim()
                ))
            })?;

        let slot = match tag.trim() {
            GOOD_TAG => &mut good,
            BAD_TAG => &mut bad,
            other => {
                return Err(ContextError::Parse(format!(
                    "line {}: unknown tag {:?}",
                    line_no, other
                )));
            }
        };
        if slot.replace(id).is_some() {
            return Err(ContextError::Parse(format!(
                "line {}: duplicate {} entry",
                line_no,
                tag.trim()
            )));
        }
    }

    match (good, bad) {
        (Some(good), Some(bad)) => Ok(LabelContext::new(good, bad)),
        (None, _) => Err(ContextError::Parse(format!("missing `{}` entry", GOOD_TAG))),
        (_, None) => Err(ContextError::Parse(format!("missing `{}` entry", BAD_TAG))),
    }
}

/// Writes the context, replacing any previous file. Parent directories are
/// not created.
pub fn save_context(ctx: &LabelContext, path: &Path) -> Result<(), ContextError> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(render_context(ctx).as_bytes())?;
    w.flush()?;
    info!(
        path = %path.display(),
        good = %ctx.good,
        bad = %ctx.bad,
        "wrote label context"
    );
    Ok(())
}

pub fn load_context(path: &Path) -> Result<LabelContext, ContextError> {
    let text = fs::read_to_string(path)?;
    parse_context(&text)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_context.rs"]
mod tests;

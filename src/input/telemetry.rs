use std::io::BufRead;

use crate::input::{InputError, TelemetryOptions};
use crate::model::features::{FeatureSchema, FeatureVector};

pub const FIELD_SEPARATOR: char = ',';

pub fn parse_telemetry<R: BufRead>(
    mut reader: R,
    schema: &FeatureSchema,
    options: TelemetryOptions,
) -> Result<(Vec<FeatureVector>, Vec<usize>), InputError> {
    let mut buf = String::new();
    let mut sessions = Vec::new();
    let mut lines = Vec::new();
    let mut line_no = 0usize;
    let mut header_pending = options.has_header;

    loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim();
        if line.is_empty() {
            continue;
        }
        if header_pending {
            header_pending = false;
            continue;
        }

        let values = parse_row(line, line_no)?;
        schema
            .check_len(values.len())
            .map_err(|source| InputError::SchemaMismatch {
                line: line_no,
                source,
            })?;
        sessions.push(FeatureVector::new(values));
        lines.push(line_no);
    }

    Ok((sessions, lines))
}

pub fn parse_row(line: &str, line_no: usize) -> Result<Vec<f32>, InputError> {
    line.split(FIELD_SEPARATOR)
        .enumerate()
        .map(|(col, raw)| {
            let raw = raw.trim();
            match raw.parse::<f32>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(InputError::Parse(format!(
                    "telemetry line {} column {}: {:?} is not a finite number",
                    line_no,
                    col + 1,
                    raw
                ))),
            }
        })
        .collect()
}

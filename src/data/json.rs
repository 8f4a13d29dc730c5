//! JSON decoding for input data files.
//!
//! Raw review and offering dumps are large and hand-maintained, so decode
//! failures report the serde path plus a snippet of the offending line instead
//! of a bare "invalid type" message.

use anyhow::Result;
use serde::de::DeserializeOwned;

/// Deserialize `body`, describing failures by path, type mismatch, and location.
pub fn parse_json_with_context<T: DeserializeOwned>(body: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let inner = err.inner();
        let (line, column) = (inner.line(), inner.column());
        let path = err.path().to_string();

        let msg = inner.to_string();
        let loc = format!(" at line {line} column {column}");
        let detail = describe_mismatch(msg.strip_suffix(&loc).unwrap_or(&msg));
        let snippet = error_snippet(body, line, column, 24);

        let mut out = String::new();
        if !path.is_empty() && path != "." {
            out.push_str(&format!("at path '{path}': "));
        }
        out.push_str(&format!("{detail} (line {line} col {column})\n{snippet}"));
        anyhow::anyhow!(out)
    })
}

/// Rewrite `"invalid type: X, expected Y"` as `"expected Y, got X"`.
fn describe_mismatch(msg: &str) -> String {
    if let Some(rest) = msg.strip_prefix("invalid type: ")
        && let Some((actual, expected)) = rest.split_once(", expected ")
    {
        return format!("expected {expected}, got {actual}");
    }
    msg.to_string()
}

fn error_snippet(body: &str, line: usize, column: usize, width: usize) -> String {
    let target: Vec<char> = body
        .lines()
        .nth(line.saturating_sub(1))
        .unwrap_or("")
        .chars()
        .collect();
    if target.is_empty() {
        return "(empty line)".to_string();
    }

    let error_idx = column.saturating_sub(1).min(target.len());
    let start = error_idx.saturating_sub(width / 2);
    let end = (error_idx + width / 2).min(target.len());
    let slice: String = target[start..end].iter().collect();
    let indicator = " ".repeat(error_idx - start) + "^";

    format!("...{slice}...\n   {indicator}")
}

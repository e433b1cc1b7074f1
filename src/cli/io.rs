//! JSON I/O handling for CLI
//!
//! Every invocation writes exactly one JSON object to stdout.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};
use crate::document::Document;

/// Read a document from a JSON file
pub fn read_document(path: &Path) -> CliResult<Document> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", path.display(), e)))?;
    if content.trim().is_empty() {
        return Err(CliError::invalid_input(format!("{} is empty", path.display())));
    }
    serde_json::from_str(&content)
        .map_err(|e| CliError::invalid_input(format!("Invalid document JSON: {}", e)))
}

/// Success envelope
pub fn ok_response(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

/// Error envelope
pub fn error_response(err: &CliError) -> Value {
    serde_json::json!({
        "status": "error",
        "code": err.code_str(),
        "message": err.message()
    })
}

/// Write one JSON object to stdout
pub fn write_json(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

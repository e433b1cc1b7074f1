//! CLI module for facetdb
//!
//! Provides command-line access to a file-backed document repository:
//! - put / get / delete: document CRUD with index maintenance
//! - search: faceted lookup with optional paging
//! - records: dump the raw index

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    build_criteria, delete, execute, get, open_repository, put, records, run, run_command, search,
    FileRepository,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_response, ok_response, read_document, write_json};

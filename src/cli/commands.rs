//! CLI command implementations
//!
//! Each command opens the two file stores under the data directory, runs one
//! repository operation and returns the JSON payload for the `data` field.

use std::path::Path;

use serde_json::{json, Value};

use crate::config::FacetConfig;
use crate::document::Document;
use crate::index::{FacetIndex, FacetMatch, IndexRecord, SearchCriteria};
use crate::pagination::Pageable;
use crate::repository::{DocumentRepository, RepositoryError, TimeRange};
use crate::store::FileStore;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{error_response, ok_response, read_document, write_json};

/// Repository over the on-disk stores
pub type FileRepository = DocumentRepository<FileStore<Document>, FileStore<IndexRecord>>;

/// Parse args, run the command, print the response envelope.
///
/// Failures are printed as an error envelope and returned so the process
/// exits non-zero.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match execute(&cli) {
        Ok(data) => write_json(&ok_response(data)),
        Err(e) => {
            write_json(&error_response(&e))?;
            Err(e)
        }
    }
}

/// Run one command and return its payload
pub fn execute(cli: &Cli) -> CliResult<Value> {
    let config = match &cli.config {
        Some(path) => FacetConfig::load(path)?,
        None => FacetConfig::default(),
    };
    config.apply_logging()?;

    let repo = open_repository(&cli.data_dir, config)?;
    run_command(&repo, &cli.command)
}

/// Open (creating if needed) `<data_dir>/documents` and `<data_dir>/index`
pub fn open_repository(data_dir: &Path, config: FacetConfig) -> CliResult<FileRepository> {
    let documents = FileStore::open(data_dir.join("documents"))?;
    let index_store = FileStore::open(data_dir.join("index"))?;
    let index = FacetIndex::with_config(index_store, config)?;
    Ok(DocumentRepository::new(documents, index))
}

/// Dispatch a parsed command against an open repository
pub fn run_command(repo: &FileRepository, cmd: &Command) -> CliResult<Value> {
    match cmd {
        Command::Put { file } => put(repo, file),
        Command::Get { id } => get(repo, id),
        Command::Delete { id } => delete(repo, id),
        Command::Search {
            doc_types,
            facets,
            page,
            size,
        } => search(repo, doc_types, facets, *page, *size),
        Command::Records => records(repo),
    }
}

/// Create or update the document stored in `file`
pub fn put(repo: &FileRepository, file: &Path) -> CliResult<Value> {
    let document = read_document(file)?;
    let saved = repo.save(document)?;
    Ok(serde_json::to_value(saved)?)
}

pub fn get(repo: &FileRepository, id: &str) -> CliResult<Value> {
    match repo.find_by_id(id)? {
        Some(document) => Ok(serde_json::to_value(document)?),
        None => Err(RepositoryError::DocumentNotFound(id.to_string()).into()),
    }
}

pub fn delete(repo: &FileRepository, id: &str) -> CliResult<Value> {
    let removed = repo.delete(id)?;
    Ok(json!({ "deleted": removed.id }))
}

pub fn search(
    repo: &FileRepository,
    doc_types: &[String],
    facets: &[String],
    page: Option<usize>,
    size: Option<usize>,
) -> CliResult<Value> {
    let criteria = build_criteria(doc_types, facets)?;
    let pageable = match (page, size) {
        (None, None) => None,
        (page, Some(size)) => Some(Pageable::new(page.unwrap_or(1), size)),
        (Some(_), None) => return Err(CliError::invalid_input("--page requires --size")),
    };

    let page = repo.search(&criteria, TimeRange::all(), pageable)?;
    Ok(serde_json::to_value(page)?)
}

/// Every index record as `{ "key": ..., "members": [...] }`
pub fn records(repo: &FileRepository) -> CliResult<Value> {
    let records = repo.index().records()?;
    let entries: Vec<Value> = records
        .into_iter()
        .map(|record| json!({ "key": record.id, "members": record.members }))
        .collect();
    Ok(Value::Array(entries))
}

/// Build criteria from `--type` values and `name=v1,v2` facet arguments.
///
/// Repeating a facet name merges its alternatives.
pub fn build_criteria(doc_types: &[String], facets: &[String]) -> CliResult<SearchCriteria> {
    let mut criteria = SearchCriteria::new();

    match doc_types {
        [] => {}
        [single] => criteria = criteria.with_type(single.as_str()),
        many => criteria = criteria.with_any_type(many.iter().map(String::as_str)),
    }

    for arg in facets {
        let (name, values) = parse_facet_arg(arg)?;
        let merged = match criteria.facets.remove(&name) {
            Some(existing) => {
                let mut all: Vec<String> = existing.values().into_iter().map(String::from).collect();
                all.extend(values);
                FacetMatch::any_of(all)
            }
            None if values.len() == 1 => FacetMatch::Exact(values[0].clone()),
            None => FacetMatch::any_of(values),
        };
        criteria.facets.insert(name, merged);
    }

    Ok(criteria)
}

fn parse_facet_arg(arg: &str) -> CliResult<(String, Vec<String>)> {
    let Some((name, raw_values)) = arg.split_once('=') else {
        return Err(CliError::invalid_input(format!(
            "facet '{}' must look like name=value[,value...]",
            arg
        )));
    };
    if name.is_empty() {
        return Err(CliError::invalid_input(format!("facet '{}' has no name", arg)));
    }

    let values: Vec<String> = raw_values
        .split(',')
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    if values.is_empty() {
        return Err(CliError::invalid_input(format!("facet '{}' has no values", arg)));
    }
    Ok((name.to_string(), values))
}

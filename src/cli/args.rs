//! CLI argument definitions using clap
//!
//! Commands:
//! - facetdb --data-dir <dir> put <file.json>
//! - facetdb --data-dir <dir> get <id>
//! - facetdb --data-dir <dir> delete <id>
//! - facetdb --data-dir <dir> search [--type T] [--facet name=v1,v2]... [--page N --size M]
//! - facetdb --data-dir <dir> records

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// facetdb - documents with a faceted secondary index over a plain key-value store
#[derive(Parser, Debug)]
#[command(name = "facetdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the document and index stores
    #[arg(long, default_value = "./facetdb-data")]
    pub data_dir: PathBuf,

    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or update a document read from a JSON file
    Put {
        /// Path to the document JSON
        file: PathBuf,
    },

    /// Print one document
    Get { id: String },

    /// Delete a document and its index entries
    Delete { id: String },

    /// Search documents by type and facets
    Search {
        /// Accepted document types, comma separated
        #[arg(long = "type", value_delimiter = ',')]
        doc_types: Vec<String>,

        /// Facet predicate `name=value[,value...]`, repeatable
        #[arg(long = "facet")]
        facets: Vec<String>,

        /// 1-based page number
        #[arg(long, requires = "size")]
        page: Option<usize>,

        /// Page size
        #[arg(long)]
        size: Option<usize>,
    },

    /// Dump every index record
    Records,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

//! facetdb CLI entry point
//!
//! All logic is delegated to the CLI module; the response envelope has
//! already been printed when an error reaches here.

use facetdb::cli;

fn main() {
    if cli::run().is_err() {
        std::process::exit(1);
    }
}

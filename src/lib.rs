//! facetdb - faceted secondary indexing over a plain key-value store
//!
//! Documents carry a type and an open set of string facets. The facet index
//! keeps one record per `facet:value` pair listing the ids that hold it, so a
//! store with only point and batch lookups can answer conjunctive
//! multi-facet queries.

pub mod cli;
pub mod config;
pub mod document;
pub mod index;
pub mod observability;
pub mod pagination;
pub mod repository;
pub mod store;

//! In-memory tabular dataset for the silo partitioned dataset client.
//!
//! This crate provides [`Table`], the materialized form of a fetched
//! dataset:
//!
//! - [`Table::from_json_rows`] - Decodes a JSON array of row objects
//! - [`Table::from_parquet_bytes`] - Decodes a Parquet file body
//! - [`Table::concat_relaxed`] - Union-schema concatenation across partitions

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/silo-data/silo/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod table;

pub use table::Table;

//! Partition discovery and concurrent fetch orchestration for silo.
//!
//! This crate provides the fetch pipeline:
//!
//! - [`ApiClient`] - HTTP transport with connection pooling and API-key auth
//! - [`resolve_partitions`] - Partition discovery against the metadata endpoint
//! - [`fetch_to_memory`] / [`fetch_to_disk`] - The fetch orchestrator
//! - [`ProgressSink`] - Observable per-completion progress reporting

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/silo-data/silo/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod metadata;
mod orchestrator;
mod partition;
mod progress;

pub use client::{API_KEY_HEADER, ApiClient, ClientConfig};
pub use metadata::{PartitionSet, resolve_partitions};
pub use orchestrator::{FetchOptions, fetch_to_disk, fetch_to_memory};
pub use partition::{WriteOutcome, fetch_partition_table, write_partition_file};
pub use progress::{InlineProgress, NullProgress, ProgressSink};

//! Client library for partitioned financial dataset APIs.
//!
//! This is a facade crate that re-exports functionality from the silo
//! workspace crates and adds the named dataset accessors.
//!
//! # Quick Start
//!
//! ```ignore
//! use silo_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let silo = Silo::from_env()?;
//!
//!     // One combined table, ordered by the server's partition order.
//!     let shares = silo.shares().await?;
//!     println!("{} rows", shares.num_rows());
//!
//!     // Or stream every partition to disk as parquet files.
//!     let pattern = silo.download_shares(DataFormat::Parquet).await?;
//!     println!("written under {}", pattern.display());
//!
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/silo-data/silo/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod datasets;

pub use datasets::{REPORT_PERIODS, Silo};

// Re-export core types
pub use silo_types::*;

// Re-export the table
pub use silo_table::Table;

// Re-export fetch functionality
pub use silo_fetch::{
    API_KEY_HEADER, ApiClient, ClientConfig, FetchOptions, InlineProgress, NullProgress,
    PartitionSet, ProgressSink, WriteOutcome, fetch_partition_table, fetch_to_disk,
    fetch_to_memory, resolve_partitions, write_partition_file,
};

/// Prelude module for convenient imports.
///
/// ```
/// use silo_lib::prelude::*;
/// ```
pub mod prelude {
    pub use silo_types::{ApiConfig, DataFormat, Params, Result, SiloError};

    pub use silo_table::Table;

    pub use silo_fetch::{
        ApiClient, ClientConfig, FetchOptions, InlineProgress, NullProgress, ProgressSink,
        WriteOutcome, fetch_to_disk, fetch_to_memory, resolve_partitions,
    };

    pub use crate::datasets::Silo;
}

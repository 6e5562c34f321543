//! Core types for the silo partitioned dataset client.
//!
//! This crate provides the fundamental data structures used throughout silo:
//!
//! - [`ApiConfig`] - API host, key, and storage root
//! - [`Params`] - Ordered query-parameter map with documented merge precedence
//! - [`DataFormat`] - Wire format requested from the data endpoint
//! - [`SiloError`] - Shared error taxonomy

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/silo-data/silo/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod format;
mod params;

pub use config::ApiConfig;
pub use error::{Result, SiloError};
pub use format::{DataFormat, DataFormatParseError};
pub use params::Params;

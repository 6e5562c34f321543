//! Named dataset accessors.
//!
//! Thin glue over the fetch orchestrator: each accessor names a dataset
//! endpoint, assembles its base parameters, and delegates. No argument
//! defaulting happens here; callers pass everything explicitly.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use silo_fetch::{
    ApiClient, FetchOptions, InlineProgress, ProgressSink, fetch_to_disk, fetch_to_memory,
    resolve_partitions,
};
use silo_table::Table;
use silo_types::{ApiConfig, DataFormat, Params, Result};

/// Performance periods requested with every reports fetch.
pub const REPORT_PERIODS: [&str; 7] = [
    "one-day",
    "one-week",
    "month-to-date",
    "three-month-to-date",
    "year-to-date",
    "one-year-to-date",
    "three-year",
];

/// High-level client for the named datasets.
///
/// Wraps an [`ApiClient`] and reports fetch progress inline on the terminal
/// by default; use [`with_progress`](Self::with_progress) to redirect or
/// silence it.
#[derive(Clone)]
pub struct Silo {
    client: ApiClient,
    progress: Arc<dyn ProgressSink>,
}

impl std::fmt::Debug for Silo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Silo").field("client", &self.client).finish_non_exhaustive()
    }
}

impl Silo {
    /// Creates a client from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`ApiClient::with_defaults`].
    pub fn new(config: ApiConfig) -> Result<Self> {
        Ok(Self::with_client(ApiClient::with_defaults(config)?))
    }

    /// Creates a client from `API_HOST`, `API_KEY`, and `API_STORAGE`.
    ///
    /// # Errors
    ///
    /// Returns [`silo_types::SiloError::Config`] if a variable is unset.
    pub fn from_env() -> Result<Self> {
        Self::new(ApiConfig::from_env()?)
    }

    /// Wraps an already configured [`ApiClient`].
    #[must_use]
    pub fn with_client(client: ApiClient) -> Self {
        Self {
            client,
            progress: Arc::new(InlineProgress),
        }
    }

    /// Replaces the progress sink.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the underlying API client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Fetches the shares dataset into memory.
    pub async fn shares(&self) -> Result<Table> {
        self.table("shares", Params::new()).await
    }

    /// Fetches NAV timeseries between `start` and `end` (both inclusive,
    /// `YYYY-MM-DD`; an open end when `None`) in the given currency.
    pub async fn timeseries(
        &self,
        start: &str,
        end: Option<&str>,
        ccy: &str,
        ids: Option<&[i64]>,
    ) -> Result<Table> {
        let mut params = Params::new()
            .with("from", start)
            .with("to", end.map_or(Value::Null, Value::from))
            .with("ccy", ccy);
        add_ids(&mut params, ids);
        self.table("timeseries", params).await
    }

    /// Fetches the reports dataset for one valuation stamp and currency.
    pub async fn reports(&self, stamp: &str, ccy: &str, ids: Option<&[i64]>) -> Result<Table> {
        let mut params = report_params(stamp, ccy);
        add_ids(&mut params, ids);
        self.table("reports", params).await
    }

    /// Fetches the holdings dataset into memory.
    pub async fn holdings(&self, ids: Option<&[i64]>) -> Result<Table> {
        let mut params = Params::new();
        add_ids(&mut params, ids);
        self.table("holdings", params).await
    }

    /// Fetches the liquidity dataset between `start` and `end`.
    pub async fn liquidity(&self, start: &str, end: &str) -> Result<Table> {
        let params = Params::new().with("from", start).with("to", end);
        self.table("liquidity", params).await
    }

    /// Lists the distinct report valuation stamps available for `ccy`.
    pub async fn report_stamps(&self, ccy: &str) -> Result<Vec<String>> {
        let params = Params::new().with("ccy", ccy);
        let set = resolve_partitions(&self.client, "reports", &params).await?;
        let mut stamps: Vec<String> = set
            .partitions
            .iter()
            .filter_map(|p| p.get("stamp").and_then(Value::as_str).map(str::to_string))
            .collect();
        stamps.sort();
        stamps.dedup();
        Ok(stamps)
    }

    /// Downloads the shares dataset to disk; returns the output glob
    /// pattern.
    pub async fn download_shares(&self, format: DataFormat) -> Result<PathBuf> {
        self.download("shares", "shares", Params::new(), format, None)
            .await?;
        Ok(self.pattern(format, "shares", &[]))
    }

    /// Downloads the reports dataset for one stamp and currency, laid out
    /// as `stamp=<stamp>/mod_20=<n>` partitions.
    pub async fn download_reports(
        &self,
        stamp: &str,
        ccy: &str,
        format: DataFormat,
    ) -> Result<PathBuf> {
        let folder = format!("{ccy}_reports");
        let order = vec!["stamp".to_string(), "mod_20".to_string()];
        self.download("reports", &folder, report_params(stamp, ccy), format, Some(order))
            .await?;
        Ok(self.pattern(format, &folder, &[format!("stamp={stamp}")]))
    }

    /// Downloads NAV timeseries between `start` and `end` in `ccy`.
    pub async fn download_timeseries(
        &self,
        start: &str,
        end: &str,
        ccy: &str,
        format: DataFormat,
    ) -> Result<PathBuf> {
        let folder = format!("{ccy}_timeseries");
        let params = Params::new()
            .with("from", start)
            .with("to", end)
            .with("ccy", ccy);
        self.download("timeseries", &folder, params, format, None).await?;
        Ok(self.pattern(format, &folder, &[]))
    }

    /// Downloads the holdings dataset to disk.
    pub async fn download_holdings(&self, format: DataFormat) -> Result<PathBuf> {
        self.download("holdings", "holdings", Params::new(), format, None)
            .await?;
        Ok(self.pattern(format, "holdings", &[]))
    }

    /// Downloads the liquidity dataset between `start` and `end`.
    pub async fn download_liquidity(
        &self,
        start: &str,
        end: &str,
        format: DataFormat,
    ) -> Result<PathBuf> {
        let params = Params::new().with("from", start).with("to", end);
        self.download("liquidity", "liquidity", params, format, None)
            .await?;
        Ok(self.pattern(format, "liquidity", &[]))
    }

    async fn table(&self, dataset: &str, params: Params) -> Result<Table> {
        fetch_to_memory(
            &self.client,
            dataset,
            &params,
            &FetchOptions::default(),
            self.progress.as_ref(),
        )
        .await
    }

    async fn download(
        &self,
        dataset: &str,
        folder: &str,
        params: Params,
        format: DataFormat,
        partition_order: Option<Vec<String>>,
    ) -> Result<()> {
        let mut options = FetchOptions::default().with_format(format);
        if let Some(order) = partition_order {
            options = options.with_partition_order(order);
        }
        fetch_to_disk(
            &self.client,
            dataset,
            folder,
            &params,
            &options,
            self.progress.as_ref(),
        )
        .await?;
        Ok(())
    }

    /// Glob pattern matching the files written for `folder`.
    fn pattern(&self, format: DataFormat, folder: &str, prefix: &[String]) -> PathBuf {
        let mut path = self
            .client
            .api()
            .storage_root
            .join(format.as_str())
            .join(folder);
        for segment in prefix {
            path.push(segment);
        }
        path.push("**");
        path.push(format!("*.{}", format.extension()));
        path
    }
}

fn report_params(stamp: &str, ccy: &str) -> Params {
    Params::new()
        .with("stamp", stamp)
        .with("ccy", ccy)
        .with("columns", "*")
        .with("periods", REPORT_PERIODS.join(","))
}

fn add_ids(params: &mut Params, ids: Option<&[i64]>) {
    if let Some(ids) = ids {
        let joined = ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
        params.insert("ids", joined);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_params() {
        let params = report_params("2026-01-30", "eur");
        assert_eq!(params.get("stamp"), Some(&json!("2026-01-30")));
        assert_eq!(params.get("columns"), Some(&json!("*")));
        let periods = params.get("periods").and_then(Value::as_str).unwrap();
        assert!(periods.starts_with("one-day,one-week,"));
        assert!(periods.ends_with("three-year"));
    }

    #[test]
    fn test_add_ids() {
        let mut params = Params::new();
        add_ids(&mut params, Some(&[1, 2, 30]));
        assert_eq!(params.get("ids"), Some(&json!("1,2,30")));

        let mut params = Params::new();
        add_ids(&mut params, None);
        assert!(params.get("ids").is_none());
    }
}

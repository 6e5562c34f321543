//! The fetch orchestrator: bounded fan-out over a dataset's partitions.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use silo_table::Table;
use silo_types::{DataFormat, Params, Result, SiloError};
use tokio::sync::Semaphore;

use crate::metadata::resolve_partitions;
use crate::partition::{WriteOutcome, fetch_partition_table, write_partition_file};
use crate::{ApiClient, ProgressSink};

/// Options shared by both orchestrator entry points.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Wire format requested from the data endpoint.
    pub format: DataFormat,
    /// Explicit partition-path key order for disk mode. When unset, the
    /// descriptor's natural key order is used.
    pub partition_order: Option<Vec<String>>,
}

impl FetchOptions {
    /// Sets the wire format.
    #[must_use]
    pub const fn with_format(mut self, format: DataFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the explicit partition-path key order.
    #[must_use]
    pub fn with_partition_order(mut self, order: Vec<String>) -> Self {
        self.partition_order = Some(order);
        self
    }
}

/// Fetches every partition of `dataset` and concatenates the results into
/// one combined table.
///
/// Partition metadata is resolved once; all concurrency starts after that
/// call returns. Fetches run with at most the client's configured
/// concurrency in flight, and the combined table is ordered by the
/// metadata-provided partition order regardless of completion order. An
/// empty partition list yields an empty table.
///
/// # Errors
///
/// The first observed failure is returned; siblings already in flight are
/// not cancelled and drain in the background.
pub async fn fetch_to_memory(
    client: &ApiClient,
    dataset: &str,
    params: &Params,
    options: &FetchOptions,
    progress: &dyn ProgressSink,
) -> Result<Table> {
    let set = resolve_partitions(client, dataset, params).await?;
    if set.partitions.is_empty() {
        progress.finish();
        return Ok(Table::empty());
    }

    let tasks: Vec<_> = set
        .partitions
        .iter()
        .map(|descriptor| {
            let merged = merge_task_params(params, descriptor, &set.transaction_id, options.format);
            let client = client.clone();
            let dataset = dataset.to_string();
            let format = options.format;
            async move { fetch_partition_table(&client, &dataset, &merged, format).await }
        })
        .collect();

    let tables = run_bounded(tasks, client.config().concurrency, progress).await?;
    Table::concat_relaxed(tables)
}

/// Streams every partition of `dataset` to disk under
/// `<storage_root>/<format>/<folder>/<key=value>/.../data.<ext>`.
///
/// Output directories are created lazily and idempotently by the
/// concurrent tasks. Returns one [`WriteOutcome`] per partition, in
/// partition order.
///
/// # Errors
///
/// Same propagation as [`fetch_to_memory`]; a failed task may leave a
/// partial file behind.
pub async fn fetch_to_disk(
    client: &ApiClient,
    dataset: &str,
    folder: &str,
    params: &Params,
    options: &FetchOptions,
    progress: &dyn ProgressSink,
) -> Result<Vec<WriteOutcome>> {
    let set = resolve_partitions(client, dataset, params).await?;
    if set.partitions.is_empty() {
        progress.finish();
        return Ok(Vec::new());
    }

    let root = client
        .api()
        .storage_root
        .join(options.format.as_str())
        .join(folder);
    let order = options.partition_order.as_deref();

    let tasks = set
        .partitions
        .iter()
        .map(|descriptor| {
            let merged = merge_task_params(params, descriptor, &set.transaction_id, options.format);
            let path = output_path(&root, descriptor, order, options.format)?;
            let client = client.clone();
            let dataset = dataset.to_string();
            let format = options.format;
            Ok(async move { write_partition_file(&client, &dataset, &merged, format, &path).await })
        })
        .collect::<Result<Vec<_>>>()?;

    run_bounded(tasks, client.config().concurrency, progress).await
}

/// Builds the merged per-task parameter map.
///
/// Precedence: base params < partition descriptor < forced `transactionId`
/// and `format`.
fn merge_task_params(
    base: &Params,
    descriptor: &Params,
    transaction_id: &str,
    format: DataFormat,
) -> Params {
    let mut merged = base.clone();
    merged.merge(descriptor);
    merged.insert("transactionId", transaction_id);
    merged.insert("format", format.as_str());
    merged
}

/// Computes the output file path for one partition.
fn output_path(
    root: &Path,
    descriptor: &Params,
    order: Option<&[String]>,
    format: DataFormat,
) -> Result<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in descriptor.path_segments(order)? {
        path.push(segment);
    }
    path.push(format!("data.{}", format.extension()));
    Ok(path)
}

/// Runs `tasks` with at most `limit` in flight, recording each result in
/// the slot matching its submission index.
///
/// Tasks are spawned up front and gated by a semaphore; completions are
/// drained in arrival order while results land in submission order. The
/// first observed failure is returned immediately. In-flight siblings are
/// not cancelled: their spawned tasks keep running to completion in the
/// background, like a worker pool draining naturally.
async fn run_bounded<T, F>(
    tasks: Vec<F>,
    limit: usize,
    progress: &dyn ProgressSink,
) -> Result<Vec<T>>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let total = tasks.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut in_flight = FuturesUnordered::new();
    for (index, task) in tasks.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        in_flight.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            (index, task.await)
        }));
    }

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
    let mut completed = 0;
    while let Some(joined) = in_flight.next().await {
        let (index, result) = joined.map_err(|e| SiloError::Worker(e.to_string()))?;
        slots[index] = Some(result?);
        completed += 1;
        progress.on_progress(completed, total);
    }
    progress.finish();

    Ok(slots
        .into_iter()
        .map(|slot| slot.expect("every slot filled exactly once"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullProgress;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingProgress {
        updates: Mutex<Vec<(usize, usize)>>,
        finished: AtomicUsize,
    }

    impl ProgressSink for RecordingProgress {
        fn on_progress(&self, completed: usize, total: usize) {
            self.updates.lock().unwrap().push((completed, total));
        }

        fn finish(&self) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_merge_task_params_precedence() {
        let base = Params::new().with("ccy", "eur").with("mod_20", 99);
        let descriptor = Params::new()
            .with("mod_20", 3)
            .with("format", "csv")
            .with("transactionId", "stale");

        let merged = merge_task_params(&base, &descriptor, "tx-1", DataFormat::Parquet);
        assert_eq!(merged.get("ccy"), Some(&serde_json::json!("eur")));
        assert_eq!(merged.get("mod_20"), Some(&serde_json::json!(3)));
        // Forced overrides always win last.
        assert_eq!(merged.get("transactionId"), Some(&serde_json::json!("tx-1")));
        assert_eq!(merged.get("format"), Some(&serde_json::json!("parquet")));
    }

    #[test]
    fn test_output_path_explicit_order() {
        let descriptor = Params::new()
            .with("stamp", "2026-01-30")
            .with("mod_20", 3)
            .with("other", "x");
        let order = vec!["stamp".to_string(), "mod_20".to_string()];

        let path = output_path(
            Path::new("/data/parquet/eur_reports"),
            &descriptor,
            Some(&order),
            DataFormat::Parquet,
        )
        .unwrap();
        assert_eq!(
            path,
            PathBuf::from("/data/parquet/eur_reports/stamp=2026-01-30/mod_20=3/data.parquet")
        );
    }

    #[test]
    fn test_output_path_injective() {
        let root = Path::new("/data/json/shares");
        let descriptors: Vec<Params> = (0..20)
            .map(|i| Params::new().with("mod_20", i).with("stamp", "2026-01-30"))
            .collect();

        let mut paths: Vec<PathBuf> = descriptors
            .iter()
            .map(|d| output_path(root, d, None, DataFormat::Json).unwrap())
            .collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), descriptors.len());
    }

    #[tokio::test]
    async fn test_run_bounded_preserves_submission_order() {
        // Later submissions finish first.
        let tasks: Vec<_> = (0..5u64)
            .map(|i| async move {
                tokio::time::sleep(Duration::from_millis((5 - i) * 20)).await;
                Ok::<_, SiloError>(i)
            })
            .collect();

        let results = run_bounded(tasks, 5, &NullProgress).await.unwrap();
        assert_eq!(results, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_run_bounded_respects_ceiling() {
        let current = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..5usize)
            .map(|i| {
                let current = Arc::clone(&current);
                let max_seen = Arc::clone(&max_seen);
                async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, SiloError>(i)
                }
            })
            .collect();

        let results = run_bounded(tasks, 2, &NullProgress).await.unwrap();
        assert_eq!(results, vec![0, 1, 2, 3, 4]);
        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_run_bounded_first_error_wins() {
        let tasks: Vec<_> = (0..3usize)
            .map(|i| async move {
                if i == 1 {
                    Err(SiloError::DataFormat("bad request".to_string()))
                } else {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(i)
                }
            })
            .collect();

        let err = run_bounded(tasks, 3, &NullProgress).await.unwrap_err();
        assert!(matches!(err, SiloError::DataFormat(_)));
    }

    #[tokio::test]
    async fn test_run_bounded_reports_progress_per_completion() {
        let progress = RecordingProgress::default();
        let tasks: Vec<_> = (0..3usize).map(|i| async move { Ok::<_, SiloError>(i) }).collect();

        run_bounded(tasks, 2, &progress).await.unwrap();

        let updates = progress.updates.lock().unwrap().clone();
        assert_eq!(updates, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
    }
}

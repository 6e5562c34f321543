//! Partition metadata resolution.

use serde_json::Value;
use silo_types::{Params, Result, SiloError};

use crate::ApiClient;

/// The outcome of one metadata resolution: a transaction id binding the
/// batch to a consistent server-side snapshot, plus the partition
/// descriptors in server-provided order.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionSet {
    /// Opaque token attached to every partition fetch of this batch.
    pub transaction_id: String,
    /// Partition descriptors, one per remote data shard.
    pub partitions: Vec<Params>,
}

/// Resolves the partition list for `dataset` via `partitions/{dataset}`.
///
/// The returned order is preserved through to the final result ordering.
///
/// # Errors
///
/// Returns [`SiloError::Metadata`] if the envelope lacks
/// `result.transactionId` or `result.partitions`, or if a descriptor is not
/// an object.
pub async fn resolve_partitions(
    client: &ApiClient,
    dataset: &str,
    params: &Params,
) -> Result<PartitionSet> {
    let (envelope, _headers) = client
        .get_json(&format!("partitions/{dataset}"), params)
        .await?;

    let result = envelope
        .get("result")
        .ok_or_else(|| SiloError::Metadata("response missing 'result'".to_string()))?;
    let transaction_id = result
        .get("transactionId")
        .and_then(Value::as_str)
        .ok_or_else(|| SiloError::Metadata("response missing 'result.transactionId'".to_string()))?
        .to_string();
    let partitions = result
        .get("partitions")
        .and_then(Value::as_array)
        .ok_or_else(|| SiloError::Metadata("response missing 'result.partitions'".to_string()))?
        .iter()
        .map(|descriptor| {
            serde_json::from_value::<Params>(descriptor.clone()).map_err(|_| {
                SiloError::Metadata("partition descriptor is not an object".to_string())
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        dataset,
        %transaction_id,
        partitions = partitions.len(),
        "resolved partition metadata"
    );

    Ok(PartitionSet {
        transaction_id,
        partitions,
    })
}

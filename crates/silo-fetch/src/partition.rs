//! Single-partition fetch: in-memory tables and streamed disk output.

use std::path::{Path, PathBuf};

use serde_json::Value;
use silo_table::Table;
use silo_types::{DataFormat, Params, Result, SiloError};
use tokio::io::AsyncWriteExt;

use crate::ApiClient;
use crate::client::transport_err;

/// The result of streaming one partition to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Where the partition was written.
    pub path: PathBuf,
    /// Number of body bytes written.
    pub bytes_written: u64,
}

/// Fetches one partition into memory as a [`Table`].
///
/// `json` responses are unwrapped from their envelope: an explicit `error`
/// field takes precedence and becomes the error message, otherwise `result`
/// must hold an array of row objects. `parquet` bodies are decoded directly.
///
/// # Errors
///
/// Returns [`SiloError::DataFormat`] for a malformed envelope or a
/// server-reported error, [`SiloError::Table`] for undecodable bytes.
pub async fn fetch_partition_table(
    client: &ApiClient,
    dataset: &str,
    params: &Params,
    format: DataFormat,
) -> Result<Table> {
    let path = format!("data/{dataset}");
    match format {
        DataFormat::Json => {
            let (envelope, _headers) = client.get_json(&path, params).await?;
            let result = unwrap_envelope(envelope)?;
            let rows = result.as_array().ok_or_else(|| {
                SiloError::DataFormat("'result' is not an array of rows".to_string())
            })?;
            Table::from_json_rows(rows)
        }
        DataFormat::Parquet => {
            let bytes = client.get_bytes(&path, params).await?;
            Table::from_parquet_bytes(bytes)
        }
    }
}

/// Streams one partition to `path`, creating missing directories.
///
/// `json` output is the parsed `result` payload pretty-printed at 2-space
/// indentation; other formats stream the raw body chunk by chunk, skipping
/// empty keep-alive chunks. On a mid-stream failure a partially written
/// file may remain at `path`.
///
/// # Errors
///
/// Returns [`SiloError::Io`] on directory or file failures, plus the same
/// envelope errors as [`fetch_partition_table`] for `json`.
pub async fn write_partition_file(
    client: &ApiClient,
    dataset: &str,
    params: &Params,
    format: DataFormat,
    path: &Path,
) -> Result<WriteOutcome> {
    if let Some(parent) = path.parent() {
        // Safe under concurrent creation of overlapping prefixes.
        tokio::fs::create_dir_all(parent).await?;
    }

    let endpoint = format!("data/{dataset}");
    let mut response = client.get_streaming(&endpoint, params).await?;

    match format {
        DataFormat::Json => {
            let envelope: Value = response.json().await.map_err(transport_err)?;
            let result = unwrap_envelope(envelope)?;
            let body = serde_json::to_vec_pretty(&result)?;
            tokio::fs::write(path, &body).await?;
            Ok(WriteOutcome {
                path: path.to_path_buf(),
                bytes_written: body.len() as u64,
            })
        }
        DataFormat::Parquet => {
            let mut file = tokio::fs::File::create(path).await?;
            let mut bytes_written = 0u64;
            while let Some(chunk) = response.chunk().await.map_err(transport_err)? {
                if chunk.is_empty() {
                    continue;
                }
                file.write_all(&chunk).await?;
                bytes_written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(WriteOutcome {
                path: path.to_path_buf(),
                bytes_written,
            })
        }
    }
}

/// Extracts `result` from a data envelope. A non-null `error` field wins
/// over everything else in the payload.
fn unwrap_envelope(envelope: Value) -> Result<Value> {
    if let Some(error) = envelope.get("error") {
        if !error.is_null() {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(SiloError::DataFormat(message));
        }
    }
    match envelope.get("result") {
        Some(result) if !result.is_null() => Ok(result.clone()),
        _ => Err(SiloError::DataFormat("response missing 'result'".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_envelope_result() {
        let result = unwrap_envelope(json!({"result": [{"id": 1}]})).unwrap();
        assert_eq!(result, json!([{"id": 1}]));
    }

    #[test]
    fn test_unwrap_envelope_error_takes_precedence() {
        let err = unwrap_envelope(json!({"error": "bad request", "result": []})).unwrap_err();
        match err {
            SiloError::DataFormat(message) => assert_eq!(message, "bad request"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unwrap_envelope_null_error_ignored() {
        let result = unwrap_envelope(json!({"error": null, "result": []})).unwrap();
        assert_eq!(result, json!([]));
    }

    #[test]
    fn test_unwrap_envelope_missing_result() {
        let err = unwrap_envelope(json!({"status": "ok"})).unwrap_err();
        assert!(matches!(err, SiloError::DataFormat(_)));
    }
}

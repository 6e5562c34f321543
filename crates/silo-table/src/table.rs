//! Arrow-backed table and relaxed concatenation.

use std::sync::Arc;

use arrow::array::{ArrayRef, new_null_array};
use arrow::compute::concat_batches;
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::json::reader::infer_json_schema_from_iterator;
use arrow::json::{ArrayWriter, ReaderBuilder};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value;
use silo_types::{Result, SiloError};

/// A materialized tabular dataset.
///
/// One `Table` holds the rows of a single partition or, after
/// [`concat_relaxed`](Self::concat_relaxed), the combined rows of a whole
/// dataset. Row order within a table is the order the rows arrived in.
#[derive(Debug, Clone)]
pub struct Table {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Table {
    /// Creates an empty table with no columns and no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            schema: Arc::new(Schema::empty()),
            batches: Vec::new(),
        }
    }

    /// Creates a table from a single record batch.
    #[must_use]
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            batches: vec![batch],
        }
    }

    /// Decodes a JSON array of row objects into a table.
    ///
    /// The schema is inferred from the rows; keys missing from individual
    /// rows become nulls.
    ///
    /// # Errors
    ///
    /// Returns [`SiloError::Table`] if the rows cannot be decoded into a
    /// consistent schema.
    pub fn from_json_rows(rows: &[Value]) -> Result<Self> {
        if rows.is_empty() {
            return Ok(Self::empty());
        }

        let schema = infer_json_schema_from_iterator(rows.iter().map(Ok::<_, ArrowError>))
            .map_err(table_err)?;
        let mut decoder = ReaderBuilder::new(Arc::new(schema))
            .build_decoder()
            .map_err(table_err)?;
        decoder.serialize(rows).map_err(table_err)?;

        Ok(decoder
            .flush()
            .map_err(table_err)?
            .map_or_else(Self::empty, Self::from_batch))
    }

    /// Decodes the body of a Parquet file into a table.
    ///
    /// # Errors
    ///
    /// Returns [`SiloError::Table`] if the bytes are not a valid Parquet
    /// file.
    pub fn from_parquet_bytes(bytes: Bytes) -> Result<Self> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)
            .map_err(|e| SiloError::Table(e.to_string()))?;
        let schema = builder.schema().clone();
        let batches = builder
            .build()
            .map_err(|e| SiloError::Table(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, ArrowError>>()
            .map_err(table_err)?;

        Ok(Self { schema, batches })
    }

    /// Returns the table schema.
    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Returns the underlying record batches.
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Returns the total number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Returns the column names in schema order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name().as_str()).collect()
    }

    /// Serializes the table back into a JSON array of row objects.
    ///
    /// # Errors
    ///
    /// Returns [`SiloError::Table`] if a batch cannot be serialized.
    pub fn to_json_rows(&self) -> Result<Vec<Value>> {
        let mut writer = ArrayWriter::new(Vec::new());
        for batch in &self.batches {
            writer.write(batch).map_err(table_err)?;
        }
        writer.finish().map_err(table_err)?;

        let data = writer.into_inner();
        if data.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&data)?)
    }

    /// Concatenates tables vertically under a relaxed union schema.
    ///
    /// Column order follows first appearance across the inputs. Columns
    /// missing from an input are filled with nulls; tables without columns
    /// are skipped. Same-named columns must agree on their type.
    ///
    /// # Errors
    ///
    /// Returns [`SiloError::Table`] if two inputs disagree on a column's
    /// type.
    pub fn concat_relaxed(tables: Vec<Self>) -> Result<Self> {
        let tables: Vec<Self> = tables.into_iter().filter(|t| t.num_columns() > 0).collect();
        if tables.is_empty() {
            return Ok(Self::empty());
        }

        let schema = union_schema(&tables)?;
        let mut aligned = Vec::new();
        for table in &tables {
            for batch in &table.batches {
                let columns: Vec<ArrayRef> = schema
                    .fields()
                    .iter()
                    .map(|field| {
                        batch.column_by_name(field.name()).cloned().unwrap_or_else(|| {
                            new_null_array(field.data_type(), batch.num_rows())
                        })
                    })
                    .collect();
                aligned.push(RecordBatch::try_new(schema.clone(), columns).map_err(table_err)?);
            }
        }

        let combined = concat_batches(&schema, &aligned).map_err(table_err)?;
        Ok(Self::from_batch(combined))
    }
}

/// Builds the union schema for relaxed concatenation.
fn union_schema(tables: &[Table]) -> Result<SchemaRef> {
    let mut fields: Vec<Field> = Vec::new();
    for table in tables {
        for field in table.schema.fields() {
            match fields.iter().position(|f| f.name() == field.name()) {
                Some(i) => {
                    if fields[i].data_type() != field.data_type() {
                        return Err(SiloError::Table(format!(
                            "column '{}' has conflicting types: {} vs {}",
                            field.name(),
                            fields[i].data_type(),
                            field.data_type()
                        )));
                    }
                    if field.is_nullable() && !fields[i].is_nullable() {
                        fields[i] = fields[i].clone().with_nullable(true);
                    }
                }
                None => fields.push(field.as_ref().clone()),
            }
        }
    }

    // A column absent from any input gets null-filled there, so it must be
    // nullable in the union.
    for i in 0..fields.len() {
        let everywhere = tables
            .iter()
            .all(|t| t.schema.field_with_name(fields[i].name()).is_ok());
        if !everywhere {
            fields[i] = fields[i].clone().with_nullable(true);
        }
    }

    Ok(Arc::new(Schema::new(fields)))
}

fn table_err(e: ArrowError) -> SiloError {
    SiloError::Table(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::arrow::ArrowWriter;
    use serde_json::json;

    fn rows_table(rows: &[Value]) -> Table {
        Table::from_json_rows(rows).unwrap()
    }

    #[test]
    fn test_from_json_rows() {
        let table = rows_table(&[
            json!({"id": 1, "name": "alpha"}),
            json!({"id": 2, "name": "beta"}),
        ]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column_names(), vec!["id", "name"]);
    }

    #[test]
    fn test_from_json_rows_empty() {
        let table = rows_table(&[]);
        assert!(table.is_empty());
        assert_eq!(table.num_columns(), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let rows = vec![
            json!({"id": 1, "name": "alpha"}),
            json!({"id": 2, "name": "beta"}),
        ];
        let table = rows_table(&rows);
        assert_eq!(table.to_json_rows().unwrap(), rows);
    }

    #[test]
    fn test_concat_relaxed_union_columns() {
        let left = rows_table(&[json!({"a": 1, "b": "x"}), json!({"a": 2, "b": "y"})]);
        let right = rows_table(&[json!({"b": "z", "c": 3})]);

        let combined = Table::concat_relaxed(vec![left, right]).unwrap();
        assert_eq!(combined.num_rows(), 3);
        assert_eq!(combined.column_names(), vec!["a", "b", "c"]);

        // Null-filled where the column was missing.
        let batch = &combined.batches()[0];
        assert_eq!(batch.column_by_name("c").unwrap().null_count(), 2);
        assert_eq!(batch.column_by_name("a").unwrap().null_count(), 1);
    }

    #[test]
    fn test_concat_relaxed_preserves_input_order() {
        let first = rows_table(&[json!({"id": 1})]);
        let second = rows_table(&[json!({"id": 2})]);
        let third = rows_table(&[json!({"id": 3})]);

        let combined = Table::concat_relaxed(vec![first, second, third]).unwrap();
        let rows = combined.to_json_rows().unwrap();
        assert_eq!(rows, vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]);
    }

    #[test]
    fn test_concat_relaxed_empty_inputs() {
        let combined = Table::concat_relaxed(vec![]).unwrap();
        assert!(combined.is_empty());

        let combined = Table::concat_relaxed(vec![Table::empty(), Table::empty()]).unwrap();
        assert!(combined.is_empty());
    }

    #[test]
    fn test_concat_relaxed_skips_empty_tables() {
        let data = rows_table(&[json!({"id": 7})]);
        let combined = Table::concat_relaxed(vec![Table::empty(), data]).unwrap();
        assert_eq!(combined.num_rows(), 1);
        assert_eq!(combined.column_names(), vec!["id"]);
    }

    #[test]
    fn test_concat_relaxed_conflicting_types() {
        let left = rows_table(&[json!({"a": 1})]);
        let right = rows_table(&[json!({"a": "one"})]);
        let err = Table::concat_relaxed(vec![left, right]).unwrap_err();
        assert!(matches!(err, SiloError::Table(_)));
    }

    #[test]
    fn test_parquet_round_trip() {
        let rows = vec![
            json!({"id": 1, "px": 10.5}),
            json!({"id": 2, "px": 11.25}),
        ];
        let table = rows_table(&rows);

        let mut buffer = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buffer, table.schema().clone(), None).unwrap();
        for batch in table.batches() {
            writer.write(batch).unwrap();
        }
        writer.close().unwrap();

        let decoded = Table::from_parquet_bytes(Bytes::from(buffer)).unwrap();
        assert_eq!(decoded.num_rows(), 2);
        assert_eq!(decoded.to_json_rows().unwrap(), rows);
    }
}

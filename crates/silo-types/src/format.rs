//! Wire data formats.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Format requested from the data endpoint via the `format` query parameter.
///
/// The format controls both the response body encoding and the file
/// extension used for disk-mode output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFormat {
    /// Apache Parquet columnar format.
    #[default]
    Parquet,
    /// JSON envelope with a `result` array of row objects.
    Json,
}

impl DataFormat {
    /// Returns the format name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Json => "json",
        }
    }

    /// Returns the file extension for disk-mode output.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown format name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown data format: {0}")]
pub struct DataFormatParseError(pub String);

impl FromStr for DataFormat {
    type Err = DataFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parquet" => Ok(Self::Parquet),
            "json" => Ok(Self::Json),
            other => Err(DataFormatParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_round_trip() {
        for format in [DataFormat::Parquet, DataFormat::Json] {
            assert_eq!(format.as_str().parse::<DataFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_unknown_format() {
        let err = "csv".parse::<DataFormat>().unwrap_err();
        assert_eq!(err.0, "csv");
    }
}

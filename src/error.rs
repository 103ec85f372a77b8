//! Error types for po-intake.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mailbox channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to connect: {reason}")]
    ConnectFailed { name: String, reason: String },

    #[error("Authentication failed for channel {name}: {reason}")]
    AuthFailed { name: String, reason: String },

    #[error("Channel {name} disconnected: {reason}")]
    Disconnected { name: String, reason: String },

    #[error("Channel {name} command {command} failed: {reason}")]
    CommandFailed {
        name: String,
        command: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// CSV-to-order parse errors. Any of these discards the whole attachment.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Row {row} has {found} columns, expected {expected}")]
    RowShapeMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Header path {path} conflicts with another header path")]
    InvalidHeaderPath { path: String },

    #[error("Row {row} does not form a purchase order: {reason}")]
    InvalidRecord { row: usize, reason: String },
}

impl ParseError {
    /// Short label identifying the failure in reports and logs.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RowShapeMismatch { .. } => ErrorKind::RowShapeMismatch,
            Self::Encoding(_) => ErrorKind::EncodingError,
            Self::Csv(_) => ErrorKind::MalformedCsv,
            Self::InvalidHeaderPath { .. } | Self::InvalidRecord { .. } => {
                ErrorKind::InvalidRecord
            }
        }
    }
}

/// Persistence errors raised by an `OrderSink`.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize orders: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-attachment pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Unsupported attachment {file_name} ({content_type})")]
    UnsupportedAttachment {
        file_name: String,
        content_type: String,
    },

    #[error("Failed to parse {file_name}: {source}")]
    Parse {
        file_name: String,
        #[source]
        source: ParseError,
    },

    #[error("Failed to persist {file_name}: {source}")]
    Sink {
        file_name: String,
        #[source]
        source: SinkError,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedAttachment { .. } => ErrorKind::UnsupportedAttachment,
            Self::Parse { source, .. } => source.kind(),
            Self::Sink { .. } => ErrorKind::SinkFailure,
        }
    }
}

/// Error kind labels surfaced in attachment reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedAttachment,
    RowShapeMismatch,
    EncodingError,
    MalformedCsv,
    InvalidRecord,
    SinkFailure,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UnsupportedAttachment => "unsupported_attachment",
            Self::RowShapeMismatch => "row_shape_mismatch",
            Self::EncodingError => "encoding_error",
            Self::MalformedCsv => "malformed_csv",
            Self::InvalidRecord => "invalid_record",
            Self::SinkFailure => "sink_failure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_kinds() {
        let err = ParseError::RowShapeMismatch {
            row: 2,
            expected: 15,
            found: 3,
        };
        assert_eq!(err.kind(), ErrorKind::RowShapeMismatch);
        assert_eq!(err.to_string(), "Row 2 has 3 columns, expected 15");

        let bytes = vec![0xff, 0xfe];
        let utf8 = std::str::from_utf8(&bytes).unwrap_err();
        assert_eq!(ParseError::from(utf8).kind(), ErrorKind::EncodingError);
    }

    #[test]
    fn pipeline_error_kind_delegates_to_parse_error() {
        let err = PipelineError::Parse {
            file_name: "orders.csv".into(),
            source: ParseError::InvalidRecord {
                row: 1,
                reason: "missing field `poNumber`".into(),
            },
        };
        assert_eq!(err.kind(), ErrorKind::InvalidRecord);
        assert!(err.to_string().contains("orders.csv"));
    }

    #[test]
    fn config_error_messages() {
        let err = ConfigError::MissingEnvVar("EMAIL_HOST".into());
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: EMAIL_HOST"
        );
    }

    #[test]
    fn error_kind_serializes_as_label() {
        let json = serde_json::to_string(&ErrorKind::UnsupportedAttachment).unwrap();
        assert_eq!(json, "\"unsupported_attachment\"");
        assert_eq!(ErrorKind::SinkFailure.to_string(), "sink_failure");
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MftError {
    #[error("Read of {width} bytes at offset {offset:#x} exceeds buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("Attribute header truncated: need {needed} bytes, have {available}")]
    TruncatedHeader {
        needed: usize,
        available: usize,
    },

    #[error("Data run truncated at offset {offset:#x}: need {needed} bytes, have {available}")]
    TruncatedDataRun {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Data run {index} moves the cluster number out of range")]
    DataRunOverflow {
        index: usize,
    },

    #[error("Malformed UTF-16 name at offset {offset:#x}")]
    MalformedName {
        offset: usize,
    },

    #[error("Invalid attribute record length {length} at offset {offset:#x}")]
    InvalidRecordLength {
        offset: usize,
        length: u32,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MftError {
    /// True for failures that only invalidate the attribute being decoded.
    pub fn is_attribute_local(&self) -> bool {
        matches!(
            self,
            MftError::OutOfBounds { .. }
                | MftError::TruncatedHeader { .. }
                | MftError::TruncatedDataRun { .. }
                | MftError::DataRunOverflow { .. }
                | MftError::MalformedName { .. }
                | MftError::InvalidRecordLength { .. }
        )
    }
}

pub type MftResult<T> = Result<T, MftError>;

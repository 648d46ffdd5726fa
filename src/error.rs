use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiskError {
    #[error("Malformed disk map: expected a decimal digit at position {position}, found {found:?}")]
    MalformedInput { position: usize, found: char },

    #[error("Malformed disk map: input is empty")]
    EmptyInput,

    #[error("Block position {position} out of bounds (disk has {len} blocks)")]
    OutOfBounds { position: usize, len: usize },

    #[error("No free run of at least {min_length} blocks available")]
    NoSpaceFound { min_length: usize },

    #[error("Checksum overflows 64 bits at block {position}")]
    ChecksumOverflow { position: usize },

    #[error("Internal consistency failure: {0}")]
    Inconsistent(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DiskError {
    /// True for both flavours of unparseable disk map
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            DiskError::MalformedInput { .. } | DiskError::EmptyInput
        )
    }
}

pub type Result<T> = std::result::Result<T, DiskError>;

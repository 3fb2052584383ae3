use thiserror::Error;

/// Contract violations raised at the collaborator boundary.
///
/// Register and memory accesses never fail; everything here is a malformed
/// request from the host (bad DMA page, unknown configuration value, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("OAM DMA page must be 256 bytes, got {actual}")]
    DmaPageLength { actual: usize },

    #[error("unknown nametable mirroring code: {0}")]
    UnknownMirroring(u8),

    #[error("unknown color format: {0}")]
    UnknownColorFormat(String),

    #[error("unknown odd frame skip mode: {0}")]
    UnknownOddFrameSkip(String),

    #[error("destination buffer holds {actual} bytes, frame needs {expected}")]
    BufferSize { expected: usize, actual: usize },
}

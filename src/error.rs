//! Upload error types.

use thiserror::Error;

use crate::types::MemoryPropertyFlags;

/// Errors that can occur while creating device resources or recording uploads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// No memory type is both allowed by the resource and carries the required flags.
    #[error("no compatible memory type (allowed types: {type_bits:#034b}, required: {required:?})")]
    NoCompatibleMemoryType {
        /// Memory types the resource may live in, one bit per type index.
        type_bits: u32,
        /// Property flags the chosen type had to carry.
        required: MemoryPropertyFlags,
    },
    /// The device rejected the creation of an object.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// Device or host memory is exhausted.
    #[error("out of GPU memory")]
    OutOfMemory,
    /// The GPU device was lost.
    #[error("GPU device lost")]
    DeviceLost,
    /// The image already received its one upload and is now shader-read-only.
    #[error("image was already uploaded and is read-only")]
    AlreadyUploaded,
    /// The destination was not created with `COPY_DST` usage.
    #[error("resource cannot receive uploads: {0}")]
    NotUploadable(String),
    /// The copy would write past the destination's requested size.
    #[error("copy of {requested} bytes exceeds destination capacity of {capacity} bytes")]
    CopyOutOfBounds {
        /// Bytes the caller asked to copy.
        requested: u64,
        /// Bytes the destination was created with.
        capacity: u64,
    },
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

//! Plain-data records for the transfer commands the wrappers record.
//!
//! Backends translate these into native calls; the dummy backend stores
//! them verbatim so tests can inspect the recorded sequence.

use bitflags::bitflags;

use super::{Extent3d, ImageLayout, ImageSubresourceLayers, SubresourceRange};

bitflags! {
    /// Pipeline stages a barrier synchronizes between.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStage: u32 {
        /// Before any command starts.
        const TOP_OF_PIPE = 1 << 0;
        /// Copy and blit commands.
        const TRANSFER = 1 << 1;
        /// Vertex shading.
        const VERTEX_SHADER = 1 << 2;
        /// Fragment shading.
        const FRAGMENT_SHADER = 1 << 3;
        /// Compute shading.
        const COMPUTE_SHADER = 1 << 4;
        /// After all commands complete.
        const BOTTOM_OF_PIPE = 1 << 5;
    }
}

bitflags! {
    /// Memory access kinds made available or visible by a barrier.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        /// Transfer reads.
        const TRANSFER_READ = 1 << 0;
        /// Transfer writes.
        const TRANSFER_WRITE = 1 << 1;
        /// Shader reads.
        const SHADER_READ = 1 << 2;
        /// Shader writes.
        const SHADER_WRITE = 1 << 3;
    }
}

impl Default for AccessFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Region of a buffer-to-buffer copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferCopy {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

impl BufferCopy {
    /// Copy `size` bytes from the start of one buffer to the start of another.
    pub fn whole(size: u64) -> Self {
        Self {
            src_offset: 0,
            dst_offset: 0,
            size,
        }
    }
}

/// Region of a buffer-to-image copy.
///
/// A row length or image height of zero means the buffer data is tightly
/// packed according to `image_extent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferImageCopy {
    pub buffer_offset: u64,
    pub buffer_row_length: u32,
    pub buffer_image_height: u32,
    pub image_subresource: ImageSubresourceLayers,
    pub image_offset: [i32; 3],
    pub image_extent: Extent3d,
}

impl BufferImageCopy {
    /// Tightly packed copy of a `width × height` region into the origin of
    /// the given subresource.
    pub fn packed_2d(width: u32, height: u32, image_subresource: ImageSubresourceLayers) -> Self {
        Self {
            buffer_offset: 0,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource,
            image_offset: [0, 0, 0],
            image_extent: Extent3d::new_2d(width, height),
        }
    }
}

/// An image memory barrier with its layout transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageBarrier<I> {
    /// Image the barrier applies to.
    pub image: I,
    /// Accesses that must complete before the barrier.
    pub src_access: AccessFlags,
    /// Accesses that wait on the barrier.
    pub dst_access: AccessFlags,
    /// Layout before the transition.
    pub old_layout: ImageLayout,
    /// Layout after the transition.
    pub new_layout: ImageLayout,
    /// Subresources transitioned.
    pub subresource_range: SubresourceRange,
}

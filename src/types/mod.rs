//! Common types and descriptors for device resources.
//!
//! This module contains format enums, usage flags, descriptor structs, the
//! memory property snapshot, and the plain-data records that describe
//! recorded transfer commands.

mod buffer;
mod command;
mod memory;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use command::{AccessFlags, BufferCopy, BufferImageCopy, ImageBarrier, PipelineStage};
pub use memory::{
    MAX_MEMORY_TYPES, MemoryHeap, MemoryHeapFlags, MemoryProperties, MemoryPropertyFlags,
    MemoryRequirements, MemoryType,
};
pub use texture::{
    ComponentMapping, ComponentSwizzle, Extent3d, ImageAspect, ImageDescriptor, ImageLayout,
    ImageSubresourceLayers, ImageTiling, ImageViewDescriptor, SubresourceRange, TextureFormat,
    TextureUsage,
};

//! GPU backend abstraction layer.
//!
//! The resource wrappers never talk to a graphics API directly. They go
//! through the narrow [`Backend`] trait, which exposes only what a one-shot
//! staging upload needs: object creation, memory requirement queries,
//! allocation, binding, destruction, host writes into mappable memory, and
//! recording of copy and barrier commands.
//!
//! # Available Backends
//!
//! - `dummy` (default): in-memory backend for testing; records commands
//!   instead of executing them and can simulate their effect on submit
//! - `vulkan-backend` (default): native Vulkan backend using ash
//!
//! Handles are associated types, so each backend keeps its native handle
//! representation and the wrappers stay generic over it.

#[cfg(feature = "dummy")]
pub mod dummy;

#[cfg(feature = "vulkan-backend")]
pub mod vulkan;

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::UploadError;
use crate::types::{
    BufferCopy, BufferDescriptor, BufferImageCopy, ImageBarrier, ImageDescriptor, ImageLayout,
    ImageViewDescriptor, MemoryRequirements, PipelineStage,
};

#[cfg(feature = "dummy")]
pub use dummy::{
    DummyBackend, DummyBackendConfig, DummyBuffer, DummyCommandBuffer, DummyHandle, DummyImage,
    DummyImageView, DummyMemory, FailurePoint, RecordedCommand,
};

#[cfg(feature = "vulkan-backend")]
pub use vulkan::VulkanDevice;

/// A logical device that can create, bind, and destroy resources and record
/// transfer commands.
///
/// Implementations do not track which handles belong together; pairing a
/// buffer or image with its memory is the job of the resource wrappers.
pub trait Backend: Send + Sync + 'static {
    /// Untyped linear buffer handle.
    type Buffer: Copy + Eq + Hash + Debug + Send + Sync;
    /// Image handle.
    type Image: Copy + Eq + Hash + Debug + Send + Sync;
    /// Image view handle.
    type ImageView: Copy + Eq + Debug + Send + Sync;
    /// Device memory allocation handle.
    type Memory: Copy + Eq + Debug + Send + Sync;
    /// Command sequence commands are appended to.
    type CommandBuffer;

    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Create a buffer. The buffer has no memory bound yet.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<Self::Buffer, UploadError>;

    /// Query size, alignment, and allowed memory types for a buffer.
    fn buffer_memory_requirements(&self, buffer: Self::Buffer) -> MemoryRequirements;

    /// Bind `memory` to `buffer` at `offset`.
    fn bind_buffer_memory(
        &self,
        buffer: Self::Buffer,
        memory: Self::Memory,
        offset: u64,
    ) -> Result<(), UploadError>;

    /// Destroy a buffer.
    fn destroy_buffer(&self, buffer: Self::Buffer);

    /// Create an image. The image has no memory bound yet.
    fn create_image(&self, descriptor: &ImageDescriptor) -> Result<Self::Image, UploadError>;

    /// Query size, alignment, and allowed memory types for an image.
    fn image_memory_requirements(&self, image: Self::Image) -> MemoryRequirements;

    /// Bind `memory` to `image` at `offset`.
    fn bind_image_memory(
        &self,
        image: Self::Image,
        memory: Self::Memory,
        offset: u64,
    ) -> Result<(), UploadError>;

    /// Destroy an image.
    fn destroy_image(&self, image: Self::Image);

    /// Create a 2D view over an image.
    fn create_image_view(
        &self,
        descriptor: &ImageViewDescriptor<Self::Image>,
    ) -> Result<Self::ImageView, UploadError>;

    /// Destroy an image view.
    fn destroy_image_view(&self, view: Self::ImageView);

    /// Allocate `size` bytes from the memory type at `memory_type_index`.
    fn allocate_memory(
        &self,
        size: u64,
        memory_type_index: u32,
    ) -> Result<Self::Memory, UploadError>;

    /// Free a memory allocation.
    fn free_memory(&self, memory: Self::Memory);

    /// Copy `data` into host-visible memory at `offset`.
    fn write_memory(
        &self,
        memory: Self::Memory,
        offset: u64,
        data: &[u8],
    ) -> Result<(), UploadError>;

    /// Record a buffer-to-buffer copy.
    fn cmd_copy_buffer(
        &self,
        cmd: &mut Self::CommandBuffer,
        src: Self::Buffer,
        dst: Self::Buffer,
        region: &BufferCopy,
    );

    /// Record a pipeline barrier carrying a single image memory barrier.
    fn cmd_pipeline_barrier(
        &self,
        cmd: &mut Self::CommandBuffer,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
        barrier: &ImageBarrier<Self::Image>,
    );

    /// Record a buffer-to-image copy. `dst_layout` is the layout the image is
    /// in when the copy executes.
    fn cmd_copy_buffer_to_image(
        &self,
        cmd: &mut Self::CommandBuffer,
        src: Self::Buffer,
        dst: Self::Image,
        dst_layout: ImageLayout,
        region: &BufferImageCopy,
    );
}

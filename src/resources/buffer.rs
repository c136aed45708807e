//! Device-local linear buffer.

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::UploadError;
use crate::types::{
    BufferCopy, BufferDescriptor, BufferUsage, MemoryProperties, MemoryPropertyFlags,
};

use super::guard::Owned;
use super::memory;

/// A buffer handle bound to its own allocation.
pub(crate) struct BoundBuffer<B: Backend> {
    pub buffer: B::Buffer,
    pub memory: B::Memory,
    pub allocation_size: u64,
    pub memory_type_index: u32,
}

/// Create a buffer, allocate memory with `required` flags for it, and bind.
///
/// Malformed descriptors are rejected before the backend is called. Every
/// handle created before a failing step is released, buffer before memory,
/// before the error is returned.
pub(crate) fn create_bound_buffer<B: Backend>(
    backend: &B,
    properties: &MemoryProperties,
    descriptor: &BufferDescriptor,
    required: MemoryPropertyFlags,
) -> Result<BoundBuffer<B>, UploadError> {
    descriptor.validate()?;

    // Declared before the buffer guard so a failure releases the buffer first.
    let allocation;
    let buffer = Owned::new(backend, backend.create_buffer(descriptor)?, B::destroy_buffer);
    let requirements = backend.buffer_memory_requirements(buffer.get());
    allocation = memory::allocate(backend, properties, requirements, required)?;
    backend.bind_buffer_memory(buffer.get(), allocation.memory.get(), 0)?;

    Ok(BoundBuffer {
        memory_type_index: allocation.memory_type_index,
        allocation_size: allocation.size,
        memory: allocation.memory.disarm(),
        buffer: buffer.disarm(),
    })
}

/// A linear buffer in device-local memory.
///
/// Contents are undefined after construction. [`DeviceBuffer::store`]
/// records a copy from a staging buffer; the data lands once the caller
/// submits the command buffer and the GPU executes it.
///
/// Dropping the wrapper destroys the buffer and then frees its memory. The
/// caller must make sure no submitted work still references it.
///
/// # Example
///
/// ```ignore
/// let vertices = DeviceBuffer::new(
///     backend.clone(),
///     &properties,
///     &BufferDescriptor::new(1024, BufferUsage::VERTEX | BufferUsage::COPY_DST),
/// )?;
/// vertices.store(&mut cmd, staging.raw(), 1024)?;
/// ```
pub struct DeviceBuffer<B: Backend> {
    backend: Arc<B>,
    descriptor: BufferDescriptor,
    buffer: B::Buffer,
    memory: B::Memory,
    allocation_size: u64,
    memory_type_index: u32,
}

impl<B: Backend> DeviceBuffer<B> {
    /// Create a buffer backed by `DEVICE_LOCAL` memory.
    pub fn new(
        backend: Arc<B>,
        properties: &MemoryProperties,
        descriptor: &BufferDescriptor,
    ) -> Result<Self, UploadError> {
        Self::with_memory_flags(
            backend,
            properties,
            descriptor,
            MemoryPropertyFlags::DEVICE_LOCAL,
        )
    }

    /// Create a buffer backed by memory that has every flag in `required`.
    pub fn with_memory_flags(
        backend: Arc<B>,
        properties: &MemoryProperties,
        descriptor: &BufferDescriptor,
        required: MemoryPropertyFlags,
    ) -> Result<Self, UploadError> {
        let bound = create_bound_buffer(&*backend, properties, descriptor, required)?;
        log::debug!(
            "{}: created buffer '{}' ({} bytes, {} allocated from type {})",
            backend.name(),
            descriptor.label_or("buffer"),
            descriptor.size,
            bound.allocation_size,
            bound.memory_type_index
        );

        Ok(Self {
            backend,
            descriptor: descriptor.clone(),
            buffer: bound.buffer,
            memory: bound.memory,
            allocation_size: bound.allocation_size,
            memory_type_index: bound.memory_type_index,
        })
    }

    /// Record a copy of the first `size` bytes of `staging` into this buffer.
    ///
    /// Only records; nothing is transferred until `cmd` is submitted. The
    /// staging buffer must stay alive until that work completes.
    pub fn store(
        &self,
        cmd: &mut B::CommandBuffer,
        staging: B::Buffer,
        size: u64,
    ) -> Result<(), UploadError> {
        if !self.descriptor.usage.contains(BufferUsage::COPY_DST) {
            return Err(UploadError::NotUploadable(format!(
                "buffer '{}' was not created with COPY_DST usage",
                self.label()
            )));
        }
        if size == 0 {
            return Err(UploadError::InvalidParameter(
                "copy size must be greater than zero".to_string(),
            ));
        }
        if size > self.descriptor.size {
            return Err(UploadError::CopyOutOfBounds {
                requested: size,
                capacity: self.descriptor.size,
            });
        }

        log::trace!(
            "{}: recording {size} byte upload into '{}'",
            self.backend.name(),
            self.label()
        );
        self.backend
            .cmd_copy_buffer(cmd, staging, self.buffer, &BufferCopy::whole(size));
        Ok(())
    }

    /// Get the native buffer handle.
    pub fn raw(&self) -> B::Buffer {
        self.buffer
    }

    /// Get the backing memory handle.
    pub fn memory(&self) -> B::Memory {
        self.memory
    }

    /// Get the requested size in bytes.
    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    /// Get the size of the backing allocation, at least [`Self::size`].
    pub fn allocation_size(&self) -> u64 {
        self.allocation_size
    }

    /// Get the index of the memory type the buffer was allocated from.
    pub fn memory_type_index(&self) -> u32 {
        self.memory_type_index
    }

    /// Get the usage flags.
    pub fn usage(&self) -> BufferUsage {
        self.descriptor.usage
    }

    /// Get the buffer descriptor.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    /// Get the backend that owns the buffer.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn label(&self) -> &str {
        self.descriptor.label_or("buffer")
    }
}

impl<B: Backend> Drop for DeviceBuffer<B> {
    fn drop(&mut self) {
        log::debug!(
            "{}: destroying buffer '{}'",
            self.backend.name(),
            self.label()
        );
        self.backend.destroy_buffer(self.buffer);
        self.backend.free_memory(self.memory);
    }
}

impl<B: Backend> std::fmt::Debug for DeviceBuffer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("buffer", &self.buffer)
            .field("memory", &self.memory)
            .field("size", &self.descriptor.size)
            .field("usage", &self.descriptor.usage)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

#[cfg(feature = "dummy")]
static_assertions::assert_impl_all!(DeviceBuffer<crate::backend::DummyBackend>: Send, Sync);

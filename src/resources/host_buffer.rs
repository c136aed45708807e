//! CPU-visible staging buffer.

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::UploadError;
use crate::types::{BufferDescriptor, BufferUsage, MemoryProperties, MemoryPropertyFlags};

use super::buffer::create_bound_buffer;

/// Memory flags a staging buffer needs so writes are visible without flushes.
pub const STAGING_MEMORY_FLAGS: MemoryPropertyFlags =
    MemoryPropertyFlags::HOST_VISIBLE.union(MemoryPropertyFlags::HOST_COHERENT);

/// A `COPY_SRC` buffer in host-visible, host-coherent memory.
///
/// Fill it with [`HostBuffer::write`] and pass [`HostBuffer::raw`] to a
/// device wrapper's `store`. It must outlive the GPU work that reads it.
pub struct HostBuffer<B: Backend> {
    backend: Arc<B>,
    descriptor: BufferDescriptor,
    buffer: B::Buffer,
    memory: B::Memory,
    allocation_size: u64,
}

impl<B: Backend> HostBuffer<B> {
    /// Create an empty staging buffer of `size` bytes.
    pub fn new(
        backend: Arc<B>,
        properties: &MemoryProperties,
        size: u64,
    ) -> Result<Self, UploadError> {
        Self::with_descriptor(
            backend,
            properties,
            BufferDescriptor::new(size, BufferUsage::COPY_SRC).with_label("staging"),
        )
    }

    /// Create a staging buffer sized to `data` and fill it.
    pub fn with_data(
        backend: Arc<B>,
        properties: &MemoryProperties,
        data: &[u8],
    ) -> Result<Self, UploadError> {
        let buffer = Self::new(backend, properties, data.len() as u64)?;
        buffer.write(0, data)?;
        Ok(buffer)
    }

    fn with_descriptor(
        backend: Arc<B>,
        properties: &MemoryProperties,
        descriptor: BufferDescriptor,
    ) -> Result<Self, UploadError> {
        let bound = create_bound_buffer(&*backend, properties, &descriptor, STAGING_MEMORY_FLAGS)?;
        log::debug!(
            "{}: created staging buffer ({} bytes from type {})",
            backend.name(),
            descriptor.size,
            bound.memory_type_index
        );

        Ok(Self {
            backend,
            descriptor,
            buffer: bound.buffer,
            memory: bound.memory,
            allocation_size: bound.allocation_size,
        })
    }

    /// Copy `data` into the buffer starting at byte `offset`.
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<(), UploadError> {
        let end = offset.saturating_add(data.len() as u64);
        if end > self.descriptor.size {
            return Err(UploadError::CopyOutOfBounds {
                requested: end,
                capacity: self.descriptor.size,
            });
        }
        self.backend.write_memory(self.memory, offset, data)
    }

    /// Copy a slice of plain-old-data values into the buffer at `offset`.
    pub fn write_pod<T: bytemuck::Pod>(&self, offset: u64, data: &[T]) -> Result<(), UploadError> {
        self.write(offset, bytemuck::cast_slice(data))
    }

    /// Get the native buffer handle, for use as a copy source.
    pub fn raw(&self) -> B::Buffer {
        self.buffer
    }

    /// Get the backing memory handle.
    pub fn memory(&self) -> B::Memory {
        self.memory
    }

    /// Get the size in bytes.
    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    /// Get the size of the backing allocation, at least [`Self::size`].
    pub fn allocation_size(&self) -> u64 {
        self.allocation_size
    }
}

impl<B: Backend> Drop for HostBuffer<B> {
    fn drop(&mut self) {
        log::debug!("{}: destroying staging buffer", self.backend.name());
        self.backend.destroy_buffer(self.buffer);
        self.backend.free_memory(self.memory);
    }
}

impl<B: Backend> std::fmt::Debug for HostBuffer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBuffer")
            .field("buffer", &self.buffer)
            .field("memory", &self.memory)
            .field("size", &self.descriptor.size)
            .finish()
    }
}

#[cfg(feature = "dummy")]
static_assertions::assert_impl_all!(HostBuffer<crate::backend::DummyBackend>: Send, Sync);

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::backend::{DummyBackend, DummyBackendConfig, DummyHandle};
    use crate::types::{MemoryProperties, MemoryType};

    #[test]
    fn test_staging_uses_host_visible_type() {
        let backend = Arc::new(DummyBackend::new());
        let props = backend.memory_properties().clone();
        let staging = HostBuffer::with_data(backend.clone(), &props, &[1, 2, 3, 4]).unwrap();

        let bytes = backend.read_memory(staging.memory()).unwrap();
        assert_eq!(&bytes[..4], &[1, 2, 3, 4]);
        assert_eq!(staging.size(), 4);
    }

    #[test]
    fn test_write_pod() {
        let backend = Arc::new(DummyBackend::new());
        let props = backend.memory_properties().clone();
        let staging = HostBuffer::new(backend.clone(), &props, 8).unwrap();
        staging.write_pod(0, &[0x0403_0201u32, 0x0807_0605]).unwrap();

        let bytes = backend.read_memory(staging.memory()).unwrap();
        assert_eq!(&bytes[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_write_past_end_fails() {
        let backend = Arc::new(DummyBackend::new());
        let props = backend.memory_properties().clone();
        let staging = HostBuffer::new(backend, &props, 8).unwrap();

        assert_eq!(
            staging.write(6, &[0; 4]),
            Err(UploadError::CopyOutOfBounds {
                requested: 10,
                capacity: 8
            })
        );
    }

    #[test]
    fn test_drop_releases_buffer_before_memory() {
        let backend = Arc::new(DummyBackend::new());
        let props = backend.memory_properties().clone();
        let staging = HostBuffer::with_data(backend.clone(), &props, &[7; 32]).unwrap();
        let (raw, memory) = (staging.raw(), staging.memory());

        drop(staging);
        assert_eq!(
            backend.released_handles(),
            vec![DummyHandle::Buffer(raw), DummyHandle::Memory(memory)]
        );
        assert_eq!(backend.live_handle_count(), 0);
    }

    #[test]
    fn test_empty_staging_buffer_is_rejected() {
        let backend = Arc::new(DummyBackend::with_config(
            DummyBackendConfig::new().without_validation(),
        ));
        let props = backend.memory_properties().clone();

        let err = HostBuffer::with_data(backend.clone(), &props, &[]).unwrap_err();
        assert!(matches!(err, UploadError::InvalidParameter(_)));
        assert_eq!(backend.live_handle_count(), 0);
    }

    #[test]
    fn test_requires_coherent_memory() {
        let props = MemoryProperties::new(
            vec![
                MemoryType::new(MemoryPropertyFlags::DEVICE_LOCAL, 0),
                MemoryType::new(MemoryPropertyFlags::HOST_VISIBLE, 0),
            ],
            Vec::new(),
        );
        let backend = Arc::new(DummyBackend::with_config(
            DummyBackendConfig::new().with_memory_properties(props.clone()),
        ));

        let err = HostBuffer::new(backend.clone(), &props, 16).unwrap_err();
        assert!(matches!(err, UploadError::NoCompatibleMemoryType { .. }));
        assert_eq!(backend.live_handle_count(), 0);
    }
}

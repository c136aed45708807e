//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't talk to a GPU. It hands out numeric handles, keeps a
//! table of everything that is alive, and records commands into a
//! [`DummyCommandBuffer`] so tests can inspect what a wrapper recorded.
//! [`DummyBackend::submit`] replays a recorded sequence against the tracked
//! memory, checking image layouts the way a validation layer would.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::UploadError;
use crate::types::{
    BufferCopy, BufferDescriptor, BufferImageCopy, Extent3d, ImageAspect, ImageBarrier,
    ImageDescriptor, ImageLayout, ImageViewDescriptor, MemoryProperties, MemoryPropertyFlags,
    MemoryRequirements, PipelineStage, TextureFormat,
};

use super::Backend;

macro_rules! dummy_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Raw handle value.
            pub fn as_raw(self) -> u64 {
                self.0
            }
        }
    };
}

dummy_handle! {
    /// Dummy buffer handle.
    DummyBuffer
}

dummy_handle! {
    /// Dummy image handle.
    DummyImage
}

dummy_handle! {
    /// Dummy image view handle.
    DummyImageView
}

dummy_handle! {
    /// Dummy memory allocation handle.
    DummyMemory
}

/// Any handle the dummy backend hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DummyHandle {
    Buffer(DummyBuffer),
    Image(DummyImage),
    ImageView(DummyImageView),
    Memory(DummyMemory),
}

impl From<DummyBuffer> for DummyHandle {
    fn from(handle: DummyBuffer) -> Self {
        Self::Buffer(handle)
    }
}

impl From<DummyImage> for DummyHandle {
    fn from(handle: DummyImage) -> Self {
        Self::Image(handle)
    }
}

impl From<DummyImageView> for DummyHandle {
    fn from(handle: DummyImageView) -> Self {
        Self::ImageView(handle)
    }
}

impl From<DummyMemory> for DummyHandle {
    fn from(handle: DummyMemory) -> Self {
        Self::Memory(handle)
    }
}

/// Backend call that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    CreateBuffer,
    CreateImage,
    AllocateMemory,
    BindMemory,
    CreateImageView,
}

/// Configuration of the simulated device.
#[derive(Debug, Clone)]
pub struct DummyBackendConfig {
    /// Memory types and heaps the device advertises.
    pub memory_properties: MemoryProperties,
    /// Alignment allocation sizes are rounded up to.
    pub alignment: u64,
    /// Memory types resources may bind to. `None` allows every advertised type.
    pub memory_type_bits: Option<u32>,
    /// Calls that fail with [`UploadError::ResourceCreationFailed`].
    pub failures: Vec<FailurePoint>,
    /// Reject malformed descriptors at creation, like a device running
    /// under validation layers.
    pub validate_descriptors: bool,
}

impl DummyBackendConfig {
    /// Discrete-GPU memory layout, 256-byte alignment, no injected failures.
    pub fn new() -> Self {
        Self {
            memory_properties: MemoryProperties::discrete(),
            alignment: 256,
            memory_type_bits: None,
            failures: Vec::new(),
            validate_descriptors: true,
        }
    }

    /// Set the advertised memory properties.
    pub fn with_memory_properties(mut self, properties: MemoryProperties) -> Self {
        self.memory_properties = properties;
        self
    }

    /// Set the allocation alignment.
    pub fn with_alignment(mut self, alignment: u64) -> Self {
        self.alignment = alignment.max(1);
        self
    }

    /// Restrict the memory types reported in requirements.
    pub fn with_memory_type_bits(mut self, bits: u32) -> Self {
        self.memory_type_bits = Some(bits);
        self
    }

    /// Make every call at `point` fail.
    pub fn fail_on(mut self, point: FailurePoint) -> Self {
        self.failures.push(point);
        self
    }

    /// Accept any descriptor at creation, like a release-mode driver.
    pub fn without_validation(mut self) -> Self {
        self.validate_descriptors = false;
        self
    }
}

impl Default for DummyBackendConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A command recorded into a [`DummyCommandBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCommand {
    CopyBuffer {
        src: DummyBuffer,
        dst: DummyBuffer,
        region: BufferCopy,
    },
    PipelineBarrier {
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
        barrier: ImageBarrier<DummyImage>,
    },
    CopyBufferToImage {
        src: DummyBuffer,
        dst: DummyImage,
        dst_layout: ImageLayout,
        region: BufferImageCopy,
    },
}

/// Ordered list of recorded commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DummyCommandBuffer {
    commands: Vec<RecordedCommand>,
}

impl DummyCommandBuffer {
    /// Create an empty command buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands in recording order.
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Recorded image barriers in order, with their stage scopes.
    pub fn barriers(
        &self,
    ) -> impl Iterator<Item = (PipelineStage, PipelineStage, &ImageBarrier<DummyImage>)> {
        self.commands.iter().filter_map(|command| match command {
            RecordedCommand::PipelineBarrier {
                src_stage,
                dst_stage,
                barrier,
            } => Some((*src_stage, *dst_stage, barrier)),
            _ => None,
        })
    }
}

#[derive(Debug)]
struct BufferEntry {
    size: u64,
    bound: Option<(DummyMemory, u64)>,
}

#[derive(Debug)]
struct ImageEntry {
    extent: Extent3d,
    format: TextureFormat,
    layout: ImageLayout,
    bound: Option<(DummyMemory, u64)>,
}

#[derive(Debug)]
struct MemoryEntry {
    flags: MemoryPropertyFlags,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct DummyState {
    next_id: u64,
    buffers: HashMap<DummyBuffer, BufferEntry>,
    images: HashMap<DummyImage, ImageEntry>,
    views: HashMap<DummyImageView, DummyImage>,
    memory: HashMap<DummyMemory, MemoryEntry>,
    released: Vec<DummyHandle>,
}

impl DummyState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn validation(msg: impl std::fmt::Display) -> UploadError {
    UploadError::InvalidParameter(format!("validation: {msg}"))
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    config: DummyBackendConfig,
    state: Mutex<DummyState>,
}

impl DummyBackend {
    /// Create a dummy backend with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DummyBackendConfig::default())
    }

    /// Create a dummy backend with a custom configuration.
    pub fn with_config(config: DummyBackendConfig) -> Self {
        Self {
            config,
            state: Mutex::new(DummyState::default()),
        }
    }

    /// The memory property snapshot this device advertises.
    pub fn memory_properties(&self) -> &MemoryProperties {
        &self.config.memory_properties
    }

    /// Number of buffers, images, views, and allocations still alive.
    pub fn live_handle_count(&self) -> usize {
        let state = self.state.lock();
        state.buffers.len() + state.images.len() + state.views.len() + state.memory.len()
    }

    /// Check whether a handle is still alive.
    pub fn is_live(&self, handle: impl Into<DummyHandle>) -> bool {
        let state = self.state.lock();
        match handle.into() {
            DummyHandle::Buffer(h) => state.buffers.contains_key(&h),
            DummyHandle::Image(h) => state.images.contains_key(&h),
            DummyHandle::ImageView(h) => state.views.contains_key(&h),
            DummyHandle::Memory(h) => state.memory.contains_key(&h),
        }
    }

    /// Handles in the order they were destroyed or freed.
    pub fn released_handles(&self) -> Vec<DummyHandle> {
        self.state.lock().released.clone()
    }

    /// Current contents of an allocation.
    pub fn read_memory(&self, memory: DummyMemory) -> Option<Vec<u8>> {
        self.state
            .lock()
            .memory
            .get(&memory)
            .map(|entry| entry.bytes.clone())
    }

    /// Layout an image is in after the commands submitted so far.
    pub fn image_layout(&self, image: DummyImage) -> Option<ImageLayout> {
        self.state.lock().images.get(&image).map(|entry| entry.layout)
    }

    /// Execute a recorded command sequence against the tracked memory.
    ///
    /// Stops at the first command that violates a layout or bounds rule and
    /// returns it as an error; commands before it stay applied.
    pub fn submit(&self, cmd: &DummyCommandBuffer) -> Result<(), UploadError> {
        log::trace!("DummyBackend: submitting {} commands", cmd.len());
        let mut state = self.state.lock();
        for (index, command) in cmd.commands().iter().enumerate() {
            log::trace!("DummyBackend: executing command {index}: {command:?}");
            match command {
                RecordedCommand::CopyBuffer { src, dst, region } => {
                    Self::execute_copy_buffer(&mut state, *src, *dst, region)?
                }
                RecordedCommand::PipelineBarrier { barrier, .. } => {
                    let image = state.images.get_mut(&barrier.image).ok_or_else(|| {
                        validation(format!("barrier on dead image {:?}", barrier.image))
                    })?;
                    if barrier.old_layout != ImageLayout::Undefined
                        && barrier.old_layout != image.layout
                    {
                        return Err(validation(format!(
                            "barrier expects {:?} but image {:?} is in {:?}",
                            barrier.old_layout, barrier.image, image.layout
                        )));
                    }
                    image.layout = barrier.new_layout;
                }
                RecordedCommand::CopyBufferToImage {
                    src,
                    dst,
                    dst_layout,
                    region,
                } => {
                    Self::execute_copy_buffer_to_image(&mut state, *src, *dst, *dst_layout, region)?
                }
            }
        }
        Ok(())
    }

    fn execute_copy_buffer(
        state: &mut DummyState,
        src: DummyBuffer,
        dst: DummyBuffer,
        region: &BufferCopy,
    ) -> Result<(), UploadError> {
        let (src_memory, src_base) =
            Self::bound_buffer(state, src, region.src_offset + region.size)?;
        let (dst_memory, dst_base) =
            Self::bound_buffer(state, dst, region.dst_offset + region.size)?;

        let start = (src_base + region.src_offset) as usize;
        let data = state.memory[&src_memory].bytes[start..start + region.size as usize].to_vec();

        let start = (dst_base + region.dst_offset) as usize;
        if let Some(entry) = state.memory.get_mut(&dst_memory) {
            entry.bytes[start..start + data.len()].copy_from_slice(&data);
        }
        Ok(())
    }

    fn execute_copy_buffer_to_image(
        state: &mut DummyState,
        src: DummyBuffer,
        dst: DummyImage,
        dst_layout: ImageLayout,
        region: &BufferImageCopy,
    ) -> Result<(), UploadError> {
        let image = state
            .images
            .get(&dst)
            .ok_or_else(|| validation(format!("copy into dead image {dst:?}")))?;
        if !matches!(dst_layout, ImageLayout::TransferDst | ImageLayout::General) {
            return Err(validation(format!(
                "copy destination layout {dst_layout:?} is not a transfer layout"
            )));
        }
        if image.layout != dst_layout {
            return Err(validation(format!(
                "copy expects {dst_layout:?} but image {dst:?} is in {:?}",
                image.layout
            )));
        }
        let extent = region.image_extent;
        if extent.width > image.extent.width || extent.height > image.extent.height {
            return Err(validation(format!(
                "copy extent {extent:?} exceeds image extent {:?}",
                image.extent
            )));
        }
        let (image_memory, image_base) = image
            .bound
            .ok_or_else(|| validation(format!("image {dst:?} has no memory bound")))?;
        let texel = image.format.block_size() as u64;
        let image_row = image.extent.width as u64 * texel;

        if extent.width == 0 || extent.height == 0 {
            return Ok(());
        }

        let row_length = if region.buffer_row_length == 0 {
            extent.width
        } else {
            region.buffer_row_length
        } as u64;
        let needed = region.buffer_offset
            + ((extent.height as u64 - 1) * row_length + extent.width as u64) * texel;
        let (src_memory, src_base) = Self::bound_buffer(state, src, needed)?;

        let mut rows = Vec::with_capacity(extent.height as usize);
        {
            let src_bytes = &state.memory[&src_memory].bytes;
            for y in 0..extent.height as u64 {
                let start = (src_base + region.buffer_offset + y * row_length * texel) as usize;
                let len = (extent.width as u64 * texel) as usize;
                rows.push(src_bytes[start..start + len].to_vec());
            }
        }
        if let Some(entry) = state.memory.get_mut(&image_memory) {
            for (y, row) in rows.iter().enumerate() {
                let start = (image_base + y as u64 * image_row) as usize;
                entry.bytes[start..start + row.len()].copy_from_slice(row);
            }
        }
        Ok(())
    }

    fn bound_buffer(
        state: &DummyState,
        buffer: DummyBuffer,
        end: u64,
    ) -> Result<(DummyMemory, u64), UploadError> {
        let entry = state
            .buffers
            .get(&buffer)
            .ok_or_else(|| validation(format!("dead buffer {buffer:?}")))?;
        let bound = entry
            .bound
            .ok_or_else(|| validation(format!("buffer {buffer:?} has no memory bound")))?;
        if end > entry.size {
            return Err(validation(format!(
                "access up to byte {end} overruns buffer {buffer:?} of {} bytes",
                entry.size
            )));
        }
        Ok(bound)
    }

    fn check_failure(&self, point: FailurePoint) -> Result<(), UploadError> {
        if self.config.failures.contains(&point) {
            log::trace!("DummyBackend: injected failure at {point:?}");
            return Err(UploadError::ResourceCreationFailed(format!(
                "injected failure at {point:?}"
            )));
        }
        Ok(())
    }

    fn requirements(&self, size: u64) -> MemoryRequirements {
        let alignment = self.config.alignment;
        let all_types = match self.config.memory_properties.memory_type_count() {
            32 => u32::MAX,
            n => (1u32 << n) - 1,
        };
        MemoryRequirements {
            size: size.max(1).div_ceil(alignment) * alignment,
            alignment,
            memory_type_bits: self.config.memory_type_bits.unwrap_or(all_types),
        }
    }

    fn bind_check(
        &self,
        state: &DummyState,
        memory: DummyMemory,
        offset: u64,
        requirements: MemoryRequirements,
    ) -> Result<(), UploadError> {
        let entry = state.memory.get(&memory).ok_or_else(|| {
            UploadError::ResourceCreationFailed(format!("bind to unknown memory {memory:?}"))
        })?;
        if offset % requirements.alignment != 0 {
            return Err(UploadError::ResourceCreationFailed(format!(
                "bind offset {offset} is not aligned to {}",
                requirements.alignment
            )));
        }
        if offset + requirements.size > entry.bytes.len() as u64 {
            return Err(UploadError::ResourceCreationFailed(format!(
                "allocation of {} bytes is too small for {} bytes at offset {offset}",
                entry.bytes.len(),
                requirements.size
            )));
        }
        Ok(())
    }

    fn release(&self, handle: DummyHandle) {
        let mut state = self.state.lock();
        let removed = match handle {
            DummyHandle::Buffer(h) => state.buffers.remove(&h).is_some(),
            DummyHandle::Image(h) => state.images.remove(&h).is_some(),
            DummyHandle::ImageView(h) => state.views.remove(&h).is_some(),
            DummyHandle::Memory(h) => state.memory.remove(&h).is_some(),
        };
        if removed {
            log::trace!("DummyBackend: released {handle:?}");
            state.released.push(handle);
        } else {
            log::warn!("DummyBackend: release of unknown handle {handle:?}");
        }
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for DummyBackend {
    type Buffer = DummyBuffer;
    type Image = DummyImage;
    type ImageView = DummyImageView;
    type Memory = DummyMemory;
    type CommandBuffer = DummyCommandBuffer;

    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<DummyBuffer, UploadError> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        self.check_failure(FailurePoint::CreateBuffer)?;
        if self.config.validate_descriptors {
            descriptor.validate()?;
        }

        let mut state = self.state.lock();
        let handle = DummyBuffer(state.next_id());
        state.buffers.insert(
            handle,
            BufferEntry {
                size: descriptor.size,
                bound: None,
            },
        );
        Ok(handle)
    }

    fn buffer_memory_requirements(&self, buffer: DummyBuffer) -> MemoryRequirements {
        let size = self
            .state
            .lock()
            .buffers
            .get(&buffer)
            .map_or(0, |entry| entry.size);
        self.requirements(size)
    }

    fn bind_buffer_memory(
        &self,
        buffer: DummyBuffer,
        memory: DummyMemory,
        offset: u64,
    ) -> Result<(), UploadError> {
        log::trace!("DummyBackend: binding {memory:?} to {buffer:?} at {offset}");
        self.check_failure(FailurePoint::BindMemory)?;
        let requirements = self.buffer_memory_requirements(buffer);
        let mut state = self.state.lock();
        self.bind_check(&state, memory, offset, requirements)?;
        let entry = state.buffers.get_mut(&buffer).ok_or_else(|| {
            UploadError::ResourceCreationFailed(format!("bind of unknown buffer {buffer:?}"))
        })?;
        if entry.bound.is_some() {
            return Err(UploadError::ResourceCreationFailed(format!(
                "buffer {buffer:?} already has memory bound"
            )));
        }
        entry.bound = Some((memory, offset));
        Ok(())
    }

    fn destroy_buffer(&self, buffer: DummyBuffer) {
        self.release(buffer.into());
    }

    fn create_image(&self, descriptor: &ImageDescriptor) -> Result<DummyImage, UploadError> {
        log::trace!(
            "DummyBackend: creating image {:?} ({}x{}x{})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth
        );
        self.check_failure(FailurePoint::CreateImage)?;
        if self.config.validate_descriptors {
            descriptor.validate()?;
        }

        let mut state = self.state.lock();
        let handle = DummyImage(state.next_id());
        state.images.insert(
            handle,
            ImageEntry {
                extent: descriptor.size,
                format: descriptor.format,
                layout: descriptor.initial_layout,
                bound: None,
            },
        );
        Ok(handle)
    }

    fn image_memory_requirements(&self, image: DummyImage) -> MemoryRequirements {
        let size = self.state.lock().images.get(&image).map_or(0, |entry| {
            let extent = entry.extent;
            extent.width as u64
                * extent.height as u64
                * extent.depth as u64
                * entry.format.block_size() as u64
        });
        self.requirements(size)
    }

    fn bind_image_memory(
        &self,
        image: DummyImage,
        memory: DummyMemory,
        offset: u64,
    ) -> Result<(), UploadError> {
        log::trace!("DummyBackend: binding {memory:?} to {image:?} at {offset}");
        self.check_failure(FailurePoint::BindMemory)?;
        let requirements = self.image_memory_requirements(image);
        let mut state = self.state.lock();
        self.bind_check(&state, memory, offset, requirements)?;
        let entry = state.images.get_mut(&image).ok_or_else(|| {
            UploadError::ResourceCreationFailed(format!("bind of unknown image {image:?}"))
        })?;
        if entry.bound.is_some() {
            return Err(UploadError::ResourceCreationFailed(format!(
                "image {image:?} already has memory bound"
            )));
        }
        entry.bound = Some((memory, offset));
        Ok(())
    }

    fn destroy_image(&self, image: DummyImage) {
        self.release(image.into());
    }

    fn create_image_view(
        &self,
        descriptor: &ImageViewDescriptor<DummyImage>,
    ) -> Result<DummyImageView, UploadError> {
        log::trace!("DummyBackend: creating view over {:?}", descriptor.image);
        self.check_failure(FailurePoint::CreateImageView)?;

        let mut state = self.state.lock();
        let image = state.images.get(&descriptor.image).ok_or_else(|| {
            UploadError::ResourceCreationFailed(format!(
                "view over unknown image {:?}",
                descriptor.image
            ))
        })?;
        if image.bound.is_none() {
            return Err(UploadError::ResourceCreationFailed(format!(
                "view over image {:?} without bound memory",
                descriptor.image
            )));
        }
        let aspect = descriptor.subresource_range.aspect;
        let aspect_ok = if image.format.is_depth_stencil() {
            !aspect.is_empty() && !aspect.contains(ImageAspect::COLOR)
        } else {
            aspect == ImageAspect::COLOR
        };
        if !aspect_ok {
            return Err(UploadError::ResourceCreationFailed(format!(
                "aspect {aspect:?} does not match format {:?}",
                image.format
            )));
        }

        let handle = DummyImageView(state.next_id());
        state.views.insert(handle, descriptor.image);
        Ok(handle)
    }

    fn destroy_image_view(&self, view: DummyImageView) {
        self.release(view.into());
    }

    fn allocate_memory(
        &self,
        size: u64,
        memory_type_index: u32,
    ) -> Result<DummyMemory, UploadError> {
        log::trace!("DummyBackend: allocating {size} bytes from type {memory_type_index}");
        self.check_failure(FailurePoint::AllocateMemory)?;
        let properties = &self.config.memory_properties;
        let memory_type = properties
            .memory_types
            .get(memory_type_index as usize)
            .ok_or_else(|| {
                UploadError::InvalidParameter(format!(
                    "memory type index {memory_type_index} is out of range"
                ))
            })?;
        if size == 0 {
            return Err(UploadError::InvalidParameter(
                "allocation size must be greater than zero".to_string(),
            ));
        }
        if let Some(heap) = properties.memory_heaps.get(memory_type.heap_index as usize) {
            if size > heap.size {
                return Err(UploadError::OutOfMemory);
            }
        }

        let mut state = self.state.lock();
        let handle = DummyMemory(state.next_id());
        state.memory.insert(
            handle,
            MemoryEntry {
                flags: memory_type.property_flags,
                bytes: vec![0; size as usize],
            },
        );
        Ok(handle)
    }

    fn free_memory(&self, memory: DummyMemory) {
        self.release(memory.into());
    }

    fn write_memory(
        &self,
        memory: DummyMemory,
        offset: u64,
        data: &[u8],
    ) -> Result<(), UploadError> {
        log::trace!(
            "DummyBackend: write_memory {memory:?} offset={offset} len={}",
            data.len()
        );
        let mut state = self.state.lock();
        let entry = state.memory.get_mut(&memory).ok_or_else(|| {
            UploadError::InvalidParameter(format!("write to unknown memory {memory:?}"))
        })?;
        if !entry.flags.contains(MemoryPropertyFlags::HOST_VISIBLE) {
            return Err(UploadError::InvalidParameter(format!(
                "memory {memory:?} is not host-visible"
            )));
        }
        let end = offset + data.len() as u64;
        if end > entry.bytes.len() as u64 {
            return Err(UploadError::CopyOutOfBounds {
                requested: end,
                capacity: entry.bytes.len() as u64,
            });
        }
        entry.bytes[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }

    fn cmd_copy_buffer(
        &self,
        cmd: &mut DummyCommandBuffer,
        src: DummyBuffer,
        dst: DummyBuffer,
        region: &BufferCopy,
    ) {
        log::trace!("DummyBackend: record copy {src:?} -> {dst:?} ({} bytes)", region.size);
        cmd.commands.push(RecordedCommand::CopyBuffer {
            src,
            dst,
            region: *region,
        });
    }

    fn cmd_pipeline_barrier(
        &self,
        cmd: &mut DummyCommandBuffer,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
        barrier: &ImageBarrier<DummyImage>,
    ) {
        log::trace!(
            "DummyBackend: record barrier {:?}: {:?} -> {:?}",
            barrier.image,
            barrier.old_layout,
            barrier.new_layout
        );
        cmd.commands.push(RecordedCommand::PipelineBarrier {
            src_stage,
            dst_stage,
            barrier: *barrier,
        });
    }

    fn cmd_copy_buffer_to_image(
        &self,
        cmd: &mut DummyCommandBuffer,
        src: DummyBuffer,
        dst: DummyImage,
        dst_layout: ImageLayout,
        region: &BufferImageCopy,
    ) {
        log::trace!(
            "DummyBackend: record copy {src:?} -> {dst:?} ({}x{})",
            region.image_extent.width,
            region.image_extent.height
        );
        cmd.commands.push(RecordedCommand::CopyBufferToImage {
            src,
            dst,
            dst_layout,
            region: *region,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BufferUsage, SubresourceRange, TextureUsage};

    #[test]
    fn test_dummy_backend_name() {
        let backend = DummyBackend::new();
        assert_eq!(backend.name(), "Dummy Backend");
    }

    #[test]
    fn test_requirements_are_aligned() {
        let backend = DummyBackend::with_config(DummyBackendConfig::new().with_alignment(256));
        let buffer = backend
            .create_buffer(&BufferDescriptor::new(1000, BufferUsage::VERTEX))
            .unwrap();
        let req = backend.buffer_memory_requirements(buffer);
        assert_eq!(req.size, 1024);
        assert_eq!(req.alignment, 256);
        assert_eq!(req.memory_type_bits, 0b11);
    }

    #[test]
    fn test_rejects_empty_buffer() {
        let backend = DummyBackend::new();
        let err = backend
            .create_buffer(&BufferDescriptor::new(0, BufferUsage::VERTEX))
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidParameter(_)));
        assert_eq!(backend.live_handle_count(), 0);
    }

    #[test]
    fn test_without_validation_accepts_empty_buffer() {
        let backend = DummyBackend::with_config(DummyBackendConfig::new().without_validation());
        let buffer = backend
            .create_buffer(&BufferDescriptor::new(0, BufferUsage::empty()))
            .unwrap();
        assert!(backend.is_live(buffer));
        backend.destroy_buffer(buffer);
        assert_eq!(backend.live_handle_count(), 0);
    }

    #[test]
    fn test_write_requires_host_visible() {
        let backend = DummyBackend::new();
        let device_local = backend.allocate_memory(256, 0).unwrap();
        let host = backend.allocate_memory(256, 1).unwrap();

        assert!(backend.write_memory(device_local, 0, &[1, 2, 3]).is_err());
        backend.write_memory(host, 4, &[1, 2, 3]).unwrap();
        assert_eq!(&backend.read_memory(host).unwrap()[4..7], &[1, 2, 3]);
    }

    #[test]
    fn test_release_is_logged_in_order() {
        let backend = DummyBackend::new();
        let memory = backend.allocate_memory(256, 0).unwrap();
        let buffer = backend
            .create_buffer(&BufferDescriptor::new(16, BufferUsage::UNIFORM))
            .unwrap();
        backend.destroy_buffer(buffer);
        backend.free_memory(memory);
        assert_eq!(
            backend.released_handles(),
            vec![DummyHandle::Buffer(buffer), DummyHandle::Memory(memory)]
        );
        assert_eq!(backend.live_handle_count(), 0);
    }

    #[test]
    fn test_submit_copies_buffer_bytes() {
        let backend = DummyBackend::new();
        let src = backend
            .create_buffer(&BufferDescriptor::new(8, BufferUsage::COPY_SRC))
            .unwrap();
        let dst = backend
            .create_buffer(&BufferDescriptor::new(8, BufferUsage::COPY_DST))
            .unwrap();
        let src_memory = backend.allocate_memory(256, 1).unwrap();
        let dst_memory = backend.allocate_memory(256, 0).unwrap();
        backend.bind_buffer_memory(src, src_memory, 0).unwrap();
        backend.bind_buffer_memory(dst, dst_memory, 0).unwrap();
        backend.write_memory(src_memory, 0, &[9; 8]).unwrap();

        let mut cmd = DummyCommandBuffer::new();
        backend.cmd_copy_buffer(&mut cmd, src, dst, &BufferCopy::whole(8));
        assert_eq!(backend.read_memory(dst_memory).unwrap()[0], 0);

        backend.submit(&cmd).unwrap();
        assert_eq!(&backend.read_memory(dst_memory).unwrap()[..8], &[9; 8]);
    }

    #[test]
    fn test_submit_rejects_wrong_old_layout() {
        let backend = DummyBackend::new();
        let image = backend
            .create_image(&ImageDescriptor::new_2d(
                4,
                4,
                TextureFormat::Rgba8Unorm,
                TextureUsage::COPY_DST,
            ))
            .unwrap();

        let mut cmd = DummyCommandBuffer::new();
        backend.cmd_pipeline_barrier(
            &mut cmd,
            PipelineStage::TRANSFER,
            PipelineStage::FRAGMENT_SHADER,
            &ImageBarrier {
                image,
                src_access: crate::types::AccessFlags::TRANSFER_WRITE,
                dst_access: crate::types::AccessFlags::empty(),
                old_layout: ImageLayout::TransferDst,
                new_layout: ImageLayout::ShaderReadOnly,
                subresource_range: SubresourceRange::single(ImageAspect::COLOR),
            },
        );
        let err = backend.submit(&cmd).unwrap_err();
        assert!(err.to_string().contains("validation"));
        assert_eq!(backend.image_layout(image), Some(ImageLayout::Preinitialized));
    }

    #[test]
    fn test_injected_failure() {
        let backend =
            DummyBackend::with_config(DummyBackendConfig::new().fail_on(FailurePoint::CreateImage));
        let err = backend
            .create_image(&ImageDescriptor::new_2d(
                1,
                1,
                TextureFormat::R8Unorm,
                TextureUsage::COPY_DST,
            ))
            .unwrap_err();
        assert!(matches!(err, UploadError::ResourceCreationFailed(_)));
    }
}

//! Native Vulkan backend implementation using ash.
//!
//! [`VulkanDevice`] wraps a logical device created elsewhere (instance,
//! physical device selection, and queues belong to the caller) and
//! implements [`Backend`] with direct ash calls. Command recording goes into
//! a caller-owned `vk::CommandBuffer` that must be in the recording state.

pub(crate) mod conversion;

use ash::vk;

use crate::error::UploadError;
use crate::types::{
    BufferCopy, BufferDescriptor, BufferImageCopy, ImageBarrier, ImageDescriptor, ImageLayout,
    ImageViewDescriptor, MemoryRequirements, PipelineStage,
};

use super::Backend;

use self::conversion::{
    convert_access_flags, convert_buffer_usage, convert_component_mapping, convert_image_layout,
    convert_pipeline_stage, convert_subresource_layers, convert_subresource_range,
    convert_texture_format, convert_texture_usage, convert_tiling, map_vk_result,
    memory_requirements_from_vk,
};

/// Vulkan logical device used as an upload backend.
pub struct VulkanDevice {
    device: ash::Device,
}

impl VulkanDevice {
    /// Wrap an existing logical device.
    ///
    /// # Safety
    ///
    /// `device` must be a valid logical device that stays alive until every
    /// resource created through this wrapper has been dropped. Command
    /// buffers passed to the recording calls must belong to this device and
    /// be in the recording state.
    pub unsafe fn from_raw(device: ash::Device) -> Self {
        Self { device }
    }

    /// Get the underlying ash device.
    pub fn raw(&self) -> &ash::Device {
        &self.device
    }
}

impl std::fmt::Debug for VulkanDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulkanDevice")
            .field("device", &self.device.handle())
            .finish()
    }
}

impl Backend for VulkanDevice {
    type Buffer = vk::Buffer;
    type Image = vk::Image;
    type ImageView = vk::ImageView;
    type Memory = vk::DeviceMemory;
    type CommandBuffer = vk::CommandBuffer;

    fn name(&self) -> &'static str {
        "Vulkan Backend (ash)"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<vk::Buffer, UploadError> {
        let buffer_info = vk::BufferCreateInfo::default()
            .size(descriptor.size)
            .usage(convert_buffer_usage(descriptor.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        unsafe { self.device.create_buffer(&buffer_info, None) }
            .map_err(|e| map_vk_result("create buffer", e))
    }

    fn buffer_memory_requirements(&self, buffer: vk::Buffer) -> MemoryRequirements {
        let requirements = unsafe { self.device.get_buffer_memory_requirements(buffer) };
        memory_requirements_from_vk(requirements)
    }

    fn bind_buffer_memory(
        &self,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: u64,
    ) -> Result<(), UploadError> {
        unsafe { self.device.bind_buffer_memory(buffer, memory, offset) }
            .map_err(|e| map_vk_result("bind buffer memory", e))
    }

    fn destroy_buffer(&self, buffer: vk::Buffer) {
        unsafe {
            self.device.destroy_buffer(buffer, None);
        }
    }

    fn create_image(&self, descriptor: &ImageDescriptor) -> Result<vk::Image, UploadError> {
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(convert_texture_format(descriptor.format))
            .extent(vk::Extent3D {
                width: descriptor.size.width,
                height: descriptor.size.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(convert_tiling(descriptor.tiling))
            .usage(convert_texture_usage(descriptor.usage, descriptor.format))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(convert_image_layout(descriptor.initial_layout));

        unsafe { self.device.create_image(&image_info, None) }
            .map_err(|e| map_vk_result("create image", e))
    }

    fn image_memory_requirements(&self, image: vk::Image) -> MemoryRequirements {
        let requirements = unsafe { self.device.get_image_memory_requirements(image) };
        memory_requirements_from_vk(requirements)
    }

    fn bind_image_memory(
        &self,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: u64,
    ) -> Result<(), UploadError> {
        unsafe { self.device.bind_image_memory(image, memory, offset) }
            .map_err(|e| map_vk_result("bind image memory", e))
    }

    fn destroy_image(&self, image: vk::Image) {
        unsafe {
            self.device.destroy_image(image, None);
        }
    }

    fn create_image_view(
        &self,
        descriptor: &ImageViewDescriptor<vk::Image>,
    ) -> Result<vk::ImageView, UploadError> {
        let view_info = vk::ImageViewCreateInfo::default()
            .image(descriptor.image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(convert_texture_format(descriptor.format))
            .components(convert_component_mapping(descriptor.components))
            .subresource_range(convert_subresource_range(descriptor.subresource_range));

        unsafe { self.device.create_image_view(&view_info, None) }
            .map_err(|e| map_vk_result("create image view", e))
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe {
            self.device.destroy_image_view(view, None);
        }
    }

    fn allocate_memory(
        &self,
        size: u64,
        memory_type_index: u32,
    ) -> Result<vk::DeviceMemory, UploadError> {
        let alloc_info = vk::MemoryAllocateInfo::default()
            .allocation_size(size)
            .memory_type_index(memory_type_index);

        unsafe { self.device.allocate_memory(&alloc_info, None) }
            .map_err(|e| map_vk_result("allocate memory", e))
    }

    fn free_memory(&self, memory: vk::DeviceMemory) {
        unsafe {
            self.device.free_memory(memory, None);
        }
    }

    fn write_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: u64,
        data: &[u8],
    ) -> Result<(), UploadError> {
        if data.is_empty() {
            return Ok(());
        }

        unsafe {
            let mapped = self
                .device
                .map_memory(
                    memory,
                    offset,
                    data.len() as u64,
                    vk::MemoryMapFlags::empty(),
                )
                .map_err(|e| map_vk_result("map memory", e))?;
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.cast::<u8>(), data.len());
            self.device.unmap_memory(memory);
        }
        Ok(())
    }

    fn cmd_copy_buffer(
        &self,
        cmd: &mut vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        region: &BufferCopy,
    ) {
        let region = vk::BufferCopy {
            src_offset: region.src_offset,
            dst_offset: region.dst_offset,
            size: region.size,
        };
        unsafe {
            self.device.cmd_copy_buffer(*cmd, src, dst, &[region]);
        }
    }

    fn cmd_pipeline_barrier(
        &self,
        cmd: &mut vk::CommandBuffer,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
        barrier: &ImageBarrier<vk::Image>,
    ) {
        let image_barrier = vk::ImageMemoryBarrier::default()
            .src_access_mask(convert_access_flags(barrier.src_access))
            .dst_access_mask(convert_access_flags(barrier.dst_access))
            .old_layout(convert_image_layout(barrier.old_layout))
            .new_layout(convert_image_layout(barrier.new_layout))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(barrier.image)
            .subresource_range(convert_subresource_range(barrier.subresource_range));

        unsafe {
            self.device.cmd_pipeline_barrier(
                *cmd,
                convert_pipeline_stage(src_stage),
                convert_pipeline_stage(dst_stage),
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[image_barrier],
            );
        }
    }

    fn cmd_copy_buffer_to_image(
        &self,
        cmd: &mut vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        dst_layout: ImageLayout,
        region: &BufferImageCopy,
    ) {
        let [x, y, z] = region.image_offset;
        let copy_region = vk::BufferImageCopy {
            buffer_offset: region.buffer_offset,
            buffer_row_length: region.buffer_row_length,
            buffer_image_height: region.buffer_image_height,
            image_subresource: convert_subresource_layers(region.image_subresource),
            image_offset: vk::Offset3D { x, y, z },
            image_extent: vk::Extent3D {
                width: region.image_extent.width,
                height: region.image_extent.height,
                depth: region.image_extent.depth,
            },
        };

        unsafe {
            self.device.cmd_copy_buffer_to_image(
                *cmd,
                src,
                dst,
                convert_image_layout(dst_layout),
                &[copy_region],
            );
        }
    }
}

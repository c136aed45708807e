//! Type conversions between crate types and Vulkan types.

use ash::vk;

use crate::error::UploadError;
use crate::types::{
    AccessFlags, BufferUsage, ComponentMapping, ComponentSwizzle, ImageAspect, ImageLayout,
    ImageSubresourceLayers, ImageTiling, MemoryHeap, MemoryHeapFlags, MemoryProperties,
    MemoryPropertyFlags, MemoryRequirements, MemoryType, PipelineStage, SubresourceRange,
    TextureFormat, TextureUsage,
};

/// Convert BufferUsage flags to Vulkan buffer usage flags.
pub fn convert_buffer_usage(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut result = vk::BufferUsageFlags::empty();

    if usage.contains(BufferUsage::VERTEX) {
        result |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if usage.contains(BufferUsage::INDEX) {
        result |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if usage.contains(BufferUsage::UNIFORM) {
        result |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }
    if usage.contains(BufferUsage::STORAGE) {
        result |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }
    if usage.contains(BufferUsage::COPY_SRC) {
        result |= vk::BufferUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(BufferUsage::COPY_DST) {
        result |= vk::BufferUsageFlags::TRANSFER_DST;
    }

    result
}

/// Convert TextureFormat to Vulkan format.
pub fn convert_texture_format(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8Unorm => vk::Format::R8_UNORM,
        TextureFormat::Rg8Unorm => vk::Format::R8G8_UNORM,
        TextureFormat::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::Rgba8UnormSrgb => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::Bgra8UnormSrgb => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
        TextureFormat::Rgba32Float => vk::Format::R32G32B32A32_SFLOAT,
        TextureFormat::Depth16Unorm => vk::Format::D16_UNORM,
        TextureFormat::Depth32Float => vk::Format::D32_SFLOAT,
        TextureFormat::Depth24PlusStencil8 => vk::Format::D24_UNORM_S8_UINT,
    }
}

/// Convert TextureUsage flags to Vulkan image usage flags.
///
/// The format is needed to determine whether RENDER_ATTACHMENT should map to
/// COLOR_ATTACHMENT or DEPTH_STENCIL_ATTACHMENT.
pub fn convert_texture_usage(usage: TextureUsage, format: TextureFormat) -> vk::ImageUsageFlags {
    let mut result = vk::ImageUsageFlags::empty();

    if usage.contains(TextureUsage::COPY_SRC) {
        result |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(TextureUsage::COPY_DST) {
        result |= vk::ImageUsageFlags::TRANSFER_DST;
    }
    if usage.contains(TextureUsage::TEXTURE_BINDING) {
        result |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(TextureUsage::STORAGE_BINDING) {
        result |= vk::ImageUsageFlags::STORAGE;
    }
    if usage.contains(TextureUsage::RENDER_ATTACHMENT) {
        if format.is_depth_stencil() {
            result |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
        } else {
            result |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
        }
    }

    result
}

pub fn convert_tiling(tiling: ImageTiling) -> vk::ImageTiling {
    match tiling {
        ImageTiling::Optimal => vk::ImageTiling::OPTIMAL,
        ImageTiling::Linear => vk::ImageTiling::LINEAR,
    }
}

/// Convert ImageLayout to Vulkan image layout.
pub fn convert_image_layout(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::Preinitialized => vk::ImageLayout::PREINITIALIZED,
        ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::General => vk::ImageLayout::GENERAL,
    }
}

pub fn convert_image_aspect(aspect: ImageAspect) -> vk::ImageAspectFlags {
    let mut result = vk::ImageAspectFlags::empty();

    if aspect.contains(ImageAspect::COLOR) {
        result |= vk::ImageAspectFlags::COLOR;
    }
    if aspect.contains(ImageAspect::DEPTH) {
        result |= vk::ImageAspectFlags::DEPTH;
    }
    if aspect.contains(ImageAspect::STENCIL) {
        result |= vk::ImageAspectFlags::STENCIL;
    }

    result
}

pub fn convert_pipeline_stage(stage: PipelineStage) -> vk::PipelineStageFlags {
    let mut result = vk::PipelineStageFlags::empty();

    if stage.contains(PipelineStage::TOP_OF_PIPE) {
        result |= vk::PipelineStageFlags::TOP_OF_PIPE;
    }
    if stage.contains(PipelineStage::TRANSFER) {
        result |= vk::PipelineStageFlags::TRANSFER;
    }
    if stage.contains(PipelineStage::VERTEX_SHADER) {
        result |= vk::PipelineStageFlags::VERTEX_SHADER;
    }
    if stage.contains(PipelineStage::FRAGMENT_SHADER) {
        result |= vk::PipelineStageFlags::FRAGMENT_SHADER;
    }
    if stage.contains(PipelineStage::COMPUTE_SHADER) {
        result |= vk::PipelineStageFlags::COMPUTE_SHADER;
    }
    if stage.contains(PipelineStage::BOTTOM_OF_PIPE) {
        result |= vk::PipelineStageFlags::BOTTOM_OF_PIPE;
    }

    result
}

pub fn convert_access_flags(access: AccessFlags) -> vk::AccessFlags {
    let mut result = vk::AccessFlags::empty();

    if access.contains(AccessFlags::TRANSFER_READ) {
        result |= vk::AccessFlags::TRANSFER_READ;
    }
    if access.contains(AccessFlags::TRANSFER_WRITE) {
        result |= vk::AccessFlags::TRANSFER_WRITE;
    }
    if access.contains(AccessFlags::SHADER_READ) {
        result |= vk::AccessFlags::SHADER_READ;
    }
    if access.contains(AccessFlags::SHADER_WRITE) {
        result |= vk::AccessFlags::SHADER_WRITE;
    }

    result
}

fn convert_swizzle(swizzle: ComponentSwizzle) -> vk::ComponentSwizzle {
    match swizzle {
        ComponentSwizzle::Identity => vk::ComponentSwizzle::IDENTITY,
        ComponentSwizzle::R => vk::ComponentSwizzle::R,
        ComponentSwizzle::G => vk::ComponentSwizzle::G,
        ComponentSwizzle::B => vk::ComponentSwizzle::B,
        ComponentSwizzle::A => vk::ComponentSwizzle::A,
    }
}

pub fn convert_component_mapping(mapping: ComponentMapping) -> vk::ComponentMapping {
    vk::ComponentMapping {
        r: convert_swizzle(mapping.r),
        g: convert_swizzle(mapping.g),
        b: convert_swizzle(mapping.b),
        a: convert_swizzle(mapping.a),
    }
}

pub fn convert_subresource_range(range: SubresourceRange) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: convert_image_aspect(range.aspect),
        base_mip_level: range.base_mip_level,
        level_count: range.level_count,
        base_array_layer: range.base_array_layer,
        layer_count: range.layer_count,
    }
}

pub fn convert_subresource_layers(layers: ImageSubresourceLayers) -> vk::ImageSubresourceLayers {
    vk::ImageSubresourceLayers {
        aspect_mask: convert_image_aspect(layers.aspect),
        mip_level: layers.mip_level,
        base_array_layer: layers.base_array_layer,
        layer_count: layers.layer_count,
    }
}

/// Convert Vulkan memory property flags to crate flags, dropping bits the
/// upload path never asks for.
pub fn memory_property_flags_from_vk(flags: vk::MemoryPropertyFlags) -> MemoryPropertyFlags {
    let mut result = MemoryPropertyFlags::empty();

    if flags.contains(vk::MemoryPropertyFlags::DEVICE_LOCAL) {
        result |= MemoryPropertyFlags::DEVICE_LOCAL;
    }
    if flags.contains(vk::MemoryPropertyFlags::HOST_VISIBLE) {
        result |= MemoryPropertyFlags::HOST_VISIBLE;
    }
    if flags.contains(vk::MemoryPropertyFlags::HOST_COHERENT) {
        result |= MemoryPropertyFlags::HOST_COHERENT;
    }
    if flags.contains(vk::MemoryPropertyFlags::HOST_CACHED) {
        result |= MemoryPropertyFlags::HOST_CACHED;
    }
    if flags.contains(vk::MemoryPropertyFlags::LAZILY_ALLOCATED) {
        result |= MemoryPropertyFlags::LAZILY_ALLOCATED;
    }

    result
}

pub fn memory_requirements_from_vk(requirements: vk::MemoryRequirements) -> MemoryRequirements {
    MemoryRequirements {
        size: requirements.size,
        alignment: requirements.alignment,
        memory_type_bits: requirements.memory_type_bits,
    }
}

impl From<vk::PhysicalDeviceMemoryProperties> for MemoryProperties {
    fn from(properties: vk::PhysicalDeviceMemoryProperties) -> Self {
        let type_count = (properties.memory_type_count as usize).min(vk::MAX_MEMORY_TYPES);
        let heap_count = (properties.memory_heap_count as usize).min(vk::MAX_MEMORY_HEAPS);

        let memory_types = properties.memory_types[..type_count]
            .iter()
            .map(|ty| {
                MemoryType::new(
                    memory_property_flags_from_vk(ty.property_flags),
                    ty.heap_index,
                )
            })
            .collect();
        let memory_heaps = properties.memory_heaps[..heap_count]
            .iter()
            .map(|heap| MemoryHeap {
                size: heap.size,
                flags: if heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL) {
                    MemoryHeapFlags::DEVICE_LOCAL
                } else {
                    MemoryHeapFlags::empty()
                },
            })
            .collect();

        Self::new(memory_types, memory_heaps)
    }
}

/// Map a Vulkan error code onto the crate error taxonomy.
pub fn map_vk_result(what: &str, result: vk::Result) -> UploadError {
    match result {
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY | vk::Result::ERROR_OUT_OF_HOST_MEMORY => {
            UploadError::OutOfMemory
        }
        vk::Result::ERROR_DEVICE_LOST => UploadError::DeviceLost,
        other => UploadError::ResourceCreationFailed(format!("Failed to {what}: {other:?}")),
    }
}

//! Device-local sampled image with a one-shot staging upload.

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::UploadError;
use crate::types::{
    AccessFlags, BufferImageCopy, ComponentMapping, Extent3d, ImageAspect, ImageBarrier,
    ImageDescriptor, ImageLayout, ImageViewDescriptor, MemoryProperties, MemoryPropertyFlags,
    PipelineStage, SubresourceRange, TextureFormat, TextureUsage,
};

use super::guard::Owned;
use super::memory;

/// An image bound to its own allocation, with a view over it.
struct BoundImage<B: Backend> {
    image: B::Image,
    memory: B::Memory,
    view: B::ImageView,
    view_descriptor: ImageViewDescriptor<B::Image>,
    allocation_size: u64,
    memory_type_index: u32,
}

/// Create an image, allocate memory with `required` flags for it, bind, and
/// create a view over `aspect`.
///
/// Malformed descriptors are rejected before the backend is called. Every
/// handle created before a failing step is released, image before memory,
/// before the error is returned.
fn create_bound_image<B: Backend>(
    backend: &B,
    properties: &MemoryProperties,
    descriptor: &ImageDescriptor,
    aspect: ImageAspect,
    required: MemoryPropertyFlags,
) -> Result<BoundImage<B>, UploadError> {
    descriptor.validate()?;
    if aspect.is_empty() {
        return Err(UploadError::InvalidParameter(
            "view aspect must not be empty".to_string(),
        ));
    }

    // Declared before the image guard so a failure releases the image first.
    let allocation;
    let image = Owned::new(backend, backend.create_image(descriptor)?, B::destroy_image);
    let requirements = backend.image_memory_requirements(image.get());
    allocation = memory::allocate(backend, properties, requirements, required)?;
    backend.bind_image_memory(image.get(), allocation.memory.get(), 0)?;

    let view_descriptor = ImageViewDescriptor {
        image: image.get(),
        format: descriptor.format,
        components: ComponentMapping::rgba(),
        subresource_range: SubresourceRange::single(aspect),
    };
    let view = backend.create_image_view(&view_descriptor)?;

    Ok(BoundImage {
        memory_type_index: allocation.memory_type_index,
        allocation_size: allocation.size,
        memory: allocation.memory.disarm(),
        image: image.disarm(),
        view,
        view_descriptor,
    })
}

/// Upload state of a [`DeviceImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageState {
    /// No upload has been recorded. The image is in the given layout.
    Writable(ImageLayout),
    /// An upload has been recorded and the image ends in
    /// [`ImageLayout::ShaderReadOnly`]. There is no way back.
    ReadOnly,
}

impl ImageState {
    /// Whether an upload can still be recorded.
    pub fn is_writable(&self) -> bool {
        matches!(self, Self::Writable(_))
    }

    /// Layout the image is in once all recorded commands have executed.
    pub fn layout(&self) -> ImageLayout {
        match self {
            Self::Writable(layout) => *layout,
            Self::ReadOnly => ImageLayout::ShaderReadOnly,
        }
    }
}

/// A 2D image in device-local memory together with a view over it.
///
/// The image, its memory, and its view share one lifecycle: they are created
/// together in [`DeviceImage::new`] and released together on drop (view,
/// then image, then memory).
///
/// Images created with [`TextureUsage::COPY_DST`] can receive exactly one
/// upload through [`DeviceImage::store`], which leaves them shader-readable.
/// Images the GPU writes itself (render targets, depth buffers) are created
/// without `COPY_DST` and never go through `store`.
pub struct DeviceImage<B: Backend> {
    backend: Arc<B>,
    descriptor: ImageDescriptor,
    image: B::Image,
    memory: B::Memory,
    view: B::ImageView,
    view_descriptor: ImageViewDescriptor<B::Image>,
    allocation_size: u64,
    memory_type_index: u32,
    state: ImageState,
}

impl<B: Backend> DeviceImage<B> {
    /// Create an image backed by `DEVICE_LOCAL` memory with a view over
    /// `aspect`.
    pub fn new(
        backend: Arc<B>,
        properties: &MemoryProperties,
        descriptor: &ImageDescriptor,
        aspect: ImageAspect,
    ) -> Result<Self, UploadError> {
        Self::with_memory_flags(
            backend,
            properties,
            descriptor,
            aspect,
            MemoryPropertyFlags::DEVICE_LOCAL,
        )
    }

    /// Create an image backed by memory that has every flag in `required`.
    pub fn with_memory_flags(
        backend: Arc<B>,
        properties: &MemoryProperties,
        descriptor: &ImageDescriptor,
        aspect: ImageAspect,
        required: MemoryPropertyFlags,
    ) -> Result<Self, UploadError> {
        let bound = create_bound_image(&*backend, properties, descriptor, aspect, required)?;
        log::debug!(
            "{}: created image '{}' ({}x{} {:?}, {} bytes from type {})",
            backend.name(),
            descriptor.label_or("image"),
            descriptor.size.width,
            descriptor.size.height,
            descriptor.format,
            bound.allocation_size,
            bound.memory_type_index
        );

        Ok(Self {
            backend,
            descriptor: descriptor.clone(),
            image: bound.image,
            memory: bound.memory,
            view: bound.view,
            view_descriptor: bound.view_descriptor,
            allocation_size: bound.allocation_size,
            memory_type_index: bound.memory_type_index,
            state: ImageState::Writable(descriptor.initial_layout),
        })
    }

    /// Record the upload of a tightly packed `width × height` region from
    /// `staging` into the image.
    ///
    /// Appends a barrier into `TransferDst`, the copy, and a barrier into
    /// `ShaderReadOnly` to `cmd`, in that order. Nothing executes until the
    /// caller submits `cmd`; the staging buffer must stay alive until then.
    ///
    /// Succeeds at most once per image. Later calls return
    /// [`UploadError::AlreadyUploaded`] and record nothing. Images whose view
    /// covers more than one aspect, such as depth and stencil together,
    /// cannot be uploaded.
    pub fn store(
        &mut self,
        cmd: &mut B::CommandBuffer,
        staging: B::Buffer,
        width: u32,
        height: u32,
    ) -> Result<(), UploadError> {
        let current_layout = match self.state {
            ImageState::Writable(layout) => layout,
            ImageState::ReadOnly => return Err(UploadError::AlreadyUploaded),
        };
        if !self.descriptor.usage.contains(TextureUsage::COPY_DST) {
            return Err(UploadError::NotUploadable(format!(
                "image '{}' was not created with COPY_DST usage",
                self.label()
            )));
        }
        let aspect = self.aspect();
        if aspect.bits().count_ones() != 1 {
            return Err(UploadError::NotUploadable(format!(
                "image '{}' view covers {aspect:?}, a copy can write only one aspect",
                self.label()
            )));
        }
        let extent = self.descriptor.size;
        if width == 0 || height == 0 || width > extent.width || height > extent.height {
            return Err(UploadError::InvalidParameter(format!(
                "upload region {width}x{height} does not fit image of {}x{}",
                extent.width, extent.height
            )));
        }

        log::trace!(
            "{}: recording {width}x{height} upload into '{}'",
            self.backend.name(),
            self.label()
        );

        let range = self.view_descriptor.subresource_range;
        self.backend.cmd_pipeline_barrier(
            cmd,
            PipelineStage::TOP_OF_PIPE,
            PipelineStage::TRANSFER,
            &ImageBarrier {
                image: self.image,
                src_access: AccessFlags::empty(),
                dst_access: AccessFlags::TRANSFER_WRITE,
                old_layout: current_layout,
                new_layout: ImageLayout::TransferDst,
                subresource_range: range,
            },
        );
        self.backend.cmd_copy_buffer_to_image(
            cmd,
            staging,
            self.image,
            ImageLayout::TransferDst,
            &BufferImageCopy::packed_2d(width, height, range.layers(0)),
        );
        self.backend.cmd_pipeline_barrier(
            cmd,
            PipelineStage::TRANSFER,
            PipelineStage::FRAGMENT_SHADER,
            &ImageBarrier {
                image: self.image,
                src_access: AccessFlags::TRANSFER_WRITE,
                dst_access: AccessFlags::empty(),
                old_layout: ImageLayout::TransferDst,
                new_layout: ImageLayout::ShaderReadOnly,
                subresource_range: range,
            },
        );

        self.state = ImageState::ReadOnly;
        Ok(())
    }

    /// Get the native image handle.
    pub fn raw(&self) -> B::Image {
        self.image
    }

    /// Get the view over the image.
    pub fn view(&self) -> B::ImageView {
        self.view
    }

    /// Get the backing memory handle.
    pub fn memory(&self) -> B::Memory {
        self.memory
    }

    /// Get the texel format.
    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    /// Get the image extent.
    pub fn extent(&self) -> Extent3d {
        self.descriptor.size
    }

    /// Get the aspect the view and uploads cover.
    pub fn aspect(&self) -> ImageAspect {
        self.view_descriptor.subresource_range.aspect
    }

    /// Get the subresource range of the view. Always one mip level and one
    /// array layer, starting at zero.
    pub fn subresource_range(&self) -> SubresourceRange {
        self.view_descriptor.subresource_range
    }

    /// Get the descriptor the view was created from.
    pub fn view_descriptor(&self) -> &ImageViewDescriptor<B::Image> {
        &self.view_descriptor
    }

    /// Get the image descriptor.
    pub fn descriptor(&self) -> &ImageDescriptor {
        &self.descriptor
    }

    /// Get the upload state.
    pub fn state(&self) -> ImageState {
        self.state
    }

    /// Get the size of the backing allocation.
    pub fn allocation_size(&self) -> u64 {
        self.allocation_size
    }

    /// Get the index of the memory type the image was allocated from.
    pub fn memory_type_index(&self) -> u32 {
        self.memory_type_index
    }

    /// Get the backend that owns the image.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn label(&self) -> &str {
        self.descriptor.label_or("image")
    }
}

impl<B: Backend> Drop for DeviceImage<B> {
    fn drop(&mut self) {
        log::debug!(
            "{}: destroying image '{}'",
            self.backend.name(),
            self.label()
        );
        self.backend.destroy_image_view(self.view);
        self.backend.destroy_image(self.image);
        self.backend.free_memory(self.memory);
    }
}

impl<B: Backend> std::fmt::Debug for DeviceImage<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceImage")
            .field("image", &self.image)
            .field("view", &self.view)
            .field("memory", &self.memory)
            .field("size", &self.descriptor.size)
            .field("format", &self.descriptor.format)
            .field("state", &self.state)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

#[cfg(feature = "dummy")]
static_assertions::assert_impl_all!(DeviceImage<crate::backend::DummyBackend>: Send, Sync);

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::backend::{
        DummyBackend, DummyBackendConfig, DummyCommandBuffer, DummyHandle, FailurePoint,
        RecordedCommand,
    };
    use crate::types::{BufferDescriptor, BufferUsage};

    fn sampled(width: u32, height: u32) -> ImageDescriptor {
        ImageDescriptor::new_2d(
            width,
            height,
            TextureFormat::Rgba8Unorm,
            TextureUsage::COPY_DST | TextureUsage::TEXTURE_BINDING,
        )
    }

    fn create(
        backend: &Arc<DummyBackend>,
        descriptor: &ImageDescriptor,
    ) -> DeviceImage<DummyBackend> {
        let props = backend.memory_properties().clone();
        DeviceImage::new(backend.clone(), &props, descriptor, descriptor.format.default_aspect())
            .unwrap()
    }

    #[test]
    fn test_view_descriptor_is_cached() {
        let backend = Arc::new(DummyBackend::new());
        let image = create(&backend, &sampled(64, 32));

        let view = image.view_descriptor();
        assert_eq!(view.image, image.raw());
        assert_eq!(view.format, TextureFormat::Rgba8Unorm);
        assert_eq!(view.components, ComponentMapping::rgba());
        assert_eq!(image.aspect(), ImageAspect::COLOR);
        assert_eq!(image.state(), ImageState::Writable(ImageLayout::Preinitialized));
        assert_eq!(image.allocation_size(), 64 * 32 * 4);
    }

    #[test]
    fn test_store_records_barrier_copy_barrier() {
        let backend = Arc::new(DummyBackend::new());
        let mut image = create(&backend, &sampled(16, 16));
        let staging = backend
            .create_buffer(&BufferDescriptor::new(1024, BufferUsage::COPY_SRC))
            .unwrap();

        let mut cmd = DummyCommandBuffer::new();
        image.store(&mut cmd, staging, 16, 16).unwrap();

        let commands = cmd.commands();
        assert_eq!(commands.len(), 3);
        match &commands[1] {
            RecordedCommand::CopyBufferToImage {
                src,
                dst,
                dst_layout,
                region,
            } => {
                assert_eq!(*src, staging);
                assert_eq!(*dst, image.raw());
                assert_eq!(*dst_layout, ImageLayout::TransferDst);
                assert_eq!(region.buffer_row_length, 0);
                assert_eq!(region.buffer_image_height, 0);
                assert_eq!(region.image_extent, Extent3d::new(16, 16, 1));
            }
            other => panic!("expected a copy, got {other:?}"),
        }

        let barriers: Vec<_> = cmd.barriers().collect();
        assert_eq!(barriers[0].0, PipelineStage::TOP_OF_PIPE);
        assert_eq!(barriers[0].1, PipelineStage::TRANSFER);
        assert_eq!(barriers[0].2.dst_access, AccessFlags::TRANSFER_WRITE);
        assert_eq!(barriers[1].0, PipelineStage::TRANSFER);
        assert_eq!(barriers[1].1, PipelineStage::FRAGMENT_SHADER);
        assert_eq!(barriers[1].2.src_access, AccessFlags::TRANSFER_WRITE);
        assert_eq!(barriers[1].2.dst_access, AccessFlags::empty());
        assert_eq!(image.state(), ImageState::ReadOnly);
    }

    #[test]
    fn test_undefined_initial_layout_is_tracked() {
        let backend = Arc::new(DummyBackend::new());
        let desc = sampled(4, 4).with_initial_layout(ImageLayout::Undefined);
        let mut image = create(&backend, &desc);
        let staging = backend
            .create_buffer(&BufferDescriptor::new(64, BufferUsage::COPY_SRC))
            .unwrap();

        let mut cmd = DummyCommandBuffer::new();
        image.store(&mut cmd, staging, 4, 4).unwrap();
        let (_, _, first) = cmd.barriers().next().unwrap();
        assert_eq!(first.old_layout, ImageLayout::Undefined);
    }

    #[test]
    fn test_store_rejects_region_larger_than_image() {
        let backend = Arc::new(DummyBackend::new());
        let mut image = create(&backend, &sampled(8, 8));
        let staging = backend
            .create_buffer(&BufferDescriptor::new(1024, BufferUsage::COPY_SRC))
            .unwrap();

        let mut cmd = DummyCommandBuffer::new();
        let err = image.store(&mut cmd, staging, 9, 8).unwrap_err();
        assert!(matches!(err, UploadError::InvalidParameter(_)));
        assert!(cmd.is_empty());
        assert!(image.state().is_writable());
    }

    #[test]
    fn test_rejects_empty_aspect() {
        let backend = Arc::new(DummyBackend::new());
        let props = backend.memory_properties().clone();
        let err = DeviceImage::new(backend.clone(), &props, &sampled(4, 4), ImageAspect::empty())
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidParameter(_)));
        assert_eq!(backend.live_handle_count(), 0);
    }

    #[test]
    fn test_rejects_malformed_descriptor_before_backend() {
        let backend = Arc::new(DummyBackend::with_config(
            DummyBackendConfig::new().without_validation(),
        ));
        let props = backend.memory_properties().clone();

        let mut volume = sampled(4, 4);
        volume.size.depth = 4;
        let invalid = [
            sampled(0, 4),
            volume,
            ImageDescriptor::new_2d(4, 4, TextureFormat::Rgba8Unorm, TextureUsage::empty()),
            sampled(4, 4).with_initial_layout(ImageLayout::TransferDst),
        ];
        for desc in &invalid {
            let err = DeviceImage::new(backend.clone(), &props, desc, ImageAspect::COLOR)
                .unwrap_err();
            assert!(matches!(err, UploadError::InvalidParameter(_)), "{desc:?}");
        }
        assert_eq!(backend.live_handle_count(), 0);
        assert!(backend.released_handles().is_empty());
    }

    #[test]
    fn test_failed_view_releases_image_before_memory() {
        let backend = Arc::new(DummyBackend::with_config(
            DummyBackendConfig::new().fail_on(FailurePoint::CreateImageView),
        ));
        let props = backend.memory_properties().clone();

        let err = DeviceImage::new(backend.clone(), &props, &sampled(4, 4), ImageAspect::COLOR)
            .unwrap_err();
        assert!(matches!(err, UploadError::ResourceCreationFailed(_)));
        assert_eq!(backend.live_handle_count(), 0);
        let released = backend.released_handles();
        assert_eq!(released.len(), 2);
        assert!(matches!(released[0], DummyHandle::Image(_)));
        assert!(matches!(released[1], DummyHandle::Memory(_)));
    }

    #[test]
    fn test_store_rejects_combined_depth_stencil() {
        let backend = Arc::new(DummyBackend::new());
        let desc = ImageDescriptor::new_2d(
            8,
            8,
            TextureFormat::Depth24PlusStencil8,
            TextureUsage::COPY_DST | TextureUsage::RENDER_ATTACHMENT,
        );
        let mut image = create(&backend, &desc);
        assert_eq!(image.aspect(), ImageAspect::DEPTH | ImageAspect::STENCIL);
        let staging = backend
            .create_buffer(&BufferDescriptor::new(256, BufferUsage::COPY_SRC))
            .unwrap();

        let mut cmd = DummyCommandBuffer::new();
        let err = image.store(&mut cmd, staging, 8, 8).unwrap_err();
        assert!(matches!(err, UploadError::NotUploadable(_)));
        assert!(cmd.is_empty());
        assert!(image.state().is_writable());
    }

    #[test]
    fn test_drop_releases_view_image_memory() {
        let backend = Arc::new(DummyBackend::new());
        let image = create(&backend, &sampled(4, 4));
        let (view, raw, memory) = (image.view(), image.raw(), image.memory());

        drop(image);
        assert_eq!(
            backend.released_handles(),
            vec![
                DummyHandle::ImageView(view),
                DummyHandle::Image(raw),
                DummyHandle::Memory(memory),
            ]
        );
    }

    #[test]
    fn test_state_layout() {
        assert_eq!(
            ImageState::Writable(ImageLayout::Preinitialized).layout(),
            ImageLayout::Preinitialized
        );
        assert_eq!(ImageState::ReadOnly.layout(), ImageLayout::ShaderReadOnly);
        assert!(!ImageState::ReadOnly.is_writable());
    }
}

//! Image types and descriptors.

use bitflags::bitflags;

use crate::error::UploadError;

/// Texture format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TextureFormat {
    /// 8-bit red channel, unsigned normalized.
    R8Unorm,
    /// 8-bit RG channels, unsigned normalized.
    Rg8Unorm,
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit RGBA channels, sRGB.
    Rgba8UnormSrgb,
    /// 8-bit BGRA channels, unsigned normalized.
    Bgra8Unorm,
    /// 8-bit BGRA channels, sRGB.
    Bgra8UnormSrgb,
    /// 16-bit RGBA channels, float.
    Rgba16Float,
    /// 32-bit RGBA channels, float.
    Rgba32Float,
    /// 16-bit depth.
    Depth16Unorm,
    /// 32-bit depth, float.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
}

impl TextureFormat {
    /// Returns true if this is a depth or stencil format.
    pub fn is_depth_stencil(&self) -> bool {
        matches!(
            self,
            Self::Depth16Unorm | Self::Depth32Float | Self::Depth24PlusStencil8
        )
    }

    /// Returns true if this format has a stencil component.
    pub fn has_stencil(&self) -> bool {
        matches!(self, Self::Depth24PlusStencil8)
    }

    /// Returns the size in bytes per pixel.
    pub fn block_size(&self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::Rg8Unorm | Self::Depth16Unorm => 2,
            Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Bgra8UnormSrgb
            | Self::Depth32Float
            | Self::Depth24PlusStencil8 => 4,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }

    /// The aspect a view over this format normally covers.
    pub fn default_aspect(&self) -> ImageAspect {
        if self.has_stencil() {
            ImageAspect::DEPTH | ImageAspect::STENCIL
        } else if self.is_depth_stencil() {
            ImageAspect::DEPTH
        } else {
            ImageAspect::COLOR
        }
    }
}

bitflags! {
    /// Usage flags for images.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Image can be copied from.
        const COPY_SRC = 1 << 0;
        /// Image can be copied to.
        const COPY_DST = 1 << 1;
        /// Image can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Image can be used as a storage image.
        const STORAGE_BINDING = 1 << 3;
        /// Image can be used as a color or depth attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Which aspects of an image a view or copy touches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageAspect: u32 {
        /// Color aspect.
        const COLOR = 1 << 0;
        /// Depth aspect.
        const DEPTH = 1 << 1;
        /// Stencil aspect.
        const STENCIL = 1 << 2;
    }
}

impl Default for ImageAspect {
    fn default() -> Self {
        Self::COLOR
    }
}

/// Memory arrangement of image texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageTiling {
    /// Implementation-defined arrangement, optimal for device access.
    #[default]
    Optimal,
    /// Row-major arrangement.
    Linear,
}

/// Image layout states used by the upload path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageLayout {
    /// Contents undefined; nothing is preserved.
    Undefined,
    /// Contents were laid out by the host before first device use.
    #[default]
    Preinitialized,
    /// Optimal for transfer destination operations.
    TransferDst,
    /// Optimal for shader sampling.
    ShaderReadOnly,
    /// Optimal for depth/stencil attachment writes.
    DepthStencilAttachment,
    /// Optimal for color attachment writes.
    ColorAttachment,
    /// General layout (least optimal but most flexible).
    General,
}

/// Three-dimensional extent in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent3d {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth in texels.
    pub depth: u32,
}

impl Extent3d {
    /// Create a 3D extent.
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Create a 2D extent (depth 1).
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self::new(width, height, 1)
    }

    /// Returns true if any dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth == 0
    }
}

/// Descriptor for creating an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageDescriptor {
    /// Debug label for the image.
    pub label: Option<String>,
    /// Image extent. Only 2D images (depth 1) are supported.
    pub size: Extent3d,
    /// Texel format.
    pub format: TextureFormat,
    /// Usage flags.
    pub usage: TextureUsage,
    /// Texel arrangement.
    pub tiling: ImageTiling,
    /// Layout the image is created in.
    pub initial_layout: ImageLayout,
}

impl ImageDescriptor {
    /// Create a descriptor for a 2D image that will receive one CPU upload.
    ///
    /// The image starts in [`ImageLayout::Preinitialized`] with optimal tiling.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent3d::new_2d(width, height),
            format,
            usage,
            tiling: ImageTiling::Optimal,
            initial_layout: ImageLayout::Preinitialized,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the tiling.
    pub fn with_tiling(mut self, tiling: ImageTiling) -> Self {
        self.tiling = tiling;
        self
    }

    /// Set the initial layout.
    pub fn with_initial_layout(mut self, layout: ImageLayout) -> Self {
        self.initial_layout = layout;
        self
    }

    /// Check that the descriptor describes a single-layer 2D image that can
    /// be created in a defined starting layout.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.size.is_empty() || self.size.depth != 1 {
            return Err(UploadError::InvalidParameter(format!(
                "image extent {:?} is not a non-empty 2D extent",
                self.size
            )));
        }
        if self.usage.is_empty() {
            return Err(UploadError::InvalidParameter(
                "image needs at least one usage flag".to_string(),
            ));
        }
        if !matches!(
            self.initial_layout,
            ImageLayout::Undefined | ImageLayout::Preinitialized
        ) {
            return Err(UploadError::InvalidParameter(format!(
                "initial layout {:?} must be Undefined or Preinitialized",
                self.initial_layout
            )));
        }
        Ok(())
    }

    pub(crate) fn label_or(&self, fallback: &'static str) -> &str {
        self.label.as_deref().unwrap_or(fallback)
    }
}

/// Subset of an image (aspect, mip levels, array layers) an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubresourceRange {
    /// Aspects covered.
    pub aspect: ImageAspect,
    /// First mip level.
    pub base_mip_level: u32,
    /// Number of mip levels.
    pub level_count: u32,
    /// First array layer.
    pub base_array_layer: u32,
    /// Number of array layers.
    pub layer_count: u32,
}

impl SubresourceRange {
    /// The first mip level of the first array layer, for the given aspect.
    pub fn single(aspect: ImageAspect) -> Self {
        Self {
            aspect,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        }
    }

    /// The layers of a single mip level addressed by a copy command.
    pub fn layers(&self, mip_level: u32) -> ImageSubresourceLayers {
        ImageSubresourceLayers {
            aspect: self.aspect,
            mip_level,
            base_array_layer: self.base_array_layer,
            layer_count: self.layer_count,
        }
    }
}

/// Array layers of one mip level, as addressed by copy commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSubresourceLayers {
    /// Aspects covered.
    pub aspect: ImageAspect,
    /// Mip level.
    pub mip_level: u32,
    /// First array layer.
    pub base_array_layer: u32,
    /// Number of array layers.
    pub layer_count: u32,
}

/// Source of one component of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComponentSwizzle {
    /// The component maps to itself.
    #[default]
    Identity,
    /// Red channel.
    R,
    /// Green channel.
    G,
    /// Blue channel.
    B,
    /// Alpha channel.
    A,
}

/// Per-component remapping applied by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ComponentMapping {
    pub r: ComponentSwizzle,
    pub g: ComponentSwizzle,
    pub b: ComponentSwizzle,
    pub a: ComponentSwizzle,
}

impl ComponentMapping {
    /// Red to red, green to green, blue to blue, alpha to alpha.
    pub fn rgba() -> Self {
        Self {
            r: ComponentSwizzle::R,
            g: ComponentSwizzle::G,
            b: ComponentSwizzle::B,
            a: ComponentSwizzle::A,
        }
    }
}

/// Descriptor for a 2D view over an image.
///
/// Kept by the image wrapper after construction so the upload does not have
/// to re-derive the subresource parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageViewDescriptor<I> {
    /// The image the view looks at.
    pub image: I,
    /// Format the view interprets texels as.
    pub format: TextureFormat,
    /// Component remapping.
    pub components: ComponentMapping,
    /// Covered subresources.
    pub subresource_range: SubresourceRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_aspect() {
        assert_eq!(TextureFormat::Rgba8Unorm.default_aspect(), ImageAspect::COLOR);
        assert_eq!(TextureFormat::Depth32Float.default_aspect(), ImageAspect::DEPTH);
        assert_eq!(
            TextureFormat::Depth24PlusStencil8.default_aspect(),
            ImageAspect::DEPTH | ImageAspect::STENCIL
        );
    }

    #[test]
    fn test_single_subresource() {
        let range = SubresourceRange::single(ImageAspect::COLOR);
        assert_eq!(range.base_mip_level, 0);
        assert_eq!(range.level_count, 1);
        assert_eq!(range.base_array_layer, 0);
        assert_eq!(range.layer_count, 1);

        let layers = range.layers(0);
        assert_eq!(layers.mip_level, 0);
        assert_eq!(layers.layer_count, 1);
    }

    #[test]
    fn test_descriptor_defaults_to_preinitialized() {
        let desc = ImageDescriptor::new_2d(
            256,
            256,
            TextureFormat::Rgba8Unorm,
            TextureUsage::COPY_DST | TextureUsage::TEXTURE_BINDING,
        );
        assert_eq!(desc.initial_layout, ImageLayout::Preinitialized);
        assert_eq!(desc.tiling, ImageTiling::Optimal);
        assert_eq!(desc.size, Extent3d::new_2d(256, 256));
    }

    #[test]
    fn test_extent_empty() {
        assert!(Extent3d::new_2d(0, 4).is_empty());
        assert!(!Extent3d::new_2d(1, 1).is_empty());
    }

    #[test]
    fn test_validate_image_descriptor() {
        let desc = ImageDescriptor::new_2d(4, 4, TextureFormat::R8Unorm, TextureUsage::COPY_DST);
        assert!(desc.validate().is_ok());
        assert!(desc
            .clone()
            .with_initial_layout(ImageLayout::Undefined)
            .validate()
            .is_ok());

        let mut volume = desc.clone();
        volume.size.depth = 2;
        let invalid = [
            ImageDescriptor::new_2d(0, 4, TextureFormat::R8Unorm, TextureUsage::COPY_DST),
            ImageDescriptor::new_2d(4, 4, TextureFormat::R8Unorm, TextureUsage::empty()),
            desc.with_initial_layout(ImageLayout::ShaderReadOnly),
            volume,
        ];
        for descriptor in &invalid {
            assert!(
                matches!(descriptor.validate(), Err(UploadError::InvalidParameter(_))),
                "{descriptor:?} should be rejected"
            );
        }
    }
}

//! # Texture Upload
//!
//! Device-local GPU buffers and images filled from CPU-visible staging
//! buffers, over a narrow backend abstraction.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`DeviceBuffer`] - Linear buffer in device-local memory with a recorded copy upload
//! - [`DeviceImage`] - 2D image plus view with a one-shot, barrier-guarded upload
//! - [`HostBuffer`] - Host-visible staging buffer used as the copy source
//! - [`Backend`] - Trait the wrappers drive; Vulkan (ash) and Dummy (for testing)
//!
//! The wrappers only *record* commands. Creating, submitting, and waiting on
//! the command buffer stays with the caller, as does keeping the staging
//! buffer alive until the GPU has consumed it.
//!
//! ## Example
//!
//! ```ignore
//! use texture_upload::{DeviceImage, HostBuffer, ImageAspect, ImageDescriptor};
//!
//! let staging = HostBuffer::with_data(backend.clone(), &properties, &pixels)?;
//! let mut texture = DeviceImage::new(
//!     backend.clone(),
//!     &properties,
//!     &ImageDescriptor::new_2d(width, height, TextureFormat::Rgba8Unorm, usage),
//!     ImageAspect::COLOR,
//! )?;
//! texture.store(&mut cmd, staging.raw(), width, height)?;
//! // submit `cmd`, wait, then drop `staging`
//! ```

pub mod backend;
pub mod error;
pub mod resources;
pub mod types;

// Re-export main types for convenience
pub use backend::Backend;
#[cfg(feature = "dummy")]
pub use backend::{DummyBackend, DummyBackendConfig, DummyCommandBuffer};
#[cfg(feature = "vulkan-backend")]
pub use backend::VulkanDevice;
pub use error::UploadError;
pub use resources::{find_memory_type, DeviceBuffer, DeviceImage, HostBuffer, ImageState};
pub use types::{
    BufferDescriptor, BufferUsage, Extent3d, ImageAspect, ImageDescriptor, ImageLayout,
    ImageTiling, MemoryProperties, MemoryPropertyFlags, TextureFormat, TextureUsage,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the upload subsystem.
///
/// Only logs the version; there is no global state to set up.
pub fn init() {
    log::info!("texture-upload v{} initialized", VERSION);
}

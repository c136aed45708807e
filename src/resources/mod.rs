//! GPU resource wrappers.
//!
//! Each wrapper pairs a backend handle with the memory bound to it and
//! releases both on drop:
//!
//! - [`DeviceBuffer`]: device-local linear buffer filled by a recorded copy
//! - [`DeviceImage`]: device-local 2D image plus view, filled once through a
//!   barrier-guarded copy
//! - [`HostBuffer`]: host-visible staging buffer used as the copy source

mod buffer;
mod guard;
mod host_buffer;
mod image;
mod memory;

pub use buffer::DeviceBuffer;
pub use host_buffer::{HostBuffer, STAGING_MEMORY_FLAGS};
pub use image::{DeviceImage, ImageState};
pub use memory::find_memory_type;

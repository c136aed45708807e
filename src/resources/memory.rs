//! Memory type selection and allocation.

use crate::backend::Backend;
use crate::error::UploadError;
use crate::types::{MemoryProperties, MemoryPropertyFlags, MemoryRequirements};

use super::guard::Owned;

/// Pick the memory type for a resource.
///
/// Returns the lowest index whose bit is set in `type_bits` and whose flags
/// include every flag in `required`. There is no fallback to a type that
/// lacks a required flag.
pub fn find_memory_type(
    properties: &MemoryProperties,
    type_bits: u32,
    required: MemoryPropertyFlags,
) -> Result<u32, UploadError> {
    properties.memory_types[..properties.memory_type_count()]
        .iter()
        .enumerate()
        .find(|(i, ty)| type_bits & (1 << i) != 0 && ty.property_flags.contains(required))
        .map(|(i, _)| i as u32)
        .ok_or(UploadError::NoCompatibleMemoryType {
            type_bits,
            required,
        })
}

/// Memory allocated for one resource, still guarded until it is bound.
pub(crate) struct PendingAllocation<'a, B: Backend> {
    pub memory: Owned<'a, B, B::Memory>,
    pub memory_type_index: u32,
    pub size: u64,
}

/// Select a memory type for `requirements` and allocate its full size.
pub(crate) fn allocate<'a, B: Backend>(
    backend: &'a B,
    properties: &MemoryProperties,
    requirements: MemoryRequirements,
    required: MemoryPropertyFlags,
) -> Result<PendingAllocation<'a, B>, UploadError> {
    let memory_type_index =
        find_memory_type(properties, requirements.memory_type_bits, required)?;
    let memory = backend.allocate_memory(requirements.size, memory_type_index)?;

    Ok(PendingAllocation {
        memory: Owned::new(backend, memory, B::free_memory),
        memory_type_index,
        size: requirements.size,
    })
}

//! Memory property snapshot and requirement types.

use bitflags::bitflags;

/// Maximum number of memory types a device can advertise.
pub const MAX_MEMORY_TYPES: usize = 32;

bitflags! {
    /// Capability flags of a memory type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemoryPropertyFlags: u32 {
        /// GPU-resident memory, fastest for device access.
        const DEVICE_LOCAL = 1 << 0;
        /// Memory the host can map.
        const HOST_VISIBLE = 1 << 1;
        /// Host writes are visible to the device without explicit flushes.
        const HOST_COHERENT = 1 << 2;
        /// Host reads are cached.
        const HOST_CACHED = 1 << 3;
        /// Backing may be committed lazily; only usable for transient attachments.
        const LAZILY_ALLOCATED = 1 << 4;
    }
}

impl Default for MemoryPropertyFlags {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Flags of a memory heap.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemoryHeapFlags: u32 {
        /// The heap lives on the device.
        const DEVICE_LOCAL = 1 << 0;
    }
}

impl Default for MemoryHeapFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// A single memory type advertised by the physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryType {
    /// Capabilities of this type.
    pub property_flags: MemoryPropertyFlags,
    /// Heap this type allocates from.
    pub heap_index: u32,
}

impl MemoryType {
    /// Create a memory type.
    pub fn new(property_flags: MemoryPropertyFlags, heap_index: u32) -> Self {
        Self {
            property_flags,
            heap_index,
        }
    }
}

/// A memory heap advertised by the physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryHeap {
    /// Heap size in bytes.
    pub size: u64,
    /// Heap flags.
    pub flags: MemoryHeapFlags,
}

/// Read-only snapshot of the memory types and heaps on a physical device.
///
/// Consulted once per wrapper construction and never retained.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryProperties {
    /// Memory types, indexed by memory type index.
    pub memory_types: Vec<MemoryType>,
    /// Memory heaps, indexed by heap index.
    pub memory_heaps: Vec<MemoryHeap>,
}

impl MemoryProperties {
    /// Create a snapshot from explicit types and heaps.
    pub fn new(memory_types: Vec<MemoryType>, memory_heaps: Vec<MemoryHeap>) -> Self {
        Self {
            memory_types,
            memory_heaps,
        }
    }

    /// A typical discrete GPU: one device-local type and one host-visible,
    /// host-coherent type on separate heaps.
    pub fn discrete() -> Self {
        Self::new(
            vec![
                MemoryType::new(MemoryPropertyFlags::DEVICE_LOCAL, 0),
                MemoryType::new(
                    MemoryPropertyFlags::HOST_VISIBLE | MemoryPropertyFlags::HOST_COHERENT,
                    1,
                ),
            ],
            vec![
                MemoryHeap {
                    size: 8 << 30,
                    flags: MemoryHeapFlags::DEVICE_LOCAL,
                },
                MemoryHeap {
                    size: 16 << 30,
                    flags: MemoryHeapFlags::empty(),
                },
            ],
        )
    }

    /// A unified-memory device where every type is both device-local and host-visible.
    pub fn unified() -> Self {
        Self::new(
            vec![MemoryType::new(
                MemoryPropertyFlags::DEVICE_LOCAL
                    | MemoryPropertyFlags::HOST_VISIBLE
                    | MemoryPropertyFlags::HOST_COHERENT,
                0,
            )],
            vec![MemoryHeap {
                size: 16 << 30,
                flags: MemoryHeapFlags::DEVICE_LOCAL,
            }],
        )
    }

    /// Number of advertised memory types, capped at [`MAX_MEMORY_TYPES`].
    pub fn memory_type_count(&self) -> usize {
        self.memory_types.len().min(MAX_MEMORY_TYPES)
    }

    /// Flags of the memory type at `index`, if it exists.
    pub fn type_flags(&self, index: u32) -> Option<MemoryPropertyFlags> {
        self.memory_types
            .get(index as usize)
            .map(|ty| ty.property_flags)
    }
}

/// Memory requirements reported by the device for a buffer or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryRequirements {
    /// Allocation size in bytes; at least the resource's requested size.
    pub size: u64,
    /// Required alignment of the bind offset.
    pub alignment: u64,
    /// Memory types the resource may be bound to, one bit per type index.
    pub memory_type_bits: u32,
}

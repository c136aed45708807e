//! Common utilities for upload integration tests.
//!
//! Every test runs against the dummy backend, which records commands and can
//! replay them against its tracked memory on submit.

use std::sync::Arc;

use texture_upload::types::MemoryType;
use texture_upload::{
    DummyBackend, DummyBackendConfig, HostBuffer, MemoryProperties, MemoryPropertyFlags,
};

/// Initialize logging once for the whole test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Memory Layouts
// ============================================================================

/// Memory layouts the simulated device can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryLayout {
    /// Separate device-local and host-visible types, like a discrete GPU.
    Discrete,
    /// A single type that is both, like an integrated GPU.
    Unified,
    /// Host-visible memory only. Nothing is device-local.
    HostOnly,
}

impl MemoryLayout {
    pub fn properties(self) -> MemoryProperties {
        match self {
            MemoryLayout::Discrete => MemoryProperties::discrete(),
            MemoryLayout::Unified => MemoryProperties::unified(),
            MemoryLayout::HostOnly => MemoryProperties::new(
                vec![MemoryType::new(
                    MemoryPropertyFlags::HOST_VISIBLE | MemoryPropertyFlags::HOST_COHERENT,
                    0,
                )],
                Vec::new(),
            ),
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// A backend plus the memory properties snapshot it advertises.
pub struct TestContext {
    pub backend: Arc<DummyBackend>,
    pub properties: MemoryProperties,
}

impl TestContext {
    pub fn new(layout: MemoryLayout) -> Self {
        Self::with_config(DummyBackendConfig::new().with_memory_properties(layout.properties()))
    }

    pub fn with_config(config: DummyBackendConfig) -> Self {
        init_logging();
        let properties = config.memory_properties.clone();
        Self {
            backend: Arc::new(DummyBackend::with_config(config)),
            properties,
        }
    }

    /// Create a staging buffer holding `data`.
    pub fn staging(&self, data: &[u8]) -> HostBuffer<DummyBackend> {
        HostBuffer::with_data(self.backend.clone(), &self.properties, data)
            .expect("failed to create staging buffer")
    }
}

/// Generate an RGBA test pattern where every texel encodes its coordinates.
pub fn generate_test_pattern(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(x as u8);
            data.push(y as u8);
            data.push((x ^ y) as u8);
            data.push(255);
        }
    }
    data
}

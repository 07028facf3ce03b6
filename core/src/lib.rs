//! QDMA queue lifecycle core.
//!
//! Brings the two lower layers together: [`qdma_access`] talks to the
//! engine's context memory, [`qdma_resource`] decides which hardware queues
//! a function owns. This crate attaches a device and starts and stops queues
//! on behalf of one function.
//!
//! # Usage
//!
//! ```ignore
//! use qdma_core::{DeviceConfig, QdmaDevice, QueueConfig, QueueManager};
//! use qdma_resource::{GroupKey, QueueRegistry, QueueType};
//!
//! let device = QdmaDevice::attach(bar, delay, DeviceConfig::new().with_clear_on_attach(true))?;
//! let registry = QueueRegistry::default();
//! let group = registry.create_group(GroupKey::new(bus, bus), 0, device.attributes().num_qs as u32)?;
//! registry.create_function(group, 0)?;
//!
//! let queues = QueueManager::new(&device, &registry, group, 0)?;
//! queues.set_qmax(64, None)?;
//! queues.start(0, QueueType::H2c, &QueueConfig::streaming(ring_dma, 4))?;
//! ```

#![no_std]

extern crate alloc;

pub mod config;
pub mod device;
pub mod error;
pub mod queue;

pub use config::{DeviceConfig, QueueConfig};
pub use device::QdmaDevice;
pub use error::{QdmaError, Result};
pub use queue::{QueueManager, StartedQueue};

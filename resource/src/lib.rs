//! Queue range allocator for QDMA-family DMA engines.
//!
//! All physical and virtual functions of one board draw their queues from a
//! single hardware queue space. This crate hands out contiguous ranges of
//! that space and tracks how many queues each function currently runs.
//!
//! # Design
//!
//! - One [`QueueGroup`] per board, keyed by the PCI bus segment
//! - Per group, an ordered [`FreeList`] of unassigned ranges plus one entry
//!   per attached function
//! - A process-wide [`QueueRegistry`] owns every group behind one lock
//!
//! # Invariants
//!
//! After every operation the free ranges and the ranges held by functions
//! are pairwise disjoint and together cover the group exactly. A function's
//! range never changes while it has active queues.
//!
//! # Usage
//!
//! ```ignore
//! use qdma_resource::{GroupKey, QueueRegistry, RegistryConfig};
//!
//! let registry = QueueRegistry::new(RegistryConfig::default());
//! let group = registry.create_group(GroupKey::new(0x3b, 0x3b), 0, 2048)?;
//! registry.create_function(group, 0)?;
//! let qbase = registry.request_range(group, 0, 64, None)?;
//! ```

#![no_std]

extern crate alloc;

pub mod error;
pub mod group;
pub mod range;
pub mod registry;

pub use error::{ResourceError, Result};
pub use group::{FunctionEntry, GroupKey, QueueGroup, QueueType, RequestPolicy};
pub use range::{FreeList, QueueRange};
pub use registry::{GroupHandle, GroupInfo, QueueRegistry, RegistryConfig};

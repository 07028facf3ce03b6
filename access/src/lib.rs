//! Register-level access for QDMA-family PCIe DMA engines.
//!
//! Queue state lives in on-chip context memory that the host reaches only
//! through an indirect register window. This crate owns that conversation:
//! the window protocol, the per-generation packing of every context record,
//! and the discovery of which generation is on the other end.
//!
//! # Architecture
//!
//! 1. **Bit fields** - mask helpers and multi-word segments ([`bitfield`])
//! 2. **Context model** - records, layouts and the codec ([`context`])
//! 3. **Protocol engine** - locked data / mask / command sequences with a
//!    bounded busy poll ([`engine`])
//! 4. **Dispatch** - version decode, variant selection and the typed
//!    per-device API ([`version`], [`variant`], [`hw`])
//! 5. **Attributes** - capability discovery ([`attributes`])
//!
//! # Usage
//!
//! ```ignore
//! use qdma_access::{ContextOp, ContextSelector, PollConfig, QdmaAccess};
//!
//! let hw = QdmaAccess::probe(bar, delay, false, PollConfig::default())?;
//! hw.clear(ContextSelector::SoftwareH2c, qid)?;
//! hw.write_software(Direction::H2c, qid, &sw_ctx)?;
//! ```

#![no_std]

pub mod attributes;
pub mod bitfield;
pub mod context;
pub mod engine;
pub mod error;
pub mod hw;
pub mod platform;
pub mod regs;
pub mod variant;
pub mod version;

pub use attributes::{read_attributes, DescEngineMode, DeviceAttributes, DeviceCapabilities};
pub use context::codec::TriggerMode;
pub use context::records::{
    CompletionContext, ContextRecord, CreditContext, FunctionMap, HardwareContext,
    InterruptContext, PrefetchContext, SoftwareContext,
};
pub use context::{ContextImage, ContextOp, ContextSelector, Direction};
pub use engine::{IndirectEngine, PollConfig, Window};
pub use error::{AccessError, Result};
pub use hw::QdmaAccess;
pub use platform::{Delay, MmioRegisters, RegisterAccess};
pub use variant::HwVariant;
pub use version::{
    check_config_bar, decode_version, read_version, DeviceType, IpType, RtlVersion,
    VersionInfo, VivadoRelease,
};

//! Device and queue configuration.

use qdma_access::{PollConfig, TriggerMode};

/// Device attach configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Attach as a virtual function.
    pub is_vf: bool,
    /// Busy-poll timing for context commands.
    pub poll: PollConfig,
    /// Zero all queue contexts and function maps during attach.
    /// Only honoured on physical functions.
    pub clear_on_attach: bool,
}

impl DeviceConfig {
    pub const fn new() -> Self {
        Self {
            is_vf: false,
            poll: PollConfig::new(
                qdma_access::regs::poll::DEFAULT_INTERVAL_US,
                qdma_access::regs::poll::DEFAULT_TIMEOUT_US,
            ),
            clear_on_attach: false,
        }
    }

    /// Config for a virtual function.
    pub const fn for_vf() -> Self {
        Self {
            is_vf: true,
            ..Self::new()
        }
    }

    /// Set busy-poll timing.
    pub const fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Clear context memory during attach.
    pub const fn with_clear_on_attach(mut self, clear: bool) -> Self {
        self.clear_on_attach = clear;
        self
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-queue bring-up parameters.
///
/// Sizes are hardware index codes into the global ring-size, buffer-size,
/// timer and counter tables, not raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Owning function, recorded in the queue contexts.
    pub func_id: u16,
    /// Memory-mapped queue; streaming when false.
    pub is_mm: bool,
    /// Descriptor ring base address.
    pub ring_base: u64,
    /// Descriptor ring size index.
    pub ring_size_idx: u8,
    /// Descriptor size code (0 = 8B, 1 = 16B, 2 = 32B, 3 = 64B).
    pub desc_size: u8,
    /// Completion ring base address (C2H streaming and CMPT queues).
    pub cmpt_base: u64,
    /// Completion ring size index.
    pub cmpt_ring_size_idx: u8,
    /// Completion entry size code.
    pub cmpt_desc_size: u8,
    /// C2H buffer size index.
    pub buffer_size_idx: u8,
    pub trigger_mode: TriggerMode,
    pub counter_idx: u8,
    pub timer_idx: u8,
    /// MSI-X vector, or aggregation ring when `interrupt_aggregation` is set.
    pub vector: u16,
    pub interrupts: bool,
    pub interrupt_aggregation: bool,
    /// Descriptor bypass.
    pub desc_bypass: bool,
    /// Prefetch bypass (C2H streaming).
    pub prefetch_bypass: bool,
    /// Enable C2H prefetch.
    pub prefetch: bool,
    /// Fetch credits.
    pub fetch_credit: bool,
    /// Status descriptor writeback.
    pub writeback: bool,
    /// MM channel.
    pub mm_channel: u8,
    /// Port id.
    pub port_id: u8,
}

impl QueueConfig {
    pub const fn new() -> Self {
        Self {
            func_id: 0,
            is_mm: false,
            ring_base: 0,
            ring_size_idx: 0,
            desc_size: 0,
            cmpt_base: 0,
            cmpt_ring_size_idx: 0,
            cmpt_desc_size: 0,
            buffer_size_idx: 0,
            trigger_mode: TriggerMode::Every,
            counter_idx: 0,
            timer_idx: 0,
            vector: 0,
            interrupts: false,
            interrupt_aggregation: false,
            desc_bypass: false,
            prefetch_bypass: false,
            prefetch: false,
            fetch_credit: true,
            writeback: true,
            mm_channel: 0,
            port_id: 0,
        }
    }

    /// Streaming queue with a descriptor ring at `ring_base`.
    pub const fn streaming(ring_base: u64, ring_size_idx: u8) -> Self {
        Self {
            ring_base,
            ring_size_idx,
            ..Self::new()
        }
    }

    /// Memory-mapped queue with a descriptor ring at `ring_base`.
    pub const fn memory_mapped(ring_base: u64, ring_size_idx: u8) -> Self {
        Self {
            is_mm: true,
            ring_base,
            ring_size_idx,
            ..Self::new()
        }
    }

    /// Set the completion ring.
    pub const fn with_completion(mut self, base: u64, ring_size_idx: u8, desc_size: u8) -> Self {
        self.cmpt_base = base;
        self.cmpt_ring_size_idx = ring_size_idx;
        self.cmpt_desc_size = desc_size;
        self
    }

    /// Enable interrupts on `vector`.
    pub const fn with_vector(mut self, vector: u16, aggregation: bool) -> Self {
        self.interrupts = true;
        self.vector = vector;
        self.interrupt_aggregation = aggregation;
        self
    }

    pub const fn with_trigger(mut self, mode: TriggerMode, counter_idx: u8, timer_idx: u8) -> Self {
        self.trigger_mode = mode;
        self.counter_idx = counter_idx;
        self.timer_idx = timer_idx;
        self
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new()
    }
}

//! Queue lifecycle for one function.
//!
//! A [`QueueManager`] ties an attached device to the function's slot in the
//! queue allocator. Every started queue counts as active in the allocator,
//! which blocks qmax changes until the queue is stopped again.

use alloc::vec::Vec;

use spin::Mutex;

use qdma_access::{Delay, RegisterAccess};
use qdma_resource::{GroupHandle, QueueRange, QueueRegistry, QueueType, ResourceError};

use crate::config::QueueConfig;
use crate::device::QdmaDevice;
use crate::error::{QdmaError, Result};

/// A queue started through a [`QueueManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartedQueue {
    pub hw_qid: u16,
    pub qtype: QueueType,
    /// Memory mapped rather than streaming.
    pub is_mm: bool,
}

/// Table entry. A slot is taken before its contexts are programmed and
/// marked running once they are; `running == false` means starting or
/// stopping.
#[derive(Debug, Clone, Copy)]
struct Slot {
    queue: StartedQueue,
    running: bool,
}

impl Slot {
    fn is(&self, hw_qid: u16, qtype: QueueType) -> bool {
        self.queue.hw_qid == hw_qid && self.queue.qtype == qtype
    }
}

/// Queue lifecycle of one function on one device.
///
/// The queue table lock is never held while contexts are programmed.
pub struct QueueManager<'a, R, D> {
    device: &'a QdmaDevice<R, D>,
    registry: &'a QueueRegistry,
    group: GroupHandle,
    function_id: u16,
    slots: Mutex<Vec<Slot>>,
}

impl<'a, R: RegisterAccess, D: Delay> QueueManager<'a, R, D> {
    /// Bind `function_id` of `group` to `device`. The function must already
    /// exist in the registry.
    pub fn new(
        device: &'a QdmaDevice<R, D>,
        registry: &'a QueueRegistry,
        group: GroupHandle,
        function_id: u16,
    ) -> Result<Self> {
        registry.query_range(group, function_id)?;
        Ok(Self {
            device,
            registry,
            group,
            function_id,
            slots: Mutex::new(Vec::new()),
        })
    }

    pub fn function_id(&self) -> u16 {
        self.function_id
    }

    pub fn device(&self) -> &QdmaDevice<R, D> {
        self.device
    }

    /// Range currently assigned to the function.
    pub fn range(&self) -> Result<Option<QueueRange>> {
        Ok(self.registry.query_range(self.group, self.function_id)?)
    }

    /// Resize the function to `qmax` queues, at `qbase` if free, and point
    /// its function map at the result. Refused while queues are running.
    ///
    /// If the function map cannot be programmed the previous range is
    /// requested back, so allocator and hardware keep agreeing.
    pub fn set_qmax(&self, qmax: u32, qbase: Option<u32>) -> Result<Option<QueueRange>> {
        let previous = self.range()?;
        let range = self
            .registry
            .update_function(self.group, self.function_id, qmax, qbase)?;
        if let Err(e) = self.program_function_map(range) {
            self.restore_range(previous);
            return Err(e);
        }
        Ok(range)
    }

    fn program_function_map(&self, range: Option<QueueRange>) -> Result<()> {
        let (qbase, qmax) = match range {
            Some(r) => (
                u16::try_from(r.qbase).map_err(|_| QdmaError::QueueNotInRange)?,
                u16::try_from(r.count).map_err(|_| QdmaError::QueueNotInRange)?,
            ),
            None => (0, 0),
        };
        self.device.set_function_map(self.function_id, qbase, qmax)
    }

    fn restore_range(&self, previous: Option<QueueRange>) {
        let (count, hint) = match previous {
            Some(r) => (r.count, Some(r.qbase)),
            None => (0, None),
        };
        match self
            .registry
            .update_function(self.group, self.function_id, count, hint)
        {
            Ok(restored) if restored == previous => {}
            Ok(restored) => log::error!(
                "function {}: range {:?} not restored, now {:?}",
                self.function_id,
                previous,
                restored
            ),
            Err(e) => log::error!(
                "function {}: range {:?} not restored: {}",
                self.function_id,
                previous,
                e
            ),
        }
    }

    /// Start hardware queue `hw_qid`.
    ///
    /// The queue must lie in the function's range. It is counted as active
    /// before its contexts are programmed; a programming failure undoes the
    /// count.
    pub fn start(&self, hw_qid: u32, qtype: QueueType, cfg: &QueueConfig) -> Result<()> {
        let qid = self.check_range(hw_qid)?;
        {
            let mut slots = self.slots.lock();
            if slots.iter().any(|s| s.is(qid, qtype)) {
                return Err(QdmaError::QueueAlreadyStarted);
            }
            slots
                .try_reserve(1)
                .map_err(|_| ResourceError::OutOfMemory)?;
            slots.push(Slot {
                queue: StartedQueue {
                    hw_qid: qid,
                    qtype,
                    is_mm: cfg.is_mm,
                },
                running: false,
            });
        }

        let result = self.program(qid, qtype, cfg);
        let mut slots = self.slots.lock();
        if let Some(pos) = slots.iter().position(|s| s.is(qid, qtype)) {
            if result.is_ok() {
                slots[pos].running = true;
            } else {
                slots.swap_remove(pos);
            }
        }
        result
    }

    fn program(&self, qid: u16, qtype: QueueType, cfg: &QueueConfig) -> Result<()> {
        self.registry
            .increment_active(self.group, self.function_id, qtype)?;
        let cfg = QueueConfig {
            func_id: self.function_id,
            ..*cfg
        };
        let result = self.device.start_queue(qid, qtype, &cfg);
        if result.is_err() {
            self.release_active(qid, qtype);
        }
        result
    }

    /// Stop hardware queue `hw_qid`.
    ///
    /// The queue stops counting as active even if the context teardown
    /// fails; the error is still returned.
    pub fn stop(&self, hw_qid: u32, qtype: QueueType) -> Result<()> {
        let qid = u16::try_from(hw_qid).map_err(|_| QdmaError::QueueNotStarted)?;
        let queue = {
            let mut slots = self.slots.lock();
            let slot = slots
                .iter_mut()
                .find(|s| s.running && s.is(qid, qtype))
                .ok_or(QdmaError::QueueNotStarted)?;
            slot.running = false;
            slot.queue
        };

        let result = self.device.stop_queue(qid, qtype, queue.is_mm);
        self.release_active(qid, qtype);
        let mut slots = self.slots.lock();
        if let Some(pos) = slots.iter().position(|s| s.is(qid, qtype)) {
            slots.swap_remove(pos);
        }
        result
    }

    /// Drop one active count. Failures are logged so the caller's own
    /// result is the one reported.
    fn release_active(&self, qid: u16, qtype: QueueType) {
        if let Err(e) = self
            .registry
            .decrement_active(self.group, self.function_id, qtype)
        {
            log::error!(
                "function {}: queue {} {:?} active count not released: {}",
                self.function_id,
                qid,
                qtype,
                e
            );
        }
    }

    /// Stop every started queue. Returns the first error.
    pub fn stop_all(&self) -> Result<()> {
        let queues = self.started_queues();
        let mut first = Ok(());
        for q in queues {
            let result = self.stop(q.hw_qid as u32, q.qtype);
            if first.is_ok() {
                first = result;
            }
        }
        first
    }

    pub fn is_started(&self, hw_qid: u32, qtype: QueueType) -> bool {
        self.slots
            .lock()
            .iter()
            .any(|s| s.running && s.queue.hw_qid as u32 == hw_qid && s.queue.qtype == qtype)
    }

    /// Snapshot of the running queues.
    pub fn started_queues(&self) -> Vec<StartedQueue> {
        self.slots
            .lock()
            .iter()
            .filter(|s| s.running)
            .map(|s| s.queue)
            .collect()
    }

    fn check_range(&self, hw_qid: u32) -> Result<u16> {
        if !self.registry.contains(self.group, self.function_id, hw_qid) {
            log::warn!(
                "function {}: queue {} outside assigned range",
                self.function_id,
                hw_qid
            );
            return Err(QdmaError::QueueNotInRange);
        }
        u16::try_from(hw_qid).map_err(|_| QdmaError::QueueNotInRange)
    }
}

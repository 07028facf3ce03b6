//! Registry of queue groups.
//!
//! One registry is shared by every function driver on the host. All state
//! sits behind a single `spin::Mutex`; each public operation takes it once,
//! so operations are atomic with respect to each other.

use alloc::vec::Vec;

use spin::Mutex;

use crate::error::{ResourceError, Result};
use crate::group::{GroupKey, QueueGroup, QueueType, RequestPolicy};
use crate::range::QueueRange;

/// Registry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryConfig {
    pub policy: RequestPolicy,
}

impl RegistryConfig {
    pub const fn new(policy: RequestPolicy) -> Self {
        Self { policy }
    }
}

/// Handle to a group. Stays valid until the group is destroyed; later
/// operations on a stale handle fail with `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHandle {
    key: GroupKey,
    index: u32,
}

impl GroupHandle {
    pub fn key(&self) -> GroupKey {
        self.key
    }

    /// Device index assigned when the group was created.
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Summary of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupInfo {
    pub qbase: u32,
    pub total: u32,
    pub free: u32,
    pub active: u32,
    pub functions: usize,
}

struct State {
    groups: Vec<QueueGroup>,
    next_index: u32,
}

impl State {
    fn group(&self, handle: GroupHandle) -> Result<&QueueGroup> {
        self.groups
            .iter()
            .find(|g| g.index() == handle.index)
            .ok_or(ResourceError::NotFound)
    }

    fn group_mut(&mut self, handle: GroupHandle) -> Result<&mut QueueGroup> {
        self.groups
            .iter_mut()
            .find(|g| g.index() == handle.index)
            .ok_or(ResourceError::NotFound)
    }
}

/// Queue range allocator for all groups on the host.
pub struct QueueRegistry {
    config: RegistryConfig,
    state: Mutex<State>,
}

impl QueueRegistry {
    pub const fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State {
                groups: Vec::new(),
                next_index: 0,
            }),
        }
    }

    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Create the group for `key` spanning `[qbase, qbase + total)`.
    pub fn create_group(&self, key: GroupKey, qbase: u32, total: u32) -> Result<GroupHandle> {
        let mut state = self.state.lock();
        if state.groups.iter().any(|g| g.key() == key) {
            return Err(ResourceError::AlreadyExists);
        }
        let index = state.next_index;
        let group = QueueGroup::new(key, index, qbase, total)?;
        state
            .groups
            .try_reserve(1)
            .map_err(|_| ResourceError::OutOfMemory)?;
        state.groups.push(group);
        state.next_index += 1;
        log::info!(
            "queue group {} for bus {:#x}..{:#x}: {}",
            index,
            key.bus_start,
            key.bus_end,
            QueueRange::new(qbase, total)
        );
        Ok(GroupHandle { key, index })
    }

    /// Remove a group. Refused with `NotEmpty` while functions remain.
    pub fn destroy_group(&self, handle: GroupHandle) -> Result<()> {
        let mut state = self.state.lock();
        let pos = state
            .groups
            .iter()
            .position(|g| g.index() == handle.index)
            .ok_or(ResourceError::NotFound)?;
        if !state.groups[pos].functions().is_empty() {
            return Err(ResourceError::NotEmpty);
        }
        state.groups.remove(pos);
        log::debug!("queue group {} destroyed", handle.index);
        Ok(())
    }

    pub fn find_group(&self, key: GroupKey) -> Option<GroupHandle> {
        let state = self.state.lock();
        state
            .groups
            .iter()
            .find(|g| g.key() == key)
            .map(|g| GroupHandle {
                key,
                index: g.index(),
            })
    }

    pub fn group_info(&self, handle: GroupHandle) -> Result<GroupInfo> {
        let state = self.state.lock();
        let group = state.group(handle)?;
        Ok(GroupInfo {
            qbase: group.range().qbase,
            total: group.range().count,
            free: group.free().free_count(),
            active: group.active_count(),
            functions: group.functions().len(),
        })
    }

    /// Snapshot of the free list.
    pub fn free_ranges(&self, handle: GroupHandle) -> Result<Vec<QueueRange>> {
        let state = self.state.lock();
        let free = state.group(handle)?.free().as_slice();
        let mut out = Vec::new();
        out.try_reserve_exact(free.len())
            .map_err(|_| ResourceError::OutOfMemory)?;
        out.extend_from_slice(free);
        Ok(out)
    }

    /// Coverage and ordering check for the group.
    pub fn check_invariants(&self, handle: GroupHandle) -> Result<bool> {
        Ok(self.state.lock().group(handle)?.check_invariants())
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// Attach a function with no queues.
    pub fn create_function(&self, handle: GroupHandle, function_id: u16) -> Result<()> {
        self.mutate(handle, |g| g.create_function(function_id))
    }

    /// Return the function's range to the pool and detach it.
    ///
    /// Fails with [`ResourceError::QmaxChangeRejected`] while the function
    /// has active queues; nothing changes then.
    pub fn destroy_function(&self, handle: GroupHandle, function_id: u16) -> Result<()> {
        self.mutate(handle, |g| g.destroy_function(function_id))
    }

    /// Give the function `count` queues, at `hint` if that position is free.
    ///
    /// Any range the function holds is returned first. `count == 0` leaves
    /// it with nothing. Returns the new base, if any.
    pub fn request_range(
        &self,
        handle: GroupHandle,
        function_id: u16,
        count: u32,
        hint: Option<u32>,
    ) -> Result<Option<u32>> {
        let policy = self.config.policy;
        self.mutate(handle, |g| g.request_range(function_id, count, hint, policy))
            .map(|r| r.map(|r| r.qbase))
    }

    /// Device-level qmax update: like [`request_range`](Self::request_range),
    /// returning the range the function holds afterwards.
    pub fn update_function(
        &self,
        handle: GroupHandle,
        function_id: u16,
        qmax: u32,
        qbase: Option<u32>,
    ) -> Result<Option<QueueRange>> {
        let policy = self.config.policy;
        self.mutate(handle, |g| g.request_range(function_id, qmax, qbase, policy))
    }

    /// Range held by the function.
    pub fn query_range(&self, handle: GroupHandle, function_id: u16) -> Result<Option<QueueRange>> {
        let state = self.state.lock();
        Ok(state.group(handle)?.function(function_id)?.range)
    }

    /// True if `qid` falls inside the function's range.
    pub fn contains(&self, handle: GroupHandle, function_id: u16, qid: u32) -> bool {
        self.query_range(handle, function_id)
            .ok()
            .flatten()
            .map_or(false, |r| r.contains(qid))
    }

    // ========================================================================
    // Active queues
    // ========================================================================

    pub fn increment_active(
        &self,
        handle: GroupHandle,
        function_id: u16,
        qtype: QueueType,
    ) -> Result<()> {
        self.mutate(handle, |g| g.increment_active(function_id, qtype))
    }

    /// Saturates at zero.
    pub fn decrement_active(
        &self,
        handle: GroupHandle,
        function_id: u16,
        qtype: QueueType,
    ) -> Result<()> {
        self.mutate(handle, |g| g.decrement_active(function_id, qtype))
    }

    /// Active queues across the group.
    pub fn active_count(&self, handle: GroupHandle) -> Result<u32> {
        Ok(self.state.lock().group(handle)?.active_count())
    }

    /// Active queues of one function, all kinds.
    pub fn active_count_for_function(&self, handle: GroupHandle, function_id: u16) -> Result<u32> {
        let state = self.state.lock();
        Ok(state.group(handle)?.function(function_id)?.active_total())
    }

    /// Active queues of one function and kind.
    pub fn active_queues(
        &self,
        handle: GroupHandle,
        function_id: u16,
        qtype: QueueType,
    ) -> Result<u32> {
        let state = self.state.lock();
        Ok(state.group(handle)?.function(function_id)?.active(qtype))
    }

    fn mutate<T>(
        &self,
        handle: GroupHandle,
        f: impl FnOnce(&mut QueueGroup) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.lock();
        let group = state.group_mut(handle)?;
        let result = f(group);
        debug_assert!(group.check_invariants(), "queue group {} corrupted", handle.index);
        result
    }
}

impl Default for QueueRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

//! One queue group: the queue space of a board and the functions sharing it.

use alloc::vec::Vec;

use crate::error::{ResourceError, Result};
use crate::range::{FreeList, QueueRange};

/// Identifies a board by the PCI bus segment its functions live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub bus_start: u32,
    pub bus_end: u32,
}

impl GroupKey {
    pub const fn new(bus_start: u32, bus_end: u32) -> Self {
        Self { bus_start, bus_end }
    }
}

/// Queue kinds counted separately per function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueType {
    H2c,
    C2h,
    Cmpt,
}

impl QueueType {
    pub const ALL: [QueueType; 3] = [Self::H2c, Self::C2h, Self::Cmpt];

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::H2c => 0,
            Self::C2h => 1,
            Self::Cmpt => 2,
        }
    }
}

/// How `request_range` behaves when the new request cannot be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPolicy {
    /// Release the held range, search, and on failure try to take the old
    /// range back. If that fails the function is left with nothing.
    ReleaseFirst,
    /// Plan against a copy of the free list; on failure nothing changes.
    #[default]
    Transactional,
}

/// Per-function bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    pub function_id: u16,
    /// Assigned range, if any.
    pub range: Option<QueueRange>,
    active: [u32; 3],
}

impl FunctionEntry {
    fn new(function_id: u16) -> Self {
        Self {
            function_id,
            range: None,
            active: [0; 3],
        }
    }

    /// Active queues of one kind.
    pub fn active(&self, qtype: QueueType) -> u32 {
        self.active[qtype.index()]
    }

    /// Active queues of all kinds.
    pub fn active_total(&self) -> u32 {
        self.active.iter().sum()
    }

    /// Assigned queue count (0 if unassigned).
    pub fn count(&self) -> u32 {
        self.range.map_or(0, |r| r.count)
    }
}

/// Queue space of one board.
#[derive(Debug, Clone)]
pub struct QueueGroup {
    key: GroupKey,
    index: u32,
    whole: QueueRange,
    free: FreeList,
    functions: Vec<FunctionEntry>,
    active: u32,
}

impl QueueGroup {
    pub(crate) fn new(key: GroupKey, index: u32, qbase: u32, total: u32) -> Result<Self> {
        if total == 0 || qbase.checked_add(total).is_none() {
            return Err(ResourceError::InvalidParameter);
        }
        let whole = QueueRange::new(qbase, total);
        Ok(Self {
            key,
            index,
            whole,
            free: FreeList::with_range(whole)?,
            functions: Vec::new(),
            active: 0,
        })
    }

    pub fn key(&self) -> GroupKey {
        self.key
    }

    /// Device index assigned at creation.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Whole queue space of the group.
    pub fn range(&self) -> QueueRange {
        self.whole
    }

    pub fn free(&self) -> &FreeList {
        &self.free
    }

    pub fn functions(&self) -> &[FunctionEntry] {
        &self.functions
    }

    /// Active queues across all functions.
    pub fn active_count(&self) -> u32 {
        self.active
    }

    pub fn function(&self, function_id: u16) -> Result<&FunctionEntry> {
        self.functions
            .iter()
            .find(|f| f.function_id == function_id)
            .ok_or(ResourceError::NotFound)
    }

    fn function_mut(&mut self, function_id: u16) -> Result<&mut FunctionEntry> {
        self.functions
            .iter_mut()
            .find(|f| f.function_id == function_id)
            .ok_or(ResourceError::NotFound)
    }

    fn function_pos(&self, function_id: u16) -> Result<usize> {
        self.functions
            .iter()
            .position(|f| f.function_id == function_id)
            .ok_or(ResourceError::NotFound)
    }

    pub(crate) fn create_function(&mut self, function_id: u16) -> Result<()> {
        if self.function(function_id).is_ok() {
            return Err(ResourceError::AlreadyExists);
        }
        self.functions
            .try_reserve(1)
            .map_err(|_| ResourceError::OutOfMemory)?;
        self.functions.push(FunctionEntry::new(function_id));
        Ok(())
    }

    /// Detach the function and free its range. Refused while any of its
    /// queues is active.
    pub(crate) fn destroy_function(&mut self, function_id: u16) -> Result<()> {
        let pos = self.function_pos(function_id)?;
        let active = self.functions[pos].active_total();
        if active != 0 {
            log::warn!(
                "function {}: {} queues active, destroy rejected",
                function_id,
                active
            );
            return Err(ResourceError::QmaxChangeRejected);
        }
        if let Some(range) = self.functions[pos].range {
            self.free.insert(range)?;
        }
        self.functions.remove(pos);
        Ok(())
    }

    /// Reassign the function's range. Refused while any of its queues is active.
    pub(crate) fn request_range(
        &mut self,
        function_id: u16,
        count: u32,
        hint: Option<u32>,
        policy: RequestPolicy,
    ) -> Result<Option<QueueRange>> {
        let entry = self.function(function_id)?;
        if entry.active_total() != 0 {
            log::warn!(
                "function {}: {} queues active, qmax change rejected",
                function_id,
                entry.active_total()
            );
            return Err(ResourceError::QmaxChangeRejected);
        }
        let old = entry.range;

        match policy {
            RequestPolicy::Transactional => self.request_transactional(function_id, old, count, hint),
            RequestPolicy::ReleaseFirst => self.request_release_first(function_id, old, count, hint),
        }
    }

    fn request_transactional(
        &mut self,
        function_id: u16,
        old: Option<QueueRange>,
        count: u32,
        hint: Option<u32>,
    ) -> Result<Option<QueueRange>> {
        let mut plan = self.free.try_clone()?;
        if let Some(range) = old {
            plan.insert(range)?;
        }
        let new = if count == 0 {
            None
        } else {
            let want = plan.find(count, hint).ok_or_else(|| {
                log::debug!("function {}: no room for {} queues", function_id, count);
                ResourceError::NoQueuesLeft
            })?;
            plan.take(want)?;
            Some(want)
        };

        self.free = plan;
        self.function_mut(function_id)?.range = new;
        Ok(new)
    }

    fn request_release_first(
        &mut self,
        function_id: u16,
        old: Option<QueueRange>,
        count: u32,
        hint: Option<u32>,
    ) -> Result<Option<QueueRange>> {
        if let Some(range) = old {
            self.free.insert(range)?;
            self.function_mut(function_id)?.range = None;
        }
        if count == 0 {
            return Ok(None);
        }

        let found = self.free.find(count, hint);
        if let Some(want) = found {
            if self.free.take(want).is_ok() {
                self.function_mut(function_id)?.range = Some(want);
                return Ok(Some(want));
            }
        }

        if let Some(range) = old {
            if self.free.take(range).is_ok() {
                self.function_mut(function_id)?.range = Some(range);
            } else {
                log::warn!(
                    "function {}: could not restore {} after failed request",
                    function_id,
                    range
                );
            }
        }
        Err(ResourceError::NoQueuesLeft)
    }

    pub(crate) fn increment_active(&mut self, function_id: u16, qtype: QueueType) -> Result<()> {
        let entry = self.function_mut(function_id)?;
        let count = match entry.range {
            Some(range) => range.count,
            None => return Err(ResourceError::NotFound),
        };
        if entry.active_total() + 1 > count {
            return Err(ResourceError::NoQueuesLeft);
        }
        entry.active[qtype.index()] += 1;
        self.active += 1;
        Ok(())
    }

    pub(crate) fn decrement_active(&mut self, function_id: u16, qtype: QueueType) -> Result<()> {
        let entry = self.function_mut(function_id)?;
        let slot = &mut entry.active[qtype.index()];
        if *slot == 0 {
            return Ok(());
        }
        *slot -= 1;
        self.active = self.active.saturating_sub(1);
        Ok(())
    }

    /// Free list well formed, held and free ranges disjoint, inside the
    /// group, and together covering it exactly.
    pub fn check_invariants(&self) -> bool {
        if !self.free.is_well_formed() {
            return false;
        }
        let held = self.functions.iter().filter_map(|f| f.range);
        let all: Vec<QueueRange> = self
            .free
            .as_slice()
            .iter()
            .copied()
            .chain(held)
            .collect();

        if !all.iter().all(|r| r.count > 0 && self.whole.covers(r)) {
            return false;
        }
        for (i, a) in all.iter().enumerate() {
            if all[i + 1..].iter().any(|b| a.overlaps(b)) {
                return false;
            }
        }
        let covered: u64 = all.iter().map(|r| r.count as u64).sum();
        let active: u32 = self.functions.iter().map(FunctionEntry::active_total).sum();
        covered == self.whole.count as u64 && active == self.active
    }
}

//! Queue ranges and the ordered free list.
//!
//! # Invariants
//!
//! Between operations the free list is sorted by `qbase`, ranges do not
//! overlap, and no two ranges touch (`a.end() == b.qbase` is merged on
//! insertion). Allocation never produces zero-sized ranges.

use alloc::vec::Vec;
use core::fmt;

use crate::error::{ResourceError, Result};

/// Contiguous block of hardware queue ids `[qbase, qbase + count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueRange {
    pub qbase: u32,
    pub count: u32,
}

impl QueueRange {
    pub const fn new(qbase: u32, count: u32) -> Self {
        Self { qbase, count }
    }

    /// One past the last queue id.
    #[inline]
    pub const fn end(&self) -> u32 {
        self.qbase + self.count
    }

    #[inline]
    pub const fn contains(&self, qid: u32) -> bool {
        qid >= self.qbase && qid < self.end()
    }

    /// True if `other` lies entirely inside this range.
    #[inline]
    pub const fn covers(&self, other: &QueueRange) -> bool {
        other.qbase >= self.qbase && other.end() <= self.end()
    }

    #[inline]
    pub const fn overlaps(&self, other: &QueueRange) -> bool {
        self.qbase < other.end() && other.qbase < self.end()
    }
}

impl fmt::Display for QueueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.qbase, self.end())
    }
}

/// Free queue ranges of one group, ascending by `qbase`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeList {
    ranges: Vec<QueueRange>,
}

impl FreeList {
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Free list holding one range.
    pub fn with_range(range: QueueRange) -> Result<Self> {
        let mut list = Self::new();
        list.insert(range)?;
        Ok(list)
    }

    pub fn as_slice(&self) -> &[QueueRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total free queues.
    pub fn free_count(&self) -> u32 {
        self.ranges.iter().map(|r| r.count).sum()
    }

    /// Copy for trial allocation.
    pub fn try_clone(&self) -> Result<Self> {
        let mut ranges = Vec::new();
        ranges
            .try_reserve_exact(self.ranges.len() + 2)
            .map_err(|_| ResourceError::OutOfMemory)?;
        ranges.extend_from_slice(&self.ranges);
        Ok(Self { ranges })
    }

    /// Return `range` to the pool at its sorted position, then merge
    /// touching neighbours in one pass.
    pub fn insert(&mut self, range: QueueRange) -> Result<()> {
        if range.count == 0 {
            return Ok(());
        }
        self.ranges
            .try_reserve(1)
            .map_err(|_| ResourceError::OutOfMemory)?;
        let pos = self
            .ranges
            .iter()
            .position(|r| r.qbase > range.qbase)
            .unwrap_or(self.ranges.len());
        self.ranges.insert(pos, range);
        self.merge();
        Ok(())
    }

    fn merge(&mut self) {
        let mut merged: usize = 0;
        for i in 1..self.ranges.len() {
            let cur = self.ranges[i];
            let last = &mut self.ranges[merged];
            if last.end() == cur.qbase {
                last.count += cur.count;
            } else {
                merged += 1;
                self.ranges[merged] = cur;
            }
        }
        if !self.ranges.is_empty() {
            self.ranges.truncate(merged + 1);
        }
    }

    /// Index of the first range that fully holds `[qbase, qbase + count)`.
    pub fn find_containing(&self, qbase: u32, count: u32) -> Option<usize> {
        qbase.checked_add(count)?;
        let want = QueueRange::new(qbase, count);
        self.ranges.iter().position(|r| r.covers(&want))
    }

    /// Index of the smallest range with at least `count` queues. Among equal
    /// sizes the range with the highest `qbase` wins.
    pub fn best_fit(&self, count: u32) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, r) in self.ranges.iter().enumerate() {
            if r.count < count {
                continue;
            }
            match best {
                Some(b) if self.ranges[b].count < r.count => {}
                _ => best = Some(i),
            }
        }
        best
    }

    /// Pick a range for a request: the hinted position when some free range
    /// holds it, otherwise best fit.
    pub fn find(&self, count: u32, hint: Option<u32>) -> Option<QueueRange> {
        if let Some(qbase) = hint {
            if self.find_containing(qbase, count).is_some() {
                return Some(QueueRange::new(qbase, count));
            }
            log::debug!("qbase hint {} for {} queues not free, using best fit", qbase, count);
        }
        self.best_fit(count)
            .map(|i| QueueRange::new(self.ranges[i].qbase, count))
    }

    /// Remove `want` from the free range holding it, keeping any head and
    /// tail remainders in place.
    pub fn take(&mut self, want: QueueRange) -> Result<()> {
        let i = self
            .find_containing(want.qbase, want.count)
            .ok_or(ResourceError::NoQueuesLeft)?;
        let node = self.ranges[i];
        let head = QueueRange::new(node.qbase, want.qbase - node.qbase);
        let tail = QueueRange::new(want.end(), node.end() - want.end());

        match (head.count, tail.count) {
            (0, 0) => {
                self.ranges.remove(i);
            }
            (0, _) => self.ranges[i] = tail,
            (_, 0) => self.ranges[i] = head,
            _ => {
                self.ranges
                    .try_reserve(1)
                    .map_err(|_| ResourceError::OutOfMemory)?;
                self.ranges[i] = head;
                self.ranges.insert(i + 1, tail);
            }
        }
        Ok(())
    }

    /// Sorted, non-overlapping, non-touching, no empty ranges.
    pub fn is_well_formed(&self) -> bool {
        self.ranges.iter().all(|r| r.count > 0)
            && self.ranges.windows(2).all(|w| w[0].end() < w[1].qbase)
    }
}

//! Bit-field helpers for 32-bit register words.
//!
//! Every field in the register map is described by a contiguous mask. The
//! shift is the index of the mask's lowest set bit, so a field is written as
//! `(value << shift) & mask` and read back as `(word & mask) >> shift`.
//!
//! Fields wider than one register word (64-bit ring bases, split producer
//! indices, PASIDs) are described as several [`Segment`]s, each carrying a
//! slice of the logical value starting at `lsb`.

/// Mask with bits `lo..=hi` set.
#[inline]
pub const fn genmask(hi: u32, lo: u32) -> u32 {
    (u32::MAX >> (31 - hi)) & (u32::MAX << lo)
}

/// 64-bit mask with bits `lo..=hi` set.
#[inline]
pub const fn genmask_u64(hi: u32, lo: u32) -> u64 {
    (u64::MAX >> (63 - hi)) & (u64::MAX << lo)
}

/// Single-bit mask.
#[inline]
pub const fn bit(n: u32) -> u32 {
    1 << n
}

/// Shift of a field: position of the lowest set bit.
#[inline]
pub const fn mask_shift(mask: u32) -> u32 {
    mask.trailing_zeros()
}

/// Number of bits in a contiguous mask.
#[inline]
pub const fn mask_width(mask: u32) -> u32 {
    mask.count_ones()
}

/// Largest value a field of `width` bits can hold.
#[inline]
pub const fn width_max(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Check whether `value` fits the field described by `mask`.
#[inline]
pub const fn fits(mask: u32, value: u64) -> bool {
    value <= width_max(mask_width(mask))
}

/// Extract the field described by `mask` from `word`.
#[inline]
pub fn field_get(mask: u32, word: u32) -> u32 {
    if mask == 0 {
        return 0;
    }
    (word & mask) >> mask_shift(mask)
}

/// Place `value` into the field described by `mask`.
///
/// A value wider than the field is a caller bug; it trips a debug assertion
/// and is truncated in release builds.
#[inline]
pub fn field_set(mask: u32, value: u32) -> u32 {
    debug_assert!(mask != 0, "empty field mask");
    debug_assert!(
        fits(mask, value as u64),
        "value {:#x} overflows field mask {:#010x}",
        value,
        mask
    );
    if mask == 0 {
        return 0;
    }
    (value << mask_shift(mask)) & mask
}

/// Read-modify-write of one field inside `word`.
#[inline]
pub fn field_update(word: u32, mask: u32, value: u32) -> u32 {
    (word & !mask) | field_set(mask, value)
}

// ============================================================================
// Multi-word fields
// ============================================================================

/// One slice of a logical field, stored in a single register word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Index of the register word carrying this slice.
    pub word: u8,
    /// Field mask inside that word.
    pub mask: u32,
    /// Bit of the logical value that lands on the mask's lowest bit.
    pub lsb: u8,
}

impl Segment {
    /// Segment carrying bits `lsb..lsb + width(mask)` of the logical value.
    pub const fn new(word: u8, mask: u32, lsb: u8) -> Self {
        Self { word, mask, lsb }
    }

    /// Segment carrying the whole logical value (`lsb == 0`).
    pub const fn whole(word: u8, mask: u32) -> Self {
        Self::new(word, mask, 0)
    }

    /// Bits carried by this segment.
    #[inline]
    pub const fn width(&self) -> u32 {
        mask_width(self.mask)
    }

    /// Slice of `value` carried by this segment, right-aligned.
    #[inline]
    pub fn extract(&self, value: u64) -> u32 {
        let lsb = self.lsb as u32;
        if lsb >= 64 {
            return 0;
        }
        ((value >> lsb) & width_max(self.width())) as u32
    }

    /// Fold a right-aligned slice back into its position in the logical value.
    #[inline]
    pub fn inject(&self, value: u64, raw: u32) -> u64 {
        value | ((raw as u64) << self.lsb)
    }
}

/// Total width of a field spread over `segments`.
pub fn segments_width(segments: &[Segment]) -> u32 {
    segments.iter().map(Segment::width).sum()
}

/// Bits of the logical value that `segments` can carry.
///
/// Address fields start above bit 0 (4 KiB aligned ring bases), so this is
/// not simply `width_max(segments_width(..))`.
pub fn segments_coverage(segments: &[Segment]) -> u64 {
    segments.iter().fold(0u64, |acc, seg| {
        let lsb = seg.lsb as u32;
        if lsb >= 64 {
            acc
        } else {
            acc | (width_max(seg.width()) << lsb)
        }
    })
}

/// Scatter `value` into `words` according to `segments`.
///
/// Bits of `value` outside the segments' coverage are a caller bug; they
/// trip a debug assertion and are dropped in release builds.
pub fn scatter(words: &mut [u32], segments: &[Segment], value: u64) {
    debug_assert!(
        value & !segments_coverage(segments) == 0,
        "value {:#x} does not fit field coverage {:#x}",
        value,
        segments_coverage(segments)
    );
    for seg in segments {
        if let Some(word) = words.get_mut(seg.word as usize) {
            *word |= field_set(seg.mask, seg.extract(value));
        }
    }
}

/// Gather a logical value from `words` according to `segments`.
pub fn gather(words: &[u32], segments: &[Segment]) -> u64 {
    segments.iter().fold(0u64, |acc, seg| {
        let raw = words
            .get(seg.word as usize)
            .map(|w| field_get(seg.mask, *w))
            .unwrap_or(0);
        seg.inject(acc, raw)
    })
}

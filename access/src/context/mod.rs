//! Queue context model.
//!
//! Every queue's state lives in on-chip context memory, addressed by a
//! selector (which memory) and a queue id. The host never maps that memory;
//! it drives the indirect window instead (see [`crate::engine`]).
//!
//! # Design
//!
//! Records ([`records`]) are variant-independent Rust structs. Each hardware
//! generation packs them differently; the packing is data, not code: a
//! [`layout::RecordLayout`] lists, per logical field, the word/mask segments
//! that carry it. [`codec`] walks a layout to pack or unpack a record.

pub mod codec;
pub mod layout;
pub mod records;

use core::fmt;

use crate::bitfield::{field_get, field_set, fits, mask_width};
use crate::error::{AccessError, Result};
use crate::regs::ind::{cmd, MAX_WORDS};

/// Context memories reachable through the indirect window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContextSelector {
    /// Software descriptor context, C2H.
    SoftwareC2h = 0,
    /// Software descriptor context, H2C.
    SoftwareH2c = 1,
    /// Hardware descriptor context, C2H.
    HardwareC2h = 2,
    /// Hardware descriptor context, H2C.
    HardwareH2c = 3,
    /// Credit context, C2H.
    CreditC2h = 4,
    /// Credit context, H2C.
    CreditH2c = 5,
    /// Completion (writeback) context.
    Completion = 6,
    /// C2H prefetch context.
    Prefetch = 7,
    /// Interrupt aggregation ring context.
    InterruptAggregation = 8,
    /// PASID table, low half.
    PasidRamLow = 9,
    /// PASID table, high half.
    PasidRamHigh = 10,
    /// Completion timer context.
    Timer = 11,
    /// Function map (queue base / count per function).
    FunctionMap = 12,
}

impl ContextSelector {
    /// All selectors in code order.
    pub const ALL: [ContextSelector; 13] = [
        Self::SoftwareC2h,
        Self::SoftwareH2c,
        Self::HardwareC2h,
        Self::HardwareH2c,
        Self::CreditC2h,
        Self::CreditH2c,
        Self::Completion,
        Self::Prefetch,
        Self::InterruptAggregation,
        Self::PasidRamLow,
        Self::PasidRamHigh,
        Self::Timer,
        Self::FunctionMap,
    ];

    /// Hardware code carried in the command word.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Selector for a hardware code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Software context selector for `dir`.
    pub const fn software(dir: Direction) -> Self {
        match dir {
            Direction::C2h => Self::SoftwareC2h,
            Direction::H2c => Self::SoftwareH2c,
        }
    }

    /// Hardware context selector for `dir`.
    pub const fn hardware(dir: Direction) -> Self {
        match dir {
            Direction::C2h => Self::HardwareC2h,
            Direction::H2c => Self::HardwareH2c,
        }
    }

    /// Credit context selector for `dir`.
    pub const fn credit(dir: Direction) -> Self {
        match dir {
            Direction::C2h => Self::CreditC2h,
            Direction::H2c => Self::CreditH2c,
        }
    }
}

impl fmt::Display for ContextSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SoftwareC2h => "SW_C2H",
            Self::SoftwareH2c => "SW_H2C",
            Self::HardwareC2h => "HW_C2H",
            Self::HardwareH2c => "HW_H2C",
            Self::CreditC2h => "CR_C2H",
            Self::CreditH2c => "CR_H2C",
            Self::Completion => "CMPT",
            Self::Prefetch => "PFTCH",
            Self::InterruptAggregation => "INT_COAL",
            Self::PasidRamLow => "PASID_RAM_LOW",
            Self::PasidRamHigh => "PASID_RAM_HIGH",
            Self::Timer => "TIMER",
            Self::FunctionMap => "FMAP",
        };
        f.write_str(name)
    }
}

/// Indirect window operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContextOp {
    /// Zero the context.
    Clear = 0,
    /// Write data under mask.
    Write = 1,
    /// Read into the data registers.
    Read = 2,
    /// Drop any cached copy.
    Invalidate = 3,
}

impl ContextOp {
    /// Hardware code carried in the command word.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Operation for a hardware code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Clear),
            1 => Some(Self::Write),
            2 => Some(Self::Read),
            3 => Some(Self::Invalidate),
            _ => None,
        }
    }
}

/// Data direction of a descriptor queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host to card.
    H2c,
    /// Card to host.
    C2h,
}

// ============================================================================
// Command word
// ============================================================================

/// One indirect command: which context, which queue, what to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub selector: ContextSelector,
    pub op: ContextOp,
    pub qid: u16,
}

impl Command {
    pub const fn new(selector: ContextSelector, op: ContextOp, qid: u16) -> Self {
        Self { selector, op, qid }
    }

    /// Pack into a command word using `qid_mask` for the queue id field.
    /// The busy bit is set; hardware clears it when the command completes.
    ///
    /// Fails with `InvalidParameter` if `qid` is wider than the field.
    pub fn encode(&self, qid_mask: u32) -> Result<u32> {
        if !fits(qid_mask, self.qid as u64) {
            log::warn!(
                "qid {} exceeds {}-bit command field",
                self.qid,
                mask_width(qid_mask)
            );
            return Err(AccessError::InvalidParameter);
        }
        Ok(cmd::BUSY
            | field_set(cmd::SEL, self.selector.code() as u32)
            | field_set(cmd::OP, self.op.code() as u32)
            | field_set(qid_mask, self.qid as u32))
    }

    /// Unpack a command word. The busy bit is ignored.
    pub fn decode(word: u32, qid_mask: u32) -> Option<Self> {
        let selector = ContextSelector::from_code(field_get(cmd::SEL, word) as u8)?;
        let op = ContextOp::from_code(field_get(cmd::OP, word) as u8)?;
        Some(Self::new(selector, op, field_get(qid_mask, word) as u16))
    }
}

// ============================================================================
// Packed image
// ============================================================================

/// A packed context: up to [`MAX_WORDS`] data words, of which `len` are live.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ContextImage {
    words: [u32; MAX_WORDS],
    len: usize,
}

impl ContextImage {
    /// All-zero image of `len` words (clamped to [`MAX_WORDS`]).
    pub const fn zeroed(len: usize) -> Self {
        let len = if len > MAX_WORDS { MAX_WORDS } else { len };
        Self {
            words: [0; MAX_WORDS],
            len,
        }
    }

    /// Image holding a copy of `words`.
    pub fn from_words(words: &[u32]) -> Result<Self> {
        if words.len() > MAX_WORDS {
            return Err(AccessError::InvalidParameter);
        }
        let mut image = Self::zeroed(words.len());
        image.words[..words.len()].copy_from_slice(words);
        Ok(image)
    }

    /// Live words.
    #[inline]
    pub fn words(&self) -> &[u32] {
        &self.words[..self.len]
    }

    /// Live words, mutable.
    #[inline]
    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for ContextImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.words().iter().map(|w| Hex(*w)))
            .finish()
    }
}

struct Hex(u32);

impl fmt::Debug for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

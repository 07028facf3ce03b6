//! Register map shared by the supported DMA engine generations.
//!
//! Only the registers the queue-lifecycle core touches are listed: the
//! indirect context window, the configuration block identifier, the GLBL2
//! capability block and the direct function-map registers of the hard IP.
//!
//! # Reference
//! Register offsets are byte offsets into the configuration BAR.

use crate::bitfield::{bit, genmask};

/// Indirect context window.
pub mod ind {
    /// Maximum number of data (and mask) words in any window.
    pub const MAX_WORDS: usize = 8;

    /// Soft IP window (QDMA soft, EQDMA, Versal soft): 8 data + 8 mask + cmd.
    pub mod soft {
        /// First data word.
        pub const DATA: u32 = 0x804;
        /// First mask word.
        pub const MASK: u32 = 0x824;
        /// Command register.
        pub const CMD: u32 = 0x844;
        /// Data / mask words.
        pub const WORDS: usize = 8;
    }

    /// Hard IP window (CPM4, Versal hard): 4 data + 4 mask + cmd.
    pub mod hard {
        /// First data word.
        pub const DATA: u32 = 0x804;
        /// First mask word.
        pub const MASK: u32 = 0x814;
        /// Command register.
        pub const CMD: u32 = 0x824;
        /// Data / mask words.
        pub const WORDS: usize = 4;
    }

    /// Command register fields.
    pub mod cmd {
        use crate::bitfield::{bit, genmask};

        /// Command in flight.
        pub const BUSY: u32 = bit(0);
        /// Context selector.
        pub const SEL: u32 = genmask(4, 1);
        /// Operation.
        pub const OP: u32 = genmask(6, 5);
        /// Queue id, 11 bits.
        pub const QID: u32 = genmask(17, 7);
        /// Queue id on EQDMA, 13 bits.
        pub const QID_WIDE: u32 = genmask(19, 7);
    }
}

/// Configuration block identifier.
pub mod config {
    use super::*;

    /// PF identifier register.
    pub const BLOCK_ID: u32 = 0x0;
    /// VF identifier register (soft IP).
    pub const VF_BAR_ID: u32 = 0x1014;
    /// VF identifier register (EQDMA).
    pub const VF_BAR_ID_EQDMA: u32 = 0x5014;
    /// Identifier field.
    pub const BLOCK_ID_MASK: u32 = genmask(31, 16);
    /// Expected identifier.
    pub const MAGIC: u32 = 0x1fd3;
}

/// GLBL2 capability block.
pub mod glbl2 {
    use super::*;

    /// PF to BAR mapping, 6 bits per PF.
    pub const PF_BARLITE_INT: u32 = 0x104;
    /// BAR map of each PF.
    pub const PF_BAR_MAP: [u32; 4] = [
        genmask(5, 0),
        genmask(11, 6),
        genmask(17, 12),
        genmask(23, 18),
    ];

    /// Channel (engine) presence.
    pub const CHANNEL_MDMA: u32 = 0x118;
    /// ST C2H engine.
    pub const ST_C2H: u32 = bit(17);
    /// ST H2C engine.
    pub const ST_H2C: u32 = bit(16);
    /// MM C2H engine.
    pub const MM_C2H: u32 = bit(8);
    /// MM H2C engine.
    pub const MM_H2C: u32 = bit(0);

    /// Queue capacity.
    pub const CHANNEL_CAP: u32 = 0x120;
    /// Number of queues.
    pub const MULTQ_MAX: u32 = genmask(11, 0);

    /// Function number of the accessing function.
    pub const CHANNEL_FUNC_RET: u32 = 0x12C;

    /// Misc capabilities; upper half carries the PF version fields.
    pub const MISC_CAP: u32 = 0x134;
    /// Mailbox present.
    pub const MAILBOX_EN: u32 = bit(0);
    /// FLR present.
    pub const FLR_PRESENT: u32 = bit(1);
    /// MM completion present (soft IP only).
    pub const MM_CMPT_EN: u32 = bit(2);
    /// Descriptor engine mode (EQDMA only).
    pub const DESC_ENG_MODE: u32 = genmask(3, 2);
    /// Debug mode (EQDMA only).
    pub const DBG_MODE_EN: u32 = bit(4);
}

/// Version register fields.
pub mod version {
    /// PF version register (GLBL2 misc cap).
    pub const PF: u32 = super::glbl2::MISC_CAP;
    /// VF version register (soft IP).
    pub const VF: u32 = 0x1014;
    /// VF version register (EQDMA).
    pub const VF_EQDMA: u32 = 0x5014;

    /// PF view.
    pub mod pf {
        use crate::bitfield::genmask;

        /// Device family.
        pub const DEVICE_ID: u32 = genmask(31, 28);
        /// Tool release.
        pub const VIVADO_RELEASE: u32 = genmask(27, 24);
        /// IP type.
        pub const IP_TYPE: u32 = genmask(23, 20);
        /// RTL revision.
        pub const RTL_VERSION: u32 = genmask(19, 16);
    }

    /// VF view.
    pub mod vf {
        use crate::bitfield::genmask;

        /// Device family.
        pub const DEVICE_ID: u32 = genmask(15, 12);
        /// Tool release.
        pub const VIVADO_RELEASE: u32 = genmask(11, 8);
        /// IP type.
        pub const IP_TYPE: u32 = genmask(7, 4);
        /// RTL revision.
        pub const RTL_VERSION: u32 = genmask(3, 0);
    }
}

/// Direct function-map registers (Versal hard IP).
pub mod fmap {
    use super::*;

    /// First function's register.
    pub const BASE: u32 = 0x400;
    /// Stride between functions.
    pub const STEP: u32 = 4;
    /// Number of functions.
    pub const COUNT: u16 = 256;
    /// First queue of the function.
    pub const QID_BASE: u32 = genmask(10, 0);
    /// Queue count of the function.
    pub const QID_MAX: u32 = genmask(22, 11);

    /// Register offset for `func_id`.
    #[inline]
    pub const fn offset(func_id: u16) -> u32 {
        BASE + (func_id as u32) * STEP
    }
}

/// Poll defaults.
pub mod poll {
    /// Interval between busy polls.
    pub const DEFAULT_INTERVAL_US: u32 = 10;
    /// Give-up point for a busy poll.
    pub const DEFAULT_TIMEOUT_US: u32 = 500 * 1000;
}

//! Device attribute discovery.
//!
//! Read once at attach from the GLBL2 capability block and cached by the
//! caller. Per-generation constants fill in what the registers don't say.

use bitflags::bitflags;

use crate::bitfield::field_get;
use crate::platform::RegisterAccess;
use crate::regs::glbl2;
use crate::variant::HwVariant;

bitflags! {
    /// Boolean device capabilities.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceCapabilities: u32 {
        /// Streaming engines (H2C and C2H) present.
        const ST_EN = 1 << 0;
        /// Memory-mapped engines (H2C and C2H) present.
        const MM_EN = 1 << 1;
        /// Mailbox between PF and VFs.
        const MAILBOX_EN = 1 << 2;
        /// Function level reset.
        const FLR_PRESENT = 1 << 3;
        /// Completion rings on MM queues.
        const MM_CMPT_EN = 1 << 4;
        /// Completion overflow check can be disabled.
        const CMPT_OVF_CHK_DIS = 1 << 5;
        /// Mailbox interrupt.
        const MAILBOX_INTR = 1 << 6;
        /// 64-byte software descriptors.
        const SW_DESC_64B = 1 << 7;
        /// 64-byte completion descriptors.
        const CMPT_DESC_64B = 1 << 8;
        /// Dynamic BAR mapping.
        const DYNAMIC_BAR = 1 << 9;
        /// Legacy (INTx) interrupts.
        const LEGACY_INTR = 1 << 10;
        /// Combined count + timer completion trigger.
        const CMPT_TRIG_COUNT_TIMER = 1 << 11;
        /// Queue to vector mapping lives in a separate context.
        const QID2VEC_CTX = 1 << 12;
        /// Debug mode.
        const DEBUG_MODE = 1 << 13;
    }
}

/// Descriptor engine mode (EQDMA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DescEngineMode {
    /// Internal and bypass queues.
    #[default]
    InternalAndBypass,
    /// Bypass queues only.
    BypassOnly,
    /// Internal queues only.
    InternalOnly,
}

impl DescEngineMode {
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::InternalAndBypass),
            1 => Some(Self::BypassOnly),
            2 => Some(Self::InternalOnly),
            _ => None,
        }
    }
}

/// Cached device attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceAttributes {
    /// Physical functions with a BAR mapping.
    pub num_pfs: u8,
    /// Hardware queues.
    pub num_qs: u16,
    /// MM channels per direction.
    pub mm_channel_max: u8,
    pub desc_eng_mode: DescEngineMode,
    pub capabilities: DeviceCapabilities,
}

impl DeviceAttributes {
    #[inline]
    pub fn has(&self, cap: DeviceCapabilities) -> bool {
        self.capabilities.contains(cap)
    }

    pub fn st_en(&self) -> bool {
        self.has(DeviceCapabilities::ST_EN)
    }

    pub fn mm_en(&self) -> bool {
        self.has(DeviceCapabilities::MM_EN)
    }
}

/// Read the capability registers of a `variant` device.
pub fn read_attributes<R: RegisterAccess + ?Sized>(
    regs: &R,
    variant: HwVariant,
) -> DeviceAttributes {
    let bar_map = regs.read32(glbl2::PF_BARLITE_INT);
    let num_pfs = glbl2::PF_BAR_MAP
        .iter()
        .filter(|mask| field_get(**mask, bar_map) != 0)
        .count() as u8;

    let num_qs = field_get(glbl2::MULTQ_MAX, regs.read32(glbl2::CHANNEL_CAP)) as u16;

    let mut caps = DeviceCapabilities::empty();

    let misc = regs.read32(glbl2::MISC_CAP);
    caps.set(DeviceCapabilities::MAILBOX_EN, misc & glbl2::MAILBOX_EN != 0);
    caps.set(DeviceCapabilities::FLR_PRESENT, misc & glbl2::FLR_PRESENT != 0);
    // Bit 2 is MM completion on the soft IP but part of the engine mode on EQDMA.
    if matches!(variant, HwVariant::LegacySoft | HwVariant::VersalSoft) {
        caps.set(DeviceCapabilities::MM_CMPT_EN, misc & glbl2::MM_CMPT_EN != 0);
    }

    let mut desc_eng_mode = DescEngineMode::default();
    if variant == HwVariant::Eqdma {
        let code = field_get(glbl2::DESC_ENG_MODE, misc);
        desc_eng_mode = DescEngineMode::from_code(code).unwrap_or_else(|| {
            log::warn!("unknown descriptor engine mode {}", code);
            DescEngineMode::default()
        });
        caps.set(DeviceCapabilities::DEBUG_MODE, misc & glbl2::DBG_MODE_EN != 0);
    }

    let channels = regs.read32(glbl2::CHANNEL_MDMA);
    let st = glbl2::ST_C2H | glbl2::ST_H2C;
    let mm = glbl2::MM_C2H | glbl2::MM_H2C;
    caps.set(DeviceCapabilities::ST_EN, channels & st == st);
    caps.set(DeviceCapabilities::MM_EN, channels & mm == mm);

    let mm_channel_max = if variant.is_hard() {
        caps |= DeviceCapabilities::QID2VEC_CTX;
        2
    } else {
        caps |= DeviceCapabilities::CMPT_OVF_CHK_DIS
            | DeviceCapabilities::MAILBOX_INTR
            | DeviceCapabilities::SW_DESC_64B
            | DeviceCapabilities::CMPT_DESC_64B
            | DeviceCapabilities::DYNAMIC_BAR
            | DeviceCapabilities::LEGACY_INTR
            | DeviceCapabilities::CMPT_TRIG_COUNT_TIMER;
        1
    };

    DeviceAttributes {
        num_pfs,
        num_qs,
        mm_channel_max,
        desc_eng_mode,
        capabilities: caps,
    }
}

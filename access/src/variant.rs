//! Hardware generation dispatch.
//!
//! Chosen once from the decoded version register. Everything that differs
//! between generations (window geometry, queue id width, context layouts,
//! where the function map lives, supported selectors) hangs off
//! [`HwVariant`].

use core::fmt;

use crate::context::layout::{eqdma, hard, soft, VariantLayouts};
use crate::context::ContextSelector;
use crate::engine::Window;
use crate::error::{AccessError, Result};
use crate::version::{DeviceType, IpType, VersionInfo, VivadoRelease};

/// Supported DMA engine generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwVariant {
    /// QDMA soft IP.
    LegacySoft,
    /// EQDMA soft IP.
    Eqdma,
    /// CPM4 hard IP (Versal 2019.2).
    Cpm4,
    /// Versal hard IP, later releases.
    VersalHard,
    /// QDMA soft IP on Versal.
    VersalSoft,
}

impl HwVariant {
    /// Pick the generation for a decoded version register.
    pub fn select(info: &VersionInfo) -> Result<Self> {
        let variant = match (info.device_type, info.ip_type) {
            (Some(DeviceType::Soft), Some(IpType::QdmaSoft)) => Self::LegacySoft,
            (Some(DeviceType::Soft), Some(IpType::EqdmaSoft)) => Self::Eqdma,
            (Some(DeviceType::Versal), Some(IpType::VersalHard)) => match info.vivado_release {
                Some(VivadoRelease::V2019_2) => Self::Cpm4,
                Some(_) => Self::VersalHard,
                None => return Err(AccessError::UnsupportedVersion),
            },
            (Some(DeviceType::Versal), Some(IpType::VersalSoft)) => Self::VersalSoft,
            _ => {
                log::error!("unsupported version register {:#010x} ({})", info.raw, info);
                return Err(AccessError::UnsupportedVersion);
            }
        };
        Ok(variant)
    }

    /// Indirect window geometry.
    pub const fn window(self) -> Window {
        match self {
            Self::LegacySoft | Self::VersalSoft => Window::SOFT,
            Self::Eqdma => Window::EQDMA,
            Self::Cpm4 | Self::VersalHard => Window::HARD,
        }
    }

    /// Context layouts.
    pub fn layouts(self) -> &'static VariantLayouts {
        match self {
            Self::LegacySoft | Self::VersalSoft => &soft::LAYOUTS,
            Self::Eqdma => &eqdma::LAYOUTS,
            Self::Cpm4 | Self::VersalHard => &hard::LAYOUTS,
        }
    }

    /// True if `selector` is implemented by this generation.
    pub const fn supports(self, selector: ContextSelector) -> bool {
        match selector {
            ContextSelector::PasidRamLow | ContextSelector::PasidRamHigh | ContextSelector::Timer => {
                matches!(self, Self::Eqdma)
            }
            _ => true,
        }
    }

    /// Function map is a plain register rather than an indirect context.
    pub const fn direct_function_map(self) -> bool {
        matches!(self, Self::VersalHard)
    }

    /// Hard IP generation.
    pub const fn is_hard(self) -> bool {
        matches!(self, Self::Cpm4 | Self::VersalHard)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::LegacySoft => "QDMA soft",
            Self::Eqdma => "EQDMA soft",
            Self::Cpm4 => "CPM4 hard",
            Self::VersalHard => "Versal hard",
            Self::VersalSoft => "Versal soft",
        }
    }
}

impl fmt::Display for HwVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

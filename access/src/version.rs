//! Version register decode.
//!
//! PFs and VFs see the same four version fields at different bit positions
//! and offsets; see [`crate::regs::version`].

use core::fmt;

use crate::bitfield::field_get;
use crate::error::{AccessError, Result};
use crate::platform::RegisterAccess;
use crate::regs::{config, version};

/// Device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// FPGA soft IP.
    Soft,
    /// Versal ACAP.
    Versal,
}

/// IP flavour, interpreted relative to the device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpType {
    QdmaSoft,
    EqdmaSoft,
    VersalHard,
    VersalSoft,
}

/// Tool release the IP was generated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VivadoRelease {
    V2018_3,
    V2019_1,
    V2019_2,
    V2020_1,
    V2020_2,
}

/// RTL revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtlVersion {
    Base,
    Patch,
}

/// Decoded version register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub device_type: Option<DeviceType>,
    pub ip_type: Option<IpType>,
    pub vivado_release: Option<VivadoRelease>,
    pub rtl_version: RtlVersion,
    /// Register value the fields were decoded from.
    pub raw: u32,
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let device = match self.device_type {
            Some(DeviceType::Soft) => "Soft IP",
            Some(DeviceType::Versal) => "Versal",
            None => "unknown device",
        };
        let ip = match self.ip_type {
            Some(IpType::QdmaSoft) => "QDMA Soft IP",
            Some(IpType::EqdmaSoft) => "EQDMA Soft IP",
            Some(IpType::VersalHard) => "Versal Hard IP",
            Some(IpType::VersalSoft) => "Versal Soft IP",
            None => "unknown IP",
        };
        let release = match self.vivado_release {
            Some(VivadoRelease::V2018_3) => "2018.3",
            Some(VivadoRelease::V2019_1) => "2019.1",
            Some(VivadoRelease::V2019_2) => "2019.2",
            Some(VivadoRelease::V2020_1) => "2020.1",
            Some(VivadoRelease::V2020_2) => "2020.2",
            None => "unknown release",
        };
        let rtl = match self.rtl_version {
            RtlVersion::Base => "base",
            RtlVersion::Patch => "patch",
        };
        write!(f, "{} / {} / {} ({})", device, ip, release, rtl)
    }
}

/// Decode a raw version register value read from the PF or VF offset.
pub fn decode_version(is_vf: bool, raw: u32) -> VersionInfo {
    let (dev, rel, ip, rtl) = if is_vf {
        (
            field_get(version::vf::DEVICE_ID, raw),
            field_get(version::vf::VIVADO_RELEASE, raw),
            field_get(version::vf::IP_TYPE, raw),
            field_get(version::vf::RTL_VERSION, raw),
        )
    } else {
        (
            field_get(version::pf::DEVICE_ID, raw),
            field_get(version::pf::VIVADO_RELEASE, raw),
            field_get(version::pf::IP_TYPE, raw),
            field_get(version::pf::RTL_VERSION, raw),
        )
    };

    let device_type = match dev {
        0 => Some(DeviceType::Soft),
        1 => Some(DeviceType::Versal),
        _ => None,
    };

    let ip_type = match (device_type, ip) {
        (Some(DeviceType::Soft), 0) => Some(IpType::QdmaSoft),
        (Some(DeviceType::Soft), 1) => Some(IpType::EqdmaSoft),
        (Some(DeviceType::Versal), 0) => Some(IpType::VersalHard),
        (Some(DeviceType::Versal), 1) => Some(IpType::VersalSoft),
        _ => None,
    };

    let vivado_release = match (device_type, rel) {
        (Some(DeviceType::Soft), 0) => Some(VivadoRelease::V2018_3),
        (Some(DeviceType::Soft), 1) => Some(VivadoRelease::V2019_1),
        (Some(DeviceType::Soft), 2) => Some(VivadoRelease::V2019_2),
        (Some(DeviceType::Soft), 3) => Some(VivadoRelease::V2020_1),
        (Some(DeviceType::Soft), 4) => Some(VivadoRelease::V2020_2),
        (Some(DeviceType::Versal), 0) => Some(VivadoRelease::V2019_2),
        (Some(DeviceType::Versal), 1) => Some(VivadoRelease::V2020_1),
        (Some(DeviceType::Versal), 2) => Some(VivadoRelease::V2020_2),
        _ => None,
    };

    let rtl_version = if rtl == 1 {
        RtlVersion::Patch
    } else {
        RtlVersion::Base
    };

    VersionInfo {
        device_type,
        ip_type,
        vivado_release,
        rtl_version,
        raw,
    }
}

/// Read and decode the version register.
///
/// VFs of EQDMA parts expose the register at a different offset; if the
/// soft VF offset decodes to an unknown device the EQDMA offset is tried.
pub fn read_version<R: RegisterAccess + ?Sized>(regs: &R, is_vf: bool) -> VersionInfo {
    if !is_vf {
        return decode_version(false, regs.read32(version::PF));
    }
    let info = decode_version(true, regs.read32(version::VF));
    if info.device_type.is_some() {
        return info;
    }
    decode_version(true, regs.read32(version::VF_EQDMA))
}

/// Verify that `regs` is the configuration BAR.
pub fn check_config_bar<R: RegisterAccess + ?Sized>(regs: &R, is_vf: bool) -> Result<()> {
    let id = if is_vf {
        let id = field_get(config::BLOCK_ID_MASK, regs.read32(config::VF_BAR_ID));
        if id == config::MAGIC {
            id
        } else {
            field_get(config::BLOCK_ID_MASK, regs.read32(config::VF_BAR_ID_EQDMA))
        }
    } else {
        field_get(config::BLOCK_ID_MASK, regs.read32(config::BLOCK_ID))
    };

    if id != config::MAGIC {
        log::error!("config BAR identifier {:#06x}, expected {:#06x}", id, config::MAGIC);
        return Err(AccessError::InvalidConfigBar);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pf(dev: u32, rel: u32, ip: u32, rtl: u32) -> u32 {
        (dev << 28) | (rel << 24) | (ip << 20) | (rtl << 16)
    }

    #[test]
    fn test_decode_pf() {
        let info = decode_version(false, pf(0, 4, 1, 1));
        assert_eq!(info.device_type, Some(DeviceType::Soft));
        assert_eq!(info.ip_type, Some(IpType::EqdmaSoft));
        assert_eq!(info.vivado_release, Some(VivadoRelease::V2020_2));
        assert_eq!(info.rtl_version, RtlVersion::Patch);
    }

    #[test]
    fn test_decode_vf_fields() {
        // device 1, everything else 0
        let info = decode_version(true, 1 << 12);
        assert_eq!(info.device_type, Some(DeviceType::Versal));
        assert_eq!(info.ip_type, Some(IpType::VersalHard));
        assert_eq!(info.vivado_release, Some(VivadoRelease::V2019_2));
        assert_eq!(info.rtl_version, RtlVersion::Base);
    }

    #[test]
    fn test_release_depends_on_family() {
        // Release code 2 means 2019.2 on soft parts and 2020.2 on Versal.
        assert_eq!(
            decode_version(false, pf(0, 2, 0, 0)).vivado_release,
            Some(VivadoRelease::V2019_2)
        );
        assert_eq!(
            decode_version(false, pf(1, 2, 0, 0)).vivado_release,
            Some(VivadoRelease::V2020_2)
        );
        assert_eq!(decode_version(false, pf(1, 3, 0, 0)).vivado_release, None);
    }

    #[test]
    fn test_unknown_device() {
        let info = decode_version(false, pf(5, 0, 0, 0));
        assert_eq!(info.device_type, None);
        assert_eq!(info.ip_type, None);
        assert_eq!(info.vivado_release, None);
    }
}

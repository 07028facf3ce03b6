//! Error types for register access and context programming.

use core::fmt;

/// Result type for access-layer operations
pub type Result<T> = core::result::Result<T, AccessError>;

/// Errors raised while talking to the DMA engine's register space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// A caller-supplied value is out of range for the target field or register
    InvalidParameter,

    /// Busy bit of the indirect command register did not clear in time
    HwBusyTimeout,

    /// The mapped BAR does not carry the configuration block identifier
    InvalidConfigBar,

    /// Context selector not implemented by this hardware variant
    UnsupportedSelector,

    /// Version register decodes to a device / IP combination we cannot drive
    UnsupportedVersion,

    /// Feature absent on this hardware variant
    FeatureNotSupported,
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter => write!(f, "Invalid parameter"),
            Self::HwBusyTimeout => write!(f, "Indirect context command timed out"),
            Self::InvalidConfigBar => write!(f, "Configuration BAR identifier mismatch"),
            Self::UnsupportedSelector => write!(f, "Context selector not supported by hardware"),
            Self::UnsupportedVersion => write!(f, "Unsupported hardware version"),
            Self::FeatureNotSupported => write!(f, "Feature not supported by hardware"),
        }
    }
}

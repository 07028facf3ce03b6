//! Layout-driven packing of context records.

use crate::bitfield::{gather, scatter};
use crate::context::layout::RecordLayout;
use crate::context::records::{CompletionContext, ContextFields};
use crate::context::ContextImage;
use crate::error::{AccessError, Result};

/// Completion trigger modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerMode {
    Disabled = 0,
    Every = 1,
    UserCount = 2,
    User = 3,
    UserTimer = 4,
    UserTimerCount = 5,
}

impl TriggerMode {
    /// Highest valid hardware code.
    pub const MAX: u8 = Self::UserTimerCount as u8;

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Disabled),
            1 => Some(Self::Every),
            2 => Some(Self::UserCount),
            3 => Some(Self::User),
            4 => Some(Self::UserTimer),
            5 => Some(Self::UserTimerCount),
            _ => None,
        }
    }
}

/// Pack `record` into a fresh image of `layout.words` words.
///
/// Fields the layout does not carry are dropped.
pub fn encode<R>(layout: &RecordLayout<R::Field>, record: &R) -> ContextImage
where
    R: ContextFields,
{
    let mut image = ContextImage::zeroed(layout.words);
    for field in layout.fields {
        scatter(image.words_mut(), field.segments, record.get(field.field));
    }
    image
}

/// Unpack a record from `words`. Fields the layout does not carry read as zero.
pub fn decode<R>(layout: &RecordLayout<R::Field>, words: &[u32]) -> R
where
    R: ContextFields,
{
    let mut record = R::default();
    for field in layout.fields {
        record.set(field.field, gather(words, field.segments));
    }
    record
}

/// Reject completion contexts the engine would misinterpret.
pub fn validate_completion(ctx: &CompletionContext) -> Result<()> {
    if ctx.trig_mode > TriggerMode::MAX {
        log::error!("completion trigger mode {} out of range", ctx.trig_mode);
        return Err(AccessError::InvalidParameter);
    }
    Ok(())
}

/// [`encode`] for completion contexts, with [`validate_completion`] applied.
pub fn encode_completion(
    layout: &RecordLayout<<CompletionContext as ContextFields>::Field>,
    ctx: &CompletionContext,
) -> Result<ContextImage> {
    validate_completion(ctx)?;
    Ok(encode(layout, ctx))
}

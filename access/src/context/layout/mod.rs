//! Per-generation context layouts.
//!
//! A layout maps each logical field of a record onto one or more
//! [`Segment`]s of the packed image. Fields absent from a layout are not
//! implemented by that generation.
//!
//! | Layout  | Used by                 | Window words |
//! |---------|-------------------------|--------------|
//! | `soft`  | QDMA soft, Versal soft  | 8            |
//! | `eqdma` | EQDMA soft              | 8            |
//! | `hard`  | CPM4, Versal hard       | 4            |

pub mod eqdma;
pub mod hard;
pub mod soft;

use crate::bitfield::Segment;
use crate::context::records::{
    CmptField, CreditField, FmapField, HwField, IntrField, PrefetchField, SwField,
};

/// Where one logical field lives in the packed image.
#[derive(Debug, Clone, Copy)]
pub struct FieldLayout<F: 'static> {
    pub field: F,
    pub segments: &'static [Segment],
}

/// Packing of one record type.
#[derive(Debug, Clone, Copy)]
pub struct RecordLayout<F: 'static> {
    /// Number of data words the record occupies.
    pub words: usize,
    pub fields: &'static [FieldLayout<F>],
}

impl<F: Copy + PartialEq> RecordLayout<F> {
    /// Segments carrying `field`, if this generation implements it.
    pub fn segments(&self, field: F) -> Option<&'static [Segment]> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.segments)
    }

    /// True if this generation implements `field`.
    pub fn carries(&self, field: F) -> bool {
        self.segments(field).is_some()
    }
}

/// All record layouts of one generation.
#[derive(Debug)]
pub struct VariantLayouts {
    pub software: RecordLayout<SwField>,
    pub hardware: RecordLayout<HwField>,
    pub credit: RecordLayout<CreditField>,
    pub prefetch: RecordLayout<PrefetchField>,
    pub completion: RecordLayout<CmptField>,
    pub interrupt: RecordLayout<IntrField>,
    pub function_map: RecordLayout<FmapField>,
}

/// Build a [`RecordLayout`] from `Field => word[hi:lo] @ lsb, ...;` entries.
///
/// `@ lsb` gives the bit of the logical value the segment starts at and
/// defaults to 0.
macro_rules! record_layout {
    (
        $field:ident, $words:literal, {
            $(
                $variant:ident => $( $w:literal [ $hi:literal : $lo:literal ] $( @ $lsb:literal )? ),+ ;
            )+
        }
    ) => {
        $crate::context::layout::RecordLayout {
            words: $words,
            fields: &[
                $(
                    $crate::context::layout::FieldLayout {
                        field: $field::$variant,
                        segments: &[
                            $(
                                $crate::bitfield::Segment {
                                    word: $w,
                                    mask: $crate::bitfield::genmask($hi, $lo),
                                    lsb: record_layout!(@lsb $( $lsb )?),
                                },
                            )+
                        ],
                    },
                )+
            ],
        }
    };
    (@lsb) => { 0 };
    (@lsb $lsb:literal) => { $lsb };
}

pub(crate) use record_layout;

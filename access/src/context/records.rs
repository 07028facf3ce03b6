//! Variant-independent context records.
//!
//! A record carries the union of the fields known across hardware
//! generations. Fields a generation does not implement are dropped when
//! packing and read back as zero.
//!
//! Each record has a companion field enum (`SwField`, `CmptField`, ...)
//! naming its fields for the layout tables.

use core::fmt;

/// Conversion between a record field and the raw value stored in hardware.
pub trait FieldValue: Copy {
    fn to_raw(self) -> u64;
    fn from_raw(raw: u64) -> Self;
}

impl FieldValue for bool {
    #[inline]
    fn to_raw(self) -> u64 {
        self as u64
    }

    #[inline]
    fn from_raw(raw: u64) -> Self {
        raw != 0
    }
}

macro_rules! int_field_value {
    ($($t:ty),*) => {
        $(
            impl FieldValue for $t {
                #[inline]
                fn to_raw(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_raw(raw: u64) -> Self {
                    raw as $t
                }
            }
        )*
    };
}

int_field_value!(u8, u16, u32, u64);

/// Field-level access to a context record, used by the layout codec.
pub trait ContextFields: Copy + Default {
    /// Field identifier type.
    type Field: Copy + fmt::Debug + 'static;

    /// Raw value of `field`.
    fn get(&self, field: Self::Field) -> u64;

    /// Store a raw value into `field`, truncating to the field's Rust type.
    fn set(&mut self, field: Self::Field, raw: u64);
}

macro_rules! context_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident => $field:ident {
            $( $(#[$fmeta:meta])* $f:ident : $ty:ty => $variant:ident, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $f: $ty, )+
        }

        #[doc = concat!("Field identifiers of [`", stringify!($name), "`].")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $field {
            $( $variant, )+
        }

        impl ContextFields for $name {
            type Field = $field;

            fn get(&self, field: $field) -> u64 {
                match field {
                    $( $field::$variant => FieldValue::to_raw(self.$f), )+
                }
            }

            fn set(&mut self, field: $field, raw: u64) {
                match field {
                    $( $field::$variant => self.$f = FieldValue::from_raw(raw), )+
                }
            }
        }
    };
}

context_record! {
    /// Software descriptor context: ring geometry, mode bits and producer index.
    pub struct SoftwareContext => SwField {
        /// Producer index.
        pidx: u16 => Pidx,
        /// Arm interrupt on next descriptor completion.
        irq_arm: bool => IrqArm,
        /// Owning function.
        func_id: u16 => FuncId,
        /// Queue enable.
        qen: bool => Qen,
        /// Fetch credit enable.
        fcrd_en: bool => FcrdEn,
        /// Writeback / interrupt after pending check.
        wbi_chk: bool => WbiChk,
        /// Writeback / interrupt interval enable.
        wbi_intvl_en: bool => WbiIntvlEn,
        /// Address translation.
        at: bool => At,
        /// Max descriptor fetch.
        fetch_max: u8 => FetchMax,
        /// Ring size index.
        rngsz_idx: u8 => RngSz,
        /// Descriptor size code.
        desc_sz: u8 => DescSz,
        /// Bypass mode.
        bypass: bool => Bypass,
        /// MM channel.
        mm_chn: u8 => MmChn,
        /// Writeback enable.
        wbk_en: bool => WbkEn,
        /// Interrupt enable.
        irq_en: bool => IrqEn,
        /// Port id.
        port_id: u8 => PortId,
        /// No interrupt on last descriptor.
        irq_no_last: bool => IrqNoLast,
        /// Error status.
        err: u8 => Err,
        /// Error writeback sent.
        err_wb_sent: bool => ErrWbSent,
        /// Interrupt pending.
        irq_req: bool => IrqReq,
        /// Marker disable.
        mrkr_dis: bool => MrkrDis,
        /// Memory-mapped queue.
        is_mm: bool => IsMm,
        /// Descriptor ring base address.
        ring_bs_addr: u64 => RingBase,
        /// MSI-X vector or aggregation ring index.
        vec: u16 => Vec,
        /// Interrupt aggregation enable.
        intr_aggr: bool => IntrAggr,
        dis_intr_on_vf: bool => DisIntrOnVf,
        virtio_en: bool => VirtioEn,
        pack_byp_out: bool => PackBypOut,
        irq_byp: bool => IrqByp,
        host_id: u8 => HostId,
        pasid: u32 => Pasid,
        pasid_en: bool => PasidEn,
        virtio_dsc_base: u64 => VirtioDscBase,
    }
}

context_record! {
    /// Hardware descriptor context. Maintained by the engine; read-only to the host.
    pub struct HardwareContext => HwField {
        /// Consumer index.
        cidx: u16 => Cidx,
        /// Credits consumed.
        crd_use: u16 => CrdUse,
        /// Descriptors pending.
        dsc_pend: bool => DscPend,
        /// Queue idle (stopped).
        idl_stp_b: bool => IdlStpB,
        /// Event pending.
        evt_pnd: bool => EvtPend,
        /// Descriptor fetch pending.
        fetch_pnd: u8 => FetchPend,
    }
}

context_record! {
    /// Credit context. Read-only to the host.
    pub struct CreditContext => CreditField {
        /// Fetch credits.
        credit: u16 => Credit,
    }
}

context_record! {
    /// C2H prefetch context.
    pub struct PrefetchContext => PrefetchField {
        /// Prefetch bypass.
        bypass: bool => Bypass,
        /// Buffer size index.
        bufsz_idx: u8 => BufSizeIdx,
        /// Port id.
        port_id: u8 => PortId,
        var_desc: bool => VarDesc,
        virtio: bool => Virtio,
        num_pftch: u8 => NumPftch,
        pfch_need: u8 => PfchNeed,
        /// Error.
        err: bool => Err,
        /// Prefetch enable.
        pfch_en: bool => PfchEn,
        /// Queue is in prefetch.
        pfch: bool => Pfch,
        /// Software credit.
        sw_crdt: u16 => SwCrdt,
        /// Context valid.
        valid: bool => Valid,
    }
}

context_record! {
    /// Completion (writeback) ring context.
    pub struct CompletionContext => CmptField {
        /// Status descriptor enable.
        en_stat_desc: bool => EnStatDesc,
        /// Interrupt enable.
        en_int: bool => EnInt,
        /// Trigger mode, 0..=5.
        trig_mode: u8 => TrigMode,
        /// Owning function.
        fnc_id: u16 => FuncId,
        /// Counter threshold index.
        counter_idx: u8 => CounterIdx,
        /// Timer index.
        timer_idx: u8 => TimerIdx,
        /// Interrupt state.
        in_st: u8 => IntSt,
        /// Color bit.
        color: bool => Color,
        /// Ring size index.
        ringsz_idx: u8 => RingSzIdx,
        /// Ring base address.
        bs_addr: u64 => BaseAddr,
        /// Descriptor size code.
        desc_sz: u8 => DescSz,
        /// Producer index.
        pidx: u16 => Pidx,
        /// Consumer index.
        cidx: u16 => Cidx,
        /// Context valid.
        valid: bool => Valid,
        /// Error.
        err: u8 => Err,
        /// User trigger pending.
        user_trig_pend: bool => UserTrigPend,
        /// Timer running.
        timer_running: bool => TimerRunning,
        /// Full update.
        full_upd: bool => FullUpd,
        /// Overflow check disable.
        ovf_chk_dis: bool => OvfChkDis,
        /// Address translation.
        at: bool => At,
        /// MSI-X vector or aggregation ring index.
        vec: u16 => Vec,
        /// Interrupt aggregation enable.
        int_aggr: bool => IntAggr,
        dis_intr_on_vf: bool => DisIntrOnVf,
        vio: bool => Vio,
        dir_c2h: bool => DirC2h,
        host_id: u8 => HostId,
        pasid: u32 => Pasid,
        pasid_en: bool => PasidEn,
        vio_eop: bool => VioEop,
        sh_cmpt: bool => ShCmpt,
    }
}

context_record! {
    /// Interrupt aggregation ring context.
    pub struct InterruptContext => IntrField {
        /// Context valid.
        valid: bool => Valid,
        /// MSI-X vector.
        vec: u16 => Vec,
        /// Interrupt state.
        int_st: bool => IntSt,
        /// Color bit.
        color: bool => Color,
        /// Ring base address, 4 KiB aligned.
        baddr_4k: u64 => BaseAddr,
        /// Ring size in pages, encoded.
        page_size: u8 => PageSize,
        /// Producer index.
        pidx: u16 => Pidx,
        /// Address translation.
        at: bool => At,
        host_id: u8 => HostId,
        pasid: u32 => Pasid,
        pasid_en: bool => PasidEn,
        func_id: u16 => FuncId,
    }
}

context_record! {
    /// Function map entry: the queue range a function owns in hardware.
    pub struct FunctionMap => FmapField {
        /// First hardware queue.
        qbase: u16 => Qbase,
        /// Number of queues.
        qmax: u16 => Qmax,
    }
}

/// A record of any context type, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextRecord {
    Software(SoftwareContext),
    Hardware(HardwareContext),
    Credit(CreditContext),
    Prefetch(PrefetchContext),
    Completion(CompletionContext),
    Interrupt(InterruptContext),
    FunctionMap(FunctionMap),
}

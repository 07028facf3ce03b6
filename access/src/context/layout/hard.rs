//! Hard IP layouts (CPM4 and Versal hard).
//!
//! Four-word window. No interrupt vector in the software context (the hard
//! IP maps queues to vectors through a separate table) and a narrow
//! function map packed into a single word.

use super::{record_layout, VariantLayouts};
use crate::context::records::{
    CmptField, CreditField, FmapField, HwField, IntrField, PrefetchField, SwField,
};

pub static LAYOUTS: VariantLayouts = VariantLayouts {
    software: record_layout!(SwField, 4, {
        Pidx => 0[15:0];
        IrqArm => 0[16:16];
        Qen => 1[0:0];
        FcrdEn => 1[1:1];
        WbiChk => 1[2:2];
        WbiIntvlEn => 1[3:3];
        FuncId => 1[11:4];
        RngSz => 1[15:12];
        DescSz => 1[17:16];
        Bypass => 1[18:18];
        MmChn => 1[19:19];
        WbkEn => 1[20:20];
        IrqEn => 1[21:21];
        PortId => 1[24:22];
        IrqNoLast => 1[25:25];
        Err => 1[27:26];
        ErrWbSent => 1[28:28];
        IrqReq => 1[29:29];
        MrkrDis => 1[30:30];
        IsMm => 1[31:31];
        RingBase => 2[31:0], 3[31:0] @ 32;
    }),

    hardware: record_layout!(HwField, 2, {
        Cidx => 0[15:0];
        CrdUse => 0[31:16];
        DscPend => 1[8:8];
        IdlStpB => 1[9:9];
        FetchPend => 1[10:10];
    }),

    credit: record_layout!(CreditField, 1, {
        Credit => 0[15:0];
    }),

    prefetch: record_layout!(PrefetchField, 2, {
        Bypass => 0[0:0];
        BufSizeIdx => 0[4:1];
        PortId => 0[7:5];
        Err => 0[26:26];
        PfchEn => 0[27:27];
        Pfch => 0[28:28];
        SwCrdt => 0[31:29], 1[12:0] @ 3;
        Valid => 1[13:13];
    }),

    completion: record_layout!(CmptField, 4, {
        EnStatDesc => 0[0:0];
        EnInt => 0[1:1];
        TrigMode => 0[4:2];
        FuncId => 0[12:5];
        CounterIdx => 0[16:13];
        TimerIdx => 0[20:17];
        IntSt => 0[22:21];
        Color => 0[23:23];
        RingSzIdx => 0[27:24];
        BaseAddr => 0[31:28] @ 6, 1[31:0] @ 10, 2[21:0] @ 42;
        DescSz => 2[23:22];
        Pidx => 2[31:24], 3[7:0] @ 8;
        Cidx => 3[23:8];
        Valid => 3[24:24];
        Err => 3[26:25];
        UserTrigPend => 3[27:27];
        TimerRunning => 3[28:28];
        FullUpd => 3[29:29];
    }),

    interrupt: record_layout!(IntrField, 3, {
        Valid => 0[0:0];
        Vec => 0[5:1];
        IntSt => 0[7:7];
        Color => 0[8:8];
        BaseAddr => 0[31:9] @ 12, 1[28:0] @ 35;
        PageSize => 1[31:29];
        Pidx => 2[11:0];
    }),

    function_map: record_layout!(FmapField, 1, {
        Qbase => 0[10:0];
        Qmax => 0[22:11];
    }),
};

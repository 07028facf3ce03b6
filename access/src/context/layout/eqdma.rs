//! EQDMA soft IP layouts.
//!
//! Superset of the soft layout: 12-bit function ids, PASID and virtio
//! fields, and a completion ring base that keeps address bits 5:2.

use super::{record_layout, VariantLayouts};
use crate::context::records::{
    CmptField, CreditField, FmapField, HwField, IntrField, PrefetchField, SwField,
};

pub static LAYOUTS: VariantLayouts = VariantLayouts {
    software: record_layout!(SwField, 8, {
        Pidx => 0[15:0];
        IrqArm => 0[16:16];
        FuncId => 0[28:17];
        Qen => 1[0:0];
        FcrdEn => 1[1:1];
        WbiChk => 1[2:2];
        WbiIntvlEn => 1[3:3];
        At => 1[4:4];
        FetchMax => 1[8:5];
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
        Vec => 4[10:0];
        IntrAggr => 4[11:11];
        DisIntrOnVf => 4[12:12];
        VirtioEn => 4[13:13];
        PackBypOut => 4[14:14];
        IrqByp => 4[15:15];
        HostId => 4[19:16];
        Pasid => 4[31:20], 5[9:0] @ 12;
        PasidEn => 5[10:10];
        VirtioDscBase => 5[31:11], 6[31:0] @ 21, 7[10:0] @ 53;
    }),

    hardware: record_layout!(HwField, 2, {
        Cidx => 0[15:0];
        CrdUse => 0[31:16];
        DscPend => 1[8:8];
        IdlStpB => 1[9:9];
        EvtPend => 1[10:10];
        FetchPend => 1[14:11];
    }),

    credit: record_layout!(CreditField, 1, {
        Credit => 0[15:0];
    }),

    prefetch: record_layout!(PrefetchField, 2, {
        Bypass => 0[0:0];
        BufSizeIdx => 0[4:1];
        PortId => 0[7:5];
        VarDesc => 0[8:8];
        Virtio => 0[9:9];
        NumPftch => 0[15:10];
        PfchNeed => 0[21:16];
        Err => 0[26:26];
        PfchEn => 0[27:27];
        Pfch => 0[28:28];
        SwCrdt => 0[31:29], 1[12:0] @ 3;
        Valid => 1[13:13];
    }),

    completion: record_layout!(CmptField, 6, {
        EnStatDesc => 0[0:0];
        EnInt => 0[1:1];
        TrigMode => 0[4:2];
        FuncId => 0[16:5];
        CounterIdx => 0[20:17];
        TimerIdx => 0[24:21];
        IntSt => 0[26:25];
        Color => 0[27:27];
        RingSzIdx => 0[31:28];
        BaseAddr => 5[17:14] @ 2, 1[31:0] @ 6, 2[25:0] @ 38;
        DescSz => 2[27:26];
        Pidx => 2[31:28], 3[11:0] @ 4;
        Cidx => 3[27:12];
        Valid => 3[28:28];
        Err => 3[30:29];
        UserTrigPend => 3[31:31];
        TimerRunning => 4[0:0];
        FullUpd => 4[1:1];
        OvfChkDis => 4[2:2];
        At => 4[3:3];
        Vec => 4[14:4];
        IntAggr => 4[15:15];
        DisIntrOnVf => 4[16:16];
        Vio => 4[17:17];
        DirC2h => 4[18:18];
        HostId => 4[22:19];
        Pasid => 4[31:23], 5[12:0] @ 9;
        PasidEn => 5[13:13];
        VioEop => 5[18:18];
        ShCmpt => 5[19:19];
    }),

    interrupt: record_layout!(IntrField, 4, {
        Valid => 0[0:0];
        Vec => 0[11:1];
        IntSt => 0[13:13];
        Color => 0[14:14];
        BaseAddr => 0[31:15] @ 12, 1[31:0] @ 29, 2[2:0] @ 61;
        PageSize => 2[5:3];
        Pidx => 2[17:6];
        At => 2[18:18];
        HostId => 2[22:19];
        Pasid => 2[31:23], 3[12:0] @ 9;
        PasidEn => 3[13:13];
        FuncId => 3[29:18];
    }),

    function_map: record_layout!(FmapField, 2, {
        Qbase => 0[12:0];
        Qmax => 1[12:0];
    }),
};

//! Device attach and queue context programming tests

mod common;

use common::{no_delay, Flavor, NoDelay, SimDevice};
use qdma_access::regs::config;
use qdma_access::{
    AccessError, ContextOp, ContextSelector, Direction, FunctionMap, HwVariant, SoftwareContext,
    TriggerMode,
};
use qdma_core::{DeviceConfig, QdmaDevice, QdmaError, QueueConfig};
use qdma_resource::QueueType;

type Device = QdmaDevice<SimDevice, NoDelay>;

fn attach(sim: SimDevice, config: DeviceConfig) -> Device {
    QdmaDevice::attach(sim, no_delay as NoDelay, config).expect("attach")
}

fn soft(num_qs: u32) -> Device {
    attach(SimDevice::pf(Flavor::Soft, num_qs, true, true), DeviceConfig::new())
}

fn trace(dev: &Device) -> Vec<(ContextSelector, ContextOp)> {
    dev.access().engine().with_registers(|sim| sim.trace())
}

fn reset_trace(dev: &Device) {
    dev.access().engine().with_registers(|sim| sim.commands.clear());
}

#[test]
fn test_attach_reads_attributes() {
    let dev = soft(8);
    assert_eq!(dev.variant(), HwVariant::LegacySoft);
    assert_eq!(dev.attributes().num_qs, 8);
    assert_eq!(dev.attributes().num_pfs, 2);
    assert!(dev.attributes().st_en());
    assert!(dev.attributes().mm_en());
    assert!(trace(&dev).is_empty());
}

#[test]
fn test_attach_selects_hard_variant() {
    let dev = attach(SimDevice::pf(Flavor::VersalHard, 8, true, true), DeviceConfig::new());
    assert_eq!(dev.variant(), HwVariant::VersalHard);
    assert_eq!(dev.attributes().mm_channel_max, 2);
}

#[test]
fn test_attach_clears_context_memory() {
    let sim = SimDevice::pf(Flavor::Soft, 4, true, false);
    let dev = attach(sim, DeviceConfig::new().with_clear_on_attach(true));
    let ops = trace(&dev);
    assert_eq!(ops.len(), 4 * 8 + 2);
    assert!(ops.iter().all(|(_, op)| *op == ContextOp::Clear));

    let first: Vec<ContextSelector> = ops[..8].iter().map(|(sel, _)| *sel).collect();
    assert_eq!(
        first,
        [
            ContextSelector::SoftwareH2c,
            ContextSelector::HardwareH2c,
            ContextSelector::CreditH2c,
            ContextSelector::SoftwareC2h,
            ContextSelector::HardwareC2h,
            ContextSelector::CreditC2h,
            ContextSelector::Prefetch,
            ContextSelector::Completion,
        ]
    );
    let fmap_qids: Vec<u16> = dev.access().engine().with_registers(|sim| {
        sim.commands[32..].iter().map(|c| c.qid).collect()
    });
    assert_eq!(ops[32].0, ContextSelector::FunctionMap);
    assert_eq!(fmap_qids, [0, 1]);
}

#[test]
fn test_attach_clear_without_streaming() {
    let sim = SimDevice::pf(Flavor::Soft, 4, false, true);
    let dev = attach(sim, DeviceConfig::new().with_clear_on_attach(true));
    let ops = trace(&dev);
    assert_eq!(ops.len(), 4 * 6 + 2);
    assert!(!ops.iter().any(|(sel, _)| *sel == ContextSelector::Prefetch));
}

#[test]
fn test_vf_attach_skips_clear() {
    let dev = attach(
        SimDevice::soft_vf(),
        DeviceConfig::for_vf().with_clear_on_attach(true),
    );
    assert_eq!(dev.variant(), HwVariant::LegacySoft);
    assert!(trace(&dev).is_empty());
}

#[test]
fn test_attach_rejects_bad_bar() {
    let mut sim = SimDevice::pf(Flavor::Soft, 4, true, true);
    sim.regs.insert(config::BLOCK_ID, 0);
    let result = QdmaDevice::attach(sim, no_delay as NoDelay, DeviceConfig::new());
    assert!(matches!(
        result,
        Err(QdmaError::Access(AccessError::InvalidConfigBar))
    ));
}

#[test]
fn test_start_h2c() {
    let dev = soft(8);
    let cfg = QueueConfig {
        func_id: 1,
        ..QueueConfig::streaming(0x1000_0000, 3)
    };
    dev.start_queue(2, QueueType::H2c, &cfg).expect("start");
    assert_eq!(
        trace(&dev),
        [
            (ContextSelector::SoftwareH2c, ContextOp::Clear),
            (ContextSelector::HardwareH2c, ContextOp::Clear),
            (ContextSelector::CreditH2c, ContextOp::Clear),
            (ContextSelector::SoftwareH2c, ContextOp::Write),
        ]
    );

    let sw = dev.access().read_software(Direction::H2c, 2).expect("read");
    assert!(sw.qen);
    assert!(sw.fcrd_en);
    assert!(sw.wbk_en);
    assert!(!sw.is_mm);
    assert_eq!(sw.func_id, 1);
    assert_eq!(sw.rngsz_idx, 3);
    assert_eq!(sw.ring_bs_addr, 0x1000_0000);
}

#[test]
fn test_start_c2h_streaming() {
    let dev = soft(8);
    let mut cfg = QueueConfig::streaming(0x2000_0000, 2)
        .with_completion(0x3000_0000, 1, 0)
        .with_trigger(TriggerMode::UserTimer, 1, 2)
        .with_vector(5, false);
    cfg.buffer_size_idx = 4;
    cfg.prefetch = true;

    dev.start_queue(7, QueueType::C2h, &cfg).expect("start");
    assert_eq!(
        trace(&dev),
        [
            (ContextSelector::SoftwareC2h, ContextOp::Clear),
            (ContextSelector::HardwareC2h, ContextOp::Clear),
            (ContextSelector::CreditC2h, ContextOp::Clear),
            (ContextSelector::Prefetch, ContextOp::Clear),
            (ContextSelector::Completion, ContextOp::Clear),
            (ContextSelector::Completion, ContextOp::Write),
            (ContextSelector::Prefetch, ContextOp::Write),
            (ContextSelector::SoftwareC2h, ContextOp::Write),
        ]
    );

    let cmpt = dev.access().read_completion(7).expect("cmpt");
    assert!(cmpt.valid);
    assert!(cmpt.color);
    assert!(cmpt.en_int);
    assert_eq!(cmpt.bs_addr, 0x3000_0000);
    assert_eq!(cmpt.trig_mode, TriggerMode::UserTimer as u8);
    assert_eq!((cmpt.counter_idx, cmpt.timer_idx), (1, 2));
    assert_eq!(cmpt.vec, 5);
    assert_eq!(cmpt.ringsz_idx, 1);

    let pfch = dev.access().read_prefetch(7).expect("prefetch");
    assert!(pfch.valid);
    assert!(pfch.pfch_en);
    assert_eq!(pfch.bufsz_idx, 4);

    let sw = dev.access().read_software(Direction::C2h, 7).expect("sw");
    assert!(sw.irq_en);
    assert_eq!(sw.vec, 5);
}

#[test]
fn test_start_c2h_memory_mapped() {
    let dev = soft(8);
    dev.start_queue(1, QueueType::C2h, &QueueConfig::memory_mapped(0x4000, 0))
        .expect("start");
    let selectors: Vec<ContextSelector> = trace(&dev).iter().map(|(sel, _)| *sel).collect();
    assert_eq!(
        selectors,
        [
            ContextSelector::SoftwareC2h,
            ContextSelector::HardwareC2h,
            ContextSelector::CreditC2h,
            ContextSelector::SoftwareC2h,
        ]
    );
    let sw = dev.access().read_software(Direction::C2h, 1).expect("sw");
    assert!(sw.is_mm);
}

#[test]
fn test_start_completion_queue() {
    let dev = soft(8);
    let cfg = QueueConfig::new().with_completion(0x8000, 2, 1);
    dev.start_queue(3, QueueType::Cmpt, &cfg).expect("start");
    assert_eq!(
        trace(&dev),
        [
            (ContextSelector::Completion, ContextOp::Clear),
            (ContextSelector::Completion, ContextOp::Write),
        ]
    );
    let cmpt = dev.access().read_completion(3).expect("cmpt");
    assert_eq!(cmpt.bs_addr, 0x8000);
    assert_eq!(cmpt.desc_sz, 1);
}

#[test]
fn test_bad_config_touches_nothing() {
    let dev = soft(8);
    // completion ring must be 4 KiB aligned on the soft IP
    let cfg = QueueConfig::streaming(0x2000_0000, 2).with_completion(0x3000_0040, 1, 0);
    assert_eq!(
        dev.start_queue(7, QueueType::C2h, &cfg),
        Err(QdmaError::Access(AccessError::InvalidParameter))
    );
    let wide_vector = QueueConfig::streaming(0x1000, 0).with_vector(0x800, false);
    assert_eq!(
        dev.start_queue(0, QueueType::H2c, &wide_vector),
        Err(QdmaError::Access(AccessError::InvalidParameter))
    );
    assert!(trace(&dev).is_empty());
}

#[test]
fn test_stop_c2h_invalidates_then_clears() {
    let dev = soft(8);
    let cfg = QueueConfig::streaming(0x2000_0000, 2).with_completion(0x3000_0000, 1, 0);
    dev.start_queue(7, QueueType::C2h, &cfg).expect("start");
    reset_trace(&dev);

    dev.stop_queue(7, QueueType::C2h, false).expect("stop");
    let expected_selectors = [
        ContextSelector::SoftwareC2h,
        ContextSelector::HardwareC2h,
        ContextSelector::CreditC2h,
        ContextSelector::Prefetch,
        ContextSelector::Completion,
    ];
    let ops = trace(&dev);
    assert_eq!(ops.len(), 10);
    for (i, sel) in expected_selectors.iter().enumerate() {
        assert_eq!(ops[i], (*sel, ContextOp::Invalidate));
        assert_eq!(ops[5 + i], (*sel, ContextOp::Clear));
    }
    assert_eq!(
        dev.access().read_software(Direction::C2h, 7).expect("sw"),
        SoftwareContext::default()
    );
}

#[test]
fn test_stop_mm_c2h_keeps_completion_queue() {
    let dev = soft(8);
    dev.start_queue(3, QueueType::Cmpt, &QueueConfig::new().with_completion(0x8000, 0, 0))
        .expect("cmpt");
    dev.start_queue(3, QueueType::C2h, &QueueConfig::memory_mapped(0x4000, 0))
        .expect("mm c2h");
    reset_trace(&dev);

    dev.stop_queue(3, QueueType::C2h, true).expect("stop");
    let ops = trace(&dev);
    assert_eq!(ops.len(), 6);
    assert!(!ops.iter().any(|(sel, _)| *sel == ContextSelector::Completion));
    assert!(!ops.iter().any(|(sel, _)| *sel == ContextSelector::Prefetch));
    assert_eq!(dev.access().read_completion(3).expect("cmpt").bs_addr, 0x8000);
}

#[test]
fn test_stop_h2c() {
    let dev = soft(8);
    dev.stop_queue(0, QueueType::H2c, false).expect("stop");
    assert_eq!(trace(&dev).len(), 6);
}

#[test]
fn test_function_map_soft() {
    let dev = soft(8);
    dev.set_function_map(1, 16, 32).expect("fmap");
    assert_eq!(trace(&dev), [(ContextSelector::FunctionMap, ContextOp::Write)]);
    assert_eq!(
        dev.function_map(1).expect("read"),
        FunctionMap { qbase: 16, qmax: 32 }
    );
    assert_eq!(
        dev.set_function_map(0, 2048, 1),
        Err(QdmaError::Access(AccessError::InvalidParameter))
    );
}

#[test]
fn test_function_map_eqdma_wide() {
    let dev = attach(SimDevice::pf(Flavor::Eqdma, 8, true, true), DeviceConfig::new());
    assert_eq!(dev.variant(), HwVariant::Eqdma);
    dev.set_function_map(4, 4096, 4096).expect("fmap");
    assert_eq!(
        dev.function_map(4).expect("read"),
        FunctionMap { qbase: 4096, qmax: 4096 }
    );
}

#[test]
fn test_function_map_versal_direct() {
    let dev = attach(SimDevice::pf(Flavor::VersalHard, 8, true, true), DeviceConfig::new());
    dev.set_function_map(3, 100, 20).expect("fmap");
    assert!(trace(&dev).is_empty());
    let reg = dev.access().read_reg(0x400 + 4 * 3);
    assert_eq!(reg, 100 | (20 << 11));
    assert_eq!(
        dev.function_map(3).expect("read"),
        FunctionMap { qbase: 100, qmax: 20 }
    );
}

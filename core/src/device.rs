//! Attached device: variant, attributes and queue context programming.
//!
//! # Attach sequence
//!
//! 1. Check the configuration BAR identifier
//! 2. Decode the version register and select the hardware variant
//! 3. Read device attributes
//! 4. Optionally zero every queue context and function map
//!
//! # Queue bring-up
//!
//! | Queue         | Cleared                          | Written                     |
//! |---------------|----------------------------------|-----------------------------|
//! | H2C, C2H (MM) | SW, HW, credit                   | SW                          |
//! | C2H (ST)      | SW, HW, credit, prefetch, CMPT   | CMPT, prefetch, then SW     |
//! | CMPT          | CMPT                             | CMPT                        |
//!
//! The software context carries the queue enable bit, so it is written last.

use qdma_access::bitfield::segments_coverage;
use qdma_access::context::layout::RecordLayout;
use qdma_access::context::records::{CmptField, FmapField, SwField};
use qdma_access::{
    read_attributes, AccessError, CompletionContext, ContextSelector, Delay, DeviceAttributes,
    Direction, FunctionMap, HwVariant, PrefetchContext, QdmaAccess, RegisterAccess,
    SoftwareContext,
};
use qdma_resource::QueueType;

use crate::config::{DeviceConfig, QueueConfig};
use crate::error::Result;

/// One attached DMA engine function.
pub struct QdmaDevice<R, D> {
    access: QdmaAccess<R, D>,
    attributes: DeviceAttributes,
    config: DeviceConfig,
}

impl<R: RegisterAccess, D: Delay> QdmaDevice<R, D> {
    /// Identify the engine behind `regs` and prepare it for queue setup.
    pub fn attach(regs: R, delay: D, config: DeviceConfig) -> Result<Self> {
        let access = QdmaAccess::probe(regs, delay, config.is_vf, config.poll)?;
        let variant = access.variant();
        let attributes = access
            .engine()
            .with_registers(|regs| read_attributes(&*regs, variant));
        log::info!(
            "{}: {} PFs, {} queues, caps {:?}",
            variant,
            attributes.num_pfs,
            attributes.num_qs,
            attributes.capabilities
        );

        let device = Self {
            access,
            attributes,
            config,
        };
        if config.clear_on_attach {
            if config.is_vf {
                log::warn!("context memory clear skipped on virtual function");
            } else {
                device.init_context_memory()?;
            }
        }
        Ok(device)
    }

    pub fn variant(&self) -> HwVariant {
        self.access.variant()
    }

    pub fn attributes(&self) -> &DeviceAttributes {
        &self.attributes
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Context access for operations not covered here.
    pub fn access(&self) -> &QdmaAccess<R, D> {
        &self.access
    }

    /// Give back the register backend.
    pub fn into_registers(self) -> R {
        self.access.into_registers()
    }

    /// Zero the contexts of every queue, then the function map of every PF.
    pub fn init_context_memory(&self) -> Result<()> {
        let st = self.attributes.st_en();
        for qid in 0..self.attributes.num_qs {
            for dir in [Direction::H2c, Direction::C2h] {
                self.access.clear(ContextSelector::software(dir), qid)?;
                self.access.clear(ContextSelector::hardware(dir), qid)?;
                self.access.clear(ContextSelector::credit(dir), qid)?;
            }
            if st {
                self.access.clear(ContextSelector::Prefetch, qid)?;
                self.access.clear(ContextSelector::Completion, qid)?;
            }
        }
        for func_id in 0..self.attributes.num_pfs as u16 {
            self.access.clear(ContextSelector::FunctionMap, func_id)?;
        }
        log::debug!("context memory cleared for {} queues", self.attributes.num_qs);
        Ok(())
    }

    // ========================================================================
    // Function map
    // ========================================================================

    /// Point function `func_id` at hardware queues `[qbase, qbase + qmax)`.
    pub fn set_function_map(&self, func_id: u16, qbase: u16, qmax: u16) -> Result<()> {
        let layout = &self.access.layouts().function_map;
        check_fits(layout, FmapField::Qbase, qbase as u64)?;
        check_fits(layout, FmapField::Qmax, qmax as u64)?;
        self.access
            .write_function_map(func_id, &FunctionMap { qbase, qmax })?;
        log::debug!("fmap {}: qbase {} qmax {}", func_id, qbase, qmax);
        Ok(())
    }

    pub fn function_map(&self, func_id: u16) -> Result<FunctionMap> {
        Ok(self.access.read_function_map(func_id)?)
    }

    // ========================================================================
    // Queue contexts
    // ========================================================================

    /// Program the contexts of hardware queue `hw_qid`.
    ///
    /// On failure the queue is left partially programmed; a later
    /// [`stop_queue`](Self::stop_queue) or clear resets it.
    pub fn start_queue(&self, hw_qid: u16, qtype: QueueType, cfg: &QueueConfig) -> Result<()> {
        let result = self.program_queue(hw_qid, qtype, cfg);
        if let Err(e) = result {
            log::error!("queue {} {:?} start failed: {}", hw_qid, qtype, e);
        }
        result
    }

    fn program_queue(&self, hw_qid: u16, qtype: QueueType, cfg: &QueueConfig) -> Result<()> {
        let dir = match qtype {
            QueueType::H2c => Direction::H2c,
            QueueType::C2h => Direction::C2h,
            QueueType::Cmpt => {
                let cmpt = self.completion_context(cfg, false)?;
                self.access.clear(ContextSelector::Completion, hw_qid)?;
                self.access.write_completion(hw_qid, &cmpt)?;
                return Ok(());
            }
        };

        // Build everything first so a bad config touches no hardware.
        let sw = self.software_context(cfg)?;
        let st_c2h = if dir == Direction::C2h && !cfg.is_mm {
            Some((self.completion_context(cfg, true)?, prefetch_context(cfg)))
        } else {
            None
        };

        self.access.clear(ContextSelector::software(dir), hw_qid)?;
        self.access.clear(ContextSelector::hardware(dir), hw_qid)?;
        self.access.clear(ContextSelector::credit(dir), hw_qid)?;

        if let Some((cmpt, pfch)) = st_c2h {
            self.access.clear(ContextSelector::Prefetch, hw_qid)?;
            self.access.clear(ContextSelector::Completion, hw_qid)?;
            self.access.write_completion(hw_qid, &cmpt)?;
            self.access.write_prefetch(hw_qid, &pfch)?;
        }

        self.access.write_software(dir, hw_qid, &sw)?;
        log::debug!("queue {} {:?} started", hw_qid, qtype);
        Ok(())
    }

    /// Invalidate, then clear, the contexts of hardware queue `hw_qid`.
    ///
    /// `is_mm` must match the configuration the queue was started with: a
    /// streaming C2H queue also owns the prefetch and completion contexts,
    /// which a memory mapped one leaves to any CMPT queue on the same qid.
    pub fn stop_queue(&self, hw_qid: u16, qtype: QueueType, is_mm: bool) -> Result<()> {
        let mut selectors = [ContextSelector::Completion; 5];
        let n = match qtype {
            QueueType::Cmpt => 1,
            QueueType::H2c | QueueType::C2h => {
                let dir = if qtype == QueueType::H2c {
                    Direction::H2c
                } else {
                    Direction::C2h
                };
                selectors[0] = ContextSelector::software(dir);
                selectors[1] = ContextSelector::hardware(dir);
                selectors[2] = ContextSelector::credit(dir);
                if dir == Direction::C2h && !is_mm {
                    selectors[3] = ContextSelector::Prefetch;
                    selectors[4] = ContextSelector::Completion;
                    5
                } else {
                    3
                }
            }
        };

        for sel in &selectors[..n] {
            self.access.invalidate(*sel, hw_qid)?;
        }
        for sel in &selectors[..n] {
            self.access.clear(*sel, hw_qid)?;
        }
        log::debug!("queue {} {:?} stopped", hw_qid, qtype);
        Ok(())
    }

    fn software_context(&self, cfg: &QueueConfig) -> Result<SoftwareContext> {
        let layout = &self.access.layouts().software;
        check_fits(layout, SwField::RingBase, cfg.ring_base)?;
        check_fits(layout, SwField::Vec, cfg.vector as u64)?;
        check_fits(layout, SwField::FuncId, cfg.func_id as u64)?;
        Ok(SoftwareContext {
            irq_arm: cfg.interrupts,
            func_id: cfg.func_id,
            qen: true,
            fcrd_en: cfg.fetch_credit,
            wbi_chk: cfg.writeback,
            rngsz_idx: cfg.ring_size_idx,
            desc_sz: cfg.desc_size,
            bypass: cfg.desc_bypass,
            mm_chn: cfg.mm_channel,
            wbk_en: cfg.writeback,
            irq_en: cfg.interrupts,
            port_id: cfg.port_id,
            is_mm: cfg.is_mm,
            ring_bs_addr: cfg.ring_base,
            vec: cfg.vector,
            intr_aggr: cfg.interrupt_aggregation,
            ..SoftwareContext::default()
        })
    }

    fn completion_context(&self, cfg: &QueueConfig, dir_c2h: bool) -> Result<CompletionContext> {
        let layout = &self.access.layouts().completion;
        check_fits(layout, CmptField::BaseAddr, cfg.cmpt_base)?;
        check_fits(layout, CmptField::Vec, cfg.vector as u64)?;
        Ok(CompletionContext {
            en_stat_desc: cfg.writeback,
            en_int: cfg.interrupts,
            trig_mode: cfg.trigger_mode as u8,
            fnc_id: cfg.func_id,
            counter_idx: cfg.counter_idx,
            timer_idx: cfg.timer_idx,
            color: true,
            ringsz_idx: cfg.cmpt_ring_size_idx,
            bs_addr: cfg.cmpt_base,
            desc_sz: cfg.cmpt_desc_size,
            valid: true,
            vec: cfg.vector,
            int_aggr: cfg.interrupt_aggregation,
            dir_c2h,
            ..CompletionContext::default()
        })
    }
}

fn prefetch_context(cfg: &QueueConfig) -> PrefetchContext {
    PrefetchContext {
        bypass: cfg.prefetch_bypass,
        bufsz_idx: cfg.buffer_size_idx,
        port_id: cfg.port_id,
        pfch_en: cfg.prefetch,
        valid: true,
        ..PrefetchContext::default()
    }
}

/// Reject values the layout cannot represent: too wide, or with low bits
/// below an alignment the hardware drops. Fields the layout does not carry
/// are not checked.
fn check_fits<F>(layout: &RecordLayout<F>, field: F, value: u64) -> Result<()>
where
    F: Copy + PartialEq + 'static,
{
    match layout.segments(field) {
        Some(segments) if value & !segments_coverage(segments) != 0 => {
            log::error!("{:#x} does not fit context field", value);
            Err(AccessError::InvalidParameter.into())
        }
        _ => Ok(()),
    }
}

//! Variant-aware context access for one device.
//!
//! [`QdmaAccess`] binds an [`IndirectEngine`] to the [`HwVariant`] chosen at
//! attach and exposes typed read / write / clear / invalidate per context
//! kind, plus the generic [`QdmaAccess::program`] entry point.

use crate::context::codec::{decode, encode, encode_completion};
use crate::context::layout::VariantLayouts;
use crate::context::records::{
    CompletionContext, ContextRecord, CreditContext, FunctionMap, HardwareContext,
    InterruptContext, PrefetchContext, SoftwareContext,
};
use crate::context::{ContextOp, ContextSelector, Direction};
use crate::engine::{IndirectEngine, PollConfig};
use crate::error::{AccessError, Result};
use crate::platform::{Delay, RegisterAccess};
use crate::regs::{fmap, ind::MAX_WORDS};
use crate::variant::HwVariant;
use crate::version::{check_config_bar, read_version, VersionInfo};

/// Context programming for one device.
pub struct QdmaAccess<R, D> {
    variant: HwVariant,
    version: Option<VersionInfo>,
    engine: IndirectEngine<R, D>,
}

impl<R: RegisterAccess, D: Delay> QdmaAccess<R, D> {
    /// Bind to a known generation.
    pub fn new(variant: HwVariant, regs: R, delay: D, poll: PollConfig) -> Self {
        Self {
            variant,
            version: None,
            engine: IndirectEngine::new(regs, delay, variant.window(), poll),
        }
    }

    /// Identify the device behind `regs` and bind to its generation.
    ///
    /// Verifies the configuration BAR, decodes the version register and
    /// selects the variant. Nothing is written to the device.
    pub fn probe(regs: R, delay: D, is_vf: bool, poll: PollConfig) -> Result<Self> {
        check_config_bar(&regs, is_vf)?;
        let info = read_version(&regs, is_vf);
        let variant = HwVariant::select(&info)?;
        log::info!("{} DMA engine: {}", variant, info);
        let mut access = Self::new(variant, regs, delay, poll);
        access.version = Some(info);
        Ok(access)
    }

    pub fn variant(&self) -> HwVariant {
        self.variant
    }

    /// Version register decoded by [`probe`](Self::probe).
    pub fn version(&self) -> Option<VersionInfo> {
        self.version
    }

    pub fn layouts(&self) -> &'static VariantLayouts {
        self.variant.layouts()
    }

    pub fn engine(&self) -> &IndirectEngine<R, D> {
        &self.engine
    }

    /// Read a plain register.
    pub fn read_reg(&self, offset: u32) -> u32 {
        self.engine.read_reg(offset)
    }

    /// Give back the register backend.
    pub fn into_registers(self) -> R {
        self.engine.into_registers()
    }

    // ========================================================================
    // Generic entry point
    // ========================================================================

    /// Run `op` on the context addressed by (`selector`, `qid`).
    ///
    /// `Write` takes a record matching `selector`; `Read` returns one.
    /// `Clear` and `Invalidate` ignore `record`. For the function map `qid`
    /// is the function id; for interrupt aggregation it is the ring index.
    pub fn program(
        &self,
        selector: ContextSelector,
        op: ContextOp,
        qid: u16,
        record: Option<&ContextRecord>,
    ) -> Result<Option<ContextRecord>> {
        self.check_selector(selector)?;
        match op {
            ContextOp::Clear => self.clear(selector, qid).map(|_| None),
            ContextOp::Invalidate => self.invalidate(selector, qid).map(|_| None),
            ContextOp::Write => {
                let record = record.ok_or(AccessError::InvalidParameter)?;
                self.write_record(selector, qid, record).map(|_| None)
            }
            ContextOp::Read => self.read_record(selector, qid).map(Some),
        }
    }

    fn write_record(&self, selector: ContextSelector, qid: u16, record: &ContextRecord) -> Result<()> {
        use ContextSelector as S;
        match (selector, record) {
            (S::SoftwareC2h, ContextRecord::Software(ctx)) => {
                self.write_software(Direction::C2h, qid, ctx)
            }
            (S::SoftwareH2c, ContextRecord::Software(ctx)) => {
                self.write_software(Direction::H2c, qid, ctx)
            }
            (S::Prefetch, ContextRecord::Prefetch(ctx)) => self.write_prefetch(qid, ctx),
            (S::Completion, ContextRecord::Completion(ctx)) => self.write_completion(qid, ctx),
            (S::InterruptAggregation, ContextRecord::Interrupt(ctx)) => {
                self.write_interrupt(qid, ctx)
            }
            (S::FunctionMap, ContextRecord::FunctionMap(map)) => self.write_function_map(qid, map),
            _ => {
                log::error!("{} write: record kind mismatch or read-only context", selector);
                Err(AccessError::InvalidParameter)
            }
        }
    }

    fn read_record(&self, selector: ContextSelector, qid: u16) -> Result<ContextRecord> {
        use ContextSelector as S;
        let record = match selector {
            S::SoftwareC2h => ContextRecord::Software(self.read_software(Direction::C2h, qid)?),
            S::SoftwareH2c => ContextRecord::Software(self.read_software(Direction::H2c, qid)?),
            S::HardwareC2h => ContextRecord::Hardware(self.read_hardware(Direction::C2h, qid)?),
            S::HardwareH2c => ContextRecord::Hardware(self.read_hardware(Direction::H2c, qid)?),
            S::CreditC2h => ContextRecord::Credit(self.read_credit(Direction::C2h, qid)?),
            S::CreditH2c => ContextRecord::Credit(self.read_credit(Direction::H2c, qid)?),
            S::Prefetch => ContextRecord::Prefetch(self.read_prefetch(qid)?),
            S::Completion => ContextRecord::Completion(self.read_completion(qid)?),
            S::InterruptAggregation => ContextRecord::Interrupt(self.read_interrupt(qid)?),
            S::FunctionMap => ContextRecord::FunctionMap(self.read_function_map(qid)?),
            // No record model; use `program_raw`.
            S::PasidRamLow | S::PasidRamHigh | S::Timer => {
                return Err(AccessError::InvalidParameter)
            }
        };
        Ok(record)
    }

    /// Run `op` with raw data words, for contexts without a record model.
    ///
    /// `Write` sends `data`; `Read` fills it.
    pub fn program_raw(
        &self,
        selector: ContextSelector,
        op: ContextOp,
        qid: u16,
        data: &mut [u32],
    ) -> Result<()> {
        self.check_selector(selector)?;
        if selector == ContextSelector::FunctionMap && self.variant.direct_function_map() {
            return Err(AccessError::InvalidParameter);
        }
        match op {
            ContextOp::Write => self.engine.write(selector, qid, data),
            ContextOp::Read => self.engine.read(selector, qid, data),
            ContextOp::Clear => self.engine.clear(selector, qid),
            ContextOp::Invalidate => self.engine.invalidate(selector, qid),
        }
    }

    // ========================================================================
    // Typed access
    // ========================================================================

    pub fn write_software(&self, dir: Direction, qid: u16, ctx: &SoftwareContext) -> Result<()> {
        let image = encode(&self.layouts().software, ctx);
        self.engine.write(ContextSelector::software(dir), qid, image.words())
    }

    pub fn read_software(&self, dir: Direction, qid: u16) -> Result<SoftwareContext> {
        let layout = &self.layouts().software;
        let mut words = [0u32; MAX_WORDS];
        self.engine.read(ContextSelector::software(dir), qid, &mut words[..layout.words])?;
        Ok(decode(layout, &words[..layout.words]))
    }

    /// Hardware context is owned by the engine; it can be read, not written.
    pub fn read_hardware(&self, dir: Direction, qid: u16) -> Result<HardwareContext> {
        let layout = &self.layouts().hardware;
        let mut words = [0u32; MAX_WORDS];
        self.engine.read(ContextSelector::hardware(dir), qid, &mut words[..layout.words])?;
        Ok(decode(layout, &words[..layout.words]))
    }

    /// Credit context is owned by the engine; it can be read, not written.
    pub fn read_credit(&self, dir: Direction, qid: u16) -> Result<CreditContext> {
        let layout = &self.layouts().credit;
        let mut words = [0u32; MAX_WORDS];
        self.engine.read(ContextSelector::credit(dir), qid, &mut words[..layout.words])?;
        Ok(decode(layout, &words[..layout.words]))
    }

    pub fn write_prefetch(&self, qid: u16, ctx: &PrefetchContext) -> Result<()> {
        let image = encode(&self.layouts().prefetch, ctx);
        self.engine.write(ContextSelector::Prefetch, qid, image.words())
    }

    pub fn read_prefetch(&self, qid: u16) -> Result<PrefetchContext> {
        let layout = &self.layouts().prefetch;
        let mut words = [0u32; MAX_WORDS];
        self.engine.read(ContextSelector::Prefetch, qid, &mut words[..layout.words])?;
        Ok(decode(layout, &words[..layout.words]))
    }

    /// Fails with `InvalidParameter` before touching hardware if the trigger
    /// mode is out of range.
    pub fn write_completion(&self, qid: u16, ctx: &CompletionContext) -> Result<()> {
        let image = encode_completion(&self.layouts().completion, ctx)?;
        self.engine.write(ContextSelector::Completion, qid, image.words())
    }

    pub fn read_completion(&self, qid: u16) -> Result<CompletionContext> {
        let layout = &self.layouts().completion;
        let mut words = [0u32; MAX_WORDS];
        self.engine.read(ContextSelector::Completion, qid, &mut words[..layout.words])?;
        Ok(decode(layout, &words[..layout.words]))
    }

    pub fn write_interrupt(&self, ring: u16, ctx: &InterruptContext) -> Result<()> {
        let image = encode(&self.layouts().interrupt, ctx);
        self.engine.write(ContextSelector::InterruptAggregation, ring, image.words())
    }

    pub fn read_interrupt(&self, ring: u16) -> Result<InterruptContext> {
        let layout = &self.layouts().interrupt;
        let mut words = [0u32; MAX_WORDS];
        self.engine
            .read(ContextSelector::InterruptAggregation, ring, &mut words[..layout.words])?;
        Ok(decode(layout, &words[..layout.words]))
    }

    pub fn write_function_map(&self, func_id: u16, map: &FunctionMap) -> Result<()> {
        let image = encode(&self.layouts().function_map, map);
        if self.variant.direct_function_map() {
            check_func_id(func_id)?;
            self.engine.write_reg(fmap::offset(func_id), image.words()[0]);
            return Ok(());
        }
        self.engine.write(ContextSelector::FunctionMap, func_id, image.words())
    }

    pub fn read_function_map(&self, func_id: u16) -> Result<FunctionMap> {
        let layout = &self.layouts().function_map;
        if self.variant.direct_function_map() {
            check_func_id(func_id)?;
            let word = self.engine.read_reg(fmap::offset(func_id));
            return Ok(decode(layout, &[word]));
        }
        let mut words = [0u32; MAX_WORDS];
        self.engine.read(ContextSelector::FunctionMap, func_id, &mut words[..layout.words])?;
        Ok(decode(layout, &words[..layout.words]))
    }

    /// Zero the context addressed by (`selector`, `qid`).
    pub fn clear(&self, selector: ContextSelector, qid: u16) -> Result<()> {
        self.check_selector(selector)?;
        if selector == ContextSelector::FunctionMap && self.variant.direct_function_map() {
            check_func_id(qid)?;
            self.engine.write_reg(fmap::offset(qid), 0);
            return Ok(());
        }
        self.engine.clear(selector, qid)
    }

    /// Drop any cached copy of the context addressed by (`selector`, `qid`).
    ///
    /// A directly mapped function map has nothing to invalidate and is
    /// rejected with `InvalidParameter`.
    pub fn invalidate(&self, selector: ContextSelector, qid: u16) -> Result<()> {
        self.check_selector(selector)?;
        if selector == ContextSelector::FunctionMap && self.variant.direct_function_map() {
            return Err(AccessError::InvalidParameter);
        }
        self.engine.invalidate(selector, qid)
    }

    fn check_selector(&self, selector: ContextSelector) -> Result<()> {
        if self.variant.supports(selector) {
            Ok(())
        } else {
            log::warn!("{} not supported on {}", selector, self.variant);
            Err(AccessError::UnsupportedSelector)
        }
    }
}

fn check_func_id(func_id: u16) -> Result<()> {
    if func_id < fmap::COUNT {
        Ok(())
    } else {
        Err(AccessError::InvalidParameter)
    }
}

//! Indirect context programming engine.
//!
//! Context memory is reached through a small register window: data words,
//! mask words and a command register with a busy bit. One command is in
//! flight at a time per device, so the whole sequence (load data, load
//! masks, issue command, poll busy, read back) runs under one lock.
//!
//! # Sequences
//!
//! ```text
//! Write       data[0..n] -> mask[0..n] = !0 -> cmd -> poll
//! Read        cmd -> poll -> data[0..n]
//! Clear       cmd -> poll
//! Invalidate  cmd -> poll
//! ```
//!
//! # Polling
//!
//! The busy bit is sampled every `interval_us` for at most
//! `timeout_us / interval_us` attempts, followed by one final sample.

use spin::Mutex;

use crate::context::{Command, ContextOp, ContextSelector};
use crate::error::{AccessError, Result};
use crate::platform::{Delay, RegisterAccess};
use crate::regs::{ind, poll};

/// Busy-poll timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between samples.
    pub interval_us: u32,
    /// Total budget before giving up.
    pub timeout_us: u32,
}

impl PollConfig {
    pub const fn new(interval_us: u32, timeout_us: u32) -> Self {
        Self {
            interval_us,
            timeout_us,
        }
    }

    /// Number of delayed samples before the final one.
    pub const fn attempts(&self) -> u32 {
        if self.interval_us == 0 {
            return 1;
        }
        let n = self.timeout_us / self.interval_us;
        if n == 0 {
            1
        } else {
            n
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(poll::DEFAULT_INTERVAL_US, poll::DEFAULT_TIMEOUT_US)
    }
}

/// Geometry of an indirect context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Offset of the first data word.
    pub data: u32,
    /// Offset of the first mask word.
    pub mask: u32,
    /// Offset of the command register.
    pub cmd: u32,
    /// Data / mask words.
    pub words: usize,
    /// Queue id field of the command word.
    pub qid_mask: u32,
}

impl Window {
    /// QDMA soft and Versal soft.
    pub const SOFT: Window = Window {
        data: ind::soft::DATA,
        mask: ind::soft::MASK,
        cmd: ind::soft::CMD,
        words: ind::soft::WORDS,
        qid_mask: ind::cmd::QID,
    };

    /// EQDMA: soft geometry with a wider queue id.
    pub const EQDMA: Window = Window {
        qid_mask: ind::cmd::QID_WIDE,
        ..Self::SOFT
    };

    /// CPM4 and Versal hard.
    pub const HARD: Window = Window {
        data: ind::hard::DATA,
        mask: ind::hard::MASK,
        cmd: ind::hard::CMD,
        words: ind::hard::WORDS,
        qid_mask: ind::cmd::QID,
    };
}

/// Serialized access to one device's indirect window.
pub struct IndirectEngine<R, D> {
    regs: Mutex<R>,
    delay: D,
    window: Window,
    poll: PollConfig,
}

impl<R: RegisterAccess, D: Delay> IndirectEngine<R, D> {
    pub fn new(regs: R, delay: D, window: Window, poll: PollConfig) -> Self {
        Self {
            regs: Mutex::new(regs),
            delay,
            window,
            poll,
        }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// Write `data` into the context addressed by (`selector`, `qid`).
    ///
    /// `data` is zero-padded to the window width; every mask word is set so
    /// the whole context is replaced.
    pub fn write(&self, selector: ContextSelector, qid: u16, data: &[u32]) -> Result<()> {
        let words = self.window.words;
        if data.len() > words {
            log::error!(
                "{} write: {} words exceed {}-word window",
                selector,
                data.len(),
                words
            );
            return Err(AccessError::InvalidParameter);
        }
        let cmd = self.command_word(selector, ContextOp::Write, qid)?;

        let mut padded = [0u32; ind::MAX_WORDS];
        padded[..data.len()].copy_from_slice(data);
        let masks = [u32::MAX; ind::MAX_WORDS];

        let mut regs = self.regs.lock();
        regs.write_block(self.window.data, &padded[..words]);
        regs.write_block(self.window.mask, &masks[..words]);
        self.issue(&mut *regs, selector, ContextOp::Write, qid, cmd)
    }

    /// Read the context addressed by (`selector`, `qid`) into `out`.
    pub fn read(&self, selector: ContextSelector, qid: u16, out: &mut [u32]) -> Result<()> {
        if out.len() > self.window.words {
            return Err(AccessError::InvalidParameter);
        }
        let cmd = self.command_word(selector, ContextOp::Read, qid)?;

        let mut regs = self.regs.lock();
        self.issue(&mut *regs, selector, ContextOp::Read, qid, cmd)?;
        regs.read_block(self.window.data, out);
        Ok(())
    }

    /// Zero the context addressed by (`selector`, `qid`).
    pub fn clear(&self, selector: ContextSelector, qid: u16) -> Result<()> {
        self.simple(selector, ContextOp::Clear, qid)
    }

    /// Drop any cached copy of the context addressed by (`selector`, `qid`).
    pub fn invalidate(&self, selector: ContextSelector, qid: u16) -> Result<()> {
        self.simple(selector, ContextOp::Invalidate, qid)
    }

    /// Read a plain register under the window lock.
    pub fn read_reg(&self, offset: u32) -> u32 {
        self.regs.lock().read32(offset)
    }

    /// Write a plain register under the window lock.
    pub fn write_reg(&self, offset: u32, value: u32) {
        self.regs.lock().write32(offset, value)
    }

    /// Run `f` with exclusive access to the register window.
    pub fn with_registers<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(&mut *self.regs.lock())
    }

    /// Give back the register backend.
    pub fn into_registers(self) -> R {
        self.regs.into_inner()
    }

    fn simple(&self, selector: ContextSelector, op: ContextOp, qid: u16) -> Result<()> {
        let cmd = self.command_word(selector, op, qid)?;
        let mut regs = self.regs.lock();
        self.issue(&mut *regs, selector, op, qid, cmd)
    }

    fn command_word(&self, selector: ContextSelector, op: ContextOp, qid: u16) -> Result<u32> {
        Command::new(selector, op, qid).encode(self.window.qid_mask)
    }

    fn issue(
        &self,
        regs: &mut R,
        selector: ContextSelector,
        op: ContextOp,
        qid: u16,
        cmd: u32,
    ) -> Result<()> {
        log::debug!("ind {:?} {} qid {} cmd {:#010x}", op, selector, qid, cmd);
        regs.write32(self.window.cmd, cmd);
        self.wait_idle(regs).map_err(|e| {
            log::error!("ind {:?} {} qid {}: busy did not clear", op, selector, qid);
            e
        })
    }

    fn wait_idle(&self, regs: &R) -> Result<()> {
        let mut remaining = self.poll.attempts();
        loop {
            if regs.read32(self.window.cmd) & ind::cmd::BUSY == 0 {
                return Ok(());
            }
            self.delay.delay_us(self.poll.interval_us);
            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }
        if regs.read32(self.window.cmd) & ind::cmd::BUSY == 0 {
            return Ok(());
        }
        Err(AccessError::HwBusyTimeout)
    }
}

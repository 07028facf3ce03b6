//! Common test utilities: a simulated DMA engine register window

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use qdma_access::context::Command;
use qdma_access::regs::ind::cmd;
use qdma_access::{ContextOp, ContextSelector, RegisterAccess, Window};

/// Register-level model of an engine: plain registers plus context memory
/// behind the indirect window.
pub struct MockDevice {
    pub window: Window,
    pub regs: HashMap<u32, u32>,
    pub contexts: HashMap<(ContextSelector, u16), Vec<u32>>,
    /// Every write, in order.
    pub writes: Vec<(u32, u32)>,
    /// Commands executed, in order.
    pub commands: Vec<Command>,
    /// Reads of the command register that still report busy.
    pub busy_reads: Cell<u32>,
    /// Busy never clears.
    pub stuck: bool,
    pub cmd_reads: Cell<u32>,
}

impl MockDevice {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            regs: HashMap::new(),
            contexts: HashMap::new(),
            writes: Vec::new(),
            commands: Vec::new(),
            busy_reads: Cell::new(0),
            stuck: false,
            cmd_reads: Cell::new(0),
        }
    }

    /// Device whose busy bit never clears.
    pub fn stuck(window: Window) -> Self {
        Self {
            stuck: true,
            ..Self::new(window)
        }
    }

    pub fn with_reg(mut self, offset: u32, value: u32) -> Self {
        self.regs.insert(offset, value);
        self
    }

    pub fn context(&self, selector: ContextSelector, qid: u16) -> Option<&[u32]> {
        self.contexts.get(&(selector, qid)).map(|v| v.as_slice())
    }

    fn execute(&mut self, word: u32) {
        let Some(command) = Command::decode(word, self.window.qid_mask) else {
            return;
        };
        self.commands.push(command);
        let n = self.window.words;
        let key = (command.selector, command.qid);
        match command.op {
            ContextOp::Write => {
                let mut ctx = self.contexts.get(&key).cloned().unwrap_or_else(|| vec![0; n]);
                for (i, slot) in ctx.iter_mut().enumerate() {
                    let off = 4 * i as u32;
                    let data = self.regs.get(&(self.window.data + off)).copied().unwrap_or(0);
                    let mask = self.regs.get(&(self.window.mask + off)).copied().unwrap_or(0);
                    *slot = (*slot & !mask) | (data & mask);
                }
                self.contexts.insert(key, ctx);
            }
            ContextOp::Read => {
                let ctx = self.contexts.get(&key).cloned().unwrap_or_else(|| vec![0; n]);
                for (i, value) in ctx.iter().enumerate() {
                    self.regs.insert(self.window.data + 4 * i as u32, *value);
                }
            }
            ContextOp::Clear => {
                self.contexts.insert(key, vec![0; n]);
            }
            ContextOp::Invalidate => {}
        }
    }
}

impl RegisterAccess for MockDevice {
    fn read32(&self, offset: u32) -> u32 {
        if offset == self.window.cmd {
            self.cmd_reads.set(self.cmd_reads.get() + 1);
            if self.stuck {
                return cmd::BUSY;
            }
            let left = self.busy_reads.get();
            if left > 0 {
                self.busy_reads.set(left - 1);
                return cmd::BUSY;
            }
            return 0;
        }
        self.regs.get(&offset).copied().unwrap_or(0)
    }

    fn write32(&mut self, offset: u32, value: u32) {
        self.writes.push((offset, value));
        if offset == self.window.cmd {
            self.execute(value);
        } else {
            self.regs.insert(offset, value);
        }
    }
}

/// Delay that only accumulates the requested time. Clones share the tally.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    total_us: Rc<Cell<u64>>,
    calls: Rc<Cell<u32>>,
}

impl RecordingDelay {
    pub fn total_us(&self) -> u64 {
        self.total_us.get()
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl qdma_access::Delay for RecordingDelay {
    fn delay_us(&self, us: u32) {
        self.total_us.set(self.total_us.get() + us as u64);
        self.calls.set(self.calls.get() + 1);
    }
}

/// PF version register value for the given fields.
pub fn pf_version(device: u32, release: u32, ip: u32) -> u32 {
    (device << 28) | (release << 24) | (ip << 20)
}

/// Configuration BAR identifier register value.
pub const BAR_ID: u32 = 0x1fd3 << 16;

//! Common test utilities: a simulated engine behind a BAR

#![allow(dead_code)]

use std::collections::HashMap;

use qdma_access::context::Command;
use qdma_access::regs::ind::cmd;
use qdma_access::regs::{config, glbl2};
use qdma_access::{ContextOp, ContextSelector, RegisterAccess, Window};

pub type NoDelay = fn(u32);

pub fn no_delay(_us: u32) {}

/// Hardware flavour to simulate.
#[derive(Debug, Clone, Copy)]
pub enum Flavor {
    /// QDMA soft IP, 2019.2
    Soft,
    /// EQDMA soft IP, 2020.2
    Eqdma,
    /// Versal hard IP, 2020.1
    VersalHard,
}

impl Flavor {
    fn window(self) -> Window {
        match self {
            Self::Soft => Window::SOFT,
            Self::Eqdma => Window::EQDMA,
            Self::VersalHard => Window::HARD,
        }
    }

    /// PF version register bits 31:20.
    fn pf_version(self) -> u32 {
        let (device, release, ip) = match self {
            Self::Soft => (0, 2, 0),
            Self::Eqdma => (0, 4, 1),
            Self::VersalHard => (1, 1, 0),
        };
        (device << 28) | (release << 24) | (ip << 20)
    }
}

/// Register map plus context memory of a simulated engine.
pub struct SimDevice {
    pub window: Window,
    pub regs: HashMap<u32, u32>,
    pub contexts: HashMap<(ContextSelector, u16), Vec<u32>>,
    /// Commands executed, in order.
    pub commands: Vec<Command>,
    /// Commands on this selector never complete.
    pub hang_on: Option<ContextSelector>,
    busy: bool,
}

impl SimDevice {
    /// Physical function with two PFs, `num_qs` queues, and streaming and
    /// MM engines as requested.
    pub fn pf(flavor: Flavor, num_qs: u32, st: bool, mm: bool) -> Self {
        let mut channels = 0;
        if st {
            channels |= glbl2::ST_C2H | glbl2::ST_H2C;
        }
        if mm {
            channels |= glbl2::MM_C2H | glbl2::MM_H2C;
        }
        let mut dev = Self::bare(flavor.window());
        dev.regs.insert(config::BLOCK_ID, config::MAGIC << 16);
        dev.regs.insert(glbl2::MISC_CAP, flavor.pf_version());
        dev.regs.insert(glbl2::CHANNEL_CAP, num_qs);
        dev.regs.insert(glbl2::PF_BARLITE_INT, 0x01 | (0x01 << 6));
        dev.regs.insert(glbl2::CHANNEL_MDMA, channels);
        dev
    }

    /// Soft QDMA virtual function.
    pub fn soft_vf() -> Self {
        let mut dev = Self::bare(Window::SOFT);
        dev.regs.insert(config::VF_BAR_ID, (config::MAGIC << 16) | (2 << 8));
        dev
    }

    fn bare(window: Window) -> Self {
        Self {
            window,
            regs: HashMap::new(),
            contexts: HashMap::new(),
            commands: Vec::new(),
            hang_on: None,
            busy: false,
        }
    }

    pub fn hang_on(mut self, selector: ContextSelector) -> Self {
        self.hang_on = Some(selector);
        self
    }

    /// Executed (selector, op) pairs.
    pub fn trace(&self) -> Vec<(ContextSelector, ContextOp)> {
        self.commands.iter().map(|c| (c.selector, c.op)).collect()
    }

    fn execute(&mut self, word: u32) {
        let Some(command) = Command::decode(word, self.window.qid_mask) else {
            return;
        };
        self.commands.push(command);
        self.busy = self.hang_on == Some(command.selector);
        if self.busy {
            return;
        }

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

impl RegisterAccess for SimDevice {
    fn read32(&self, offset: u32) -> u32 {
        if offset == self.window.cmd {
            return if self.busy { cmd::BUSY } else { 0 };
        }
        self.regs.get(&offset).copied().unwrap_or(0)
    }

    fn write32(&mut self, offset: u32, value: u32) {
        if offset == self.window.cmd {
            self.execute(value);
        } else {
            self.regs.insert(offset, value);
        }
    }
}

use std::io::Write;

use anyhow::{bail, Context, Result};
use ps2kbc_devices_input::{
    I8042Config, I8042Controller, I8042Error, I8042Ports, SharedI8042Controller,
};
use ps2kbc_platform::interrupts::{IrqLine, ISA_IRQ_KEYBOARD, ISA_IRQ_MOUSE};
use ps2kbc_platform::io::{IoError, IoPortBus};
use ps2kbc_platform::Tick;
use serde::Deserialize;

/// One step of a replay script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    Write {
        port: u16,
        value: u8,
    },
    Read {
        port: u16,
        /// Fail the replay unless the read returns this value.
        #[serde(default)]
        expect: Option<u8>,
    },
    InjectKeyboard {
        bytes: Vec<u8>,
    },
    InjectMouse {
        bytes: Vec<u8>,
    },
}

pub fn parse_script(json: &str) -> Result<Vec<ScriptOp>> {
    serde_json::from_str(json).context("invalid replay script")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Simulated time after the last access.
    pub ticks: Tick,
    pub reads: usize,
    pub keyboard_irqs: usize,
    pub mouse_irqs: usize,
}

/// A controller mapped on a port bus with recording interrupt lines, driven one script step at a
/// time.
pub struct Replay {
    bus: IoPortBus,
    controller: SharedI8042Controller,
    keyboard_irq: IrqLine,
    mouse_irq: IrqLine,
    now: Tick,
    reads: usize,
}

impl Replay {
    pub fn new(config: I8042Config) -> Result<Self> {
        let mut controller = I8042Controller::with_config(config)?;
        let keyboard_irq = IrqLine::new(ISA_IRQ_KEYBOARD);
        let mouse_irq = IrqLine::new(ISA_IRQ_MOUSE);
        controller.set_keyboard_irq(Box::new(keyboard_irq.clone()));
        controller.set_mouse_irq(Box::new(mouse_irq.clone()));

        let ports = I8042Ports::new(controller);
        let controller = ports.controller();
        let mut bus = IoPortBus::new();
        bus.map(Box::new(ports))?;

        Ok(Self {
            bus,
            controller,
            keyboard_irq,
            mouse_irq,
            now: 0,
            reads: 0,
        })
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Executes one step. Reads are reported to `out` as `<tick> <port> <value>`, stamped with the
    /// time the access was issued.
    pub fn step(&mut self, op: &ScriptOp, out: &mut impl Write) -> Result<()> {
        match *op {
            ScriptOp::Write { port, value } => {
                let latency = self
                    .bus
                    .write(port, value)
                    .with_context(|| format!("write {value:#04x} to port {port:#06x}"))?;
                self.advance(latency)?;
            }
            ScriptOp::Read { port, expect } => {
                let (value, latency) = self
                    .bus
                    .read(port)
                    .with_context(|| format!("read from port {port:#06x}"))?;
                writeln!(out, "{} {port:#06x} {value:#04x}", self.now)?;
                self.reads += 1;
                self.advance(latency)?;
                if let Some(expected) = expect {
                    if value != expected {
                        bail!(
                            "port {port:#06x} read {value:#04x}, expected {expected:#04x}"
                        );
                    }
                }
            }
            ScriptOp::InjectKeyboard { ref bytes } => {
                self.controller.borrow_mut().inject_keyboard_bytes(bytes);
            }
            ScriptOp::InjectMouse { ref bytes } => {
                self.controller.borrow_mut().inject_mouse_bytes(bytes);
            }
        }
        Ok(())
    }

    fn advance(&mut self, latency: Tick) -> Result<()> {
        self.now = match self.now.checked_add(latency) {
            Some(now) => now,
            None => bail!("replay clock overflowed at tick {} (+{latency})", self.now),
        };
        Ok(())
    }

    pub fn run(&mut self, ops: &[ScriptOp], out: &mut impl Write) -> Result<ReplaySummary> {
        for (index, op) in ops.iter().enumerate() {
            tracing::trace!(index, ?op, "replay step");
            if let Err(err) = self.step(op, out) {
                let context = match controller_error(&err) {
                    Some(e) if e.is_unimplemented() => format!(
                        "script step {index} failed: controller does not implement {:#04x}",
                        e.raw_value()
                    ),
                    Some(e) => format!(
                        "script step {index} failed: controller rejected {:#x}",
                        e.raw_value()
                    ),
                    None => format!("script step {index} failed"),
                };
                return Err(err.context(context));
            }
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> ReplaySummary {
        ReplaySummary {
            ticks: self.now,
            reads: self.reads,
            keyboard_irqs: self.keyboard_irq.pulses(),
            mouse_irqs: self.mouse_irq.pulses(),
        }
    }
}

fn controller_error(err: &anyhow::Error) -> Option<&I8042Error> {
    err.downcast_ref::<IoError>()?.downcast_device::<I8042Error>()
}

use std::fmt;

use ps2kbc_platform::interrupts::InterruptPin;
use ps2kbc_platform::io::PortRange;
use ps2kbc_platform::Tick;

use crate::config::{ConfigError, I8042Config};
use crate::error::{DeviceKind, I8042Error, Result};
use crate::ps2::Ps2DeviceModel;
use crate::ps2_keyboard::Ps2Keyboard;
use crate::ps2_mouse::Ps2Mouse;
use crate::registers::{CommandByte, PendingCommand, StatusRegister};

/// The 8042 has a whopping 32 bytes of internal RAM.
pub const CONTROLLER_RAM_SIZE: u8 = 32;
/// Number of output port bits addressable by the pulse-output command range.
pub const NUM_OUTPUT_BITS: u8 = 14;

const READ_CONTROLLER_RAM_BASE: u8 = 0x20;
const WRITE_CONTROLLER_RAM_BASE: u8 = 0x60;
const PULSE_OUTPUT_BIT_BASE: u8 = 0xF0;

/// Command bytes accepted on the command port.
///
/// The controller RAM and pulse-output ranges are handled separately since they cover many
/// values each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControllerCommand {
    GetCommandByte = 0x20,
    WriteCommandByte = 0x60,
    CheckForPassword = 0xA4,
    LoadPassword = 0xA5,
    CheckPassword = 0xA6,
    DisableMouse = 0xA7,
    EnableMouse = 0xA8,
    TestMouse = 0xA9,
    SelfTest = 0xAA,
    InterfaceTest = 0xAB,
    DiagnosticDump = 0xAC,
    DisableKeyboard = 0xAD,
    EnableKeyboard = 0xAE,
    ReadInputPort = 0xC0,
    ContinuousPollLow = 0xC1,
    ContinuousPollHigh = 0xC2,
    ReadOutputPort = 0xD0,
    WriteOutputPort = 0xD1,
    WriteKeyboardOutputBuff = 0xD2,
    WriteMouseOutputBuff = 0xD3,
    WriteToMouse = 0xD4,
    DisableA20 = 0xDD,
    EnableA20 = 0xDF,
    ReadTestInputs = 0xE0,
    SystemReset = 0xFE,
}

impl ControllerCommand {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x20 => Self::GetCommandByte,
            0x60 => Self::WriteCommandByte,
            0xA4 => Self::CheckForPassword,
            0xA5 => Self::LoadPassword,
            0xA6 => Self::CheckPassword,
            0xA7 => Self::DisableMouse,
            0xA8 => Self::EnableMouse,
            0xA9 => Self::TestMouse,
            0xAA => Self::SelfTest,
            0xAB => Self::InterfaceTest,
            0xAC => Self::DiagnosticDump,
            0xAD => Self::DisableKeyboard,
            0xAE => Self::EnableKeyboard,
            0xC0 => Self::ReadInputPort,
            0xC1 => Self::ContinuousPollLow,
            0xC2 => Self::ContinuousPollHigh,
            0xD0 => Self::ReadOutputPort,
            0xD1 => Self::WriteOutputPort,
            0xD2 => Self::WriteKeyboardOutputBuff,
            0xD3 => Self::WriteMouseOutputBuff,
            0xD4 => Self::WriteToMouse,
            0xDD => Self::DisableA20,
            0xDF => Self::EnableA20,
            0xE0 => Self::ReadTestInputs,
            0xFE => Self::SystemReset,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::GetCommandByte => "Get command byte",
            Self::WriteCommandByte => "Write command byte",
            Self::CheckForPassword => "Check for password",
            Self::LoadPassword => "Load password",
            Self::CheckPassword => "Check password",
            Self::DisableMouse => "Disable mouse",
            Self::EnableMouse => "Enable mouse",
            Self::TestMouse => "Test mouse",
            Self::SelfTest => "Self test",
            Self::InterfaceTest => "Interface test",
            Self::DiagnosticDump => "Diagnostic dump",
            Self::DisableKeyboard => "Disable keyboard",
            Self::EnableKeyboard => "Enable keyboard",
            Self::ReadInputPort => "Read input port",
            Self::ContinuousPollLow => "Continuous poll low",
            Self::ContinuousPollHigh => "Continuous poll high",
            Self::ReadOutputPort => "Read output port",
            Self::WriteOutputPort => "Write output port",
            Self::WriteKeyboardOutputBuff => "Write keyboard output buffer",
            Self::WriteMouseOutputBuff => "Write mouse output buffer",
            Self::WriteToMouse => "Write to mouse",
            Self::DisableA20 => "Disable A20",
            Self::EnableA20 => "Enable A20",
            Self::ReadTestInputs => "Read test inputs",
            Self::SystemReset => "System reset",
        }
    }
}

/// Which device a staged output byte belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ps2Port {
    Keyboard,
    Mouse,
}

/// Intel 8042 keyboard controller with a PS/2 keyboard and a PS/2 mouse attached.
///
/// The controller exposes two byte-wide ports:
/// - the data port: reads drain device output, writes go to a device (or to the controller when
///   a controller command is waiting for its data byte);
/// - the command port: reads return the status register, writes are controller commands.
///
/// Only one output byte is visible to the host at a time. When it is read, the next byte is
/// pulled from the keyboard if it has any output queued, otherwise from the mouse.
pub struct I8042Controller {
    config: I8042Config,
    data: u8,
    status: StatusRegister,
    command_byte: CommandByte,
    pending: PendingCommand,
    keyboard: Ps2Keyboard,
    mouse: Ps2Mouse,
    keyboard_irq: Option<Box<dyn InterruptPin>>,
    mouse_irq: Option<Box<dyn InterruptPin>>,
}

impl fmt::Debug for I8042Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I8042Controller")
            .field("config", &self.config)
            .field("data", &self.data)
            .field("status", &self.status)
            .field("command_byte", &self.command_byte)
            .field("pending", &self.pending)
            .field("keyboard", &self.keyboard)
            .field("mouse", &self.mouse)
            .finish_non_exhaustive()
    }
}

impl I8042Controller {
    /// Controller at the legacy PC ports with the default access latency.
    pub fn new() -> Self {
        Self::build(I8042Config::default())
    }

    pub fn with_config(config: I8042Config) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: I8042Config) -> Self {
        Self {
            config,
            data: 0,
            status: StatusRegister::default(),
            command_byte: CommandByte::default(),
            pending: PendingCommand::None,
            keyboard: Ps2Keyboard::new(),
            mouse: Ps2Mouse::new(),
            keyboard_irq: None,
            mouse_irq: None,
        }
    }

    pub fn set_keyboard_irq(&mut self, pin: Box<dyn InterruptPin>) {
        self.keyboard_irq = Some(pin);
    }

    pub fn set_mouse_irq(&mut self, pin: Box<dyn InterruptPin>) {
        self.mouse_irq = Some(pin);
    }

    pub fn config(&self) -> &I8042Config {
        &self.config
    }

    pub fn status(&self) -> StatusRegister {
        self.status
    }

    pub fn command_byte(&self) -> CommandByte {
        self.command_byte
    }

    pub fn pending_command(&self) -> PendingCommand {
        self.pending
    }

    /// Current contents of the data register, without consuming it.
    pub fn data_register(&self) -> u8 {
        self.data
    }

    pub fn keyboard(&self) -> &Ps2Keyboard {
        &self.keyboard
    }

    pub fn mouse(&self) -> &Ps2Mouse {
        &self.mouse
    }

    /// The two single-byte ports this controller answers to.
    pub fn address_ranges(&self) -> Vec<PortRange> {
        vec![
            PortRange::single(self.config.data_port),
            PortRange::single(self.config.command_port),
        ]
    }

    /// Power-on reset. Interrupt pins stay connected.
    pub fn reset(&mut self) {
        tracing::debug!("i8042 reset");
        self.data = 0;
        self.status = StatusRegister::default();
        self.command_byte = CommandByte::default();
        self.pending = PendingCommand::None;
        self.keyboard = Ps2Keyboard::new();
        self.mouse = Ps2Mouse::new();
    }

    pub fn read_port(&mut self, port: u16) -> Result<(u8, Tick)> {
        let value = if port == self.config.data_port {
            self.read_data_out()
        } else if port == self.config.command_port {
            self.status.bits()
        } else {
            return Err(I8042Error::InvalidPortRead { port });
        };
        Ok((value, self.config.latency))
    }

    pub fn write_port(&mut self, port: u16, value: u8) -> Result<Tick> {
        if port == self.config.data_port {
            self.write_data_port(value)?;
        } else if port == self.config.command_port {
            self.write_command_port(value)?;
        } else {
            return Err(I8042Error::InvalidPortWrite { port, value });
        }
        Ok(self.config.latency)
    }

    /// Stages `byte` in the data register and notifies the owning device's interrupt line, if the
    /// command byte enables it.
    pub fn write_data(&mut self, byte: u8, source: Ps2Port) {
        tracing::debug!("set data {byte:#04x} from {source:?}");
        self.data = byte;
        self.status.output_full = true;
        self.status.mouse_output_full = source == Ps2Port::Mouse;

        let pin = match source {
            Ps2Port::Keyboard if self.command_byte.keyboard_full_int => {
                self.keyboard_irq.as_mut()
            }
            Ps2Port::Mouse if self.command_byte.mouse_full_int => self.mouse_irq.as_mut(),
            _ => None,
        };
        if let Some(pin) = pin {
            tracing::debug!("sending {source:?} interrupt");
            pin.pulse();
        }
    }

    /// Returns the data register and refills it from the devices, keyboard first.
    pub fn read_data_out(&mut self) -> u8 {
        let data = self.data;
        self.status.output_full = false;
        self.status.mouse_output_full = false;
        self.refill();
        data
    }

    /// Queues scancode bytes as if the keyboard had produced them.
    ///
    /// Dropped while the keyboard port is disabled at the controller.
    pub fn inject_keyboard_bytes(&mut self, bytes: &[u8]) {
        if self.command_byte.disable_keyboard {
            tracing::debug!(len = bytes.len(), "keyboard port disabled; dropping input");
            return;
        }
        self.keyboard.port_mut().buffer_data(bytes);
        if !self.status.output_full {
            self.refill();
        }
    }

    /// Queues mouse packet bytes as if the mouse had produced them.
    ///
    /// Dropped while the mouse port is disabled at the controller or the mouse itself has data
    /// reporting turned off.
    pub fn inject_mouse_bytes(&mut self, bytes: &[u8]) {
        if self.command_byte.disable_mouse || !self.mouse.reporting_enabled() {
            tracing::debug!(len = bytes.len(), "mouse not reporting; dropping input");
            return;
        }
        self.mouse.port_mut().buffer_data(bytes);
        if !self.status.output_full {
            self.refill();
        }
    }

    fn refill(&mut self) {
        if let Some(byte) = self.keyboard.get_data() {
            self.write_data(byte, Ps2Port::Keyboard);
        } else if let Some(byte) = self.mouse.get_data() {
            self.write_data(byte, Ps2Port::Mouse);
        }
    }

    fn write_data_port(&mut self, data: u8) -> Result<()> {
        self.status.command_last = false;
        match std::mem::take(&mut self.pending) {
            PendingCommand::None => {
                if self.keyboard.process_data(data)? {
                    if let Some(byte) = self.keyboard.get_data() {
                        self.write_data(byte, Ps2Port::Keyboard);
                    }
                }
            }
            PendingCommand::WriteToMouse => {
                if self.mouse.process_data(data)? {
                    if let Some(byte) = self.mouse.get_data() {
                        self.write_data(byte, Ps2Port::Mouse);
                    }
                }
            }
            PendingCommand::WriteCommandByte => {
                tracing::debug!("got data {data:#04x} for \"Write command byte\" command");
                self.command_byte = CommandByte::from_bits(data);
                self.status.passed_self_test = self.command_byte.passed_self_test;
            }
            PendingCommand::WriteMouseOutputBuff => {
                tracing::debug!("got data {data:#04x} for \"Write mouse output buffer\" command");
                self.write_data(data, Ps2Port::Mouse);
            }
        }
        Ok(())
    }

    fn write_command_port(&mut self, data: u8) -> Result<()> {
        tracing::debug!("got command {data:#04x}");
        self.status.command_last = true;

        // The first byte of each RAM range doubles as the command byte register and is decoded
        // below as a regular command.
        let ram_offset =
            |base: u8| (data > base && data < base + CONTROLLER_RAM_SIZE).then(|| data - base);
        if let Some(offset) = ram_offset(READ_CONTROLLER_RAM_BASE) {
            return Err(I8042Error::ReadControllerRam {
                command: data,
                offset,
            });
        }
        if let Some(offset) = ram_offset(WRITE_CONTROLLER_RAM_BASE) {
            return Err(I8042Error::WriteControllerRam {
                command: data,
                offset,
            });
        }
        if (PULSE_OUTPUT_BIT_BASE..PULSE_OUTPUT_BIT_BASE + NUM_OUTPUT_BITS).contains(&data) {
            return Err(I8042Error::PulseOutputBit {
                command: data,
                bit: data - PULSE_OUTPUT_BIT_BASE,
            });
        }

        let cmd = ControllerCommand::from_byte(data)
            .ok_or(I8042Error::UnknownControllerCommand { command: data })?;

        match cmd {
            ControllerCommand::GetCommandByte => {
                self.write_data(self.command_byte.bits(), Ps2Port::Keyboard);
            }
            ControllerCommand::WriteCommandByte => {
                self.pending = PendingCommand::WriteCommandByte;
            }
            ControllerCommand::WriteToMouse => {
                self.pending = PendingCommand::WriteToMouse;
            }
            ControllerCommand::WriteMouseOutputBuff => {
                self.pending = PendingCommand::WriteMouseOutputBuff;
            }
            ControllerCommand::DisableMouse => {
                self.command_byte.disable_mouse = true;
            }
            ControllerCommand::EnableMouse => {
                self.command_byte.disable_mouse = false;
            }
            ControllerCommand::DisableKeyboard => {
                self.command_byte.disable_keyboard = true;
            }
            ControllerCommand::EnableKeyboard => {
                self.command_byte.disable_keyboard = false;
            }
            ControllerCommand::CheckForPassword
            | ControllerCommand::LoadPassword
            | ControllerCommand::CheckPassword
            | ControllerCommand::TestMouse
            | ControllerCommand::SelfTest
            | ControllerCommand::InterfaceTest
            | ControllerCommand::DiagnosticDump
            | ControllerCommand::ReadInputPort
            | ControllerCommand::ContinuousPollLow
            | ControllerCommand::ContinuousPollHigh
            | ControllerCommand::ReadOutputPort
            | ControllerCommand::WriteOutputPort
            | ControllerCommand::WriteKeyboardOutputBuff
            | ControllerCommand::DisableA20
            | ControllerCommand::EnableA20
            | ControllerCommand::ReadTestInputs
            | ControllerCommand::SystemReset => {
                return Err(I8042Error::Unimplemented {
                    device: DeviceKind::Controller,
                    command: data,
                    name: cmd.name(),
                });
            }
        }
        Ok(())
    }
}

impl Default for I8042Controller {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps2kbc_platform::interrupts::IrqLine;

    const DATA: u16 = 0x60;
    const CMD: u16 = 0x64;

    fn read(c: &mut I8042Controller, port: u16) -> u8 {
        c.read_port(port).unwrap().0
    }

    #[test]
    fn power_on_state_is_zeroed() {
        let c = I8042Controller::new();
        assert_eq!(c.status().bits(), 0);
        assert_eq!(c.command_byte().bits(), 0);
        assert_eq!(c.pending_command(), PendingCommand::None);
        assert_eq!(
            c.address_ranges(),
            vec![PortRange::single(0x60), PortRange::single(0x64)]
        );
    }

    #[test]
    fn every_access_costs_the_configured_latency() {
        let mut c = I8042Controller::with_config(I8042Config {
            latency: 42,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(c.read_port(CMD).unwrap(), (0, 42));
        assert_eq!(c.write_port(CMD, 0xA8).unwrap(), 42);
        assert_eq!(c.write_port(DATA, 0xF4).unwrap(), 42);
        assert_eq!(c.read_port(DATA).unwrap(), (0xFA, 42));
    }

    #[test]
    fn with_config_rejects_conflicting_ports() {
        let err = I8042Controller::with_config(I8042Config {
            data_port: 0x64,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::PortConflict { port: 0x64 }));
    }

    #[test]
    fn command_last_tracks_the_port_written() {
        let mut c = I8042Controller::new();
        c.write_port(CMD, 0xA7).unwrap();
        assert!(c.status().command_last);
        c.write_port(CMD, 0x60).unwrap();
        c.write_port(DATA, 0x00).unwrap();
        assert!(!c.status().command_last);
    }

    #[test]
    fn write_data_respects_interrupt_enables() {
        let mut c = I8042Controller::new();
        let kbd = IrqLine::new(1);
        let mouse = IrqLine::new(12);
        c.set_keyboard_irq(Box::new(kbd.clone()));
        c.set_mouse_irq(Box::new(mouse.clone()));

        c.write_data(0x11, Ps2Port::Keyboard);
        assert_eq!(c.data_register(), 0x11);
        assert!(c.status().output_full);
        assert!(!c.status().mouse_output_full);
        assert_eq!(kbd.pulses(), 0);

        c.write_port(CMD, 0x60).unwrap();
        c.write_port(DATA, 0x03).unwrap();

        c.write_data(0x22, Ps2Port::Keyboard);
        c.write_data(0x33, Ps2Port::Mouse);
        assert!(c.status().mouse_output_full);
        assert_eq!(kbd.pulses(), 1);
        assert_eq!(mouse.pulses(), 1);
        assert!(!kbd.is_raised());
        assert!(!mouse.is_raised());
    }

    #[test]
    fn read_data_out_prefers_keyboard_output() {
        let mut c = I8042Controller::new();
        c.write_port(CMD, 0xD4).unwrap();
        c.write_port(DATA, 0xF4).unwrap();
        assert_eq!(read(&mut c, DATA), 0xFA);

        c.inject_mouse_bytes(&[0x08, 0x01, 0x02]);
        c.inject_keyboard_bytes(&[0x1C, 0xF0, 0x1C]);

        // The first mouse byte was staged before the keyboard bytes arrived.
        let drained: Vec<u8> = (0..6).map(|_| read(&mut c, DATA)).collect();
        assert_eq!(drained, vec![0x08, 0x1C, 0xF0, 0x1C, 0x01, 0x02]);
        assert!(!c.status().output_full);
    }

    #[test]
    fn ram_and_pulse_ranges_cite_offsets() {
        let mut c = I8042Controller::new();
        assert_eq!(
            c.write_port(CMD, 0x21),
            Err(I8042Error::ReadControllerRam {
                command: 0x21,
                offset: 1
            })
        );
        assert_eq!(
            c.write_port(CMD, 0x3F),
            Err(I8042Error::ReadControllerRam {
                command: 0x3F,
                offset: 31
            })
        );
        assert_eq!(
            c.write_port(CMD, 0x7F),
            Err(I8042Error::WriteControllerRam {
                command: 0x7F,
                offset: 31
            })
        );
        assert_eq!(
            c.write_port(CMD, 0xFD),
            Err(I8042Error::PulseOutputBit {
                command: 0xFD,
                bit: 13
            })
        );
        // Just past each range.
        assert_eq!(
            c.write_port(CMD, 0x40),
            Err(I8042Error::UnknownControllerCommand { command: 0x40 })
        );
        assert!(matches!(
            c.write_port(CMD, 0xFE),
            Err(I8042Error::Unimplemented {
                device: DeviceKind::Controller,
                command: 0xFE,
                name: "System reset"
            })
        ));
    }

    #[test]
    fn command_table_round_trips_through_byte_values() {
        for byte in 0..=u8::MAX {
            if let Some(cmd) = ControllerCommand::from_byte(byte) {
                assert_eq!(cmd as u8, byte);
            }
        }
    }
}

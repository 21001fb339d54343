use crate::error::{DeviceKind, I8042Error, Result};
use crate::ps2::{Ps2Device, Ps2DeviceModel, BAT_SUCCESSFUL};

/// Standard PS/2 mouse identification byte.
pub const MOUSE_ID: [u8; 1] = [0x00];

pub const DEFAULT_SAMPLE_RATE: u8 = 100;
pub const DEFAULT_RESOLUTION: u8 = 4;

/// Host-to-mouse command bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MouseCommand {
    Scale1to1 = 0xE6,
    Scale2to1 = 0xE7,
    SetResolution = 0xE8,
    GetStatus = 0xE9,
    ReadData = 0xEA,
    ResetWrapMode = 0xEC,
    WrapMode = 0xEE,
    RemoteMode = 0xF0,
    ReadId = 0xF2,
    SampleRate = 0xF3,
    EnableReporting = 0xF4,
    DisableReporting = 0xF5,
    DefaultsAndDisable = 0xF6,
    Resend = 0xFE,
    Reset = 0xFF,
}

impl MouseCommand {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0xE6 => Self::Scale1to1,
            0xE7 => Self::Scale2to1,
            0xE8 => Self::SetResolution,
            0xE9 => Self::GetStatus,
            0xEA => Self::ReadData,
            0xEC => Self::ResetWrapMode,
            0xEE => Self::WrapMode,
            0xF0 => Self::RemoteMode,
            0xF2 => Self::ReadId,
            0xF3 => Self::SampleRate,
            0xF4 => Self::EnableReporting,
            0xF5 => Self::DisableReporting,
            0xF6 => Self::DefaultsAndDisable,
            0xFE => Self::Resend,
            0xFF => Self::Reset,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Scale1to1 => "set scaling 1:1",
            Self::Scale2to1 => "set scaling 2:1",
            Self::SetResolution => "set resolution",
            Self::GetStatus => "status request",
            Self::ReadData => "read data",
            Self::ResetWrapMode => "reset wrap mode",
            Self::WrapMode => "set wrap mode",
            Self::RemoteMode => "set remote mode",
            Self::ReadId => "read ID",
            Self::SampleRate => "set sample rate",
            Self::EnableReporting => "enable data reporting",
            Self::DisableReporting => "disable data reporting",
            Self::DefaultsAndDisable => "set defaults and disable",
            Self::Resend => "resend",
            Self::Reset => "reset",
        }
    }
}

/// Status byte reported by the status-request command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseStatus {
    pub right_button: bool,
    pub middle_button: bool,
    pub left_button: bool,
    pub two_to_one: bool,
    pub enabled: bool,
    pub remote: bool,
}

impl MouseStatus {
    const RIGHT_BUTTON: u8 = 1 << 0;
    const MIDDLE_BUTTON: u8 = 1 << 1;
    const LEFT_BUTTON: u8 = 1 << 2;
    const TWO_TO_ONE: u8 = 1 << 4;
    const ENABLED: u8 = 1 << 5;
    const REMOTE: u8 = 1 << 6;

    pub fn from_bits(bits: u8) -> Self {
        Self {
            right_button: bits & Self::RIGHT_BUTTON != 0,
            middle_button: bits & Self::MIDDLE_BUTTON != 0,
            left_button: bits & Self::LEFT_BUTTON != 0,
            two_to_one: bits & Self::TWO_TO_ONE != 0,
            enabled: bits & Self::ENABLED != 0,
            remote: bits & Self::REMOTE != 0,
        }
    }

    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        for (set, bit) in [
            (self.right_button, Self::RIGHT_BUTTON),
            (self.middle_button, Self::MIDDLE_BUTTON),
            (self.left_button, Self::LEFT_BUTTON),
            (self.two_to_one, Self::TWO_TO_ONE),
            (self.enabled, Self::ENABLED),
            (self.remote, Self::REMOTE),
        ] {
            if set {
                bits |= bit;
            }
        }
        bits
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectingData {
    Resolution,
    SampleRate,
}

/// PS/2 mouse command model.
#[derive(Debug)]
pub struct Ps2Mouse {
    port: Ps2Device,
    resolution: u8,
    sample_rate: u8,
    status: MouseStatus,
    expecting_data: Option<ExpectingData>,
}

impl Ps2Mouse {
    pub fn new() -> Self {
        Self {
            port: Ps2Device::new(),
            resolution: DEFAULT_RESOLUTION,
            sample_rate: DEFAULT_SAMPLE_RATE,
            status: MouseStatus::default(),
            expecting_data: None,
        }
    }

    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    pub fn sample_rate(&self) -> u8 {
        self.sample_rate
    }

    pub fn status(&self) -> MouseStatus {
        self.status
    }

    pub fn reporting_enabled(&self) -> bool {
        self.status.enabled
    }

    pub fn expecting_data(&self) -> Option<ExpectingData> {
        self.expecting_data
    }

    fn set_defaults(&mut self) {
        self.sample_rate = DEFAULT_SAMPLE_RATE;
        self.resolution = DEFAULT_RESOLUTION;
        self.status.two_to_one = false;
        self.status.enabled = false;
    }

    fn handle_data_byte(&mut self, expecting: ExpectingData, byte: u8) {
        match expecting {
            ExpectingData::Resolution => {
                tracing::debug!("mouse resolution set to {byte}");
                self.resolution = byte;
            }
            ExpectingData::SampleRate => {
                tracing::debug!("mouse sample rate set to {byte} samples per second");
                self.sample_rate = byte;
            }
        }
        self.port.ack();
    }
}

impl Default for Ps2Mouse {
    fn default() -> Self {
        Self::new()
    }
}

impl Ps2DeviceModel for Ps2Mouse {
    fn port(&self) -> &Ps2Device {
        &self.port
    }

    fn port_mut(&mut self) -> &mut Ps2Device {
        &mut self.port
    }

    fn process_data(&mut self, data: u8) -> Result<bool> {
        if let Some(expecting) = self.expecting_data.take() {
            self.handle_data_byte(expecting, data);
            return Ok(self.port.has_data());
        }

        let Some(cmd) = MouseCommand::from_byte(data) else {
            // Unlike the keyboard, the mouse NACKs commands it has never heard of and carries on.
            tracing::warn!("unknown mouse command {data:#04x}");
            self.port.nack();
            return Ok(self.port.has_data());
        };
        tracing::debug!("mouse command {data:#04x} ({})", cmd.name());

        match cmd {
            MouseCommand::Scale1to1 => {
                self.status.two_to_one = false;
                self.port.ack();
            }
            MouseCommand::Scale2to1 => {
                self.status.two_to_one = true;
                self.port.ack();
            }
            MouseCommand::SetResolution => {
                self.port.ack();
                self.expecting_data = Some(ExpectingData::Resolution);
            }
            MouseCommand::SampleRate => {
                self.port.ack();
                self.expecting_data = Some(ExpectingData::SampleRate);
            }
            MouseCommand::GetStatus => {
                self.port.ack();
                self.port.buffer_data(&[self.status.bits()]);
                self.port.buffer_data(&[self.resolution]);
                self.port.buffer_data(&[self.sample_rate]);
            }
            MouseCommand::ReadId => {
                self.port.ack();
                self.port.buffer_data(&MOUSE_ID);
            }
            MouseCommand::DisableReporting => {
                self.status.enabled = false;
                self.port.ack();
            }
            MouseCommand::EnableReporting => {
                self.status.enabled = true;
                self.port.ack();
            }
            MouseCommand::DefaultsAndDisable => {
                self.set_defaults();
                self.port.ack();
            }
            MouseCommand::Reset => {
                self.set_defaults();
                self.port.ack();
                self.port.buffer_data(&[BAT_SUCCESSFUL]);
                self.port.buffer_data(&MOUSE_ID);
            }
            MouseCommand::ReadData
            | MouseCommand::ResetWrapMode
            | MouseCommand::WrapMode
            | MouseCommand::RemoteMode
            | MouseCommand::Resend => {
                return Err(I8042Error::Unimplemented {
                    device: DeviceKind::Mouse,
                    command: data,
                    name: cmd.name(),
                });
            }
        }
        Ok(self.port.has_data())
    }
}

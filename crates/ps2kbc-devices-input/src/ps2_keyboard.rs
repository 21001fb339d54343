use crate::error::{DeviceKind, I8042Error, Result};
use crate::ps2::{Ps2Device, Ps2DeviceModel};

/// MF2 keyboard identification bytes, sent after the read-ID ACK.
pub const KEYBOARD_ID: [u8; 2] = [0xAB, 0x83];

/// Host-to-keyboard command bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyboardCommand {
    LedWrite = 0xED,
    DiagnosticEcho = 0xEE,
    AlternateScanCodes = 0xF0,
    ReadId = 0xF2,
    TypematicInfo = 0xF3,
    Enable = 0xF4,
    Disable = 0xF5,
    DefaultsAndDisable = 0xF6,
    AllKeysToTypematic = 0xF7,
    AllKeysToMakeRelease = 0xF8,
    AllKeysToMake = 0xF9,
    AllKeysToTypematicMakeRelease = 0xFA,
    KeyToTypematic = 0xFB,
    KeyToMakeRelease = 0xFC,
    KeyToMakeOnly = 0xFD,
    Resend = 0xFE,
    Reset = 0xFF,
}

impl KeyboardCommand {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0xED => Self::LedWrite,
            0xEE => Self::DiagnosticEcho,
            0xF0 => Self::AlternateScanCodes,
            0xF2 => Self::ReadId,
            0xF3 => Self::TypematicInfo,
            0xF4 => Self::Enable,
            0xF5 => Self::Disable,
            0xF6 => Self::DefaultsAndDisable,
            0xF7 => Self::AllKeysToTypematic,
            0xF8 => Self::AllKeysToMakeRelease,
            0xF9 => Self::AllKeysToMake,
            0xFA => Self::AllKeysToTypematicMakeRelease,
            0xFB => Self::KeyToTypematic,
            0xFC => Self::KeyToMakeRelease,
            0xFD => Self::KeyToMakeOnly,
            0xFE => Self::Resend,
            0xFF => Self::Reset,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LedWrite => "set LEDs",
            Self::DiagnosticEcho => "diagnostic echo",
            Self::AlternateScanCodes => "alternate scan codes",
            Self::ReadId => "read ID",
            Self::TypematicInfo => "set typematic info",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::DefaultsAndDisable => "set defaults and disable",
            Self::AllKeysToTypematic => "set all keys to typematic",
            Self::AllKeysToMakeRelease => "set all keys to make/release",
            Self::AllKeysToMake => "set all keys to make",
            Self::AllKeysToTypematicMakeRelease => "set all keys to typematic/make/release",
            Self::KeyToTypematic => "set key to typematic",
            Self::KeyToMakeRelease => "set key to make/release",
            Self::KeyToMakeOnly => "set key to make only",
            Self::Resend => "resend",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectingData {
    LedState,
    Typematic,
}

/// PS/2 keyboard command model.
///
/// Only the commands a guest needs to probe and configure the keyboard are modeled; everything
/// else is rejected with a diagnostic instead of being ACKed blindly.
#[derive(Debug, Default)]
pub struct Ps2Keyboard {
    port: Ps2Device,
    expecting_data: Option<ExpectingData>,
}

impl Ps2Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameter byte the keyboard is waiting for, if any.
    pub fn expecting_data(&self) -> Option<ExpectingData> {
        self.expecting_data
    }

    fn handle_data_byte(&mut self, expecting: ExpectingData, byte: u8) {
        match expecting {
            ExpectingData::LedState => {
                tracing::debug!(
                    caps_lock = byte & 0x04 != 0,
                    num_lock = byte & 0x02 != 0,
                    scroll_lock = byte & 0x01 != 0,
                    "keyboard LEDs set"
                );
            }
            ExpectingData::Typematic => {
                tracing::debug!("keyboard typematic info set to {byte:#04x}");
            }
        }
        self.port.ack();
    }
}

impl Ps2DeviceModel for Ps2Keyboard {
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

        let cmd = KeyboardCommand::from_byte(data)
            .ok_or(I8042Error::UnknownKeyboardCommand { command: data })?;
        tracing::debug!("keyboard command {data:#04x} ({})", cmd.name());

        match cmd {
            KeyboardCommand::LedWrite => {
                self.port.ack();
                self.expecting_data = Some(ExpectingData::LedState);
            }
            KeyboardCommand::TypematicInfo => {
                self.port.ack();
                self.expecting_data = Some(ExpectingData::Typematic);
            }
            KeyboardCommand::ReadId => {
                self.port.ack();
                self.port.buffer_data(&KEYBOARD_ID);
            }
            KeyboardCommand::Enable
            | KeyboardCommand::Disable
            | KeyboardCommand::DefaultsAndDisable => {
                self.port.ack();
            }
            KeyboardCommand::DiagnosticEcho
            | KeyboardCommand::AlternateScanCodes
            | KeyboardCommand::AllKeysToTypematic
            | KeyboardCommand::AllKeysToMakeRelease
            | KeyboardCommand::AllKeysToMake
            | KeyboardCommand::AllKeysToTypematicMakeRelease
            | KeyboardCommand::KeyToTypematic
            | KeyboardCommand::KeyToMakeRelease
            | KeyboardCommand::KeyToMakeOnly
            | KeyboardCommand::Resend
            | KeyboardCommand::Reset => {
                return Err(I8042Error::Unimplemented {
                    device: DeviceKind::Keyboard,
                    command: data,
                    name: cmd.name(),
                });
            }
        }
        Ok(self.port.has_data())
    }
}

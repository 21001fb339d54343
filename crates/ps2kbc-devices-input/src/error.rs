use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, I8042Error>;

/// Which part of the controller rejected a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Controller,
    Keyboard,
    Mouse,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Controller => "i8042",
            Self::Keyboard => "keyboard",
            Self::Mouse => "mouse",
        })
    }
}

/// Failures of the i8042 controller and its PS/2 devices.
///
/// Every variant is fatal for the simulated session: the caller is expected to stop driving the
/// controller and report the diagnostic. The one recoverable protocol error (an unknown mouse
/// command) is answered on the wire with a NACK and never surfaces here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum I8042Error {
    #[error("read from unrecognized port {port:#x}")]
    InvalidPortRead { port: u16 },

    #[error("write of {value:#04x} to unrecognized port {port:#x}")]
    InvalidPortWrite { port: u16, value: u8 },

    /// A command the hardware defines but this model does not.
    #[error("{device} command {command:#04x} ({name}) not implemented")]
    Unimplemented {
        device: DeviceKind,
        command: u8,
        name: &'static str,
    },

    #[error("unknown keyboard command {command:#04x}")]
    UnknownKeyboardCommand { command: u8 },

    #[error("unknown i8042 controller command {command:#04x}")]
    UnknownControllerCommand { command: u8 },

    #[error("i8042 read controller RAM command {command:#04x} (byte {offset}) not implemented")]
    ReadControllerRam { command: u8, offset: u8 },

    #[error("i8042 write controller RAM command {command:#04x} (byte {offset}) not implemented")]
    WriteControllerRam { command: u8, offset: u8 },

    #[error("i8042 pulse output bit command {command:#04x} (bit {bit}) not implemented")]
    PulseOutputBit { command: u8, bit: u8 },
}

impl I8042Error {
    /// The raw byte or port number the diagnostic is about.
    pub fn raw_value(&self) -> u16 {
        match *self {
            Self::InvalidPortRead { port } | Self::InvalidPortWrite { port, .. } => port,
            Self::Unimplemented { command, .. }
            | Self::UnknownKeyboardCommand { command }
            | Self::UnknownControllerCommand { command }
            | Self::ReadControllerRam { command, .. }
            | Self::WriteControllerRam { command, .. }
            | Self::PulseOutputBit { command, .. } => u16::from(command),
        }
    }

    pub fn is_unimplemented(&self) -> bool {
        matches!(
            self,
            Self::Unimplemented { .. }
                | Self::ReadControllerRam { .. }
                | Self::WriteControllerRam { .. }
                | Self::PulseOutputBit { .. }
        )
    }
}

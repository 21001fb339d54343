#![forbid(unsafe_code)]

//! Intel 8042 keyboard controller and the PS/2 keyboard and mouse behind it.

pub mod config;
pub mod error;
pub mod i8042;
pub mod ports;
pub mod ps2;
pub mod ps2_keyboard;
pub mod ps2_mouse;
pub mod registers;

pub use config::{ConfigError, I8042Config};
pub use error::{DeviceKind, I8042Error};
pub use i8042::{ControllerCommand, I8042Controller, Ps2Port};
pub use ports::{I8042Ports, SharedI8042Controller};
pub use ps2::{Ps2Device, Ps2DeviceModel, ACK, BAT_SUCCESSFUL, NACK};
pub use ps2_keyboard::{KeyboardCommand, Ps2Keyboard, KEYBOARD_ID};
pub use ps2_mouse::{MouseCommand, MouseStatus, Ps2Mouse, MOUSE_ID};
pub use registers::{CommandByte, PendingCommand, StatusRegister};

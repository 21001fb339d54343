//! i8042 controller registers.
//!
//! Registers are kept as named fields and only packed into their single-byte wire form when the
//! guest reads them.

/// Status register, read from the command port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusRegister {
    /// The data register holds a byte the host has not read yet.
    pub output_full: bool,
    pub input_full: bool,
    /// System flag, mirrored from the command byte.
    pub passed_self_test: bool,
    /// The last host write went to the command port rather than the data port.
    pub command_last: bool,
    pub keyboard_unlocked: bool,
    /// The byte in the data register came from the mouse.
    pub mouse_output_full: bool,
    pub timeout: bool,
    pub parity_error: bool,
}

impl StatusRegister {
    pub const OUTPUT_FULL: u8 = 1 << 0;
    pub const INPUT_FULL: u8 = 1 << 1;
    pub const PASSED_SELF_TEST: u8 = 1 << 2;
    pub const COMMAND_LAST: u8 = 1 << 3;
    pub const KEYBOARD_UNLOCKED: u8 = 1 << 4;
    pub const MOUSE_OUTPUT_FULL: u8 = 1 << 5;
    pub const TIMEOUT: u8 = 1 << 6;
    pub const PARITY_ERROR: u8 = 1 << 7;

    pub fn from_bits(bits: u8) -> Self {
        Self {
            output_full: bits & Self::OUTPUT_FULL != 0,
            input_full: bits & Self::INPUT_FULL != 0,
            passed_self_test: bits & Self::PASSED_SELF_TEST != 0,
            command_last: bits & Self::COMMAND_LAST != 0,
            keyboard_unlocked: bits & Self::KEYBOARD_UNLOCKED != 0,
            mouse_output_full: bits & Self::MOUSE_OUTPUT_FULL != 0,
            timeout: bits & Self::TIMEOUT != 0,
            parity_error: bits & Self::PARITY_ERROR != 0,
        }
    }

    pub fn bits(&self) -> u8 {
        pack(&[
            (self.output_full, Self::OUTPUT_FULL),
            (self.input_full, Self::INPUT_FULL),
            (self.passed_self_test, Self::PASSED_SELF_TEST),
            (self.command_last, Self::COMMAND_LAST),
            (self.keyboard_unlocked, Self::KEYBOARD_UNLOCKED),
            (self.mouse_output_full, Self::MOUSE_OUTPUT_FULL),
            (self.timeout, Self::TIMEOUT),
            (self.parity_error, Self::PARITY_ERROR),
        ])
    }
}

/// Controller command byte ("configuration byte").
///
/// Bits 3 and 7 have no modeled meaning but are stored so the byte reads back exactly as written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandByte {
    /// Interrupt when keyboard output is staged.
    pub keyboard_full_int: bool,
    /// Interrupt when mouse output is staged.
    pub mouse_full_int: bool,
    pub passed_self_test: bool,
    pub disable_keyboard: bool,
    pub disable_mouse: bool,
    pub convert_scan_codes: bool,
    reserved: u8,
}

impl CommandByte {
    pub const KEYBOARD_FULL_INT: u8 = 1 << 0;
    pub const MOUSE_FULL_INT: u8 = 1 << 1;
    pub const PASSED_SELF_TEST: u8 = 1 << 2;
    pub const DISABLE_KEYBOARD: u8 = 1 << 4;
    pub const DISABLE_MOUSE: u8 = 1 << 5;
    pub const CONVERT_SCAN_CODES: u8 = 1 << 6;
    const RESERVED_MASK: u8 = (1 << 3) | (1 << 7);

    pub fn from_bits(bits: u8) -> Self {
        Self {
            keyboard_full_int: bits & Self::KEYBOARD_FULL_INT != 0,
            mouse_full_int: bits & Self::MOUSE_FULL_INT != 0,
            passed_self_test: bits & Self::PASSED_SELF_TEST != 0,
            disable_keyboard: bits & Self::DISABLE_KEYBOARD != 0,
            disable_mouse: bits & Self::DISABLE_MOUSE != 0,
            convert_scan_codes: bits & Self::CONVERT_SCAN_CODES != 0,
            reserved: bits & Self::RESERVED_MASK,
        }
    }

    pub fn bits(&self) -> u8 {
        self.reserved
            | pack(&[
                (self.keyboard_full_int, Self::KEYBOARD_FULL_INT),
                (self.mouse_full_int, Self::MOUSE_FULL_INT),
                (self.passed_self_test, Self::PASSED_SELF_TEST),
                (self.disable_keyboard, Self::DISABLE_KEYBOARD),
                (self.disable_mouse, Self::DISABLE_MOUSE),
                (self.convert_scan_codes, Self::CONVERT_SCAN_CODES),
            ])
    }
}

fn pack(fields: &[(bool, u8)]) -> u8 {
    fields
        .iter()
        .filter(|(set, _)| *set)
        .fold(0, |acc, (_, bit)| acc | bit)
}

/// Controller command still waiting for its data-port byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PendingCommand {
    /// Data-port writes go to the keyboard.
    #[default]
    None,
    WriteCommandByte,
    WriteToMouse,
    WriteMouseOutputBuff,
}

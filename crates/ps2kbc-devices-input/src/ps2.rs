use std::collections::VecDeque;

use crate::error::Result;

/// Positive acknowledgment sent after every accepted command or parameter byte.
pub const ACK: u8 = 0xFA;
/// Negative acknowledgment (resend request).
pub const NACK: u8 = 0xFE;
/// Basic assurance test passed, sent after a device reset.
pub const BAT_SUCCESSFUL: u8 = 0xAA;

/// Output side shared by every PS/2 device: a FIFO of bytes waiting to be clocked out to the
/// controller, in transmission order.
#[derive(Debug, Clone, Default)]
pub struct Ps2Device {
    out: VecDeque<u8>,
}

impl Ps2Device {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ack(&mut self) {
        self.out.push_back(ACK);
    }

    pub fn nack(&mut self) {
        self.out.push_back(NACK);
    }

    pub fn buffer_data(&mut self, data: &[u8]) {
        self.out.extend(data.iter().copied());
    }

    pub fn has_data(&self) -> bool {
        !self.out.is_empty()
    }

    /// Removes and returns the oldest queued byte.
    pub fn get_data(&mut self) -> Option<u8> {
        self.out.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.out.len()
    }

}

/// A device attached to one of the controller's PS/2 ports.
pub trait Ps2DeviceModel {
    /// Shared output queue.
    fn port(&self) -> &Ps2Device;
    fn port_mut(&mut self) -> &mut Ps2Device;

    /// Receives one byte from the host and runs the device's command state machine.
    ///
    /// Returns whether the device has output queued afterwards, i.e. whether the controller
    /// should pull a byte into its output buffer.
    fn process_data(&mut self, data: u8) -> Result<bool>;

    fn has_data(&self) -> bool {
        self.port().has_data()
    }

    fn get_data(&mut self) -> Option<u8> {
        self.port_mut().get_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_leave_in_insertion_order() {
        let mut dev = Ps2Device::new();
        assert!(!dev.has_data());
        assert_eq!(dev.get_data(), None);

        dev.ack();
        dev.buffer_data(&[0x01, 0x02]);
        dev.buffer_data(&[]);
        dev.nack();

        assert!(dev.has_data());
        assert_eq!(dev.pending(), 4);

        let mut drained = Vec::new();
        while let Some(b) = dev.get_data() {
            drained.push(b);
        }
        assert_eq!(drained, vec![0xFA, 0x01, 0x02, 0xFE]);
        assert!(!dev.has_data());
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use ps2kbc_platform::io::{IoError, PortIoDevice, PortRange};
use ps2kbc_platform::Tick;

use crate::i8042::I8042Controller;

/// Shared i8042 controller handle, suitable for both port I/O emulation and host-side input
/// injection.
pub type SharedI8042Controller = Rc<RefCell<I8042Controller>>;

impl PortIoDevice for I8042Controller {
    fn address_ranges(&self) -> Vec<PortRange> {
        I8042Controller::address_ranges(self)
    }

    fn read(&mut self, port: u16) -> Result<(u8, Tick), IoError> {
        self.read_port(port).map_err(IoError::device)
    }

    fn write(&mut self, port: u16, value: u8) -> Result<Tick, IoError> {
        self.write_port(port, value).map_err(IoError::device)
    }

    fn reset(&mut self) {
        I8042Controller::reset(self);
    }
}

/// Bus-facing view of a shared [`I8042Controller`].
///
/// The bus owns this handle while the host keeps [`I8042Ports::controller`] to inject input and
/// inspect registers.
#[derive(Clone)]
pub struct I8042Ports {
    inner: SharedI8042Controller,
}

impl I8042Ports {
    pub fn new(controller: I8042Controller) -> Self {
        Self {
            inner: Rc::new(RefCell::new(controller)),
        }
    }

    /// Returns a cloneable handle to the shared controller for host-side input injection.
    pub fn controller(&self) -> SharedI8042Controller {
        self.inner.clone()
    }
}

impl Default for I8042Ports {
    fn default() -> Self {
        Self::new(I8042Controller::new())
    }
}

impl PortIoDevice for I8042Ports {
    fn address_ranges(&self) -> Vec<PortRange> {
        self.inner.borrow().address_ranges()
    }

    fn read(&mut self, port: u16) -> Result<(u8, Tick), IoError> {
        PortIoDevice::read(&mut *self.inner.borrow_mut(), port)
    }

    fn write(&mut self, port: u16, value: u8) -> Result<Tick, IoError> {
        PortIoDevice::write(&mut *self.inner.borrow_mut(), port, value)
    }

    fn reset(&mut self) {
        self.inner.borrow_mut().reset();
    }
}

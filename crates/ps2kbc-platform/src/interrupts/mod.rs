//! Interrupt pins driven by port-mapped devices.
//!
//! Devices never hold a pin high on their own: a notification is an edge, delivered as
//! [`InterruptPin::pulse`] (raise immediately followed by lower) within the same device call.

use std::cell::RefCell;
use std::rc::Rc;

/// Legacy ISA IRQ used by the keyboard port of an i8042.
pub const ISA_IRQ_KEYBOARD: u8 = 1;
/// Legacy ISA IRQ used by the auxiliary (mouse) port of an i8042.
pub const ISA_IRQ_MOUSE: u8 = 12;

/// An interrupt input a device can drive.
pub trait InterruptPin {
    fn raise(&mut self);
    fn lower(&mut self);

    /// Delivers an edge notification.
    fn pulse(&mut self) {
        self.raise();
        self.lower();
    }
}

/// A level change observed on an [`IrqLine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqEvent {
    Raise,
    Lower,
}

#[derive(Debug, Default)]
struct IrqLineState {
    raised: bool,
    events: Vec<IrqEvent>,
}

/// Cloneable interrupt pin that records every level change.
///
/// All clones share the same state, so one clone can be handed to a device while another is kept
/// by the host to observe the pulses.
#[derive(Debug, Clone, Default)]
pub struct IrqLine {
    irq: u8,
    state: Rc<RefCell<IrqLineState>>,
}

impl IrqLine {
    pub fn new(irq: u8) -> Self {
        Self {
            irq,
            state: Rc::default(),
        }
    }

    pub fn irq(&self) -> u8 {
        self.irq
    }

    pub fn is_raised(&self) -> bool {
        self.state.borrow().raised
    }

    pub fn events(&self) -> Vec<IrqEvent> {
        self.state.borrow().events.clone()
    }

    /// Number of complete raise-then-lower pairs seen so far.
    pub fn pulses(&self) -> usize {
        self.state
            .borrow()
            .events
            .windows(2)
            .filter(|w| matches!(w, [IrqEvent::Raise, IrqEvent::Lower]))
            .count()
    }

    /// Drains the recorded events.
    pub fn take_events(&self) -> Vec<IrqEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }
}

impl InterruptPin for IrqLine {
    fn raise(&mut self) {
        tracing::trace!(irq = self.irq, "irq raised");
        let mut state = self.state.borrow_mut();
        state.raised = true;
        state.events.push(IrqEvent::Raise);
    }

    fn lower(&mut self) {
        tracing::trace!(irq = self.irq, "irq lowered");
        let mut state = self.state.borrow_mut();
        state.raised = false;
        state.events.push(IrqEvent::Lower);
    }
}

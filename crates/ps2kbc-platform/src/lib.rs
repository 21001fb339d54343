#![forbid(unsafe_code)]

//! Port I/O and interrupt plumbing shared by the `ps2kbc` device models.

pub mod interrupts;
pub mod io;

pub use io::Tick;

use thiserror::Error;

/// Simulation time unit. One tick is one picosecond.
pub type Tick = u64;

/// Errors surfaced by the port bus.
///
/// Device models report their own failures through [`IoError::Device`] so that the caller driving
/// the bus sees a single error type regardless of which device rejected the access.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("no device mapped at port {port:#x}")]
    Unmapped { port: u16 },

    #[error(
        "overlapping I/O port ranges: new=[{start:#x}..{end:#x}) existing=[{existing_start:#x}..{existing_end:#x})"
    )]
    Overlap {
        start: u32,
        end: u32,
        existing_start: u32,
        existing_end: u32,
    },

    #[error("invalid I/O port range: start={start:#x} len={len:#x}")]
    InvalidRange { start: u16, len: u16 },

    #[error(transparent)]
    Device(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl IoError {
    /// Wraps a device-specific failure.
    pub fn device<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Device(Box::new(err))
    }

    /// Returns the device-specific failure, if this error carries one of type `E`.
    pub fn downcast_device<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Device(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// A contiguous range of single-byte I/O ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub start: u16,
    pub len: u16,
}

impl PortRange {
    pub const fn new(start: u16, len: u16) -> Self {
        Self { start, len }
    }

    /// A range covering exactly one port.
    pub const fn single(port: u16) -> Self {
        Self { start: port, len: 1 }
    }

    pub fn end_exclusive(&self) -> u32 {
        u32::from(self.start) + u32::from(self.len)
    }

    pub fn contains(&self, port: u16) -> bool {
        let p = u32::from(port);
        p >= u32::from(self.start) && p < self.end_exclusive()
    }
}

/// A device reachable through byte-wide port I/O.
///
/// Every access is atomic: it fully updates device state and reports the fixed cost of the access
/// so the caller can advance its clock.
pub trait PortIoDevice {
    /// Ports this device answers to. Queried once when the device is mapped.
    fn address_ranges(&self) -> Vec<PortRange>;

    fn read(&mut self, port: u16) -> Result<(u8, Tick), IoError>;

    fn write(&mut self, port: u16, value: u8) -> Result<Tick, IoError>;

    /// Reset the device back to its power-on state.
    fn reset(&mut self) {}
}

/// Handle returned by [`IoPortBus::map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(usize);

struct RangeEntry {
    range: PortRange,
    dev: usize,
}

/// Routes port accesses to mapped devices by address range.
#[derive(Default)]
pub struct IoPortBus {
    devices: Vec<Box<dyn PortIoDevice>>,
    // Sorted by start port, never overlapping.
    ranges: Vec<RangeEntry>,
}

impl IoPortBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps every range the device reports via [`PortIoDevice::address_ranges`].
    ///
    /// Either all ranges are mapped or none are: an overlap with an existing mapping (or between
    /// the device's own ranges) leaves the bus unchanged.
    pub fn map(&mut self, device: Box<dyn PortIoDevice>) -> Result<DeviceId, IoError> {
        let ranges = device.address_ranges();
        let idx = self.devices.len();

        let mut staged: Vec<RangeEntry> = Vec::with_capacity(ranges.len());
        for range in ranges {
            if range.len == 0 || range.end_exclusive() > 0x1_0000 {
                return Err(IoError::InvalidRange {
                    start: range.start,
                    len: range.len,
                });
            }
            let clash = self
                .ranges
                .iter()
                .chain(staged.iter())
                .find(|existing| overlaps(&existing.range, &range));
            if let Some(existing) = clash {
                return Err(IoError::Overlap {
                    start: u32::from(range.start),
                    end: range.end_exclusive(),
                    existing_start: u32::from(existing.range.start),
                    existing_end: existing.range.end_exclusive(),
                });
            }
            staged.push(RangeEntry { range, dev: idx });
        }

        for entry in staged {
            tracing::debug!(
                start = entry.range.start,
                len = entry.range.len,
                device = idx,
                "mapped I/O port range"
            );
            let at = self
                .ranges
                .partition_point(|r| r.range.start < entry.range.start);
            self.ranges.insert(at, entry);
        }
        self.devices.push(device);
        Ok(DeviceId(idx))
    }

    /// Returns the device answering `port`, if any.
    pub fn device_at(&self, port: u16) -> Option<DeviceId> {
        self.find_range_index(port)
            .map(|idx| DeviceId(self.ranges[idx].dev))
    }

    fn find_range_index(&self, port: u16) -> Option<usize> {
        let idx = self.ranges.partition_point(|r| r.range.start <= port);
        if idx == 0 {
            return None;
        }
        let cand = idx - 1;
        self.ranges
            .get(cand)
            .is_some_and(|r| r.range.contains(port))
            .then_some(cand)
    }

    fn device_for(&mut self, port: u16) -> Result<&mut Box<dyn PortIoDevice>, IoError> {
        let idx = self
            .find_range_index(port)
            .ok_or(IoError::Unmapped { port })?;
        let dev = self.ranges[idx].dev;
        Ok(&mut self.devices[dev])
    }

    pub fn read(&mut self, port: u16) -> Result<(u8, Tick), IoError> {
        self.device_for(port)?.read(port)
    }

    pub fn write(&mut self, port: u16, value: u8) -> Result<Tick, IoError> {
        self.device_for(port)?.write(port, value)
    }

    pub fn reset(&mut self) {
        for dev in self.devices.iter_mut() {
            dev.reset();
        }
    }
}

fn overlaps(a: &PortRange, b: &PortRange) -> bool {
    u32::from(a.start) < b.end_exclusive() && u32::from(b.start) < a.end_exclusive()
}

//! HID interface discovery and raw I/O.

use std::ffi::{CStr, CString};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::error::{HidError, HidResult};

/// SteelSeries USB vendor id
pub const STEELSERIES_VENDOR_ID: u16 = 0x1038;
/// Arctis Nova Pro base station product ids (wired, wireless, and Xbox variants)
pub const SUPPORTED_PRODUCT_IDS: [u16; 5] = [0x12CB, 0x12CD, 0x12E0, 0x12E5, 0x225D];
/// Interface the base station exposes for telemetry and control
pub const BASE_STATION_INTERFACE: i32 = 4;

/// Which interfaces count as a base station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceMatch {
    pub vendor_id: u16,
    pub product_ids: Vec<u16>,
    pub interface_number: i32,
}

impl Default for DeviceMatch {
    fn default() -> Self {
        Self {
            vendor_id: STEELSERIES_VENDOR_ID,
            product_ids: SUPPORTED_PRODUCT_IDS.to_vec(),
            interface_number: BASE_STATION_INTERFACE,
        }
    }
}

/// An enumerated HID interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub path: CString,
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface_number: i32,
}

/// An open HID handle.
pub trait HidHandle: Send {
    /// Write an output report. Returns the number of bytes written.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    fn write(&self, data: &[u8]) -> HidResult<usize>;

    /// Send a feature report.
    ///
    /// # Errors
    /// Returns an error if the transfer fails.
    fn send_feature_report(&self, data: &[u8]) -> HidResult<()>;

    /// Read one input report, waiting at most `timeout_ms`.
    /// Returns 0 on timeout.
    ///
    /// # Errors
    /// Returns an error if the read fails.
    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> HidResult<usize>;
}

impl HidHandle for hidapi::HidDevice {
    fn write(&self, data: &[u8]) -> HidResult<usize> {
        Ok(hidapi::HidDevice::write(self, data)?)
    }

    fn send_feature_report(&self, data: &[u8]) -> HidResult<()> {
        Ok(hidapi::HidDevice::send_feature_report(self, data)?)
    }

    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> HidResult<usize> {
        Ok(hidapi::HidDevice::read_timeout(self, buf, timeout_ms)?)
    }
}

/// Source of HID interfaces.
pub trait HidBackend: Send {
    /// List interfaces of one vendor/product pair.
    ///
    /// # Errors
    /// Returns an error if enumeration fails.
    fn enumerate(&mut self, vendor_id: u16, product_id: u16) -> HidResult<Vec<InterfaceInfo>>;

    /// Open an interface by path.
    ///
    /// # Errors
    /// Returns an error if the device cannot be opened.
    fn open(&self, path: &CStr) -> HidResult<Box<dyn HidHandle>>;
}

/// [`HidBackend`] backed by the system hidapi library.
pub struct HidApiBackend {
    api: hidapi::HidApi,
}

impl HidApiBackend {
    /// Initialize hidapi.
    ///
    /// # Errors
    /// Returns an error if the hidapi library cannot be initialized.
    pub fn new() -> HidResult<Self> {
        Ok(Self { api: hidapi::HidApi::new()? })
    }
}

impl HidBackend for HidApiBackend {
    fn enumerate(&mut self, vendor_id: u16, product_id: u16) -> HidResult<Vec<InterfaceInfo>> {
        self.api.refresh_devices()?;
        Ok(self
            .api
            .device_list()
            .filter(|dev| dev.vendor_id() == vendor_id && dev.product_id() == product_id)
            .map(|dev| InterfaceInfo {
                path: dev.path().to_owned(),
                vendor_id: dev.vendor_id(),
                product_id: dev.product_id(),
                interface_number: dev.interface_number(),
            })
            .collect())
    }

    fn open(&self, path: &CStr) -> HidResult<Box<dyn HidHandle>> {
        Ok(Box::new(self.api.open_path(path)?))
    }
}

/// Role a handle plays for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleRole {
    /// Telemetry reads, queries
    Info,
    /// Display and settings writes
    Display,
}

/// The open base station handles.
///
/// The first matching interface is the display handle, the second the info
/// handle. With a single interface both roles share it.
pub struct HidTransport {
    handles: Vec<Box<dyn HidHandle>>,
    info: usize,
    display: usize,
}

impl std::fmt::Debug for HidTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidTransport")
            .field("handles", &self.handles.len())
            .field("info", &self.info)
            .field("display", &self.display)
            .finish()
    }
}

impl HidTransport {
    /// Find and open the base station interfaces.
    ///
    /// # Errors
    /// Returns [`HidError::DeviceNotFound`] if no interface matches, or the
    /// underlying error if enumeration or opening fails.
    pub fn open(backend: &mut dyn HidBackend, matcher: &DeviceMatch) -> HidResult<Self> {
        let mut found = Vec::new();
        for product_id in &matcher.product_ids {
            found.extend(
                backend
                    .enumerate(matcher.vendor_id, *product_id)?
                    .into_iter()
                    .filter(|iface| iface.interface_number == matcher.interface_number),
            );
        }

        if found.is_empty() {
            debug!(vendor_id = matcher.vendor_id, "No base station interface found");
            return Err(HidError::DeviceNotFound {
                vendor_id: matcher.vendor_id,
                interface: matcher.interface_number,
            });
        }

        let mut handles = Vec::with_capacity(2);
        for iface in found.iter().take(2) {
            debug!(path = ?iface.path, product_id = iface.product_id, "Opening HID interface");
            handles.push(backend.open(&iface.path)?);
        }

        let info_index = usize::from(handles.len() > 1);
        info!(
            product_id = found[0].product_id,
            handles = handles.len(),
            "Base station connected"
        );
        Ok(Self { handles, info: info_index, display: 0 })
    }

    fn handle(&self, role: HandleRole) -> HidResult<&dyn HidHandle> {
        let index = match role {
            HandleRole::Info => self.info,
            HandleRole::Display => self.display,
        };
        self.handles.get(index).map(|handle| &**handle).ok_or(HidError::NotConnected)
    }

    /// Roles to poll for input, each physical handle once, info first.
    #[must_use]
    pub fn poll_order(&self) -> Vec<HandleRole> {
        if self.info == self.display {
            vec![HandleRole::Info]
        } else {
            vec![HandleRole::Info, HandleRole::Display]
        }
    }

    /// Number of open handles.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Read one report. Returns an empty buffer on timeout.
    ///
    /// # Errors
    /// Returns an error if the transport is closed or the read fails.
    pub fn read(&self, role: HandleRole, max_len: usize, timeout_ms: i32) -> HidResult<Vec<u8>> {
        let mut buf = vec![0u8; max_len];
        let n = self.handle(role)?.read_timeout(&mut buf, timeout_ms)?;
        buf.truncate(n);
        if n > 0 {
            trace!(?role, bytes = ?buf, "HID report");
        }
        Ok(buf)
    }

    /// Write an output report.
    ///
    /// # Errors
    /// Returns an error if the transport is closed or the write fails.
    pub fn write(&self, role: HandleRole, data: &[u8]) -> HidResult<()> {
        let written = self.handle(role)?.write(data)?;
        if written != data.len() {
            return Err(HidError::Transport(format!(
                "short write: {written} of {} bytes",
                data.len()
            )));
        }
        Ok(())
    }

    /// Send a feature report on the display handle.
    ///
    /// # Errors
    /// Returns an error if the transport is closed or the transfer fails.
    pub fn write_feature_report(&self, data: &[u8]) -> HidResult<()> {
        self.handle(HandleRole::Display)?.send_feature_report(data)
    }

    /// Release both handles. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.handles.is_empty() {
            debug!(handles = self.handles.len(), "Closing HID handles");
            self.handles.clear();
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.handles.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeBackend;
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_open_assigns_display_then_info() {
        let mut backend = FakeBackend::new(&["dev-a", "dev-b"]);
        let transport = HidTransport::open(&mut backend, &DeviceMatch::default()).unwrap();
        backend.device(1).queue(&[0x07, 0xB7, 80, 30, 0]);

        assert_eq!(transport.handle_count(), 2);
        assert_eq!(transport.poll_order(), vec![HandleRole::Info, HandleRole::Display]);
        // dev-b is the info handle
        assert_eq!(transport.read(HandleRole::Info, 64, 1).unwrap(), vec![0x07, 0xB7, 80, 30, 0]);
        assert!(transport.read(HandleRole::Display, 64, 1).unwrap().is_empty());

        transport.write(HandleRole::Display, &[0x06, 0x95]).unwrap();
        assert_eq!(backend.device(0).writes.lock().len(), 1);
    }

    #[test]
    fn test_single_interface_shares_roles() {
        let mut backend = FakeBackend::new(&["only"]);
        let transport = HidTransport::open(&mut backend, &DeviceMatch::default()).unwrap();

        assert_eq!(transport.handle_count(), 1);
        assert_eq!(transport.poll_order(), vec![HandleRole::Info]);
        transport.write(HandleRole::Info, &[1]).unwrap();
        transport.write(HandleRole::Display, &[2]).unwrap();
        assert_eq!(backend.device(0).writes.lock().len(), 2);
    }

    #[test]
    fn test_only_first_two_interfaces_opened() {
        let mut backend = FakeBackend::new(&["a", "b", "c"]);
        let _transport = HidTransport::open(&mut backend, &DeviceMatch::default()).unwrap();

        assert_eq!(backend.opened.lock().len(), 2);
    }

    #[test]
    fn test_no_device_is_discovery_error() {
        let mut backend = FakeBackend::new(&[]);
        let err = HidTransport::open(&mut backend, &DeviceMatch::default()).unwrap_err();

        assert_matches!(err, HidError::DeviceNotFound { vendor_id: 0x1038, interface: 4 });
        assert_eq!(err.kind(), novabridge_core::ErrorKind::Discovery);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut backend = FakeBackend::new(&["dev-a", "dev-b"]);
        let mut transport = HidTransport::open(&mut backend, &DeviceMatch::default()).unwrap();

        transport.close();
        transport.close();

        assert!(transport.is_closed());
        assert_matches!(transport.write(HandleRole::Info, &[1]), Err(HidError::NotConnected));
    }
}

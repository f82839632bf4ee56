//! Wi-Fi station adapter.
//!
//! Implements [`WifiControl`]: validates the credentials held by the
//! settings actor and tries the primary network, then the backup.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: the STA association is owned by the
//!   board bring-up code; this adapter records the attempt.
//! - **all other targets**: the host network is assumed up, so any valid
//!   credential pair "connects".

use core::fmt;

use log::{info, warn};

use crate::app::ports::{WifiControl, WifiCredentials};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no Wi-Fi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (8-64 bytes, or empty for open)"),
            Self::ConnectionFailed => write!(f, "Wi-Fi connection failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected { backup: bool },
    Failed,
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate(ssid: &str, password: &str) -> Result<(), WifiError> {
    if ssid.is_empty() {
        return Err(WifiError::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(WifiError::InvalidSsid);
    }
    if !password.is_empty() && !(8..=64).contains(&password.len()) {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Network currently associated, empty when disconnected.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    fn try_network(&mut self, ssid: &str, password: &str) -> Result<(), WifiError> {
        validate(ssid, password)?;
        self.platform_connect(ssid, password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|_| WifiError::InvalidSsid)?;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, ssid: &str, _password: &str) -> Result<(), WifiError> {
        info!("Wifi(espidf): association with '{}' requested", ssid);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, ssid: &str, _password: &str) -> Result<(), WifiError> {
        info!("Wifi(host): '{}' assumed reachable", ssid);
        Ok(())
    }
}

impl WifiControl for WifiAdapter {
    fn init_wifi(&mut self, credentials: &WifiCredentials<'_>) -> bool {
        if matches!(self.state, WifiState::Connected { .. }) {
            return true;
        }
        match self.try_network(credentials.ssid, credentials.pass) {
            Ok(()) => {
                self.state = WifiState::Connected { backup: false };
                return true;
            }
            Err(e) => warn!("Wifi: primary network unusable: {}", e),
        }
        match self.try_network(credentials.ssid_backup, credentials.pass_backup) {
            Ok(()) => {
                info!("Wifi: connected to backup network");
                self.state = WifiState::Connected { backup: true };
                true
            }
            Err(e) => {
                warn!("Wifi: backup network unusable: {}", e);
                self.state = WifiState::Failed;
                false
            }
        }
    }

    fn stop_wifi(&mut self) {
        if self.state != WifiState::Disconnected {
            info!("Wifi: disconnected from '{}'", self.ssid);
        }
        self.ssid.clear();
        self.state = WifiState::Disconnected;
    }
}

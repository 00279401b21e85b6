use crate::message::response_key;
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Undecoded answer of the multiplexed status query.
///
/// Maps each `<SubAction>Response` key to that sub-action's result map.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct RawStatus(Map<String, Value>);

impl RawStatus {
    /// Result map of `sub_action`, if present and an object
    pub fn sub_response(&self, sub_action: &str) -> Option<&Map<String, Value>> {
        self.0.get(&response_key(sub_action)).and_then(Value::as_object)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for RawStatus {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Identity of the device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DeviceInfo {
    pub model: String,
    pub serial_number: String,
    pub mac_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DeviceSettings {
    /// Front panel LEDs configured on
    pub front_panel_lights_on: bool,
    pub energy_efficient_ethernet_on: bool,
    pub ask_me_later: bool,
    pub never_ask: bool,
}

/// Hashes reported by the account page. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AuthSettings {
    pub current_login: String,
    pub current_name_admin: String,
    pub current_name_user: String,
    pub current_password_admin: String,
    pub current_password_user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SoftwareStatus {
    pub firmware_version: String,
    pub certificate_installed: bool,
    pub customer_version: String,
    pub hd_version: String,
    pub docsis_spec_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BootStatus {
    pub status: bool,
    pub operational: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ConfigFileStatus {
    pub status: bool,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ConnectivityStatus {
    pub status: bool,
    pub operational: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DownstreamStatus {
    pub frequency_hz: u32,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SecurityStatus {
    pub enabled: bool,
    pub comment: String,
}

/// Startup sequence as reported by the device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StartupStatus {
    pub boot: BootStatus,
    pub config_file: ConfigFileStatus,
    pub connectivity: ConnectivityStatus,
    pub downstream: DownstreamStatus,
    pub security: SecurityStatus,
}

/// One row of the downstream channel table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DownstreamChannel {
    pub lock_status: String,
    pub modulation: String,
    pub channel_id: u8,
    pub frequency_hz: u32,
    pub signal_power_dbmv: i32,
    pub signal_snr_mer_db: i32,
    pub corrected_errors: u64,
    pub uncorrected_errors: u64,
}

impl DownstreamChannel {
    pub fn is_locked(&self) -> bool {
        self.lock_status == "Locked"
    }
}

/// One row of the upstream channel table
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UpstreamChannel {
    pub lock_status: String,
    pub modulation: String,
    pub channel_id: u8,
    pub width_hz: u32,
    pub frequency_hz: u32,
    pub signal_power_dbmv: f32,
}

impl UpstreamChannel {
    pub fn is_locked(&self) -> bool {
        self.lock_status == "Locked"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DownstreamConnectionStatus {
    pub plan: String,
    /// Primary downstream channel
    pub frequency_hz: u32,
    pub signal_power_dbmv: i32,
    pub signal_snr_db: i32,
    pub channels: Vec<DownstreamChannel>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UpstreamConnectionStatus {
    /// Primary upstream channel
    pub channel_id: u8,
    pub channels: Vec<UpstreamChannel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStatus {
    /// Device clock at the time of the query
    pub system_time: DateTime<Local>,
    pub up_time: Duration,
    /// `system_time - up_time`
    pub established_at: DateTime<Local>,
    pub docsis_network_access_allowed: bool,
    pub internet_connected: bool,
    pub downstream: DownstreamConnectionStatus,
    pub upstream: UpstreamConnectionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

/// Fully decoded status of the cable modem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CableModemStatus {
    pub info: DeviceInfo,
    pub settings: DeviceSettings,
    pub auth: AuthSettings,
    pub software: SoftwareStatus,
    pub startup: StartupStatus,
    pub connection: ConnectionStatus,
    pub logs: Vec<LogEntry>,
}

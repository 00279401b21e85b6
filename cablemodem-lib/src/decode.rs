//! Status decoder
//!
//! Turns a [`RawStatus`] into a [`CableModemStatus`]. Each field is read through
//! a [`SubResponse`] accessor that names its sub-action, key and semantic type,
//! so a missing or malformed field becomes a [`DecodeError`] naming both.
//! Unknown extra fields are ignored.

use crate::constants::*;
use crate::error::{DecodeError, HnapError, Result, ValidationFailure};
use crate::message::{check_result, pretty, response_key};
use crate::parse;
use crate::status::*;
use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Typed view over one sub-action's result map
#[derive(Debug, Clone, Copy)]
pub struct SubResponse<'a> {
    action: &'a str,
    data: &'a Map<String, Value>,
}

impl<'a> SubResponse<'a> {
    pub fn of(raw: &'a RawStatus, action: &'a str) -> Result<Self, DecodeError> {
        let data = raw
            .sub_response(action)
            .ok_or_else(|| DecodeError::new(action, response_key(action), "sub-response missing"))?;
        Ok(Self { action, data })
    }

    pub fn action(&self) -> &'a str {
        self.action
    }

    fn convert<T>(&self, field: &str, parse: impl FnOnce(&str) -> Result<T, String>) -> Result<T, DecodeError> {
        let value = self.string(field)?;
        parse(value).map_err(|reason| DecodeError::new(self.action, field, reason))
    }

    pub fn string(&self, field: &str) -> Result<&'a str, DecodeError> {
        match self.data.get(field) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(other) => Err(DecodeError::new(
                self.action,
                field,
                format!("expected a string, got {other}"),
            )),
            None => Err(DecodeError::new(self.action, field, "field missing")),
        }
    }

    pub fn owned(&self, field: &str) -> Result<String, DecodeError> {
        self.string(field).map(str::to_string)
    }

    /// True iff the field equals this field's own "true" token
    pub fn flag(&self, field: &str, true_token: &str) -> Result<bool, DecodeError> {
        Ok(self.string(field)? == true_token)
    }

    pub fn frequency_hz(&self, field: &str) -> Result<u32, DecodeError> {
        self.convert(field, parse::parse_frequency_hz)
    }

    pub fn power_dbmv(&self, field: &str) -> Result<i32, DecodeError> {
        self.convert(field, parse::parse_power_dbmv)
    }

    pub fn snr_db(&self, field: &str) -> Result<i32, DecodeError> {
        self.convert(field, parse::parse_snr_db)
    }

    pub fn channel_id(&self, field: &str) -> Result<u8, DecodeError> {
        self.convert(field, parse::parse_channel_id)
    }

    pub fn system_time(&self, field: &str) -> Result<DateTime<Local>, DecodeError> {
        self.convert(field, parse::parse_system_time)
    }

    pub fn duration(&self, field: &str) -> Result<Duration, DecodeError> {
        self.convert(field, parse::parse_duration)
    }
}

/// Check every sub-action is present and reports `OK`
pub fn validate(raw: &RawStatus) -> Result<()> {
    for action in STATUS_SUB_ACTIONS {
        let key = response_key(action);
        let unpacked = match raw.as_map().get(&key) {
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(HnapError::Validation {
                    action: action.to_string(),
                    failure: ValidationFailure::NotAnObject(key),
                    payload: pretty(other),
                });
            }
            None => {
                return Err(HnapError::Validation {
                    action: action.to_string(),
                    failure: ValidationFailure::MissingResponseKey(key),
                    payload: pretty(raw.as_map()),
                });
            }
        };
        check_result(action, unpacked)?;
    }
    Ok(())
}

/// Validate and decode the raw status, logging cross-check mismatches
pub fn parse_raw_status(raw: &RawStatus) -> Result<CableModemStatus> {
    validate(raw)?;
    for mismatch in cross_check(raw) {
        warn!("{mismatch}");
    }

    Ok(CableModemStatus {
        info: decode_device_info(raw)?,
        settings: decode_device_settings(raw)?,
        auth: decode_auth_settings(raw)?,
        software: decode_software_status(raw)?,
        startup: decode_startup_status(raw)?,
        connection: decode_connection_status(raw)?,
        logs: decode_log_entries(raw)?,
    })
}

fn decode_device_info(raw: &RawStatus) -> Result<DeviceInfo, DecodeError> {
    let reg = SubResponse::of(raw, GET_ARRIS_REGISTER_INFO)?;
    Ok(DeviceInfo {
        model: reg.owned("ModelName")?,
        serial_number: reg.owned("SerialNumber")?,
        mac_address: reg.owned("MacAddress")?,
    })
}

fn decode_device_settings(raw: &RawStatus) -> Result<DeviceSettings, DecodeError> {
    let conf = SubResponse::of(raw, GET_ARRIS_CONFIGURATION_INFO)?;
    let reg = SubResponse::of(raw, GET_ARRIS_REGISTER_STATUS)?;
    Ok(DeviceSettings {
        front_panel_lights_on: conf.flag("LedStatus", "1")?,
        energy_efficient_ethernet_on: conf.flag("ethSWEthEEE", "1")?,
        ask_me_later: reg.flag("AskMeLater", "1")?,
        never_ask: reg.flag("NeverAsk", "1")?,
    })
}

fn decode_auth_settings(raw: &RawStatus) -> Result<AuthSettings, DecodeError> {
    let acc = SubResponse::of(raw, GET_CUSTOMER_STATUS_SEC_ACCOUNT)?;
    Ok(AuthSettings {
        current_login: acc.owned("CurrentLogin")?,
        current_name_admin: acc.owned("CurrentNameAdmin")?,
        current_name_user: acc.owned("CurrentNameUser")?,
        current_password_admin: acc.owned("CurrentPwAdmin")?,
        current_password_user: acc.owned("CurrentPwUser")?,
    })
}

fn decode_software_status(raw: &RawStatus) -> Result<SoftwareStatus, DecodeError> {
    let sw = SubResponse::of(raw, GET_CUSTOMER_STATUS_SOFTWARE)?;
    Ok(SoftwareStatus {
        firmware_version: sw.owned("StatusSoftwareSfVer")?,
        certificate_installed: sw.flag("StatusSoftwareCertificate", "Installed")?,
        customer_version: sw.owned("StatusSoftwareCustomerVer")?,
        hd_version: sw.owned("StatusSoftwareHdVer")?,
        docsis_spec_version: sw.owned("StatusSoftwareSpecVer")?,
    })
}

fn decode_startup_status(raw: &RawStatus) -> Result<StartupStatus, DecodeError> {
    let startup = SubResponse::of(raw, GET_CUSTOMER_STATUS_STARTUP_SEQUENCE)?;
    Ok(StartupStatus {
        boot: BootStatus {
            status: startup.flag("CustomerConnBootStatus", "OK")?,
            operational: startup.flag("CustomerConnBootComment", "Operational")?,
        },
        config_file: ConfigFileStatus {
            status: startup.flag("CustomerConnConfigurationFileStatus", "OK")?,
            comment: startup.owned("CustomerConnConfigurationFileComment")?,
        },
        connectivity: ConnectivityStatus {
            status: startup.flag("CustomerConnConnectivityStatus", "OK")?,
            operational: startup.flag("CustomerConnConnectivityComment", "Operational")?,
        },
        downstream: DownstreamStatus {
            frequency_hz: startup.frequency_hz("CustomerConnDSFreq")?,
            locked: startup.flag("CustomerConnDSComment", "Locked")?,
        },
        security: SecurityStatus {
            enabled: startup.flag("CustomerConnSecurityStatus", "Enabled")?,
            comment: startup.owned("CustomerConnSecurityComment")?,
        },
    })
}

fn decode_connection_status(raw: &RawStatus) -> Result<ConnectionStatus, DecodeError> {
    let conn = SubResponse::of(raw, GET_CUSTOMER_STATUS_CONNECTION_INFO)?;
    let dev = SubResponse::of(raw, GET_ARRIS_DEVICE_STATUS)?;
    let config = SubResponse::of(raw, GET_ARRIS_CONFIGURATION_INFO)?;
    let ds_info = SubResponse::of(raw, GET_CUSTOMER_STATUS_DOWNSTREAM_CHANNEL_INFO)?;
    let us_info = SubResponse::of(raw, GET_CUSTOMER_STATUS_UPSTREAM_CHANNEL_INFO)?;

    let system_time = conn.system_time("CustomerCurSystemTime")?;
    let up_time = conn.duration("CustomerConnSystemUpTime")?;
    let established_at = chrono::Duration::from_std(up_time)
        .ok()
        .and_then(|up| system_time.checked_sub_signed(up))
        .ok_or_else(|| {
            DecodeError::new(
                conn.action(),
                "CustomerConnSystemUpTime",
                format!("uptime {up_time:?} reaches before the representable time range"),
            )
        })?;

    Ok(ConnectionStatus {
        system_time,
        up_time,
        established_at,
        docsis_network_access_allowed: conn.flag("CustomerConnNetworkAccess", "Allowed")?,
        internet_connected: dev.flag("InternetConnection", "Connected")?,
        downstream: DownstreamConnectionStatus {
            plan: config.owned("DownstreamPlan")?,
            frequency_hz: config.frequency_hz("DownstreamFrequency")?,
            signal_power_dbmv: dev.power_dbmv("DownstreamSignalPower")?,
            signal_snr_db: dev.snr_db("DownstreamSignalSnr")?,
            channels: parse_downstream_channels(ds_info.string("CustomerConnDownstreamChannel")?)?,
        },
        upstream: UpstreamConnectionStatus {
            channel_id: config.channel_id("UpstreamChannelId")?,
            channels: parse_upstream_channels(us_info.string("CustomerConnUpstreamChannel")?)?,
        },
    })
}

fn decode_log_entries(raw: &RawStatus) -> Result<Vec<LogEntry>, DecodeError> {
    let log = SubResponse::of(raw, GET_CUSTOMER_STATUS_LOG)?;
    parse_log_entries(log.string("CustomerStatusLogList")?)
}

type Row<'a> = (&'a str, Vec<&'a str>);

/// Split a pseudo-table into rows of exactly `columns` cells.
///
/// An empty table yields no rows.
fn split_table<'a>(
    table: &'a str,
    row_separator: &str,
    columns: usize,
    row_error: impl Fn(String) -> DecodeError,
) -> Result<Vec<Row<'a>>, DecodeError> {
    if table.trim().is_empty() {
        return Ok(Vec::new());
    }
    table
        .split(row_separator)
        .map(|row| split_row(row, columns, &row_error).map(|cols| (row, cols)))
        .collect()
}

fn split_row<'a>(
    row: &'a str,
    columns: usize,
    row_error: impl Fn(String) -> DecodeError,
) -> Result<Vec<&'a str>, DecodeError> {
    let cols: Vec<&str> = row.split(COLUMN_SEPARATOR).collect();
    if cols.len() != columns {
        return Err(row_error(format!(
            "expected {columns} columns, actual {} row={row:?}",
            cols.len()
        )));
    }
    Ok(cols)
}

fn downstream_error(reason: String) -> DecodeError {
    DecodeError::new(
        GET_CUSTOMER_STATUS_DOWNSTREAM_CHANNEL_INFO,
        "CustomerConnDownstreamChannel",
        reason,
    )
}

fn upstream_error(reason: String) -> DecodeError {
    DecodeError::new(
        GET_CUSTOMER_STATUS_UPSTREAM_CHANNEL_INFO,
        "CustomerConnUpstreamChannel",
        reason,
    )
}

fn log_error(reason: String) -> DecodeError {
    DecodeError::new(GET_CUSTOMER_STATUS_LOG, "CustomerStatusLogList", reason)
}

/// Map a parse failure on one cell to an error naming the row
fn cell<T>(
    row: &str,
    parsed: Result<T, String>,
    on_error: fn(String) -> DecodeError,
) -> Result<T, DecodeError> {
    parsed.map_err(|reason| on_error(format!("{reason} row={row:?}")))
}

/// Parse the `|+|`-separated downstream channel table
pub fn parse_downstream_channels(table: &str) -> Result<Vec<DownstreamChannel>, DecodeError> {
    split_table(table, CHANNEL_ROW_SEPARATOR, DOWNSTREAM_CHANNEL_COLUMNS, downstream_error)?
        .iter()
        .map(|(row, cols)| downstream_from_cols(row, cols))
        .collect()
}

/// Parse one downstream row:
/// row id, lock status, modulation, channel id, frequency, power, SNR/MER,
/// corrected, uncorrected, blank
pub fn parse_downstream_row(row: &str) -> Result<DownstreamChannel, DecodeError> {
    let cols = split_row(row, DOWNSTREAM_CHANNEL_COLUMNS, downstream_error)?;
    downstream_from_cols(row, &cols)
}

fn downstream_from_cols(row: &str, cols: &[&str]) -> Result<DownstreamChannel, DecodeError> {
    let e = downstream_error;
    Ok(DownstreamChannel {
        lock_status: cols[1].to_string(),
        modulation: cols[2].to_string(),
        channel_id: cell(row, parse::parse_channel_id(cols[3]), e)?,
        frequency_hz: cell(row, parse::parse_frequency_hz(cols[4]), e)?,
        signal_power_dbmv: cell(row, parse::parse_power_dbmv(cols[5]), e)?,
        signal_snr_mer_db: cell(row, parse::parse_snr_db(cols[6]), e)?,
        corrected_errors: cell(row, parse::parse_error_count(cols[7]), e)?,
        uncorrected_errors: cell(row, parse::parse_error_count(cols[8]), e)?,
    })
}

/// Parse the `|+|`-separated upstream channel table
pub fn parse_upstream_channels(table: &str) -> Result<Vec<UpstreamChannel>, DecodeError> {
    split_table(table, CHANNEL_ROW_SEPARATOR, UPSTREAM_CHANNEL_COLUMNS, upstream_error)?
        .iter()
        .map(|(row, cols)| upstream_from_cols(row, cols))
        .collect()
}

/// Parse one upstream row:
/// row id, lock status, modulation, channel id, width, frequency, power, blank
pub fn parse_upstream_row(row: &str) -> Result<UpstreamChannel, DecodeError> {
    let cols = split_row(row, UPSTREAM_CHANNEL_COLUMNS, upstream_error)?;
    upstream_from_cols(row, &cols)
}

fn upstream_from_cols(row: &str, cols: &[&str]) -> Result<UpstreamChannel, DecodeError> {
    let e = upstream_error;
    Ok(UpstreamChannel {
        lock_status: cols[1].to_string(),
        modulation: cols[2].to_string(),
        channel_id: cell(row, parse::parse_channel_id(cols[3]), e)?,
        width_hz: cell(row, parse::parse_frequency_hz(cols[4]), e)?,
        frequency_hz: cell(row, parse::parse_frequency_hz(cols[5]), e)?,
        signal_power_dbmv: cell(row, parse::parse_number::<f32>(cols[6], parse::DBMV_SUFFIX), e)?,
    })
}

/// Parse the `}-{`-separated event log
pub fn parse_log_entries(table: &str) -> Result<Vec<LogEntry>, DecodeError> {
    split_table(table, LOG_ROW_SEPARATOR, LOG_ENTRY_COLUMNS, log_error)?
        .iter()
        .map(|(row, cols)| log_from_cols(row, cols))
        .collect()
}

/// Parse one log row: 0, time, date, 3, message
pub fn parse_log_row(row: &str) -> Result<LogEntry, DecodeError> {
    let cols = split_row(row, LOG_ENTRY_COLUMNS, log_error)?;
    log_from_cols(row, &cols)
}

fn log_from_cols(row: &str, cols: &[&str]) -> Result<LogEntry, DecodeError> {
    Ok(LogEntry {
        timestamp: cell(row, parse::parse_log_timestamp(cols[2], cols[1]), log_error)?,
        message: parse::normalize_log_message(cols[4]),
    })
}

/// A field reported by two sub-actions with different values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub description: &'static str,
    pub expected_source: String,
    pub expected: Option<String>,
    pub actual_source: String,
    pub actual: Option<String>,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} information mismatch between {}={:?} and {}={:?}",
            self.description, self.expected_source, self.expected, self.actual_source, self.actual
        )
    }
}

/// A value reported redundantly by several sub-actions
struct CrossCheck {
    description: &'static str,
    reference: (&'static str, &'static str),
    others: &'static [(&'static str, &'static str)],
    normalize: fn(&str) -> String,
}

// Downstream frequency comes with a " Hz" suffix in two of the three places.
const CROSS_CHECKS: [CrossCheck; 3] = [
    CrossCheck {
        description: "Serial Number",
        reference: (GET_ARRIS_REGISTER_INFO, "SerialNumber"),
        others: &[(GET_CUSTOMER_STATUS_SOFTWARE, "StatusSoftwareSerialNum")],
        normalize: str::to_string,
    },
    CrossCheck {
        description: "MAC Address",
        reference: (GET_ARRIS_REGISTER_INFO, "MacAddress"),
        others: &[(GET_CUSTOMER_STATUS_SOFTWARE, "StatusSoftwareMac")],
        normalize: str::to_string,
    },
    CrossCheck {
        description: "Downstream Frequency",
        reference: (GET_ARRIS_CONFIGURATION_INFO, "DownstreamFrequency"),
        others: &[
            (GET_ARRIS_DEVICE_STATUS, "DownstreamFrequency"),
            (GET_CUSTOMER_STATUS_STARTUP_SEQUENCE, "CustomerConnDSFreq"),
        ],
        normalize: normalize_frequency,
    },
];

fn normalize_frequency(value: &str) -> String {
    parse::strip_unit(value, parse::HZ_SUFFIX).to_string()
}

fn lookup<'a>(raw: &'a RawStatus, (action, field): (&str, &str)) -> Option<&'a str> {
    raw.sub_response(action)?.get(field)?.as_str()
}

/// Compare the fields the device reports more than once.
///
/// Devices disagree benignly often enough that this never fails decoding.
pub fn cross_check(raw: &RawStatus) -> Vec<FieldMismatch> {
    let mut mismatches = Vec::new();
    for check in &CROSS_CHECKS {
        let expected = lookup(raw, check.reference).map(check.normalize);
        for &other in check.others {
            let actual = lookup(raw, other).map(check.normalize);
            if expected != actual {
                mismatches.push(FieldMismatch {
                    description: check.description,
                    expected_source: format!("{}[{}]", check.reference.0, check.reference.1),
                    expected: expected.clone(),
                    actual_source: format!("{}[{}]", other.0, other.1),
                    actual,
                });
            }
        }
    }
    mismatches
}

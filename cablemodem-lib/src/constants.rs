// Protocol constants for the HNAP status interface

use std::time::Duration;

/// SOAP namespace every action URI lives under
pub const SOAP_NAMESPACE: &str = "http://purenetworks.com/HNAP1";

/// Path of the single HNAP endpoint on the device
pub const HNAP_PATH: &str = "/HNAP1/";

/// Header carrying the quoted action URI
pub const SOAP_ACTION_HEADER: &str = "SOAPAction";

/// Header carrying the per-request auth tag
pub const HNAP_AUTH_HEADER: &str = "HNAP_AUTH";

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=UTF-8";

/// Session cookie names
pub const UID_COOKIE: &str = "uid";
pub const PRIVATE_KEY_COOKIE: &str = "PrivateKey";

/// Private key carried by a token that has not been through a login
pub const PRE_LOGIN_PRIVATE_KEY: &str = "withoutLoginKey";

/// Value of every `<Action>Result` field on success
pub const RESULT_OK: &str = "OK";

/// How long the device keeps a session alive after the last successful call
pub const TOKEN_VALIDITY: Duration = Duration::from_secs(10 * 60);

/// Per-call network timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub const LOGIN_ACTION: &str = "Login";
pub const QUERY_ACTION: &str = "GetMultipleHNAPs";

/// Sub-actions multiplexed into one `GetMultipleHNAPs` query.
pub const STATUS_SUB_ACTIONS: [&str; 14] = [
    // MAC address, serial number and model
    GET_ARRIS_REGISTER_INFO,
    // Software versions, also repeats MAC and serial
    GET_CUSTOMER_STATUS_SOFTWARE,
    // Short device status and primary downstream signal
    GET_ARRIS_DEVICE_STATUS,
    // System time, uptime and network access
    GET_CUSTOMER_STATUS_CONNECTION_INFO,
    // Detailed startup sequence
    GET_CUSTOMER_STATUS_STARTUP_SEQUENCE,
    GET_CUSTOMER_STATUS_DOWNSTREAM_CHANNEL_INFO,
    GET_CUSTOMER_STATUS_UPSTREAM_CHANNEL_INFO,
    // Frequency summary and configurable settings
    GET_ARRIS_CONFIGURATION_INFO,
    GET_CUSTOMER_STATUS_LOG,
    GET_CUSTOMER_STATUS_SEC_ACCOUNT,
    // Ask-me-later / never-ask flags
    GET_ARRIS_REGISTER_STATUS,
    // The three below only ever contain placeholders
    GET_CUSTOMER_STATUS_XXX,
    GET_ARRIS_XXX,
    GET_CUSTOMER_STATUS_LOG_XXX,
];

pub const GET_ARRIS_REGISTER_INFO: &str = "GetArrisRegisterInfo";
pub const GET_CUSTOMER_STATUS_SOFTWARE: &str = "GetCustomerStatusSoftware";
pub const GET_ARRIS_DEVICE_STATUS: &str = "GetArrisDeviceStatus";
pub const GET_CUSTOMER_STATUS_CONNECTION_INFO: &str = "GetCustomerStatusConnectionInfo";
pub const GET_CUSTOMER_STATUS_STARTUP_SEQUENCE: &str = "GetCustomerStatusStartupSequence";
pub const GET_CUSTOMER_STATUS_DOWNSTREAM_CHANNEL_INFO: &str = "GetCustomerStatusDownstreamChannelInfo";
pub const GET_CUSTOMER_STATUS_UPSTREAM_CHANNEL_INFO: &str = "GetCustomerStatusUpstreamChannelInfo";
pub const GET_ARRIS_CONFIGURATION_INFO: &str = "GetArrisConfigurationInfo";
pub const GET_CUSTOMER_STATUS_LOG: &str = "GetCustomerStatusLog";
pub const GET_CUSTOMER_STATUS_SEC_ACCOUNT: &str = "GetCustomerStatusSecAccount";
pub const GET_ARRIS_REGISTER_STATUS: &str = "GetArrisRegisterStatus";
pub const GET_CUSTOMER_STATUS_XXX: &str = "GetCustomerStatusXXX";
pub const GET_ARRIS_XXX: &str = "GetArrisXXX";
pub const GET_CUSTOMER_STATUS_LOG_XXX: &str = "GetCustomerStatusLogXXX";

/// Row separator inside channel pseudo-tables
pub const CHANNEL_ROW_SEPARATOR: &str = "|+|";

/// Row separator inside the event log pseudo-table
pub const LOG_ROW_SEPARATOR: &str = "}-{";

/// Column separator shared by every pseudo-table
pub const COLUMN_SEPARATOR: char = '^';

pub const DOWNSTREAM_CHANNEL_COLUMNS: usize = 10;
pub const UPSTREAM_CHANNEL_COLUMNS: usize = 8;
pub const LOG_ENTRY_COLUMNS: usize = 5;

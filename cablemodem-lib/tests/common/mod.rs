//! Common test utilities: a scripted transport and device fixtures

// Shared across test files - not every helper is used in every file
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use std::sync::Arc;

pub use cablemodem_lib::error::{HnapError, TransportError, ValidationFailure};
pub use cablemodem_lib::status::RawStatus;
pub use cablemodem_lib::transport::{PostRequest, PostResponse, Transport};
pub use cablemodem_lib::{RetrieverConfig, Scheme, StatusRetriever};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "correct horse";
pub const UID: &str = "UID123";
pub const PUBLIC_KEY: &str = "PUBKEY0123456789";
pub const CHALLENGE: &str = "CHALLENGE0123456789";

/// What the scripted device answers with
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16),
    Fail,
}

type Responder = Box<dyn Fn(&PostRequest) -> Reply + Send + Sync>;

/// Transport that answers from a script and records every request.
///
/// Each request pops the next `(expected action, reply)` pair; a mismatching
/// action fails the test. Once the script runs out, the responder (if any)
/// answers instead.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<(String, Reply)>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<PostRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<(&str, Reply)>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().map(|(a, r)| (a.to_string(), r)).collect()),
            responder: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn with_responder(responder: impl Fn(&PostRequest) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(responder)),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, action: &str, reply: Reply) {
        self.script.lock().push_back((action.to_string(), reply));
    }

    pub fn requests(&self) -> Vec<PostRequest> {
        self.requests.lock().clone()
    }

    /// Actions of all requests so far, login steps shown as `Login:<mode>`
    pub fn actions(&self) -> Vec<String> {
        self.requests().iter().map(describe).collect()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, request: PostRequest) -> Result<PostResponse, TransportError> {
        self.requests.lock().push(request.clone());
        let next = self.script.lock().pop_front();
        let reply = match next {
            Some((expected, reply)) => {
                assert_eq!(describe(&request), expected, "unexpected request order");
                reply
            }
            None => match &self.responder {
                Some(responder) => responder(&request),
                None => panic!("script exhausted, unexpected request {}", describe(&request)),
            },
        };
        match reply {
            Reply::Json(value) => Ok(PostResponse {
                status: 200,
                body: Bytes::from(value.to_string()),
            }),
            Reply::Status(status) => Ok(PostResponse {
                status,
                body: Bytes::from_static(b"<html>Not Found</html>"),
            }),
            Reply::Fail => Err(TransportError::Connection("connection reset by peer".to_string())),
        }
    }
}

/// Action named by the SOAPAction header
pub fn action_of(request: &PostRequest) -> String {
    let uri = request.header("SOAPAction").expect("SOAPAction header missing");
    uri.trim_matches('"').rsplit('/').next().unwrap_or_default().to_string()
}

pub fn body_of(request: &PostRequest) -> Value {
    serde_json::from_slice(&request.body).expect("request body is not JSON")
}

fn describe(request: &PostRequest) -> String {
    let action = action_of(request);
    if action == "Login" {
        let mode = body_of(request)["Login"]["Action"].as_str().unwrap_or_default().to_string();
        format!("Login:{mode}")
    } else {
        action
    }
}

/// Route library logs into the test harness output, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config() -> RetrieverConfig {
    RetrieverConfig::new("192.168.100.1", USERNAME, PASSWORD).with_scheme(Scheme::Https)
}

pub fn retriever(transport: Arc<ScriptedTransport>) -> StatusRetriever {
    StatusRetriever::with_transport(config(), transport)
}

pub fn challenge_reply() -> Reply {
    Reply::Json(json!({
        "LoginResponse": {
            "LoginResult": "OK",
            "Challenge": CHALLENGE,
            "PublicKey": PUBLIC_KEY,
            "Cookie": UID
        }
    }))
}

pub fn login_ok() -> Reply {
    Reply::Json(json!({"LoginResponse": {"LoginResult": "OK"}}))
}

pub fn login_failed() -> Reply {
    Reply::Json(json!({"LoginResponse": {"LoginResult": "FAILED"}}))
}

pub fn status_ok() -> Reply {
    let mut inner = raw_status_map();
    inner.insert("GetMultipleHNAPsResult".to_string(), json!("OK"));
    Reply::Json(json!({ "GetMultipleHNAPsResponse": inner }))
}

/// Script steps for a full login
pub fn login_steps() -> Vec<(&'static str, Reply)> {
    vec![("Login:request", challenge_reply()), ("Login:login", login_ok())]
}

/// Responder that plays a well-behaved device for any number of requests
pub fn healthy_device(request: &PostRequest) -> Reply {
    match describe(request).as_str() {
        "Login:request" => challenge_reply(),
        "Login:login" => login_ok(),
        _ => status_ok(),
    }
}

pub fn raw_status() -> RawStatus {
    RawStatus::from(raw_status_map())
}

/// Sub-responses as a healthy device reports them
pub fn raw_status_map() -> Map<String, Value> {
    let value = json!({
        "GetArrisRegisterInfoResponse": {
            "GetArrisRegisterInfoResult": "OK",
            "ModelName": "SB8200",
            "SerialNumber": "123456789ABC",
            "MacAddress": "AA:BB:CC:DD:EE:FF"
        },
        "GetCustomerStatusSoftwareResponse": {
            "GetCustomerStatusSoftwareResult": "OK",
            "StatusSoftwareSfVer": "AB01.02.053.05_051921_193.0A.NSH",
            "StatusSoftwareCertificate": "Installed",
            "StatusSoftwareCustomerVer": "Prod_19.2_d31",
            "StatusSoftwareHdVer": "6",
            "StatusSoftwareSpecVer": "DOCSIS 3.1",
            "StatusSoftwareSerialNum": "123456789ABC",
            "StatusSoftwareMac": "AA:BB:CC:DD:EE:FF"
        },
        "GetArrisDeviceStatusResponse": {
            "GetArrisDeviceStatusResult": "OK",
            "InternetConnection": "Connected",
            "DownstreamFrequency": "549000000 Hz",
            "DownstreamSignalPower": "5 dBmV",
            "DownstreamSignalSnr": "38 dB"
        },
        "GetCustomerStatusConnectionInfoResponse": {
            "GetCustomerStatusConnectionInfoResult": "OK",
            "CustomerCurSystemTime": "Tue Jan 3 10:11:12 2023",
            "CustomerConnSystemUpTime": "3 days 14h:15m:33s",
            "CustomerConnNetworkAccess": "Allowed"
        },
        "GetCustomerStatusStartupSequenceResponse": {
            "GetCustomerStatusStartupSequenceResult": "OK",
            "CustomerConnDSFreq": "549000000 Hz",
            "CustomerConnDSComment": "Locked",
            "CustomerConnBootStatus": "OK",
            "CustomerConnBootComment": "Operational",
            "CustomerConnConfigurationFileStatus": "OK",
            "CustomerConnConfigurationFileComment": "d11_m_sb8200_gigabit_c01.cm",
            "CustomerConnConnectivityStatus": "OK",
            "CustomerConnConnectivityComment": "Operational",
            "CustomerConnSecurityStatus": "Enabled",
            "CustomerConnSecurityComment": "BPI+"
        },
        "GetCustomerStatusDownstreamChannelInfoResponse": {
            "GetCustomerStatusDownstreamChannelInfoResult": "OK",
            "CustomerConnDownstreamChannel":
                "1^Locked^QAM256^5^549000000^5^38^12^3^|+|2^Locked^QAM256^6^555000000^4^37^0^0^"
        },
        "GetCustomerStatusUpstreamChannelInfoResponse": {
            "GetCustomerStatusUpstreamChannelInfoResult": "OK",
            "CustomerConnUpstreamChannel":
                "1^Locked^SC-QAM^2^6400000^35600000^44.5^|+|2^Locked^SC-QAM^3^6400000^29200000^45^"
        },
        "GetArrisConfigurationInfoResponse": {
            "GetArrisConfigurationInfoResult": "OK",
            "DownstreamFrequency": "549000000",
            "DownstreamPlan": "Default",
            "UpstreamChannelId": "2",
            "LedStatus": "1",
            "ethSWEthEEE": "0"
        },
        "GetCustomerStatusLogResponse": {
            "GetCustomerStatusLogResult": "OK",
            "CustomerStatusLogList":
                "0^09:05:01^24/12/2022^3^No Ranging Response  received - T3 time-out}-{0^10:00:00^25/12/2022^6^Cable Modem Reboot  due to power reset"
        },
        "GetCustomerStatusSecAccountResponse": {
            "GetCustomerStatusSecAccountResult": "OK",
            "CurrentLogin": "admin",
            "CurrentNameAdmin": "5F4DCC3B5AA765D61D8327DEB882CF99",
            "CurrentNameUser": "EE11CBB19052E40B07AAC0CA060C23EE",
            "CurrentPwAdmin": "21232F297A57A5A743894A0E4A801FC3",
            "CurrentPwUser": "D8578EDF8458CE06FBC5BB76A58C5CA4"
        },
        "GetArrisRegisterStatusResponse": {
            "GetArrisRegisterStatusResult": "OK",
            "AskMeLater": "0",
            "NeverAsk": "1"
        },
        "GetCustomerStatusXXXResponse": {
            "GetCustomerStatusXXXResult": "OK",
            "XXX": "XXX"
        },
        "GetArrisXXXResponse": {
            "GetArrisXXXResult": "OK",
            "XXX": "XXX"
        },
        "GetCustomerStatusLogXXXResponse": {
            "GetCustomerStatusLogXXXResult": "OK",
            "XXX": "XXX"
        }
    });
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Set `field` of `sub_action` in a raw status map
pub fn set_field(map: &mut Map<String, Value>, sub_action: &str, field: &str, value: &str) {
    map.get_mut(&format!("{sub_action}Response"))
        .and_then(Value::as_object_mut)
        .expect("sub-response missing from fixture")
        .insert(field.to_string(), json!(value));
}

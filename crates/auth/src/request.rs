use serde::{Deserialize, Serialize};

/// Request metadata captured at construction and attached to session records.
///
/// Extraction (proxy-header parsing, user-agent sniffing) is the host's job;
/// this layer only stores and compares the values it is given. The IP also
/// participates in re-validation for the client-blob and server-keyed
/// backends (replay defense).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    pub ip: String,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub platform: Option<String>,
}

impl RequestMeta {
    pub fn from_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            ..Self::default()
        }
    }
}

impl Default for RequestMeta {
    fn default() -> Self {
        Self {
            ip: "unknown".to_string(),
            device: None,
            browser: None,
            platform: None,
        }
    }
}

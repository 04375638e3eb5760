//! Caller identity for usage accounting.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// The identity a conversion is accounted against.
///
/// Resolution order: authenticated user id, else a client-supplied
/// fingerprint, else the request IP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identity {
    /// Authenticated user id.
    User(String),
    /// Anonymous browser fingerprint.
    Fingerprint(String),
    /// Request IP address.
    Ip(IpAddr),
}

impl Identity {
    /// Resolve an identity from its possible sources, most specific first.
    pub fn resolve(user_id: Option<&str>, fingerprint: Option<&str>, ip: IpAddr) -> Self {
        if let Some(user) = user_id.filter(|u| !u.is_empty()) {
            Self::User(user.to_string())
        } else if let Some(fp) = fingerprint.filter(|f| !f.is_empty()) {
            Self::Fingerprint(fp.to_string())
        } else {
            Self::Ip(ip)
        }
    }

    /// Stable key for counter storage.
    pub fn key(&self) -> String {
        match self {
            Self::User(id) => format!("user:{id}"),
            Self::Fingerprint(fp) => format!("fp:{fp}"),
            Self::Ip(ip) => format!("ip:{ip}"),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

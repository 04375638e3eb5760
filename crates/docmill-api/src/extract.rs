//! `RequestIdentity` extractor — resolves caller identity, tier, and IP.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

use docmill_entity::identity::Identity;
use docmill_entity::tier::Tier;

/// Who a request is accounted against.
///
/// `x-user-id` and `x-user-tier` are trusted as injected by an upstream
/// auth proxy; `x-fingerprint` is a client-supplied anonymous token.
/// Extraction never fails: with no headers at all the request is accounted
/// against its IP as an anonymous caller.
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    /// Accounting identity, most specific source available.
    pub identity: Identity,
    /// Quota tier.
    pub tier: Tier,
    /// Resolved client IP.
    pub ip: IpAddr,
}

impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = client_ip(parts);
        let user_id = header_str(parts, "x-user-id");
        let fingerprint = header_str(parts, "x-fingerprint");

        // A tier header without a user id is still honored; an absent or
        // unparseable one falls back by account presence.
        let fallback = if user_id.is_some() {
            Tier::Free
        } else {
            Tier::Anonymous
        };
        let tier = header_str(parts, "x-user-tier")
            .and_then(|value| value.parse().ok())
            .unwrap_or(fallback);

        Ok(Self {
            identity: Identity::resolve(user_id, fingerprint, ip),
            tier,
            ip,
        })
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
}

/// Proxy headers in trust order, then the socket peer address.
fn client_ip(parts: &Parts) -> IpAddr {
    for name in ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"] {
        if let Some(value) = parts.headers.get(name).and_then(|v| v.to_str().ok()) {
            let first = value.split(',').next().unwrap_or("").trim();
            if let Ok(ip) = first.parse::<IpAddr>() {
                return ip;
            }
        }
    }
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

/// Where a submission came from: peer address (when the server was started
/// with connect info) and the `User-Agent` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSource {
    pub addr: Option<SocketAddr>,
    pub user_agent: String,
}

impl ClientSource {
    /// `"<addr>;<user agent>"`, either side empty when unknown.
    pub fn descriptor(&self) -> String {
        let addr = self.addr.map(|a| a.to_string()).unwrap_or_default();
        format!("{addr};{}", self.user_agent)
    }
}

impl<S> FromRequestParts<S> for ClientSource
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(Self { addr, user_agent })
    }
}

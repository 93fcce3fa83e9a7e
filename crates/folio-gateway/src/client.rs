use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};

pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Used when a request carries no usable client identity.
pub const ANONYMOUS: &str = "anonymous";

const MAX_CLIENT_ID_LEN: usize = 128;

/// The caller a rate limit budget is charged to.
///
/// Taken from the first `x-forwarded-for` hop as set by the fronting proxy,
/// then `x-client-id`, then [`ANONYMOUS`]. The client header is only
/// trusted when no proxy address is present: a caller can put any value
/// there and get a fresh budget per value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let explicit = header_str(headers, CLIENT_ID_HEADER);
        let forwarded = header_str(headers, FORWARDED_FOR_HEADER)
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());

        let id = forwarded
            .or(explicit)
            .map(|id| id.chars().take(MAX_CLIENT_ID_LEN).collect())
            .unwrap_or_else(|| ANONYMOUS.to_string());
        ClientId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl Display for ClientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientId::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn forwarded_address_wins_over_client_header() {
        let id = ClientId::from_headers(&headers(&[
            ("x-client-id", "app-42"),
            ("x-forwarded-for", "10.0.0.1"),
        ]));
        assert_eq!(id.as_str(), "10.0.0.1");
    }

    #[test]
    fn client_header_without_proxy() {
        let id = ClientId::from_headers(&headers(&[("x-client-id", "app-42")]));
        assert_eq!(id.as_str(), "app-42");
    }

    #[test]
    fn first_forwarded_hop() {
        let id = ClientId::from_headers(&headers(&[("x-forwarded-for", " 10.0.0.1 , 172.16.0.1")]));
        assert_eq!(id.as_str(), "10.0.0.1");
    }

    #[test]
    fn anonymous_without_headers() {
        assert_eq!(ClientId::from_headers(&HeaderMap::new()).as_str(), ANONYMOUS);
        let blank = ClientId::from_headers(&headers(&[("x-client-id", "  "), ("x-forwarded-for", ",")]));
        assert_eq!(blank.as_str(), ANONYMOUS);
    }
}

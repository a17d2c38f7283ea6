use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Header a client or proxy may use to supply its own request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request identifier backed by a ULID, so ids sort by arrival time.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse the inbound `x-request-id` when it is a valid ULID, otherwise
    /// mint a fresh one. `headers` must have lowercase keys.
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|s| s.trim().parse::<RequestId>().ok())
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RequestId(ulid::Ulid::from_string(s)?))
    }
}

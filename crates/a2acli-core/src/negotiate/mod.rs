//! Transport capability negotiation.
//!
//! Picks exactly one protocol binding per session, either from an explicit
//! override or from what the agent card advertises.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A protocol binding this client knows how to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Binding {
    Grpc,
    JsonRpc,
    HttpJson,
}

impl Binding {
    /// Preference order used when nothing is forced.
    pub const PRIORITY: [Binding; 3] = [Binding::Grpc, Binding::JsonRpc, Binding::HttpJson];

    /// Selected when the card advertises nothing recognizable.
    pub const DEFAULT: Binding = Binding::JsonRpc;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grpc => "grpc",
            Self::JsonRpc => "json-rpc",
            Self::HttpJson => "http+json",
        }
    }

    /// Match an advertised binding name from an agent card.
    ///
    /// Cards spell bindings as `GRPC`, `JSONRPC` and `HTTP+JSON`; the
    /// canonical client names are accepted too. Unknown names yield `None`.
    pub fn from_advertised(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "grpc" => Some(Self::Grpc),
            "json-rpc" | "jsonrpc" => Some(Self::JsonRpc),
            "http+json" | "http-json" | "rest" => Some(Self::HttpJson),
            _ => None,
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the canonical client names only; see [`Binding::from_advertised`]
/// for the spellings agent cards use.
impl FromStr for Binding {
    type Err = BindingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::PRIORITY
            .into_iter()
            .find(|b| b.as_str() == s.trim())
            .ok_or_else(|| BindingParseError(s.to_owned()))
    }
}

impl From<Binding> for String {
    fn from(b: Binding) -> Self {
        b.as_str().to_owned()
    }
}

impl TryFrom<String> for Binding {
    type Error = BindingParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Error returned when parsing an unrecognized [`Binding`] name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingParseError(pub String);

impl fmt::Display for BindingParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized transport {:?} (expected one of: grpc, json-rpc, http+json)",
            self.0
        )
    }
}

impl std::error::Error for BindingParseError {}

/// Errors from transport negotiation. Always fatal, always raised before a
/// stream is opened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    #[error(transparent)]
    UnknownTransport(#[from] BindingParseError),
}

/// Validate an explicit transport override.
///
/// Separate from [`negotiate`] so callers can reject a bad override before
/// fetching the agent card.
pub fn parse_override(forced: Option<&str>) -> Result<Option<Binding>, NegotiationError> {
    forced
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Binding>())
        .transpose()
        .map_err(NegotiationError::from)
}

/// Choose the binding for a session.
///
/// An override wins outright (after validation). Otherwise the first of
/// [`Binding::PRIORITY`] present in `advertised` is chosen, falling back to
/// [`Binding::DEFAULT`].
pub fn negotiate<S: AsRef<str>>(
    advertised: &[S],
    forced: Option<&str>,
) -> Result<Binding, NegotiationError> {
    if let Some(binding) = parse_override(forced)? {
        let is_advertised = advertised
            .iter()
            .any(|a| Binding::from_advertised(a.as_ref()) == Some(binding));
        if !is_advertised && !advertised.is_empty() {
            tracing::warn!(%binding, "forced transport is not advertised by the agent");
        }
        return Ok(binding);
    }

    let offered: Vec<Binding> = advertised
        .iter()
        .filter_map(|a| Binding::from_advertised(a.as_ref()))
        .collect();

    let chosen = Binding::PRIORITY
        .into_iter()
        .find(|b| offered.contains(b))
        .unwrap_or(Binding::DEFAULT);

    tracing::debug!(binding = %chosen, ?offered, "negotiated transport");
    Ok(chosen)
}

use std::fmt;

/// Coarse classification of a source failure.
///
/// The ingestion pipeline reports per-symbol failures by kind, so every
/// [`MarketDataError`](super::MarketDataError) maps onto exactly one of these.
///
/// | Kind | Typical causes |
/// |------|----------------|
/// | `Transport` | DNS, connect refused, TLS, request timeout |
/// | `Protocol` | non-2xx status, rate limiting, unknown symbol, unparseable body |
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SourceErrorKind {
    /// The request never produced a usable HTTP response.
    Transport,

    /// The provider answered, but not with a usable quote payload.
    Protocol,
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Protocol => write!(f, "protocol"),
        }
    }
}

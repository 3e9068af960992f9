use std::error::Error as StdError;
use std::fmt;

/// Broad classification of a local failure.
///
/// Every variant describes something that went wrong *before* a remote status could be
/// trusted, so a [`Response`](crate::Response) carrying one of these always reports
/// [`STATUS_LOCAL_FAILURE`](crate::STATUS_LOCAL_FAILURE).
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Kind {
    /// Malformed configuration, e.g. a composite secret that is not `secret:salt`.
    Configuration,
    /// Request values the dialect refuses to sign, e.g. a zero page size.
    Validation,
    /// Request parameters could not be serialized to JSON.
    Serialization,
    /// Connection, timeout or body read failure.
    Transport,
    /// The remote answered, but not with a recognizable envelope.
    Envelope,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    pub fn configuration<S: Into<String>>(reason: S) -> Self {
        Self::with_source(
            Kind::Configuration,
            Reason {
                reason: reason.into(),
            },
        )
    }

    pub fn validation<S: Into<String>>(reason: S) -> Self {
        Self::with_source(
            Kind::Validation,
            Reason {
                reason: reason.into(),
            },
        )
    }

    pub fn envelope<S: Into<String>>(reason: S) -> Self {
        Self::with_source(
            Kind::Envelope,
            Reason {
                reason: reason.into(),
            },
        )
    }

    /// Whether retrying the same request could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, Kind::Transport | Kind::Envelope)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{}: {}", self.kind, src),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Free-form explanation attached to locally detected errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reason {
    pub reason: String,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl StdError for Reason {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Transport, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Serialization, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Configuration, e)
    }
}

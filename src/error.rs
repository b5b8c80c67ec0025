use std::error::Error as StdError;
use std::fmt;

/// Broad classification of a failure, stable enough to branch on.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// Bad key material, addresses, host or other static configuration.
    Configuration,
    /// Canonicalization, ABI encoding or hashing failed.
    Encoding,
    /// The HTTP round-trip could not be completed.
    Transport,
    /// Caller supplied a request the client refuses to sign.
    Validation,
    /// Failure inside a dependency that is not attributable to input.
    Internal,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Configuration => "configuration",
            Kind::Encoding => "encoding",
            Kind::Transport => "transport",
            Kind::Validation => "validation",
            Kind::Internal => "internal",
        };
        f.write_str(name)
    }
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

    /// Returns the underlying error, downcast to `E`, if it has that type.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.as_deref()?.downcast_ref::<E>()
    }

    pub fn configuration<S: Into<String>>(reason: S) -> Self {
        Self::with_source(Kind::Configuration, Message::new(reason))
    }

    pub fn encoding<S: Into<String>>(reason: S) -> Self {
        Self::with_source(Kind::Encoding, Message::new(reason))
    }

    pub fn validation<S: Into<String>>(reason: S) -> Self {
        Self::with_source(Kind::Validation, Message::new(reason))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.kind),
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

/// Plain-text failure reason used by the string constructors.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    pub reason: String,
}

impl Message {
    fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl StdError for Message {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Transport, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Configuration, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Encoding, e)
    }
}

impl From<serde_html_form::ser::Error> for Error {
    fn from(e: serde_html_form::ser::Error) -> Self {
        Error::with_source(Kind::Encoding, e)
    }
}

impl From<alloy::signers::Error> for Error {
    fn from(e: alloy::signers::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

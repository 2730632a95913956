// vim: tw=80
//! Every failure the engine can report.
use std::{fmt, sync::Arc};

use thiserror::Error;

/// Which kind of member a [`MissingHint`] refers to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MemberKind {
    /// A method parameter.
    Arg,
    /// A method's return type.
    Return,
    /// A class attribute.
    Attribute,
}

/// A member of the target whose declared type is missing.
///
/// `path` is `[method, parameter]` for arguments, `[method]` for return
/// types, and `[attribute]` for attributes.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MissingHint {
    pub path: Vec<String>,
    pub member_kind: MemberKind,
}

impl MissingHint {
    pub fn new<I, S>(path: I, member_kind: MemberKind) -> Self
        where I: IntoIterator<Item = S>, S: Into<String>
    {
        let path = path.into_iter().map(Into::into).collect();
        MissingHint{path, member_kind}
    }
}

impl fmt::Display for MissingHint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.member_kind {
            MemberKind::Arg => "argument",
            MemberKind::Return => "return",
            MemberKind::Attribute => "attribute",
        };
        write!(f, "{} `{}`", kind, self.path.join("."))
    }
}

fn format_hints(hints: &[MissingHint]) -> String {
    hints.iter()
        .map(|h| format!("\n  - {}", h))
        .collect()
}

/// The error type of every fallible operation in this crate.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The target can't be described as a class or object.
    #[error("cannot introspect target: {0}")]
    TypeIntrospection(String),

    /// Mock construction found members without declared types.  All of them
    /// are reported at once.
    #[error("{target} has missing type hints:{}", format_hints(.hints))]
    MissingTypeHints {
        target: String,
        hints: Vec<MissingHint>,
    },

    /// A value supplied at call time doesn't satisfy its declared type.
    #[error("{method}: `{parameter}` expects {expected}, got {actual}")]
    TypeSafety {
        method: String,
        parameter: String,
        expected: String,
        actual: String,
    },

    /// No registered behaviour matched the call.
    #[error("{0}")]
    NoBehaviourSpecified(String),

    /// The setup protocol was misused.
    #[error("{0}")]
    Mocking(String),

    /// An assertion on recorded calls failed.
    #[error("{0}")]
    Verify(String),

    /// The supplied arguments can't be bound to the declared parameters.
    #[error("{0}")]
    ArgumentBinding(String),

    /// An error raised by a `then_raise` or `then_do` behaviour, passed
    /// through unchanged.
    #[error(transparent)]
    Raised(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an arbitrary error so that a behaviour can raise it.
    pub fn raised<E>(e: E) -> Self
        where E: std::error::Error + Send + Sync + 'static
    {
        Error::Raised(Arc::new(e))
    }

    /// If this is a raised user error of type `E`, return it.
    pub fn downcast_raised<E>(&self) -> Option<&E>
        where E: std::error::Error + 'static
    {
        match self {
            Error::Raised(e) => e.downcast_ref::<E>(),
            _ => None
        }
    }

    /// The missing hints carried by a `MissingTypeHints` error.
    pub fn missing_hints(&self) -> &[MissingHint] {
        match self {
            Error::MissingTypeHints{hints, ..} => hints,
            _ => &[]
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

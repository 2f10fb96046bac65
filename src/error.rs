use strum::Display;
use thiserror::Error;

use crate::metadata::typesystem::TypeIdentity;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The kind of member a failed lookup was looking for.
///
/// Used in [`Error::MemberNotFound`] to phrase the diagnostic, e.g.
/// `can not find method area(Int32) in demo.Shape`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum MemberKind {
    /// A field resolved by name
    #[strum(serialize = "field")]
    Field,
    /// A field resolved by its declared type
    #[strum(serialize = "field of type")]
    FieldOfType,
    /// A method resolved by signature
    #[strum(serialize = "method")]
    Method,
    /// A constructor resolved by signature
    #[strum(serialize = "constructor")]
    Constructor,
    /// A bean-convention property
    #[strum(serialize = "property")]
    Property,
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Resolution Errors
/// - [`Error::MemberNotFound`] - No member matches the requested name or signature
/// - [`Error::AmbiguousMember`] - More than one field matches a by-type lookup
///
/// ## Invocation Errors
/// - [`Error::InvocationFailure`] - A read, write, invoke or construct call failed; wraps the cause
///
/// ## Value and Target Errors
/// - [`Error::TypeConversionInvalid`] - A [`crate::Value`] could not be converted to the requested Rust type
/// - [`Error::MissingReceiver`] - An instance member was used without an instance
/// - [`Error::TargetMismatch`] - The bound object does not carry the state a member was declared on
/// - [`Error::ArgumentCount`] - A member was called with the wrong number of arguments
/// - [`Error::ReadOnly`] - A constant was written to
///
/// ## Construction Errors
/// - [`Error::Malformed`] - A type descriptor was declared inconsistently
/// - [`Error::LockError`] - A lock guarding shared state was poisoned
///
/// Resolution errors describe a caller mistake (wrong name, type or arity). They are reported
/// once and never retried. A member that exists but was filtered out by the index policy is
/// reported exactly like a member that does not exist.
///
/// # Examples
///
/// ```rust
/// use memberscope::{Descriptor, Error, MemberKind};
/// use memberscope::metadata::typesystem::types;
///
/// let descriptor = Descriptor::for_type(types::string())?;
/// match descriptor.get_by_name("missing") {
///     Err(Error::MemberNotFound { kind: MemberKind::Field, name, .. }) => {
///         assert_eq!(name.as_deref(), Some("missing"));
///     }
///     other => panic!("unexpected: {other:?}"),
/// }
/// # Ok::<(), memberscope::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// No field, method, constructor or property matches the request.
    ///
    /// # Fields
    ///
    /// * `kind` - What kind of member was requested
    /// * `owner` - The type that was searched
    /// * `name` - The attempted member name (absent for constructors and by-type lookups)
    /// * `params` - The normalized argument types of the attempt (empty for field lookups)
    /// * `request` - Human readable rendering of the attempt
    #[error("can not find {kind} {request} in {owner}")]
    MemberNotFound {
        /// The kind of member that was requested
        kind: MemberKind,
        /// The type whose index was searched
        owner: TypeIdentity,
        /// The attempted member name
        name: Option<String>,
        /// The normalized argument types of the attempt
        params: Vec<TypeIdentity>,
        /// Human readable rendering of the attempted name and signature
        request: String,
    },

    /// More than one field matches a by-type lookup.
    ///
    /// The engine never picks one of several candidates; every candidate name is reported in
    /// declaration order.
    #[error("found more than one field of type {requested} in {owner}: {}", .candidates.join(", "))]
    AmbiguousMember {
        /// The type whose index was searched
        owner: TypeIdentity,
        /// The requested field type
        requested: TypeIdentity,
        /// Names of every matching field
        candidates: Vec<String>,
    },

    /// The underlying read, write, invoke or construct operation failed.
    ///
    /// The original cause is preserved and available through [`std::error::Error::source`].
    #[error("invocation of {member} failed: {source}")]
    InvocationFailure {
        /// Qualified name of the member that was called
        member: String,
        /// The error raised by the member or by the access itself
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A [`crate::Value`] could not be converted into the requested representation.
    #[error("can not convert {found} into {expected}")]
    TypeConversionInvalid {
        /// The requested representation
        expected: String,
        /// Description of the value that was offered
        found: String,
    },

    /// An instance-level member was used without an instance to operate on.
    #[error("{0} requires an instance")]
    MissingReceiver(String),

    /// The bound object does not carry state of the type a member was declared on.
    #[error("expected state of {expected}, found {found}")]
    TargetMismatch {
        /// The declaring type of the member
        expected: String,
        /// The type of the object that was supplied
        found: String,
    },

    /// A write was attempted on a constant.
    #[error("{0} is read-only")]
    ReadOnly(String),

    /// A method or constructor was called with the wrong number of arguments.
    #[error("expected {expected} arguments, found {found}")]
    ArgumentCount {
        /// Number of declared parameters
        expected: usize,
        /// Number of supplied arguments
        found: usize,
    },

    /// A type descriptor was declared inconsistently.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the inconsistency
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Failed to lock target.
    ///
    /// A thread panicked while holding the lock guarding an object's state, a static field
    /// slot or the cache build section.
    #[error("Failed to lock target")]
    LockError,
}

impl Error {
    /// Wrap `cause` as the failure of invoking `member`.
    ///
    /// Errors that already are invocation failures are passed through unchanged so that a
    /// member calling another member does not nest the wrapper.
    pub(crate) fn invocation(member: impl Into<String>, cause: Error) -> Error {
        match cause {
            Error::InvocationFailure { .. } => cause,
            other => Error::InvocationFailure {
                member: member.into(),
                source: Box::new(other),
            },
        }
    }

    /// Returns `true` for the resolution kinds (`MemberNotFound`, `AmbiguousMember`).
    #[must_use]
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Error::MemberNotFound { .. } | Error::AmbiguousMember { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_kind_display() {
        assert_eq!(MemberKind::Field.to_string(), "field");
        assert_eq!(MemberKind::FieldOfType.to_string(), "field of type");
        assert_eq!(MemberKind::Constructor.to_string(), "constructor");
    }

    #[test]
    fn test_ambiguous_lists_candidates() {
        let err = Error::AmbiguousMember {
            owner: TypeIdentity::new("demo", "Person"),
            requested: TypeIdentity::new("core", "String"),
            candidates: vec!["first".to_string(), "last".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "found more than one field of type core.String in demo.Person: first, last"
        );
        assert!(err.is_resolution_failure());
    }

    #[test]
    fn test_invocation_keeps_cause() {
        let err = Error::invocation(
            "demo.Point::x",
            Error::TypeConversionInvalid {
                expected: "i32".to_string(),
                found: "\"abc\"".to_string(),
            },
        );
        let source = std::error::Error::source(&err).expect("cause must be preserved");
        assert_eq!(source.to_string(), "can not convert \"abc\" into i32");
        assert!(!err.is_resolution_failure());
    }

    #[test]
    fn test_invocation_does_not_nest() {
        let inner = Error::invocation("demo.A::f", Error::LockError);
        let outer = Error::invocation("demo.B::g", inner);
        match outer {
            Error::InvocationFailure { member, .. } => assert_eq!(member, "demo.A::f"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_malformed_macro_records_location() {
        let err = malformed_error!("field {} declared twice", "x");
        match err {
            Error::Malformed { message, file, .. } => {
                assert_eq!(message, "field x declared twice");
                assert!(file.ends_with("error.rs"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

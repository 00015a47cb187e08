//! Configuration error model.

use thiserror::Error;

/// Result type used across the equality layer.
pub type EqualityResult<T> = Result<T, EqualityError>;

/// A type's equality definition is malformed.
///
/// These are programming mistakes, not transient conditions: equality and hashing
/// are total functions of their inputs once a type is configured correctly. Absent
/// operands are never an error; they have defined results in the facade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EqualityError {
    /// A designated member's accessor failed.
    #[error("member `{member}` of `{type_name}` could not be read: {reason}")]
    UnreadableMember {
        type_name: &'static str,
        member: String,
        reason: String,
    },

    /// Two designated members resolved to the same name.
    #[error("member `{member}` is designated more than once on `{type_name}`")]
    DuplicateMember {
        type_name: &'static str,
        member: String,
    },

    /// A member was designated without a name.
    #[error("a member of `{type_name}` was designated with an empty name")]
    EmptyMemberName { type_name: &'static str },
}

impl EqualityError {
    pub fn unreadable(
        type_name: &'static str,
        member: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnreadableMember {
            type_name,
            member: member.into(),
            reason: reason.into(),
        }
    }

    pub fn duplicate(type_name: &'static str, member: impl Into<String>) -> Self {
        Self::DuplicateMember {
            type_name,
            member: member.into(),
        }
    }

    /// Name of the type whose definition is malformed.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::UnreadableMember { type_name, .. }
            | Self::DuplicateMember { type_name, .. }
            | Self::EmptyMemberName { type_name } => type_name,
        }
    }
}

/// Failure reported by a fallible member accessor.
///
/// The core attaches the owning type and member name before surfacing it as
/// [`EqualityError::UnreadableMember`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct MemberError(String);

impl MemberError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_type_and_member() {
        let err = EqualityError::unreadable("Reading", "numeric", "lock poisoned");
        assert_eq!(
            err.to_string(),
            "member `numeric` of `Reading` could not be read: lock poisoned"
        );
        assert_eq!(err.type_name(), "Reading");

        let err = EqualityError::duplicate("Reading", "numeric");
        assert_eq!(
            err.to_string(),
            "member `numeric` is designated more than once on `Reading`"
        );
    }

    #[test]
    fn member_error_keeps_reason() {
        let err = MemberError::new("not initialised");
        assert_eq!(err.reason(), "not initialised");
        assert_eq!(err.to_string(), "not initialised");
    }
}

//! Structural equality over designated members.
//!
//! A type opts in by designating the members that define its equality; comparison,
//! hashing and absent-operand handling follow from that list and stay consistent with
//! each other, so hash-based containers deduplicate structurally-equal instances.
//!
//! ```ignore
//! use structeq_core::EqualityDefinition;
//!
//! #[derive(EqualityDefinition)]
//! struct Reading {
//!     #[equality]
//!     numeric: i32,
//! }
//!
//! #[derive(EqualityDefinition)]
//! struct LabeledReading {
//!     #[equality(base)]
//!     reading: Reading,
//!     #[equality]
//!     label: String,
//!     note: String, // never affects equality
//! }
//! ```
//!
//! A type with no designated members keeps identity equality. Shared handles compare
//! by what they point at; wrap one in [`ByIdentity`] to compare by allocation instead.

pub mod equality;
pub mod error;
pub mod facade;
pub mod member;
pub mod registry;
pub mod value;

pub use equality::{
    EqualityDefinition, HASH_SALT, differences, hash_of, identity_hash, is_equal, try_differences,
    try_differences_in, try_hash_of, try_hash_of_in, try_is_equal, try_is_equal_in,
};
pub use error::{EqualityError, EqualityResult, MemberError};
pub use facade::{StructuralEquality, equal, not_equal};
pub use member::{Member, MemberInfo, MemberSet, MemberTable, Members};
pub use registry::{MemberRegistry, describe, members_of};
pub use value::{
    ByIdentity, CanonicalValue, Canonicalize, Decimal, DynEquality, Identity, ValueKind, normalize,
};

#[cfg(feature = "derive")]
pub use structeq_derive::EqualityDefinition;

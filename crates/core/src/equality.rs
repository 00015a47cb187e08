//! Equality determination and hash computation over a type's designated members.

use core::any::TypeId;
use core::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::error::{EqualityError, EqualityResult};
use crate::member::Members;
use crate::registry::MemberRegistry;

/// Added to every member's hash contribution.
pub const HASH_SALT: u64 = 17;

/// Equality definition of a type: how two instances are compared and hashed.
///
/// The defaults compare and hash the members `T` designates through [`Members`]. A
/// type whose equality cannot be expressed as a member list (tolerance-based numbers,
/// order-insensitive collections, ...) overrides
/// [`try_is_equal_to`](Self::try_is_equal_to) and/or
/// [`try_hash_code`](Self::try_hash_code); an override fully replaces the default for
/// that type. Overrides must keep equal instances at equal hash codes.
///
/// The infallible `is_equal_to` / `hash_code` pair lives on
/// [`StructuralEquality`](crate::facade::StructuralEquality) and routes through these.
pub trait EqualityDefinition: Members {
    fn try_is_equal_to(&self, other: &Self) -> EqualityResult<bool> {
        try_is_equal(self, other)
    }

    fn try_hash_code(&self) -> EqualityResult<u64> {
        try_hash_of(self)
    }
}

/// Default equality of two instances.
///
/// With no designated members, only the very same instance is equal. Otherwise every
/// member is read from both instances through the same descriptor and the canonical
/// values are compared pairwise; the first mismatch decides. A member with its own
/// equality definition is compared through it, and its configuration errors are
/// returned here too.
pub fn try_is_equal<T: Members>(this: &T, other: &T) -> EqualityResult<bool> {
    try_is_equal_in(MemberRegistry::global(), this, other)
}

/// [`try_is_equal`] against an explicit registry.
pub fn try_is_equal_in<T: Members>(
    registry: &MemberRegistry,
    this: &T,
    other: &T,
) -> EqualityResult<bool> {
    let members = registry.members_of::<T>()?;
    if members.is_empty() {
        return Ok(core::ptr::eq(this, other));
    }
    for member in members.iter() {
        if !member.read(this)?.try_eq(&member.read(other)?)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Default hash code of an instance.
///
/// Sum over every designated member of `normalize(value).hash_code() + HASH_SALT`,
/// wrapping on overflow. A nested member contributes its own hash code. A type with
/// no designated members gets the identity hash.
pub fn try_hash_of<T: Members>(this: &T) -> EqualityResult<u64> {
    try_hash_of_in(MemberRegistry::global(), this)
}

/// [`try_hash_of`] against an explicit registry.
pub fn try_hash_of_in<T: Members>(registry: &MemberRegistry, this: &T) -> EqualityResult<u64> {
    let members = registry.members_of::<T>()?;
    // Checked on the set, not on the sum: a non-empty set may legitimately sum to zero.
    if members.is_empty() {
        return Ok(identity_hash::<T>());
    }
    members.iter().try_fold(0u64, |acc, member| -> EqualityResult<u64> {
        let contribution = member.read(this)?.try_hash_code()?.wrapping_add(HASH_SALT);
        Ok(acc.wrapping_add(contribution))
    })
}

/// Hash compatible with identity equality.
///
/// Identity-equal operands are one instance, so a per-type constant keeps the
/// contract. Addresses are not used: values move, and a container rehashing a moved
/// value must still find it.
pub fn identity_hash<T: 'static>() -> u64 {
    let mut hasher = FxHasher::default();
    TypeId::of::<T>().hash(&mut hasher);
    hasher.finish()
}

/// Names of the designated members whose values differ, in member order.
///
/// Reports the default member-wise comparison only; a type that overrides
/// [`EqualityDefinition::try_is_equal_to`] is not consulted. Empty when the members
/// agree, and for types without designated members.
pub fn try_differences<T: Members>(this: &T, other: &T) -> EqualityResult<Vec<String>> {
    try_differences_in(MemberRegistry::global(), this, other)
}

/// [`try_differences`] against an explicit registry.
pub fn try_differences_in<T: Members>(
    registry: &MemberRegistry,
    this: &T,
    other: &T,
) -> EqualityResult<Vec<String>> {
    let members = registry.members_of::<T>()?;
    let mut differing = Vec::new();
    for member in members.iter() {
        if !member.read(this)?.try_eq(&member.read(other)?)? {
            differing.push(member.name().to_owned());
        }
    }
    Ok(differing)
}

/// Infallible [`try_is_equal`]; a configuration error is fatal.
pub fn is_equal<T: Members>(this: &T, other: &T) -> bool {
    try_is_equal(this, other).unwrap_or_else(misconfigured)
}

/// Infallible [`try_hash_of`]; a configuration error is fatal.
pub fn hash_of<T: Members>(this: &T) -> u64 {
    try_hash_of(this).unwrap_or_else(misconfigured)
}

/// Infallible [`try_differences`]; a configuration error is fatal.
pub fn differences<T: Members>(this: &T, other: &T) -> Vec<String> {
    try_differences(this, other).unwrap_or_else(misconfigured)
}

#[cold]
pub(crate) fn misconfigured<T>(err: EqualityError) -> T {
    tracing::error!(
        type_name = err.type_name(),
        error = %err,
        "equality definition is misconfigured"
    );
    panic!("{err}")
}

/// Asserts that two values are equal under their equality definition, naming the
/// differing members on failure.
#[macro_export]
macro_rules! assert_equal_by_members {
    ($left:expr, $right:expr $(,)?) => {{
        let (left, right) = (&$left, &$right);
        if !$crate::StructuralEquality::is_equal_to(left, right) {
            panic!(
                "equality assertion failed: `{}` differs in {:?}",
                ::core::any::type_name_of_val(left),
                $crate::differences(left, right),
            );
        }
    }};
}

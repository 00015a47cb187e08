//! Public comparison surface of a type that adopts an equality definition.
//!
//! `None` stands for the absent reference. The four operations agree with each other
//! for every input:
//!
//! | call | result |
//! |---|---|
//! | `x.equals(None)` | `false` |
//! | `x.equals(Some(x))` | `true` (identity) |
//! | `x.equals_any(Some(&other_type))` | `false` |
//! | `equal(None, None)` | `true` |
//! | `equal(Some(x), None)` | `false` |
//! | `not_equal(a, b)` | `!equal(a, b)` |

use core::any::Any;

use crate::equality::{EqualityDefinition, misconfigured};

/// Comparison operations every [`EqualityDefinition`] type receives.
pub trait StructuralEquality: EqualityDefinition {
    /// [`EqualityDefinition::try_is_equal_to`]; a configuration error is fatal.
    fn is_equal_to(&self, other: &Self) -> bool {
        self.try_is_equal_to(other).unwrap_or_else(misconfigured)
    }

    /// [`EqualityDefinition::try_hash_code`]; a configuration error is fatal.
    fn hash_code(&self) -> u64 {
        self.try_hash_code().unwrap_or_else(misconfigured)
    }

    /// Typed comparison.
    fn equals(&self, other: Option<&Self>) -> bool {
        match other {
            None => false,
            Some(other) if core::ptr::eq(self, other) => true,
            Some(other) => self.is_equal_to(other),
        }
    }

    /// Untyped comparison; a value of any other type is never equal.
    fn equals_any(&self, other: Option<&dyn Any>) -> bool {
        other
            .and_then(|other| other.downcast_ref::<Self>())
            .is_some_and(|other| self.equals(Some(other)))
    }

    fn equality_hash(&self) -> u64 {
        self.hash_code()
    }
}

impl<T: EqualityDefinition> StructuralEquality for T {}

/// Symmetric comparison of two possibly-absent references.
pub fn equal<T: EqualityDefinition>(left: Option<&T>, right: Option<&T>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(left), right @ Some(_)) => left.equals(right),
        _ => false,
    }
}

pub fn not_equal<T: EqualityDefinition>(left: Option<&T>, right: Option<&T>) -> bool {
    !equal(left, right)
}

//! Canonical values: the unit of comparison and of hash contribution.
//!
//! A designated member's raw value is normalized into a [`CanonicalValue`] before it
//! is compared or hashed. Value-like kinds (integers, floats, fixed point, booleans,
//! characters, text, instants) compare by value. Everything else either brings its
//! own equality definition ([`CanonicalValue::Nested`]) or is explicitly compared by
//! identity through [`ByIdentity`] ([`CanonicalValue::Identity`]). Shared handles
//! (`Arc`, `Rc`) are transparent: they compare as the value they point at.
//!
//! The normalizer is deliberately shallow: a nested structurally-equal type is asked
//! for its own verdict, it is never descended into field by field.

use core::any::Any;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::borrow::Cow;
use std::rc::Rc;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::equality::{EqualityDefinition, misconfigured};
use crate::error::EqualityResult;

/// Payload-free tag naming the kind of a canonical value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Null / `None`. Only ever a runtime kind, never a declared one.
    Absent,
    Integer,
    Float,
    Decimal,
    Boolean,
    Character,
    Text,
    Instant,
    LocalInstant,
    /// A member type with its own equality definition.
    Nested,
    /// A handle wrapped in [`ByIdentity`], compared by pointer identity.
    Identity,
}

/// Normalized, comparable form of one member value.
#[derive(Debug, Clone)]
pub enum CanonicalValue<'a> {
    Absent,
    Integer(i128),
    /// Unsigned integers above `i128::MAX`. Anything smaller is always `Integer`, so
    /// `5u8` and `5u128` stay one value.
    WideInteger(u128),
    /// Compared by canonical bits: all NaNs are one value and `-0.0 == 0.0`.
    Float(f64),
    Decimal(Decimal),
    Boolean(bool),
    Character(char),
    Text(Cow<'a, str>),
    Instant(DateTime<Utc>),
    LocalInstant(NaiveDateTime),
    Nested(&'a dyn DynEquality),
    Identity(Identity),
}

impl CanonicalValue<'_> {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Absent => ValueKind::Absent,
            Self::Integer(_) | Self::WideInteger(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Decimal(_) => ValueKind::Decimal,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Character(_) => ValueKind::Character,
            Self::Text(_) => ValueKind::Text,
            Self::Instant(_) => ValueKind::Instant,
            Self::LocalInstant(_) => ValueKind::LocalInstant,
            Self::Nested(_) => ValueKind::Nested,
            Self::Identity(_) => ValueKind::Identity,
        }
    }

    /// Hash contribution of this value.
    ///
    /// Deterministic for the process lifetime. Nested values contribute their own
    /// hash code unchanged.
    pub fn hash_code(&self) -> u64 {
        match self {
            Self::Nested(v) => v.dyn_hash_code(),
            _ => self.value_hash(),
        }
    }

    /// [`hash_code`](Self::hash_code), returning a nested definition's
    /// configuration error instead of panicking.
    pub fn try_hash_code(&self) -> EqualityResult<u64> {
        match self {
            Self::Nested(v) => v.try_dyn_hash_code(),
            _ => Ok(self.value_hash()),
        }
    }

    /// `==`, returning a nested definition's configuration error instead of
    /// panicking.
    pub fn try_eq(&self, other: &Self) -> EqualityResult<bool> {
        match (self, other) {
            (Self::Nested(a), Self::Nested(b)) => a.try_dyn_is_equal(*b),
            _ => Ok(self == other),
        }
    }

    fn value_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn float_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

impl PartialEq for CanonicalValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Absent, Self::Absent) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::WideInteger(a), Self::WideInteger(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_bits(*a) == float_bits(*b),
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Character(a), Self::Character(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Instant(a), Self::Instant(b)) => a == b,
            (Self::LocalInstant(a), Self::LocalInstant(b)) => a == b,
            (Self::Nested(a), Self::Nested(b)) => a.dyn_is_equal(*b),
            (Self::Identity(a), Self::Identity(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CanonicalValue<'_> {}

impl Hash for CanonicalValue<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Self::Absent => {}
            Self::Integer(v) => v.hash(state),
            Self::WideInteger(v) => v.hash(state),
            Self::Float(v) => float_bits(*v).hash(state),
            Self::Decimal(v) => v.hash(state),
            Self::Boolean(v) => v.hash(state),
            Self::Character(v) => v.hash(state),
            Self::Text(v) => v.hash(state),
            Self::Instant(v) => v.hash(state),
            Self::LocalInstant(v) => v.hash(state),
            Self::Nested(v) => state.write_u64(v.dyn_hash_code()),
            Self::Identity(v) => v.hash(state),
        }
    }
}

/// Fixed-point decimal in normalized form.
///
/// Trailing zeros are stripped on construction, so `1.0` and `1.00` are the same
/// value and hash alike.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

impl Decimal {
    /// `mantissa * 10^-scale`.
    pub fn new(mantissa: i128, scale: u32) -> Self {
        let (mut mantissa, mut scale) = (mantissa, scale);
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        if mantissa == 0 {
            scale = 0;
        }
        Self { mantissa, scale }
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let digits = format!("{digits:0>width$}", width = scale + 1);
        let (whole, frac) = digits.split_at(digits.len() - scale);
        write!(f, "{sign}{whole}.{frac}")
    }
}

/// Pointer identity of a shared value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Identity(usize);

impl Identity {
    pub fn of<T: ?Sized>(ptr: *const T) -> Self {
        Self(ptr.cast::<()>().addr())
    }
}

/// Object-safe view of a type with its own equality definition.
///
/// Implemented for every [`EqualityDefinition`] type; lets a nested member be
/// compared through its own definition without knowing its concrete type.
pub trait DynEquality: Any {
    fn as_any(&self) -> &dyn Any;
    fn try_dyn_is_equal(&self, other: &dyn DynEquality) -> EqualityResult<bool>;
    fn try_dyn_hash_code(&self) -> EqualityResult<u64>;
    fn dyn_type_name(&self) -> &'static str;

    fn dyn_is_equal(&self, other: &dyn DynEquality) -> bool {
        self.try_dyn_is_equal(other).unwrap_or_else(misconfigured)
    }

    fn dyn_hash_code(&self) -> u64 {
        self.try_dyn_hash_code().unwrap_or_else(misconfigured)
    }
}

impl<T: EqualityDefinition> DynEquality for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn try_dyn_is_equal(&self, other: &dyn DynEquality) -> EqualityResult<bool> {
        match other.as_any().downcast_ref::<T>() {
            None => Ok(false),
            Some(other) if core::ptr::eq(self, other) => Ok(true),
            Some(other) => self.try_is_equal_to(other),
        }
    }

    fn try_dyn_hash_code(&self) -> EqualityResult<u64> {
        self.try_hash_code()
    }

    fn dyn_type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}

impl fmt::Debug for dyn DynEquality + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dyn_type_name())
    }
}

/// Values that can be designated as comparison members.
///
/// A member type without an impl cannot be designated; that surfaces as a compile
/// error at the derive site.
pub trait Canonicalize {
    /// Kind reported by member descriptors of this type.
    const KIND: ValueKind;

    fn canonicalize(&self) -> CanonicalValue<'_>;
}

/// Normalize a raw member value.
pub fn normalize<V: Canonicalize + ?Sized>(value: &V) -> CanonicalValue<'_> {
    value.canonicalize()
}

macro_rules! impl_integer {
    ($($t:ty),* $(,)?) => {
        $(
            impl Canonicalize for $t {
                const KIND: ValueKind = ValueKind::Integer;

                fn canonicalize(&self) -> CanonicalValue<'_> {
                    CanonicalValue::Integer(*self as i128)
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl Canonicalize for u128 {
    const KIND: ValueKind = ValueKind::Integer;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        i128::try_from(*self).map_or(CanonicalValue::WideInteger(*self), CanonicalValue::Integer)
    }
}

impl Canonicalize for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::Float(f64::from(*self))
    }
}

impl Canonicalize for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::Float(*self)
    }
}

impl Canonicalize for Decimal {
    const KIND: ValueKind = ValueKind::Decimal;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::Decimal(*self)
    }
}

impl Canonicalize for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::Boolean(*self)
    }
}

impl Canonicalize for char {
    const KIND: ValueKind = ValueKind::Character;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::Character(*self)
    }
}

impl Canonicalize for str {
    const KIND: ValueKind = ValueKind::Text;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::Text(Cow::Borrowed(self))
    }
}

impl Canonicalize for String {
    const KIND: ValueKind = ValueKind::Text;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::Text(Cow::Borrowed(self.as_str()))
    }
}

impl<B> Canonicalize for Cow<'_, B>
where
    B: Canonicalize + ToOwned + ?Sized,
{
    const KIND: ValueKind = B::KIND;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        (**self).canonicalize()
    }
}

impl<Tz: TimeZone> Canonicalize for DateTime<Tz> {
    const KIND: ValueKind = ValueKind::Instant;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::Instant(self.with_timezone(&Utc))
    }
}

impl Canonicalize for SystemTime {
    const KIND: ValueKind = ValueKind::Instant;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::Instant(DateTime::<Utc>::from(*self))
    }
}

impl Canonicalize for NaiveDateTime {
    const KIND: ValueKind = ValueKind::LocalInstant;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::LocalInstant(*self)
    }
}

impl Canonicalize for NaiveDate {
    const KIND: ValueKind = ValueKind::LocalInstant;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::LocalInstant(self.and_time(NaiveTime::MIN))
    }
}

impl<T: Canonicalize> Canonicalize for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        match self {
            Some(value) => value.canonicalize(),
            None => CanonicalValue::Absent,
        }
    }
}

impl<T: Canonicalize + ?Sized> Canonicalize for &T {
    const KIND: ValueKind = T::KIND;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        (**self).canonicalize()
    }
}

impl<T: Canonicalize + ?Sized> Canonicalize for Box<T> {
    const KIND: ValueKind = T::KIND;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        (**self).canonicalize()
    }
}

impl<T: Canonicalize + ?Sized> Canonicalize for Arc<T> {
    const KIND: ValueKind = T::KIND;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        (**self).canonicalize()
    }
}

impl<T: Canonicalize + ?Sized> Canonicalize for Rc<T> {
    const KIND: ValueKind = T::KIND;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        (**self).canonicalize()
    }
}

/// Compares a shared handle by the allocation it points at, not by its contents.
///
/// Two wrapped handles are the same value only when they are clones of one another.
/// The pointee needs no [`Canonicalize`] impl.
#[derive(Debug, Clone, Default)]
pub struct ByIdentity<P>(pub P);

impl<P> ByIdentity<P> {
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P> core::ops::Deref for ByIdentity<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.0
    }
}

impl<P> From<P> for ByIdentity<P> {
    fn from(handle: P) -> Self {
        Self(handle)
    }
}

impl<T: ?Sized> Canonicalize for ByIdentity<Arc<T>> {
    const KIND: ValueKind = ValueKind::Identity;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::Identity(Identity::of(Arc::as_ptr(&self.0)))
    }
}

impl<T: ?Sized> Canonicalize for ByIdentity<Rc<T>> {
    const KIND: ValueKind = ValueKind::Identity;

    fn canonicalize(&self) -> CanonicalValue<'_> {
        CanonicalValue::Identity(Identity::of(Rc::as_ptr(&self.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn integers_compare_by_value() {
        assert_eq!(normalize(&7u8), normalize(&7u8));
        assert_eq!(normalize(&-3i64), CanonicalValue::Integer(-3));
        assert_ne!(normalize(&1i32), normalize(&2i32));
        assert_eq!(normalize(&u64::MAX).hash_code(), normalize(&u64::MAX).hash_code());
    }

    #[test]
    fn different_kinds_never_compare_equal() {
        assert_ne!(normalize(&1i32), normalize(&1.0f64));
        assert_ne!(normalize(&true), normalize(&1u8));
        assert_ne!(normalize("a"), normalize(&'a'));
        assert_ne!(CanonicalValue::Absent, normalize(&0i32));
    }

    #[test]
    fn floats_are_reflexive_and_signless_at_zero() {
        let nan = normalize(&f64::NAN);
        assert_eq!(nan, normalize(&f64::NAN));
        assert_eq!(nan.hash_code(), normalize(&f64::NAN).hash_code());
        assert_eq!(normalize(&0.0f64), normalize(&-0.0f64));
        assert_eq!(normalize(&0.0f64).hash_code(), normalize(&-0.0f64).hash_code());
        assert_eq!(normalize(&1.5f32), CanonicalValue::Float(1.5));
        assert_ne!(normalize(&1.5f64), normalize(&1.25f64));
    }

    #[test]
    fn decimals_ignore_trailing_zeros() {
        assert_eq!(Decimal::new(100, 2), Decimal::new(1, 0));
        assert_eq!(Decimal::new(0, 5), Decimal::new(0, 0));
        assert_eq!(
            normalize(&Decimal::new(1250, 3)).hash_code(),
            normalize(&Decimal::new(125, 2)).hash_code()
        );
        assert_ne!(Decimal::new(125, 2), Decimal::new(125, 1));
    }

    #[test]
    fn decimal_display() {
        assert_eq!(Decimal::new(125, 2).to_string(), "1.25");
        assert_eq!(Decimal::new(-5, 3).to_string(), "-0.005");
        assert_eq!(Decimal::new(4200, 2).to_string(), "42");
    }

    #[test]
    fn text_is_exact() {
        let owned = String::from("Widget");
        assert_eq!(normalize(&owned), normalize("Widget"));
        assert_eq!(normalize(&Cow::Borrowed("Widget")), normalize(&owned));
        assert_ne!(normalize("widget"), normalize("Widget"));
        assert_eq!(normalize(&Box::<str>::from("x")), normalize("x"));
    }

    #[test]
    fn instants_compare_across_offsets() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let plus_two = utc.with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(normalize(&utc), normalize(&plus_two));
        assert_eq!(normalize(&utc).hash_code(), normalize(&plus_two).hash_code());
        assert_eq!(normalize(&SystemTime::from(utc)), normalize(&utc));
    }

    #[test]
    fn options_map_none_to_absent() {
        assert_eq!(normalize(&None::<i32>), CanonicalValue::Absent);
        assert_eq!(normalize(&Some(4i32)), CanonicalValue::Integer(4));
        assert_eq!(<Option<String> as Canonicalize>::KIND, ValueKind::Text);
    }

    #[test]
    fn shared_handles_compare_by_pointee() {
        let a: Arc<str> = Arc::from("alpha");
        let b: Arc<str> = Arc::from("alpha");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(normalize(&a), normalize(&b));
        assert_eq!(normalize(&a).hash_code(), normalize(&b).hash_code());
        assert_eq!(normalize(&a), normalize("alpha"));
        assert_eq!(<Arc<str> as Canonicalize>::KIND, ValueKind::Text);

        assert_eq!(normalize(&Rc::new(1i32)), normalize(&Rc::new(1i32)));
        assert_ne!(normalize(&Rc::new(1i32)), normalize(&Rc::new(2i32)));
    }

    #[test]
    fn identity_wrapper_compares_by_allocation() {
        let a = ByIdentity(Arc::new(vec![1, 2, 3]));
        let b = ByIdentity(Arc::new(vec![1, 2, 3]));
        assert_eq!(normalize(&a), normalize(&a.clone()));
        assert_ne!(normalize(&a), normalize(&b));

        let r = ByIdentity(Rc::new(5u8));
        assert_eq!(normalize(&r).kind(), ValueKind::Identity);
        assert_eq!(normalize(&r), normalize(&ByIdentity(Rc::clone(&r))));
        assert_eq!(**r, 5);
    }

    #[test]
    fn wide_unsigned_integers() {
        assert_eq!(normalize(&5u128), normalize(&5u8));
        assert_eq!(normalize(&5u128).hash_code(), normalize(&5i64).hash_code());
        assert_eq!(normalize(&u128::MAX), CanonicalValue::WideInteger(u128::MAX));
        assert_eq!(normalize(&u128::MAX), normalize(&u128::MAX));
        assert_ne!(normalize(&u128::MAX), normalize(&(u128::MAX - 1)));
        assert_ne!(normalize(&u128::MAX), normalize(&-1i128));
        assert_eq!(
            normalize(&(i128::MAX as u128)),
            CanonicalValue::Integer(i128::MAX)
        );
        assert_eq!(normalize(&u128::MAX).kind(), ValueKind::Integer);
    }
}

//! Comparison member descriptors and the table a type fills to declare them.
//!
//! A type declares its comparison-eligible members once, through [`Members::describe`].
//! Declaration order is kept: inherited members come first, in the order their
//! ancestors list them, followed by the type's own members. Order is stable but has no
//! bearing on the verdict; every member contributes independently.

use core::any::type_name;
use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{EqualityError, EqualityResult, MemberError};
use crate::registry::MemberRegistry;
use crate::value::{CanonicalValue, Canonicalize, ValueKind};

type Accessor<T> =
    Arc<dyn for<'a> Fn(&'a T) -> Result<CanonicalValue<'a>, MemberError> + Send + Sync>;

// Pins the closure to the higher-ranked signature the table stores.
fn accessor<T, F>(read: F) -> Accessor<T>
where
    T: 'static,
    F: for<'a> Fn(&'a T) -> Result<CanonicalValue<'a>, MemberError> + Send + Sync + 'static,
{
    Arc::new(read)
}

/// A type whose comparison-eligible members can be enumerated.
///
/// Usually derived with `#[derive(EqualityDefinition)]`; implement it by hand when the
/// member list needs fallible accessors or computed values.
///
/// ```ignore
/// impl Members for Reading {
///     fn describe(table: &mut MemberTable<'_, Self>) {
///         table.member("numeric", |this: &Self| &this.numeric);
///     }
/// }
/// ```
pub trait Members: Sized + 'static {
    fn describe(table: &mut MemberTable<'_, Self>);
}

/// One designated member: name, declared kind and read accessor.
pub struct Member<T> {
    name: Cow<'static, str>,
    kind: ValueKind,
    declared_in: &'static str,
    read: Accessor<T>,
}

impl<T: 'static> Member<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind. `Option<V>` reports the kind of `V`.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Type that declared the member (an ancestor for inherited members).
    pub fn declared_in(&self) -> &'static str {
        self.declared_in
    }

    /// Extract and normalize this member's value from `subject`.
    pub fn read<'a>(&self, subject: &'a T) -> EqualityResult<CanonicalValue<'a>> {
        (self.read)(subject)
            .map_err(|err| EqualityError::unreadable(type_name::<T>(), self.name.clone(), err.reason()))
    }

    pub fn info(&self) -> MemberInfo {
        MemberInfo {
            name: self.name.to_string(),
            kind: self.kind,
            declared_in: self.declared_in,
        }
    }
}

impl<T> Clone for Member<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            declared_in: self.declared_in,
            read: Arc::clone(&self.read),
        }
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("declared_in", &self.declared_in)
            .finish_non_exhaustive()
    }
}

/// Serializable summary of a member descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberInfo {
    pub name: String,
    pub kind: ValueKind,
    pub declared_in: &'static str,
}

/// Ordered, validated member set of one type.
pub struct MemberSet<T> {
    type_name: &'static str,
    members: Vec<Member<T>>,
}

impl<T> fmt::Debug for MemberSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberSet")
            .field("type_name", &self.type_name)
            .field("members", &self.members)
            .finish()
    }
}

impl<T: 'static> MemberSet<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// An empty set means the type defines no custom equality.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Member<T>> {
        self.members.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Member<T>> {
        self.members.iter().find(|m| m.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(Member::name).collect()
    }

    pub fn infos(&self) -> Vec<MemberInfo> {
        self.members.iter().map(Member::info).collect()
    }
}

impl<'s, T: 'static> IntoIterator for &'s MemberSet<T> {
    type Item = &'s Member<T>;
    type IntoIter = core::slice::Iter<'s, Member<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builder a type fills in [`Members::describe`].
///
/// Declaration mistakes are collected and reported when the registry finishes the
/// table; the first one wins.
pub struct MemberTable<'r, T> {
    registry: &'r MemberRegistry,
    members: Vec<Member<T>>,
    error: Option<EqualityError>,
}

impl<'r, T: 'static> MemberTable<'r, T> {
    pub(crate) fn new(registry: &'r MemberRegistry) -> Self {
        Self {
            registry,
            members: Vec::new(),
            error: None,
        }
    }

    /// Designate a member read through a field projection.
    pub fn member<V, F>(&mut self, name: &'static str, project: F) -> &mut Self
    where
        V: Canonicalize + ?Sized + 'static,
        F: for<'a> Fn(&'a T) -> &'a V + Send + Sync + 'static,
    {
        let read = accessor(move |subject: &T| Ok(project(subject).canonicalize()));
        self.push(Cow::Borrowed(name), V::KIND, type_name::<T>(), read)
    }

    /// Designate a member whose accessor can fail.
    ///
    /// A failure is a configuration error: it is surfaced to the caller of every
    /// comparison that touches the member.
    pub fn try_member<F>(&mut self, name: &'static str, kind: ValueKind, read: F) -> &mut Self
    where
        F: for<'a> Fn(&'a T) -> Result<CanonicalValue<'a>, MemberError> + Send + Sync + 'static,
    {
        self.push(Cow::Borrowed(name), kind, type_name::<T>(), accessor(read))
    }

    /// Inherit every member of an embedded ancestor.
    ///
    /// The ancestor's members are projected through `project` and named
    /// `"{path}.{member}"`.
    pub fn inherit<B, F>(&mut self, path: &'static str, project: F) -> &mut Self
    where
        B: Members,
        F: for<'a> Fn(&'a T) -> &'a B + Send + Sync + 'static,
    {
        let base = match self.registry.members_of::<B>() {
            Ok(base) => base,
            Err(err) => {
                self.error.get_or_insert(err);
                return self;
            }
        };

        let project = Arc::new(project);
        for member in base.iter() {
            let inner = Arc::clone(&member.read);
            let project = Arc::clone(&project);
            let read = accessor(move |subject: &T| (*inner)((*project)(subject)));
            let name = if path.is_empty() {
                member.name.clone()
            } else {
                Cow::Owned(format!("{path}.{}", member.name))
            };
            self.push(name, member.kind, member.declared_in, read);
        }
        self
    }

    fn push(
        &mut self,
        name: Cow<'static, str>,
        kind: ValueKind,
        declared_in: &'static str,
        read: Accessor<T>,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if name.is_empty() {
            self.error = Some(EqualityError::EmptyMemberName {
                type_name: type_name::<T>(),
            });
        } else if self.members.iter().any(|m| m.name == name) {
            self.error = Some(EqualityError::duplicate(type_name::<T>(), name));
        } else {
            self.members.push(Member {
                name,
                kind,
                declared_in,
                read,
            });
        }
        self
    }

    pub(crate) fn finish(self) -> EqualityResult<MemberSet<T>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(MemberSet {
                type_name: type_name::<T>(),
                members: self.members,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Base {
        numeric: i32,
    }

    impl Members for Base {
        fn describe(table: &mut MemberTable<'_, Self>) {
            table.member("numeric", |this: &Self| &this.numeric);
        }
    }

    struct Derived {
        base: Base,
        label: String,
    }

    impl Members for Derived {
        fn describe(table: &mut MemberTable<'_, Self>) {
            table
                .inherit("base", |this: &Self| &this.base)
                .member("label", |this: &Self| &this.label);
        }
    }

    fn build<T: Members>(registry: &MemberRegistry) -> EqualityResult<MemberSet<T>> {
        let mut table = MemberTable::new(registry);
        T::describe(&mut table);
        table.finish()
    }

    #[test]
    fn inherited_members_come_first() {
        let registry = MemberRegistry::new();
        let set = build::<Derived>(&registry).unwrap();
        assert_eq!(set.names(), vec!["base.numeric", "label"]);
        assert_eq!(set.get("base.numeric").unwrap().kind(), ValueKind::Integer);
        assert!(set.get("base.numeric").unwrap().declared_in().ends_with("Base"));
        assert!(set.get("label").unwrap().declared_in().ends_with("Derived"));
    }

    #[test]
    fn projected_accessors_read_through_the_ancestor() {
        let registry = MemberRegistry::new();
        let set = build::<Derived>(&registry).unwrap();
        let subject = Derived {
            base: Base { numeric: 9 },
            label: "nine".into(),
        };
        let values: Vec<_> = set.iter().map(|m| m.read(&subject).unwrap()).collect();
        assert_eq!(values[0], CanonicalValue::Integer(9));
        assert_eq!(values[1], CanonicalValue::Text("nine".into()));
    }

    struct Twice {
        a: i32,
        b: i32,
    }

    impl Members for Twice {
        fn describe(table: &mut MemberTable<'_, Self>) {
            table
                .member("value", |this: &Self| &this.a)
                .member("value", |this: &Self| &this.b);
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = MemberRegistry::new();
        let err = build::<Twice>(&registry).unwrap_err();
        assert!(matches!(err, EqualityError::DuplicateMember { ref member, .. } if member == "value"));
    }

    struct Nameless {
        a: i32,
    }

    impl Members for Nameless {
        fn describe(table: &mut MemberTable<'_, Self>) {
            table.member("", |this: &Self| &this.a);
        }
    }

    #[test]
    fn empty_names_are_rejected() {
        let registry = MemberRegistry::new();
        let err = build::<Nameless>(&registry).unwrap_err();
        assert!(matches!(err, EqualityError::EmptyMemberName { .. }));
    }

    struct Guarded {
        ready: bool,
    }

    impl Members for Guarded {
        fn describe(table: &mut MemberTable<'_, Self>) {
            table.try_member("ready", ValueKind::Boolean, |this: &Self| {
                if this.ready {
                    Ok(CanonicalValue::Boolean(true))
                } else {
                    Err(MemberError::new("not initialised"))
                }
            });
        }
    }

    #[test]
    fn accessor_failures_carry_type_and_member() {
        let registry = MemberRegistry::new();
        let set = build::<Guarded>(&registry).unwrap();
        let member = set.get("ready").unwrap();
        assert_eq!(member.read(&Guarded { ready: true }).unwrap(), CanonicalValue::Boolean(true));

        let err = member.read(&Guarded { ready: false }).unwrap_err();
        match err {
            EqualityError::UnreadableMember { type_name, member, reason } => {
                assert!(type_name.ends_with("Guarded"));
                assert_eq!(member, "ready");
                assert_eq!(reason, "not initialised");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

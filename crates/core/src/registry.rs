//! Per-type member discovery with a process-lifetime cache.
//!
//! A type's member set is immutable once the type is defined, so it is computed on
//! first use and published into a copy-on-write map. Publication is
//! compute-then-publish-if-absent: concurrent first use may compute the same table
//! twice, the first published copy wins and readers never block.

use core::any::{Any, TypeId, type_name};
use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap as HashMap;

use crate::error::EqualityResult;
use crate::member::{MemberInfo, MemberSet, MemberTable, Members};

#[derive(Clone)]
struct Entry {
    type_name: &'static str,
    set: Arc<dyn Any + Send + Sync>,
}

type Tables = HashMap<TypeId, Entry>;

static GLOBAL: LazyLock<MemberRegistry> = LazyLock::new(MemberRegistry::new);

/// Cache of validated member sets, keyed by type.
pub struct MemberRegistry {
    tables: ArcSwap<Tables>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shared by the facade and the std trait impls.
    pub fn global() -> &'static MemberRegistry {
        &GLOBAL
    }

    /// Ordered comparison-eligible members of `T`, ancestors first.
    ///
    /// Configuration errors are returned on every call; they are never cached.
    pub fn members_of<T: Members>(&self) -> EqualityResult<Arc<MemberSet<T>>> {
        if let Some(set) = self.cached::<T>() {
            return Ok(set);
        }

        let mut table = MemberTable::new(self);
        T::describe(&mut table);
        let computed = Arc::new(table.finish()?);
        Ok(self.publish(computed))
    }

    pub fn is_cached<T: Members>(&self) -> bool {
        self.tables.load().contains_key(&TypeId::of::<T>())
    }

    /// Type names of every cached member set, sorted.
    pub fn cached_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.tables.load().values().map(|e| e.type_name).collect();
        names.sort_unstable();
        names
    }

    /// Number of types whose member sets are cached.
    pub fn len(&self) -> usize {
        self.tables.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.load().is_empty()
    }

    fn cached<T: Members>(&self) -> Option<Arc<MemberSet<T>>> {
        let entry = self.tables.load().get(&TypeId::of::<T>())?.set.clone();
        entry.downcast::<MemberSet<T>>().ok()
    }

    fn publish<T: Members>(&self, computed: Arc<MemberSet<T>>) -> Arc<MemberSet<T>> {
        let key = TypeId::of::<T>();
        loop {
            let cur = self.tables.load_full();
            if let Some(existing) = cur.get(&key) {
                if let Ok(existing) = Arc::clone(&existing.set).downcast::<MemberSet<T>>() {
                    tracing::trace!(type_name = type_name::<T>(), "member table already published");
                    return existing;
                }
            }

            let mut next = (*cur).clone();
            next.insert(
                key,
                Entry {
                    type_name: type_name::<T>(),
                    set: Arc::clone(&computed) as Arc<dyn Any + Send + Sync>,
                },
            );

            let prev = self.tables.compare_and_swap(&cur, Arc::new(next));
            if Arc::ptr_eq(&prev, &cur) {
                tracing::debug!(
                    type_name = type_name::<T>(),
                    members = computed.len(),
                    "member table published"
                );
                return computed;
            }
        }
    }
}

impl Default for MemberRegistry {
    fn default() -> Self {
        Self {
            tables: ArcSwap::from_pointee(Tables::default()),
        }
    }
}

impl core::fmt::Debug for MemberRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemberRegistry")
            .field("cached_types", &self.cached_types())
            .finish()
    }
}

/// Members of `T` from the global registry.
pub fn members_of<T: Members>() -> EqualityResult<Arc<MemberSet<T>>> {
    MemberRegistry::global().members_of::<T>()
}

/// Serializable description of `T`'s member set.
pub fn describe<T: Members>() -> EqualityResult<Vec<MemberInfo>> {
    Ok(members_of::<T>()?.infos())
}

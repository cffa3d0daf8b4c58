//! Shadow item types.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use mirror_util::Identity;
use serde::Serialize;

/// One element of a list shadow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirroredItem<T, M> {
    /// Current 0-based position. Recomputed on every mutation.
    pub index: usize,
    pub identity: Identity,
    pub value: T,
    pub meta: M,
}

/// One element of a record shadow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirroredRecordItem<K, T, M> {
    pub index: usize,
    pub identity: Identity,
    pub map_key: K,
    pub value: T,
    pub meta: M,
    /// Another item in the sequence shares `map_key`.
    pub duplicated: bool,
    /// Suppressed: the value is not written to the external record.
    pub ignored: bool,
}

/// Access shared by list and record items.
pub trait ShadowItem: Clone {
    type Value;
    type Meta;

    fn identity(&self) -> &Identity;
    fn value(&self) -> &Self::Value;
    fn meta(&self) -> &Self::Meta;

    fn set_value(&mut self, value: Self::Value);
    fn meta_mut(&mut self) -> &mut Self::Meta;
}

impl<T: Clone, M: Clone> ShadowItem for MirroredItem<T, M> {
    type Value = T;
    type Meta = M;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn value(&self) -> &T {
        &self.value
    }

    fn meta(&self) -> &M {
        &self.meta
    }

    fn set_value(&mut self, value: T) {
        self.value = value;
    }

    fn meta_mut(&mut self) -> &mut M {
        &mut self.meta
    }
}

impl<K: Clone, T: Clone, M: Clone> ShadowItem for MirroredRecordItem<K, T, M> {
    type Value = T;
    type Meta = M;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn value(&self) -> &T {
        &self.value
    }

    fn meta(&self) -> &M {
        &self.meta
    }

    fn set_value(&mut self, value: T) {
        self.value = value;
    }

    fn meta_mut(&mut self) -> &mut M {
        &mut self.meta
    }
}

/// A bare list entry that has no identity yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft<T, M> {
    pub value: T,
    /// `None` runs the configured initializer.
    pub meta: Option<M>,
}

impl<T, M> ItemDraft<T, M> {
    pub fn new(value: T) -> Self {
        Self { value, meta: None }
    }

    pub fn with_meta(value: T, meta: M) -> Self {
        Self {
            value,
            meta: Some(meta),
        }
    }
}

/// A bare record entry that has no identity yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft<K, T, M> {
    pub key: K,
    pub value: T,
    pub meta: Option<M>,
}

impl<K, T, M> RecordDraft<K, T, M> {
    pub fn new(key: K, value: T) -> Self {
        Self {
            key,
            value,
            meta: None,
        }
    }

    pub fn with_meta(key: K, value: T, meta: M) -> Self {
        Self {
            key,
            value,
            meta: Some(meta),
        }
    }
}

/// One element of a bulk `set_items` result.
#[derive(Debug, Clone)]
pub enum Entry<I, D> {
    /// An existing item, kept with its identity and metadata.
    Keep(Rc<I>),
    /// A new item; receives a fresh identity.
    New(D),
}

/// The reserved slot for the next appended item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingItem {
    pub index: usize,
    pub identity: Identity,
}

/// Reference-identity wrapper.
///
/// Two `Shared` values are equal only when they point to the same
/// allocation, which makes reconciliation treat a structurally equal but
/// freshly allocated value as an edit.
pub struct Shared<T: ?Sized>(pub Rc<T>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(value))
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Eq for Shared<T> {}

impl<T: ?Sized> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

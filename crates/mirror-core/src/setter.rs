//! Memoized per-position setters.
//!
//! A setter is a capability bound to `(mirror, index)` (and a field, for
//! metadata). It holds only a weak reference to the mirror and looks the
//! item up when invoked, so it always acts on the latest shadow. Handles
//! returned for the same position are the same allocation, which lets
//! renderers skip work by comparing them with `==`.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::item::ShadowItem;
use crate::meta::Meta;
use crate::mirror::{Inner, MetaField, MetaValue, Mirror, Variant};

struct ValueSlot<V: Variant> {
    mirror: Weak<Inner<V>>,
    index: usize,
}

/// Writes the value at one position. Hard update.
pub struct ValueSetter<V: Variant> {
    slot: Rc<ValueSlot<V>>,
}

impl<V: Variant> ValueSetter<V> {
    pub(crate) fn new(mirror: Weak<Inner<V>>, index: usize) -> Self {
        Self {
            slot: Rc::new(ValueSlot { mirror, index }),
        }
    }

    pub fn index(&self) -> usize {
        self.slot.index
    }

    /// Replace the value. No-op if the position no longer exists or the
    /// mirror was dropped.
    pub fn set(&self, value: V::Value) {
        if let Some(mirror) = self.mirror() {
            mirror.set_value(self.slot.index, value, None);
        }
    }

    /// Compute the new value from the latest one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&V::Value) -> V::Value,
    {
        let Some(mirror) = self.mirror() else {
            return;
        };
        let Some(item) = mirror.get(self.slot.index) else {
            tracing::debug!(index = self.slot.index, "value setter past end of sequence");
            return;
        };
        let value = f(item.value());
        mirror.set_value(self.slot.index, value, None);
    }

    fn mirror(&self) -> Option<Mirror<V>> {
        self.slot.mirror.upgrade().map(Mirror::from_inner)
    }
}

impl<V: Variant> Clone for ValueSetter<V> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<V: Variant> PartialEq for ValueSetter<V> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<V: Variant> Eq for ValueSetter<V> {}

impl<V: Variant> fmt::Debug for ValueSetter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSetter")
            .field("index", &self.slot.index)
            .finish()
    }
}

struct MetaSlot<V: Variant> {
    mirror: Weak<Inner<V>>,
    index: usize,
    field: MetaField<V>,
}

/// Writes one metadata field at one position. Soft update.
pub struct MetaSetter<V: Variant> {
    slot: Rc<MetaSlot<V>>,
}

impl<V: Variant> MetaSetter<V> {
    pub(crate) fn new(mirror: Weak<Inner<V>>, index: usize, field: MetaField<V>) -> Self {
        Self {
            slot: Rc::new(MetaSlot {
                mirror,
                index,
                field,
            }),
        }
    }

    pub fn index(&self) -> usize {
        self.slot.index
    }

    pub fn field(&self) -> &MetaField<V> {
        &self.slot.field
    }

    /// Set the field, or clear it with `None`.
    pub fn set(&self, value: Option<MetaValue<V>>) {
        if let Some(mirror) = self.mirror() {
            mirror.set_meta(self.slot.index, &self.slot.field, value);
        }
    }

    /// Compute the field from its latest value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(Option<&MetaValue<V>>) -> Option<MetaValue<V>>,
    {
        let Some(mirror) = self.mirror() else {
            return;
        };
        let Some(item) = mirror.get(self.slot.index) else {
            tracing::debug!(index = self.slot.index, "meta setter past end of sequence");
            return;
        };
        let value = f(item.meta().field(&self.slot.field));
        mirror.set_meta(self.slot.index, &self.slot.field, value);
    }

    fn mirror(&self) -> Option<Mirror<V>> {
        self.slot.mirror.upgrade().map(Mirror::from_inner)
    }
}

impl<V: Variant> Clone for MetaSetter<V> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<V: Variant> PartialEq for MetaSetter<V> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<V: Variant> Eq for MetaSetter<V> {}

impl<V: Variant> fmt::Debug for MetaSetter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaSetter")
            .field("index", &self.slot.index)
            .finish_non_exhaustive()
    }
}

//! The reconciliation primitive shared by the list and record mirrors.
//!
//! # Overview
//!
//! A [`Mirror`] holds the latest shadow sequence behind a single
//! `RefCell`. Every operation reads that cell when it runs, never a copy
//! captured earlier, so several operations issued before the host has
//! re-rendered still observe each other's results.
//!
//! Operations fall into two groups:
//!
//! - **hard updates** change values, keys or order. The new sequence is
//!   settled (re-indexed, and for records de-duplicated), the plain external
//!   value is derived from it and handed to the external setter.
//! - **soft updates** touch metadata only and never reach the setter.
//!
//! [`Mirror::observe`] is the single entry point for values coming back from
//! the external owner. A compatible value leaves the shadow alone; anything
//! else rebuilds it with fresh identities.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use mirror_util::{Identity, IdentityAllocator};

use crate::error::MirrorError;
use crate::item::{Entry, PendingItem, ShadowItem};
use crate::meta::Meta;
use crate::options::MirrorOptions;
use crate::setter::{MetaSetter, ValueSetter};

/// Field name type of a variant's metadata.
pub type MetaField<V> = <<V as Variant>::Meta as Meta>::Field;
/// Field value type of a variant's metadata.
pub type MetaValue<V> = <<V as Variant>::Meta as Meta>::Value;

/// What differs between the list and the record mirror.
pub trait Variant: 'static {
    type Value: Clone + PartialEq + 'static;
    type Meta: Meta + 'static;
    type Item: ShadowItem<Value = Self::Value, Meta = Self::Meta> + 'static;
    /// A bare entry waiting for an identity.
    type Draft;
    /// Value pushed to the external setter.
    type External;
    /// Borrowed form of the external value accepted by [`Mirror::observe`].
    type Observed: ?Sized;

    /// Build a new item. Its index is fixed up by [`Variant::settle`].
    fn create(&self, identity: Identity, draft: Self::Draft) -> Self::Item;

    /// Fresh shadow for an external value (`None` is empty).
    fn rebuild(
        &self,
        external: Option<&Self::Observed>,
        identities: &dyn IdentityAllocator,
    ) -> Vec<Self::Item>;

    fn is_compatible(&self, items: &[Rc<Self::Item>], external: Option<&Self::Observed>) -> bool;

    /// Restore the sequence invariants after a hard update. Items whose
    /// derived fields did not change must keep their `Rc`.
    fn settle(&self, items: Vec<Rc<Self::Item>>) -> Vec<Rc<Self::Item>>;

    fn derive(&self, items: &[Rc<Self::Item>]) -> Self::External;

    /// Metadata from the configured initializer.
    fn initial_meta(&self, item: &Self::Item) -> Self::Meta;

    /// Whether bulk metadata writes apply to this item.
    fn meta_visible(&self, _item: &Self::Item) -> bool {
        true
    }
}

/// Outcome of [`Mirror::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The shadow still describes the external value. Nothing changed.
    Unchanged,
    /// The shadow was discarded and rebuilt with fresh identities.
    Rebuilt,
}

/// Source of one metadata field in [`Mirror::set_metas`].
pub enum MetaSource<I: ShadowItem, X> {
    /// Clear the field on every item.
    Clear,
    /// One entry per position; missing or `None` entries clear the field.
    Positional(Vec<Option<X>>),
    /// Entries by position; absent positions clear the field.
    Sparse(HashMap<usize, X>),
    /// Computed from `(value, index, item)`.
    Compute(Box<dyn Fn(&I::Value, usize, &I) -> Option<X>>),
}

impl<I: ShadowItem, X> MetaSource<I, X> {
    pub fn compute(f: impl Fn(&I::Value, usize, &I) -> Option<X> + 'static) -> Self {
        MetaSource::Compute(Box::new(f))
    }

    fn resolve(&self, index: usize, item: &I) -> Option<X>
    where
        X: Clone,
    {
        match self {
            MetaSource::Clear => None,
            MetaSource::Positional(values) => values.get(index).cloned().flatten(),
            MetaSource::Sparse(values) => values.get(&index).cloned(),
            MetaSource::Compute(f) => f(item.value(), index, item),
        }
    }
}

struct Shadow<I> {
    items: Rc<[Rc<I>]>,
    append_identity: Identity,
    revision: u64,
}

pub(crate) struct Inner<V: Variant> {
    variant: V,
    identities: Rc<dyn IdentityAllocator>,
    on_change: Option<Rc<dyn Fn(u64)>>,
    setter: Rc<dyn Fn(V::External)>,
    shadow: RefCell<Shadow<V::Item>>,
    value_setters: RefCell<HashMap<usize, ValueSetter<V>>>,
    meta_setters: RefCell<HashMap<(usize, MetaField<V>), MetaSetter<V>>>,
}

/// Shadow of an externally owned collection.
///
/// The handle is cheap to clone; clones share the same shadow. See
/// [`ListMirror`](crate::ListMirror) and [`RecordMirror`](crate::RecordMirror).
pub struct Mirror<V: Variant> {
    pub(crate) inner: Rc<Inner<V>>,
}

impl<V: Variant> Clone for Mirror<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: Variant> fmt::Debug for Mirror<V>
where
    V::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shadow = self.inner.shadow.borrow();
        f.debug_struct("Mirror")
            .field("items", &shadow.items)
            .field("append_identity", &shadow.append_identity)
            .field("revision", &shadow.revision)
            .finish()
    }
}

impl<V: Variant> Mirror<V> {
    pub(crate) fn with_variant(
        variant: V,
        options: MirrorOptions,
        initial: Option<&V::Observed>,
        setter: Rc<dyn Fn(V::External)>,
    ) -> Self {
        let items: Vec<Rc<V::Item>> = variant
            .rebuild(initial, &*options.identities)
            .into_iter()
            .map(Rc::new)
            .collect();
        let append_identity = options.identities.next();
        Self {
            inner: Rc::new(Inner {
                variant,
                identities: options.identities,
                on_change: options.on_change,
                setter,
                shadow: RefCell::new(Shadow {
                    items: items.into(),
                    append_identity,
                    revision: 0,
                }),
                value_setters: RefCell::new(HashMap::new()),
                meta_setters: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<Inner<V>>) -> Self {
        Self { inner }
    }

    // ── Reading ───────────────────────────────────────────────────────────

    /// The latest shadow sequence.
    pub fn items(&self) -> Rc<[Rc<V::Item>]> {
        Rc::clone(&self.inner.shadow.borrow().items)
    }

    pub fn len(&self) -> usize {
        self.inner.shadow.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Rc<V::Item>> {
        self.inner.shadow.borrow().items.get(index).cloned()
    }

    /// Current position of the item carrying `identity`.
    pub fn position_of(&self, identity: &Identity) -> Option<usize> {
        self.inner
            .shadow
            .borrow()
            .items
            .iter()
            .position(|item| item.identity() == identity)
    }

    /// The external value the current shadow describes.
    pub fn value(&self) -> V::External {
        self.inner.variant.derive(&self.items())
    }

    /// Identity reserved for the next appended item.
    pub fn append_identity(&self) -> Identity {
        self.inner.shadow.borrow().append_identity.clone()
    }

    /// The virtual trailing row the next append will fill.
    pub fn placeholder(&self) -> PendingItem {
        let shadow = self.inner.shadow.borrow();
        PendingItem {
            index: shadow.items.len(),
            identity: shadow.append_identity.clone(),
        }
    }

    /// Bumped on every shadow change, hard or soft.
    pub fn revision(&self) -> u64 {
        self.inner.shadow.borrow().revision
    }

    // ── Reconciliation ────────────────────────────────────────────────────

    /// Check a value observed from the external owner against the shadow.
    ///
    /// Observing the value produced by the mirror's own last hard update,
    /// or any value equal to it, is a no-op. Anything else discards every
    /// identity and all metadata.
    pub fn observe(&self, external: Option<&V::Observed>) -> Reconciliation {
        let items = self.items();
        if self.inner.variant.is_compatible(&items, external) {
            self.trim_setters(items.len());
            return Reconciliation::Unchanged;
        }
        let rebuilt: Vec<Rc<V::Item>> = self
            .inner
            .variant
            .rebuild(external, &*self.inner.identities)
            .into_iter()
            .map(Rc::new)
            .collect();
        tracing::debug!(
            previous = items.len(),
            len = rebuilt.len(),
            "external value incompatible with shadow, rebuilding"
        );
        let revision = self.store(rebuilt);
        self.notify(revision);
        Reconciliation::Rebuilt
    }

    // ── Hard updates ──────────────────────────────────────────────────────

    /// Replace the whole sequence with the result of `transform`.
    ///
    /// Kept entries retain identity and metadata; new entries get a fresh
    /// identity.
    pub fn set_items<F>(&self, transform: F)
    where
        F: FnOnce(&[Rc<V::Item>]) -> Vec<Entry<V::Item, V::Draft>>,
    {
        let items = self.items();
        let entries = transform(&items);
        self.replace_items(entries);
    }

    pub fn replace_items(&self, entries: Vec<Entry<V::Item, V::Draft>>) {
        let next: Vec<Rc<V::Item>> = entries
            .into_iter()
            .map(|entry| match entry {
                Entry::Keep(item) => item,
                Entry::New(draft) => {
                    let identity = self.inner.identities.next();
                    Rc::new(self.inner.variant.create(identity, draft))
                }
            })
            .collect();
        self.commit_hard(next, "set_items");
    }

    /// Replace the value at `index`, shallow-merging `meta` when given.
    pub fn try_set_value(
        &self,
        index: usize,
        value: V::Value,
        meta: Option<V::Meta>,
    ) -> Result<(), MirrorError> {
        self.try_update(index, "set_value", true, |item| {
            item.set_value(value);
            if let Some(patch) = meta {
                item.meta_mut().merge(patch);
            }
        })
    }

    pub fn set_value(&self, index: usize, value: V::Value, meta: Option<V::Meta>) {
        if let Err(err) = self.try_set_value(index, value, meta) {
            tracing::debug!(%err, "set_value rejected");
        }
    }

    /// Memoized setter bound to `index`.
    ///
    /// Repeated calls with the same index return the same handle (compare
    /// with `==`). Entries for positions past the end are dropped whenever
    /// the sequence shrinks or a compatible value is observed.
    pub fn value_setter(&self, index: usize) -> ValueSetter<V> {
        self.inner
            .value_setters
            .borrow_mut()
            .entry(index)
            .or_insert_with(|| ValueSetter::new(Rc::downgrade(&self.inner), index))
            .clone()
    }

    /// Insert a new item before `index` (`index == len` appends).
    pub(crate) fn try_insert_draft(&self, index: usize, draft: V::Draft) -> Result<(), MirrorError> {
        let items = self.items();
        if index > items.len() {
            return Err(MirrorError::out_of_range(index, items.len()));
        }
        let identity = self.inner.identities.next();
        let item = self.inner.variant.create(identity, draft);
        let mut next = items.to_vec();
        next.insert(index, Rc::new(item));
        self.commit_hard(next, "insert_item");
        Ok(())
    }

    /// Commit `draft` under the reserved append identity and reserve the
    /// next one.
    pub(crate) fn append_draft(&self, draft: V::Draft) {
        let reserved = self.inner.identities.next();
        let identity = std::mem::replace(
            &mut self.inner.shadow.borrow_mut().append_identity,
            reserved,
        );
        let item = self.inner.variant.create(identity, draft);
        let mut next = self.items().to_vec();
        next.push(Rc::new(item));
        self.commit_hard(next, "append_item");
    }

    pub fn try_remove_item(&self, index: usize) -> Result<(), MirrorError> {
        let items = self.items();
        if index >= items.len() {
            return Err(MirrorError::out_of_range(index, items.len()));
        }
        let mut next = items.to_vec();
        next.remove(index);
        self.commit_hard(next, "remove_item");
        Ok(())
    }

    pub fn remove_item(&self, index: usize) {
        if let Err(err) = self.try_remove_item(index) {
            tracing::debug!(%err, "remove_item rejected");
        }
    }

    /// Move the item at `from` to `to`, shifting everything in between by
    /// one slot. `from == to` is a no-op.
    pub fn try_move_item(&self, from: usize, to: usize) -> Result<(), MirrorError> {
        let items = self.items();
        let len = items.len();
        if from >= len {
            return Err(MirrorError::out_of_range(from, len));
        }
        if to >= len {
            return Err(MirrorError::out_of_range(to, len));
        }
        if from == to {
            return Ok(());
        }
        let mut next = items.to_vec();
        let moved = next.remove(from);
        next.insert(to, moved);
        self.commit_hard(next, "move_item");
        Ok(())
    }

    pub fn move_item(&self, from: usize, to: usize) {
        if let Err(err) = self.try_move_item(from, to) {
            tracing::debug!(%err, from, to, "move_item rejected");
        }
    }

    /// Apply `f` to a copy of the item at `index` and commit the result.
    pub(crate) fn try_update<F>(
        &self,
        index: usize,
        op: &'static str,
        hard: bool,
        f: F,
    ) -> Result<(), MirrorError>
    where
        F: FnOnce(&mut V::Item),
    {
        let items = self.items();
        let Some(current) = items.get(index) else {
            return Err(MirrorError::out_of_range(index, items.len()));
        };
        let mut item = V::Item::clone(current);
        f(&mut item);
        let mut next = items.to_vec();
        next[index] = Rc::new(item);
        if hard {
            self.commit_hard(next, op);
        } else {
            self.commit_soft(next, op);
        }
        Ok(())
    }

    // ── Soft updates ──────────────────────────────────────────────────────

    /// Re-initialize every item's metadata from the configured initializer.
    pub fn reset_metas(&self) {
        let variant = &self.inner.variant;
        self.reset_metas_with(|item| variant.initial_meta(item));
    }

    /// Re-initialize every item's metadata from `init`.
    pub fn reset_metas_with<F>(&self, init: F)
    where
        F: Fn(&V::Item) -> V::Meta,
    {
        let next = self
            .items()
            .iter()
            .map(|item| {
                let mut next = V::Item::clone(item);
                *next.meta_mut() = init(item);
                Rc::new(next)
            })
            .collect();
        self.commit_soft(next, "reset_metas");
    }

    /// Replace one item's metadata with `meta`, or re-initialize it.
    pub fn try_reset_meta(&self, index: usize, meta: Option<V::Meta>) -> Result<(), MirrorError> {
        let meta = match meta {
            Some(meta) => meta,
            None => {
                let item = self
                    .get(index)
                    .ok_or_else(|| MirrorError::out_of_range(index, self.len()))?;
                self.inner.variant.initial_meta(&item)
            }
        };
        self.try_update(index, "reset_meta", false, |item| *item.meta_mut() = meta)
    }

    pub fn reset_meta(&self, index: usize, meta: Option<V::Meta>) {
        if let Err(err) = self.try_reset_meta(index, meta) {
            tracing::debug!(%err, "reset_meta rejected");
        }
    }

    /// Write one metadata field on every item.
    ///
    /// Items the variant hides from bulk writes (ignored record items) get
    /// the field cleared whatever `source` says.
    pub fn set_metas(&self, field: MetaField<V>, source: MetaSource<V::Item, MetaValue<V>>) {
        let next = self
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let value = if self.inner.variant.meta_visible(item) {
                    source.resolve(index, item)
                } else {
                    None
                };
                if value.is_none() && item.meta().field(&field).is_none() {
                    return Rc::clone(item);
                }
                let mut next = V::Item::clone(item);
                next.meta_mut().set_field(&field, value);
                Rc::new(next)
            })
            .collect();
        self.commit_soft(next, "set_metas");
    }

    pub fn try_set_meta(
        &self,
        index: usize,
        field: &MetaField<V>,
        value: Option<MetaValue<V>>,
    ) -> Result<(), MirrorError> {
        self.try_update(index, "set_meta", false, |item| {
            item.meta_mut().set_field(field, value)
        })
    }

    pub fn set_meta(&self, index: usize, field: &MetaField<V>, value: Option<MetaValue<V>>) {
        if let Err(err) = self.try_set_meta(index, field, value) {
            tracing::debug!(%err, "set_meta rejected");
        }
    }

    /// Memoized setter bound to `(index, field)`.
    pub fn meta_setter(&self, index: usize, field: MetaField<V>) -> MetaSetter<V> {
        self.inner
            .meta_setters
            .borrow_mut()
            .entry((index, field.clone()))
            .or_insert_with(|| MetaSetter::new(Rc::downgrade(&self.inner), index, field))
            .clone()
    }

    // ── Commit ────────────────────────────────────────────────────────────

    pub(crate) fn commit_hard(&self, items: Vec<Rc<V::Item>>, op: &'static str) {
        let settled = self.inner.variant.settle(items);
        let external = self.inner.variant.derive(&settled);
        let len = settled.len();
        let revision = self.store(settled);
        tracing::trace!(op, len, revision, "hard update");
        let setter = Rc::clone(&self.inner.setter);
        setter(external);
        // A setter that wrote back through the mirror already announced a
        // newer revision.
        if self.revision() == revision {
            self.notify(revision);
        }
    }

    fn commit_soft(&self, items: Vec<Rc<V::Item>>, op: &'static str) {
        let len = items.len();
        let revision = self.store(items);
        tracing::trace!(op, len, revision, "soft update");
        self.notify(revision);
    }

    fn store(&self, items: Vec<Rc<V::Item>>) -> u64 {
        let len = items.len();
        let revision = {
            let mut shadow = self.inner.shadow.borrow_mut();
            shadow.items = items.into();
            shadow.revision += 1;
            shadow.revision
        };
        self.trim_setters(len);
        revision
    }

    fn notify(&self, revision: u64) {
        if let Some(listener) = self.inner.on_change.clone() {
            listener(revision);
        }
    }

    fn trim_setters(&self, len: usize) {
        self.inner
            .value_setters
            .borrow_mut()
            .retain(|index, _| *index < len);
        self.inner
            .meta_setters
            .borrow_mut()
            .retain(|(index, _), _| *index < len);
    }
}

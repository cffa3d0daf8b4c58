//! Mirror of a string-keyed external record.
//!
//! # Duplicate keys
//!
//! The shadow may hold several items with the same `map_key` (a user typing
//! a key that already exists, for instance). After every hard update the
//! duplicate resolution pass picks one winner per key:
//!
//! 1. the earliest item in sequence order that is not `ignored`;
//! 2. otherwise the earliest item of the group.
//!
//! Every member of a group with more than one item is `duplicated`, every
//! member except the winner is `ignored`, and only winners reach the derived
//! record. Items created by the mirror start out `ignored`, so a new item
//! never takes a key away from an existing one.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;
use mirror_util::{Identity, IdentityAllocator};

use crate::error::MirrorError;
use crate::item::{MirroredRecordItem, RecordDraft};
use crate::meta::{JsonMeta, Meta};
use crate::mirror::{Mirror, Variant};
use crate::options::{KeyOrder, RecordOptions};

/// Keyed reconciliation over `IndexMap<K, T>`.
pub struct RecordVariant<K, T, M> {
    init_meta: Option<Rc<dyn Fn(&T, &K) -> M>>,
    order: KeyOrder<K, T>,
}

impl<K, T, M> RecordVariant<K, T, M>
where
    K: Ord,
    M: Meta,
{
    fn init(&self, value: &T, key: &K) -> M {
        match &self.init_meta {
            Some(init) => init(value, key),
            None => M::default(),
        }
    }

    fn sorted_entries<'a>(&self, external: &'a IndexMap<K, T>) -> Vec<(&'a K, &'a T)> {
        let mut entries: Vec<(&K, &T)> = external.iter().collect();
        match &self.order {
            KeyOrder::Insertion => {}
            KeyOrder::Lexical => entries.sort_by(|a, b| a.0.cmp(b.0)),
            KeyOrder::Custom(cmp) => entries.sort_by(|a, b| cmp(*a, *b)),
        }
        entries
    }
}

impl<K, T, M> Variant for RecordVariant<K, T, M>
where
    K: Clone + Eq + Hash + Ord + 'static,
    T: Clone + PartialEq + 'static,
    M: Meta + 'static,
{
    type Value = T;
    type Meta = M;
    type Item = MirroredRecordItem<K, T, M>;
    type Draft = RecordDraft<K, T, M>;
    type External = IndexMap<K, T>;
    type Observed = IndexMap<K, T>;

    fn create(&self, identity: Identity, draft: RecordDraft<K, T, M>) -> Self::Item {
        let meta = match draft.meta {
            Some(meta) => meta,
            None => self.init(&draft.value, &draft.key),
        };
        MirroredRecordItem {
            index: 0,
            identity,
            map_key: draft.key,
            value: draft.value,
            meta,
            duplicated: false,
            ignored: true,
        }
    }

    fn rebuild(
        &self,
        external: Option<&IndexMap<K, T>>,
        identities: &dyn IdentityAllocator,
    ) -> Vec<Self::Item> {
        let Some(external) = external else {
            return Vec::new();
        };
        self.sorted_entries(external)
            .into_iter()
            .enumerate()
            .map(|(index, (key, value))| MirroredRecordItem {
                index,
                identity: identities.next(),
                map_key: key.clone(),
                value: value.clone(),
                meta: self.init(value, key),
                duplicated: false,
                ignored: false,
            })
            .collect()
    }

    fn is_compatible(&self, items: &[Rc<Self::Item>], external: Option<&IndexMap<K, T>>) -> bool {
        let empty = IndexMap::new();
        let external = external.unwrap_or(&empty);
        let mut live = 0;
        for item in items.iter().filter(|item| !item.ignored) {
            live += 1;
            match external.get(&item.map_key) {
                Some(value) if *value == item.value => {}
                _ => return false,
            }
        }
        live == external.len()
    }

    fn settle(&self, items: Vec<Rc<Self::Item>>) -> Vec<Rc<Self::Item>> {
        resolve_duplicates(&items)
    }

    fn derive(&self, items: &[Rc<Self::Item>]) -> IndexMap<K, T> {
        items
            .iter()
            .filter(|item| !item.ignored)
            .map(|item| (item.map_key.clone(), item.value.clone()))
            .collect()
    }

    fn initial_meta(&self, item: &Self::Item) -> M {
        self.init(&item.value, &item.map_key)
    }

    fn meta_visible(&self, item: &Self::Item) -> bool {
        !item.ignored
    }
}

struct KeyGroup {
    winner: usize,
    winner_live: bool,
    size: usize,
}

/// Re-index `items` and pick one winner per `map_key`.
///
/// Running the pass on its own output returns the same items (same `Rc`s).
pub fn resolve_duplicates<K, T, M>(
    items: &[Rc<MirroredRecordItem<K, T, M>>],
) -> Vec<Rc<MirroredRecordItem<K, T, M>>>
where
    K: Clone + Eq + Hash,
    T: Clone,
    M: Clone,
{
    let mut groups: HashMap<&K, KeyGroup> = HashMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        match groups.get_mut(&item.map_key) {
            None => {
                groups.insert(
                    &item.map_key,
                    KeyGroup {
                        winner: position,
                        winner_live: !item.ignored,
                        size: 1,
                    },
                );
            }
            Some(group) => {
                group.size += 1;
                if !group.winner_live && !item.ignored {
                    group.winner = position;
                    group.winner_live = true;
                }
            }
        }
    }

    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let group = &groups[&item.map_key];
            let duplicated = group.size > 1;
            let ignored = group.winner != position;
            if item.index == position && item.duplicated == duplicated && item.ignored == ignored {
                return Rc::clone(item);
            }
            let mut next = MirroredRecordItem::clone(item);
            next.index = position;
            next.duplicated = duplicated;
            next.ignored = ignored;
            Rc::new(next)
        })
        .collect()
}

/// Shadow of an external `IndexMap<K, T>`.
pub type RecordMirror<K, T, M = JsonMeta> = Mirror<RecordVariant<K, T, M>>;

impl<K, T, M> Mirror<RecordVariant<K, T, M>>
where
    K: Clone + Eq + Hash + Ord + 'static,
    T: Clone + PartialEq + 'static,
    M: Meta + 'static,
{
    pub fn new(
        initial: Option<&IndexMap<K, T>>,
        setter: impl Fn(IndexMap<K, T>) + 'static,
        options: RecordOptions<K, T, M>,
    ) -> Self {
        let variant = RecordVariant {
            init_meta: options.init_meta,
            order: options.order,
        };
        Mirror::with_variant(variant, options.common, initial, Rc::new(setter))
    }

    /// Append `key: value` under the reserved append identity. If `key` is
    /// already held by a live item, the new item stays ignored.
    pub fn append_item(&self, key: K, value: T, meta: Option<M>) {
        self.append_draft(RecordDraft { key, value, meta });
    }

    pub fn try_insert_item(
        &self,
        index: usize,
        key: K,
        value: T,
        meta: Option<M>,
    ) -> Result<(), MirrorError> {
        self.try_insert_draft(index, RecordDraft { key, value, meta })
    }

    pub fn insert_item(&self, index: usize, key: K, value: T, meta: Option<M>) {
        if let Err(err) = self.try_insert_item(index, key, value, meta) {
            tracing::debug!(%err, "insert_item rejected");
        }
    }

    /// Re-key the item at `index`. The item competes for `key` as a newcomer:
    /// it only becomes live if no other item holds the key.
    pub fn try_set_map_key(&self, index: usize, key: K, meta: Option<M>) -> Result<(), MirrorError> {
        self.try_update(index, "set_map_key", true, |item| {
            item.map_key = key;
            item.ignored = true;
            if let Some(patch) = meta {
                item.meta.merge(patch);
            }
        })
    }

    pub fn set_map_key(&self, index: usize, key: K, meta: Option<M>) {
        if let Err(err) = self.try_set_map_key(index, key, meta) {
            tracing::debug!(%err, "set_map_key rejected");
        }
    }
}

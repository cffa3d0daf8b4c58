//! Mirror of an ordered external sequence.

use std::rc::Rc;

use mirror_util::{Identity, IdentityAllocator};

use crate::error::MirrorError;
use crate::item::{ItemDraft, MirroredItem};
use crate::meta::{JsonMeta, Meta};
use crate::mirror::{Mirror, Variant};
use crate::options::ListOptions;

/// Positional reconciliation over `Vec<T>`.
pub struct ListVariant<T, M> {
    init_meta: Option<Rc<dyn Fn(&T) -> M>>,
}

impl<T, M> ListVariant<T, M>
where
    M: Meta,
{
    fn init(&self, value: &T) -> M {
        match &self.init_meta {
            Some(init) => init(value),
            None => M::default(),
        }
    }
}

impl<T, M> Variant for ListVariant<T, M>
where
    T: Clone + PartialEq + 'static,
    M: Meta + 'static,
{
    type Value = T;
    type Meta = M;
    type Item = MirroredItem<T, M>;
    type Draft = ItemDraft<T, M>;
    type External = Vec<T>;
    type Observed = [T];

    fn create(&self, identity: Identity, draft: ItemDraft<T, M>) -> MirroredItem<T, M> {
        let meta = match draft.meta {
            Some(meta) => meta,
            None => self.init(&draft.value),
        };
        MirroredItem {
            index: 0,
            identity,
            value: draft.value,
            meta,
        }
    }

    fn rebuild(
        &self,
        external: Option<&[T]>,
        identities: &dyn IdentityAllocator,
    ) -> Vec<MirroredItem<T, M>> {
        external
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(index, value)| MirroredItem {
                index,
                identity: identities.next(),
                value: value.clone(),
                meta: self.init(value),
            })
            .collect()
    }

    fn is_compatible(&self, items: &[Rc<MirroredItem<T, M>>], external: Option<&[T]>) -> bool {
        let external = external.unwrap_or_default();
        items.len() == external.len()
            && items
                .iter()
                .zip(external)
                .all(|(item, value)| item.value == *value)
    }

    fn settle(&self, items: Vec<Rc<MirroredItem<T, M>>>) -> Vec<Rc<MirroredItem<T, M>>> {
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                if item.index == index {
                    item
                } else {
                    let mut next = MirroredItem::clone(&item);
                    next.index = index;
                    Rc::new(next)
                }
            })
            .collect()
    }

    fn derive(&self, items: &[Rc<MirroredItem<T, M>>]) -> Vec<T> {
        items.iter().map(|item| item.value.clone()).collect()
    }

    fn initial_meta(&self, item: &MirroredItem<T, M>) -> M {
        self.init(&item.value)
    }
}

/// Shadow of an external `Vec<T>`.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use mirror_core::{ListMirror, ListOptions, JsonMeta};
///
/// let external = Rc::new(RefCell::new(vec!["a", "b", "c"]));
/// let sink = Rc::clone(&external);
/// let initial = external.borrow().clone();
/// let mirror: ListMirror<&str, JsonMeta> =
///     ListMirror::new(Some(initial.as_slice()), move |next| *sink.borrow_mut() = next, ListOptions::default());
///
/// let first = mirror.items()[0].identity.clone();
/// mirror.move_item(0, 2);
/// assert_eq!(*external.borrow(), vec!["b", "c", "a"]);
/// assert_eq!(mirror.items()[2].identity, first);
/// ```
pub type ListMirror<T, M = JsonMeta> = Mirror<ListVariant<T, M>>;

impl<T, M> Mirror<ListVariant<T, M>>
where
    T: Clone + PartialEq + 'static,
    M: Meta + 'static,
{
    /// Mirror `initial` (`None` is empty). `setter` receives every value the
    /// mirror pushes out; the host later hands the stored value back through
    /// [`Mirror::observe`].
    pub fn new(
        initial: Option<&[T]>,
        setter: impl Fn(Vec<T>) + 'static,
        options: ListOptions<T, M>,
    ) -> Self {
        let variant = ListVariant {
            init_meta: options.init_meta,
        };
        Mirror::with_variant(variant, options.common, initial, Rc::new(setter))
    }

    /// Append under the reserved [`append_identity`](Mirror::append_identity).
    pub fn append_item(&self, value: T, meta: Option<M>) {
        self.append_draft(ItemDraft { value, meta });
    }

    pub fn try_insert_item(&self, index: usize, value: T, meta: Option<M>) -> Result<(), MirrorError> {
        self.try_insert_draft(index, ItemDraft { value, meta })
    }

    /// Insert before `index`, shifting later items up by one.
    pub fn insert_item(&self, index: usize, value: T, meta: Option<M>) {
        if let Err(err) = self.try_insert_item(index, value, meta) {
            tracing::debug!(%err, "insert_item rejected");
        }
    }
}

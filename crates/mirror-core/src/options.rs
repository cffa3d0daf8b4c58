//! Mirror configuration.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use mirror_util::{IdentityAllocator, SequentialIds};

type InitListMeta<T, M> = Rc<dyn Fn(&T) -> M>;
type InitRecordMeta<K, T, M> = Rc<dyn Fn(&T, &K) -> M>;
type EntryCmp<K, T> = Rc<dyn Fn((&K, &T), (&K, &T)) -> Ordering>;

/// Settings shared by every mirror variant.
#[derive(Clone)]
pub struct MirrorOptions {
    /// Where fresh identities come from. Defaults to the process-wide
    /// [`SequentialIds`] counter.
    pub identities: Rc<dyn IdentityAllocator>,
    /// Called with the new revision after every shadow change, hard or soft,
    /// once all internal borrows are released. When the external setter
    /// writes back through the mirror, only the revision that write produced
    /// is reported, so the last call always carries the current revision.
    pub on_change: Option<Rc<dyn Fn(u64)>>,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            identities: Rc::new(SequentialIds::default()),
            on_change: None,
        }
    }
}

impl fmt::Debug for MirrorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorOptions")
            .field("on_change", &self.on_change.is_some())
            .finish_non_exhaustive()
    }
}

/// Options for [`ListMirror`](crate::ListMirror).
///
/// # Examples
///
/// ```
/// use mirror_core::{JsonMeta, ListMirror, ListOptions};
/// use serde_json::json;
///
/// let options = ListOptions::<String, JsonMeta>::default().init_meta(|value: &String| {
///     let mut meta = JsonMeta::new();
///     meta.insert("initial".into(), json!(value));
///     meta
/// });
/// let mirror = ListMirror::new(Some(&["a".to_string()][..]), |_| {}, options);
/// assert_eq!(mirror.items()[0].meta["initial"], json!("a"));
/// ```
pub struct ListOptions<T, M> {
    pub(crate) common: MirrorOptions,
    pub(crate) init_meta: Option<InitListMeta<T, M>>,
}

impl<T, M> Default for ListOptions<T, M> {
    fn default() -> Self {
        Self {
            common: MirrorOptions::default(),
            init_meta: None,
        }
    }
}

impl<T, M> ListOptions<T, M> {
    /// Metadata for items created without explicit metadata. Without an
    /// initializer, `M::default()` is used.
    pub fn init_meta(mut self, init: impl Fn(&T) -> M + 'static) -> Self {
        self.init_meta = Some(Rc::new(init));
        self
    }

    /// Replace the identity source. The allocator must never repeat a token;
    /// prefixed [`SequentialIds`] need a prefix of their own.
    pub fn identities(mut self, identities: impl IdentityAllocator + 'static) -> Self {
        self.common.identities = Rc::new(identities);
        self
    }

    pub fn on_change(mut self, listener: impl Fn(u64) + 'static) -> Self {
        self.common.on_change = Some(Rc::new(listener));
        self
    }
}

/// Order of entries when a record shadow is rebuilt from the external value.
pub enum KeyOrder<K, T> {
    /// Enumeration order of the external record.
    Insertion,
    /// Ascending key order.
    Lexical,
    /// Caller-defined order over `(key, value)` pairs. Must be a total order.
    Custom(EntryCmp<K, T>),
}

impl<K, T> KeyOrder<K, T> {
    pub fn custom(cmp: impl Fn((&K, &T), (&K, &T)) -> Ordering + 'static) -> Self {
        KeyOrder::Custom(Rc::new(cmp))
    }
}

impl<K, T> Default for KeyOrder<K, T> {
    fn default() -> Self {
        KeyOrder::Insertion
    }
}

impl<K, T> Clone for KeyOrder<K, T> {
    fn clone(&self) -> Self {
        match self {
            KeyOrder::Insertion => KeyOrder::Insertion,
            KeyOrder::Lexical => KeyOrder::Lexical,
            KeyOrder::Custom(cmp) => KeyOrder::Custom(Rc::clone(cmp)),
        }
    }
}

impl<K, T> fmt::Debug for KeyOrder<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyOrder::Insertion => f.write_str("Insertion"),
            KeyOrder::Lexical => f.write_str("Lexical"),
            KeyOrder::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options for [`RecordMirror`](crate::RecordMirror).
pub struct RecordOptions<K, T, M> {
    pub(crate) common: MirrorOptions,
    pub(crate) init_meta: Option<InitRecordMeta<K, T, M>>,
    pub(crate) order: KeyOrder<K, T>,
}

impl<K, T, M> Default for RecordOptions<K, T, M> {
    fn default() -> Self {
        Self {
            common: MirrorOptions::default(),
            init_meta: None,
            order: KeyOrder::Insertion,
        }
    }
}

impl<K, T, M> RecordOptions<K, T, M> {
    pub fn init_meta(mut self, init: impl Fn(&T, &K) -> M + 'static) -> Self {
        self.init_meta = Some(Rc::new(init));
        self
    }

    pub fn order(mut self, order: KeyOrder<K, T>) -> Self {
        self.order = order;
        self
    }

    /// Replace the identity source. The allocator must never repeat a token;
    /// prefixed [`SequentialIds`] need a prefix of their own.
    pub fn identities(mut self, identities: impl IdentityAllocator + 'static) -> Self {
        self.common.identities = Rc::new(identities);
        self
    }

    pub fn on_change(mut self, listener: impl Fn(u64) + 'static) -> Self {
        self.common.on_change = Some(Rc::new(listener));
        self
    }
}

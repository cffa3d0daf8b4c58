//! mirror-core - Keyed shadows of externally owned collections.
//!
//! A mirror keeps an identity-tagged copy of a flat collection owned by
//! someone else (a `Vec<T>` or an `IndexMap<K, T>`), attaches local
//! metadata to every element, and pushes plain values back out through a
//! setter whenever the caller edits it.
//!
//! ```
//! use indexmap::IndexMap;
//! use mirror_core::{RecordMirror, RecordOptions, JsonMeta};
//!
//! let initial: IndexMap<String, i32> = [("x".to_string(), 1), ("y".to_string(), 2)].into();
//! let mirror: RecordMirror<String, i32, JsonMeta> =
//!     RecordMirror::new(Some(&initial), |_| {}, RecordOptions::default());
//!
//! mirror.append_item("x".to_string(), 3, None);
//! let items = mirror.items();
//! assert!(items[2].ignored);
//! assert!(items[0].duplicated && items[2].duplicated);
//! assert_eq!(mirror.value(), initial);
//! ```

pub mod error;
pub mod item;
pub mod list;
pub mod meta;
pub mod mirror;
pub mod options;
pub mod record;
pub mod setter;

pub use error::MirrorError;
pub use item::{Entry, ItemDraft, MirroredItem, MirroredRecordItem, PendingItem, RecordDraft, ShadowItem, Shared};
pub use list::{ListMirror, ListVariant};
pub use meta::{JsonMeta, Meta};
pub use mirror::{MetaField, MetaSource, MetaValue, Mirror, Reconciliation, Variant};
pub use options::{KeyOrder, ListOptions, MirrorOptions, RecordOptions};
pub use record::{resolve_duplicates, RecordMirror, RecordVariant};
pub use setter::{MetaSetter, ValueSetter};

//! Local per-item metadata.
//!
//! Metadata never travels to the external owner. The mirror only needs to
//! shallow-merge patches and read or write single fields, which is what
//! [`Meta`] captures.
//!
//! | Type                            | Field     | Field value |
//! |---------------------------------|-----------|-------------|
//! | `serde_json::Map<String, Value>`| `String`  | `Value`     |
//! | `HashMap<K, V>`                 | `K`       | `V`         |
//! | `()`                            | uninhabited | uninhabited |

use std::collections::HashMap;
use std::convert::Infallible;
use std::hash::Hash;

use serde_json::{Map, Value};

/// Default metadata record: an untyped JSON object.
pub type JsonMeta = Map<String, Value>;

/// A record of caller-defined fields attached to each mirrored item.
///
/// `Default` provides the metadata of a freshly created item when no
/// initializer is configured. Setting a field to `None` clears it.
pub trait Meta: Clone + Default {
    type Field: Clone + Eq + Hash;
    type Value: Clone;

    /// Shallow merge: every field present in `patch` overwrites `self`.
    fn merge(&mut self, patch: Self);

    fn field(&self, field: &Self::Field) -> Option<&Self::Value>;

    fn set_field(&mut self, field: &Self::Field, value: Option<Self::Value>);
}

impl Meta for Map<String, Value> {
    type Field = String;
    type Value = Value;

    fn merge(&mut self, patch: Self) {
        for (key, value) in patch {
            self.insert(key, value);
        }
    }

    fn field(&self, field: &String) -> Option<&Value> {
        self.get(field)
    }

    fn set_field(&mut self, field: &String, value: Option<Value>) {
        match value {
            Some(value) => {
                self.insert(field.clone(), value);
            }
            None => {
                self.remove(field);
            }
        }
    }
}

impl<K, V> Meta for HashMap<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    type Field = K;
    type Value = V;

    fn merge(&mut self, patch: Self) {
        self.extend(patch);
    }

    fn field(&self, field: &K) -> Option<&V> {
        self.get(field)
    }

    fn set_field(&mut self, field: &K, value: Option<V>) {
        match value {
            Some(value) => {
                self.insert(field.clone(), value);
            }
            None => {
                self.remove(field);
            }
        }
    }
}

/// No metadata at all.
impl Meta for () {
    type Field = Infallible;
    type Value = Infallible;

    fn merge(&mut self, _patch: Self) {}

    fn field(&self, field: &Infallible) -> Option<&Infallible> {
        match *field {}
    }

    fn set_field(&mut self, field: &Infallible, _value: Option<Infallible>) {
        match *field {}
    }
}

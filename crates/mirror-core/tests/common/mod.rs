#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use mirror_core::{JsonMeta, ListMirror, ListOptions, RecordMirror, RecordOptions};

/// Stand-in for the host state container: stores whatever the mirror pushes
/// and counts the pushes.
pub struct Host<X> {
    pub store: Rc<RefCell<X>>,
    pub pushes: Rc<Cell<usize>>,
}

impl<X: Clone + 'static> Host<X> {
    pub fn new(initial: X) -> Self {
        Self {
            store: Rc::new(RefCell::new(initial)),
            pushes: Rc::new(Cell::new(0)),
        }
    }

    pub fn setter(&self) -> impl Fn(X) + 'static {
        let store = Rc::clone(&self.store);
        let pushes = Rc::clone(&self.pushes);
        move |next| {
            *store.borrow_mut() = next;
            pushes.set(pushes.get() + 1);
        }
    }

    pub fn current(&self) -> X {
        self.store.borrow().clone()
    }

    /// External value replaced by someone other than the mirror.
    pub fn replace(&self, next: X) {
        *self.store.borrow_mut() = next;
    }
}

pub fn list<T>(initial: Vec<T>) -> (ListMirror<T, JsonMeta>, Host<Vec<T>>)
where
    T: Clone + PartialEq + 'static,
{
    list_with(initial, ListOptions::default())
}

pub fn list_with<T>(
    initial: Vec<T>,
    options: ListOptions<T, JsonMeta>,
) -> (ListMirror<T, JsonMeta>, Host<Vec<T>>)
where
    T: Clone + PartialEq + 'static,
{
    init_tracing();
    let host = Host::new(initial.clone());
    let mirror = ListMirror::new(Some(initial.as_slice()), host.setter(), options);
    (mirror, host)
}

pub fn record(entries: &[(&str, i32)]) -> (RecordMirror<String, i32, JsonMeta>, Host<IndexMap<String, i32>>) {
    record_with(entries, RecordOptions::default())
}

pub fn record_with(
    entries: &[(&str, i32)],
    options: RecordOptions<String, i32, JsonMeta>,
) -> (RecordMirror<String, i32, JsonMeta>, Host<IndexMap<String, i32>>) {
    init_tracing();
    let initial = map(entries);
    let host = Host::new(initial.clone());
    let mirror = RecordMirror::new(Some(&initial), host.setter(), options);
    (mirror, host)
}

pub fn map(entries: &[(&str, i32)]) -> IndexMap<String, i32> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

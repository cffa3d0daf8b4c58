use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use mirror_core::{JsonMeta, ListMirror, ListOptions, RecordMirror, RecordOptions};
use mirror_drag::{DataTransfer, Direction, DragController, DragOptions, DragState, DragTags};
use mirror_util::Identity;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn list(values: &[&'static str]) -> (ListMirror<&'static str, JsonMeta>, Rc<RefCell<Vec<&'static str>>>) {
    init_tracing();
    let store = Rc::new(RefCell::new(values.to_vec()));
    let sink = Rc::clone(&store);
    let mirror = ListMirror::new(
        Some(values),
        move |next| *sink.borrow_mut() = next,
        ListOptions::default(),
    );
    (mirror, store)
}

fn identities(mirror: &ListMirror<&'static str, JsonMeta>) -> Vec<Identity> {
    mirror.items().iter().map(|item| item.identity.clone()).collect()
}

#[test]
fn drop_moves_list_item_and_keeps_identities() {
    let (mirror, store) = list(&["a", "b", "c", "d"]);
    let before = identities(&mirror);
    let drag = DragController::new(mirror.clone(), DragOptions::default());
    let mut payload = DataTransfer::new();

    drag.drag_start(0, &mut payload);
    assert!(drag.drag_over(2, &payload));
    assert_eq!(
        drag.state(),
        DragState::Targeting {
            source: 0,
            target: 2,
            direction: Direction::After
        }
    );
    assert_eq!(drag.classify(3), DragTags::BEFORE);

    drag.drop(&payload);

    assert_eq!(drag.state(), DragState::Idle);
    assert_eq!(*store.borrow(), vec!["b", "c", "a", "d"]);
    assert_eq!(
        identities(&mirror),
        vec![before[1].clone(), before[2].clone(), before[0].clone(), before[3].clone()]
    );
}

#[test]
fn foreign_drag_does_not_move() {
    let (mirror, store) = list(&["a", "b", "c"]);
    let drag = DragController::new(mirror.clone(), DragOptions::default());
    let other = DragController::new(mirror.clone(), DragOptions::default());

    let mut ours = DataTransfer::new();
    let mut foreign = DataTransfer::new();
    drag.drag_start(0, &mut ours);
    other.drag_start(2, &mut foreign);

    assert!(!drag.drag_over(1, &foreign));
    drag.drop(&foreign);

    assert_eq!(drag.state(), DragState::Armed { source: 0 });
    assert_eq!(*store.borrow(), vec!["a", "b", "c"]);
    assert_eq!(mirror.revision(), 0);
}

#[test]
fn drop_uses_latest_shadow() {
    let (mirror, store) = list(&["a", "b", "c"]);
    let drag = DragController::new(mirror.clone(), DragOptions::default());
    let mut payload = DataTransfer::new();

    drag.drag_start(2, &mut payload);
    drag.drag_over(0, &payload);
    mirror.set_value(2, "C", None);
    drag.drop(&payload);

    assert_eq!(*store.borrow(), vec!["C", "a", "b"]);
}

#[test]
fn drop_reorders_record_entries() {
    init_tracing();
    let initial: IndexMap<String, i32> = [("x".to_string(), 1), ("y".to_string(), 2)].into();
    let store = Rc::new(RefCell::new(initial.clone()));
    let sink = Rc::clone(&store);
    let mirror: RecordMirror<String, i32, JsonMeta> = RecordMirror::new(
        Some(&initial),
        move |next| *sink.borrow_mut() = next,
        RecordOptions::default(),
    );
    let drag = DragController::new(mirror.clone(), DragOptions::default());
    let mut payload = DataTransfer::new();

    drag.drag_start(1, &mut payload);
    drag.drag_over(0, &payload);
    drag.drop(&payload);

    let keys: Vec<String> = store.borrow().keys().cloned().collect();
    assert_eq!(keys, vec!["y", "x"]);
    assert_eq!(mirror.items()[0].map_key, "y");
}

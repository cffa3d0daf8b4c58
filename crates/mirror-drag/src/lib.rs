//! mirror-drag - Drag-and-drop reordering for keyed collection mirrors.
//!
//! [`DragController`] tracks one drag gesture at a time and, when a drop
//! lands on another position, calls [`Reorder::move_item`] on its target.
//! Both [`ListMirror`](mirror_core::ListMirror) and
//! [`RecordMirror`](mirror_core::RecordMirror) implement [`Reorder`], as does
//! any `Fn(usize, usize)`.

pub mod controller;
pub mod payload;

pub use controller::{Direction, DragController, DragOptions, DragState, DragTags};
pub use payload::{DataTransfer, DragPayload, Reorder};

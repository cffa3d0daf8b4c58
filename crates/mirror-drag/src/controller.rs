//! Drag-reorder state machine.
//!
//! The controller turns drag gestures into a single `move_item(from, to)`
//! call. It keeps no value state; the position it moves is whatever the
//! [`Reorder`] target holds when the drop lands.

use std::cell::Cell;
use std::fmt;

use bitflags::bitflags;
use mirror_util::{IdentityAllocator, SequentialIds};
use serde::{Deserialize, Serialize};

use crate::payload::{DragPayload, Reorder};

/// Which side of the target the dragged item lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// A drag started at `source` and is not over another position.
    Armed { source: usize },
    /// A drop would move `source` next to `target`.
    Targeting {
        source: usize,
        target: usize,
        direction: Direction,
    },
}

impl DragState {
    pub fn source(&self) -> Option<usize> {
        match *self {
            DragState::Idle => None,
            DragState::Armed { source } | DragState::Targeting { source, .. } => Some(source),
        }
    }

    pub fn target(&self) -> Option<usize> {
        match *self {
            DragState::Targeting { target, .. } => Some(target),
            _ => None,
        }
    }
}

bitflags! {
    /// Per-position rendering hints derived from the drag state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DragTags: u8 {
        /// The item being dragged.
        const SOURCE = 1 << 0;
        /// The item being hovered.
        const TARGET = 1 << 1;
        /// Draw an insertion line before this item.
        const BEFORE = 1 << 2;
        /// Draw an insertion line after this item.
        const AFTER = 1 << 3;
    }
}

/// Controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragOptions {
    /// Payload format stamped on drag start. Controllers sharing a format
    /// accept each other's drags; leave unset for a per-controller token.
    pub format: Option<String>,
}

impl DragOptions {
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

const FORMAT_PREFIX: &str = "application/x-mirror-drag-";

/// Drag-and-drop reorder controller over a [`Reorder`] target.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use mirror_drag::{DataTransfer, DragController, DragOptions, DragState};
///
/// let moves = RefCell::new(Vec::new());
/// let drag = DragController::new(|from: usize, to: usize| moves.borrow_mut().push((from, to)), DragOptions::default());
///
/// let mut payload = DataTransfer::new();
/// drag.drag_start(0, &mut payload);
/// assert!(drag.drag_over(2, &payload));
/// drag.drop(&payload);
///
/// assert_eq!(*moves.borrow(), vec![(0, 2)]);
/// assert_eq!(drag.state(), DragState::Idle);
/// ```
pub struct DragController<R> {
    reorder: R,
    format: String,
    state: Cell<DragState>,
    pinned: Cell<Option<Direction>>,
}

impl<R: Reorder> DragController<R> {
    pub fn new(reorder: R, options: DragOptions) -> Self {
        let format = options
            .format
            .unwrap_or_else(|| format!("{FORMAT_PREFIX}{}", SequentialIds::default().next()));
        Self {
            reorder,
            format,
            state: Cell::new(DragState::Idle),
            pinned: Cell::new(None),
        }
    }

    /// Payload format this controller stamps and accepts.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn state(&self) -> DragState {
        self.state.get()
    }

    pub fn reorder(&self) -> &R {
        &self.reorder
    }

    /// Pin the drop direction, or restore automatic choice with `None`.
    pub fn set_direction(&self, direction: Option<Direction>) {
        self.pinned.set(direction);
        if let (Some(direction), DragState::Targeting { source, target, .. }) =
            (direction, self.state.get())
        {
            self.transition(DragState::Targeting {
                source,
                target,
                direction,
            });
        }
    }

    /// Start dragging the item at `index` from any state.
    pub fn drag_start<P>(&self, index: usize, payload: &mut P)
    where
        P: DragPayload + ?Sized,
    {
        payload.set_format(&self.format);
        self.transition(DragState::Armed { source: index });
    }

    /// Hover over `index`. Returns whether a drop here would be accepted.
    pub fn drag_over<P>(&self, index: usize, payload: &P) -> bool
    where
        P: DragPayload + ?Sized,
    {
        let Some(source) = self.state.get().source() else {
            return false;
        };
        if !payload.has_format(&self.format) {
            return false;
        }
        if index == source {
            self.transition(DragState::Armed { source });
            return false;
        }
        let direction = self.pinned.get().unwrap_or(if index < source {
            Direction::Before
        } else {
            Direction::After
        });
        self.transition(DragState::Targeting {
            source,
            target: index,
            direction,
        });
        true
    }

    /// Complete the gesture, moving `source` to `target`.
    pub fn drop<P>(&self, payload: &P)
    where
        P: DragPayload + ?Sized,
    {
        let state = self.state.get();
        if state.source().is_none() || !payload.has_format(&self.format) {
            return;
        }
        self.transition(DragState::Idle);
        if let DragState::Targeting { source, target, .. } = state {
            tracing::trace!(source, target, "drop");
            self.reorder.move_item(source, target);
        }
    }

    pub fn drag_end(&self) {
        self.transition(DragState::Idle);
    }

    pub fn reset_dragging(&self) {
        self.transition(DragState::Idle);
    }

    /// Pointer left the whole list.
    pub fn container_leave(&self) {
        self.transition(DragState::Idle);
    }

    /// Tags for the item at `index` under the current state.
    pub fn classify(&self, index: usize) -> DragTags {
        let mut tags = DragTags::empty();
        match self.state.get() {
            DragState::Idle => {}
            DragState::Armed { source } => {
                tags.set(DragTags::SOURCE, index == source);
            }
            DragState::Targeting {
                source,
                target,
                direction,
            } => {
                tags.set(DragTags::SOURCE, index == source);
                if index == target {
                    tags |= DragTags::TARGET;
                    tags |= match direction {
                        Direction::Before => DragTags::BEFORE,
                        Direction::After => DragTags::AFTER,
                    };
                }
                match direction {
                    Direction::Before if target.checked_sub(1) == Some(index) => {
                        tags |= DragTags::AFTER
                    }
                    Direction::After if index.checked_sub(1) == Some(target) => {
                        tags |= DragTags::BEFORE
                    }
                    _ => {}
                }
            }
        }
        tags
    }

    fn transition(&self, next: DragState) {
        let previous = self.state.replace(next);
        if previous != next {
            tracing::trace!(?previous, ?next, "drag state");
        }
    }
}

impl<R> fmt::Debug for DragController<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragController")
            .field("format", &self.format)
            .field("state", &self.state.get())
            .field("pinned", &self.pinned.get())
            .finish_non_exhaustive()
    }
}

//! Drag-to-reorder state machine.
//!
//! The controller never owns the list. Each hover performs a live move on
//! the caller's `Vec` so the UI can render the preview directly; a drop
//! reports whether the final position differs from where the drag began.
//!
//! The dragged item is remembered by key, not by index. The list may be
//! reloaded or rolled back mid-gesture, so every hover looks the item up
//! again before moving it.

/// Where a drag gesture currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState<K> {
    #[default]
    Idle,
    Dragging { item: K, origin: usize, current: usize },
}

/// Result of releasing a dragged item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// The item ended somewhere new; the order should be persisted.
    Reordered,
    /// The item is back where it started, or nothing was being dragged.
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct ReorderController<K> {
    state: DragState<K>,
}

impl<K: Copy + PartialEq> ReorderController<K> {
    pub fn new() -> Self {
        Self { state: DragState::Idle }
    }

    pub fn state(&self) -> DragState<K> {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Start dragging the item at `index`. Returns false when `index` is out
    /// of range; a drag already in progress is replaced.
    pub fn pick_up<T>(&mut self, items: &[T], index: usize, key: impl Fn(&T) -> K) -> bool {
        let Some(picked) = items.get(index) else {
            return false;
        };
        self.state = DragState::Dragging {
            item: key(picked),
            origin: index,
            current: index,
        };
        true
    }

    /// Move the dragged item onto `target`. Returns true if the list changed.
    /// A dragged item that is no longer listed ends the gesture.
    pub fn hover<T>(&mut self, items: &mut Vec<T>, target: usize, key: impl Fn(&T) -> K) -> bool {
        let DragState::Dragging { item, origin, .. } = self.state else {
            return false;
        };
        let Some(current) = items.iter().position(|t| key(t) == item) else {
            self.state = DragState::Idle;
            return false;
        };
        self.state = DragState::Dragging { item, origin, current };
        if target == current || target >= items.len() {
            return false;
        }
        let moved = items.remove(current);
        items.insert(target, moved);
        self.state = DragState::Dragging {
            item,
            origin,
            current: target,
        };
        true
    }

    pub fn drop_item(&mut self) -> DropOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Dragging { origin, current, .. } if origin != current => DropOutcome::Reordered,
            _ => DropOutcome::Unchanged,
        }
    }

    /// Abandon the gesture. Moves already applied by `hover` stay in place.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

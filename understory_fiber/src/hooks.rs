// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-component state cells, matched across renders by call order.
//!
//! ## Continuity
//!
//! While a component renders, its [`RenderCx`] walks the hook list of the
//! fiber's alternate in step with the component's `use_state` calls. The n-th
//! call reads the n-th cell of the previous render, folds that cell's pending
//! updates in the order they were queued, and records a fresh cell for this
//! render. Cells are matched by index only, so a component must call its hooks
//! in the same order and the same number of times on every render. A mismatch
//! is a bug in the component and panics.
//!
//! ## Updates
//!
//! The [`SetState`] handle returned by `use_state` appends to a queue shared by
//! every render of that cell and raises the runtime's update signal. Each
//! queued update is stamped with the pass counter, and a render only folds
//! updates queued before its pass began. The folded prefix is dropped when the
//! pass commits, so an abandoned pass loses nothing and an update queued while
//! a pass is in progress waits for the next one. The queue lives as long as a
//! fiber holds the cell; once the component is deleted, its setters do nothing.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::any::Any;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::element::Element;

/// A type-erased hook cell stored on a component fiber.
pub(crate) trait Hook: Any {
    /// Drop the queued updates folded by the render that produced this cell.
    fn commit(&self);

    fn as_any(&self) -> &dyn Any;
}

pub(crate) type HookSlot = Box<dyn Hook>;

type Updater<T> = Rc<dyn Fn(&T) -> T>;

struct Pending<T> {
    // Pass counter value when the update was queued.
    pass: u64,
    f: Updater<T>,
}

type Queue<T> = Rc<RefCell<VecDeque<Pending<T>>>>;

#[derive(Debug, Default)]
struct SignalState {
    raised: Cell<bool>,
    pass: Cell<u64>,
}

/// Shared flag raised by [`SetState`] and consumed by the scheduler.
///
/// Also carries the pass counter used to keep updates queued during a pass
/// out of that pass.
#[derive(Clone, Debug, Default)]
pub(crate) struct UpdateSignal(Rc<SignalState>);

impl UpdateSignal {
    pub(crate) fn raise(&self) {
        self.0.raised.set(true);
    }

    pub(crate) fn is_raised(&self) -> bool {
        self.0.raised.get()
    }

    /// Clear the flag, returning whether it was raised.
    pub(crate) fn take(&self) -> bool {
        self.0.raised.replace(false)
    }

    /// Advance the pass counter. Updates queued before this call are visible
    /// to the new pass; updates queued after it are not.
    pub(crate) fn begin_pass(&self) -> u64 {
        let pass = self.0.pass.get() + 1;
        self.0.pass.set(pass);
        pass
    }

    fn pass(&self) -> u64 {
        self.0.pass.get()
    }
}

struct StateCell<T> {
    value: T,
    queue: Queue<T>,
    consumed: Cell<usize>,
}

impl<T: 'static> Hook for StateCell<T> {
    fn commit(&self) {
        let n = self.consumed.replace(0);
        let mut queue = self.queue.borrow_mut();
        let n = n.min(queue.len());
        queue.drain(..n);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Handle that queues updates for one state cell.
///
/// Updates are pure functions of the previous value. Several updates queued
/// before the next pass are applied left to right. The handle stays valid
/// across renders of the same fiber position.
pub struct SetState<T> {
    queue: Weak<RefCell<VecDeque<Pending<T>>>>,
    signal: UpdateSignal,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            signal: self.signal.clone(),
        }
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("pending", &self.queue.upgrade().map(|q| q.borrow().len()))
            .finish_non_exhaustive()
    }
}

impl<T: 'static> SetState<T> {
    /// Queue `f` to compute the next value from the previous one.
    ///
    /// Does nothing once the owning component has been deleted.
    pub fn update(&self, f: impl Fn(&T) -> T + 'static) {
        let Some(queue) = self.queue.upgrade() else {
            tracing::trace!("update for a retired state cell dropped");
            return;
        };
        queue.borrow_mut().push_back(Pending {
            pass: self.signal.pass(),
            f: Rc::new(f),
        });
        self.signal.raise();
    }

    /// True while a fiber still holds the state cell.
    pub fn is_live(&self) -> bool {
        self.queue.strong_count() > 0
    }

    /// Queue a replacement value.
    pub fn set(&self, value: T)
    where
        T: Clone,
    {
        self.update(move |_| value.clone());
    }
}

/// Render context handed to a component: its children and its hook store.
pub struct RenderCx<'a> {
    component: &'static str,
    previous: Option<&'a [HookSlot]>,
    hooks: Vec<HookSlot>,
    children: &'a [Element],
    signal: &'a UpdateSignal,
}

impl fmt::Debug for RenderCx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCx")
            .field("component", &self.component)
            .field("hook_index", &self.hooks.len())
            .field("previous", &self.previous.map(<[HookSlot]>::len))
            .finish_non_exhaustive()
    }
}

impl<'a> RenderCx<'a> {
    /// `previous` is the alternate's hook list, or `None` on first render.
    pub(crate) fn new(
        component: &'static str,
        previous: Option<&'a [HookSlot]>,
        children: &'a [Element],
        signal: &'a UpdateSignal,
    ) -> Self {
        Self {
            component,
            previous,
            hooks: Vec::new(),
            children,
            signal,
        }
    }

    /// Children of the component element.
    pub fn children(&self) -> &[Element] {
        self.children
    }

    /// Current hook index: the number of hooks called so far in this render.
    pub fn hook_index(&self) -> usize {
        self.hooks.len()
    }

    /// Declare a state cell.
    ///
    /// On first render the value is `initial`. On later renders it is the
    /// previous value with every update queued before the current pass
    /// applied in order.
    ///
    /// # Panics
    ///
    /// If the previous render called hooks in a different order or number.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, SetState<T>) {
        let index = self.hooks.len();
        let cell = match self.previous {
            None => StateCell {
                value: initial,
                queue: Rc::default(),
                consumed: Cell::new(0),
            },
            Some(previous) => {
                let Some(slot) = previous.get(index) else {
                    hook_order_violation(
                        self.component,
                        index,
                        "more hooks were called than on the previous render",
                    )
                };
                let Some(prev) = slot.as_any().downcast_ref::<StateCell<T>>() else {
                    hook_order_violation(
                        self.component,
                        index,
                        "state type differs from the previous render",
                    )
                };
                let pass = self.signal.pass();
                // Collect first so an updater that queues more work cannot
                // observe a borrowed queue.
                let ready: Vec<Updater<T>> = prev
                    .queue
                    .borrow()
                    .iter()
                    .take_while(|p| p.pass < pass)
                    .map(|p| p.f.clone())
                    .collect();
                StateCell {
                    value: ready.iter().fold(prev.value.clone(), |acc, f| f(&acc)),
                    queue: prev.queue.clone(),
                    consumed: Cell::new(ready.len()),
                }
            }
        };
        let value = cell.value.clone();
        let setter = SetState {
            queue: Rc::downgrade(&cell.queue),
            signal: self.signal.clone(),
        };
        self.hooks.push(Box::new(cell));
        (value, setter)
    }

    /// Finish the render, returning the recorded hook cells.
    ///
    /// # Panics
    ///
    /// If fewer hooks were called than on the previous render.
    pub(crate) fn finish(self) -> Vec<HookSlot> {
        if let Some(previous) = self.previous
            && previous.len() != self.hooks.len()
        {
            hook_order_violation(
                self.component,
                self.hooks.len(),
                "fewer hooks were called than on the previous render",
            );
        }
        self.hooks
    }
}

#[cold]
#[track_caller]
fn hook_order_violation(component: &str, index: usize, what: &str) -> ! {
    tracing::error!(component, index, what, "hook order violation");
    panic!("hook order violation in `{component}` at hook {index}: {what}");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Render as one committed pass.
    fn render_once<R>(
        previous: Option<&[HookSlot]>,
        signal: &UpdateSignal,
        f: impl FnOnce(&mut RenderCx<'_>) -> R,
    ) -> (R, Vec<HookSlot>) {
        let (out, hooks) = render_uncommitted(previous, signal, f);
        hooks.iter().for_each(|h| h.commit());
        (out, hooks)
    }

    fn render_uncommitted<R>(
        previous: Option<&[HookSlot]>,
        signal: &UpdateSignal,
        f: impl FnOnce(&mut RenderCx<'_>) -> R,
    ) -> (R, Vec<HookSlot>) {
        signal.begin_pass();
        let mut cx = RenderCx::new("test", previous, &[], signal);
        let out = f(&mut cx);
        (out, cx.finish())
    }

    #[test]
    fn first_render_uses_initial() {
        let signal = UpdateSignal::default();
        let ((value, _), hooks) = render_once(None, &signal, |cx| cx.use_state(5_i32));
        assert_eq!(value, 5);
        assert_eq!(hooks.len(), 1);
        assert!(!signal.is_raised());
    }

    #[test]
    fn pending_updates_fold_in_order() {
        let signal = UpdateSignal::default();
        let ((_, set), first) = render_once(None, &signal, |cx| cx.use_state(0_i32));
        set.set(5);
        set.update(|v| v + 1);
        set.update(|v| v * 2);
        assert!(signal.take());

        let ((value, _), second) =
            render_once(Some(first.as_slice()), &signal, |cx| cx.use_state(100_i32));
        assert_eq!(value, 12, "(5 + 1) * 2");

        // Committing dropped the folded updates.
        let ((value, _), _) =
            render_once(Some(second.as_slice()), &signal, |cx| cx.use_state(100_i32));
        assert_eq!(value, 12);
    }

    #[test]
    fn abandoned_render_keeps_updates() {
        let signal = UpdateSignal::default();
        let ((_, set), first) = render_once(None, &signal, |cx| cx.use_state(0_i32));
        set.update(|v| v + 1);

        let ((value, _), _) =
            render_uncommitted(Some(first.as_slice()), &signal, |cx| cx.use_state(0_i32));
        assert_eq!(value, 1);
        // Retry against the same committed cells.
        let ((value, _), _) =
            render_once(Some(first.as_slice()), &signal, |cx| cx.use_state(0_i32));
        assert_eq!(value, 1);
    }

    #[test]
    fn updates_queued_mid_pass_wait_for_the_next_pass() {
        let signal = UpdateSignal::default();
        let ((_, set), first) = render_once(None, &signal, |cx| cx.use_state(0_i32));

        // A pass begins, then an update arrives before the component renders.
        signal.begin_pass();
        set.update(|v| v + 1);
        let mut cx = RenderCx::new("test", Some(first.as_slice()), &[], &signal);
        let (value, _) = cx.use_state(0_i32);
        let second = cx.finish();
        second.iter().for_each(|h| h.commit());
        assert_eq!(value, 0);

        let ((value, _), _) =
            render_once(Some(second.as_slice()), &signal, |cx| cx.use_state(0_i32));
        assert_eq!(value, 1);
    }

    #[test]
    fn setter_from_an_old_render_still_applies() {
        let signal = UpdateSignal::default();
        let ((_, stale), first) = render_once(None, &signal, |cx| cx.use_state(0_i32));
        let (_, second) = render_once(Some(first.as_slice()), &signal, |cx| {
            cx.use_state(0_i32);
        });
        stale.update(|v| v + 10);
        let ((value, _), _) =
            render_once(Some(second.as_slice()), &signal, |cx| cx.use_state(0_i32));
        assert_eq!(value, 10);
    }

    #[test]
    fn cells_are_matched_by_index() {
        let signal = UpdateSignal::default();
        let (set_b, first) = render_once(None, &signal, |cx| {
            let _a = cx.use_state(1_i32);
            cx.use_state(10_i32).1
        });
        set_b.update(|v| v + 1);
        let ((a, b), _) = render_once(Some(first.as_slice()), &signal, |cx| {
            (cx.use_state(0_i32).0, cx.use_state(0_i32).0)
        });
        assert_eq!((a, b), (1, 11));
    }

    #[test]
    fn setter_of_a_dropped_cell_does_nothing() {
        let signal = UpdateSignal::default();
        let ((_, set), first) = render_once(None, &signal, |cx| cx.use_state(0_i32));
        assert!(set.is_live());
        drop(first);
        assert!(!set.is_live());
        set.update(|v| v + 1);
        assert!(!signal.is_raised(), "no pass for a deleted component");
    }

    #[test]
    #[should_panic(expected = "hook order violation")]
    fn extra_hook_panics() {
        let signal = UpdateSignal::default();
        let (_, first) = render_once(None, &signal, |cx| {
            cx.use_state(0_i32);
        });
        let _ = render_once(Some(first.as_slice()), &signal, |cx| {
            cx.use_state(0_i32);
            cx.use_state(0_i32);
        });
    }

    #[test]
    #[should_panic(expected = "fewer hooks")]
    fn missing_hook_panics() {
        let signal = UpdateSignal::default();
        let (_, first) = render_once(None, &signal, |cx| {
            cx.use_state(0_i32);
        });
        let _ = render_once(Some(first.as_slice()), &signal, |_cx| {});
    }

    #[test]
    #[should_panic(expected = "state type differs")]
    fn type_change_panics() {
        let signal = UpdateSignal::default();
        let (_, first) = render_once(None, &signal, |cx| {
            cx.use_state(0_i32);
        });
        let _ = render_once(Some(first.as_slice()), &signal, |cx| {
            cx.use_state(false);
        });
    }
}

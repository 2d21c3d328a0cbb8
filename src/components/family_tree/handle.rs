use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;

use super::state::FamilyTreeState;
use super::types::Individual;

pub(crate) type SharedState = Rc<RefCell<Option<FamilyTreeState>>>;

/// Milliseconds from the page's monotonic clock.
pub(crate) fn now() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map_or(0.0, |p| p.now())
}

/// Copyable access to a mounted [`FamilyTreeCanvas`](super::FamilyTreeCanvas).
///
/// Every call is a no-op returning `false` until the canvas has built its
/// state from the first data set.
#[derive(Clone, Copy)]
pub struct TreeHandle {
	inner: StoredValue<SharedState, LocalStorage>,
}

impl Default for TreeHandle {
	fn default() -> Self {
		Self::new()
	}
}

impl TreeHandle {
	pub fn new() -> Self {
		Self {
			inner: StoredValue::new_local(Rc::new(RefCell::new(None))),
		}
	}

	pub(crate) fn shared(&self) -> SharedState {
		self.inner.get_value()
	}

	fn with_state<R>(&self, f: impl FnOnce(&mut FamilyTreeState) -> R) -> Option<R> {
		let shared = self.shared();
		let mut guard = shared.borrow_mut();
		guard.as_mut().map(f)
	}

	pub fn focus_on_individual(&self, id: &str) -> bool {
		self.with_state(|s| s.focus_on_individual(id, true, now()))
			.unwrap_or(false)
	}

	pub fn highlight_individual(&self, id: &str, focus_view: bool) -> bool {
		self.with_state(|s| s.highlight_individual(id, focus_view, now()))
			.unwrap_or(false)
	}

	pub fn clear_highlight(&self) {
		self.with_state(|s| s.viewport.clear_highlight());
	}

	pub fn reset_view(&self) {
		self.with_state(|s| s.reset_view(true, now()));
	}

	/// Drops the highlight, then frames every individual.
	pub fn overview(&self) {
		self.with_state(|s| {
			s.viewport.clear_highlight();
			s.reset_view(true, now());
		});
	}

	pub fn zoom_in(&self) {
		self.with_state(|s| s.viewport.zoom_in(now()));
	}

	pub fn zoom_out(&self) {
		self.with_state(|s| s.viewport.zoom_out(now()));
	}

	pub fn add_individual(&self, individual: Individual, parent_id: Option<&str>) -> bool {
		self.with_state(|s| s.add_individual(individual, parent_id))
			.unwrap_or(false)
	}
}

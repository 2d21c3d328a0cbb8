//! Pan/zoom state for the tree canvas.
//!
//! The controller never reads a clock: every call that may animate takes the
//! current time in milliseconds. All transform changes funnel through
//! [`ViewportController::apply`], so a new request always replaces the
//! transition in flight instead of stacking on top of it.

use super::layout::{Bounds, TreeLayout};

/// Screen = world * k + (x, y), in CSS pixels of the visible surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	#[cfg(test)]
	pub fn apply(&self, wx: f64, wy: f64) -> (f64, f64) {
		(wx * self.k + self.x, wy * self.k + self.y)
	}

	pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewportConfig {
	pub min_scale: f64,
	pub max_scale: f64,
	pub zoom_in_factor: f64,
	pub zoom_out_factor: f64,
	/// Fraction of each surface side kept free around auto-fitted content.
	pub fit_padding: f64,
	pub min_fit_scale: f64,
	/// World units the shorter surface side should span when focused.
	pub focus_span: f64,
	pub min_focus_scale: f64,
	pub duration_ms: f64,
	pub zoom_duration_ms: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.05,
			max_scale: 4.0,
			zoom_in_factor: 1.25,
			zoom_out_factor: 0.8,
			fit_padding: 0.05,
			min_fit_scale: 0.08,
			focus_span: 700.0,
			min_focus_scale: 0.8,
			duration_ms: 650.0,
			zoom_duration_ms: 250.0,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Transition {
	from: ViewTransform,
	to: ViewTransform,
	start: f64,
	duration: f64,
	width: f64,
	height: f64,
}

impl Transition {
	fn progress(&self, now: f64) -> f64 {
		if self.duration <= 0.0 {
			return 1.0;
		}
		((now - self.start) / self.duration).clamp(0.0, 1.0)
	}

	/// Geometric scale interpolation while the world point under the
	/// surface centre moves linearly.
	fn at(&self, now: f64) -> ViewTransform {
		let t = ease_in_out_cubic(self.progress(now));
		if t >= 1.0 {
			return self.to;
		}
		let (cx, cy) = (self.width / 2.0, self.height / 2.0);
		let (fx, fy) = self.from.invert(cx, cy);
		let (tx, ty) = self.to.invert(cx, cy);
		let k = self.from.k * (self.to.k / self.from.k).powf(t);
		let (wx, wy) = (fx + (tx - fx) * t, fy + (ty - fy) * t);
		ViewTransform {
			x: cx - wx * k,
			y: cy - wy * k,
			k,
		}
	}
}

fn ease_in_out_cubic(t: f64) -> f64 {
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

#[derive(Clone, Debug)]
pub struct ViewportController {
	config: ViewportConfig,
	transform: ViewTransform,
	transition: Option<Transition>,
	width: f64,
	height: f64,
	highlighted: Option<String>,
}

impl ViewportController {
	pub fn new(config: ViewportConfig, width: f64, height: f64) -> Self {
		Self {
			config,
			transform: ViewTransform::default(),
			transition: None,
			width: width.max(1.0),
			height: height.max(1.0),
			highlighted: None,
		}
	}

	/// Transform as of the last [`tick`](Self::tick) or immediate change.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Where the view settles once the running transition ends.
	pub fn target(&self) -> ViewTransform {
		self.transition.map_or(self.transform, |t| t.to)
	}

	pub fn highlighted(&self) -> Option<&str> {
		self.highlighted.as_deref()
	}

	#[cfg(test)]
	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	#[cfg(test)]
	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	/// Advance the running transition. Returns true while still animating.
	pub fn tick(&mut self, now: f64) -> bool {
		let Some(transition) = self.transition else {
			return false;
		};
		self.transform = transition.at(now);
		if transition.progress(now) >= 1.0 {
			self.transition = None;
		}
		self.transition.is_some()
	}

	pub fn focus_on_individual(&mut self, layout: &TreeLayout, id: &str, animate: bool, now: f64) -> bool {
		let Some(node) = layout.node(id) else {
			return false;
		};
		let target = self.focus_transform(node.x, node.y);
		self.highlighted = Some(node.id.clone());
		self.apply(target, animate, self.config.duration_ms, now);
		true
	}

	pub fn highlight_individual(&mut self, layout: &TreeLayout, id: &str, focus_view: bool, now: f64) -> bool {
		if focus_view {
			return self.focus_on_individual(layout, id, true, now);
		}
		if layout.node(id).is_none() {
			return false;
		}
		self.highlighted = Some(id.to_owned());
		true
	}

	pub fn clear_highlight(&mut self) {
		self.highlighted = None;
	}

	/// Re-focus the highlighted individual, or fit the whole tree.
	pub fn reset_view(&mut self, layout: &TreeLayout, animate: bool, now: f64) {
		let target = match self.highlighted.as_deref().and_then(|id| layout.node(id)) {
			Some(node) => self.focus_transform(node.x, node.y),
			None => self.fit_transform(&layout.bounds),
		};
		self.apply(target, animate, self.config.duration_ms, now);
	}

	pub fn zoom_in(&mut self, now: f64) {
		let (cx, cy) = (self.width / 2.0, self.height / 2.0);
		let target = self.scaled_about(self.target(), self.config.zoom_in_factor, cx, cy);
		self.apply(target, true, self.config.zoom_duration_ms, now);
	}

	pub fn zoom_out(&mut self, now: f64) {
		let (cx, cy) = (self.width / 2.0, self.height / 2.0);
		let target = self.scaled_about(self.target(), self.config.zoom_out_factor, cx, cy);
		self.apply(target, true, self.config.zoom_duration_ms, now);
	}

	/// Wheel zoom keeping the point under the cursor fixed.
	pub fn zoom_at(&mut self, factor: f64, sx: f64, sy: f64) {
		let target = self.scaled_about(self.transform, factor, sx, sy);
		self.apply(target, false, 0.0, 0.0);
	}

	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		let target = ViewTransform {
			x: self.transform.x + dx,
			y: self.transform.y + dy,
			..self.transform
		};
		self.apply(target, false, 0.0, 0.0);
	}

	/// New surface size; re-focuses or re-fits immediately, keeping the highlight.
	pub fn resize(&mut self, width: f64, height: f64, layout: &TreeLayout, now: f64) {
		self.width = width.max(1.0);
		self.height = height.max(1.0);
		self.reset_view(layout, false, now);
	}

	pub fn fit_transform(&self, bounds: &Bounds) -> ViewTransform {
		let padding = self.config.fit_padding.clamp(0.0, 0.45);
		let usable_w = self.width * (1.0 - 2.0 * padding);
		let usable_h = self.height * (1.0 - 2.0 * padding);
		let k = (usable_w / bounds.width().max(1.0))
			.min(usable_h / bounds.height().max(1.0))
			.max(self.config.min_fit_scale);
		let k = self.clamp_scale(k);
		let (cx, cy) = bounds.center();
		ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		}
	}

	/// Centre `(wx, wy)` and zoom to at least the focus scale, never out.
	pub fn focus_transform(&self, wx: f64, wy: f64) -> ViewTransform {
		let k = self.clamp_scale(self.target().k.max(self.focus_scale()));
		ViewTransform {
			x: self.width / 2.0 - wx * k,
			y: self.height / 2.0 - wy * k,
			k,
		}
	}

	pub fn focus_scale(&self) -> f64 {
		let shorter = self.width.min(self.height);
		let derived = shorter / self.config.focus_span.max(1.0);
		self.clamp_scale(derived.max(self.config.min_focus_scale))
	}

	/// Single entry point for every transform change.
	fn apply(&mut self, target: ViewTransform, animate: bool, duration: f64, now: f64) {
		let target = ViewTransform {
			k: self.clamp_scale(target.k),
			..target
		};
		let current = self.transition.map_or(self.transform, |t| t.at(now));
		self.transform = current;
		self.transition = None;

		if !animate || duration <= 0.0 || current == target {
			self.transform = target;
			return;
		}
		self.transition = Some(Transition {
			from: current,
			to: target,
			start: now,
			duration,
			width: self.width,
			height: self.height,
		});
	}

	fn scaled_about(&self, base: ViewTransform, factor: f64, sx: f64, sy: f64) -> ViewTransform {
		let k = self.clamp_scale(base.k * factor);
		let ratio = k / base.k;
		ViewTransform {
			x: sx - (sx - base.x) * ratio,
			y: sy - (sy - base.y) * ratio,
			k,
		}
	}

	fn clamp_scale(&self, k: f64) -> f64 {
		let min = self.config.min_scale.max(f64::MIN_POSITIVE);
		let max = self.config.max_scale.max(min);
		if k.is_finite() { k.clamp(min, max) } else { max }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::family_tree::graph::FamilyGraph;
	use crate::components::family_tree::layout::{LayoutConfig, LayoutMode, Orientation, layout};
	use crate::components::family_tree::types::{Individual, RelationKind, Relationship};
	use pretty_assertions::assert_eq;

	fn sample_layout() -> TreeLayout {
		let individuals: Vec<Individual> = ["A", "B", "C", "D"]
			.into_iter()
			.map(|id| Individual {
				id: id.into(),
				name: format!("Person {id}"),
				..Default::default()
			})
			.collect();
		let relationships: Vec<Relationship> = [("A", "B"), ("A", "C"), ("C", "D")]
			.into_iter()
			.map(|(source, target)| Relationship {
				source: source.into(),
				target: target.into(),
				kind: RelationKind::Parent,
				context: None,
			})
			.collect();
		let graph = FamilyGraph::build(&individuals, &relationships);
		layout(&graph, LayoutMode::Hierarchical(Orientation::Vertical), &LayoutConfig::default())
	}

	fn controller() -> ViewportController {
		ViewportController::new(ViewportConfig::default(), 1200.0, 800.0)
	}

	fn assert_close(a: f64, b: f64) {
		assert!((a - b).abs() < 1e-6, "{a} != {b}");
	}

	#[test]
	fn unknown_focus_leaves_transform_untouched() {
		let layout = sample_layout();
		let mut viewport = controller();
		viewport.reset_view(&layout, false, 0.0);
		let before = viewport.transform();

		assert!(!viewport.focus_on_individual(&layout, "unknown-id", true, 10.0));
		assert_eq!(viewport.transform(), before);
		assert!(!viewport.is_animating());
		assert_eq!(viewport.highlighted(), None);
	}

	#[test]
	fn focus_centres_the_node() {
		let layout = sample_layout();
		let mut viewport = controller();
		viewport.reset_view(&layout, false, 0.0);

		assert!(viewport.focus_on_individual(&layout, "D", false, 0.0));
		let node = layout.node("D").unwrap();
		let (sx, sy) = viewport.transform().apply(node.x, node.y);
		assert_close(sx, 600.0);
		assert_close(sy, 400.0);
		assert!(viewport.transform().k >= viewport.focus_scale());
		assert_eq!(viewport.highlighted(), Some("D"));
	}

	#[test]
	fn focus_never_zooms_out() {
		let layout = sample_layout();
		let mut viewport = controller();
		for _ in 0..20 {
			viewport.zoom_in(0.0);
		}
		viewport.tick(1_000.0);
		let zoomed = viewport.transform().k;

		viewport.focus_on_individual(&layout, "B", false, 1_000.0);
		assert_eq!(viewport.transform().k, zoomed);
	}

	#[test]
	fn reset_is_idempotent_once_highlight_is_cleared() {
		let layout = sample_layout();
		let mut viewport = controller();

		viewport.reset_view(&layout, false, 0.0);
		let fitted = viewport.transform();

		viewport.focus_on_individual(&layout, "C", false, 0.0);
		assert_ne!(viewport.transform(), fitted);

		viewport.reset_view(&layout, false, 0.0);
		let (sx, sy) = viewport.transform().apply(layout.node("C").unwrap().x, layout.node("C").unwrap().y);
		assert_close(sx, 600.0);
		assert_close(sy, 400.0);

		viewport.clear_highlight();
		viewport.reset_view(&layout, false, 0.0);
		assert_eq!(viewport.transform(), fitted);
	}

	#[test]
	fn fit_centres_content_with_padding() {
		let layout = sample_layout();
		let mut viewport = controller();
		viewport.reset_view(&layout, false, 0.0);

		let t = viewport.transform();
		let (cx, cy) = layout.bounds.center();
		let (sx, sy) = t.apply(cx, cy);
		assert_close(sx, 600.0);
		assert_close(sy, 400.0);
		assert!(layout.bounds.width() * t.k <= 1200.0 * 0.9 + 1e-6);
		assert!(layout.bounds.height() * t.k <= 800.0 * 0.9 + 1e-6);
	}

	#[test]
	fn zoom_is_always_clamped() {
		let config = ViewportConfig::default();
		let mut viewport = controller();
		for step in 0..60 {
			viewport.zoom_in(step as f64);
			assert!(viewport.target().k <= config.max_scale);
		}
		viewport.tick(10_000.0);
		assert_eq!(viewport.transform().k, config.max_scale);

		for step in 0..200 {
			viewport.zoom_out(10_000.0 + step as f64);
			assert!(viewport.target().k >= config.min_scale);
		}
		viewport.tick(20_000.0);
		assert_close(viewport.transform().k, config.min_scale);

		viewport.zoom_at(1e9, 10.0, 10.0);
		assert_eq!(viewport.transform().k, config.max_scale);
	}

	#[test]
	fn zoom_buttons_keep_the_centre_fixed() {
		let mut viewport = controller();
		viewport.pan_by(35.0, -20.0);
		let before = viewport.transform().invert(600.0, 400.0);

		viewport.zoom_in(0.0);
		viewport.tick(1_000.0);
		let after = viewport.transform().invert(600.0, 400.0);
		assert_close(before.0, after.0);
		assert_close(before.1, after.1);
		assert_close(viewport.transform().k, 1.25);
	}

	#[test]
	fn animated_focus_interpolates_then_settles() {
		let layout = sample_layout();
		let mut viewport = controller();
		viewport.reset_view(&layout, false, 0.0);
		let start = viewport.transform();

		assert!(viewport.focus_on_individual(&layout, "D", true, 100.0));
		let destination = viewport.target();
		assert_eq!(viewport.transform(), start);

		assert!(viewport.tick(100.0 + 325.0));
		let midway = viewport.transform();
		assert!(midway.k > start.k.min(destination.k) - 1e-9);
		assert!(midway.k < start.k.max(destination.k) + 1e-9);
		assert_ne!(midway, start);

		assert!(!viewport.tick(100.0 + 650.0));
		assert_eq!(viewport.transform(), destination);
	}

	#[test]
	fn new_request_replaces_transition_in_flight() {
		let layout = sample_layout();
		let mut viewport = controller();
		viewport.reset_view(&layout, false, 0.0);

		viewport.focus_on_individual(&layout, "B", true, 0.0);
		viewport.tick(200.0);
		let interrupted = viewport.transform();

		viewport.focus_on_individual(&layout, "D", true, 200.0);
		assert_eq!(viewport.transform(), interrupted);
		let destination = viewport.target();
		let node = layout.node("D").unwrap();
		let (sx, _) = destination.apply(node.x, node.y);
		assert_close(sx, 600.0);

		viewport.tick(200.0 + 650.0);
		assert_eq!(viewport.transform(), destination);
		assert!(!viewport.is_animating());
	}

	#[test]
	fn highlight_without_moving() {
		let layout = sample_layout();
		let mut viewport = controller();
		viewport.reset_view(&layout, false, 0.0);
		let before = viewport.transform();

		assert!(viewport.highlight_individual(&layout, "B", false, 0.0));
		assert_eq!(viewport.transform(), before);
		assert_eq!(viewport.highlighted(), Some("B"));
		assert!(!viewport.highlight_individual(&layout, "nope", false, 0.0));
		assert_eq!(viewport.highlighted(), Some("B"));
	}

	#[test]
	fn resize_refocuses_highlighted_node() {
		let layout = sample_layout();
		let mut viewport = controller();
		viewport.focus_on_individual(&layout, "C", false, 0.0);

		viewport.resize(500.0, 300.0, &layout, 0.0);
		let node = layout.node("C").unwrap();
		let (sx, sy) = viewport.transform().apply(node.x, node.y);
		assert_close(sx, 250.0);
		assert_close(sy, 150.0);
		assert_eq!(viewport.highlighted(), Some("C"));
		assert_eq!(viewport.size(), (500.0, 300.0));
	}
}

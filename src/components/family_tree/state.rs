use std::collections::HashSet;

use log::{info, warn};

use super::graph::FamilyGraph;
use super::layout::{LayoutConfig, LayoutMode, TreeLayout, layout};
use super::scale::SurfaceScale;
use super::types::{FamilyData, Individual};
use super::viewport::{ViewTransform, ViewportConfig, ViewportController};

pub const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

pub const NODE_RADIUS: f64 = 14.0;
pub const HIT_RADIUS: f64 = 20.0;
/// Pointer travel (CSS px) after which a press becomes a pan rather than a click.
pub const CLICK_SLOP: f64 = 4.0;

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub last_x: f64,
	pub last_y: f64,
	pub press_node: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	delay_t: f64,
}

pub struct FamilyTreeState {
	pub graph: FamilyGraph,
	pub layout: TreeLayout,
	pub layout_config: LayoutConfig,
	pub viewport: ViewportController,
	pub pan: PanState,
	pub hover: HoverState,
	pub surface: SurfaceScale,
}

impl FamilyTreeState {
	pub fn new(
		data: &FamilyData,
		mode: LayoutMode,
		layout_config: LayoutConfig,
		viewport_config: ViewportConfig,
		surface: SurfaceScale,
	) -> Self {
		let graph = FamilyGraph::build(&data.individuals, &data.relationships);
		if graph.is_empty() {
			warn!("No individuals to lay out");
		}
		let layout = layout(&graph, mode, &layout_config);
		info!(
			"Laid out {} individuals ({} tree links, {} other links) in {} mode, {:.0}x{:.0}",
			layout.nodes.len(),
			layout.hierarchical_links.len(),
			layout.relationship_links.len(),
			mode.as_str(),
			layout.dimensions.width,
			layout.dimensions.height
		);
		let mut viewport = ViewportController::new(viewport_config, surface.css_width, surface.css_height);
		viewport.reset_view(&layout, false, 0.0);

		Self {
			graph,
			layout,
			layout_config,
			viewport,
			pan: PanState::default(),
			hover: HoverState::default(),
			surface,
		}
	}

	pub fn mode(&self) -> LayoutMode {
		self.layout.mode
	}

	pub fn transform(&self) -> ViewTransform {
		self.viewport.transform()
	}

	/// Rebuild every layout node for `mode` and re-frame the view.
	pub fn set_mode(&mut self, mode: LayoutMode, now: f64) {
		self.relayout(mode);
		self.viewport.reset_view(&self.layout, false, now);
	}

	/// Insert a new individual at runtime and recompute the layout.
	pub fn add_individual(&mut self, individual: Individual, parent_id: Option<&str>) -> bool {
		if !self.graph.insert_individual(individual, parent_id) {
			return false;
		}
		self.relayout(self.mode());
		true
	}

	fn relayout(&mut self, mode: LayoutMode) {
		self.layout = layout(&self.graph, mode, &self.layout_config);
		self.hover = HoverState::default();
		self.pan = PanState::default();
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.viewport.transform().invert(sx, sy)
	}

	/// Closest node under the pointer, if any is within reach.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		// HIT_RADIUS is in world-space, scales with zoom like nodes
		self.layout
			.nodes
			.iter()
			.enumerate()
			.map(|(idx, node)| (idx, (node.x - gx).hypot(node.y - gy)))
			.filter(|(_, dist)| *dist < HIT_RADIUS)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(idx, _)| idx)
	}

	pub fn individual_at(&self, idx: usize) -> Option<&Individual> {
		self.layout.nodes.get(idx).map(|n| n.individual.as_ref())
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			let id = &self.layout.nodes[idx].id;
			for link in self.layout.links() {
				let other = if &link.source.id == id {
					&link.target.id
				} else if &link.target.id == id {
					&link.source.id
				} else {
					continue;
				};
				if let Some(&neighbor) = self.layout.node_by_id.get(other) {
					self.hover.neighbors.insert(neighbor);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	/// The node currently selected through the viewport, if laid out.
	pub fn selected_index(&self) -> Option<usize> {
		self.viewport
			.highlighted()
			.and_then(|id| self.layout.node_by_id.get(id).copied())
	}

	pub fn tick(&mut self, dt: f64, now: f64) {
		self.viewport.tick(now);

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, surface: SurfaceScale, now: f64) {
		self.surface = surface;
		self.viewport
			.resize(surface.css_width, surface.css_height, &self.layout, now);
	}

	pub fn focus_on_individual(&mut self, id: &str, animate: bool, now: f64) -> bool {
		self.viewport.focus_on_individual(&self.layout, id, animate, now)
	}

	pub fn highlight_individual(&mut self, id: &str, focus_view: bool, now: f64) -> bool {
		self.viewport.highlight_individual(&self.layout, id, focus_view, now)
	}

	pub fn reset_view(&mut self, animate: bool, now: f64) {
		self.viewport.reset_view(&self.layout, animate, now);
	}
}

//! Coordinates for every individual, in a hierarchical or a fan projection.
//!
//! Both projections share one breadth pass: leaves are packed left to right in
//! post-order and every parent sits midway between its first and last child.
//! The hierarchical mode maps breadth to an axis, the fan mode to an angle.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::rc::Rc;

use super::graph::{FamilyGraph, NodeIdx};
use super::types::{Individual, RelationKind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
	/// Generations stacked top to bottom.
	#[default]
	Vertical,
	/// Generations laid out left to right.
	Horizontal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutMode {
	Hierarchical(Orientation),
	#[default]
	Fan,
}

impl LayoutMode {
	pub const ALL: [LayoutMode; 3] = [
		LayoutMode::Fan,
		LayoutMode::Hierarchical(Orientation::Vertical),
		LayoutMode::Hierarchical(Orientation::Horizontal),
	];

	pub fn as_str(self) -> &'static str {
		match self {
			LayoutMode::Fan => "fan",
			LayoutMode::Hierarchical(Orientation::Vertical) => "vertical",
			LayoutMode::Hierarchical(Orientation::Horizontal) => "horizontal",
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			LayoutMode::Fan => "Fan",
			LayoutMode::Hierarchical(Orientation::Vertical) => "Vertical tree",
			LayoutMode::Hierarchical(Orientation::Horizontal) => "Horizontal tree",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"fan" | "radial" => Some(LayoutMode::Fan),
			"vertical" | "hierarchical" | "tree" => Some(LayoutMode::Hierarchical(Orientation::Vertical)),
			"horizontal" => Some(LayoutMode::Hierarchical(Orientation::Horizontal)),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Distance between generations in hierarchical mode.
	pub level_gap: f64,
	/// Distance between adjacent siblings along the breadth axis.
	pub sibling_gap: f64,
	/// Multiplier applied to `sibling_gap` between different families.
	pub family_gap_ratio: f64,
	pub fan_level_gap: f64,
	/// Radius of the innermost ring.
	pub fan_inner_radius: f64,
	/// Total opening of the fan, centred on the top.
	pub fan_arc_degrees: f64,
	/// Padding added around the node bounding box.
	pub margin: f64,
	pub palette_size: usize,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			level_gap: 200.0,
			sibling_gap: 180.0,
			family_gap_ratio: 1.25,
			fan_level_gap: 220.0,
			fan_inner_radius: 180.0,
			fan_arc_degrees: 300.0,
			margin: 120.0,
			palette_size: 10,
		}
	}
}

/// Polar position; angle in radians, 0 at the top, growing clockwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Polar {
	pub angle: f64,
	pub radius: f64,
}

impl Polar {
	pub fn to_cartesian(self) -> (f64, f64) {
		(self.radius * self.angle.sin(), -self.radius * self.angle.cos())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
	pub id: String,
	pub individual: Rc<Individual>,
	pub label: String,
	pub depth: i32,
	pub generation: i32,
	pub branch_index: usize,
	pub color_index: usize,
	pub parent_id: Option<String>,
	pub x: f64,
	pub y: f64,
	/// Only set by the fan projection.
	pub polar: Option<Polar>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkEnd {
	pub id: String,
	pub x: f64,
	pub y: f64,
	pub polar: Option<Polar>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeLink {
	pub source: LinkEnd,
	pub target: LinkEnd,
	pub kind: RelationKind,
	pub context: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

impl Bounds {
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	pub fn center(&self) -> (f64, f64) {
		((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
	pub width: f64,
	pub height: f64,
}

/// Self-contained snapshot of a layout pass.
#[derive(Clone, Debug)]
pub struct TreeLayout {
	pub mode: LayoutMode,
	pub nodes: Vec<LayoutNode>,
	pub node_by_id: HashMap<String, usize>,
	pub hierarchical_links: Vec<TreeLink>,
	pub relationship_links: Vec<TreeLink>,
	pub dimensions: Dimensions,
	pub bounds: Bounds,
}

impl TreeLayout {
	pub fn node(&self, id: &str) -> Option<&LayoutNode> {
		self.node_by_id.get(id).map(|&idx| &self.nodes[idx])
	}

	pub fn links(&self) -> impl Iterator<Item = &TreeLink> {
		self.hierarchical_links.iter().chain(&self.relationship_links)
	}
}

pub fn layout(graph: &FamilyGraph, mode: LayoutMode, config: &LayoutConfig) -> TreeLayout {
	let breadth = breadth_positions(graph, config);
	let palette = config.palette_size.max(1);

	let (mut min_breadth, mut max_breadth) = (f64::INFINITY, f64::NEG_INFINITY);
	for value in breadth.iter().flatten() {
		min_breadth = min_breadth.min(*value);
		max_breadth = max_breadth.max(*value);
	}
	let extent = if min_breadth.is_finite() { max_breadth - min_breadth } else { 0.0 };
	let middle = if min_breadth.is_finite() { (min_breadth + max_breadth) / 2.0 } else { 0.0 };
	let arc = config.fan_arc_degrees.clamp(0.0, 359.0).to_radians();

	let mut nodes = Vec::with_capacity(graph.len());
	let mut slots: Vec<Option<usize>> = vec![None; graph.nodes().len()];

	for idx in preorder(graph) {
		let node = graph.node(idx);
		let Some(individual) = node.individual.clone() else {
			continue;
		};
		let along = breadth[idx].unwrap_or(middle) - middle;
		let depth = node.depth.max(0) as f64;

		let (x, y, polar) = match mode {
			LayoutMode::Hierarchical(orientation) => {
				let across = depth * config.level_gap;
				match orientation {
					Orientation::Vertical => (along, across, None),
					Orientation::Horizontal => (across, along, None),
				}
			}
			LayoutMode::Fan => {
				let angle = if extent > f64::EPSILON { along / extent * arc } else { 0.0 };
				let polar = Polar {
					angle,
					radius: config.fan_inner_radius + depth * config.fan_level_gap,
				};
				let (x, y) = polar.to_cartesian();
				(x, y, Some(polar))
			}
		};

		let branch_index = node.branch_index.unwrap_or(0);
		slots[idx] = Some(nodes.len());
		nodes.push(LayoutNode {
			id: node.id.clone(),
			individual,
			label: node.label.clone(),
			depth: node.depth,
			generation: node.generation.unwrap_or(node.depth + 1),
			branch_index,
			color_index: branch_index % palette,
			parent_id: node.primary_parent.map(|p| graph.node(p).id.clone()),
			x,
			y,
			polar,
		});
	}

	let end = |idx: NodeIdx| {
		slots[idx].map(|slot| {
			let node: &LayoutNode = &nodes[slot];
			LinkEnd {
				id: node.id.clone(),
				x: node.x,
				y: node.y,
				polar: node.polar,
			}
		})
	};

	let hierarchical_links = graph
		.hierarchy_edges()
		.filter_map(|(parent, child)| {
			Some(TreeLink {
				source: end(parent)?,
				target: end(child)?,
				kind: RelationKind::Parent,
				context: None,
			})
		})
		.collect();

	let relationship_links = graph
		.secondary_relationships()
		.filter_map(|edge| {
			Some(TreeLink {
				source: end(edge.source)?,
				target: end(edge.target)?,
				kind: edge.kind.clone(),
				context: edge.context.clone(),
			})
		})
		.collect();

	let bounds = padded_bounds(&nodes, config.margin);
	let node_by_id = nodes.iter().enumerate().map(|(i, n)| (n.id.clone(), i)).collect();

	TreeLayout {
		mode,
		nodes,
		node_by_id,
		hierarchical_links,
		relationship_links,
		dimensions: Dimensions {
			width: bounds.width(),
			height: bounds.height(),
		},
		bounds,
	}
}

/// Nodes in depth-first order from the synthetic root, siblings left to right.
fn preorder(graph: &FamilyGraph) -> Vec<NodeIdx> {
	let mut order = Vec::with_capacity(graph.nodes().len());
	let mut visited = vec![false; graph.nodes().len()];
	let mut stack = vec![0];
	while let Some(idx) = stack.pop() {
		if std::mem::replace(&mut visited[idx], true) {
			continue;
		}
		order.push(idx);
		stack.extend(graph.node(idx).children.iter().rev());
	}
	order
}

/// Breadth coordinate per graph node; the synthetic root keeps `None`.
fn breadth_positions(graph: &FamilyGraph, config: &LayoutConfig) -> Vec<Option<f64>> {
	let count = graph.nodes().len();
	let mut breadth: Vec<Option<f64>> = vec![None; count];
	let mut visited = vec![false; count];
	let mut last_leaf: Option<(f64, Option<NodeIdx>)> = None;

	let mut place_leaf = |parent: Option<NodeIdx>| {
		let position = match last_leaf {
			None => 0.0,
			Some((previous, previous_parent)) if previous_parent == parent => previous + config.sibling_gap,
			Some((previous, _)) => previous + config.sibling_gap * config.family_gap_ratio,
		};
		last_leaf = Some((position, parent));
		position
	};

	let mut stack = vec![(0, false)];
	while let Some((idx, expanded)) = stack.pop() {
		let node = graph.node(idx);
		if expanded {
			let first = node.children.iter().find_map(|&c| breadth[c]);
			let last = node.children.iter().rev().find_map(|&c| breadth[c]);
			breadth[idx] = match (first, last) {
				(Some(a), Some(b)) => Some((a + b) / 2.0),
				_ => Some(place_leaf(node.primary_parent)),
			};
			continue;
		}
		if std::mem::replace(&mut visited[idx], true) {
			continue;
		}
		if node.children.is_empty() {
			breadth[idx] = Some(place_leaf(node.primary_parent));
		} else {
			stack.push((idx, true));
			stack.extend(node.children.iter().rev().map(|&c| (c, false)));
		}
	}

	breadth[0] = None;
	breadth
}

fn padded_bounds(nodes: &[LayoutNode], margin: f64) -> Bounds {
	let mut bounds = Bounds {
		min_x: f64::INFINITY,
		min_y: f64::INFINITY,
		max_x: f64::NEG_INFINITY,
		max_y: f64::NEG_INFINITY,
	};
	for node in nodes {
		bounds.min_x = bounds.min_x.min(node.x);
		bounds.min_y = bounds.min_y.min(node.y);
		bounds.max_x = bounds.max_x.max(node.x);
		bounds.max_y = bounds.max_y.max(node.y);
	}
	if nodes.is_empty() {
		bounds = Bounds {
			min_x: 0.0,
			min_y: 0.0,
			max_x: 0.0,
			max_y: 0.0,
		};
	}

	let margin = margin.max(0.0);
	bounds.min_x -= margin;
	bounds.min_y -= margin;
	bounds.max_x = (bounds.max_x + margin).max(bounds.min_x + 1.0);
	bounds.max_y = (bounds.max_y + margin).max(bounds.min_y + 1.0);
	bounds
}

/// Angle used to orient fan labels so text never reads upside down.
pub fn label_rotation(polar: Polar) -> (f64, bool) {
	let outward = polar.angle - PI / 2.0;
	if polar.angle < 0.0 {
		(outward + PI, true)
	} else {
		(outward, false)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::family_tree::graph::ROOT_ID;
	use crate::components::family_tree::types::{Gender, Relationship};
	use pretty_assertions::assert_eq;

	fn person(id: &str) -> Individual {
		Individual {
			id: id.into(),
			name: format!("Person {id}"),
			gender: Gender::Male,
			..Default::default()
		}
	}

	fn rel(source: &str, target: &str, kind: RelationKind) -> Relationship {
		Relationship {
			source: source.into(),
			target: target.into(),
			kind,
			context: None,
		}
	}

	fn family() -> FamilyGraph {
		let individuals: Vec<_> = ["P1", "P2", "a", "b", "c", "S"].into_iter().map(person).collect();
		let relationships = vec![
			rel("P1", "a", RelationKind::Parent),
			rel("P1", "b", RelationKind::Parent),
			rel("P2", "c", RelationKind::Parent),
			rel("P1", "S", RelationKind::Marriage),
		];
		FamilyGraph::build(&individuals, &relationships)
	}

	fn positions(layout: &TreeLayout) -> Vec<(String, f64, f64, Option<Polar>)> {
		layout.nodes.iter().map(|n| (n.id.clone(), n.x, n.y, n.polar)).collect()
	}

	#[test]
	fn parent_child_scenario() {
		let graph = FamilyGraph::build(&[person("A"), person("B")], &[rel("A", "B", RelationKind::Parent)]);
		let layout = layout(&graph, LayoutMode::Hierarchical(Orientation::Vertical), &LayoutConfig::default());

		assert_eq!(layout.nodes.len(), 2);
		assert!(layout.node(ROOT_ID).is_none());
		assert_eq!(layout.hierarchical_links.len(), 1);
		assert_eq!(layout.hierarchical_links[0].source.id, "A");
		assert_eq!(layout.hierarchical_links[0].target.id, "B");
		assert!(layout.relationship_links.is_empty());

		let (a, b) = (layout.node("A").unwrap(), layout.node("B").unwrap());
		assert_eq!(b.generation, a.generation + 1);
		assert_eq!(b.parent_id.as_deref(), Some("A"));
	}

	#[test]
	fn separates_siblings_and_families() {
		let config = LayoutConfig::default();
		let layout = layout(&family(), LayoutMode::Hierarchical(Orientation::Vertical), &config);
		let x = |id: &str| layout.node(id).unwrap().x;

		assert_eq!(x("b") - x("a"), config.sibling_gap);
		assert_eq!(x("c") - x("b"), config.sibling_gap * config.family_gap_ratio);
		assert_eq!(x("P1"), (x("a") + x("b")) / 2.0);
		assert_eq!(layout.node("a").unwrap().y - layout.node("P1").unwrap().y, config.level_gap);
	}

	#[test]
	fn horizontal_swaps_axes() {
		let config = LayoutConfig::default();
		let graph = family();
		let vertical = layout(&graph, LayoutMode::Hierarchical(Orientation::Vertical), &config);
		let horizontal = layout(&graph, LayoutMode::Hierarchical(Orientation::Horizontal), &config);

		for (v, h) in vertical.nodes.iter().zip(&horizontal.nodes) {
			assert_eq!((v.x, v.y), (h.y, h.x));
		}
		assert_eq!(vertical.dimensions.width, horizontal.dimensions.height);
	}

	#[test]
	fn fan_stays_within_arc_and_grows_outward() {
		let config = LayoutConfig::default();
		let layout = layout(&family(), LayoutMode::Fan, &config);
		let limit = (config.fan_arc_degrees / 2.0).to_radians() + 1e-9;

		for node in &layout.nodes {
			let polar = node.polar.expect("fan nodes carry polar coordinates");
			assert!(polar.angle.abs() <= limit);
			assert_eq!(polar.radius, config.fan_inner_radius + node.depth as f64 * config.fan_level_gap);
			let (x, y) = polar.to_cartesian();
			assert!((x - node.x).abs() < 1e-9 && (y - node.y).abs() < 1e-9);
		}
		let leftmost = layout.nodes.iter().map(|n| n.polar.unwrap().angle).fold(f64::INFINITY, f64::min);
		assert!((leftmost + limit).abs() < 1e-6);
	}

	#[test]
	fn relationship_links_snapshot_coordinates() {
		let layout = layout(&family(), LayoutMode::Fan, &LayoutConfig::default());
		assert_eq!(layout.relationship_links.len(), 1);

		let link = &layout.relationship_links[0];
		let spouse = layout.node("S").unwrap();
		assert_eq!(link.kind, RelationKind::Marriage);
		assert_eq!((link.target.x, link.target.y), (spouse.x, spouse.y));
		assert_eq!(link.target.polar, spouse.polar);
	}

	#[test]
	fn deterministic_across_runs() {
		let graph = family();
		for mode in LayoutMode::ALL {
			let first = layout(&graph, mode, &LayoutConfig::default());
			let second = layout(&graph, mode, &LayoutConfig::default());
			assert_eq!(positions(&first), positions(&second));
			assert_eq!(first.bounds, second.bounds);
		}
	}

	#[test]
	fn branch_colors_cycle_through_palette() {
		let individuals: Vec<_> = (0..12).map(|i| person(&format!("r{i:02}"))).collect();
		let graph = FamilyGraph::build(&individuals, &[]);
		let layout = layout(&graph, LayoutMode::Fan, &LayoutConfig::default());

		let last = layout.node("r11").unwrap();
		assert_eq!(last.branch_index, 11);
		assert_eq!(last.color_index, 1);
	}

	#[test]
	fn degenerate_inputs_keep_positive_dimensions() {
		let empty = layout(&FamilyGraph::build(&[], &[]), LayoutMode::Fan, &LayoutConfig::default());
		assert!(empty.nodes.is_empty());
		assert!(empty.dimensions.width >= 1.0 && empty.dimensions.height >= 1.0);

		let config = LayoutConfig {
			margin: 0.0,
			..LayoutConfig::default()
		};
		let single = layout(
			&FamilyGraph::build(&[person("solo")], &[]),
			LayoutMode::Hierarchical(Orientation::Vertical),
			&config,
		);
		assert_eq!(single.dimensions, Dimensions { width: 1.0, height: 1.0 });
		assert_eq!((single.nodes[0].x, single.nodes[0].y), (0.0, 0.0));
	}

	#[test]
	fn left_half_labels_are_flipped() {
		let (_, flipped) = label_rotation(Polar { angle: -1.0, radius: 10.0 });
		assert!(flipped);
		let (rotation, flipped) = label_rotation(Polar { angle: PI / 2.0, radius: 10.0 });
		assert!(!flipped);
		assert_eq!(rotation, 0.0);
	}

	#[test]
	fn parses_mode_names() {
		for mode in LayoutMode::ALL {
			assert_eq!(LayoutMode::parse(mode.as_str()), Some(mode));
		}
		assert_eq!(LayoutMode::parse("spiral"), None);
	}
}

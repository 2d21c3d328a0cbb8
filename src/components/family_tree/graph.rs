//! Turns flat individual/relationship records into a single-parent hierarchy.
//!
//! Every child keeps exactly one primary parent. Extra parents, spouses and any
//! other relation survive as auxiliary edges so nothing is drawn twice.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};

use super::normalize::compare_names;
use super::types::{Gender, Individual, RelationKind, Relationship};

pub type NodeIdx = usize;

/// Id of the invisible node every top-level individual hangs from.
pub const ROOT_ID: &str = "__family_root__";
const ROOT: NodeIdx = 0;

#[derive(Clone, Debug)]
pub struct GraphNode {
	pub id: String,
	/// `None` only for the synthetic root.
	pub individual: Option<Rc<Individual>>,
	pub label: String,
	pub children: Vec<NodeIdx>,
	/// Every parent named by a parent-child relationship, in input order.
	pub parents: Vec<NodeIdx>,
	pub primary_parent: Option<NodeIdx>,
	pub depth: i32,
	pub generation: Option<i32>,
	pub branch_index: Option<usize>,
}

impl GraphNode {
	fn synthetic_root() -> Self {
		Self::new(ROOT_ID.to_owned(), None, String::new())
	}

	fn new(id: String, individual: Option<Rc<Individual>>, label: String) -> Self {
		Self {
			id,
			individual,
			label,
			children: Vec::new(),
			parents: Vec::new(),
			primary_parent: None,
			depth: -1,
			generation: None,
			branch_index: None,
		}
	}

	#[cfg(test)]
	pub fn is_synthetic_root(&self) -> bool {
		self.individual.is_none()
	}

	pub fn declared_generation(&self) -> Option<i32> {
		self.individual.as_ref().and_then(|i| i.generation)
	}

	fn gender(&self) -> Gender {
		self.individual.as_ref().map(|i| i.gender).unwrap_or_default()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct AuxiliaryEdge {
	pub source: NodeIdx,
	pub target: NodeIdx,
	pub kind: RelationKind,
	pub context: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Edge {
	/// Primary parent owns the child.
	Hierarchy { parent: NodeIdx, child: NodeIdx },
	/// Secondary parent, spouse or any other non-owning relation.
	Auxiliary(AuxiliaryEdge),
}

#[derive(Clone, Debug)]
pub struct FamilyGraph {
	nodes: Vec<GraphNode>,
	node_by_id: HashMap<String, NodeIdx>,
	edges: Vec<Edge>,
}

impl FamilyGraph {
	pub fn build(individuals: &[Individual], relationships: &[Relationship]) -> Self {
		let mut graph = Self {
			nodes: vec![GraphNode::synthetic_root()],
			node_by_id: HashMap::new(),
			edges: Vec::new(),
		};

		for individual in individuals {
			if individual.id.trim().is_empty() {
				warn!("Skipping individual without id ({:?})", individual.name);
				continue;
			}
			if graph.node_by_id.contains_key(&individual.id) {
				warn!("Duplicate individual id {}, keeping the first record", individual.id);
				continue;
			}
			graph.push_node(individual.clone());
		}

		let mut candidates: Vec<Vec<NodeIdx>> = vec![Vec::new(); graph.nodes.len()];
		let mut contexts: HashMap<(NodeIdx, NodeIdx), Option<String>> = HashMap::new();

		for rel in relationships {
			let (Some(source), Some(target)) = (graph.index_of(&rel.source), graph.index_of(&rel.target))
			else {
				debug!(
					"Dropping {} relationship {} -> {}: unknown endpoint",
					rel.kind.as_str(),
					rel.source,
					rel.target
				);
				continue;
			};
			if source == target {
				debug!("Dropping self relationship on {}", rel.source);
				continue;
			}
			match &rel.kind {
				RelationKind::Parent => {
					if !candidates[target].contains(&source) {
						candidates[target].push(source);
						contexts.insert((source, target), rel.context.clone());
					}
				}
				kind => graph.edges.push(Edge::Auxiliary(AuxiliaryEdge {
					source,
					target,
					kind: kind.clone(),
					context: rel.context.clone(),
				})),
			}
		}

		for child in 1..graph.nodes.len() {
			let mut ranked = candidates[child].clone();
			ranked.sort_by_key(|&parent| graph.parent_rank(parent));

			let mut primary = None;
			for parent in ranked {
				if primary.is_none() && !graph.reaches(parent, child) {
					primary = Some(parent);
					continue;
				}
				let context = contexts
					.get(&(parent, child))
					.cloned()
					.flatten()
					.unwrap_or_else(|| RelationKind::SECONDARY_PARENT_CONTEXT.to_owned());
				graph.edges.push(Edge::Auxiliary(AuxiliaryEdge {
					source: parent,
					target: child,
					kind: RelationKind::secondary(),
					context: Some(context),
				}));
			}

			graph.nodes[child].parents = std::mem::take(&mut candidates[child]);
			if let Some(parent) = primary {
				graph.nodes[child].primary_parent = Some(parent);
				graph.edges.push(Edge::Hierarchy { parent, child });
			}
		}

		for idx in 1..graph.nodes.len() {
			let owner = graph.nodes[idx].primary_parent.unwrap_or(ROOT);
			graph.nodes[owner].children.push(idx);
		}
		for idx in 0..graph.nodes.len() {
			graph.sort_children(idx);
		}
		graph.derive_levels();
		graph
	}

	/// Append an individual under `parent_id`, or at the top level when the
	/// parent is absent or unknown. Returns false when the id is already taken.
	pub fn insert_individual(&mut self, individual: Individual, parent_id: Option<&str>) -> bool {
		if individual.id.trim().is_empty() || self.node_by_id.contains_key(&individual.id) {
			return false;
		}
		let parent = parent_id.and_then(|id| self.index_of(id)).unwrap_or(ROOT);
		let idx = self.push_node(individual);
		if parent != ROOT {
			let node = &mut self.nodes[idx];
			node.parents.push(parent);
			node.primary_parent = Some(parent);
			self.edges.push(Edge::Hierarchy { parent, child: idx });
		}
		self.nodes[parent].children.push(idx);
		self.sort_children(parent);
		self.derive_levels();
		true
	}

	#[cfg(test)]
	pub fn root(&self) -> &GraphNode {
		&self.nodes[ROOT]
	}

	pub fn node(&self, idx: NodeIdx) -> &GraphNode {
		&self.nodes[idx]
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn index_of(&self, id: &str) -> Option<NodeIdx> {
		self.node_by_id.get(id).copied()
	}

	#[cfg(test)]
	pub fn get(&self, id: &str) -> Option<&GraphNode> {
		self.index_of(id).map(|idx| &self.nodes[idx])
	}

	/// Number of real (non-synthetic) nodes.
	pub fn len(&self) -> usize {
		self.nodes.len() - 1
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	#[cfg(test)]
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn secondary_relationships(&self) -> impl Iterator<Item = &AuxiliaryEdge> {
		self.edges.iter().filter_map(|edge| match edge {
			Edge::Auxiliary(aux) => Some(aux),
			Edge::Hierarchy { .. } => None,
		})
	}

	pub fn hierarchy_edges(&self) -> impl Iterator<Item = (NodeIdx, NodeIdx)> + '_ {
		self.edges.iter().filter_map(|edge| match edge {
			Edge::Hierarchy { parent, child } => Some((*parent, *child)),
			Edge::Auxiliary(_) => None,
		})
	}

	fn push_node(&mut self, individual: Individual) -> NodeIdx {
		let idx = self.nodes.len();
		let label = individual.display_name();
		self.node_by_id.insert(individual.id.clone(), idx);
		self.nodes.push(GraphNode::new(individual.id.clone(), Some(Rc::new(individual)), label));
		idx
	}

	/// Lower ranks win the primary slot: male first, then oldest declared
	/// generation. The stable sort keeps input order for ties.
	fn parent_rank(&self, parent: NodeIdx) -> (bool, i32) {
		let node = &self.nodes[parent];
		(
			node.gender() != Gender::Male,
			node.declared_generation().unwrap_or(i32::MAX),
		)
	}

	/// Whether `child` already sits on the primary ancestry of `from`.
	fn reaches(&self, from: NodeIdx, child: NodeIdx) -> bool {
		let mut cursor = Some(from);
		let mut steps = 0;
		while let Some(idx) = cursor {
			if idx == child {
				return true;
			}
			steps += 1;
			if steps > self.nodes.len() {
				break;
			}
			cursor = self.nodes[idx].primary_parent;
		}
		false
	}

	fn sort_children(&mut self, idx: NodeIdx) {
		let mut children = std::mem::take(&mut self.nodes[idx].children);
		children.sort_by(|&a, &b| self.sibling_order(a, b));
		self.nodes[idx].children = children;
	}

	fn sibling_order(&self, a: NodeIdx, b: NodeIdx) -> Ordering {
		let (left, right) = (&self.nodes[a], &self.nodes[b]);
		let by_generation = match (left.declared_generation(), right.declared_generation()) {
			(Some(x), Some(y)) => x.cmp(&y),
			(Some(_), None) => Ordering::Less,
			(None, Some(_)) => Ordering::Greater,
			(None, None) => Ordering::Equal,
		};
		by_generation
			.then_with(|| compare_names(&left.label, &right.label))
			.then_with(|| left.id.cmp(&right.id))
	}

	/// Single pass from the synthetic root assigning depth, generation and
	/// branch index. Each node is visited at most once.
	fn derive_levels(&mut self) {
		for node in &mut self.nodes {
			node.depth = -1;
			node.generation = None;
			node.branch_index = None;
		}

		let mut visited = vec![false; self.nodes.len()];
		visited[ROOT] = true;
		let mut stack: Vec<(NodeIdx, i32, Option<i32>, usize)> = self.nodes[ROOT]
			.children
			.iter()
			.enumerate()
			.rev()
			.map(|(branch, &idx)| (idx, 0, None, branch))
			.collect();

		while let Some((idx, depth, parent_generation, branch)) = stack.pop() {
			if std::mem::replace(&mut visited[idx], true) {
				continue;
			}
			let node = &mut self.nodes[idx];
			let generation = node
				.declared_generation()
				.or(parent_generation.map(|g| g + 1))
				.unwrap_or(depth + 1);
			node.depth = depth;
			node.generation = Some(generation);
			node.branch_index = Some(branch);
			for &child in node.children.iter().rev() {
				stack.push((child, depth + 1, Some(generation), branch));
			}
		}
	}
}

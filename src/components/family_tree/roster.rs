//! The individuals the tree actually shows, keyed the way the graph keys them.

use std::collections::HashMap;

use super::types::Individual;

/// Records in input order; the first record wins a duplicate id and blank ids
/// are skipped, matching [`FamilyGraph::build`](super::graph::FamilyGraph::build).
#[derive(Clone, Debug, Default)]
pub struct Roster {
	records: Vec<Individual>,
	by_id: HashMap<String, usize>,
	next_serial: usize,
}

impl Roster {
	pub fn new(records: &[Individual]) -> Self {
		let mut roster = Self::default();
		for record in records {
			roster.insert(record.clone());
		}
		roster
	}

	/// Adds a record unless its id is blank or already taken.
	pub fn insert(&mut self, individual: Individual) -> bool {
		if individual.id.trim().is_empty() || self.by_id.contains_key(&individual.id) {
			return false;
		}
		self.by_id.insert(individual.id.clone(), self.records.len());
		self.records.push(individual);
		true
	}

	pub fn records(&self) -> &[Individual] {
		&self.records
	}

	pub fn get(&self, id: &str) -> Option<&Individual> {
		self.by_id.get(id).map(|&idx| &self.records[idx])
	}

	/// Builds a record for someone added by hand, with an id no record uses.
	pub fn new_individual(&mut self, name: &str) -> Individual {
		let id = loop {
			self.next_serial += 1;
			let candidate = format!("NEW_{}", self.next_serial);
			if !self.by_id.contains_key(&candidate) {
				break candidate;
			}
		};
		Individual {
			id,
			name: name.trim().to_owned(),
			..Default::default()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn person(id: &str, name: &str) -> Individual {
		Individual {
			id: id.into(),
			name: name.into(),
			..Default::default()
		}
	}

	#[test]
	fn first_record_wins_like_the_graph() {
		let roster = Roster::new(&[
			person("I_1", "Jean Herbaut"),
			person("I_1", "Jean Dupont"),
			person(" ", "Nobody"),
			person("I_2", "Marie Herbaut"),
		]);
		let names: Vec<&str> = roster.records().iter().map(|r| r.name.as_str()).collect();
		assert_eq!(names, vec!["Jean Herbaut", "Marie Herbaut"]);
		assert_eq!(roster.get("I_1").map(|r| r.name.as_str()), Some("Jean Herbaut"));
		assert!(roster.get(" ").is_none());
	}

	#[test]
	fn new_individuals_get_fresh_ids() {
		let mut roster = Roster::new(&[person("NEW_1", "Taken")]);
		let first = roster.new_individual("  Paul Martin ");
		assert_eq!(first.id, "NEW_2");
		assert_eq!(first.name, "Paul Martin");
		assert!(roster.insert(first.clone()));
		assert!(!roster.insert(first));
		assert_eq!(roster.new_individual("Louise").id, "NEW_3");
	}
}

//! Multi-field, accent-insensitive lookup over individuals.

use std::cmp::Ordering;

use thiserror::Error;

use super::normalize::{compare_names, normalize};
use super::types::Individual;

const SURNAME_PARTICLES: &[&str] = &["de", "du", "des", "le", "la", "d", "van", "von", "der", "den"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchCriteria {
	pub last_name: Option<String>,
	pub first_name: Option<String>,
	pub birth: Option<String>,
}

impl SearchCriteria {
	/// Builds criteria from raw form inputs; blank inputs count as absent.
	pub fn from_fields(last_name: &str, first_name: &str, birth: &str) -> Self {
		let field = |value: &str| (!value.trim().is_empty()).then(|| value.trim().to_owned());
		Self {
			last_name: field(last_name),
			first_name: field(first_name),
			birth: field(birth),
		}
	}
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SearchError {
	#[error("Enter a surname, a given name or a birth detail.")]
	EmptyCriteria,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMatch {
	pub id: String,
	pub display_name: String,
	pub birth: Option<String>,
}

/// How the caller should react to a result list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
	NotFound,
	/// Select right away.
	Single(SearchMatch),
	/// Let the user pick; already sorted by display name.
	Multiple(Vec<SearchMatch>),
}

impl From<Vec<SearchMatch>> for SearchOutcome {
	fn from(mut matches: Vec<SearchMatch>) -> Self {
		match matches.len() {
			0 => SearchOutcome::NotFound,
			1 => SearchOutcome::Single(matches.remove(0)),
			_ => SearchOutcome::Multiple(matches),
		}
	}
}

#[derive(Clone, Debug)]
struct IndexEntry {
	hit: SearchMatch,
	surname: String,
	given: String,
	birth: String,
}

#[derive(Clone, Debug, Default)]
pub struct SearchIndex {
	entries: Vec<IndexEntry>,
}

impl SearchIndex {
	pub fn new(records: &[Individual]) -> Self {
		let mut index = Self::default();
		index.update(records);
		index
	}

	/// Rebuild the index from scratch.
	pub fn update(&mut self, records: &[Individual]) {
		self.entries = records
			.iter()
			.map(|record| {
				let display_name = record.display_name();
				let (surname, given) = split_name(&display_name);
				let birth = record
					.birth
					.as_ref()
					.map(|b| normalize(&format!("{} {}", b.date.as_deref().unwrap_or(""), b.place.as_deref().unwrap_or(""))))
					.unwrap_or_default();
				IndexEntry {
					hit: SearchMatch {
						id: record.id.clone(),
						display_name,
						birth: record.birth_summary(),
					},
					surname: normalize(&surname),
					given: normalize(&given),
					birth,
				}
			})
			.collect();
	}

	pub fn query(&self, criteria: &SearchCriteria) -> Result<Vec<SearchMatch>, SearchError> {
		let wanted = |value: &Option<String>| value.as_deref().map(normalize).filter(|v| !v.is_empty());
		let (last, first, birth) = (
			wanted(&criteria.last_name),
			wanted(&criteria.first_name),
			wanted(&criteria.birth),
		);
		if last.is_none() && first.is_none() && birth.is_none() {
			return Err(SearchError::EmptyCriteria);
		}

		let contains = |haystack: &str, needle: &Option<String>| needle.as_deref().is_none_or(|n| haystack.contains(n));
		let mut matches: Vec<SearchMatch> = self
			.entries
			.iter()
			.filter(|e| contains(&e.surname, &last) && contains(&e.given, &first) && contains(&e.birth, &birth))
			.map(|e| e.hit.clone())
			.collect();
		matches.sort_by(by_display_name);
		Ok(matches)
	}
}

fn by_display_name(a: &SearchMatch, b: &SearchMatch) -> Ordering {
	compare_names(&a.display_name, &b.display_name).then_with(|| a.id.cmp(&b.id))
}

/// Splits a display name into (surname, given names).
///
/// Uppercase tokens are the surname when the name mixes cases ("Jean
/// HERBAUT"); otherwise the last token, with any particles before it.
fn split_name(name: &str) -> (String, String) {
	let tokens: Vec<&str> = name.split_whitespace().collect();
	if tokens.is_empty() {
		return (String::new(), String::new());
	}

	let shouting = |t: &&str| t.chars().filter(|c| c.is_alphabetic()).count() > 1 && !t.chars().any(char::is_lowercase);
	let upper: Vec<&str> = tokens.iter().copied().filter(shouting).collect();
	if !upper.is_empty() && upper.len() < tokens.len() {
		let given: Vec<&str> = tokens.iter().copied().filter(|t| !shouting(t)).collect();
		return (upper.join(" "), given.join(" "));
	}

	let mut start = tokens.len() - 1;
	while start > 1 && SURNAME_PARTICLES.contains(&normalize(tokens[start - 1]).as_str()) {
		start -= 1;
	}
	(tokens[start..].join(" "), tokens[..start].join(" "))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::family_tree::types::LifeEvent;
	use pretty_assertions::assert_eq;

	fn person(id: &str, name: &str, birth: Option<(&str, &str)>) -> Individual {
		Individual {
			id: id.into(),
			name: name.into(),
			birth: birth.map(|(date, place)| LifeEvent {
				date: Some(date.into()),
				place: Some(place.into()),
			}),
			..Default::default()
		}
	}

	fn index() -> SearchIndex {
		SearchIndex::new(&[
			person("I_1", "Jean Herbaut", Some(("12 mars 1850", "Lille"))),
			person("I_2", "Marie Dupont", Some(("3 mai 1855", "Arras"))),
			person("I_3", "Élise HÉRBAUT", Some(("1 juin 1880", "Lille"))),
			person("I_4", "Louis de la Tour", None),
		])
	}

	fn ids(matches: &[SearchMatch]) -> Vec<&str> {
		matches.iter().map(|m| m.id.as_str()).collect()
	}

	#[test]
	fn surname_scenario() {
		let index = SearchIndex::new(&[
			person("I_1", "Jean Herbaut", None),
			person("I_2", "Marie Dupont", None),
		]);
		let criteria = SearchCriteria {
			last_name: Some("Herbaut".into()),
			..Default::default()
		};
		let matches = index.query(&criteria).unwrap();
		assert_eq!(ids(&matches), vec!["I_1"]);
		assert!(matches!(SearchOutcome::from(matches), SearchOutcome::Single(hit) if hit.id == "I_1"));
	}

	#[test]
	fn empty_criteria_is_rejected() {
		let index = index();
		assert_eq!(index.query(&SearchCriteria::default()), Err(SearchError::EmptyCriteria));
		assert_eq!(
			index.query(&SearchCriteria::from_fields("  ", "", " - ")),
			Err(SearchError::EmptyCriteria)
		);
	}

	#[test]
	fn accents_and_case_are_ignored_and_results_sorted() {
		let matches = index().query(&SearchCriteria::from_fields("herbaut", "", "")).unwrap();
		assert_eq!(ids(&matches), vec!["I_3", "I_1"]);
		assert!(matches!(SearchOutcome::from(matches), SearchOutcome::Multiple(list) if list.len() == 2));
	}

	#[test]
	fn fields_are_conjunctive() {
		let index = index();
		let both = index.query(&SearchCriteria::from_fields("Herbaut", "jean", "")).unwrap();
		assert_eq!(ids(&both), vec!["I_1"]);

		let none = index.query(&SearchCriteria::from_fields("Dupont", "Jean", "")).unwrap();
		assert_eq!(SearchOutcome::from(none), SearchOutcome::NotFound);

		let born_in_lille = index.query(&SearchCriteria::from_fields("", "", "lille")).unwrap();
		assert_eq!(ids(&born_in_lille), vec!["I_3", "I_1"]);

		let born_1850 = index.query(&SearchCriteria::from_fields("", "", "1850")).unwrap();
		assert_eq!(ids(&born_1850), vec!["I_1"]);
	}

	#[test]
	fn surname_split_rules() {
		assert_eq!(split_name("Élise HÉRBAUT"), ("HÉRBAUT".into(), "Élise".into()));
		assert_eq!(split_name("Louis de la Tour"), ("de la Tour".into(), "Louis".into()));
		assert_eq!(split_name("Herbaut"), ("Herbaut".into(), String::new()));
		assert_eq!(split_name("JEAN HERBAUT"), ("HERBAUT".into(), "JEAN".into()));
	}

	#[test]
	fn particle_surnames_match_on_any_part() {
		let matches = index().query(&SearchCriteria::from_fields("la tour", "", "")).unwrap();
		assert_eq!(ids(&matches), vec!["I_4"]);
	}

	#[test]
	fn update_replaces_previous_entries() {
		let mut index = index();
		index.update(&[person("I_9", "Paul Martin", None)]);
		assert!(index.query(&SearchCriteria::from_fields("Herbaut", "", "")).unwrap().is_empty());
		let paul = index.query(&SearchCriteria::from_fields("martin", "", "")).unwrap();
		assert_eq!(ids(&paul), vec!["I_9"]);
	}
}

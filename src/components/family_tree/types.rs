use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};

/// Full dataset as served by the static data file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct FamilyData {
	#[serde(default, deserialize_with = "nullable")]
	pub individuals: Vec<Individual>,
	#[serde(default, deserialize_with = "lenient_relationships")]
	pub relationships: Vec<Relationship>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gender {
	Male,
	Female,
	#[default]
	Unknown,
}

impl From<Option<String>> for Gender {
	fn from(raw: Option<String>) -> Self {
		match raw.as_deref().map(str::trim) {
			Some("M" | "m" | "H" | "h" | "male" | "Male") => Gender::Male,
			Some("F" | "f" | "female" | "Female") => Gender::Female,
			_ => Gender::Unknown,
		}
	}
}

impl<'de> Deserialize<'de> for Gender {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Option::<String>::deserialize(deserializer).map(Gender::from)
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct LifeEvent {
	pub date: Option<String>,
	pub place: Option<String>,
}

impl LifeEvent {
	/// "date, place" with whichever halves are present.
	pub fn summary(&self) -> Option<String> {
		let parts: Vec<&str> = [self.date.as_deref(), self.place.as_deref()]
			.into_iter()
			.flatten()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.collect();
		(!parts.is_empty()).then(|| parts.join(", "))
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Spouse {
	#[serde(default)]
	pub name: String,
	pub marriage_date: Option<String>,
	pub marriage_place: Option<String>,
	pub partner_id: Option<String>,
	pub note: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Individual {
	pub id: String,
	#[serde(default, deserialize_with = "nullable")]
	pub name: String,
	#[serde(default)]
	pub gender: Gender,
	#[serde(default, deserialize_with = "generation_hint")]
	pub generation: Option<i32>,
	#[serde(default)]
	pub sosa: Option<String>,
	#[serde(default)]
	pub birth: Option<LifeEvent>,
	#[serde(default)]
	pub death: Option<LifeEvent>,
	#[serde(default, deserialize_with = "parent_names")]
	pub parents: Vec<String>,
	#[serde(default, deserialize_with = "nullable")]
	pub spouses: Vec<Spouse>,
	#[serde(default, deserialize_with = "nullable")]
	pub children: Vec<String>,
	#[serde(default, deserialize_with = "nullable")]
	pub annotations: Vec<String>,
}

static UNKNOWN_BIRTH: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^La date de naissance de (?P<name>.+?) n'est pas connue").unwrap());
static UNKNOWN_DEATH: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^La date de décès de (?P<name>.+?) n'est pas connue").unwrap());
static BORN: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^(?P<name>[\p{L}' \-]+?) est née? le").unwrap());

impl Individual {
	pub fn has_placeholder_name(&self) -> bool {
		let name = self.name.trim();
		name.is_empty() || name.starts_with("Personne ")
	}

	/// Name shown on the canvas and in search results.
	///
	/// Placeholder names are replaced by the first name found in the annotations.
	pub fn display_name(&self) -> String {
		if !self.has_placeholder_name() {
			return self.name.trim().to_owned();
		}
		let derived = self.merged_annotations().iter().find_map(|sentence| {
			[&*UNKNOWN_BIRTH, &*UNKNOWN_DEATH, &*BORN]
				.into_iter()
				.find_map(|re| re.captures(sentence))
				.map(|caps| caps["name"].trim().to_owned())
		});
		match derived {
			Some(name) if !name.is_empty() => name,
			_ if !self.name.trim().is_empty() => self.name.trim().to_owned(),
			_ => self.id.clone(),
		}
	}

	/// Annotations with wrapped continuation lines joined back into sentences.
	pub fn merged_annotations(&self) -> Vec<String> {
		let mut merged: Vec<String> = Vec::new();
		for fragment in self.annotations.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
			match merged.last_mut() {
				Some(previous) if is_continuation(previous, fragment) => {
					previous.push(' ');
					previous.push_str(fragment);
				}
				_ => merged.push(fragment.to_owned()),
			}
		}
		merged
	}

	pub fn birth_summary(&self) -> Option<String> {
		self.birth.as_ref().and_then(LifeEvent::summary)
	}

	pub fn death_summary(&self) -> Option<String> {
		self.death.as_ref().and_then(LifeEvent::summary)
	}
}

fn is_continuation(previous: &str, fragment: &str) -> bool {
	if fragment.starts_with('-') {
		return false;
	}
	let first = fragment.chars().next();
	if first.is_some_and(|c| c.is_lowercase() || c.is_ascii_digit() || ",;:)".contains(c)) {
		return true;
	}
	if previous.starts_with('-') {
		return false;
	}
	!previous.ends_with(['.', '!', '?', ':', ';'])
}

/// Relationship kind, resolved once at ingestion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelationKind {
	Parent,
	Union,
	Marriage,
	Other(String),
}

impl RelationKind {
	pub const SECONDARY_PARENT_CONTEXT: &'static str = "secondary-parent";

	/// Kind given to demoted parent-child edges.
	pub fn secondary() -> Self {
		RelationKind::Other("relationship".to_owned())
	}

	pub fn as_str(&self) -> &str {
		match self {
			RelationKind::Parent => "parent-child",
			RelationKind::Union => "union",
			RelationKind::Marriage => "spouse",
			RelationKind::Other(other) => other,
		}
	}
}

impl Default for RelationKind {
	fn default() -> Self {
		RelationKind::Other(String::new())
	}
}

impl From<String> for RelationKind {
	fn from(raw: String) -> Self {
		match raw.trim().to_ascii_lowercase().as_str() {
			"parent-child" | "parent" => RelationKind::Parent,
			"union" | "partner" => RelationKind::Union,
			"spouse" | "marriage" => RelationKind::Marriage,
			_ => RelationKind::Other(raw),
		}
	}
}

impl<'de> Deserialize<'de> for RelationKind {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Option::<String>::deserialize(deserializer)
			.map(|raw| RelationKind::from(raw.unwrap_or_default()))
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Relationship {
	#[serde(default, deserialize_with = "nullable")]
	pub source: String,
	#[serde(default, deserialize_with = "nullable")]
	pub target: String,
	#[serde(rename = "type", default)]
	pub kind: RelationKind,
	#[serde(default)]
	pub context: Option<String>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Malformed relationship records are dropped, never fatal to the whole file.
fn lenient_relationships<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Relationship>, D::Error> {
	let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
	Ok(raw
		.into_iter()
		.enumerate()
		.filter_map(|(position, value)| match serde_json::from_value::<Relationship>(value) {
			Ok(rel) => Some(rel),
			Err(err) => {
				debug!("Dropping malformed relationship #{position}: {err}");
				None
			}
		})
		.collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParents {
	Pair {
		father: Option<String>,
		mother: Option<String>,
	},
	List(Vec<Option<String>>),
	Single(String),
}

fn parent_names<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
	let names = match Option::<RawParents>::deserialize(deserializer)? {
		None => Vec::new(),
		Some(RawParents::Pair { father, mother }) => [father, mother].into_iter().flatten().collect(),
		Some(RawParents::List(list)) => list.into_iter().flatten().collect(),
		Some(RawParents::Single(name)) => vec![name],
	};
	Ok(names.into_iter().filter(|n| !n.trim().is_empty()).collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGeneration {
	Number(i64),
	Float(f64),
	Text(String),
}

fn generation_hint<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
	Ok(match Option::<RawGeneration>::deserialize(deserializer)? {
		Some(RawGeneration::Number(n)) => i32::try_from(n).ok(),
		Some(RawGeneration::Float(f)) if f.is_finite() && f.fract() == 0.0 && f.abs() <= i32::MAX as f64 => {
			Some(f as i32)
		}
		Some(RawGeneration::Float(_)) => None,
		Some(RawGeneration::Text(text)) => parse_generation(&text),
		None => None,
	})
}

/// Reads "3", "IV" or "Génération 4" style generation labels.
pub fn parse_generation(text: &str) -> Option<i32> {
	let token = text.split_whitespace().last()?;
	if let Ok(n) = token.parse::<i32>() {
		return Some(n);
	}
	roman_to_int(token)
}

fn roman_to_int(token: &str) -> Option<i32> {
	let mut total: i32 = 0;
	let mut previous = 0;
	for c in token.chars().rev() {
		let value = match c.to_ascii_uppercase() {
			'I' => 1,
			'V' => 5,
			'X' => 10,
			'L' => 50,
			'C' => 100,
			'D' => 500,
			'M' => 1000,
			_ => return None,
		};
		if value < previous {
			total = total.checked_sub(value)?;
		} else {
			total = total.checked_add(value)?;
			previous = value;
		}
	}
	(total > 0).then_some(total)
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	#[test]
	fn parses_extractor_shape() {
		let data: FamilyData = serde_json::from_value(json!({
			"individuals": [{
				"id": "I_1",
				"name": "Jean Herbaut",
				"gender": "M",
				"generation": "II",
				"sosa": "2",
				"birth": {"date": "12 mars 1850", "place": "Lille"},
				"death": null,
				"parents": {"father": "Pierre Herbaut", "mother": null},
				"spouses": null,
				"children": ["1.1"],
				"annotations": null
			}],
			"relationships": [
				{"type": "spouse", "source": "I_1", "target": "EXT_x", "context": null}
			]
		}))
		.unwrap();

		let jean = &data.individuals[0];
		assert_eq!(jean.gender, Gender::Male);
		assert_eq!(jean.generation, Some(2));
		assert_eq!(jean.parents, vec!["Pierre Herbaut".to_owned()]);
		assert!(jean.spouses.is_empty());
		assert!(jean.annotations.is_empty());
		assert_eq!(jean.birth_summary().as_deref(), Some("12 mars 1850, Lille"));
		assert_eq!(data.relationships[0].kind, RelationKind::Marriage);
	}

	#[test]
	fn accepts_parent_list_and_numeric_generation() {
		let individual: Individual =
			serde_json::from_value(json!({"id": "A", "parents": [], "generation": 3})).unwrap();
		assert!(individual.parents.is_empty());
		assert_eq!(individual.generation, Some(3));
		assert_eq!(individual.gender, Gender::Unknown);
	}

	#[test]
	fn generation_labels() {
		assert_eq!(parse_generation("Génération 4"), Some(4));
		assert_eq!(parse_generation("XIV"), Some(14));
		assert_eq!(parse_generation("inconnue"), None);
		assert_eq!(parse_generation(""), None);
		assert_eq!(parse_generation(&"M".repeat(2_200_000)), None);
	}

	#[test]
	fn float_generations_are_accepted() {
		let whole: Individual = serde_json::from_value(json!({ "id": "I_1", "generation": 3.0 })).unwrap();
		assert_eq!(whole.generation, Some(3));
		let fractional: Individual = serde_json::from_value(json!({ "id": "I_2", "generation": 2.5 })).unwrap();
		assert_eq!(fractional.generation, None);
	}

	#[test]
	fn relation_kind_resolution() {
		assert_eq!(RelationKind::from("parent-child".to_owned()), RelationKind::Parent);
		assert_eq!(RelationKind::from("Union".to_owned()), RelationKind::Union);
		assert_eq!(
			RelationKind::from("godparent".to_owned()),
			RelationKind::Other("godparent".to_owned())
		);
	}

	#[test]
	fn merges_continuation_fragments() {
		let individual = Individual {
			id: "I_2".into(),
			annotations: vec![
				"Il est l'enfant légitime de Pierre Herbaut et".into(),
				"de Marie Dupont.".into(),
				"- Louis Herbaut (1.2)".into(),
				"Il meurt le 3 mai 1900".into(),
				"à Arras.".into(),
			],
			..Default::default()
		};
		assert_eq!(
			individual.merged_annotations(),
			vec![
				"Il est l'enfant légitime de Pierre Herbaut et de Marie Dupont.".to_owned(),
				"- Louis Herbaut (1.2)".to_owned(),
				"Il meurt le 3 mai 1900 à Arras.".to_owned(),
			]
		);
	}

	#[test]
	fn derives_name_from_annotations() {
		let individual = Individual {
			id: "I_3".into(),
			name: "Personne I_3".into(),
			annotations: vec!["La date de naissance de Rose Lefebvre n'est pas connue.".into()],
			..Default::default()
		};
		assert_eq!(individual.display_name(), "Rose Lefebvre");

		let anonymous = Individual {
			id: "I_4".into(),
			..Default::default()
		};
		assert_eq!(anonymous.display_name(), "I_4");
	}
}

//! Diacritic- and punctuation-insensitive text keys.

use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold text into a comparable key.
///
/// Strips diacritics (NFKD, then drops combining marks), lowercases, turns
/// every non-alphanumeric run into a single space and trims.
pub fn normalize(text: &str) -> String {
	let stripped: String = text
		.nfkd()
		.filter(|c| !is_combining_mark(*c))
		.flat_map(char::to_lowercase)
		.map(|c| if c.is_alphanumeric() { c } else { ' ' })
		.collect();
	stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Name ordering used for siblings and search results.
pub fn compare_names(a: &str, b: &str) -> Ordering {
	normalize(a).cmp(&normalize(b)).then_with(|| a.cmp(b))
}

//! Page-level settings, overridable from the query string.

use log::debug;

use crate::components::family_tree::{LayoutConfig, LayoutMode, ViewportConfig};

pub const DEFAULT_DATA_URL: &str = "data/famille-herbaut.json";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
	pub data_url: String,
	pub mode: LayoutMode,
	pub layout: LayoutConfig,
	pub viewport: ViewportConfig,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			data_url: DEFAULT_DATA_URL.to_owned(),
			mode: LayoutMode::default(),
			layout: LayoutConfig::default(),
			viewport: ViewportConfig::default(),
		}
	}
}

impl AppConfig {
	/// Applies `data=` and `mode=` from a query string, with or without the
	/// leading `?`. Anything else is ignored.
	pub fn from_query(query: &str) -> Self {
		let mut config = Self::default();
		let query = query.strip_prefix('?').unwrap_or(query);
		for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
			match key.as_ref() {
				"data" if !value.trim().is_empty() => config.data_url = value.trim().to_owned(),
				"mode" => match LayoutMode::parse(&value) {
					Some(mode) => config.mode = mode,
					None => debug!("Ignoring unknown layout mode {value:?}"),
				},
				_ => {}
			}
		}
		config
	}

	/// Reads the current page location; defaults outside a browser.
	pub fn from_location() -> Self {
		let search = web_sys::window().and_then(|w| w.location().search().ok());
		search.as_deref().map(Self::from_query).unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::family_tree::layout::Orientation;
	use pretty_assertions::assert_eq;

	#[test]
	fn empty_query_keeps_defaults() {
		assert_eq!(AppConfig::from_query(""), AppConfig::default());
		assert_eq!(AppConfig::from_query("?"), AppConfig::default());
	}

	#[test]
	fn reads_data_and_mode() {
		let config = AppConfig::from_query("?data=trees%2Fdupont.json&mode=horizontal");
		assert_eq!(config.data_url, "trees/dupont.json");
		assert_eq!(config.mode, LayoutMode::Hierarchical(Orientation::Horizontal));
	}

	#[test]
	fn ignores_unknown_keys_and_values() {
		let config = AppConfig::from_query("mode=spiral&data=&zoom=3");
		assert_eq!(config, AppConfig::default());
	}
}

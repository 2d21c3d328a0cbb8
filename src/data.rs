//! Loading the family dataset from a static JSON file.

use thiserror::Error;

use crate::components::family_tree::FamilyData;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LoadError {
	#[error("could not reach the data file: {0}")]
	Network(String),
	#[error("the data file answered HTTP {0}")]
	Status(u16),
	#[error("could not read the response body: {0}")]
	Body(String),
	#[error("invalid family data: {0}")]
	Parse(String),
}

/// Decodes the dataset; missing or null collections count as empty.
pub fn parse_family_data(text: &str) -> Result<FamilyData, LoadError> {
	serde_json::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))
}

/// Fetches and decodes the dataset at `url`, relative to the page.
pub async fn fetch_family_data(url: &str) -> Result<FamilyData, LoadError> {
	use wasm_bindgen::JsCast;
	use wasm_bindgen_futures::JsFuture;
	use web_sys::{Request, RequestInit, RequestMode, Response};

	let network = |reason: String| LoadError::Network(format!("{url}: {reason}"));

	let opts = RequestInit::new();
	opts.set_method("GET");
	opts.set_mode(RequestMode::Cors);

	let request = Request::new_with_str_and_init(url, &opts).map_err(|e| network(format!("{e:?}")))?;
	let window = web_sys::window().ok_or_else(|| network("no window".into()))?;
	let resp_value = JsFuture::from(window.fetch_with_request(&request))
		.await
		.map_err(|e| network(format!("{e:?}")))?;
	let resp: Response = resp_value
		.dyn_into()
		.map_err(|_| network("response is not a Response".into()))?;

	if !resp.ok() {
		return Err(LoadError::Status(resp.status()));
	}

	let text = JsFuture::from(resp.text().map_err(|e| LoadError::Body(format!("{e:?}")))?)
		.await
		.map_err(|e| LoadError::Body(format!("{e:?}")))?;
	let text = text
		.as_string()
		.ok_or_else(|| LoadError::Body("response body is not text".into()))?;

	parse_family_data(&text)
}

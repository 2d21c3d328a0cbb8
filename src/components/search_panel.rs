use leptos::prelude::*;
use log::warn;

use crate::components::family_tree::{SearchCriteria, SearchIndex, SearchMatch, SearchOutcome, TreeHandle};

#[derive(Clone, Debug, PartialEq)]
enum PanelStatus {
	Idle,
	Message(String),
	Choices(Vec<SearchMatch>),
}

/// Centre the tree on `id`, falling back to a plain highlight.
fn reveal(handle: TreeHandle, id: &str) -> bool {
	if handle.focus_on_individual(id) {
		return true;
	}
	warn!("Could not focus individual {id}; highlighting instead");
	handle.highlight_individual(id, false)
}

/// Surname / given name / birth search form with a pick list for ambiguous hits.
#[component]
pub fn SearchPanel(
	index: StoredValue<SearchIndex>,
	handle: TreeHandle,
	#[prop(into)] on_select: Callback<String>,
) -> impl IntoView {
	let last_name = RwSignal::new(String::new());
	let first_name = RwSignal::new(String::new());
	let birth = RwSignal::new(String::new());
	let status = RwSignal::new(PanelStatus::Idle);

	let pick = move |hit: SearchMatch| {
		if reveal(handle, &hit.id) {
			status.set(PanelStatus::Idle);
			on_select.run(hit.id);
		} else {
			status.set(PanelStatus::Message(format!("{} is not part of the tree.", hit.display_name)));
		}
	};

	let on_submit = move |ev: leptos::ev::SubmitEvent| {
		ev.prevent_default();
		let criteria = SearchCriteria::from_fields(&last_name.get(), &first_name.get(), &birth.get());
		let result = index.with_value(|index| index.query(&criteria));
		match result.map(SearchOutcome::from) {
			Err(err) => status.set(PanelStatus::Message(err.to_string())),
			Ok(SearchOutcome::NotFound) => status.set(PanelStatus::Message("No one matches this search.".into())),
			Ok(SearchOutcome::Single(hit)) => pick(hit),
			Ok(SearchOutcome::Multiple(hits)) => status.set(PanelStatus::Choices(hits)),
		}
	};

	let on_clear = move |_| {
		last_name.set(String::new());
		first_name.set(String::new());
		birth.set(String::new());
		status.set(PanelStatus::Idle);
	};

	view! {
		<form class="search-panel" on:submit=on_submit>
			<input type="text" placeholder="Surname" bind:value=last_name />
			<input type="text" placeholder="Given name" bind:value=first_name />
			<input type="text" placeholder="Birth date or place" bind:value=birth />
			<div class="search-actions">
				<button type="submit">"Search"</button>
				<button type="button" on:click=on_clear>"Clear"</button>
			</div>
			{move || match status.get() {
				PanelStatus::Idle => ().into_any(),
				PanelStatus::Message(text) => view! { <p class="search-message">{text}</p> }.into_any(),
				PanelStatus::Choices(hits) => {
					view! {
						<p class="search-message">{format!("{} matches", hits.len())}</p>
						<ul class="search-results">
							{hits
								.into_iter()
								.map(|hit| {
									let label = match &hit.birth {
										Some(birth) => format!("{} ({birth})", hit.display_name),
										None => hit.display_name.clone(),
									};
									view! {
										<li>
											<button type="button" on:click=move |_| pick(hit.clone())>
												{label}
											</button>
										</li>
									}
								})
								.collect_view()}
						</ul>
					}
						.into_any()
				}
			}}
		</form>
	}
}

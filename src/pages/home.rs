use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info, warn};

use crate::components::family_tree::{
	FamilyData, FamilyTreeCanvas, Individual, LayoutMode, Roster, SearchIndex, TreeHandle,
};
use crate::components::person_details::PersonDetails;
use crate::components::search_panel::SearchPanel;
use crate::config::AppConfig;
use crate::data::{LoadError, fetch_family_data};

#[derive(Clone, Debug, PartialEq)]
enum LoadState {
	Loading,
	Failed(LoadError),
	Ready(FamilyData),
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = AppConfig::from_location();
	let load = RwSignal::new(LoadState::Loading);

	let url = config.data_url.clone();
	spawn_local(async move {
		match fetch_family_data(&url).await {
			Ok(data) => {
				info!(
					"Loaded {} individuals and {} relationships from {url}",
					data.individuals.len(),
					data.relationships.len()
				);
				load.set(LoadState::Ready(data));
			}
			Err(err) => {
				error!("Loading {url} failed: {err}");
				load.set(LoadState::Failed(err));
			}
		}
	});

	view! {
		{move || match load.get() {
			LoadState::Loading => view! { <p class="status">"Loading family data…"</p> }.into_any(),
			LoadState::Failed(err) => {
				view! {
					<div class="status error">
						<h1>"Uh oh! The family tree could not be loaded."</h1>
						<p>{err.to_string()}</p>
					</div>
				}
					.into_any()
			}
			LoadState::Ready(data) => view! { <TreeExplorer data config=config.clone() /> }.into_any(),
		}}
	}
}

#[component]
fn TreeExplorer(data: FamilyData, config: AppConfig) -> impl IntoView {
	let handle = TreeHandle::new();
	let mode = RwSignal::new(config.mode);
	let selected = RwSignal::new(None::<Individual>);
	let roster = Roster::new(&data.individuals);
	let index = StoredValue::new(SearchIndex::new(roster.records()));
	let roster = StoredValue::new(roster);
	let data = Signal::stored(data);

	let on_canvas_select = Callback::new(move |person: Individual| selected.set(Some(person)));
	let on_search_select = Callback::new(move |id: String| {
		selected.set(roster.with_value(|people| people.get(&id).cloned()));
	});
	let on_add_child = Callback::new(move |name: String| {
		let Some(parent) = selected.get_untracked() else {
			return;
		};
		if name.trim().is_empty() {
			return;
		}
		let Some(mut child) = roster.try_update_value(|people| people.new_individual(&name)) else {
			return;
		};
		child.parents = vec![parent.display_name()];
		child.generation = parent.generation.map(|g| g + 1);

		if !handle.add_individual(child.clone(), Some(&parent.id)) {
			warn!("Could not add {} under {}", child.id, parent.id);
			return;
		}
		info!("Added {} ({}) under {}", child.name, child.id, parent.id);
		roster.update_value(|people| {
			people.insert(child.clone());
		});
		index.update_value(|index| roster.with_value(|people| index.update(people.records())));
		handle.focus_on_individual(&child.id);
		selected.set(Some(child));
	});
	let on_close = Callback::new(move |()| {
		selected.set(None);
		handle.clear_highlight();
	});

	let on_mode_change = move |ev: leptos::ev::Event| {
		if let Some(next) = LayoutMode::parse(&event_target_value(&ev)) {
			mode.set(next);
		}
	};

	view! {
		<div class="fullscreen-graph">
			<FamilyTreeCanvas
				data
				mode
				handle
				fullscreen=true
				layout_config=config.layout
				viewport_config=config.viewport
				on_select=on_canvas_select
			/>
			<div class="graph-overlay">
				<nav class="toolbar">
					<select on:change=on_mode_change prop:value=move || mode.get().as_str()>
						{LayoutMode::ALL
							.into_iter()
							.map(|m| view! { <option value=m.as_str()>{m.label()}</option> })
							.collect_view()}
					</select>
					<button type="button" title="Zoom in" on:click=move |_| handle.zoom_in()>
						"+"
					</button>
					<button type="button" title="Zoom out" on:click=move |_| handle.zoom_out()>
						"−"
					</button>
					<button type="button" on:click=move |_| handle.reset_view()>
						"Reset"
					</button>
					<button type="button" on:click=move |_| handle.overview()>
						"Overview"
					</button>
				</nav>
				<SearchPanel index handle on_select=on_search_select />
			</div>
			{move || selected.get().map(|individual| view! { <PersonDetails individual on_close on_add_child /> })}
		</div>
	}
}

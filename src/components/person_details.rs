use leptos::prelude::*;

use crate::components::family_tree::Individual;

fn row(label: &'static str, value: Option<String>) -> impl IntoView {
	value.map(|value| {
		view! {
			<dt>{label}</dt>
			<dd>{value}</dd>
		}
	})
}

/// Side panel describing the selected individual.
#[component]
pub fn PersonDetails(
	individual: Individual,
	#[prop(into)] on_close: Callback<()>,
	/// Receives the name typed into the "add child" form.
	#[prop(into)]
	on_add_child: Callback<String>,
) -> impl IntoView {
	let child_name = RwSignal::new(String::new());
	let on_submit = move |ev: leptos::ev::SubmitEvent| {
		ev.prevent_default();
		let name = child_name.get();
		if !name.trim().is_empty() {
			child_name.set(String::new());
			on_add_child.run(name);
		}
	};

	let non_empty = |items: Vec<String>| (!items.is_empty()).then_some(items);
	let parents = non_empty(individual.parents.clone()).map(|p| p.join(", "));
	let spouses = non_empty(
		individual
			.spouses
			.iter()
			.filter(|s| !s.name.trim().is_empty())
			.map(|s| match s.marriage_date.as_deref().or(s.marriage_place.as_deref()) {
				Some(detail) => format!("{} ({detail})", s.name),
				None => s.name.clone(),
			})
			.collect(),
	)
	.map(|s| s.join(", "));
	let annotations = individual.merged_annotations();

	view! {
		<aside class="person-details">
			<header>
				<h2>{individual.display_name()}</h2>
				<button type="button" class="close" on:click=move |_| on_close.run(())>
					"×"
				</button>
			</header>
			<dl>
				{row("Sosa", individual.sosa.clone())}
				{row("Generation", individual.generation.map(|g| g.to_string()))}
				{row("Born", individual.birth_summary())}
				{row("Died", individual.death_summary())}
				{row("Parents", parents)}
				{row("Spouses", spouses)}
			</dl>
			{(!annotations.is_empty())
				.then(|| {
					view! {
						<ul class="annotations">
							{annotations.into_iter().map(|note| view! { <li>{note}</li> }).collect_view()}
						</ul>
					}
				})}
			<form class="add-child" on:submit=on_submit>
				<input type="text" placeholder="Child's name" bind:value=child_name />
				<button type="submit">"Add child"</button>
			</form>
		</aside>
	}
}

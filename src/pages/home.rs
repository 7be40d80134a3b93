use leptos::prelude::*;
use log::{error, info};

use crate::components::architecture_graph::{ArchitectureGraph, Graph, Node};

const SAMPLE_ARCHITECTURE: &str = include_str!("sample_architecture.json");

fn sample_graph() -> Graph {
	Graph::from_json(SAMPLE_ARCHITECTURE).unwrap_or_else(|err| {
		error!("sample architecture rejected: {err}");
		Graph::default()
	})
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph = RwSignal::new(sample_graph());
	let simulating = RwSignal::new(true);
	let linking = RwSignal::new(false);
	let selected = RwSignal::new(None::<Node>);

	let on_node_click = Callback::new(move |node: Node| selected.set(Some(node)));
	let on_connect = Callback::new(move |(source, target): (String, String)| {
		graph.update(|g| match g.connect(&source, &target) {
			Some(id) => info!("added {id}: {source} -> {target}"),
			None => info!("ignored duplicate link {source} -> {target}"),
		});
	});
	let on_delete_edge = Callback::new(move |edge_id: String| {
		graph.update(|g| {
			g.remove_edge(&edge_id);
		});
	});

	let highlighted = Signal::derive(move || selected.get().map(|n| n.id));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ArchitectureGraph
					data=graph
					simulating=simulating
					linking_mode=linking
					highlighted_node_id=highlighted
					on_node_click=on_node_click
					on_connect=on_connect
					on_delete_edge=on_delete_edge
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>{move || graph.with(|g| g.title.clone())}</h1>
					<p class="subtitle">{move || graph.with(|g| g.description.clone())}</p>
					<button on:click=move |_| simulating.update(|s| *s = !*s)>
						{move || if simulating.get() { "Pause Traffic" } else { "Simulate Traffic" }}
					</button>
					<button on:click=move |_| linking.update(|l| *l = !*l)>
						{move || if linking.get() { "Exit Link Mode" } else { "Link Mode" }}
					</button>
					{move || {
						selected
							.get()
							.map(|node| {
								view! {
									<div class="node-details">
										<h2>{node.label.clone()}</h2>
										<p>{node.layer().label()} " / " {node.node_type.name()}</p>
										<p>{node.description.clone()}</p>
										<p>{node.technologies.join(", ")}</p>
									</div>
								}
							})
					}}
				</div>
			</div>
		</ErrorBoundary>
	}
}

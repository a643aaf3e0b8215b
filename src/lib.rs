//! network-graph: Interactive force-directed network diagram for dashboards.
//!
//! This crate provides a WASM-based visualization that turns a flat table of
//! rows into a node-link diagram with data-driven encodings, physics-based
//! layout, pan/zoom, dragging and hover tooltips. The host dashboard feeds it
//! through [`deliver`]; [`start`] waits for the first delivery and mounts.

use std::cell::RefCell;

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlScriptElement, Window};

pub mod components;
pub mod host;

pub use components::force_graph::{
	FieldMap, ForceGraphState, GraphData, GraphError, GraphInput, NetworkGraphCanvas, Row,
	StyleConfig, build, make_scales,
};
pub use host::{HostPayload, HostReady, readiness};

thread_local! {
	static HOST_READY: RefCell<Option<HostReady>> = const { RefCell::new(None) };
	static GRAPH_INPUT: RefCell<Option<RwSignal<GraphInput>>> = const { RefCell::new(None) };
	/// Latest delivery that arrived before the app mounted.
	static PENDING: RefCell<Option<GraphInput>> = const { RefCell::new(None) };
}

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("network-graph: logging initialized");
}

/// Payload embedded in a script element with id="graph-data", if any.
fn embedded_payload() -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("graph-data")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Accepts a JSON payload from the host.
///
/// Before the app has mounted this resolves readiness; afterwards it replaces
/// the graph input, which rebuilds the graph and restarts the layout.
#[wasm_bindgen]
pub fn deliver(json: &str) {
	let mounted = GRAPH_INPUT.with(|slot| *slot.borrow());
	let previous = mounted
		.map(|signal| signal.with_untracked(|input| input.fields.clone()))
		.unwrap_or_default();
	let input = host::input_from_json(json, &previous);

	match mounted {
		Some(signal) => signal.set(input),
		None => {
			PENDING.with(|slot| *slot.borrow_mut() = Some(input.clone()));
			HOST_READY.with(|slot| {
				if let Some(ready) = slot.borrow_mut().as_mut() {
					ready.resolve(input);
				}
			});
		}
	}
}

/// Waits for the host's first delivery, then mounts the app.
#[wasm_bindgen]
pub fn start() {
	let (mut ready, first) = readiness();
	if let Some(pending) = PENDING.with(|slot| slot.borrow().clone()) {
		ready.resolve(pending);
	}
	HOST_READY.with(|slot| *slot.borrow_mut() = Some(ready));

	if let Some(json) = embedded_payload() {
		deliver(&json);
	}

	leptos::task::spawn_local(async move {
		let Some(first) = first.await else {
			warn!("network-graph: host went away before delivering data");
			return;
		};
		let initial = PENDING.with(|slot| slot.borrow_mut().take()).unwrap_or(first);
		let data = RwSignal::new(initial);
		GRAPH_INPUT.with(|slot| *slot.borrow_mut() = Some(data));
		mount_to_body(move || view! { <App data=data /> });
	});
}

/// Main application component.
/// Renders the network diagram full-screen from the host's graph input.
#[component]
pub fn App(data: RwSignal<GraphInput>) -> impl IntoView {
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Network Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<NetworkGraphCanvas data=data fullscreen=true />
		</div>
	}
}

//! Leptos component wrapping the network graph canvas.
//!
//! The component creates an HTML canvas element and wires up mouse/wheel event
//! handlers for node dragging, panning, zooming and hovering. Every change of
//! the `data` signal is a full refresh: the graph, its encodings and its
//! simulation are rebuilt and the previous simulation is dropped. One
//! `requestAnimationFrame` loop steps whichever simulation is current and
//! redraws when something changed.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::error::Placeholder;
use super::render;
use super::state::ForceGraphState;
use super::theme::Theme;
use super::types::GraphInput;

/// What the canvas currently shows.
enum Scene {
	Graph(Box<ForceGraphState>),
	Placeholder(Placeholder),
}

impl Scene {
	fn build(input: &GraphInput, width: f64, height: f64) -> Self {
		match ForceGraphState::from_rows(&input.rows, &input.fields, &input.style, width, height) {
			Ok(state) => Self::Graph(Box::new(state)),
			Err(err) => {
				info!("network-graph: showing placeholder: {err}");
				Self::Placeholder(Placeholder::from(&err))
			}
		}
	}
}

/// Bundles the current scene with the frame it is drawn into.
struct GraphContext {
	scene: Scene,
	theme: Theme,
	width: f64,
	height: f64,
	/// Redraw on the next frame even if the layout did not step.
	dirty: bool,
	refreshes: u64,
}

impl GraphContext {
	fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		if let Scene::Graph(state) = &mut self.scene {
			state.resize(width, height);
		}
		self.dirty = true;
	}
}

type SharedContext = Rc<RefCell<Option<GraphContext>>>;

/// Runs `f` against the live interaction state, if a graph is shown.
fn with_state(context: &SharedContext, f: impl FnOnce(&mut ForceGraphState)) {
	if let Some(c) = context.borrow_mut().as_mut() {
		if let Scene::Graph(state) = &mut c.scene {
			f(state);
			c.dirty = true;
		}
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0),
		window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0),
	)
}

/// Pointer position relative to the canvas' top-left corner.
fn pointer_position(canvas: Option<HtmlCanvasElement>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let rect = canvas?.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Renders an interactive network diagram on a canvas element.
///
/// Pass rows, field mapping and style via the reactive `data` signal. The
/// component sizes itself to its parent container by default; set
/// `fullscreen = true` to fill the viewport and resize automatically with the
/// window. Explicit `width`/`height` override automatic sizing.
#[component]
pub fn NetworkGraphCanvas(
	#[prop(into)] data: Signal<GraphInput>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: SharedContext = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let input = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let scene = Scene::build(&input, w, h);
		{
			let mut slot = context_init.borrow_mut();
			match slot.as_mut() {
				Some(c) => {
					c.refreshes += 1;
					info!(
						"network-graph: refresh {} replaces the previous simulation",
						c.refreshes
					);
					c.scene = scene;
					c.width = w;
					c.height = h;
					c.dirty = true;
				}
				None => {
					*slot = Some(GraphContext {
						scene,
						theme: Theme::default(),
						width: w,
						height: h,
						dirty: true,
						refreshes: 0,
					});
				}
			}
		}

		if fullscreen && resize_cb_init.borrow().is_none() {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(c) = context_resize.borrow_mut().as_mut() {
					c.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		// The frame loop outlives refreshes; it always draws the current scene.
		if animate_init.borrow().is_some() {
			return;
		}
		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into().ok())
		{
			Some(ctx) => ctx,
			None => {
				warn!("network-graph: canvas has no 2d context");
				return;
			}
		};

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(c) = context_anim.borrow_mut().as_mut() {
				let stepped = match &mut c.scene {
					Scene::Graph(state) => state.tick(),
					Scene::Placeholder(_) => false,
				};
				if stepped || c.dirty {
					match &c.scene {
						Scene::Graph(state) => render::render(state, &ctx, &c.theme),
						Scene::Placeholder(placeholder) => {
							render::render_placeholder(&ctx, &c.theme, placeholder, c.width, c.height)
						}
					}
					c.dirty = false;
				}
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = pointer_position(canvas_ref.get(), &ev) {
			with_state(&context_md, |state| state.pointer_down(x, y));
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = pointer_position(canvas_ref.get(), &ev) {
			with_state(&context_mm, |state| state.pointer_move(x, y));
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		with_state(&context_mu, ForceGraphState::pointer_up);
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		with_state(&context_ml, ForceGraphState::pointer_leave);
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = pointer_position(canvas_ref.get(), &ev) {
			let delta = ev.delta_y();
			with_state(&context_wh, |state| state.wheel(x, y, delta));
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="network-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

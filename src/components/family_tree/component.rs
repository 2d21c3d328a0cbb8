use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, MouseEvent, WheelEvent, Window};

use super::handle::{TreeHandle, now};
use super::layout::{LayoutConfig, LayoutMode};
use super::render;
use super::scale::SurfaceScale;
use super::state::{CLICK_SLOP, FamilyTreeState};
use super::types::{FamilyData, Individual};
use super::viewport::ViewportConfig;

/// CSS size of the surface and the device pixel ratio it is drawn at.
fn measure(canvas: &HtmlCanvasElement, fullscreen: bool, width: Option<f64>, height: Option<f64>) -> SurfaceScale {
	let window = web_sys::window();
	let ratio = window.as_ref().map_or(1.0, Window::device_pixel_ratio);
	let inner = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64());

	let (w, h) = if fullscreen {
		let w = window.as_ref().and_then(|w| inner(w.inner_width()));
		let h = window.as_ref().and_then(|w| inner(w.inner_height()));
		(w.unwrap_or(800.0), h.unwrap_or(600.0))
	} else {
		let parent = canvas.parent_element();
		(
			width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64)),
			height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64)),
		)
	};
	SurfaceScale::new(w, h, ratio)
}

/// Sizes the backing store and the CSS box of the canvas.
fn apply_surface(canvas: &HtmlCanvasElement, surface: SurfaceScale) {
	let (bw, bh) = surface.backing_size();
	canvas.set_width(bw);
	canvas.set_height(bh);
	let (width, height) = css_size(surface);
	// leptos' ElementExt::style shadows the DOM getter
	let style = HtmlElement::style(canvas);
	let _ = style.set_property("width", &width);
	let _ = style.set_property("height", &height);
}

fn css_size(surface: SurfaceScale) -> (String, String) {
	(format!("{}px", surface.css_width), format!("{}px", surface.css_height))
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

#[component]
pub fn FamilyTreeCanvas(
	#[prop(into)] data: Signal<FamilyData>,
	#[prop(into)] mode: Signal<LayoutMode>,
	#[prop(optional)] handle: TreeHandle,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional)] layout_config: LayoutConfig,
	#[prop(optional)] viewport_config: ViewportConfig,
	#[prop(optional, into)] on_select: Option<Callback<Individual>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state = handle.shared();
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_pending = Rc::new(Cell::new(false));
	let started = Rc::new(Cell::new(false));

	// Builds (or rebuilds) the state whenever the data changes.
	let (state_init, animate_init, resize_cb_init) = (state.clone(), animate.clone(), resize_cb.clone());
	Effect::new(move |_| {
		let data = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let surface = measure(&canvas, fullscreen, width, height);
		apply_surface(&canvas, surface);

		let mode = state_init
			.borrow()
			.as_ref()
			.map_or_else(|| mode.get_untracked(), FamilyTreeState::mode);
		let fresh = FamilyTreeState::new(&data, mode, layout_config.clone(), viewport_config.clone(), surface);
		*state_init.borrow_mut() = Some(fresh);
		info!("Family tree ready: {} individuals", data.individuals.len());

		if started.replace(true) {
			return;
		}

		let Some(window) = web_sys::window() else {
			warn!("No window; family tree will not animate");
			return;
		};
		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>().ok(),
			_ => None,
		};
		let Some(ctx) = ctx else {
			warn!("Canvas 2d context unavailable");
			return;
		};

		let pending = resize_pending.clone();
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || pending.set(true)));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner, pending) = (state_init.clone(), animate_init.clone(), resize_pending.clone());
		let last_frame = Cell::new(None::<f64>);
		*animate_init.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			let dt = last_frame
				.replace(Some(timestamp))
				.map_or(0.016, |prev| ((timestamp - prev) / 1000.0).clamp(0.0, 0.1));
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if pending.replace(false) {
					let surface = measure(&canvas, fullscreen, width, height);
					debug!("Resizing canvas to {}x{}", surface.css_width, surface.css_height);
					apply_surface(&canvas, surface);
					s.resize(surface, timestamp);
				}
				s.tick(dt, timestamp);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_mode = state.clone();
	Effect::new(move |_| {
		let mode = mode.get();
		if let Some(ref mut s) = *state_mode.borrow_mut() {
			if s.mode() != mode {
				s.set_mode(mode, now());
			}
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pan.active = true;
			s.pan.moved = false;
			s.pan.start_x = x;
			s.pan.start_y = y;
			s.pan.last_x = x;
			s.pan.last_y = y;
			s.pan.press_node = s.node_at_position(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if !s.pan.active {
				let hovered = s.node_at_position(x, y);
				s.set_hover(hovered);
				return;
			}
			if !s.pan.moved && (x - s.pan.start_x).hypot(y - s.pan.start_y) > CLICK_SLOP {
				s.pan.moved = true;
			}
			if s.pan.moved {
				s.viewport.pan_by(x - s.pan.last_x, y - s.pan.last_y);
				s.pan.last_x = x;
				s.pan.last_y = y;
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let position = pointer(canvas_ref, &ev);
		let selected = {
			let mut guard = state_mu.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			let clicked = s.pan.active && !s.pan.moved;
			let pressed = s.pan.press_node;
			s.pan.active = false;
			s.pan.moved = false;
			s.pan.press_node = None;

			match (clicked, pressed, position) {
				(true, Some(idx), Some((x, y))) if s.node_at_position(x, y) == Some(idx) => {
					let individual = s.individual_at(idx).cloned();
					if let Some(ref person) = individual {
						s.highlight_individual(&person.id, false, now());
					}
					individual
				}
				_ => None,
			}
		};
		// The callback may call back into the handle.
		if let (Some(person), Some(cb)) = (selected, on_select) {
			cb.run(person);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pan.active = false;
			s.pan.moved = false;
			s.pan.press_node = None;
			s.set_hover(None);
		}
	};

	let state_wh = state;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.viewport.zoom_at(factor, x, y);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="family-tree-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

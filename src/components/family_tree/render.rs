use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::layout::{LayoutMode, LayoutNode, Orientation, TreeLink, label_rotation};
use super::state::{COLORS, FamilyTreeState, NODE_RADIUS};
use super::types::{Gender, RelationKind};

const BACKGROUND: &str = "#1a1a2e";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn node_color(node: &LayoutNode) -> &'static str {
	COLORS[node.color_index % COLORS.len()]
}

fn outline_color(gender: Gender) -> &'static str {
	match gender {
		Gender::Male => "#8ec5ff",
		Gender::Female => "#ffb3d1",
		Gender::Unknown => "#d0d0d0",
	}
}

fn relation_color(kind: &RelationKind) -> (u8, u8, u8) {
	match kind {
		RelationKind::Marriage | RelationKind::Union => (255, 196, 90),
		RelationKind::Parent => (120, 220, 160),
		RelationKind::Other(_) => (190, 150, 255),
	}
}

fn set_dash(ctx: &CanvasRenderingContext2d, segments: &[f64]) {
	let array = js_sys::Array::new();
	for segment in segments {
		array.push(&JsValue::from_f64(*segment));
	}
	let _ = ctx.set_line_dash(&array);
}

pub fn render(state: &FamilyTreeState, ctx: &CanvasRenderingContext2d) {
	let (sx, sy) = state.surface.device_scale();
	let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
	ctx.set_fill_style_str(BACKGROUND);
	let (bw, bh) = state.surface.backing_size();
	ctx.fill_rect(0.0, 0.0, bw as f64, bh as f64);

	// CSS pixels from here on
	let _ = ctx.set_transform(sx, 0.0, 0.0, sy, 0.0, 0.0);
	let transform = state.transform();
	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

/// Traces the curve between two link ends for the current projection.
fn trace_link(ctx: &CanvasRenderingContext2d, mode: LayoutMode, link: &TreeLink) {
	let (s, t) = (&link.source, &link.target);
	ctx.begin_path();
	ctx.move_to(s.x, s.y);
	match (mode, s.polar, t.polar) {
		(LayoutMode::Fan, Some(ps), Some(pt)) => {
			// Leave the parent radially, arrive at the child radially.
			let mid = (ps.radius + pt.radius) / 2.0;
			let c1 = (mid * ps.angle.sin(), -mid * ps.angle.cos());
			let c2 = (mid * pt.angle.sin(), -mid * pt.angle.cos());
			ctx.bezier_curve_to(c1.0, c1.1, c2.0, c2.1, t.x, t.y);
		}
		(LayoutMode::Hierarchical(Orientation::Horizontal), ..) => {
			let mid = (s.x + t.x) / 2.0;
			ctx.bezier_curve_to(mid, s.y, mid, t.y, t.x, t.y);
		}
		_ => {
			let mid = (s.y + t.y) / 2.0;
			ctx.bezier_curve_to(s.x, mid, t.x, mid, t.x, t.y);
		}
	}
}

fn draw_links(state: &FamilyTreeState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform().k;
	let mode = state.mode();
	let t = ease_out_cubic(state.hover.highlight_t);
	let lit = |link: &TreeLink| {
		let index = |id: &str| state.layout.node_by_id.get(id).copied();
		match (index(&link.source.id), index(&link.target.id)) {
			(Some(a), Some(b)) => state.is_highlighted(a) && state.is_highlighted(b),
			_ => false,
		}
	};

	// Fade towards the highlighted family, never below a readable floor.
	let alpha_for = |base: f64, highlighted: bool| {
		if highlighted { base + (1.0 - base) * 0.6 * t } else { base * (1.0 - 0.75 * t) }
	};

	let _ = ctx.set_line_dash(&js_sys::Array::new());
	for link in &state.layout.hierarchical_links {
		let highlighted = lit(link);
		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {})", alpha_for(0.55, highlighted)));
		ctx.set_line_width(if highlighted { 2.2 / k } else { 1.5 / k });
		trace_link(ctx, mode, link);
		ctx.stroke();
	}

	set_dash(ctx, &[6.0 / k, 4.0 / k]);
	for link in &state.layout.relationship_links {
		let (r, g, b) = relation_color(&link.kind);
		let highlighted = lit(link);
		ctx.set_stroke_style_str(&format!("rgba({r}, {g}, {b}, {})", alpha_for(0.7, highlighted)));
		ctx.set_line_width(1.2 / k);
		ctx.begin_path();
		ctx.move_to(link.source.x, link.source.y);
		ctx.line_to(link.target.x, link.target.y);
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &FamilyTreeState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform().k,
	);
	let selected = state.selected_index();

	// Dimmed pass first so highlighted nodes paint on top.
	for (idx, node) in state.layout.nodes.iter().enumerate() {
		if has_highlight && state.is_highlighted(idx) {
			continue;
		}
		let alpha = if has_highlight { 1.0 - 0.7 * t } else { 1.0 };
		let radius = NODE_RADIUS * if has_highlight { 1.0 - 0.15 * t } else { 1.0 };
		if selected == Some(idx) {
			draw_glow(ctx, node.x, node.y, radius, NODE_RADIUS * 2.6, 0.45);
		}
		ctx.set_global_alpha(alpha);
		draw_disc(ctx, node, radius, k);
		ctx.set_global_alpha(1.0);
		draw_label(state, ctx, node, radius, alpha * 0.85, k);
	}

	if !has_highlight {
		return;
	}

	for (idx, node) in state.layout.nodes.iter().enumerate() {
		if !state.is_highlighted(idx) {
			continue;
		}
		let is_hovered = state.is_hovered(idx);
		let (radius, glow_radius) = if is_hovered {
			(NODE_RADIUS * (1.0 + 0.35 * t), NODE_RADIUS * (1.8 + 1.2 * t))
		} else {
			(NODE_RADIUS * (1.0 + 0.2 * t), NODE_RADIUS * (1.4 + 0.6 * t))
		};

		if selected == Some(idx) {
			draw_glow(ctx, node.x, node.y, radius, NODE_RADIUS * 2.6, 0.45);
		} else if t > 0.01 {
			draw_glow(ctx, node.x, node.y, radius, glow_radius, if is_hovered { 0.35 * t } else { 0.2 * t });
		}
		draw_disc(ctx, node, radius, k);

		if is_hovered && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, radius + 3.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}
		draw_label(state, ctx, node, radius, 1.0, k);
	}
}

fn draw_disc(ctx: &CanvasRenderingContext2d, node: &LayoutNode, radius: f64, k: f64) {
	ctx.begin_path();
	let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(node_color(node));
	ctx.fill();
	ctx.set_stroke_style_str(outline_color(node.individual.gender));
	ctx.set_line_width(2.0 / k.max(0.5));
	ctx.stroke();
}

fn draw_glow(ctx: &CanvasRenderingContext2d, x: f64, y: f64, inner: f64, outer: f64, alpha: f64) {
	let Ok(gradient) = ctx.create_radial_gradient(x, y, inner * 0.3, x, y, outer) else {
		return;
	};
	let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {alpha})"));
	let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
	let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
	ctx.begin_path();
	let _ = ctx.arc(x, y, outer, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}

fn draw_label(
	state: &FamilyTreeState,
	ctx: &CanvasRenderingContext2d,
	node: &LayoutNode,
	radius: f64,
	alpha: f64,
	k: f64,
) {
	ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {alpha})"));
	ctx.set_font(&format!("{}px sans-serif", 11.0 / k.max(0.5)));
	let gap = radius + 4.0 / k.max(0.5);

	match (state.mode(), node.polar) {
		(LayoutMode::Fan, Some(polar)) => {
			let (rotation, flipped) = label_rotation(polar);
			ctx.save();
			let _ = ctx.translate(node.x, node.y);
			let _ = ctx.rotate(rotation);
			ctx.set_text_baseline("middle");
			if flipped {
				ctx.set_text_align("right");
				let _ = ctx.fill_text(&node.label, -gap, 0.0);
			} else {
				ctx.set_text_align("left");
				let _ = ctx.fill_text(&node.label, gap, 0.0);
			}
			ctx.restore();
		}
		(LayoutMode::Hierarchical(Orientation::Vertical), _) => {
			ctx.set_text_align("center");
			ctx.set_text_baseline("top");
			let _ = ctx.fill_text(&node.label, node.x, node.y + gap);
		}
		_ => {
			ctx.set_text_align("left");
			ctx.set_text_baseline("middle");
			let _ = ctx.fill_text(&node.label, node.x + gap, node.y);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn easing_hits_both_ends() {
		assert_eq!(ease_out_cubic(0.0), 0.0);
		assert_eq!(ease_out_cubic(1.0), 1.0);
		assert!(ease_out_cubic(0.5) > 0.5);
	}

	#[test]
	fn relation_kinds_get_distinct_colors() {
		assert_eq!(relation_color(&RelationKind::Marriage), relation_color(&RelationKind::Union));
		assert_ne!(relation_color(&RelationKind::Marriage), relation_color(&RelationKind::secondary()));
	}
}

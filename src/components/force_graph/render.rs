//! Canvas rendering for the network graph.
//!
//! Draws one frame from the current simulation output. Passes, in order:
//! 1. Background (screen space)
//! 2. Links, then nodes, then optional labels (scene space)
//! 3. Tooltip (screen space)
//!
//! Rendering only reads state; nothing here feeds back into the layout.

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::error::Placeholder;
use super::scale::ScaleBehavior;
use super::state::{ForceGraphState, HoverTarget, Tooltip};
use super::theme::{Color, Theme};

/// Labels keep a readable screen size while zooming.
const LABEL_SCALE: ScaleBehavior = ScaleBehavior::Clamped {
	min_screen: 8.0,
	max_screen: 16.0,
};

/// Renders the complete graph to the canvas.
pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	draw_background(ctx, theme, state.width, state.height);

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	draw_links(state, ctx);
	draw_nodes(state, ctx, theme);
	if state.style.show_labels {
		draw_labels(state, ctx, theme);
	}

	ctx.restore();

	if let Some(tooltip) = &state.tooltip {
		draw_tooltip(ctx, theme, tooltip, state.width, state.height);
	}
}

/// Renders a message in place of the graph.
pub fn render_placeholder(
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	placeholder: &Placeholder,
	width: f64,
	height: f64,
) {
	draw_background(ctx, theme, width, height);
	let (cx, cy) = (width / 2.0, height / 2.0);

	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_font(&theme.font(16.0));
	ctx.set_fill_style_str(&theme.placeholder_title.to_css());
	let _ = ctx.fill_text(placeholder.title, cx, cy - 12.0);
	ctx.set_font(&theme.font(12.0));
	ctx.set_fill_style_str(&theme.placeholder_text.to_css());
	let _ = ctx.fill_text(&placeholder.message, cx, cy + 12.0);
	ctx.set_text_align("start");
	ctx.set_text_baseline("alphabetic");
}

fn draw_background(ctx: &CanvasRenderingContext2d, theme: &Theme, width: f64, height: f64) {
	ctx.set_fill_style_str(&theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, width, height);
}

fn draw_links(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let opacity = state.style.link_opacity;
	ctx.set_line_cap("round");

	for (edge, source, target) in state.simulation.frame().links() {
		let stroke = state.encodings.link_stroke(edge);
		match Color::parse(stroke) {
			Some(color) => ctx.set_stroke_style_str(&color.with_alpha(color.a * opacity).to_css()),
			None => {
				ctx.set_global_alpha(opacity);
				ctx.set_stroke_style_str(stroke);
			}
		}
		ctx.set_line_width(state.encodings.link_stroke_width(edge));

		ctx.begin_path();
		ctx.move_to(source.x, source.y);
		ctx.line_to(target.x, target.y);
		ctx.stroke();
		ctx.set_global_alpha(1.0);
	}
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let k = state.transform.k;
	let stroke_width = ScaleBehavior::Screen.apply(theme.node_stroke_width, k);
	let hovered = match state.hover {
		Some(HoverTarget::Node(idx)) => Some(idx),
		_ => None,
	};

	for (idx, node) in state.simulation.nodes().iter().enumerate() {
		let radius = state.encodings.node_radius(node);

		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(state.encodings.node_fill(node));
		ctx.fill();

		ctx.set_stroke_style_str(&theme.node_stroke.to_css());
		ctx.set_line_width(if hovered == Some(idx) {
			stroke_width * 2.0
		} else {
			stroke_width
		});
		ctx.stroke();
	}
}

fn draw_labels(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let k = state.transform.k;
	let size = LABEL_SCALE.apply(theme.label_size, k);
	let gap = ScaleBehavior::Screen.apply(4.0, k);
	ctx.set_font(&theme.font(size));
	ctx.set_fill_style_str(&theme.label.to_css());
	ctx.set_text_baseline("middle");

	for node in state.simulation.nodes() {
		let radius = state.encodings.node_radius(node);
		let _ = ctx.fill_text(&node.id, node.x + radius + gap, node.y);
	}
	ctx.set_text_baseline("alphabetic");
}

fn draw_tooltip(
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	tooltip: &Tooltip,
	width: f64,
	height: f64,
) {
	if tooltip.lines.is_empty() {
		return;
	}
	ctx.set_font(&theme.font(theme.tooltip_size));
	let text_width = tooltip
		.lines
		.iter()
		.filter_map(|line| ctx.measure_text(line).ok())
		.map(|m| m.width())
		.fold(0.0, f64::max);
	let pad = theme.tooltip_padding;
	let box_w = text_width + 2.0 * pad;
	let box_h = tooltip.lines.len() as f64 * theme.tooltip_line_height + 2.0 * pad;
	let (x, y) = tooltip.origin(width, height, box_w, box_h);

	ctx.set_fill_style_str(&theme.tooltip_background.to_css());
	ctx.fill_rect(x, y, box_w, box_h);
	ctx.set_stroke_style_str(&theme.tooltip_border.to_css());
	ctx.set_line_width(1.0);
	ctx.stroke_rect(x, y, box_w, box_h);

	ctx.set_fill_style_str(&theme.tooltip_text.to_css());
	ctx.set_text_baseline("top");
	for (i, line) in tooltip.lines.iter().enumerate() {
		let _ = ctx.fill_text(line, x + pad, y + pad + i as f64 * theme.tooltip_line_height);
	}
	ctx.set_text_baseline("alphabetic");
}

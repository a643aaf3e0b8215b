//! Interaction state around one layout simulation.
//!
//! [`ForceGraphState`] bundles the simulation of the current data refresh
//! with the view transform (pan/zoom), the drag and pan gestures in progress,
//! and the hover target with its tooltip. Pointer handlers run synchronously
//! and only ever touch the simulation through its pin/alpha surface, so the
//! next scheduled step sees their effect.

use log::debug;

use super::builder;
use super::config::{InteractionConfig, StyleConfig};
use super::error::Result;
use super::scale::{Encodings, ScaleBehavior, make_scales};
use super::simulation::{ForceConfig, Simulation};
use super::types::{FieldMap, GraphData, Row, ValueSource};

/// Pan and zoom transform applied to the rendered scene.
///
/// `screen = scene * k + (x, y)`. Simulation coordinates are never touched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%).
	pub k: f64,
}

impl ViewTransform {
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	/// Screen point to scene point.
	pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Scene point to screen point.
	pub fn apply(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

/// Tracks an in-progress node drag.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<usize>,
	/// Node position minus the grabbed scene point.
	pub offset_x: f64,
	pub offset_y: f64,
}

/// Tracks an in-progress background pan.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// What the pointer is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverTarget {
	Node(usize),
	Edge(usize),
}

/// Hover overlay: text lines anchored at a screen position.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	pub lines: Vec<String>,
	pub x: f64,
	pub y: f64,
	/// Keep the box inside the canvas when drawing.
	pub clamp: bool,
}

impl Tooltip {
	/// Top-left corner for a `box_w` x `box_h` box on a `width` x `height`
	/// canvas. Unclamped tooltips may run past the edges.
	pub fn origin(&self, width: f64, height: f64, box_w: f64, box_h: f64) -> (f64, f64) {
		if !self.clamp {
			return (self.x, self.y);
		}
		(
			self.x.min(width - box_w).max(0.0),
			self.y.min(height - box_h).max(0.0),
		)
	}
}

/// Renders a number without trailing zeros: `2`, `2.5`, `0.33`.
pub fn format_value(v: f64) -> String {
	if v.fract() == 0.0 && v.abs() < 1e15 {
		format!("{v:.0}")
	} else {
		let s = format!("{v:.2}");
		s.trim_end_matches('0').trim_end_matches('.').to_string()
	}
}

/// Simulation plus everything the pointer can change.
pub struct ForceGraphState {
	pub simulation: Simulation,
	pub encodings: Encodings,
	pub value_source: ValueSource,
	pub style: StyleConfig,
	pub interaction: InteractionConfig,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: Option<HoverTarget>,
	pub tooltip: Option<Tooltip>,
	pub width: f64,
	pub height: f64,
}

impl ForceGraphState {
	/// Builds graph, encodings and simulation for one data refresh.
	pub fn from_rows(
		rows: &[Row],
		fields: &FieldMap,
		style: &StyleConfig,
		width: f64,
		height: f64,
	) -> Result<Self> {
		let graph = builder::build(rows, fields)?;
		Ok(Self::new(graph, style, width, height))
	}

	pub fn new(graph: GraphData, style: &StyleConfig, width: f64, height: f64) -> Self {
		let encodings = make_scales(&graph.nodes, &graph.edges, style);
		let simulation = Simulation::new(
			graph.nodes,
			graph.edges,
			ForceConfig::from_style(style, width, height),
		);
		Self {
			simulation,
			encodings,
			value_source: graph.value_source,
			style: style.clone(),
			interaction: InteractionConfig::from_style(style),
			transform: ViewTransform::IDENTITY,
			drag: DragState::default(),
			pan: PanState::default(),
			hover: None,
			tooltip: None,
			width,
			height,
		}
	}

	/// Advances the layout by one step if it is still running.
	pub fn tick(&mut self) -> bool {
		self.simulation.tick()
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.simulation.set_center(width / 2.0, height / 2.0);
		let alpha = self.simulation.alpha().max(0.1);
		self.simulation.set_alpha(alpha);
		self.simulation.restart();
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.transform.invert(sx, sy)
	}

	/// Topmost node under a screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let pad = ScaleBehavior::Screen.apply(self.interaction.hit_pad, self.transform.k);
		self.simulation
			.nodes()
			.iter()
			.enumerate()
			.rev()
			.find(|(_, node)| {
				let r = self.encodings.node_radius(node) + pad;
				(node.x - gx).powi(2) + (node.y - gy).powi(2) <= r * r
			})
			.map(|(i, _)| i)
	}

	/// Closest edge whose stroke lies under a screen point.
	pub fn edge_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let min_reach =
			ScaleBehavior::Screen.apply(self.interaction.edge_hit_width, self.transform.k);
		self.simulation
			.frame()
			.links()
			.enumerate()
			.filter_map(|(i, (edge, s, t))| {
				let reach = (self.encodings.link_stroke_width(edge) / 2.0).max(min_reach);
				let d = segment_distance((gx, gy), (s.x, s.y), (t.x, t.y));
				(d <= reach).then_some((i, d))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(i, _)| i)
	}

	/// Nodes win over edges.
	pub fn hit_test(&self, sx: f64, sy: f64) -> Option<HoverTarget> {
		self.node_at_position(sx, sy)
			.map(HoverTarget::Node)
			.or_else(|| self.edge_at_position(sx, sy).map(HoverTarget::Edge))
	}

	/// Pointer pressed: drag a node if one is hit, otherwise pan.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		match self.node_at_position(sx, sy) {
			Some(idx) => self.drag_start(idx, sx, sy),
			None => {
				self.pan = PanState {
					active: true,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
				};
			}
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if self.drag.node.is_some() {
			self.drag_move(sx, sy);
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
		let hovered = match self.drag.node {
			Some(idx) => Some(HoverTarget::Node(idx)),
			None => self.hit_test(sx, sy),
		};
		self.set_hover(hovered, sx, sy);
	}

	pub fn pointer_up(&mut self) {
		self.drag_end();
		self.pan.active = false;
	}

	pub fn pointer_leave(&mut self) {
		self.pointer_up();
		self.set_hover(None, 0.0, 0.0);
	}

	/// Wheel notch at a screen point; negative `delta_y` zooms in.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let step = self.interaction.zoom_step;
		let factor = if delta_y > 0.0 { 1.0 / step } else { step };
		self.zoom_at(sx, sy, factor);
	}

	/// Scales the view by `factor`, keeping the screen point fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let (min_k, max_k) = self.interaction.zoom_extent;
		let new_k = (self.transform.k * factor).clamp(min_k, max_k);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Pins the node where it is and keeps the simulation warm.
	pub fn drag_start(&mut self, idx: usize, sx: f64, sy: f64) {
		let Some(node) = self.simulation.node(idx) else {
			return;
		};
		let (x, y) = (node.x, node.y);
		debug!("network-graph: drag start on {}", node.id);
		let (gx, gy) = self.transform.invert(sx, sy);
		self.drag = DragState {
			node: Some(idx),
			offset_x: x - gx,
			offset_y: y - gy,
		};
		self.pan.active = false;
		self.simulation.pin(idx, x, y);
		let target = self.simulation.config().drag_alpha_target;
		self.simulation.set_alpha_target(target);
		self.simulation.restart();
	}

	/// Pins the node under the pointer, read through the current transform.
	pub fn drag_move(&mut self, sx: f64, sy: f64) {
		let Some(idx) = self.drag.node else {
			return;
		};
		let (gx, gy) = self.transform.invert(sx, sy);
		let (fx, fy) = (gx + self.drag.offset_x, gy + self.drag.offset_y);
		self.simulation.pin(idx, fx, fy);
	}

	/// Frees the node and lets alpha decay again.
	pub fn drag_end(&mut self) {
		if let Some(idx) = self.drag.node.take() {
			self.simulation.release(idx);
			self.simulation.set_alpha_target(0.0);
		}
	}

	/// Updates the hover target and its tooltip. Pure read of the data.
	pub fn set_hover(&mut self, target: Option<HoverTarget>, sx: f64, sy: f64) {
		self.hover = target;
		self.tooltip = target.and_then(|t| {
			let lines = self.tooltip_lines(t)?;
			let (ox, oy) = self.interaction.tooltip_offset;
			Some(Tooltip {
				lines,
				x: sx + ox,
				y: sy + oy,
				clamp: self.interaction.clamp_tooltip,
			})
		});
	}

	fn tooltip_lines(&self, target: HoverTarget) -> Option<Vec<String>> {
		match target {
			HoverTarget::Node(idx) => {
				let node = self.simulation.node(idx)?;
				let mut lines = vec![node.id.clone()];
				if let Some(group) = &node.group {
					lines.push(format!("Group: {group}"));
				}
				lines.push(match self.value_source {
					ValueSource::Metric => format!("Value: {}", format_value(node.value)),
					ValueSource::Degree => format!("Degree: {}", node.degree),
				});
				Some(lines)
			}
			HoverTarget::Edge(idx) => {
				let edge = self.simulation.edges().get(idx)?;
				let mut lines = vec![
					format!("{} \u{21c4} {}", edge.source, edge.target),
					format!("Weight: {}", format_value(edge.weight)),
				];
				if let Some(group) = &edge.link_group {
					lines.push(format!("Group: {group}"));
				}
				Some(lines)
			}
		}
	}
}

/// Distance from `p` to the segment `a`-`b`.
fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 == 0.0 {
		0.0
	} else {
		(((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
	((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

//! Visual encodings derived from data extents.
//!
//! [`make_scales`] runs once per data refresh and produces four pure mapping
//! functions: node color, link color, node size and link width. The renderer
//! and the tooltip only ever read them.
//!
//! # Degenerate domains
//!
//! When every observed value of an attribute is equal (including "no values"
//! and "all zero"), the domain is widened to `[0, v]`, or `[0, 1]` when `v` is
//! zero, so that it never collapses to a point. Every element of such a
//! dataset is drawn at the configured minimum.
//!
//! # Zoom
//!
//! Encoded sizes are in world units and grow with zoom. [`ScaleBehavior`]
//! covers the few screen-space quantities (hit slop, outlines, labels) that
//! must not.

use indexmap::IndexMap;

use super::config::StyleConfig;
use super::types::{Edge, Node};

/// Shape of a continuous mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curve {
	Linear,
	/// Square-root mapping: output area grows linearly with the input.
	Sqrt,
}

impl Curve {
	fn transform(self, v: f64) -> f64 {
		match self {
			Curve::Linear => v,
			Curve::Sqrt => v.signum() * v.abs().sqrt(),
		}
	}
}

/// Monotonic map from a numeric domain onto a pixel range, clamped to it.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuousScale {
	domain: (f64, f64),
	range: (f64, f64),
	curve: Curve,
	degenerate: bool,
}

impl ContinuousScale {
	/// Builds a scale from the extent of `values`.
	pub fn from_values<I>(values: I, range: (f64, f64), curve: Curve) -> Self
	where
		I: IntoIterator<Item = f64>,
	{
		let (lo, hi) = values
			.into_iter()
			.filter(|v| v.is_finite())
			.fold(None, |acc: Option<(f64, f64)>, v| match acc {
				Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
				None => Some((v, v)),
			})
			.unwrap_or((0.0, 0.0));
		Self::new((lo, hi), range, curve)
	}

	/// Builds a scale over an explicit domain, widening it if degenerate.
	pub fn new(domain: (f64, f64), range: (f64, f64), curve: Curve) -> Self {
		let degenerate = domain.0 == domain.1;
		let domain = if degenerate {
			(0.0, if domain.1 == 0.0 { 1.0 } else { domain.1 })
		} else {
			domain
		};
		Self {
			domain,
			range,
			curve,
			degenerate,
		}
	}

	pub fn domain(&self) -> (f64, f64) {
		self.domain
	}

	/// Whether the observed extent was a single value.
	pub fn is_degenerate(&self) -> bool {
		self.degenerate
	}

	pub fn apply(&self, value: f64) -> f64 {
		let (r0, r1) = self.range;
		if self.degenerate || !value.is_finite() {
			return r0;
		}
		let d0 = self.curve.transform(self.domain.0);
		let d1 = self.curve.transform(self.domain.1);
		let t = ((self.curve.transform(value) - d0) / (d1 - d0)).clamp(0.0, 1.0);
		r0 + t * (r1 - r0)
	}
}

/// Categorical color mapping, or one constant color when there are no
/// categories.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorScale {
	Constant(String),
	Categorical {
		/// Label to color, in order of first appearance.
		colors: IndexMap<String, String>,
		/// Color for elements without a label.
		fallback: String,
	},
}

impl ColorScale {
	/// Assigns palette colors to distinct labels in order of first appearance.
	pub fn from_labels<'a, I>(labels: I, palette: &[String], fallback: &str) -> Self
	where
		I: IntoIterator<Item = Option<&'a str>>,
	{
		let mut colors: IndexMap<String, String> = IndexMap::new();
		for label in labels.into_iter().flatten() {
			if colors.contains_key(label) {
				continue;
			}
			let color = if palette.is_empty() {
				fallback.to_string()
			} else {
				palette[colors.len() % palette.len()].clone()
			};
			colors.insert(label.to_string(), color);
		}
		if colors.is_empty() {
			Self::Constant(fallback.to_string())
		} else {
			Self::Categorical {
				colors,
				fallback: fallback.to_string(),
			}
		}
	}

	pub fn color(&self, label: Option<&str>) -> &str {
		match self {
			Self::Constant(color) => color,
			Self::Categorical { colors, fallback } => label
				.and_then(|l| colors.get(l))
				.map_or(fallback.as_str(), String::as_str),
		}
	}

	pub fn is_categorical(&self) -> bool {
		matches!(self, Self::Categorical { .. })
	}
}

/// All visual encodings for one data refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct Encodings {
	pub node_color: ColorScale,
	pub link_color: ColorScale,
	/// Node `value` to radius.
	pub node_size: ContinuousScale,
	/// Edge `weight` to stroke width.
	pub link_width: ContinuousScale,
}

impl Encodings {
	pub fn node_radius(&self, node: &Node) -> f64 {
		self.node_size.apply(node.value)
	}

	pub fn node_fill(&self, node: &Node) -> &str {
		self.node_color.color(node.group.as_deref())
	}

	pub fn link_stroke(&self, edge: &Edge) -> &str {
		self.link_color.color(edge.link_group.as_deref())
	}

	pub fn link_stroke_width(&self, edge: &Edge) -> f64 {
		self.link_width.apply(edge.weight)
	}
}

/// Derives the encodings from the built graph and the style configuration.
pub fn make_scales(nodes: &[Node], edges: &[Edge], style: &StyleConfig) -> Encodings {
	let palette = &style.node_palette.colors;
	Encodings {
		node_color: ColorScale::from_labels(
			nodes.iter().map(|n| n.group.as_deref()),
			palette,
			&style.node_color,
		),
		link_color: ColorScale::from_labels(
			edges.iter().map(|e| e.link_group.as_deref()),
			palette,
			&style.link_color,
		),
		node_size: ContinuousScale::from_values(
			nodes.iter().map(|n| n.value),
			(style.node_size_min, style.node_size_max),
			Curve::Sqrt,
		),
		link_width: ContinuousScale::from_values(
			edges.iter().map(|e| e.weight),
			(style.link_width_min, style.link_width_max),
			Curve::Linear,
		),
	}
}

/// How a screen-space quantity behaves as zoom level `k` changes.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	/// Constant screen size. Divides by `k` to counteract the canvas transform.
	Screen,
	/// World-space size clamped to `(min_screen, max_screen)` pixels.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// World-space value to draw with, after the canvas transform.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const EPS: f64 = 1e-9;

	fn node(id: &str, value: f64, group: Option<&str>) -> Node {
		let mut n = Node::new(id);
		n.value = value;
		n.group = group.map(str::to_string);
		n
	}

	fn edge(weight: f64, group: Option<&str>) -> Edge {
		Edge {
			source: "a".into(),
			target: "b".into(),
			weight,
			link_group: group.map(str::to_string),
		}
	}

	#[test]
	fn linear_scale_maps_extent_onto_range() {
		let scale = ContinuousScale::from_values([2.0, 4.0, 4.0], (1.0, 6.0), Curve::Linear);
		assert_eq!(scale.domain(), (2.0, 4.0));
		assert!((scale.apply(2.0) - 1.0).abs() < EPS);
		assert!((scale.apply(3.0) - 3.5).abs() < EPS);
		assert!((scale.apply(4.0) - 6.0).abs() < EPS);
	}

	#[test]
	fn outputs_stay_inside_the_range() {
		let scale = ContinuousScale::from_values([0.0, 10.0], (4.0, 20.0), Curve::Sqrt);
		for v in [-5.0, 0.0, 0.1, 3.0, 10.0, 1e9, f64::NAN] {
			let out = scale.apply(v);
			assert!((4.0..=20.0).contains(&out), "{v} -> {out}");
		}
	}

	#[test]
	fn degenerate_domains_widen_and_draw_at_minimum() {
		let equal = ContinuousScale::from_values([5.0, 5.0], (2.0, 9.0), Curve::Linear);
		assert!(equal.is_degenerate());
		assert_eq!(equal.domain(), (0.0, 5.0));
		assert_eq!(equal.apply(5.0), 2.0);

		let zeros = ContinuousScale::from_values([0.0, 0.0, 0.0], (3.0, 8.0), Curve::Sqrt);
		assert_eq!(zeros.domain(), (0.0, 1.0));
		assert_eq!(zeros.apply(0.0), 3.0);

		let empty = ContinuousScale::from_values(std::iter::empty(), (1.0, 4.0), Curve::Linear);
		assert_eq!(empty.domain(), (0.0, 1.0));
	}

	#[test]
	fn sqrt_scale_is_area_proportional() {
		let scale = ContinuousScale::from_values([0.0, 100.0], (0.0, 30.0), Curve::Sqrt);
		for v in [5.0, 12.5, 30.0, 50.0] {
			let small = scale.apply(v);
			let large = scale.apply(2.0 * v);
			assert!((large * large - 2.0 * small * small).abs() < 1e-6);
		}
	}

	#[test]
	fn categorical_colors_are_stable_per_label() {
		let palette: Vec<String> = vec!["#a".into(), "#b".into()];
		let scale = ColorScale::from_labels(
			[Some("x"), None, Some("y"), Some("x"), Some("z")],
			&palette,
			"#fallback",
		);
		assert!(scale.is_categorical());
		assert_eq!(scale.color(Some("x")), "#a");
		assert_eq!(scale.color(Some("y")), "#b");
		assert_eq!(scale.color(Some("z")), "#a");
		assert_eq!(scale.color(Some("x")), scale.color(Some("x")));
		assert_eq!(scale.color(None), "#fallback");
		assert_eq!(scale.color(Some("unseen")), "#fallback");
	}

	#[test]
	fn no_labels_means_constant_color() {
		let scale = ColorScale::from_labels([None, None], &["#a".to_string()], "#999999");
		assert_eq!(scale, ColorScale::Constant("#999999".into()));
		assert_eq!(scale.color(Some("anything")), "#999999");
	}

	#[test]
	fn make_scales_reads_style_and_extents() {
		let style = StyleConfig::default();
		let nodes = vec![node("a", 1.0, Some("g1")), node("b", 9.0, None)];
		let edges = vec![edge(2.0, None), edge(4.0, None)];
		let enc = make_scales(&nodes, &edges, &style);

		assert_eq!(enc.node_fill(&nodes[0]), "#1f77b4");
		assert_eq!(enc.node_fill(&nodes[1]), style.node_color);
		assert_eq!(enc.link_stroke(&edges[0]), "#999999");
		assert!(!enc.link_color.is_categorical());
		assert_eq!(enc.node_radius(&nodes[0]), style.node_size_min);
		assert_eq!(enc.node_radius(&nodes[1]), style.node_size_max);
		assert_eq!(enc.link_width.domain(), (2.0, 4.0));
		assert_eq!(enc.link_stroke_width(&edges[1]), style.link_width_max);
	}

	#[test]
	fn screen_behaviors_counter_zoom() {
		assert_eq!(ScaleBehavior::Screen.apply(3.0, 2.0), 1.5);
		let clamped = ScaleBehavior::Clamped {
			min_screen: 8.0,
			max_screen: 16.0,
		};
		assert_eq!(clamped.apply(11.0, 1.0), 11.0);
		assert_eq!(clamped.apply(11.0, 0.5), 16.0);
		assert_eq!(clamped.apply(11.0, 4.0), 4.0);
	}
}

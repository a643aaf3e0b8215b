//! Style and interaction configuration.
//!
//! [`StyleConfig`] is the object the host's control panel produces. Panels
//! are loose about types (sizes may arrive as `"12"`), so every field is read
//! through [`coerce_number`] with the field's default as the fallback.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::builder::coerce_number;
use super::theme::NodePalette;

/// User-configured style parameters for one render.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleConfig {
	/// Node radius range in pixels.
	pub node_size_min: f64,
	pub node_size_max: f64,
	/// Link width range in pixels.
	pub link_width_min: f64,
	pub link_width_max: f64,
	/// Opacity applied to every link, `0.0..=1.0`.
	pub link_opacity: f64,
	/// Target distance of the link force.
	pub link_distance: f64,
	/// Link force strength; `None` keeps the degree-based default.
	pub link_strength: Option<f64>,
	/// Repulsion between nodes. Positive repels, negative attracts.
	pub charge_strength: f64,
	/// Link color used when no link groups exist.
	pub link_color: String,
	/// Node color used when no node groups exist.
	pub node_color: String,
	pub node_palette: NodePalette,
	pub show_labels: bool,
	/// Keep the tooltip inside the canvas.
	pub clamp_tooltip: bool,
}

impl Default for StyleConfig {
	fn default() -> Self {
		Self {
			node_size_min: 4.0,
			node_size_max: 20.0,
			link_width_min: 1.0,
			link_width_max: 6.0,
			link_opacity: 0.6,
			link_distance: 60.0,
			link_strength: None,
			charge_strength: 300.0,
			link_color: "#999999".into(),
			node_color: "#1f77b4".into(),
			node_palette: NodePalette::category10(),
			show_labels: false,
			clamp_tooltip: false,
		}
	}
}

impl StyleConfig {
	/// Reads a style object, keeping defaults for anything absent or unusable.
	pub fn from_value(value: &Value) -> Self {
		let defaults = Self::default();
		let Value::Object(map) = value else {
			return defaults;
		};
		let number = |key: &str, default: f64| coerce_number(map.get(key), default);
		let text = |key: &str, default: &str| match map.get(key) {
			Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
			_ => default.to_string(),
		};
		let flag = |key: &str, default: bool| match map.get(key) {
			Some(Value::Bool(b)) => *b,
			Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
			_ => default,
		};

		Self {
			node_size_min: number("nodeSizeMin", defaults.node_size_min),
			node_size_max: number("nodeSizeMax", defaults.node_size_max),
			link_width_min: number("linkWidthMin", defaults.link_width_min),
			link_width_max: number("linkWidthMax", defaults.link_width_max),
			link_opacity: number("linkOpacity", defaults.link_opacity).clamp(0.0, 1.0),
			link_distance: number("linkDistance", defaults.link_distance),
			link_strength: map
				.get("linkStrength")
				.map(|v| coerce_number(Some(v), f64::NAN))
				.filter(|v| v.is_finite()),
			charge_strength: number("chargeStrength", defaults.charge_strength),
			link_color: text("linkColor", &defaults.link_color),
			node_color: text("nodeColor", &defaults.node_color),
			node_palette: palette(map.get("nodePalette")).unwrap_or(defaults.node_palette),
			show_labels: flag("showLabels", defaults.show_labels),
			clamp_tooltip: flag("clampTooltip", defaults.clamp_tooltip),
		}
	}
}

/// Accepts a list of colors or one comma-separated string.
fn palette(value: Option<&Value>) -> Option<NodePalette> {
	let colors: Vec<String> = match value? {
		Value::Array(items) => items
			.iter()
			.filter_map(Value::as_str)
			.map(|s| s.trim().to_string())
			.collect(),
		Value::String(s) => s.split(',').map(|c| c.trim().to_string()).collect(),
		_ => return None,
	};
	let colors: Vec<String> = colors.into_iter().filter(|c| !c.is_empty()).collect();
	(!colors.is_empty()).then(|| NodePalette::from_css(colors))
}

impl<'de> Deserialize<'de> for StyleConfig {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Value::deserialize(deserializer).map(|v| Self::from_value(&v))
	}
}

/// Pointer interaction tuning. Not exposed to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionConfig {
	/// Zoom factor limits.
	pub zoom_extent: (f64, f64),
	/// Zoom factor applied per wheel notch.
	pub zoom_step: f64,
	/// Tooltip offset from the pointer, in screen pixels.
	pub tooltip_offset: (f64, f64),
	pub clamp_tooltip: bool,
	/// Extra hit radius around nodes, in screen pixels.
	pub hit_pad: f64,
	/// Minimum hit distance from an edge, in screen pixels.
	pub edge_hit_width: f64,
}

impl Default for InteractionConfig {
	fn default() -> Self {
		Self {
			zoom_extent: (0.1, 10.0),
			zoom_step: 1.1,
			tooltip_offset: (12.0, 12.0),
			clamp_tooltip: false,
			hit_pad: 2.0,
			edge_hit_width: 3.0,
		}
	}
}

impl InteractionConfig {
	pub fn from_style(style: &StyleConfig) -> Self {
		Self {
			clamp_tooltip: style.clamp_tooltip,
			..Self::default()
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn missing_style_keeps_defaults() {
		assert_eq!(StyleConfig::from_value(&json!({})), StyleConfig::default());
		assert_eq!(StyleConfig::from_value(&Value::Null), StyleConfig::default());
	}

	#[test]
	fn numbers_may_arrive_as_strings() {
		let style = StyleConfig::from_value(&json!({
			"nodeSizeMin": "2",
			"nodeSizeMax": 30,
			"linkOpacity": "1.7",
			"chargeStrength": "lots",
			"linkStrength": "0.5"
		}));
		assert_eq!(style.node_size_min, 2.0);
		assert_eq!(style.node_size_max, 30.0);
		assert_eq!(style.link_opacity, 1.0);
		assert_eq!(style.charge_strength, 300.0);
		assert_eq!(style.link_strength, Some(0.5));
	}

	#[test]
	fn palette_accepts_list_or_csv() {
		let listed = StyleConfig::from_value(&json!({ "nodePalette": ["#111111", " #222222 "] }));
		assert_eq!(listed.node_palette.colors, ["#111111", "#222222"]);

		let csv = StyleConfig::from_value(&json!({ "nodePalette": "#aaa, #bbb,," }));
		assert_eq!(csv.node_palette.colors, ["#aaa", "#bbb"]);

		let empty = StyleConfig::from_value(&json!({ "nodePalette": [] }));
		assert_eq!(empty.node_palette, NodePalette::category10());
	}

	#[test]
	fn deserializes_through_serde() {
		let style: StyleConfig =
			serde_json::from_str(r##"{"linkColor":"#123456","clampTooltip":"true"}"##).unwrap();
		assert_eq!(style.link_color, "#123456");
		assert!(style.clamp_tooltip);
		assert!(InteractionConfig::from_style(&style).clamp_tooltip);
	}
}

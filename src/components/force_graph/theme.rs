//! Visual theming for the network diagram.
//!
//! Data-driven colors come from the encoding scales; everything here is the
//! static frame around them: background, node outlines, labels, the tooltip
//! box and placeholder text.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Parses `#rgb`, `#rrggbb`, `rgb(...)` and `rgba(...)` notation.
	pub fn parse(css: &str) -> Option<Self> {
		let css = css.trim();
		if let Some(hex) = css.strip_prefix('#') {
			if !hex.is_ascii() {
				return None;
			}
			let channel = |s: &str| u8::from_str_radix(s, 16).ok();
			return match hex.len() {
				6 => Some(Self::rgb(
					channel(&hex[0..2])?,
					channel(&hex[2..4])?,
					channel(&hex[4..6])?,
				)),
				3 => {
					let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
					Some(Self::rgb(short(0)?, short(1)?, short(2)?))
				}
				_ => None,
			};
		}

		let inner = css
			.strip_prefix("rgba(")
			.or_else(|| css.strip_prefix("rgb("))?
			.strip_suffix(')')?;
		let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
		if parts.len() < 3 {
			return None;
		}
		Some(Self::rgba(
			parts[0].parse().ok()?,
			parts[1].parse().ok()?,
			parts[2].parse().ok()?,
			parts.get(3).map_or(Some(1.0), |a| a.parse().ok())?,
		))
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// An ordered color palette for categorical encodings.
#[derive(Clone, Debug, PartialEq)]
pub struct NodePalette {
	pub colors: Vec<String>,
}

impl NodePalette {
	/// The ten-color category palette (default).
	pub fn category10() -> Self {
		Self::from_css([
			"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
			"#7f7f7f", "#bcbd22", "#17becf",
		])
	}

	pub fn from_css<I, S>(colors: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			colors: colors.into_iter().map(Into::into).collect(),
		}
	}
}

impl Default for NodePalette {
	fn default() -> Self {
		Self::category10()
	}
}

/// Frame colors and fonts.
#[derive(Clone, Debug)]
pub struct Theme {
	pub background: Color,
	/// Outline drawn around every node.
	pub node_stroke: Color,
	pub node_stroke_width: f64,
	pub label: Color,
	/// Label size in screen pixels at zoom 1.
	pub label_size: f64,
	pub font_family: &'static str,
	pub tooltip_background: Color,
	pub tooltip_border: Color,
	pub tooltip_text: Color,
	pub tooltip_size: f64,
	/// Line height of tooltip text in pixels.
	pub tooltip_line_height: f64,
	pub tooltip_padding: f64,
	pub placeholder_title: Color,
	pub placeholder_text: Color,
}

impl Theme {
	/// Light dashboard theme (default).
	pub fn light() -> Self {
		Self {
			background: Color::rgb(255, 255, 255),
			node_stroke: Color::rgb(255, 255, 255),
			node_stroke_width: 1.5,
			label: Color::rgb(51, 51, 51),
			label_size: 11.0,
			font_family: "sans-serif",
			tooltip_background: Color::rgba(255, 255, 255, 0.95),
			tooltip_border: Color::rgb(204, 204, 204),
			tooltip_text: Color::rgb(34, 34, 34),
			tooltip_size: 12.0,
			tooltip_line_height: 16.0,
			tooltip_padding: 8.0,
			placeholder_title: Color::rgb(60, 64, 67),
			placeholder_text: Color::rgb(128, 134, 139),
		}
	}

	/// CSS font shorthand for `size` pixels in this theme's family.
	pub fn font(&self, size: f64) -> String {
		format!("{size:.1}px {}", self.font_family)
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::light()
	}
}

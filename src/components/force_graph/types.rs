//! Graph data structures: raw host rows in, node and edge records out.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use super::config::StyleConfig;

/// One record of the host table, keyed by field identifier.
///
/// The host wraps every field value in a single-element array; plain scalars
/// are accepted as well.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Row(pub HashMap<String, Value>);

impl Row {
	/// Builds a row from `(field, value)` pairs.
	pub fn from_pairs<I, K>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
	}

	/// Returns the cell stored under `field`, unwrapping a host array wrapper.
	pub fn cell(&self, field: &str) -> Option<&Value> {
		match self.0.get(field)? {
			Value::Array(items) => items.first(),
			other => Some(other),
		}
	}

	/// Returns the cell under `field` as a categorical label.
	/// Null, missing and blank cells have no label.
	pub fn label(&self, field: &str) -> Option<String> {
		let label = match self.cell(field)? {
			Value::String(s) => s.trim().to_string(),
			Value::Number(n) => n.to_string(),
			Value::Bool(b) => b.to_string(),
			_ => return None,
		};
		(!label.is_empty()).then_some(label)
	}

	/// Returns the cell under `field` as a node key. Unlike [`Row::label`],
	/// the raw string is kept as-is so that distinct raw values stay distinct.
	pub fn key(&self, field: &str) -> Option<String> {
		match self.cell(field)? {
			Value::String(s) => Some(s.clone()),
			Value::Number(n) => Some(n.to_string()),
			Value::Bool(b) => Some(b.to_string()),
			_ => None,
		}
	}
}

/// Which host fields play which role in the graph.
///
/// Only `source` and `target` are required.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldMap {
	pub source: Option<String>,
	pub target: Option<String>,
	/// Categorical node attribute used for node color.
	pub group: Option<String>,
	/// Categorical edge attribute used for link color.
	pub link_group: Option<String>,
	/// Numeric edge attribute used for link width.
	pub edge_weight: Option<String>,
	/// Numeric node attribute summed per endpoint, used for node size.
	pub node_value: Option<String>,
}

impl FieldMap {
	/// Maps source and target only.
	pub fn endpoints(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: Some(source.into()),
			target: Some(target.into()),
			..Self::default()
		}
	}

	pub fn with_group(mut self, field: impl Into<String>) -> Self {
		self.group = Some(field.into());
		self
	}

	pub fn with_link_group(mut self, field: impl Into<String>) -> Self {
		self.link_group = Some(field.into());
		self
	}

	pub fn with_edge_weight(mut self, field: impl Into<String>) -> Self {
		self.edge_weight = Some(field.into());
		self
	}

	pub fn with_node_value(mut self, field: impl Into<String>) -> Self {
		self.node_value = Some(field.into());
		self
	}
}

/// What a node's `value` means for this refresh.
///
/// The tooltip labels the number accordingly, so the two meanings are kept
/// apart rather than folded into one metric name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValueSource {
	/// Sum of the mapped node-value metric over every row touching the node.
	Metric,
	/// No metric mapped; `value` is the node's degree.
	#[default]
	Degree,
}

/// A node in the graph, keyed by a deduplicated source/target value.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Raw source/target value; unique across the graph.
	pub id: String,
	/// Optional category used for node color.
	pub group: Option<String>,
	/// Size attribute; see [`ValueSource`].
	pub value: f64,
	/// Count of edge endpoints touching this node.
	pub degree: u32,
	/// Position, written only by the layout simulation.
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Fixed-position override set by a drag interaction.
	pub fx: Option<f64>,
	pub fy: Option<f64>,
}

impl Node {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			group: None,
			value: 0.0,
			degree: 0,
			x: f64::NAN,
			y: f64::NAN,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
		}
	}

	/// Whether a drag currently pins this node.
	pub fn is_fixed(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// A connection between two node keys. Direction is kept for display only.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub source: String,
	pub target: String,
	/// Width attribute; 1 when no weight metric is mapped.
	pub weight: f64,
	/// Optional category used for link color.
	pub link_group: Option<String>,
}

/// Output of the graph builder for one data refresh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
	pub value_source: ValueSource,
}

impl GraphData {
	/// Looks up a node by key.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}
}

/// Everything one data refresh draws from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphInput {
	pub rows: Vec<Row>,
	pub fields: FieldMap,
	pub style: StyleConfig,
}

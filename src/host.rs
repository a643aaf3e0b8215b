//! Host adapter.
//!
//! The embedding dashboard delivers JSON payloads: a field configuration
//! partitioned into dimensions and metrics, the table rows, and the style
//! object from its control panel. The first payload resolves the readiness
//! future the app waits on before mounting; every later one replaces the
//! graph input and triggers a full refresh.

use std::future::Future;

use futures::FutureExt;
use futures::channel::oneshot;
use log::{info, warn};
use serde::Deserialize;

use crate::components::force_graph::{FieldMap, GraphInput, Row, StyleConfig};

/// Dimension and metric slots beyond the named ones.
pub const MAX_EXTRA_FIELDS: usize = 5;

/// A payload the host sent that cannot be read.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
	#[error("malformed host payload: {0}")]
	Malformed(#[from] serde_json::Error),
}

/// Categorical field slots.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Dimensions {
	pub source: Option<String>,
	pub target: Option<String>,
	pub group: Option<String>,
	/// Further dimensions; the first one colors links.
	pub extra: Vec<String>,
}

/// Numeric field slots.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Metrics {
	pub weight: Option<String>,
	pub node_value: Option<String>,
	pub extra: Vec<String>,
}

/// Field configuration as the host partitions it.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostFields {
	pub dimensions: Dimensions,
	pub metrics: Metrics,
}

impl HostFields {
	/// Role assignment for the graph builder. Blank ids count as unmapped.
	pub fn field_map(&self) -> FieldMap {
		let pick = |id: &Option<String>| {
			id.as_deref()
				.map(str::trim)
				.filter(|s| !s.is_empty())
				.map(str::to_string)
		};
		let extras = self.dimensions.extra.len().max(self.metrics.extra.len());
		if extras > MAX_EXTRA_FIELDS {
			warn!("network-graph: ignoring fields past the first {MAX_EXTRA_FIELDS} extra slots");
		}
		FieldMap {
			source: pick(&self.dimensions.source),
			target: pick(&self.dimensions.target),
			group: pick(&self.dimensions.group),
			link_group: pick(&self.dimensions.extra.first().cloned()),
			edge_weight: pick(&self.metrics.weight),
			node_value: pick(&self.metrics.node_value),
		}
	}
}

/// One delivery from the host.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostPayload {
	pub fields: HostFields,
	pub rows: Vec<Row>,
	pub style: StyleConfig,
}

impl HostPayload {
	pub fn parse(json: &str) -> Result<Self, HostError> {
		let payload: Self = serde_json::from_str(json)?;
		info!("network-graph: payload parsed with {} rows", payload.rows.len());
		Ok(payload)
	}

	pub fn into_input(self) -> GraphInput {
		GraphInput {
			fields: self.fields.field_map(),
			rows: self.rows,
			style: self.style,
		}
	}
}

/// Graph input for a raw delivery. An unreadable payload keeps the previous
/// field mapping with no rows, so it draws as an empty dataset.
pub fn input_from_json(json: &str, previous: &FieldMap) -> GraphInput {
	match HostPayload::parse(json) {
		Ok(payload) => payload.into_input(),
		Err(err) => {
			warn!("network-graph: payload rejected: {err}");
			GraphInput {
				fields: previous.clone(),
				..GraphInput::default()
			}
		}
	}
}

/// Resolves the readiness future with the first payload.
#[derive(Debug)]
pub struct HostReady {
	sender: Option<oneshot::Sender<GraphInput>>,
}

impl HostReady {
	/// Delivers `input` if this is the first call. Returns whether it was
	/// delivered.
	pub fn resolve(&mut self, input: GraphInput) -> bool {
		let Some(sender) = self.sender.take() else {
			return false;
		};
		let delivered = sender.send(input).is_ok();
		if delivered {
			info!("network-graph: host readiness resolved");
		}
		delivered
	}

	pub fn is_resolved(&self) -> bool {
		self.sender.is_none()
	}
}

/// A resolver and the future it completes. The future yields `None` if the
/// resolver is dropped unresolved.
pub fn readiness() -> (HostReady, impl Future<Output = Option<GraphInput>>) {
	let (sender, receiver) = oneshot::channel();
	(
		HostReady {
			sender: Some(sender),
		},
		receiver.map(Result::ok),
	)
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;
	use serde_json::json;

	use super::*;

	const PAYLOAD: &str = r##"{
		"fields": {
			"dimensions": { "source": "from", "target": "to", "group": "team", "extra": ["kind", "x"] },
			"metrics": { "weight": "calls", "nodeValue": "" }
		},
		"rows": [
			{ "from": ["A"], "to": ["B"], "team": ["core"], "kind": ["sync"], "calls": [2] },
			{ "from": "B", "to": "C", "calls": "4" }
		],
		"style": { "nodeSizeMax": "24", "showLabels": true }
	}"##;

	#[test]
	fn payload_maps_fields_by_role() {
		let payload = HostPayload::parse(PAYLOAD).unwrap();
		assert_eq!(payload.rows.len(), 2);
		assert_eq!(payload.style.node_size_max, 24.0);
		assert!(payload.style.show_labels);

		let input = payload.into_input();
		assert_eq!(
			input.fields,
			FieldMap::endpoints("from", "to")
				.with_group("team")
				.with_link_group("kind")
				.with_edge_weight("calls")
		);
		assert_eq!(input.rows[0].cell("from"), Some(&json!("A")));
	}

	#[test]
	fn missing_sections_default() {
		let payload = HostPayload::parse("{}").unwrap();
		assert_eq!(payload, HostPayload::default());
		assert_eq!(payload.fields.field_map(), FieldMap::default());
	}

	#[test]
	fn malformed_payload_keeps_previous_mapping() {
		assert!(matches!(HostPayload::parse("{"), Err(HostError::Malformed(_))));

		let previous = FieldMap::endpoints("from", "to");
		let input = input_from_json("not json", &previous);
		assert_eq!(input.fields, previous);
		assert!(input.rows.is_empty());
	}

	#[test]
	fn readiness_resolves_exactly_once() {
		let (mut ready, first) = readiness();
		assert!(!ready.is_resolved());

		let input = input_from_json(PAYLOAD, &FieldMap::default());
		assert!(ready.resolve(input.clone()));
		assert!(ready.is_resolved());
		assert!(!ready.resolve(GraphInput::default()));

		assert_eq!(block_on(first), Some(input));
	}

	#[test]
	fn dropped_resolver_yields_none() {
		let (ready, first) = readiness();
		drop(ready);
		assert_eq!(block_on(first), None);
	}
}

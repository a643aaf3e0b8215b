//! Converts flat host rows into a deduplicated node set and an edge list.

use indexmap::IndexMap;
use log::{debug, info};
use serde_json::Value;

use super::error::{GraphError, Result};
use super::types::{Edge, FieldMap, GraphData, Node, Row, ValueSource};

/// Reads a cell as a number, falling back to `default` for anything that is
/// missing, null, non-numeric or non-finite.
///
/// Numeric strings (`" 4.5 "`) are parsed; booleans are not numbers.
pub fn coerce_number(value: Option<&Value>, default: f64) -> f64 {
	let parsed = match value {
		Some(Value::Number(n)) => n.as_f64(),
		Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
		Some(Value::Array(items)) => return coerce_number(items.first(), default),
		_ => None,
	};
	parsed.filter(|v| v.is_finite()).unwrap_or(default)
}

/// Builds the graph for one data refresh.
///
/// Rows whose source or target cell is empty are skipped. A node's group is
/// taken from the first row that lists it as source with a non-blank group.
pub fn build(rows: &[Row], fields: &FieldMap) -> Result<GraphData> {
	let source_field = fields
		.source
		.as_deref()
		.ok_or(GraphError::ConfigurationIncomplete { missing: "source" })?;
	let target_field = fields
		.target
		.as_deref()
		.ok_or(GraphError::ConfigurationIncomplete { missing: "target" })?;
	if rows.is_empty() {
		return Err(GraphError::EmptyDataset);
	}

	let mut nodes: IndexMap<String, Node> = IndexMap::new();
	let mut edges = Vec::with_capacity(rows.len());
	let mut skipped = 0usize;

	for row in rows {
		let (Some(source), Some(target)) = (row.key(source_field), row.key(target_field)) else {
			skipped += 1;
			continue;
		};

		let metric = fields
			.node_value
			.as_deref()
			.map(|field| coerce_number(row.cell(field), 0.0));
		let group = fields.group.as_deref().and_then(|field| row.label(field));

		let src = nodes
			.entry(source.clone())
			.or_insert_with(|| Node::new(source.clone()));
		src.degree += 1;
		src.value += metric.unwrap_or(0.0);
		if src.group.is_none() {
			src.group = group;
		}

		let tgt = nodes
			.entry(target.clone())
			.or_insert_with(|| Node::new(target.clone()));
		tgt.degree += 1;
		tgt.value += metric.unwrap_or(0.0);

		edges.push(Edge {
			source,
			target,
			weight: fields
				.edge_weight
				.as_deref()
				.map_or(1.0, |field| coerce_number(row.cell(field), 0.0)),
			link_group: fields.link_group.as_deref().and_then(|field| row.label(field)),
		});
	}

	// Degree is only final once every row has been seen.
	let value_source = if fields.node_value.is_some() {
		ValueSource::Metric
	} else {
		for node in nodes.values_mut() {
			node.value = f64::from(node.degree);
		}
		ValueSource::Degree
	};

	if skipped > 0 {
		debug!("network-graph: skipped {skipped} rows without both endpoints");
	}
	if nodes.is_empty() {
		return Err(GraphError::EmptyDataset);
	}
	info!(
		"network-graph: built {} nodes and {} edges from {} rows",
		nodes.len(),
		edges.len(),
		rows.len()
	);

	Ok(GraphData {
		nodes: nodes.into_values().collect(),
		edges,
		value_source,
	})
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use serde_json::json;

	use super::*;

	fn row(source: &str, target: &str) -> Row {
		Row::from_pairs([("src", json!([source])), ("dst", json!([target]))])
	}

	fn row_with(source: &str, target: &str, extra: &[(&str, Value)]) -> Row {
		let mut row = row(source, target);
		for (k, v) in extra {
			row.0.insert((*k).to_string(), v.clone());
		}
		row
	}

	#[test]
	fn coerce_number_handles_every_cell_shape() {
		assert_eq!(coerce_number(Some(&json!(3)), 0.0), 3.0);
		assert_eq!(coerce_number(Some(&json!(" 4.5 ")), 0.0), 4.5);
		assert_eq!(coerce_number(Some(&json!("n/a")), 0.0), 0.0);
		assert_eq!(coerce_number(Some(&json!(null)), 7.0), 7.0);
		assert_eq!(coerce_number(Some(&json!(true)), 0.0), 0.0);
		assert_eq!(coerce_number(Some(&json!([12])), 0.0), 12.0);
		assert_eq!(coerce_number(Some(&json!([])), 2.0), 2.0);
		assert_eq!(coerce_number(Some(&json!("inf")), 1.0), 1.0);
		assert_eq!(coerce_number(None, 5.0), 5.0);
	}

	#[test]
	fn missing_source_or_target_is_a_configuration_error() {
		let rows = vec![row("A", "B")];
		let no_target = FieldMap {
			source: Some("src".into()),
			..FieldMap::default()
		};
		assert_eq!(
			build(&rows, &no_target),
			Err(GraphError::ConfigurationIncomplete { missing: "target" })
		);
		assert_eq!(
			build(&rows, &FieldMap::default()),
			Err(GraphError::ConfigurationIncomplete { missing: "source" })
		);
	}

	#[test]
	fn configuration_is_checked_before_emptiness() {
		assert!(matches!(
			build(&[], &FieldMap::default()),
			Err(GraphError::ConfigurationIncomplete { .. })
		));
		assert_eq!(
			build(&[], &FieldMap::endpoints("src", "dst")),
			Err(GraphError::EmptyDataset)
		);
	}

	#[test]
	fn node_set_is_distinct_endpoint_values() {
		let rows = vec![row("A", "B"), row("B", "C"), row("C", "A"), row("D", "A")];
		let graph = build(&rows, &FieldMap::endpoints("src", "dst")).unwrap();
		let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["A", "B", "C", "D"]);
		let distinct: BTreeSet<_> = ids.iter().collect();
		assert_eq!(distinct.len(), ids.len());
	}

	#[test]
	fn degree_counts_both_endpoint_roles() {
		let rows = vec![row("A", "B"), row("A", "C"), row("C", "A"), row("A", "A")];
		let graph = build(&rows, &FieldMap::endpoints("src", "dst")).unwrap();
		assert_eq!(graph.node("A").unwrap().degree, 5);
		assert_eq!(graph.node("B").unwrap().degree, 1);
		assert_eq!(graph.node("C").unwrap().degree, 2);
	}

	#[test]
	fn value_falls_back_to_degree() {
		let rows = vec![row("A", "B"), row("A", "C")];
		let graph = build(&rows, &FieldMap::endpoints("src", "dst")).unwrap();
		assert_eq!(graph.value_source, ValueSource::Degree);
		for node in &graph.nodes {
			assert_eq!(node.value, f64::from(node.degree));
		}
	}

	#[test]
	fn node_value_sums_metric_over_both_roles() {
		let rows = vec![
			row_with("A", "B", &[("amt", json!([3]))]),
			row_with("C", "A", &[("amt", json!(["5"]))]),
			row_with("B", "C", &[("amt", json!(["oops"]))]),
		];
		let fields = FieldMap::endpoints("src", "dst").with_node_value("amt");
		let graph = build(&rows, &fields).unwrap();
		assert_eq!(graph.value_source, ValueSource::Metric);
		assert_eq!(graph.node("A").unwrap().value, 8.0);
		assert_eq!(graph.node("B").unwrap().value, 3.0);
		assert_eq!(graph.node("C").unwrap().value, 5.0);
	}

	#[test]
	fn edge_attributes_follow_the_field_map() {
		let rows = vec![
			row_with("A", "B", &[("w", json!(2)), ("kind", json!("x"))]),
			row_with("B", "C", &[("w", Value::Null)]),
		];
		let fields = FieldMap::endpoints("src", "dst")
			.with_edge_weight("w")
			.with_link_group("kind");
		let graph = build(&rows, &fields).unwrap();
		assert_eq!(graph.edges[0].weight, 2.0);
		assert_eq!(graph.edges[0].link_group.as_deref(), Some("x"));
		assert_eq!(graph.edges[1].weight, 0.0);
		assert_eq!(graph.edges[1].link_group, None);

		let unweighted = build(&rows, &FieldMap::endpoints("src", "dst")).unwrap();
		assert!(unweighted.edges.iter().all(|e| e.weight == 1.0));
	}

	#[test]
	fn group_comes_from_first_source_row() {
		let rows = vec![
			row_with("B", "A", &[("g", json!("first"))]),
			row_with("A", "C", &[("g", json!(""))]),
			row_with("A", "C", &[("g", json!("second"))]),
			row_with("A", "C", &[("g", json!("third"))]),
		];
		let fields = FieldMap::endpoints("src", "dst").with_group("g");
		let graph = build(&rows, &fields).unwrap();
		assert_eq!(graph.node("A").unwrap().group.as_deref(), Some("second"));
		assert_eq!(graph.node("B").unwrap().group.as_deref(), Some("first"));
		assert_eq!(graph.node("C").unwrap().group, None);
	}

	#[test]
	fn rows_without_endpoints_are_skipped() {
		let rows = vec![
			Row::from_pairs([("src", json!(["A"])), ("dst", Value::Null)]),
			row("A", "B"),
		];
		let graph = build(&rows, &FieldMap::endpoints("src", "dst")).unwrap();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.edges.len(), 1);

		let all_blank = vec![Row::from_pairs([("src", Value::Null)])];
		assert_eq!(
			build(&all_blank, &FieldMap::endpoints("src", "dst")),
			Err(GraphError::EmptyDataset)
		);
	}

	#[test]
	fn numeric_keys_and_string_keys_share_identity() {
		let rows = vec![
			Row::from_pairs([("src", json!([1])), ("dst", json!(["1"]))]),
			Row::from_pairs([("src", json!([2])), ("dst", json!([1]))]),
		];
		let graph = build(&rows, &FieldMap::endpoints("src", "dst")).unwrap();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.node("1").unwrap().degree, 3);
	}
}

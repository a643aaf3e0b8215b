//! Recoverable failures of a data refresh.
//!
//! None of these are fatal: each one turns into a [`Placeholder`] drawn in
//! place of the graph, and the next refresh starts over.

/// Why a refresh cannot produce a graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
	#[error("the {missing} field is not mapped")]
	ConfigurationIncomplete { missing: &'static str },
	#[error("the data source returned no rows")]
	EmptyDataset,
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Text shown instead of a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
	pub title: &'static str,
	pub message: String,
}

impl From<&GraphError> for Placeholder {
	fn from(err: &GraphError) -> Self {
		match err {
			GraphError::ConfigurationIncomplete { .. } => Self {
				title: "Configure the network",
				message: format!("{err}. Select a source and a target dimension."),
			},
			GraphError::EmptyDataset => Self {
				title: "No data",
				message: "There are no rows to draw for the current filters.".into(),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn incomplete_configuration_names_missing_field() {
		let err = GraphError::ConfigurationIncomplete { missing: "target" };
		let placeholder = Placeholder::from(&err);
		assert_eq!(placeholder.title, "Configure the network");
		assert!(placeholder.message.starts_with("the target field is not mapped"));
	}
}

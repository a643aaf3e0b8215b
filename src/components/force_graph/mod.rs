//! Force-directed network diagram component.
//!
//! Turns a flat table of rows into a node-link diagram on an HTML canvas:
//! - Graph building from a source/target field mapping, with degree or
//!   metric node values
//! - Data-driven encodings for node color and size, link color and width
//! - Physics-based node positioning via a Barnes-Hut force simulation
//! - Pan, zoom, node dragging and hover tooltips
//!
//! Everything except [`NetworkGraphCanvas`] and the renderer is plain Rust and
//! runs headless.
//!
//! # Example
//!
//! ```ignore
//! use network_graph::{FieldMap, GraphInput, NetworkGraphCanvas, Row};
//! use serde_json::json;
//!
//! let input = GraphInput {
//!     rows: vec![
//!         Row::from_pairs([("from", json!("A")), ("to", json!("B"))]),
//!         Row::from_pairs([("from", json!("B")), ("to", json!("C"))]),
//!     ],
//!     fields: FieldMap::endpoints("from", "to"),
//!     ..GraphInput::default()
//! };
//!
//! view! { <NetworkGraphCanvas data=Signal::derive(move || input.clone()) fullscreen=true /> }
//! ```

pub mod builder;
mod component;
pub mod config;
pub mod error;
pub mod quadtree;
mod render;
pub mod scale;
pub mod simulation;
pub mod state;
pub mod theme;
pub mod types;

pub use builder::{build, coerce_number};
pub use component::NetworkGraphCanvas;
pub use config::{InteractionConfig, StyleConfig};
pub use error::{GraphError, Placeholder};
pub use scale::{Encodings, make_scales};
pub use simulation::{ForceConfig, Simulation};
pub use state::{ForceGraphState, HoverTarget, Tooltip, ViewTransform};
pub use theme::Theme;
pub use types::{Edge, FieldMap, GraphData, GraphInput, Node, Row, ValueSource};

//! Iterative force-directed layout.
//!
//! A [`Simulation`] owns the node records of one data refresh and is the only
//! writer of their positions. Each [`Simulation::tick`] combines three forces
//! additively:
//!
//! - a link force pulling connected pairs toward a target distance,
//! - a many-body force (Barnes-Hut over a [`QuadTree`]) pushing nodes apart,
//! - a centering force moving the centroid onto the canvas center,
//!
//! then integrates velocities with friction. A temperature `alpha` scales all
//! forces and decays geometrically toward `alpha_target`; once it drops below
//! `alpha_min` the simulation stops stepping until something reheats it.
//!
//! Drag interactions pin nodes through [`Simulation::pin`], which sets the
//! fixed-position override read by the very next step.

use std::collections::HashMap;
use std::f64::consts::PI;

use log::{debug, info};

use super::config::StyleConfig;
use super::quadtree::QuadTree;
use super::types::{Edge, Node};

/// Spacing of the initial phyllotaxis spiral.
const INITIAL_RADIUS: f64 = 10.0;

/// Force and cooling parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceConfig {
	/// Centering target, usually the canvas center.
	pub center: (f64, f64),
	/// Fraction of the centroid offset removed per step.
	pub center_strength: f64,
	/// Target length of every link.
	pub link_distance: f64,
	/// Link strength; `None` uses `1 / min(degree(source), degree(target))`.
	pub link_strength: Option<f64>,
	/// Pairwise repulsion. Positive repels, negative attracts.
	pub charge_strength: f64,
	/// Barnes-Hut opening criterion; smaller is more exact.
	pub theta: f64,
	/// Distances below this are clamped to avoid blow-ups.
	pub distance_min: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	/// Fraction of velocity lost per step.
	pub velocity_decay: f64,
	/// Alpha target held while a drag is in progress.
	pub drag_alpha_target: f64,
}

impl Default for ForceConfig {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			center: (0.0, 0.0),
			center_strength: 1.0,
			link_distance: 60.0,
			link_strength: None,
			charge_strength: 300.0,
			theta: 0.9,
			distance_min: 1.0,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
		}
	}
}

impl ForceConfig {
	pub fn from_style(style: &StyleConfig, width: f64, height: f64) -> Self {
		Self {
			center: (width / 2.0, height / 2.0),
			link_distance: style.link_distance.max(0.0),
			link_strength: style.link_strength,
			charge_strength: style.charge_strength,
			..Self::default()
		}
	}
}

/// A link resolved to node indices, with its precomputed force terms.
#[derive(Clone, Debug)]
struct Link {
	source: usize,
	target: usize,
	strength: f64,
	/// Share of the correction applied to the target.
	bias: f64,
}

/// Deterministic xorshift64* generator used to separate coincident nodes.
#[derive(Clone, Debug)]
struct Jiggle {
	state: u64,
}

impl Jiggle {
	fn new(seed: u64) -> Self {
		Self { state: seed.max(1) }
	}

	fn next_u64(&mut self) -> u64 {
		let mut x = self.state;
		x ^= x >> 12;
		x ^= x << 25;
		x ^= x >> 27;
		self.state = x;
		x.wrapping_mul(0x2545F4914F6CDD1D_u64)
	}

	/// A tiny non-zero offset in `(-5e-7, 5e-7)`.
	fn offset(&mut self) -> f64 {
		let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
		let v = (unit - 0.5) * 1e-6;
		if v == 0.0 { 1e-7 } else { v }
	}
}

/// Read-only view of the simulation after a step.
pub struct Frame<'a> {
	nodes: &'a [Node],
	edges: &'a [Edge],
	links: &'a [Link],
}

impl<'a> Frame<'a> {
	pub fn nodes(&self) -> &'a [Node] {
		self.nodes
	}

	/// Every edge with its two endpoint nodes at their current positions.
	pub fn links(&self) -> impl Iterator<Item = (&'a Edge, &'a Node, &'a Node)> + 'a {
		let nodes = self.nodes;
		self.edges
			.iter()
			.zip(self.links.iter())
			.map(move |(edge, link)| (edge, &nodes[link.source], &nodes[link.target]))
	}
}

/// Force-directed layout state for one data refresh.
pub struct Simulation {
	nodes: Vec<Node>,
	/// Edges whose endpoints resolved, parallel to `links`.
	edges: Vec<Edge>,
	links: Vec<Link>,
	index: HashMap<String, usize>,
	config: ForceConfig,
	alpha: f64,
	alpha_target: f64,
	running: bool,
	steps: u64,
	jiggle: Jiggle,
}

impl Simulation {
	/// Takes ownership of the nodes, places unpositioned ones on a spiral
	/// around the center and resolves edges to node indices.
	pub fn new(mut nodes: Vec<Node>, edges: Vec<Edge>, config: ForceConfig) -> Self {
		let index: HashMap<String, usize> = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();

		let golden_angle = PI * (3.0 - 5f64.sqrt());
		for (i, node) in nodes.iter_mut().enumerate() {
			if !node.x.is_finite() || !node.y.is_finite() {
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * golden_angle;
				node.x = config.center.0 + radius * angle.cos();
				node.y = config.center.1 + radius * angle.sin();
			}
			if !node.vx.is_finite() || !node.vy.is_finite() {
				node.vx = 0.0;
				node.vy = 0.0;
			}
		}

		let mut resolved = Vec::with_capacity(edges.len());
		let mut pairs = Vec::with_capacity(edges.len());
		for edge in edges {
			match (index.get(&edge.source), index.get(&edge.target)) {
				(Some(&s), Some(&t)) => {
					pairs.push((s, t));
					resolved.push(edge);
				}
				_ => debug!(
					"network-graph: dropping edge {} -> {} with unknown endpoint",
					edge.source, edge.target
				),
			}
		}

		let mut count = vec![0u32; nodes.len()];
		for &(s, t) in &pairs {
			count[s] += 1;
			count[t] += 1;
		}
		let links = pairs
			.into_iter()
			.map(|(source, target)| {
				let (cs, ct) = (f64::from(count[source]), f64::from(count[target]));
				Link {
					source,
					target,
					strength: config.link_strength.unwrap_or(1.0 / cs.min(ct)),
					bias: cs / (cs + ct),
				}
			})
			.collect();

		info!(
			"network-graph: simulation created with {} nodes, {} links",
			nodes.len(),
			resolved.len()
		);

		Self {
			nodes,
			edges: resolved,
			links,
			index,
			config,
			alpha: 1.0,
			alpha_target: 0.0,
			running: true,
			steps: 0,
			jiggle: Jiggle::new(0x9E37_79B9_7F4A_7C15),
		}
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn node(&self, index: usize) -> Option<&Node> {
		self.nodes.get(index)
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn config(&self) -> &ForceConfig {
		&self.config
	}

	pub fn frame(&self) -> Frame<'_> {
		Frame {
			nodes: &self.nodes,
			edges: &self.edges,
			links: &self.links,
		}
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn set_alpha(&mut self, alpha: f64) {
		self.alpha = alpha.max(0.0);
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.max(0.0);
	}

	/// Whether steps are still being scheduled.
	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Steps taken since creation.
	pub fn steps(&self) -> u64 {
		self.steps
	}

	/// Resumes stepping after the simulation settled.
	pub fn restart(&mut self) {
		if !self.running {
			debug!("network-graph: simulation reheated at alpha {:.4}", self.alpha);
		}
		self.running = true;
	}

	/// Moves the centering target, e.g. after a canvas resize.
	pub fn set_center(&mut self, x: f64, y: f64) {
		self.config.center = (x, y);
	}

	/// Fixes a node at `(x, y)` until [`Simulation::release`].
	pub fn pin(&mut self, index: usize, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.fx = Some(x);
			node.fy = Some(y);
		}
	}

	/// Returns a pinned node to free simulated motion.
	pub fn release(&mut self, index: usize) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.fx = None;
			node.fy = None;
		}
	}

	/// Advances one step if running. Returns whether a step was taken.
	pub fn tick(&mut self) -> bool {
		if !self.running {
			return false;
		}
		self.step();
		if self.alpha < self.config.alpha_min {
			self.running = false;
			info!(
				"network-graph: layout settled after {} steps (alpha {:.5})",
				self.steps, self.alpha
			);
		}
		true
	}

	/// Steps until settled or `max_steps` is reached, calling `on_tick`
	/// after every step. Returns the number of steps taken.
	pub fn run(&mut self, max_steps: usize, mut on_tick: impl FnMut(&Frame<'_>)) -> usize {
		let mut taken = 0;
		while taken < max_steps && self.tick() {
			taken += 1;
			on_tick(&self.frame());
		}
		taken
	}

	fn step(&mut self) {
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		let alpha = self.alpha;

		self.apply_links(alpha);
		self.apply_many_body(alpha);
		self.apply_center();

		let keep = 1.0 - self.config.velocity_decay;
		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= keep;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= keep;
					node.y += node.vy;
				}
			}
		}
		self.steps += 1;
	}

	fn apply_links(&mut self, alpha: f64) {
		let distance = self.config.link_distance;
		for link in &self.links {
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = self.jiggle.offset();
			}
			if y == 0.0 {
				y = self.jiggle.offset();
			}
			let l = (x * x + y * y).sqrt();
			let k = (l - distance) / l * alpha * link.strength;
			let (x, y) = (x * k, y * k);

			let target = &mut self.nodes[link.target];
			target.vx -= x * link.bias;
			target.vy -= y * link.bias;
			let source = &mut self.nodes[link.source];
			source.vx += x * (1.0 - link.bias);
			source.vy += y * (1.0 - link.bias);
		}
	}

	fn apply_many_body(&mut self, alpha: f64) {
		if self.nodes.len() < 2 || self.config.charge_strength == 0.0 {
			return;
		}
		let positions: Vec<(f64, f64)> = self.nodes.iter().map(|n| (n.x, n.y)).collect();
		let tree = QuadTree::build(&positions);
		// Positive configured strength repels, so bodies pull with the opposite sign.
		let strength = -self.config.charge_strength;
		let theta2 = self.config.theta * self.config.theta;
		let distance_min2 = self.config.distance_min * self.config.distance_min;
		let jiggle = &mut self.jiggle;

		for (i, node) in self.nodes.iter_mut().enumerate() {
			let (px, py) = positions[i];
			let (mut dvx, mut dvy) = (0.0, 0.0);
			tree.visit(|cell| {
				if cell.count == 0 {
					return true;
				}
				if !cell.is_leaf() {
					let (x, y) = (cell.cx - px, cell.cy - py);
					let l = x * x + y * y;
					if cell.size * cell.size / theta2 >= l {
						return false;
					}
					let l = if l < distance_min2 { (distance_min2 * l).sqrt() } else { l };
					let w = strength * cell.count as f64 * alpha / l;
					dvx += x * w;
					dvy += y * w;
					return true;
				}
				for &j in cell.points.iter().filter(|&&j| j != i) {
					let (mut x, mut y) = (positions[j].0 - px, positions[j].1 - py);
					let mut l = x * x + y * y;
					if x == 0.0 {
						x = jiggle.offset();
						l += x * x;
					}
					if y == 0.0 {
						y = jiggle.offset();
						l += y * y;
					}
					if l < distance_min2 {
						l = (distance_min2 * l).sqrt();
					}
					let w = strength * alpha / l;
					dvx += x * w;
					dvy += y * w;
				}
				true
			});
			node.vx += dvx;
			node.vy += dvy;
		}
	}

	fn apply_center(&mut self) {
		if self.nodes.is_empty() {
			return;
		}
		let n = self.nodes.len() as f64;
		let (sx, sy) = self
			.nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let strength = self.config.center_strength;
		let dx = (sx / n - self.config.center.0) * strength;
		let dy = (sy / n - self.config.center.1) * strength;
		for node in &mut self.nodes {
			node.x -= dx;
			node.y -= dy;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn nodes(ids: &[&str]) -> Vec<Node> {
		ids.iter().map(|id| Node::new(*id)).collect()
	}

	fn edge(source: &str, target: &str) -> Edge {
		Edge {
			source: source.into(),
			target: target.into(),
			weight: 1.0,
			link_group: None,
		}
	}

	fn distance(a: &Node, b: &Node) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	fn mean_spacing(sim: &Simulation) -> f64 {
		let ns = sim.nodes();
		let mut total = 0.0;
		let mut pairs = 0.0;
		for i in 0..ns.len() {
			for j in (i + 1)..ns.len() {
				total += distance(&ns[i], &ns[j]);
				pairs += 1.0;
			}
		}
		total / pairs
	}

	#[test]
	fn initial_positions_spiral_around_center() {
		let config = ForceConfig {
			center: (400.0, 300.0),
			..ForceConfig::default()
		};
		let sim = Simulation::new(nodes(&["a", "b", "c"]), vec![], config);
		for node in sim.nodes() {
			assert!(node.x.is_finite() && node.y.is_finite());
			assert!(distance(node, &Node { x: 400.0, y: 300.0, ..Node::new("") }) < 30.0);
		}
		assert_ne!(sim.nodes()[0].x, sim.nodes()[1].x);
	}

	#[test]
	fn edges_with_unknown_endpoints_are_dropped() {
		let sim = Simulation::new(
			nodes(&["a", "b"]),
			vec![edge("a", "b"), edge("a", "zzz")],
			ForceConfig::default(),
		);
		assert_eq!(sim.edges().len(), 1);
		assert_eq!(sim.frame().links().count(), 1);
	}

	#[test]
	fn settles_once_alpha_drops_below_threshold() {
		let mut sim = Simulation::new(
			nodes(&["a", "b", "c"]),
			vec![edge("a", "b"), edge("b", "c")],
			ForceConfig::default(),
		);
		let mut frames = 0;
		let taken = sim.run(10_000, |_| frames += 1);
		assert!(!sim.is_running());
		assert_eq!(taken, frames);
		assert!((290..=310).contains(&taken), "took {taken} steps");
		assert!(sim.alpha() < sim.config().alpha_min);
		assert!(!sim.tick());
	}

	#[test]
	fn linked_pair_approaches_link_distance() {
		let config = ForceConfig {
			charge_strength: 0.0,
			link_distance: 50.0,
			..ForceConfig::default()
		};
		let mut sim = Simulation::new(nodes(&["a", "b"]), vec![edge("a", "b")], config);
		sim.run(1000, |_| {});
		let d = distance(&sim.nodes()[0], &sim.nodes()[1]);
		assert!((d - 50.0).abs() < 2.0, "distance {d}");
	}

	#[test]
	fn stronger_repulsion_spreads_nodes_wider() {
		let ids = ["a", "b", "c", "d", "e", "f", "g", "h"];
		let links = vec![edge("a", "b"), edge("a", "c"), edge("a", "d"), edge("e", "f")];
		let settle = |charge: f64| {
			let config = ForceConfig {
				charge_strength: charge,
				..ForceConfig::default()
			};
			let mut sim = Simulation::new(nodes(&ids), links.clone(), config);
			sim.run(1000, |_| {});
			mean_spacing(&sim)
		};
		assert!(settle(400.0) > settle(40.0) * 1.5);
	}

	#[test]
	fn centroid_moves_onto_center() {
		let config = ForceConfig {
			center: (200.0, -50.0),
			..ForceConfig::default()
		};
		let mut sim = Simulation::new(
			nodes(&["a", "b", "c", "d"]),
			vec![edge("a", "b"), edge("c", "d")],
			config,
		);
		sim.run(1000, |_| {});
		let n = sim.nodes().len() as f64;
		let cx = sim.nodes().iter().map(|n| n.x).sum::<f64>() / n;
		let cy = sim.nodes().iter().map(|n| n.y).sum::<f64>() / n;
		assert!((cx - 200.0).abs() < 1.0);
		assert!((cy + 50.0).abs() < 1.0);
	}

	#[test]
	fn pinned_node_sits_at_fixed_position_after_next_step() {
		let mut sim = Simulation::new(
			nodes(&["a", "b", "c"]),
			vec![edge("a", "b"), edge("b", "c")],
			ForceConfig::default(),
		);
		let b = sim.index_of("b").unwrap();
		sim.pin(b, 123.0, -45.0);
		assert!(sim.tick());
		let node = sim.node(b).unwrap();
		assert_eq!((node.x, node.y), (123.0, -45.0));
		assert_eq!((node.vx, node.vy), (0.0, 0.0));

		sim.release(b);
		assert!(!sim.node(b).unwrap().is_fixed());
	}

	#[test]
	fn alpha_target_reawakens_a_settled_simulation() {
		let mut sim = Simulation::new(nodes(&["a", "b"]), vec![edge("a", "b")], ForceConfig::default());
		sim.run(10_000, |_| {});
		assert!(!sim.is_running());
		let settled = sim.alpha();

		sim.set_alpha_target(0.3);
		sim.restart();
		assert!(sim.tick());
		assert!(sim.alpha() > settled);
	}

	#[test]
	fn coincident_nodes_are_pushed_apart() {
		let mut stacked = nodes(&["a", "b"]);
		for n in &mut stacked {
			n.x = 10.0;
			n.y = 10.0;
		}
		let mut sim = Simulation::new(stacked, vec![], ForceConfig::default());
		sim.run(50, |_| {});
		assert!(distance(&sim.nodes()[0], &sim.nodes()[1]) > 1.0);
	}

	#[test]
	fn frame_reports_current_endpoint_positions() {
		let mut sim = Simulation::new(nodes(&["a", "b"]), vec![edge("a", "b")], ForceConfig::default());
		sim.tick();
		let frame = sim.frame();
		let (edge, source, target) = frame.links().next().unwrap();
		assert_eq!(edge.source, "a");
		assert_eq!((source.x, source.y), (frame.nodes()[0].x, frame.nodes()[0].y));
		assert_eq!((target.x, target.y), (frame.nodes()[1].x, frame.nodes()[1].y));
	}

	#[test]
	fn jiggle_is_tiny_and_nonzero() {
		let mut jiggle = Jiggle::new(7);
		for _ in 0..1000 {
			let v = jiggle.offset();
			assert!(v != 0.0 && v.abs() < 1e-6);
		}
	}
}

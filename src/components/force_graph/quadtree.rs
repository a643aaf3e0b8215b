//! Barnes-Hut quadtree over node positions.
//!
//! Rebuilt from scratch every simulation step. Each cell stores the number of
//! points below it and their centroid, so a far-away cell can stand in for
//! all of its points at once.

/// Subdivision stops at this depth; deeper points share a leaf.
const MAX_DEPTH: usize = 24;

/// One square region of the tree.
#[derive(Clone, Debug)]
pub struct Cell {
	/// Top-left corner.
	pub x0: f64,
	pub y0: f64,
	/// Side length.
	pub size: f64,
	/// Points below this cell.
	pub count: usize,
	/// Centroid of the points below this cell.
	pub cx: f64,
	pub cy: f64,
	/// Child cell indices in NW, NE, SW, SE order; all `None` for a leaf.
	pub children: [Option<usize>; 4],
	/// Point indices stored in a leaf.
	pub points: Vec<usize>,
}

impl Cell {
	pub fn is_leaf(&self) -> bool {
		self.children.iter().all(Option::is_none)
	}
}

/// Arena-backed quadtree.
#[derive(Clone, Debug, Default)]
pub struct QuadTree {
	cells: Vec<Cell>,
}

impl QuadTree {
	/// Builds a tree over `positions`. Non-finite positions are left out.
	pub fn build(positions: &[(f64, f64)]) -> Self {
		let indices: Vec<usize> = (0..positions.len())
			.filter(|&i| positions[i].0.is_finite() && positions[i].1.is_finite())
			.collect();
		let mut tree = Self { cells: Vec::new() };
		if indices.is_empty() {
			return tree;
		}

		let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
		for &i in &indices {
			let (x, y) = positions[i];
			x0 = x0.min(x);
			y0 = y0.min(y);
			x1 = x1.max(x);
			y1 = y1.max(y);
		}
		// Square extent, padded so points on the far edge fall inside.
		let size = (x1 - x0).max(y1 - y0).max(1.0) * (1.0 + 1e-9);
		tree.insert(positions, indices, x0, y0, size, 0);
		tree
	}

	fn insert(
		&mut self,
		positions: &[(f64, f64)],
		indices: Vec<usize>,
		x0: f64,
		y0: f64,
		size: f64,
		depth: usize,
	) -> usize {
		let count = indices.len();
		let (sx, sy) = indices.iter().fold((0.0, 0.0), |(sx, sy), &i| {
			(sx + positions[i].0, sy + positions[i].1)
		});
		let id = self.cells.len();
		self.cells.push(Cell {
			x0,
			y0,
			size,
			count,
			cx: sx / count as f64,
			cy: sy / count as f64,
			children: [None; 4],
			points: Vec::new(),
		});

		let coincident = indices.iter().all(|&i| positions[i] == positions[indices[0]]);
		if count == 1 || coincident || depth >= MAX_DEPTH {
			self.cells[id].points = indices;
			return id;
		}

		let half = size / 2.0;
		let (mx, my) = (x0 + half, y0 + half);
		let mut quadrants: [Vec<usize>; 4] = Default::default();
		for i in indices {
			let (x, y) = positions[i];
			let q = usize::from(x >= mx) + 2 * usize::from(y >= my);
			quadrants[q].push(i);
		}
		for (q, members) in quadrants.into_iter().enumerate() {
			if members.is_empty() {
				continue;
			}
			let cx0 = if q % 2 == 1 { mx } else { x0 };
			let cy0 = if q >= 2 { my } else { y0 };
			let child = self.insert(positions, members, cx0, cy0, half, depth + 1);
			self.cells[id].children[q] = Some(child);
		}
		id
	}

	pub fn root(&self) -> Option<&Cell> {
		self.cells.first()
	}

	/// Visits cells depth-first, pre-order. Returning `true` from `visitor`
	/// skips that cell's children.
	pub fn visit(&self, mut visitor: impl FnMut(&Cell) -> bool) {
		if self.cells.is_empty() {
			return;
		}
		let mut stack = vec![0usize];
		while let Some(id) = stack.pop() {
			let cell = &self.cells[id];
			if visitor(cell) {
				continue;
			}
			stack.extend(cell.children.iter().rev().flatten().copied());
		}
	}
}

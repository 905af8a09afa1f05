//! Route ordering.
//!
//! The planner treats the optimizer as a black box: it hands over a distance
//! matrix whose node 0 is the vehicle and receives a visiting order.  Two
//! solvers ship with the crate:
//!
//! | Solver               | Result                       | Limit                                  |
//! |----------------------|------------------------------|----------------------------------------|
//! | [`HeldKarp`]         | Optimal open path            | `max_nodes` (default 13, capped at 20) |
//! | [`NearestNeighbour`] | Greedy open path             | none                                   |
//!
//! Both solve the single-vehicle open routing problem: visit every node once,
//! starting at `start` (default 0) and finishing at `end` (default `n - 1`),
//! without returning.

use ms_core::NedPoint;

// ── DistanceMatrix ────────────────────────────────────────────────────────────

/// Dense symmetric matrix of non-negative distances, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
    n:    usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Pairwise Euclidean distances between `points`.
    pub fn from_points(points: &[NedPoint]) -> Self {
        let n = points.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = points[i].distance(points[j]);
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        Self { n, data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Total length of the path visiting `order` in sequence.
    pub fn path_cost(&self, order: &[usize]) -> f64 {
        order.windows(2).map(|w| self.get(w[0], w[1])).sum()
    }
}

// ── Optimizer ─────────────────────────────────────────────────────────────────

/// Outcome of an optimization.
#[derive(Clone, Debug, PartialEq)]
pub enum Solution {
    /// `order` is a permutation of `0..n` beginning at the start node and
    /// ending at the end node.
    Route { order: Vec<usize>, cost: f64 },
    /// No route could be produced.  Never an error: the caller retries later.
    Infeasible,
}

/// Pluggable route optimizer.
///
/// `start` and `end` default to the first and last node.  Implementations
/// report bad input (empty matrix, out-of-range or coinciding endpoints) as
/// [`Solution::Infeasible`] rather than panicking.
pub trait Optimizer: 'static {
    fn solve(&self, matrix: &DistanceMatrix, start: Option<usize>, end: Option<usize>) -> Solution;

    fn name(&self) -> &str {
        "optimizer"
    }
}

/// Resolve the endpoints of an open path over `n` nodes.
fn endpoints(n: usize, start: Option<usize>, end: Option<usize>) -> Option<(usize, usize)> {
    if n == 0 {
        return None;
    }
    let s = start.unwrap_or(0);
    let e = end.unwrap_or(n - 1);
    if s >= n || e >= n || (s == e && n > 1) {
        return None;
    }
    Some((s, e))
}

// ── HeldKarp ──────────────────────────────────────────────────────────────────

/// Exact dynamic program over node subsets, `O(2ⁿ · n²)`.
///
/// Matrices larger than `max_nodes` are reported infeasible.
#[derive(Clone, Debug)]
pub struct HeldKarp {
    max_nodes: usize,
}

impl HeldKarp {
    /// Upper bound on `max_nodes`; the tables hold `2ⁿ · n` entries each.
    pub const NODE_CAP: usize = 20;

    /// A solver for matrices of up to `max_nodes` nodes, clamped to
    /// [`NODE_CAP`](Self::NODE_CAP).
    pub fn new(max_nodes: usize) -> Self {
        Self { max_nodes: max_nodes.min(Self::NODE_CAP) }
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }
}

impl Default for HeldKarp {
    fn default() -> Self {
        Self::new(13)
    }
}

impl Optimizer for HeldKarp {
    fn solve(&self, matrix: &DistanceMatrix, start: Option<usize>, end: Option<usize>) -> Solution {
        let n = matrix.len();
        let Some((s, e)) = endpoints(n, start, end) else {
            return Solution::Infeasible;
        };
        if n > self.max_nodes.min(Self::NODE_CAP) {
            return Solution::Infeasible;
        }
        if n == 1 {
            return Solution::Route { order: vec![s], cost: 0.0 };
        }

        let full = (1usize << n) - 1;
        let slot = |mask: usize, last: usize| mask * n + last;
        let mut best = vec![f64::INFINITY; (full + 1) * n];
        let mut parent = vec![usize::MAX; (full + 1) * n];
        best[slot(1 << s, s)] = 0.0;

        for mask in 0..=full {
            if mask & (1 << s) == 0 {
                continue;
            }
            for last in 0..n {
                let here = best[slot(mask, last)];
                // The end node may only close the path.
                if !here.is_finite() || (last == e && mask != full) {
                    continue;
                }
                for next in 0..n {
                    if mask & (1 << next) != 0 {
                        continue;
                    }
                    let grown = mask | (1 << next);
                    let cost = here + matrix.get(last, next);
                    if cost < best[slot(grown, next)] {
                        best[slot(grown, next)] = cost;
                        parent[slot(grown, next)] = last;
                    }
                }
            }
        }

        let cost = best[slot(full, e)];
        if !cost.is_finite() {
            return Solution::Infeasible;
        }

        let mut order = Vec::with_capacity(n);
        let (mut mask, mut node) = (full, e);
        while node != usize::MAX {
            order.push(node);
            let prev = parent[slot(mask, node)];
            mask &= !(1 << node);
            node = prev;
        }
        order.reverse();
        Solution::Route { order, cost }
    }

    fn name(&self) -> &str {
        "held_karp"
    }
}

// ── NearestNeighbour ──────────────────────────────────────────────────────────

/// Greedy heuristic: always move to the closest unvisited node, keeping the
/// end node for last.  Ties go to the lower index.
#[derive(Clone, Debug, Default)]
pub struct NearestNeighbour;

impl Optimizer for NearestNeighbour {
    fn solve(&self, matrix: &DistanceMatrix, start: Option<usize>, end: Option<usize>) -> Solution {
        let n = matrix.len();
        let Some((s, e)) = endpoints(n, start, end) else {
            return Solution::Infeasible;
        };

        let mut visited = vec![false; n];
        visited[s] = true;
        visited[e] = true;
        let mut order = Vec::with_capacity(n);
        order.push(s);
        let mut here = s;

        for _ in 0..n.saturating_sub(2) {
            let next = (0..n)
                .filter(|&j| !visited[j])
                .min_by(|&a, &b| matrix.get(here, a).total_cmp(&matrix.get(here, b)));
            let Some(next) = next else { break };
            visited[next] = true;
            order.push(next);
            here = next;
        }
        if e != s {
            order.push(e);
        }

        let cost = matrix.path_cost(&order);
        Solution::Route { order, cost }
    }

    fn name(&self) -> &str {
        "nearest_neighbour"
    }
}

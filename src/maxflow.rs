//! Minimum s-t cut with Dinic's blocking flow.

use std::collections::VecDeque;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct FlowGraph {
    // edges come in pairs, `e ^ 1` is the reverse of `e`
    to: Vec<usize>,
    cap: Vec<f64>,
    adj: Vec<Vec<usize>>,
    source: usize,
    sink: usize,
}

impl FlowGraph {

    /// Graph over `nodes` pixel nodes plus a source and a sink.
    pub fn new(nodes: usize) -> Self {
        Self {
            to: Vec::new(),
            cap: Vec::new(),
            adj: vec![Vec::new(); nodes + 2],
            source: nodes,
            sink: nodes + 1,
        }
    }

    fn add_edge(&mut self, from: usize, to: usize, cap: f64, rev_cap: f64) {
        self.adj[from].push(self.to.len());
        self.to.push(to);
        self.cap.push(cap);
        self.adj[to].push(self.to.len());
        self.to.push(from);
        self.cap.push(rev_cap);
    }

    /// Terminal links of `node`, `source` is the cost of cutting it off the
    /// source and `sink` the cost of cutting it off the sink.
    ///
    /// Only the difference matters, both are shifted so the smaller one is 0.
    pub fn add_terminal_weights(&mut self, node: usize, source: f64, sink: f64) {
        let shift = source.min(sink);
        let (source, sink) = (source - shift, sink - shift);
        let (s, t) = (self.source, self.sink);
        self.add_edge(s, node, source, 0.0);
        self.add_edge(node, t, sink, 0.0);
    }

    /// Undirected link of weight `w` between two pixel nodes.
    pub fn add_link(&mut self, a: usize, b: usize, w: f64) {
        self.add_edge(a, b, w, w);
    }

    fn levels(&self) -> Option<Vec<i64>> {
        let mut level = vec![-1; self.adj.len()];
        let mut queue = VecDeque::new();
        level[self.source] = 0;
        queue.push_back(self.source);
        while let Some(u) = queue.pop_front() {
            for &e in &self.adj[u] {
                let v = self.to[e];
                if self.cap[e] > EPS && level[v] < 0 {
                    level[v] = level[u] + 1;
                    queue.push_back(v);
                }
            }
        }
        if level[self.sink] < 0 { None } else { Some(level) }
    }

    fn blocking_flow(&mut self, level: &mut [i64]) -> f64 {
        let mut next = vec![0usize; self.adj.len()];
        let mut path: Vec<usize> = Vec::new();
        let mut total = 0.0;
        let mut u = self.source;
        loop {
            if u == self.sink {
                let pushed = path.iter().map(|&e| self.cap[e]).fold(f64::INFINITY, f64::min);
                for &e in &path {
                    self.cap[e] -= pushed;
                    self.cap[e ^ 1] += pushed;
                }
                total += pushed;
                path.clear();
                u = self.source;
                continue;
            }
            let mut advanced = false;
            while next[u] < self.adj[u].len() {
                let e = self.adj[u][next[u]];
                let v = self.to[e];
                if self.cap[e] > EPS && level[v] == level[u] + 1 {
                    path.push(e);
                    u = v;
                    advanced = true;
                    break;
                }
                next[u] += 1;
            }
            if !advanced {
                // dead end, retreat one edge
                level[u] = -1;
                match path.pop() {
                    Some(e) => {
                        u = self.to[e ^ 1];
                        next[u] += 1;
                    }
                    None => return total,
                }
            }
        }
    }

    /// Saturate the graph, returns the flow value.
    pub fn max_flow(&mut self) -> f64 {
        let mut flow = 0.0;
        while let Some(mut level) = self.levels() {
            let pushed = self.blocking_flow(&mut level);
            if pushed <= EPS {
                break;
            }
            flow += pushed;
        }
        flow
    }

    /// After `max_flow`, whether each pixel node is still reachable from the source.
    pub fn source_side(&self) -> Vec<bool> {
        let mut seen = vec![false; self.adj.len()];
        let mut queue = VecDeque::new();
        seen[self.source] = true;
        queue.push_back(self.source);
        while let Some(u) = queue.pop_front() {
            for &e in &self.adj[u] {
                let v = self.to[e];
                if self.cap[e] > EPS && !seen[v] {
                    seen[v] = true;
                    queue.push_back(v);
                }
            }
        }
        seen.truncate(self.source);
        seen
    }
}

//! Topological ordering with minimal cycle reporting.
//!
//! Cycles are found with Tarjan's strongly connected components: a node is
//! reported when its component has more than one member or it depends on
//! itself. Nodes that merely lead into a cycle are not reported. Acyclic
//! graphs are ordered with Kahn's algorithm, always releasing the ready
//! node that was declared first, so the order is a function of the input.

use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError<N: fmt::Debug> {
    /// An edge names a node that was not declared.
    #[error("edge endpoint {0:?} is not a declared node")]
    UnknownNode(N),
    /// The nodes that take part in at least one cycle, in declaration order.
    #[error("dependency cycle through {0:?}")]
    Cycle(Vec<N>),
}

impl<N: fmt::Debug> SortError<N> {
    pub fn cycle(&self) -> Option<&[N]> {
        match self {
            SortError::Cycle(nodes) => Some(nodes),
            SortError::UnknownNode(_) => None,
        }
    }
}

/// Order `nodes` so that for every edge `(u, v)`, `u` comes before `v`.
///
/// Repeated nodes are kept once, at their first position.
pub fn topological_sort<N>(nodes: &[N], edges: &[(N, N)]) -> Result<Vec<N>, SortError<N>>
where
    N: Clone + Eq + Hash + fmt::Debug,
{
    let mut declared: Vec<&N> = Vec::with_capacity(nodes.len());
    let mut index: FxHashMap<&N, usize> = FxHashMap::default();
    for node in nodes {
        index.entry(node).or_insert_with(|| {
            declared.push(node);
            declared.len() - 1
        });
    }

    let mut successors = vec![Vec::new(); declared.len()];
    for (from, to) in edges {
        let u = *index.get(from).ok_or_else(|| SortError::UnknownNode(from.clone()))?;
        let v = *index.get(to).ok_or_else(|| SortError::UnknownNode(to.clone()))?;
        successors[u].push(v);
    }

    let cyclic = cyclic_nodes(&successors);
    if !cyclic.is_empty() {
        tracing::debug!(members = cyclic.len(), "dependency cycle");
        return Err(SortError::Cycle(
            cyclic.into_iter().map(|i| declared[i].clone()).collect(),
        ));
    }

    let mut in_degree = vec![0usize; declared.len()];
    for targets in &successors {
        for &v in targets {
            in_degree[v] += 1;
        }
    }
    let mut ready: BinaryHeap<Reverse<usize>> = (0..declared.len())
        .filter(|&i| in_degree[i] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(declared.len());
    while let Some(Reverse(u)) = ready.pop() {
        order.push(declared[u].clone());
        for &v in &successors[u] {
            in_degree[v] -= 1;
            if in_degree[v] == 0 {
                ready.push(Reverse(v));
            }
        }
    }
    Ok(order)
}

/// Indices of nodes on at least one cycle, ascending.
fn cyclic_nodes(successors: &[Vec<usize>]) -> Vec<usize> {
    const UNVISITED: usize = usize::MAX;
    let count = successors.len();
    let mut index = vec![UNVISITED; count];
    let mut lowlink = vec![0usize; count];
    let mut on_stack = vec![false; count];
    let mut cyclic = vec![false; count];
    let mut stack: Vec<usize> = Vec::new();
    let mut next = 0usize;

    for root in 0..count {
        if index[root] != UNVISITED {
            continue;
        }
        index[root] = next;
        lowlink[root] = next;
        next += 1;
        stack.push(root);
        on_stack[root] = true;
        // (node, position of the next successor to explore)
        let mut calls = vec![(root, 0usize)];

        while let Some(call) = calls.last_mut() {
            let v = call.0;
            if let Some(&w) = successors[v].get(call.1) {
                call.1 += 1;
                if index[w] == UNVISITED {
                    index[w] = next;
                    lowlink[w] = next;
                    next += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    calls.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            calls.pop();
            if let Some(&(parent, _)) = calls.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }
            if lowlink[v] != index[v] {
                continue;
            }
            let mut component = Vec::new();
            while let Some(w) = stack.pop() {
                on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            if component.len() > 1 || successors[v].contains(&v) {
                for w in component {
                    cyclic[w] = true;
                }
            }
        }
    }

    (0..count).filter(|&i| cyclic[i]).collect()
}

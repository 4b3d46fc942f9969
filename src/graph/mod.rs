//! Dependency graph: which divisions must be recomputed or redrawn.
//!
//! Each division is a node. A forward edge runs from a referenced division
//! to every division whose geometry expressions reference it, so dirtying
//! a node dirties everything laid out relative to it.
//!
//! Status is ordered by severity: a dirty node is also due for render once
//! it has been recomputed.

use crate::error::{JumperError, Result};
use crate::layout::Division;
use std::collections::{HashSet, VecDeque};

/// What a division needs before the next pass is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    /// Up to date on screen.
    #[default]
    Clean,
    /// Geometry is valid; output must be re-emitted.
    NeedsRender,
    /// Geometry is invalid and must be recomputed.
    Dirty,
}

#[derive(Debug, Clone)]
struct Node {
    id: String,
    seq: u64,
    render_order: i32,
    status: Status,
    dependents: Vec<String>,
}

/// Nodes in registration order plus their forward edges.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    next_seq: u64,
}

impl Graph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|node| node.id == id)
            .ok_or_else(|| JumperError::UnknownDivision(id.to_string()))
    }

    /// Sync the node set with `divisions`.
    ///
    /// Nodes for divisions that remain keep their status and registration
    /// order; new divisions join dirty; nodes for missing divisions go.
    pub fn set_divisions(&mut self, divisions: &[Division]) {
        self.nodes
            .retain(|node| divisions.iter().any(|division| division.id() == node.id));

        for division in divisions {
            if let Some(node) = self.nodes.iter_mut().find(|node| node.id == division.id()) {
                node.render_order = division.render_order();
                continue;
            }
            self.nodes.push(Node {
                id: division.id().to_string(),
                seq: self.next_seq,
                render_order: division.render_order(),
                status: Status::Dirty,
                dependents: Vec::new(),
            });
            self.next_seq += 1;
        }
    }

    /// Rebuild every forward edge from the divisions' geometry expressions.
    ///
    /// References to ids without a node add no edge; evaluation reports them.
    pub fn calculate_graph(&mut self, divisions: &[Division]) {
        for node in &mut self.nodes {
            node.dependents.clear();
        }

        for division in divisions {
            for referenced in division.references() {
                if let Some(node) = self.nodes.iter_mut().find(|node| node.id == referenced) {
                    if !node.dependents.iter().any(|id| id == division.id()) {
                        node.dependents.push(division.id().to_string());
                    }
                }
            }
        }
    }

    /// Ids whose geometry references `id`.
    pub fn dependents(&self, id: &str) -> &[String] {
        self.node(id).map_or(&[], |node| node.dependents.as_slice())
    }

    /// Current status of a node.
    pub fn status(&self, id: &str) -> Option<Status> {
        self.node(id).map(|node| node.status)
    }

    /// Mark every node dirty.
    pub fn set_all_dirty(&mut self) {
        for node in &mut self.nodes {
            node.status = Status::Dirty;
        }
    }

    /// Mark `id` and everything reachable from it dirty, or the whole graph
    /// when `id` is `None`.
    ///
    /// `visit` is called once per newly visited node with its id and
    /// traversal depth.
    pub fn set_dirty<F>(&mut self, id: Option<&str>, mut visit: F) -> Result<()>
    where
        F: FnMut(&str, usize),
    {
        let Some(start) = id else {
            self.set_all_dirty();
            for node in &self.nodes {
                visit(&node.id, 0);
            }
            return Ok(());
        };

        self.node_mut(start)?;
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue = VecDeque::from([(start.to_string(), 0_usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let node = self.node_mut(&current)?;
            node.status = Status::Dirty;
            tracing::trace!(division = %current, depth, "marked dirty");
            visit(&current, depth);

            for dependent in node.dependents.clone() {
                if !visited.contains(&dependent) {
                    queue.push_back((dependent, depth + 1));
                }
            }
        }

        Ok(())
    }

    /// Mark a single node for redraw. A dirty node stays dirty.
    pub fn set_needs_render(&mut self, id: &str) -> Result<()> {
        let node = self.node_mut(id)?;
        node.status = node.status.max(Status::NeedsRender);
        Ok(())
    }

    /// Record that a dirty node's geometry has been recomputed.
    pub fn mark_recomputed(&mut self, id: &str) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.status == Status::Dirty {
            node.status = Status::NeedsRender;
        }
        Ok(())
    }

    /// Ids of dirty nodes in registration order.
    pub fn dirty(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| node.status == Status::Dirty)
            .map(|node| node.id.clone())
            .collect()
    }

    /// Ids due for render, by render order then registration order.
    pub fn render_queue(&self) -> Vec<String> {
        let mut due: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|node| node.status != Status::Clean)
            .collect();
        due.sort_by_key(|node| (node.render_order, node.seq));
        due.into_iter().map(|node| node.id.clone()).collect()
    }

    /// Whether every node is clean.
    pub fn is_clean(&self) -> bool {
        self.nodes.iter().all(|node| node.status == Status::Clean)
    }

    /// Reset every node to clean after a pass.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.status = Status::Clean;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DivisionSpec;

    fn div(id: &str, top: &str) -> Division {
        Division::new(DivisionSpec::new(id).top(top).left(0).width(10)).unwrap()
    }

    fn graph(divisions: &[Division]) -> Graph {
        let mut graph = Graph::new();
        graph.set_divisions(divisions);
        graph.calculate_graph(divisions);
        graph.reset();
        graph
    }

    #[test]
    fn test_edges_follow_references() {
        let divisions = [div("a", "0"), div("b", "{a}"), div("c", "{b} + {a}")];
        let graph = graph(&divisions);
        assert_eq!(graph.dependents("a"), ["b".to_string(), "c".to_string()]);
        assert_eq!(graph.dependents("b"), ["c".to_string()]);
        assert!(graph.dependents("c").is_empty());
    }

    #[test]
    fn test_dirty_propagates_transitively() {
        let divisions = [div("a", "0"), div("b", "{a}"), div("c", "{b}"), div("d", "0")];
        let mut graph = graph(&divisions);

        let mut visits = Vec::new();
        graph
            .set_dirty(Some("a"), |id, depth| visits.push((id.to_string(), depth)))
            .unwrap();

        assert_eq!(graph.dirty(), ["a", "b", "c"]);
        assert_eq!(graph.status("d"), Some(Status::Clean));
        assert_eq!(
            visits,
            [("a".to_string(), 0), ("b".to_string(), 1), ("c".to_string(), 2)]
        );
    }

    #[test]
    fn test_diamond_visits_each_node_once() {
        let divisions = [div("a", "0"), div("b", "{a}"), div("c", "{a}"), div("d", "{b} + {c}")];
        let mut graph = graph(&divisions);
        let mut count = 0;
        graph.set_dirty(Some("a"), |_, _| count += 1).unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_dirty_everything() {
        let divisions = [div("a", "0"), div("b", "1")];
        let mut graph = graph(&divisions);
        graph.set_dirty(None, |_, _| {}).unwrap();
        assert_eq!(graph.dirty().len(), 2);
        assert!(graph.set_dirty(Some("ghost"), |_, _| {}).is_err());
    }

    #[test]
    fn test_set_all_dirty() {
        let divisions = [div("a", "0"), div("b", "{a}")];
        let mut graph = graph(&divisions);
        graph.set_needs_render("b").unwrap();
        graph.set_all_dirty();
        assert_eq!(graph.status("a"), Some(Status::Dirty));
        assert_eq!(graph.status("b"), Some(Status::Dirty));
        assert_eq!(graph.dirty().len(), 2);
    }

    #[test]
    fn test_needs_render_never_downgrades_dirty() {
        let divisions = [div("a", "0")];
        let mut graph = graph(&divisions);
        graph.set_needs_render("a").unwrap();
        assert_eq!(graph.status("a"), Some(Status::NeedsRender));
        graph.set_dirty(Some("a"), |_, _| {}).unwrap();
        graph.set_needs_render("a").unwrap();
        assert_eq!(graph.status("a"), Some(Status::Dirty));
        graph.mark_recomputed("a").unwrap();
        assert_eq!(graph.status("a"), Some(Status::NeedsRender));
        graph.reset();
        assert!(graph.is_clean());
    }

    #[test]
    fn test_render_queue_order() {
        let first = Division::new(
            DivisionSpec::new("first").top(0).left(0).width(1).render_order(5),
        )
        .unwrap();
        let divisions = [first, div("second", "0"), div("third", "0")];
        let mut graph = graph(&divisions);
        graph.set_dirty(None, |_, _| {}).unwrap();
        assert_eq!(graph.render_queue(), ["second", "third", "first"]);
    }

    #[test]
    fn test_set_divisions_keeps_existing_nodes() {
        let mut divisions = vec![div("a", "0"), div("b", "0")];
        let mut graph = graph(&divisions);
        divisions.remove(0);
        divisions.push(div("c", "0"));
        graph.set_divisions(&divisions);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.status("b"), Some(Status::Clean));
        assert_eq!(graph.status("c"), Some(Status::Dirty));
        assert_eq!(graph.status("a"), None);
    }
}

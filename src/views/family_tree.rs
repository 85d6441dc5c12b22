// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Fork genealogy

use super::View;
use crate::types::RepositoryRecord;
use chrono::{DateTime, Utc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A repository in the genealogy with what the tree view renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyTreeNode {
    /// Canonical `owner/name`
    pub id: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Browser URL
    pub url: String,
    /// Declared parent, which may be outside the scanned set
    pub parent: Option<String>,
    /// Known children, in first-seen order, without duplicates
    pub children: Vec<String>,
    /// Whether this is the network root
    pub is_root: bool,
    /// BFS depth from the root
    pub degree: u32,
    /// Label for `degree`
    pub degree_label: String,
    /// Rarity score
    pub rarity_score: f64,
    /// Generation number
    pub generation: u32,
    /// Raw SVG markup
    pub monkey_svg: Option<String>,
}

impl FamilyTreeNode {
    fn from_record(record: &RepositoryRecord) -> Self {
        Self {
            id: record.full_name.clone(),
            owner: record.identity.owner.clone(),
            repo: record.identity.name.clone(),
            url: record.url.clone(),
            parent: record.parent.clone(),
            children: Vec::new(),
            is_root: record.is_root,
            degree: record.degree,
            degree_label: record.degree_label.clone(),
            rarity_score: record.stats.rarity_score,
            generation: record.stats.generation,
            monkey_svg: record.svg.clone(),
        }
    }
}

/// `family_tree.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyTree {
    /// Generation timestamp
    pub last_updated: DateTime<Utc>,
    /// Full name of the network root
    pub root: String,
    /// Number of nodes
    pub total_nodes: usize,
    /// Nodes in first-seen order
    pub nodes: Vec<FamilyTreeNode>,
}

impl FamilyTree {
    /// Link every record to its parent when the parent was scanned too
    ///
    /// A record whose parent is unknown stays in the tree as the root of its
    /// own subtree. Duplicate records keep the first occurrence.
    #[must_use]
    pub fn build(root: &str, records: &[RepositoryRecord], now: DateTime<Utc>) -> Self {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let mut indices: HashMap<&str, NodeIndex> = HashMap::new();
        let mut nodes: Vec<FamilyTreeNode> = Vec::new();

        for record in records {
            if !indices.contains_key(record.full_name.as_str()) {
                let idx = graph.add_node(nodes.len());
                indices.insert(record.full_name.as_str(), idx);
                nodes.push(FamilyTreeNode::from_record(record));
            }
        }

        for record in records {
            let Some(parent) = record.parent.as_deref() else {
                continue;
            };
            if parent == record.full_name {
                continue;
            }
            if let (Some(&from), Some(&to)) = (
                indices.get(parent),
                indices.get(record.full_name.as_str()),
            ) {
                // update_edge keeps a single edge per pair
                graph.update_edge(from, to, ());
            }
        }

        let children: Vec<Vec<String>> = graph
            .node_indices()
            .map(|idx| {
                let mut edges: Vec<_> = graph
                    .edges_directed(idx, Direction::Outgoing)
                    .map(|e| (e.id(), e.target()))
                    .collect();
                edges.sort_by_key(|(id, _)| *id);
                edges
                    .into_iter()
                    .map(|(_, target)| nodes[graph[target]].id.clone())
                    .collect()
            })
            .collect();
        for (node, kids) in nodes.iter_mut().zip(children) {
            node.children = kids;
        }

        Self {
            last_updated: now,
            root: root.to_string(),
            total_nodes: nodes.len(),
            nodes,
        }
    }

    /// Look up a node by full name
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&FamilyTreeNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes without a known parent: the network root and orphaned subtrees
    #[must_use]
    pub fn roots(&self) -> Vec<&FamilyTreeNode> {
        self.nodes
            .iter()
            .filter(|n| match n.parent.as_deref() {
                Some(parent) => parent == n.id || self.node(parent).is_none(),
                None => true,
            })
            .collect()
    }
}

impl View for FamilyTree {
    const FILE_NAME: &'static str = "family_tree.json";

    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::fixtures::record;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_children_linked_in_order() {
        let records = vec![
            record("root/monkey", None, 10.0),
            record("a/monkey", Some("root/monkey"), 20.0),
            record("b/monkey", Some("root/monkey"), 30.0),
            record("c/monkey", Some("a/monkey"), 40.0),
        ];

        let tree = FamilyTree::build("root/monkey", &records, now());

        assert_eq!(tree.total_nodes, 4);
        assert_eq!(
            tree.node("root/monkey").unwrap().children,
            vec!["a/monkey", "b/monkey"]
        );
        assert_eq!(tree.node("a/monkey").unwrap().children, vec!["c/monkey"]);
        assert!(tree.node("c/monkey").unwrap().children.is_empty());
    }

    #[test]
    fn test_dangling_parent_becomes_subtree_root() {
        let records = vec![
            record("root/monkey", None, 10.0),
            record("orphan/monkey", Some("ghost/monkey"), 20.0),
            record("kid/monkey", Some("orphan/monkey"), 5.0),
        ];

        let tree = FamilyTree::build("root/monkey", &records, now());

        let roots: Vec<_> = tree.roots().into_iter().map(|n| n.id.as_str()).collect();
        assert_eq!(roots, vec!["root/monkey", "orphan/monkey"]);
        assert_eq!(
            tree.node("orphan/monkey").unwrap().parent.as_deref(),
            Some("ghost/monkey")
        );
        assert_eq!(tree.node("orphan/monkey").unwrap().children, vec!["kid/monkey"]);
    }

    #[test]
    fn test_duplicate_records_do_not_duplicate_children() {
        let records = vec![
            record("root/monkey", None, 10.0),
            record("a/monkey", Some("root/monkey"), 20.0),
            record("a/monkey", Some("root/monkey"), 20.0),
        ];

        let tree = FamilyTree::build("root/monkey", &records, now());

        assert_eq!(tree.total_nodes, 2);
        assert_eq!(tree.node("root/monkey").unwrap().children, vec!["a/monkey"]);
    }

    #[test]
    fn test_child_listed_before_parent_is_still_linked() {
        let records = vec![
            record("c/monkey", Some("a/monkey"), 1.0),
            record("a/monkey", None, 2.0),
        ];

        let tree = FamilyTree::build("a/monkey", &records, now());

        assert_eq!(tree.node("a/monkey").unwrap().children, vec!["c/monkey"]);
    }
}

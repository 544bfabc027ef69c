//! Source node ids to dense target indices, and back.

use crate::space::FiniteElementSpace;
use crate::ElementId;
use crate::NodeId;
use crate::SourceMesh;
use itertools::Itertools as _;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

/// Bijection between source node ids and target node indices.
///
/// Corner nodes get indices `0..vertex_count()`, second-order nodes get
/// indices `vertex_count()..node_count()`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeIdentityMap {
    vertex_for_node: HashMap<NodeId, usize>,
    node_for_vertex: Vec<NodeId>,
    extra_for_node: HashMap<NodeId, usize>,
    node_for_extra: Vec<NodeId>,
}

impl NodeIdentityMap {
    /// Number each distinct corner id in the order it is first met.
    pub fn assign_vertex_indices<I>(corner_ids: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut map = NodeIdentityMap::default();
        for node in corner_ids {
            if let Entry::Vacant(entry) = map.vertex_for_node.entry(node) {
                entry.insert(map.node_for_vertex.len());
                map.node_for_vertex.push(node);
            }
        }
        map
    }

    /// Number the midside ids of the given elements that are not corners yet,
    /// continuing after the last vertex index.
    ///
    /// Each item is the full node list of an element and the number of its
    /// leading corner nodes.
    pub fn assign_second_order_indices<'a, I>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = (&'a [NodeId], usize)>,
    {
        for (nodes, corner_count) in elements {
            for &node in &nodes[corner_count..] {
                if self.vertex_for_node.contains_key(&node) {
                    continue;
                }
                if let Entry::Vacant(entry) = self.extra_for_node.entry(node) {
                    entry.insert(self.node_for_vertex.len() + self.node_for_extra.len());
                    self.node_for_extra.push(node);
                }
            }
        }
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.node_for_vertex.len()
    }

    /// Number of mapped nodes, corners included.
    pub fn node_count(&self) -> usize {
        self.node_for_vertex.len() + self.node_for_extra.len()
    }

    pub fn vertex_index(&self, node: NodeId) -> Option<usize> {
        self.vertex_for_node.get(&node).copied()
    }

    /// Target index of a node, corner or not.
    pub fn node_index(&self, node: NodeId) -> Option<usize> {
        self.vertex_index(node)
            .or_else(|| self.extra_for_node.get(&node).copied())
    }

    /// Source id of a target node index.
    pub fn source_node(&self, index: usize) -> Option<NodeId> {
        match self.node_for_vertex.get(index) {
            Some(&node) => Some(node),
            None => self
                .node_for_extra
                .get(index - self.node_for_vertex.len())
                .copied(),
        }
    }

    pub fn is_corner(&self, node: NodeId) -> bool {
        self.vertex_for_node.contains_key(&node)
    }

    /// Source ids of the vertices, in vertex index order.
    pub fn corner_nodes(&self) -> &[NodeId] {
        &self.node_for_vertex
    }
}

/// Settings of the verification pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VerifyOptions {
    /// Largest accepted difference between coordinate components. Zero
    /// asks for exact equality.
    pub tolerance: f64,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self { tolerance: 0.0 }
    }
}

/// A node mapping that is not one-to-one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DuplicateMapping {
    /// Two source nodes claim the same target node.
    SharedIndex {
        index: usize,
        first: NodeId,
        second: NodeId,
    },
    /// One source node appears at two target nodes.
    SplitNode {
        node: NodeId,
        first: usize,
        second: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateMismatch {
    pub node: NodeId,
    pub index: usize,
    pub expected: [f64; 3],
    pub actual: [f64; 3],
}

/// Everything wrong with a node mapping, found in a single pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VerificationReport {
    /// Source ids with coordinates but no target index.
    pub unmapped_nodes: Vec<NodeId>,
    /// Target indices no source id maps to.
    pub unmapped_indices: Vec<usize>,
    pub duplicates: Vec<DuplicateMapping>,
    pub mismatches: Vec<CoordinateMismatch>,
}

impl VerificationReport {
    pub fn is_empty(&self) -> bool {
        self.unmapped_nodes.is_empty()
            && self.unmapped_indices.is_empty()
            && self.duplicates.is_empty()
            && self.mismatches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.unmapped_nodes.len()
            + self.unmapped_indices.len()
            + self.duplicates.len()
            + self.mismatches.len()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} unmapped source nodes, {} unmapped target nodes, {} duplicate mappings, {} coordinate mismatches",
            self.unmapped_nodes.len(),
            self.unmapped_indices.len(),
            self.duplicates.len(),
            self.mismatches.len(),
        )?;
        for node in &self.unmapped_nodes {
            write!(f, "\n  source node {node} has no target node")?;
        }
        for index in &self.unmapped_indices {
            write!(f, "\n  target node {index} has no source node")?;
        }
        for d in &self.duplicates {
            match d {
                DuplicateMapping::SharedIndex {
                    index,
                    first,
                    second,
                } => write!(
                    f,
                    "\n  target node {index} is claimed by source nodes {first} and {second}",
                )?,
                DuplicateMapping::SplitNode {
                    node,
                    first,
                    second,
                } => write!(
                    f,
                    "\n  source node {node} is mapped to target nodes {first} and {second}",
                )?,
            }
        }
        for m in &self.mismatches {
            write!(
                f,
                "\n  source node {} at {:?} but target node {} at {:?}",
                m.node, m.expected, m.index, m.actual,
            )?;
        }
        Ok(())
    }
}

/// Check that `map`, the finite-element space and the nodal coordinates agree
/// with the source mesh.
///
/// `elements` lists the source element of every target element, in target
/// order. `nodes` holds the coordinates of every dof of `space`.
pub fn verify<S>(
    space: &FiniteElementSpace,
    source: &S,
    elements: &[ElementId],
    map: &NodeIdentityMap,
    nodes: &[[f64; 3]],
    options: VerifyOptions,
) -> VerificationReport
where
    S: SourceMesh + ?Sized,
{
    let mut report = VerificationReport::default();
    let mut claimed_by: Vec<Option<NodeId>> = vec![None; space.dof_count()];

    for (e, &element) in elements.iter().enumerate() {
        let source_nodes = source.element_nodes(element).unwrap_or(&[]);
        for (&node, &dof) in source_nodes.iter().zip(space.element_dofs(e)) {
            match claimed_by[dof] {
                None => claimed_by[dof] = Some(node),
                Some(first) if first != node => {
                    report.duplicates.push(DuplicateMapping::SharedIndex {
                        index: dof,
                        first,
                        second: node,
                    })
                }
                Some(_) => {}
            }
            match map.node_index(node) {
                Some(index) if index != dof => {
                    report.duplicates.push(DuplicateMapping::SplitNode {
                        node,
                        first: index,
                        second: dof,
                    })
                }
                // Missing ids are caught below, with the other unmapped nodes.
                _ => {}
            }
            let (Some(expected), Some(&actual)) = (source.coordinates(node), nodes.get(dof))
            else {
                continue;
            };
            let equal = expected
                .iter()
                .zip(actual)
                .all(|(a, b)| approx::abs_diff_eq!(*a, b, epsilon = options.tolerance));
            if !equal {
                report.mismatches.push(CoordinateMismatch {
                    node,
                    index: dof,
                    expected,
                    actual,
                });
            }
        }
    }

    report.unmapped_indices = claimed_by.iter().positions(Option::is_none).collect();
    report.unmapped_nodes = source
        .node_ids()
        .filter(|&node| map.node_index(node).is_none())
        .collect();

    report.unmapped_nodes.sort_unstable();
    report.duplicates.sort_unstable();
    report.duplicates.dedup();
    report.mismatches.sort_by_key(|m| (m.index, m.node));
    report.mismatches.dedup();
    report
}

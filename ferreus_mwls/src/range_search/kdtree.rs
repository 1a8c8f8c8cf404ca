/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides a bucketed KD-tree for fixed-radius neighbour queries in MWLS fits.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use super::RangeSearch;
use crate::config::SearchBackend;
use faer::Mat;
use ferreus_mwls_utils::{get_distance, get_distance_to_row};
use std::cmp::Ordering;
use std::sync::Arc;

/// What a node holds: either a bucket of points or two children.
#[derive(Debug)]
enum NodeKind {
    /// Points `indices[start..end]`.
    Leaf { start: usize, end: usize },
    Branch { left: usize, right: usize },
}

/// A node in the KDTree, with the bounding box of every point below it.
#[derive(Debug)]
struct Node {
    mins: Vec<f64>,
    maxs: Vec<f64>,
    kind: NodeKind,
}

impl Node {
    /// Distance from `target` to the closest point of the node's bounding box.
    ///
    /// Never larger than the distance from `target` to any point in the node, so a
    /// node can be skipped whenever this exceeds the search radius.
    fn min_distance(&self, target: &[f64]) -> f64 {
        let closest: Vec<f64> = target
            .iter()
            .zip(self.mins.iter().zip(self.maxs.iter()))
            // Not `clamp`: an all-NaN axis leaves `lo > hi`.
            .map(|(&t, (&lo, &hi))| t.max(lo).min(hi))
            .collect();
        get_distance(target, &closest)
    }
}

/// The KDTree structure
///
/// Built once over all sample points. Leaves hold at most `leaf_size` points;
/// internal nodes split on their widest axis at the median, so the tree is
/// balanced regardless of how the points are clustered.
#[derive(Debug)]
pub struct KDTree {
    points: Arc<Mat<f64>>,
    indices: Vec<usize>,
    nodes: Vec<Node>,
    leaf_size: usize,
}

impl KDTree {
    /// Constructs a new KDTree from a Mat of points, one point per row.
    pub fn new(points: Arc<Mat<f64>>, leaf_size: usize) -> Self {
        let leaf_size = leaf_size.max(1);
        let mut indices: Vec<usize> = (0..points.nrows()).collect();
        let mut nodes = Vec::new();

        if !indices.is_empty() {
            Self::build_tree(&points, &mut nodes, &mut indices, 0, leaf_size);
        }

        KDTree {
            points,
            indices,
            nodes,
            leaf_size,
        }
    }

    #[inline]
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Number of nodes, leaves included.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Recursively builds the KDTree over `indices` and stores nodes in a flat vector.
    ///
    /// `offset` is the position of `indices[0]` within the tree's full index array.
    fn build_tree(
        points: &Mat<f64>,
        nodes: &mut Vec<Node>,
        indices: &mut [usize],
        offset: usize,
        leaf_size: usize,
    ) -> usize {
        let (mins, maxs) = bounding_box(points, indices);

        // Create the current node
        let node_index = nodes.len();

        if indices.len() <= leaf_size {
            nodes.push(Node {
                mins,
                maxs,
                kind: NodeKind::Leaf {
                    start: offset,
                    end: offset + indices.len(),
                },
            });
            return node_index;
        }

        // Split along the axis with the largest spread
        let axis = mins
            .iter()
            .zip(maxs.iter())
            .map(|(lo, hi)| hi - lo)
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .map(|(axis, _)| axis)
            .unwrap_or(0);

        // Choose the median as the pivot
        let mid = indices.len() / 2;
        indices.select_nth_unstable_by(mid, |&a, &b| {
            points[(a, axis)]
                .partial_cmp(&points[(b, axis)])
                .unwrap_or(Ordering::Equal)
        });

        nodes.push(Node {
            mins,
            maxs,
            kind: NodeKind::Branch { left: 0, right: 0 },
        });

        // Recursively build left and right subtrees
        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = Self::build_tree(points, nodes, left_indices, offset, leaf_size);
        let right = Self::build_tree(points, nodes, right_indices, offset + mid, leaf_size);

        nodes[node_index].kind = NodeKind::Branch { left, right };

        node_index
    }

    /// Performs a radius search around a target point.
    pub fn radius_search(&self, target: &[f64], radius: f64) -> Vec<usize> {
        let mut result = Vec::new();
        if self.nodes.is_empty() || !(radius >= 0.0) {
            return result;
        }
        self.radius_search_impl(0, target, radius, &mut result);
        result.sort_unstable();
        result
    }

    fn radius_search_impl(
        &self,
        node_index: usize,
        target: &[f64],
        radius: f64,
        result: &mut Vec<usize>,
    ) {
        let node = &self.nodes[node_index];

        if node.min_distance(target) > radius {
            return;
        }

        match node.kind {
            NodeKind::Leaf { start, end } => {
                result.extend(
                    self.indices[start..end]
                        .iter()
                        .copied()
                        .filter(|&i| get_distance_to_row(target, &self.points, i) <= radius),
                );
            }
            NodeKind::Branch { left, right } => {
                self.radius_search_impl(left, target, radius, result);
                self.radius_search_impl(right, target, radius, result);
            }
        }
    }
}

impl RangeSearch for KDTree {
    fn neighbours(&self, point: &[f64], radius: f64) -> Vec<usize> {
        self.radius_search(point, radius)
    }

    fn backend(&self) -> SearchBackend {
        SearchBackend::KdTree
    }
}

/// Per-axis minimum and maximum of the selected rows.
fn bounding_box(points: &Mat<f64>, indices: &[usize]) -> (Vec<f64>, Vec<f64>) {
    let d = points.ncols();
    let mut mins = vec![f64::INFINITY; d];
    let mut maxs = vec![f64::NEG_INFINITY; d];

    for &i in indices {
        for k in 0..d {
            let x = points[(i, k)];
            mins[k] = mins[k].min(x);
            maxs[k] = maxs[k].max(x);
        }
    }

    (mins, maxs)
}

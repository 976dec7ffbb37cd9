//! Decision tree evaluation shared by the supervised model families
//!
//! Trees arrive inside model artifacts as flat node arrays with child
//! indices. Every node carries the expected output of its subtree, which is
//! what lets the attribution engine decompose a prediction along the
//! decision path: each split moves the running expectation from the parent
//! value to the taken child's value, and that delta is credited to the
//! split feature. The deltas plus the root value reconstruct the leaf value
//! exactly.

use serde::{Deserialize, Serialize};

/// Node of a fitted decision tree.
///
/// Split convention follows the training library: `x[feature] <= threshold`
/// goes left, otherwise right.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        /// Expected subtree output under the training distribution
        value: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A fitted decision tree as a flat node array, root at index 0.
///
/// Invariant (enforced by [`DecisionTree::validate`] at artifact load, never
/// re-checked on the hot path): child indices point forward into `nodes`,
/// so traversal terminates and never leaves the array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Check structural soundness against the expected feature arity.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {idx} splits on feature {feature}, schema has {n_features}"
                    ));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!(
                            "node {idx} has child index {child} outside ({idx}, {})",
                            self.nodes.len()
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Output value at the leaf this feature vector routes to.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Walk the decision path, accumulating per-feature value deltas into
    /// `acc` (length = feature arity). Returns the root expected value, the
    /// tree's share of the additive baseline.
    pub fn path_contributions(&self, features: &[f64], acc: &mut [f64]) -> f64 {
        let mut idx = 0;
        let root_value = self.node_value(0);
        let mut current = root_value;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { .. } => return root_value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let child = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                    let child_value = self.node_value(child);
                    acc[*feature] += child_value - current;
                    current = child_value;
                    idx = child;
                }
            }
        }
    }

    fn node_value(&self, idx: usize) -> f64 {
        match &self.nodes[idx] {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split { value, .. } => *value,
        }
    }

    /// Convenience constructor for a single-leaf tree.
    pub fn leaf(value: f64) -> Self {
        DecisionTree {
            nodes: vec![TreeNode::Leaf { value }],
        }
    }

    /// Convenience constructor for a one-split stump.
    pub fn stump(
        feature: usize,
        threshold: f64,
        root_value: f64,
        left_value: f64,
        right_value: f64,
    ) -> Self {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    value: root_value,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: left_value },
                TreeNode::Leaf { value: right_value },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level_tree() -> DecisionTree {
        // Split on f0 at 10.0; left branch splits on f1 at 1.0.
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 10.0,
                    value: 0.2,
                    left: 1,
                    right: 2,
                },
                TreeNode::Split {
                    feature: 1,
                    threshold: 1.0,
                    value: -0.1,
                    left: 3,
                    right: 4,
                },
                TreeNode::Leaf { value: 0.8 },
                TreeNode::Leaf { value: -0.4 },
                TreeNode::Leaf { value: 0.3 },
            ],
        }
    }

    #[test]
    fn test_evaluate_routes_by_threshold() {
        let tree = two_level_tree();
        assert_eq!(tree.evaluate(&[5.0, 0.5]), -0.4);
        assert_eq!(tree.evaluate(&[5.0, 2.0]), 0.3);
        assert_eq!(tree.evaluate(&[20.0, 0.0]), 0.8);
        // Boundary goes left
        assert_eq!(tree.evaluate(&[10.0, 2.0]), 0.3);
    }

    #[test]
    fn test_path_contributions_reconstruct_leaf() {
        let tree = two_level_tree();
        for x in [[5.0, 0.5], [5.0, 2.0], [20.0, 0.0]] {
            let mut acc = vec![0.0; 2];
            let baseline = tree.path_contributions(&x, &mut acc);
            let total: f64 = baseline + acc.iter().sum::<f64>();
            assert!((total - tree.evaluate(&x)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_contribution_credited_to_split_feature() {
        let tree = two_level_tree();
        let mut acc = vec![0.0; 2];
        tree.path_contributions(&[20.0, 0.0], &mut acc);
        // Only f0 was on the path
        assert!((acc[0] - 0.6).abs() < 1e-12);
        assert_eq!(acc[1], 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_indices() {
        let tree = DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 1.0,
                value: 0.0,
                left: 0,
                right: 5,
            }],
        };
        assert!(tree.validate(1).is_err());

        let tree = DecisionTree::stump(3, 1.0, 0.0, -0.1, 0.1);
        assert!(tree.validate(2).is_err());
        assert!(tree.validate(4).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty() {
        let tree = DecisionTree { nodes: vec![] };
        assert!(tree.validate(1).is_err());
    }
}

//! Classifier models that can be deserialized from the artifacts file.

use serde::Deserialize;

use super::InferenceError;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    /// Gradient-boosted trees: per-class additive margins
    TreeEnsemble(TreeEnsemble),
    /// Class scores `W·x + b`
    Linear { weights: Vec<Vec<f64>>, bias: Vec<f64> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    pub num_classes: usize,
    /// Starting margin for every class
    #[serde(default)]
    pub base_score: f64,
    /// Trees are assigned to classes round-robin. A binary model has one
    /// output group and predicts class 1 when the margin is positive.
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go `left` when `x[feature] < threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Tree {
    fn check(&self, input_dim: usize) -> Result<(), InferenceError> {
        if self.nodes.is_empty() {
            return Err(InferenceError::MalformedModel("tree has no nodes".to_string()));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { feature, left, right, .. } = node {
                if *feature >= input_dim {
                    return Err(InferenceError::MalformedModel(format!(
                        "node {} splits on feature {} but input has {} features",
                        idx, feature, input_dim
                    )));
                }
                // Children must point forward, which also rules out cycles
                for child in [left, right] {
                    if *child <= idx || *child >= self.nodes.len() {
                        return Err(InferenceError::MalformedModel(format!(
                            "node {} has invalid child {}",
                            idx, child
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_value(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if features[*feature] < *threshold { *left } else { *right };
                }
            }
        }
    }
}

impl TreeEnsemble {
    fn output_groups(&self) -> usize {
        if self.num_classes == 2 {
            1
        } else {
            self.num_classes
        }
    }

    fn predict(&self, features: &[f64]) -> usize {
        let groups = self.output_groups();
        let mut margins = vec![self.base_score; groups];
        for (i, tree) in self.trees.iter().enumerate() {
            margins[i % groups] += tree.leaf_value(features);
        }

        if groups == 1 {
            usize::from(margins[0] > 0.0)
        } else {
            argmax(&margins)
        }
    }
}

impl ClassifierModel {
    pub fn num_classes(&self) -> usize {
        match self {
            ClassifierModel::TreeEnsemble(ensemble) => ensemble.num_classes,
            ClassifierModel::Linear { weights, .. } => weights.len(),
        }
    }

    /// Reject models that cannot be evaluated on `input_dim` features
    pub fn check(&self, input_dim: usize) -> Result<(), InferenceError> {
        match self {
            ClassifierModel::TreeEnsemble(ensemble) => {
                if ensemble.num_classes < 2 {
                    return Err(InferenceError::MalformedModel(
                        "tree ensemble needs at least two classes".to_string(),
                    ));
                }
                if ensemble.trees.is_empty() {
                    return Err(InferenceError::MalformedModel("tree ensemble has no trees".to_string()));
                }
                ensemble.trees.iter().try_for_each(|tree| tree.check(input_dim))
            }
            ClassifierModel::Linear { weights, bias } => {
                if weights.is_empty() || weights.len() != bias.len() {
                    return Err(InferenceError::MalformedModel(format!(
                        "linear model has {} weight rows and {} biases",
                        weights.len(),
                        bias.len()
                    )));
                }
                match weights.iter().find(|row| row.len() != input_dim) {
                    Some(row) => Err(InferenceError::DimensionMismatch {
                        expected: input_dim,
                        actual: row.len(),
                    }),
                    None => Ok(()),
                }
            }
        }
    }

    /// Class index for an already projected feature vector
    pub fn predict(&self, features: &[f64]) -> usize {
        match self {
            ClassifierModel::TreeEnsemble(ensemble) => ensemble.predict(features),
            ClassifierModel::Linear { weights, bias } => {
                let scores: Vec<f64> = weights
                    .iter()
                    .zip(bias)
                    .map(|(row, b)| dot(row, features) + b)
                    .collect();
                argmax(&scores)
            }
        }
    }
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Index of the largest score; the first one wins ties
fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, score) in scores.iter().enumerate() {
        if *score > scores[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Tree {
        Tree {
            nodes: vec![
                TreeNode::Split { feature, threshold, left: 1, right: 2 },
                TreeNode::Leaf { value: left },
                TreeNode::Leaf { value: right },
            ],
        }
    }

    #[test]
    fn test_binary_ensemble_uses_margin_sign() {
        let model = ClassifierModel::TreeEnsemble(TreeEnsemble {
            num_classes: 2,
            base_score: 0.0,
            trees: vec![stump(0, 1.0, -0.5, 0.5), stump(1, 0.0, -0.1, 0.2)],
        });
        assert!(model.check(2).is_ok());

        assert_eq!(model.predict(&[0.0, -1.0]), 0);
        assert_eq!(model.predict(&[2.0, 1.0]), 1);
        // -0.5 + 0.2 stays negative
        assert_eq!(model.predict(&[0.0, 1.0]), 0);
    }

    #[test]
    fn test_multiclass_ensemble_round_robin() {
        let model = ClassifierModel::TreeEnsemble(TreeEnsemble {
            num_classes: 3,
            base_score: 0.5,
            trees: vec![
                stump(0, 0.0, 1.0, -1.0),
                stump(0, 0.0, -1.0, 0.0),
                stump(0, 5.0, -1.0, 3.0),
            ],
        });
        assert_eq!(model.predict(&[-1.0]), 0);
        assert_eq!(model.predict(&[1.0]), 1);
        assert_eq!(model.predict(&[9.0]), 2);
    }

    #[test]
    fn test_linear_model_argmax() {
        let model = ClassifierModel::Linear {
            weights: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            bias: vec![0.0, 0.5],
        };
        assert!(model.check(2).is_ok());
        assert_eq!(model.predict(&[1.0, 0.0]), 0);
        assert_eq!(model.predict(&[0.0, 0.0]), 1);
    }

    #[test]
    fn test_check_rejects_bad_trees() {
        let bad_feature = ClassifierModel::TreeEnsemble(TreeEnsemble {
            num_classes: 2,
            base_score: 0.0,
            trees: vec![stump(3, 0.0, 0.0, 0.0)],
        });
        assert!(matches!(bad_feature.check(2), Err(InferenceError::MalformedModel(_))));

        let cycle = ClassifierModel::TreeEnsemble(TreeEnsemble {
            num_classes: 2,
            base_score: 0.0,
            trees: vec![Tree {
                nodes: vec![TreeNode::Split { feature: 0, threshold: 0.0, left: 0, right: 0 }],
            }],
        });
        assert!(cycle.check(1).is_err());
    }

    #[test]
    fn test_check_rejects_linear_dimension_mismatch() {
        let model = ClassifierModel::Linear {
            weights: vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
            bias: vec![0.0, 0.0],
        };
        assert!(matches!(
            model.check(2),
            Err(InferenceError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_tree_nodes_deserialize() {
        let tree: Tree = serde_json::from_str(
            r#"{"nodes": [
                {"feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                {"value": -0.3},
                {"value": 0.7}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(tree.nodes[0], TreeNode::Split { feature: 0, .. }));
        assert!(matches!(tree.nodes[2], TreeNode::Leaf { .. }));
    }
}

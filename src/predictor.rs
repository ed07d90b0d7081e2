use std::path::Path;

use serde::Deserialize;

use crate::error::{ModelLoadError, PredictError};
use crate::features::FeatureVector;
use crate::schema::FeatureSchema;

/// Classifier seam. Implementations are shared across request handlers, so
/// `predict` must not mutate state; wrap non-reentrant models in a lock.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<String, PredictError>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn leaf_for(&self, sample: &[f64]) -> Option<usize> {
        let mut idx = 0;
        // Children must sit after their parent; a backwards edge is malformed.
        loop {
            match self.nodes.get(idx)? {
                TreeNode::Leaf { class } => return Some(*class),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let next = if *sample.get(*feature)? <= *threshold {
                        *left
                    } else {
                        *right
                    };
                    if next <= idx {
                        return None;
                    }
                    idx = next;
                }
            }
        }
    }

    fn check(
        &self,
        tree_idx: usize,
        n_features: usize,
        n_classes: usize,
    ) -> Result<(), ModelLoadError> {
        if self.nodes.is_empty() {
            return Err(ModelLoadError::invalid(format!("tree {tree_idx} has no nodes")));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { class } => {
                    if *class >= n_classes {
                        return Err(ModelLoadError::invalid(format!(
                            "tree {tree_idx} node {idx}: class {class} out of range ({n_classes} classes)"
                        )));
                    }
                }
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(ModelLoadError::invalid(format!(
                            "tree {tree_idx} node {idx}: feature {feature} out of range ({n_features} features)"
                        )));
                    }
                    for child in [left, right] {
                        if *child <= idx || *child >= self.nodes.len() {
                            return Err(ModelLoadError::invalid(format!(
                                "tree {tree_idx} node {idx}: child {child} must come after its parent and exist"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForestModel {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    classes: Vec<String>,
    trees: Vec<DecisionTree>,
    #[serde(skip)]
    n_features: usize,
}

impl ForestModel {
    pub fn load(path: &Path, schema: &FeatureSchema) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw, schema)
    }

    pub fn from_json(raw: &str, schema: &FeatureSchema) -> Result<Self, ModelLoadError> {
        let mut model: ForestModel = serde_json::from_str(raw)?;
        model.check(schema)?;
        model.n_features = schema.len();
        Ok(model)
    }

    fn check(&self, schema: &FeatureSchema) -> Result<(), ModelLoadError> {
        if self.classes.is_empty() {
            return Err(ModelLoadError::invalid("model declares no classes"));
        }
        if self.trees.is_empty() {
            return Err(ModelLoadError::invalid("model contains no trees"));
        }

        if let Some(names) = &self.feature_names {
            if names.iter().map(String::as_str).ne(schema.fields().iter().copied()) {
                return Err(ModelLoadError::invalid(format!(
                    "feature order {:?} does not match expected {:?}",
                    names,
                    schema.fields()
                )));
            }
        }

        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.check(tree_idx, schema.len(), self.classes.len())?;
        }
        Ok(())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for ForestModel {
    fn predict(&self, features: &FeatureVector) -> Result<String, PredictError> {
        let sample = features.to_numeric()?;
        if sample.len() != self.n_features {
            return Err(PredictError::prediction(format!(
                "expected {} features, got {}",
                self.n_features,
                sample.len()
            )));
        }

        let mut votes = vec![0usize; self.classes.len()];
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            match tree.leaf_for(&sample).filter(|class| *class < votes.len()) {
                Some(class) => votes[class] += 1,
                None => {
                    return Err(PredictError::prediction(format!(
                        "tree {tree_idx} is malformed"
                    )))
                }
            }
        }

        // Ties resolve to the lowest class index.
        let winner = votes
            .iter()
            .enumerate()
            .fold(0, |best, (idx, count)| if *count > votes[best] { idx } else { best });

        self.classes
            .get(winner)
            .cloned()
            .ok_or_else(|| PredictError::prediction("model declares no classes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STUMP: &str = r#"{
        "feature_names": ["module_count", "total_study_duration", "avg_study_per_module",
                          "avg_completion_ratio", "avg_submission_rating"],
        "classes": ["Consistent", "Fast Learner"],
        "trees": [
            { "nodes": [
                { "feature": 3, "threshold": 0.75, "left": 1, "right": 2 },
                { "class": 0 },
                { "class": 1 }
            ] }
        ]
    }"#;

    fn sample(completion: f64) -> FeatureVector {
        [
            ("module_count", 5.0),
            ("total_study_duration", 120.0),
            ("avg_study_per_module", 24.0),
            ("avg_completion_ratio", completion),
            ("avg_submission_rating", 4.5),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn routes_samples_through_threshold() {
        let model = ForestModel::from_json(STUMP, &FeatureSchema::default()).unwrap();
        assert_eq!(model.predict(&sample(0.9)).unwrap(), "Fast Learner");
        assert_eq!(model.predict(&sample(0.75)).unwrap(), "Consistent");
        assert_eq!(model.predict(&sample(0.2)).unwrap(), "Consistent");
    }

    #[test]
    fn majority_vote_with_low_index_tie_break() {
        let raw = r#"{
            "classes": ["A", "B"],
            "trees": [
                { "nodes": [{ "class": 1 }] },
                { "nodes": [{ "class": 0 }] }
            ]
        }"#;
        let model = ForestModel::from_json(raw, &FeatureSchema::default()).unwrap();
        assert_eq!(model.predict(&sample(0.5)).unwrap(), "A");

        let raw = r#"{
            "classes": ["A", "B"],
            "trees": [
                { "nodes": [{ "class": 1 }] },
                { "nodes": [{ "class": 0 }] },
                { "nodes": [{ "class": 1 }] }
            ]
        }"#;
        let model = ForestModel::from_json(raw, &FeatureSchema::default()).unwrap();
        assert_eq!(model.predict(&sample(0.5)).unwrap(), "B");
    }

    #[test]
    fn rejects_mismatched_feature_order() {
        let raw = STUMP.replace(
            r#"["module_count", "total_study_duration""#,
            r#"["total_study_duration", "module_count""#,
        );
        let err = ForestModel::from_json(&raw, &FeatureSchema::default()).unwrap_err();
        assert!(err.to_string().contains("feature order"));
    }

    #[test]
    fn rejects_cycles_and_out_of_range_indices() {
        let schema = FeatureSchema::default();
        let cyclic = r#"{"classes": ["A"], "trees": [{ "nodes": [
            { "feature": 0, "threshold": 1.0, "left": 0, "right": 0 }
        ] }]}"#;
        assert!(ForestModel::from_json(cyclic, &schema).is_err());

        let bad_feature = r#"{"classes": ["A"], "trees": [{ "nodes": [
            { "feature": 9, "threshold": 1.0, "left": 1, "right": 2 },
            { "class": 0 }, { "class": 0 }
        ] }]}"#;
        assert!(ForestModel::from_json(bad_feature, &schema).is_err());

        let bad_class = r#"{"classes": ["A"], "trees": [{ "nodes": [{ "class": 3 }] }]}"#;
        assert!(ForestModel::from_json(bad_class, &schema).is_err());

        let empty = r#"{"classes": [], "trees": []}"#;
        assert!(ForestModel::from_json(empty, &schema).is_err());
    }

    #[test]
    fn load_reports_missing_file_and_bad_json() {
        let schema = FeatureSchema::default();
        let err = ForestModel::load(Path::new("/nonexistent/model.json"), &schema).unwrap_err();
        assert!(matches!(err, ModelLoadError::Io { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = ForestModel::load(file.path(), &schema).unwrap_err();
        assert!(matches!(err, ModelLoadError::Parse(_)));
    }

    #[test]
    fn reports_counts_of_loaded_model() {
        let model = ForestModel::from_json(STUMP, &FeatureSchema::default()).unwrap();
        assert_eq!(model.class_count(), 2);
        assert_eq!(model.tree_count(), 1);
    }

    #[test]
    fn corrupted_tree_fails_without_panicking() {
        let mut model = ForestModel::from_json(STUMP, &FeatureSchema::default()).unwrap();
        model.trees[0].nodes[0] = TreeNode::Leaf { class: 9 };
        let err = model.predict(&sample(0.9)).unwrap_err();
        assert_eq!(err.to_string(), "tree 0 is malformed");

        let mut model = ForestModel::from_json(STUMP, &FeatureSchema::default()).unwrap();
        model.trees[0].nodes[0] = TreeNode::Split {
            feature: 42,
            threshold: 0.0,
            left: 1,
            right: 2,
        };
        assert!(model.predict(&sample(0.9)).is_err());

        let mut model = ForestModel::from_json(STUMP, &FeatureSchema::default()).unwrap();
        model.trees[0].nodes[1] = TreeNode::Split {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
        };
        assert!(model.predict(&sample(0.2)).is_err());
    }

    #[test]
    fn wrong_vector_length_is_a_prediction_failure() {
        let model = ForestModel::from_json(STUMP, &FeatureSchema::default()).unwrap();
        let short: FeatureVector = [("module_count", 5.0)].into_iter().collect();
        let err = model.predict(&short).unwrap_err();
        assert_eq!(err.to_string(), "expected 5 features, got 1");
    }

    #[test]
    fn non_numeric_feature_is_a_prediction_failure() {
        let model = ForestModel::from_json(STUMP, &FeatureSchema::default()).unwrap();
        let mut map = serde_json::Map::new();
        for field in FeatureSchema::default().fields() {
            map.insert(field.to_string(), serde_json::json!(1));
        }
        map.insert("module_count".to_string(), serde_json::json!("lima"));
        let vector = crate::features::build(
            &crate::models::InputRecord::new(map),
            &FeatureSchema::default(),
        );

        let err = model.predict(&vector).unwrap_err();
        assert!(matches!(err, PredictError::Prediction(_)));
    }
}

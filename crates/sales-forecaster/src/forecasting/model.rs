//! Serialized regression model and the capability the adapter consumes.

use super::encoder::FeatureRecord;
use super::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Artifact layout understood by [`ForecastModel::load`].
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Anything able to score one encoded record.
pub trait DemandModel: Send + Sync {
    fn predict(&self, record: &FeatureRecord) -> Result<f64, ModelError>;
}

/// Failure raised by a model while scoring a record.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("feature '{0}' expected by the model is missing from the input record")]
    MissingFeature(String),
    #[error("input record has {found} columns but the model was fitted on {expected}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("model failure: {0}")]
    Internal(String),
}

/// Startup failure while reading the model artifact. Always names the path.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model file not found at '{}'; place the trained artifact there or set APP_MODEL_PATH", .path.display())]
    NotFound { path: PathBuf },
    #[error("unable to read model file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("model file '{}' is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
    #[error("model file '{}' uses format version {found}, expected {expected}", .path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    #[error("model file '{}' is invalid: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ModelSaveError {
    #[error("unable to encode model artifact: {0}")]
    Encode(#[from] bincode::Error),
    #[error("unable to write model file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// On-disk representation of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub name: String,
    /// Columns the estimator was fitted on, in fit order.
    pub feature_names: Vec<String>,
    pub estimator: Estimator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Estimator {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    /// Averaged ensemble of regression trees.
    Forest { trees: Vec<RegressionTree> },
}

/// CART tree stored as a flat node list rooted at index 0.
///
/// Children always sit after their parent, so walking the tree terminates and
/// decoding it never recurses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

/// Samples with `row[feature_idx] <= threshold` go to `left`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

impl TreeNode {
    fn shifted(self, offset: usize) -> Self {
        match self {
            TreeNode::Leaf { .. } => self,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
            } => TreeNode::Split {
                feature_idx,
                threshold,
                left: left + offset,
                right: right + offset,
            },
        }
    }
}

impl RegressionTree {
    pub fn leaf(value: f64) -> Self {
        Self {
            nodes: vec![TreeNode::Leaf { value }],
        }
    }

    pub fn split(feature_idx: usize, threshold: f64, left: Self, right: Self) -> Self {
        let left_offset = 1;
        let right_offset = left_offset + left.nodes.len();

        let mut nodes = Vec::with_capacity(right_offset + right.nodes.len());
        nodes.push(TreeNode::Split {
            feature_idx,
            threshold,
            left: left_offset,
            right: right_offset,
        });
        nodes.extend(left.nodes.into_iter().map(|node| node.shifted(left_offset)));
        nodes.extend(right.nodes.into_iter().map(|node| node.shifted(right_offset)));
        Self { nodes }
    }

    /// Tree from an explicit node list; checked when the owning artifact is loaded.
    pub fn from_nodes(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    fn evaluate(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[feature_idx] <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree contains no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature_idx,
                left,
                right,
                ..
            } = *node
            {
                if feature_idx >= n_features {
                    return Err(format!(
                        "tree splits on feature {feature_idx} but only {n_features} features exist"
                    ));
                }
                for child in [left, right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(format!(
                            "tree node {index} points to child {child} outside {}..{}",
                            index + 1,
                            self.nodes.len()
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Estimator {
    fn evaluate(&self, row: &[f64]) -> f64 {
        match self {
            Estimator::Linear {
                intercept,
                coefficients,
            } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(row)
                        .map(|(weight, value)| weight * value)
                        .sum::<f64>()
            }
            Estimator::Forest { trees } => {
                let total: f64 = trees.iter().map(|tree| tree.evaluate(row)).sum();
                total / trees.len() as f64
            }
        }
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        match self {
            Estimator::Linear { coefficients, .. } => {
                if coefficients.len() != n_features {
                    return Err(format!(
                        "linear estimator has {} coefficients for {} features",
                        coefficients.len(),
                        n_features
                    ));
                }
            }
            Estimator::Forest { trees } => {
                if trees.is_empty() {
                    return Err("forest estimator contains no trees".to_string());
                }
                for (position, tree) in trees.iter().enumerate() {
                    tree.validate(n_features)
                        .map_err(|reason| format!("tree {position}: {reason}"))?;
                }
            }
        }
        Ok(())
    }
}

impl ModelArtifact {
    pub fn new(name: impl Into<String>, feature_names: Vec<String>, estimator: Estimator) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            name: name.into(),
            feature_names,
            estimator,
        }
    }

    /// Artifact fitted on the trained column layout.
    pub fn for_trained_schema(name: impl Into<String>, estimator: Estimator) -> Self {
        Self::new(name, FeatureSchema::trained().columns().to_vec(), estimator)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelSaveError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelSaveError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|source| ModelSaveError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Loaded artifact, immutable for the rest of the process.
#[derive(Debug, Clone)]
pub struct ForecastModel {
    artifact: ModelArtifact,
}

impl ForecastModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ModelLoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ModelLoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let model = Self::from_bytes(&bytes, path)?;
        info!(
            path = %path.display(),
            model = %model.name(),
            features = model.feature_names().len(),
            "model artifact loaded"
        );
        Ok(model)
    }

    /// Decodes an artifact; `origin` only labels errors.
    pub fn from_bytes(bytes: &[u8], origin: &Path) -> Result<Self, ModelLoadError> {
        let corrupt = |source| ModelLoadError::Corrupt {
            path: origin.to_path_buf(),
            source,
        };

        // The version leads the artifact so older layouts are reported before a full decode.
        let format_version: u32 = bincode::deserialize(bytes).map_err(corrupt)?;
        if format_version != MODEL_FORMAT_VERSION {
            return Err(ModelLoadError::UnsupportedVersion {
                path: origin.to_path_buf(),
                found: format_version,
                expected: MODEL_FORMAT_VERSION,
            });
        }

        let artifact: ModelArtifact = bincode::deserialize(bytes).map_err(corrupt)?;
        Self::from_artifact(artifact).map_err(|reason| ModelLoadError::Invalid {
            path: origin.to_path_buf(),
            reason,
        })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, String> {
        if artifact.feature_names.is_empty() {
            return Err("artifact declares no feature columns".to_string());
        }
        let mut seen = HashSet::with_capacity(artifact.feature_names.len());
        if let Some(duplicate) = artifact
            .feature_names
            .iter()
            .find(|name| !seen.insert(name.as_str()))
        {
            return Err(format!("feature column '{duplicate}' is declared more than once"));
        }
        artifact.estimator.validate(artifact.feature_names.len())?;

        let model = Self { artifact };
        if !model.matches_schema(FeatureSchema::trained()) {
            warn!(
                model = %model.name(),
                "model feature columns differ from the trained schema; predictions will fail"
            );
        }
        Ok(model)
    }

    pub fn name(&self) -> &str {
        &self.artifact.name
    }

    pub fn feature_names(&self) -> &[String] {
        &self.artifact.feature_names
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn matches_schema(&self, schema: &FeatureSchema) -> bool {
        self.feature_names() == schema.columns()
    }

    /// Single-row input aligned by column name to the fit order.
    fn align(&self, record: &FeatureRecord) -> Result<Vec<f64>, ModelError> {
        let row = self
            .feature_names()
            .iter()
            .map(|name| {
                record
                    .get(name)
                    .ok_or_else(|| ModelError::MissingFeature(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fitted = self.feature_names();
        if record.len() != row.len()
            || record.columns().iter().any(|column| !fitted.contains(column))
        {
            return Err(ModelError::ShapeMismatch {
                expected: row.len(),
                found: record.len(),
            });
        }
        Ok(row)
    }
}

impl DemandModel for ForecastModel {
    fn predict(&self, record: &FeatureRecord) -> Result<f64, ModelError> {
        let row = self.align(record)?;
        Ok(self.artifact.estimator.evaluate(&row))
    }
}

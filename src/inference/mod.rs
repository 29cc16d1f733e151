//! Parking-type inference.
//!
//! Wraps a classifier trained elsewhere together with its preprocessing:
//! vehicle-type encoding, feature scaling and a linear dimensionality
//! reduction. All of it is loaded once from a JSON artifacts file and is
//! read-only afterwards.

mod model;

pub use model::{ClassifierModel, Tree, TreeEnsemble, TreeNode};

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::VehicleType;
use model::dot;

/// Raw features per request: vehicle code, total charge, duration
const RAW_FEATURES: usize = 3;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Failed to read model artifacts: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model artifacts: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed model: {0}")]
    MalformedModel(String),

    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vehicle type '{0}' is unknown to the encoder")]
    UnknownVehicleType(String),

    #[error("Feature values must be finite numbers")]
    NonFiniteFeature,

    #[error("Classifier produced class {0}, which has no label")]
    UnknownClass(usize),
}

/// Seam between the portal and whatever produces the predicted label
pub trait LabelClassifier: Send + Sync {
    fn classify(
        &self,
        vehicle_type: VehicleType,
        total_charge: f64,
        duration: f64,
    ) -> Result<String, InferenceError>;
}

/// Maps category strings to integer codes by their position in `classes`
#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalEncoder {
    pub classes: Vec<String>,
}

impl CategoricalEncoder {
    pub fn encode(&self, value: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == value)
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }
}

/// Per-feature standardization `(x - mean) / scale`
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // A constant feature is stored with scale 0
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect()
    }
}

/// Linear projection `(x - mean) · componentsᵀ`
#[derive(Debug, Clone, Deserialize)]
pub struct LinearProjection {
    pub mean: Vec<f64>,
    pub components: Vec<Vec<f64>>,
}

impl LinearProjection {
    fn output_dim(&self) -> usize {
        self.components.len()
    }

    fn transform(&self, row: &[f64]) -> Vec<f64> {
        let centered: Vec<f64> = row.iter().zip(&self.mean).map(|(x, m)| x - m).collect();
        self.components.iter().map(|c| dot(c, &centered)).collect()
    }
}

/// On-disk layout of the model artifacts
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifacts {
    pub vehicle_encoder: CategoricalEncoder,
    pub scaler: StandardScaler,
    pub reducer: LinearProjection,
    pub classifier: ClassifierModel,
    pub label_decoder: CategoricalEncoder,
}

/// Validated preprocessing + classifier, ready to serve requests
#[derive(Debug, Clone)]
pub struct InferencePipeline {
    artifacts: ModelArtifacts,
}

impl InferencePipeline {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        info!("Loading model artifacts from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, InferenceError> {
        let artifacts: ModelArtifacts = serde_json::from_str(content)?;
        Self::new(artifacts)
    }

    pub fn new(artifacts: ModelArtifacts) -> Result<Self, InferenceError> {
        let ModelArtifacts {
            vehicle_encoder,
            scaler,
            reducer,
            classifier,
            label_decoder,
        } = &artifacts;

        if vehicle_encoder.classes.is_empty() {
            return Err(InferenceError::MalformedModel("vehicle encoder has no classes".to_string()));
        }
        for (name, len) in [("scaler mean", scaler.mean.len()), ("scaler scale", scaler.scale.len()), ("reducer mean", reducer.mean.len())] {
            if len != RAW_FEATURES {
                return Err(InferenceError::MalformedModel(format!(
                    "{} has {} entries, expected {}",
                    name, len, RAW_FEATURES
                )));
            }
        }
        if reducer.components.is_empty() {
            return Err(InferenceError::MalformedModel("reducer has no components".to_string()));
        }
        if let Some(row) = reducer.components.iter().find(|c| c.len() != RAW_FEATURES) {
            return Err(InferenceError::DimensionMismatch {
                expected: RAW_FEATURES,
                actual: row.len(),
            });
        }

        classifier.check(reducer.output_dim())?;

        if classifier.num_classes() != label_decoder.classes.len() {
            return Err(InferenceError::MalformedModel(format!(
                "classifier has {} classes but the label table has {}",
                classifier.num_classes(),
                label_decoder.classes.len()
            )));
        }

        info!(
            vehicle_classes = vehicle_encoder.classes.len(),
            components = reducer.output_dim(),
            labels = ?label_decoder.classes,
            "Model artifacts loaded"
        );

        Ok(Self { artifacts })
    }

    /// Labels the classifier can produce
    pub fn labels(&self) -> &[String] {
        &self.artifacts.label_decoder.classes
    }

    fn features(
        &self,
        vehicle_type: VehicleType,
        total_charge: f64,
        duration: f64,
    ) -> Result<Vec<f64>, InferenceError> {
        if !total_charge.is_finite() || !duration.is_finite() {
            return Err(InferenceError::NonFiniteFeature);
        }

        let code = self
            .artifacts
            .vehicle_encoder
            .encode(vehicle_type.as_str())
            .ok_or_else(|| InferenceError::UnknownVehicleType(vehicle_type.to_string()))?;

        let raw = [code as f64, total_charge, duration];
        let scaled = self.artifacts.scaler.transform(&raw);
        Ok(self.artifacts.reducer.transform(&scaled))
    }
}

impl LabelClassifier for InferencePipeline {
    fn classify(
        &self,
        vehicle_type: VehicleType,
        total_charge: f64,
        duration: f64,
    ) -> Result<String, InferenceError> {
        let features = self.features(vehicle_type, total_charge, duration)?;
        let class = self.artifacts.classifier.predict(&features);
        let label = self
            .artifacts
            .label_decoder
            .decode(class)
            .ok_or(InferenceError::UnknownClass(class))?;

        debug!(
            vehicle_type = %vehicle_type,
            total_charge,
            duration,
            class,
            label,
            "Classified parking request"
        );

        Ok(label.to_string())
    }
}

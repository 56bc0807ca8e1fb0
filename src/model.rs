//! Recommender system types, their algorithm tables and the compiled configuration.

use crate::error::ValidationError;
use crate::manifest::ColumnRef;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SystemType {
    #[serde(rename = "content-based")]
    ContentBased,
    #[serde(rename = "collaborative")]
    Collaborative,
    #[serde(rename = "hybrid")]
    Hybrid,
}

const CONTENT_BASED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::TfIdf,
    Algorithm::WordEmbedding,
    Algorithm::TopicModelling,
];

const FACTORIZATION_ALGORITHMS: &[Algorithm] =
    &[Algorithm::Svd, Algorithm::ItemKnn, Algorithm::NeuralCf];

impl SystemType {
    pub const ALL: [SystemType; 3] = [
        SystemType::ContentBased,
        SystemType::Collaborative,
        SystemType::Hybrid,
    ];

    /// Algorithms offered for this system type, in display order.
    pub fn algorithms(self) -> &'static [Algorithm] {
        match self {
            SystemType::ContentBased => CONTENT_BASED_ALGORITHMS,
            SystemType::Collaborative | SystemType::Hybrid => FACTORIZATION_ALGORITHMS,
        }
    }

    pub fn default_algorithm(self) -> Algorithm {
        self.algorithms()[0]
    }

    pub fn supports(self, algorithm: Algorithm) -> bool {
        self.algorithms().contains(&algorithm)
    }

    /// Collaborative mode selects user/item/rating slots instead of a flat
    /// input set and output column.
    pub fn uses_role_slots(self) -> bool {
        self == SystemType::Collaborative
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SystemType::ContentBased => "content-based",
            SystemType::Collaborative => "collaborative",
            SystemType::Hybrid => "hybrid",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SystemType::ContentBased => "Content-Based",
            SystemType::Collaborative => "Collaborative",
            SystemType::Hybrid => "Hybrid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "TF-IDF")]
    TfIdf,
    #[serde(rename = "Word Embedding")]
    WordEmbedding,
    #[serde(rename = "Topic Modelling")]
    TopicModelling,
    #[serde(rename = "SVD")]
    Svd,
    #[serde(rename = "Item-KNN")]
    ItemKnn,
    #[serde(rename = "Neural CF")]
    NeuralCf,
}

impl Algorithm {
    pub fn label(self) -> &'static str {
        match self {
            Algorithm::TfIdf => "TF-IDF",
            Algorithm::WordEmbedding => "Word Embedding",
            Algorithm::TopicModelling => "Topic Modelling",
            Algorithm::Svd => "SVD",
            Algorithm::ItemKnn => "Item-KNN",
            Algorithm::NeuralCf => "Neural CF",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        CONTENT_BASED_ALGORITHMS
            .iter()
            .chain(FACTORIZATION_ALGORITHMS)
            .copied()
            .find(|a| a.label() == value)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The configuration the backend compiled a model for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfiguration {
    #[serde(alias = "systemType")]
    pub system_type: SystemType,
    pub algorithm: Algorithm,
    pub inputs: Vec<ColumnRef>,
    pub output: ColumnRef,
}

impl ModelConfiguration {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a saved configuration, rejecting ones that could never have
    /// been compiled.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let config: ModelConfiguration = serde_json::from_str(json)
            .map_err(|e| ValidationError::InvalidConfiguration(e.to_string()))?;
        if !config.system_type.supports(config.algorithm) {
            return Err(ValidationError::InvalidConfiguration(format!(
                "{} is not available for {} systems",
                config.algorithm, config.system_type
            )));
        }
        if config.inputs.is_empty() {
            return Err(ValidationError::InvalidConfiguration(
                "no input columns".to_string(),
            ));
        }
        // Collaborative slots are independent radios and may share a column.
        if !config.system_type.uses_role_slots() && config.inputs.contains(&config.output) {
            return Err(ValidationError::InvalidConfiguration(format!(
                "'{}' is both an input and the output",
                config.output
            )));
        }
        Ok(config)
    }

    /// Columns the advanced recommendation form asks values for. Collaborative
    /// models are queried by user only.
    pub fn query_columns(&self) -> Vec<ColumnRef> {
        if self.system_type.uses_role_slots() {
            self.inputs.iter().take(1).cloned().collect()
        } else {
            self.inputs.clone()
        }
    }
}

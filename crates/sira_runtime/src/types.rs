use crate::errors::{SiraError, SiraResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifier of a student row in the vector store
pub type StudentId = i64;

/// A student and its feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: StudentId,
    pub features: Vec<f64>,
}

impl Entity {
    pub fn new(id: StudentId, features: Vec<f64>) -> Self {
        Self { id, features }
    }
}

/// Validated set of entities, kept in source order.
///
/// Every entity has the same dimensionality, finite features and a unique id.
#[derive(Debug, Clone, Default)]
pub struct StudentTable {
    entities: Vec<Entity>,
    dimension: usize,
}

impl StudentTable {
    pub fn new(entities: Vec<Entity>) -> SiraResult<Self> {
        let dimension = entities.first().map(|e| e.features.len()).unwrap_or(0);
        let mut seen = HashSet::with_capacity(entities.len());

        for entity in &entities {
            if entity.features.len() != dimension {
                return Err(SiraError::dimension_mismatch(dimension, entity.features.len()));
            }
            if entity.features.iter().any(|v| !v.is_finite()) {
                return Err(SiraError::invalid_data(&format!(
                    "Student {} has a non-finite feature value",
                    entity.id
                )));
            }
            if !seen.insert(entity.id) {
                return Err(SiraError::invalid_data(&format!(
                    "Duplicate student id {}",
                    entity.id
                )));
            }
        }

        Ok(Self { entities, dimension })
    }

    pub fn find(&self, id: StudentId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// One ranked neighbour of the queried student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub related_student: StudentId,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub student_id: StudentId,
    pub recommendations: Vec<SimilarityResult>,
}

/// Inbound recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRequest {
    pub student_id: StudentId,
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl StudentRequest {
    pub fn top_k_or(&self, default: usize) -> usize {
        self.top_k.unwrap_or(default)
    }
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStatus {
    Hit,
    Miss,
}

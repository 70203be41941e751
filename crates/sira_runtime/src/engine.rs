use crate::cache::{self, ResultCache};
use crate::errors::{SiraError, SiraResult};
use crate::similarity::cosine_similarity;
use crate::store::VectorSource;
use crate::types::{
    CacheStatus, RecommendationResponse, SimilarityResult, StudentId, StudentTable,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ranks students by cosine similarity with a cache-aside layer in front.
///
/// Two concurrent misses on the same key both recompute and the later write
/// wins; nothing here serialises them.
pub struct RecommendationEngine {
    source: Arc<dyn VectorSource>,
    cache: Arc<dyn ResultCache>,
    ttl: Duration,
}

impl RecommendationEngine {
    pub fn new(source: Arc<dyn VectorSource>, cache: Arc<dyn ResultCache>, ttl: Duration) -> Self {
        Self { source, cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Top-`top_k` most similar students to `student_id`.
    pub async fn recommend(
        &self,
        student_id: StudentId,
        top_k: usize,
    ) -> SiraResult<RecommendationResponse> {
        self.recommend_with_status(student_id, top_k)
            .await
            .map(|(response, _)| response)
    }

    /// Same as [`recommend`](Self::recommend), also reporting whether the cache answered.
    pub async fn recommend_with_status(
        &self,
        student_id: StudentId,
        top_k: usize,
    ) -> SiraResult<(RecommendationResponse, CacheStatus)> {
        let key = cache::recommendation_key(student_id, top_k);

        if let Some(cached) = self.cache.get(&key).await? {
            debug!(student_id, top_k, "Cache hit for {}", key);
            let response: RecommendationResponse = serde_json::from_value(cached)?;
            return Ok((response, CacheStatus::Hit));
        }

        debug!(student_id, top_k, "Cache miss for {}, loading vectors", key);
        let table = self.source.load().await?;
        let response = rank(&table, student_id, top_k).map_err(|e| {
            if e.is_not_found() {
                warn!(student_id, "Recommendation requested for unknown student");
            }
            e
        })?;

        self.cache
            .set(&key, serde_json::to_value(&response)?, self.ttl)
            .await?;
        info!(
            student_id,
            top_k,
            returned = response.recommendations.len(),
            "Computed recommendations over {} students",
            table.len()
        );

        Ok((response, CacheStatus::Miss))
    }

    /// Drops every cached recommendation for `student_id`.
    pub async fn invalidate(&self, student_id: StudentId) -> SiraResult<usize> {
        let removed = self.cache.delete_prefix(&cache::student_prefix(student_id)).await?;
        info!(student_id, removed, "Invalidated cached recommendations");
        Ok(removed)
    }

    /// Drops every cached recommendation, e.g. after the vector data changed.
    pub async fn invalidate_all(&self) -> SiraResult<usize> {
        let removed = self
            .cache
            .delete_prefix(cache::all_recommendations_prefix())
            .await?;
        info!(removed, "Invalidated all cached recommendations");
        Ok(removed)
    }
}

/// Scores every other student against `student_id` and keeps the best `top_k`.
///
/// Sorting is stable, so equal scores keep table order.
pub fn rank(
    table: &StudentTable,
    student_id: StudentId,
    top_k: usize,
) -> SiraResult<RecommendationResponse> {
    let query = table
        .find(student_id)
        .ok_or_else(|| SiraError::not_found(student_id))?;

    let mut scored = table
        .iter()
        .filter(|other| other.id != student_id)
        .map(|other| {
            cosine_similarity(&query.features, &other.features).map(|similarity| {
                SimilarityResult {
                    related_student: other.id,
                    similarity,
                }
            })
        })
        .collect::<SiraResult<Vec<_>>>()?;

    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(top_k);

    Ok(RecommendationResponse {
        student_id,
        recommendations: scored,
    })
}

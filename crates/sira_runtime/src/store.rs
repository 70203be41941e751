use crate::errors::SiraResult;
use crate::types::StudentTable;
use async_trait::async_trait;

/// Source of student feature vectors.
///
/// Implementations are read in full on every call; the engine keeps no
/// entity state between requests.
#[async_trait]
pub trait VectorSource: Send + Sync {
    async fn load(&self) -> SiraResult<StudentTable>;
}

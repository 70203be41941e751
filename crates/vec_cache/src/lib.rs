/*!
# Vector Cache

Student feature-vector storage. Tables are read from a CSV file on every load,
or held in memory for embedding and tests.
*/

use async_trait::async_trait;
use sira_runtime::{Entity, SiraError, SiraResult, StudentId, StudentTable, VectorSource};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Column holding the student identifier
pub const ID_COLUMN: &str = "student_id";

/// Result type for vector store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing header row")]
    MissingHeader,
    #[error("Header has no `student_id` column")]
    MissingIdColumn,
    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Line {line}: invalid value `{value}` in column `{column}`")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },
}

impl From<StoreError> for SiraError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { source, path } => {
                let mut e = SiraError::from(source);
                e.message = format!("{} ({})", e.message, path.display());
                e
            }
            other => SiraError::invalid_data(&other.to_string()),
        }
    }
}

/// Parses a numeric table whose header names a `student_id` column; every
/// other column is a feature, in header order.
pub fn parse_csv(text: &str) -> StoreResult<Vec<Entity>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = rdr.headers()?.clone();
    if columns.iter().all(str::is_empty) {
        return Err(StoreError::MissingHeader);
    }
    let id_index = columns
        .iter()
        .position(|c| c == ID_COLUMN)
        .ok_or(StoreError::MissingIdColumn)?;

    let mut entities = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        if record.len() != columns.len() {
            return Err(StoreError::FieldCount {
                line,
                expected: columns.len(),
                found: record.len(),
            });
        }

        let invalid = |column: &str, value: &str| StoreError::InvalidValue {
            line,
            column: column.to_string(),
            value: value.to_string(),
        };

        let id: StudentId = record[id_index]
            .parse()
            .map_err(|_| invalid(ID_COLUMN, &record[id_index]))?;

        let features = record
            .iter()
            .zip(columns.iter())
            .enumerate()
            .filter(|(i, _)| *i != id_index)
            .map(|(_, (value, column))| value.parse::<f64>().map_err(|_| invalid(column, value)))
            .collect::<StoreResult<Vec<f64>>>()?;

        entities.push(Entity::new(id, features));
    }

    Ok(entities)
}

/// Reads the student table from a CSV file on each load.
pub struct CsvVectorStore {
    path: PathBuf,
}

impl CsvVectorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> StoreResult<Vec<Entity>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        parse_csv(&text)
    }
}

#[async_trait]
impl VectorSource for CsvVectorStore {
    async fn load(&self) -> SiraResult<StudentTable> {
        let entities = self.read().await?;
        let table = StudentTable::new(entities)?;
        debug!(
            "Loaded {} students with {} features from {}",
            table.len(),
            table.dimension(),
            self.path.display()
        );
        Ok(table)
    }
}

/// Student table held in memory.
#[derive(Default)]
pub struct MemoryVectorStore {
    entities: RwLock<Vec<Entity>>,
}

impl MemoryVectorStore {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities: RwLock::new(entities),
        }
    }

    /// Inserts or replaces the vector for `id`.
    pub async fn store_vector(&self, id: StudentId, features: Vec<f64>) {
        let mut entities = self.entities.write().await;
        match entities.iter_mut().find(|e| e.id == id) {
            Some(existing) => existing.features = features,
            None => entities.push(Entity::new(id, features)),
        }
    }
}

#[async_trait]
impl VectorSource for MemoryVectorStore {
    async fn load(&self) -> SiraResult<StudentTable> {
        StudentTable::new(self.entities.read().await.clone())
    }
}

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};
use std::sync::RwLock;

use super::{IndexCreation, IndexRecord, IndexSpec, SimilarityMatch, SimilarityMetric, VectorIndex};
use crate::errors::AssistantError;
use crate::query::check_input;

// postgres caps bind parameters at 65535; each record uses four
const UPSERT_CHUNK_SIZE: usize = 1000;

/// pgvector-backed index: one table per index under a dedicated schema.
pub struct PgVectorIndex {
    pool: Pool<Postgres>,
    schema: String,
    table: RwLock<Option<String>>,
}

#[derive(FromRow, Debug)]
struct MatchRow {
    record_id: String,
    content: String,
    metadata: serde_json::Value,
    similarity_score: f64,
}

impl PgVectorIndex {
    pub fn new(pool: Pool<Postgres>, schema: &str) -> Result<Self, AssistantError> {
        check_input(schema)?;
        Ok(PgVectorIndex {
            pool,
            schema: schema.to_string(),
            table: RwLock::new(None),
        })
    }

    fn table(&self) -> Result<String, AssistantError> {
        self.table
            .read()
            .map_err(|_| AssistantError::Index("index lock poisoned".to_string()))?
            .clone()
            .ok_or_else(|| AssistantError::Index("index has not been created".to_string()))
    }

    async fn stored_dimension(&self, fq_table: &str) -> Result<Option<i32>, AssistantError> {
        // pgvector stores the declared dimension as the column typmod
        let dim: Option<i32> = sqlx::query_scalar(
            "SELECT atttypmod FROM pg_attribute
            WHERE attrelid = $1::regclass AND attname = 'embeddings'",
        )
        .bind(fq_table)
        .fetch_optional(&self.pool)
        .await?;
        Ok(dim)
    }
}

pub fn embeddings_table(index_name: &str) -> String {
    format!("_embeddings_{index_name}")
}

pub fn create_embedding_table(schema: &str, index_name: &str, dimension: usize) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {schema}.{table} (
            record_id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            metadata JSONB NOT NULL,
            embeddings vector({dimension}) NOT NULL,
            updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW() NOT NULL
        );
        ",
        table = embeddings_table(index_name),
    )
}

pub fn create_similarity_index(schema: &str, index_name: &str, metric: SimilarityMetric) -> String {
    match metric {
        SimilarityMetric::pgv_hnsw_cosine => format!(
            "CREATE INDEX IF NOT EXISTS {index_name}_hnsw_cos_idx ON {schema}.{table}
            USING hnsw (embeddings vector_cosine_ops);
            ",
            table = embeddings_table(index_name),
        ),
    }
}

// returns query and bindings
// only compatible with pg-vector data types
pub fn build_upsert_query(
    schema: &str,
    table: &str,
    records: &[IndexRecord],
) -> Result<(String, Vec<(String, String, serde_json::Value, String)>), AssistantError> {
    let mut query = format!(
        "
        INSERT INTO {schema}.{table} (record_id, content, metadata, embeddings) VALUES"
    );
    let mut bindings = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        if index > 0 {
            query.push(',');
        }
        query.push_str(&format!(
            " (${}, ${}, ${}::jsonb, ${}::vector)",
            4 * index + 1,
            4 * index + 2,
            4 * index + 3,
            4 * index + 4
        ));
        let embedding = serde_json::to_string(&record.embedding)?;
        bindings.push((
            record.id.clone(),
            record.content.clone(),
            record.metadata.clone(),
            embedding,
        ));
    }
    query.push_str(
        " ON CONFLICT (record_id)
        DO UPDATE SET content = EXCLUDED.content, metadata = EXCLUDED.metadata,
        embeddings = EXCLUDED.embeddings, updated_at = NOW();",
    );
    Ok((query, bindings))
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexCreation, AssistantError> {
        check_input(&spec.name)?;
        let table = embeddings_table(&spec.name);
        let fq_table = format!("{}.{}", self.schema, table);

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema))
            .execute(&self.pool)
            .await?;

        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(&fq_table)
            .fetch_one(&self.pool)
            .await?;

        let creation = if exists {
            match self.stored_dimension(&fq_table).await? {
                Some(dim) if dim as usize != spec.dimension => {
                    return Err(AssistantError::DimensionMismatch {
                        expected: spec.dimension,
                        actual: dim as usize,
                    });
                }
                _ => IndexCreation::AlreadyExists,
            }
        } else {
            let mut tx = self.pool.begin().await?;
            sqlx::query(&create_embedding_table(&self.schema, &spec.name, spec.dimension))
                .execute(&mut *tx)
                .await?;
            sqlx::query(&create_similarity_index(&self.schema, &spec.name, spec.metric))
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            IndexCreation::Created
        };

        let mut current = self
            .table
            .write()
            .map_err(|_| AssistantError::Index("index lock poisoned".to_string()))?;
        *current = Some(table);
        Ok(creation)
    }

    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<usize, AssistantError> {
        let table = self.table()?;
        let mut written = 0;
        for chunk in records.chunks(UPSERT_CHUNK_SIZE) {
            let (query, bindings) = build_upsert_query(&self.schema, &table, chunk)?;
            let mut q = sqlx::query(&query);
            for (record_id, content, metadata, embedding) in bindings {
                q = q.bind(record_id).bind(content).bind(metadata).bind(embedding);
            }
            match q.execute(&self.pool).await {
                Ok(_) => written += chunk.len(),
                Err(e) => {
                    return Err(AssistantError::Index(format!(
                        "failed to execute query: {}",
                        e
                    )))
                }
            }
        }
        Ok(written)
    }

    async fn query_nearest(
        &self,
        embedding: &[f64],
        k: usize,
    ) -> Result<Vec<SimilarityMatch>, AssistantError> {
        let table = self.table()?;
        let emb = serde_json::to_string(embedding)?;
        let query = format!(
            "
        SELECT
            record_id,
            content,
            metadata,
            1 - (embeddings <=> $1::vector) AS similarity_score
        FROM {schema}.{table}
        ORDER BY embeddings <=> $1::vector
        LIMIT $2;
        ",
            schema = self.schema,
        );
        log::debug!("query: {}", query);
        let rows: Vec<MatchRow> = sqlx::query_as(&query)
            .bind(emb)
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| SimilarityMatch {
                record_id: r.record_id,
                content: r.content,
                metadata: r.metadata,
                similarity_score: r.similarity_score,
            })
            .collect())
    }
}

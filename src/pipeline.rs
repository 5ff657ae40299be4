//! Retrieval Pipeline - 수집 → 임베딩 → 인덱스 → 검색 → 랭킹
//!
//! 세션당 하나의 [`RetrievalPipeline`] 값이 청크와 인덱스를 소유합니다.
//! 임베딩 프로바이더는 호출자가 소유하며 매 호출마다 참조로 전달됩니다.

use crate::embedding::EmbeddingProvider;
use crate::error::{Result, RetrievalError};
use crate::index::{rank, rank_scored, QueryResult, RankedAnswer, SearchHit, VectorIndex};

// ============================================================================
// Chunk
// ============================================================================

/// 검색 단위 텍스트 조각
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chunk {
    /// 수집 순서상의 위치 (인덱스 위치와 동일)
    pub id: usize,
    pub text: String,
}

impl Chunk {
    /// 텍스트 목록을 위치 ID가 매겨진 청크로 변환
    pub fn from_texts<I, S>(texts: I) -> Vec<Chunk>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(id, text)| Chunk {
                id,
                text: text.into(),
            })
            .collect()
    }
}

// ============================================================================
// RetrievalPipeline
// ============================================================================

/// `ingest` 진행 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    /// 청크 임베딩 요청 직전
    Embedding,
    /// 벡터 인덱스 생성 직전
    Indexing,
}

/// 수집이 끝난 검색 세션
///
/// 값이 존재하면 곧 쿼리를 받을 수 있는 상태입니다. 생성 후에는 변경되지 않습니다.
#[derive(Debug)]
pub struct RetrievalPipeline {
    chunks: Vec<Chunk>,
    index: VectorIndex,
}

impl RetrievalPipeline {
    /// 청크 전체를 한 번의 배치로 임베딩하고 인덱스를 생성
    ///
    /// # Errors
    /// * `EmptyCorpus` - 청크가 없음 (인덱스를 만들지 않음)
    /// * `Embedding` - 프로바이더 실패 또는 벡터 수 불일치
    /// * `DimensionMismatch` - 프로바이더가 서로 다른 길이의 벡터를 반환
    pub async fn ingest(chunks: Vec<Chunk>, embedder: &dyn EmbeddingProvider) -> Result<Self> {
        Self::ingest_with_progress(chunks, embedder, |_| {}).await
    }

    /// `ingest`와 같지만 각 단계에 들어가기 전에 `on_stage`를 호출
    ///
    /// 빈 코퍼스는 어떤 단계도 보고하지 않습니다.
    pub async fn ingest_with_progress<F>(
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
        mut on_stage: F,
    ) -> Result<Self>
    where
        F: FnMut(IngestStage) + Send,
    {
        if chunks.is_empty() {
            return Err(RetrievalError::EmptyCorpus);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        tracing::info!(
            "Embedding {} chunks with {}",
            texts.len(),
            embedder.name()
        );

        on_stage(IngestStage::Embedding);
        let vectors = embedder
            .encode(&texts)
            .await
            .map_err(RetrievalError::Embedding)?;

        if vectors.len() != chunks.len() {
            return Err(RetrievalError::Embedding(anyhow::anyhow!(
                "{} returned {} vectors for {} chunks",
                embedder.name(),
                vectors.len(),
                chunks.len()
            )));
        }

        on_stage(IngestStage::Indexing);
        let index = VectorIndex::build(vectors)?;
        tracing::info!(
            "Index ready (chunks={}, dimension={})",
            index.len(),
            index.dimension()
        );

        Ok(Self { chunks, index })
    }

    /// 쿼리에 가장 관련 있는 청크 반환
    ///
    /// `candidate_k`개 후보를 가져온 뒤 중복 제거 후 `top_n`개로 자릅니다.
    pub async fn query(
        &self,
        text: &str,
        embedder: &dyn EmbeddingProvider,
        candidate_k: usize,
        top_n: usize,
    ) -> Result<RankedAnswer> {
        let hits = self.candidates(text, embedder, candidate_k).await?;
        rank(&hits, &self.chunks, top_n)
    }

    /// `query`와 같지만 거리를 함께 반환
    pub async fn query_scored(
        &self,
        text: &str,
        embedder: &dyn EmbeddingProvider,
        candidate_k: usize,
        top_n: usize,
    ) -> Result<Vec<QueryResult>> {
        let hits = self.candidates(text, embedder, candidate_k).await?;
        rank_scored(&hits, &self.chunks, top_n)
    }

    async fn candidates(
        &self,
        text: &str,
        embedder: &dyn EmbeddingProvider,
        candidate_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let vector = embedder
            .encode_one(text)
            .await
            .map_err(RetrievalError::Embedding)?;

        let hits = self.index.search(&vector, candidate_k)?;
        tracing::debug!(
            "Query '{}' -> {} candidates (k={})",
            text,
            hits.len(),
            candidate_k
        );
        Ok(hits)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// 청크 수
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

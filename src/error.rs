//! 검색 엔진 에러 타입
//!
//! 인덱스/랭커/파이프라인이 반환하는 타입 에러입니다.
//! 코어는 재시도하지 않으며, 차원을 자르거나 채워서 맞추지 않습니다.

use thiserror::Error;

/// 검색 코어 에러
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// 수집된 청크가 없음 (인덱스를 만들지 않음)
    #[error("No content retrieved: corpus is empty")]
    EmptyCorpus,

    /// 벡터 차원 불일치
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 빈 벡터 목록으로 인덱스 생성 시도
    #[error("Cannot build an index from zero vectors")]
    EmptyInput,

    /// k는 1 이상이어야 함
    #[error("Invalid k: must be at least 1")]
    InvalidK,

    /// top_n은 1 이상이어야 함
    #[error("Invalid top_n: must be at least 1")]
    InvalidTopN,

    /// 검색 결과 인덱스에 대응하는 청크가 없음
    #[error("Hit index {index} is out of range for {len} chunks")]
    ChunkOutOfRange { index: usize, len: usize },

    /// 임베딩 프로바이더 실패
    #[error("Embedding provider failed: {0:#}")]
    Embedding(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

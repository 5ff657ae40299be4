//! web-rag - 웹 페이지 시맨틱 검색
//!
//! 페이지 문단을 임베딩하고, 정확한 kNN(제곱 L2) 인덱스로
//! 질문과 가장 가까운 문단을 찾습니다.
//!
//! 흐름: 문단 → 배치 임베딩 → VectorIndex → 쿼리 임베딩 → search → rank

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod scraper;
pub mod source;

// Re-exports
pub use crate::config::RetrievalConfig;
pub use crate::embedding::{get_api_key, EmbeddingProvider, GeminiEmbedding};
pub use crate::error::{Result, RetrievalError};
pub use crate::index::{
    rank, rank_scored, squared_l2, QueryResult, RankedAnswer, SearchHit, VectorIndex,
};
pub use crate::pipeline::{Chunk, IngestStage, RetrievalPipeline};
pub use crate::scraper::{ScrapedPage, WebScraper};
pub use crate::source::{acquire, load, SourceContent, SourceKind};

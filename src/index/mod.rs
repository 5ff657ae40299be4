//! Index 모듈 - 정확한 kNN 벡터 인덱스와 랭커
//!
//! - VectorIndex: brute-force squared L2 검색
//! - Ranker: 정렬 + 중복 제거 + top_n 자르기

mod ranker;
mod vector;

// Re-exports
pub use ranker::{rank, rank_scored, QueryResult, RankedAnswer};
pub use vector::{squared_l2, SearchHit, VectorIndex};

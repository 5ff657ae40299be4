//! Ranker - 원시 검색 결과를 최종 답변으로 변환
//!
//! 후보 풀 → 정렬 → 중복 제거 → top_n 자르기 → 청크 매핑

use std::collections::HashSet;

use crate::error::{Result, RetrievalError};
use crate::pipeline::Chunk;

use super::vector::SearchHit;

// ============================================================================
// Types
// ============================================================================

/// 거리 정보가 포함된 검색 결과
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub chunk: Chunk,
    /// 제곱 L2 거리 (작을수록 유사)
    pub distance: f32,
}

/// 최종 답변 (거리 없음, 순서 있음, 중복 없음)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedAnswer {
    chunks: Vec<Chunk>,
}

impl RankedAnswer {
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    /// 텍스트만 순서대로
    pub fn texts(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }
}

impl From<Vec<QueryResult>> for RankedAnswer {
    fn from(results: Vec<QueryResult>) -> Self {
        Self {
            chunks: results.into_iter().map(|r| r.chunk).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RankedAnswer {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// 검색 결과를 최종 답변으로 변환
///
/// 입력이 이미 정렬되어 있다고 가정하지 않습니다.
/// 빈 입력은 빈 답변을 반환합니다 (에러 아님).
///
/// # Errors
/// * `InvalidTopN` - top_n == 0
/// * `ChunkOutOfRange` - 대응하는 청크가 없는 인덱스
pub fn rank(hits: &[SearchHit], chunks: &[Chunk], top_n: usize) -> Result<RankedAnswer> {
    Ok(rank_scored(hits, chunks, top_n)?.into())
}

/// `rank`와 동일하지만 거리를 함께 반환
pub fn rank_scored(hits: &[SearchHit], chunks: &[Chunk], top_n: usize) -> Result<Vec<QueryResult>> {
    if top_n == 0 {
        return Err(RetrievalError::InvalidTopN);
    }

    let mut sorted = hits.to_vec();
    sorted.sort_by(SearchHit::cmp_rank);

    let mut seen = HashSet::with_capacity(sorted.len());
    let mut results = Vec::with_capacity(top_n.min(sorted.len()));

    for hit in sorted {
        if results.len() >= top_n {
            break;
        }
        if !seen.insert(hit.index) {
            continue;
        }

        let chunk = chunks
            .get(hit.index)
            .ok_or(RetrievalError::ChunkOutOfRange {
                index: hit.index,
                len: chunks.len(),
            })?;

        results.push(QueryResult {
            chunk: chunk.clone(),
            distance: hit.distance,
        });
    }

    Ok(results)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks() -> Vec<Chunk> {
        Chunk::from_texts(["alpha", "beta", "gamma", "delta"])
    }

    fn hit(index: usize, distance: f32) -> SearchHit {
        SearchHit { index, distance }
    }

    #[test]
    fn test_rank_sorts_unsorted_input() {
        let hits = [hit(2, 0.9), hit(0, 0.1), hit(3, 0.5)];
        let answer = rank(&hits, &chunks(), 3).expect("rank");
        assert_eq!(answer.texts(), vec!["alpha", "delta", "gamma"]);
    }

    #[test]
    fn test_rank_dedup_keeps_lowest_distance() {
        let hits = [hit(1, 0.4), hit(1, 0.2), hit(2, 0.3), hit(1, 0.9)];
        let results = rank_scored(&hits, &chunks(), 5).expect("rank");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, 1);
        assert_eq!(results[0].distance, 0.2);
        assert_eq!(results[1].chunk.id, 2);
    }

    #[test]
    fn test_rank_truncates_to_top_n() {
        let hits = [hit(0, 0.1), hit(1, 0.2), hit(2, 0.3), hit(3, 0.4)];
        let answer = rank(&hits, &chunks(), 2).expect("rank");
        assert_eq!(answer.len(), 2);
        assert_eq!(answer.texts(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_rank_fewer_distinct_than_top_n() {
        let hits = [hit(3, 0.1), hit(3, 0.1), hit(3, 0.2)];
        let answer = rank(&hits, &chunks(), 3).expect("rank");
        assert_eq!(answer.texts(), vec!["delta"]);
    }

    #[test]
    fn test_rank_tie_break_by_index() {
        let hits = [hit(2, 0.5), hit(0, 0.5), hit(1, 0.5)];
        let answer = rank(&hits, &chunks(), 3).expect("rank");
        assert_eq!(answer.texts(), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_rank_empty_hits() {
        let answer = rank(&[], &chunks(), 3).expect("rank");
        assert!(answer.is_empty());
    }

    #[test]
    fn test_rank_invalid_top_n() {
        let hits = [hit(0, 0.1)];
        assert!(matches!(
            rank(&hits, &chunks(), 0),
            Err(RetrievalError::InvalidTopN)
        ));
    }

    #[test]
    fn test_rank_out_of_range() {
        let hits = [hit(9, 0.1)];
        assert!(matches!(
            rank(&hits, &chunks(), 1),
            Err(RetrievalError::ChunkOutOfRange { index: 9, len: 4 })
        ));
    }

    #[test]
    fn test_rank_no_duplicate_ids() {
        let hits = [
            hit(0, 0.3),
            hit(1, 0.1),
            hit(0, 0.2),
            hit(2, 0.1),
            hit(1, 0.0),
        ];
        let answer = rank(&hits, &chunks(), 4).expect("rank");
        let mut ids: Vec<usize> = answer.iter().map(|c| c.id).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}

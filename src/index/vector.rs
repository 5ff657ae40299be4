//! Vector Index - 정확한 kNN 검색 (brute-force squared L2)
//!
//! 저장된 모든 벡터와 쿼리 간의 제곱 유클리드 거리를 계산합니다.
//! 근사(ANN) 없이 항상 정확한 결과를 반환합니다.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::error::{Result, RetrievalError};

/// 이 개수 이상이면 거리 계산을 rayon으로 병렬화
const PARALLEL_THRESHOLD: usize = 1024;

// ============================================================================
// Types
// ============================================================================

/// 인덱스 검색 결과 (원시)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// 저장 위치 (청크 ID와 동일)
    pub index: usize,
    /// 제곱 L2 거리 (작을수록 유사)
    pub distance: f32,
}

impl SearchHit {
    /// (distance, index) 오름차순 전순서
    ///
    /// 동일 거리는 저장 위치가 작은 쪽이 앞섭니다.
    /// NaN 거리는 부호와 관계없이 모든 실수 거리 뒤에 옵니다.
    pub fn cmp_rank(&self, other: &Self) -> Ordering {
        rank_key(self.distance)
            .total_cmp(&rank_key(other.distance))
            .then(self.index.cmp(&other.index))
    }
}

/// 정렬용 거리 (NaN → +inf)
fn rank_key(distance: f32) -> f32 {
    if distance.is_nan() {
        f32::INFINITY
    } else {
        distance
    }
}

// ============================================================================
// VectorIndex
// ============================================================================

/// 고정 크기 벡터 인덱스
///
/// 생성 후에는 읽기 전용입니다. `search`는 `&self`만 필요하므로
/// 여러 스레드에서 잠금 없이 동시에 호출할 수 있습니다.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorIndex {
    /// 벡터 목록으로 인덱스 생성
    ///
    /// 차원은 첫 번째 벡터의 길이로 고정됩니다.
    ///
    /// # Errors
    /// * `EmptyInput` - 벡터가 없음
    /// * `DimensionMismatch` - 길이가 다른 벡터가 섞여 있음
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = match vectors.first() {
            Some(first) => first.len(),
            None => return Err(RetrievalError::EmptyInput),
        };

        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(RetrievalError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        tracing::debug!(
            "Built vector index (n={}, dimension={})",
            vectors.len(),
            dimension
        );

        Ok(Self { vectors, dimension })
    }

    /// 가장 가까운 `min(k, N)`개 벡터 검색
    ///
    /// 결과는 거리 오름차순, 동일 거리는 저장 위치 오름차순입니다.
    ///
    /// # Errors
    /// * `DimensionMismatch` - 쿼리 길이가 인덱스 차원과 다름
    /// * `InvalidK` - k == 0
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Err(RetrievalError::InvalidK);
        }

        let score = |(index, vector): (usize, &Vec<f32>)| SearchHit {
            index,
            distance: squared_l2_unchecked(query, vector),
        };

        let mut hits: Vec<SearchHit> = if self.vectors.len() >= PARALLEL_THRESHOLD {
            self.vectors.par_iter().enumerate().map(score).collect()
        } else {
            self.vectors.iter().enumerate().map(score).collect()
        };

        let k = k.min(hits.len());
        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, SearchHit::cmp_rank);
            hits.truncate(k);
        }
        hits.sort_unstable_by(SearchHit::cmp_rank);

        Ok(hits)
    }

    /// 저장된 벡터 수
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// 항상 false (빈 인덱스는 생성할 수 없음)
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// 벡터 차원
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Distance
// ============================================================================

/// 제곱 유클리드 거리: Σ (a_i - b_i)^2
///
/// 제곱근을 취하지 않습니다. 인덱스 안의 모든 비교가 같은 척도를 사용합니다.
///
/// # Errors
/// * `DimensionMismatch` - 두 벡터의 길이가 다름 (자르거나 채우지 않음)
pub fn squared_l2(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(RetrievalError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(squared_l2_unchecked(a, b))
}

/// 길이 검증이 끝난 벡터용 (`VectorIndex::search`가 쿼리 차원을 먼저 확인함)
fn squared_l2_unchecked(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

// ============================================================================
// Tests
// ============================================================================

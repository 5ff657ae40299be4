//! 검색 설정
//!
//! 후보 풀 크기(candidate_k), 최종 결과 수(top_n), 최소 청크 길이를 관리합니다.
//! 우선순위: CLI 인자 > 환경변수 > 기본값

use anyhow::{bail, Context, Result};

/// 후보 풀 크기 환경변수
pub const ENV_CANDIDATE_K: &str = "WEB_RAG_CANDIDATE_K";
/// 최종 결과 수 환경변수
pub const ENV_TOP_N: &str = "WEB_RAG_TOP_N";
/// 최소 청크 길이 환경변수
pub const ENV_MIN_CHUNK_CHARS: &str = "WEB_RAG_MIN_CHUNK_CHARS";

/// 검색 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalConfig {
    /// 인덱스에서 가져올 후보 수 (중복 제거 여유분 포함)
    pub candidate_k: usize,
    /// 사용자에게 보여줄 최종 결과 수
    pub top_n: usize,
    /// 이보다 짧은 문단은 수집 단계에서 버림 (문자 수)
    pub min_chunk_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_k: 10,
            top_n: 3,
            min_chunk_chars: 20,
        }
    }
}

impl RetrievalConfig {
    /// 환경변수에서 설정 로드 (없는 값은 기본값)
    ///
    /// 검증은 CLI 인자를 덮어쓴 뒤 `validate`로 따로 수행합니다.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            candidate_k: env_usize(ENV_CANDIDATE_K)?.unwrap_or(defaults.candidate_k),
            top_n: env_usize(ENV_TOP_N)?.unwrap_or(defaults.top_n),
            min_chunk_chars: env_usize(ENV_MIN_CHUNK_CHARS)?.unwrap_or(defaults.min_chunk_chars),
        })
    }

    /// CLI 인자로 덮어쓰기
    pub fn with_overrides(
        mut self,
        candidate_k: Option<usize>,
        top_n: Option<usize>,
        min_chunk_chars: Option<usize>,
    ) -> Self {
        if let Some(k) = candidate_k {
            self.candidate_k = k;
        }
        if let Some(n) = top_n {
            self.top_n = n;
        }
        if let Some(min) = min_chunk_chars {
            self.min_chunk_chars = min;
        }
        self
    }

    /// 설정 검증
    ///
    /// 0은 거부합니다. candidate_k < top_n 은 허용하지만 중복 제거 여유가 없으므로 경고합니다.
    pub fn validate(&self) -> Result<()> {
        if self.candidate_k == 0 {
            bail!("candidate_k must be at least 1");
        }
        if self.top_n == 0 {
            bail!("top_n must be at least 1");
        }
        if self.candidate_k < self.top_n {
            tracing::warn!(
                "candidate_k ({}) is smaller than top_n ({}); at most {} results will be returned",
                self.candidate_k,
                self.top_n,
                self.candidate_k
            );
        }
        Ok(())
    }
}

/// 환경변수를 usize로 읽기 (비어 있으면 None)
fn env_usize(name: &str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            let parsed = value
                .trim()
                .parse::<usize>()
                .with_context(|| format!("{} must be a non-negative integer, got '{}'", name, value))?;
            Ok(Some(parsed))
        }
        _ => Ok(None),
    }
}

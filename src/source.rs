//! 텍스트 소스 - URL 또는 로컬 파일에서 청크 수집
//!
//! 수집 단계의 실패(네트워크, 파싱, 파일 읽기)는 여기서 잡아서
//! "수집된 콘텐츠 없음"으로 보고합니다.

use std::path::Path;

use anyhow::{Context, Result};
use url::Url;

use crate::pipeline::Chunk;
use crate::scraper::{normalize_whitespace, parse_page, WebScraper};

/// 소스 식별자 종류
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// http(s) URL
    Web(Url),
    /// 로컬 HTML 파일
    HtmlFile,
    /// 로컬 텍스트 파일 (빈 줄로 문단 구분)
    TextFile,
}

impl SourceKind {
    /// 식별자로 소스 종류 결정
    pub fn detect(source: &str) -> Self {
        if let Ok(url) = Url::parse(source) {
            if matches!(url.scheme(), "http" | "https") {
                return SourceKind::Web(url);
            }
        }

        let is_html = Path::new(source)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_lowercase().as_str(), "html" | "htm"))
            .unwrap_or(false);

        if is_html {
            SourceKind::HtmlFile
        } else {
            SourceKind::TextFile
        }
    }
}

/// 수집 결과
#[derive(Debug, Clone, Default)]
pub struct SourceContent {
    /// HTML 소스의 페이지 제목 (텍스트 파일은 None)
    pub title: Option<String>,
    /// 최소 길이를 통과한 문단 청크
    pub chunks: Vec<Chunk>,
}

impl SourceContent {
    /// 청크가 하나도 없는지
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// 소스에서 문단을 읽어 청크로 변환
///
/// `min_chars`(문자 수)보다 짧은 문단은 버립니다.
pub async fn load(source: &str, min_chars: usize) -> Result<SourceContent> {
    let (title, paragraphs) = match SourceKind::detect(source) {
        SourceKind::Web(url) => {
            let scraper = WebScraper::new()?;
            let page = scraper.scrape(url.as_str()).await?;
            (page.title, page.paragraphs)
        }
        SourceKind::HtmlFile => {
            let page = parse_page(&read_file(source).await?);
            (page.title, page.paragraphs)
        }
        SourceKind::TextFile => (None, split_paragraphs(&read_file(source).await?)),
    };

    let total = paragraphs.len();
    let kept = filter_short(paragraphs, min_chars);
    tracing::info!(
        "Loaded {} paragraphs from {} ({} dropped as shorter than {} chars)",
        kept.len(),
        source,
        total - kept.len(),
        min_chars
    );

    Ok(SourceContent {
        title,
        chunks: Chunk::from_texts(kept),
    })
}

/// `load`의 실패를 빈 결과로 변환
///
/// 호출자는 빈 결과를 "콘텐츠 없음"으로 처리합니다.
pub async fn acquire(source: &str, min_chars: usize) -> SourceContent {
    match load(source, min_chars).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Content acquisition failed for {}: {:#}", source, e);
            SourceContent::default()
        }
    }
}

async fn read_file(path: &str) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("파일 읽기 실패: {}", path))
}

/// 빈 줄 기준 문단 분할
fn split_paragraphs(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(normalize_whitespace)
        .filter(|p| !p.is_empty())
        .collect()
}

fn filter_short(paragraphs: Vec<String>, min_chars: usize) -> Vec<String> {
    paragraphs
        .into_iter()
        .filter(|p| p.chars().count() >= min_chars)
        .collect()
}

//! 웹 스크래퍼 모듈 - 페이지에서 문단 추출
//!
//! 페이지의 모든 `<p>` 요소 텍스트를 검색 후보 문단으로 사용합니다.

use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use scraper::{Html, Selector};

/// 스크랩된 페이지
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    /// 페이지 제목
    pub title: Option<String>,
    /// 문단 텍스트 (공백 정리됨, 빈 문단 제외)
    pub paragraphs: Vec<String>,
}

/// 웹 스크래퍼
pub struct WebScraper {
    client: reqwest::Client,
}

impl WebScraper {
    /// 새 스크래퍼 생성
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("web-rag/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("HTTP 클라이언트 생성 실패")?;

        Ok(Self { client })
    }

    /// URL에서 문단 추출
    ///
    /// 2xx가 아닌 응답은 실패로 처리합니다.
    pub async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
        tracing::info!("Scraping: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP 요청 실패")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Failed to fetch the website ({})", status);
        }

        let html = response.text().await.context("응답 본문 읽기 실패")?;
        let page = parse_page(&html);

        tracing::debug!(
            "Extracted {} paragraphs from {}",
            page.paragraphs.len(),
            url
        );
        Ok(page)
    }
}

/// HTML 문서 파싱 (네트워크 없이)
pub fn parse_page(html: &str) -> ScrapedPage {
    let document = Html::parse_document(html);
    ScrapedPage {
        title: extract_title(&document),
        paragraphs: extract_paragraphs(&document),
    }
}

/// 제목 추출 (<title> → <h1>)
fn extract_title(document: &Html) -> Option<String> {
    for selector_str in ["title", "h1"] {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let title = normalize_whitespace(&element.text().collect::<String>());
                if !title.is_empty() {
                    return Some(title);
                }
            }
        }
    }

    None
}

/// 모든 `<p>` 요소의 텍스트
fn extract_paragraphs(document: &Html) -> Vec<String> {
    let selector = match Selector::parse("p") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .map(|element| normalize_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect()
}

/// 연속 공백 패턴 (한 번만 컴파일)
static WHITESPACE_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// 연속 공백을 하나로 정리
pub fn normalize_whitespace(text: &str) -> String {
    match WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").ok()) {
        Some(re) => re.replace_all(text, " ").trim().to_string(),
        None => text.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

//! CLI 모듈
//!
//! 소스 하나를 수집/인덱싱한 뒤 대화형으로 질문을 받습니다.
//! `exit`(대소문자 무관)만 입력하면 종료합니다.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::config::RetrievalConfig;
use crate::embedding::{EmbeddingProvider, GeminiEmbedding, DEFAULT_DIMENSION};
use crate::pipeline::{Chunk, IngestStage, RetrievalPipeline};
use crate::source::{acquire, SourceContent};

/// 대화형 루프 종료 명령
pub const EXIT_COMMAND: &str = "exit";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "web-rag")]
#[command(version, about = "웹 페이지 시맨틱 검색", long_about = None)]
pub struct Cli {
    /// 검색 대상 URL 또는 로컬 파일 경로
    pub source: String,

    /// 단일 질문 (지정 시 대화형 루프 없이 한 번만 검색)
    #[arg(short, long)]
    pub query: Option<String>,

    /// 인덱스에서 가져올 후보 수
    #[arg(short = 'k', long)]
    pub candidate_k: Option<usize>,

    /// 출력할 결과 수
    #[arg(short = 'n', long)]
    pub top_n: Option<usize>,

    /// 최소 문단 길이 (문자 수)
    #[arg(long)]
    pub min_chars: Option<usize>,

    /// 임베딩 차원 (768, 1536, 3072)
    #[arg(long, default_value_t = DEFAULT_DIMENSION)]
    pub dimension: usize,

    /// 결과에 거리 표시
    #[arg(long)]
    pub show_distances: bool,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 실행
///
/// 수집 이후의 인덱스/검색 실패는 `[!]` 메시지로 출력하고 정상 종료합니다.
pub async fn run(cli: Cli) -> Result<()> {
    let config = RetrievalConfig::from_env()
        .context("환경변수 설정 오류")?
        .with_overrides(cli.candidate_k, cli.top_n, cli.min_chars);
    config.validate()?;

    println!("[*] Loading embedding model...");
    let embedder = GeminiEmbedding::from_env_with_dimension(cli.dimension)
        .context("임베딩 프로바이더 생성 실패")?;

    println!("[*] Scraping website: {}", cli.source);
    let content = acquire(&cli.source, config.min_chunk_chars).await;
    if content.is_empty() {
        println!("[!] No content retrieved from the website.");
        return Ok(());
    }
    println!("{}", retrieved_message(&content));

    let mut stdout = std::io::stdout();
    let pipeline = match build_pipeline(content.chunks, &embedder, &mut stdout).await? {
        Some(pipeline) => pipeline,
        None => return Ok(()),
    };

    let session = Session {
        pipeline: &pipeline,
        embedder: &embedder,
        config: &config,
        show_distances: cli.show_distances,
    };

    match cli.query {
        Some(query) => session.answer(&query, &mut stdout).await.map(|_| ()),
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            session.run_loop(stdin, &mut stdout).await
        }
    }
}

/// 단계별 진행 메시지를 출력하며 인덱스 생성
///
/// 실패하면 `[!]` 메시지를 출력하고 `None`을 반환합니다.
pub async fn build_pipeline<W: Write + Send>(
    chunks: Vec<Chunk>,
    embedder: &dyn EmbeddingProvider,
    out: &mut W,
) -> Result<Option<RetrievalPipeline>> {
    let mut write_error = None;
    let result = RetrievalPipeline::ingest_with_progress(chunks, embedder, |stage| {
        let message = match stage {
            IngestStage::Embedding => "[*] Creating embeddings...",
            IngestStage::Indexing => "[*] Building index...",
        };
        if let Err(e) = writeln!(out, "{}", message) {
            if write_error.is_none() {
                write_error = Some(e);
            }
        }
    })
    .await;

    if let Some(e) = write_error {
        return Err(e.into());
    }

    match result {
        Ok(pipeline) => Ok(Some(pipeline)),
        Err(e) => {
            tracing::error!("Ingest failed: {}", e);
            writeln!(out, "[!] 인덱스 생성 실패: {}", e)?;
            Ok(None)
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// 수집이 끝난 대화형 세션
pub struct Session<'a> {
    pub pipeline: &'a RetrievalPipeline,
    pub embedder: &'a dyn EmbeddingProvider,
    pub config: &'a RetrievalConfig,
    pub show_distances: bool,
}

impl Session<'_> {
    /// 질문을 한 줄씩 읽어 답변 (exit 또는 EOF까지)
    ///
    /// 검색 에러가 나면 메시지를 출력하고 세션을 끝냅니다.
    pub async fn run_loop<R, W>(&self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();

        loop {
            write!(out, "\nAsk your question (or type '{}' to quit): ", EXIT_COMMAND)?;
            out.flush()?;

            let line = match lines.next_line().await.context("입력 읽기 실패")? {
                Some(line) => line,
                None => break,
            };

            if is_exit_command(&line) {
                break;
            }

            let query = line.trim();
            if query.is_empty() {
                continue;
            }

            if !self.answer(query, out).await? {
                break;
            }
        }

        Ok(())
    }

    /// 질문 하나에 답변 출력
    ///
    /// 검색이 실패하면 `[!]` 메시지를 출력하고 `false`를 반환합니다.
    /// `Err`는 출력 실패뿐입니다.
    pub async fn answer<W: Write>(&self, query: &str, out: &mut W) -> Result<bool> {
        writeln!(out, "[*] Searching for answers...")?;

        let candidate_k = self.config.candidate_k;
        let top_n = self.config.top_n;

        let results = match self
            .pipeline
            .query_scored(query, self.embedder, candidate_k, top_n)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                tracing::error!("Query failed: {}", e);
                writeln!(out, "[!] 검색 실패: {}", e)?;
                return Ok(false);
            }
        };

        if results.is_empty() {
            writeln!(out, "\n[!] 검색 결과가 없습니다.")?;
            return Ok(true);
        }

        writeln!(out, "\nTop Results:")?;
        for (i, result) in results.iter().enumerate() {
            if self.show_distances {
                writeln!(
                    out,
                    "{}. [거리: {:.4}] {}\n",
                    i + 1,
                    result.distance,
                    result.chunk.text
                )?;
            } else {
                writeln!(out, "{}. {}\n", i + 1, result.chunk.text)?;
            }
        }

        Ok(true)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 종료 명령 여부
///
/// 줄 끝 문자를 뗀 입력 전체가 `exit`와 같아야 합니다 (대소문자 무시).
/// 앞뒤에 공백이 붙은 입력은 일반 질문으로 처리됩니다.
pub fn is_exit_command(input: &str) -> bool {
    input.eq_ignore_ascii_case(EXIT_COMMAND)
}

/// 수집 완료 메시지 (페이지 제목이 있으면 함께 표시)
fn retrieved_message(content: &SourceContent) -> String {
    match &content.title {
        Some(title) => format!(
            "[OK] Retrieved {} text chunks from \"{}\".",
            content.chunks.len(),
            title
        ),
        None => format!("[OK] Retrieved {} text chunks.", content.chunks.len()),
    }
}

// ============================================================================
// Tests
// ============================================================================

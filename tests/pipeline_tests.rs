//! 파이프라인 통합 테스트 (네트워크 없음, 스텁 임베딩)

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use web_rag::{rank, Chunk, EmbeddingProvider, RetrievalError, RetrievalPipeline, VectorIndex};

/// 주제어로 2차원 벡터를 정하는 스텁
///
/// mammal 계열 → [1, 0], fuel 계열 → [0, 1], 쿼리 "mammal" → [0.9, 0.1]
struct TopicEmbedding {
    batches: AtomicUsize,
    batch_sizes: std::sync::Mutex<Vec<usize>>,
}

impl TopicEmbedding {
    fn new() -> Self {
        Self {
            batches: AtomicUsize::new(0),
            batch_sizes: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn embed(text: &str) -> Vec<f32> {
        if text == "mammal" {
            vec![0.9, 0.1]
        } else if text.contains("mammal") {
            vec![1.0, 0.0]
        } else {
            vec![0.0, 1.0]
        }
    }
}

#[async_trait]
impl EmbeddingProvider for TopicEmbedding {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sizes) = self.batch_sizes.lock() {
            sizes.push(texts.len());
        }
        Ok(texts.iter().map(|t| Self::embed(t)).collect())
    }

    fn dimension(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "topic-stub"
    }
}

/// 항상 실패하는 프로바이더
struct FailingEmbedding;

#[async_trait]
impl EmbeddingProvider for FailingEmbedding {
    async fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        anyhow::bail!("model endpoint unavailable")
    }

    fn dimension(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// 입력마다 길이가 다른 벡터를 반환하는 프로바이더
struct RaggedEmbedding;

#[async_trait]
impl EmbeddingProvider for RaggedEmbedding {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, _)| vec![0.0; 2 + i])
            .collect())
    }

    fn dimension(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "ragged"
    }
}

fn corpus() -> Vec<Chunk> {
    Chunk::from_texts(["cats are mammals", "dogs are mammals", "rockets use fuel"])
}

#[tokio::test]
async fn mammal_query_returns_mammal_chunks_in_order() {
    let embedder = TopicEmbedding::new();
    let pipeline = RetrievalPipeline::ingest(corpus(), &embedder)
        .await
        .expect("ingest");

    let answer = pipeline
        .query("mammal", &embedder, 3, 2)
        .await
        .expect("query");

    assert_eq!(answer.texts(), vec!["cats are mammals", "dogs are mammals"]);
}

#[tokio::test]
async fn ingest_embeds_whole_corpus_in_one_batch() {
    let embedder = TopicEmbedding::new();
    let _pipeline = RetrievalPipeline::ingest(corpus(), &embedder)
        .await
        .expect("ingest");

    assert_eq!(embedder.batches.load(Ordering::SeqCst), 1);
    let sizes = embedder.batch_sizes.lock().expect("lock").clone();
    assert_eq!(sizes, vec![3]);
}

#[tokio::test]
async fn query_embeds_single_item_batch() {
    let embedder = TopicEmbedding::new();
    let pipeline = RetrievalPipeline::ingest(corpus(), &embedder)
        .await
        .expect("ingest");
    pipeline
        .query("mammal", &embedder, 3, 1)
        .await
        .expect("query");

    let sizes = embedder.batch_sizes.lock().expect("lock").clone();
    assert_eq!(sizes, vec![3, 1]);
}

#[tokio::test]
async fn empty_corpus_never_builds_index() {
    let embedder = TopicEmbedding::new();
    let result = RetrievalPipeline::ingest(Vec::new(), &embedder).await;

    assert!(matches!(result, Err(RetrievalError::EmptyCorpus)));
    assert_eq!(embedder.batches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn provider_failure_is_propagated() {
    let result = RetrievalPipeline::ingest(corpus(), &FailingEmbedding).await;
    match result {
        Err(RetrievalError::Embedding(e)) => {
            assert!(e.to_string().contains("model endpoint unavailable"))
        }
        other => panic!("expected embedding error, got {:?}", other),
    }
}

#[tokio::test]
async fn ragged_provider_is_a_dimension_mismatch() {
    let result = RetrievalPipeline::ingest(corpus(), &RaggedEmbedding).await;
    assert!(matches!(
        result,
        Err(RetrievalError::DimensionMismatch {
            expected: 2,
            actual: 3
        })
    ));
}

#[tokio::test]
async fn repeated_queries_are_identical() {
    let embedder = TopicEmbedding::new();
    let pipeline = RetrievalPipeline::ingest(corpus(), &embedder)
        .await
        .expect("ingest");

    let first = pipeline
        .query_scored("rocket fuel", &embedder, 3, 3)
        .await
        .expect("query");
    let second = pipeline
        .query_scored("rocket fuel", &embedder, 3, 3)
        .await
        .expect("query");

    assert_eq!(first, second);
    assert_eq!(first[0].chunk.text, "rockets use fuel");
    for pair in first.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[tokio::test]
async fn top_n_larger_than_corpus_returns_all_distinct() {
    let embedder = TopicEmbedding::new();
    let pipeline = RetrievalPipeline::ingest(corpus(), &embedder)
        .await
        .expect("ingest");

    let answer = pipeline
        .query("mammal", &embedder, 10, 10)
        .await
        .expect("query");
    assert_eq!(answer.len(), 3);
}

/// 결정적 의사 난수 벡터 (xorshift)
fn pseudo_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            (0..dim)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    (state % 1000) as f32 / 100.0
                })
                .collect()
        })
        .collect()
}

#[test]
fn search_matches_naive_full_sort() {
    let vectors = pseudo_vectors(3000, 8, 0x9E37_79B9_7F4A_7C15);
    let query = pseudo_vectors(1, 8, 42).remove(0);
    let index = VectorIndex::build(vectors.clone()).expect("build");

    let mut expected: Vec<(f32, usize)> = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| (web_rag::squared_l2(&query, v).expect("same length"), i))
        .collect();
    expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let hits = index.search(&query, 25).expect("search");
    assert_eq!(hits.len(), 25);
    for (hit, (distance, i)) in hits.iter().zip(expected.iter()) {
        assert_eq!(hit.index, *i);
        assert_eq!(hit.distance, *distance);
    }
}

#[test]
fn concurrent_searches_share_one_index() {
    let vectors = pseudo_vectors(2000, 4, 7);
    let index = Arc::new(VectorIndex::build(vectors).expect("build"));
    let query = vec![5.0, 5.0, 5.0, 5.0];
    let baseline = index.search(&query, 5).expect("search");

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let index = Arc::clone(&index);
                let query = query.clone();
                scope.spawn(move || index.search(&query, 5).expect("search"))
            })
            .collect();

        for handle in handles {
            let hits = handle.join().expect("thread");
            assert_eq!(hits, baseline);
        }
    });
}

#[test]
fn rank_over_raw_hits_dedups_and_truncates() {
    let chunks = corpus();
    let index = VectorIndex::build(vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]])
        .expect("build");
    let mut hits = index.search(&[0.9, 0.1], 3).expect("search");
    // 같은 후보가 풀에 두 번 들어온 경우
    hits.push(hits[0]);

    let answer = rank(&hits, &chunks, 2).expect("rank");
    assert_eq!(answer.texts(), vec!["cats are mammals", "dogs are mammals"]);
}

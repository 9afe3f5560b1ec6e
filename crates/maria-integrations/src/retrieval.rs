//! Policy retrieval — chunked embedding index over the HR policy document.
//!
//! Backs the policy QA tool's `search(query, k)` collaborator. The document
//! is split into overlapping ~250-character chunks, each chunk embedded
//! once, and queries ranked by cosine similarity. The built index is cached
//! in a sidecar JSON file next to the source document so restarts don't
//! re-embed an unchanged document.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use maria_providers::EmbeddingsClient;

/// Target chunk size in characters.
const CHUNK_SIZE: usize = 250;

/// Overlap between adjacent chunks of an oversized paragraph.
const CHUNK_OVERLAP: usize = 50;

/// Ordered snippet lookup by semantic similarity.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return the `k` most relevant text snippets for `query`, best first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>>;
}

/// One embedded chunk of the policy document.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct IndexedChunk {
    text: String,
    vector: Vec<f32>,
}

/// In-memory cosine-similarity index over the policy document.
pub struct PolicyIndex {
    embeddings: EmbeddingsClient,
    chunks: Vec<IndexedChunk>,
}

impl std::fmt::Debug for PolicyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyIndex")
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

impl PolicyIndex {
    /// Build (or load from cache) an index over the document at `path`.
    pub async fn build(
        path: &Path,
        embeddings: EmbeddingsClient,
        use_cached: bool,
    ) -> Result<Self> {
        if !path.is_file() {
            bail!("policy document {} does not exist", path.display());
        }

        let cache = cache_path(path);
        if use_cached && cache.is_file() {
            match Self::load_cache(&cache) {
                Ok(chunks) => {
                    debug!(chunks = chunks.len(), cache = %cache.display(), "loaded cached policy index");
                    return Ok(PolicyIndex { embeddings, chunks });
                }
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable index cache, rebuilding");
                }
            }
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read policy document {}", path.display()))?;

        let texts = split_text(&text, CHUNK_SIZE, CHUNK_OVERLAP);
        if texts.is_empty() {
            bail!("policy document {} is empty", path.display());
        }

        let vectors = embeddings.embed_batch(&texts).await?;
        let chunks: Vec<IndexedChunk> = texts
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| IndexedChunk { text, vector })
            .collect();

        info!(chunks = chunks.len(), source = %path.display(), "policy index built");

        // Cache write failures are non-fatal: the index is already in memory.
        if let Err(e) = Self::save_cache(&cache, &chunks) {
            warn!(error = %e, cache = %cache.display(), "failed to write index cache");
        }

        Ok(PolicyIndex { embeddings, chunks })
    }

    fn load_cache(path: &Path) -> Result<Vec<IndexedChunk>> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_cache(path: &Path, chunks: &[IndexedChunk]) -> Result<()> {
        std::fs::write(path, serde_json::to_string(chunks)?)?;
        Ok(())
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl Retriever for PolicyIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>> {
        let query_vector = self.embeddings.embed(query).await?;

        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(&query_vector, &chunk.vector), chunk))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, chunk)| chunk.text.clone())
            .collect())
    }
}

/// Sidecar cache file next to the source document.
fn cache_path(source: &Path) -> PathBuf {
    source.with_extension("index.json")
}

/// Split text into chunks of roughly `chunk_size` characters.
///
/// Paragraphs are packed together while they fit; an oversized paragraph is
/// cut into character windows with `overlap` characters of continuity.
fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if paragraph.chars().count() > chunk_size {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_windows(paragraph, chunk_size, overlap));
            continue;
        }

        if !current.is_empty() && current.chars().count() + paragraph.chars().count() + 1 > chunk_size
        {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(paragraph);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Cut an oversized paragraph into overlapping character windows.
fn split_windows(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        windows.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    windows
}

/// Cosine similarity between two vectors. Zero for mismatched or zero-norm
/// inputs.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // ── split_text ──

    #[test]
    fn split_packs_small_paragraphs() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird.";
        let chunks = split_text(text, 250, 50);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("First paragraph."));
        assert!(chunks[0].contains("Third."));
    }

    #[test]
    fn split_separates_when_over_budget() {
        let para_a = "a".repeat(200);
        let para_b = "b".repeat(200);
        let text = format!("{para_a}\n\n{para_b}");
        let chunks = split_text(&text, 250, 50);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with('a'));
        assert!(chunks[1].starts_with('b'));
    }

    #[test]
    fn split_windows_oversized_paragraph() {
        let text = "x".repeat(600);
        let chunks = split_text(&text, 250, 50);
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 250);
        }
    }

    #[test]
    fn split_window_overlap_preserves_continuity() {
        let text: String = ('a'..='z').cycle().take(500).collect();
        let windows = split_windows(&text, 250, 50);
        // Each window after the first starts 200 chars after the previous one,
        // so its first 50 chars equal the previous window's last 50.
        let first: Vec<char> = windows[0].chars().collect();
        let second: Vec<char> = windows[1].chars().collect();
        assert_eq!(&first[200..250], &second[..50]);
    }

    #[test]
    fn split_empty_text() {
        assert!(split_text("", 250, 50).is_empty());
        assert!(split_text("\n\n\n\n", 250, 50).is_empty());
    }

    // ── cosine ──

    #[test]
    fn cosine_identity() {
        let v = vec![0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_mismatched_or_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    // ── index build + search ──

    fn write_policy_doc(dir: &tempfile::TempDir) -> PathBuf {
        // Two paragraphs too large to pack together → exactly two chunks.
        let holidays = format!(
            "Holiday policy: every employee receives 25 days of paid vacation \
             per year, accrued monthly from the hire date. {}",
            "Unused days do not roll over. ".repeat(4)
        );
        let probation = format!(
            "Probation policy: the probation period lasts three months and \
             includes a review with the line manager. {}",
            "Feedback is collected monthly. ".repeat(4)
        );
        let path = dir.path().join("hr_policies.md");
        std::fs::write(&path, format!("{holidays}\n\n{probation}")).unwrap();
        path
    }

    fn embeddings_for(uri: &str) -> EmbeddingsClient {
        EmbeddingsClient::new(uri.to_string(), "k", "text-embedding-3-small").unwrap()
    }

    #[tokio::test]
    async fn build_and_search_ranks_by_similarity() {
        let mock_server = MockServer::start().await;

        // First call: batch of two chunk embeddings.
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"embedding": [1.0, 0.0]},
                    {"embedding": [0.0, 1.0]}
                ]
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;

        // Second call: the query embedding, closest to the first chunk.
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.9, 0.1]}]
            })))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let doc = write_policy_doc(&dir);

        let index = PolicyIndex::build(&doc, embeddings_for(&mock_server.uri()), false)
            .await
            .unwrap();
        assert_eq!(index.len(), 2);

        let results = index.search("what is the holiday policy?", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].contains("Holiday policy"));
    }

    #[tokio::test]
    async fn cached_index_skips_embedding() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"embedding": [1.0, 0.0]},
                    {"embedding": [0.0, 1.0]}
                ]
            })))
            .expect(1) // the second build must be served from cache
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let doc = write_policy_doc(&dir);

        let first = PolicyIndex::build(&doc, embeddings_for(&mock_server.uri()), true)
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert!(cache_path(&doc).is_file());

        let second = PolicyIndex::build(&doc, embeddings_for(&mock_server.uri()), true)
            .await
            .unwrap();
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn build_missing_document_fails() {
        let embeddings = embeddings_for("https://unused.invalid");
        let err = PolicyIndex::build(Path::new("/nonexistent/policies.md"), embeddings, true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}

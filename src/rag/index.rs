
use serde::Serialize;

use super::store::Passage;
use crate::core::errors::ApiError;

/// A retrieved passage and its cosine similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// Exact nearest-neighbour index over passage embeddings.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<(Passage, Vec<f32>)>,
    dimension: usize,
}

impl VectorIndex {
    /// `passages` and `embeddings` are parallel: same length, same order.
    pub fn build(passages: &[Passage], embeddings: Vec<Vec<f32>>) -> Result<Self, ApiError> {
        if passages.len() != embeddings.len() {
            return Err(ApiError::Internal(format!(
                "Cannot index {} passages with {} embeddings",
                passages.len(),
                embeddings.len()
            )));
        }

        let dimension = embeddings.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = embeddings.iter().position(|e| e.len() != dimension) {
            return Err(ApiError::Internal(format!(
                "Embedding {} has dimension {}, expected {}",
                bad,
                embeddings[bad].len(),
                dimension
            )));
        }

        let entries = passages.iter().cloned().zip(embeddings).collect();
        Ok(Self { entries, dimension })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Up to `k` entries by descending cosine similarity; equal scores keep
    /// insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPassage>, ApiError> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(ApiError::Internal(format!(
                "Query vector length mismatch: {} != {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scores: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, (_, embedding))| (idx, cosine_similarity(query, embedding)))
            .collect();

        // sort_by is stable, which gives the insertion-order tie break.
        scores.sort_by(|left, right| right.1.total_cmp(&left.1));
        scores.truncate(k);

        Ok(scores
            .into_iter()
            .map(|(idx, score)| ScoredPassage {
                passage: self.entries[idx].0.clone(),
                score,
            })
            .collect())
    }
}

/// Cosine similarity; zero when either vector has no magnitude or is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if !(norm_a > f64::EPSILON && norm_b > f64::EPSILON) || !dot.is_finite() {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32
}

//! Lexical TF-IDF retriever.
//!
//! Builds a term-frequency/inverse-document-frequency vector space over the
//! full corpus at construction and ranks documents by cosine similarity
//! against the query vector. Deterministic for a fixed corpus: the
//! vocabulary is capped at the most frequent terms with alphabetical
//! tie-breaks, and ranking ties resolve by document order.
//!
//! Tokenization lowercases and splits on non-alphanumeric boundaries.
//! Hangul words additionally emit character bigrams so that inflected
//! forms ("결말이었다" / "결말에") still share index terms; Korean has no
//! whitespace-delimited stems, so whole-word matching alone misses most
//! morphological variants.

use std::collections::HashMap;

use async_trait::async_trait;

use revu_core::error::Result;
use revu_core::types::RetrievedDocument;

use crate::corpus::CorpusDocument;
use crate::retriever::DocumentRetriever;

/// TF-IDF retriever over an in-memory corpus.
pub struct LexicalRetriever {
    /// term -> column index, alphabetically ordered.
    vocab: HashMap<String, usize>,
    /// Smooth inverse document frequency per column.
    idf: Vec<f32>,
    /// L2-normalized sparse TF-IDF rows, one per document.
    rows: Vec<Vec<(usize, f32)>>,
    docs: Vec<CorpusDocument>,
}

impl LexicalRetriever {
    /// Build the vector space over `docs`, keeping at most `max_features`
    /// terms (the most frequent across the corpus).
    ///
    /// An empty corpus builds an empty space and never errors.
    pub fn new(docs: Vec<CorpusDocument>, max_features: usize) -> Self {
        let tokenized: Vec<Vec<String>> = docs.iter().map(|d| tokenize(&d.text)).collect();

        // Corpus-wide term counts and document frequencies.
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for tokens in &tokenized {
            let mut seen: HashMap<&str, ()> = HashMap::new();
            for tok in tokens {
                *term_counts.entry(tok.clone()).or_insert(0) += 1;
                if seen.insert(tok, ()).is_none() {
                    *doc_freq.entry(tok.clone()).or_insert(0) += 1;
                }
            }
        }

        // Cap the vocabulary: most frequent first, ties alphabetical, then
        // reorder the kept terms alphabetically for stable column indexes.
        let mut terms: Vec<(&String, &usize)> = term_counts.iter().collect();
        terms.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(max_features);
        let mut kept: Vec<String> = terms.into_iter().map(|(t, _)| t.clone()).collect();
        kept.sort();

        let vocab: HashMap<String, usize> = kept
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        let n = docs.len() as f32;
        let mut idf = vec![0.0f32; kept.len()];
        for (term, &col) in &vocab {
            let df = *doc_freq.get(term).unwrap_or(&0) as f32;
            idf[col] = ((1.0 + n) / (1.0 + df)).ln() + 1.0;
        }

        let rows = tokenized
            .iter()
            .map(|tokens| weigh(tokens, &vocab, &idf))
            .collect();

        Self {
            vocab,
            idf,
            rows,
            docs,
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True when the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of terms in the capped vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocab.len()
    }

    fn rank(&self, query: &str, k: usize) -> Vec<RetrievedDocument> {
        if query.trim().is_empty() || self.docs.is_empty() {
            return Vec::new();
        }

        let tokens = tokenize(query);
        let qvec = weigh(&tokens, &self.vocab, &self.idf);

        let mut scored: Vec<(usize, f32)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i, sparse_dot(&qvec, row)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| RetrievedDocument {
                text: self.docs[i].text.clone(),
                metadata: self.docs[i].metadata.clone(),
                score: score as f64,
            })
            .collect()
    }
}

#[async_trait]
impl DocumentRetriever for LexicalRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        Ok(self.rank(query, k))
    }

    fn name(&self) -> &'static str {
        "lexical"
    }
}

/// Lowercase and split into alphanumeric word runs; words shorter than two
/// characters are dropped. Hangul words also emit character bigrams.
fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    for word in lower.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() < 2 {
            continue;
        }
        tokens.push(word.to_string());
        if chars.iter().any(|&c| is_hangul(c)) {
            for pair in chars.windows(2) {
                tokens.push(pair.iter().collect());
            }
        }
    }
    tokens
}

fn is_hangul(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Build an L2-normalized sparse TF-IDF vector for the given tokens.
fn weigh(tokens: &[String], vocab: &HashMap<String, usize>, idf: &[f32]) -> Vec<(usize, f32)> {
    let mut tf: HashMap<usize, f32> = HashMap::new();
    for tok in tokens {
        if let Some(&col) = vocab.get(tok) {
            *tf.entry(col).or_insert(0.0) += 1.0;
        }
    }

    let mut entries: Vec<(usize, f32)> = tf
        .into_iter()
        .map(|(col, count)| (col, count * idf[col]))
        .collect();
    entries.sort_by_key(|(col, _)| *col);

    let norm: f32 = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for (_, w) in &mut entries {
            *w /= norm;
        }
    }
    entries
}

/// Dot product of two column-sorted sparse vectors.
fn sparse_dot(a: &[(usize, f32)], b: &[(usize, f32)]) -> f32 {
    let mut sum = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

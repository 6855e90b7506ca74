//! Facade binding the treebank tokenizer and the edit-distance kernel.

use rayon::prelude::*;

use crate::edit_distance::EditDistance;
use crate::treebank::TreebankTokenizer;
use crate::Error;

/// Manager for text-level document metrics.
///
/// Owns a compiled [`TreebankTokenizer`] and a memory-guarded
/// [`EditDistance`]; both are stateless per call, so one manager can serve
/// many evaluations.
///
/// # Example
///
/// ```
/// use docscore::TextManager;
///
/// # fn main() -> Result<(), docscore::Error> {
/// let manager = TextManager::new();
/// let gt = manager.tokenize("the cat sat", false);
/// let pred = manager.tokenize("the dog sat", false);
/// assert!((manager.edit_distance(&gt, &pred)? - 1.0 / 3.0).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
pub struct TextManager {
    tokenizer: TreebankTokenizer,
    edit_distance: EditDistance,
}

impl Default for TextManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TextManager {
    pub fn new() -> Self {
        Self {
            tokenizer: TreebankTokenizer::new(),
            edit_distance: EditDistance::with_memory_guard(),
        }
    }

    /// Split `text` into word-level tokens.
    ///
    /// Sentence segmentation ahead of the word tokenizer is deliberately not
    /// performed; the full input is tokenized as one span.
    pub fn tokenize(&self, text: &str, convert_parentheses: bool) -> Vec<String> {
        self.tokenizer.tokenize(text, convert_parentheses)
    }

    /// Normalised edit distance between two token sequences, in `[0, 1]`.
    pub fn edit_distance<T: AsRef<str>>(&self, tokens_a: &[T], tokens_b: &[T]) -> Result<f64, Error> {
        self.edit_distance.distance(tokens_a, tokens_b)
    }

    /// Tokenize many texts in parallel.
    ///
    /// Output order matches input order.
    pub fn tokenize_batch(&self, texts: &[&str], convert_parentheses: bool) -> Vec<Vec<String>> {
        texts
            .par_iter()
            .map(|text| self.tokenize(text, convert_parentheses))
            .collect()
    }

    /// Normalised edit distance for many token-sequence pairs in parallel.
    ///
    /// Output order matches input order; the first failing pair fails the
    /// whole batch.
    pub fn edit_distance_batch(
        &self,
        pairs: &[(Vec<String>, Vec<String>)],
    ) -> Result<Vec<f64>, Error> {
        pairs
            .par_iter()
            .map(|(a, b)| self.edit_distance(a, b))
            .collect()
    }
}

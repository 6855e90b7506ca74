//! # docscore
//!
//! Numerical kernels for scoring predicted document artifacts against
//! references.
//!
//! ## Score families
//!
//! - **TEDS** — tree-edit-distance similarity between labelled ordered trees
//!   in bracket notation, `1 − d / max(|T₁|, |T₂|)` with a unit cost model
//! - **Token edit distance** — Myers bit-parallel edit distance over token
//!   sequences, plus a Penn-Treebank-style word tokenizer
//! - **Multi-label layout confusion** — pixel-wise confusion matrices over
//!   rasterised bounding-box layouts and derived precision / recall / F1
//!
//! ## Example
//!
//! ```
//! use docscore::{TedsManager, TextManager};
//!
//! # fn main() -> Result<(), docscore::Error> {
//! let text = TextManager::new();
//! let a = text.tokenize("Good muffins cost $3.88.", false);
//! let b = text.tokenize("Good muffins cost $4.10.", false);
//! let distance = text.edit_distance(&a, &b)?;
//! assert!(distance > 0.0 && distance < 1.0);
//!
//! let mut teds = TedsManager::new();
//! let eval = teds.evaluate_sample("doc-1", "{table{tr{td}}}", "{table{tr{td}}}");
//! assert_eq!(eval.teds, 1.0);
//! # Ok(())
//! # }
//! ```
//!
//! Managers are cheap to construct and are not required to be shareable
//! across threads; build one per worker for parallel workloads. The text
//! batch entry points parallelise internally with rayon.

pub mod bits;
pub mod edit_distance;
pub mod layout;
pub mod memory;
pub mod metrics;
pub mod ted;
pub mod teds;
pub mod text;
pub mod tree;
pub mod treebank;

pub use edit_distance::EditDistance;
pub use layout::{
    compress_binary_representations, BboxResolution, CompressedPairs, MultiLabelConfusionMatrix,
    ValidationMode, ALL_COLLAPSED_CLASSES_NAME,
};
pub use metrics::{MatrixAggMetrics, MatrixEvaluation, MatrixMetrics};
pub use teds::{DatasetEvaluation, SampleEvaluation, TedsManager};
pub use text::TextManager;
pub use tree::{LabelDictionary, LabelId, Tree, TreeNode};
pub use treebank::TreebankTokenizer;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid bracket notation: {0}")]
    InvalidBracket(String),

    #[error("Category id {0} out of range (must be below 64)")]
    CategoryOutOfRange(u32),

    #[error("Match table would not fit in physical memory: {0}")]
    MemoryExceeded(String),

    #[error("Contribution validation failed: {0}")]
    ValidationFailed(String),

    #[error("Not implemented: {0}")]
    Unimplemented(&'static str),
}

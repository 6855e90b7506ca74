//! TEDS: tree-edit-distance similarity between bracket-notation trees.

use std::collections::HashMap;

use crate::ted::{tree_edit_distance, TreeIndex};
use crate::tree::{parse_single, validate_brackets, LabelDictionary};
use crate::Error;

/// Evaluation result for a single sample.
///
/// `error_id` 0 means success; 1 and 2 flag a malformed ground-truth or
/// prediction input, 3 flags a pair of empty trees. On success `teds` lies
/// in `[0, 1]`; on error it keeps the `-1.0` sentinel.
#[derive(Debug, Clone)]
pub struct SampleEvaluation {
    pub id: String,
    pub error_id: i32,
    pub error_msg: String,
    pub gt_tree_size: usize,
    pub pred_tree_size: usize,
    pub teds: f64,
}

impl SampleEvaluation {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            error_id: 0,
            error_msg: String::new(),
            gt_tree_size: 0,
            pred_tree_size: 0,
            teds: -1.0,
        }
    }
}

/// Evaluation result for an entire dataset. Aggregation semantics are not
/// implemented yet; see [`TedsManager::evaluate_dataset`].
#[derive(Debug, Clone, Default)]
pub struct DatasetEvaluation {
    pub error_id: i32,
    pub error_msg: String,
    pub teds: f64,
    pub sample_evaluations: HashMap<String, SampleEvaluation>,
}

/// Manager for computing TEDS scores on tree-structured samples.
///
/// Labels are interned into a dictionary owned by the manager and shared
/// across calls, and every evaluation is recorded in an internal per-sample
/// map. Both make the manager single-threaded; build one per worker for
/// parallel workloads.
///
/// # Example
///
/// ```
/// use docscore::TedsManager;
///
/// let mut manager = TedsManager::new();
/// let eval = manager.evaluate_sample("s1", "{table{tr{td}}}", "{table{tr{td}{td}}}");
/// assert_eq!(eval.error_id, 0);
/// assert!((eval.teds - 0.75).abs() < 1e-9);
/// ```
#[derive(Default)]
pub struct TedsManager {
    label_dict: LabelDictionary,
    sample_evaluations: HashMap<String, SampleEvaluation>,
}

impl TedsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate a single sample given in bracket notation.
    ///
    /// Never fails: malformed inputs are reported through the `error_id` /
    /// `error_msg` fields of the returned evaluation.
    pub fn evaluate_sample(
        &mut self,
        id: &str,
        bracket_a: &str,
        bracket_b: &str,
    ) -> SampleEvaluation {
        let mut eval = SampleEvaluation::new(id);

        if !validate_brackets(bracket_a) {
            eval.error_id = 1;
            eval.error_msg = "Incorrect format of the ground truth input".to_string();
            return self.record(eval);
        }
        let gt_tree = match parse_single(bracket_a, &mut self.label_dict) {
            Ok(tree) => tree,
            Err(err) => {
                eval.error_id = 1;
                eval.error_msg = format!("Incorrect format of the ground truth input: {err}");
                return self.record(eval);
            }
        };

        if !validate_brackets(bracket_b) {
            eval.error_id = 2;
            eval.error_msg = "Incorrect format of the predictions input".to_string();
            return self.record(eval);
        }
        let pred_tree = match parse_single(bracket_b, &mut self.label_dict) {
            Ok(tree) => tree,
            Err(err) => {
                eval.error_id = 2;
                eval.error_msg = format!("Incorrect format of the predictions input: {err}");
                return self.record(eval);
            }
        };

        let gt_tree_size = gt_tree.size();
        let pred_tree_size = pred_tree.size();
        let max_tree_size = gt_tree_size.max(pred_tree_size);
        eval.gt_tree_size = gt_tree_size;
        eval.pred_tree_size = pred_tree_size;

        if max_tree_size == 0 {
            eval.error_id = 3;
            eval.error_msg = "Both trees are empty".to_string();
            return self.record(eval);
        }

        let ti1 = TreeIndex::new(&gt_tree);
        let ti2 = TreeIndex::new(&pred_tree);
        let distance = tree_edit_distance(&ti1, &ti2);
        eval.teds = 1.0 - distance as f64 / max_tree_size as f64;

        log::debug!(
            "sample {id}: sizes {gt_tree_size}/{pred_tree_size}, distance {distance}, teds {}",
            eval.teds
        );

        self.record(eval)
    }

    /// Evaluate a single sample given as HTML.
    ///
    /// The HTML-to-bracket conversion is not implemented yet; this always
    /// returns [`Error::Unimplemented`].
    pub fn evaluate_html_sample(
        &mut self,
        id: &str,
        html_a: &str,
        html_b: &str,
        structure_only: bool,
    ) -> Result<SampleEvaluation, Error> {
        let bracket_a = html_to_bracket(html_a, structure_only)?;
        let bracket_b = html_to_bracket(html_b, structure_only)?;
        Ok(self.evaluate_sample(id, &bracket_a, &bracket_b))
    }

    /// Aggregate the recorded evaluations. Not implemented yet.
    pub fn aggregate(&mut self) -> Result<(), Error> {
        Err(Error::Unimplemented("dataset aggregation"))
    }

    /// Evaluate the whole recorded dataset. Not implemented yet.
    pub fn evaluate_dataset(&self) -> Result<DatasetEvaluation, Error> {
        Err(Error::Unimplemented("dataset evaluation"))
    }

    /// All evaluations recorded by this manager, keyed by sample id.
    pub fn sample_evaluations(&self) -> &HashMap<String, SampleEvaluation> {
        &self.sample_evaluations
    }

    fn record(&mut self, eval: SampleEvaluation) -> SampleEvaluation {
        self.sample_evaluations
            .insert(eval.id.clone(), eval.clone());
        eval
    }
}

fn html_to_bracket(_html: &str, _structure_only: bool) -> Result<String, Error> {
    Err(Error::Unimplemented("html_to_bracket"))
}

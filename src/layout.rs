//! Multi-label layout confusion: rasterisation, pair compression and the
//! four-case confusion accumulator.
//!
//! Pixels are 64-bit masks where bit k is 1 iff the pixel belongs to class
//! k, so an image supports at most 64 classes. The accumulator dispatches
//! every unique (gt, pred) mask pair to one of four closed-form cases and
//! updates the `C×C` matrix directly, without materialising the per-pixel
//! contributions tensor.
//!
//! Algorithm reference:
//!   "Multi-label classifier performance evaluation with confusion matrix"
//!   <https://csitcp.org/paper/10/108csit01.pdf>

use crate::metrics::{self, MatrixEvaluation};
use crate::Error;
use std::collections::BTreeMap;

/// Class name used for the non-background bucket of the collapsed 2×2 view.
pub const ALL_COLLAPSED_CLASSES_NAME: &str = "all_classes";

/// Highest number of distinct classes a pixel mask can carry.
pub const MAX_CATEGORIES: usize = 64;

/// Bounding-box annotation for a single layout element.
///
/// `bbox` is `(x1, y1, x2, y2)` with the origin at the top-left corner;
/// coordinates are in pixels and are not normalised.
#[derive(Debug, Clone, PartialEq)]
pub struct BboxResolution {
    pub category_id: u32,
    pub bbox: [f64; 4],
    pub score: f64,
}

/// What to do when contribution validation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    #[default]
    Disabled,
    Log,
    Raise,
}

/// Unique (gt, pred) mask pairs with the number of pixels sharing each pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressedPairs {
    pub gt: Vec<u64>,
    pub preds: Vec<u64>,
    pub counts: Vec<i64>,
}

/// Collapse equal (gt[i], preds[i]) pairs into unique pairs with counts.
///
/// Pairs are returned in lexicographic order and the counts sum to the
/// number of pixels.
///
/// # Panics
///
/// Panics if the two arrays differ in length.
pub fn compress_binary_representations(gt: &[u64], preds: &[u64]) -> CompressedPairs {
    assert_eq!(
        gt.len(),
        preds.len(),
        "gt and preds pixel arrays must have the same length"
    );

    let mut pairs: Vec<(u64, u64)> = gt.iter().copied().zip(preds.iter().copied()).collect();
    pairs.sort_unstable();

    let mut result = CompressedPairs::default();
    let mut i = 0;
    while i < pairs.len() {
        let current = pairs[i];
        let mut count = 0i64;
        while i < pairs.len() && pairs[i] == current {
            count += 1;
            i += 1;
        }
        result.gt.push(current.0);
        result.preds.push(current.1);
        result.counts.push(count);
    }
    result
}

/// Pixel-wise multi-label confusion matrices over rasterised layouts.
pub struct MultiLabelConfusionMatrix {
    mode: ValidationMode,
}

impl MultiLabelConfusionMatrix {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    /// Rasterise `resolutions` into a flat row-major pixel matrix of shape
    /// `[image_height × image_width]`.
    ///
    /// Each bbox covers the integer span `[⌊x1⌋, ⌈x2⌉) × [⌊y1⌋, ⌈y2⌉)`
    /// clamped to the image; covered pixels get bit `category_id` set. An
    /// inverted bbox rasterises to nothing. With `set_background`, pixels
    /// left without any class are assigned 1 (bit 0 = background class).
    pub fn make_binary_representation(
        &self,
        image_width: usize,
        image_height: usize,
        resolutions: &[BboxResolution],
        set_background: bool,
    ) -> Result<Vec<u64>, Error> {
        let mut matrix = vec![0u64; image_width * image_height];

        for resolution in resolutions {
            if resolution.category_id as usize >= MAX_CATEGORIES {
                return Err(Error::CategoryOutOfRange(resolution.category_id));
            }
            let [x1, y1, x2, y2] = resolution.bbox;
            let x_begin = (x1.floor() as i64).max(0) as usize;
            let y_begin = (y1.floor() as i64).max(0) as usize;
            let x_end = (x2.ceil() as i64).clamp(0, image_width as i64) as usize;
            let y_end = (y2.ceil() as i64).clamp(0, image_height as i64) as usize;

            let bit = 1u64 << resolution.category_id;
            for y in y_begin..y_end {
                for x in x_begin..x_end {
                    matrix[y * image_width + x] |= bit;
                }
            }
        }

        if set_background {
            for pixel in &mut matrix {
                if *pixel == 0 {
                    *pixel = 1;
                }
            }
        }

        Ok(matrix)
    }

    /// Compute the multi-label confusion matrix from two equal-length pixel
    /// arrays and the sorted list of category ids forming the matrix axes.
    ///
    /// Duplicate (gt, pred) pairs are compressed first and their counts fed
    /// to the accumulator as weights. Returns a flat row-major `C×C` matrix
    /// with `C = categories.len()`; row = ground-truth class, column =
    /// predicted class.
    ///
    /// # Panics
    ///
    /// Panics if `gt` and `preds` differ in length or `categories` is not
    /// strictly ascending.
    pub fn generate_confusion_matrix(
        &self,
        gt: &[u64],
        preds: &[u64],
        categories: &[u32],
    ) -> Vec<f64> {
        let compressed = compress_binary_representations(gt, preds);
        self.accumulate(
            &compressed.gt,
            &compressed.preds,
            categories,
            Some(&compressed.counts),
        )
    }

    // Dispatch every (g, p, weight) triple to one of four mutually exclusive
    // cases:
    //
    //   Case 1  g == p                 - perfect prediction
    //   Case 2  (g & p) == g, g != p   - preds ⊃ gt (extra false positives)
    //   Case 3  (g | p) == g, g != p   - gt ⊃ preds (missed classes)
    //   Case 4  otherwise              - symmetric difference on both sides
    //
    // Cases 2-4 distribute fractional penalty mass over the off-diagonal
    // cells, so entries are reals rather than counts. For every pixel the
    // total added mass equals popcount(g) (when p is non-empty).
    fn accumulate(
        &self,
        gt: &[u64],
        preds: &[u64],
        categories: &[u32],
        weights: Option<&[i64]>,
    ) -> Vec<f64> {
        assert!(
            categories.windows(2).all(|pair| pair[0] < pair[1]),
            "categories must be sorted and unique"
        );

        let c = categories.len();
        let mut cm = vec![0.0f64; c * c];

        for idx in 0..gt.len() {
            let g = gt[idx];
            let p = preds[idx];
            let w = weights.map_or(1.0, |counts| counts[idx] as f64);

            if g == p {
                // Case 1: weight lands on the diagonal of every gt bit.
                for b in 0..c {
                    if g >> b & 1 == 1 {
                        cm[b * c + b] += w;
                    }
                }
            } else if g & p == g {
                // Case 2: every gt row gains popcount(g)/popcount(p) on the
                // diagonal and 1/popcount(p) per spurious prediction bit.
                let diff = p & !g;
                let denom = f64::from(p.count_ones());
                let gt_count = f64::from(g.count_ones());

                for i in 0..c {
                    if g >> i & 1 == 0 {
                        continue;
                    }
                    cm[i * c + i] += w * gt_count / denom;
                    for j in 0..c {
                        if diff >> j & 1 == 1 {
                            cm[i * c + j] += w / denom;
                        }
                    }
                }
            } else if g | p == g {
                // Case 3: predicted bits keep full diagonal credit; each
                // missed gt bit spreads 1/popcount(p) over the predictions.
                let gt_diff = g & !p;
                let denom = f64::from(p.count_ones());

                for j in 0..c {
                    if p >> j & 1 == 1 {
                        cm[j * c + j] += w;
                    }
                }
                for i in 0..c {
                    if gt_diff >> i & 1 == 0 {
                        continue;
                    }
                    for j in 0..c {
                        if p >> j & 1 == 1 {
                            cm[i * c + j] += w / denom;
                        }
                    }
                }
            } else {
                // Case 4: intersection bits keep the diagonal; the penalty
                // divides by the prediction-only bit count, not popcount(p).
                let gt_diff = g & !p;
                let preds_diff = p & !g;
                let intersection = g & p;
                let denom = f64::from(preds_diff.count_ones());

                for k in 0..c {
                    if intersection >> k & 1 == 1 {
                        cm[k * c + k] += w;
                    }
                }
                for i in 0..c {
                    if gt_diff >> i & 1 == 0 {
                        continue;
                    }
                    for j in 0..c {
                        if preds_diff >> j & 1 == 1 {
                            cm[i * c + j] += w / denom;
                        }
                    }
                }
            }
        }

        cm
    }

    /// Derive precision / recall / F1 from a confusion matrix, both per
    /// class and for the collapsed background-vs-rest view.
    pub fn compute_metrics(
        &self,
        confusion_matrix: &[f64],
        num_categories: usize,
        class_names: &BTreeMap<u32, String>,
    ) -> MatrixEvaluation {
        metrics::compute_metrics(confusion_matrix, num_categories, class_names)
    }

    /// Check the invariants of a per-pixel contributions tensor.
    ///
    /// `contributions` is flat row-major `[k, C, C]` with
    /// `k = selected_gt.len()`. Two properties are checked at 1e-9 absolute
    /// tolerance: each row i of a pixel's slice sums to gt bit i, and the
    /// full tensor sums to Σ popcount(gt).
    ///
    /// In `Disabled` mode this is a no-op; in `Log` mode violations are
    /// reported through the log facade; in `Raise` mode they fail the call.
    pub fn validate_contributions(
        &self,
        selected_gt: &[u64],
        contributions: &[f64],
        num_categories: usize,
        info: &str,
    ) -> Result<(), Error> {
        if self.mode == ValidationMode::Disabled {
            return Ok(());
        }

        let c = num_categories;
        let k = selected_gt.len();
        if contributions.len() != k * c * c {
            return self.handle_error(format!("{info}: Wrong contributions dimension"));
        }

        for (pixel, &g) in selected_gt.iter().enumerate() {
            for i in 0..c {
                let expected = (g >> i & 1) as f64;
                let row = &contributions[pixel * c * c + i * c..pixel * c * c + (i + 1) * c];
                let row_sum: f64 = row.iter().sum();
                if (row_sum - expected).abs() > 1e-9 {
                    return self.handle_error(format!("{info}: Wrong contributions row sums"));
                }
            }
        }

        let full_sum: f64 = contributions.iter().sum();
        let expected_full: u32 = selected_gt.iter().map(|g| g.count_ones()).sum();
        if (full_sum - f64::from(expected_full)).abs() > 1e-9 {
            return self.handle_error(format!("{info}: Wrong contributions full sums"));
        }

        Ok(())
    }

    fn handle_error(&self, msg: String) -> Result<(), Error> {
        match self.mode {
            ValidationMode::Raise => Err(Error::ValidationFailed(msg)),
            _ => {
                log::error!("{msg}");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> MultiLabelConfusionMatrix {
        MultiLabelConfusionMatrix::new(ValidationMode::Disabled)
    }

    #[test]
    fn test_compress_counts_and_order() {
        let gt = [3, 1, 3, 1, 3];
        let preds = [3, 1, 3, 2, 3];
        let compressed = compress_binary_representations(&gt, &preds);
        assert_eq!(compressed.gt, vec![1, 1, 3]);
        assert_eq!(compressed.preds, vec![1, 2, 3]);
        assert_eq!(compressed.counts, vec![1, 1, 3]);
        assert_eq!(compressed.counts.iter().sum::<i64>(), gt.len() as i64);
    }

    #[test]
    fn test_case2_distributes_over_spurious_bits() {
        // g ⊂ p: one gt bit, prediction adds bit 1.
        let cm = matrix().generate_confusion_matrix(&[0b001], &[0b011], &[0, 1, 2]);
        assert!((cm[0] - 0.5).abs() < 1e-9); // [0,0]
        assert!((cm[1] - 0.5).abs() < 1e-9); // [0,1]
        assert!((cm.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_case3_penalises_missed_bits() {
        // p ⊂ g: bit 1 of gt is missed.
        let cm = matrix().generate_confusion_matrix(&[0b011], &[0b001], &[0, 1, 2]);
        assert!((cm[0] - 1.0).abs() < 1e-9); // [0,0]
        assert!((cm[3] - 1.0).abs() < 1e-9); // [1,0]
        assert!((cm.iter().sum::<f64>() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_case4_symmetric_difference() {
        // isect = bit 0, gt-only = bit 1, pred-only = bit 2.
        let cm = matrix().generate_confusion_matrix(&[0b011], &[0b101], &[0, 1, 2]);
        assert!((cm[0] - 1.0).abs() < 1e-9); // [0,0]
        assert!((cm[5] - 1.0).abs() < 1e-9); // [1,2]
        assert!((cm.iter().sum::<f64>() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_prediction_adds_nothing() {
        let cm = matrix().generate_confusion_matrix(&[0b011], &[0], &[0, 1, 2]);
        assert!(cm.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rasterise_clamps_and_sets_background() {
        let boxes = [
            BboxResolution {
                category_id: 1,
                bbox: [-2.0, 0.4, 1.5, 1.0],
                score: 0.9,
            },
            BboxResolution {
                category_id: 2,
                bbox: [1.0, 0.0, 2.0, 2.0],
                score: 0.8,
            },
        ];
        let masks = matrix()
            .make_binary_representation(3, 2, &boxes, true)
            .unwrap();
        // Box 1 floors/ceils to x ∈ [0, 2), y ∈ [0, 1); box 2 covers x ∈ [1, 2).
        assert_eq!(masks, vec![0b010, 0b110, 0b001, 0b001, 0b100, 0b001]);
    }

    #[test]
    fn test_rasterise_rejects_large_category() {
        let boxes = [BboxResolution {
            category_id: 64,
            bbox: [0.0, 0.0, 1.0, 1.0],
            score: 1.0,
        }];
        assert!(matches!(
            matrix().make_binary_representation(2, 2, &boxes, false),
            Err(Error::CategoryOutOfRange(64))
        ));
    }

    #[test]
    fn test_inverted_bbox_rasterises_empty() {
        let boxes = [BboxResolution {
            category_id: 0,
            bbox: [3.0, 3.0, 1.0, 1.0],
            score: 1.0,
        }];
        let masks = matrix()
            .make_binary_representation(4, 4, &boxes, false)
            .unwrap();
        assert!(masks.iter().all(|&m| m == 0));
    }

    #[test]
    fn test_validate_contributions_modes() {
        // Single pixel, two classes, gt = bit 0, perfect prediction.
        let good = vec![1.0, 0.0, 0.0, 0.0];
        let bad = vec![0.5, 0.0, 0.0, 0.0];

        let raising = MultiLabelConfusionMatrix::new(ValidationMode::Raise);
        assert!(raising.validate_contributions(&[1], &good, 2, "t").is_ok());
        assert!(raising.validate_contributions(&[1], &bad, 2, "t").is_err());
        assert!(raising.validate_contributions(&[1], &good[..3], 2, "t").is_err());

        // Disabled mode never fails.
        assert!(matrix().validate_contributions(&[1], &bad, 2, "t").is_ok());
    }
}

//! Precision / recall / F1 derivation from confusion matrices.

use std::collections::BTreeMap;

use crate::layout::ALL_COLLAPSED_CLASSES_NAME;

/// Per-class and aggregate precision / recall / F1 scalars derived from a
/// confusion matrix.
#[derive(Debug, Clone, Default)]
pub struct MatrixAggMetrics {
    pub classes_precision: BTreeMap<String, f64>,
    pub classes_recall: BTreeMap<String, f64>,
    pub classes_f1: BTreeMap<String, f64>,

    pub classes_precision_mean: f64,
    pub classes_recall_mean: f64,
    pub classes_f1_mean: f64,
}

/// Full set of matrices and aggregated metrics computed from a confusion
/// matrix. All matrix fields are flat row-major arrays of shape
/// `[num_categories × num_categories]`.
#[derive(Debug, Clone, Default)]
pub struct MatrixMetrics {
    pub class_names: BTreeMap<u32, String>,
    pub num_categories: usize,

    pub confusion_matrix: Vec<f64>,
    pub precision_matrix: Vec<f64>,
    pub recall_matrix: Vec<f64>,
    pub f1_matrix: Vec<f64>,

    pub agg_metrics: MatrixAggMetrics,
}

/// Paired evaluation: one view with every class kept distinct, one with the
/// non-background classes collapsed into a single bucket.
#[derive(Debug, Clone)]
pub struct MatrixEvaluation {
    pub detailed: MatrixMetrics,
    pub collapsed: MatrixMetrics,
}

/// Derive precision / recall / F1 matrices and their diagonal summaries from
/// a raw confusion matrix.
///
/// Cells with a zero column (precision) or row (recall) sum are defined as
/// 0. Classes missing from `class_names` fall back to their numeric index.
///
/// # Panics
///
/// Panics if `confusion_matrix` is not `num_categories²` long.
pub fn compute_matrix_metrics(
    confusion_matrix: &[f64],
    num_categories: usize,
    class_names: &BTreeMap<u32, String>,
) -> MatrixMetrics {
    let c = num_categories;
    assert_eq!(
        confusion_matrix.len(),
        c * c,
        "confusion matrix must be num_categories x num_categories"
    );

    let mut row_sums = vec![0.0f64; c];
    let mut col_sums = vec![0.0f64; c];
    for i in 0..c {
        for j in 0..c {
            row_sums[i] += confusion_matrix[i * c + j];
            col_sums[j] += confusion_matrix[i * c + j];
        }
    }

    let mut precision_matrix = vec![0.0f64; c * c];
    let mut recall_matrix = vec![0.0f64; c * c];
    let mut f1_matrix = vec![0.0f64; c * c];

    for i in 0..c {
        for j in 0..c {
            let value = confusion_matrix[i * c + j];
            if col_sums[j] != 0.0 {
                precision_matrix[i * c + j] = value / col_sums[j];
            }
            if row_sums[i] != 0.0 {
                recall_matrix[i * c + j] = value / row_sums[i];
            }
        }
    }

    for i in 0..c * c {
        let p = precision_matrix[i];
        let r = recall_matrix[i];
        if p + r != 0.0 {
            f1_matrix[i] = 2.0 * p * r / (p + r);
        }
    }

    // The diagonal gives the per-class scalars.
    let mut agg_metrics = MatrixAggMetrics::default();
    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut f1_sum = 0.0;
    for k in 0..c {
        let name = class_names
            .get(&(k as u32))
            .cloned()
            .unwrap_or_else(|| k.to_string());

        let p = precision_matrix[k * c + k];
        let r = recall_matrix[k * c + k];
        let f1 = f1_matrix[k * c + k];
        agg_metrics.classes_precision.insert(name.clone(), p);
        agg_metrics.classes_recall.insert(name.clone(), r);
        agg_metrics.classes_f1.insert(name, f1);
        precision_sum += p;
        recall_sum += r;
        f1_sum += f1;
    }
    if c > 0 {
        agg_metrics.classes_precision_mean = precision_sum / c as f64;
        agg_metrics.classes_recall_mean = recall_sum / c as f64;
        agg_metrics.classes_f1_mean = f1_sum / c as f64;
    }

    MatrixMetrics {
        class_names: class_names.clone(),
        num_categories: c,
        confusion_matrix: confusion_matrix.to_vec(),
        precision_matrix,
        recall_matrix,
        f1_matrix,
        agg_metrics,
    }
}

/// Detailed metrics plus the collapsed 2×2 background-vs-rest view.
///
/// The collapsed matrix folds every non-background row and column together:
/// `[[cm₀₀, Σⱼ₌₁ cm₀ⱼ], [Σᵢ₌₁ cmᵢ₀, Σᵢ₌₁ Σⱼ₌₁ cmᵢⱼ]]`, keeping class 0's
/// name and labelling the rest [`ALL_COLLAPSED_CLASSES_NAME`].
pub fn compute_metrics(
    confusion_matrix: &[f64],
    num_categories: usize,
    class_names: &BTreeMap<u32, String>,
) -> MatrixEvaluation {
    assert!(num_categories > 0, "collapsing requires at least one class");
    let detailed = compute_matrix_metrics(confusion_matrix, num_categories, class_names);

    let c = num_categories;
    let mut collapsed_cm = vec![0.0f64; 4];
    collapsed_cm[0] = confusion_matrix[0];
    for j in 1..c {
        collapsed_cm[1] += confusion_matrix[j];
    }
    for i in 1..c {
        collapsed_cm[2] += confusion_matrix[i * c];
    }
    for i in 1..c {
        for j in 1..c {
            collapsed_cm[3] += confusion_matrix[i * c + j];
        }
    }

    let mut collapsed_names = BTreeMap::new();
    collapsed_names.insert(
        0,
        class_names
            .get(&0)
            .cloned()
            .unwrap_or_else(|| "0".to_string()),
    );
    collapsed_names.insert(1, ALL_COLLAPSED_CLASSES_NAME.to_string());

    let collapsed = compute_matrix_metrics(&collapsed_cm, 2, &collapsed_names);

    MatrixEvaluation {
        detailed,
        collapsed,
    }
}

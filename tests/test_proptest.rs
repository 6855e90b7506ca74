//! Property-based tests for the kernel invariants.

use proptest::prelude::*;

use docscore::{EditDistance, MultiLabelConfusionMatrix, TedsManager, TreebankTokenizer, ValidationMode};

/// Textbook O(n·m) Levenshtein used as a reference for the bit-parallel
/// kernel.
fn reference_distance(a: &[String], b: &[String]) -> i64 {
    let n = a.len();
    let m = b.len();
    let mut previous: Vec<i64> = (0..=m as i64).collect();
    let mut current = vec![0i64; m + 1];
    for i in 1..=n {
        current[0] = i as i64;
        for j in 1..=m {
            let substitution = previous[j - 1] + i64::from(a[i - 1] != b[j - 1]);
            current[j] = substitution.min(previous[j] + 1).min(current[j - 1] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[m]
}

fn token_seq() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e]{1,3}", 0..50)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_matches_reference_levenshtein(a in token_seq(), b in token_seq()) {
        let calculator = EditDistance::new();
        let raw = calculator.raw_distance(&a, &b).unwrap();
        prop_assert_eq!(raw, reference_distance(&a, &b));
    }

    #[test]
    fn prop_distance_identity_and_symmetry(a in token_seq(), b in token_seq()) {
        let calculator = EditDistance::new();
        prop_assert_eq!(calculator.raw_distance(&a, &a).unwrap(), 0);
        prop_assert_eq!(
            calculator.raw_distance(&a, &b).unwrap(),
            calculator.raw_distance(&b, &a).unwrap()
        );
    }

    #[test]
    fn prop_triangle_inequality(
        a in token_seq(),
        b in token_seq(),
        c in token_seq(),
    ) {
        let calculator = EditDistance::new();
        let ac = calculator.raw_distance(&a, &c).unwrap();
        let ab = calculator.raw_distance(&a, &b).unwrap();
        let bc = calculator.raw_distance(&b, &c).unwrap();
        prop_assert!(ac <= ab + bc);
    }

    #[test]
    fn prop_normalised_distance_in_unit_interval(a in token_seq(), b in token_seq()) {
        let calculator = EditDistance::new();
        let raw = calculator.raw_distance(&a, &b).unwrap();
        prop_assert!(raw <= a.len().max(b.len()) as i64);

        let normalised = calculator.distance(&a, &b).unwrap();
        prop_assert!((0.0..=1.0).contains(&normalised));
    }

    #[test]
    fn prop_tokenizer_output_has_no_whitespace(text in "\\PC{0,200}") {
        let tokenizer = TreebankTokenizer::new();
        for convert in [false, true] {
            for token in tokenizer.tokenize(&text, convert) {
                prop_assert!(!token.is_empty());
                prop_assert!(!token.chars().any(char::is_whitespace));
            }
        }
    }

    #[test]
    fn prop_confusion_mass_is_conserved(
        pixels in prop::collection::vec((0u64..16, 1u64..16), 1..40)
    ) {
        // Mass per pixel equals popcount(gt) whenever the prediction mask is
        // non-empty.
        let matrix = MultiLabelConfusionMatrix::new(ValidationMode::Disabled);
        let gt: Vec<u64> = pixels.iter().map(|&(g, _)| g).collect();
        let preds: Vec<u64> = pixels.iter().map(|&(_, p)| p).collect();
        let cm = matrix.generate_confusion_matrix(&gt, &preds, &[0, 1, 2, 3]);

        let mass: f64 = cm.iter().sum();
        let expected: u32 = gt.iter().map(|g| g.count_ones()).sum();
        prop_assert!((mass - f64::from(expected)).abs() < 1e-6);

        for value in cm {
            prop_assert!(value >= 0.0);
        }
    }

    #[test]
    fn prop_teds_identity_and_range(labels in prop::collection::vec("[a-c]", 1..8)) {
        // Build a left-leaning chain tree out of the generated labels.
        let mut bracket = String::new();
        for label in &labels {
            bracket.push('{');
            bracket.push_str(label);
        }
        bracket.push_str(&"}".repeat(labels.len()));

        let mut manager = TedsManager::new();
        let eval = manager.evaluate_sample("chain", &bracket, &bracket);
        prop_assert_eq!(eval.error_id, 0);
        prop_assert!((eval.teds - 1.0).abs() < 1e-9);

        let eval = manager.evaluate_sample("vs-leaf", &bracket, "{q}");
        prop_assert_eq!(eval.error_id, 0);
        prop_assert!((0.0..=1.0).contains(&eval.teds));
    }
}

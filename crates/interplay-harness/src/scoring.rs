//! True/false widget scoring.
//!
//! `max(0, selectedTrue - selectedFalse) / totalTrue`, where the learner
//! selects the statements they judge true in context. Other widgets score
//! themselves.

use serde_json::Value;
use std::collections::BTreeSet;

/// `isTrueInContext` flags in seed order. `None` when the seed lacks the
/// true/false layout.
pub fn true_false_flags(seed: &Value) -> Option<Vec<bool>> {
    seed.get("fragments")?
        .as_array()?
        .iter()
        .map(|f| f.get("isTrueInContext").and_then(Value::as_bool))
        .collect()
}

/// Score in `[0, 1]`. Duplicate and out-of-range selections are ignored;
/// no true statements scores 0.
pub fn score_true_false(flags: &[bool], selected: &[usize]) -> f64 {
    let total_true = flags.iter().filter(|f| **f).count();
    if total_true == 0 {
        return 0.0;
    }
    let picked: BTreeSet<usize> = selected.iter().copied().filter(|i| *i < flags.len()).collect();
    let (hits, misses) = picked.iter().fold((0usize, 0usize), |(h, m), i| {
        if flags[*i] {
            (h + 1, m)
        } else {
            (h, m + 1)
        }
    });
    hits.saturating_sub(misses) as f64 / total_true as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_formula() {
        let flags = [true, true, false, true];
        assert_eq!(score_true_false(&flags, &[0, 1, 3]), 1.0);
        assert!((score_true_false(&flags, &[0, 1, 2]) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(score_true_false(&flags, &[2]), 0.0);
        assert_eq!(score_true_false(&flags, &[]), 0.0);
    }

    #[test]
    fn test_duplicates_and_out_of_range_ignored() {
        let flags = [true, false];
        assert_eq!(score_true_false(&flags, &[0, 0, 0, 9]), 1.0);
        assert_eq!(score_true_false(&[false, false], &[0]), 0.0);
    }

    #[test]
    fn test_flags_from_seed() {
        let seed = json!({"fragments": [
            {"text": "A", "isTrueInContext": true},
            {"text": "B", "isTrueInContext": false}
        ]});
        assert_eq!(true_false_flags(&seed), Some(vec![true, false]));
        assert_eq!(true_false_flags(&json!({"fragments": [{"text": "A"}]})), None);
        assert_eq!(true_false_flags(&json!([])), None);
    }
}

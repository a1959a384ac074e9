/// Ripeness bands the model was trained on, in output-index order. The
/// names are opaque identifiers supplied by the training process; length
/// and order must match the model's output dimensionality exactly.
pub const CLASS_NAMES: [&str; 5] = ["0", "2-1", "4-3", "5-6", "7-8"];

/// Maps a score vector to its class label by argmax, first occurrence
/// winning on ties. Returns None when the vector length does not match
/// the label list, which indicates a model/label mismatch rather than a
/// per-request problem.
pub fn resolve_label(scores: &[f32]) -> Option<&'static str> {
    if scores.len() != CLASS_NAMES.len() {
        return None;
    }

    let mut best = 0;
    for (index, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = index;
        }
    }

    Some(CLASS_NAMES[best])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_highest_score() {
        let scores = [0.1, 0.05, 0.6, 0.2, 0.05];
        assert_eq!(resolve_label(&scores), Some("4-3"));
    }

    #[test]
    fn ties_resolve_to_the_first_occurrence() {
        let scores = [0.5, 0.5, 0.0, 0.0, 0.0];
        assert_eq!(resolve_label(&scores), Some("0"));
    }

    #[test]
    fn wrong_length_vector_is_rejected() {
        assert_eq!(resolve_label(&[0.3, 0.7]), None);
        assert_eq!(resolve_label(&[]), None);
    }
}

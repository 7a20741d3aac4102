use ndarray::Array1;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::error::ClassifierError;
use super::labels::CategorySet;

/// Numerically stable softmax over raw logits.
///
/// The maximum logit is subtracted before exponentiating, so inputs of any
/// magnitude map to finite probabilities. Computation happens in `f64`.
pub fn softmax(logits: &[f32]) -> Array1<f64> {
    let logits = Array1::from_iter(logits.iter().map(|&x| f64::from(x)));
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps = logits.mapv(|x| (x - max).exp());
    let sum = exps.sum();
    exps / sum
}

/// Index of the largest value; the lowest index wins on exact ties.
pub fn argmax(values: &Array1<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Probabilities keyed by category display name, kept in category order.
///
/// Serializes as a JSON object whose keys follow the model's output order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityDistribution {
    entries: Vec<(String, f64)>,
}

impl ProbabilityDistribution {
    pub fn get(&self, display_name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == display_name)
            .map(|&(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, p)| (name.as_str(), *p))
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|&(_, p)| p).sum()
    }
}

impl Serialize for ProbabilityDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, p) in &self.entries {
            map.serialize_entry(name, p)?;
        }
        map.end()
    }
}

/// A normalized prediction: the winning display name and the full distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub label: String,
    pub distribution: ProbabilityDistribution,
}

/// Converts a raw score vector aligned with `categories` into probabilities
/// and picks the arg-max category.
///
/// # Errors
/// `PredictionError` if the vector length differs from the category count or
/// any score is not finite. These describe malformed model output.
pub fn normalize(raw: &[f32], categories: &CategorySet) -> Result<Normalized, ClassifierError> {
    if raw.len() != categories.len() {
        return Err(ClassifierError::PredictionError(format!(
            "Model returned {} scores for {} categories",
            raw.len(),
            categories.len()
        )));
    }
    if let Some(pos) = raw.iter().position(|x| !x.is_finite()) {
        return Err(ClassifierError::PredictionError(format!(
            "Model returned a non-finite score ({}) for category '{}'",
            raw[pos],
            categories.names()[pos]
        )));
    }

    let probs = softmax(raw);
    let top = argmax(&probs)
        .ok_or_else(|| ClassifierError::PredictionError("Model returned no scores".into()))?;

    let entries = categories
        .display_names()
        .iter()
        .cloned()
        .zip(probs.iter().copied())
        .collect();

    Ok(Normalized {
        label: categories.display_names()[top].clone(),
        distribution: ProbabilityDistribution { entries },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn emotions() -> CategorySet {
        CategorySet::new(["anger", "disgust", "fear", "joy", "neutral", "sadness", "surprise"])
            .expect("valid categories")
    }

    fn samples() -> Vec<Vec<f32>> {
        vec![
            vec![0.0],
            vec![1.0, 2.0, 3.0],
            vec![-4.5, 0.0, 4.5, 0.25],
            vec![0.1, 0.01, 0.02, 5.0, 0.3, 0.05, 0.1],
            vec![-30.0, -31.0, -29.5],
            vec![7.0; 7],
        ]
    }

    #[test]
    fn test_softmax_is_a_distribution() {
        for raw in samples() {
            let probs = softmax(&raw);
            assert_eq!(probs.len(), raw.len());
            assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
            assert!((probs.sum() - 1.0).abs() < TOLERANCE, "sum was {}", probs.sum());
        }
    }

    #[test]
    fn test_softmax_preserves_order() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        assert!(probs[2] > probs[1]);
        assert!(probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_shift_invariance() {
        for raw in samples() {
            let base = softmax(&raw);
            for shift in [-50.0f32, -1.5, 3.0, 40.0] {
                let shifted: Vec<f32> = raw.iter().map(|x| x + shift).collect();
                let moved = softmax(&shifted);
                for (a, b) in base.iter().zip(moved.iter()) {
                    assert!((a - b).abs() < 1e-5, "{} vs {} for shift {}", a, b, shift);
                }
            }
        }
    }

    #[test]
    fn test_softmax_large_magnitudes_stay_finite() {
        let probs = softmax(&[1000.0, 999.0, -1000.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs.sum() - 1.0).abs() < TOLERANCE);
        assert!(probs[0] > probs[1]);

        let probs = softmax(&[f32::MAX, f32::MAX]);
        assert!((probs[0] - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&Array1::from(vec![0.2, 0.4, 0.4])), Some(1));
        assert_eq!(argmax(&Array1::from(vec![0.5, 0.5])), Some(0));
        assert_eq!(argmax(&Array1::from(vec![0.1, 0.3, 0.6])), Some(2));
        assert_eq!(argmax(&Array1::from(Vec::<f64>::new())), None);
    }

    #[test]
    fn test_normalize_joy() -> Result<(), ClassifierError> {
        let raw = [0.1, 0.01, 0.02, 5.0, 0.3, 0.05, 0.1];
        let normalized = normalize(&raw, &emotions())?;

        assert_eq!(normalized.label, "Joy");
        assert_eq!(normalized.distribution.len(), 7);
        let joy = normalized.distribution.get("Joy").unwrap();
        assert!(normalized.distribution.iter().all(|(_, p)| p <= joy));
        assert!((normalized.distribution.total() - 1.0).abs() < TOLERANCE);
        Ok(())
    }

    #[test]
    fn test_normalize_uniform_picks_first_category() -> Result<(), ClassifierError> {
        let normalized = normalize(&[2.0; 7], &emotions())?;
        assert_eq!(normalized.label, "Anger");
        Ok(())
    }

    #[test]
    fn test_normalize_rejects_malformed_output() {
        let categories = emotions();
        assert!(matches!(
            normalize(&[1.0, 2.0], &categories),
            Err(ClassifierError::PredictionError(_))
        ));

        let mut raw = [0.0f32; 7];
        raw[4] = f32::NAN;
        assert!(matches!(
            normalize(&raw, &categories),
            Err(ClassifierError::PredictionError(_))
        ));

        raw[4] = f32::INFINITY;
        assert!(normalize(&raw, &categories).is_err());
    }

    #[test]
    fn test_distribution_serializes_in_category_order() -> Result<(), Box<dyn std::error::Error>> {
        let categories = CategorySet::new(["surprise", "anger"])?;
        let normalized = normalize(&[0.0, 0.0], &categories)?;
        let json = serde_json::to_string(&normalized.distribution)?;
        assert_eq!(json, r#"{"Surprise":0.5,"Anger":0.5}"#);
        Ok(())
    }
}

use anno_pack::{ScoreTable, SourceKey};
use config::{AnnotationError, Ensemble, SourceTool, NA};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use std::fmt;

/// inclusion cutoff of one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Threshold {
    Defined(f64),
    Undefined,
}

impl Threshold {
    /// an undefined threshold admits nothing
    #[inline(always)]
    pub fn admits(&self, score: f64) -> bool {
        match self {
            Threshold::Defined(cut) => score > 0.0 && score >= *cut,
            Threshold::Undefined => false,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Threshold::Defined(cut) => Some(*cut),
            Threshold::Undefined => None,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Defined(cut) => write!(f, "{}", cut),
            Threshold::Undefined => write!(f, "{}", NA),
        }
    }
}

/// linear-interpolation percentile of an ascending slice
///
/// `q` is a fraction in [0, 1]; the rank is `q * (n - 1)` and the result
/// interpolates between the two neighbouring order statistics.
///
/// # Example
///
/// ```rust
/// use anno_consensus::core::threshold::percentile;
///
/// let q1 = percentile(&[0.2, 0.4, 0.6, 0.8], 0.25).unwrap();
/// assert!((q1 - 0.35).abs() < 1e-12);
/// ```
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// threshold over the strictly positive subset of `scores`
pub fn model_threshold(scores: &[f64], q: f64) -> (usize, Threshold) {
    let mut positives = scores
        .iter()
        .copied()
        .filter(|s| *s > 0.0 && s.is_finite())
        .collect::<Vec<_>>();
    positives.sort_by(f64::total_cmp);

    let threshold = percentile(&positives, q).map_or(Threshold::Undefined, Threshold::Defined);
    (positives.len(), threshold)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdEntry {
    pub model: String,
    pub column: String,
    pub positives: usize,
    pub threshold: Threshold,
}

impl ThresholdEntry {
    pub fn row(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.model, self.column, self.positives, self.threshold
        )
    }
}

/// per-model cutoffs in ensemble order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThresholdTable {
    pub percentile: f64,
    pub entries: Vec<ThresholdEntry>,
}

impl ThresholdTable {
    pub fn get(&self, model: &str) -> Threshold {
        self.entries
            .iter()
            .find(|e| e.model == model)
            .map_or(Threshold::Undefined, |e| e.threshold)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThresholdEntry> {
        self.entries.iter()
    }

    pub fn undefined(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.threshold == Threshold::Undefined)
            .map(|e| e.model.as_str())
    }
}

/// one full pass over each model's scores; models run in parallel
pub fn compute_thresholds(
    scores: &ScoreTable,
    ensemble: &Ensemble,
    q: f64,
) -> (ThresholdTable, Vec<AnnotationError>) {
    let entries = ensemble
        .models
        .par_iter()
        .map(|model| {
            let key = SourceKey::model(SourceTool::Fantasia, &model.display_name);
            let (positives, threshold) = model_threshold(&scores.values(&key), q);

            ThresholdEntry {
                model: model.display_name.clone(),
                column: model.score_column(),
                positives,
                threshold,
            }
        })
        .collect::<Vec<_>>();

    let mut errors = Vec::new();
    for entry in entries.iter() {
        match entry.threshold {
            Threshold::Defined(cut) => info!(
                "{}: threshold {:.4} from {} positive scores (q={})",
                entry.model, cut, entry.positives, q
            ),
            Threshold::Undefined => {
                let err = AnnotationError::UndefinedThreshold(entry.model.clone());
                warn!("{}", err);
                errors.push(err);
            }
        }
    }

    (
        ThresholdTable {
            percentile: q,
            entries,
        },
        errors,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anno_pack::{normalize, AnnotationFact, TermKind};
    use config::{ErrorClass, ModelSpec};

    const EPS: f64 = 1e-12;

    #[test]
    fn test_first_quartile_of_positive_scores() {
        let (positives, threshold) = model_threshold(&[0.0, 0.2, 0.4, 0.6, 0.8], 0.25);

        assert_eq!(positives, 4);
        let cut = threshold.value().unwrap();
        assert!((cut - 0.35).abs() < EPS);

        assert!(threshold.admits(0.4));
        assert!(threshold.admits(0.6));
        assert!(threshold.admits(0.8));
        assert!(!threshold.admits(0.2));
        assert!(!threshold.admits(0.0));
    }

    #[test]
    fn test_percentile_small_samples_and_ties() {
        assert_eq!(percentile(&[0.5], 0.25), Some(0.5));
        assert_eq!(percentile(&[0.3, 0.3, 0.3], 0.25), Some(0.3));
        assert!((percentile(&[0.1, 0.9], 0.25).unwrap() - 0.3).abs() < EPS);
        assert_eq!(percentile(&[], 0.25), None);
        assert_eq!(percentile(&[0.1], 1.5), None);
    }

    #[test]
    fn test_all_zero_scores_are_undefined() {
        let (positives, threshold) = model_threshold(&[0.0, 0.0, 0.0], 0.25);

        assert_eq!(positives, 0);
        assert_eq!(threshold, Threshold::Undefined);
        assert!(!threshold.admits(1.0));
        assert_eq!(threshold.to_string(), "NA");
    }

    #[test]
    fn test_higher_percentile_never_retains_more() {
        let scores = [0.05, 0.1, 0.1, 0.2, 0.35, 0.4, 0.4, 0.41, 0.77, 0.9, 0.93, 1.0];

        let mut previous = usize::MAX;
        for step in 0..=20 {
            let q = step as f64 / 20.0;
            let (_, threshold) = model_threshold(&scores, q);
            let kept = scores.iter().filter(|s| threshold.admits(**s)).count();

            assert!(kept <= previous, "q={} kept {} > {}", q, kept, previous);
            previous = kept;
        }
    }

    #[test]
    fn test_compute_thresholds_per_model() {
        let ensemble = Ensemble::new(vec![ModelSpec::new("X", "X_L0"), ModelSpec::new("Z", "Z_L0")])
            .unwrap();

        let fact = |gene: &str, model: &str, score: f64| {
            AnnotationFact::new(
                gene,
                "GO:1",
                TermKind::Go,
                SourceTool::Fantasia,
                Some(model),
                Some(score),
            )
            .unwrap()
        };

        let batch = normalize(vec![
            fact("g0", "X", 0.0),
            fact("g1", "X", 0.2),
            fact("g2", "X", 0.4),
            fact("g3", "X", 0.6),
            fact("g4", "X", 0.8),
            fact("g1", "Z", 0.0),
        ]);

        let (table, errors) = compute_thresholds(&batch.scores, &ensemble, 0.25);

        assert!((table.get("X").value().unwrap() - 0.35).abs() < EPS);
        assert_eq!(table.get("Z"), Threshold::Undefined);
        assert_eq!(table.undefined().collect::<Vec<_>>(), vec!["Z"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].class(), ErrorClass::UndefinedThreshold);
        assert_eq!(table.entries[0].row(), format!("X\tfinal_score_X_L0\t4\t{}", table.get("X")));
    }
}

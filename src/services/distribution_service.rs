use crate::models::exercise::{Answer, Exercise};
use serde::Serialize;
use std::collections::BTreeSet;

/// Index of each bucket in a true/false distribution.
pub const TF_FALSE: usize = 0;
pub const TF_TRUE: usize = 1;
pub const TF_UNDECIDED: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionWarning {
    IndexOutOfRange { attempt: usize, index: i32 },
    UnexpectedAnswer { attempt: usize, found: &'static str },
}

/// Percentages per proposition (MCQ) or per `[false, true, undecided]` bucket (TF).
/// Data problems are collected in `warnings` and never abort the aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub percentages: Vec<f64>,
    pub warnings: Vec<DistributionWarning>,
}

fn percentages(counts: &[u64], total: u64) -> Vec<f64> {
    counts
        .iter()
        .map(|&count| {
            if total == 0 {
                0.0
            } else {
                100.0 * count as f64 / total as f64
            }
        })
        .collect()
}

/// Share of all valid selections that went to each proposition.
///
/// The denominator is the number of selections, not of attempts, so with
/// multi-select questions a proposition's share is not the fraction of
/// students who picked it.
pub fn mcq_distribution(attempts: &[BTreeSet<i32>], proposition_count: usize) -> Distribution {
    let mut counts = vec![0u64; proposition_count];
    let mut total = 0u64;
    let mut warnings = Vec::new();

    for (attempt_idx, selection) in attempts.iter().enumerate() {
        for &index in selection {
            match usize::try_from(index).ok().filter(|&i| i < proposition_count) {
                Some(i) => {
                    counts[i] += 1;
                    total += 1;
                }
                None => {
                    tracing::warn!(
                        attempt = attempt_idx,
                        index,
                        proposition_count,
                        "MCQ selection out of range, not counted"
                    );
                    warnings.push(DistributionWarning::IndexOutOfRange {
                        attempt: attempt_idx,
                        index,
                    });
                }
            }
        }
    }

    Distribution {
        percentages: percentages(&counts, total),
        warnings,
    }
}

/// `[false, true, undecided]` shares of all attempts.
pub fn tf_distribution(attempts: &[Option<bool>]) -> Distribution {
    let mut counts = [0u64; 3];
    for value in attempts {
        let bucket = match value {
            Some(false) => TF_FALSE,
            Some(true) => TF_TRUE,
            None => TF_UNDECIDED,
        };
        counts[bucket] += 1;
    }

    Distribution {
        percentages: percentages(&counts, attempts.len() as u64),
        warnings: Vec::new(),
    }
}

/// Aggregates stored answers for one exercise. Answers of the wrong variant
/// are reported and left out.
pub fn exercise_distribution(exercise: &Exercise, answers: &[Answer]) -> Distribution {
    let mut mismatched = Vec::new();

    let mut distribution = match exercise {
        Exercise::Mcq(mcq) => {
            let mut selections = Vec::with_capacity(answers.len());
            for (idx, answer) in answers.iter().enumerate() {
                match answer {
                    Answer::McqIndices { value } => selections.push(value.clone()),
                    other => mismatched.push((idx, other.kind())),
                }
            }
            mcq_distribution(&selections, mcq.propositions.len())
        }
        Exercise::Tf(_) => {
            let mut values = Vec::with_capacity(answers.len());
            for (idx, answer) in answers.iter().enumerate() {
                match answer {
                    Answer::Tf { value } => values.push(*value),
                    other => mismatched.push((idx, other.kind())),
                }
            }
            tf_distribution(&values)
        }
    };

    for (attempt, found) in mismatched {
        tracing::warn!(attempt, found, expected = exercise.kind(), "answer variant mismatch, not counted");
        distribution
            .warnings
            .push(DistributionWarning::UnexpectedAnswer { attempt, found });
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(indices: &[i32]) -> BTreeSet<i32> {
        indices.iter().copied().collect()
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn single_select_distribution() {
        let attempts = [sel(&[0]), sel(&[2]), sel(&[2]), sel(&[1])];
        let dist = mcq_distribution(&attempts, 3);
        assert_close(&dist.percentages, &[25.0, 25.0, 50.0]);
        assert!(dist.warnings.is_empty());
        assert!((dist.percentages.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_index_is_excluded_and_reported() {
        let attempts = [sel(&[0]), sel(&[3]), sel(&[2]), sel(&[1])];
        let dist = mcq_distribution(&attempts, 3);
        let third = 100.0 / 3.0;
        assert_close(&dist.percentages, &[third, third, third]);
        assert_eq!(
            dist.warnings,
            vec![DistributionWarning::IndexOutOfRange { attempt: 1, index: 3 }]
        );
    }

    #[test]
    fn empty_attempts_give_zeroes() {
        assert_eq!(mcq_distribution(&[], 4).percentages, vec![0.0; 4]);
        assert_eq!(mcq_distribution(&[sel(&[-1])], 2).percentages, vec![0.0; 2]);
        assert_eq!(tf_distribution(&[]).percentages, vec![0.0; 3]);
    }

    #[test]
    fn multi_select_uses_selection_count_as_denominator() {
        let attempts = [sel(&[0, 1]), sel(&[0])];
        let dist = mcq_distribution(&attempts, 2);
        assert_close(&dist.percentages, &[200.0 / 3.0, 100.0 / 3.0]);
        assert!(dist.percentages.iter().sum::<f64>() <= 100.0 + 1e-9);
    }

    #[test]
    fn tf_buckets_sum_to_hundred() {
        let dist = tf_distribution(&[Some(true), Some(false), None, Some(true)]);
        assert_close(&dist.percentages, &[25.0, 50.0, 25.0]);
        assert!((dist.percentages.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_variants_are_skipped() {
        let exercise = Exercise::Tf(crate::models::exercise::TfExercise {
            question: "?".into(),
            answer: true,
        });
        let answers = [Answer::tf(Some(true)), Answer::mcq([0]), Answer::tf(None)];
        let dist = exercise_distribution(&exercise, &answers);
        assert_close(&dist.percentages, &[0.0, 50.0, 50.0]);
        assert_eq!(
            dist.warnings,
            vec![DistributionWarning::UnexpectedAnswer { attempt: 1, found: "MCQAnswersIndices" }]
        );
    }
}

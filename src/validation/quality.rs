/*!
 * Quality scoring from validation results.
 *
 * Every checked entry starts at 100 and loses 10 points per error and 2 per
 * warning, floored at 0. The project score is the mean entry score.
 */

use serde::Serialize;

const ERROR_PENALTY: f64 = 10.0;
const WARNING_PENALTY: f64 = 2.0;

/// Score of a single entry
pub fn entry_score(errors: usize, warnings: usize) -> f64 {
    (100.0 - ERROR_PENALTY * errors as f64 - WARNING_PENALTY * warnings as f64).max(0.0)
}

/// Mean of the entry scores, 0 when nothing was checked
pub fn project_score(entry_scores: &[f64]) -> f64 {
    if entry_scores.is_empty() {
        return 0.0;
    }
    entry_scores.iter().sum::<f64>() / entry_scores.len() as f64
}

/// Letter grade for a quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityGrade {
    A,
    B,
    C,
    D,
    F,
}

impl QualityGrade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::A
        } else if score >= 80.0 {
            Self::B
        } else if score >= 70.0 {
            Self::C
        } else if score >= 60.0 {
            Self::D
        } else {
            Self::F
        }
    }
}

impl std::fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        write!(f, "{}", letter)
    }
}

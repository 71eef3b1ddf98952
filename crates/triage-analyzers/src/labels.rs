use triage_core::{LabelScores, TriageConfig};

use crate::analyzer::RawScores;

/// Maps classifier vocabularies onto `{primary, benign}`.
///
/// Labels are matched case-insensitively. `primary` is the highest score
/// among the primary aliases (0 when none is present); `benign` likewise,
/// falling back to `1 - primary` when no benign alias is reported.
#[derive(Debug, Clone)]
pub struct LabelNormalizer {
    primary: Vec<String>,
    benign: Vec<String>,
}

impl LabelNormalizer {
    pub fn new<I, J, S, T>(primary: I, benign: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            primary: primary.into_iter().map(|l| l.as_ref().to_lowercase()).collect(),
            benign: benign.into_iter().map(|l| l.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &TriageConfig) -> Self {
        Self::new(&config.primary_labels, &config.benign_labels)
    }

    pub fn normalize(&self, raw: &RawScores) -> LabelScores {
        let primary = max_over(raw, &self.primary).unwrap_or(0.0).clamp(0.0, 1.0);
        let benign = max_over(raw, &self.benign).unwrap_or(1.0 - primary);
        LabelScores::new(primary, benign)
    }
}

fn max_over(raw: &RawScores, aliases: &[String]) -> Option<f64> {
    raw.iter()
        .filter(|(label, score)| score.is_finite() && aliases.contains(&label.to_lowercase()))
        .map(|(_, score)| *score)
        .fold(None, |best, score| match best {
            Some(b) if b >= score => Some(b),
            _ => Some(score),
        })
}

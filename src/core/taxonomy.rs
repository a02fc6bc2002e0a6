//! Candidate label vocabulary partitioned into alcoholic and non-alcoholic sets.

use std::collections::HashSet;

use serde::Serialize;

use super::config::LabelConfig;
use super::errors::{BevError, Result};

/// Which side of the partition a candidate label falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelClass {
    Alcohol,
    NonAlcohol,
}

/// Validated label vocabulary.
///
/// Every candidate belongs to exactly one of the two sets, and neither set
/// names a label outside the candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTaxonomy {
    candidates: Vec<String>,
    alcohol: HashSet<String>,
    non_alcohol: HashSet<String>,
}

impl LabelTaxonomy {
    /// Build the taxonomy, rejecting any vocabulary that is not an exact
    /// partition of the candidate list.
    pub fn from_config(labels: &LabelConfig) -> Result<Self> {
        if labels.candidates.is_empty() {
            return Err(invalid("labels.candidates must not be empty"));
        }

        let mut seen = HashSet::with_capacity(labels.candidates.len());
        for label in &labels.candidates {
            if label.trim().is_empty() {
                return Err(invalid("labels.candidates contains a blank label"));
            }
            if !seen.insert(label.as_str()) {
                return Err(invalid(format!("candidate label {label:?} is listed twice")));
            }
        }

        let alcohol: HashSet<String> = labels.alcohol.iter().cloned().collect();
        let non_alcohol: HashSet<String> = labels.non_alcohol.iter().cloned().collect();

        if let Some(both) = alcohol.intersection(&non_alcohol).next() {
            return Err(invalid(format!(
                "label {both:?} is in both labels.alcohol and labels.non_alcohol"
            )));
        }
        for label in alcohol.iter().chain(non_alcohol.iter()) {
            if !seen.contains(label.as_str()) {
                return Err(invalid(format!(
                    "label {label:?} is classified but missing from labels.candidates"
                )));
            }
        }
        for label in &labels.candidates {
            if !alcohol.contains(label) && !non_alcohol.contains(label) {
                return Err(invalid(format!(
                    "candidate label {label:?} is neither alcohol nor non_alcohol"
                )));
            }
        }

        Ok(Self {
            candidates: labels.candidates.clone(),
            alcohol,
            non_alcohol,
        })
    }

    /// Ordered candidate vocabulary, as presented to the model.
    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    #[must_use]
    pub fn class_of(&self, label: &str) -> Option<LabelClass> {
        if self.alcohol.contains(label) {
            Some(LabelClass::Alcohol)
        } else if self.non_alcohol.contains(label) {
            Some(LabelClass::NonAlcohol)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_alcohol(&self, label: &str) -> bool {
        self.alcohol.contains(label)
    }

    #[must_use]
    pub fn is_non_alcohol(&self, label: &str) -> bool {
        self.non_alcohol.contains(label)
    }

    /// Candidates of one class, in vocabulary order.
    pub fn labels_in(&self, class: LabelClass) -> impl Iterator<Item = &str> {
        self.candidates
            .iter()
            .filter(move |label| self.class_of(label) == Some(class))
            .map(String::as_str)
    }
}

fn invalid(details: impl Into<String>) -> BevError {
    BevError::InvalidConfig {
        details: details.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(candidates: &[&str], alcohol: &[&str], non_alcohol: &[&str]) -> LabelConfig {
        let owned = |items: &[&str]| items.iter().map(ToString::to_string).collect::<Vec<_>>();
        LabelConfig {
            candidates: owned(candidates),
            alcohol: owned(alcohol),
            non_alcohol: owned(non_alcohol),
        }
    }

    #[test]
    fn default_vocabulary_is_a_partition() {
        let taxonomy = LabelTaxonomy::from_config(&LabelConfig::default()).unwrap();
        assert_eq!(taxonomy.candidates().len(), 14);
        assert_eq!(taxonomy.labels_in(LabelClass::Alcohol).count(), 12);
        assert_eq!(taxonomy.labels_in(LabelClass::NonAlcohol).count(), 2);
        assert_eq!(
            taxonomy.class_of("a soft drink, juice, or water"),
            Some(LabelClass::NonAlcohol)
        );
        assert_eq!(taxonomy.class_of("a bottle of gin"), Some(LabelClass::Alcohol));
        assert_eq!(taxonomy.class_of("a cup of tea"), None);
    }

    #[test]
    fn rejects_overlapping_sets() {
        let cfg = labels(&["beer", "water"], &["beer", "water"], &["water"]);
        let err = LabelTaxonomy::from_config(&cfg).unwrap_err();
        assert_eq!(err.code(), "BEV-1001");
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn rejects_unclassified_candidate() {
        let cfg = labels(&["beer", "water", "tea"], &["beer"], &["water"]);
        let err = LabelTaxonomy::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("\"tea\""));
    }

    #[test]
    fn rejects_classified_label_outside_vocabulary() {
        let cfg = labels(&["beer", "water"], &["beer", "cider"], &["water"]);
        let err = LabelTaxonomy::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("cider"));
    }

    #[test]
    fn rejects_duplicate_and_empty_vocabularies() {
        assert!(LabelTaxonomy::from_config(&labels(&[], &[], &[])).is_err());
        let dup = labels(&["beer", "beer"], &["beer"], &[]);
        assert!(LabelTaxonomy::from_config(&dup).is_err());
    }
}

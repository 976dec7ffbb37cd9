//! Schema-driven feature vectorization
//!
//! Turns an input record into the fixed-shape numeric vector the loaded
//! models were trained against. The schema decides everything: field order
//! and defaults for tabular records, and the text encoding (bag-of-terms or
//! projected components) for free text. Pure function of (record, schema).

use crate::error::PipelineError;
use crate::models::artifact::{FeatureSchema, TextEncoding, VocabEntry};
use crate::types::record::{InputRecord, InsuranceClaim};
use std::collections::HashMap;
use std::sync::Arc;

/// Ordered feature values plus the names they were produced under.
///
/// Names are owned by the model bundle and shared, so building a vector
/// costs one value allocation per request.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    pub values: Vec<f64>,
    pub names: Arc<Vec<String>>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Vectorize a record against the schema its model bundle declares.
pub fn vectorize(
    record: &InputRecord,
    schema: &FeatureSchema,
    names: Arc<Vec<String>>,
) -> Result<FeatureVector, PipelineError> {
    match (record, schema) {
        (InputRecord::InsuranceClaim(claim), FeatureSchema::Numeric { fields }) => {
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                let observed = claim.field(&field.name).ok_or_else(|| {
                    PipelineError::artifact(format!(
                        "schema field `{}` is not an insurance claim field",
                        field.name
                    ))
                })?;
                match observed {
                    Some(v) => values.push(v),
                    None if field.required => {
                        return Err(PipelineError::validation(format!(
                            "required field `{}` is missing",
                            field.name
                        )));
                    }
                    None => values.push(field.default),
                }
            }
            Ok(FeatureVector { values, names })
        }
        (InputRecord::JobPosting { job_text }, FeatureSchema::Text(encoding)) => {
            let text = job_text.trim();
            if text.is_empty() {
                return Err(PipelineError::validation(
                    "job_text is required for job posting records",
                ));
            }
            let values = match encoding {
                TextEncoding::BagOfTerms { vocabulary } => tfidf_values(text, vocabulary),
                TextEncoding::Projection {
                    vocabulary,
                    components,
                } => {
                    let terms = tfidf_values(text, vocabulary);
                    components
                        .iter()
                        .map(|row| row.iter().zip(&terms).map(|(w, x)| w * x).sum())
                        .collect()
                }
            };
            Ok(FeatureVector { values, names })
        }
        (InputRecord::InsuranceClaim(_), FeatureSchema::Text(_)) => Err(
            PipelineError::validation("insurance claim scored against a text schema"),
        ),
        (InputRecord::JobPosting { .. }, FeatureSchema::Numeric { .. }) => Err(
            PipelineError::validation("job posting scored against a numeric schema"),
        ),
    }
}

/// L2-normalized tf-idf over the stored vocabulary.
fn tfidf_values(text: &str, vocabulary: &[VocabEntry]) -> Vec<f64> {
    let counts = term_counts(text);

    let mut values: Vec<f64> = vocabulary
        .iter()
        .map(|entry| counts.get(entry.term.as_str()).copied().unwrap_or(0.0) * entry.idf)
        .collect();

    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in &mut values {
            *v /= norm;
        }
    }
    values
}

/// Case-folded unigram and bigram counts.
fn term_counts(text: &str) -> HashMap<String, f64> {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();

    let mut counts: HashMap<String, f64> = HashMap::new();
    for token in &tokens {
        *counts.entry(token.clone()).or_insert(0.0) += 1.0;
    }
    for pair in tokens.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0.0) += 1.0;
    }
    counts
}

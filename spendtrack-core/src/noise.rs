//! Noise classification: intra-account payments and reversals are not
//! economic activity and get dropped during ingestion.

use crate::error::{Error, Result};

/// Phrases covering autopay/returned-payment/reversal rows in the
/// statement exports we have seen. Substring match, case-insensitive.
pub const DEFAULT_NOISE_PHRASES: &[&str] = &[
    "autopay pymt",
    "payment thank you",
    "automatic payment",
    "returned payment",
    "reversal",
];

/// Decides whether a row's description marks it as payment noise.
///
/// Precision over recall: a phrase has to actually appear in the
/// description, so a merchant name containing the word "payment" is
/// left alone. False negatives are acceptable; extend the phrase list
/// through configuration rather than code.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    phrases: Vec<String>,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_PHRASES.iter().map(|s| s.to_string()))
            .expect("default phrase list is valid")
    }
}

impl NoiseFilter {
    pub fn new(phrases: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut lowered = Vec::new();
        for phrase in phrases {
            let phrase = phrase.trim().to_lowercase();
            if phrase.is_empty() {
                return Err(Error::Config(
                    "noise phrase list contains a blank entry".to_string(),
                ));
            }
            lowered.push(phrase);
        }
        Ok(Self { phrases: lowered })
    }

    /// An empty or missing description is never noise.
    pub fn is_noise(&self, description: &str) -> bool {
        if description.trim().is_empty() {
            return false;
        }
        let desc = description.to_lowercase();
        self.phrases.iter().any(|phrase| desc.contains(phrase))
    }
}

//! Near-duplicate detection via weighted 64-bit fingerprints
//!
//! Each page's text is reduced to a SimHash-style fingerprint: tokens vote
//! on every bit position with their occurrence count as the weight. Two
//! pages with heavily overlapping token distributions end up with
//! fingerprints a few bits apart, so a Hamming-distance threshold catches
//! near-duplicates that an exact hash would miss.

use parking_lot::Mutex;
use std::collections::HashMap;

const FINGERPRINT_BITS: usize = 64;

/// Compute the 64-bit fingerprint of a page's text.
///
/// Tokens are maximal alphanumeric runs, case-folded. Each token's 64-bit
/// hash votes per bit position, weighted by occurrence count; a bit is set
/// iff its accumulator ends strictly positive (ties favor 0).
pub fn fingerprint(text: &str) -> u64 {
    let weights = token_weights(text);

    let mut accum = [0i64; FINGERPRINT_BITS];
    for (token, weight) in &weights {
        let hash = xxhash_rust::xxh3::xxh3_64(token.as_bytes());
        for (i, acc) in accum.iter_mut().enumerate() {
            if hash & (1u64 << i) != 0 {
                *acc += weight;
            } else {
                *acc -= weight;
            }
        }
    }

    let mut fp = 0u64;
    for (i, acc) in accum.iter().enumerate() {
        if *acc > 0 {
            fp |= 1u64 << i;
        }
    }
    fp
}

/// Count of differing bit positions between two fingerprints
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Tokenize into alphanumeric runs and count occurrences
fn token_weights(text: &str) -> HashMap<String, i64> {
    let mut weights: HashMap<String, i64> = HashMap::new();
    let mut word = String::new();

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            word.push(c.to_ascii_lowercase());
        } else if !word.is_empty() {
            *weights.entry(std::mem::take(&mut word)).or_insert(0) += 1;
        }
    }
    if !word.is_empty() {
        *weights.entry(word).or_insert(0) += 1;
    }

    weights
}

/// Append-only index of every fingerprint seen this run.
///
/// `check_and_record` is the only entry point; its scan-then-insert runs
/// under one lock so concurrent workers never miss each other's in-flight
/// fingerprints.
pub struct NearDuplicateDetector {
    /// (url, fingerprint) pairs in insertion order
    index: Mutex<Vec<(String, u64)>>,
    /// Hamming distance below which two pages count as near-duplicates
    distance_threshold: u32,
}

impl NearDuplicateDetector {
    pub fn new(distance_threshold: u32) -> Self {
        Self {
            index: Mutex::new(Vec::new()),
            distance_threshold,
        }
    }

    /// Test a fingerprint against everything seen so far, then record it.
    ///
    /// Returns true when the page is a near-duplicate of an earlier one.
    /// The fingerprint is recorded either way so it anchors future
    /// comparisons. The linear scan is intentional at this corpus size.
    pub fn check_and_record(&self, url: &str, fp: u64) -> bool {
        let mut index = self.index.lock();

        let matched = index
            .iter()
            .find(|(_, existing)| hamming_distance(fp, *existing) < self.distance_threshold)
            .map(|(seen_url, _)| seen_url.clone());

        index.push((url.to_string(), fp));
        drop(index);

        if let Some(seen_url) = matched {
            tracing::debug!("{} is a near-duplicate of {}", url, seen_url);
            true
        } else {
            false
        }
    }

    /// Number of fingerprints recorded so far
    pub fn len(&self) -> usize {
        self.index.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.lock().is_empty()
    }
}

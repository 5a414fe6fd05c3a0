//! Resolution-balanced result selection.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ranking::RankedEntry;

/// Resolutions a request accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionFilter {
    All,
    /// Allow-list of resolution labels; `Unknown` admits entries without
    /// a parsed resolution.
    Only(Vec<String>),
}

impl ResolutionFilter {
    pub fn admits(&self, entry: &RankedEntry) -> bool {
        match self {
            ResolutionFilter::All => true,
            ResolutionFilter::Only(allowed) => {
                let label = entry.resolution_label();
                allowed.iter().any(|r| r.eq_ignore_ascii_case(label))
            }
        }
    }
}

/// Audio languages a request accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageFilter {
    All,
    Only(Vec<String>),
}

impl LanguageFilter {
    /// Multi-audio releases always pass.
    pub fn admits(&self, entry: &RankedEntry) -> bool {
        match self {
            LanguageFilter::All => true,
            LanguageFilter::Only(allowed) => {
                entry.profile.is_multi_audio
                    || entry
                        .profile
                        .languages
                        .iter()
                        .any(|lang| allowed.iter().any(|a| a.eq_ignore_ascii_case(lang)))
            }
        }
    }
}

/// Select at most `cap` entries spread across resolution buckets.
///
/// `entries` must already be in presentation order. Each bucket (first
/// resolution, or `Unknown`) gets `cap / buckets` slots, the remainder goes
/// one slot per bucket in first-appearance order, and slots a short bucket
/// cannot fill are handed to the following buckets in the same order.
/// A `cap` of zero means unlimited. The output keeps the input order.
pub fn select_balanced(
    entries: &[RankedEntry],
    cap: usize,
    resolutions: &ResolutionFilter,
    languages: &LanguageFilter,
) -> Vec<RankedEntry> {
    let eligible: Vec<&RankedEntry> = entries
        .iter()
        .filter(|e| resolutions.admits(e) && languages.admits(e))
        .collect();

    if cap == 0 || eligible.len() <= cap {
        return eligible.into_iter().cloned().collect();
    }

    // Positions into `eligible`, grouped by bucket in first-appearance order.
    let mut buckets: Vec<(&str, Vec<usize>)> = Vec::new();
    for (position, entry) in eligible.iter().enumerate() {
        let label = entry.resolution_label();
        match buckets.iter_mut().find(|(l, _)| *l == label) {
            Some((_, members)) => members.push(position),
            None => buckets.push((label, vec![position])),
        }
    }

    let per_bucket = cap / buckets.len();
    let remainder = cap % buckets.len();
    let mut taken: Vec<usize> = buckets
        .iter()
        .enumerate()
        .map(|(i, (_, members))| {
            let quota = per_bucket + usize::from(i < remainder);
            quota.min(members.len())
        })
        .collect();

    let mut spare = cap - taken.iter().sum::<usize>();
    for (take, (_, members)) in taken.iter_mut().zip(&buckets) {
        if spare == 0 {
            break;
        }
        let extra = spare.min(members.len() - *take);
        *take += extra;
        spare -= extra;
    }

    let chosen: HashSet<usize> = buckets
        .iter()
        .zip(&taken)
        .flat_map(|((_, members), take)| members[..*take].iter().copied())
        .collect();

    eligible
        .into_iter()
        .enumerate()
        .filter(|(position, _)| chosen.contains(position))
        .map(|(_, entry)| entry.clone())
        .collect()
}

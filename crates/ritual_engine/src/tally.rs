//! Vote counting shared by the nomination and council votes.

use crate::chance;
use crate::state::PlayerId;
use rand::RngCore;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Vote counts per target, in the order targets first received a vote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    entries: Vec<(PlayerId, usize)>,
}

impl Tally {
    /// Counts ballots, ignoring abstentions (`None`).
    pub fn count<'a, I>(ballots: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut tally = Self::default();
        for target in ballots.into_iter().flatten() {
            match tally.entries.iter_mut().find(|(id, _)| id == target) {
                Some((_, count)) => *count += 1,
                None => tally.entries.push((target.to_string(), 1)),
            }
        }
        tally
    }

    /// Scans for the leader.
    ///
    /// Starts from `fallback` with a score of zero. A strictly higher count
    /// replaces the leader; an exact tie replaces it on a fair coin flip.
    /// Later tied entries therefore win more often than earlier ones.
    #[instrument(skip(self, rng))]
    pub fn scan_leader(
        &self,
        fallback: Option<PlayerId>,
        rng: &mut dyn RngCore,
    ) -> (Option<PlayerId>, usize) {
        let mut leader = fallback;
        let mut highest = 0;

        for (target, count) in &self.entries {
            if *count > highest {
                leader = Some(target.clone());
                highest = *count;
            } else if *count == highest && chance::chance(rng, 0.5) {
                leader = Some(target.clone());
            }
        }

        debug!(?leader, highest, "Tally scanned");
        (leader, highest)
    }
}

/// Votes needed for a strict majority of `total_cast`.
pub fn majority_threshold(total_cast: usize) -> usize {
    total_cast / 2 + 1
}

/// Whether every living player has a ballot on record.
pub fn is_complete<V>(votes: &BTreeMap<PlayerId, V>, alive_ids: &[PlayerId]) -> bool {
    alive_ids.iter().all(|id| votes.contains_key(id))
}

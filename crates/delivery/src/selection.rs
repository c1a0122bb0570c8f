//! Priority-tiered roulette-wheel selection.
//!
//! Higher priority strictly dominates: only the top tier competes, and
//! within it each creative's chance is proportional to its weight. The RNG
//! is injected so draws are reproducible under test.

use adserve_core::types::EligibleCreative;
use rand::Rng;

/// Pick exactly one creative from a candidate list, or `None` when empty.
///
/// When every weight in the winning tier is zero there is no mass to draw
/// from; the first candidate wins.
pub fn select_weighted<'a, R: Rng + ?Sized>(
    candidates: &'a [EligibleCreative],
    rng: &mut R,
) -> Option<&'a EligibleCreative> {
    let max_priority = candidates.iter().map(|c| c.priority).max()?;
    let tier: Vec<&EligibleCreative> = candidates
        .iter()
        .filter(|c| c.priority == max_priority)
        .collect();

    let total_weight: u64 = tier.iter().map(|c| c.weight as u64).sum();
    if total_weight == 0 {
        return tier.first().copied();
    }

    let mut remaining = rng.gen_range(0.0..total_weight as f64);
    for &creative in &tier {
        remaining -= creative.weight as f64;
        if remaining <= 0.0 {
            return Some(creative);
        }
    }

    // Floating-point residue can leave the walk unfinished; the last
    // tier member absorbs it.
    tier.last().copied()
}

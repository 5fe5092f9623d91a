//! Static evaluation of a snapshot, from the controlled player's
//! perspective. Higher is better. Used at search leaves and cutoff depth.

use crate::error::InvariantError;
use crate::snapshot::WorldSnapshot;

const FIEF_WORTH: i64 = 400;
const KEEP_LEVEL_WORTH: i64 = 50;
const RETAINER_WORTH: i64 = 60;
const UNREST_PENALTY: i64 = 120;
const SIEGE_PENALTY: i64 = 300;
const CAPTIVITY_PENALTY: i64 = 1_000;

pub fn evaluate(snapshot: &WorldSnapshot) -> Result<i64, InvariantError> {
    let mut score: i64 = 0;

    for fief in snapshot.mine.fiefs.values() {
        score += FIEF_WORTH + i64::from(fief.keep_level) * KEEP_LEVEL_WORTH;
        score += fief.treasury;
        if fief.unrest {
            score -= UNREST_PENALTY;
        }
        if fief.siege.is_some() {
            score -= SIEGE_PENALTY;
        }
    }

    score += i64::from(snapshot.committed_troop_value());
    score += snapshot.retainer_count() as i64 * RETAINER_WORTH;

    if snapshot.me()?.captor.is_some() {
        score -= CAPTIVITY_PENALTY;
    }

    // Symmetric terms for what we know of enemy holdings. Stale sightings
    // count at face value; the cache is the best information there is.
    for sighted in snapshot.foreign.fiefs.values() {
        if snapshot.relations.is_enemy(sighted.record.owner) {
            score -= FIEF_WORTH + i64::from(sighted.record.keep_level) * KEEP_LEVEL_WORTH;
            score -= sighted.record.treasury;
        }
    }
    for sighted in snapshot.foreign.armies.values() {
        if snapshot.relations.is_enemy(sighted.record.owner) && sighted.record.maintained {
            score -= i64::from(sighted.record.troops.value());
        }
    }

    Ok(score)
}

#[cfg(test)]
mod tests {
    use suzerain_protocol::{PlayerId, SiegeId};

    use crate::snapshot::test_fixtures::{small_world, RIVAL};

    use super::*;

    #[test]
    fn losing_ground_lowers_the_score() {
        let base = small_world();
        let baseline = evaluate(&base).unwrap();

        let mut besieged = base.clone();
        besieged
            .mine
            .fiefs
            .values_mut()
            .next()
            .unwrap()
            .siege = Some(SiegeId::new(1));
        assert!(evaluate(&besieged).unwrap() < baseline);

        let mut captive = base.clone();
        captive.me_mut().unwrap().captor = Some(PlayerId(1));
        assert!(evaluate(&captive).unwrap() < baseline);
    }

    #[test]
    fn enemy_strength_counts_against_us() {
        let mut snapshot = small_world();
        let baseline = evaluate(&snapshot).unwrap();

        // The rival fief only weighs once the rival is a known enemy.
        snapshot.relations.mark_enemy(RIVAL);
        assert!(evaluate(&snapshot).unwrap() < baseline);
    }
}

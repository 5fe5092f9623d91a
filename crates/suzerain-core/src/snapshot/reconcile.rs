//! Merging a fresh observation into the previous snapshot.
//!
//! Authoritative (`mine`) holdings are rebuilt wholesale from the fresh
//! observation. Foreign sightings replace stale cache entries; entries the
//! fresh data says nothing about are carried forward as-is, unless the fresh
//! data proves the agent now owns them.

use std::collections::BTreeMap;

use suzerain_protocol::{JournalEntry, JournalKind, Observation, PlayerId};

use crate::error::InvariantError;

use super::{Holdings, WorldSnapshot};

impl WorldSnapshot {
    /// Produce the next snapshot from this one plus a fresh observation.
    /// Consumes `self`: the previous snapshot has no further use once its
    /// carried-forward state is folded in.
    pub fn reconcile(mut self, fresh: &Observation) -> Result<WorldSnapshot, InvariantError> {
        if fresh.season > self.season {
            self.tracking.clear();
        }
        self.season = fresh.season;

        // Mine is authoritative: rebuild it from the observation.
        let mut mine = Holdings::default();
        for f in &fresh.my_fiefs {
            mine.fiefs.insert(f.id, f.clone());
        }
        mine.characters.insert(fresh.me.id, fresh.me.clone());
        for c in &fresh.my_characters {
            mine.characters.insert(c.id, c.clone());
        }
        for a in &fresh.my_armies {
            mine.armies.insert(a.id, a.clone());
        }
        for d in &fresh.my_detachments {
            mine.detachments.insert(d.id, d.clone());
        }
        self.mine = mine;

        // Fresh sightings replace stale foreign entries.
        for s in &fresh.foreign_fiefs {
            self.foreign.fiefs.insert(s.record.id, s.clone());
        }
        for s in &fresh.foreign_characters {
            self.foreign.characters.insert(s.record.id, s.clone());
        }
        for s in &fresh.foreign_armies {
            self.foreign.armies.insert(s.record.id, s.clone());
        }
        for s in &fresh.foreign_detachments {
            self.foreign.detachments.insert(s.record.id, s.clone());
        }

        // Ownership transfers: anything now in mine leaves the foreign cache,
        // as does any sighting that claims our own player as owner.
        let player = self.player;
        self.foreign
            .fiefs
            .retain(|id, s| !self.mine.fiefs.contains_key(id) && s.record.owner != player);
        self.foreign
            .characters
            .retain(|id, s| !self.mine.characters.contains_key(id) && s.record.player != player);
        self.foreign
            .armies
            .retain(|id, s| !self.mine.armies.contains_key(id) && s.record.owner != player);
        self.foreign
            .detachments
            .retain(|id, _| !self.mine.detachments.contains_key(id));

        // Sieges: fresh reports replace, then drop any siege a freshly seen
        // target fief no longer carries.
        for s in &fresh.sieges {
            self.sieges.insert(s.id, s.clone());
        }
        let fresh_fief_sieges: BTreeMap<_, _> = fresh
            .my_fiefs
            .iter()
            .map(|f| (f.id, f.siege))
            .chain(fresh.foreign_fiefs.iter().map(|s| (s.record.id, s.record.siege)))
            .collect();
        self.sieges.retain(|id, s| match fresh_fief_sieges.get(&s.fief) {
            Some(current) => *current == Some(*id),
            None => true,
        });

        if !fresh.travel_costs.is_empty() {
            self.travel_costs = fresh.travel_costs.iter().map(|(k, v)| (*k, *v)).collect();
        }

        for entry in &fresh.journal {
            self.digest_journal_entry(entry);
        }

        Ok(self)
    }

    /// Fold one journal entry into the relationship sets and stale-link
    /// invalidation. Entries are digested at most once.
    fn digest_journal_entry(&mut self, entry: &JournalEntry) {
        if !self.tracking.journal_seen.insert(entry.id.raw) {
            return;
        }

        let us = self.player;
        let hostile_kind = matches!(
            entry.kind,
            JournalKind::Pillage
                | JournalKind::SiegeLaid
                | JournalKind::Battle
                | JournalKind::RansomDemand
        );
        let friendly_kind = matches!(entry.kind, JournalKind::RansomPaid | JournalKind::Marriage);

        if hostile_kind && entry.victim == Some(us) && entry.actor != us {
            self.relations.mark_enemy(entry.actor);
        }

        if friendly_kind {
            if let Some(other) = counterparty(us, entry.actor, entry.victim) {
                self.relations.mark_ally(other);
            }
        }

        // A paid ransom means the named character is no longer held.
        if entry.kind == JournalKind::RansomPaid {
            if let Some(id) = entry.character {
                if let Some(c) = self.mine.characters.get_mut(&id) {
                    c.captor = None;
                }
                if let Some(s) = self.foreign.characters.get_mut(&id) {
                    s.record.captor = None;
                }
            }
        }
    }
}

/// The other player of a two-party journal entry, when we are one of them.
fn counterparty(us: PlayerId, actor: PlayerId, victim: Option<PlayerId>) -> Option<PlayerId> {
    if actor == us {
        victim.filter(|v| *v != us)
    } else if victim == Some(us) {
        Some(actor)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use suzerain_protocol::{
        CharacterId, FiefId, JournalEntry, JournalId, JournalKind, Observation, PlayerId, Sighted,
    };

    use crate::snapshot::test_fixtures::{self, small_world, ME, RIVAL};
    use crate::snapshot::WorldSnapshot;

    /// Observation that reports exactly what the snapshot already believes.
    fn observation_of(snapshot: &WorldSnapshot) -> Observation {
        Observation {
            season: snapshot.season,
            me: snapshot.me().unwrap().clone(),
            my_fiefs: snapshot.mine.fiefs.values().cloned().collect(),
            my_characters: snapshot
                .mine
                .characters
                .values()
                .filter(|c| c.id != snapshot.me)
                .cloned()
                .collect(),
            my_armies: snapshot.mine.armies.values().cloned().collect(),
            my_detachments: snapshot.mine.detachments.values().cloned().collect(),
            foreign_fiefs: snapshot.foreign.fiefs.values().cloned().collect(),
            foreign_characters: snapshot.foreign.characters.values().cloned().collect(),
            foreign_armies: snapshot.foreign.armies.values().cloned().collect(),
            foreign_detachments: snapshot.foreign.detachments.values().cloned().collect(),
            sieges: snapshot.sieges.values().cloned().collect(),
            journal: Vec::new(),
            travel_costs: snapshot.travel_costs.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }

    #[test]
    fn reconcile_with_self_is_idempotent() {
        let snapshot = small_world();
        let obs = observation_of(&snapshot);
        let next = snapshot.clone().reconcile(&obs).unwrap();
        assert_eq!(next, snapshot);
    }

    #[test]
    fn ownership_partition_is_exclusive_and_exhaustive() {
        let snapshot = small_world();
        let obs = observation_of(&snapshot);
        let next = snapshot.reconcile(&obs).unwrap();

        for id in next.mine.fiefs.keys() {
            assert!(!next.foreign.fiefs.contains_key(id));
        }
        for (id, s) in &next.foreign.fiefs {
            assert!(!next.mine.fiefs.contains_key(id));
            assert_ne!(s.record.owner, next.player);
        }
        for s in next.foreign.characters.values() {
            assert_ne!(s.record.player, next.player);
        }
    }

    #[test]
    fn conquered_fief_moves_from_foreign_to_mine() {
        let snapshot = small_world();
        let mut obs = observation_of(&snapshot);

        // The rival fief 2 is now reported among our holdings.
        let mut captured = test_fixtures::fief(2, ME, 35);
        captured.ancestral_owner = Some(RIVAL);
        obs.my_fiefs.push(captured);
        obs.foreign_fiefs.clear();

        let next = snapshot.reconcile(&obs).unwrap();
        assert!(next.mine.fiefs.contains_key(&FiefId::new(2)));
        assert!(!next.foreign.fiefs.contains_key(&FiefId::new(2)));
    }

    #[test]
    fn unobserved_foreign_entries_are_retained() {
        let snapshot = small_world();
        let mut obs = observation_of(&snapshot);
        obs.foreign_fiefs.clear(); // fresh data says nothing about fief 2

        let next = snapshot.reconcile(&obs).unwrap();
        assert!(next.foreign.fiefs.contains_key(&FiefId::new(2)));
    }

    #[test]
    fn pillage_journal_marks_perpetrator_hostile() {
        let mut snapshot = small_world();
        snapshot.relations.mark_ally(RIVAL);
        let mut obs = observation_of(&snapshot);
        obs.journal.push(JournalEntry {
            id: JournalId::new(10),
            kind: JournalKind::Pillage,
            actor: RIVAL,
            victim: Some(ME),
            character: None,
            location: Some(FiefId::new(1)),
            season: 1,
            read: false,
            replied: false,
        });

        let next = snapshot.reconcile(&obs).unwrap();
        assert!(next.relations.is_enemy(RIVAL));
        assert!(!next.relations.is_ally(RIVAL));
    }

    #[test]
    fn journal_entries_digest_once() {
        let snapshot = small_world();
        let entry = JournalEntry {
            id: JournalId::new(11),
            kind: JournalKind::Marriage,
            actor: RIVAL,
            victim: Some(ME),
            character: None,
            location: None,
            season: 1,
            read: false,
            replied: false,
        };
        let mut obs = observation_of(&snapshot);
        obs.journal.push(entry.clone());

        let next = snapshot.reconcile(&obs).unwrap();
        assert!(next.relations.is_ally(RIVAL));

        // Re-delivery after the rival turns hostile must not re-ally them.
        let mut next = next;
        next.relations.mark_enemy(RIVAL);
        let mut obs2 = observation_of(&next);
        obs2.journal.push(entry);
        let last = next.reconcile(&obs2).unwrap();
        assert!(last.relations.is_enemy(RIVAL));
    }

    #[test]
    fn ransom_paid_clears_captor_link() {
        let mut snapshot = small_world();
        let mut held = test_fixtures::character(5, RIVAL, 2);
        held.captor = Some(ME);
        snapshot
            .foreign
            .characters
            .insert(held.id, Sighted::overview(held, 1));

        let mut obs = observation_of(&snapshot);
        obs.journal.push(JournalEntry {
            id: JournalId::new(12),
            kind: JournalKind::RansomPaid,
            actor: RIVAL,
            victim: Some(ME),
            character: Some(CharacterId::new(5)),
            location: None,
            season: 1,
            read: false,
            replied: false,
        });

        let next = snapshot.reconcile(&obs).unwrap();
        let held = &next.foreign.characters[&CharacterId::new(5)];
        assert_eq!(held.record.captor, None);
    }

    #[test]
    fn season_rollover_clears_proposal_tracking() {
        let mut snapshot = small_world();
        snapshot.tracking.proposed_to.insert(CharacterId::new(9));
        snapshot.tracking.journal_seen.insert(3);

        let mut obs = observation_of(&snapshot);
        obs.season = snapshot.season + 1;

        let next = snapshot.reconcile(&obs).unwrap();
        assert!(next.tracking.proposed_to.is_empty());
        // Digested journal ids survive rollover.
        assert!(next.tracking.journal_seen.contains(&3));
    }

    #[test]
    fn third_party_quarrels_do_not_touch_relations() {
        let snapshot = small_world();
        let mut obs = observation_of(&snapshot);
        obs.journal.push(JournalEntry {
            id: JournalId::new(13),
            kind: JournalKind::Pillage,
            actor: RIVAL,
            victim: Some(PlayerId(2)),
            character: None,
            location: None,
            season: 1,
            read: false,
            replied: false,
        });
        let next = snapshot.reconcile(&obs).unwrap();
        assert!(!next.relations.is_enemy(RIVAL));
    }
}

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Runtime IDs are integers assigned by the world service (stable within a
/// campaign, meaningless across campaigns).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId<T> {
    pub raw: u32,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> RuntimeId<T> {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }
}

// Type-safe runtime IDs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiefTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArmyTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiegeTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DetachmentTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JournalTag;

pub type CharacterId = RuntimeId<CharacterTag>;
pub type FiefId = RuntimeId<FiefTag>;
pub type ArmyId = RuntimeId<ArmyTag>;
pub type SiegeId = RuntimeId<SiegeTag>;
pub type DetachmentId = RuntimeId<DetachmentTag>;
pub type JournalId = RuntimeId<JournalTag>;

/// Player ID is a simple index (one per liege in the campaign).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

/// Nationality used for fief entry bans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nationality {
    Aldmark,
    Ferros,
    Khovar,
    Sundland,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_ids_are_distinct_types() {
        let c = CharacterId::new(7);
        let f = FiefId::new(7);
        assert_eq!(c.raw, f.raw);
        // c == f would not compile; same raw value is fine.
        assert_eq!(c, CharacterId::new(7));
    }

    #[test]
    fn id_serde_is_transparent() {
        let id = ArmyId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: ArmyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

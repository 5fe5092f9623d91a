use serde::{Deserialize, Deserializer, Serialize};

/// Number of troop kinds. Every army's troop vector has exactly this arity.
pub const TROOP_ARITY: usize = 6;

/// Troop kinds, in troop-vector order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TroopKind {
    Knights,
    MenAtArms,
    Archers,
    Crossbowmen,
    Pikemen,
    Peasants,
}

impl TroopKind {
    pub const ALL: [TroopKind; TROOP_ARITY] = [
        TroopKind::Knights,
        TroopKind::MenAtArms,
        TroopKind::Archers,
        TroopKind::Crossbowmen,
        TroopKind::Pikemen,
        TroopKind::Peasants,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Relative combat weight per man, used for troop-value sums.
    pub const fn combat_weight(self) -> u32 {
        match self {
            TroopKind::Knights => 8,
            TroopKind::MenAtArms => 4,
            TroopKind::Archers => 3,
            TroopKind::Crossbowmen => 3,
            TroopKind::Pikemen => 2,
            TroopKind::Peasants => 1,
        }
    }
}

/// Fixed-arity troop count vector. The arity never varies across armies;
/// deserializing a vector of the wrong length is an error, not a truncation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TroopVector(pub [u32; TROOP_ARITY]);

impl TroopVector {
    pub const EMPTY: TroopVector = TroopVector([0; TROOP_ARITY]);

    pub fn of(kind: TroopKind, count: u32) -> Self {
        let mut v = [0; TROOP_ARITY];
        v[kind.index()] = count;
        TroopVector(v)
    }

    #[inline]
    pub fn count(&self, kind: TroopKind) -> u32 {
        self.0[kind.index()]
    }

    /// Total men across all kinds.
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Weighted combat value of the whole vector.
    pub fn value(&self) -> u32 {
        TroopKind::ALL
            .iter()
            .map(|k| self.count(*k) * k.combat_weight())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn add(&self, other: &TroopVector) -> TroopVector {
        let mut out = [0; TROOP_ARITY];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.0[i].saturating_add(other.0[i]);
        }
        TroopVector(out)
    }

    /// Subtract, flooring each slot at zero.
    pub fn sub(&self, other: &TroopVector) -> TroopVector {
        let mut out = [0; TROOP_ARITY];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.0[i].saturating_sub(other.0[i]);
        }
        TroopVector(out)
    }

    /// True if every slot of `other` fits inside `self`.
    pub fn contains(&self, other: &TroopVector) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a >= b)
    }
}

impl<'de> Deserialize<'de> for TroopVector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let counts = Vec::<u32>::deserialize(deserializer)?;
        let arr: [u32; TROOP_ARITY] = counts.try_into().map_err(|v: Vec<u32>| {
            serde::de::Error::invalid_length(v.len(), &"troop vector of fixed arity")
        })?;
        Ok(TroopVector(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_weights_knights_over_peasants() {
        let knights = TroopVector::of(TroopKind::Knights, 10);
        let peasants = TroopVector::of(TroopKind::Peasants, 10);
        assert!(knights.value() > peasants.value());
        assert_eq!(knights.total(), peasants.total());
    }

    #[test]
    fn sub_floors_at_zero() {
        let a = TroopVector::of(TroopKind::Archers, 5);
        let b = TroopVector::of(TroopKind::Archers, 9);
        assert_eq!(a.sub(&b).total(), 0);
    }

    #[test]
    fn wrong_arity_rejected() {
        let err = serde_json::from_str::<TroopVector>("[1, 2, 3]");
        assert!(err.is_err());
    }

    #[test]
    fn roundtrip() {
        let v = TroopVector([1, 2, 3, 4, 5, 6]);
        let json = serde_json::to_string(&v).unwrap();
        let back: TroopVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}

//! Core domain catalog: factions, roles, and ingredients.
//!
//! Everything here is static data. Weights are internal tuning values and
//! are never meant to be shown to players.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// Hidden alignment of a player.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Faction {
    /// The hunted faction, larger or equal at the start of every game.
    Coven,
    /// The hunting faction.
    Hollow,
}

/// Secret role dealt to a player at game start.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleId {
    /// Shields the performer and, after a pure ritual, a chosen player.
    Protection,
    /// The seer: reads other players' ingredient choices.
    Oracle,
    /// Learns a chosen player's alignment after a pure ritual.
    Chronicler,
    /// Coven role available from seven players.
    Exorcist,
    /// Hollow saboteur.
    Hex,
    /// Hollow role that amplifies chaos.
    Harbinger,
    /// Hollow role that steals other players' visions.
    Mimic,
}

impl RoleId {
    /// Starting faction for this role.
    pub fn faction(self) -> Faction {
        match self {
            RoleId::Protection | RoleId::Oracle | RoleId::Chronicler | RoleId::Exorcist => {
                Faction::Coven
            }
            RoleId::Hex | RoleId::Harbinger | RoleId::Mimic => Faction::Hollow,
        }
    }

    /// Player-facing role name.
    pub fn display_name(self) -> &'static str {
        match self {
            RoleId::Protection => "Protection Witch",
            RoleId::Oracle => "Oracle Witch",
            RoleId::Chronicler => "Chronicler Witch",
            RoleId::Exorcist => "Exorcist",
            RoleId::Hex => "Hex Witch",
            RoleId::Harbinger => "Harbinger Witch",
            RoleId::Mimic => "Mimic Witch",
        }
    }

    /// Whether this is the seer-type role allowed to scry.
    pub fn is_seer(self) -> bool {
        matches!(self, RoleId::Oracle)
    }
}

/// Category an ingredient belongs to; drives narrative and protection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IngredientCategory {
    /// Visions and reveals.
    Divination,
    /// Shields; can soften a lethal backfire.
    Protection,
    /// Fuels backfires.
    Corruption,
    /// Masks and scrambles.
    Misdirection,
    /// Boosts intensity.
    Amplification,
}

/// Heaviest positive weight any single ingredient carries.
pub const MAX_INGREDIENT_WEIGHT: f64 = 0.30;

/// A selectable ingredient token.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IngredientId {
    /// Ancient root that wards against dark forces.
    MandrakeRoot,
    /// Liquid light that soothes corruption.
    TearsOfTheMoon,
    /// Binds fate together.
    SilverThread,
    /// A glimpse through the veil.
    EyeOfNewt,
    /// The raven whispers secrets.
    RavenFeather,
    /// Scrying orb; grants the Oracle an instant vision.
    CrystalBall,
    /// Echoes of the dead.
    BoneDust,
    /// Intensifies the flame of intent.
    CandleWax,
    /// Cuts a stubborn line.
    IronThorn,
    /// Remnants of consumed light.
    ShadowAsh,
    /// Powerful and dangerous.
    BloodOfTheInnocent,
}

impl IngredientId {
    /// Hidden corruption weight; negative values cancel corruption.
    pub fn weight(self) -> f64 {
        match self {
            IngredientId::MandrakeRoot => -0.15,
            IngredientId::TearsOfTheMoon => -0.10,
            IngredientId::SilverThread => 0.04,
            IngredientId::EyeOfNewt => 0.05,
            IngredientId::RavenFeather => 0.08,
            IngredientId::CrystalBall => 0.0,
            IngredientId::BoneDust => 0.12,
            IngredientId::CandleWax => 0.06,
            IngredientId::IronThorn => 0.14,
            IngredientId::ShadowAsh => 0.18,
            IngredientId::BloodOfTheInnocent => MAX_INGREDIENT_WEIGHT,
        }
    }

    /// Category used for narrative and protective softening.
    pub fn category(self) -> IngredientCategory {
        match self {
            IngredientId::MandrakeRoot
            | IngredientId::TearsOfTheMoon
            | IngredientId::SilverThread => IngredientCategory::Protection,
            IngredientId::EyeOfNewt | IngredientId::RavenFeather | IngredientId::CrystalBall => {
                IngredientCategory::Divination
            }
            IngredientId::BoneDust => IngredientCategory::Misdirection,
            IngredientId::CandleWax | IngredientId::IronThorn => IngredientCategory::Amplification,
            IngredientId::ShadowAsh | IngredientId::BloodOfTheInnocent => {
                IngredientCategory::Corruption
            }
        }
    }

    /// Whether this ingredient can soften a backfire.
    pub fn is_protective(self) -> bool {
        self.category() == IngredientCategory::Protection
    }

    /// Whether this is the scrying ingredient.
    pub fn is_scrying(self) -> bool {
        matches!(self, IngredientId::CrystalBall)
    }

    /// Player-facing name.
    pub fn display_name(self) -> &'static str {
        match self {
            IngredientId::MandrakeRoot => "Mandrake Root",
            IngredientId::TearsOfTheMoon => "Tears of the Moon",
            IngredientId::SilverThread => "Silver Thread",
            IngredientId::EyeOfNewt => "Eye of Newt",
            IngredientId::RavenFeather => "Raven Feather",
            IngredientId::CrystalBall => "Crystal Ball",
            IngredientId::BoneDust => "Bone Dust",
            IngredientId::CandleWax => "Candle Wax",
            IngredientId::IronThorn => "Iron Thorn",
            IngredientId::ShadowAsh => "Shadow Ash",
            IngredientId::BloodOfTheInnocent => "Blood of the Innocent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_no_weight_exceeds_maximum() {
        for ingredient in IngredientId::iter() {
            assert!(ingredient.weight() <= MAX_INGREDIENT_WEIGHT, "{ingredient}");
        }
    }

    #[test]
    fn test_role_factions() {
        let hollow: Vec<_> = RoleId::iter()
            .filter(|r| r.faction() == Faction::Hollow)
            .collect();
        assert_eq!(hollow, vec![RoleId::Hex, RoleId::Harbinger, RoleId::Mimic]);
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_string(&IngredientId::TearsOfTheMoon).unwrap();
        assert_eq!(json, "\"TEARS_OF_THE_MOON\"");
        assert_eq!(IngredientId::TearsOfTheMoon.to_string(), "TEARS_OF_THE_MOON");
    }
}

//! Action classification and structured effects
//!
//! Each action carries at most one structured effect. The shapes are
//! mutually exclusive, so resolution matches on [`ActionEffect`] instead of
//! probing optional fields.

use serde::{Deserialize, Serialize};

use crate::combat::combatant::Attribute;
use crate::combat::skill::Skill;
use crate::combat::tags::TagKind;
use crate::core::types::Range;

/// Broad intent of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Offensive,
    Defensive,
    Supplementary,
    Counter,
}

/// Discipline an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Taijutsu,
    Ninjutsu,
    Genjutsu,
    Tool,
    Innate,
    Tactical,
}

impl Category {
    /// Skill that powers and reduces the cost of this category
    pub fn skill(&self) -> Option<Skill> {
        match self {
            Category::Taijutsu => Some(Skill::Taijutsu),
            Category::Ninjutsu => Some(Skill::Ninjutsu),
            Category::Genjutsu => Some(Skill::Genjutsu),
            Category::Tool => Some(Skill::Shurikenjutsu),
            Category::Innate | Category::Tactical => None,
        }
    }
}

/// Delivery shape; drives reactions, evasion and special handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EffectTag {
    #[default]
    Standard,
    Projectile,
    MultiProjectile,
    AoE,
    LineAoE,
    Grapple,
    Deception,
    Evasion,
    Barrier,
    Push,
    StanceBreak,
    Clone,
    Transformation,
    Substitution,
    Analysis,
    Trap,
    Escape,
    Guard,
    Struggle,
}

impl EffectTag {
    /// Shapes an elemental wall can intercept
    pub fn is_ranged_jutsu(&self) -> bool {
        matches!(
            self,
            EffectTag::Projectile | EffectTag::AoE | EffectTag::MultiProjectile | EffectTag::LineAoE
        )
    }

    /// Area shapes are harder to evade
    pub fn is_area(&self) -> bool {
        matches!(self, EffectTag::AoE | EffectTag::LineAoE)
    }
}

/// Preparation tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Complexity {
    #[default]
    None,
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Preparation ticks before any reduction
    pub fn base_ticks(&self) -> u32 {
        match self {
            Complexity::None => 0,
            Complexity::Simple => 1,
            Complexity::Moderate => 2,
            Complexity::Complex => 3,
        }
    }
}

/// Where an action can be used from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reach {
    /// Self-targeted; usable at any distance
    Personal,
    /// Usable only at the listed distances (never empty)
    Ranges(Vec<Range>),
}

impl Reach {
    pub fn allows(&self, range: Range) -> bool {
        match self {
            Reach::Personal => true,
            Reach::Ranges(ranges) => ranges.contains(&range),
        }
    }

    pub fn is_personal(&self) -> bool {
        matches!(self, Reach::Personal)
    }
}

/// Descriptive flags that scoring and reactions look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Powerful,
    Deceptive,
    Fast,
    Guided,
    /// Only ever taken as a reaction, never chosen as a turn
    ReactionOnly,
    /// Only usable while grappled
    GrappleOnly,
}

/// Who a templated tag lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectTarget {
    User,
    Target,
    Battlefield,
}

/// Tag to stamp onto the effect target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TagTemplate {
    pub kind: TagKind,
    pub duration: i32,
    #[serde(default)]
    pub payload: Option<f32>,
}

/// One side of a contest: an attribute plus an optional skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckProfile {
    pub attribute: Attribute,
    #[serde(default)]
    pub skill: Option<Skill>,
}

/// Attacker-versus-defender contest descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestedCheck {
    pub attacker: CheckProfile,
    pub defender: CheckProfile,
}

/// Structured effect of an action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type")]
pub enum ActionEffect {
    #[default]
    None,
    /// Move the shared range to `to`
    ChangeRange { to: Range },
    /// Apply a tag unconditionally once the action lands
    ApplyTag { tag: TagTemplate, on: EffectTarget },
    /// Apply a tag only if the attacker wins the contest
    Contested {
        check: ContestedCheck,
        tag: TagTemplate,
        on: EffectTarget,
    },
    /// Chance to move the shared range to `to`
    Reposition { chance: f32, to: Range },
}

impl ActionEffect {
    /// Range this effect moves the fight to, if any
    pub fn range_target(&self) -> Option<Range> {
        match self {
            ActionEffect::ChangeRange { to } | ActionEffect::Reposition { to, .. } => Some(*to),
            _ => None,
        }
    }

    /// Does this effect stamp anything on the opponent?
    pub fn targets_opponent(&self) -> bool {
        matches!(
            self,
            ActionEffect::ApplyTag {
                on: EffectTarget::Target,
                ..
            } | ActionEffect::Contested {
                on: EffectTarget::Target,
                ..
            }
        )
    }
}

/// Minimum skill level an action demands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: Skill,
    pub level: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_ticks() {
        assert_eq!(Complexity::None.base_ticks(), 0);
        assert_eq!(Complexity::Complex.base_ticks(), 3);
    }

    #[test]
    fn test_personal_reach_allows_everything() {
        assert!(Reach::Personal.allows(Range::Long));
        let melee = Reach::Ranges(vec![Range::Engaged]);
        assert!(melee.allows(Range::Engaged));
        assert!(!melee.allows(Range::Short));
    }

    #[test]
    fn test_range_target() {
        assert_eq!(
            ActionEffect::ChangeRange { to: Range::Long }.range_target(),
            Some(Range::Long)
        );
        assert_eq!(ActionEffect::None.range_target(), None);
    }
}

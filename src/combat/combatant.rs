//! Per-combatant runtime state
//!
//! Built once at combat start from a character record or an opponent
//! template, mutated every tick, and discarded when the fight ends.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::actions::effect::CheckProfile;
use crate::ai::profile::AiProfile;
use crate::combat::posture::Posture;
use crate::combat::skill::{Skill, SkillLevels};
use crate::combat::tags::{TagKind, TagSet};
use crate::core::types::{CombatantId, Range};
use crate::records::{CharacterRecord, OpponentTemplate};

/// Length of the recent-action ring used for repetition penalties
pub const RECENT_ACTION_CAPACITY: usize = 5;

/// Core attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Strength,
    Agility,
    Perception,
    Intellect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub strength: f32,
    pub agility: f32,
    pub perception: f32,
    pub intellect: f32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: 30.0,
            agility: 30.0,
            perception: 30.0,
            intellect: 30.0,
        }
    }
}

impl Attributes {
    pub fn get(&self, attribute: Attribute) -> f32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Agility => self.agility,
            Attribute::Perception => self.perception,
            Attribute::Intellect => self.intellect,
        }
    }

    pub fn add(&mut self, attribute: Attribute, amount: f32) {
        match attribute {
            Attribute::Strength => self.strength += amount,
            Attribute::Agility => self.agility += amount,
            Attribute::Perception => self.perception += amount,
            Attribute::Intellect => self.intellect += amount,
        }
    }
}

/// Health, chakra and stamina, always within `[0, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    pub max_health: f32,
    pub chakra: f32,
    pub max_chakra: f32,
    pub stamina: f32,
    pub max_stamina: f32,
}

impl Vitals {
    pub fn full(max_health: f32, max_chakra: f32, max_stamina: f32) -> Self {
        Self {
            health: max_health.max(0.0),
            max_health: max_health.max(0.0),
            chakra: max_chakra.max(0.0),
            max_chakra: max_chakra.max(0.0),
            stamina: max_stamina.max(0.0),
            max_stamina: max_stamina.max(0.0),
        }
    }

    /// Remove health; returns the amount actually removed
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health - amount.max(0.0)).clamp(0.0, self.max_health);
        before - self.health
    }

    pub fn spend_chakra(&mut self, amount: f32) {
        self.chakra = (self.chakra - amount.max(0.0)).clamp(0.0, self.max_chakra);
    }

    pub fn spend_stamina(&mut self, amount: f32) {
        self.stamina = (self.stamina - amount.max(0.0)).clamp(0.0, self.max_stamina);
    }

    pub fn restore_stamina(&mut self, amount: f32) {
        self.stamina = (self.stamina + amount.max(0.0)).clamp(0.0, self.max_stamina);
    }

    /// Clamp everything back into range
    pub fn clamp(&mut self) {
        self.health = self.health.clamp(0.0, self.max_health);
        self.chakra = self.chakra.clamp(0.0, self.max_chakra);
        self.stamina = self.stamina.clamp(0.0, self.max_stamina);
    }

    pub fn health_fraction(&self) -> f32 {
        fraction(self.health, self.max_health)
    }

    pub fn chakra_fraction(&self) -> f32 {
        fraction(self.chakra, self.max_chakra)
    }

    pub fn stamina_fraction(&self) -> f32 {
        fraction(self.stamina, self.max_stamina)
    }
}

fn fraction(value: f32, max: f32) -> f32 {
    if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// A technique being prepared over several ticks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastingState {
    pub action: String,
    pub target: CombatantId,
    pub ticks_remaining: u32,
}

/// Mutable runtime state of one fighter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub is_player: bool,
    pub vitals: Vitals,
    pub attributes: Attributes,
    pub skills: SkillLevels,

    // Scheduling
    pub action_gauge: f32,
    pub casting: Option<CastingState>,

    // Tactical state
    pub posture: Posture,
    pub momentum: u32,
    pub aggression: f32,
    pub resolve: f32,
    /// Desperation tiers crossed so far
    pub desperation_level: usize,

    /// Learned techniques and their level
    pub known_actions: BTreeMap<String, u32>,
    /// Uses per action name this fight
    pub usage: BTreeMap<String, u32>,
    pub recent_actions: VecDeque<String>,
    pub tags: TagSet,
    pub preferred_range: Option<Range>,
    pub ai_profile: Option<AiProfile>,
    /// Player inventory or NPC equipment
    pub inventory: BTreeMap<String, u32>,
}

impl Combatant {
    /// Bare combatant with full vitals; mostly for tests and templates
    pub fn new(id: CombatantId, name: impl Into<String>, is_player: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_player,
            vitals: Vitals::full(100.0, 100.0, 100.0),
            attributes: Attributes::default(),
            skills: SkillLevels::new(),
            action_gauge: 0.0,
            casting: None,
            posture: Posture::Mobile,
            momentum: 0,
            aggression: 50.0,
            resolve: 50.0,
            desperation_level: 0,
            known_actions: BTreeMap::new(),
            usage: BTreeMap::new(),
            recent_actions: VecDeque::with_capacity(RECENT_ACTION_CAPACITY),
            tags: TagSet::new(),
            preferred_range: None,
            ai_profile: None,
            inventory: BTreeMap::new(),
        }
    }

    /// Player combatant from the external character record
    pub fn from_record(record: &CharacterRecord) -> Self {
        let mut combatant = Self::new(CombatantId::PLAYER, record.name.clone(), true);
        combatant.vitals = Vitals {
            health: record.health,
            max_health: record.max_health,
            chakra: record.chakra,
            max_chakra: record.max_chakra,
            stamina: record.stamina,
            max_stamina: record.max_stamina,
        };
        combatant.vitals.clamp();
        combatant.attributes = record.attributes;
        combatant.skills = record.skills.clone();
        combatant.known_actions = record.techniques.clone();
        combatant.inventory = record.inventory.clone();
        combatant.preferred_range = record.preferred_range;
        combatant
    }

    /// AI combatant from an opponent template
    pub fn from_template(id: CombatantId, template: &OpponentTemplate) -> Self {
        let mut combatant = Self::new(id, template.name.clone(), false);
        combatant.vitals = Vitals::full(
            template.max_health,
            template.max_chakra,
            template.max_stamina,
        );
        combatant.attributes = template.attributes;
        combatant.skills = template.skills.clone();
        combatant.known_actions = template
            .techniques
            .iter()
            .map(|name| (name.clone(), 1))
            .collect();
        combatant.inventory = template.equipment.clone();
        combatant.preferred_range = template.preferred_range;
        combatant.ai_profile = Some(template.ai_profile);
        combatant.aggression = template.aggression.clamp(0.0, 100.0);
        combatant.resolve = template.resolve.clamp(0.0, 100.0);
        combatant
    }

    pub fn is_alive(&self) -> bool {
        self.vitals.health > 0.0
    }

    pub fn has_tag(&self, kind: TagKind) -> bool {
        self.tags.has(kind)
    }

    pub fn is_grappled(&self) -> bool {
        self.has_tag(TagKind::Grappled)
    }

    pub fn is_casting(&self) -> bool {
        self.casting.is_some()
    }

    /// Learned level of a technique (0 if unknown)
    pub fn technique_level(&self, name: &str) -> u32 {
        self.known_actions.get(name).copied().unwrap_or(0)
    }

    /// Damage bonus from practice with a technique
    pub fn mastery_bonus(&self, name: &str) -> f32 {
        self.technique_level(name).min(25) as f32 * 0.02
    }

    pub fn item_count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    /// Use up one of an item; returns false if none were held
    pub fn consume_item(&mut self, item: &str) -> bool {
        match self.inventory.get_mut(item) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Push onto the bounded recent-action ring
    pub fn remember_action(&mut self, name: &str) {
        if self.recent_actions.len() == RECENT_ACTION_CAPACITY {
            self.recent_actions.pop_front();
        }
        self.recent_actions.push_back(name.to_string());
        *self.usage.entry(name.to_string()).or_insert(0) += 1;
    }

    /// How many of the recent actions were this one
    pub fn recent_count(&self, name: &str) -> usize {
        self.recent_actions.iter().filter(|n| n.as_str() == name).count()
    }

    /// Attribute plus half the skill level
    pub fn check_value(&self, profile: &CheckProfile) -> f32 {
        let skill = profile
            .skill
            .map(|s| self.skills.get(s) as f32 * 0.5)
            .unwrap_or(0.0);
        self.attributes.get(profile.attribute) + skill
    }

    /// Gauge gained per tick
    pub fn gauge_gain(&self, base_agility: f32) -> f32 {
        let agility = if self.attributes.agility > 0.0 {
            self.attributes.agility
        } else {
            base_agility
        };
        let gain = agility / 2.0;
        if self.has_tag(TagKind::Slowed) {
            gain / 2.0
        } else {
            gain
        }
    }

    /// Fights primarily with ninjutsu
    pub fn is_caster(&self) -> bool {
        match self.ai_profile {
            Some(AiProfile::NinjutsuSpecialist) => true,
            Some(_) => false,
            None => self.skills.get(Skill::Ninjutsu) > self.skills.get(Skill::Taijutsu),
        }
    }

    /// Stacked familiarity with an opponent from analysis
    pub fn familiarity_with(&self, opponent: CombatantId) -> u32 {
        self.tags
            .find_from(TagKind::Analyzed, opponent)
            .and_then(|t| t.payload)
            .map(|p| p as u32)
            .unwrap_or(0)
    }
}

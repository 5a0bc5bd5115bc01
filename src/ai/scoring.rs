//! Technique scoring for AI combatants
//!
//! Every candidate starts at a base score and is multiplied by a chain of
//! independent contextual factors. Scoring is pure: the same context always
//! yields the same score. Randomness only enters later, at selection.

use crate::actions::catalog::{Action, ANALYZE, GUARD};
use crate::actions::effect::{ActionType, EffectTag};
use crate::ai::desperation::{self, HIGH_DESPERATION};
use crate::ai::phase::CombatPhase;
use crate::ai::profile::AiProfile;
use crate::combat::combatant::Combatant;
use crate::combat::posture::Posture;
use crate::combat::tags::TagKind;
use crate::core::config::CombatConfig;
use crate::core::types::{Range, Rank};

pub const BASE_SCORE: f32 = 10.0;

/// Everything scoring looks at besides the action itself
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub actor: &'a Combatant,
    pub target: Option<&'a Combatant>,
    pub phase: CombatPhase,
    pub range: Range,
    pub config: &'a CombatConfig,
}

/// Score one candidate action
pub fn score_action(action: &Action, ctx: &ScoringContext<'_>) -> f32 {
    let actor = ctx.actor;
    let offensive = action.kind == ActionType::Offensive;
    let mut score = BASE_SCORE;

    // Profile affinity
    if let Some(profile) = actor.ai_profile {
        score *= profile.affinity(action);
    }

    // Analysis
    if action.name == ANALYZE {
        let already = ctx
            .target
            .is_some_and(|t| actor.tags.find_from(TagKind::Analyzed, t.id).is_some());
        if already {
            score *= 0.01;
        }
        if ctx.phase == CombatPhase::FeelingOut {
            if actor.attributes.intellect > 30.0 {
                score *= 8.0;
            }
        } else if actor.desperation_level >= HIGH_DESPERATION
            || actor.vitals.health_fraction() > 0.8
        {
            score *= 0.1;
        }
    }

    // Clones already out
    if action.effect_tag == EffectTag::Clone && actor.has_tag(TagKind::CloneDecoy) {
        score *= 0.05;
    }

    if let Some(target) = ctx.target {
        // Grapple exploitation
        if target.is_grappled() && action.is_melee() && action.is_finisher() {
            score *= 20.0;
        }
        if action.effect_tag == EffectTag::Grapple
            && actor.ai_profile == Some(AiProfile::Brawler)
            && target.is_caster()
            && ctx.range == Range::Engaged
        {
            score *= 15.0;
        }
        if action.is_evasive_or_push()
            && actor.is_caster()
            && target.ai_profile == Some(AiProfile::Brawler)
            && ctx.range == Range::Engaged
        {
            score *= 10.0;
        }

        // Target posture
        if offensive && target.posture.is_vulnerable() {
            score *= 5.0 + action.base_power / 10.0;
        }
        if action.effect_tag == EffectTag::StanceBreak && target.posture == Posture::Guarded {
            score *= 6.0;
        }
    }

    // Ambush from disguise
    if offensive && actor.has_tag(TagKind::Disguised) {
        score *= 10.0;
    }

    // Self posture correction
    if actor.posture == Posture::Exposed {
        if action.effect_tag == EffectTag::Evasion
            || action.kind == ActionType::Defensive
            || action.range_target().is_some()
        {
            score *= 8.0;
        }
        if offensive {
            score *= 0.1;
        }
    }

    // Phase and rank escalation
    match ctx.phase {
        CombatPhase::Escalation if action.rank > Rank::E => score *= 2.0,
        CombatPhase::Climax if action.rank > Rank::D => score *= 4.0,
        CombatPhase::Resolution if action.base_power > 25.0 || action.rank > Rank::C => {
            score *= 6.0
        }
        _ => {}
    }

    // Desperation
    if offensive && actor.desperation_level > 0 {
        score *= 2.5 * desperation::damage_multiplier(actor.desperation_level, ctx.config);
    }

    // Range preference
    if let Some(preferred) = actor.preferred_range {
        match action.range_target() {
            Some(to) if to == preferred => score *= 2.0,
            Some(_) => score *= 0.4,
            None if ctx.range != preferred => score *= 0.6,
            None => {}
        }
    }

    // Repetition
    let repeats = actor.recent_count(&action.name);
    if repeats > 0 {
        score *= ctx.config.repetition_penalty.powi(repeats as i32);
    }

    // Resource caution
    if action.chakra_cost > actor.vitals.chakra / 2.0 {
        score *= 0.5;
    }

    // Type dampeners
    if action.kind == ActionType::Counter {
        score *= 0.05;
    }
    if action.name == GUARD && actor.vitals.stamina_fraction() > 0.7 {
        score *= 0.01;
    }

    score.max(0.0)
}

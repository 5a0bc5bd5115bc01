//! Action resolution
//!
//! Turns a chosen action into outcomes. A fresh action first records usage,
//! consumes its item and may start a cast; a finished cast skips straight
//! to execution. Execution pays costs, then either handles one of the
//! special actions (guard, escape, analysis, self-targeted techniques) or
//! runs the full attack pipeline:
//!
//! decoy check → reaction → default evasion → damage → secondary effects
//!
//! Momentum and desperation are updated as each exchange settles.

use crate::actions::catalog::{Action, ANALYZE};
use crate::actions::effect::{
    ActionEffect, ActionType, Category, CheckProfile, EffectTag, EffectTarget, Keyword,
    TagTemplate,
};
use crate::ai::desperation;
use crate::combat::combatant::{Attribute, CastingState, Combatant};
use crate::combat::context::TurnContext;
use crate::combat::events::{CombatEventKind, Severity};
use crate::combat::momentum::{self, MomentumShift};
use crate::combat::posture::{transition, Posture, PostureTrigger};
use crate::combat::reaction::{react, Reaction};
use crate::combat::skill::{cost_reduction, hand_seal_reduction, Skill};
use crate::combat::state::JutsuRecord;
use crate::combat::tags::{Tag, TagKind, UNTIL_CLEARED};
use crate::core::config::CombatConfig;
use crate::core::rng::RandomSource;
use crate::core::types::{CombatantId, Range};

/// How an action played out
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Preparation started; resolves when the cast completes
    Casting { ticks: u32 },
    /// A decoy clone took the hit
    Absorbed,
    /// The defender's reaction stopped it
    Negated(Reaction),
    /// Default evasion
    Evaded,
    Hit { damage: f32 },
    /// A non-damaging effect took hold
    Applied,
    /// A contest or escape failed, or there was nothing to act on
    Failed,
}

/// Preparation ticks after hand-seal and (player) mastery reductions
pub fn cast_delay(actor: &Combatant, action: &Action) -> u32 {
    let seals = hand_seal_reduction(actor.skills.get(Skill::HandSeals));
    let mastery = if actor.is_player {
        actor.technique_level(&action.name) / 5
    } else {
        0
    };
    action
        .complexity
        .base_ticks()
        .saturating_sub(seals)
        .saturating_sub(mastery)
}

/// Chakra and stamina actually paid after skill reductions
pub fn effective_costs(actor: &Combatant, action: &Action, config: &CombatConfig) -> (f32, f32) {
    let chakra_cut = cost_reduction(
        actor.skills.get(Skill::ChakraControl),
        config.cost_reduction_cap,
        config.cost_reduction_skill_cap,
    );
    let stamina_cut = cost_reduction(
        actor.skills.get(Skill::Endurance),
        config.cost_reduction_cap,
        config.cost_reduction_skill_cap,
    );
    (
        (action.chakra_cost * (1.0 - chakra_cut)).max(0.0),
        (action.stamina_cost * (1.0 - stamina_cut)).max(0.0),
    )
}

fn accuracy_attribute(category: Category) -> Attribute {
    match category {
        Category::Ninjutsu | Category::Genjutsu => Attribute::Intellect,
        Category::Tool => Attribute::Agility,
        Category::Taijutsu | Category::Innate | Category::Tactical => Attribute::Strength,
    }
}

/// Attacker accuracy for default evasion
pub fn accuracy(attacker: &Combatant, action: &Action) -> f32 {
    let skill = action
        .category
        .skill()
        .map_or(0.0, |s| attacker.skills.get(s) as f32 * 0.5);
    attacker.attributes.get(accuracy_attribute(action.category))
        + attacker.attributes.perception * 0.5
        + skill
}

/// Defender evasion for default evasion, before fuzz
pub fn evasion(defender: &Combatant, action: &Action, mist: bool) -> f32 {
    let mut value = defender.attributes.agility + defender.attributes.perception * 0.5;
    if action.effect_tag.is_area() {
        value *= 0.6;
    }
    if action.has_keyword(Keyword::Fast) || action.has_keyword(Keyword::Guided) {
        value *= 0.8;
    }
    if defender.has_tag(TagKind::Dazed) {
        value *= 0.5;
    }
    if mist {
        value *= 1.25;
    }
    value
}

/// Damage before rounding and before the posture or ambush multiplier
pub fn raw_damage(attacker: &Combatant, action: &Action, power: f32, range: Range) -> f32 {
    let stat_bonus = if range.is_close() {
        attacker.attributes.strength / 5.0
    } else {
        attacker.attributes.perception / 5.0
    };
    let skill_bonus = action
        .category
        .skill()
        .map_or(0.0, |s| attacker.skills.get(s) as f32 * 0.25);
    power * (1.0 + attacker.mastery_bonus(&action.name)) + stat_bonus + skill_bonus
}

/// Resolve a freshly chosen action
pub fn resolve_action(
    ctx: &mut TurnContext<'_>,
    actor: usize,
    name: &str,
    target: Option<CombatantId>,
) -> Outcome {
    let catalog = ctx.catalog;
    let action = catalog.get_or_guard(name);

    let (is_player, actor_id) = {
        let c = &ctx.state.combatants[actor];
        (c.is_player, c.id)
    };
    if is_player {
        ctx.host.record_skill_usage(action.category, action.element);
    }
    ctx.state.combatants[actor].remember_action(&action.name);
    let tick = ctx.state.tick;
    ctx.state.jutsu_history.push(JutsuRecord {
        tick,
        actor: actor_id,
        name: action.name.clone(),
        rank: action.rank,
    });
    if let Some(item) = &action.required_item {
        ctx.state.combatants[actor].consume_item(item);
    }

    let target = target.or_else(|| ctx.state.default_target(actor_id));
    let delay = cast_delay(&ctx.state.combatants[actor], action);
    if delay > 0 {
        let c = &mut ctx.state.combatants[actor];
        c.casting = Some(CastingState {
            action: action.name.clone(),
            target: target.unwrap_or(actor_id),
            ticks_remaining: delay,
        });
        c.posture = transition(c.posture, PostureTrigger::BeganCasting);
        let message = format!("{} begins weaving seals for {}", c.name, action.name);
        ctx.emit(
            CombatEventKind::CastStarted {
                actor: actor_id,
                action: action.name.clone(),
                ticks: delay,
            },
            message,
            Severity::Info,
        );
        tracing::debug!(actor = %actor_id, action = %action.name, delay, "cast started");
        return Outcome::Casting { ticks: delay };
    }

    execute(ctx, actor, action, target)
}

/// Finish a prepared cast against its stored target
pub fn resolve_cast(ctx: &mut TurnContext<'_>, actor: usize, cast: CastingState) -> Outcome {
    let catalog = ctx.catalog;
    let action = catalog.get_or_guard(&cast.action);
    execute(ctx, actor, action, Some(cast.target))
}

fn execute(
    ctx: &mut TurnContext<'_>,
    actor: usize,
    action: &Action,
    target: Option<CombatantId>,
) -> Outcome {
    let config = ctx.config;
    {
        let c = &mut ctx.state.combatants[actor];
        let (chakra, stamina) = effective_costs(c, action, config);
        c.vitals.spend_chakra(chakra);
        c.vitals.spend_stamina(stamina);

        let guards = action.effect_tag == EffectTag::Guard
            || (action.kind == ActionType::Defensive && !action.is_target_directed());
        let trigger = if guards {
            PostureTrigger::RaisedGuard
        } else {
            PostureTrigger::Acted
        };
        c.posture = transition(c.posture, trigger);
    }

    let actor_id = ctx.state.combatants[actor].id;
    let actor_name = ctx.name(actor);
    ctx.emit(
        CombatEventKind::ActionUsed {
            actor: actor_id,
            action: action.name.clone(),
        },
        format!("{} uses {}", actor_name, action.name),
        Severity::Info,
    );

    let outcome = match action.effect_tag {
        EffectTag::Guard => guard(ctx, actor),
        EffectTag::Escape => escape_grapple(ctx, actor),
        EffectTag::Analysis if action.name == ANALYZE => analyze(ctx, actor, target),
        _ if !action.is_target_directed() => personal(ctx, actor, action),
        _ => match target_index(ctx, actor, target) {
            Some(target) => attack(ctx, actor, target, action),
            None => {
                ctx.emit(
                    CombatEventKind::Missed {
                        attacker: actor_id,
                        target: actor_id,
                    },
                    format!("{} finds no one to target", actor_name),
                    Severity::Miss,
                );
                Outcome::Failed
            }
        },
    };

    tracing::debug!(
        tick = ctx.state.tick,
        actor = %actor_id,
        action = %action.name,
        ?outcome,
        "resolved"
    );
    outcome
}

/// Living target index; falls back to the default target when the stored
/// one is gone
fn target_index(ctx: &TurnContext<'_>, actor: usize, target: Option<CombatantId>) -> Option<usize> {
    let state = &*ctx.state;
    let actor_id = state.combatants[actor].id;
    let stored = target
        .filter(|id| *id != actor_id)
        .and_then(|id| state.index_of(id))
        .filter(|i| state.combatants[*i].is_alive());
    stored.or_else(|| {
        state
            .default_target(actor_id)
            .and_then(|id| state.index_of(id))
    })
}

fn guard(ctx: &mut TurnContext<'_>, actor: usize) -> Outcome {
    let restore = ctx.config.guard_stamina_restore;
    let c = &mut ctx.state.combatants[actor];
    let amount = c.vitals.max_stamina * restore;
    c.vitals.restore_stamina(amount);
    c.posture = Posture::Guarded;
    Outcome::Applied
}

fn escape_grapple(ctx: &mut TurnContext<'_>, actor: usize) -> Outcome {
    let actor_id = ctx.state.combatants[actor].id;
    let grappler = ctx.state.combatants[actor]
        .tags
        .get(TagKind::Grappled)
        .and_then(|t| t.source);
    let Some(grappler) = grappler else {
        // Not held by anyone
        ctx.state.combatants[actor].tags.remove(TagKind::Grappled);
        return Outcome::Failed;
    };

    let holder = ctx
        .state
        .index_of(grappler)
        .filter(|i| ctx.state.combatants[*i].is_alive());
    let escaped = match holder {
        Some(holder) => {
            let profile = CheckProfile {
                attribute: Attribute::Strength,
                skill: Some(Skill::Taijutsu),
            };
            let attack = ctx.state.combatants[actor].check_value(&profile);
            let defend = ctx.state.combatants[holder].check_value(&profile) * ctx.rng.fuzz();
            attack > defend
        }
        None => true,
    };

    let name = ctx.name(actor);
    if escaped {
        let c = &mut ctx.state.combatants[actor];
        c.tags.remove(TagKind::Grappled);
        c.posture = transition(c.posture, PostureTrigger::Recovered);
        ctx.emit(
            CombatEventKind::GrappleEscaped { actor: actor_id },
            format!("{} wrenches free of the hold!", name),
            Severity::Status,
        );
        Outcome::Applied
    } else {
        ctx.emit(
            CombatEventKind::EscapeFailed { actor: actor_id },
            format!("{} strains against the hold but cannot break it", name),
            Severity::Miss,
        );
        Outcome::Failed
    }
}

fn analyze(ctx: &mut TurnContext<'_>, actor: usize, target: Option<CombatantId>) -> Outcome {
    let Some(target) = target_index(ctx, actor, target) else {
        return Outcome::Failed;
    };
    let target_id = ctx.state.combatants[target].id;
    let target_name = ctx.name(target);
    let c = &mut ctx.state.combatants[actor];
    let stacks = c.familiarity_with(target_id) + 1;
    c.tags.add(
        Tag::new(TagKind::Analyzed, UNTIL_CLEARED)
            .from_source(target_id)
            .with_payload(stacks as f32),
    );
    let name = c.name.clone();
    ctx.emit(
        CombatEventKind::TagApplied {
            target: Some(target_id),
            kind: TagKind::Analyzed,
        },
        format!("{} studies {}'s movements (familiarity {})", name, target_name, stacks),
        Severity::Status,
    );
    Outcome::Applied
}

/// Self-targeted techniques: clones, traps, transformation, mist, walls
fn personal(ctx: &mut TurnContext<'_>, actor: usize, action: &Action) -> Outcome {
    if action.kind == ActionType::Defensive && action.effect == ActionEffect::None {
        return Outcome::Applied;
    }
    if apply_effect(ctx, actor, None, &action.effect) {
        Outcome::Applied
    } else {
        Outcome::Failed
    }
}

/// Full pipeline for target-directed Offensive and Supplementary actions
fn attack(ctx: &mut TurnContext<'_>, actor: usize, target: usize, action: &Action) -> Outcome {
    let config = ctx.config;
    let offensive = action.kind == ActionType::Offensive;
    let hostile = offensive || action.is_hostile_supplementary();
    let (actor_id, target_id) = (ctx.state.combatants[actor].id, ctx.state.combatants[target].id);

    // Decoy clones
    if hostile
        && ctx.state.combatants[target].has_tag(TagKind::CloneDecoy)
        && ctx.rng.chance(config.clone_absorb_chance)
    {
        ctx.state.combatants[target]
            .tags
            .consume(TagKind::CloneDecoy, config.clone_absorb_ticks);
        momentum::on_miss(&mut ctx.state.combatants[actor]);
        let (a, t) = (ctx.name(actor), ctx.name(target));
        ctx.emit(
            CombatEventKind::DecoyAbsorbed { target: target_id },
            format!("{} hits a clone of {}, which bursts into smoke", a, t),
            Severity::Miss,
        );
        return Outcome::Absorbed;
    }

    let reaction = if action.effect_tag == EffectTag::Struggle {
        Reaction::None
    } else {
        react(ctx, actor, target, action)
    };

    let mut power = action.base_power;
    match &reaction {
        Reaction::TrapSprung { .. } => {
            momentum::on_miss(&mut ctx.state.combatants[actor]);
            after_damage(ctx, actor);
            return Outcome::Negated(reaction.clone());
        }
        Reaction::Dodge { success: true } => {
            if let Some((a, d)) = ctx.state.pair_mut(actor, target) {
                if momentum::on_dodge(a, d, config) == MomentumShift::Surge {
                    surge(ctx, target);
                }
            }
            if ctx.state.range() == Range::Engaged && ctx.rng.chance(config.dodge_reposition_chance) {
                set_range(ctx, Range::Short);
            }
            return Outcome::Negated(reaction.clone());
        }
        r if r.negates() => {
            momentum::on_miss(&mut ctx.state.combatants[actor]);
            return Outcome::Negated(reaction.clone());
        }
        Reaction::Block { success: false } => power *= config.block_partial_scale,
        Reaction::Wall { absorb, .. } => {
            power -= *absorb;
            if power <= 0.0 {
                momentum::on_miss(&mut ctx.state.combatants[actor]);
                return Outcome::Negated(reaction.clone());
            }
        }
        _ => {}
    }

    // Default evasion for jutsu and thrown weapons
    if offensive
        && action.category != Category::Taijutsu
        && action.effect_tag != EffectTag::Struggle
        && reaction == Reaction::None
    {
        let mist = ctx.state.battlefield.tags.has(TagKind::MistCover);
        let acc = accuracy(&ctx.state.combatants[actor], action);
        let eva = evasion(&ctx.state.combatants[target], action, mist) * ctx.rng.fuzz();
        if eva > acc {
            momentum::on_miss(&mut ctx.state.combatants[actor]);
            let (a, t) = (ctx.name(actor), ctx.name(target));
            ctx.emit(
                CombatEventKind::Missed {
                    attacker: actor_id,
                    target: target_id,
                },
                format!("{} evades {}'s {}", t, a, action.name),
                Severity::Miss,
            );
            return Outcome::Evaded;
        }
    }

    if !offensive {
        // Hostile supplementary: the effect is the whole point
        let landed = apply_effect(ctx, actor, Some(target), &action.effect);
        if action.effect_tag == EffectTag::Grapple {
            apply_grapple(ctx, actor, target);
        }
        if action.is_hostile_supplementary() {
            record_exchange(ctx, actor, target, landed);
        }
        return if landed { Outcome::Applied } else { Outcome::Failed };
    }

    let damage = land_hit(ctx, actor, target, action, power);

    if action.effect_tag == EffectTag::Grapple && ctx.state.combatants[target].is_alive() {
        apply_grapple(ctx, actor, target);
    }
    if ctx.state.combatants[target].is_alive() {
        apply_effect(ctx, actor, Some(target), &action.effect);
    }
    Outcome::Hit { damage }
}

/// Interrupt, compute and apply damage, then settle momentum
fn land_hit(ctx: &mut TurnContext<'_>, actor: usize, target: usize, action: &Action, power: f32) -> f32 {
    let config = ctx.config;
    let range = ctx.state.range();
    let (actor_id, target_id) = (ctx.state.combatants[actor].id, ctx.state.combatants[target].id);

    // A hit breaks concentration
    if ctx.state.combatants[target].casting.is_some() {
        let t = &mut ctx.state.combatants[target];
        t.casting = None;
        t.posture = transition(t.posture, PostureTrigger::CastInterrupted);
        let name = t.name.clone();
        ctx.emit(
            CombatEventKind::CastInterrupted { actor: target_id },
            format!("{}'s seals are broken off!", name),
            Severity::Status,
        );
    }

    let ambush = ctx.state.combatants[actor].tags.remove(TagKind::Disguised).is_some();
    let attacker = &ctx.state.combatants[actor];
    let defender = &ctx.state.combatants[target];
    let mut multiplier = if ambush {
        config.ambush_multiplier
    } else if defender.posture.is_vulnerable() {
        config.exposed_multiplier
    } else {
        1.0
    };
    multiplier *= desperation::damage_multiplier(attacker.desperation_level, config);
    let amount = (raw_damage(attacker, action, power.max(0.0), range) * multiplier).round();

    let was_alive = defender.is_alive();
    let dealt = ctx.state.combatants[target].vitals.take_damage(amount);
    let (a, t) = (ctx.name(actor), ctx.name(target));
    let message = if ambush {
        format!("{} drops the disguise and ambushes {} with {} for {} damage!", a, t, action.name, dealt)
    } else {
        format!("{}'s {} hits {} for {} damage", a, action.name, t, dealt)
    };
    ctx.emit(
        CombatEventKind::Hit {
            attacker: actor_id,
            target: target_id,
            damage: dealt,
        },
        message,
        if ambush || multiplier > 1.0 {
            Severity::Critical
        } else {
            Severity::Hit
        },
    );

    record_exchange(ctx, actor, target, true);
    if was_alive {
        after_damage(ctx, target);
    }
    dealt
}

/// Momentum for a settled exchange
fn record_exchange(ctx: &mut TurnContext<'_>, actor: usize, target: usize, landed: bool) {
    let config = ctx.config;
    if landed {
        if let Some((a, t)) = ctx.state.pair_mut(actor, target) {
            if momentum::on_hit(a, t, config) == MomentumShift::Surge {
                surge(ctx, actor);
            }
        }
    } else {
        momentum::on_miss(&mut ctx.state.combatants[actor]);
    }
}

fn surge(ctx: &mut TurnContext<'_>, index: usize) {
    let id = ctx.state.combatants[index].id;
    let name = ctx.name(index);
    ctx.emit(
        CombatEventKind::MomentumSurge { actor: id },
        format!("{} is on a roll and fights with renewed resolve!", name),
        Severity::Status,
    );
}

/// Desperation and defeat narration after someone lost health
pub(crate) fn after_damage(ctx: &mut TurnContext<'_>, index: usize) {
    let config = ctx.config;
    let c = &mut ctx.state.combatants[index];
    let id = c.id;
    let name = c.name.clone();
    if !c.is_alive() {
        ctx.emit(
            CombatEventKind::Defeated { actor: id },
            format!("{} collapses!", name),
            Severity::Critical,
        );
        return;
    }
    for level in desperation::update(c, config) {
        ctx.emit(
            CombatEventKind::Desperation { actor: id, level },
            match level {
                1 => format!("{} grits their teeth and presses harder", name),
                2 => format!("{} fights with desperate ferocity", name),
                _ => format!("{} throws everything into a last stand!", name),
            },
            Severity::Status,
        );
    }
}

fn apply_grapple(ctx: &mut TurnContext<'_>, actor: usize, target: usize) {
    let actor_id = ctx.state.combatants[actor].id;
    let t = &mut ctx.state.combatants[target];
    t.tags
        .replace(Tag::new(TagKind::Grappled, UNTIL_CLEARED).from_source(actor_id));
    let target_id = t.id;
    let name = t.name.clone();
    ctx.emit(
        CombatEventKind::TagApplied {
            target: Some(target_id),
            kind: TagKind::Grappled,
        },
        format!("{} is pinned in a hold!", name),
        Severity::Status,
    );
    if ctx.state.range() != Range::Engaged {
        set_range(ctx, Range::Engaged);
    }
}

fn set_range(ctx: &mut TurnContext<'_>, range: Range) {
    if ctx.state.battlefield.range == range {
        return;
    }
    ctx.state.battlefield.range = range;
    ctx.emit(
        CombatEventKind::RangeChanged { range },
        format!("The distance shifts to {:?} range", range),
        Severity::Info,
    );
}

/// Apply an action's structured effect; returns whether it took hold
fn apply_effect(
    ctx: &mut TurnContext<'_>,
    actor: usize,
    target: Option<usize>,
    effect: &ActionEffect,
) -> bool {
    match *effect {
        ActionEffect::None => false,
        ActionEffect::ChangeRange { to } => {
            set_range(ctx, to);
            true
        }
        ActionEffect::Reposition { chance, to } => {
            if ctx.rng.chance(chance) {
                set_range(ctx, to);
                true
            } else {
                false
            }
        }
        ActionEffect::ApplyTag { tag, on } => {
            place_tag(ctx, actor, target, tag, on);
            true
        }
        ActionEffect::Contested { check, tag, on } => {
            // Self-effects are contested against the default opponent
            let opponent = target.or_else(|| {
                let id = ctx.state.combatants[actor].id;
                ctx.state
                    .default_target(id)
                    .and_then(|t| ctx.state.index_of(t))
            });
            let success = match opponent {
                Some(opponent) => {
                    let attack = ctx.state.combatants[actor].check_value(&check.attacker);
                    let defend =
                        ctx.state.combatants[opponent].check_value(&check.defender) * ctx.rng.fuzz();
                    attack > defend
                }
                None => true,
            };
            if success {
                place_tag(ctx, actor, target, tag, on);
            } else {
                let name = ctx.name(actor);
                ctx.emit(
                    CombatEventKind::TagApplied {
                        target: None,
                        kind: tag.kind,
                    },
                    format!("{}'s technique fails to take hold", name),
                    Severity::Miss,
                );
            }
            success
        }
    }
}

fn place_tag(
    ctx: &mut TurnContext<'_>,
    actor: usize,
    target: Option<usize>,
    template: TagTemplate,
    on: EffectTarget,
) {
    let actor_id = ctx.state.combatants[actor].id;
    let mut tag = Tag::new(template.kind, template.duration).from_source(actor_id);
    tag.payload = template.payload;

    let (owner, owner_name) = match on {
        EffectTarget::User => {
            ctx.state.combatants[actor].tags.add(tag);
            (Some(actor_id), ctx.name(actor))
        }
        EffectTarget::Target => match target {
            Some(t) => {
                ctx.state.combatants[t].tags.add(tag);
                (Some(ctx.state.combatants[t].id), ctx.name(t))
            }
            None => return,
        },
        EffectTarget::Battlefield => {
            ctx.state.battlefield.tags.add(tag);
            (None, "the battlefield".to_string())
        }
    };
    ctx.emit(
        CombatEventKind::TagApplied {
            target: owner,
            kind: template.kind,
        },
        format!("{} is now affected by {:?}", owner_name, template.kind),
        Severity::Status,
    );
}

/// Disguise detection roll for one observer
pub fn detection_chance(observer: &Combatant, disguised: &Combatant, base: f32) -> f32 {
    (base + (observer.attributes.perception - disguised.attributes.intellect) * 0.01).clamp(0.02, 0.5)
}

/// Roll used by the scheduler; kept here next to the other contests
pub fn detects(observer: &Combatant, disguised: &Combatant, base: f32, rng: &mut dyn RandomSource) -> bool {
    rng.chance(detection_chance(observer, disguised, base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::catalog::{
        ActionCatalog, ESCAPE_GRAPPLE, GUARD, KUNAI_STAB, STRIKE, SUBSTITUTION,
    };
    use crate::combat::host::RecordHost;
    use crate::combat::state::CombatState;
    use crate::core::rng::SequenceRng;
    use crate::records::CharacterRecord;

    fn duel(range: Range) -> CombatState {
        let player = Combatant::new(CombatantId::PLAYER, "Hero", true);
        let foe = Combatant::new(CombatantId(1), "Foe", false);
        CombatState::new(vec![player, foe], range)
    }

    fn host() -> RecordHost {
        RecordHost::new(CharacterRecord::new("Hero", 100.0, 100.0, 100.0))
    }

    #[test]
    fn test_cast_delay_reductions() {
        let catalog = ActionCatalog::standard();
        let chidori = catalog.get("Chidori").unwrap();
        let mut c = Combatant::new(CombatantId::PLAYER, "Hero", true);
        assert_eq!(cast_delay(&c, chidori), 3);
        c.skills.set(Skill::HandSeals, 50);
        assert_eq!(cast_delay(&c, chidori), 1);
        c.known_actions.insert("Chidori".into(), 10);
        assert_eq!(cast_delay(&c, chidori), 0);

        // Mastery only shortens the player's casts
        let mut npc = Combatant::new(CombatantId(1), "Foe", false);
        npc.known_actions.insert("Chidori".into(), 10);
        assert_eq!(cast_delay(&npc, chidori), 3);
    }

    #[test]
    fn test_cost_reduction_caps() {
        let config = CombatConfig::default();
        let catalog = ActionCatalog::standard();
        let fireball = catalog.get("Fireball Jutsu").unwrap();
        let mut c = Combatant::new(CombatantId(1), "Foe", false);
        assert_eq!(effective_costs(&c, fireball, &config).0, 18.0);
        c.skills.set(Skill::ChakraControl, 400);
        assert_eq!(effective_costs(&c, fireball, &config).0, 9.0);
    }

    #[test]
    fn test_strike_damage_and_momentum() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Engaged);
        state.combatants[1].vitals.stamina = 0.0;
        let mut rng = SequenceRng::constant(0.99);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        let outcome = resolve_action(&mut ctx, 0, STRIKE, None);
        // 12 power + strength 30 / 5
        assert_eq!(outcome, Outcome::Hit { damage: 18.0 });
        assert_eq!(state.combatants[1].vitals.health, 82.0);
        assert_eq!(state.combatants[0].momentum, 1);
        assert_eq!(state.combatants[0].vitals.stamina, 95.0);
        assert_eq!(host.skill_usage.len(), 1);
        assert_eq!(state.jutsu_history.len(), 1);
    }

    #[test]
    fn test_complex_jutsu_starts_casting() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Mid);
        state.combatants[1].known_actions.insert("Fireball Jutsu".into(), 1);
        let mut rng = SequenceRng::constant(0.5);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        let outcome = resolve_action(&mut ctx, 1, "Fireball Jutsu", None);
        assert_eq!(outcome, Outcome::Casting { ticks: 2 });
        let foe = &state.combatants[1];
        assert_eq!(foe.posture, Posture::Casting);
        assert_eq!(foe.casting.as_ref().unwrap().target, CombatantId::PLAYER);
        // Costs are paid when the cast completes
        assert_eq!(foe.vitals.chakra, 100.0);
    }

    #[test]
    fn test_guard_restores_stamina() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Mid);
        state.combatants[1].vitals.stamina = 50.0;
        let mut rng = SequenceRng::constant(0.5);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        assert_eq!(resolve_action(&mut ctx, 1, GUARD, None), Outcome::Applied);
        assert_eq!(state.combatants[1].vitals.stamina, 65.0);
        assert_eq!(state.combatants[1].posture, Posture::Guarded);
    }

    #[test]
    fn test_unknown_action_guards() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Mid);
        let mut rng = SequenceRng::constant(0.5);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        assert_eq!(resolve_action(&mut ctx, 1, "Forbidden Scroll", None), Outcome::Applied);
        assert_eq!(state.combatants[1].posture, Posture::Guarded);
    }

    #[test]
    fn test_clone_decoy_absorbs() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Engaged);
        state.combatants[1].tags.add(Tag::new(TagKind::CloneDecoy, 3));
        let mut rng = SequenceRng::constant(0.0);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        assert_eq!(resolve_action(&mut ctx, 0, STRIKE, None), Outcome::Absorbed);
        assert_eq!(state.combatants[1].vitals.health, 100.0);
        assert_eq!(state.combatants[1].tags.get(TagKind::CloneDecoy).unwrap().remaining, 1);
    }

    #[test]
    fn test_disguise_ambush() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Engaged);
        state.combatants[1].vitals.stamina = 0.0;
        state.combatants[0]
            .tags
            .add(Tag::new(TagKind::Disguised, UNTIL_CLEARED));
        let mut rng = SequenceRng::constant(0.99);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        // (12 + 6) * 1.75 = 31.5, rounds to 32
        assert_eq!(resolve_action(&mut ctx, 0, STRIKE, None), Outcome::Hit { damage: 32.0 });
        assert!(!state.combatants[0].has_tag(TagKind::Disguised));
    }

    #[test]
    fn test_hit_interrupts_cast() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Engaged);
        state.combatants[1].casting = Some(CastingState {
            action: "Chidori".into(),
            target: CombatantId::PLAYER,
            ticks_remaining: 2,
        });
        state.combatants[1].posture = Posture::Casting;
        let mut rng = SequenceRng::constant(0.99);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        // Casting defenders cannot react; the hit lands at 1.5x
        assert_eq!(resolve_action(&mut ctx, 0, STRIKE, None), Outcome::Hit { damage: 27.0 });
        assert!(state.combatants[1].casting.is_none());
        assert_eq!(state.combatants[1].posture, Posture::Exposed);
    }

    #[test]
    fn test_grapple_pins_and_closes_range() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Engaged);
        state.combatants[0].skills.set(Skill::Taijutsu, 10);
        state.combatants[1].vitals.stamina = 0.0;
        let mut rng = SequenceRng::constant(0.99);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        assert!(matches!(
            resolve_action(&mut ctx, 0, "Takedown", None),
            Outcome::Hit { .. }
        ));
        let tag = state.combatants[1].tags.get(TagKind::Grappled).unwrap();
        assert_eq!(tag.source, Some(CombatantId::PLAYER));
        assert!(tag.is_persistent());
    }

    #[test]
    fn test_failed_block_lands_reduced() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Engaged);
        // Dodge roll misses, block roll passes, block contest loses at 0.8x
        let mut rng = SequenceRng::new(vec![0.99, 0.0, 0.0]);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        // 12 * 0.6 + strength 30 / 5 = 13.2
        assert_eq!(resolve_action(&mut ctx, 0, STRIKE, None), Outcome::Hit { damage: 13.0 });
        assert_eq!(state.combatants[1].vitals.health, 87.0);
        assert_eq!(state.combatants[1].vitals.stamina, 95.0);
    }

    #[test]
    fn test_substitution_negates_attack() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Engaged);
        state.combatants[0].inventory.insert("Kunai".into(), 1);
        state.combatants[1].known_actions.insert(SUBSTITUTION.into(), 1);
        let mut rng = SequenceRng::constant(0.0);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        assert_eq!(
            resolve_action(&mut ctx, 0, KUNAI_STAB, None),
            Outcome::Negated(Reaction::Substitution)
        );
        let foe = &state.combatants[1];
        assert_eq!(foe.vitals.health, 100.0);
        assert_eq!(foe.vitals.chakra, 90.0);
        assert_eq!(state.combatants[0].item_count("Kunai"), 0);
    }

    #[test]
    fn test_off_element_wall_absorbs_power() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Mid);
        state.combatants[1].known_actions.insert("Earth Wall".into(), 1);
        let mut rng = SequenceRng::constant(0.0);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        let cast = CastingState {
            action: "Fireball Jutsu".into(),
            target: CombatantId(1),
            ticks_remaining: 0,
        };
        // (30 - 24) + perception 30 / 5
        assert_eq!(resolve_cast(&mut ctx, 0, cast), Outcome::Hit { damage: 12.0 });
        assert_eq!(state.combatants[1].vitals.health, 88.0);
        assert_eq!(state.combatants[1].vitals.chakra, 84.0);
        assert_eq!(state.combatants[0].vitals.chakra, 82.0);
    }

    #[test]
    fn test_thrown_weapon_evaded() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Mid);
        state.combatants[0].inventory.insert("Shuriken".into(), 2);
        state.combatants[1].attributes.agility = 60.0;
        let mut rng = SequenceRng::constant(0.5);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        // Evasion (60 + 15) * 0.8 = 60 beats accuracy 30 + 15
        assert_eq!(resolve_action(&mut ctx, 0, "Shuriken Throw", None), Outcome::Evaded);
        assert_eq!(state.combatants[1].vitals.health, 100.0);
        assert_eq!(state.combatants[0].momentum, 0);
        assert!(host
            .events
            .iter()
            .any(|e| matches!(e.kind, CombatEventKind::Missed { .. })));
    }

    #[test]
    fn test_escape_breaks_hold() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Engaged);
        state.combatants[0].attributes.strength = 60.0;
        state.combatants[0]
            .tags
            .add(Tag::new(TagKind::Grappled, UNTIL_CLEARED).from_source(CombatantId(1)));
        let mut rng = SequenceRng::constant(0.5);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        assert_eq!(resolve_action(&mut ctx, 0, ESCAPE_GRAPPLE, None), Outcome::Applied);
        assert!(!state.combatants[0].is_grappled());
        assert_eq!(state.combatants[0].vitals.stamina, 92.0);
        assert!(host
            .events
            .iter()
            .any(|e| matches!(e.kind, CombatEventKind::GrappleEscaped { .. })));
    }

    #[test]
    fn test_fireball_leaves_burning() {
        let catalog = ActionCatalog::standard();
        let config = CombatConfig::default();
        let mut state = duel(Range::Mid);
        // Low fuzz: evasion 36 against accuracy 45, and the burn contest wins
        let mut rng = SequenceRng::constant(0.0);
        let mut host = host();
        let mut ctx = TurnContext {
            state: &mut state,
            catalog: &catalog,
            config: &config,
            rng: &mut rng,
            host: &mut host,
        };
        let cast = CastingState {
            action: "Fireball Jutsu".into(),
            target: CombatantId(1),
            ticks_remaining: 0,
        };
        assert_eq!(resolve_cast(&mut ctx, 0, cast), Outcome::Hit { damage: 36.0 });
        let burning = state.combatants[1].tags.get(TagKind::Burning).unwrap();
        assert_eq!(burning.remaining, 3);
        assert_eq!(burning.payload, Some(4.0));
        assert_eq!(burning.source, Some(CombatantId::PLAYER));
    }

    #[test]
    fn test_evasion_modifiers() {
        let catalog = ActionCatalog::standard();
        let c = Combatant::new(CombatantId(1), "Foe", false);
        let fireball = catalog.get("Fireball Jutsu").unwrap();
        let annihilation = catalog.get("Great Fire Annihilation").unwrap();
        assert_eq!(evasion(&c, fireball, false), 45.0);
        assert!((evasion(&c, annihilation, false) - 27.0).abs() < 1e-4);
        assert!((evasion(&c, fireball, true) - 56.25).abs() < 1e-4);
    }

    #[test]
    fn test_detection_chance_clamped() {
        let mut observer = Combatant::new(CombatantId::PLAYER, "Hero", true);
        let disguised = Combatant::new(CombatantId(1), "Foe", false);
        assert!((detection_chance(&observer, &disguised, 0.05) - 0.05).abs() < 1e-6);
        observer.attributes.perception = 200.0;
        assert_eq!(detection_chance(&observer, &disguised, 0.05), 0.5);
        observer.attributes.perception = 0.0;
        assert_eq!(detection_chance(&observer, &disguised, 0.05), 0.02);
    }
}

//! Per-entity attack sessions.
//!
//! Each acting entity has an [`AttackSession`] moving through
//! `Idle -> ModeSelected -> Resolving -> Bound -> Executing -> Idle`.
//! [`SessionManager`] owns every session and is the only place sessions are
//! created or destroyed, through its spawn and despawn hooks.
//!
//! The host runtime is reached only through [`CombatHost`]: it reports
//! stamina and energy, installs bindings, and schedules the attack. Once an
//! attack is scheduled the host drives the rest via the start, hit, stop and
//! abort callbacks.

use crate::binding::{BaseController, OverrideBinding, WeaponSlot};
use crate::context::EquipmentState;
use crate::engine::{AttackEngine, ResolvedAttack};
use crate::error::TriggerRejection;
use crate::ids::EntityId;
use crate::timing::TimingProfile;
use crate::weapon::{AttackMode, EquippedItem, WeaponCategory};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Narrow adapter over the host's combat runtime.
pub trait CombatHost {
    fn stamina(&self, entity: EntityId) -> f32;

    fn energy(&self, entity: EntityId) -> f32;

    /// Multipliers the host's skills and equipment apply to stamina and
    /// energy costs. Cooldowns are never modified.
    fn cost_modifiers(&self, _entity: EntityId, _category: WeaponCategory) -> (f32, f32) {
        (1.0, 1.0)
    }

    /// Deduct resources for an attack that is about to start.
    fn consume(&mut self, entity: EntityId, stamina: f32, energy: f32);

    /// Install `binding` on the entity's animation controller.
    fn install_binding(&mut self, entity: EntityId, binding: Arc<OverrideBinding>);

    /// Push timings into the entity's upcoming attack.
    fn schedule_attack(&mut self, entity: EntityId, timing: &TimingProfile);
}

/// Lifecycle state of an [`AttackSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttackState {
    #[default]
    Idle,
    ModeSelected,
    Resolving,
    Bound,
    Executing,
}

impl AttackState {
    /// True between a successful trigger and the stop or abort callback.
    pub fn is_attacking(&self) -> bool {
        !matches!(self, AttackState::Idle)
    }
}

/// Attack state of one entity.
#[derive(Debug, Clone)]
pub struct AttackSession {
    entity: EntityId,
    base: BaseController,
    state: AttackState,
    mode: AttackMode,
    /// Time at which each mode becomes available again.
    ready_at: HashMap<AttackMode, f64>,
    current: Option<ResolvedAttack>,
    hits: u32,
}

impl AttackSession {
    fn new(entity: EntityId, base: BaseController) -> Self {
        Self {
            entity,
            base,
            state: AttackState::Idle,
            mode: AttackMode::Normal,
            ready_at: HashMap::new(),
            current: None,
            hits: 0,
        }
    }

    /// Entity this session belongs to.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// The entity's base controller.
    pub fn base(&self) -> &BaseController {
        &self.base
    }

    /// Current state in the attack lifecycle.
    pub fn state(&self) -> AttackState {
        self.state
    }

    /// The selected mode; `Normal` while idle.
    pub fn mode(&self) -> AttackMode {
        self.mode
    }

    /// The attack in progress, if any.
    pub fn current_attack(&self) -> Option<&ResolvedAttack> {
        self.current.as_ref()
    }

    /// Hits reported for the current (or most recently finished) attack.
    pub fn hit_count(&self) -> u32 {
        self.hits
    }

    /// Seconds until `mode` may be triggered again; zero when ready.
    pub fn cooldown_remaining(&self, mode: AttackMode, now: f64) -> f32 {
        self.ready_at
            .get(&mode)
            .map_or(0.0, |ready_at| (ready_at - now).max(0.0) as f32)
    }

    fn transition(&mut self, to: AttackState) {
        debug!(entity = %self.entity, from = ?self.state, to = ?to, "attack state");
        self.state = to;
    }

    fn reset(&mut self) {
        self.transition(AttackState::Idle);
        self.mode = AttackMode::Normal;
        self.current = None;
    }
}

/// Owns every entity's [`AttackSession`].
///
/// # Examples
///
/// ```rust
/// use extra_attacks::binding::{BaseController, OverrideBinding};
/// use extra_attacks::engine::AttackEngine;
/// use extra_attacks::session::{AttackState, CombatHost, SessionManager};
/// use extra_attacks::source::ClipCatalog;
/// use extra_attacks::timing::TimingProfile;
/// use extra_attacks::*;
/// use std::sync::Arc;
///
/// struct Host;
///
/// impl CombatHost for Host {
///     fn stamina(&self, _: EntityId) -> f32 { 100.0 }
///     fn energy(&self, _: EntityId) -> f32 { 0.0 }
///     fn consume(&mut self, _: EntityId, _: f32, _: f32) {}
///     fn install_binding(&mut self, _: EntityId, _: Arc<OverrideBinding>) {}
///     fn schedule_attack(&mut self, _: EntityId, _: &TimingProfile) {}
/// }
///
/// let mut engine = AttackEngine::new(Arc::new(ClipCatalog::empty()));
/// let mut sessions = SessionManager::new();
/// let player = EntityId(1);
/// sessions.spawn(player, BaseController::new("player", vec![]), &engine, &mut Host);
///
/// let axe = EquippedItem::new("AxeBronze", "Bronze axe", SkillFamily::Axes, false);
/// let state = EquipmentState::for_item(&axe);
/// let plan = sessions
///     .trigger(player, AttackMode::ModeA, &axe, &state, 0.0, &mut engine, &mut Host)
///     .unwrap();
///
/// assert_eq!(plan.cost.stamina_cost, 20.0);
/// assert_eq!(sessions.session(player).unwrap().state(), AttackState::Bound);
/// assert!(sessions.cooldown_remaining(player, AttackMode::ModeA, 1.0) > 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    sessions: HashMap<EntityId, AttackSession>,
}

impl SessionManager {
    /// Create a manager with no sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the session for a newly spawned entity and install its
    /// baseline binding. An existing session for `entity` is replaced.
    pub fn spawn(
        &mut self,
        entity: EntityId,
        base: BaseController,
        engine: &AttackEngine,
        host: &mut dyn CombatHost,
    ) {
        host.install_binding(entity, engine.baseline_binding(entity, &base));
        self.sessions.insert(entity, AttackSession::new(entity, base));
        debug!(entity = %entity, "attack session spawned");
    }

    /// Destroy the session of a despawned entity and evict its cached
    /// bindings.
    pub fn despawn(&mut self, entity: EntityId, engine: &AttackEngine) -> Option<AttackSession> {
        let session = self.sessions.remove(&entity)?;
        engine.bindings().evict_owner(entity);
        debug!(entity = %entity, "attack session despawned");
        Some(session)
    }

    /// The session of `entity`, if spawned.
    pub fn session(&self, entity: EntityId) -> Option<&AttackSession> {
        self.sessions.get(&entity)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Seconds until `entity` may trigger `mode` again; zero when ready or
    /// when the entity has no session.
    pub fn cooldown_remaining(&self, entity: EntityId, mode: AttackMode, now: f64) -> f32 {
        self.sessions
            .get(&entity)
            .map_or(0.0, |session| session.cooldown_remaining(mode, now))
    }

    /// Request an extra attack.
    ///
    /// Gates are checked in order: known entity, extra mode, not already
    /// attacking, not on cooldown, item has a secondary attack, item not
    /// excluded, enough stamina, enough energy. On success resources are
    /// consumed, the mode's cooldown is armed at `now`, the binding is
    /// installed and the timings are scheduled; the session is left `Bound`.
    #[allow(clippy::too_many_arguments)]
    pub fn trigger(
        &mut self,
        entity: EntityId,
        mode: AttackMode,
        item: &EquippedItem,
        equipment: &EquipmentState,
        now: f64,
        engine: &mut AttackEngine,
        host: &mut dyn CombatHost,
    ) -> Result<ResolvedAttack, TriggerRejection> {
        let result = self.try_trigger(entity, mode, item, equipment, now, engine, host);
        if let Err(rejection) = &result {
            debug!(entity = %entity, mode = %mode, reason = %rejection, "trigger rejected");
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn try_trigger(
        &mut self,
        entity: EntityId,
        mode: AttackMode,
        item: &EquippedItem,
        equipment: &EquipmentState,
        now: f64,
        engine: &mut AttackEngine,
        host: &mut dyn CombatHost,
    ) -> Result<ResolvedAttack, TriggerRejection> {
        let session = self
            .sessions
            .get_mut(&entity)
            .ok_or(TriggerRejection::UnknownEntity(entity))?;

        if !mode.is_extra() {
            return Err(TriggerRejection::NormalMode);
        }
        if session.state.is_attacking() {
            return Err(TriggerRejection::AlreadyAttacking);
        }
        let remaining = session.cooldown_remaining(mode, now);
        if remaining > 0.0 {
            return Err(TriggerRejection::OnCooldown { mode, remaining });
        }
        if !item.has_secondary_attack() {
            return Err(TriggerRejection::NoSecondaryAttack);
        }
        if engine.is_excluded(item) {
            return Err(TriggerRejection::Excluded(item.id().clone()));
        }

        let (stamina_mult, energy_mult) = host.cost_modifiers(entity, equipment.category);
        let cost = engine
            .cost(equipment.category, mode)
            .with_modifiers(stamina_mult, energy_mult);
        let stamina = host.stamina(entity);
        if stamina < cost.stamina_cost {
            return Err(TriggerRejection::InsufficientStamina {
                required: cost.stamina_cost,
                available: stamina,
            });
        }
        let energy = host.energy(entity);
        if energy < cost.energy_cost {
            return Err(TriggerRejection::InsufficientEnergy {
                required: cost.energy_cost,
                available: energy,
            });
        }

        session.mode = mode;
        session.transition(AttackState::ModeSelected);
        session.ready_at.insert(mode, now + f64::from(cost.cooldown_seconds));
        session.hits = 0;

        session.transition(AttackState::Resolving);
        let slot = if item.is_two_handed() {
            WeaponSlot::BothHands
        } else {
            WeaponSlot::MainHand
        };
        let mut attack = engine.resolve_attack(entity, slot, &session.base, equipment, mode);
        attack.cost = cost;

        host.consume(entity, cost.stamina_cost, cost.energy_cost);
        host.install_binding(entity, Arc::clone(&attack.binding));
        host.schedule_attack(entity, &attack.timing);
        session.transition(AttackState::Bound);
        session.current = Some(attack.clone());

        Ok(attack)
    }

    /// The host started playing the attack. Returns false if `entity` had
    /// no bound attack.
    pub fn on_attack_start(&mut self, entity: EntityId) -> bool {
        match self.sessions.get_mut(&entity) {
            Some(session) if session.state == AttackState::Bound => {
                session.transition(AttackState::Executing);
                true
            }
            _ => false,
        }
    }

    /// The attack connected. Returns the hit count so far.
    pub fn on_attack_hit(&mut self, entity: EntityId) -> Option<u32> {
        let session = self.sessions.get_mut(&entity)?;
        if session.state != AttackState::Executing {
            return None;
        }
        session.hits += 1;
        Some(session.hits)
    }

    /// The attack finished. The session returns to `Idle` in `Normal` mode
    /// and the baseline binding is reinstalled. The cooldown is unaffected.
    pub fn on_attack_stop(&mut self, entity: EntityId, engine: &AttackEngine, host: &mut dyn CombatHost) -> bool {
        let Some(session) = self.sessions.get_mut(&entity) else {
            return false;
        };
        if !session.state.is_attacking() {
            return false;
        }
        session.reset();
        host.install_binding(entity, engine.baseline_binding(entity, &session.base));
        true
    }

    /// The attack was interrupted. Same transition as
    /// [`SessionManager::on_attack_stop`]; resources and cooldown stay spent.
    pub fn on_attack_abort(&mut self, entity: EntityId, engine: &AttackEngine, host: &mut dyn CombatHost) -> bool {
        self.on_attack_stop(entity, engine, host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ClipName;
    use crate::source::ClipCatalog;
    use crate::weapon::SkillFamily;

    #[derive(Default)]
    struct RecordingHost {
        stamina: f32,
        installed: Vec<Arc<OverrideBinding>>,
        scheduled: usize,
    }

    impl CombatHost for RecordingHost {
        fn stamina(&self, _: EntityId) -> f32 {
            self.stamina
        }

        fn energy(&self, _: EntityId) -> f32 {
            0.0
        }

        fn consume(&mut self, _: EntityId, stamina: f32, _: f32) {
            self.stamina -= stamina;
        }

        fn install_binding(&mut self, _: EntityId, binding: Arc<OverrideBinding>) {
            self.installed.push(binding);
        }

        fn schedule_attack(&mut self, _: EntityId, _: &TimingProfile) {
            self.scheduled += 1;
        }
    }

    fn setup() -> (AttackEngine, SessionManager, RecordingHost) {
        let engine = AttackEngine::new(Arc::new(ClipCatalog::empty()));
        let mut sessions = SessionManager::new();
        let mut host = RecordingHost {
            stamina: 100.0,
            ..RecordingHost::default()
        };
        let base = BaseController::new("player", vec![ClipName::new("sword_secondary")]);
        sessions.spawn(EntityId(1), base, &engine, &mut host);
        (engine, sessions, host)
    }

    fn sword() -> EquippedItem {
        EquippedItem::new("SwordIron", "Iron sword", SkillFamily::Swords, false)
    }

    #[test]
    fn test_full_lifecycle() {
        let (mut engine, mut sessions, mut host) = setup();
        let item = sword();
        let state = EquipmentState::for_item(&item);
        let player = EntityId(1);

        sessions
            .trigger(player, AttackMode::ModeA, &item, &state, 0.0, &mut engine, &mut host)
            .unwrap();
        assert_eq!(host.stamina, 80.0);
        assert_eq!(host.scheduled, 1);
        assert_eq!(sessions.session(player).unwrap().mode(), AttackMode::ModeA);

        assert!(sessions.on_attack_start(player));
        assert_eq!(sessions.on_attack_hit(player), Some(1));
        assert_eq!(sessions.on_attack_hit(player), Some(2));
        assert!(sessions.on_attack_stop(player, &engine, &mut host));

        let session = sessions.session(player).unwrap();
        assert_eq!(session.state(), AttackState::Idle);
        assert_eq!(session.mode(), AttackMode::Normal);
        assert_eq!(session.hit_count(), 2);
        // Spawn, trigger, stop.
        assert_eq!(host.installed.len(), 3);
        assert!(host.installed[2].is_passthrough());
    }

    #[test]
    fn test_already_attacking() {
        let (mut engine, mut sessions, mut host) = setup();
        let item = sword();
        let state = EquipmentState::for_item(&item);

        sessions
            .trigger(EntityId(1), AttackMode::ModeA, &item, &state, 0.0, &mut engine, &mut host)
            .unwrap();
        let err = sessions
            .trigger(EntityId(1), AttackMode::ModeB, &item, &state, 0.0, &mut engine, &mut host)
            .unwrap_err();
        assert_eq!(err, TriggerRejection::AlreadyAttacking);
    }

    #[test]
    fn test_cooldown_armed_at_trigger() {
        let (mut engine, mut sessions, mut host) = setup();
        let item = sword();
        let state = EquipmentState::for_item(&item);
        let player = EntityId(1);

        sessions
            .trigger(player, AttackMode::ModeA, &item, &state, 10.0, &mut engine, &mut host)
            .unwrap();
        sessions.on_attack_abort(player, &engine, &mut host);

        let err = sessions
            .trigger(player, AttackMode::ModeA, &item, &state, 11.0, &mut engine, &mut host)
            .unwrap_err();
        assert!(matches!(err, TriggerRejection::OnCooldown { mode: AttackMode::ModeA, .. }));

        // Other modes have their own cooldowns.
        assert!(sessions
            .trigger(player, AttackMode::ModeB, &item, &state, 11.0, &mut engine, &mut host)
            .is_ok());
        assert_eq!(sessions.cooldown_remaining(player, AttackMode::ModeA, 12.5), 0.0);
    }

    #[test]
    fn test_gate_rejections() {
        let (mut engine, mut sessions, mut host) = setup();
        let item = sword();
        let state = EquipmentState::for_item(&item);

        let err = sessions
            .trigger(EntityId(1), AttackMode::Normal, &item, &state, 0.0, &mut engine, &mut host)
            .unwrap_err();
        assert_eq!(err, TriggerRejection::NormalMode);

        let err = sessions
            .trigger(EntityId(9), AttackMode::ModeA, &item, &state, 0.0, &mut engine, &mut host)
            .unwrap_err();
        assert_eq!(err, TriggerRejection::UnknownEntity(EntityId(9)));

        let plain = sword().without_secondary_attack();
        let err = sessions
            .trigger(EntityId(1), AttackMode::ModeA, &plain, &state, 0.0, &mut engine, &mut host)
            .unwrap_err();
        assert_eq!(err, TriggerRejection::NoSecondaryAttack);

        host.stamina = 5.0;
        let err = sessions
            .trigger(EntityId(1), AttackMode::ModeA, &item, &state, 0.0, &mut engine, &mut host)
            .unwrap_err();
        assert!(matches!(err, TriggerRejection::InsufficientStamina { .. }));

        // Rejections leave the session idle.
        assert_eq!(sessions.session(EntityId(1)).unwrap().state(), AttackState::Idle);
    }

    #[test]
    fn test_despawn_evicts_bindings() {
        let (mut engine, mut sessions, mut host) = setup();
        let item = sword();
        let state = EquipmentState::for_item(&item);

        sessions
            .trigger(EntityId(1), AttackMode::ModeA, &item, &state, 0.0, &mut engine, &mut host)
            .unwrap();
        assert_eq!(engine.bindings().len(), 2);

        assert!(sessions.despawn(EntityId(1), &engine).is_some());
        assert!(sessions.is_empty());
        // Only the baseline survives eviction.
        assert_eq!(engine.bindings().len(), 1);
        assert!(sessions.despawn(EntityId(1), &engine).is_none());
    }

    #[test]
    fn test_callbacks_ignored_when_idle() {
        let (engine, mut sessions, mut host) = setup();
        assert!(!sessions.on_attack_start(EntityId(1)));
        assert_eq!(sessions.on_attack_hit(EntityId(1)), None);
        assert!(!sessions.on_attack_stop(EntityId(1), &engine, &mut host));
    }
}

use extra_attacks::binding::{BaseController, OverrideBinding};
use extra_attacks::config::{ConfigSet, DocumentSource};
use extra_attacks::error::DocumentKind;
use extra_attacks::source::ClipCatalog;
use extra_attacks::timing::TimingProfile;
use extra_attacks::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Host double tracking per-entity resources and what was pushed to it.
#[derive(Default)]
struct Host {
    stamina: HashMap<EntityId, f32>,
    energy: HashMap<EntityId, f32>,
    stamina_multiplier: f32,
    installed: HashMap<EntityId, Arc<OverrideBinding>>,
    scheduled: Vec<(EntityId, TimingProfile)>,
}

impl Host {
    fn with_entities(entities: &[EntityId]) -> Self {
        let mut host = Host {
            stamina_multiplier: 1.0,
            ..Host::default()
        };
        for entity in entities {
            host.stamina.insert(*entity, 100.0);
            host.energy.insert(*entity, 10.0);
        }
        host
    }
}

impl CombatHost for Host {
    fn stamina(&self, entity: EntityId) -> f32 {
        self.stamina.get(&entity).copied().unwrap_or(0.0)
    }

    fn energy(&self, entity: EntityId) -> f32 {
        self.energy.get(&entity).copied().unwrap_or(0.0)
    }

    fn cost_modifiers(&self, _: EntityId, _: WeaponCategory) -> (f32, f32) {
        (self.stamina_multiplier, 1.0)
    }

    fn consume(&mut self, entity: EntityId, stamina: f32, energy: f32) {
        *self.stamina.entry(entity).or_default() -= stamina;
        *self.energy.entry(entity).or_default() -= energy;
    }

    fn install_binding(&mut self, entity: EntityId, binding: Arc<OverrideBinding>) {
        self.installed.insert(entity, binding);
    }

    fn schedule_attack(&mut self, entity: EntityId, timing: &TimingProfile) {
        self.scheduled.push((entity, *timing));
    }
}

const PLAYER: EntityId = EntityId(1);
const COMPANION: EntityId = EntityId(2);

fn config() -> ConfigSet {
    ConfigSet::new()
        .with(DocumentSource::toml(
            DocumentKind::Categories,
            r#"
                [ModeB_GreatSwords]
                greatsword_secondary = "GreatswordSlam"
            "#,
        ))
        .with(DocumentSource::toml(
            DocumentKind::Costs,
            r#"
                [costs.Knives.ModeC]
                stamina = 10.0
                energy = 25.0
            "#,
        ))
        .with(DocumentSource::toml(
            DocumentKind::Exclusions,
            r#"
                names = ["Fishing Rod"]
            "#,
        ))
}

fn setup() -> (AttackEngine, SessionManager, Host) {
    let clips: ClipCatalog = [(ClipName::new("GreatswordSlam"), 2.5)].into_iter().collect();
    let (engine, report) = AttackEngine::with_config(Arc::new(clips), &config());
    assert!(report.is_clean());

    let mut host = Host::with_entities(&[PLAYER, COMPANION]);
    let mut sessions = SessionManager::new();
    for entity in [PLAYER, COMPANION] {
        let base = BaseController::new("humanoid", vec![ClipName::new("greatsword_secondary")]);
        sessions.spawn(entity, base, &engine, &mut host);
    }
    (engine, sessions, host)
}

fn greatsword() -> EquippedItem {
    EquippedItem::new("SwordGreatIron", "Iron greatsword", SkillFamily::Swords, true)
}

#[test]
fn test_heavy_attack_flow() {
    let (mut engine, mut sessions, mut host) = setup();
    let item = greatsword();
    let state = EquipmentState::for_item(&item);

    let attack = sessions
        .trigger(PLAYER, AttackMode::ModeB, &item, &state, 0.0, &mut engine, &mut host)
        .unwrap();

    assert_eq!(attack.category, WeaponCategory::GreatSwords);
    assert_eq!(attack.cost.stamina_cost, 35.0);
    assert_eq!(host.stamina(PLAYER), 65.0);
    assert!(!host.installed[&PLAYER].is_passthrough());
    assert_eq!(host.scheduled.len(), 1);
    assert_eq!(host.scheduled[0].1.clip_length, 2.5);

    assert!(sessions.on_attack_start(PLAYER));
    assert_eq!(sessions.session(PLAYER).unwrap().state(), AttackState::Executing);
    assert!(sessions.on_attack_stop(PLAYER, &engine, &mut host));
    assert!(host.installed[&PLAYER].is_passthrough());

    // Cooldown outlives the attack.
    assert!((sessions.cooldown_remaining(PLAYER, AttackMode::ModeB, 1.0) - 5.0).abs() < 1e-4);
}

#[test]
fn test_entities_have_independent_sessions() {
    let (mut engine, mut sessions, mut host) = setup();
    let item = greatsword();
    let state = EquipmentState::for_item(&item);

    sessions
        .trigger(PLAYER, AttackMode::ModeB, &item, &state, 0.0, &mut engine, &mut host)
        .unwrap();
    // The companion is neither attacking nor on cooldown.
    let companion = sessions
        .trigger(COMPANION, AttackMode::ModeB, &item, &state, 0.0, &mut engine, &mut host)
        .unwrap();

    // Same scope, separate cache identities.
    assert!(!Arc::ptr_eq(&companion.binding, &host.installed[&PLAYER]));
    let player_attack = sessions.session(PLAYER).unwrap().current_attack().unwrap();
    assert_eq!(companion.resolution.scope, player_attack.resolution.scope);
}

#[test]
fn test_excluded_item_is_rejected() {
    let (mut engine, mut sessions, mut host) = setup();
    let rod = EquippedItem::new("FishingRod", "fishing rod", SkillFamily::Polearms, true);
    let state = EquipmentState::for_item(&rod);

    let err = sessions
        .trigger(PLAYER, AttackMode::ModeA, &rod, &state, 0.0, &mut engine, &mut host)
        .unwrap_err();
    assert_eq!(err, TriggerRejection::Excluded(ItemId::new("FishingRod")));
    assert!(host.scheduled.is_empty());
}

#[test]
fn test_energy_gate_and_cost_modifiers() {
    let (mut engine, mut sessions, mut host) = setup();
    let knife = EquippedItem::new("KnifeFlint", "Flint knife", SkillFamily::Knives, false);
    let state = EquipmentState::for_item(&knife);

    let err = sessions
        .trigger(PLAYER, AttackMode::ModeC, &knife, &state, 0.0, &mut engine, &mut host)
        .unwrap_err();
    assert_eq!(
        err,
        TriggerRejection::InsufficientEnergy {
            required: 25.0,
            available: 10.0
        }
    );

    // A rejected trigger arms no cooldown.
    assert_eq!(sessions.cooldown_remaining(PLAYER, AttackMode::ModeC, 0.0), 0.0);

    host.energy.insert(PLAYER, 50.0);
    host.stamina_multiplier = 0.5;
    let attack = sessions
        .trigger(PLAYER, AttackMode::ModeC, &knife, &state, 0.0, &mut engine, &mut host)
        .unwrap();
    assert_eq!(attack.cost.stamina_cost, 5.0);
    assert_eq!(host.stamina(PLAYER), 95.0);
    assert_eq!(host.energy(PLAYER), 25.0);
    // Modifiers never touch the cooldown.
    assert_eq!(attack.cost.cooldown_seconds, 2.0);
}

#[test]
fn test_reload_between_attacks_keeps_baseline() {
    let (mut engine, mut sessions, mut host) = setup();
    let item = greatsword();
    let state = EquipmentState::for_item(&item);

    sessions
        .trigger(PLAYER, AttackMode::ModeB, &item, &state, 0.0, &mut engine, &mut host)
        .unwrap();
    sessions.on_attack_stop(PLAYER, &engine, &mut host);
    let baseline = Arc::clone(&host.installed[&PLAYER]);

    let report = engine.reload(&config());
    assert!(report.is_clean());
    assert_eq!(engine.bindings().len(), 1);

    sessions
        .trigger(PLAYER, AttackMode::ModeA, &item, &state, 1.0, &mut engine, &mut host)
        .unwrap();
    sessions.on_attack_abort(PLAYER, &engine, &mut host);
    assert!(Arc::ptr_eq(&baseline, &host.installed[&PLAYER]));
}

#[test]
fn test_despawned_entity_cannot_trigger() {
    let (mut engine, mut sessions, mut host) = setup();
    let item = greatsword();
    let state = EquipmentState::for_item(&item);

    let session = sessions.despawn(COMPANION, &engine).unwrap();
    assert_eq!(session.entity(), COMPANION);
    assert_eq!(sessions.len(), 1);

    let err = sessions
        .trigger(COMPANION, AttackMode::ModeA, &item, &state, 0.0, &mut engine, &mut host)
        .unwrap_err();
    assert_eq!(err, TriggerRejection::UnknownEntity(COMPANION));
}

#[test]
fn test_despawn_releases_baseline_before_reload() {
    let (mut engine, mut sessions, mut host) = setup();
    let item = greatsword();
    let state = EquipmentState::for_item(&item);
    sessions
        .trigger(PLAYER, AttackMode::ModeB, &item, &state, 0.0, &mut engine, &mut host)
        .unwrap();

    sessions.despawn(PLAYER, &engine);
    sessions.despawn(COMPANION, &engine);
    assert!(sessions.is_empty());

    engine.reload(&ConfigSet::new());
    assert!(engine.bindings().is_empty());
    assert_eq!(engine.bindings().baseline(), None);
}

//! Session example: the attack lifecycle against a host
//!
//! This example demonstrates:
//! - Implementing `CombatHost` for a game's character state
//! - Triggering an extra attack and driving it through its callbacks
//! - Trigger gates: cooldown and insufficient stamina

use extra_attacks::binding::{BaseController, OverrideBinding};
use extra_attacks::config::{ConfigSet, DocumentSource};
use extra_attacks::error::DocumentKind;
use extra_attacks::source::ClipCatalog;
use extra_attacks::timing::TimingProfile;
use extra_attacks::*;
use std::sync::Arc;

/// A single character with a stamina pool.
struct Character {
    stamina: f32,
    energy: f32,
    installed: Option<Arc<OverrideBinding>>,
}

impl CombatHost for Character {
    fn stamina(&self, _: EntityId) -> f32 {
        self.stamina
    }

    fn energy(&self, _: EntityId) -> f32 {
        self.energy
    }

    fn consume(&mut self, _: EntityId, stamina: f32, energy: f32) {
        self.stamina -= stamina;
        self.energy -= energy;
    }

    fn install_binding(&mut self, entity: EntityId, binding: Arc<OverrideBinding>) {
        println!(
            "  [host] {} installs binding for {} ({} substitutions)",
            entity,
            binding.scope(),
            binding.substitutions().len()
        );
        self.installed = Some(binding);
    }

    fn schedule_attack(&mut self, entity: EntityId, timing: &TimingProfile) {
        println!(
            "  [host] {} schedules hit at {:.3}s of {:.3}s",
            entity, timing.hit_time, timing.clip_length
        );
    }
}

fn main() -> Result<(), ConfigError> {
    let catalog: ClipCatalog = [(ClipName::new("GreatswordSlam"), 2.5)].into_iter().collect();
    let config = ConfigSet::defaults()?.with(DocumentSource::toml(
        DocumentKind::Categories,
        r#"
            [ModeB_GreatSwords]
            greatsword_secondary = "GreatswordSlam"
        "#,
    ));
    let (mut engine, _) = AttackEngine::with_config(Arc::new(catalog), &config);

    let player = EntityId(1);
    let mut host = Character {
        stamina: 60.0,
        energy: 0.0,
        installed: None,
    };
    let mut sessions = SessionManager::new();

    println!("Spawning {}:", player);
    let base = BaseController::new("humanoid", vec![ClipName::new("greatsword_secondary")]);
    sessions.spawn(player, base, &engine, &mut host);

    let sword = EquippedItem::new("SwordGreatIron", "Iron greatsword", SkillFamily::Swords, true);
    let state = EquipmentState::for_item(&sword);

    println!("\nTriggering {} at t=0.0:", AttackMode::ModeB);
    match sessions.trigger(player, AttackMode::ModeB, &sword, &state, 0.0, &mut engine, &mut host) {
        Ok(attack) => println!(
            "  stamina spent: {:.1}, remaining: {:.1}",
            attack.cost.stamina_cost, host.stamina
        ),
        Err(rejection) => println!("  rejected: {}", rejection),
    }

    // The host's animation runtime reports back
    sessions.on_attack_start(player);
    if let Some(hits) = sessions.on_attack_hit(player) {
        println!("  hit #{}", hits);
    }
    sessions.on_attack_stop(player, &engine, &mut host);
    if let Some(session) = sessions.session(player) {
        println!("  state after stop: {:?}", session.state());
    }

    println!("\nTriggering again at t=1.0:");
    if let Err(rejection) = sessions.trigger(player, AttackMode::ModeB, &sword, &state, 1.0, &mut engine, &mut host) {
        println!("  rejected: {}", rejection);
    }

    println!("\nTriggering after the cooldown at t=10.0:");
    if let Err(rejection) = sessions.trigger(player, AttackMode::ModeB, &sword, &state, 10.0, &mut engine, &mut host) {
        println!("  rejected: {}", rejection);
    }

    sessions.despawn(player, &engine);
    println!("\nCached bindings after despawn: {}", engine.bindings().len());

    Ok(())
}

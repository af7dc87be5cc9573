//! Basic example: scope resolution, timing scaling and a config reload
//!
//! This example demonstrates:
//! - Loading category and item replacement documents
//! - Resolving an extra attack for a category and for a specific item
//! - Reloading configuration and watching the resolution change

use extra_attacks::binding::{BaseController, WeaponSlot};
use extra_attacks::config::{ConfigSet, DocumentSource};
use extra_attacks::error::DocumentKind;
use extra_attacks::source::ClipCatalog;
use extra_attacks::*;
use std::sync::Arc;

fn print_attack(label: &str, attack: &ResolvedAttack) {
    println!("\n=== {} ===", label);
    println!("Scope: {}", attack.resolution.scope);
    println!("Trail: {}", attack.resolution.trail());
    for sub in attack.binding.substitutions() {
        println!("  {} -> {}", sub.reference, sub.replacement);
    }
    println!(
        "Clip length: {:.3}s, hit at {:.3}s ({:?})",
        attack.timing.clip_length, attack.timing.hit_time, attack.timing.basis
    );
    println!(
        "Cost: {:.1} stamina, {:.1} energy, {:.1}s cooldown",
        attack.cost.stamina_cost, attack.cost.energy_cost, attack.cost.cooldown_seconds
    );
}

fn main() -> Result<(), ConfigError> {
    // Clips the asset loader shipped, with their lengths
    let catalog: ClipCatalog = [
        (ClipName::new("AxeSpin"), 2.0),
        (ClipName::new("BronzeChop"), 2.8),
        (ClipName::new("AxeOverhead"), 1.6),
    ]
    .into_iter()
    .collect();

    let categories = DocumentSource::toml(
        DocumentKind::Categories,
        r#"
            [ModeA_Axes]
            axe_secondary = "AxeSpin"
        "#,
    );
    let items = DocumentSource::toml(
        DocumentKind::Items,
        r#"
            [ModeA_AxeBronze]
            axe_secondary = "BronzeChop"
        "#,
    );

    // Start from the built-in timing and cost documents
    let config = ConfigSet::defaults()?.with(categories).with(items);
    let (mut engine, report) = AttackEngine::with_config(Arc::new(catalog), &config);
    println!("Initial load clean: {}", report.is_clean());

    let base = BaseController::new("player", vec![ClipName::new("axe_secondary")]);
    let player = EntityId(1);

    let iron = EquippedItem::new("AxeIron", "Iron axe", SkillFamily::Axes, false);
    let bronze = EquippedItem::new("AxeBronze", "Bronze axe", SkillFamily::Axes, false);

    let attack = engine.resolve_attack(
        player,
        WeaponSlot::MainHand,
        &base,
        &EquipmentState::for_item(&iron),
        AttackMode::ModeA,
    );
    print_attack("Iron axe (category entry)", &attack);

    let attack = engine.resolve_attack(
        player,
        WeaponSlot::MainHand,
        &base,
        &EquipmentState::for_item(&bronze),
        AttackMode::ModeA,
    );
    print_attack("Bronze axe (item entry)", &attack);

    // Hot reload: a new category clip, and a broken items document
    let reloaded = ConfigSet::defaults()?
        .with(DocumentSource::toml(
            DocumentKind::Categories,
            "[ModeA_Axes]\naxe_secondary = \"AxeOverhead\"\n",
        ))
        .with(DocumentSource::toml(DocumentKind::Items, "[ModeA_AxeBronze"));
    let report = engine.reload(&reloaded);

    println!("\n=== Reload ===");
    for err in report.errors() {
        println!("  kept previous table: {}", err);
    }
    println!("Cached bindings after reload: {}", engine.bindings().len());

    let attack = engine.resolve_attack(
        player,
        WeaponSlot::MainHand,
        &base,
        &EquipmentState::for_item(&iron),
        AttackMode::ModeA,
    );
    print_attack("Iron axe after reload", &attack);

    let attack = engine.resolve_attack(
        player,
        WeaponSlot::MainHand,
        &base,
        &EquipmentState::for_item(&bronze),
        AttackMode::ModeA,
    );
    print_attack("Bronze axe after reload", &attack);

    Ok(())
}

use pokemon_battle_learner::data::Catalog;
use pokemon_battle_learner::error::BattleError;
use pokemon_battle_learner::generator::PokemonGenerator;
use pokemon_battle_learner::model::{Ailment, DamageClass};
use pokemon_battle_learner::types::Type;
use serde_json::{json, Value};

/// Every attacking type present, with a couple of real relations.
fn type_chart_json(skip: Option<&str>) -> String {
    let mut chart = serde_json::Map::new();
    for t in Type::ALL {
        let name = t.name().to_ascii_lowercase();
        if Some(name.as_str()) == skip {
            continue;
        }
        chart.insert(name, json!({}));
    }
    chart.insert(
        "water".to_string(),
        json!({ "double_damage_to": ["fire", "ground", "rock"], "half_damage_to": ["water", "grass", "dragon"] }),
    );
    chart.insert(
        "normal".to_string(),
        json!({ "half_damage_to": ["rock"], "no_damage_to": ["ghost"] }),
    );
    Value::Object(chart).to_string()
}

fn moves_json() -> String {
    json!([
        { "id": 33, "name": "tackle", "type": "normal", "power": 35, "pp": 35,
          "damage_class": "physical", "accuracy": 95 },
        { "id": 57, "name": "surf", "type": "water", "power": 95, "pp": 15,
          "damage_class": "special", "accuracy": 100 },
        { "id": 129, "name": "swift", "type": "normal", "power": 60, "pp": 20,
          "damage_class": "special" },
        { "id": 52, "name": "ember", "type": "fire", "power": 40, "pp": 25,
          "damage_class": "special", "accuracy": 100, "ailment": "burn", "ailment_chance": 10 },
        { "id": 141, "name": "leech-life", "type": "bug", "power": 20, "pp": 15,
          "damage_class": "physical", "accuracy": 100, "drain": 50 },
        { "id": 24, "name": "double-kick", "type": "fighting", "power": 30, "pp": 30,
          "damage_class": "physical", "accuracy": 100, "min_hits": 2, "max_hits": 2 },
        { "id": 76, "name": "solar-beam", "type": "grass", "power": 120, "pp": 10,
          "damage_class": "special", "accuracy": 100, "charge": true }
    ])
    .to_string()
}

fn species_json(extra_move: u32, types: &[&str]) -> String {
    json!([
        { "id": 7, "name": "squirtle", "types": ["water"],
          "base_stats": { "hp": 44, "attack": 48, "defense": 65, "special": 50, "speed": 43 },
          "moves": [33, 57, 129] },
        { "id": 4, "name": "charmander", "types": types,
          "base_stats": { "hp": 39, "attack": 52, "defense": 43, "special": 50, "speed": 65 },
          "moves": [33, 52, extra_move] }
    ])
    .to_string()
}

fn catalog() -> Catalog {
    Catalog::from_json(&type_chart_json(None), &moves_json(), &species_json(52, &["fire"]))
        .expect("valid catalog")
}

#[test]
fn parses_moves_with_percent_fields() {
    let catalog = catalog();
    let tackle = &catalog.moves[&33];
    assert_eq!(tackle.move_type, Type::Normal);
    assert_eq!(tackle.damage_class, DamageClass::Physical);
    assert_eq!(tackle.accuracy, Some(0.95));

    assert_eq!(catalog.moves[&129].accuracy, None);
    assert_eq!(catalog.moves[&141].drain, 0.5);
    assert_eq!(catalog.moves[&24].hit_count.definite(), Some(2));
    assert!(catalog.moves[&76].flags.charge);

    let ember = catalog.move_named("Ember").expect("ember");
    let effect = ember.ailment.expect("burn effect");
    assert_eq!(effect.ailment, Ailment::Burn);
    assert!((effect.chance - 0.1).abs() < 1e-12);
}

#[test]
fn links_species_to_their_moves() {
    let catalog = catalog();
    let charmander = catalog.species_named("charmander").expect("charmander");
    assert_eq!(charmander.types, vec![Type::Fire]);
    assert_eq!(charmander.base_stats.speed, 65);
    // Duplicate ids collapse into one learnable move.
    assert_eq!(charmander.learn_set.len(), 2);
    assert_eq!(catalog.species[&7].learn_set.len(), 3);
}

#[test]
fn type_chart_comes_from_the_file() {
    let catalog = catalog();
    let chart = &catalog.type_chart;
    assert_eq!(chart.effectiveness(Type::Water, Type::Fire), 2.0);
    assert_eq!(chart.effectiveness(Type::Normal, Type::Ghost), 0.0);
    assert_eq!(chart.effectiveness(Type::Fire, Type::Water), 1.0);
}

#[test]
fn generator_builds_from_catalog() {
    let catalog = catalog();
    let generator = PokemonGenerator::new(&catalog).unwrap();
    assert_eq!(generator.species_pool().len(), 2);
    assert_eq!(generator.species_pool()[0].id, 4);
}

#[test]
fn unknown_type_names_are_rejected() {
    let err = Catalog::from_json(&type_chart_json(None), &moves_json(), &species_json(33, &["steel"]))
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<BattleError>(),
        Some(&BattleError::UnknownType("steel".to_string()))
    );
}

#[test]
fn unknown_move_ids_are_rejected() {
    let err = Catalog::from_json(&type_chart_json(None), &moves_json(), &species_json(999, &["fire"]))
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<BattleError>(),
        Some(&BattleError::UnknownMove {
            species: "charmander".to_string(),
            move_id: 999,
        })
    );
}

#[test]
fn incomplete_type_chart_is_rejected() {
    let err = Catalog::from_json(&type_chart_json(Some("dragon")), &moves_json(), &species_json(33, &["fire"]))
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<BattleError>(),
        Some(&BattleError::MissingTypeEntry(Type::Dragon))
    );
}

#[test]
fn malformed_json_reports_context() {
    let err = Catalog::from_json("{", &moves_json(), &species_json(33, &["fire"])).unwrap_err();
    assert!(err.to_string().contains("type chart"));
}

#[test]
fn bundled_data_loads() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let catalog = Catalog::load(&dir).unwrap();
    assert_eq!(catalog.species.len(), 14);
    assert!(catalog.move_named("struggle").is_none());
    let hyper_beam = catalog.move_named("hyper-beam").unwrap();
    assert!(hyper_beam.flags.recharge);
    assert_eq!(hyper_beam.accuracy, Some(0.9));

    // Magikarp only knows one move.
    let generator = PokemonGenerator::new(&catalog).unwrap();
    assert_eq!(generator.species_pool().len(), 13);
}

//! Replaying a recorded event stream against a card database on disk

use mtg_rules_engine::{
    core::{CardId, Color},
    game::{events::load_events, ActionKind, RulesConfig, RulesEngine, Step},
    loader::CardDatabase,
    zones::Zone,
    MtgError,
};
use std::path::PathBuf;

const CARDS: &str = r#"[
    {"arena_id": 1, "name": "Forest", "type_line": "Basic Land — Forest"},
    {"arena_id": 2, "name": "Llanowar Elves", "mana_cost": "{G}",
     "type_line": "Creature — Elf Druid", "power": "1", "toughness": "1",
     "produced_mana": ["G"]},
    {"arena_id": 3, "name": "Grizzly Bears", "mana_cost": "{1}{G}",
     "type_line": "Creature — Bear", "power": "2", "toughness": "2"},
    {"arena_id": 4, "name": "Isamaru, Hound of Konda", "mana_cost": "{W}",
     "type_line": "Legendary Creature — Dog", "power": "2", "toughness": "2"}
]"#;

const EVENTS: &str = r#"
# opening hand
{"type":"game_start","player_life":20,"opponent_life":20,"hands":[{"instance_id":101,"definition_id":1,"name":"Forest","owner":0},{"instance_id":102,"definition_id":2,"name":"Llanowar Elves","owner":0},{"instance_id":103,"definition_id":3,"name":"Grizzly Bears","owner":0},{"instance_id":104,"definition_id":1,"name":"Forest","owner":0}]}
{"type":"step_change","step":"main1"}
{"type":"zone_change","card":{"instance_id":101,"name":"Forest","owner":0},"from":"hand","to":"battlefield"}
{"type":"mana_added","player":0,"color":"G","amount":1}
{"type":"cast_spell","player":0,"card":{"instance_id":102,"name":"Llanowar Elves","owner":0}}
{"type":"zone_change","card":{"instance_id":102,"name":"Llanowar Elves","owner":0},"from":"stack","to":"battlefield"}
"#;

async fn write_fixtures(dir: &tempfile::TempDir, events: &str) -> (PathBuf, PathBuf) {
    let cards = dir.path().join("cards.json");
    let stream = dir.path().join("events.jsonl");
    tokio::fs::write(&cards, CARDS).await.unwrap();
    tokio::fs::write(&stream, events).await.unwrap();
    (cards, stream)
}

#[tokio::test]
async fn test_replay_fills_cards_and_tracks_land_play() {
    let dir = tempfile::tempdir().unwrap();
    let (cards, stream) = write_fixtures(&dir, EVENTS).await;

    let db = CardDatabase::load(&cards).await.unwrap();
    let events = load_events(&stream).unwrap();
    assert_eq!(events.len(), 6);

    let mut engine = RulesEngine::two_player("Alice", "Bob", RulesConfig::default());
    for event in &events {
        engine.apply_event_with(event, &db).unwrap();
    }
    let alice = engine.state().players[0].id;

    assert_eq!(engine.state().current_step(), Step::Main1);
    let elves = engine.state().card(CardId::new(102)).unwrap();
    assert_eq!(elves.zone, Zone::Battlefield);
    assert!(elves.is_creature());
    assert_eq!(elves.mana_cost, "{G}");
    assert!(engine.state().stack.is_empty());

    // Forest is untapped; the elves are still summoning sick
    assert!(engine.can_generate_mana(alice, Color::Green));
    assert!(!engine.can_generate_mana(alice, Color::White));

    let actions = engine.get_legal_actions(alice, false);
    assert!(actions.iter().all(|a| a.kind() != ActionKind::PlayLand));
    assert!(actions.iter().all(|a| a.kind() != ActionKind::CastSpell));
    assert!(!engine.can_pay_cost("{1}{G}", alice).unwrap());
    assert!(engine.can_pay_cost("{G}", alice).unwrap());
    assert_eq!(engine.state().players[0].hand_size(), 2);
}

#[tokio::test]
async fn test_replay_settles_legend_conflict() {
    let events = r#"
{"type":"game_start"}
{"type":"zone_change","card":{"instance_id":301,"definition_id":4,"name":"Isamaru, Hound of Konda","owner":1},"to":"battlefield"}
{"type":"zone_change","card":{"instance_id":302,"definition_id":4,"name":"Isamaru, Hound of Konda","owner":1},"to":"battlefield"}
"#;
    let dir = tempfile::tempdir().unwrap();
    let (cards, stream) = write_fixtures(&dir, events).await;

    let (db, _elapsed) = CardDatabase::load_many(&[cards]).await.unwrap();
    let mut engine = RulesEngine::two_player("Alice", "Bob", RulesConfig::default());
    for event in load_events(&stream).unwrap() {
        engine.apply_event_with(&event, &db).unwrap();
    }

    let state = engine.state();
    assert_eq!(state.card(CardId::new(301)).unwrap().zone, Zone::Graveyard);
    assert_eq!(state.card(CardId::new(302)).unwrap().zone, Zone::Battlefield);
    assert!(state.validate().is_empty());
}

#[tokio::test]
async fn test_replay_stops_at_full_hand() {
    let events = r#"
{"type":"game_start"}
{"type":"draw_card","player":1,"card":{"instance_id":401,"name":"Forest","owner":1}}
{"type":"draw_card","player":1,"card":{"instance_id":402,"name":"Forest","owner":1}}
"#;
    let dir = tempfile::tempdir().unwrap();
    let (cards, stream) = write_fixtures(&dir, events).await;

    let db = CardDatabase::load(&cards).await.unwrap();
    let config = RulesConfig::default().with_max_hand_size(1);
    let mut engine = RulesEngine::two_player("Alice", "Bob", config);

    let results: Vec<_> = load_events(&stream)
        .unwrap()
        .iter()
        .map(|event| engine.apply_event_with(event, &db))
        .collect();
    assert!(results[0].is_ok() && results[1].is_ok());
    assert!(matches!(results[2], Err(MtgError::IllegalAction { .. })));
    assert_eq!(engine.state().players[1].hand_size(), 1);
}

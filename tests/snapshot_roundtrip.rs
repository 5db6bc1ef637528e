//! Saving a match mid-game and picking it up again

use mtg_rules_engine::{
    core::{Card, CardId, CardType, Color, PlayerCounter, Supertype},
    game::{GameState, MatchSnapshot, RulesConfig, RulesEngine, Step},
    zones::Zone,
};
use similar_asserts::assert_eq;

fn midgame_engine() -> RulesEngine {
    let mut state = GameState::new_two_player("Alice", "Bob", RulesConfig::default());
    let (alice, bob) = (state.players[0].id, state.players[1].id);
    state
        .add_card(
            Card::new(CardId::new(0), "Plains", alice)
                .with_types(&[CardType::Land])
                .with_supertype(Supertype::Basic)
                .with_subtype("Plains"),
            Zone::Battlefield,
        )
        .unwrap();
    state
        .add_card(
            Card::new(CardId::new(0), "Serra Angel", alice)
                .with_types(&[CardType::Creature])
                .with_cost("{3}{W}{W}")
                .with_stats(4, 4)
                .with_keyword("Flying")
                .with_keyword("Vigilance"),
            Zone::Hand,
        )
        .unwrap();
    state
        .add_card(
            Card::new(CardId::new(0), "Grizzly Bears", bob)
                .with_types(&[CardType::Creature])
                .with_stats(2, 2),
            Zone::Battlefield,
        )
        .unwrap();
    state.start_game().unwrap();
    state.set_step(Step::Main1);
    state.set_life(bob, 13).unwrap();
    state
        .adjust_counter(alice, PlayerCounter::Poison, 3)
        .unwrap();

    let mut engine = RulesEngine::new(state);
    engine.generate_mana(alice, Color::White, 3).unwrap();
    engine.pay_cost("{1}{W}", alice).unwrap();
    engine
}

#[test]
fn test_snapshot_preserves_state() {
    let engine = midgame_engine();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.json");

    engine.snapshot().save_to_file(&path).unwrap();
    let loaded = MatchSnapshot::load_from_file(&path).unwrap();
    assert_eq!(loaded.version, "1");

    let before = serde_json::to_value(engine.state()).unwrap();
    let after = serde_json::to_value(&loaded.state).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_reloaded_match_offers_same_actions() {
    let mut engine = midgame_engine();
    let alice = engine.state().players[0].id;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.json");
    engine.snapshot().save_to_file(&path).unwrap();

    let mut reloaded = RulesEngine::from_snapshot(MatchSnapshot::load_from_file(&path).unwrap());
    assert_eq!(
        reloaded.get_legal_actions(alice, true),
        engine.get_legal_actions(alice, true)
    );
    assert_eq!(reloaded.spending_history(alice), engine.spending_history(alice));
    assert_eq!(reloaded.state().players[0].mana_pool.white, 1);
    assert!(reloaded.state().validate().is_empty());
}

//! Tests for the turn cycle and the changes it records

use crate::core::{Card, CardId, CardType, Color};
use crate::game::{GameState, RulesConfig, Step};
use crate::history::StateChange;
use crate::zones::Zone;

fn started() -> GameState {
    let mut state = GameState::new_two_player("Alice", "Bob", RulesConfig::default());
    state.start_game().unwrap();
    state
}

#[test]
fn test_step_order_over_a_full_turn() {
    let mut state = started();
    let mut seen = vec![state.current_step()];
    for _ in 0..11 {
        state.advance_step();
        seen.push(state.current_step());
    }
    assert_eq!(
        seen,
        vec![
            Step::Untap,
            Step::Upkeep,
            Step::Draw,
            Step::Main1,
            Step::BeginCombat,
            Step::DeclareAttackers,
            Step::DeclareBlockers,
            Step::CombatDamage,
            Step::EndCombat,
            Step::Main2,
            Step::End,
            Step::Cleanup,
        ]
    );
    assert_eq!(state.turn.turn_number, 1);
}

#[test]
fn test_leaving_cleanup_starts_next_turn() {
    let mut state = started();
    let (alice, bob) = (state.players[0].id, state.players[1].id);

    state.set_step(Step::Main1);
    state.add_mana(alice, Color::Green, 3).unwrap();
    state.add_mana(bob, Color::Blue, 1).unwrap();
    state.mark_land_played(alice).unwrap();

    state.set_step(Step::Cleanup);
    state.changes.drain();
    state.advance_step();

    assert_eq!(state.turn.turn_number, 2);
    assert_eq!(state.active_player(), bob);
    assert_eq!(state.current_step(), Step::Untap);
    assert!(state.players.iter().all(|p| p.mana_pool.is_empty()));
    assert!(!state.players[0].flags.played_land());
    assert_eq!(state.turn.priority_player, Some(bob));

    let changes = state.changes.drain();
    assert!(changes.contains(&StateChange::TurnChanged {
        turn: 2,
        active_player: bob,
    }));
    assert!(changes.contains(&StateChange::StepChanged {
        from: Step::Cleanup,
        to: Step::Untap,
        turn: 2,
    }));
}

#[test]
fn test_new_turn_untaps_active_player_only() {
    let mut state = started();
    let (alice, bob) = (state.players[0].id, state.players[1].id);

    let land = |owner| Card::new(CardId::new(0), "Plains", owner).with_types(&[CardType::Land]);
    let alices = state.add_card(land(alice), Zone::Battlefield).unwrap();
    let bobs = state.add_card(land(bob), Zone::Battlefield).unwrap();
    state.set_tapped(alices, true).unwrap();
    state.set_tapped(bobs, true).unwrap();

    state.begin_turn(None);
    assert!(state.card(alices).unwrap().tapped);
    assert!(!state.card(bobs).unwrap().tapped);
}

#[test]
fn test_combat_flags_clear_after_combat() {
    let mut state = started();
    state.config.enforce_summoning_sickness = false;
    let alice = state.players[0].id;
    let bear = Card::new(CardId::new(0), "Grizzly Bears", alice)
        .with_types(&[CardType::Creature])
        .with_stats(2, 2);
    let bear = state.add_card(bear, Zone::Battlefield).unwrap();

    state.set_step(Step::DeclareAttackers);
    state.declare_attacker(bear).unwrap();
    assert!(state.card(bear).unwrap().attacking);

    state.set_step(Step::EndCombat);
    state.advance_step();
    assert_eq!(state.current_step(), Step::Main2);
    assert!(!state.card(bear).unwrap().attacking);
}

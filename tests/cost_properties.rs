//! Property tests for the cost grammar and payment

use mtg_rules_engine::{
    core::{Color, HybridOption, ManaCost, ManaPool, PlayerCounter},
    game::{mana_payment, GameState, RulesConfig},
};
use proptest::prelude::*;

fn color_letter() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["W", "U", "B", "R", "G", "C"])
}

/// One valid `{...}` symbol, with random letter case
fn symbol() -> impl Strategy<Value = String> {
    let hybrid_side = prop_oneof![
        color_letter().prop_map(str::to_string),
        (1u8..=4).prop_map(|n| n.to_string()),
    ];
    prop_oneof![
        4 => color_letter().prop_map(|c| format!("{{{c}}}")),
        2 => (0u8..=12).prop_map(|n| format!("{{{n}}}")),
        2 => (hybrid_side.clone(), hybrid_side).prop_map(|(a, b)| format!("{{{a}/{b}}}")),
        1 => color_letter()
            .prop_filter("Phyrexian needs a color", |c| *c != "C")
            .prop_map(|c| format!("{{{c}/P}}")),
        1 => Just("{S}".to_string()),
        1 => Just("{E}".to_string()),
        1 => Just("{L}".to_string()),
    ]
    .prop_flat_map(|s| {
        prop::bool::ANY.prop_map(move |lower| if lower { s.to_lowercase() } else { s.clone() })
    })
}

/// Mana a hybrid option takes when it is the one paid
fn option_amount(option: HybridOption) -> u32 {
    match option {
        HybridOption::Color(_) => 1,
        HybridOption::Generic(n) => n as u32,
    }
}

fn pool_of(amounts: [u8; 6]) -> ManaPool {
    let mut pool = ManaPool::new();
    for (color, amount) in Color::ALL.into_iter().zip(amounts) {
        pool.add(color, amount);
    }
    pool
}

fn cost_expr() -> impl Strategy<Value = String> {
    prop::collection::vec(symbol(), 0..8).prop_map(|parts| parts.join(" "))
}

proptest! {
    #[test]
    fn parse_display_parse_is_identity(expr in cost_expr()) {
        let cost = ManaCost::parse(&expr).unwrap();
        let shown = cost.to_string();
        let reparsed = ManaCost::parse(&shown).unwrap();
        prop_assert_eq!(&reparsed, &cost);
        prop_assert_eq!(reparsed.to_string(), shown);
    }

    #[test]
    fn payment_is_all_or_nothing(
        expr in cost_expr(),
        pool in prop::collection::vec(0u8..4, 6),
        life in 1i32..6,
        energy in 0i32..3,
    ) {
        let cost = ManaCost::parse(&expr).unwrap();
        let mut state = GameState::new_two_player("Alice", "Bob", RulesConfig::default());
        let alice = state.players[0].id;
        state.set_life(alice, life).unwrap();
        state.adjust_counter(alice, PlayerCounter::Energy, energy).unwrap();
        for (color, amount) in Color::ALL.into_iter().zip(pool) {
            state.add_mana(alice, color, amount).unwrap();
        }

        let before = state.players[0].clone();
        let payable = mana_payment::can_pay(&state, alice, &cost);
        let result = mana_payment::pay(&mut state, alice, &cost);
        prop_assert_eq!(payable, result.is_ok());

        let after = &state.players[0];
        match result {
            Ok(record) => {
                for color in Color::ALL {
                    prop_assert_eq!(
                        after.mana_pool.get(color) + record.mana.get(color),
                        before.mana_pool.get(color)
                    );
                }
                prop_assert_eq!(after.life + record.life as i32, before.life);
                prop_assert_eq!(after.energy() + record.energy, before.energy());
                prop_assert_eq!(record.energy, cost.energy as u32);

                // Life beyond {L} symbols is 2 per Phyrexian symbol not paid with mana
                let phyrexian_life = record.life - cost.life as u32;
                prop_assert_eq!(phyrexian_life % 2, 0);
                let phyrexian_by_life = phyrexian_life / 2;
                prop_assert!(phyrexian_by_life <= cost.phyrexian.len() as u32);
                let phyrexian_by_mana = cost.phyrexian.len() as u32 - phyrexian_by_life;

                let pips: u32 = Color::ALL.into_iter().map(|c| cost.pips(c) as u32).sum();
                let fixed = pips + cost.generic as u32 + phyrexian_by_mana;
                prop_assert!(record.mana.total() >= fixed);
                let hybrid_paid = record.mana.total() - fixed;
                let low: u32 = cost
                    .hybrid
                    .iter()
                    .map(|h| option_amount(h.first).min(option_amount(h.second)))
                    .sum();
                let high: u32 = cost
                    .hybrid
                    .iter()
                    .map(|h| option_amount(h.first).max(option_amount(h.second)))
                    .sum();
                prop_assert!(
                    (low..=high).contains(&hybrid_paid),
                    "hybrid symbols took {} mana, expected {}..={}",
                    hybrid_paid,
                    low,
                    high
                );
            }
            Err(_) => {
                prop_assert_eq!(&after.mana_pool, &before.mana_pool);
                prop_assert_eq!(after.life, before.life);
                prop_assert_eq!(after.energy(), before.energy());
            }
        }
    }
}

#[test]
fn generic_is_paid_before_phyrexian_and_hybrid() {
    // {1} takes the black mana, {B/P} falls back to 2 life
    let cost = ManaCost::parse("{1}{B/P}").unwrap();
    let plan = mana_payment::simulate(&cost, &pool_of([0, 0, 1, 0, 0, 0]), 20, 0).unwrap();
    assert_eq!(plan.debited.total(), 1);
    assert_eq!(plan.life_paid, 2);
    assert!(plan.remaining.is_empty());

    // {2} takes the blue, {U/R} is left the red
    let cost = ManaCost::parse("{2}{U/R}").unwrap();
    let plan = mana_payment::simulate(&cost, &pool_of([0, 2, 0, 1, 0, 0]), 20, 0).unwrap();
    assert_eq!(plan.debited, pool_of([0, 2, 0, 1, 0, 0]));
    assert_eq!(plan.life_paid, 0);

    // Mixed: {1}{W}{2/G}{R/P} from W2 G1 C1 at 20 life
    let cost = ManaCost::parse("{1}{W}{2/G}{R/P}").unwrap();
    let plan = mana_payment::simulate(&cost, &pool_of([2, 0, 0, 0, 1, 1]), 20, 0).unwrap();
    // W pip, {1} from the second W, {2/G} takes its generic side, {R/P} costs life
    assert_eq!(plan.debited, pool_of([2, 0, 0, 0, 1, 1]));
    assert!(plan.remaining.is_empty());
    assert_eq!(plan.life_paid, 2);
}

#[test]
fn short_life_fails_phyrexian_after_generic() {
    let cost = ManaCost::parse("{1}{G/P}").unwrap();
    assert!(mana_payment::simulate(&cost, &pool_of([0, 0, 0, 0, 1, 0]), 1, 0).is_err());
    assert!(mana_payment::simulate(&cost, &pool_of([0, 0, 0, 0, 2, 0]), 1, 0).is_ok());
}

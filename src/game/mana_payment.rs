//! Cost payment out of a player's mana pool, life and energy
//!
//! Payment is all-or-nothing: it is first simulated on a copy of the pool,
//! life total and energy count, and committed only if every symbol could be
//! paid. `can_pay` is exactly "the simulation succeeds".
//!
//! Symbols are paid in this order:
//! 1. colored and `{C}` pips, from their own color
//! 2. generic mana, greedily in W, U, B, R, G, C order
//! 3. hybrid symbols, first option then second
//! 4. Phyrexian symbols, one mana of the color or else 2 life
//! 5. energy, then life
//!
//! Snow symbols are always treated as satisfied and nothing is debited for
//! them; snow sources are not tracked.

use crate::core::{Color, HybridOption, ManaCost, ManaPool, PlayerCounter, PlayerId};
use crate::game::{GameState, SpendRecord, VerbosityLevel};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};

/// Life paid per Phyrexian symbol when mana is not used
pub const PHYREXIAN_LIFE: i32 = 2;

/// Outcome of a successful simulated payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPlan {
    /// Pool after payment
    pub remaining: ManaPool,
    /// Mana taken out of the pool
    pub debited: ManaPool,
    pub life_paid: u32,
    pub energy_paid: u32,
}

/// Take `amount` generic mana greedily in WUBRGC order
fn pay_generic(pool: &mut ManaPool, debited: &mut ManaPool, amount: u8) -> bool {
    if pool.total() < amount as u32 {
        return false;
    }
    let mut remaining = amount;
    for color in Color::ALL {
        let used = remaining.min(pool.get(color));
        pool.remove(color, used);
        debited.add(color, used);
        remaining -= used;
    }
    debug_assert_eq!(remaining, 0, "Failed to pay generic cost");
    true
}

fn pay_option(pool: &mut ManaPool, debited: &mut ManaPool, option: HybridOption) -> bool {
    match option {
        HybridOption::Color(color) => {
            if pool.remove(color, 1) {
                debited.add(color, 1);
                true
            } else {
                false
            }
        }
        HybridOption::Generic(n) => pay_generic(pool, debited, n),
    }
}

/// Simulate paying `cost` without touching any real state
pub fn simulate(cost: &ManaCost, pool: &ManaPool, life: i32, energy: u32) -> Result<PaymentPlan> {
    let short = |what: String| MtgError::InsufficientResources(format!("cannot pay {cost}: {what}"));

    let mut pool = *pool;
    let mut debited = ManaPool::new();
    let mut life = life;

    for color in Color::ALL {
        let needed = cost.pips(color);
        if !pool.remove(color, needed) {
            return Err(short(format!(
                "needs {needed} {color}, pool has {}",
                pool.get(color)
            )));
        }
        debited.add(color, needed);
    }

    if !pay_generic(&mut pool, &mut debited, cost.generic) {
        return Err(short(format!(
            "needs {} generic, pool has {} left",
            cost.generic,
            pool.total()
        )));
    }

    for symbol in &cost.hybrid {
        // Try each option on a scratch copy so a failed first option leaves nothing behind
        let mut attempt = (pool, debited);
        if pay_option(&mut attempt.0, &mut attempt.1, symbol.first) {
            (pool, debited) = attempt;
            continue;
        }
        let mut attempt = (pool, debited);
        if pay_option(&mut attempt.0, &mut attempt.1, symbol.second) {
            (pool, debited) = attempt;
            continue;
        }
        return Err(short(format!("no mana for hybrid {symbol}")));
    }

    let mut life_paid = 0u32;
    for &color in &cost.phyrexian {
        if pool.remove(color, 1) {
            debited.add(color, 1);
        } else if life >= PHYREXIAN_LIFE {
            life -= PHYREXIAN_LIFE;
            life_paid += PHYREXIAN_LIFE as u32;
        } else {
            return Err(short(format!(
                "no {color} mana or life for {{{}/P}}",
                color.symbol()
            )));
        }
    }

    let energy_paid = cost.energy as u32;
    if energy < energy_paid {
        return Err(short(format!("needs {energy_paid} energy, has {energy}")));
    }

    if life < cost.life as i32 {
        return Err(short(format!("needs {} life, has {life}", cost.life)));
    }
    life_paid += cost.life as u32;

    Ok(PaymentPlan {
        remaining: pool,
        debited,
        life_paid,
        energy_paid,
    })
}

/// Check whether a player could pay a cost right now
pub fn can_pay(state: &GameState, player: PlayerId, cost: &ManaCost) -> bool {
    state
        .get_player(player)
        .is_ok_and(|p| simulate(cost, &p.mana_pool, p.life, p.energy()).is_ok())
}

/// Pay a cost, returning what was spent
///
/// On failure nothing changes. The caller decides whether to keep the
/// payment in the spending history (`GameState::record_spend`).
pub fn pay(state: &mut GameState, player: PlayerId, cost: &ManaCost) -> Result<SpendRecord> {
    let p = state.get_player(player)?;
    let plan = simulate(cost, &p.mana_pool, p.life, p.energy())?;

    if plan.life_paid > 0 {
        state.change_life(player, -(plan.life_paid as i32))?;
    }
    if plan.energy_paid > 0 {
        state.adjust_counter(player, PlayerCounter::Energy, -(plan.energy_paid as i32))?;
    }
    state.get_player_mut(player)?.mana_pool = plan.remaining;

    state.logger.log(
        VerbosityLevel::Verbose,
        Some("payment"),
        &format!(
            "player {player} pays {cost} (mana {}, life {}, energy {})",
            plan.debited, plan.life_paid, plan.energy_paid
        ),
    );

    Ok(SpendRecord {
        player,
        turn: state.turn.turn_number,
        step: state.turn.current_step,
        cost: cost.to_string(),
        mana: plan.debited,
        life: plan.life_paid,
        energy: plan.energy_paid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(w: u8, u: u8, b: u8, r: u8, g: u8, c: u8) -> ManaPool {
        ManaPool {
            white: w,
            blue: u,
            black: b,
            red: r,
            green: g,
            colorless: c,
        }
    }

    fn cost(expr: &str) -> ManaCost {
        ManaCost::parse(expr).unwrap()
    }

    #[test]
    fn test_generic_with_colorless() {
        let plan = simulate(&cost("{2}{W}{W}"), &pool(2, 0, 0, 0, 0, 2), 20, 0).unwrap();
        assert!(plan.remaining.is_empty());
        assert_eq!(plan.debited.white, 2);
        assert_eq!(plan.debited.colorless, 2);
        assert_eq!(cost("{2}{W}{W}").total(), 4);
    }

    #[test]
    fn test_insufficient_color() {
        let err = simulate(&cost("{W}{W}"), &pool(1, 0, 0, 0, 0, 0), 20, 0).unwrap_err();
        assert!(matches!(err, MtgError::InsufficientResources(_)));
    }

    #[test]
    fn test_generic_paid_in_wubrgc_order() {
        let plan = simulate(&cost("{2}{R}"), &pool(0, 1, 0, 3, 0, 0), 20, 0).unwrap();
        // R pip from red, then generic takes blue first, then red
        assert_eq!(plan.remaining, pool(0, 0, 0, 1, 0, 0));
    }

    #[test]
    fn test_hybrid_falls_back_to_second_option() {
        let plan = simulate(&cost("{W/U}"), &pool(0, 1, 0, 0, 0, 0), 20, 0).unwrap();
        assert!(plan.remaining.is_empty());

        let plan = simulate(&cost("{2/G}"), &pool(0, 0, 0, 0, 1, 0), 20, 0).unwrap();
        assert_eq!(plan.debited.green, 1);

        assert!(simulate(&cost("{W/U}"), &pool(0, 0, 1, 0, 0, 0), 20, 0).is_err());
    }

    #[test]
    fn test_phyrexian_uses_life_when_short_on_mana() {
        let plan = simulate(&cost("{B/P}{B/P}"), &pool(0, 0, 1, 0, 0, 0), 20, 0).unwrap();
        assert_eq!(plan.debited.black, 1);
        assert_eq!(plan.life_paid, 2);

        assert!(simulate(&cost("{B/P}"), &ManaPool::new(), 1, 0).is_err());
    }

    #[test]
    fn test_generic_paid_before_phyrexian() {
        // The black mana covers {1}, the Phyrexian symbol falls back to life
        let plan = simulate(&cost("{1}{B/P}"), &pool(0, 0, 1, 0, 0, 0), 20, 0).unwrap();
        assert!(plan.remaining.is_empty());
        assert_eq!(plan.debited.black, 1);
        assert_eq!(plan.life_paid, 2);
    }

    #[test]
    fn test_generic_paid_before_hybrid() {
        // {2/G} takes two generic when the green went to {1}
        let plan = simulate(&cost("{1}{2/G}"), &pool(0, 0, 0, 0, 1, 2), 20, 0).unwrap();
        assert!(plan.remaining.is_empty());
        assert_eq!(plan.debited.total(), 3);
    }

    #[test]
    fn test_energy_life_and_snow() {
        let plan = simulate(&cost("{E}{E}{L}{S}"), &ManaPool::new(), 5, 2).unwrap();
        assert_eq!(plan.energy_paid, 2);
        assert_eq!(plan.life_paid, 1);

        assert!(simulate(&cost("{E}{E}"), &ManaPool::new(), 5, 1).is_err());
        assert!(simulate(&cost("{L}{L}"), &ManaPool::new(), 1, 0).is_err());
    }
}

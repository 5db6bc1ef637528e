//! Match-scoped rules engine
//!
//! `RulesEngine` owns one match's state and its legal-action cache. Queries
//! borrow the engine immutably; every mutation goes through `&mut self` and
//! drops the cache, so a cached action list never outlives the state it was
//! generated from.

/// Logging that compiles away when the verbose-logging feature is off
macro_rules! log_if_verbose {
    ($engine:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $engine.state.logger.log(
                crate::game::VerbosityLevel::Verbose,
                Some("engine"),
                &format!($($arg)*),
            );
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$engine;
        }
    };
}

use crate::core::{Color, ManaCost, PlayerId, PlayerName};
use crate::game::cache::LegalActionCache;
use crate::game::events::{CardResolver, GameEvent};
use crate::game::legality::LegalitySummary;
use crate::game::mana_engine::{self, PoolSummary};
use crate::game::snapshot::{BoardSummary, MatchSnapshot};
use crate::game::{
    mana_payment, Action, GameState, LogFormat, PassOutcome, PriorityInfo, RulesConfig, SpendRecord,
    StackObject, VerbosityLevel,
};
use crate::history::StateChange;
use crate::Result;

pub struct RulesEngine {
    state: GameState,
    cache: LegalActionCache,
}

impl RulesEngine {
    /// Wrap an existing match state
    pub fn new(state: GameState) -> Self {
        let cache = LegalActionCache::new(state.config.cache_ttl());
        RulesEngine { state, cache }
    }

    /// Fresh two-player match
    pub fn two_player(
        player1: impl Into<PlayerName>,
        player2: impl Into<PlayerName>,
        config: RulesConfig,
    ) -> Self {
        Self::new(GameState::new_two_player(player1, player2, config))
    }

    pub fn from_snapshot(snapshot: MatchSnapshot) -> Self {
        Self::new(snapshot.into_state())
    }

    /// Set the logger verbosity
    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.state.logger.set_verbosity(verbosity);
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.state.logger.set_format(format);
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    pub fn cache(&self) -> &LegalActionCache {
        &self.cache
    }

    // ----- queries -----

    /// Legal actions for `player`, served from the cache while it is fresh
    pub fn get_legal_actions(&mut self, player: PlayerId, force_refresh: bool) -> Vec<Action> {
        if !force_refresh {
            if let Some(actions) = self.cache.get(player) {
                return actions.to_vec();
            }
        }
        let actions = self.state.generate_legal_actions(player);
        log_if_verbose!(
            self,
            "generated {} legal actions for player {player}",
            actions.len()
        );
        self.cache.store(player, actions.clone());
        actions
    }

    pub fn check_action(&self, action: &Action) -> Result<()> {
        self.state.check_action(action)
    }

    pub fn is_legal(&self, action: &Action) -> bool {
        self.state.is_legal(action)
    }

    /// Whether `player` could pay the cost expression right now
    pub fn can_pay_cost(&self, expr: &str, player: PlayerId) -> Result<bool> {
        let cost = ManaCost::parse(expr)?;
        Ok(mana_payment::can_pay(&self.state, player, &cost))
    }

    pub fn can_generate_mana(&self, player: PlayerId, color: Color) -> bool {
        mana_engine::can_generate(&self.state, player, color)
    }

    pub fn pool_summary(&self, player: PlayerId) -> Result<PoolSummary> {
        mana_engine::pool_summary(&self.state, player)
    }

    pub fn priority_info(&self) -> PriorityInfo {
        self.state.priority_info()
    }

    pub fn has_priority(&self, player: PlayerId) -> bool {
        self.state.has_priority(player)
    }

    pub fn legality_summary(&mut self, player: PlayerId) -> Result<LegalitySummary> {
        self.state.get_player(player)?;
        let actions = self.get_legal_actions(player, false);
        Ok(LegalitySummary::new(&self.state, player, &actions))
    }

    pub fn board_summary(&self, player: PlayerId) -> Result<BoardSummary> {
        self.state.board_summary(player)
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot::new(self.state.clone())
    }

    pub fn spending_history(&self, player: PlayerId) -> Vec<SpendRecord> {
        self.state.spending_history(player).cloned().collect()
    }

    // ----- mutations -----

    pub fn start_game(&mut self) -> Result<()> {
        self.cache.invalidate();
        self.state.start_game()
    }

    /// Pay a cost expression from `player`'s resources
    ///
    /// Either the whole cost is paid and recorded, or nothing changes.
    pub fn pay_cost(&mut self, expr: &str, player: PlayerId) -> Result<()> {
        let cost = ManaCost::parse(expr)?;
        let record = mana_payment::pay(&mut self.state, player, &cost)?;
        self.state.record_spend(record);
        self.cache.invalidate();
        Ok(())
    }

    pub fn generate_mana(&mut self, player: PlayerId, color: Color, amount: u8) -> Result<()> {
        mana_engine::generate(&mut self.state, player, color, amount)?;
        self.cache.invalidate();
        Ok(())
    }

    pub fn pass_priority(&mut self, player: PlayerId) -> Result<PassOutcome> {
        let outcome = self.state.pass_priority(player)?;
        self.cache.invalidate();
        Ok(outcome)
    }

    pub fn advance_step(&mut self) {
        self.state.advance_step();
        self.cache.invalidate();
    }

    /// Resolve the top of the stack; the active player gets priority back
    pub fn resolve_top(&mut self) -> Result<StackObject> {
        let resolved = self.state.resolve_top()?;
        self.cache.invalidate();
        Ok(resolved)
    }

    pub fn apply_event(&mut self, event: &GameEvent) -> Result<()> {
        self.cache.invalidate();
        self.state.apply_event(event)
    }

    pub fn apply_event_with(&mut self, event: &GameEvent, resolver: &dyn CardResolver) -> Result<()> {
        self.cache.invalidate();
        self.state.apply_event_with(event, resolver)
    }

    /// Check an action and carry it out
    pub fn perform_action(&mut self, action: &Action) -> Result<()> {
        self.state.check_action(action)?;
        self.cache.invalidate();
        self.state.perform_action(action)
    }

    /// Transitions recorded since the last drain
    pub fn drain_changes(&mut self) -> Vec<StateChange> {
        self.state.changes.drain()
    }
}

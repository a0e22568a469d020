//! Offline game loop as a pure state machine.
//!
//! Every method is one atomic transition. Anything that has to happen later
//! (clearing the attack pulse, resolving a mutation) is returned as a
//! `Scheduled` effect and comes back through [`LocalSimulation::fire`].

use std::time::Duration;

use rand::Rng;

use viruslab_config::LocalConfig;
use viruslab_core::{EngineState, EventLog, LogKind, VirusStatus};

use crate::narrative;
use crate::schedule::Scheduled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalTimer {
    ClearAttackVisual,
    ResolveMutation,
}

/// Outcome band of the per-tick event roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    Mutation,
    Flavor,
    Quiet,
}

/// Maps one uniform draw in `[0, 1)` onto the mutually exclusive event bands.
pub fn classify_roll(roll: f64, bots: u64, config: &LocalConfig) -> TickEvent {
    if roll < config.mutation_probability && bots > 0 {
        TickEvent::Mutation
    } else if roll > config.flavor_threshold {
        TickEvent::Flavor
    } else {
        TickEvent::Quiet
    }
}

#[derive(Debug, Clone)]
pub struct LocalSimulation {
    config: LocalConfig,
    bots: u64,
    kills: u64,
    money: f64,
    status: VirusStatus,
    attack_visual: bool,
    log: EventLog,
}

impl LocalSimulation {
    pub fn new(config: LocalConfig) -> Self {
        Self {
            bots: config.initial_bots,
            kills: config.initial_kills,
            money: config.initial_money,
            status: VirusStatus::Stable,
            attack_visual: false,
            log: EventLog::new(),
            config,
        }
    }

    pub fn bots(&self) -> u64 {
        self.bots
    }

    pub fn kills(&self) -> u64 {
        self.kills
    }

    pub fn money(&self) -> f64 {
        self.money
    }

    pub fn status(&self) -> VirusStatus {
        self.status
    }

    pub fn attack_visual(&self) -> bool {
        self.attack_visual
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn snapshot(&self) -> EngineState {
        EngineState {
            bots: self.bots,
            kills: self.kills,
            money: self.money,
            status: self.status,
            attack_visual: self.attack_visual,
            logs: self.log.to_vec(),
        }
    }

    /// One period of the main loop.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> Vec<Scheduled<LocalTimer>> {
        let mut scheduled = Vec::new();

        if self.bots > 0 {
            let per_bot =
                rng.random_range(self.config.kills_per_bot_min..=self.config.kills_per_bot_max);
            self.kills = self.kills.saturating_add(self.bots.saturating_mul(per_bot));
            self.money += self.bots as f64 * self.config.income_per_bot;

            if rng.random_bool(self.config.attack_visual_probability) {
                scheduled.push(self.pulse_attack());
            }
        }

        match classify_roll(rng.random::<f64>(), self.bots, &self.config) {
            TickEvent::Mutation => {
                self.status = VirusStatus::Mutating;
                self.log.push(narrative::MUTATING, LogKind::Warning);
                scheduled.push(Scheduled::new(
                    Duration::from_millis(self.config.mutation_delay_ms),
                    LocalTimer::ResolveMutation,
                ));
            }
            TickEvent::Flavor => {
                let pick = rng.random_range(0..narrative::SIGNAL_CHATTER.len());
                self.log.push(narrative::SIGNAL_CHATTER[pick], LogKind::Info);
            }
            TickEvent::Quiet => {}
        }

        scheduled
    }

    /// Buys one bot if the treasury covers it; otherwise only logs a warning.
    pub fn deploy_bot(&mut self) -> Vec<Scheduled<LocalTimer>> {
        if self.money >= self.config.unit_cost {
            self.money -= self.config.unit_cost;
            self.bots += 1;
            self.log.push(narrative::DEPLOYED, LogKind::Success);
            vec![self.pulse_attack()]
        } else {
            self.log.push(narrative::INSUFFICIENT_FUNDS, LogKind::Warning);
            Vec::new()
        }
    }

    /// Recalls one bot for a partial refund. Silent when none are deployed.
    pub fn remove_bot(&mut self) {
        if self.bots == 0 {
            return;
        }
        self.money += self.config.recall_refund;
        self.bots -= 1;
        self.log.push(narrative::RECALLED, LogKind::Info);
    }

    pub fn fire<R: Rng>(&mut self, timer: LocalTimer, rng: &mut R) {
        match timer {
            LocalTimer::ClearAttackVisual => self.attack_visual = false,
            LocalTimer::ResolveMutation => {
                if rng.random_bool(self.config.unit_loss_probability) {
                    self.bots = self.bots.saturating_sub(1);
                    let unit = rng.random_range(0..1000u32);
                    self.log.push(narrative::unit_disconnected(unit), LogKind::Danger);
                    self.log.push(narrative::FIREWALL_BYPASSED, LogKind::Danger);
                } else {
                    self.log.push(narrative::MUTATION_CONTAINED, LogKind::Success);
                }
                self.status = VirusStatus::Stable;
            }
        }
    }

    /// Settles transient visuals when the engine is switched away. Pending
    /// effects are discarded by the caller, so nothing would revert them.
    pub fn suspend(&mut self) {
        self.status = VirusStatus::Stable;
        self.attack_visual = false;
    }

    fn pulse_attack(&mut self) -> Scheduled<LocalTimer> {
        self.attack_visual = true;
        Scheduled::new(
            Duration::from_millis(self.config.attack_pulse_ms),
            LocalTimer::ClearAttackVisual,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use viruslab_core::log::LOG_CAPACITY;

    fn config() -> LocalConfig {
        LocalConfig::default()
    }

    fn with_state(bots: u64, money: f64) -> LocalSimulation {
        LocalSimulation::new(LocalConfig {
            initial_bots: bots,
            initial_money: money,
            ..config()
        })
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    #[test]
    fn starts_from_configured_values() {
        let sim = LocalSimulation::new(config());
        assert_eq!(sim.bots(), 1);
        assert_eq!(sim.kills(), 1240);
        assert_eq!(sim.money(), 500.0);
        assert_eq!(sim.status(), VirusStatus::Stable);
        assert!(sim.log().is_empty());
    }

    #[test]
    fn deploy_spends_unit_cost() {
        let mut sim = with_state(0, 150.0);
        let scheduled = sim.deploy_bot();

        assert_eq!(sim.money(), 50.0);
        assert_eq!(sim.bots(), 1);
        assert_eq!(sim.log().len(), 1);
        assert_eq!(sim.log().last().unwrap().kind, LogKind::Success);
        assert!(sim.attack_visual());
        assert_eq!(
            scheduled,
            vec![Scheduled::new(
                Duration::from_millis(500),
                LocalTimer::ClearAttackVisual
            )]
        );
    }

    #[test]
    fn deploy_refused_below_cost_is_idempotent() {
        let mut sim = with_state(3, 99.5);
        for call in 1..=5 {
            assert!(sim.deploy_bot().is_empty());
            assert_eq!(sim.bots(), 3);
            assert_eq!(sim.money(), 99.5);
            assert_eq!(sim.log().len(), call);
            let last = sim.log().last().unwrap();
            assert_eq!(last.kind, LogKind::Warning);
            assert_eq!(last.text, narrative::INSUFFICIENT_FUNDS);
        }
    }

    #[test]
    fn deploy_at_exact_cost_allowed() {
        let mut sim = with_state(0, 100.0);
        sim.deploy_bot();
        assert_eq!(sim.bots(), 1);
        assert_eq!(sim.money(), 0.0);
    }

    #[test]
    fn recall_refunds_half() {
        let mut sim = with_state(2, 0.0);
        sim.remove_bot();
        assert_eq!(sim.bots(), 1);
        assert_eq!(sim.money(), 50.0);
        assert_eq!(sim.log().last().unwrap().kind, LogKind::Info);
    }

    #[test]
    fn recall_without_bots_is_silent() {
        let mut sim = with_state(0, 10.0);
        sim.remove_bot();
        assert_eq!(sim.bots(), 0);
        assert_eq!(sim.money(), 10.0);
        assert!(sim.log().is_empty());
    }

    #[test]
    fn roll_bands() {
        let config = config();
        assert_eq!(classify_roll(0.0, 1, &config), TickEvent::Mutation);
        assert_eq!(classify_roll(0.099, 4, &config), TickEvent::Mutation);
        assert_eq!(classify_roll(0.05, 0, &config), TickEvent::Quiet);
        assert_eq!(classify_roll(0.10, 1, &config), TickEvent::Quiet);
        assert_eq!(classify_roll(0.95, 1, &config), TickEvent::Quiet);
        assert_eq!(classify_roll(0.951, 0, &config), TickEvent::Flavor);
        assert_eq!(classify_roll(0.999, 2, &config), TickEvent::Flavor);
    }

    #[test]
    fn tick_pays_income_per_bot() {
        let mut sim = LocalSimulation::new(LocalConfig {
            initial_bots: 4,
            initial_kills: 0,
            initial_money: 0.0,
            mutation_probability: 0.0,
            attack_visual_probability: 0.0,
            ..config()
        });
        sim.tick(&mut rng());

        assert_eq!(sim.money(), 2.0);
        assert!((4..=12).contains(&sim.kills()));
        assert!(!sim.attack_visual());
    }

    #[test]
    fn idle_tick_without_bots_changes_nothing_but_flavor() {
        let mut sim = with_state(0, 20.0);
        let mut rng = rng();
        for _ in 0..200 {
            assert!(sim.tick(&mut rng).is_empty());
        }
        assert_eq!(sim.money(), 20.0);
        assert_eq!(sim.kills(), 1240);
        assert_eq!(sim.status(), VirusStatus::Stable);
        assert!(sim.log().entries().all(|e| e.kind == LogKind::Info));
    }

    #[test]
    fn mutation_schedules_resolution_and_reverts() {
        let mut sim = LocalSimulation::new(LocalConfig {
            mutation_probability: 1.0,
            attack_visual_probability: 0.0,
            unit_loss_probability: 1.0,
            initial_bots: 1,
            ..config()
        });
        let mut rng = rng();
        let scheduled = sim.tick(&mut rng);

        assert_eq!(sim.status(), VirusStatus::Mutating);
        assert_eq!(sim.log().last().unwrap().kind, LogKind::Warning);
        assert_eq!(
            scheduled,
            vec![Scheduled::new(
                Duration::from_millis(3000),
                LocalTimer::ResolveMutation
            )]
        );

        sim.fire(LocalTimer::ResolveMutation, &mut rng);
        assert_eq!(sim.status(), VirusStatus::Stable);
        assert_eq!(sim.bots(), 0);
        let dangers: Vec<_> = sim
            .log()
            .entries()
            .filter(|e| e.kind == LogKind::Danger)
            .collect();
        assert_eq!(dangers.len(), 2);
        assert!(dangers[0].text.starts_with("CRITICAL FAILURE: Agent unit 0x"));
    }

    #[test]
    fn contained_mutation_keeps_bots() {
        let mut sim = LocalSimulation::new(LocalConfig {
            unit_loss_probability: 0.0,
            initial_bots: 2,
            ..config()
        });
        sim.fire(LocalTimer::ResolveMutation, &mut rng());
        assert_eq!(sim.bots(), 2);
        assert_eq!(sim.log().last().unwrap().text, narrative::MUTATION_CONTAINED);
    }

    #[test]
    fn unit_loss_floors_at_zero() {
        let mut sim = LocalSimulation::new(LocalConfig {
            unit_loss_probability: 1.0,
            initial_bots: 0,
            ..config()
        });
        sim.fire(LocalTimer::ResolveMutation, &mut rng());
        assert_eq!(sim.bots(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Tick,
        Deploy,
        Remove,
        Fire(LocalTimer),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Tick),
            Just(Op::Deploy),
            Just(Op::Remove),
            Just(Op::Fire(LocalTimer::ResolveMutation)),
            Just(Op::Fire(LocalTimer::ClearAttackVisual)),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_for_any_sequence(seed in any::<u64>(), ops in prop::collection::vec(op(), 0..300)) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut sim = LocalSimulation::new(LocalConfig {
                mutation_probability: 0.4,
                ..config()
            });
            for op in ops {
                match op {
                    Op::Tick => { sim.tick(&mut rng); }
                    Op::Deploy => { sim.deploy_bot(); }
                    Op::Remove => sim.remove_bot(),
                    Op::Fire(timer) => sim.fire(timer, &mut rng),
                }
                prop_assert!(sim.money() >= 0.0);
                prop_assert!(sim.log().len() <= LOG_CAPACITY);
            }
        }
    }

    /// Pending effects on a virtual clock, fired in deadline order.
    #[derive(Default)]
    struct Clock {
        now: u64,
        pending: Vec<(u64, LocalTimer)>,
    }

    impl Clock {
        fn schedule(&mut self, scheduled: Vec<Scheduled<LocalTimer>>) {
            for item in scheduled {
                self.pending.push((self.now + item.after.as_millis() as u64, item.effect));
            }
        }

        fn advance(&mut self, by: u64, sim: &mut LocalSimulation, rng: &mut SmallRng) {
            self.now += by;
            self.pending.sort_by_key(|(at, _)| *at);
            while self.pending.first().is_some_and(|(at, _)| *at <= self.now) {
                let (_, timer) = self.pending.remove(0);
                sim.fire(timer, rng);
            }
        }

        fn has(&self, timer: LocalTimer) -> bool {
            self.pending.iter().any(|(_, pending)| *pending == timer)
        }
    }

    #[derive(Debug, Clone)]
    enum Step {
        Tick,
        Deploy,
        Remove,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            3 => Just(Step::Tick),
            1 => Just(Step::Deploy),
            1 => Just(Step::Remove),
        ]
    }

    proptest! {
        #[test]
        fn transient_states_always_settle(seed in any::<u64>(), steps in prop::collection::vec(step(), 0..200)) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut sim = LocalSimulation::new(LocalConfig {
                mutation_probability: 0.5,
                attack_visual_probability: 0.5,
                ..config()
            });
            let mut clock = Clock::default();
            for step in steps {
                match step {
                    Step::Tick => {
                        clock.advance(2_000, &mut sim, &mut rng);
                        let scheduled = sim.tick(&mut rng);
                        clock.schedule(scheduled);
                    }
                    Step::Deploy => {
                        let scheduled = sim.deploy_bot();
                        clock.schedule(scheduled);
                    }
                    Step::Remove => sim.remove_bot(),
                }
                if sim.status() == VirusStatus::Mutating {
                    prop_assert!(clock.has(LocalTimer::ResolveMutation));
                }
                if sim.attack_visual() {
                    prop_assert!(clock.has(LocalTimer::ClearAttackVisual));
                }
            }

            clock.advance(3_000, &mut sim, &mut rng);
            prop_assert!(clock.pending.is_empty());
            prop_assert_eq!(sim.status(), VirusStatus::Stable);
            prop_assert!(!sim.attack_visual());
        }
    }
}

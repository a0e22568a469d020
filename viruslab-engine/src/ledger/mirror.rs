//! Ledger-backed view model.
//!
//! Confirmed truth (`units`, `pending_rewards`) only ever comes from a
//! player-state read. Between reads the money figure drifts upward on its
//! own and snaps back to the confirmed value on every applied read. Status
//! and attack flags are driven by ledger events and a cosmetic drama roll.

use std::time::Duration;

use rand::Rng;

use viruslab_config::LedgerConfig;
use viruslab_core::ledger::{
    format_ether, wei_to_ether, Identity, LedgerCommand, LedgerError, LedgerEvent, PlayerState,
    TxHash,
};
use viruslab_core::state::sanitize_amount;
use viruslab_core::{EngineState, EventLog, LogKind, VirusStatus};

use crate::narrative;
use crate::schedule::Scheduled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerTimer {
    /// End of a drama-loop `UNSTABLE` flip.
    RevertUnstable,
    /// End of a confirmed attack window.
    RevertAttack,
}

#[derive(Debug, Clone)]
pub struct LedgerMirror {
    config: LedgerConfig,
    identity: Identity,
    confirmed: PlayerState,
    visual_money: f64,
    applied_seq: u64,
    status: VirusStatus,
    attack_visual: bool,
    log: EventLog,
}

impl LedgerMirror {
    pub fn new(config: LedgerConfig, identity: Identity) -> Self {
        Self {
            config,
            identity,
            confirmed: PlayerState::default(),
            visual_money: 0.0,
            applied_seq: 0,
            status: VirusStatus::Stable,
            attack_visual: false,
            log: EventLog::new(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn units(&self) -> u64 {
        self.confirmed.units
    }

    pub fn confirmed_money(&self) -> f64 {
        wei_to_ether(self.confirmed.pending_rewards)
    }

    pub fn visual_money(&self) -> f64 {
        self.visual_money
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
        let units = self.confirmed.units;
        EngineState {
            bots: units,
            kills: units.saturating_mul(self.config.kills_per_unit),
            money: sanitize_amount(self.visual_money),
            status: self.status,
            attack_visual: self.attack_visual,
            logs: self.log.to_vec(),
        }
    }

    /// Applies the result of read number `seq`. Reads are numbered in issue
    /// order; a result older than the last applied one is dropped. A missing
    /// record counts as zero units and zero rewards.
    ///
    /// Returns whether the read was applied.
    pub fn apply_player_state(&mut self, seq: u64, state: Option<PlayerState>) -> bool {
        if seq <= self.applied_seq {
            return false;
        }
        self.applied_seq = seq;
        self.confirmed = state.unwrap_or_default();
        self.visual_money = self.confirmed_money();
        true
    }

    /// Visual micro-tick. Never touches confirmed state.
    pub fn accrue(&mut self) {
        self.visual_money += self.confirmed.units as f64 * self.config.accrual_per_unit;
    }

    /// Cosmetic drama roll. Idle without units and while an attack window
    /// is open.
    pub fn drama<R: Rng>(&mut self, rng: &mut R) -> Vec<Scheduled<LedgerTimer>> {
        let mut scheduled = Vec::new();
        if self.confirmed.units == 0 {
            return scheduled;
        }

        if self.status != VirusStatus::Mutating && rng.random_bool(self.config.unstable_probability)
        {
            self.status = VirusStatus::Unstable;
            if rng.random_bool(self.config.attack_pulse_probability) {
                self.attack_visual = true;
            }
            scheduled.push(Scheduled::new(
                Duration::from_millis(self.config.unstable_revert_ms),
                LedgerTimer::RevertUnstable,
            ));
        }

        if rng.random_bool(self.config.flavor_probability) {
            let pick = rng.random_range(0..narrative::LEDGER_CHATTER.len());
            self.log.push(narrative::LEDGER_CHATTER[pick], LogKind::Warning);
        }

        scheduled
    }

    pub fn concerns(&self, event: &LedgerEvent) -> bool {
        event.player() == &self.identity
    }

    /// Applies one delivered batch. Events for other players are ignored.
    pub fn apply_events(&mut self, events: &[LedgerEvent]) -> Vec<Scheduled<LedgerTimer>> {
        let mut scheduled = Vec::new();
        for event in events {
            if !self.concerns(event) {
                continue;
            }
            match event {
                LedgerEvent::RewardsClaimed {
                    attack_occurred: true,
                    ..
                } => {
                    self.status = VirusStatus::Mutating;
                    self.attack_visual = true;
                    self.log.push(narrative::ATTACK_CONFIRMED, LogKind::Danger);
                    scheduled.push(Scheduled::new(
                        Duration::from_millis(self.config.attack_window_ms),
                        LedgerTimer::RevertAttack,
                    ));
                }
                LedgerEvent::RewardsClaimed { amount, .. } => {
                    self.log.push(
                        format!("SUCCESS: Extracted {} ETH safely.", format_ether(*amount)),
                        LogKind::Success,
                    );
                }
                LedgerEvent::UnitLost { count, .. } => {
                    // The next read reconciles `units`.
                    self.log.push(
                        format!("UNIT LOST: Signal lost to {count} agent(s)."),
                        LogKind::Danger,
                    );
                }
                LedgerEvent::AnomalyDetected { message, .. } => {
                    self.log
                        .push(format!("SYSTEM ALERT: {message}"), LogKind::Warning);
                }
            }
        }
        scheduled
    }

    /// First phase of a command, before the collaborator has answered.
    pub fn command_initiated(&mut self, command: &LedgerCommand) {
        self.log.push(wording(command).initiated, LogKind::Info);
    }

    /// Acceptance for broadcast or rejection. Confirmed state is untouched
    /// either way.
    pub fn command_submitted(
        &mut self,
        command: &LedgerCommand,
        result: Result<&TxHash, &LedgerError>,
    ) {
        let wording = wording(command);
        match result {
            Ok(_) => self.log.push(wording.accepted, LogKind::Info),
            Err(err) => {
                let message: String = err.to_string().chars().take(wording.error_chars).collect();
                self.log
                    .push(format!("Tx Failed: {message}..."), LogKind::Danger);
            }
        }
    }

    pub fn fire(&mut self, timer: LedgerTimer) {
        match timer {
            LedgerTimer::RevertUnstable => {
                if self.status == VirusStatus::Unstable {
                    self.status = VirusStatus::Stable;
                    self.attack_visual = false;
                }
            }
            LedgerTimer::RevertAttack => {
                self.status = VirusStatus::Stable;
                self.attack_visual = false;
            }
        }
    }
}

struct CommandWording {
    initiated: &'static str,
    accepted: &'static str,
    error_chars: usize,
}

fn wording(command: &LedgerCommand) -> CommandWording {
    match command {
        LedgerCommand::DeployUnit { .. } => CommandWording {
            initiated: "Initiating Secure Link...",
            accepted: "Tx Sent: Deploying Agent...",
            error_chars: 50,
        },
        LedgerCommand::RecallOperation => CommandWording {
            initiated: "Initiating Recall Protocol...",
            accepted: "Tx Sent: Recalling Agents...",
            error_chars: 20,
        },
        LedgerCommand::ExitProtocol => CommandWording {
            initiated: "Initiating Exit Protocol...",
            accepted: "Tx Sent: Liquidating Position...",
            error_chars: 50,
        },
    }
}

//! `MemoryLedger`: player accounts, reward accrual and block confirmations
//! held in process.
//!
//! Submissions are checked when they arrive (the equivalent of a failed gas
//! estimate) and executed again when their block lands `block_time_ms`
//! later, so a command can still revert if the account changed meanwhile.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{broadcast, oneshot};
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use viruslab_config::SimulatorConfig;
use viruslab_core::ledger::{
    Identity, LedgerCommand, LedgerError, LedgerEvent, LedgerEvents, LedgerReader, LedgerWriter,
    PlayerState, Submission, TxHash,
};

use crate::chaos::{ChaosInjector, Fault};

const EVENT_BUFFER: usize = 64;

const ANOMALIES: [&str; 4] = [
    "Checksum mismatch in relay node",
    "Honeypot signature observed",
    "Trace route leaked to sysadmin",
    "Packet storm on subnet 7",
];

#[derive(Debug)]
struct Account {
    units: u64,
    settled: u128,
    since: Instant,
}

impl Account {
    fn new(now: Instant) -> Self {
        Self {
            units: 0,
            settled: 0,
            since: now,
        }
    }

    /// Folds rewards accrued since the last settlement into `settled`.
    fn settle(&mut self, now: Instant, rate_per_sec: u128) {
        let elapsed_ms = now.saturating_duration_since(self.since).as_millis();
        let accrued = u128::from(self.units) * rate_per_sec * elapsed_ms / 1_000;
        self.settled = self.settled.saturating_add(accrued);
        self.since = now;
    }

    fn state(&self) -> PlayerState {
        PlayerState {
            units: self.units,
            pending_rewards: self.settled,
        }
    }
}

struct Book {
    accounts: HashMap<Identity, Account>,
    rng: SmallRng,
}

struct Shared {
    config: SimulatorConfig,
    chaos: ChaosInjector,
    book: Mutex<Book>,
    events: broadcast::Sender<Vec<LedgerEvent>>,
}

/// Cheaply clonable handle; clones share one book.
#[derive(Clone)]
pub struct MemoryLedger {
    shared: Arc<Shared>,
}

impl MemoryLedger {
    pub fn new(config: SimulatorConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let book = Book {
            accounts: HashMap::new(),
            rng: SmallRng::seed_from_u64(config.seed),
        };
        Self {
            shared: Arc::new(Shared {
                chaos: ChaosInjector::new(config.chaos.clone()),
                config,
                book: Mutex::new(book),
                events,
            }),
        }
    }

    /// Current settled view of an account, without going through the trait.
    pub fn account(&self, player: &Identity) -> Option<PlayerState> {
        self.shared.read(player)
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.events.receiver_count()
    }
}

impl Shared {
    fn rate(&self) -> u128 {
        u128::from(self.config.reward_per_unit_per_sec_wei)
    }

    fn read(&self, player: &Identity) -> Option<PlayerState> {
        let now = Instant::now();
        let rate = self.rate();
        let mut book = self.book.lock();
        book.accounts.get_mut(player).map(|account| {
            account.settle(now, rate);
            account.state()
        })
    }

    fn emit(&self, events: Vec<LedgerEvent>) {
        if events.is_empty() {
            return;
        }
        // No subscribers is not an error: nobody is watching this block.
        if self.events.send(events).is_err() {
            trace!("ledger events emitted without subscribers");
        }
    }

    /// Rejects commands that could never succeed against the current book.
    fn preflight(&self, player: &Identity, command: &LedgerCommand) -> Result<(), LedgerError> {
        match *command {
            LedgerCommand::DeployUnit {
                quantity,
                attached_value,
            } => {
                let price = u128::from(quantity) * u128::from(self.config.unit_price_wei);
                if quantity == 0 {
                    return Err(reverted("quantity must be positive"));
                }
                if attached_value < price {
                    return Err(reverted("insufficient value for deployment"));
                }
                Ok(())
            }
            LedgerCommand::RecallOperation => match self.read(player) {
                Some(state) if state.units > 0 => Ok(()),
                _ => Err(reverted("no active units to recall")),
            },
            LedgerCommand::ExitProtocol => match self.read(player) {
                Some(state) if state.units > 0 || state.pending_rewards > 0 => Ok(()),
                _ => Err(reverted("no position to exit")),
            },
        }
    }

    /// Applies a command as the block including it lands.
    fn execute(
        &self,
        player: &Identity,
        command: LedgerCommand,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let now = Instant::now();
        let rate = self.rate();
        let mut guard = self.book.lock();
        let book = &mut *guard;
        let account = book
            .accounts
            .entry(player.clone())
            .or_insert_with(|| Account::new(now));
        account.settle(now, rate);

        let mut events = Vec::new();
        match command {
            LedgerCommand::DeployUnit { quantity, .. } => {
                account.units += quantity;
            }
            LedgerCommand::RecallOperation => {
                if account.units == 0 {
                    return Err(reverted("no active units to recall"));
                }
                let claimed = std::mem::take(&mut account.settled);
                if book.rng.random_bool(self.config.attack_probability) {
                    account.units -= 1;
                    events.push(LedgerEvent::RewardsClaimed {
                        player: player.clone(),
                        attack_occurred: true,
                        amount: 0,
                    });
                    events.push(LedgerEvent::UnitLost {
                        player: player.clone(),
                        count: 1,
                    });
                } else {
                    events.push(LedgerEvent::RewardsClaimed {
                        player: player.clone(),
                        attack_occurred: false,
                        amount: claimed,
                    });
                }
                account.units = account.units.saturating_sub(1);
            }
            LedgerCommand::ExitProtocol => {
                let claimed = std::mem::take(&mut account.settled);
                account.units = 0;
                events.push(LedgerEvent::RewardsClaimed {
                    player: player.clone(),
                    attack_occurred: false,
                    amount: claimed,
                });
            }
        }

        if book.rng.random_bool(self.config.anomaly_probability) {
            let message = ANOMALIES[book.rng.random_range(0..ANOMALIES.len())];
            events.push(LedgerEvent::AnomalyDetected {
                player: player.clone(),
                message: message.to_string(),
            });
        }
        Ok(events)
    }
}

fn reverted(reason: &str) -> LedgerError {
    LedgerError::Rejected(format!("execution reverted: {reason}"))
}

fn tx_hash<R: Rng>(rng: &mut R) -> TxHash {
    let words: [u64; 4] = rng.random();
    TxHash(format!(
        "0x{:016x}{:016x}{:016x}{:016x}",
        words[0], words[1], words[2], words[3]
    ))
}

#[async_trait]
impl LedgerReader for MemoryLedger {
    async fn player_state(&self, player: &Identity) -> Result<Option<PlayerState>, LedgerError> {
        Ok(self.shared.read(player))
    }
}

impl LedgerEvents for MemoryLedger {
    fn subscribe(&self) -> broadcast::Receiver<Vec<LedgerEvent>> {
        self.shared.events.subscribe()
    }
}

#[async_trait]
impl LedgerWriter for MemoryLedger {
    async fn submit(
        &self,
        player: &Identity,
        command: LedgerCommand,
    ) -> Result<Submission, LedgerError> {
        let (fault, tx_hash) = {
            let mut book = self.shared.book.lock();
            let fault = self.shared.chaos.decide(&mut book.rng);
            (fault, tx_hash(&mut book.rng))
        };
        if fault == Fault::Reject {
            return Err(LedgerError::Rejected(
                "User rejected the request. Details: chaos".into(),
            ));
        }
        self.shared.preflight(player, &command)?;

        let (confirm_tx, confirmation) = oneshot::channel();
        if fault == Fault::Drop {
            debug!(%tx_hash, command = command.name(), "submission dropped");
            drop(confirm_tx);
        } else {
            let shared = Arc::clone(&self.shared);
            let player = player.clone();
            let block_time = Duration::from_millis(shared.config.block_time_ms);
            let hash = tx_hash.clone();
            tokio::spawn(async move {
                sleep(block_time).await;
                let outcome = shared.execute(&player, command).map(|events| {
                    debug!(tx_hash = %hash, command = command.name(), events = events.len(), "block confirmed");
                    shared.emit(events);
                });
                let _ = confirm_tx.send(outcome);
            });
        }
        Ok(Submission {
            tx_hash,
            confirmation,
        })
    }
}

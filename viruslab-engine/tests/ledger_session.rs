//! End-to-end sessions against the in-process ledger.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use viruslab_config::ViruslabConfig;
use viruslab_core::connection::ConnectionStatus;
use viruslab_core::ledger::Identity;
use viruslab_core::{LogKind, VirusStatus};
use viruslab_engine::{EngineKind, EngineSelector};
use viruslab_simulator::MemoryLedger;
use viruslab_telemetry::MetricsRecorder;

fn config() -> ViruslabConfig {
    let mut config = ViruslabConfig::default();
    config.local.seed = Some(11);
    config.ledger.seed = Some(11);
    config.ledger.unstable_probability = 0.0;
    config.ledger.flavor_probability = 0.0;
    config.simulator.attack_probability = 0.0;
    config.simulator.anomaly_probability = 0.0;
    config
}

fn session(config: &ViruslabConfig) -> (EngineSelector, MemoryLedger) {
    let ledger = MemoryLedger::new(config.simulator.clone());
    let metrics = Arc::new(MetricsRecorder::new().unwrap());
    let selector = EngineSelector::new(config, Arc::new(ledger.clone()), metrics);
    (selector, ledger)
}

#[tokio::test(start_paused = true)]
async fn deploy_recall_and_exit_through_the_selector() {
    let config = config();
    let (mut selector, ledger) = session(&config);
    let me = Identity::new("0xA11CE");
    selector.set_intro_finished(true).await.unwrap();
    selector
        .set_connection(ConnectionStatus::Connected(me.clone()))
        .await
        .unwrap();
    assert_eq!(selector.active_kind(), EngineKind::Ledger);

    selector.active().deploy_bot().await.unwrap();
    selector.active().deploy_bot().await.unwrap();
    sleep(Duration::from_millis(1_100)).await;
    let state = selector.active().snapshot();
    assert_eq!(state.bots, 2);
    assert_eq!(state.kills, 2 * 1337);
    assert_eq!(ledger.account(&me).unwrap().units, 2);

    sleep(Duration::from_secs(10)).await;
    selector.active().remove_bot().await.unwrap();
    sleep(Duration::from_millis(1_100)).await;
    let state = selector.active().snapshot();
    assert_eq!(state.bots, 1);
    assert!(state
        .logs
        .iter()
        .any(|entry| entry.kind == LogKind::Success));

    selector.active().exit_game().await.unwrap();
    sleep(Duration::from_millis(1_100)).await;
    let state = selector.active().snapshot();
    assert_eq!((state.bots, state.money), (0, 0.0));
    assert_eq!(state.status, VirusStatus::Stable);

    selector.shutdown().await.unwrap();
    assert_eq!(ledger.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_recall_is_reported_in_the_game_log() {
    let config = config();
    let (mut selector, _ledger) = session(&config);
    selector
        .set_connection(ConnectionStatus::Connected(Identity::new("0xB0B")))
        .await
        .unwrap();

    selector.active().remove_bot().await.unwrap();
    sleep(Duration::from_millis(10)).await;
    let last = selector.active().snapshot().logs.last().cloned().unwrap();
    assert_eq!(last.kind, LogKind::Danger);
    assert_eq!(last.text, "Tx Failed: execution reverted: ...");
    selector.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn disconnect_tears_down_subscriptions() {
    let config = config();
    let (mut selector, ledger) = session(&config);
    selector
        .set_connection(ConnectionStatus::Connected(Identity::new("0xC0FFEE")))
        .await
        .unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(ledger.subscriber_count(), 1);

    selector
        .set_connection(ConnectionStatus::Disconnected)
        .await
        .unwrap();
    assert_eq!(ledger.subscriber_count(), 0);
    assert_eq!(selector.active_kind(), EngineKind::Local);
    selector.shutdown().await.unwrap();
}

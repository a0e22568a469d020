//! Deferred effects.
//!
//! State machines never sleep. They return `Scheduled` effects and the owning
//! actor parks them on a `Timers` set; when one fires, the actor applies it
//! as an ordinary serialized transition.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled<T> {
    pub after: Duration,
    pub effect: T,
}

impl<T> Scheduled<T> {
    pub fn new(after: Duration, effect: T) -> Self {
        Self { after, effect }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Scheduled<U> {
        Scheduled {
            after: self.after,
            effect: f(self.effect),
        }
    }
}

/// Pending timers and in-flight collaborator calls of one actor.
///
/// Dropping the set aborts everything still pending, so nothing outlives the
/// engine that scheduled it.
pub(crate) struct Timers<T> {
    set: JoinSet<T>,
}

impl<T: Send + 'static> Timers<T> {
    pub fn new() -> Self {
        Self {
            set: JoinSet::new(),
        }
    }

    pub fn schedule(&mut self, scheduled: Scheduled<T>) {
        let Scheduled { after, effect } = scheduled;
        self.set.spawn(async move {
            sleep(after).await;
            effect
        });
    }

    pub fn schedule_all(&mut self, scheduled: impl IntoIterator<Item = Scheduled<T>>) {
        for item in scheduled {
            self.schedule(item);
        }
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.set.spawn(task);
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Next completed effect. Cancel safe.
    pub async fn next(&mut self) -> Option<T> {
        while let Some(joined) = self.set.join_next().await {
            match joined {
                Ok(effect) => return Some(effect),
                Err(err) if err.is_panic() => error!("deferred task panicked: {err}"),
                Err(_) => {}
            }
        }
        None
    }

    pub fn abort_all(&mut self) {
        self.set.abort_all();
    }

    /// Drops every pending effect, including ones that already completed but
    /// were not yet collected.
    pub fn reset(&mut self) {
        self.set = JoinSet::new();
    }
}

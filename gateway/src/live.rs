//! Live animation loops
//!
//! Each viewer session owns one tokio task that ticks a [`LiveSession`] and
//! publishes the newest frame on a watch channel. Propagation runs on the
//! blocking pool, never on the executor.
//!
//! A session ends when it is stopped, when the gateway shuts down, or when
//! nobody has read a frame for `idle_timeout`. The registry holds at most
//! `max_sessions` running sessions.

use orbital_mechanics::{LiveFrame, LiveSession};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Error, Debug, PartialEq)]
pub enum LiveError {
    #[error("Too many live sessions (limit {0})")]
    TooManySessions(usize),

    #[error("Live propagation task failed: {0}")]
    TaskFailed(String),
}

/// Registry-wide bounds on live sessions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveLimits {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
}

impl Default for LiveLimits {
    fn default() -> Self {
        Self {
            max_sessions: 16,
            idle_timeout: Duration::from_secs(30),
        }
    }
}

/// Last frame read, in milliseconds since the session started
#[derive(Clone)]
struct Activity {
    origin: Instant,
    last_seen_ms: Arc<AtomicU64>,
}

impl Activity {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_seen_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn touch(&self) {
        self.last_seen_ms.store(self.elapsed_ms(), Ordering::Relaxed);
    }

    fn idle_for(&self) -> Duration {
        let last = self.last_seen_ms.load(Ordering::Relaxed);
        Duration::from_millis(self.elapsed_ms().saturating_sub(last))
    }
}

/// Run one propagation step on the blocking pool, handing the session back
async fn off_executor<F>(mut session: LiveSession, step: F) -> Result<(LiveSession, LiveFrame), LiveError>
where
    F: FnOnce(&mut LiveSession) -> LiveFrame + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let frame = step(&mut session);
        (session, frame)
    })
    .await
    .map_err(|e| LiveError::TaskFailed(e.to_string()))
}

/// Handle to one running animation task
pub struct LiveAnimation {
    frames: watch::Receiver<LiveFrame>,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
    activity: Activity,
    object_count: usize,
}

impl LiveAnimation {
    pub async fn spawn(session: LiveSession, tick_interval: Duration, idle_timeout: Duration) -> Result<Self, LiveError> {
        let object_count = session.len();
        let (mut session, first) = off_executor(session, |s| s.current_frame()).await?;
        let (frame_tx, frames) = watch::channel(first);
        let (stop, mut stop_rx) = watch::channel(false);
        let activity = Activity::new();
        let seen = activity.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // first tick fires immediately; the initial frame is already published
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if seen.idle_for() > idle_timeout {
                            info!("Live session idle for {:?}, stopping", seen.idle_for());
                            break;
                        }
                        match off_executor(session, |s| s.tick()).await {
                            Ok((returned, frame)) => {
                                session = returned;
                                if frame_tx.send(frame).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("{}", e);
                                break;
                            }
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Live animation task finished");
        });

        Ok(Self {
            frames,
            stop,
            handle,
            activity,
            object_count,
        })
    }

    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// Newest published frame; counts as viewer activity
    pub fn latest(&self) -> LiveFrame {
        self.activity.touch();
        self.frames.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the task and wait for it to exit
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.handle.await;
    }
}

/// All running animations, keyed by session id
#[derive(Default)]
pub struct LiveRegistry {
    sessions: RwLock<HashMap<Uuid, LiveAnimation>>,
    limits: LiveLimits,
}

impl LiveRegistry {
    pub fn new(limits: LiveLimits) -> Self {
        Self {
            sessions: RwLock::default(),
            limits,
        }
    }

    pub fn limits(&self) -> &LiveLimits {
        &self.limits
    }

    pub async fn start(&self, session: LiveSession, tick_interval: Duration) -> Result<(Uuid, usize), LiveError> {
        if self.reap().await >= self.limits.max_sessions {
            return Err(LiveError::TooManySessions(self.limits.max_sessions));
        }

        let animation = LiveAnimation::spawn(session, tick_interval, self.limits.idle_timeout).await?;
        let count = animation.object_count();

        let mut sessions = self.sessions.write().await;
        // another start may have filled the last slot while this one propagated
        if sessions.len() >= self.limits.max_sessions {
            drop(sessions);
            animation.stop().await;
            return Err(LiveError::TooManySessions(self.limits.max_sessions));
        }
        let id = Uuid::new_v4();
        sessions.insert(id, animation);
        info!("Live session {} started with {} objects", id, count);
        Ok((id, count))
    }

    /// Latest frame of a running session
    pub async fn latest(&self, id: &Uuid) -> Option<LiveFrame> {
        self.sessions
            .read()
            .await
            .get(id)
            .filter(|a| a.is_running())
            .map(LiveAnimation::latest)
    }

    /// Stop one session; false if it was not running
    pub async fn stop(&self, id: &Uuid) -> bool {
        let animation = self.sessions.write().await.remove(id);
        match animation {
            Some(animation) => {
                let was_running = animation.is_running();
                animation.stop().await;
                info!("Live session {} stopped", id);
                was_running
            }
            None => false,
        }
    }

    pub async fn stop_all(&self) {
        let drained: Vec<(Uuid, LiveAnimation)> = self.sessions.write().await.drain().collect();
        for (id, animation) in drained {
            animation.stop().await;
            debug!("Live session {} stopped on shutdown", id);
        }
    }

    /// Forget sessions whose task has ended; returns how many remain
    pub async fn reap(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, animation| {
            let running = animation.is_running();
            if !running {
                debug!("Live session {} reaped", id);
            }
            running
        });
        if sessions.len() < before {
            info!("Reaped {} ended live sessions", before - sessions.len());
        }
        sessions.len()
    }

    /// Sessions whose task is still running
    pub async fn len(&self) -> usize {
        self.sessions.read().await.values().filter(|a| a.is_running()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orbital_mechanics::LiveConfig;

    const TICK: Duration = Duration::from_millis(100);
    const IDLE: Duration = Duration::from_secs(30);

    fn empty_session() -> LiveSession {
        LiveSession::new(Vec::new(), Utc::now(), LiveConfig::default())
    }

    fn registry(max_sessions: usize) -> LiveRegistry {
        LiveRegistry::new(LiveLimits {
            max_sessions,
            idle_timeout: IDLE,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_advances_frames() {
        let session = empty_session();
        let start = session.now();
        let animation = LiveAnimation::spawn(session, TICK, IDLE).await.unwrap();
        let mut frames = animation.frames.clone();

        assert_eq!(animation.latest().time, start);

        frames.changed().await.unwrap();
        let first = frames.borrow_and_update().time;
        assert_eq!(first, start + chrono::Duration::seconds(3));

        frames.changed().await.unwrap();
        assert_eq!(frames.borrow().time, start + chrono::Duration::seconds(6));

        animation.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_task() {
        let animation = LiveAnimation::spawn(empty_session(), TICK, IDLE).await.unwrap();
        assert!(animation.is_running());

        let mut frames = animation.frames.clone();
        animation.stop().await;

        // sender dropped with the task
        assert!(frames.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_lifecycle() {
        let registry = registry(4);
        let (id, count) = registry.start(empty_session(), TICK).await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(registry.len().await, 1);
        assert!(registry.latest(&id).await.is_some());

        assert!(registry.stop(&id).await);
        assert!(!registry.stop(&id).await);
        assert!(registry.latest(&id).await.is_none());

        registry.start(empty_session(), TICK).await.unwrap();
        registry.start(empty_session(), TICK).await.unwrap();
        registry.stop_all().await;
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unread_sessions_are_reaped() {
        let registry = registry(100);
        let mut ids = Vec::new();
        for _ in 0..50 {
            ids.push(registry.start(empty_session(), TICK).await.unwrap().0);
        }
        assert_eq!(registry.len().await, 50);

        tokio::time::sleep(Duration::from_secs(3600)).await;

        assert_eq!(registry.len().await, 0);
        assert!(registry.latest(&ids[0]).await.is_none());
        assert_eq!(registry.reap().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_sessions_stay_alive() {
        let registry = registry(4);
        let (id, _) = registry.start(empty_session(), TICK).await.unwrap();

        for _ in 0..10 {
            tokio::time::sleep(Duration::from_secs(20)).await;
            assert!(registry.latest(&id).await.is_some());
        }
        assert_eq!(registry.len().await, 1);

        registry.stop_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_limit() {
        let registry = registry(2);
        let (first, _) = registry.start(empty_session(), TICK).await.unwrap();
        registry.start(empty_session(), TICK).await.unwrap();

        assert_eq!(
            registry.start(empty_session(), TICK).await,
            Err(LiveError::TooManySessions(2))
        );

        assert!(registry.stop(&first).await);
        assert!(registry.start(empty_session(), TICK).await.is_ok());

        registry.stop_all().await;
    }
}

//! Debounce Actor
//!
//! Collapses bursts of tree changes into one build. Every new snapshot
//! replaces the pending one and restarts the quiet period, so only the
//! state after the burst is compiled.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use super::messages::{CompilerMsg, DebounceMsg, Snapshot};

/// Sleep used while nothing is pending.
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

/// Re-armable timer holding the latest value.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<T>,
    armed_at: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            armed_at: None,
        }
    }

    /// Store `value`, dropping any earlier pending value, and restart the timer.
    pub fn arm(&mut self, value: T) {
        self.pending = Some(value);
        self.armed_at = Some(Instant::now());
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_ready(&self) -> bool {
        match self.armed_at {
            Some(at) => self.pending.is_some() && at.elapsed() >= self.quiet,
            None => false,
        }
    }

    /// Take the pending value once the quiet period has elapsed.
    pub fn take_if_ready(&mut self) -> Option<T> {
        if !self.is_ready() {
            return None;
        }
        self.armed_at = None;
        self.pending.take()
    }

    /// Drop the pending value without firing.
    pub fn cancel(&mut self) -> Option<T> {
        self.armed_at = None;
        self.pending.take()
    }

    /// Precise sleep duration until the pending value is ready.
    pub fn sleep_duration(&self) -> Duration {
        let Some(armed_at) = self.armed_at else {
            return IDLE_SLEEP;
        };
        self.quiet
            .saturating_sub(armed_at.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Debounce Actor - forwards the last snapshot of each burst
pub struct DebounceActor {
    rx: mpsc::Receiver<DebounceMsg>,
    compiler_tx: mpsc::Sender<CompilerMsg>,
    debouncer: Debouncer<Snapshot>,
}

impl DebounceActor {
    pub fn new(
        rx: mpsc::Receiver<DebounceMsg>,
        compiler_tx: mpsc::Sender<CompilerMsg>,
        quiet: Duration,
    ) -> Self {
        Self {
            rx,
            compiler_tx,
            debouncer: Debouncer::new(quiet),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                msg = self.rx.recv() => match msg {
                    Some(DebounceMsg::Tree(snapshot)) => {
                        if self.debouncer.is_armed() {
                            crate::debug!("watch"; "superseding pending snapshot");
                        }
                        self.debouncer.arm(snapshot);
                    }
                    Some(DebounceMsg::Shutdown) | None => {
                        crate::debug!("watch"; "debounce shutting down");
                        let _ = self.compiler_tx.send(CompilerMsg::Shutdown).await;
                        break;
                    }
                },
                _ = tokio::time::sleep(self.debouncer.sleep_duration()) => {
                    let Some(snapshot) = self.debouncer.take_if_ready() else {
                        continue;
                    };
                    if self.compiler_tx.send(CompilerMsg::Build(snapshot)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_idle_debouncer() {
        let debouncer: Debouncer<u32> = Debouncer::new(Duration::from_millis(300));
        assert!(!debouncer.is_armed());
        assert!(!debouncer.is_ready());
        assert_eq!(debouncer.sleep_duration(), IDLE_SLEEP);
    }

    #[test]
    fn test_arm_replaces_value() {
        let mut debouncer = Debouncer::new(Duration::ZERO);
        debouncer.arm(1);
        debouncer.arm(2);
        assert_eq!(debouncer.take_if_ready(), Some(2));
        assert_eq!(debouncer.take_if_ready(), None);
    }

    #[test]
    fn test_not_ready_within_quiet_period() {
        let mut debouncer = Debouncer::new(Duration::from_secs(60));
        debouncer.arm("a");
        assert!(debouncer.is_armed());
        assert!(!debouncer.is_ready());
        assert_eq!(debouncer.take_if_ready(), None);
        assert!(debouncer.sleep_duration() > Duration::from_secs(50));
        assert_eq!(debouncer.cancel(), Some("a"));
        assert!(!debouncer.is_armed());
    }

    #[test]
    fn test_rearm_restarts_timer() {
        let mut debouncer = Debouncer::new(Duration::from_millis(40));
        debouncer.arm(1);
        std::thread::sleep(Duration::from_millis(25));
        debouncer.arm(2);
        std::thread::sleep(Duration::from_millis(25));
        // 50ms since the first arm, 25ms since the second
        assert!(!debouncer.is_ready());
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(debouncer.take_if_ready(), Some(2));
    }

    #[tokio::test]
    async fn test_actor_forwards_last_snapshot() {
        let (tx, rx) = mpsc::channel(8);
        let (compiler_tx, mut compiler_rx) = mpsc::channel(8);
        let actor = DebounceActor::new(rx, compiler_tx, Duration::from_millis(20));
        let handle = tokio::spawn(actor.run());

        for n in 0..3 {
            let name = format!("f{n}.ts");
            let tree = vec![crate::vfs::FileNode::file(name.clone(), name, "")];
            tx.send(DebounceMsg::Tree(Arc::new(tree))).await.unwrap();
        }

        match compiler_rx.recv().await {
            Some(CompilerMsg::Build(snapshot)) => assert_eq!(snapshot[0].name, "f2.ts"),
            other => panic!("expected build, got {other:?}"),
        }

        tx.send(DebounceMsg::Shutdown).await.unwrap();
        assert!(matches!(compiler_rx.recv().await, Some(CompilerMsg::Shutdown)));
        handle.await.unwrap();
    }
}

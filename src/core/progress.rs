//! Build progress reporting
//!
//! Each build owns a progress channel. The pipeline publishes coarse
//! milestones (0 to 100); any number of observers may read the latest value
//! or wait for the next one. Reading never changes the value.

use tokio::sync::watch;

/// Progress reported before the pipeline reaches its first milestone
pub const INITIAL_PROGRESS: u8 = 10;

/// Publishing side of a build's progress
#[derive(Debug)]
pub struct ProgressSender {
    tx: watch::Sender<u8>,
}

/// Observing side of a build's progress
#[derive(Debug, Clone)]
pub struct ProgressReceiver {
    rx: watch::Receiver<u8>,
}

/// Create a progress channel starting at [`INITIAL_PROGRESS`]
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = watch::channel(INITIAL_PROGRESS);
    (ProgressSender { tx }, ProgressReceiver { rx })
}

impl ProgressSender {
    /// Publish a milestone, capped at 100
    pub fn set(&self, percent: u8) {
        let percent = percent.min(100);
        self.tx.send_replace(percent);
        tracing::info!("The current progress is {percent}%");
    }

    /// Latest published value
    pub fn current(&self) -> u8 {
        *self.tx.borrow()
    }

    /// Another observer for this build
    pub fn subscribe(&self) -> ProgressReceiver {
        ProgressReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

impl ProgressReceiver {
    /// Latest published value
    pub fn current(&self) -> u8 {
        *self.rx.borrow()
    }

    /// Wait for the next milestone. `None` once the build has finished
    /// publishing.
    pub async fn changed(&mut self) -> Option<u8> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_value() {
        let (tx, rx) = channel();
        assert_eq!(tx.current(), INITIAL_PROGRESS);
        assert_eq!(rx.current(), INITIAL_PROGRESS);
    }

    #[test]
    fn test_reading_completion_does_not_reset() {
        let (tx, rx) = channel();
        tx.set(100);
        assert_eq!(rx.current(), 100);
        assert_eq!(rx.current(), 100);
    }

    #[test]
    fn test_value_is_capped() {
        let (tx, rx) = channel();
        tx.set(250);
        assert_eq!(rx.current(), 100);
    }

    #[tokio::test]
    async fn test_observer_sees_milestones_until_sender_dropped() {
        let (tx, mut rx) = channel();
        let observer = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(p) = rx.changed().await {
                seen.push(p);
                if p == 100 {
                    break;
                }
            }
            seen
        });
        tx.set(100);
        drop(tx);
        let seen = observer.await.unwrap();
        assert_eq!(seen.last(), Some(&100));
    }

    #[test]
    fn test_independent_builds_do_not_share_progress() {
        let (a, a_rx) = channel();
        let (_b, b_rx) = channel();
        a.set(85);
        assert_eq!(a_rx.current(), 85);
        assert_eq!(b_rx.current(), INITIAL_PROGRESS);
        assert_eq!(a.subscribe().current(), 85);
    }
}

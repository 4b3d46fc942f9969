//! Resize coalescing.
//!
//! A drag-resize produces a burst of size events. [`ResizeDebouncer`]
//! keeps only the latest size and releases it once no further event has
//! arrived for the configured window. [`ResizeActor`] runs a debouncer on
//! its own thread between two crossbeam channels.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often the actor checks its shutdown flag while idle.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Last-write-wins coalescing of terminal sizes.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    window: Duration,
    pending: Option<((u16, u16), Instant)>,
}

impl ResizeDebouncer {
    /// A debouncer releasing sizes after `window` of quiet.
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record a size observed at `now`; restarts the window.
    pub fn push(&mut self, size: (u16, u16), now: Instant) {
        self.pending = Some((size, now + self.window));
    }

    /// When the pending size becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, deadline)| deadline)
    }

    /// The pending size, if its window has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<(u16, u16)> {
        match self.pending {
            Some((size, deadline)) if now >= deadline => {
                self.pending = None;
                Some(size)
            }
            _ => None,
        }
    }
}

/// Resize actor that coalesces raw size events on a dedicated thread.
pub struct ResizeActor {
    /// Handle to the resize thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Receiver for coalesced sizes.
    size_rx: Receiver<(u16, u16)>,
}

impl ResizeActor {
    /// Spawn the actor reading raw `(columns, rows)` events from `events`.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS fails to spawn the thread.
    pub fn spawn(events: Receiver<(u16, u16)>, window: Duration) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let (size_tx, size_rx) = bounded(4);

        let handle = thread::Builder::new()
            .name("jumper-resize".to_string())
            .spawn(move || {
                Self::run_loop(&events, &size_tx, &shutdown_clone, window);
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
            size_rx,
        })
    }

    /// Receiver of coalesced sizes, for use with `select!`.
    #[inline]
    pub const fn receiver(&self) -> &Receiver<(u16, u16)> {
        &self.size_rx
    }

    /// Signal the actor to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the actor thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn run_loop(
        events: &Receiver<(u16, u16)>,
        sizes: &Sender<(u16, u16)>,
        shutdown: &AtomicBool,
        window: Duration,
    ) {
        let mut debouncer = ResizeDebouncer::new(window);

        while !shutdown.load(Ordering::Relaxed) {
            let wait = debouncer
                .deadline()
                .map_or(IDLE_POLL, |deadline| {
                    deadline.saturating_duration_since(Instant::now())
                })
                .min(IDLE_POLL);

            match events.recv_timeout(wait) {
                Ok(size) => debouncer.push(size, Instant::now()),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    // deliver whatever is still pending before exiting
                    if let Some((size, _)) = debouncer.pending.take() {
                        let _ = sizes.send(size);
                    }
                    break;
                }
            }

            if let Some(size) = debouncer.poll(Instant::now()) {
                tracing::debug!(columns = size.0, rows = size.1, "resize settled");
                if sizes.send(size).is_err() {
                    break;
                }
            }
        }
    }
}

impl Drop for ResizeActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_debouncer_last_write_wins() {
        let start = Instant::now();
        let window = Duration::from_millis(100);
        let mut debouncer = ResizeDebouncer::new(window);

        debouncer.push((80, 24), start);
        debouncer.push((90, 30), start + Duration::from_millis(50));
        assert_eq!(debouncer.poll(start + Duration::from_millis(120)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(150)),
            Some((90, 30))
        );
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_actor_coalesces_burst() {
        let (tx, rx) = unbounded();
        let actor = ResizeActor::spawn(rx, Duration::from_millis(50)).unwrap();
        for width in 70..80 {
            tx.send((width, 24)).unwrap();
        }

        let size = actor.receiver().recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(size, (79, 24));
        assert!(actor
            .receiver()
            .recv_timeout(Duration::from_millis(60))
            .is_err());
        actor.join();
    }

    #[test]
    fn test_actor_flushes_on_disconnect() {
        let (tx, rx) = unbounded();
        let actor = ResizeActor::spawn(rx, Duration::from_secs(10)).unwrap();
        tx.send((100, 40)).unwrap();
        drop(tx);

        let size = actor.receiver().recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(size, (100, 40));
        actor.join();
    }
}

#![forbid(unsafe_code)]

//! Background timers for the host screen.
//!
//! A [`Subscription`] runs on its own thread and only ever *sends* messages.
//! The owner thread drains the channel and acts on them, so the item tree
//! and the size cache are never touched off the owner thread.
//!
//! # Lifecycle
//!
//! [`SubscriptionHandle::start`] spawns the thread together with a private
//! stop channel. Nothing is ever sent on that channel: the handle stops the
//! thread by dropping its end, which wakes a pending
//! [`StopSignal::wait_timeout`] at once. [`SubscriptionHandle::stop`] also
//! joins and may be called any number of times. Dropping a handle
//! disconnects without joining.

use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

/// A message source that lives on a background thread.
pub trait Subscription<M: Send + 'static>: Send {
    /// Send messages through `sender` until `stop` fires or the receiver
    /// goes away.
    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal);
}

/// The thread side of a stop channel. Fires once the owning
/// [`SubscriptionHandle`] stops or is dropped.
pub struct StopSignal {
    disconnected: mpsc::Receiver<()>,
}

impl StopSignal {
    fn pair() -> (mpsc::Sender<()>, Self) {
        let (keepalive, disconnected) = mpsc::channel();
        (keepalive, Self { disconnected })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.disconnected.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleep for up to `timeout`. Returns `true` as soon as the owner stops.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.disconnected.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

/// Owner-side handle of a running subscription.
pub struct SubscriptionHandle {
    keepalive: Option<mpsc::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl SubscriptionHandle {
    /// Spawn `subscription` on a background thread.
    pub fn start<M, S>(subscription: S, sender: mpsc::Sender<M>) -> Self
    where
        M: Send + 'static,
        S: Subscription<M> + 'static,
    {
        let (keepalive, stop) = StopSignal::pair();
        let thread = thread::spawn(move || subscription.run(sender, stop));
        tracing::debug!("subscription thread spawned");
        Self {
            keepalive: Some(keepalive),
            thread: Some(thread),
        }
    }

    /// Whether the background thread is still owned by this handle.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Disconnect the stop channel and join the thread. Idempotent.
    pub fn stop(&mut self) {
        self.keepalive = None;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("subscription thread panicked");
            } else {
                tracing::debug!("subscription thread joined");
            }
        }
    }
}

/// Sends `make_msg()` every `interval` until stopped.
pub struct Every<M: Send + 'static> {
    interval: Duration,
    make_msg: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M: Send + 'static> Every<M> {
    pub fn new(interval: Duration, make_msg: impl Fn() -> M + Send + Sync + 'static) -> Self {
        Self {
            interval,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M: Send + 'static> Subscription<M> for Every<M> {
    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        while !stop.wait_timeout(self.interval) && sender.send((self.make_msg)()).is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Ping {
        Tick,
    }

    #[test]
    fn signal_is_live_while_the_owner_holds_on() {
        let (keepalive, stop) = StopSignal::pair();
        assert!(!stop.is_stopped());
        assert!(!stop.wait_timeout(Duration::from_millis(10)));
        drop(keepalive);
        assert!(stop.is_stopped());
        assert!(stop.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn dropping_the_owner_wakes_a_sleeping_wait() {
        let (keepalive, stop) = StopSignal::pair();
        let waiter = thread::spawn(move || {
            let started = Instant::now();
            (stop.wait_timeout(Duration::from_secs(30)), started.elapsed())
        });
        thread::sleep(Duration::from_millis(20));
        drop(keepalive);
        let (stopped, waited) = waiter.join().unwrap();
        assert!(stopped);
        assert!(waited < Duration::from_secs(10));
    }

    #[test]
    fn every_fires_until_stopped() {
        let (tx, rx) = mpsc::channel();
        let mut handle =
            SubscriptionHandle::start(Every::new(Duration::from_millis(5), || Ping::Tick), tx);
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut ticks = 0;
        while ticks < 3 && Instant::now() < deadline {
            if rx.recv_timeout(Duration::from_millis(100)).is_ok() {
                ticks += 1;
            }
        }
        assert_eq!(ticks, 3);

        handle.stop();
        assert!(!handle.is_running());
        handle.stop();
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(30)).is_err());
    }

    #[test]
    fn every_exits_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel::<Ping>();
        drop(rx);
        let mut handle =
            SubscriptionHandle::start(Every::new(Duration::from_millis(1), || Ping::Tick), tx);
        handle.stop();
        assert!(!handle.is_running());
    }
}

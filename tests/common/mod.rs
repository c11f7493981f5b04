//! Shared fakes for lifecycle integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use nodehost::lifecycle::readiness::{self, ReadinessNotifier, ReadinessSlot};
use nodehost::lifecycle::{
    ListenError, NodeHandle, Readiness, ServeExit, ServerHandle, ShutdownError, StartError,
    Subsystem,
};

/// Observable step taken by a fake handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    NodeStart,
    NodeReady,
    NodeShutdownBegin,
    NodeShutdownEnd,
    ServeBegin,
    ServerShutdownBegin,
    ServerShutdownEnd,
}

/// Timestamped event log shared by the fakes.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<(Event, Instant)>>>,
}

impl Recorder {
    pub fn record(&self, event: Event) {
        self.events.lock().unwrap().push((event, Instant::now()));
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().iter().map(|(e, _)| *e).collect()
    }

    pub fn count(&self, event: Event) -> usize {
        self.events().into_iter().filter(|e| *e == event).count()
    }

    pub fn at(&self, event: Event) -> Option<Instant> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|(e, _)| *e == event)
            .map(|(_, at)| *at)
    }
}

/// Node whose readiness, failures and shutdown latency are scripted.
pub struct FakeNode {
    recorder: Recorder,
    ready_after: Duration,
    fail_start: bool,
    fail_shutdown: bool,
    shutdown_delay: Duration,
    stop: CancellationToken,
    notifier: Mutex<Option<ReadinessNotifier>>,
    readiness: ReadinessSlot,
}

impl FakeNode {
    pub fn new(recorder: Recorder) -> Self {
        let (notifier, readiness) = readiness::channel();
        Self {
            recorder,
            ready_after: Duration::ZERO,
            fail_start: false,
            fail_shutdown: false,
            shutdown_delay: Duration::ZERO,
            stop: CancellationToken::new(),
            notifier: Mutex::new(Some(notifier)),
            readiness: ReadinessSlot::new(readiness),
        }
    }

    pub fn ready_after(mut self, delay: Duration) -> Self {
        self.ready_after = delay;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }

    pub fn shutdown_delay(mut self, delay: Duration) -> Self {
        self.shutdown_delay = delay;
        self
    }
}

#[async_trait]
impl NodeHandle for FakeNode {
    async fn start(&self) -> Result<(), StartError> {
        self.recorder.record(Event::NodeStart);
        let notifier = self.notifier.lock().unwrap().take().ok_or(StartError::AlreadyStarted)?;

        if self.fail_start {
            tokio::time::sleep(self.ready_after).await;
            return Err(StartError::Config("injected start failure".into()));
        }

        tokio::select! {
            _ = tokio::time::sleep(self.ready_after) => {
                self.recorder.record(Event::NodeReady);
                notifier.notify();
            }
            _ = self.stop.cancelled() => return Ok(()),
        }

        self.stop.cancelled().await;
        Ok(())
    }

    fn readiness(&self) -> Result<Readiness, StartError> {
        self.readiness.take()
    }

    async fn shutdown(&self, _deadline: Duration) -> Result<(), ShutdownError> {
        self.recorder.record(Event::NodeShutdownBegin);
        tokio::time::sleep(self.shutdown_delay).await;
        self.stop.cancel();
        self.recorder.record(Event::NodeShutdownEnd);

        if self.fail_shutdown {
            return Err(ShutdownError::Failed {
                subsystem: Subsystem::Node,
                reason: "injected shutdown failure".into(),
            });
        }
        Ok(())
    }
}

/// Server that serves until shut down, or fails on demand.
pub struct FakeServer {
    recorder: Recorder,
    fail_listen: bool,
    shutdown_delay: Duration,
    stop: CancellationToken,
}

impl FakeServer {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            recorder,
            fail_listen: false,
            shutdown_delay: Duration::ZERO,
            stop: CancellationToken::new(),
        }
    }

    pub fn failing_listen(mut self) -> Self {
        self.fail_listen = true;
        self
    }

    pub fn shutdown_delay(mut self, delay: Duration) -> Self {
        self.shutdown_delay = delay;
        self
    }
}

#[async_trait]
impl ServerHandle for FakeServer {
    async fn serve(&self) -> Result<ServeExit, ListenError> {
        self.recorder.record(Event::ServeBegin);
        if self.fail_listen {
            return Err(ListenError::Serve(io::Error::new(
                io::ErrorKind::AddrInUse,
                "injected listen failure",
            )));
        }
        self.stop.cancelled().await;
        Ok(ServeExit::Closed)
    }

    async fn shutdown(&self, _deadline: Duration) -> Result<(), ShutdownError> {
        self.recorder.record(Event::ServerShutdownBegin);
        tokio::time::sleep(self.shutdown_delay).await;
        self.stop.cancel();
        self.recorder.record(Event::ServerShutdownEnd);
        Ok(())
    }
}

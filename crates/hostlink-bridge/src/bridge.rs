//! Caller side of the bridge

use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::command::{Command, Completion, Envelope, Reply};
use crate::error::BridgeError;
use crate::owner::{Outcome, OwnerSlot, Queued, Router};

/// Handle for issuing commands to the owner thread. Cheap to clone; every clone
/// feeds the same owner queue.
pub struct CommandBridge<R: Router> {
    queue: std_mpsc::Sender<Queued<R>>,
    owner: OwnerSlot,
}

impl<R: Router> CommandBridge<R> {
    pub(crate) fn new(queue: std_mpsc::Sender<Queued<R>>, owner: OwnerSlot) -> Self {
        Self { queue, owner }
    }

    /// Run `kind` on the owner thread and block until it completes.
    ///
    /// With a timeout, an unresolved command yields `BridgeError::Timeout` near the
    /// deadline. The owner thread still runs it; its result is dropped on arrival.
    pub fn execute(
        &self,
        kind: R::Command,
        timeout: Option<Duration>,
    ) -> Result<R::Output, BridgeError<R::Error>> {
        if self.on_owner_thread() {
            return Err(BridgeError::Reentrant);
        }

        self.submit(kind)?.wait(timeout)
    }

    /// Queue `kind` without waiting. The returned ticket is the only listener for
    /// its id.
    pub fn submit(&self, kind: R::Command) -> Result<Pending<R>, BridgeError<R::Error>> {
        let command = Command::new(kind);
        let id = command.id;
        let (tx, rx) = std_mpsc::sync_channel(1);

        self.enqueue(command, Reply::Blocking(tx))?;

        Ok(Pending { id, rx })
    }

    /// Same protocol as `execute`, for callers running on an async runtime.
    pub async fn execute_async(
        &self,
        kind: R::Command,
        timeout: Option<Duration>,
    ) -> Result<R::Output, BridgeError<R::Error>> {
        if self.on_owner_thread() {
            return Err(BridgeError::Reentrant);
        }

        let command = Command::new(kind);
        let id = command.id;
        let (tx, rx) = oneshot::channel();

        self.enqueue(command, Reply::Async(tx))?;

        let received = match timeout {
            Some(after) => match tokio::time::timeout(after, rx).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::warn!(command_id = %id, ?after, "Command timed out");
                    return Err(BridgeError::Timeout { id, after });
                }
            },
            None => rx.await,
        };

        let completion = received.map_err(|_| BridgeError::OwnerGone)?;
        finish(id, completion)
    }

    /// True when called on the thread currently serving the owner loop.
    pub fn on_owner_thread(&self) -> bool {
        *self.owner.read() == Some(thread::current().id())
    }

    fn enqueue(
        &self,
        command: Command<R::Command>,
        reply: Reply<Outcome<R>>,
    ) -> Result<(), BridgeError<R::Error>> {
        tracing::debug!(command_id = %command.id, command = ?command.kind, "Issuing command");

        self.queue
            .send(Envelope { command, reply })
            .map_err(|_| BridgeError::OwnerGone)
    }
}

impl<R: Router> Clone for CommandBridge<R> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            owner: Arc::clone(&self.owner),
        }
    }
}

/// A command in flight.
pub struct Pending<R: Router> {
    id: Uuid,
    rx: std_mpsc::Receiver<Completion<Outcome<R>>>,
}

impl<R: Router> Pending<R> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Block until the completion for this id arrives, or until `timeout` elapses.
    pub fn wait(self, timeout: Option<Duration>) -> Result<R::Output, BridgeError<R::Error>> {
        let id = self.id;

        let completion = match timeout {
            Some(after) => self.rx.recv_timeout(after).map_err(|e| match e {
                RecvTimeoutError::Timeout => {
                    tracing::warn!(command_id = %id, ?after, "Command timed out");
                    BridgeError::Timeout { id, after }
                }
                RecvTimeoutError::Disconnected => BridgeError::OwnerGone,
            })?,
            None => self.rx.recv().map_err(|_| BridgeError::OwnerGone)?,
        };

        finish(id, completion)
    }
}

fn finish<T, E>(id: Uuid, completion: Completion<Result<T, E>>) -> Result<T, BridgeError<E>> {
    debug_assert_eq!(completion.id, id, "completion delivered to the wrong listener");
    completion.value.map_err(BridgeError::Operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::channel;
    use std::time::Instant;

    #[derive(Debug)]
    enum TestCommand {
        Echo(i64),
        Record(u32),
        Sleep(u64),
        SleepThenRecord(u64, u32),
        Fail(String),
        Panic,
        Stop,
    }

    #[derive(Default)]
    struct TestRouter {
        log: Vec<u32>,
        stopped: bool,
    }

    impl Router for TestRouter {
        type Command = TestCommand;
        type Output = i64;
        type Error = String;

        fn dispatch(&mut self, command: TestCommand) -> Result<i64, String> {
            match command {
                TestCommand::Echo(v) => Ok(v),
                TestCommand::Record(n) => {
                    self.log.push(n);
                    Ok(n as i64)
                }
                TestCommand::Sleep(ms) => {
                    thread::sleep(Duration::from_millis(ms));
                    Ok(ms as i64)
                }
                TestCommand::SleepThenRecord(ms, n) => {
                    thread::sleep(Duration::from_millis(ms));
                    self.log.push(n);
                    Ok(n as i64)
                }
                TestCommand::Fail(msg) => Err(msg),
                TestCommand::Panic => panic!("operation blew up"),
                TestCommand::Stop => {
                    self.stopped = true;
                    Ok(0)
                }
            }
        }

        fn should_stop(&self) -> bool {
            self.stopped
        }
    }

    fn spawn_owner() -> (CommandBridge<TestRouter>, thread::JoinHandle<TestRouter>) {
        let (bridge, owner) = channel(TestRouter::default());
        let handle = thread::spawn(move || owner.run());
        (bridge, handle)
    }

    #[test]
    fn test_execute_returns_value() {
        let (bridge, handle) = spawn_owner();

        assert_eq!(bridge.execute(TestCommand::Echo(42), None).unwrap(), 42);

        bridge.execute(TestCommand::Stop, None).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_fifo_from_one_caller() {
        let (bridge, handle) = spawn_owner();

        let pending: Vec<_> = (0..100)
            .map(|n| bridge.submit(TestCommand::Record(n)).unwrap())
            .collect();
        for (n, p) in pending.into_iter().enumerate() {
            assert_eq!(p.wait(Some(Duration::from_secs(5))).unwrap(), n as i64);
        }

        bridge.execute(TestCommand::Stop, None).unwrap();
        let router = handle.join().unwrap();
        assert_eq!(router.log, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_concurrent_callers_get_their_own_results() {
        let (bridge, handle) = spawn_owner();

        let callers: Vec<_> = (0..8)
            .map(|t| {
                let bridge = bridge.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        let value = t * 1000 + i;
                        let got = bridge
                            .execute(TestCommand::Echo(value), Some(Duration::from_secs(5)))
                            .unwrap();
                        assert_eq!(got, value);
                    }
                })
            })
            .collect();
        for caller in callers {
            caller.join().unwrap();
        }

        bridge.execute(TestCommand::Stop, None).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_timeout_returns_promptly() {
        let (bridge, handle) = spawn_owner();

        let started = Instant::now();
        let result = bridge.execute(TestCommand::Sleep(500), Some(Duration::from_millis(50)));
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(BridgeError::Timeout { .. })));
        assert!(elapsed < Duration::from_millis(400), "took {elapsed:?}");

        // Later commands queue behind the abandoned one.
        assert_eq!(bridge.execute(TestCommand::Echo(1), None).unwrap(), 1);

        bridge.execute(TestCommand::Stop, None).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_abandoned_command_still_runs() {
        let (bridge, handle) = spawn_owner();

        let result = bridge.execute(
            TestCommand::SleepThenRecord(200, 7),
            Some(Duration::from_millis(20)),
        );
        assert!(matches!(result, Err(BridgeError::Timeout { .. })));

        bridge.execute(TestCommand::Stop, None).unwrap();
        let router = handle.join().unwrap();
        assert_eq!(router.log, vec![7]);
    }

    #[test]
    fn test_operation_error_is_delivered() {
        let (bridge, handle) = spawn_owner();

        let result = bridge.execute(TestCommand::Fail("no such window".to_string()), None);
        match result {
            Err(BridgeError::Operation(msg)) => assert_eq!(msg, "no such window"),
            other => panic!("unexpected result: {other:?}"),
        }

        bridge.execute(TestCommand::Stop, None).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_owner_panic_surfaces_as_owner_gone() {
        let (bridge, handle) = spawn_owner();

        let result = bridge.execute(TestCommand::Panic, None);
        assert!(matches!(result, Err(BridgeError::OwnerGone)));
        assert!(handle.join().is_err());

        let result = bridge.execute(TestCommand::Echo(1), None);
        assert!(matches!(result, Err(BridgeError::OwnerGone)));
    }

    #[test]
    fn test_reentrant_call_is_rejected() {
        let (bridge, mut owner) = channel(TestRouter::default());
        owner.pump();

        let result = bridge.execute(TestCommand::Echo(1), None);
        assert!(matches!(result, Err(BridgeError::Reentrant)));
    }

    #[test]
    fn test_pump_drains_queue() {
        let (bridge, mut owner) = channel(TestRouter::default());

        let first = bridge.submit(TestCommand::Record(1)).unwrap();
        let second = bridge.submit(TestCommand::Record(2)).unwrap();
        assert_ne!(first.id(), second.id());

        assert_eq!(owner.pump(), 2);
        assert_eq!(owner.dispatched(), 2);
        assert_eq!(first.wait(None).unwrap(), 1);
        assert_eq!(second.wait(None).unwrap(), 2);
        assert_eq!(owner.router().log, vec![1, 2]);
    }

    #[test]
    fn test_stop_closes_queue() {
        let (bridge, mut owner) = channel(TestRouter::default());

        let stop = bridge.submit(TestCommand::Stop).unwrap();
        let queued = bridge.submit(TestCommand::Record(2)).unwrap();

        assert_eq!(owner.pump(), 1);
        assert!(owner.is_closed());
        assert_eq!(stop.wait(None).unwrap(), 0);

        // Neither the queued command nor a later one is left hanging
        assert!(matches!(queued.wait(None), Err(BridgeError::OwnerGone)));
        let result = bridge.execute(TestCommand::Echo(1), None);
        assert!(matches!(result, Err(BridgeError::OwnerGone)));

        assert_eq!(owner.pump(), 0);
        assert!(!owner.pump_timeout(Duration::from_millis(10)));
        assert!(owner.router().log.is_empty());
    }

    #[test]
    fn test_stopped_loop_releases_thread() {
        let (bridge, owner) = channel(TestRouter::default());
        let stop = bridge.submit(TestCommand::Stop).unwrap();

        owner.run();
        assert_eq!(stop.wait(None).unwrap(), 0);
        assert!(!bridge.on_owner_thread());

        let result = bridge.execute(TestCommand::Echo(1), None);
        assert!(matches!(result, Err(BridgeError::OwnerGone)));
    }

    #[test]
    fn test_claim_follows_loop_to_new_thread() {
        let (bridge, mut owner) = channel(TestRouter::default());
        owner.pump();
        assert!(bridge.on_owner_thread());

        let owner = thread::spawn(move || {
            owner.pump();
            owner
        })
        .join()
        .unwrap();
        assert!(!bridge.on_owner_thread());

        let pending = bridge.submit(TestCommand::Echo(3)).unwrap();
        drop(owner);
        assert!(matches!(pending.wait(None), Err(BridgeError::OwnerGone)));
    }

    #[test]
    fn test_run_ends_when_bridges_dropped() {
        let (bridge, owner) = channel(TestRouter::default());
        drop(bridge);

        let router = owner.run();
        assert!(router.log.is_empty());
    }

    #[tokio::test]
    async fn test_execute_async() {
        let (bridge, handle) = spawn_owner();

        assert_eq!(
            bridge
                .execute_async(TestCommand::Echo(9), Some(Duration::from_secs(5)))
                .await
                .unwrap(),
            9
        );

        let result = bridge
            .execute_async(TestCommand::Sleep(300), Some(Duration::from_millis(20)))
            .await;
        assert!(result.unwrap_err().is_timeout());

        bridge.execute_async(TestCommand::Stop, None).await.unwrap();
        handle.join().unwrap();
    }
}

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::Notify;
use tokio::time::Instant;

use cloudtest::client::{
    ClientError, ClientFuture, ConfigurationVersion, LogStream, RegistryModule, RegistryModuleId,
    TestRun, TestRunClient, TestRunCreateOptions,
};
use cloudtest::types::RunStatus;

pub const RUN_ID: &str = "trun-1";

/// Operations of [`TestRunClient`], as recorded by [`ScriptedClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    ReadRegistryModule,
    CreateConfigurationVersion,
    UploadConfigurationVersion,
    CreateTestRun,
    ReadTestRun,
    CancelTestRun,
    ForceCancelTestRun,
    ReadLogs,
}

type Hook = Box<dyn Fn(usize) + Send + Sync>;

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    statuses: VecDeque<RunStatus>,
    last_status: Option<RunStatus>,
    failures: HashMap<Call, ClientError>,
    hooks: Vec<(Call, Hook)>,
    holds: HashMap<Call, Arc<Notify>>,
    completed: Vec<Call>,
    poll_instants: Vec<Instant>,
    created: Option<TestRunCreateOptions>,
}

/// A fake remote service that:
/// - records every call it receives, in order
/// - answers `read_test_run` from a scripted status sequence (the last
///   status repeats once the script runs out)
/// - fails selected calls with a given error
/// - runs hooks when a call happens, e.g. to fire an interrupt mid-poll
/// - holds cancel requests open until a gate is released.
pub struct ScriptedClient {
    inner: Mutex<Inner>,
    logs: Vec<u8>,
    fail_logs_after_data: bool,
}

impl ScriptedClient {
    pub fn new(statuses: impl IntoIterator<Item = RunStatus>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                statuses: statuses.into_iter().collect(),
                ..Inner::default()
            }),
            logs: Vec::new(),
            fail_logs_after_data: false,
        }
    }

    /// Log stream returned by `read_logs`.
    pub fn with_logs(mut self, logs: impl Into<Vec<u8>>) -> Self {
        self.logs = logs.into();
        self
    }

    /// Make the log stream fail with an IO error once `logs` is consumed.
    pub fn with_failing_log_stream(mut self) -> Self {
        self.fail_logs_after_data = true;
        self
    }

    /// Fail every `call` with `err`.
    pub fn failing(self, call: Call, err: ClientError) -> Self {
        self.lock().failures.insert(call, err);
        self
    }

    /// Run `hook` with the 1-based count of `call` each time it is received.
    pub fn on_call(self, call: Call, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.lock().hooks.push((call, Box::new(hook)));
        self
    }

    /// Keep every `call` from finishing until `gate` is notified, once per
    /// call. A gate that is never notified models a request that hangs.
    pub fn holding(self, call: Call, gate: Arc<Notify>) -> Self {
        self.lock().holds.insert(call, gate);
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// How many `call`s have returned to the caller.
    pub fn completed(&self, call: Call) -> usize {
        self.lock().completed.iter().filter(|c| **c == call).count()
    }

    /// Instants at which `read_test_run` was received.
    pub fn poll_instants(&self) -> Vec<Instant> {
        self.lock().poll_instants.clone()
    }

    /// Options of the last `create_test_run` call.
    pub fn created_with(&self) -> Option<TestRunCreateOptions> {
        self.lock().created.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Record `call`, run its hooks and return the injected failure, if any.
    fn record(&self, call: Call) -> Result<(), ClientError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        let n = inner.calls.iter().filter(|c| **c == call).count();
        for (hooked, hook) in &inner.hooks {
            if *hooked == call {
                hook(n);
            }
        }
        match inner.failures.get(&call) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Wait for the gate of `call`, if it has one, then mark it completed.
    async fn finish(&self, call: Call) {
        let gate = self.lock().holds.get(&call).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.lock().completed.push(call);
    }

    fn next_status(&self) -> RunStatus {
        let mut inner = self.lock();
        inner.poll_instants.push(Instant::now());
        let status = inner
            .statuses
            .pop_front()
            .or(inner.last_status)
            .unwrap_or(RunStatus::Finished);
        inner.last_status = Some(status);
        status
    }
}

impl TestRunClient for ScriptedClient {
    fn read_registry_module<'a>(
        &'a self,
        id: &'a RegistryModuleId,
    ) -> ClientFuture<'a, RegistryModule> {
        Box::pin(async move {
            self.record(Call::ReadRegistryModule)?;
            Ok(RegistryModule {
                id: format!("mod-{}", id.name),
                name: id.name.clone(),
                provider: id.provider.clone(),
                namespace: id.namespace.clone(),
            })
        })
    }

    fn create_configuration_version<'a>(
        &'a self,
        _id: &'a RegistryModuleId,
    ) -> ClientFuture<'a, ConfigurationVersion> {
        Box::pin(async move {
            self.record(Call::CreateConfigurationVersion)?;
            Ok(ConfigurationVersion {
                id: "cv-1".to_string(),
                upload_url: "https://archivist.example.com/upload/cv-1".to_string(),
            })
        })
    }

    fn upload_configuration_version<'a>(
        &'a self,
        _upload_url: &'a str,
        _directory: &'a Path,
    ) -> ClientFuture<'a, ()> {
        Box::pin(async move { self.record(Call::UploadConfigurationVersion) })
    }

    fn create_test_run<'a>(&'a self, options: TestRunCreateOptions) -> ClientFuture<'a, TestRun> {
        Box::pin(async move {
            self.record(Call::CreateTestRun)?;
            self.lock().created = Some(options);
            Ok(TestRun {
                id: RUN_ID.to_string(),
                status: RunStatus::Pending,
            })
        })
    }

    fn read_test_run<'a>(&'a self, id: &'a str) -> ClientFuture<'a, TestRun> {
        Box::pin(async move {
            self.record(Call::ReadTestRun)?;
            Ok(TestRun {
                id: id.to_string(),
                status: self.next_status(),
            })
        })
    }

    fn cancel_test_run<'a>(&'a self, _id: &'a str) -> ClientFuture<'a, ()> {
        Box::pin(async move {
            let result = self.record(Call::CancelTestRun);
            self.finish(Call::CancelTestRun).await;
            result
        })
    }

    fn force_cancel_test_run<'a>(&'a self, _id: &'a str) -> ClientFuture<'a, ()> {
        Box::pin(async move {
            let result = self.record(Call::ForceCancelTestRun);
            self.finish(Call::ForceCancelTestRun).await;
            result
        })
    }

    fn read_logs<'a>(&'a self, _id: &'a str) -> ClientFuture<'a, LogStream> {
        Box::pin(async move {
            self.record(Call::ReadLogs)?;
            let stream: LogStream = Box::pin(ScriptedLogStream {
                data: self.logs.clone(),
                pos: 0,
                fail_at_end: self.fail_logs_after_data,
            });
            Ok(stream)
        })
    }
}

/// Serves `data`, then either end of stream or a read error.
pub struct ScriptedLogStream {
    data: Vec<u8>,
    pos: usize,
    fail_at_end: bool,
}

impl ScriptedLogStream {
    pub fn failing(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            fail_at_end: true,
        }
    }
}

impl AsyncRead for ScriptedLogStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let remaining = &self.data[self.pos..];
        if remaining.is_empty() {
            if self.fail_at_end {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )));
            }
            return Poll::Ready(Ok(()));
        }
        let n = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}

use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use crawldeck_logging::{deck_debug, deck_info, deck_warn};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::api::ConsoleApi;
use crate::{ApiCall, ApiReply, CallId, EngineEvent};

enum EngineCommand {
    Call { call_id: CallId, call: ApiCall },
    StartPolling { interval: Duration },
    StopPolling,
}

/// Runs backend calls and the poll timer on a private tokio runtime.
///
/// Cloning shares the same runtime thread; it exits once every handle is dropped.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(api: Arc<dyn ConsoleApi>) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("crawldeck-engine")
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("crawldeck-engine-commands".to_string())
            .spawn(move || run_commands(runtime, api, cmd_rx, event_tx))?;

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn call(&self, call_id: CallId, call: ApiCall) {
        let _ = self.cmd_tx.send(EngineCommand::Call { call_id, call });
    }

    /// Emits `EngineEvent::PollTick` every `interval`, replacing any running timer.
    pub fn start_polling(&self, interval: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::StartPolling { interval });
    }

    pub fn stop_polling(&self) {
        let _ = self.cmd_tx.send(EngineCommand::StopPolling);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }
}

fn run_commands(
    runtime: Runtime,
    api: Arc<dyn ConsoleApi>,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let mut poll_timer: Option<CancellationToken> = None;

    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::Call { call_id, call } => {
                let api = api.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    deck_debug!("Call {} -> {}", call_id, call.name());
                    let reply = execute(api.as_ref(), call).await;
                    let _ = event_tx.send(EngineEvent::Completed { call_id, reply });
                });
            }
            EngineCommand::StartPolling { interval } => {
                if let Some(previous) = poll_timer.take() {
                    previous.cancel();
                }
                let token = CancellationToken::new();
                runtime.spawn(poll(interval, token.clone(), event_tx.clone()));
                deck_info!("Polling every {:?}", interval);
                poll_timer = Some(token);
            }
            EngineCommand::StopPolling => {
                if let Some(token) = poll_timer.take() {
                    token.cancel();
                    deck_info!("Polling stopped");
                }
            }
        }
    }

    if let Some(token) = poll_timer.take() {
        token.cancel();
    }
    runtime.shutdown_timeout(Duration::from_secs(1));
}

async fn poll(interval: Duration, token: CancellationToken, event_tx: mpsc::Sender<EngineEvent>) {
    let start = tokio::time::Instant::now() + interval;
    let mut ticker = tokio::time::interval_at(start, interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if event_tx.send(EngineEvent::PollTick).is_err() {
                    break;
                }
            }
        }
    }
}

/// Runs one call against `api`, folding its outcome into the matching reply.
pub async fn execute(api: &dyn ConsoleApi, call: ApiCall) -> ApiReply {
    let name = call.name();
    let reply = match call {
        ApiCall::Login { email, password } => ApiReply::Token(api.login(&email, &password).await),
        ApiCall::Register {
            first_name,
            last_name,
            email,
            password,
        } => ApiReply::Token(
            api.register(&first_name, &last_name, &email, &password)
                .await,
        ),
        ApiCall::ListUrls => ApiReply::Urls(api.list_urls().await),
        ApiCall::AddUrl { url } => ApiReply::Ack(api.add_url(&url).await),
        ApiCall::DeleteUrl { id } => ApiReply::Ack(api.delete_url(id).await),
        ApiCall::StartUrls { ids } => ApiReply::Ack(api.start_urls(&ids).await),
        ApiCall::StopUrls { ids } => ApiReply::Ack(api.stop_urls(&ids).await),
        ApiCall::LinkCount { id } => ApiReply::LinkCount(api.link_count(id).await),
        ApiCall::BrokenLinks { id } => ApiReply::BrokenLinks(api.broken_links(id).await),
    };
    if let Some(err) = reply_error(&reply) {
        deck_warn!("{} failed: {}", name, err);
    }
    reply
}

fn reply_error(reply: &ApiReply) -> Option<&crate::ApiError> {
    match reply {
        ApiReply::Token(result) => result.as_ref().err(),
        ApiReply::Urls(result) => result.as_ref().err(),
        ApiReply::Ack(result) => result.as_ref().err(),
        ApiReply::LinkCount(result) => result.as_ref().err(),
        ApiReply::BrokenLinks(result) => result.as_ref().err(),
    }
}

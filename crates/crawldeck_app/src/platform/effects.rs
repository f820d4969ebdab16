use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use crawldeck_core::{
    BrokenLink, Command, CredentialStore, Effect, FetchTicket, LinkStats, Msg, PanelKey,
    RequestFailure, SessionSnapshot, SessionStore, TrackedUrl,
};
use crawldeck_engine::{
    ApiCall, ApiError, ApiReply, CallId, EngineEvent, EngineHandle, FailureKind, UrlRecord,
};
use crawldeck_logging::{deck_debug, deck_error, deck_info, enter_call};

use super::app::AppEvent;

/// What an outstanding engine call was for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Login,
    Register,
    Rows(FetchTicket),
    Command(Command),
    LinkStats(PanelKey),
    BrokenLinks(PanelKey),
}

type PendingCalls = Arc<Mutex<HashMap<CallId, Pending>>>;

/// Executes effects: session transitions inline, everything else on the engine.
pub struct EffectRunner {
    engine: EngineHandle,
    session: SessionStore<Arc<dyn CredentialStore>>,
    pending: PendingCalls,
    next_call: CallId,
    event_tx: mpsc::Sender<AppEvent>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        session: SessionStore<Arc<dyn CredentialStore>>,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        let runner = Self {
            engine,
            session,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_call: 0,
            event_tx,
        };
        runner.spawn_event_loop();
        runner
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            deck_debug!("Effect {}", effect.name());
            match effect {
                Effect::Authenticate { email, password } => {
                    self.call(Pending::Login, ApiCall::Login { email, password });
                }
                Effect::Register {
                    first_name,
                    last_name,
                    email,
                    password,
                } => {
                    self.call(
                        Pending::Register,
                        ApiCall::Register {
                            first_name,
                            last_name,
                            email,
                            password,
                        },
                    );
                }
                Effect::EstablishSession { token } => {
                    if self.session.login(token).is_none() {
                        deck_info!("Backend issued a credential that does not decode");
                    }
                    self.send(Msg::SessionChanged(self.session.snapshot()));
                }
                Effect::EndSession => {
                    self.session.logout();
                    self.send(Msg::SessionChanged(self.session.snapshot()));
                }
                Effect::StartPolling { interval } => self.engine.start_polling(interval),
                Effect::StopPolling => self.engine.stop_polling(),
                Effect::FetchRows { ticket } => {
                    self.call(Pending::Rows(ticket), ApiCall::ListUrls);
                }
                Effect::SendCommand { command } => {
                    let call = command_call(&command);
                    self.call(Pending::Command(command), call);
                }
                Effect::LoadLinkStats { key } => {
                    self.call(Pending::LinkStats(key), ApiCall::LinkCount { id: key.url_id });
                }
                Effect::LoadBrokenLinks { key } => {
                    self.call(
                        Pending::BrokenLinks(key),
                        ApiCall::BrokenLinks { id: key.url_id },
                    );
                }
            }
        }
    }

    fn call(&mut self, pending: Pending, call: ApiCall) {
        self.next_call += 1;
        let call_id = self.next_call;
        let _scope = enter_call(call_id);
        deck_debug!("Issuing {} for {:?}", call.name(), pending);
        if let Ok(mut calls) = self.pending.lock() {
            calls.insert(call_id, pending);
        }
        self.engine.call(call_id, call);
    }

    fn send(&self, msg: Msg) {
        let _ = self.event_tx.send(AppEvent::Msg(msg));
    }

    fn spawn_event_loop(&self) {
        let engine = self.engine.clone();
        let pending = self.pending.clone();
        let event_tx = self.event_tx.clone();
        thread::spawn(move || loop {
            let Some(event) = engine.recv_timeout(Duration::from_millis(250)) else {
                continue;
            };
            let msg = match event {
                EngineEvent::PollTick => Msg::PollTick,
                EngineEvent::Completed { call_id, reply } => {
                    let _scope = enter_call(call_id);
                    let context = pending.lock().ok().and_then(|mut calls| calls.remove(&call_id));
                    match context {
                        Some(context) => reply_to_msg(context, reply),
                        None => {
                            deck_error!("Reply for unknown call {}", call_id);
                            continue;
                        }
                    }
                }
            };
            if event_tx.send(AppEvent::Msg(msg)).is_err() {
                break;
            }
        });
    }
}

fn command_call(command: &Command) -> ApiCall {
    match command {
        Command::Start { ids } => ApiCall::StartUrls { ids: ids.clone() },
        Command::Stop { ids } => ApiCall::StopUrls { ids: ids.clone() },
        Command::Delete { id } => ApiCall::DeleteUrl { id: *id },
        Command::Create { url } => ApiCall::AddUrl { url: url.clone() },
    }
}

fn reply_to_msg(context: Pending, reply: ApiReply) -> Msg {
    match (context, reply) {
        (Pending::Login, ApiReply::Token(result)) => Msg::LoginReplied(result.map_err(to_failure)),
        (Pending::Register, ApiReply::Token(result)) => {
            Msg::RegisterReplied(result.map_err(to_failure))
        }
        (Pending::Rows(ticket), ApiReply::Urls(result)) => {
            deck_debug!("Rows arrived for fetch {}", ticket.seq);
            Msg::RowsFetched {
                ticket,
                result: result
                    .map(|records| records.into_iter().map(to_row).collect())
                    .map_err(to_failure),
            }
        }
        (Pending::Command(command), ApiReply::Ack(result)) => Msg::CommandReplied {
            command,
            result: result.map_err(to_failure),
        },
        (Pending::LinkStats(key), ApiReply::LinkCount(result)) => Msg::LinkStatsLoaded {
            key,
            result: result
                .map(|counts| LinkStats {
                    internal: counts.internal,
                    external: counts.external,
                })
                .map_err(to_failure),
        },
        (Pending::BrokenLinks(key), ApiReply::BrokenLinks(result)) => Msg::BrokenLinksLoaded {
            key,
            result: result
                .map(|links| {
                    links
                        .into_iter()
                        .map(|link| BrokenLink {
                            href: link.href,
                            status_code: link.status_code,
                        })
                        .collect()
                })
                .map_err(to_failure),
        },
        (context, reply) => {
            deck_error!("Mismatched reply {:?} for {:?}", reply, context);
            Msg::NoOp
        }
    }
}

fn to_row(record: UrlRecord) -> TrackedUrl {
    TrackedUrl::from_wire(
        record.id,
        record.url,
        &record.status,
        record.updated_at.as_deref().unwrap_or_default(),
    )
}

fn to_failure(err: ApiError) -> RequestFailure {
    match err.kind {
        FailureKind::HttpStatus(code) => RequestFailure::Status {
            code,
            message: err.server_message().map(str::to_string),
        },
        FailureKind::Decode => RequestFailure::Malformed,
        FailureKind::InvalidUrl | FailureKind::Timeout | FailureKind::Network => {
            RequestFailure::Network
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawldeck_core::UrlStatus;

    fn status_error(code: u16, message: &str) -> ApiError {
        ApiError {
            kind: FailureKind::HttpStatus(code),
            message: message.to_string(),
        }
    }

    #[test]
    fn failures_map_to_request_failures() {
        assert_eq!(
            to_failure(status_error(409, "URL already exists")),
            RequestFailure::Status {
                code: 409,
                message: Some("URL already exists".to_string())
            }
        );
        assert_eq!(to_failure(status_error(500, "")), RequestFailure::status(500));
        let timeout = ApiError {
            kind: FailureKind::Timeout,
            message: "slow".to_string(),
        };
        assert_eq!(to_failure(timeout), RequestFailure::Network);
    }

    #[test]
    fn url_records_become_rows() {
        let row = to_row(UrlRecord {
            id: 5,
            url: "https://example.com".to_string(),
            status: "PROCESSING".to_string(),
            updated_at: Some("2024-05-01T10:00:00Z".to_string()),
        });
        assert_eq!(row.id, 5);
        assert_eq!(row.status, UrlStatus::Processing);
        assert_eq!(row.last_updated_label(), "2024-05-01 10:00:00");
    }

    #[test]
    fn replies_carry_their_context() {
        let ticket = FetchTicket { epoch: 1, seq: 3 };
        let msg = reply_to_msg(Pending::Rows(ticket), ApiReply::Urls(Ok(Vec::new())));
        assert_eq!(
            msg,
            Msg::RowsFetched {
                ticket,
                result: Ok(Vec::new())
            }
        );

        let command = Command::Delete { id: 4 };
        let msg = reply_to_msg(Pending::Command(command.clone()), ApiReply::Ack(Ok(())));
        assert_eq!(
            msg,
            Msg::CommandReplied {
                command,
                result: Ok(())
            }
        );
    }

    #[test]
    fn mismatched_reply_is_dropped() {
        let msg = reply_to_msg(Pending::Login, ApiReply::Ack(Ok(())));
        assert_eq!(msg, Msg::NoOp);
    }

    #[test]
    fn commands_map_to_calls() {
        assert_eq!(
            command_call(&Command::Start { ids: vec![1, 2] }),
            ApiCall::StartUrls { ids: vec![1, 2] }
        );
        assert_eq!(
            command_call(&Command::Create {
                url: "example.com".to_string()
            }),
            ApiCall::AddUrl {
                url: "example.com".to_string()
            }
        );
    }
}

use std::time::Duration;

use crate::analytics::PanelKey;
use crate::dispatch::Command;
use crate::sync::FetchTicket;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Authenticate {
        email: String,
        password: String,
    },
    Register {
        first_name: String,
        last_name: String,
        email: String,
        password: String,
    },
    /// Hand the token to the session store.
    EstablishSession { token: String },
    EndSession,
    StartPolling { interval: Duration },
    StopPolling,
    FetchRows { ticket: FetchTicket },
    SendCommand { command: Command },
    LoadLinkStats { key: PanelKey },
    LoadBrokenLinks { key: PanelKey },
}

impl Effect {
    /// Short name for logs; never includes credentials.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Authenticate { .. } => "Authenticate",
            Effect::Register { .. } => "Register",
            Effect::EstablishSession { .. } => "EstablishSession",
            Effect::EndSession => "EndSession",
            Effect::StartPolling { .. } => "StartPolling",
            Effect::StopPolling => "StopPolling",
            Effect::FetchRows { .. } => "FetchRows",
            Effect::SendCommand { .. } => "SendCommand",
            Effect::LoadLinkStats { .. } => "LoadLinkStats",
            Effect::LoadBrokenLinks { .. } => "LoadBrokenLinks",
        }
    }
}

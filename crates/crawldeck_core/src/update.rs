use crawldeck_logging::{deck_debug, deck_info, deck_warn};

use crate::analytics::AnalyticsPanel;
use crate::dispatch::{self, Command, Refusal};
use crate::failure::RequestFailure;
use crate::forms;
use crate::guard::Route;
use crate::msg::{AuthMode, FormField, TICK_INTERVAL};
use crate::session::SessionSnapshot;
use crate::state::{Notice, Pagination, PAGE_SIZE_OPTIONS};
use crate::sync::{FetchTicket, SyncTrigger};
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Navigate(route) => navigate(&mut state, route),
        Msg::AuthModeSelected(mode) => {
            if state.auth_mode != mode {
                state.auth_mode = mode;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::AuthFieldChanged { field, value } => {
            edit_auth_field(&mut state, field, value);
            state.mark_dirty();
            Vec::new()
        }
        Msg::AuthSubmitted => submit_auth(&mut state),
        Msg::LoginReplied(result) => {
            state.sign_in.submitting = false;
            state.mark_dirty();
            match result {
                Ok(token) => {
                    state.sign_in.password.clear();
                    vec![Effect::EstablishSession { token }]
                }
                Err(failure) => {
                    deck_warn!("Login rejected: {}", failure);
                    state.sign_in.errors = forms::sign_in_failure(&failure);
                    Vec::new()
                }
            }
        }
        Msg::RegisterReplied(result) => {
            state.sign_up.submitting = false;
            state.mark_dirty();
            match result {
                Ok(token) => {
                    state.sign_up.password.clear();
                    vec![Effect::EstablishSession { token }]
                }
                Err(failure) => {
                    deck_warn!("Sign-up failed: {}", failure);
                    state.sign_up.errors = forms::sign_up_failure(&failure);
                    Vec::new()
                }
            }
        }
        Msg::SessionChanged(snapshot) => session_changed(&mut state, snapshot),
        Msg::LogoutClicked => {
            if state.session.credential.is_some() || state.session.identity.is_some() {
                vec![Effect::EndSession]
            } else {
                Vec::new()
            }
        }
        Msg::PollTick => fetch_if_issued(&mut state, SyncTrigger::Interval),
        Msg::RefreshRequested => fetch_if_issued(&mut state, SyncTrigger::Invalidated),
        Msg::RowsFetched { ticket, result } => {
            let completion = state.table.complete(ticket, result);
            if completion.applied {
                state.mark_dirty();
            }
            completion
                .next
                .map(|ticket| vec![fetch_rows(ticket)])
                .unwrap_or_default()
        }
        Msg::SearchChanged(query) => {
            if state.search != query {
                state.search = query;
                state.pagination.page = 0;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PageSelected(page) => {
            state.pagination.page = page;
            state.mark_dirty();
            Vec::new()
        }
        Msg::PageSizeSelected(size) => {
            if PAGE_SIZE_OPTIONS.contains(&size) {
                state.pagination = Pagination::new(size);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StartClicked(ids) => {
            let decision = dispatch::authorize_start(state.identity(), state.table.rows(), &ids);
            send_or_refuse(&mut state, decision)
        }
        Msg::StopClicked(ids) => {
            let decision = dispatch::authorize_stop(state.identity(), state.table.rows(), &ids);
            send_or_refuse(&mut state, decision)
        }
        Msg::DeleteRequested(id) => {
            let decision = dispatch::authorize_delete(state.identity(), state.table.rows(), id);
            match decision {
                Ok(_) => state.pending_delete = Some(id),
                Err(refusal) => refuse(&mut state, refusal),
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::DeleteConfirmed => match state.pending_delete.take() {
            Some(id) => {
                let decision = dispatch::authorize_delete(state.identity(), state.table.rows(), id);
                send_or_refuse(&mut state, decision)
            }
            None => Vec::new(),
        },
        Msg::DeleteCancelled => {
            if state.pending_delete.take().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::AddUrlOpened => {
            if state.identity().is_some_and(|identity| identity.is_admin()) {
                state.add_url.open = true;
                state.add_url.error = None;
            } else {
                refuse(&mut state, Refusal::NotPermitted);
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::AddUrlInputChanged(input) => {
            state.add_url.input = input;
            state.mark_dirty();
            Vec::new()
        }
        Msg::AddUrlSubmitted => submit_add_url(&mut state),
        Msg::AddUrlCancelled => {
            state.add_url = forms::AddUrlForm::default();
            state.mark_dirty();
            Vec::new()
        }
        Msg::CommandReplied { command, result } => command_replied(&mut state, command, result),
        Msg::AnalyticsOpened(id) => {
            let Some(url) = state.table.row(id).map(|row| row.url.clone()) else {
                deck_debug!("Analytics requested for unknown row {}", id);
                return (state, Vec::new());
            };
            let key = state.next_panel_key(id);
            state.analytics = Some(AnalyticsPanel::open(key, url));
            state.mark_dirty();
            vec![Effect::LoadLinkStats { key }, Effect::LoadBrokenLinks { key }]
        }
        Msg::AnalyticsClosed => {
            if state.analytics.take().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::LinkStatsLoaded { key, result } => {
            if let Some(panel) = state.analytics.as_mut() {
                if panel.resolve_stats(key, result) {
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::BrokenLinksLoaded { key, result } => {
            if let Some(panel) = state.analytics.as_mut() {
                if panel.resolve_broken_links(key, result) {
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::NoticeDismissed => {
            if !state.notices.is_empty() {
                state.notices.remove(0);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick => {
            state.expire_notices(TICK_INTERVAL);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn fetch_rows(ticket: FetchTicket) -> Effect {
    Effect::FetchRows { ticket }
}

fn fetch_if_issued(state: &mut AppState, trigger: SyncTrigger) -> Vec<Effect> {
    match state.table.request(trigger) {
        Some(ticket) => {
            state.mark_dirty();
            vec![fetch_rows(ticket)]
        }
        None => Vec::new(),
    }
}

fn mount_table(state: &mut AppState) -> Vec<Effect> {
    if state.table.is_mounted() {
        return Vec::new();
    }
    let ticket = state.table.mount();
    vec![
        Effect::StartPolling {
            interval: state.poll_interval,
        },
        fetch_rows(ticket),
    ]
}

fn unmount_table(state: &mut AppState) -> Vec<Effect> {
    if !state.table.is_mounted() {
        return Vec::new();
    }
    state.table.unmount();
    state.pending_delete = None;
    state.analytics = None;
    state.add_url = forms::AddUrlForm::default();
    vec![Effect::StopPolling]
}

fn navigate(state: &mut AppState, requested: Route) -> Vec<Effect> {
    // The guard only checked credential presence; an undecodable one lands here.
    let route = if requested.is_protected() && !state.session.is_authenticated() {
        Route::Auth
    } else {
        requested
    };
    if route != state.route {
        deck_info!("Route {:?} -> {:?}", state.route, route);
        state.route = route;
        state.mark_dirty();
    }
    match route {
        Route::Dashboard => mount_table(state),
        Route::Auth | Route::NotFound => unmount_table(state),
    }
}

fn session_changed(state: &mut AppState, snapshot: SessionSnapshot) -> Vec<Effect> {
    let authenticated = snapshot.is_authenticated();
    state.session = snapshot;
    state.mark_dirty();
    if authenticated {
        state.sign_in = forms::SignInForm::default();
        state.sign_up = forms::SignUpForm::default();
        if state.route == Route::Auth {
            return navigate(state, Route::Dashboard);
        }
        Vec::new()
    } else if state.route == Route::Dashboard {
        navigate(state, Route::Auth)
    } else {
        Vec::new()
    }
}

fn edit_auth_field(state: &mut AppState, field: FormField, value: String) {
    match (state.auth_mode, field) {
        (AuthMode::SignIn, FormField::Email) => state.sign_in.email = value,
        (AuthMode::SignIn, FormField::Password) => state.sign_in.password = value,
        (AuthMode::SignIn, FormField::FirstName | FormField::LastName) => {}
        (AuthMode::SignUp, FormField::FirstName) => state.sign_up.first_name = value,
        (AuthMode::SignUp, FormField::LastName) => state.sign_up.last_name = value,
        (AuthMode::SignUp, FormField::Email) => state.sign_up.email = value,
        (AuthMode::SignUp, FormField::Password) => state.sign_up.password = value,
    }
}

fn submit_auth(state: &mut AppState) -> Vec<Effect> {
    state.mark_dirty();
    match state.auth_mode {
        AuthMode::SignIn => {
            if state.sign_in.submitting {
                return Vec::new();
            }
            state.sign_in.errors = forms::validate_sign_in(&state.sign_in);
            if !state.sign_in.errors.is_empty() {
                return Vec::new();
            }
            state.sign_in.submitting = true;
            vec![Effect::Authenticate {
                email: state.sign_in.email.trim().to_string(),
                password: state.sign_in.password.clone(),
            }]
        }
        AuthMode::SignUp => {
            if state.sign_up.submitting {
                return Vec::new();
            }
            state.sign_up.errors = forms::validate_sign_up(&state.sign_up);
            if !state.sign_up.errors.is_empty() {
                return Vec::new();
            }
            state.sign_up.submitting = true;
            vec![Effect::Register {
                first_name: state.sign_up.first_name.trim().to_string(),
                last_name: state.sign_up.last_name.trim().to_string(),
                email: state.sign_up.email.trim().to_string(),
                password: state.sign_up.password.clone(),
            }]
        }
    }
}

fn submit_add_url(state: &mut AppState) -> Vec<Effect> {
    state.mark_dirty();
    if state.add_url.submitting {
        return Vec::new();
    }
    match dispatch::authorize_create(state.identity(), &state.add_url.input) {
        Ok(command) => {
            state.add_url.error = None;
            state.add_url.submitting = true;
            vec![Effect::SendCommand { command }]
        }
        Err(Refusal::InvalidUrl) => {
            state.add_url.error = Some(forms::INVALID_URL.to_string());
            Vec::new()
        }
        Err(refusal) => {
            refuse(state, refusal);
            Vec::new()
        }
    }
}

fn send_or_refuse(state: &mut AppState, decision: Result<Command, Refusal>) -> Vec<Effect> {
    match decision {
        Ok(command) => {
            deck_info!("Dispatching {:?}", command);
            vec![Effect::SendCommand { command }]
        }
        Err(refusal) => {
            refuse(state, refusal);
            state.mark_dirty();
            Vec::new()
        }
    }
}

fn refuse(state: &mut AppState, refusal: Refusal) {
    deck_warn!("Action refused: {}", refusal);
    state.push_notice(Notice::error(refusal.to_string()));
}

fn command_replied(
    state: &mut AppState,
    command: Command,
    result: Result<(), RequestFailure>,
) -> Vec<Effect> {
    state.mark_dirty();
    match result {
        Ok(()) => {
            deck_info!("Command {} accepted", command.name());
            match &command {
                Command::Create { .. } => {
                    state.add_url = forms::AddUrlForm::default();
                    state.push_notice(Notice::success("URL added successfully"));
                }
                Command::Delete { id } => {
                    if state.analytics.as_ref().is_some_and(|panel| panel.url_id() == *id) {
                        state.analytics = None;
                    }
                    state.push_notice(Notice::success("URL deleted successfully"));
                }
                Command::Start { .. } | Command::Stop { .. } => {}
            }
            fetch_if_issued(state, SyncTrigger::Invalidated)
        }
        Err(failure) => {
            deck_warn!("Command {} failed: {}", command.name(), failure);
            match command {
                Command::Create { .. } => {
                    state.add_url.submitting = false;
                    state.add_url.error = Some(if failure.is_conflict() {
                        forms::URL_ALREADY_TRACKED.to_string()
                    } else {
                        failure.to_string()
                    });
                }
                Command::Delete { .. } => {
                    state.push_notice(Notice::error(format!("Delete failed: {failure}")));
                }
                Command::Start { .. } | Command::Stop { .. } => {
                    state.push_notice(Notice::error(format!(
                        "Could not {} URL: {failure}",
                        command.name()
                    )));
                }
            }
            Vec::new()
        }
    }
}

//! Line-oriented input: one command per line, first word selects it.

use crawldeck_core::{AuthMode, FormField, Msg, Route, UrlId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Messages to dispatch in order.
    Msgs(Vec<Msg>),
    /// Navigation; goes through the route guard before it becomes a message.
    Go(Route),
    Help,
    Quit,
    Empty,
}

pub const HELP: &str = "\
Commands:
  go <path>              /auth, /dashboard
  signin | signup        switch auth form
  first|last|email|password <value>
  submit                 submit the auth form
  logout
  refresh                refetch the table now
  search [text]          filter rows (no text clears)
  page <n> | size <10|20|50>
  start <ids> | stop <ids>   ids separated by commas or spaces
  delete <id>, then confirm | cancel
  add [url]              open the add form, or add directly
  url <text> | save | discard
  analytics <id> | close
  dismiss                drop the oldest notice
  help | quit";

pub fn parse(line: &str) -> Result<Input, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let msg = match word.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" | "q" => return Ok(Input::Quit),
        "go" => return Ok(Input::Go(Route::from_path(&normalize_path(rest)))),
        "signin" => Msg::AuthModeSelected(AuthMode::SignIn),
        "signup" => Msg::AuthModeSelected(AuthMode::SignUp),
        "first" => field(FormField::FirstName, rest),
        "last" => field(FormField::LastName, rest),
        "email" => field(FormField::Email, rest),
        "password" => field(FormField::Password, rest),
        "submit" => Msg::AuthSubmitted,
        "logout" => Msg::LogoutClicked,
        "refresh" => Msg::RefreshRequested,
        "search" => Msg::SearchChanged(rest.to_string()),
        "page" => Msg::PageSelected(number(rest)?.saturating_sub(1) as usize),
        "size" => Msg::PageSizeSelected(number(rest)? as usize),
        "start" => Msg::StartClicked(ids(rest)?),
        "stop" => Msg::StopClicked(ids(rest)?),
        "delete" => Msg::DeleteRequested(number(rest)?),
        "confirm" => Msg::DeleteConfirmed,
        "cancel" => Msg::DeleteCancelled,
        "add" if rest.is_empty() => Msg::AddUrlOpened,
        "add" => {
            return Ok(Input::Msgs(vec![
                Msg::AddUrlOpened,
                Msg::AddUrlInputChanged(rest.to_string()),
                Msg::AddUrlSubmitted,
            ]))
        }
        "url" => Msg::AddUrlInputChanged(rest.to_string()),
        "save" => Msg::AddUrlSubmitted,
        "discard" => Msg::AddUrlCancelled,
        "analytics" => Msg::AnalyticsOpened(number(rest)?),
        "close" => Msg::AnalyticsClosed,
        "dismiss" => Msg::NoticeDismissed,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(Input::Msgs(vec![msg]))
}

fn field(field: FormField, value: &str) -> Msg {
    Msg::AuthFieldChanged {
        field,
        value: value.to_string(),
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn number(text: &str) -> Result<u64, String> {
    text.parse::<u64>()
        .map_err(|_| format!("expected a number, got '{text}'"))
}

fn ids(text: &str) -> Result<Vec<UrlId>, String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(number)
        .collect()
}

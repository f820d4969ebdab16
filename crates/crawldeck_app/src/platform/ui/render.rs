use std::fmt::Write as _;

use crawldeck_core::forms::FieldErrors;
use crawldeck_core::{
    AnalyticsPanel, AppViewModel, AuthMode, NoticeLevel, Panel, RowActions, RowView, Route,
    TableView,
};

pub const FALLBACK: &str = "Something went wrong.";

pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    match view.route {
        Route::Auth => render_auth(&mut out, view),
        Route::Dashboard => render_dashboard(&mut out, view),
        Route::NotFound => {
            out.push_str("404 - Page not found.\n");
            out.push_str("Use 'go /dashboard' or 'go /auth'.\n");
        }
    }
    render_notices(&mut out, view);
    out
}

fn render_auth(out: &mut String, view: &AppViewModel) {
    let auth = &view.auth;
    match auth.mode {
        AuthMode::SignIn => {
            out.push_str("== Sign in ==\n");
            let _ = writeln!(out, "  email:    {}", auth.email);
            out.push_str("  password: ********\n");
        }
        AuthMode::SignUp => {
            out.push_str("== Sign up ==\n");
            let _ = writeln!(out, "  first:    {}", auth.first_name);
            let _ = writeln!(out, "  last:     {}", auth.last_name);
            let _ = writeln!(out, "  email:    {}", auth.email);
            out.push_str("  password: ********\n");
        }
    }
    render_field_errors(out, &auth.errors);
    if auth.submitting {
        out.push_str("  ... submitting\n");
    }
}

fn render_field_errors(out: &mut String, errors: &FieldErrors) {
    let labelled = [
        ("name", &errors.name),
        ("email", &errors.email),
        ("password", &errors.password),
        ("error", &errors.general),
    ];
    for (label, message) in labelled {
        if let Some(message) = message {
            let _ = writeln!(out, "  ! {label}: {message}");
        }
    }
}

fn render_dashboard(out: &mut String, view: &AppViewModel) {
    if let Some(identity) = &view.identity {
        let _ = writeln!(
            out,
            "== Dashboard == {} <{}> [{}]",
            identity.name,
            identity.email,
            identity.role.as_str()
        );
    }
    render_table(out, &view.table);

    if let Some(id) = view.pending_delete {
        let _ = writeln!(out, "Delete URL {id}? 'confirm' or 'cancel'");
    }
    if view.add_url.open {
        let _ = writeln!(out, "Add URL: {}", view.add_url.input);
        if let Some(error) = &view.add_url.error {
            let _ = writeln!(out, "  ! {error}");
        }
        if view.add_url.submitting {
            out.push_str("  ... adding\n");
        }
    }
    if let Some(panel) = &view.analytics {
        render_analytics(out, panel);
    }
}

fn render_table(out: &mut String, table: &TableView) {
    let mut flags = Vec::new();
    if table.loading {
        flags.push("loading");
    }
    if table.stale {
        flags.push("refresh failed, showing last result");
    }
    let search = if table.search.is_empty() {
        String::new()
    } else {
        format!(" | search '{}': {} match(es)", table.search, table.matching_rows)
    };
    let _ = writeln!(
        out,
        "{} URLs{}{}",
        table.total_rows,
        search,
        if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        }
    );

    if table.rows.is_empty() {
        out.push_str("  (no rows)\n");
    } else {
        let _ = writeln!(
            out,
            "  {:>5}  {:<40}  {:<10}  {:<19}  actions",
            "id", "url", "status", "updated"
        );
        for row in &table.rows {
            render_row(out, row);
        }
    }
    let _ = writeln!(
        out,
        "  page {}/{} ({} per page)",
        table.page + 1,
        table.page_count,
        table.page_size
    );
}

fn render_row(out: &mut String, row: &RowView) {
    let _ = writeln!(
        out,
        "  {:>5}  {:<40}  {:<10}  {:<19}  {}",
        row.id,
        truncate(&row.url, 40),
        row.status.label(),
        row.last_updated,
        actions_label(&row.actions)
    );
}

fn actions_label(actions: &RowActions) -> String {
    let mut labels = Vec::new();
    if actions.can_start {
        labels.push("start");
    }
    if actions.can_restart {
        labels.push("restart");
    }
    if actions.can_stop {
        labels.push("stop");
    }
    if actions.can_delete {
        labels.push("delete");
    }
    labels.join(" ")
}

fn render_analytics(out: &mut String, panel: &AnalyticsPanel) {
    let _ = writeln!(out, "-- Analytics: {} --", panel.url);
    match &panel.stats {
        Panel::Loading => out.push_str("  links: loading...\n"),
        Panel::Failed(message) => {
            let _ = writeln!(out, "  links: {message}");
        }
        Panel::Loaded(stats) => {
            let _ = writeln!(
                out,
                "  links: {} internal, {} external",
                stats.internal, stats.external
            );
        }
    }
    match &panel.broken_links {
        Panel::Loading => out.push_str("  broken: loading...\n"),
        Panel::Failed(message) => {
            let _ = writeln!(out, "  broken: {message}");
        }
        Panel::Loaded(links) if links.is_empty() => out.push_str("  broken: none\n"),
        Panel::Loaded(links) => {
            let _ = writeln!(out, "  broken: {}", links.len());
            for link in links {
                let _ = writeln!(out, "    {} {}", link.status_code, link.href);
            }
        }
    }
}

fn render_notices(out: &mut String, view: &AppViewModel) {
    for notice in &view.notices {
        let marker = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "!!",
        };
        let _ = writeln!(out, "[{marker}] {}", notice.text);
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

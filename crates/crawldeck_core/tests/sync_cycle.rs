mod common;

use std::time::Duration;

use common::{fetch_count, fetch_ticket, init_logging, row, signed_in, with_rows};
use crawldeck_core::{
    update, Effect, Msg, RequestFailure, Role, Route, SessionSnapshot, SyncPhase, UrlStatus,
};
use pretty_assertions::assert_eq;

#[test]
fn signing_in_mounts_the_table_and_starts_polling() {
    init_logging();
    let (state, _) = signed_in(Role::User);
    assert_eq!(state.route(), Route::Dashboard);
    assert!(state.table().is_mounted());
    assert_eq!(state.table().phase(), SyncPhase::Fetching);
}

#[test]
fn mount_effects_start_timer_then_fetch() {
    init_logging();
    let snapshot = SessionSnapshot {
        credential: Some("t".into()),
        identity: Some(common::identity(Role::User)),
    };
    let (_, effects) = update(crawldeck_core::AppState::new(), Msg::SessionChanged(snapshot));
    assert_eq!(effects.len(), 2);
    assert_eq!(
        effects[0],
        Effect::StartPolling {
            interval: Duration::from_secs(10)
        }
    );
    assert!(matches!(effects[1], Effect::FetchRows { .. }));
}

#[test]
fn overlapping_invalidations_issue_exactly_one_follow_up_fetch() {
    init_logging();
    let (state, first) = signed_in(Role::Admin);

    let (state, effects) = update(state, Msg::RefreshRequested);
    assert_eq!(fetch_count(&effects), 0);
    let (state, effects) = update(state, Msg::PollTick);
    assert_eq!(fetch_count(&effects), 0);
    assert!(state.table().has_pending());

    let (state, effects) = update(
        state,
        Msg::RowsFetched {
            ticket: first,
            result: Ok(vec![row(1, UrlStatus::Queued)]),
        },
    );
    assert_eq!(fetch_count(&effects), 1);
    let second = fetch_ticket(&effects).unwrap();
    assert_ne!(first, second);

    let (state, effects) = update(
        state,
        Msg::RowsFetched {
            ticket: second,
            result: Ok(vec![row(1, UrlStatus::Processing)]),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.table().phase(), SyncPhase::Settled);
    assert!(!state.table().has_pending());
}

#[test]
fn rows_are_replaced_wholesale_and_sorted_newest_first() {
    init_logging();
    let state = with_rows(
        Role::User,
        vec![
            row(2, UrlStatus::Done),
            row(9, UrlStatus::Queued),
            row(4, UrlStatus::Error),
        ],
    );
    let ids: Vec<_> = state.view().table.rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![9, 4, 2]);

    let (state, effects) = update(state, Msg::PollTick);
    let ticket = fetch_ticket(&effects).unwrap();
    let (state, _) = update(
        state,
        Msg::RowsFetched {
            ticket,
            result: Ok(vec![row(4, UrlStatus::Done)]),
        },
    );
    let ids: Vec<_> = state.view().table.rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![4]);
}

#[test]
fn failed_refresh_keeps_rows_and_retries_next_cycle() {
    init_logging();
    let state = with_rows(Role::User, vec![row(1, UrlStatus::Queued)]);
    let (state, effects) = update(state, Msg::PollTick);
    let ticket = fetch_ticket(&effects).unwrap();

    let (state, effects) = update(
        state,
        Msg::RowsFetched {
            ticket,
            result: Err(RequestFailure::Network),
        },
    );
    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.table.stale);
    assert_eq!(view.table.rows.len(), 1);
    assert!(view.notices.is_empty());

    let (_, effects) = update(state, Msg::PollTick);
    assert_eq!(fetch_count(&effects), 1);
}

#[test]
fn logout_unmounts_and_discards_in_flight_results() {
    init_logging();
    let (state, ticket) = signed_in(Role::Admin);
    let (state, effects) = update(state, Msg::SessionChanged(SessionSnapshot::default()));
    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.route(), Route::Auth);

    let (mut state, effects) = update(
        state,
        Msg::RowsFetched {
            ticket,
            result: Ok(vec![row(1, UrlStatus::Queued)]),
        },
    );
    assert!(effects.is_empty());
    assert!(state.table().rows().is_empty());
    state.consume_dirty();

    let (mut state, effects) = update(state, Msg::PollTick);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}

#[test]
fn dashboard_without_identity_redirects_to_auth() {
    init_logging();
    let (state, effects) = update(crawldeck_core::AppState::new(), Msg::Navigate(Route::Dashboard));
    assert_eq!(state.route(), Route::Auth);
    assert!(effects.is_empty());
}

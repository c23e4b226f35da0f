use axum::Json;
use axum::extract::{Extension, Query, State};

use crate::dto::AccessCheckQuery;
use crate::test_support::seeded_parish;

use super::{access_check_handler, access_summary_handler, refresh_access_handler};

fn query(subject: &str, action: &str) -> AccessCheckQuery {
    AccessCheckQuery {
        subject: subject.to_owned(),
        action: action.to_owned(),
        resource_type: None,
    }
}

#[tokio::test]
async fn check_reports_granted_and_default_keys() {
    let parish = seeded_parish().await;

    let alice = access_check_handler(
        State(parish.state.clone()),
        Extension(parish.alice.clone()),
        Query(query("celulas", "manage")),
    )
    .await;
    assert!(matches!(alice, Ok(Json(ref response)) if response.allowed));

    let bob_financeiro = access_check_handler(
        State(parish.state.clone()),
        Extension(parish.bob.clone()),
        Query(query("financeiro", "exportar")),
    )
    .await;
    assert!(matches!(bob_financeiro, Ok(Json(ref response)) if !response.allowed));

    let bob_events = access_check_handler(
        State(parish.state.clone()),
        Extension(parish.bob.clone()),
        Query(query("events", "view")),
    )
    .await;
    assert!(matches!(bob_events, Ok(Json(ref response)) if response.allowed));
}

#[tokio::test]
async fn malformed_check_is_denied_not_rejected() {
    let parish = seeded_parish().await;

    let response = access_check_handler(
        State(parish.state.clone()),
        Extension(parish.admin.clone()),
        Query(query("admin", "manage system")),
    )
    .await;

    assert!(matches!(response, Ok(Json(ref response)) if !response.allowed));
}

#[tokio::test]
async fn summary_lists_profile_and_admin_state() {
    let parish = seeded_parish().await;

    let admin = access_summary_handler(
        State(parish.state.clone()),
        Extension(parish.admin.clone()),
    )
    .await;
    assert!(matches!(
        admin,
        Ok(Json(ref summary)) if summary.is_admin
            && summary.flags.is_site_admin
            && summary.permissions == vec!["admin.all".to_owned()]
    ));

    let bob = refresh_access_handler(State(parish.state.clone()), Extension(parish.bob.clone()))
        .await;
    assert!(matches!(
        bob,
        Ok(Json(ref summary)) if summary.profile.is_none()
            && !summary.is_admin
            && summary.permissions.len() == 3
    ));
}

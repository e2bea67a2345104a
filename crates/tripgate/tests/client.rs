//! Integration tests: the assembled client against the stub backend.

use std::sync::Arc;

use tripgate::prelude::*;
use tripgate::transport::{Endpoint, StubApi};

const AGENT: &str = "ana@stays.io";

fn backend() -> StubApi {
    let api = StubApi::new();
    api.add_account("Ana", AGENT, "pw", Role::Agent, Some(Specialization::Stay));
    api.add_account("Root", "root@tripgate.io", "pw", Role::Admin, None);
    api
}

fn client_on(
    api: StubApi,
    storage: &Arc<MemoryStorage>,
) -> TripgateClient<StubApi, Arc<MemoryStorage>> {
    TripgateClient::builder()
        .storage(Arc::clone(storage))
        .build_with(api)
        .unwrap()
}

fn form() -> VerificationForm {
    VerificationForm {
        agent_type: AgentType::Company,
        id_number: "ID-1".into(),
        tax_id: "TX-1".into(),
        company_name: Some("Stays Ltd".into()),
        bank_name: "Bank".into(),
        account_number: "0001".into(),
        account_holder: "Stays Ltd".into(),
    }
}

// =========================================================================
// Builder
// =========================================================================

#[test]
fn test_build_with_rejects_shared_storage_keys() {
    let config = SessionConfig {
        token_key: "same".into(),
        record_key: "same".into(),
        ..SessionConfig::default()
    };

    let result = TripgateClient::builder()
        .session_config(config)
        .build_with(backend());

    assert!(matches!(result, Err(TripgateError::Config(_))));
}

#[test]
fn test_build_with_ignores_api_base() {
    let result = TripgateClient::builder()
        .api_base("not a url")
        .build_with(backend());
    assert!(result.is_ok());
}

// =========================================================================
// Session through the client
// =========================================================================

#[tokio::test]
async fn test_session_survives_restart() {
    let storage = Arc::new(MemoryStorage::new());
    let client = client_on(backend(), &storage);
    assert_eq!(client.start(), None);
    assert!(client.session().login(AGENT, "pw").await.is_success());

    let restarted = client_on(backend(), &storage);
    let restored = restarted.start().unwrap();

    assert_eq!(restored.email, AGENT);
    assert!(restarted.session().is_ready());
    assert!(restarted.session().has_role(Role::Agent));
}

#[tokio::test]
async fn test_guard_path_uses_cached_session() {
    let storage = Arc::new(MemoryStorage::new());
    let client = client_on(backend(), &storage);
    client.start();

    assert_eq!(
        client.guard_path("/bookings").unwrap(),
        Decision::RedirectToLogin {
            resume: Destination::CustomerBookings
        }
    );

    client.session().login("root@tripgate.io", "pw").await;

    assert!(client.guard_path("/admin/users").unwrap().is_allowed());
    assert_eq!(
        client.guard_path("/agent/dashboard").unwrap(),
        Decision::Redirect(Destination::AdminDashboard)
    );
}

#[test]
fn test_guard_path_unknown_path_is_an_error() {
    let storage = Arc::new(MemoryStorage::new());
    let client = client_on(backend(), &storage);

    let err = client.guard_path("/nowhere").unwrap_err();

    assert!(matches!(err, TripgateError::Navigation(_)));
}

// =========================================================================
// Verification and routing
// =========================================================================

#[tokio::test]
async fn test_agent_onboarding_through_client() {
    let storage = Arc::new(MemoryStorage::new());
    let client = client_on(backend(), &storage);
    client.start();
    let outcome = client.session().login(AGENT, "pw").await;
    let home = post_auth_redirect(outcome.principal().unwrap(), None);
    assert_eq!(home, Destination::AgentDashboard);

    let pending = client
        .verification()
        .submit(client.session(), form())
        .await
        .unwrap();
    assert_eq!(pending.verification_status, VerificationStatus::Pending);
    assert_eq!(
        client.guard(&Destination::AgentNewListing),
        Decision::Redirect(Destination::AgentVerification)
    );

    client.verification().api().approve(AGENT);
    let decision = client
        .route(&Destination::AgentVerification, &Liveness::new())
        .await;

    assert_eq!(decision, Some(Decision::Redirect(Destination::AgentDashboard)));
    assert!(client.guard(&Destination::AgentNewListing).is_allowed());
}

#[tokio::test]
async fn test_expired_token_surfaces_as_unauthorized() {
    let storage = Arc::new(MemoryStorage::new());
    let client = client_on(backend(), &storage);
    client.start();
    client.session().login(AGENT, "pw").await;
    client.verification().api().revoke_sessions();

    let err: TripgateError = client
        .verification()
        .submit(client.session(), form())
        .await
        .unwrap_err()
        .into();

    assert!(err.is_unauthorized());
    assert!(!client.session().is_authenticated());
    assert_eq!(client.verification().api().calls(Endpoint::SubmitVerification), 1);
}

#[tokio::test]
async fn test_clones_share_session() {
    let storage = Arc::new(MemoryStorage::new());
    let client = client_on(backend(), &storage);
    client.start();
    let other = client.clone();

    client.session().login(AGENT, "pw").await;
    assert!(other.session().is_authenticated());

    other.session().logout().await;
    assert!(!client.session().is_authenticated());
    assert_eq!(client.verification().api().open_sessions(), 0);
}

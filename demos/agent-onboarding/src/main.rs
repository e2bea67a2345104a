use std::sync::Arc;

use tripgate::prelude::*;
use tripgate::transport::StubApi;

const EMAIL: &str = "ana@stays.io";
const PASSWORD: &str = "correct horse";

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// An in-process marketplace with one tour agent and one reviewer.
fn marketplace() -> Arc<StubApi> {
    let api = StubApi::new();
    api.add_account("Ana", EMAIL, PASSWORD, Role::Agent, Some(Specialization::Tour));
    api.add_account("Rui", "rui@tripgate.io", "admin", Role::Admin, None);
    Arc::new(api)
}

fn client(
    api: &Arc<StubApi>,
    path: &std::path::Path,
) -> Result<TripgateClient<Arc<StubApi>, FileStorage>, TripgateError> {
    TripgateClient::builder()
        .storage(FileStorage::new(path))
        .build_with(Arc::clone(api))
}

fn show(client: &TripgateClient<Arc<StubApi>, FileStorage>, destination: &Destination) {
    let decision = client.guard(destination);
    println!("  {destination:<22} -> {decision:?}");
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), TripgateError> {
    tripgate::init_tracing();

    let path = std::env::temp_dir().join("tripgate-agent-onboarding.json");
    let api = marketplace();
    let app = client(&api, &path)?;

    if let Some(previous) = app.start() {
        println!("signed out {} from an earlier run", previous.email);
        app.session().logout().await;
    }

    let outcome = app.session().login(EMAIL, PASSWORD).await;
    let Some(principal) = outcome.principal() else {
        println!("login failed: {}", outcome.message().unwrap_or("unknown error"));
        return Ok(());
    };
    let home = post_auth_redirect(principal, None);
    println!("signed in as {} ({}), landing on {home}", principal.name, principal.role);

    println!("before verification:");
    show(&app, &Destination::AgentNewListing);

    let form = VerificationForm {
        agent_type: AgentType::Individual,
        id_number: "P-448812".into(),
        tax_id: "TX-20931".into(),
        company_name: None,
        bank_name: "Harbor Bank".into(),
        account_number: "0042-7781".into(),
        account_holder: "Ana".into(),
    };
    let pending = app.verification().submit(app.session(), form).await?;
    println!("submitted verification, status {}", pending.verification_status);
    println!("  screen: {:?}", screen_for(Some(&pending))?);

    // The reviewer approves on the backend; the agent's next navigation
    // picks it up.
    api.approve(EMAIL);
    let view = Liveness::new();
    if let Some(decision) = app.route(&Destination::AgentVerification, &view).await {
        println!("after approval, verification page -> {decision:?}");
    }

    println!("after verification:");
    show(&app, &Destination::AgentNewListing);
    show(&app, &Destination::AdminUsers);

    // A second launch restores the session without a network call.
    let relaunched = client(&api, &path)?;
    match relaunched.start() {
        Some(restored) => println!(
            "relaunch restored {} with status {}",
            restored.email, restored.verification_status
        ),
        None => println!("relaunch found no session"),
    }

    relaunched.session().logout().await;
    tracing::info!(open_sessions = api.open_sessions(), "demo finished");
    Ok(())
}

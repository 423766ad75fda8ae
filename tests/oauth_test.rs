//! Lichess link flow: only a matching callback with the expected state is
//! exchanged with the backend.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::FakeApi;
use desktop::accounts::AccountsPanel;
use desktop::clients::{Account, ChessqlApi};
use desktop::config::Config;
use desktop::error::AppError;
use desktop::oauth::LinkOutcome;

const CALLBACK: &str = "http://localhost:9090/auth/lichess/callback";

fn panel(api: &Arc<FakeApi>) -> AccountsPanel {
    let dyn_api: Arc<dyn ChessqlApi> = api.clone();
    AccountsPanel::new(dyn_api, &Config::default()).0
}

#[tokio::test]
async fn test_callback_exchanges_code_with_verifier() {
    let api = Arc::new(FakeApi::default());
    let session = panel(&api).begin_link().await.unwrap();
    assert!(session.auth_url().starts_with("https://lichess.org/"));

    // Provider pages are not the callback
    assert!(session
        .handle_navigation(&*api, "https://lichess.org/login")
        .await
        .is_none());

    let outcome = session
        .handle_navigation(&*api, &format!("{CALLBACK}?code=c0de&state=s1"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.username(), Some("lecorvus"));
    match outcome {
        LinkOutcome::Linked(body) => {
            assert_eq!(body["code"], "c0de");
            assert_eq!(body["code_verifier"], "verifier");
        }
        LinkOutcome::Cancelled => panic!("expected a linked account"),
    }
}

#[tokio::test]
async fn test_state_mismatch_is_rejected() {
    let api = Arc::new(FakeApi::default());
    let session = panel(&api).begin_link().await.unwrap();

    let result = session
        .handle_navigation(&*api, &format!("{CALLBACK}?code=c0de&state=forged"))
        .await
        .unwrap();

    assert!(matches!(result, Err(AppError::OAuth(_))));
    assert_eq!(api.auth_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_denied_and_closed_flows() {
    let api = Arc::new(FakeApi::default());
    let session = panel(&api).begin_link().await.unwrap();

    let denied = session
        .handle_navigation(&*api, &format!("{CALLBACK}?error=access_denied"))
        .await
        .unwrap();
    assert!(matches!(denied, Err(AppError::OAuth(ref e)) if e == "access_denied"));

    assert_eq!(session.close(), LinkOutcome::Cancelled);
    assert_eq!(api.auth_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unlink_removes_account() {
    let api = Arc::new(FakeApi::default());
    *api.accounts.lock().unwrap() = vec![
        Account {
            username: "lecorvus".into(),
            last_sync: None,
            game_count: Some(120),
            token_valid: true,
        },
        Account {
            username: "other".into(),
            last_sync: None,
            game_count: None,
            token_valid: false,
        },
    ];
    let mut panel = panel(&api);

    assert_eq!(panel.refresh().await.unwrap().len(), 2);
    panel.unlink("other").await.unwrap();
    assert_eq!(panel.accounts().len(), 1);
    assert_eq!(panel.refresh().await.unwrap()[0].username, "lecorvus");
}

use gantry_session::{
    InterceptionLedger, Page, ScriptedSession, Session, SessionError, SiteFixture, WaitSettings,
};
use std::sync::Arc;
use std::time::Duration;

fn demo() -> (Arc<ScriptedSession>, Arc<InterceptionLedger>) {
    let ledger = Arc::new(InterceptionLedger::new());
    let session = Arc::new(ScriptedSession::new(
        SiteFixture::demo(),
        Arc::clone(&ledger),
    ));
    (session, ledger)
}

#[tokio::test]
async fn register_click_wait_yields_the_response() {
    let (session, ledger) = demo();
    let home = Page::new(
        session.clone() as Arc<dyn Session>,
        "http://localhost:4200",
        WaitSettings::default(),
    );

    home.visit().await.expect("visit");
    ledger
        .register("GET", "**/comments", "getComments")
        .await
        .expect("register");
    session.click("button[class=send-me]").await.expect("click");

    let exchange = ledger
        .wait_for("getComments", Duration::from_secs(1))
        .await
        .expect("exchange observed");
    assert_eq!(exchange.status, 200);
}

#[tokio::test]
async fn placeholder_assertion_is_exact() {
    let (session, _ledger) = demo();
    let home = Page::new(
        session as Arc<dyn Session>,
        "http://localhost:4200",
        WaitSettings::with_timeout(Duration::from_millis(200)),
    );
    home.visit().await.expect("visit");

    home.element("#mongo")
        .should_have_attr("placeholder", "Search")
        .await
        .expect("exact match passes");

    let err = home
        .element("#mongo")
        .should_have_attr("placeholder", "search")
        .await
        .expect_err("case differs");
    match err {
        SessionError::Assertion { expected, actual } => {
            assert!(expected.contains("search"));
            assert!(actual.contains("Search"));
        }
        other => panic!("expected assertion failure, got {other}"),
    }
}

#[tokio::test]
async fn element_lookup_is_lazy() {
    let (session, _ledger) = demo();
    let home = Page::new(
        session as Arc<dyn Session>,
        "http://localhost:4200",
        WaitSettings::with_timeout(Duration::from_millis(100)),
    );
    home.visit().await.expect("visit");

    // Taking a handle to a missing element is not an error.
    let ghost = home.element("#does-not-exist");
    let err = ghost.should_exist().await.expect_err("fails when asserted");
    assert!(matches!(err, SessionError::Assertion { .. }));
}

#[tokio::test]
async fn title_assertion_reports_both_values() {
    let (session, _ledger) = demo();
    let home = Page::new(
        session as Arc<dyn Session>,
        "http://localhost:4200",
        WaitSettings::with_timeout(Duration::from_millis(100)),
    );
    home.visit().await.expect("visit");

    home.should_have_title_containing("Cypi")
        .await
        .expect("title contains");

    let err = home
        .should_have_title_containing("Selenium")
        .await
        .expect_err("fragment absent");
    match err {
        SessionError::Assertion { expected, actual } => {
            assert!(expected.contains("Selenium"));
            assert!(actual.contains("Cypi"));
        }
        other => panic!("expected assertion failure, got {other}"),
    }
}

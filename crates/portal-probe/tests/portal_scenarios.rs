//! Scenario suite against the in-memory portal.
//!
//! Every scenario of the catalogue must pass on a healthy portal, and the
//! relevant ones must fail on a portal with a planted defect.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use portal_probe::mock::portal::FakePortal;
use portal_probe::{
    catalogue, find_scenario, PortalConfig, PortalError, ScenarioFilter, StepStatus, SuiteReport,
    SuiteRunner, Tag, TestStatus, Timeouts, DIRECT_STEP, VIA_HOME_MENU_STEP,
};

const BASE: &str = "https://portal.test/hd/";

fn config() -> PortalConfig {
    PortalConfig {
        base_url: BASE.to_string(),
        timeouts: Timeouts::uniform(300, 5),
        ..PortalConfig::default()
    }
}

fn runner(portal: &FakePortal) -> SuiteRunner {
    SuiteRunner::new(Arc::new(portal.factory()), config())
}

async fn run_one(portal: &FakePortal, name: &str) -> SuiteReport {
    runner(portal)
        .with_scenarios(vec![find_scenario(name).expect("scenario exists")])
        .run()
        .await
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Healthy portal
// ============================================================================

#[tokio::test]
async fn test_full_catalogue_passes() {
    init_tracing();
    let portal = FakePortal::new(BASE);
    let report = runner(&portal).run().await;

    assert_eq!(report.total_count(), catalogue().len());
    assert!(report.all_passed(), "{}", report.render_text());
    assert_eq!(report.skipped_count(), 0);
}

#[tokio::test]
async fn test_fixture_steps_precede_body_steps() {
    let portal = FakePortal::new(BASE);

    let via_menu = run_one(&portal, "knowledge_base_breadcrumbs").await;
    let steps: Vec<&str> = via_menu.scenarios[0]
        .steps
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(
        steps,
        vec![
            VIA_HOME_MENU_STEP,
            "Verify breadcrumb navigation",
            "Test breadcrumb navigation functionality",
        ]
    );

    let direct = run_one(&portal, "sort_most_popular").await;
    assert_eq!(direct.scenarios[0].steps[0].name, DIRECT_STEP);

    let bare = run_one(&portal, "home_main_sections").await;
    assert_eq!(bare.scenarios[0].steps[0].name, "Open home page");
}

#[tokio::test]
async fn test_smoke_selection_runs_only_smoke() {
    let portal = FakePortal::new(BASE);
    let report = runner(&portal)
        .with_filter(ScenarioFilter::new().with_tag(Tag::Smoke))
        .run()
        .await;

    assert_eq!(report.total_count(), 4);
    assert!(report
        .scenarios
        .iter()
        .all(|s| s.tags.contains(&Tag::Smoke)));
    assert!(report.all_passed(), "{}", report.render_text());
}

#[tokio::test]
async fn test_report_round_trips_through_json() {
    let portal = FakePortal::new(BASE);
    let report = run_one(&portal, "search_word").await;
    let parsed = SuiteReport::from_json(&report.to_json().unwrap()).unwrap();
    assert_eq!(parsed.run_id, report.run_id);
    assert_eq!(parsed.scenarios[0].status, TestStatus::Passed);
}

// ============================================================================
// Planted defects
// ============================================================================

#[tokio::test]
async fn test_broken_popularity_sort_is_caught() {
    let portal = FakePortal::new(BASE).with_broken_popularity_sort();
    let report = run_one(&portal, "sort_most_popular").await;

    let scenario = &report.scenarios[0];
    assert_eq!(scenario.status, TestStatus::Failed);
    assert!(scenario
        .error
        .as_deref()
        .unwrap()
        .contains("non-increasing"));
    assert_eq!(
        scenario.failed_step().unwrap().name,
        "Verify article sorting"
    );
}

#[tokio::test]
async fn test_missing_section_is_named() {
    let portal = FakePortal::new(BASE).without_section("Announcements");
    let report = run_one(&portal, "home_main_sections").await;

    let error = report.scenarios[0].error.as_deref().unwrap();
    assert!(error.contains("Announcements"));
    assert!(!error.contains("Approvals"));
}

#[tokio::test]
async fn test_broken_menu_fails_in_fixture() {
    let portal = FakePortal::new(BASE).with_broken_menu();
    let report = run_one(&portal, "knowledge_base_structure").await;

    let scenario = &report.scenarios[0];
    assert_eq!(scenario.status, TestStatus::Failed);
    assert!(scenario.error.as_deref().unwrap().starts_with("Fixture error"));
    assert_eq!(scenario.steps.len(), 1);
    assert_eq!(scenario.steps[0].status, StepStatus::Failed);
}

#[tokio::test]
async fn test_broken_menu_spares_direct_scenarios() {
    let portal = FakePortal::new(BASE).with_broken_menu();
    let report = runner(&portal)
        .with_filter(ScenarioFilter::new().with_name("search"))
        .run()
        .await;
    assert!(report.all_passed(), "{}", report.render_text());
}

#[tokio::test]
async fn test_unreachable_portal_fails_every_scenario() {
    let portal = FakePortal::new(BASE);
    let config = PortalConfig {
        base_url: "https://elsewhere.test/".to_string(),
        ..config()
    };
    let report = SuiteRunner::new(Arc::new(portal.factory()), config)
        .with_fail_fast()
        .run()
        .await;

    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.skipped_count(), catalogue().len() - 1);
    let first = report.failures()[0];
    assert!(first.error.as_deref().unwrap().contains("elsewhere.test"));
}

#[test]
fn test_unknown_tag_is_config_error() {
    let err = "nightly".parse::<Tag>().unwrap_err();
    assert!(matches!(err, PortalError::Config { .. }));
}

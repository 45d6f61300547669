use chrono::{TimeZone, Utc};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::time::Duration;
use subdesk_api_client::api::SubscriptionAction;
use subdesk_api_client::ApiClient;
use subdesk_core::config::ClientConfig;
use subdesk_core::models::{ResourceType, SubscriptionStatus};
use subdesk_core::validation::{ResourceGrant, SubscriptionDraft};
use subdesk_core::AppError;
use uuid::Uuid;

const COMPANY: &str = "0b7e7dc2-56c4-4a45-9b53-3b0f0c1f8a11";
const PLANS_PATH: &str = "/api/v3/environment/marinestream/subscriptions";

fn client_for(base_url: String) -> ApiClient {
    ApiClient::new(&ClientConfig {
        api_key: Some("test-key".to_string()),
        base_url,
        timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    })
    .unwrap()
}

fn client(server: &ServerGuard) -> ApiClient {
    client_for(server.url())
}

fn company() -> Uuid {
    Uuid::parse_str(COMPANY).unwrap()
}

#[tokio::test]
async fn placeholder_sends_auth_workspace_and_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock(
            "POST",
            Matcher::Regex(r"^/api/v3/user/userPlaceholder/jane(%40|@)acme\.com$".to_string()),
        )
        .match_query(Matcher::UrlEncoded("isGroup".into(), "false".into()))
        .match_header("authorization", "Bearer test-key")
        .match_header("environment", "marinestream")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"email":"jane@acme.com"}"#)
        .create_async()
        .await;

    let result = client(&server)
        .create_user_placeholder(" jane@acme.com ")
        .await
        .unwrap();

    assert_eq!(result["email"], "jane@acme.com");
    mock.assert_async().await;
}

#[tokio::test]
async fn invalid_email_never_reaches_the_api() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = client(&server)
        .create_user_placeholder("not-an-email")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn find_company_searches_by_domain() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v3/user/search")
        .match_query(Matcher::UrlEncoded("searchString".into(), "@acme.com".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": [
                    {"email": "bob@acme.com", "displayName": "Acme - Bob"},
                    {"email": "amy@acme.com", "companyId": COMPANY}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let found = client(&server).find_company("jane@acme.com").await.unwrap();

    assert_eq!(found.id, company());
    assert_eq!(found.name, "Acme");
    mock.assert_async().await;
}

#[tokio::test]
async fn find_company_without_users_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v3/user/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let err = client(&server).find_company("jane@acme.com").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Not found: No company found. Try creating the user first."
    );
}

#[tokio::test]
async fn onboarding_creates_then_looks_up() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", Matcher::Regex("^/api/v3/user/userPlaceholder/".to_string()))
        .match_query(Matcher::Any)
        .with_status(201)
        .create_async()
        .await;
    let search = server
        .mock("GET", "/api/v3/user/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"companyId": COMPANY}]).to_string())
        .create_async()
        .await;

    let onboarding = client(&server)
        .onboard_user_with_delay("jane@fleet.io", Duration::from_millis(1))
        .await
        .unwrap();

    assert_eq!(onboarding.email, "jane@fleet.io");
    assert_eq!(onboarding.company.name, "Fleet");
    create.assert_async().await;
    search.assert_async().await;
}

#[tokio::test]
async fn error_statuses_are_classified() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", PLANS_PATH)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Token expired"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/v3/subscription/company/0b7e7dc2-56c4-4a45-9b53-3b0f0c1f8a11")
        .with_status(502)
        .with_body("Bad gateway")
        .create_async()
        .await;

    let client = client(&server);

    match client.list_plans().await.unwrap_err() {
        AppError::Unauthorized { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Token expired");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    match client.list_company_subscriptions(company()).await.unwrap_err() {
        AppError::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "Bad gateway");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_error_body_reports_status() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v3/subscription/s-1/cancel")
        .with_status(500)
        .create_async()
        .await;

    let err = client(&server).cancel_subscription("s-1").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Request failed with status 500: Request failed: 500"
    );
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let err = client_for("http://127.0.0.1:1".to_string())
        .list_plans()
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Connection(_)));
}

#[tokio::test]
async fn short_queries_skip_the_api() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    assert!(client(&server).search_resources(" a ").await.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn failed_search_side_contributes_nothing() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v3/flows")
        .match_query(Matcher::UrlEncoded("name".into(), "hull".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"data": [{"id": "f-1", "name": "Hull clean"}, {"name": "no id"}]}).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/api/v3/assets")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let matches = client(&server).search_resources("hull").await;

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, "f-1");
    assert_eq!(matches[0].resource_type, ResourceType::Flow);
}

#[tokio::test]
async fn plans_are_read_from_any_envelope() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", PLANS_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"subscriptions": [
                {"id": "p-1", "displayName": "Hull survey", "status": 1},
                {"planId": "p-2", "name": "Propeller"},
                {"displayName": "no id"}
            ]})
            .to_string(),
        )
        .create_async()
        .await;

    let plans = client(&server).list_plans().await.unwrap();
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[1].id, "p-2");
    assert_eq!(plans[1].display_name, "Propeller");
}

#[tokio::test]
async fn get_plan_unwraps_data() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v3/environment/marinestream/subscriptions/p-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{"id":"p-1","displayName":"Hull survey"}}"#)
        .create_async()
        .await;

    let plan = client(&server).get_plan("p-1").await.unwrap();
    assert_eq!(plan.display_name, "Hull survey");
}

fn draft() -> SubscriptionDraft {
    SubscriptionDraft::new(
        company(),
        "Acme Hull",
        90,
        vec![ResourceGrant::new(ResourceType::Flow, "f-1", "View, Start")],
    )
}

#[tokio::test]
async fn create_subscription_creates_then_assigns() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/api/v3/environment/subscriptions")
        .match_body(Matcher::PartialJson(json!({
            "environmentId": "e9229623-b98c-5bef-8ee5-024f7e905a4c",
            "displayName": "Acme Hull",
            "description": "Subscription for Acme Hull",
            "features": {},
            "status": 1,
            "resources": [{"originId": "f-1", "type": "Flow", "features": ["View", "Start"]}]
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{"id":"p-new"}}"#)
        .create_async()
        .await;
    let assign = server
        .mock("POST", "/api/v3/subscription/assign")
        .match_body(Matcher::Json(json!({
            "planId": "p-new",
            "companyId": COMPANY,
            "durationDays": 90
        })))
        .with_status(200)
        .create_async()
        .await;

    let outcome = client(&server).create_subscription(&draft()).await.unwrap();

    assert_eq!(outcome.plan_id, "p-new");
    assert_eq!(outcome.summary, "Acme Hull can now access 1 resource for 90 days.");
    assert_eq!(outcome.subscription.id, "pending-p-new");
    assert_eq!(outcome.subscription.status, SubscriptionStatus::Active);
    create.assert_async().await;
    assign.assert_async().await;
}

#[tokio::test]
async fn plan_without_id_stops_before_assign() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v3/environment/subscriptions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;
    let assign = server
        .mock("POST", "/api/v3/subscription/assign")
        .expect(0)
        .create_async()
        .await;

    let err = client(&server).create_subscription(&draft()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing identifier: Plan created but no ID returned"
    );
    assign.assert_async().await;
}

#[tokio::test]
async fn invalid_draft_is_rejected_locally() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let empty = SubscriptionDraft::new(company(), "Acme", 30, vec![]);
    let err = client(&server).create_subscription(&empty).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
    any.assert_async().await;
}

async fn mock_overview(server: &mut ServerGuard) {
    server
        .mock("GET", PLANS_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"data": [
                {"id": "p-1", "displayName": "Hull survey"},
                {"id": "p-2", "displayName": "Anchor check"}
            ]})
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/v3/subscription/company/0b7e7dc2-56c4-4a45-9b53-3b0f0c1f8a11")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"id": "s-1", "planId": "p-1", "companyId": COMPANY, "status": "Active",
                 "validTo": "2027-01-01T00:00:00Z"},
                {"id": "s-9", "planId": "p-gone", "companyId": COMPANY, "status": 2}
            ])
            .to_string(),
        )
        .create_async()
        .await;
}

#[tokio::test]
async fn company_overview_joins_both_listings() {
    let mut server = Server::new_async().await;
    mock_overview(&mut server).await;

    let overview = client(&server).company_overview(company()).await.unwrap();

    assert_eq!(overview.assignments.len(), 2);
    assert_eq!(overview.assignments[0].plan.display_name, "Anchor check");
    assert!(overview.assignments[0].subscription.is_none());
    assert_eq!(
        overview.assignments[1].subscription.as_ref().unwrap().id,
        "s-1"
    );
    assert_eq!(overview.orphaned.len(), 1);
    assert_eq!(overview.orphaned[0].status, SubscriptionStatus::Archived);
}

#[tokio::test]
async fn cancel_applies_status_to_overview() {
    let mut server = Server::new_async().await;
    let cancel = server
        .mock("POST", "/api/v3/subscription/s-1/cancel")
        .match_header("authorization", "Bearer test-key")
        .with_status(204)
        .create_async()
        .await;
    mock_overview(&mut server).await;

    let overview = client(&server)
        .change_status_with_overview("s-1", SubscriptionAction::Cancel, company())
        .await
        .unwrap();

    let sub = overview.assignments[1].subscription.as_ref().unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Archived);
    assert_eq!(overview.active().count(), 0);
    cancel.assert_async().await;
}

async fn mock_lagging_overview(server: &mut ServerGuard) {
    server
        .mock("GET", PLANS_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"id": "p-1", "displayName": "Hull survey"}]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/api/v3/subscription/company/0b7e7dc2-56c4-4a45-9b53-3b0f0c1f8a11")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"subscriptions": [
                {"id": "s-1", "planId": "p-1", "companyId": COMPANY, "status": "Archived",
                 "validTo": "2026-01-01T00:00:00Z"}
            ]})
            .to_string(),
        )
        .create_async()
        .await;
}

#[tokio::test]
async fn activate_applies_echoed_fields_over_stale_listing() {
    let mut server = Server::new_async().await;
    let activate = server
        .mock("POST", "/api/v3/subscription/s-1/activate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"s-1","status":"Active","validTo":"2028-06-01T00:00:00Z"}"#)
        .create_async()
        .await;
    mock_lagging_overview(&mut server).await;

    let overview = client(&server)
        .change_status_with_overview("s-1", SubscriptionAction::Activate, company())
        .await
        .unwrap();

    let sub = overview.assignments[0].subscription.as_ref().unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(
        sub.valid_to,
        Some(Utc.with_ymd_and_hms(2028, 6, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(overview.active().count(), 1);
    activate.assert_async().await;
}

#[tokio::test]
async fn activate_with_full_subscription_replaces_listed_one() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v3/subscription/s-1/activate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"data": {
                "id": "s-1",
                "planId": "p-1",
                "companyId": COMPANY,
                "displayName": "Hull survey (renewed)",
                "status": 1,
                "validTo": "2028-06-01T00:00:00Z"
            }})
            .to_string(),
        )
        .create_async()
        .await;
    mock_lagging_overview(&mut server).await;

    let overview = client(&server)
        .change_status_with_overview("s-1", SubscriptionAction::Activate, company())
        .await
        .unwrap();

    let sub = overview.assignments[0].subscription.as_ref().unwrap();
    assert_eq!(sub.display_name.as_deref(), Some("Hull survey (renewed)"));
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(
        sub.valid_to,
        Some(Utc.with_ymd_and_hms(2028, 6, 1, 0, 0, 0).unwrap())
    );
    assert!(overview.orphaned.is_empty());
}

#[tokio::test]
async fn failed_assignment_reports_the_created_plan() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v3/environment/subscriptions")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"p-new"}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/api/v3/subscription/assign")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Company not found"}"#)
        .create_async()
        .await;

    let err = client(&server).create_subscription(&draft()).await.unwrap_err();

    match &err {
        AppError::PartialSubscription { plan_id, source } => {
            assert_eq!(plan_id, "p-new");
            assert!(matches!(**source, AppError::Api { status: 422, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.status(), Some(422));
    assert!(err.to_string().contains("p-new"));
}

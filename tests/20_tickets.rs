mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;
use wiremock::matchers::{basic_auth, body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{JIRA_EMAIL, JIRA_TOKEN, PROJECT};

#[tokio::test]
async fn lists_projects_with_basic_auth() -> Result<()> {
    let app = common::static_app().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/project"))
        .and(basic_auth(JIRA_EMAIL, JIRA_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "10000", "key": "PAY", "name": "Payments" },
            { "id": "10001", "key": "OPS", "name": "Operations" }
        ])))
        .expect(1)
        .mount(&app.upstream)
        .await;

    let res = app.get("/projects").await?;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json()?;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["key"], "PAY");
    Ok(())
}

#[tokio::test]
async fn creates_ticket_with_adf_description() -> Result<()> {
    let app = common::static_app().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue"))
        .and(body_partial_json(json!({
            "fields": {
                "project": { "key": PROJECT },
                "summary": "Checkout fails",
                "issuetype": { "name": "Bug" },
                "description": { "type": "doc", "version": 1 }
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "1", "key": "PAY-42" })))
        .expect(1)
        .mount(&app.upstream)
        .await;

    let res = app
        .send_json(
            Method::POST,
            "/ticket",
            json!({ "summary": "Checkout fails", "description": "Steps:\n1. pay" }),
        )
        .await?;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json()?;
    assert_eq!(body["issueKey"], "PAY-42");
    assert_eq!(body["message"], "Jira issue created successfully.");
    Ok(())
}

#[tokio::test]
async fn create_rejects_missing_fields_and_bad_type() -> Result<()> {
    let app = common::static_app().await;

    let res = app.send_json(Method::POST, "/ticket", json!({ "summary": "only" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()?["error"], "Missing required fields");

    let res = app
        .send_json(
            Method::POST,
            "/ticket",
            json!({ "summary": "s", "description": "d", "issue_type": "Epic" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json()?["error"],
        "Invalid issue type. Must be one of: Bug, Task, Story, Improvement"
    );
    Ok(())
}

#[tokio::test]
async fn get_ticket_flattens_description() -> Result<()> {
    let app = common::static_app().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PAY-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::issue_json(
            "PAY-7",
            "Refund rounding",
            "Bug",
            "first line\nsecond line",
        )))
        .mount(&app.upstream)
        .await;

    let body = app.get("/ticket/PAY-7").await?.json()?;
    assert_eq!(body["key"], "PAY-7");
    assert_eq!(body["issue_type"], "Bug");
    assert_eq!(body["status"], "To Do");
    assert_eq!(body["description"], "first line\nsecond line");
    assert_eq!(body["description_adf"]["type"], "doc");
    Ok(())
}

#[tokio::test]
async fn upstream_status_is_passed_through() -> Result<()> {
    let app = common::static_app().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/PAY-404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Issue does not exist"))
        .mount(&app.upstream)
        .await;

    let res = app.get("/ticket/PAY-404").await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let body = res.json()?;
    assert_eq!(body["code"], "UPSTREAM_ERROR");
    assert_eq!(body["error"], "Issue does not exist");
    Ok(())
}

#[tokio::test]
async fn invalid_issue_key_never_reaches_jira() -> Result<()> {
    let app = common::static_app().await;
    let res = app.get("/ticket/PAY-1%20OR%201").await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(app.upstream.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}

#[tokio::test]
async fn update_ticket_sends_only_given_fields() -> Result<()> {
    let app = common::static_app().await;
    Mock::given(method("PUT"))
        .and(path("/rest/api/3/issue/PAY-7"))
        .and(body_partial_json(json!({ "fields": { "summary": "Renamed" } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.upstream)
        .await;

    let res = app
        .send_json(Method::PATCH, "/ticket/PAY-7", json!({ "summary": "Renamed" }))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()?["message"], "Ticket PAY-7 updated successfully");

    let requests = app.upstream.received_requests().await.unwrap_or_default();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
    assert!(sent["fields"].get("description").is_none());

    let res = app.send_json(Method::PATCH, "/ticket/PAY-7", json!({})).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

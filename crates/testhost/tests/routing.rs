//! Routing through a hosted site: matches, misses and format extensions.

mod common;

use http::StatusCode;
use serde_json::json;
use testhost::prelude::*;

async fn basic() -> SiteFixture {
    SiteFixture::start(&common::catalog(), common::BASIC).await.unwrap()
}

#[tokio::test]
async fn defined_route_returns_handler_response() {
    let fixture = basic().await;
    let response = fixture.client().get("/").send().await.unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_content_type("text/plain")
        .assert_body_eq("Hello from BasicWebSite");
}

#[tokio::test]
async fn absolute_urls_are_accepted() {
    let fixture = basic().await;
    let response = fixture.client().get("http://localhost/").send().await.unwrap();
    response.assert_body_eq("Hello from BasicWebSite");
}

#[tokio::test]
async fn unmatched_path_is_404() {
    let fixture = basic().await;
    let response = fixture.client().get("/does/not/exist").send().await.unwrap();

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.bytes().is_empty());
}

#[tokio::test]
async fn unmatched_method_is_405_with_allow() {
    let fixture = basic().await;
    let response = fixture.client().put("/items").send().await.unwrap();

    response
        .assert_status(StatusCode::METHOD_NOT_ALLOWED)
        .assert_header("allow", "GET, HEAD, POST");
}

#[tokio::test]
async fn head_answered_by_get_without_body() {
    let fixture = basic().await;
    let response = fixture.client().head("/items").send().await.unwrap();

    response.assert_status(StatusCode::OK);
    assert!(response.bytes().is_empty());
}

#[tokio::test]
async fn form_post_reaches_handler() {
    let fixture = basic().await;
    let response = fixture
        .client()
        .post("/items")
        .form([("name", "Jane Doe")])
        .send()
        .await
        .unwrap();

    response
        .assert_status(StatusCode::CREATED)
        .assert_json_field("name", &json!("Jane Doe"));
}

#[tokio::test]
async fn format_extension_is_case_insensitive() {
    let fixture = basic().await;
    let client = fixture.client();

    let lower = client.get("/products/42.json").send().await.unwrap();
    let upper = client.get("/products/42.JSON").send().await.unwrap();

    lower
        .assert_status(StatusCode::OK)
        .assert_content_type("application/json")
        .assert_json_field("id", &json!("42"));
    assert_eq!(lower.bytes(), upper.bytes());
    assert_eq!(lower.content_type(), upper.content_type());

    client
        .get("/products/42.Txt")
        .send()
        .await
        .unwrap()
        .assert_body_eq("42: Widget");
}

#[tokio::test]
async fn unknown_format_reaches_handler() {
    let fixture = basic().await;
    let response = fixture.client().get("/products/42.xml").send().await.unwrap();
    response.assert_status(StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn unknown_site_fails_fast() {
    let err = SiteFixture::start(&common::catalog(), "NoSuchWebSite")
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, TestError::Host(HostError::SiteNotFound { .. })));
    assert!(message.contains("NoSuchWebSite"));
    assert!(message.contains(common::BASIC));
}

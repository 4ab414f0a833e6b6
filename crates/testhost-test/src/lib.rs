//! # Testhost Test
//!
//! Client-side tooling for sites hosted by `testhost-server`: requests are
//! built, dispatched in memory and buffered for assertions.
//!
//! ## Key Features
//!
//! - **Fixtures**: [`SiteFixture`] hosts one named site with its own log capture
//! - **Request Builder**: any method, appended or replaced headers, cookies,
//!   raw/JSON/form bodies, relative URLs resolved against the host label
//! - **Response Assertions**: status, repeated headers, `Set-Cookie`, exception headers
//! - **Cookie Jar**: optional per-client cookie replay across requests
//! - **Anti-forgery**: copy a form token and cookie from one response into the next request
//!
//! ## Example
//!
//! ```ignore
//! use testhost_test::{antiforgery, SiteFixture};
//!
//! #[tokio::test]
//! async fn posts_simple_form() {
//!     let fixture = SiteFixture::start(&sites::catalog(), "HtmlGenerationWebSite")
//!         .await
//!         .unwrap();
//!     let client = fixture.client();
//!
//!     let page = client.get("/SimpleForms").send().await.unwrap();
//!     let html = page.text().unwrap();
//!     let token = antiforgery::retrieve_antiforgery_token(&html, "SimpleForms").unwrap();
//!     let cookie = antiforgery::retrieve_antiforgery_cookie(&page).unwrap();
//!
//!     let response = client
//!         .post("/SimpleForms")
//!         .antiforgery(&cookie, &token)
//!         .form([("Name", "Jane")])
//!         .send()
//!         .await
//!         .unwrap();
//!     response.assert_status(http::StatusCode::OK);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/testhost-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod antiforgery;
mod client;
mod cookie;
mod error;
mod fixture;
mod request;
mod response;

pub use antiforgery::{retrieve_antiforgery_cookie, retrieve_antiforgery_token, AntiforgeryCookie};
pub use client::{TestClient, TestClientRequest};
pub use cookie::{CookieJar, SetCookie};
pub use error::TestError;
pub use fixture::SiteFixture;
pub use request::{absolute_url, TestRequest, FORM_URLENCODED};
pub use response::TestResponse;

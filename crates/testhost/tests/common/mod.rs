//! Sample sites shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http::{header, HeaderValue, StatusCode};
use parking_lot::Mutex;
use serde::Serialize;
use testhost::prelude::*;

pub const BASIC: &str = "BasicWebSite";
pub const FORMS: &str = "HtmlGenerationWebSite";
pub const CATALOG: &str = "CatalogWebSite";
pub const ORDERS: &str = "OrdersWebSite";

pub const LOGIN_TOKEN: &str = "CfDJ8-login-token";
pub const FORMS_TOKEN: &str = "CfDJ8-forms-token";
pub const ANTIFORGERY_COOKIE: &str = ".AspNetCore.Antiforgery.9TtSrW0hzOs";
pub const ANTIFORGERY_COOKIE_VALUE: &str = "CfDJ8-cookie";

/// Every sample site, each attributed its own controllers.
pub fn catalog() -> SiteCatalog {
    SiteCatalog::new()
        .with_site(BasicWebSite)
        .with_site(HtmlGenerationWebSite)
        .with_site(CatalogWebSite)
        .with_site(OrdersWebSite)
        .with_component(CATALOG, ProductsController)
        .with_component(ORDERS, OrdersController)
}

// ---------------------------------------------------------------------------
// BasicWebSite
// ---------------------------------------------------------------------------

/// Records what the site disposed.
#[derive(Debug, Default)]
pub struct DisposalLog {
    entries: Mutex<Vec<String>>,
}

impl DisposalLog {
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

/// Holds the request ID of the request it was created for.
pub struct RequestIdService {
    instance: usize,
    request_id: Mutex<Option<String>>,
}

impl RequestIdService {
    pub fn request_id(&self) -> Option<String> {
        self.request_id.lock().clone()
    }
}

#[derive(Default)]
pub struct InstanceCounter(AtomicUsize);

/// Scoped unit of work, disposed when its request completes.
pub struct UnitOfWork {
    log: Arc<DisposalLog>,
}

impl Dispose for UnitOfWork {
    fn dispose(&self) {
        self.log.record("unit-of-work");
    }
}

/// Expensive to construct; the site defers it until first use.
pub struct ViewCompiler {
    log: Arc<DisposalLog>,
}

impl ViewCompiler {
    pub fn compile(&self, view: &str) -> String {
        format!("<compiled {view}>")
    }
}

impl Dispose for ViewCompiler {
    fn dispose(&self) {
        self.log.record("view-compiler");
    }
}

#[derive(Debug, thiserror::Error)]
#[error("The operation is not valid for the current state")]
pub struct InvalidOperationError;

#[derive(Serialize)]
struct Product {
    id: String,
    name: &'static str,
}

fn explode() -> HandlerResult {
    panic!("handler exploded")
}

pub struct BasicWebSite;

impl Startup for BasicWebSite {
    fn name(&self) -> &str {
        BASIC
    }

    fn configure_services(
        &self,
        services: &mut ServiceCollection,
        _env: &HostingEnvironment,
    ) -> anyhow::Result<()> {
        services
            .try_add_instance(Arc::new(DisposalLog::default()))
            .add_instance(Arc::new(InstanceCounter::default()))
            .add_scoped(|resolver| {
                let counter = resolver.resolve::<InstanceCounter>()?;
                Ok(RequestIdService {
                    instance: counter.0.fetch_add(1, Ordering::SeqCst),
                    request_id: Mutex::new(None),
                })
            })
            .add_scoped_disposable(|resolver| {
                Ok(UnitOfWork {
                    log: resolver.resolve::<DisposalLog>()?,
                })
            })
            .add_singleton_disposable(|resolver| {
                Ok(ViewCompiler {
                    log: resolver.resolve::<DisposalLog>()?,
                })
            });
        Ok(())
    }

    fn configure(&self, app: &mut ApplicationBuilder) {
        app.use_fn("request_id_service", |ctx, request, next| {
            Box::pin(async move {
                if let Ok(service) = ctx.resolve::<RequestIdService>() {
                    *service.request_id.lock() = Some(ctx.request_id().to_string());
                }
                next.run(ctx, request).await
            })
        })
        .map_get("/", |_ctx| async { Ok(responses::text("Hello from BasicWebSite")) })
        .map_get("/RequestScopedService/FromController", |ctx| async move {
            let service = ctx.resolve::<RequestIdService>()?;
            Ok(responses::text(format!(
                "{}#{}",
                service.request_id().unwrap_or_default(),
                service.instance
            )))
        })
        .map_get("/products/{id}.{format}", |ctx| async move {
            let id = ctx.param("id").unwrap_or_default().to_string();
            match ctx.format() {
                Some("json") => responses::json(&Product { id, name: "Widget" }),
                Some("txt") => Ok(responses::text(format!("{id}: Widget"))),
                _ => Ok(responses::status(StatusCode::NOT_ACCEPTABLE)),
            }
        })
        .map_get("/items", |_ctx| async { Ok(responses::text("items")) })
        .map_post("/items", |ctx| async move {
            let name = ctx.form_value("name")?.unwrap_or_default();
            responses::json_with_status(StatusCode::CREATED, &serde_json::json!({ "name": name }))
        })
        .map_get("/work", |ctx| async move {
            ctx.resolve::<UnitOfWork>()?;
            Ok(responses::text("worked"))
        })
        .map_get("/views/{name}", |ctx| async move {
            let compiler = ctx.resolve::<ViewCompiler>()?;
            Ok(responses::html(compiler.compile(ctx.param("name").unwrap_or_default())))
        })
        .map_get("/throw", |_ctx| async { Err(InvalidOperationError.into()) })
        .map_get("/panic", |_ctx| async { explode() })
        .map_get("/cookies", |_ctx| async {
            let mut response = responses::text("cookies set");
            for cookie in ["first=1; path=/", "second=2; path=/; httponly", "third=3"] {
                response
                    .headers_mut()
                    .append(header::SET_COOKIE, HeaderValue::from_static(cookie));
            }
            Ok(response)
        })
        .map_get("/echo-cookie/{name}", |ctx| async move {
            let name = ctx.param("name").unwrap_or_default();
            Ok(responses::text(ctx.cookie(name).unwrap_or("<none>").to_string()))
        })
        .map_get("/slow/{n}", |ctx| async move {
            let n: u64 = ctx.param("n").unwrap_or("0").parse()?;
            tokio::task::yield_now().await;
            Ok(responses::text(format!("{n}:{}", ctx.request_id())))
        })
        .on_shutdown("flush", |services| async move {
            if let Some(log) = services.resolve::<DisposalLog>() {
                log.record("shutdown-hook");
            }
            Ok(())
        });
    }
}

// ---------------------------------------------------------------------------
// HtmlGenerationWebSite
// ---------------------------------------------------------------------------

fn simple_forms_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body>
    <form action="/Home/Login" method="post">
        <input type="text" name="UserName" />
        <input name="__RequestVerificationToken" type="hidden" value="{LOGIN_TOKEN}" />
    </form>
    <form action="/SimpleForms" method="post">
        <input type="text" name="Name" />
        <input name="__RequestVerificationToken" type="hidden" value="{FORMS_TOKEN}" />
    </form>
</body>
</html>"#
    )
}

fn antiforgery_valid(ctx: &EndpointContext, expected_token: &str) -> Result<bool, HandlerError> {
    let cookie_ok = ctx.cookie(ANTIFORGERY_COOKIE) == Some(ANTIFORGERY_COOKIE_VALUE);
    let token = match ctx.header(antiforgery::HEADER_NAME) {
        Some(token) => Some(token.to_string()),
        None => ctx.form_value(antiforgery::FORM_FIELD_NAME)?,
    };
    Ok(cookie_ok && token.as_deref() == Some(expected_token))
}

pub struct HtmlGenerationWebSite;

impl Startup for HtmlGenerationWebSite {
    fn name(&self) -> &str {
        FORMS
    }

    fn configure(&self, app: &mut ApplicationBuilder) {
        app.map_get("/SimpleForms", |_ctx| async {
            let mut response = responses::html(simple_forms_page());
            let cookie = format!("{ANTIFORGERY_COOKIE}={ANTIFORGERY_COOKIE_VALUE}; path=/; samesite=strict; httponly");
            response
                .headers_mut()
                .append(header::SET_COOKIE, HeaderValue::from_str(&cookie)?);
            Ok(response)
        })
        .map_post("/SimpleForms", |ctx| async move {
            if !antiforgery_valid(&ctx, FORMS_TOKEN)? {
                return Ok(responses::status(StatusCode::BAD_REQUEST));
            }
            let name = ctx.form_value("Name")?.unwrap_or_default();
            Ok(responses::text(format!("Hello {name}")))
        })
        .map_post("/Home/Login", |ctx| async move {
            if !antiforgery_valid(&ctx, LOGIN_TOKEN)? {
                return Ok(responses::status(StatusCode::BAD_REQUEST));
            }
            Ok(responses::redirect("/"))
        });
    }
}

// ---------------------------------------------------------------------------
// Controller discovery sites
// ---------------------------------------------------------------------------

pub struct ProductsController;

impl Controller for ProductsController {
    fn name(&self) -> &'static str {
        "Products"
    }

    fn map_routes(&self, routes: &mut RouteTable) {
        routes.get("/api/products", |_ctx| async { Ok(responses::text("products")) });
    }
}

pub struct OrdersController;

impl Controller for OrdersController {
    fn name(&self) -> &'static str {
        "Orders"
    }

    fn map_routes(&self, routes: &mut RouteTable) {
        routes.get("/api/orders", |_ctx| async { Ok(responses::text("orders")) });
    }
}

/// Owns a controller of its own in addition to the attributed ones.
pub struct HomeController;

impl Controller for HomeController {
    fn name(&self) -> &'static str {
        "Home"
    }

    fn map_routes(&self, routes: &mut RouteTable) {
        routes.get("/home", |_ctx| async { Ok(responses::text("home")) });
    }
}

pub struct CatalogWebSite;

impl Startup for CatalogWebSite {
    fn name(&self) -> &str {
        CATALOG
    }

    fn configure(&self, app: &mut ApplicationBuilder) {
        app.use_controllers();
    }

    fn controllers(&self) -> Vec<Arc<dyn Controller>> {
        vec![Arc::new(HomeController)]
    }
}

pub struct OrdersWebSite;

impl Startup for OrdersWebSite {
    fn name(&self) -> &str {
        ORDERS
    }

    fn configure(&self, app: &mut ApplicationBuilder) {
        app.use_controllers();
    }
}

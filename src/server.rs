use crate::classifier::{CheckError, Classification, ModelSupportChecker};
use crate::config::ServerConfig;
use crate::hub::{HttpHub, HubError, ModelHub};
use actix_web::{HttpResponse, HttpServer, get, web};
use serde::Deserialize;
use serde_json::json;

pub struct AppState<H> {
    pub checker: ModelSupportChecker<H>,
}

impl<H: ModelHub> AppState<H> {
    pub fn new(checker: ModelSupportChecker<H>) -> Self {
        AppState { checker }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub model_id: String,
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

pub async fn index<H: ModelHub + 'static>(app_state: web::Data<AppState<H>>) -> HttpResponse {
    let version = app_state.checker.snapshot().optimum_intel_version();
    html(render_page(version, "", None))
}

pub async fn check_form<H: ModelHub + 'static>(
    form: web::Form<CheckRequest>,
    app_state: web::Data<AppState<H>>,
) -> Result<HttpResponse, actix_web::Error> {
    let classification = run_check(&app_state, &form.model_id).await?;
    let version = app_state.checker.snapshot().optimum_intel_version();
    Ok(html(render_page(
        version,
        &form.model_id,
        Some(&classification),
    )))
}

pub async fn check_api<H: ModelHub + 'static>(
    query: web::Query<CheckRequest>,
    app_state: web::Data<AppState<H>>,
) -> Result<HttpResponse, actix_web::Error> {
    let classification = run_check(&app_state, &query.model_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "model_id": classification.model_id(),
        "status": classification.status(),
        "message": classification.to_string(),
    })))
}

async fn run_check<H: ModelHub>(
    app_state: &AppState<H>,
    model_id: &str,
) -> Result<Classification, actix_web::Error> {
    if model_id.is_empty() {
        return Err(actix_web::error::ErrorBadRequest("model_id is required"));
    }
    app_state.checker.check(model_id).await.map_err(|e| match e {
        CheckError::Hub(HubError::InvalidRepoId { .. }) => {
            actix_web::error::ErrorBadRequest(e.to_string())
        }
        e => {
            log::error!("Check of {} failed: {}", model_id, e);
            actix_web::error::ErrorBadGateway(e.to_string())
        }
    })
}

/// Routes of the web form, generic over the hub so tests can plug in a fake.
pub fn configure<H: ModelHub + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(
            web::resource("/")
                .route(web::get().to(index::<H>))
                .route(web::post().to(check_form::<H>)),
        )
        .route("/api/check", web::get().to(check_api::<H>));
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap every closed `delim ... delim` span in `<tag>`; an unmatched
/// delimiter is kept as text.
fn wrap_spans(text: &str, delim: &str, tag: &str, inner: &dyn Fn(&str) -> String) -> String {
    let parts: Vec<&str> = text.split(delim).collect();
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i % 2 == 0 {
            out.push_str(&inner(part));
        } else if i + 1 < parts.len() {
            out.push_str(&format!("<{tag}>{}</{tag}>", inner(part)));
        } else {
            out.push_str(delim);
            out.push_str(&inner(part));
        }
    }
    out
}

/// Render the `**bold**` and `` `code` `` spans used by result messages.
pub fn render_markdown(text: &str) -> String {
    let escaped = escape_html(text);
    wrap_spans(&escaped, "**", "strong", &|part| {
        wrap_spans(part, "`", "code", &|s| s.to_string())
    })
}

pub fn render_page(
    optimum_intel_version: &str,
    model_id: &str,
    result: Option<&Classification>,
) -> String {
    let result = result
        .map(|c| {
            format!(
                "<div id=\"result\" class=\"{}\">{}</div>",
                c.status().as_str(),
                render_markdown(&c.to_string())
            )
        })
        .unwrap_or_else(|| "<div id=\"result\"></div>".to_string());
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>optimum-intel[openvino] support check</title>
</head>
<body>
<h1>Check if model is supported by optimum-intel[openvino]</h1>
<form method="post" action="/">
<label for="model_id">model_id</label>
<input type="text" id="model_id" name="model_id" value="{model_id}" autofocus>
<button type="submit">Check</button>
</form>
{result}
<p>Tested with optimum-intel {version}. For testing purposes only, results may be wrong.</p>
</body>
</html>
"#,
        model_id = escape_html(model_id),
        result = result,
        version = escape_html(optimum_intel_version),
    )
}

pub async fn startup(config: ServerConfig, app_state: AppState<HttpHub>) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    log::info!("Starting server at {}:{}", config.host, config.port);

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure::<HttpHub>)
    })
    .bind((config.host, config.port))?
    .run()
    .await?;

    std::io::Result::Ok(())
}

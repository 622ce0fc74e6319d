use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use bytes::BufMut;
use chrono::Local;
use futures::TryStreamExt;
use medviscore::narrative::Language;
use serde_json::json;
use tokio::runtime::Builder;
use warp::multipart::{FormData, Part};
use warp::{Filter, Reply};

use crate::web::render;
use crate::web::session::{AnalysisRecord, PatientInfo, SessionContext};
use crate::workflow::runner::Runner;

const MAX_UPLOAD_BYTES: u64 = 15 * 1024 * 1024;

fn bind_address(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn language_from_query(query: &HashMap<String, String>) -> Language {
    query
        .get("lang")
        .and_then(|code| code.parse().ok())
        .unwrap_or_default()
}

/// Bridge hosting the web front-end: intake form, analysis, history, and
/// report download, with the session context injected into each handler.
pub struct WebBridge {
    context: Arc<SessionContext>,
}

impl WebBridge {
    pub fn new(runner: Arc<Runner>, context: Arc<SessionContext>, port: u16) -> Self {
        let context_for_filter = context.clone();
        let context_filter = warp::any().map(move || context_for_filter.clone());
        let runner_filter = warp::any().map(move || runner.clone());

        let form_route = warp::path::end()
            .and(warp::get())
            .and(warp::query::<HashMap<String, String>>())
            .map(|query: HashMap<String, String>| {
                warp::reply::html(render::form_page(language_from_query(&query)))
            });

        let analyze_route = warp::path("analyze")
            .and(warp::post())
            .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
            .and(runner_filter.clone())
            .and(context_filter.clone())
            .and_then(handle_analyze);

        let history_route = warp::path("history")
            .and(warp::get())
            .and(warp::query::<HashMap<String, String>>())
            .and(context_filter.clone())
            .map(
                |query: HashMap<String, String>, context: Arc<SessionContext>| {
                    let language = language_from_query(&query);
                    warp::reply::html(render::history_page(language, &context.recent()))
                },
            );

        let download_route = warp::path!("report" / usize / "download")
            .and(warp::get())
            .and(context_filter.clone())
            .map(|index: usize, context: Arc<SessionContext>| match context.record(index) {
                Some(record) => warp::reply::with_header(
                    warp::reply::with_header(
                        record.report,
                        "content-type",
                        "text/plain; charset=utf-8",
                    ),
                    "content-disposition",
                    format!("attachment; filename=\"report_{}.txt\"", index),
                )
                .into_response(),
                None => warp::reply::with_status(
                    "report not found",
                    warp::http::StatusCode::NOT_FOUND,
                )
                .into_response(),
            });

        let status_route = warp::path("status")
            .and(warp::get())
            .and(context_filter)
            .map(|context: Arc<SessionContext>| {
                let (analyses, failures, narrative_errors) = context.metrics.snapshot();
                warp::reply::json(&json!({
                    "analyses": analyses,
                    "failures": failures,
                    "narrative_errors": narrative_errors,
                    "history": context.len(),
                }))
            });

        thread::spawn(move || {
            let routes = form_route
                .or(analyze_route)
                .or(history_route)
                .or(download_route)
                .or(status_route);
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build runtime");
            runtime.block_on(async move {
                warp::serve(routes).run(bind_address(port)).await;
            });
        });

        Self { context }
    }

    pub fn publish_status(&self, message: &str) {
        println!("[WEB] {}", message);
    }

    pub fn history_len(&self) -> usize {
        self.context.len()
    }
}

async fn collect_part(part: Part) -> Result<Vec<u8>, warp::Error> {
    part.stream()
        .try_fold(Vec::new(), |mut collected, data| {
            collected.put(data);
            async move { Ok(collected) }
        })
        .await
}

async fn handle_analyze(
    form: FormData,
    runner: Arc<Runner>,
    context: Arc<SessionContext>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut upload: Option<(String, Vec<u8>)> = None;

    let parts: Vec<Part> = match form.try_collect().await {
        Ok(parts) => parts,
        Err(err) => {
            let html = render::error_page(Language::default(), &err.to_string());
            return Ok(warp::reply::html(html).into_response());
        }
    };

    for part in parts {
        let name = part.name().to_string();
        if name == "image" {
            let file_name = part
                .filename()
                .map(|value| value.to_string())
                .unwrap_or_else(|| "upload.img".to_string());
            match collect_part(part).await {
                Ok(data) => upload = Some((file_name, data)),
                Err(err) => {
                    let html = render::error_page(Language::default(), &err.to_string());
                    return Ok(warp::reply::html(html).into_response());
                }
            }
        } else {
            match collect_part(part).await {
                Ok(data) => {
                    fields.insert(name, String::from_utf8_lossy(&data).into_owned());
                }
                Err(err) => {
                    let html = render::error_page(Language::default(), &err.to_string());
                    return Ok(warp::reply::html(html).into_response());
                }
            }
        }
    }

    let language = fields
        .get("language")
        .and_then(|code| code.parse().ok())
        .unwrap_or_default();

    let (file_name, data) = match upload {
        Some(upload) => upload,
        None => {
            let html = render::error_page(language, "no image uploaded");
            return Ok(warp::reply::html(html).into_response());
        }
    };

    // Uploads land in a per-request temp directory that is removed once the
    // analysis finishes, keeping only the in-memory record.
    let safe_name = std::path::Path::new(&file_name)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.img".to_string());
    let temp_dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => {
            let html = render::error_page(language, &err.to_string());
            return Ok(warp::reply::html(html).into_response());
        }
    };
    let upload_path = temp_dir.path().join(&safe_name);
    if let Err(err) = std::fs::write(&upload_path, &data) {
        let html = render::error_page(language, &err.to_string());
        return Ok(warp::reply::html(html).into_response());
    }

    match runner.execute(&upload_path, language).await {
        Ok(result) => {
            let record = AnalysisRecord {
                timestamp: Local::now().format("%Y-%m-%d %H:%M").to_string(),
                patient: PatientInfo::from_fields(&fields),
                source_name: result.source_name.clone(),
                report: result.report.clone(),
            };
            let index = context.append(record);
            let html = render::report_page(language, &result.source_name, &result.report, index);
            Ok(warp::reply::html(html).into_response())
        }
        Err(err) => {
            let html = render::error_page(language, &format!("{:#}", err));
            Ok(warp::reply::html(html).into_response())
        }
    }
}

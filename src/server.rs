//! The HTTP endpoints the dashboard frontend consumes.
//!
//! Five routes serve the cached snapshots (JSON and raw CSV) and one serves
//! the reconciliation report. Every response carries the CORS headers for
//! the configured frontend origin. The cache files are read on every request,
//! so a response always reflects the latest completed refresh cycle.

use crate::model::Source;
use crate::pipeline::Pipeline;
use crate::report::Report;
use crate::Result;
use anyhow::Context;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Binds the configured address and serves requests until the task is
/// cancelled. Each connection runs on its own task.
pub async fn serve(pipeline: Arc<Pipeline>) -> Result<()> {
    let addr = pipeline.config().bind_address().to_string();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Unable to bind {addr}"))?;
    info!("HTTP server listening on {addr}");

    loop {
        let (stream, remote) = listener
            .accept()
            .await
            .context("Failed to accept a connection")?;
        let io = TokioIo::new(stream);
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let pipeline = Arc::clone(&pipeline);
                async move { Ok::<_, Infallible>(handle(req, &pipeline).await) }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Connection from {remote} ended: {e}");
            }
        });
    }
}

/// Routes one request. Never fails: every error path has a response.
pub(crate) async fn handle<B>(req: Request<B>, pipeline: &Pipeline) -> Response<Full<Bytes>> {
    debug!("{} {}", req.method(), req.uri().path());
    let origin = pipeline.config().allowed_origin().to_string();

    let response = match (req.method(), req.uri().path()) {
        (&Method::OPTIONS, _) => preflight(),
        (&Method::GET, "/dados-json") => dados_json_combined(pipeline).await,
        (&Method::GET, "/dados-json-tesouro") => dados_json(pipeline, Source::Tesouro).await,
        (&Method::GET, "/dados-json-siconfi") => dados_json(pipeline, Source::Siconfi).await,
        (&Method::GET, "/download-csv-tesouro") => download_csv(pipeline, Source::Tesouro).await,
        (&Method::GET, "/download-csv-siconfi") => download_csv(pipeline, Source::Siconfi).await,
        (&Method::GET, "/relatorio") => relatorio(pipeline).await,
        _ => text(StatusCode::NOT_FOUND, "Não encontrado"),
    };
    with_cors(response, &origin)
}

async fn dados_json_combined(pipeline: &Pipeline) -> Response<Full<Bytes>> {
    let mut records = Vec::new();
    for source in Source::ALL {
        match pipeline.cache(source).read().await {
            Ok(more) => records.extend(more),
            Err(e) => return internal_error(e),
        }
    }
    json(StatusCode::OK, &records)
}

async fn dados_json(pipeline: &Pipeline, source: Source) -> Response<Full<Bytes>> {
    match pipeline.cache(source).read().await {
        Ok(records) => json(StatusCode::OK, &records),
        Err(e) => internal_error(e),
    }
}

async fn download_csv(pipeline: &Pipeline, source: Source) -> Response<Full<Bytes>> {
    let cache = pipeline.cache(source);
    if !cache.exists() {
        let message = match source {
            Source::Tesouro => "CSV do Tesouro ainda não foi gerado.",
            Source::Siconfi => "CSV do SICONFI ainda não foi gerado.",
        };
        return text(StatusCode::INTERNAL_SERVER_ERROR, message);
    }
    match cache.read_raw().await {
        Ok(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/csv; charset=utf-8")
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", source.csv_filename()),
            )
            .body(Full::new(Bytes::from(bytes)))
            .unwrap_or_else(|_| text(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno")),
        Err(e) => internal_error(e),
    }
}

async fn relatorio(pipeline: &Pipeline) -> Response<Full<Bytes>> {
    let tesouro = match pipeline.cache(Source::Tesouro).read().await {
        Ok(records) => records,
        Err(e) => return internal_error(e),
    };
    let siconfi = match pipeline.cache(Source::Siconfi).read().await {
        Ok(records) => records,
        Err(e) => return internal_error(e),
    };
    json(StatusCode::OK, &Report::build(&tesouro, &siconfi))
}

fn preflight() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| text(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno"))
}

fn json<T: serde::Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap_or_else(|_| text(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno")),
        Err(e) => internal_error(e.into()),
    }
}

fn text(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(message.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn internal_error(e: crate::Error) -> Response<Full<Bytes>> {
    tracing::error!("Request failed: {e:#}");
    text(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno")
}

/// Adds the CORS headers the dashboard frontend needs. GET-only API, basic
/// headers, origin from config.
fn with_cors(mut response: Response<Full<Bytes>>, origin: &str) -> Response<Full<Bytes>> {
    let headers = response.headers_mut();
    if let Ok(value) = hyper::header::HeaderValue::from_str(origin) {
        headers.insert("Access-Control-Allow-Origin", value);
    }
    headers.insert(
        "Access-Control-Allow-Methods",
        hyper::header::HeaderValue::from_static("GET"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        hyper::header::HeaderValue::from_static("Content-Type"),
    );
    response
}

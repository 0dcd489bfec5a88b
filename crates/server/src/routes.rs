//! Request dispatch and the comparison handlers.
//!
//! Routes:
//! - `GET /` — upload form.
//! - `POST /compare` — run both execution modes on the upload and show
//!   both matrices and timings side by side.
//! - `POST /singlethread`, `POST /multithread` — one mode each.
//! - anything else — `404 Not Found`.

use std::sync::Arc;

use fragsim::{compare_surfaces, decode_surface, CompareOptions, ComparisonResult, ExecutionMode};

use crate::error::{ServerError, ServerResult};
use crate::multipart;
use crate::request::RawRequest;
use crate::response::HttpResponse;
use crate::state::ServerState;
use crate::templates;

/// Which execution modes a route triggers.
#[derive(Debug, Clone, Copy)]
enum ComparePlan {
    SingleOnly,
    MultiOnly,
    Both,
}

/// Route one parsed request to its handler.
pub fn dispatch(state: &ServerState, request: &RawRequest) -> ServerResult<HttpResponse> {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/") => Ok(HttpResponse::html(templates::render_upload_form())),
        ("POST", "/compare") => handle_compare(state, request, ComparePlan::Both),
        ("POST", "/singlethread") => handle_compare(state, request, ComparePlan::SingleOnly),
        ("POST", "/multithread") => handle_compare(state, request, ComparePlan::MultiOnly),
        _ => Err(ServerError::NotFound),
    }
}

fn handle_compare(
    state: &ServerState,
    request: &RawRequest,
    plan: ComparePlan,
) -> ServerResult<HttpResponse> {
    let boundary = request
        .boundary()
        .ok_or(ServerError::MissingMetadata("multipart boundary"))?;
    if request.body.is_empty() {
        return Err(ServerError::MissingMetadata("request body"));
    }

    let uploaded_bytes = multipart::extract_file_payload(&request.body, boundary)?;

    let reference = Arc::new(decode_surface(&state.reference_image)?);
    let uploaded = Arc::new(decode_surface(uploaded_bytes)?);

    let options = CompareOptions {
        worker_count: state.config.worker_count,
        ..Default::default()
    };

    let mut sections: Vec<(&str, ComparisonResult)> = Vec::new();
    if matches!(plan, ComparePlan::SingleOnly | ComparePlan::Both) {
        let result = compare_surfaces(
            &reference,
            &uploaded,
            ExecutionMode::SingleThread,
            &options,
        )?;
        log_result("single-thread", &result);
        sections.push(("Single-threaded", result));
    }
    if matches!(plan, ComparePlan::MultiOnly | ComparePlan::Both) {
        let result =
            compare_surfaces(&reference, &uploaded, ExecutionMode::MultiThread, &options)?;
        log_result("multi-thread", &result);
        sections.push(("Multi-threaded", result));
    }

    Ok(HttpResponse::html(templates::render_comparison_page(
        &sections,
        &state.reference_image,
        uploaded_bytes,
    )))
}

fn log_result(mode: &str, result: &ComparisonResult) {
    tracing::info!(
        mode,
        total_score = result.total_score,
        elapsed_ms = result.elapsed_ms() as u64,
        "comparison served"
    );
}

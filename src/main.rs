// ABOUTME: Fastly Compute entry point for the error page handler
// ABOUTME: Serves the error page path and origin 403/404s, forwards everything else to the origin

#[cfg(target_arch = "wasm32")]
#[fastly::main]
fn main(req: fastly::Request) -> Result<fastly::Response, fastly::Error> {
    edge::serve(req)
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::error!("edge-error-page runs on Fastly Compute; build it with --target wasm32-wasi");
    std::process::exit(1);
}

#[cfg(target_arch = "wasm32")]
mod edge {
    use edge_error_page::params::{load_settings, KvConfigStore};
    use edge_error_page::storage::{S3ObjectStore, STORAGE_BACKEND};
    use edge_error_page::{ErrorPageHandler, HandlerError, Outcome, ViewerEvent, ViewerRequest, ViewerResponse};
    use fastly::http::{header, StatusCode};
    use fastly::{Error, Request, Response};
    use std::sync::{Arc, OnceLock};

    /// Origin backend name (must match fastly.toml)
    const ORIGIN_BACKEND: &str = "origin";

    /// Per-request trace id exposed by the Compute runtime
    const TRACE_ID_ENV: &str = "FASTLY_TRACE_ID";

    static HANDLER: OnceLock<ErrorPageHandler> = OnceLock::new();

    /// Handler context for this instance, built on first request
    fn handler() -> &'static ErrorPageHandler {
        HANDLER.get_or_init(|| {
            let (settings, errors) = load_settings();
            for e in errors {
                log::warn!("Ignoring setting: {}", e);
            }
            log::info!(
                "Error page handler starting: cache_mode={:?} failure_policy={:?}",
                settings.cache_mode,
                settings.failure_policy
            );

            let config = Arc::new(KvConfigStore::new(settings.config_table.clone()));
            let objects = Arc::new(S3ObjectStore::new(STORAGE_BACKEND, settings.region.clone()));
            ErrorPageHandler::new(settings, config, objects)
        })
    }

    pub fn serve(req: Request) -> Result<Response, Error> {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

        log::debug!("[ERROR PAGE] method={} path={}", req.get_method(), req.get_path());

        let request_id = std::env::var(TRACE_ID_ENV).ok();

        match handler().handle(viewer_event(&req, request_id.clone())) {
            Ok(Outcome::PassThrough(_)) => {
                let beresp = req.send(ORIGIN_BACKEND)?;
                let status = beresp.get_status().as_u16();

                match handler().handle_origin_status(status, request_id) {
                    Ok(Some(page)) => Ok(into_response(page)),
                    Ok(None) => Ok(beresp),
                    Err(e) => Ok(error_response(&e)),
                }
            }
            Ok(Outcome::Respond(response)) => Ok(into_response(response)),
            Err(e) => Ok(error_response(&e)),
        }
    }

    fn viewer_event(req: &Request, request_id: Option<String>) -> ViewerEvent {
        let request = ViewerRequest::new(req.get_path())
            .with_field("method", req.get_method_str().into())
            .with_field("querystring", req.get_query_str().unwrap_or("").into());

        ViewerEvent::new(request, request_id)
    }

    fn into_response(viewer: ViewerResponse) -> Response {
        let status = StatusCode::from_u16(viewer.status).unwrap_or(StatusCode::OK);
        let mut resp = Response::from_status(status);
        for entry in viewer.headers.values().flatten() {
            resp.set_header(entry.key.as_str(), entry.value.as_str());
        }
        resp.set_body(viewer.body);
        resp
    }

    /// Create error response
    fn error_response(error: &HandlerError) -> Response {
        let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut resp = Response::from_status(status);
        resp.set_header(header::CONTENT_TYPE, "application/json");

        let body = serde_json::json!({
            "error": error.to_string()
        });
        resp.set_body(body.to_string());
        resp
    }
}

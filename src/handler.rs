// ABOUTME: Edge request handler for the custom error page
// ABOUTME: Intercepts the error page path and renders the template with the request id

use crate::config_store::ConfigProvider;
use crate::error::{HandlerError, Result, TemplateFetchError};
use crate::event::{Outcome, ViewerEvent, ViewerRequest, ViewerResponse};
use crate::object_store::ObjectStore;
use crate::resolver::ConfigResolver;
use crate::settings::{
    FailurePolicy, Settings, DEFAULT_CACHE_CONTROL, DEFAULT_ERROR_PATH, REQUEST_ID_NOT_FOUND, REQUEST_ID_TOKEN,
};
use crate::template::TemplateCache;
use std::sync::Arc;

/// Served when the template cannot be loaded under `FailurePolicy::Fallback`
pub const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Page not found</title></head>
<body>
<h1>Page not found</h1>
<p>The page you requested could not be found.</p>
<p><small>Request ID: __CF_REQUEST_ID__</small></p>
</body>
</html>
"#;

/// Origin statuses answered with the error page instead
pub const ORIGIN_ERROR_STATUSES: [u16; 2] = [403, 404];

/// Lifecycle of an instance's caches; never moves backwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Cold,
    ConfigResolved,
    TemplateCached,
}

/// Handler context, built once per instance and shared by all invocations
pub struct ErrorPageHandler {
    settings: Settings,
    templates: TemplateCache,
}

impl ErrorPageHandler {
    pub fn new(
        settings: Settings,
        config: Arc<dyn ConfigProvider>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        let resolver = ConfigResolver::new(config, settings.config_key.clone());
        let templates = TemplateCache::new(
            settings.cache_mode,
            resolver,
            objects,
            settings.object_key.clone(),
            settings.disk_path.clone(),
        );

        Self {
            settings,
            templates,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    pub fn phase(&self) -> Phase {
        if self.templates.is_cached() {
            Phase::TemplateCached
        } else if self.templates.resolver().is_resolved() {
            Phase::ConfigResolved
        } else {
            Phase::Cold
        }
    }

    /// Handle one viewer event
    pub fn handle(&self, event: ViewerEvent) -> Result<Outcome> {
        let (request, request_id) = event
            .into_first()
            .ok_or_else(|| HandlerError::MalformedEvent("event has no records".into()))?;

        if !self.intercepts(&request) {
            return Ok(Outcome::PassThrough(request));
        }

        let request_id = request_id.unwrap_or_else(|| REQUEST_ID_NOT_FOUND.to_string());
        log::debug!("Processing error page request id {}", request_id);

        let template = match self.templates.get_template() {
            Ok(template) => template,
            Err(e) => self.on_template_error(e)?,
        };

        Ok(Outcome::Respond(self.build_response(render(&template, &request_id))))
    }

    /// Render the error page in place of an origin error response.
    ///
    /// Returns `None` when the origin status is served as-is. The page keeps
    /// its own status (200) and headers whatever the origin returned.
    pub fn handle_origin_status(&self, status: u16, request_id: Option<String>) -> Result<Option<ViewerResponse>> {
        if !ORIGIN_ERROR_STATUSES.contains(&status) {
            return Ok(None);
        }

        log::info!("Origin returned {}, serving error page", status);
        let event = ViewerEvent::new(ViewerRequest::new(DEFAULT_ERROR_PATH), request_id);
        match self.handle(event)? {
            Outcome::Respond(response) => Ok(Some(response)),
            Outcome::PassThrough(_) => Ok(None),
        }
    }

    fn intercepts(&self, request: &ViewerRequest) -> bool {
        request.uri() == Some(DEFAULT_ERROR_PATH)
    }

    fn on_template_error(&self, error: TemplateFetchError) -> Result<String> {
        match self.settings.failure_policy {
            FailurePolicy::Fallback => {
                log::error!("Serving fallback error page: {}", error);
                Ok(FALLBACK_PAGE.to_string())
            }
            FailurePolicy::Propagate => {
                log::error!("Error page template unavailable: {}", error);
                Err(error.into())
            }
        }
    }

    fn build_response(&self, body: String) -> ViewerResponse {
        ViewerResponse::new(200, "OK", body)
            .with_header("Cache-Control", DEFAULT_CACHE_CONTROL)
            .with_header("Content-Type", "text/html")
    }
}

/// Replace every request id token in the template
pub fn render(template: &str, request_id: &str) -> String {
    template.replace(REQUEST_ID_TOKEN, request_id)
}

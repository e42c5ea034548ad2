//! Restriction-checker widget.
//!
//! Embedded in a product page, the widget classifies the page by URL, reads
//! the LINE user id from the `line_user_id` query parameter and asks the
//! backend whether that user is restricted for the product. A restricted
//! user gets a full-page call-to-action overlay.
//!
//! Two entry points exist: [`RestrictionChecker::check_restriction`] (cheap
//! boolean probe) and [`RestrictionChecker::show_restriction_message`]
//! (decision plus display template). [`RestrictionChecker::init`] calls the
//! latter directly; with `precheck` enabled it probes first and only fetches
//! the template for restricted users.
//!
//! The widget fails open: every network or decoding error is logged and
//! treated as "not restricted". It never blocks page content on an error.

pub mod content_type;
pub mod overlay;

use std::sync::Arc;

use serde::Serialize;

use crate::api::types::{RestrictionCheckResponse, RestrictionMessageResponse, RestrictionRequest};
use crate::api::{HttpClient, RequestOptions, Transport};
use crate::config::ConsoleConfig;
use crate::diagnostics::Diagnostics;
use crate::dom::{Document, NodeId};
use crate::session::MemoryTokenStore;
use crate::utils::query::{encode_uri_component, query_param};

pub use content_type::ContentType;

const SOURCE: &str = "widget";

/// Result of the boolean probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestrictionCheck {
    pub restricted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RestrictionCheck {
    fn unrestricted() -> Self {
        Self {
            restricted: false,
            error: None,
        }
    }
}

/// What a widget run did to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetOutcome {
    /// The URL matched no product; nothing was requested.
    Unclassified,
    /// No `line_user_id`; nothing was requested.
    NoUserId,
    NotRestricted,
    /// The overlay was shown.
    Restricted { overlay: NodeId },
    /// The request failed; the page was left untouched.
    Failed { error: String },
}

pub struct RestrictionChecker {
    client: HttpClient,
    page_url: String,
    content_type: Option<ContentType>,
    precheck: bool,
    diagnostics: Diagnostics,
}

impl RestrictionChecker {
    /// Checker for the page at `page_url`, talking to `api_base_url`.
    ///
    /// The restriction endpoints are called without a bearer token.
    pub fn new(
        api_base_url: &str,
        transport: Arc<dyn Transport>,
        page_url: &str,
        diagnostics: Diagnostics,
    ) -> Self {
        let client = HttpClient::new(api_base_url, transport, Arc::new(MemoryTokenStore::new()));
        Self {
            client,
            page_url: page_url.to_string(),
            content_type: ContentType::from_url(page_url),
            precheck: false,
            diagnostics,
        }
    }

    /// Checker configured from the `[widget]` section.
    pub fn from_config(
        config: &ConsoleConfig,
        transport: Arc<dyn Transport>,
        page_url: &str,
        diagnostics: Diagnostics,
    ) -> Self {
        Self::new(&config.widget.api_base_url, transport, page_url, diagnostics)
            .with_precheck(config.widget.precheck)
    }

    /// Probe with [`check_restriction`](Self::check_restriction) before
    /// fetching the template.
    pub fn with_precheck(mut self, precheck: bool) -> Self {
        self.precheck = precheck;
        self
    }

    pub fn content_type(&self) -> Option<ContentType> {
        self.content_type
    }

    /// `line_user_id` from the page URL's query; an empty value is absent.
    pub fn line_user_id(&self) -> Option<String> {
        query_param(&self.page_url, "line_user_id").filter(|id| !id.is_empty())
    }

    /// Ask whether the user is restricted.
    ///
    /// Without a user id or content type no request is made and the answer
    /// is "not restricted". Errors are logged and also answer "not
    /// restricted", with the error message attached.
    pub fn check_restriction(&self) -> RestrictionCheck {
        let Some(content_type) = self.content_type else {
            return RestrictionCheck::unrestricted();
        };
        let Some(user_id) = self.line_user_id() else {
            self.diagnostics.info(SOURCE, "line_user_id not found");
            return RestrictionCheck::unrestricted();
        };

        match self.post::<RestrictionCheckResponse>("check_restriction", content_type, &user_id) {
            Ok(resp) => RestrictionCheck {
                restricted: resp.restricted,
                error: None,
            },
            Err(error) => {
                self.diagnostics
                    .error(SOURCE, format!("restriction check failed: {error}"));
                RestrictionCheck {
                    restricted: false,
                    error: Some(error),
                }
            }
        }
    }

    /// Fetch the decision with its template and, if restricted, overlay the
    /// page.
    pub fn show_restriction_message(&self, doc: &mut Document) -> WidgetOutcome {
        let Some(content_type) = self.content_type else {
            return WidgetOutcome::Unclassified;
        };
        let Some(user_id) = self.line_user_id() else {
            self.diagnostics.info(SOURCE, "line_user_id not found");
            return WidgetOutcome::NoUserId;
        };

        let resp = match self.post::<RestrictionMessageResponse>(
            "restriction_message",
            content_type,
            &user_id,
        ) {
            Ok(resp) => resp,
            Err(error) => {
                self.diagnostics
                    .error(SOURCE, format!("restriction message failed: {error}"));
                return WidgetOutcome::Failed { error };
            }
        };

        if !resp.restricted {
            return WidgetOutcome::NotRestricted;
        }

        match resp.message.and_then(|message| message.template) {
            Some(template) => WidgetOutcome::Restricted {
                overlay: overlay::display_restriction_ui(doc, &template),
            },
            None => {
                let error = "restricted response carried no message template".to_string();
                self.diagnostics.error(SOURCE, error.as_str());
                WidgetOutcome::Failed { error }
            }
        }
    }

    /// Run the widget once against `doc`.
    pub fn init(&self, doc: &mut Document) -> WidgetOutcome {
        let Some(content_type) = self.content_type else {
            self.diagnostics
                .info(SOURCE, "content type could not be determined");
            return WidgetOutcome::Unclassified;
        };
        self.diagnostics
            .info(SOURCE, format!("restriction check started: {content_type}"));

        if self.precheck {
            let check = self.check_restriction();
            if !check.restricted {
                return match check.error {
                    Some(error) => WidgetOutcome::Failed { error },
                    None if self.line_user_id().is_none() => WidgetOutcome::NoUserId,
                    None => WidgetOutcome::NotRestricted,
                };
            }
        }

        let outcome = self.show_restriction_message(doc);
        if matches!(outcome, WidgetOutcome::Restricted { .. }) {
            self.diagnostics.info(SOURCE, "restriction detected");
        }
        outcome
    }

    fn post<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        content_type: ContentType,
        user_id: &str,
    ) -> Result<T, String> {
        let path = format!(
            "/line/{endpoint}/{}",
            encode_uri_component(content_type.label())
        );
        let options = RequestOptions::post()
            .json(&RestrictionRequest {
                line_user_id: user_id,
            })
            .map_err(|e| e.to_string())?;
        self.client.fetch(&path, options).map_err(|e| e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

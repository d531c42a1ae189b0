use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the rewrite should do to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteIntent {
    Clarify,
    Shorten,
    Formalize,
}

impl RewriteIntent {
    pub const ALL: [RewriteIntent; 3] = [
        RewriteIntent::Clarify,
        RewriteIntent::Shorten,
        RewriteIntent::Formalize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RewriteIntent::Clarify => "clarify",
            RewriteIntent::Shorten => "shorten",
            RewriteIntent::Formalize => "formalize",
        }
    }
}

impl std::fmt::Display for RewriteIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rewrite intent `{0}` (expected clarify, shorten or formalize)")]
pub struct UnknownIntent(pub String);

impl FromStr for RewriteIntent {
    type Err = UnknownIntent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RewriteIntent::ALL
            .into_iter()
            .find(|intent| intent.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownIntent(s.to_string()))
    }
}

/// Payload sent to the rewrite service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRequest {
    pub text: String,
    pub node_type: String,
    pub intent: RewriteIntent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteResponse {
    pub original_text: String,
    pub rewritten_text: String,
}

impl RewriteResponse {
    /// The response that changes nothing.
    pub fn unchanged(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            original_text: text.clone(),
            rewritten_text: text,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.rewritten_text == self.original_text
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("rewrite service unavailable: {0}")]
    Unavailable(String),

    #[error("rewrite service timed out")]
    Timeout,

    #[error("malformed rewrite response: {0}")]
    Malformed(String),
}

/// Something that rewrites text. Implementations may fail; callers go
/// through [`request_rewrite`], which never does.
pub trait RewriteService {
    fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteResponse, ServiceError>;
}

impl<S: RewriteService + ?Sized> RewriteService for &S {
    fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteResponse, ServiceError> {
        (**self).rewrite(request)
    }
}

/// Call `service`, turning any failure into the unchanged response.
pub fn request_rewrite<S: RewriteService + ?Sized>(
    service: &S,
    request: &RewriteRequest,
) -> RewriteResponse {
    match service.rewrite(request) {
        Ok(response) => response,
        Err(err) => {
            log::warn!("rewrite ({}) failed, keeping text as is: {err}", request.intent);
            RewriteResponse::unchanged(request.text.clone())
        }
    }
}

static VERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bvery\b").expect("Invalid very regex"));
static KIND_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bkind of\b").expect("Invalid kind of regex"));
static CANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bcan't\b").expect("Invalid cant regex"));
static WONT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bwon't\b").expect("Invalid wont regex"));
static GONNA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bgonna\b").expect("Invalid gonna regex"));

/// Deterministic offline rewriter with simple string rules per intent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockRewriteService;

impl MockRewriteService {
    pub fn rewrite_text(text: &str, intent: RewriteIntent) -> String {
        match intent {
            RewriteIntent::Clarify => {
                let text = VERY.replace_all(text, "");
                format!("(Clarified) {}", KIND_OF.replace_all(&text, ""))
            }
            RewriteIntent::Shorten => {
                let words: Vec<&str> = text.split(' ').collect();
                if words.len() > 5 {
                    let keep = (words.len() * 7).div_ceil(10);
                    format!("{}.", words[..keep].join(" "))
                } else {
                    text.to_string()
                }
            }
            RewriteIntent::Formalize => {
                let text = CANT.replace_all(text, "cannot");
                let text = WONT.replace_all(&text, "will not");
                let text = GONNA.replace_all(&text, "going to");
                format!("{text} Furthermore, we concur.")
            }
        }
    }
}

impl RewriteService for MockRewriteService {
    fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteResponse, ServiceError> {
        Ok(RewriteResponse {
            original_text: request.text.clone(),
            rewritten_text: Self::rewrite_text(&request.text, request.intent),
        })
    }
}

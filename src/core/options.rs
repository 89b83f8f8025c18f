//! Publish and subscribe options.
//!
//! An option is a small validated mutation of a [`RequestSpec`]. Options are
//! applied in the order given and the first failure aborts the call before any
//! request is sent.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::RequestBuilder;

use crate::core::error::{ClientError, Result};

/// Length of a server generated message id.
const MESSAGE_ID_LEN: usize = 12;

/// Credentials attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { user: String, password: String },
    Token(String),
}

/// Headers, query parameters and credentials of an outgoing request, built up
/// by options before the request exists.
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    headers: HeaderMap,
    query: Vec<(String, String)>,
    credentials: Option<Credentials>,
}

impl RequestSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ClientError::InvalidOption(format!("invalid header name: {name}")))?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            ClientError::InvalidOption(format!("invalid value for header {name}: {value}"))
        })?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn remove_header(&mut self, name: &str) {
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            if name == AUTHORIZATION {
                self.credentials = None;
            }
            self.headers.remove(name);
        }
    }

    /// Sets a query parameter, replacing any earlier value of the same name.
    pub fn set_query(&mut self, name: &str, value: &str) {
        self.query.retain(|(n, _)| n != name);
        self.query.push((name.to_owned(), value.to_owned()));
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.headers.remove(AUTHORIZATION);
        self.credentials = Some(credentials);
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub(crate) fn apply_to(self, mut builder: RequestBuilder) -> RequestBuilder {
        builder = builder.headers(self.headers);
        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }
        match self.credentials {
            Some(Credentials::Basic { user, password }) => builder.basic_auth(user, Some(password)),
            Some(Credentials::Token(token)) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOption {
    Header { name: String, value: String },
    RemoveHeader(String),
    QueryParam { name: String, value: String },
    Priority(String),
    Since(String),
    Auth(Option<Credentials>),
}

pub type PublishOption = RequestOption;
pub type SubscribeOption = RequestOption;

impl RequestOption {
    pub fn apply(&self, spec: &mut RequestSpec) -> Result<()> {
        match self {
            RequestOption::Header { name, value } => spec.set_header(name, value),
            RequestOption::RemoveHeader(name) => {
                spec.remove_header(name);
                Ok(())
            }
            RequestOption::QueryParam { name, value } => {
                spec.set_query(name, value);
                Ok(())
            }
            RequestOption::Priority(priority) => {
                if !is_valid_priority(priority) {
                    return Err(ClientError::InvalidOption(format!(
                        "invalid priority: {priority}"
                    )));
                }
                spec.set_header("X-Priority", priority)
            }
            RequestOption::Since(since) => {
                if !is_valid_since(since) {
                    return Err(ClientError::InvalidOption(format!("invalid since: {since}")));
                }
                spec.set_query("since", since);
                Ok(())
            }
            RequestOption::Auth(Some(credentials)) => {
                spec.set_credentials(credentials.clone());
                Ok(())
            }
            RequestOption::Auth(None) => {
                spec.remove_header(AUTHORIZATION.as_str());
                Ok(())
            }
        }
    }
}

/// Applies `options` in order, stopping at the first failure.
pub fn apply_options(spec: &mut RequestSpec, options: &[RequestOption]) -> Result<()> {
    options.iter().try_for_each(|option| option.apply(spec))
}

fn is_valid_priority(priority: &str) -> bool {
    matches!(
        priority.to_ascii_lowercase().as_str(),
        "1" | "2" | "3" | "4" | "5" | "min" | "low" | "default" | "high" | "max" | "urgent"
    )
}

// all | latest | <unix time> | <n>[smhd] | <message id>
fn is_valid_since(since: &str) -> bool {
    if since == "all" || since == "latest" {
        return true;
    }
    if !since.is_empty() && since.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    if let Some(amount) = since.strip_suffix(['s', 'm', 'h', 'd']) {
        if !amount.is_empty() && amount.bytes().all(|b| b.is_ascii_digit()) {
            return true;
        }
    }
    since.len() == MESSAGE_ID_LEN && since.bytes().all(|b| b.is_ascii_alphanumeric())
}

// ───────────────────────────────────────────────────────────
// Generic
// ───────────────────────────────────────────────────────────

pub fn with_header(name: impl Into<String>, value: impl Into<String>) -> RequestOption {
    RequestOption::Header {
        name: name.into(),
        value: value.into(),
    }
}

pub fn remove_header(name: impl Into<String>) -> RequestOption {
    RequestOption::RemoveHeader(name.into())
}

pub fn with_query_param(name: impl Into<String>, value: impl Into<String>) -> RequestOption {
    RequestOption::QueryParam {
        name: name.into(),
        value: value.into(),
    }
}

// ───────────────────────────────────────────────────────────
// Publish
// ───────────────────────────────────────────────────────────

/// Message body as a header, useful when the request body carries a file.
pub fn with_message(message: impl Into<String>) -> PublishOption {
    with_header("X-Message", message)
}

pub fn with_title(title: impl Into<String>) -> PublishOption {
    with_header("X-Title", title)
}

/// `1`–`5` or one of `min`, `low`, `default`, `high`, `max`, `urgent`.
pub fn with_priority(priority: impl Into<String>) -> PublishOption {
    RequestOption::Priority(priority.into())
}

/// Comma separated tag list, e.g. `warning,skull`.
pub fn with_tags_list(tags: impl Into<String>) -> PublishOption {
    with_header("X-Tags", tags)
}

pub fn with_tags<S: AsRef<str>>(tags: &[S]) -> PublishOption {
    let joined = tags.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
    with_tags_list(joined)
}

/// Delivery delay such as `30m`, `tomorrow, 9am` or a unix timestamp.
pub fn with_delay(delay: impl Into<String>) -> PublishOption {
    with_header("X-Delay", delay)
}

pub fn with_click(url: impl Into<String>) -> PublishOption {
    with_header("X-Click", url)
}

pub fn with_icon(url: impl Into<String>) -> PublishOption {
    with_header("X-Icon", url)
}

pub fn with_actions(actions: impl Into<String>) -> PublishOption {
    with_header("X-Actions", actions)
}

pub fn with_attach(url: impl Into<String>) -> PublishOption {
    with_header("X-Attach", url)
}

pub fn with_filename(filename: impl Into<String>) -> PublishOption {
    with_header("X-Filename", filename)
}

pub fn with_email(email: impl Into<String>) -> PublishOption {
    with_header("X-Email", email)
}

pub fn with_markdown() -> PublishOption {
    with_header("X-Markdown", "yes")
}

/// Message is not stored server side; only live subscribers see it.
pub fn with_no_cache() -> PublishOption {
    with_header("X-Cache", "no")
}

pub fn with_no_firebase() -> PublishOption {
    with_header("X-Firebase", "no")
}

// ───────────────────────────────────────────────────────────
// Auth
// ───────────────────────────────────────────────────────────

pub fn with_basic_auth(user: impl Into<String>, password: impl Into<String>) -> RequestOption {
    RequestOption::Auth(Some(Credentials::Basic {
        user: user.into(),
        password: password.into(),
    }))
}

pub fn with_bearer_auth(token: impl Into<String>) -> RequestOption {
    RequestOption::Auth(Some(Credentials::Token(token.into())))
}

pub fn with_credentials(credentials: &Credentials) -> RequestOption {
    RequestOption::Auth(Some(credentials.clone()))
}

/// Drops any credentials set by an earlier option.
pub fn with_empty_auth() -> RequestOption {
    RequestOption::Auth(None)
}

// ───────────────────────────────────────────────────────────
// Subscribe / poll
// ───────────────────────────────────────────────────────────

pub fn with_since(since: impl Into<String>) -> SubscribeOption {
    RequestOption::Since(since.into())
}

pub fn with_since_all() -> SubscribeOption {
    with_since("all")
}

pub fn with_since_unix_time(since: i64) -> SubscribeOption {
    with_since(since.to_string())
}

/// Return cached messages and close the stream instead of waiting for new ones.
pub fn with_poll() -> SubscribeOption {
    with_query_param("poll", "1")
}

/// Include messages scheduled for later delivery.
pub fn with_scheduled() -> SubscribeOption {
    with_query_param("scheduled", "1")
}

/// Server side filter, e.g. `with_filter("priority", "high,urgent")`.
pub fn with_filter(name: impl Into<String>, value: impl Into<String>) -> SubscribeOption {
    with_query_param(name, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_options_set_headers() {
        let mut spec = RequestSpec::new();
        apply_options(
            &mut spec,
            &[
                with_title("Backup done"),
                with_priority("high"),
                with_tags(&["white_check_mark", "backup"]),
                with_delay("30m"),
                with_click("https://example.com"),
                with_markdown(),
                with_no_cache(),
                with_no_firebase(),
            ],
        )
        .unwrap();

        assert_eq!(spec.header("x-title"), Some("Backup done"));
        assert_eq!(spec.header("X-Priority"), Some("high"));
        assert_eq!(spec.header("X-Tags"), Some("white_check_mark,backup"));
        assert_eq!(spec.header("X-Delay"), Some("30m"));
        assert_eq!(spec.header("X-Click"), Some("https://example.com"));
        assert_eq!(spec.header("X-Markdown"), Some("yes"));
        assert_eq!(spec.header("X-Cache"), Some("no"));
        assert_eq!(spec.header("X-Firebase"), Some("no"));
    }

    #[test]
    fn later_options_override_earlier_ones() {
        let mut spec = RequestSpec::new();
        apply_options(&mut spec, &[with_title("one"), with_title("two"), with_since_all(), with_since("10m")])
            .unwrap();
        assert_eq!(spec.header("X-Title"), Some("two"));
        assert_eq!(spec.query("since"), Some("10m"));
    }

    #[test]
    fn first_failure_short_circuits() {
        let mut spec = RequestSpec::new();
        let err = apply_options(
            &mut spec,
            &[with_title("kept"), with_priority("6"), with_title("never applied")],
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidOption(_)));
        assert_eq!(spec.header("X-Title"), Some("kept"));
    }

    #[test]
    fn invalid_header_is_rejected() {
        let mut spec = RequestSpec::new();
        assert!(with_header("bad header", "x").apply(&mut spec).is_err());
        assert!(with_title("line\nbreak").apply(&mut spec).is_err());
    }

    #[test]
    fn since_validation() {
        for ok in ["all", "latest", "1700000000", "10m", "2h", "1d", "30s", "hwQ2YpKdmgAb"] {
            assert!(with_since(ok).apply(&mut RequestSpec::new()).is_ok(), "{ok}");
        }
        for bad in ["", "yesterday", "10x", "m", "hwQ2Yp-dmgAb"] {
            assert!(with_since(bad).apply(&mut RequestSpec::new()).is_err(), "{bad}");
        }
        let mut spec = RequestSpec::new();
        with_since_unix_time(1_700_000_000).apply(&mut spec).unwrap();
        assert_eq!(spec.query("since"), Some("1700000000"));
    }

    #[test]
    fn subscribe_options_set_query() {
        let mut spec = RequestSpec::new();
        apply_options(&mut spec, &[with_poll(), with_scheduled(), with_filter("tags", "a,b")]).unwrap();
        assert_eq!(spec.query("poll"), Some("1"));
        assert_eq!(spec.query("scheduled"), Some("1"));
        assert_eq!(spec.query("tags"), Some("a,b"));
    }

    #[test]
    fn empty_auth_clears_credentials() {
        let mut spec = RequestSpec::new();
        apply_options(&mut spec, &[with_basic_auth("phil", "secret")]).unwrap();
        assert_eq!(
            spec.credentials(),
            Some(&Credentials::Basic {
                user: "phil".into(),
                password: "secret".into()
            })
        );

        apply_options(&mut spec, &[with_empty_auth()]).unwrap();
        assert!(spec.credentials().is_none());

        apply_options(&mut spec, &[with_bearer_auth("tk_123")]).unwrap();
        assert_eq!(spec.credentials(), Some(&Credentials::Token("tk_123".into())));
    }
}

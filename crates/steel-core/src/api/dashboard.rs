//! Form-driven API commands
//!
//! Each command is an [`Endpoint`]: an HTTP method, a path that may hold
//! `{param}` placeholders, and an optional form. Form answers fill the
//! placeholders first; whatever is left becomes the JSON body.

use crate::api::client::{unwrap_result, ApiClient};
use crate::error::ApiError;
use crate::prompt::{Choice, Prompter};
use anyhow::Result;
use reqwest::Method;
use serde_json::{Map, Value};
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
    /// One of the field's `options`
    Select,
}

/// A labelled value offered by a select field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    pub label: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
    pub required: bool,
    /// Used when the answer is left blank
    pub initial_value: Option<String>,
    pub options: &'static [SelectOption],
}

impl Field {
    fn new(name: &'static str, kind: FieldKind, label: &'static str, required: bool) -> Self {
        Self {
            name,
            kind,
            label,
            required,
            initial_value: None,
            options: &[],
        }
    }

    fn select(
        name: &'static str,
        label: &'static str,
        options: &'static [SelectOption],
        initial: &'static str,
    ) -> Self {
        Self {
            options,
            ..Self::new(name, FieldKind::Select, label, false).initial(initial)
        }
    }

    fn initial(mut self, value: impl Into<String>) -> Self {
        self.initial_value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub title: &'static str,
    pub sections: Vec<Section>,
}

impl Form {
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub description: &'static str,
    pub method: Method,
    pub path: &'static str,
    /// Key of the response object holding the results
    pub result_object: Option<&'static str>,
    pub form: Option<Form>,
    /// The response is a file, saved under the value of this form field
    pub save_as: Option<&'static str>,
}

impl Endpoint {
    fn new(description: &'static str, method: Method, path: &'static str) -> Self {
        Self {
            description,
            method,
            path,
            result_object: None,
            form: None,
            save_as: None,
        }
    }

    fn results_in(mut self, key: &'static str) -> Self {
        self.result_object = Some(key);
        self
    }

    fn with_form(mut self, form: Form) -> Self {
        self.form = Some(form);
        self
    }

    fn saved_as(mut self, field: &'static str) -> Self {
        self.save_as = Some(field);
        self
    }
}

/// Every form-driven API command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCommand {
    ListSessions,
    GetSession,
    SessionContext,
    SessionEvents,
    SessionLiveDetails,
    CreateSession,
    ReleaseSession,
    ReleaseAllSessions,
    ListFiles,
    GetFile,
    DownloadFile,
    DeleteFile,
    /// Optionally with the session id given on the command line
    DeleteAllFiles { session_id: Option<String> },
    Scrape,
    Screenshot,
    Pdf,
}

const SCRAPE_FORMATS: &[SelectOption] = &[
    SelectOption {
        label: "HTML",
        value: "html",
    },
    SelectOption {
        label: "Readability",
        value: "readability",
    },
    SelectOption {
        label: "Cleaned HTML",
        value: "cleaned_html",
    },
    SelectOption {
        label: "Markdown",
        value: "markdown",
    },
];

impl ApiCommand {
    pub fn endpoint(&self) -> Endpoint {
        use Method as M;
        match self {
            ApiCommand::ListSessions => {
                Endpoint::new("Get All Sessions", M::GET, "sessions").results_in("sessions")
            }
            ApiCommand::GetSession => {
                Endpoint::new("Get Session By Id", M::GET, "sessions/{id}")
                    .with_form(session_id_form("Get Session By Id"))
            }
            ApiCommand::SessionContext => {
                Endpoint::new("Get Session Context By Id", M::GET, "sessions/{id}/context")
                    .with_form(session_id_form("Get Session Context By Id"))
            }
            ApiCommand::SessionEvents => {
                Endpoint::new("Get Session Events By Id", M::GET, "sessions/{id}/events")
                    .with_form(session_id_form("Get Session Events By Id"))
            }
            ApiCommand::SessionLiveDetails => Endpoint::new(
                "Get Session Live Details By Id",
                M::GET,
                "sessions/{id}/live-details",
            )
            .with_form(session_id_form("Get Session Live Details By Id")),
            ApiCommand::CreateSession => {
                Endpoint::new("Create Session", M::POST, "sessions")
                    .with_form(create_session_form())
            }
            ApiCommand::ReleaseSession => {
                Endpoint::new("Release Session By Id", M::POST, "sessions/{id}/release")
                    .with_form(session_id_form("Release Session By Id"))
            }
            ApiCommand::ReleaseAllSessions => {
                Endpoint::new("Release All Sessions", M::POST, "sessions/release").with_form(
                    Form {
                        title: "Release All Sessions",
                        sections: Vec::new(),
                    },
                )
            }
            ApiCommand::ListFiles => {
                Endpoint::new("Get Files By Session", M::GET, "sessions/{sessionId}/files")
                    .results_in("data")
                    .with_form(file_form("Get Files By Session", false, None))
            }
            ApiCommand::GetFile => Endpoint::new(
                "Get File By ID",
                M::GET,
                "sessions/{sessionId}/files/{fileId}",
            )
            .with_form(file_form("Get File by ID", true, None)),
            ApiCommand::DownloadFile => Endpoint::new(
                "Download File",
                M::GET,
                "sessions/{sessionId}/files/{fileId}/download",
            )
            .with_form(file_form("Download File", true, None))
            .saved_as("fileId"),
            ApiCommand::DeleteFile => Endpoint::new(
                "Delete File by ID",
                M::DELETE,
                "sessions/{sessionId}/files/{fileId}",
            )
            .with_form(file_form("Delete File by ID", true, None)),
            ApiCommand::DeleteAllFiles { session_id } => Endpoint::new(
                "Delete Files By Session",
                M::DELETE,
                "sessions/{sessionId}/files",
            )
            .results_in("data")
            .with_form(file_form(
                "Delete Files By Session",
                false,
                session_id.as_deref(),
            )),
            ApiCommand::Scrape => {
                let mut fields = capture_fields();
                fields.push(
                    Field::new("screenshot", FieldKind::Boolean, "Screenshot", false)
                        .initial("false"),
                );
                fields.push(Field::select("format", "Format", SCRAPE_FORMATS, "html"));
                Endpoint::new("Scrape", M::POST, "scrape").with_form(body_form("Scrape", fields))
            }
            ApiCommand::Screenshot => {
                let mut fields = capture_fields();
                fields.push(full_page_field());
                Endpoint::new("Screenshot", M::POST, "screenshot")
                    .with_form(body_form("Screenshot", fields))
            }
            ApiCommand::Pdf => {
                let mut fields = capture_fields();
                fields.push(full_page_field());
                Endpoint::new("PDF", M::POST, "pdf").with_form(body_form("PDF", fields))
            }
        }
    }
}

fn session_id_form(title: &'static str) -> Form {
    Form {
        title,
        sections: vec![Section {
            title: "Session Details",
            fields: vec![Field::new("id", FieldKind::String, "Session ID", true)],
        }],
    }
}

fn file_form(title: &'static str, with_file_id: bool, session_id: Option<&str>) -> Form {
    let mut session = Field::new("sessionId", FieldKind::String, "Session ID", true);
    if let Some(id) = session_id {
        session = session.initial(id);
    }
    let mut fields = vec![session];
    if with_file_id {
        fields.push(Field::new("fileId", FieldKind::String, "File ID", true));
    }
    Form {
        title,
        sections: vec![Section {
            title: "Session Details",
            fields,
        }],
    }
}

/// Fields shared by the scrape, screenshot and PDF tools
fn capture_fields() -> Vec<Field> {
    vec![
        Field::new("url", FieldKind::String, "URL", true),
        Field::new("useProxy", FieldKind::Boolean, "Use Proxy", false).initial("false"),
        Field::new("delay", FieldKind::Integer, "Delay", false).initial("1"),
    ]
}

fn full_page_field() -> Field {
    Field::new("fullPage", FieldKind::Boolean, "Full Page", false).initial("false")
}

fn body_form(title: &'static str, fields: Vec<Field>) -> Form {
    Form {
        title,
        sections: vec![Section {
            title: "Body",
            fields,
        }],
    }
}

fn create_session_form() -> Form {
    Form {
        title: "Create Session",
        sections: vec![
            Section {
                title: "Session Details",
                fields: vec![
                    Field::new("sessionId", FieldKind::String, "Session ID", false),
                    Field::new("userAgent", FieldKind::String, "User Agent", false),
                    Field::new("useProxy", FieldKind::Boolean, "Use Proxy", false),
                    Field::new("proxyUrl", FieldKind::String, "Proxy URL", false),
                    Field::new("blockAds", FieldKind::Boolean, "Block Ads", false),
                    Field::new("solveCaptcha", FieldKind::Boolean, "Solve Captcha", false),
                    Field::new("timeout", FieldKind::Integer, "Timeout", false),
                    Field::new("concurrency", FieldKind::Integer, "Concurrency", false),
                    Field::new("isSelenium", FieldKind::Boolean, "Is Selenium", false),
                ],
            },
            Section {
                title: "Dimensions",
                fields: vec![
                    Field::new("width", FieldKind::Integer, "Width", true),
                    Field::new("height", FieldKind::Integer, "Height", true),
                ],
            },
        ],
    }
}

/// Convert a raw answer into a JSON value. Blank answers fall back to the
/// field's initial value, then to `None`.
pub fn parse_field(field: &Field, raw: &str) -> Result<Option<Value>, String> {
    let raw = match (raw.trim(), field.initial_value.as_deref()) {
        ("", Some(initial)) => initial,
        (trimmed, _) => trimmed,
    };
    if raw.is_empty() {
        return if field.required {
            Err(format!("{} is required", field.label))
        } else {
            Ok(None)
        };
    }
    match field.kind {
        FieldKind::String => Ok(Some(Value::String(raw.to_string()))),
        FieldKind::Integer => raw
            .parse::<i64>()
            .map(|n| Some(Value::from(n)))
            .map_err(|_| format!("{} must be a whole number", field.label)),
        FieldKind::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" => Ok(Some(Value::Bool(true))),
            "false" | "no" | "n" => Ok(Some(Value::Bool(false))),
            _ => Err(format!("{} must be yes or no", field.label)),
        },
        FieldKind::Select => field
            .options
            .iter()
            .find(|o| o.value == raw || o.label.eq_ignore_ascii_case(raw))
            .map(|o| Some(Value::String(o.value.to_string())))
            .ok_or_else(|| format!("{} must be one of the listed options", field.label)),
    }
}

/// Ask for every field of a form, re-asking until each answer parses
pub fn fill_form<P: Prompter>(form: &Form, prompter: &mut P) -> Result<Map<String, Value>> {
    let mut values = Map::new();
    for field in form.fields() {
        let value = match field.kind {
            FieldKind::Boolean => {
                let initial = field.initial_value.as_deref() == Some("true");
                Some(Value::Bool(prompter.confirm(field.label, initial)?))
            }
            FieldKind::Select => {
                let choices: Vec<Choice> = field
                    .options
                    .iter()
                    .map(|o| {
                        let hint = if field.initial_value.as_deref() == Some(o.value) {
                            "default"
                        } else {
                            ""
                        };
                        Choice::new(o.label, hint)
                    })
                    .collect();
                let index = prompter.select(field.label, &choices)?;
                field
                    .options
                    .get(index)
                    .map(|o| Value::String(o.value.to_string()))
            }
            _ => loop {
                let raw = prompter.input(field.label, field.initial_value.as_deref())?;
                match parse_field(field, &raw) {
                    Ok(value) => break value,
                    Err(message) => prompter.warning(&message),
                }
            },
        };
        if let Some(value) = value {
            values.insert(field.name.to_string(), value);
        }
    }
    Ok(values)
}

/// Percent-encode a value so it stays a single path segment
fn encode_segment(key: &str, value: &str) -> Result<String, ApiError> {
    if value.is_empty() || value == "." || value == ".." {
        return Err(ApiError::InvalidPathParam {
            name: key.to_string(),
            value: value.to_string(),
        });
    }
    // form encoding writes spaces as `+`, which a path would read literally
    Ok(form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20"))
}

/// Substitute `{param}` placeholders, consuming the matching values
pub fn fill_path(path: &str, values: &mut Map<String, Value>) -> Result<String, ApiError> {
    let mut filled = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let key = &rest[start + 1..start + len];
        let value = values
            .remove(key)
            .ok_or_else(|| ApiError::MissingPathParam(key.to_string()))?;
        filled.push_str(&rest[..start]);
        let raw = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        filled.push_str(&encode_segment(key, &raw)?);
        rest = &rest[start + len + 1..];
    }
    filled.push_str(rest);
    Ok(filled)
}

/// Call an endpoint with form values and return the display entries
pub async fn call(
    client: &ApiClient,
    endpoint: &Endpoint,
    mut values: Map<String, Value>,
) -> Result<Vec<Value>, ApiError> {
    let path = fill_path(endpoint.path, &mut values)?;
    let body = (!values.is_empty()).then(|| Value::Object(values));
    let response = client
        .request(endpoint.method.clone(), &path, body.as_ref())
        .await?;
    Ok(unwrap_result(response, endpoint.result_object))
}

/// A file returned by a download endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// File name taken from the form value named by [`Endpoint::save_as`]
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Call an endpoint whose response is a file
pub async fn download(
    client: &ApiClient,
    endpoint: &Endpoint,
    mut values: Map<String, Value>,
) -> Result<Download, ApiError> {
    let file_name = endpoint
        .save_as
        .and_then(|field| values.get(field))
        .and_then(Value::as_str)
        .map(file_name_of)
        .unwrap_or_else(|| "download".to_string());
    let path = fill_path(endpoint.path, &mut values)?;
    let body = (!values.is_empty()).then(|| Value::Object(values));
    let bytes = client
        .request_bytes(endpoint.method.clone(), &path, body.as_ref())
        .await?;
    Ok(Download { file_name, bytes })
}

/// Last path component of a name, so a download lands in the working directory
fn file_name_of(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    match name {
        "" | "." | ".." => "download".to_string(),
        name => name.to_string(),
    }
}

/// Entries where any field's text contains `search` (case-insensitive)
pub fn filter_entries<'a>(entries: &'a [Value], search: &str) -> Vec<&'a Value> {
    if search.is_empty() {
        return entries.iter().collect();
    }
    let needle = search.to_lowercase();
    entries
        .iter()
        .filter(|entry| match entry {
            Value::Object(obj) => obj
                .values()
                .any(|v| display_value(v).to_lowercase().contains(&needle)),
            other => display_value(other).to_lowercase().contains(&needle),
        })
        .collect()
}

/// `key: value` rows for one entry
pub fn entry_rows(entry: &Value) -> Vec<(String, String)> {
    match entry {
        Value::Object(obj) => obj
            .iter()
            .map(|(k, v)| (k.clone(), display_value(v)))
            .collect(),
        other => vec![(String::new(), display_value(other))],
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::testing::{Answer, ScriptedPrompter};
    use serde_json::json;

    fn values(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_fill_path_consumes_params() {
        let mut v = values(json!({"id": "abc", "keep": true}));
        assert_eq!(
            fill_path("sessions/{id}/release", &mut v).unwrap(),
            "sessions/abc/release"
        );
        assert_eq!(v, values(json!({"keep": true})));
    }

    #[test]
    fn test_fill_path_two_placeholders() {
        let mut v = values(json!({"sessionId": "s1", "fileId": "f2"}));
        assert_eq!(
            fill_path("sessions/{sessionId}/files/{fileId}/download", &mut v).unwrap(),
            "sessions/s1/files/f2/download"
        );
        assert!(v.is_empty());
    }

    #[test]
    fn test_fill_path_missing_param() {
        let mut v = Map::new();
        assert!(matches!(
            fill_path("sessions/{id}", &mut v),
            Err(ApiError::MissingPathParam(ref k)) if k == "id"
        ));
        assert_eq!(fill_path("sessions", &mut v).unwrap(), "sessions");
    }

    #[test]
    fn test_fill_path_keeps_values_in_one_segment() {
        let mut v = values(json!({"id": "../x"}));
        assert_eq!(fill_path("sessions/{id}", &mut v).unwrap(), "sessions/..%2Fx");

        let mut v = values(json!({"id": "a?b c#d"}));
        assert_eq!(
            fill_path("sessions/{id}", &mut v).unwrap(),
            "sessions/a%3Fb%20c%23d"
        );

        let mut v = values(json!({"id": "a+b"}));
        assert_eq!(fill_path("sessions/{id}", &mut v).unwrap(), "sessions/a%2Bb");

        for dots in [".", ".."] {
            let mut v = values(json!({ "id": dots }));
            assert!(matches!(
                fill_path("sessions/{id}/release", &mut v),
                Err(ApiError::InvalidPathParam { ref name, .. }) if name == "id"
            ));
        }
    }

    #[test]
    fn test_encoded_path_stays_under_endpoint() {
        let client = ApiClient::new("https://api.steel.dev/v1", "k").unwrap();
        let mut v = values(json!({"id": "../../admin"}));
        let path = fill_path("sessions/{id}/release", &mut v).unwrap();
        assert_eq!(
            client.endpoint_url(&path).unwrap().path(),
            "/v1/sessions/..%2F..%2Fadmin/release"
        );
    }

    #[test]
    fn test_parse_field() {
        let width = Field::new("width", FieldKind::Integer, "Width", true);
        assert_eq!(parse_field(&width, " 1280 ").unwrap(), Some(json!(1280)));
        assert!(parse_field(&width, "wide").is_err());
        assert!(parse_field(&width, "").is_err());

        let ua = Field::new("userAgent", FieldKind::String, "User Agent", false);
        assert_eq!(parse_field(&ua, "").unwrap(), None);

        let ads = Field::new("blockAds", FieldKind::Boolean, "Block Ads", false);
        assert_eq!(parse_field(&ads, "Yes").unwrap(), Some(json!(true)));

        let delay = Field::new("delay", FieldKind::Integer, "Delay", false).initial("1");
        assert_eq!(parse_field(&delay, "  ").unwrap(), Some(json!(1)));

        let format = Field::select("format", "Format", SCRAPE_FORMATS, "html");
        assert_eq!(parse_field(&format, "Markdown").unwrap(), Some(json!("markdown")));
        assert_eq!(parse_field(&format, "").unwrap(), Some(json!("html")));
        assert!(parse_field(&format, "pdf").is_err());
    }

    #[test]
    fn test_fill_form_retries_bad_answers() {
        let form = session_id_form("Get");
        let mut prompter = ScriptedPrompter::new([
            Answer::Text(String::new()),
            Answer::Text("sess-1".into()),
        ]);
        let filled = fill_form(&form, &mut prompter).unwrap();
        assert_eq!(filled, values(json!({"id": "sess-1"})));
        assert_eq!(prompter.prompts.len(), 2);
    }

    #[test]
    fn test_create_session_form_answers() {
        let form = create_session_form();
        let mut prompter = ScriptedPrompter::new([
            Answer::Text(String::new()),
            Answer::Text("bot/1.0".into()),
            Answer::Yes(false),
            Answer::Text(String::new()),
            Answer::Yes(true),
            Answer::Yes(true),
            Answer::Text("60000".into()),
            Answer::Text(String::new()),
            Answer::Yes(false),
            Answer::Text("1280".into()),
            Answer::Text("720".into()),
        ]);
        let filled = fill_form(&form, &mut prompter).unwrap();
        assert_eq!(
            filled,
            values(json!({
                "userAgent": "bot/1.0",
                "useProxy": false,
                "blockAds": true,
                "solveCaptcha": true,
                "timeout": 60000,
                "isSelenium": false,
                "width": 1280,
                "height": 720,
            }))
        );
    }

    #[test]
    fn test_scrape_form_uses_select_and_defaults() {
        let endpoint = ApiCommand::Scrape.endpoint();
        assert_eq!(endpoint.method, Method::POST);
        let form = endpoint.form.unwrap();
        let mut prompter = ScriptedPrompter::new([
            Answer::Text("https://steel.dev".into()),
            Answer::Yes(false),
            Answer::Text(String::new()),
            Answer::Yes(true),
            Answer::Pick(3),
        ]);
        let filled = fill_form(&form, &mut prompter).unwrap();
        assert_eq!(
            filled,
            values(json!({
                "url": "https://steel.dev",
                "useProxy": false,
                "delay": 1,
                "screenshot": true,
                "format": "markdown",
            }))
        );
        assert_eq!(prompter.prompts.last().map(String::as_str), Some("Format"));
    }

    #[test]
    fn test_file_endpoints() {
        let delete = ApiCommand::DeleteFile.endpoint();
        assert_eq!(delete.method, Method::DELETE);
        assert_eq!(delete.path, "sessions/{sessionId}/files/{fileId}");

        let download = ApiCommand::DownloadFile.endpoint();
        assert_eq!(download.save_as, Some("fileId"));
        assert_eq!(ApiCommand::ListFiles.endpoint().result_object, Some("data"));

        let delete_all = ApiCommand::DeleteAllFiles {
            session_id: Some("sess-9".into()),
        }
        .endpoint();
        let form = delete_all.form.unwrap();
        let mut prompter = ScriptedPrompter::new([Answer::Text(String::new())]);
        assert_eq!(
            fill_form(&form, &mut prompter).unwrap(),
            values(json!({"sessionId": "sess-9"}))
        );
    }

    #[test]
    fn test_session_detail_endpoints() {
        assert_eq!(
            ApiCommand::SessionContext.endpoint().path,
            "sessions/{id}/context"
        );
        assert_eq!(ApiCommand::SessionEvents.endpoint().path, "sessions/{id}/events");
        assert_eq!(
            ApiCommand::SessionLiveDetails.endpoint().path,
            "sessions/{id}/live-details"
        );
    }

    #[test]
    fn test_release_all_has_empty_form() {
        let endpoint = ApiCommand::ReleaseAllSessions.endpoint();
        assert_eq!(endpoint.form.map(|f| f.fields().count()), Some(0));
        assert_eq!(
            ApiCommand::ListSessions.endpoint().result_object,
            Some("sessions")
        );
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(file_name_of("report.pdf"), "report.pdf");
        assert_eq!(file_name_of("../../etc/passwd"), "passwd");
        assert_eq!(file_name_of(".."), "download");
    }

    #[test]
    fn test_filter_entries() {
        let entries = vec![
            json!({"id": "a1", "status": "live"}),
            json!({"id": "b2", "status": "released"}),
        ];
        assert_eq!(filter_entries(&entries, "LIVE"), vec![&entries[0]]);
        assert_eq!(filter_entries(&entries, "").len(), 2);
        assert_eq!(
            entry_rows(&entries[1]),
            vec![
                ("id".to_string(), "b2".to_string()),
                ("status".to_string(), "released".to_string())
            ]
        );
    }
}

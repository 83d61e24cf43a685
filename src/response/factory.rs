// Start of file: /src/response/factory.rs

/*
    * Builds problem details responses.
    *
    * Negotiate the representation from `Accept` (XML when nothing matches),
    * assemble the payload under the debug/production policy, encode it and
    * write it into a fresh response from the configured prototype. Nothing
    * here logs, mutates shared state or panics: encoding failures degrade to
    * a smaller document instead.
*/

use axum::{
    body::Body,
    http::{
        header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::Response,
};

use crate::config::problem_details::ProblemDetailsConfig;
use crate::models::{
    data::DataMap,
    exception::HandlerError,
    problem::{ExceptionTrace, ProblemDetails, ProblemDocument},
    request::RequestInfo,
};
use crate::response::prototype::ResponsePrototype;
use crate::utils::{
    json::{self, JsonFlags},
    negotiation::{negotiate, Format},
    xml,
};

// ! Base of the type URI used when no type is given or configured
pub const DEFAULT_TYPE_BASE: &str = "https://httpstatus.es/";

#[derive(Debug, Clone)]
pub struct ProblemDetailsResponseFactory {
    config: ProblemDetailsConfig,
    prototype: ResponsePrototype,
    json_flags: JsonFlags,
}

impl Default for ProblemDetailsResponseFactory {
    fn default() -> Self {
        Self::new(ProblemDetailsConfig::default())
    }
}

impl ProblemDetailsResponseFactory {
    pub fn new(config: ProblemDetailsConfig) -> Self {
        let json_flags: JsonFlags = config.effective_json_flags();
        Self { config, prototype: ResponsePrototype::Default, json_flags }
    }

    pub fn with_prototype(mut self, prototype: ResponsePrototype) -> Self {
        self.prototype = prototype;
        self
    }

    pub fn config(&self) -> &ProblemDetailsConfig {
        &self.config
    }

    pub fn is_debug(&self) -> bool {
        self.config.debug
    }

    pub fn json_flags(&self) -> JsonFlags {
        self.json_flags
    }

    /// Renders a problem from explicit members.
    pub fn create_response<R>(
        &self,
        request: &R,
        status: StatusCode,
        detail: impl Into<String>,
        title: Option<&str>,
        type_uri: Option<&str>,
        additional: Option<DataMap>,
    ) -> Response
    where
        R: RequestInfo + ?Sized,
    {
        let details: ProblemDetails =
            self.build_payload(status, detail.into(), title, type_uri, additional.unwrap_or_default());
        self.render(request, details)
    }

    /// Renders a problem describing a raised error.
    pub fn create_response_from_error<R>(&self, request: &R, error: &HandlerError) -> Response
    where
        R: RequestInfo + ?Sized,
    {
        self.render(request, self.build_payload_from_error(error))
    }

    /// Payload from explicit members; empty title and type get defaults.
    pub fn build_payload(
        &self,
        status: StatusCode,
        detail: String,
        title: Option<&str>,
        type_uri: Option<&str>,
        additional: DataMap,
    ) -> ProblemDetails {
        ProblemDetails {
            status,
            type_uri: self.type_or_default(status, type_uri),
            title: title_or_default(status, title),
            detail,
            additional,
            exception: None,
        }
    }

    /// Payload from a raised error.
    ///
    /// Problem details errors supply every member themselves. Any other error
    /// is a 500 whose detail is the configured generic message unless debug
    /// mode or `expose_detail` is on; debug mode also attaches its trace.
    pub fn build_payload_from_error(&self, error: &HandlerError) -> ProblemDetails {
        if let Some(problem) = error.as_problem() {
            return self.build_payload(
                problem.status(),
                problem.detail().to_owned(),
                Some(problem.title()),
                Some(problem.type_uri()),
                problem.additional_data(),
            );
        }

        let detail: String = if self.config.debug || self.config.expose_detail {
            error.to_string()
        } else {
            self.config.default_detail_message.clone()
        };

        let mut details: ProblemDetails =
            self.build_payload(StatusCode::INTERNAL_SERVER_ERROR, detail, None, None, DataMap::new());
        if self.config.debug {
            details.exception = ExceptionTrace::of_handler_error(error);
        }
        details
    }

    /// Encodes `details` in `format` and writes it into a fresh response.
    pub fn render_as(&self, details: ProblemDetails, format: Format) -> Response {
        let status: StatusCode = details.status;
        let document: ProblemDocument = details.into_document();
        let body: Vec<u8> = match format {
            Format::Json => json::render(&document, self.json_flags),
            Format::Xml => xml::render(&document),
        };

        let mut response: Response = self.prototype.create(status);
        let headers: &mut HeaderMap = response.headers_mut();
        headers.remove(CONTENT_LENGTH);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(format.content_type()));
        *response.body_mut() = Body::from(body);
        response
    }

    fn render<R>(&self, request: &R, details: ProblemDetails) -> Response
    where
        R: RequestInfo + ?Sized,
    {
        let format: Format = negotiate(&request.header_line(ACCEPT.as_str())).unwrap_or(Format::Xml);
        self.render_as(details, format)
    }

    fn type_or_default(&self, status: StatusCode, type_uri: Option<&str>) -> String {
        match type_uri.filter(|uri| !uri.is_empty()) {
            Some(uri) => uri.to_owned(),
            None => self
                .config
                .default_types_map
                .get(&status)
                .cloned()
                .unwrap_or_else(|| format!("{DEFAULT_TYPE_BASE}{}", status.as_u16())),
        }
    }
}

fn title_or_default(status: StatusCode, title: Option<&str>) -> String {
    match title.filter(|title| !title.is_empty()) {
        Some(title) => title.to_owned(),
        None => status.canonical_reason().unwrap_or("Unknown Error").to_owned(),
    }
}

// End of file: /src/response/factory.rs

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::problem_details::DEFAULT_DETAIL_MESSAGE;
    use crate::models::data::Data;
    use crate::models::exception::{Exception, ProblemDetailsException};
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};

    fn request(accept: &str) -> Request<Body> {
        Request::builder()
            .uri("https://example.com/api/ping")
            .header(ACCEPT, accept)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes: axum::body::Bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response.headers()[CONTENT_TYPE].to_str().unwrap()
    }

    #[tokio::test]
    async fn negotiates_content_type_from_accept() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::default();
        let cases: [(&str, &str); 5] = [
            ("application/json", "application/problem+json"),
            ("application/vnd.api+json", "application/problem+json"),
            ("", "application/problem+json"),
            ("application/xml", "application/problem+xml"),
            ("application/vnd.api+xml", "application/problem+xml"),
        ];

        for (accept, expected) in cases {
            let response: Response =
                factory.create_response(&request(accept), StatusCode::INTERNAL_SERVER_ERROR, "Unknown error occurred", None, None, None);
            assert_eq!(content_type(&response), expected, "accept = {accept:?}");
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[tokio::test]
    async fn falls_back_to_xml_when_nothing_negotiates() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::default();

        let response: Response =
            factory.create_response(&request("text/plain"), StatusCode::INTERNAL_SERVER_ERROR, "Unknown error occurred", None, None, None);

        assert_eq!(content_type(&response), "application/problem+xml");
        assert!(body_string(response).await.starts_with("<?xml"));
    }

    #[tokio::test]
    async fn explicit_members_and_extensions_are_rendered() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::default();

        let response: Response = factory.create_response(
            &request("application/json"),
            StatusCode::NOT_FOUND,
            "Resource missing",
            None,
            None,
            Some(DataMap::new().with("foo", "bar").with("status", 200)),
        );

        assert_eq!(
            body_json(response).await,
            json!({
                "type": "https://httpstatus.es/404",
                "title": "Not Found",
                "status": 404,
                "detail": "Resource missing",
                "foo": "bar",
            })
        );
    }

    #[tokio::test]
    async fn problem_errors_supply_every_member() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::default();
        let error: HandlerError = ProblemDetailsException::new(StatusCode::BAD_REQUEST, "Exception details")
            .with_title("Invalid client request")
            .with_type("https://example.com/api/doc/invalid-client-request")
            .with_extension("foo", "bar")
            .into();

        let response: Response = factory.create_response_from_error(&request("application/json"), &error);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({
                "type": "https://example.com/api/doc/invalid-client-request",
                "title": "Invalid client request",
                "status": 400,
                "detail": "Exception details",
                "foo": "bar",
            })
        );
    }

    #[tokio::test]
    async fn fragile_messages_are_hidden_in_production() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::default();
        let error: HandlerError = Exception::new("Your SQL or password here").into();

        let response: Response = factory.create_response_from_error(&request("application/json"), &error);
        let body: String = body_string(response).await;

        assert!(!body.contains("Your SQL or password here"));
        let payload: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(payload["detail"], DEFAULT_DETAIL_MESSAGE);
        assert!(payload.get("exception").is_none());
    }

    #[tokio::test]
    async fn expose_detail_shows_messages_without_trace() {
        let factory: ProblemDetailsResponseFactory =
            ProblemDetailsResponseFactory::new(ProblemDetailsConfig::new().expose_detail(true));
        let error: HandlerError = Exception::new("Your SQL or password here").into();

        let payload: Value = body_json(factory.create_response_from_error(&request("application/json"), &error)).await;

        assert_eq!(payload["detail"], "Your SQL or password here");
        assert!(payload.get("exception").is_none());
    }

    #[tokio::test]
    async fn custom_detail_message_is_used() {
        let factory: ProblemDetailsResponseFactory =
            ProblemDetailsResponseFactory::new(ProblemDetailsConfig::new().default_detail_message("Custom detail message"));
        let error: HandlerError = Exception::new("").into();

        let payload: Value = body_json(factory.create_response_from_error(&request("application/json"), &error)).await;

        assert_eq!(payload["detail"], "Custom detail message");
    }

    #[tokio::test]
    async fn error_codes_never_become_statuses() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::default();
        let error: HandlerError = Exception::new("").with_code(400).into();

        let response: Response = factory.create_response_from_error(&request("application/json"), &error);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["status"], 500);
    }

    #[tokio::test]
    async fn debug_mode_attaches_the_cause_chain() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::new(ProblemDetailsConfig::new().debug(true));
        let first: Exception = Exception::new("first").with_code(101010);
        let error: HandlerError = Exception::new("second").with_code(101011).with_previous(first).into();

        let response: Response = factory.create_response_from_error(&request("application/json"), &error);
        let body: String = body_string(response).await;
        let payload: Value = serde_json::from_str(&body).unwrap();

        assert!(body.contains("\n    \"type\""), "debug output is pretty printed");
        assert_eq!(payload["detail"], "second");
        assert_eq!(payload["exception"]["code"], 101011);
        assert_eq!(payload["exception"]["message"], "second");
        assert_eq!(payload["exception"]["stack"][0]["code"], 101010);
        assert_eq!(payload["exception"]["stack"][0]["message"], "first");
    }

    #[tokio::test]
    async fn default_types_map_is_consulted() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::new(
            ProblemDetailsConfig::new()
                .default_type(StatusCode::NOT_FOUND, "https://example.com/problem-details/error/not-found")
                .default_type(StatusCode::INTERNAL_SERVER_ERROR, "https://example.com/problem-details/error/internal-server-error"),
        );
        let json_request: Request<Body> = request("application/json");

        let not_found: Value = body_json(factory.create_response(&json_request, StatusCode::NOT_FOUND, "", None, None, None)).await;
        let bad_request: Value = body_json(factory.create_response(&json_request, StatusCode::BAD_REQUEST, "", None, None, None)).await;
        let from_error: Value =
            body_json(factory.create_response_from_error(&json_request, &Exception::new("x").into())).await;

        assert_eq!(not_found["type"], "https://example.com/problem-details/error/not-found");
        assert_eq!(bad_request["type"], "https://httpstatus.es/400");
        assert_eq!(from_error["type"], "https://example.com/problem-details/error/internal-server-error");

        let empty: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::default();
        let fallback: Value = body_json(empty.create_response_from_error(&json_request, &Exception::new("x").into())).await;
        assert_eq!(fallback["type"], "https://httpstatus.es/500");
    }

    #[tokio::test]
    async fn xml_output_sanitizes_keys() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::default();
        let additional: DataMap = DataMap::new().with(
            "foo",
            DataMap::new()
                .with("A#-", "foo")
                .with("-A-", "foo")
                .with("#B-", "foo")
                .with("C\n-", "foo")
                .with("\nC-", "foo"),
        );

        let response: Response =
            factory.create_response(&request("application/xml"), StatusCode::INTERNAL_SERVER_ERROR, "Unknown error occurred", None, None, Some(additional));
        let body: String = body_string(response).await;

        for name in ["A_-", "_A-", "_B-", "C_-", "_C-"] {
            assert!(body.contains(&format!("<{name}>foo</{name}>")), "missing <{name}> in {body}");
        }
    }

    #[tokio::test]
    async fn malformed_utf8_is_sanitized_not_dropped() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::default();
        let error: HandlerError = ProblemDetailsException::new(StatusCode::BAD_REQUEST, "Exception details")
            .with_title("Invalid client request")
            .with_type("https://example.com/api/doc/invalid-client-request")
            .with_additional(DataMap::new().with("malformed-utf8", Data::bytes(b"\xc3\x28".to_vec())))
            .into();

        let payload: Value = body_json(factory.create_response_from_error(&request("application/json"), &error)).await;

        assert_eq!(payload["malformed-utf8"], "\u{FFFD}(");
    }

    #[tokio::test]
    async fn lossy_payload_without_partial_output_degrades_to_canonical_members() {
        let factory: ProblemDetailsResponseFactory =
            ProblemDetailsResponseFactory::new(ProblemDetailsConfig::new().json_flags(JsonFlags::UNESCAPED_SLASHES));

        let response: Response = factory.create_response(
            &request("application/json"),
            StatusCode::BAD_REQUEST,
            "bad",
            None,
            None,
            Some(DataMap::new().with("ratio", f64::NAN).with("ok", true)),
        );

        assert_eq!(
            body_string(response).await,
            r#"{"type":"https://httpstatus.es/400","title":"Bad Request","status":400,"detail":"bad"}"#
        );
    }

    #[tokio::test]
    async fn unserializable_values_are_stripped() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::default();
        let handle: std::io::Stdout = std::io::stdout();

        let response: Response = factory.create_response(
            &request("application/json"),
            StatusCode::BAD_REQUEST,
            "bad",
            None,
            None,
            Some(DataMap::new().with("args", vec![Data::opaque(&handle), Data::from("kept")])),
        );

        assert_eq!(body_json(response).await["args"], json!(["kept"]));
    }

    #[tokio::test]
    async fn encoding_is_deterministic() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::new(ProblemDetailsConfig::new().debug(true));
        let additional: DataMap = DataMap::new().with("foo", "bar").with("nested", DataMap::new().with("n", 1.5));

        let first: String = body_string(factory.create_response(&request("application/json"), StatusCode::CONFLICT, "x", None, None, Some(additional.clone()))).await;
        let second: String = body_string(factory.create_response(&request("application/json"), StatusCode::CONFLICT, "x", None, None, Some(additional))).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn prototype_supplies_the_response() {
        let factory: ProblemDetailsResponseFactory = ProblemDetailsResponseFactory::default().with_prototype(ResponsePrototype::callable(|| {
            let mut response: Response = Response::new(Body::from("stale body"));
            response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from_static("10"));
            response.headers_mut().insert("x-prototype", HeaderValue::from_static("yes"));
            response
        }));

        let response: Response = factory.create_response(&request("application/json"), StatusCode::GONE, "gone", None, None, None);

        assert_eq!(response.headers()["x-prototype"], "yes");
        assert!(response.headers().get(CONTENT_LENGTH).is_none());
        assert!(body_string(response).await.contains("\"status\":410"));
    }
}

//! Transport engine: signed REST calls against a Moodle site

use crate::credentials::{Credentials, RestFormat};
use crate::encoding::encode_params;
use crate::envelope::{Envelope, FailureCause};
use crate::error::MoodleError;
use crate::parser;
use serde_json::{Map, Value};
use std::time::Duration;

/// Path of the REST server below the site URL
pub const REST_SERVER_PATH: [&str; 3] = ["webservice", "rest", "server.php"];

/// Request timeout used unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds and submits REST calls for one set of credentials
///
/// The engine is stateless between calls and can be shared across threads.
///
/// # Example
///
/// ```no_run
/// use moodle_ws_client::{Credentials, Engine};
/// use serde_json::Map;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = Credentials::new("https://moodle.example.com", "token")?;
/// let engine = Engine::new(credentials)?;
///
/// let envelope = engine.call("core_webservice_get_site_info", &Map::new());
/// if let Some(info) = envelope.payload() {
///     println!("Site: {}", info["sitename"]);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Engine {
    client: reqwest::blocking::Client,
    credentials: Credentials,
    server_url: reqwest::Url,
}

impl Engine {
    /// Create an engine with default transport settings
    ///
    /// # Errors
    ///
    /// Returns `MoodleError::ClientInit` if the HTTP client cannot be initialized.
    pub fn new(credentials: Credentials) -> Result<Self, MoodleError> {
        Self::builder(credentials).build()
    }

    /// Create a builder for configuring the transport
    pub fn builder(credentials: Credentials) -> EngineBuilder {
        EngineBuilder::new(credentials)
    }

    /// The credentials this engine signs calls with
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The full endpoint for a remote function, including token and format
    pub fn endpoint(&self, function_name: &str) -> reqwest::Url {
        let mut url = self.server_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("wstoken", self.credentials.token())
                .append_pair("wsfunction", function_name);
            if self.credentials.format() == RestFormat::Json {
                query.append_pair("moodlewsrestformat", "json");
            }
        }
        url
    }

    /// POST a remote call and return the raw response body
    ///
    /// The body is returned whatever the HTTP status; Moodle reports its own
    /// errors inside the body.
    ///
    /// # Errors
    ///
    /// Returns the transport error, stripped of the request URL so the token
    /// is never part of the message.
    pub fn send(
        &self,
        function_name: &str,
        params: &Map<String, Value>,
    ) -> Result<String, reqwest::Error> {
        let form = encode_params(params);
        tracing::debug!(
            function = function_name,
            fields = form.len(),
            "Calling Moodle web service"
        );

        let response = self
            .client
            .post(self.endpoint(function_name))
            .form(&form)
            .send()
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(function = function_name, %status, "Moodle returned a non-success status");
        }

        response.text().map_err(reqwest::Error::without_url)
    }

    /// Perform a remote call and normalize its response
    pub fn call(&self, function_name: &str, params: &Map<String, Value>) -> Envelope {
        match self.send(function_name, params) {
            Ok(body) => {
                let envelope = parser::normalize(&body, self.credentials.format());
                tracing::debug!(
                    function = function_name,
                    outcome = envelope.short().unwrap_or("success"),
                    "Moodle call finished"
                );
                envelope
            }
            Err(e) => {
                tracing::warn!(function = function_name, error = %e, "Moodle call failed in transport");
                Envelope::TransportFailure {
                    cause: FailureCause::Connection,
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Builder for configuring the engine's HTTP transport
///
/// Redirects are never followed. Certificate verification is on unless
/// explicitly disabled.
///
/// # Example
///
/// ```no_run
/// use moodle_ws_client::{Credentials, Engine};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = Credentials::new("https://moodle.local", "token")?;
/// let engine = Engine::builder(credentials)
///     .timeout(Duration::from_secs(10))
///     .accept_invalid_certs(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EngineBuilder {
    credentials: Credentials,
    timeout: Duration,
    accept_invalid_certs: bool,
    http1_only: bool,
    client_builder: Option<reqwest::blocking::ClientBuilder>,
}

impl EngineBuilder {
    /// Create a new builder with default settings
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
            http1_only: false,
            client_builder: None,
        }
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Skip TLS certificate verification
    ///
    /// Only for sites with self-signed certificates on trusted networks.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Restrict the transport to HTTP/1.x
    pub fn http1_only(mut self, http1_only: bool) -> Self {
        self.http1_only = http1_only;
        self
    }

    /// Start from a custom HTTP client builder (proxies, headers, ...)
    ///
    /// Timeout, certificate and redirect settings of this builder are always
    /// applied on top.
    pub fn client_builder(mut self, builder: reqwest::blocking::ClientBuilder) -> Self {
        self.client_builder = Some(builder);
        self
    }

    /// Build the engine
    ///
    /// # Errors
    ///
    /// Returns `MoodleError::ClientInit` if the HTTP client cannot be
    /// initialized or the site URL cannot carry the REST path.
    pub fn build(self) -> Result<Engine, MoodleError> {
        let mut server_url = self.credentials.url().clone();
        server_url
            .path_segments_mut()
            .map_err(|_| MoodleError::ClientInit("Cannot modify site URL path".to_string()))?
            .pop_if_empty()
            .extend(REST_SERVER_PATH);

        let builder = self
            .client_builder
            .unwrap_or_else(|| reqwest::blocking::Client::builder().use_rustls_tls());

        let mut builder = builder
            .redirect(reqwest::redirect::Policy::none())
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs);
        if self.http1_only {
            builder = builder.http1_only();
        }

        if self.accept_invalid_certs {
            tracing::warn!(
                site = %self.credentials.url(),
                "TLS certificate verification is disabled"
            );
        }

        let client = builder
            .build()
            .map_err(|e| MoodleError::ClientInit(e.to_string()))?;

        Ok(Engine {
            client,
            credentials: self.credentials,
            server_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{ExceptionKind, NOT_AN_ARRAY};
    use mockito::Matcher;
    use proptest::prelude::*;
    use serde_json::json;

    fn engine_for(server: &mockito::Server, format: RestFormat) -> Engine {
        let credentials = Credentials::new(&server.url(), "test-token")
            .unwrap()
            .with_format(format);
        Engine::new(credentials).unwrap()
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_endpoint_json() {
        let credentials = Credentials::new("https://moodle.example.com", "abc").unwrap();
        let engine = Engine::new(credentials).unwrap();

        assert_eq!(
            engine.endpoint("core_user_get_users").as_str(),
            "https://moodle.example.com/webservice/rest/server.php?wstoken=abc&wsfunction=core_user_get_users&moodlewsrestformat=json"
        );
    }

    #[test]
    fn test_endpoint_xml_omits_format() {
        let credentials = Credentials::new("https://moodle.example.com/", "abc")
            .unwrap()
            .with_format(RestFormat::Xml);
        let engine = Engine::new(credentials).unwrap();

        assert_eq!(
            engine.endpoint("core_user_get_users").as_str(),
            "https://moodle.example.com/webservice/rest/server.php?wstoken=abc&wsfunction=core_user_get_users"
        );
    }

    #[test]
    fn test_endpoint_keeps_site_subdirectory() {
        let credentials = Credentials::new("https://example.com/moodle/", "abc").unwrap();
        let engine = Engine::new(credentials).unwrap();

        assert_eq!(
            engine.endpoint("f").path(),
            "/moodle/webservice/rest/server.php"
        );
    }

    #[test]
    fn test_call_posts_form_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/webservice/rest/server.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("wstoken".into(), "test-token".into()),
                Matcher::UrlEncoded("wsfunction".into(), "core_user_get_users".into()),
                Matcher::UrlEncoded("moodlewsrestformat".into(), "json".into()),
            ]))
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("criteria[0][key]".into(), "username".into()),
                Matcher::UrlEncoded("criteria[0][value]".into(), "mdl_test_1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"users":[{"id":4,"username":"mdl_test_1"}],"warnings":[]}"#)
            .expect(1)
            .create();

        let engine = engine_for(&server, RestFormat::Json);
        let params = as_map(json!({"criteria": [{"key": "username", "value": "mdl_test_1"}]}));
        let envelope = engine.call("core_user_get_users", &params);

        mock.assert();
        assert_eq!(
            envelope,
            Envelope::Success(json!({"users": [{"id": 4, "username": "mdl_test_1"}], "warnings": []}))
        );
    }

    #[test]
    fn test_call_xml_format() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/webservice/rest/server.php")
            .match_query(Matcher::UrlEncoded(
                "wsfunction".into(),
                "core_user_get_users".into(),
            ))
            .with_status(200)
            .with_body(
                r#"<?xml version="1.0" encoding="UTF-8" ?>
<EXCEPTION class="webservice_access_exception">
<ERRORCODE>accessexception</ERRORCODE>
<MESSAGE>Access control exception</MESSAGE>
</EXCEPTION>"#,
            )
            .expect(1)
            .create();

        let engine = engine_for(&server, RestFormat::Xml);
        let envelope = engine.call("core_user_get_users", &Map::new());

        mock.assert();
        match envelope {
            Envelope::RemoteException { kind, .. } => assert_eq!(kind, ExceptionKind::AccessDenied),
            other => panic!("Expected RemoteException, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_is_not_decodable() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/webservice/rest/server.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("")
            .create();

        let engine = engine_for(&server, RestFormat::Json);
        let envelope = engine.call("core_user_update_users", &Map::new());

        mock.assert();
        assert_eq!(
            envelope,
            Envelope::TransportFailure {
                cause: FailureCause::NotDecodable,
                message: NOT_AN_ARRAY.to_string(),
            }
        );
    }

    #[test]
    fn test_redirects_are_not_followed() {
        let mut server = mockito::Server::new();
        let target = server
            .mock("GET", "/login/index.php")
            .with_status(200)
            .with_body(r#"{"users":[]}"#)
            .expect(0)
            .create();
        let redirect = server
            .mock("POST", "/webservice/rest/server.php")
            .match_query(Matcher::Any)
            .with_status(303)
            .with_header("location", "/login/index.php")
            .expect(1)
            .create();

        let engine = engine_for(&server, RestFormat::Json);
        let envelope = engine.call("core_user_get_users", &Map::new());

        target.assert();
        redirect.assert();
        assert_eq!(envelope.short(), Some("not_array"));
    }

    #[test]
    fn test_connection_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let credentials = Credentials::new(&format!("http://{}", addr), "secret-token").unwrap();
        let engine = Engine::builder(credentials)
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let envelope = engine.call("core_user_get_users", &Map::new());

        match &envelope {
            Envelope::TransportFailure { cause, message } => {
                assert_eq!(*cause, FailureCause::Connection);
                assert!(!message.contains("secret-token"));
            }
            other => panic!("Expected TransportFailure, got {:?}", other),
        }
        assert_eq!(envelope.short(), Some("transport_error"));
    }

    #[test]
    fn test_builder_options() {
        let credentials = Credentials::new("https://moodle.example.com", "abc").unwrap();
        let result = Engine::builder(credentials)
            .accept_invalid_certs(true)
            .http1_only(true)
            .client_builder(reqwest::blocking::Client::builder().use_rustls_tls())
            .build();

        assert!(result.is_ok());
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]

        #[test]
        fn prop_endpoint_construction(
            scheme in prop::sample::select(vec!["http", "https"]),
            host in "[a-z]{3,10}",
            port in 1000u16..10000u16,
            token in "[a-f0-9]{32}",
            function in "[a-z_]{5,40}",
        ) {
            let credentials = Credentials::new(&format!("{}://{}:{}", scheme, host, port), &token).unwrap();
            let engine = Engine::new(credentials).unwrap();
            let url = engine.endpoint(&function);

            prop_assert_eq!(url.scheme(), scheme);
            prop_assert_eq!(url.host_str(), Some(host.as_str()));
            prop_assert_eq!(url.port(), Some(port));
            prop_assert_eq!(url.path(), "/webservice/rest/server.php");

            let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
            prop_assert_eq!(
                query,
                vec![
                    ("wstoken".to_string(), token.clone()),
                    ("wsfunction".to_string(), function.clone()),
                    ("moodlewsrestformat".to_string(), "json".to_string()),
                ]
            );
        }
    }
}

use std::net::TcpListener;
use std::time::Duration;

use reqwest::{Client, Method, Response};

use serde_json::{json, Value};

use url::Url;

use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

use memberlist::app;
use memberlist::client::RestMemberStore;
use memberlist::repo::Store;
use memberlist::settings::PublicConfig;

pub const STORE_KEY: &str = "service-test-key";
pub const PUBLISHABLE_KEY: &str = "publishable-test-key";

pub struct TestApp {
    addr: String,

    pub client: Client,
    pub store_server: MockServer,
}

impl TestApp {
    /// Spawn the app against a mock store
    pub async fn spawn() -> Self {
        let store_server = MockServer::start().await;

        let store = {
            let api_base_url =
                Url::parse(&store_server.uri()).expect("Failed to parse mock server uri");
            let api_key = STORE_KEY.parse().expect("Failed to parse store key");
            let api_timeout = Duration::from_secs(2);

            RestMemberStore::new(api_base_url, api_key, api_timeout)
                .expect("Failed to create store client")
        };

        Self::spawn_with(store_server, Store::enabled(store))
    }

    /// Spawn the app with no store credentials configured
    pub async fn spawn_without_store() -> Self {
        let store_server = MockServer::start().await;
        Self::spawn_with(store_server, Store::Disabled)
    }

    fn spawn_with(store_server: MockServer, store: Store) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to listen on random port");
        let port = listener.local_addr().unwrap().port();

        let addr = format!("http://127.0.0.1:{}", port);

        let public_config = PublicConfig {
            store_url: Some(store_server.uri()),
            publishable_key: Some(PUBLISHABLE_KEY.into()),
            contact_email: Some("hello@example.com".into()),
            ..Default::default()
        };

        let server =
            app::run(listener, store, public_config).expect("Failed to spawn app instance");
        let _ = tokio::spawn(server);

        let client = Client::new();

        Self {
            addr,
            client,
            store_server,
        }
    }

    pub fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", &self.addr, url);
        self.client.request(method, url)
    }

    pub async fn health_check(&self) -> reqwest::Result<Response> {
        self.request(Method::GET, "health_check").send().await
    }

    pub async fn public_config(&self) -> reqwest::Result<Response> {
        self.request(Method::GET, "api/config").send().await
    }

    pub async fn unsubscribe(&self, body: &Value) -> reqwest::Result<Response> {
        self.request(Method::POST, "api/unsubscribe")
            .json(body)
            .send()
            .await
    }

    /// Serve `rows` for every member lookup, at most `times` times if given
    pub async fn mount_lookup(&self, rows: Value, times: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path("/rest/v1/members"))
            .and(header("apikey", STORE_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows));

        let mock = match times {
            Some(n) => mock.up_to_n_times(n),
            None => mock,
        };
        mock.mount(&self.store_server).await;
    }

    /// Expect exactly `expected` member updates, answered with `status`
    pub async fn mount_update(&self, status: u16, expected: u64) {
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/members"))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected)
            .mount(&self.store_server)
            .await;
    }

    /// Fail the test if the store is called at all
    pub async fn forbid_store_calls(&self) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.store_server)
            .await;
    }
}

/// A member row as the store returns it
pub fn member_row(email: &str, unsubscribed: bool) -> Value {
    let unsubscribed_at = if unsubscribed {
        json!("2024-05-01T09:30:00+00:00")
    } else {
        Value::Null
    };

    json!([{
        "email": email,
        "unsubscribed": unsubscribed,
        "unsubscribed_at": unsubscribed_at,
    }])
}

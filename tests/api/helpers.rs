//! tests/api/helpers.rs
use early_access::configuration::{ResponseMessages, get_configuration};
use early_access::startup::Application;
use early_access::telemetry::{get_subscriber, init_subscriber};
use std::sync::LazyLock;
use wiremock::MockServer;

static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub email_server: MockServer,
    pub admin_email: String,
    pub support_email: String,
    pub messages: ResponseMessages,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_early_access(&self, body: String) -> reqwest::Response {
        self.api_client
            .post(format!("{}/early_access", self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// The JSON bodies of every email handed to the mock delivery service.
    pub async fn sent_emails(&self) -> Vec<serde_json::Value> {
        self.email_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }
}

#[allow(clippy::let_underscore_future)]
pub async fn spawn_app() -> TestApp {
    LazyLock::force(&TRACING);
    let email_server = MockServer::start().await;

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = 0;
        c.email_client.base_url = email_server.uri();
        c
    };

    let app = Application::build(&configuration)
        .await
        .expect("Failed to build application server.");

    let address = format!("http://127.0.0.1:{}", app.port());
    let _ = tokio::spawn(app.run_until_stopped());

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        email_server,
        admin_email: configuration.registration.admin_email,
        support_email: configuration.registration.support_email,
        messages: configuration.registration.messages,
        api_client: client,
    }
}

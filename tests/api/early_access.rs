//! tests/api/early_access.rs
use crate::helpers::spawn_app;
use serde_json::json;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{any, body_partial_json, method, path},
};

#[tokio::test]
async fn early_access_returns_success_for_valid_form_data() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    // Act
    let body = "council_name=Springfield%20Council&email=a%40b.com";
    let response = app.post_early_access(body.into()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    assert_eq!(
        response.headers().get("Content-Type").unwrap(),
        "application/json"
    );
    let reply: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        reply,
        json!({"success": true, "message": app.messages.registration_completed})
    );
}

#[tokio::test]
async fn early_access_notifies_the_admin_and_confirms_to_the_registrant() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    // Act
    let body = "council_name=%20Springfield%20Council%20&email=%20a%40b.com%20";
    app.post_early_access(body.into()).await;

    // Assert
    let emails = app.sent_emails().await;
    let admin = emails
        .iter()
        .find(|e| e["To"] == app.admin_email.as_str())
        .expect("No email was sent to the administrator.");
    let user = emails
        .iter()
        .find(|e| e["To"] == "a@b.com")
        .expect("No confirmation was sent to the registrant.");

    assert_eq!(admin["ReplyTo"], "a@b.com");
    assert_eq!(user["ReplyTo"], app.support_email.as_str());
    for email in [admin, user] {
        let text_body = email["TextBody"].as_str().unwrap();
        assert!(text_body.contains("Springfield Council"));
        assert!(text_body.contains("a@b.com"));
    }
}

#[tokio::test]
async fn early_access_returns_every_validation_error_in_field_order() {
    // Arrange
    let app = spawn_app().await;
    let messages = &app.messages;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let test_cases = vec![
        (
            "council_name=&email=a%40b.com",
            vec![&messages.council_name_required],
            "empty council name",
        ),
        (
            "council_name=X&email=not-an-email",
            vec![&messages.valid_email_required],
            "invalid email",
        ),
        (
            "council_name=X&email=%20%20",
            vec![&messages.email_required],
            "whitespace email",
        ),
        (
            "",
            vec![&messages.council_name_required, &messages.email_required],
            "missing both",
        ),
        (
            "council_name=%20&email=nope",
            vec![&messages.council_name_required, &messages.valid_email_required],
            "blank council name and invalid email",
        ),
    ];

    for (body, expected_errors, description) in test_cases {
        // Act
        let response = app.post_early_access(body.into()).await;

        // Assert
        assert_eq!(
            200,
            response.status().as_u16(),
            "The API did not return a 200 OK when the payload was {}.",
            description
        );
        let reply: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            reply,
            json!({"success": false, "errors": expected_errors}),
            "Unexpected reply when the payload was {}.",
            description
        );
    }
}

#[tokio::test]
async fn early_access_reports_an_admin_failure_and_still_mails_the_registrant() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(body_partial_json(json!({"To": app.admin_email})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(body_partial_json(json!({"To": "a@b.com"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app
        .post_early_access("council_name=X&email=a%40b.com".into())
        .await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let reply: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        reply,
        json!({"success": false, "message": app.messages.admin_notification_failed})
    );
}

#[tokio::test]
async fn early_access_reports_a_confirmation_failure() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(body_partial_json(json!({"To": app.admin_email})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(body_partial_json(json!({"To": "a@b.com"})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app
        .post_early_access("council_name=X&email=a%40b.com".into())
        .await;

    // Assert
    let reply: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        reply,
        json!({"success": false, "message": app.messages.confirmation_failed})
    );
}

#[tokio::test]
async fn early_access_rejects_other_methods_with_a_405() {
    // Arrange
    let app = spawn_app().await;
    let url = format!("{}/early_access", app.address);

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    for method in [reqwest::Method::GET, reqwest::Method::PUT, reqwest::Method::DELETE] {
        // Act
        let response = app
            .api_client
            .request(method.clone(), &url)
            .send()
            .await
            .expect("Failed to execute request.");

        // Assert
        assert_eq!(
            405,
            response.status().as_u16(),
            "The API did not return a 405 for {}.",
            method
        );
        assert_eq!(response.headers().get("Allow").unwrap(), "POST");
        let reply: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            reply,
            json!({"success": false, "message": app.messages.method_not_allowed})
        );
    }
}

#[tokio::test]
async fn early_access_uses_the_last_value_of_a_repeated_field() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    // Act
    let body = "council_name=X&email=a%40b.com&email=c%40d.com";
    let response = app.post_early_access(body.into()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let reply: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        reply,
        json!({"success": true, "message": app.messages.registration_completed})
    );
    let emails = app.sent_emails().await;
    assert!(emails.iter().any(|e| e["To"] == "c@d.com"));
    assert!(emails.iter().all(|e| e["To"] != "a@b.com"));
}

#[tokio::test]
async fn early_access_answers_an_oversized_form_with_json_validation_errors() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    // Act
    let body = format!(
        "council_name=X&email=a%40b.com&padding={}",
        "x".repeat(256 * 1024)
    );
    let response = app.post_early_access(body).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let reply: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        reply,
        json!({
            "success": false,
            "errors": [app.messages.council_name_required, app.messages.email_required]
        })
    );
}

//! src/startup.rs
use crate::configuration::{MailTransport, Settings};
use crate::email_client::{EmailClient, Mailer, SendmailClient};
use crate::registration::RegistrationHandler;
use crate::routes::{health_check, method_not_allowed, register};
use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: &Settings) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );

        // Configure email client
        let sender_email = configuration
            .email_client
            .sender()
            .map_err(anyhow::Error::msg)?;
        let settings = &configuration.email_client;
        let mailer: Arc<dyn Mailer> = match settings.transport {
            MailTransport::Http => Arc::new(
                EmailClient::new(
                    settings.base_url.clone(),
                    sender_email.clone(),
                    settings.sender_name.clone(),
                    settings.authorization_token.clone(),
                    settings.timeout(),
                )
                .context("Failed to build the email client.")?,
            ),
            MailTransport::Sendmail => Arc::new(SendmailClient::new(
                settings.sendmail.path.clone(),
                sender_email.clone(),
                settings.sender_name.clone(),
                settings.sendmail.charset,
                settings.timeout(),
            )),
        };
        tracing::info!(transport = ?settings.transport, "Mail transport configured.");

        let registration_handler = RegistrationHandler::new(
            mailer,
            sender_email,
            &configuration.registration,
        )
        .context("Invalid registration settings.")?;

        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {address}."))?;
        let port = listener.local_addr()?.port();
        let server = run(listener, registration_handler)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    registration_handler: RegistrationHandler,
) -> Result<Server, anyhow::Error> {
    let registration_handler = web::Data::new(registration_handler);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::resource("/early_access")
                    .route(web::post().to(register))
                    .default_service(web::to(method_not_allowed)),
            )
            .app_data(registration_handler.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

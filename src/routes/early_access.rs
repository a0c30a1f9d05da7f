//! src/routes/early_access.rs
use crate::registration::{RegistrationForm, RegistrationHandler};
use actix_web::{HttpResponse, http::header::ALLOW, web};

/// Largest form body that is read. Anything bigger is handled as an empty form.
const MAX_FORM_BYTES: usize = 256 * 1024;

/// Form bodies that cannot be read or decoded are treated like a form with no
/// fields, so the caller still gets the usual validation errors as JSON.
#[tracing::instrument(name = "Early access registration", skip(payload, handler))]
pub async fn register(
    payload: web::Payload,
    handler: web::Data<RegistrationHandler>,
) -> HttpResponse {
    let pairs = match payload.to_bytes_limited(MAX_FORM_BYTES).await {
        Ok(Ok(body)) => serde_urlencoded::from_bytes::<Vec<(String, String)>>(&body)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to decode the registration form.");
                Vec::new()
            }),
        Ok(Err(_)) => {
            tracing::warn!(limit = MAX_FORM_BYTES, "Registration form is too large.");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read the registration form.");
            Vec::new()
        }
    };
    let form = RegistrationForm::from_pairs(pairs);
    HttpResponse::Ok().json(handler.register(form).await)
}

pub async fn method_not_allowed(handler: web::Data<RegistrationHandler>) -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((ALLOW, "POST"))
        .json(handler.method_not_allowed())
}

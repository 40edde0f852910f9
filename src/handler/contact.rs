//! Contact form endpoint
//!
//! Reads the posted form, runs the submission through [`contact::submit`] and
//! maps the outcome onto HTTP: 302 to the thank-you page, 400 for blank
//! fields, 500 with the dispatcher's message when delivery fails.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response, StatusCode};

use crate::config::AppState;
use crate::contact::{self, ContactError, Submission, VALIDATION_MESSAGE};
use crate::handler::pages::Page;
use crate::http;
use crate::logger;

/// Handle `POST /contact`
pub async fn handle_submission<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let is_form = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_form_urlencoded);

    let limit = usize::try_from(state.config.http.max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_warning(&format!("Contact form body exceeds {limit} bytes"));
            return http::build_413_response();
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read contact form body: {e}"));
            Bytes::new()
        }
    };

    // Bodies in any other encoding carry no fields
    let submission = if is_form {
        Submission::from_form(&body)
    } else {
        Submission::default()
    };

    match contact::submit(&submission, state.mailer.as_ref()).await {
        Ok(message) => {
            logger::log_mail_sent(&message.sender_name);
            http::build_redirect_response(Page::ThankYou.path())
        }
        Err(ContactError::Validation { missing }) => {
            logger::log_warning(&format!(
                "Contact form rejected, missing: {}",
                missing.join(", ")
            ));
            http::build_html_status_response(
                StatusCode::BAD_REQUEST,
                format!("<h1>{VALIDATION_MESSAGE}</h1>"),
                false,
            )
        }
        Err(ContactError::Delivery(e)) => {
            logger::log_mail_failed(&e);
            http::build_html_status_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "<h1>Something went wrong. Please try again later.</h1><p>{}</p>",
                    tera::escape_html(&e.to_string())
                ),
                false,
            )
        }
    }
}

/// `application/x-www-form-urlencoded`, parameters such as charset allowed
fn is_form_urlencoded(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| {
            essence
                .trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_form_urlencoded() {
        assert!(is_form_urlencoded("application/x-www-form-urlencoded"));
        assert!(is_form_urlencoded("application/x-www-form-urlencoded; charset=UTF-8"));
        assert!(is_form_urlencoded("Application/X-WWW-Form-Urlencoded"));
        assert!(!is_form_urlencoded("application/json"));
        assert!(!is_form_urlencoded("multipart/form-data; boundary=x"));
    }
}

//! Contact form: client-side validation and hand-off to a transport.
//!
//! The site has no backend of its own, so delivery goes through a
//! [`FormTransport`]. [`SimulatedTransport`] stands in until a real one is
//! wired up: it waits a moment, logs the payload and reports success.
//!
//! Submissions are not serialized; a second submit while the first is in
//! flight runs independently.

use std::rc::Rc;
use std::sync::LazyLock;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use regex::Regex;
use serde::Serialize;

use super::notification::{NotificationKind, Notifier};
use super::{Attachment, Effect};
use crate::config::Config;
use crate::page::{FormFields, Navigation, Page};

pub const FORM_ID: &str = "contactForm";

pub const INVALID_MESSAGE: &str = "Please fill in all fields correctly.";
pub const SENT_MESSAGE: &str = "Message sent successfully! We'll get back to you soon.";
pub const FAILED_MESSAGE: &str = "Something went wrong. Please try again.";

/// `local@domain.tld`, no whitespace and exactly one `@`.
static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| match Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$") {
    Ok(pattern) => Some(pattern),
    Err(err) => {
        log::error!("email pattern failed to compile: {err}");
        None
    }
});

/// A validated contact request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("required field '{0}' is empty")]
    MissingField(&'static str),

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("transport rejected the submission: {0}")]
    Rejected(String),

    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Delivers a validated submission somewhere.
pub trait FormTransport {
    fn send(&self, submission: ContactSubmission) -> LocalBoxFuture<'static, Result<(), SendError>>;
}

/// Stand-in transport: waits, logs the payload, always succeeds.
pub struct SimulatedTransport<P: Page> {
    page: Rc<P>,
    delay: Duration,
}

impl<P: Page> SimulatedTransport<P> {
    pub fn new(page: Rc<P>, delay_ms: u32) -> Self {
        Self { page, delay: Duration::from_millis(u64::from(delay_ms)) }
    }
}

impl<P: Page> FormTransport for SimulatedTransport<P> {
    fn send(&self, submission: ContactSubmission) -> LocalBoxFuture<'static, Result<(), SendError>> {
        let wait = self.page.sleep(self.delay);
        Box::pin(async move {
            wait.await;
            let payload = serde_json::to_string(&submission)?;
            log::info!("contact form payload: {payload}");
            Ok(())
        })
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.as_ref().is_some_and(|pattern| pattern.is_match(email))
}

fn required(fields: &FormFields, name: &'static str) -> Result<String, ValidationError> {
    match fields.get(name) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(ValidationError::MissingField(name)),
    }
}

/// Check the raw fields and build a submission from them.
pub fn validate(fields: &FormFields) -> Result<ContactSubmission, ValidationError> {
    let name = required(fields, "name")?;
    let email = required(fields, "email")?;
    if !is_valid_email(&email) {
        return Err(ValidationError::InvalidEmail(email));
    }
    let subject = required(fields, "subject")?;
    let message = required(fields, "message")?;
    Ok(ContactSubmission { name, email, subject, message })
}

pub struct ContactForm {
    config: Rc<Config>,
    transport: Rc<dyn FormTransport>,
}

impl ContactForm {
    pub fn new(config: Rc<Config>, transport: Rc<dyn FormTransport>) -> Self {
        Self { config, transport }
    }
}

impl<P: Page> Effect<P> for ContactForm {
    fn name(&self) -> &'static str {
        "contact-form"
    }

    fn attach(&self, page: &Rc<P>) -> Attachment {
        let Some(form) = page.element_by_id(FORM_ID) else {
            return Attachment::Skipped("no #contactForm");
        };

        let notifier = Notifier::new(Rc::clone(page), &self.config);
        let transport = Rc::clone(&self.transport);
        let submit_page = Rc::clone(page);
        let submit_form = form.clone();
        page.on_submit(
            &form,
            Box::new(move || {
                let submission = match validate(&submit_page.form_values(&submit_form)) {
                    Ok(submission) => submission,
                    Err(err) => {
                        log::debug!("contact form rejected: {err}");
                        notifier.show(NotificationKind::Error, INVALID_MESSAGE);
                        return Navigation::Prevent;
                    }
                };

                let sending = transport.send(submission);
                let page = Rc::clone(&submit_page);
                let form = submit_form.clone();
                let notifier = notifier.clone();
                submit_page.spawn(Box::pin(async move {
                    match sending.await {
                        Ok(()) => {
                            notifier.show(NotificationKind::Success, SENT_MESSAGE);
                            page.reset_form(&form);
                        }
                        Err(err) => {
                            log::warn!("contact form send failed: {err}");
                            notifier.show(NotificationKind::Error, FAILED_MESSAGE);
                        }
                    }
                }));
                Navigation::Prevent
            }),
        );

        Attachment::Attached
    }
}

#[cfg(test)]
#[path = "contact_form_test.rs"]
mod tests;

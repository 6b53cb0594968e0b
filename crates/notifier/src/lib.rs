//! Outbound mail delivery for post notifications.
//!
//! The dispatch engine only sees the [`MailTransport`] trait; this crate
//! provides the implementations:
//! - [`SmtpTransport`]: SMTP relay via `lettre` (production)
//! - [`RecordingTransport`]: captures mail in memory, with scripted failures (tests)
//!
//! A transport reports success or failure per recipient. Retrying is not its
//! job: a failed attempt is terminal.

pub mod recording;
pub mod smtp;
pub mod transport;

pub use recording::RecordingTransport;
pub use smtp::SmtpTransport;
pub use transport::{MailTransport, OutgoingMail};

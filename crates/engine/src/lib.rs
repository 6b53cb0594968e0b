//! Debounced post-notification engine.
//!
//! Save events arm a per-article [`scheduler::DebounceScheduler`]; once an
//! article has been quiet for the configured period it fires, and the
//! [`dispatcher::DispatchWorker`] mails the composed notification to every
//! active subscriber.

pub mod articles;
pub mod composer;
pub mod dispatcher;
pub mod hook;
pub mod scheduler;
pub mod store;
pub mod subscription;

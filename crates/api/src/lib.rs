//! HTTP surface for postbell: subscription endpoints for the signup form
//! integration, a save-event webhook for the content system, and admin
//! endpoints to inspect and drive the notification queue.

pub mod middleware;
pub mod routes;
pub mod state;

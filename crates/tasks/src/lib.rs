//! Image generation tasks on the labs service.
//!
//! [`TaskClient`] submits a `text2im` task with a service session's bearer
//! token and polls it until the service reports a terminal status.

mod client;

pub use client::TaskClient;

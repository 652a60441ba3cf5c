//! Core types for the labs workspace.
//!
//! This crate defines the records shared by the login flow and the task
//! client: the unified error type, the login step identifiers, the OAuth token
//! bundle, the service session and the generation task wire shapes.

pub mod error;
#[cfg(feature = "reqwest")]
pub mod http;
pub mod step;
pub mod task;
pub mod token;

pub use error::{LabsError, Result};
pub use step::LoginStep;
pub use task::{
    GenerationData, GenerationResult, GenerationTask, Generations, StatusInformation, TaskPrompt,
    TaskRequest, TaskStatus,
};
pub use token::{AccessTokenBundle, LoginCredentials, ServiceSession};

pub mod attachment;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handle;
pub mod history;
pub mod parsers;
pub mod provider;
pub mod request;
pub mod worker;

pub use error::ParleyError;
pub use event::{FailureKind, GenerationEvent};
pub use handle::{EventStream, WorkerHandle};
pub use history::Turn;
pub use provider::Provider;
pub use request::GenerationRequest;

pub mod gemini;
pub mod stream;

pub use gemini::{Answer, parse_document};
pub use stream::JsonObjectStream;

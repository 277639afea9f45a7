pub mod http;

pub use http::HttpDispatch;

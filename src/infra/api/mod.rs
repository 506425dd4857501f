pub mod http;

pub use http::{HttpClient, HttpMethod, MockHttpClient, RecordedRequest, ReqwestHttpClient};

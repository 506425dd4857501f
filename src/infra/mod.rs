//! インフラ層
//!
//! - `api`: RESTストアとのHTTP通信

pub mod api;

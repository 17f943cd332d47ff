//! Fluidinfo wire conventions: header names, content types, default
//! endpoints, and the helpers that render credentials and client identity
//! into request headers.
//!
//! # Header Formats
//!
//! | Header | Format | Example |
//! |--------|--------|---------|
//! | Authorization | `Basic base64(user:password)` | `Basic YWxpY2U6c2VjcmV0` |
//! | X-Fluidinfo-Client | Free text | `fluidinfo-stream` |
//! | X-Fluidinfo-Client-URL | URL | `https://github.com/micrypt/fluidinfo-stream` |
//! | X-Fluidinfo-Version | Version string | `0.1.0` |

pub mod constants;
mod headers;

pub use headers::{basic_auth_value, client_headers, join_target};

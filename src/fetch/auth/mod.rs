//! Credential-injecting client wrappers.

mod url_param;

pub use url_param::UrlParam;

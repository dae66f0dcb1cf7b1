/// Middleware modules for the API server
///
/// - `auth`: Bearer-token resolution into a principal
/// - `security`: Security response headers

pub mod auth;
pub mod security;

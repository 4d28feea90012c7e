//! HTTP transport and token persistence.

mod token;
mod transport;

pub use token::{AUTH_TOKEN_KEY, FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{HttpTransport, UnauthorizedHandler};

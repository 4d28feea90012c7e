//! Session state and login/logout flows.

mod session;

pub use session::{AdminRole, AdminUser, AuthSession, AuthState, LoginInput};

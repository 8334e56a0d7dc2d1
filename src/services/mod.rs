// Service exports
pub mod auth;
pub mod email;
pub mod postgres;

pub use auth::{AuthError, AuthUser, JwtVerifier};
pub use email::{EmailClient, EmailError, EmailOutcome, Invitation};
pub use postgres::{PostgresClient, PostgresError};

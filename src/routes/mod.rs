pub mod auth;
pub mod error;
pub mod health;
pub mod recovery;
pub mod signup;

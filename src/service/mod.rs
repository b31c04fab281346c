pub mod email;
pub mod lockout;
pub mod token;
pub mod verification;

//! Password reset via short-lived (token, code) tickets

mod service;


pub use service::PasswordResetService;

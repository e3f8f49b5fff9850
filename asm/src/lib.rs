pub mod error;
pub mod expr;
pub mod msg;
pub mod pass1;
pub mod pass2;
pub mod record;
pub mod tables;
pub mod token;

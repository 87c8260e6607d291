//! API route handlers

pub mod run;
pub mod system;

pub mod buffer;
pub mod clock;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod fill;
pub mod output;
pub mod session;

pub mod args;
pub mod control;
pub mod stream;

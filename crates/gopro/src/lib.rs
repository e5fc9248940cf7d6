#[macro_use]
extern crate num_derive;

pub mod client;
pub mod command;
mod config;
pub mod control;
mod dial;
pub mod listener;
pub mod state;

pub use client::{CommandSink, WebcamControl};
pub use command::*;
pub use config::*;
pub use control::WebcamClient;
pub use dial::*;
pub use state::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
pub struct MainArgs {
    /// The path to the config file for the bridge
    #[clap(long, short)]
    pub config: Option<PathBuf>,

    /// The camera to connect to, e.g. gopro://172.25.190.51; overrides the
    /// config file
    #[clap(long, short)]
    pub address: Option<String>,

    #[clap(subcommand)]
    pub command: BridgeCommand,
}

#[derive(Subcommand, Debug, Clone)]
#[clap(rename_all = "kebab-case")]
pub enum BridgeCommand {
    /// put the camera into webcam mode and record its transport stream
    Stream {
        /// file to write the stream to, or - for stdout; defaults to a
        /// timestamped file under captures/
        #[clap(long, short)]
        output: Option<PathBuf>,
    },

    /// print the camera's webcam status
    Status,

    /// start webcam mode without receiving the stream
    Start,

    /// stop webcam mode
    Stop,
}

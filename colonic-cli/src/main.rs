// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! colonic CLI
//!
//! Command-line interface for bringing COLO network agents up and down.

use clap::{Parser, Subcommand};

mod commands;

/// colonic - COLO network agent lifecycle controller
#[derive(Parser)]
#[command(name = "colonic")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "colonic.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the agent for every configured NIC
    Setup {
        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stop the agent for every configured NIC
    Teardown {
        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved interface and status record of each NIC
    Status {
        /// Print status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Setup { json } => commands::setup::execute(&cli.config, json).await,
        Commands::Teardown { json } => commands::teardown::execute(&cli.config, json).await,
        Commands::Status { json } => commands::status::execute(&cli.config, json).await,
        Commands::Validate { file } => commands::validate::execute(&file).await,
    }
}

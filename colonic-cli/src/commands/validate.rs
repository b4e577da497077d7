// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `colonic validate` command - Validate configuration file.
//!
//! Unlike `setup`, this also requires the agent script to be present and
//! executable on this host.

use colonic_core::ConfigLoader;

pub async fn execute(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file, "Validating configuration");

    let checked = ConfigLoader::load_file(file).and_then(|config| {
        config.agent.script.check()?;
        Ok(config)
    });

    match checked {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Agent Settings:");
            println!("  Script:           {}", config.agent.script);
            println!(
                "  Hotplug Timeout:  {}ms",
                config.agent.hotplug_timeout.as_millis()
            );
            println!("  Store Root:       {}", config.store.root.display());
            println!();
            println!("Domain {} ({}):", config.domain.id, config.domain.mode);
            println!("NICs ({}):", config.nics.len());
            for nic in &config.nics {
                println!(
                    "  - {} (forwarddev: {}, nictype: {:?})",
                    nic.devid,
                    nic.forwarddev.as_deref().unwrap_or("<unset>"),
                    nic.nictype
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}

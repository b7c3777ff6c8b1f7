// SPDX-License-Identifier: MPL-2.0

//! Test program: poll a controller, print its entities and follow events.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example poll_controller -- <address|config.json> [seconds]
//! ```
//!
//! # Example
//!
//! ```bash
//! RUST_LOG=stmctrl_lib=debug cargo run --example poll_controller -- 192.168.1.100 60
//! ```

use std::env;
use std::time::Duration;

use stmctrl_lib::event::CoordinatorEvent;
use stmctrl_lib::{ControllerConfig, Subscribable};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stmctrl_lib=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <address|config.json> [seconds]", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --example poll_controller -- 192.168.1.100 60");
        std::process::exit(1);
    }

    let config = if args[1].ends_with(".json") {
        ControllerConfig::load(&args[1])?
    } else {
        ControllerConfig::new(args[1].clone())
    };
    let seconds: u64 = match args.get(2) {
        Some(s) => s.parse()?,
        None => 30,
    };

    config.validate()?;
    let coordinator = config.build_coordinator()?;

    println!("Polling {}...", config.address);
    let data = coordinator.first_refresh().await?;

    let info = coordinator.device_info();
    println!(
        "{} by {} (firmware {:?})",
        info.name(),
        info.manufacturer(),
        info.sw_version()
    );

    for entity in coordinator.entities().unwrap_or_default() {
        println!(
            "  [{}] {} ({}) = {:?}",
            entity.platform(),
            entity.name(),
            entity.unique_id(),
            entity.read(&data)
        );
    }

    let listener = coordinator.add_listener(|data| {
        println!("Snapshot at {}, up {:?}", data.updated_at(), data.state().uptime());
    });

    let mut events = coordinator.subscribe();
    let poller = coordinator.start();

    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            event = events.recv() => match event {
                Ok(CoordinatorEvent::Updated(_)) => {}
                Ok(CoordinatorEvent::RebootDetected(reboot)) => {
                    println!("Controller restarted, works since {}", reboot.works_since);
                }
                Ok(other) => println!("Event: {other:?}"),
                Err(RecvError::Lagged(n)) => println!("Missed {n} events"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    coordinator.remove_listener(listener);
    poller.shutdown().await;

    println!("Done!");
    Ok(())
}

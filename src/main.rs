//! Roulette Tracker Prediction Server
//!
//! Supports running as:
//! - Prediction server (default)
//! - Service lifecycle agent (with `service` subcommand)
//!
//! Usage:
//! - Normal mode: `roulette-tracker`
//! - With custom port: `roulette-tracker --port 8000`
//! - Provision the host: `roulette-tracker service install`
//! - Remove from the host: `roulette-tracker service uninstall`
//! - Query the unit: `roulette-tracker service status`

use roulette_tracker::RuntimeConfig;

/// 解析命令行参数
fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port_override = args[i + 1].parse().ok();
                i += 2;
            }
            "--host" if i + 1 < args.len() => {
                config.host_override = Some(args[i + 1].clone());
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "service" => {
                // service 子命令由后面处理
                break;
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("Roulette Tracker Prediction Server");
    println!();
    println!("USAGE:");
    println!("    roulette-tracker [OPTIONS] [COMMAND]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>    Override the listening port");
    println!("    --host <ADDR>    Override the listening address");
    println!("    -h, --help       Print help information");
    println!();
    println!("COMMANDS:");
    println!("    service          systemd service management");
    println!();
    println!("EXAMPLES:");
    println!("    roulette-tracker                      # Run the prediction server");
    println!("    roulette-tracker --port 8000          # Custom port");
    println!("    roulette-tracker service install      # Provision host + start unit");
}

fn main() {
    roulette_tracker::init_tracing();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Handle service commands on Unix (systemd hosts)
    #[cfg(unix)]
    {
        if args.len() >= 2 && args[1] == "service" {
            handle_service_command(&args);
            return;
        }
    }

    // Parse runtime config from command line
    let config = parse_args();

    // Suppress unused variable warning on non-Unix
    #[cfg(not(unix))]
    let _ = &args;

    // Normal console mode - run with tokio runtime
    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let result = rt.block_on(async { roulette_tracker::init_and_run_server(config).await });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Handle systemd service commands
#[cfg(unix)]
fn handle_service_command(args: &[String]) {
    use roulette_tracker::config::InstallConfig;
    use roulette_tracker::services::installer::Installer;

    if args.len() < 3 {
        println!("Usage: roulette-tracker service <command>");
        println!();
        println!("Commands:");
        println!("  install    Provision the host and start the systemd unit");
        println!("  uninstall  Stop and remove the systemd unit");
        println!("  start      Start the service");
        println!("  stop       Stop the service");
        println!("  status     Show service status");
        return;
    }

    let command = &args[2];
    let installer = Installer::new(InstallConfig::from_env());

    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let result = rt.block_on(async {
        match command.as_str() {
            "install" => {
                println!("Provisioning host for roulette.service...");
                installer.install().await.map(|report| {
                    for step in &report.steps {
                        println!("  [{}] {}", step.status.as_str(), step.display_name);
                    }
                    if let Some(ref url) = report.url {
                        println!("Service expected at {}", url);
                    }
                })
            }
            "uninstall" => {
                println!("Removing roulette.service...");
                installer.uninstall().await
            }
            "start" => installer.start().await,
            "stop" => installer.stop().await,
            "status" => installer.status().await.map(|state| {
                println!("Service status: {}", state);
            }),
            _ => {
                println!("Unknown service command: {}", command);
                return Ok(());
            }
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

//! CLI command handling
//!
//! Builds DUTs from configuration, runs tests through the registry and
//! formats results.

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::sim::{Dut, FirmwareProgram, SimEvent};
use crate::testing::{write_reports, TestRegistry, TestReport};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    let registry = TestRegistry::builtin();

    match command {
        Commands::Run {
            name,
            program,
            timeout_cycles,
            report,
            verbose,
        } => {
            let config = Config::load()?;

            let names: Vec<&'static str> = match name {
                Some(name) => vec![registry.get(&name)?.name],
                None => registry.names(),
            };

            let firmware = match &program {
                Some(path) => Some(FirmwareProgram::load(path)?),
                None => None,
            };

            let timeout_override = timeout_cycles.or(config.defaults.timeout_cycles);
            let mut reports = Vec::with_capacity(names.len());

            for name in names {
                let registered = registry.get(name)?;
                let program = firmware.clone().unwrap_or_else(registered.firmware);

                println!(
                    "\n{} {} {}",
                    "Running Test:".blue().bold(),
                    name.white().bold(),
                    format!("(firmware: {})", program.name).dimmed()
                );

                let dut = Dut::new(program, config.simulation.clone());
                let probe = dut.probe();
                let result = registry.run(name, dut, timeout_override).await?;

                print_report(&result);
                if verbose {
                    print_events(&probe.events());
                }
                reports.push(result);
            }

            if let Some(path) = &report {
                write_reports(path, &reports)?;
                println!("Report written to {}", path.display());
            }

            let failed = reports.iter().filter(|r| !r.passed).count();
            if failed > 0 {
                return Err(Error::TestsFailed {
                    failed,
                    total: reports.len(),
                });
            }
            Ok(())
        }

        Commands::List => {
            for name in registry.names() {
                println!("{}", name);
            }
            Ok(())
        }

        Commands::Program { name } => {
            let registered = registry.get(&name)?;
            print!("{}", (registered.firmware)().to_yaml()?);
            Ok(())
        }
    }
}

fn print_report(report: &TestReport) {
    for entry in &report.log {
        println!("  {}", entry.message.dimmed());
    }

    let timing = format!(
        "{} cycles, {} ns simulated, {} ms",
        report.cycles, report.sim_time_ns, report.elapsed_ms
    );

    match &report.error {
        None => println!(
            "{} {} {}",
            "✓".green().bold(),
            "Test Passed".green().bold(),
            timing.dimmed()
        ),
        Some(error) => {
            println!(
                "{} {} {}",
                "✗".red().bold(),
                "Test Failed".red().bold(),
                timing.dimmed()
            );
            println!("  {}", error.red());
        }
    }
}

fn print_events(events: &[SimEvent]) {
    println!("\n{}", "Events:".cyan());
    for event in events {
        let line = match event {
            SimEvent::ResetReleased { .. } => "reset released".to_string(),
            SimEvent::MgmtGpio { level, .. } => format!("mgmt_gpio = {}", level),
            SimEvent::CsbReleased { .. } => "csb released".to_string(),
            SimEvent::WbWrite { addr, data, .. } => format!("wb write {:#010x} <- {:#010x}", addr, data),
            SimEvent::WbRead { addr, data, .. } => format!("wb read  {:#010x} -> {:#010x}", addr, data),
            SimEvent::FirmwareHalted { .. } => "firmware halted".to_string(),
        };
        println!("  {:>8}  {}", event.cycle(), line);
    }
}

use std::process::ExitCode;

use flockview::Simulation;

const USAGE: &str = "usage: flockview [agent_count] [world_multiplier]";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let mut simulation = Simulation::new();

    if let Some(arg) = args.next() {
        match arg.parse::<usize>() {
            Ok(count) => simulation = simulation.with_agent_count(count),
            Err(_) => {
                log::error!("invalid agent count '{}'\n{}", arg, USAGE);
                return ExitCode::FAILURE;
            }
        }
    }
    if let Some(arg) = args.next() {
        match arg.parse::<f32>() {
            Ok(multiplier) => simulation = simulation.with_world_multiplier(multiplier),
            Err(_) => {
                log::error!("invalid world multiplier '{}'\n{}", arg, USAGE);
                return ExitCode::FAILURE;
            }
        }
    }

    match simulation.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

mod session;

use std::env;
use std::io;
use std::process;

use session::{Session, SessionConfig};

fn main() -> io::Result<()> {
    let config = parse_args().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!(
            "Usage: stopcycle-emulator [--speed <factor>] [--ticks <countdown>] [--cycles <n>]"
        );
        process::exit(2);
    });

    let mut session = Session::new(config);
    session.run()
}

fn parse_args() -> Result<SessionConfig, String> {
    let mut config = SessionConfig::default();
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--speed=") {
            config.speed = parse_speed(value)?;
        } else if arg == "--speed" {
            let value = args.next().ok_or("Expected value after --speed")?;
            config.speed = parse_speed(&value)?;
        } else if let Some(value) = arg.strip_prefix("--ticks=") {
            config.wake_ticks = parse_ticks(value)?;
        } else if arg == "--ticks" {
            let value = args.next().ok_or("Expected value after --ticks")?;
            config.wake_ticks = parse_ticks(&value)?;
        } else if let Some(value) = arg.strip_prefix("--cycles=") {
            config.cycle_limit = Some(parse_cycles(value)?);
        } else if arg == "--cycles" {
            let value = args.next().ok_or("Expected value after --cycles")?;
            config.cycle_limit = Some(parse_cycles(&value)?);
        } else {
            return Err(format!("Unknown argument `{arg}`"));
        }
    }

    Ok(config)
}

fn parse_speed(value: &str) -> Result<f64, String> {
    let speed: f64 = value
        .parse()
        .map_err(|_| format!("Invalid speed factor `{value}`"))?;
    if speed > 0.0 && speed.is_finite() {
        Ok(speed)
    } else {
        Err(format!("Speed factor must be positive, got `{value}`"))
    }
}

fn parse_ticks(value: &str) -> Result<u32, String> {
    let ticks: u32 = value
        .parse()
        .map_err(|_| format!("Invalid countdown `{value}`"))?;
    if ticks == 0 {
        Err("Countdown must be nonzero".to_string())
    } else {
        Ok(ticks)
    }
}

fn parse_cycles(value: &str) -> Result<u32, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid cycle count `{value}`"))
}

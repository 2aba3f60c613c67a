//! Randomized differential math test driver.
//!
//! Generates random calculator expressions forever, runs each against the
//! reference and candidate builds, and records disagreements to the
//! run-scoped checklist.  Interrupt with Ctrl+C to stop generating and walk
//! the checklist interactively.

use std::ffi::OsString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fbc_harness::driver::Driver;
use fbc_harness::executor::{ExecutorConfig, ProcessExecutor};
use fbc_harness::HarnessConfig;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let stop = install_interrupt_flag();
    let exit_code = run_cli(std::env::args_os(), &stop);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Wire Ctrl+C to a stop flag observed by the generation loop at trial
/// boundaries.  The in-flight trial always completes, so no checklist write
/// is ever abandoned midway.
fn install_interrupt_flag() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("warning: interrupt handler unavailable: {e}");
                return;
            }
        };
        runtime.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                println!();
                flag.store(true, Ordering::SeqCst);
            }
        });
    });
    stop
}

fn run_cli<I>(os_args: I, stop: &AtomicBool) -> i32
where
    I: IntoIterator<Item = OsString>,
{
    let raw: Vec<String> = os_args
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let tail = raw.get(1..).unwrap_or(&[]);

    let config = match parse_args(tail) {
        Ok(Some(config)) => config,
        Ok(None) => {
            print_help();
            return 0;
        }
        Err(msg) => {
            eprintln!("error: {msg}");
            eprintln!();
            print_help();
            return 2;
        }
    };

    let executor = ProcessExecutor::new(ExecutorConfig {
        candidate_dir: config.candidate_dir.clone(),
        reference_dir: config.reference_dir.clone(),
    });
    let mut driver = Driver::new(&config, executor);

    match driver.run(stop) {
        Ok(summary) => {
            if let Ok(json) = serde_json::to_string(&summary) {
                println!("\nRun summary: {json}");
            }
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

/// Parse command-line flags.  `Ok(None)` means help was requested.
fn parse_args(tail: &[String]) -> Result<Option<HarnessConfig>, String> {
    let mut config = HarnessConfig::default();
    let mut i = 0;

    while i < tail.len() {
        let arg = tail[i].as_str();
        match arg {
            "-h" | "--help" => return Ok(None),
            "--candidate-dir" | "--reference-dir" | "--checklist-dir" | "--seed" => {
                i += 1;
                let value = tail
                    .get(i)
                    .ok_or_else(|| format!("{arg} requires a value"))?;
                match arg {
                    "--candidate-dir" => config.candidate_dir = value.into(),
                    "--reference-dir" => config.reference_dir = Some(value.into()),
                    "--checklist-dir" => config.checklist_dir = value.into(),
                    _ => {
                        config.seed = value
                            .parse()
                            .map_err(|_| format!("invalid seed: {value:?}"))?;
                    }
                }
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    Ok(Some(config))
}

fn print_help() {
    println!("randmath — randomized differential math test driver");
    println!();
    println!("Generates random calculator expressions until interrupted, comparing a");
    println!("candidate bc/dc build against a reference build, then walks the recorded");
    println!("regressions interactively.");
    println!();
    println!("USAGE:");
    println!("    randmath [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --candidate-dir <dir>   directory holding the candidate bc and dc builds");
    println!("                            (default: current directory)");
    println!("    --reference-dir <dir>   directory holding the reference builds");
    println!("                            (default: resolve bc/dc via PATH)");
    println!("    --checklist-dir <dir>   directory for the checklist backing stores");
    println!("                            (default: current directory)");
    println!("    --seed <u64>            master seed for the expression generator");
    println!("    -h, --help              print this help");
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbc_harness::RANDMATH_SEED;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn no_flags_yields_defaults() {
        let config = parse_args(&[]).unwrap().unwrap();
        assert_eq!(config.seed, RANDMATH_SEED);
        assert!(config.reference_dir.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse_args(&args(&[
            "--candidate-dir",
            "/builds/new",
            "--reference-dir",
            "/builds/old",
            "--checklist-dir",
            "/tmp/run",
            "--seed",
            "7",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(config.candidate_dir.to_str(), Some("/builds/new"));
        assert_eq!(config.reference_dir.as_deref().and_then(|p| p.to_str()), Some("/builds/old"));
        assert_eq!(config.checklist_dir.to_str(), Some("/tmp/run"));
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn help_short_circuits() {
        assert!(parse_args(&args(&["--help"])).unwrap().is_none());
        assert!(parse_args(&args(&["-h"])).unwrap().is_none());
    }

    #[test]
    fn unknown_and_malformed_arguments_are_rejected() {
        assert!(parse_args(&args(&["--frobnicate"])).is_err());
        assert!(parse_args(&args(&["--seed"])).is_err());
        assert!(parse_args(&args(&["--seed", "not-a-number"])).is_err());
    }
}

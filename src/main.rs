use synop_features::config::Config;
use synop_features::error::DetectError;
use synop_features::io::{FieldSource, JsonFieldSource};
use synop_features::runtime::{run, Sinks};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("argument error: {}", e);
            return ExitCode::from(1);
        }
    };

    match run_app(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(DetectError::Alloc) => ExitCode::from(2),
        Err(DetectError::Internal(msg)) => panic!("internal error: {}", msg),
        Err(DetectError::Io(e)) => {
            eprintln!("storage failure: {}", e);
            ExitCode::from(e.raw_os_error().unwrap_or(1) as u8)
        }
        Err(e) => {
            eprintln!("run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_app(config: Config) -> synop_features::error::Result<()> {
    let source = JsonFieldSource::new(&config.input_file);
    let raw = source.load()?;
    let (adapter, long_name) = raw.into_adapter()?;

    let input_basename = config
        .input_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("input")
        .to_string();
    let stamp = run_timestamp();

    let sinks = Arc::new(Sinks::create(&config.out_dir, &long_name, &input_basename, &stamp)?);
    sinks.log_line(&format!("starting run over {} time steps", adapter.n_time))?;

    let cancel = Arc::new(AtomicBool::new(false));
    run(Arc::new(adapter), Arc::new(config), sinks.clone(), cancel)?;

    sinks.log_line("run complete")?;
    Ok(())
}

/// The output filename contract (spec §6) embeds a `DD-MM-YYYY_HH-MM`
/// run timestamp, taken at run start.
fn run_timestamp() -> String {
    chrono::Utc::now().format("%d-%m-%Y_%H-%M").to_string()
}

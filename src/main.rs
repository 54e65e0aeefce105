use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;
use pitdelta::{
    AnalysisConfig, ComparisonReport, ComparisonSubject, FileSessionRepository, OutputFormat,
    PitdeltaError, SessionComparison, SessionRef, SessionRepository, ThrottleTraceMode,
    analysis::tyre_series, report,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare a driver across two sessions
    Compare {
        /// First session, e.g. 2025:Bahrain:R
        #[arg(short, long)]
        a: SessionRef,

        /// Second session, e.g. 2025:Japan:R
        #[arg(short, long)]
        b: SessionRef,

        #[arg(short, long)]
        driver: Option<String>,

        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Resample both throttle traces every STEP meters
        #[arg(short, long, value_name = "STEP")]
        resample: Option<f64>,

        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Print the lap history of a driver in one session
    Laps {
        session: SessionRef,

        #[arg(short, long)]
        driver: Option<String>,

        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List the sessions available in the repository
    Sessions {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Save defaults to the config file
    Config {
        #[arg(long)]
        data_dir: Option<PathBuf>,

        #[arg(short, long)]
        driver: Option<String>,
    },
}

fn open_repository(
    config: &AnalysisConfig,
    data_dir: &Option<PathBuf>,
) -> Result<FileSessionRepository, PitdeltaError> {
    let root = match data_dir {
        Some(data_dir) => data_dir.clone(),
        None => config.data_dir()?,
    };
    info!("Using session repository {:?}", root);
    FileSessionRepository::new(root)
}

fn compare(
    config: &AnalysisConfig,
    sessions: (&SessionRef, &SessionRef),
    driver: &str,
    data_dir: &Option<PathBuf>,
    throttle_mode: ThrottleTraceMode,
    format: OutputFormat,
) -> Result<(), PitdeltaError> {
    let mut repository = open_repository(config, data_dir)?;
    let session_a = repository.load(&sessions.0.key(driver))?;
    let session_b = repository.load(&sessions.1.key(driver))?;

    let comparison = SessionComparison::new(
        ComparisonSubject::from(session_a),
        ComparisonSubject::from(session_b),
        driver,
    )
    .with_throttle_mode(throttle_mode);
    let report = ComparisonReport::build(&comparison);
    if report.degraded_views() > 0 {
        info!("{} views could not be computed", report.degraded_views());
    }
    println!("{}", report::render(&report, format)?);
    Ok(())
}

fn laps(
    config: &AnalysisConfig,
    session: &SessionRef,
    driver: &str,
    data_dir: &Option<PathBuf>,
) -> Result<(), PitdeltaError> {
    let mut repository = open_repository(config, data_dir)?;
    let loaded = repository.load(&session.key(driver))?;
    let series = tyre_series(&loaded, driver);
    for line in report::tyre_series_lines(&loaded.label(), &series) {
        println!("{}", line);
    }
    Ok(())
}

fn sessions(config: &AnalysisConfig, data_dir: &Option<PathBuf>) -> Result<(), PitdeltaError> {
    let repository = open_repository(config, data_dir)?;
    for (year, event, session_type) in repository.available_sessions()? {
        println!("{}:{}:{}", year, event, session_type);
    }
    Ok(())
}

fn save_config(
    mut config: AnalysisConfig,
    data_dir: &Option<PathBuf>,
    driver: &Option<String>,
) -> Result<(), PitdeltaError> {
    if let Some(data_dir) = data_dir {
        config.data_dir = Some(data_dir.clone());
    }
    if let Some(driver) = driver {
        config.driver = driver.to_uppercase();
    }
    let path = config.save()?;
    println!("Saved config to {:?}", path);
    Ok(())
}

fn run(command: &Commands) -> Result<(), PitdeltaError> {
    let config = AnalysisConfig::from_local_file().unwrap_or_default();
    match command {
        Commands::Compare {
            a,
            b,
            driver,
            data_dir,
            resample,
            format,
        } => {
            let driver = driver.as_deref().unwrap_or(&config.driver);
            let throttle_mode = resample
                .map(|step_m| ThrottleTraceMode::Resampled { step_m })
                .unwrap_or(config.throttle_mode);
            let format = format.unwrap_or(config.output_format);
            compare(&config, (a, b), driver, data_dir, throttle_mode, format)
        }
        Commands::Laps {
            session,
            driver,
            data_dir,
        } => {
            let driver = driver.as_deref().unwrap_or(&config.driver);
            laps(&config, session, driver, data_dir)
        }
        Commands::Sessions { data_dir } => sessions(&config, data_dir),
        Commands::Config { data_dir, driver } => save_config(config, data_dir, driver),
    }
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    if let Err(e) = run(&cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// src/main.rs
mod app;
mod cert;
mod config;
mod error;
mod kubeconfig;
mod paths;
mod topology;
mod utils;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use app::BootstrapRun;
use cert::OpensslBackend;
use config::BootstrapAnswers;
use utils::logging::{ConsoleLogger, FileLogger, Logger, MultiLogger};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Answers file describing the cluster to bootstrap
    #[arg(short, long, default_value = "bootstrap_config.json")]
    pub config: String,

    /// Log backend invocations and intermediate paths
    #[arg(short, long)]
    pub debug: bool,

    /// Print each signed certificate after generation
    #[arg(short, long)]
    pub show: bool,

    /// Mirror the log to a file
    #[arg(short, long)]
    pub log_file: Option<String>,
}

fn build_logger(args: &Args, debug: bool) -> std::io::Result<Box<dyn Logger>> {
    let console = ConsoleLogger::new(debug);
    match &args.log_file {
        Some(path) => Ok(Box::new(MultiLogger::new(vec![
            Box::new(console),
            Box::new(FileLogger::new(path, debug)?),
        ]))),
        None => Ok(Box::new(console)),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if !Path::new(&args.config).exists() {
        let template = BootstrapAnswers::default();
        if let Err(e) = template.save_to_file(&args.config) {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
        eprintln!(
            "Wrote a template answers file to {}; add the master nodes and re-run.",
            args.config
        );
        return ExitCode::FAILURE;
    }

    let answers = match BootstrapAnswers::load_from_file(&args.config) {
        Ok(answers) => answers,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (config, topology) = answers.resolve();
    let debug = config.debug || args.debug;
    let logger = match build_logger(&args, debug) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Error: cannot open log file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut run = BootstrapRun::new(
        config,
        topology,
        Box::new(OpensslBackend::new()),
        logger,
        args.show,
    );
    match run.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {} (reached {:?})", e, run.state());
            ExitCode::FAILURE
        }
    }
}

// src/main.rs

use std::path::PathBuf;

use rulewatch::config::load_and_validate;
use rulewatch::errors::FAILURE_EXIT_CODE;
use rulewatch::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("rulewatch error: {err:?}");
        std::process::exit(FAILURE_EXIT_CODE);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    logging::init_logging(args.log_level, args.verbose || cfg.build.verbose)?;
    run(args, cfg).await
}

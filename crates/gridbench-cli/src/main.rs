use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

use gridbench_classifiers::config::ModelKind;
use gridbench_cli::grid::input::ExperimentConfig;
use gridbench_cli::grid::run::run_and_write;

const MODEL_TYPES: [&str; 3] = ["gbdt", "random_forest", "svm"];

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("GRIDBENCH_LOG", "error,gridbench=info"))
        .init();

    let matches = Command::new("gridbench")
        .version(clap::crate_version!())
        .about("Grid-search evaluation of classifiers on a fixed train/test split")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Train and score every configuration of a hyperparameter grid")
                .arg(
                    Arg::new("config")
                        .help("Path to the experiment JSON configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data_file")
                        .short('d')
                        .long("data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the labelled data (*.csv or *.tsv). Overrides the data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to write the result table (TSV, or CSV for *.csv). Defaults to stdout.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("model_type")
                        .long("model-type")
                        .help("Override the model type from the JSON config; uses that model's default grid.")
                        .value_parser(MODEL_TYPES)
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("threads")
                        .long("threads")
                        .help("Number of worker threads. 1 runs the grid sequentially.")
                        .value_parser(clap::value_parser!(usize))
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("summary_file")
                        .long("json")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to write a JSON summary with the best configuration and the full table.")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("default-config")
                .about("Print a default experiment configuration")
                .arg(
                    Arg::new("model_type")
                        .help("Model type whose default grid to print")
                        .required(false)
                        .value_parser(MODEL_TYPES),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("run", sub_m)) => handle_run(sub_m),
        Some(("default-config", sub_m)) => handle_default_config(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_run(matches: &ArgMatches) -> Result<()> {
    let config_path = match matches.get_one::<PathBuf>("config") {
        Some(path) => path,
        None => {
            eprintln!("[gridbench] No config file provided; printing a default configuration.");
            println!("{}", serde_json::to_string_pretty(&ExperimentConfig::default())?);
            return Ok(());
        }
    };
    log::info!("[gridbench] Running grid search from config: {:?}", config_path);

    let config = match ExperimentConfig::from_arguments(config_path, matches) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1)
        }
    };

    match run_and_write(&config) {
        Ok(report) => {
            eprintln!(
                "[gridbench] Completed {} configuration(s): {} scored, {} failed.",
                report.len(),
                report.scored_count(),
                report.failed_rows().count()
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Grid search failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_default_config(matches: &ArgMatches) -> Result<()> {
    let kind = match matches.get_one::<String>("model_type") {
        Some(name) => ModelKind::from_str(name).map_err(anyhow::Error::msg)?,
        None => ModelKind::default(),
    };
    println!("{}", serde_json::to_string_pretty(&ExperimentConfig::for_kind(kind))?);
    Ok(())
}

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use pcfg_core::config::{DEFAULT_ROUNDING_PRECISION, DEFAULT_START_LABEL};
use pcfg_core::pipeline::{export_from_path, write_export};
use pcfg_core::{ExportConfig, PcfgError, build_output_path};

/// Expansions tried per sampled derivation before giving up.
const MAX_SAMPLE_STEPS: usize = 1000;

fn command() -> Command {
    Command::new("pcfg-export")
        .about("Imports a saved model and translates it into a readable PCFG")
        .arg(
            Arg::new("path")
                .long("path")
                .help("The path to the model you wish to translate")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("reduce")
                .long("reduce")
                .help("Prune low-probability transitions for readability, see --rounding-acc")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("outputfile")
                .long("outputfile")
                .help("Where to write the grammar (.json for JSON). Default: <model>.pcfg")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("rounding_acc")
                .long("rounding-acc")
                .help("Decimal digits probabilities are rounded to, only used with --reduce")
                .default_value("3")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("threshold")
                .long("threshold")
                .help("Selection threshold, defaults to 10^-rounding-acc")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("start_label")
                .long("start-label")
                .help("Label of the start rule")
                .default_value(DEFAULT_START_LABEL),
        )
        .arg(
            Arg::new("print")
                .long("print")
                .help("Print the grammar after exporting it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("sample")
                .long("sample")
                .help("Print this many derivations sampled from the grammar")
                .value_parser(value_parser!(usize)),
        )
}

fn config_from(matches: &ArgMatches) -> Result<ExportConfig, PcfgError> {
    let rounding_acc = matches.get_one::<i64>("rounding_acc").copied().unwrap_or(DEFAULT_ROUNDING_PRECISION as i64);
    let threshold = matches.get_one::<f64>("threshold").copied();
    let start_label = matches.get_one::<String>("start_label").map(String::as_str).unwrap_or(DEFAULT_START_LABEL);
    ExportConfig::new(rounding_acc, threshold, matches.get_flag("reduce"))?.with_start_label(start_label)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let matches = command().get_matches();
    let config = config_from(&matches)?;

    // Required by clap, cannot be missing here
    let path = matches.get_one::<PathBuf>("path").ok_or("--path is required")?;
    let output = match matches.get_one::<PathBuf>("outputfile") {
        Some(output) => output.clone(),
        None => build_output_path(path, "pcfg")?,
    };

    let export = export_from_path(path, &config)?;
    write_export(&export, &output)?;
    println!(
        "Wrote {} rules and {} terminals to {}",
        export.grammar.rules.len(),
        export.terminals.len(),
        output.display()
    );

    if matches.get_flag("print") {
        // Reduced grammars are shown at the precision they were rounded to
        if config.reduce {
            print!("{:.*}", config.rounding_precision as usize, export.grammar);
        } else {
            print!("{}", export.grammar);
        }
    }

    if let Some(count) = matches.get_one::<usize>("sample") {
        let mut rng = rand::rng();
        for i in 0..*count {
            match export.grammar.sample(&mut rng, MAX_SAMPLE_STEPS) {
                Some(derivation) => println!(
                    "Sample {}: {} ⇒ {}",
                    i + 1,
                    derivation.labels.join(" → "),
                    derivation.words.join(" ")
                ),
                None => println!("Sample {}: no terminal reached", i + 1),
            }
        }
    }

    Ok(())
}

// Command line utility for running the cytof-rs pipeline

use anyhow::Error;
use clap::{value_parser, Arg, ArgMatches, Command};
use cytof_rs::AnalysisConfig;
use sample_graph::DistanceMetric;
use std::path::PathBuf;
use tools::{read_config, run};

fn size_arg(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(id).help(help).long(long).value_parser(value_parser!(usize))
}

fn override_usize(matches: &ArgMatches, id: &str, field: &mut usize) {
    if let Some(v) = matches.get_one::<usize>(id) {
        *field = *v;
    }
}

fn cli() -> Command {
    Command::new("cytof-rs-cmd")
        .arg(
            Arg::new("INPUT")
                .help("cell table: sample_id,donor,condition,<marker...> (CSV, optionally .gz)")
                .required(true)
                .index(1)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("OUT_DIR")
                .help("Output directory")
                .short('o')
                .long("out_dir")
                .default_value(".")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("CONFIG")
                .help("JSON analysis configuration; flags below override it")
                .short('c')
                .long("config")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(size_arg("NUM_PARTITIONS", "num_partitions", "Number of k-means partitions").short('k'))
        .arg(size_arg("CELLS_PER_SAMPLE", "cells_per_sample", "Cells drawn per sample for the fit"))
        .arg(size_arg("MAX_ITERATIONS", "max_iterations", "Maximum Lloyd iterations"))
        .arg(size_arg("N_INIT", "n_init", "Independent k-means restarts"))
        .arg(size_arg("NUM_PERMUTATIONS", "num_permutations", "Permutations in the null distribution").short('p'))
        .arg(
            Arg::new("SEED")
                .help("Random seed")
                .short('s')
                .long("seed")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("METRIC")
                .help("Distance between sample proportion vectors: euclidean or manhattan")
                .short('m')
                .long("metric")
                .value_parser(|s: &str| s.parse::<DistanceMetric>()),
        )
        .arg(
            Arg::new("REFERENCE")
                .help("Test every condition against this one instead of all pairs")
                .short('r')
                .long("reference"),
        )
}

/// Defaults, then the config file, then individual flags.
fn config_from(matches: &ArgMatches) -> Result<AnalysisConfig, Error> {
    let mut config = match matches.get_one::<PathBuf>("CONFIG") {
        Some(path) => read_config(path)?,
        None => AnalysisConfig::default(),
    };
    override_usize(matches, "NUM_PARTITIONS", &mut config.num_partitions);
    override_usize(matches, "CELLS_PER_SAMPLE", &mut config.cells_per_sample);
    override_usize(matches, "MAX_ITERATIONS", &mut config.max_iterations);
    override_usize(matches, "N_INIT", &mut config.n_init);
    override_usize(matches, "NUM_PERMUTATIONS", &mut config.num_permutations);
    if let Some(seed) = matches.get_one::<u64>("SEED") {
        config.seed = *seed;
    }
    if let Some(metric) = matches.get_one::<DistanceMetric>("METRIC") {
        config.metric = *metric;
    }
    Ok(config)
}

pub fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    let input: &PathBuf = matches.get_one("INPUT").unwrap();
    let out_dir: &PathBuf = matches.get_one("OUT_DIR").unwrap();
    let config = config_from(&matches)?;
    let reference = matches.get_one::<String>("REFERENCE").map(String::as_str);

    run(input, out_dir, config, reference)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"n_init": 4, "seed": 9, "num_partitions": 30}"#).unwrap();

        let matches = cli()
            .try_get_matches_from([
                "cytof-rs-cmd",
                "cells.csv",
                "--config",
                path.to_str().unwrap(),
                "--n_init",
                "7",
                "--metric",
                "manhattan",
                "-k",
                "12",
            ])
            .unwrap();
        let config = config_from(&matches).unwrap();
        assert_eq!(config.n_init, 7);
        assert_eq!(config.metric, DistanceMetric::Manhattan);
        assert_eq!(config.num_partitions, 12);
        assert_eq!(config.seed, 9);
        assert_eq!(config.num_permutations, AnalysisConfig::default().num_permutations);
    }

    #[test]
    fn test_unknown_metric_is_rejected() {
        let res = cli().try_get_matches_from(["cytof-rs-cmd", "cells.csv", "--metric", "cosine"]);
        assert!(res.is_err());

        let matches = cli().try_get_matches_from(["cytof-rs-cmd", "cells.csv"]).unwrap();
        assert_eq!(config_from(&matches).unwrap(), AnalysisConfig::default());
    }
}

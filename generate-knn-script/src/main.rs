use std::{fs::File, io::BufReader};

use anyhow::Context;
use clap::Parser;
use knn_loadgen::{ScriptConfig, ScriptEmitter, ScriptTemplates, ValueGenerator};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use util::file_or_stdout_writer;

mod util;

/// Print a shell script that creates a knn index, bulk loads random vectors
/// into it, force-merges it and runs a single knn query.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Command {
    /// path to a json configuration file. absent fields take their defaults
    #[arg(short, long)]
    config: Option<String>,

    /// path to the output file. if empty, writes to stdout
    #[arg(short, long)]
    output: Option<String>,

    /// directory with <block>.handlebars files replacing the builtin templates
    #[arg(long)]
    template_dir: Option<String>,

    #[arg(long)]
    record_count: Option<usize>,
    #[arg(long)]
    dimension: Option<usize>,
    #[arg(long)]
    index_name: Option<String>,
    #[arg(long)]
    field_name: Option<String>,
    /// float, byte or binary
    #[arg(long)]
    data_type: Option<String>,
    /// l2, innerproduct, cosinesimil, l1, linf or hamming
    #[arg(long)]
    space_type: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    min_value: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    max_value: Option<f64>,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    batch_size: Option<usize>,
    /// number of neighbors to query for
    #[arg(short)]
    k: Option<usize>,
    #[arg(long)]
    engine: Option<String>,
    #[arg(long)]
    method: Option<String>,
    /// keep the output of bulk requests instead of sending it to /dev/null
    #[arg(long)]
    verbose_bulk: bool,

    #[arg(long, default_value_t = 0x533D, conflicts_with = "entropy")]
    seed: u64,
    /// seed from os entropy instead of --seed
    #[arg(long)]
    entropy: bool,
}

impl Command {
    fn apply_overrides(&self, config: &mut ScriptConfig) {
        if let Some(record_count) = self.record_count {
            config.record_count = record_count;
        }
        if let Some(dimension) = self.dimension {
            config.dimension = dimension;
        }
        if let Some(index_name) = &self.index_name {
            config.index_name = index_name.clone();
        }
        if let Some(field_name) = &self.field_name {
            config.field_name = field_name.clone();
        }
        if let Some(data_type) = &self.data_type {
            config.data_type = data_type.clone();
        }
        if let Some(space_type) = &self.space_type {
            config.space_type = space_type.clone();
        }
        if let Some(min_value) = self.min_value {
            config.min_value = min_value;
        }
        if let Some(max_value) = self.max_value {
            config.max_value = max_value;
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(k) = self.k {
            config.k = k;
        }
        if let Some(engine) = &self.engine {
            config.engine = engine.clone();
        }
        if let Some(method) = &self.method {
            config.method = method.clone();
        }
        if self.verbose_bulk {
            config.quiet_bulk = false;
        }
    }

    fn load_config(&self) -> Result<ScriptConfig, anyhow::Error> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_reader(BufReader::new(
                File::open(path).context("could not open configuration file")?,
            ))
            .context("could not parse configuration file")?,
            None => ScriptConfig::default(),
        };
        self.apply_overrides(&mut config);

        Ok(config)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<(), anyhow::Error> {
    let args = Command::parse();
    init_logging();

    let config = args.load_config()?;
    let resolved = config.resolve().context("invalid configuration")?;
    info!(
        records = resolved.record_count,
        dimension = resolved.dimension,
        data_type = %resolved.data_type,
        space_type = %resolved.space_type,
        index = %resolved.index_name,
        field = %resolved.field_name,
        "resolved configuration"
    );

    let templates = match &args.template_dir {
        Some(dir) => ScriptTemplates::from_dir(dir).context("could not load template dir")?,
        None => ScriptTemplates::builtin(),
    };

    let seed = if args.entropy {
        rand::random()
    } else {
        args.seed
    };
    info!(seed, "seeding value generator");
    let mut generator = ValueGenerator::new(resolved.sampler(), StdRng::seed_from_u64(seed));

    let mut writer =
        file_or_stdout_writer(args.output.as_ref()).context("could not create output file")?;
    let summary = ScriptEmitter::new(&resolved, &templates)
        .emit(&mut generator, &mut writer)
        .context("could not write script")?;

    info!(
        batches = summary.batches,
        records = summary.records,
        output = args.output.as_deref().unwrap_or("<stdout>"),
        "script written"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Command::try_parse_from([
            "generate-knn-script",
            "--record-count",
            "25",
            "--data-type",
            "byte",
            "--min-value",
            "-100",
            "--max-value",
            "100",
            "-k",
            "5",
            "--verbose-bulk",
        ])
        .unwrap();
        let config = args.load_config().unwrap();
        assert_eq!(25, config.record_count);
        assert_eq!("byte", config.data_type);
        assert_eq!(-100.0, config.min_value);
        assert_eq!(100.0, config.max_value);
        assert_eq!(5, config.k);
        assert!(!config.quiet_bulk);
        assert_eq!("target_index", config.index_name);
    }

    #[test]
    fn no_flags_means_defaults() {
        let args = Command::try_parse_from(["generate-knn-script"]).unwrap();
        assert_eq!(ScriptConfig::default(), args.load_config().unwrap());
        assert_eq!(0x533D, args.seed);
    }

    #[test]
    fn seed_and_entropy_conflict() {
        let result = Command::try_parse_from([
            "generate-knn-script",
            "--seed",
            "3",
            "--entropy",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn config_file_then_flags() {
        let path = std::env::temp_dir().join(format!(
            "generate-knn-script-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"dimension": 16, "index_name": "from_file"}"#).unwrap();
        let path_str = path.to_str().unwrap().to_string();
        let args = Command::try_parse_from([
            "generate-knn-script",
            "--config",
            path_str.as_str(),
            "--index-name",
            "from_flag",
        ])
        .unwrap();
        let config = args.load_config().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(16, config.dimension);
        assert_eq!("from_flag", config.index_name);
    }
}

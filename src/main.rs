mod config;
mod personalize;
mod sketch;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, value_parser};
use personalize::Job;
use sketch::Flavor;
use std::path::PathBuf;

fn main() -> Result<()> {
    init_logging()?;

    let matches = cli().get_matches();
    let job = job_from_matches(&matches)?;

    println!("Personalizing {} from [{}] in {}", job.flavor, job.section, job.config.display());

    let written = personalize::run(&job).context("Personalization failed")?;

    println!("Wrote {}", written.display());
    Ok(())
}

fn cli() -> Command {
    Command::new("sketch-personalizer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fills a firmware template's placeholders from a config.ini section")
        .arg(
            Arg::new("flavor")
                .long("flavor")
                .value_name("FLAVOR")
                .help("Template to personalize")
                .default_value("advanced")
                .value_parser(Flavor::NAMES),
        )
        .arg(path_arg("config", "INI file holding the device settings"))
        .arg(
            Arg::new("section")
                .long("section")
                .value_name("NAME")
                .help("Config section to read")
                .default_value("personal"),
        )
        .arg(path_arg("template", "Template file containing the placeholders"))
        .arg(path_arg("output", "File to write; its directory is created if missing"))
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("PATH")
        .help(help)
        .value_parser(value_parser!(PathBuf))
}

/// Builds the job, falling back to the flavor's default paths.
fn job_from_matches(matches: &ArgMatches) -> Result<Job> {
    let name = matches
        .get_one::<String>("flavor")
        .context("Missing --flavor")?;
    let flavor = Flavor::from_name(name).with_context(|| format!("Unknown flavor: {}", name))?;

    let mut job = Job::with_defaults(flavor);
    if let Some(section) = matches.get_one::<String>("section") {
        job.section = section.clone();
    }
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        job.config = path.clone();
    }
    if let Some(path) = matches.get_one::<PathBuf>("template") {
        job.template = path.clone();
    }
    if let Some(path) = matches.get_one::<PathBuf>("output") {
        job.output = path.clone();
    }
    Ok(job)
}

fn init_logging() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

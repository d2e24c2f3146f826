//! Personalize module.
//! One run: make sure the output directory exists, load the settings section,
//! render the template and write the personalized copy (overwriting any previous one).

use crate::config::Section;
use crate::sketch::{self, Flavor};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Everything a single run needs.
#[derive(Clone, Debug)]
pub struct Job {
    pub flavor: Flavor,
    pub config: PathBuf,
    pub section: String,
    pub template: PathBuf,
    pub output: PathBuf,
}

impl Job {
    /// A job using the flavor's default paths and the `personal` section.
    pub fn with_defaults(flavor: Flavor) -> Self {
        let defaults = flavor.defaults();
        Self {
            flavor,
            config: defaults.config,
            section: "personal".to_string(),
            template: defaults.template,
            output: defaults.output,
        }
    }
}

/// Runs the job and returns the path that was written.
pub fn run(job: &Job) -> Result<PathBuf> {
    let start = Instant::now();

    ensure_parent_dir(&job.output)?;

    let section = Section::load(&job.config, &job.section)
        .with_context(|| format!("Failed to load settings from {}", job.config.display()))?;
    info!(
        section = section.name(),
        keys = section.len(),
        config = %job.config.display(),
        "Loaded settings"
    );

    let template = fs::read_to_string(&job.template)
        .with_context(|| format!("Failed to read template: {}", job.template.display()))?;

    let rendered = sketch::render(&template, job.flavor.substitutions(), &section)
        .with_context(|| format!("Failed to personalize {}", job.template.display()))?;
    for placeholder in &rendered.unmatched {
        warn!(placeholder, template = %job.template.display(), "Placeholder not found in template");
    }

    fs::write(&job.output, rendered.text)
        .with_context(|| format!("Failed to write {}", job.output.display()))?;

    info!(
        flavor = %job.flavor,
        output = %job.output.display(),
        elapsed = ?start.elapsed(),
        "Wrote personalized copy"
    );

    Ok(job.output.clone())
}

fn ensure_parent_dir(output: &Path) -> Result<()> {
    match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INI: &str = r#"[personal]
INFLUXDB_URL = http://influx.local:8086
INFLUXDB_TOKEN = abc123
INFLUXDB_ORG = home
INFLUXDB_BUCKET = sensors
DEVICE_NAME = bedroom
Wi-Fi_SSID = Attic
Wi-Fi_PASSWORD = letmein
HAS_PM = false
HAS_CO2 = false
HAS_SHT = false
ADD_TO_DB = 60
DISPLAY_INTERVAL = 15
DATABASE_EXPORT = false
FAHRENHEIT = true
TEMP_OFFSET = 3.0
TZ_INFO = JST-9
NTP_SERVER = ntp.nict.jp
"#;

    const SKETCH: &str = r#"#include <WiFi.h>
#define DEVICE "REPLACE_WITH_YOUR_DEVICE_NAME"
#define WIFI_SSID "REPLACE_WITH_YOUR_WI-FI_SSID"
#define WIFI_PASSWORD "REPLACE_WITH_YOUR_WI-FI_PASSWORD"
#define INFLUXDB_URL "REPLACE_WITH_YOUR_INFLUXDB_URL_OR_IP"
#define INFLUXDB_TOKEN "REPLACE_WITH_YOUR_TOKEN"
#define INFLUXDB_ORG "REPLACE_WITH_YOUR_ORGANIZATION_ID"
#define INFLUXDB_BUCKET "REPLACE_WITH_YOUR_BUCKET"
#define TZ_INFO "EST+5EDT,M3.2.0/2,M11.1.0/2"
#define NTP_SERVER "time.nis.gov"
#define HAS_PM true
#define HAS_CO2 true
#define HAS_SHT true
#define DATABASE_EXPORT true
#define FAHRENHEIT false
const unsigned int ADD_TO_DB = 20;
const unsigned int DISPLAY_INTERVAL = 30;
float TEMP_OFFSET = 2.0;
"#;

    fn job_in(dir: &Path) -> Job {
        let config = dir.join("Advanced").join("config.ini");
        let template = dir.join("sketch.ino");
        fs::create_dir_all(config.parent().unwrap()).unwrap();
        fs::write(&config, INI).unwrap();
        fs::write(&template, SKETCH).unwrap();

        Job {
            flavor: Flavor::Advanced,
            config,
            section: "personal".to_string(),
            template,
            output: dir.join("personal").join("personal.ino"),
        }
    }

    #[test]
    fn test_run_writes_personalized_copy() {
        let dir = tempfile::tempdir().unwrap();
        let job = job_in(dir.path());

        let written = run(&job).unwrap();
        assert_eq!(written, job.output);

        let text = fs::read_to_string(&written).unwrap();
        for sub in Flavor::Advanced.substitutions() {
            assert!(!text.contains(sub.placeholder), "placeholder left behind: {}", sub.placeholder);
        }
        assert!(text.starts_with("#include <WiFi.h>\n"));
        assert!(text.contains("#define DEVICE \"bedroom\""));
        assert!(text.contains("#define INFLUXDB_BUCKET \"sensors\""));
        assert!(text.contains("#define NTP_SERVER \"ntp.nict.jp\""));
        assert!(text.contains("const unsigned int DISPLAY_INTERVAL = 15;"));
        assert!(text.contains("float TEMP_OFFSET = 3.0;"));

        // The template itself is left untouched.
        assert_eq!(fs::read_to_string(&job.template).unwrap(), SKETCH);
    }

    #[test]
    fn test_rerun_is_idempotent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let job = job_in(dir.path());

        fs::create_dir_all(job.output.parent().unwrap()).unwrap();
        fs::write(&job.output, "stale contents from an earlier run").unwrap();

        run(&job).unwrap();
        let first = fs::read(&job.output).unwrap();
        run(&job).unwrap();
        let second = fs::read(&job.output).unwrap();

        assert_eq!(first, second);
        assert!(!String::from_utf8(first).unwrap().contains("stale"));
    }

    #[test]
    fn test_missing_key_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let job = job_in(dir.path());
        fs::write(&job.config, INI.replace("INFLUXDB_TOKEN = abc123\n", "")).unwrap();

        let err = run(&job).unwrap_err();
        assert!(format!("{:#}", err).contains("INFLUXDB_TOKEN"));
        assert!(!job.output.exists());
        // The output directory is created before anything is read.
        assert!(job.output.parent().unwrap().is_dir());
    }

    #[test]
    fn test_missing_section_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = job_in(dir.path());
        job.section = "garage".to_string();

        let err = run(&job).unwrap_err();
        assert!(format!("{:#}", err).contains("[garage]"));
        assert!(!job.output.exists());
    }

    #[test]
    fn test_missing_template_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = job_in(dir.path());
        job.template = dir.path().join("nope.ino");

        let err = run(&job).unwrap_err();
        assert!(err.to_string().contains("Failed to read template"));
    }

    #[test]
    fn test_with_defaults_uses_personal_section() {
        let job = Job::with_defaults(Flavor::Basic);
        assert_eq!(job.section, "personal");
        assert_eq!(job.config, PathBuf::from("./Basic/config.ini"));
        assert_eq!(job.output, PathBuf::from("./personal/personal.ino"));
    }
}

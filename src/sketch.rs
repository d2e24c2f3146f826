//! Sketch module.
//! Known firmware templates ("flavors") and the fixed, ordered placeholder substitutions for each.
//! Rendering is plain literal find-and-replace; every occurrence of a placeholder is replaced,
//! one substitution after another, against the text as left by the previous step.

use crate::config::Section;
use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

/// Template flavor to personalize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flavor {
    /// InfluxDB v2 sketch with database export and separate display interval
    #[default]
    Advanced,
    /// Older sketch with a single loop delay
    Basic,
    /// `DeviceConfig.example.hpp` header of the AirQualityMonitor firmware
    DeviceConfig,
}

impl Flavor {
    /// Names accepted on the command line.
    pub const NAMES: [&'static str; 3] = ["advanced", "basic", "device-config"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "advanced" => Some(Flavor::Advanced),
            "basic" => Some(Flavor::Basic),
            "device-config" => Some(Flavor::DeviceConfig),
            _ => None,
        }
    }

    pub fn substitutions(self) -> &'static [Substitution] {
        match self {
            Flavor::Advanced => ADVANCED,
            Flavor::Basic => BASIC,
            Flavor::DeviceConfig => DEVICE_CONFIG,
        }
    }

    pub fn defaults(self) -> Defaults {
        let (config, template, output) = match self {
            Flavor::Advanced => (
                "./Advanced/config.ini",
                "./C02_PM_SHT_OLED_WIFI_INFLUXDBV2/C02_PM_SHT_OLED_WIFI_INFLUXDBV2.ino",
                "./personal/personal.ino",
            ),
            Flavor::Basic => (
                "./Basic/config.ini",
                "./C02_PM_SHT_OLED_WIFI/C02_PM_SHT_OLED_WIFI.ino",
                "./personal/personal.ino",
            ),
            Flavor::DeviceConfig => (
                "./config.ini",
                "./AirQualityMonitor/DeviceConfig.example.hpp",
                "./AirQualityMonitor/DeviceConfig.hpp",
            ),
        };
        Defaults {
            config: PathBuf::from(config),
            template: PathBuf::from(template),
            output: PathBuf::from(output),
        }
    }
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flavor::Advanced => write!(f, "advanced (InfluxDB v2 sketch)"),
            Flavor::Basic => write!(f, "basic sketch"),
            Flavor::DeviceConfig => write!(f, "device-config (DeviceConfig.hpp)"),
        }
    }
}

/// Default file locations for a flavor, relative to the working directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Defaults {
    pub config: PathBuf,
    pub template: PathBuf,
    pub output: PathBuf,
}

/// How a config value is written in place of its placeholder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Render {
    /// The value replaces the placeholder as-is.
    Verbatim,
    /// The value follows a fixed lead-in, e.g. `HAS_PM ` + value.
    After(&'static str),
    /// Dotted address text written as an Arduino `IPAddress(a, b, c, d)` literal.
    IpAddress,
}

impl Render {
    fn apply(self, value: &str) -> String {
        match self {
            Render::Verbatim => value.to_string(),
            Render::After(lead) => format!("{}{}", lead, value),
            Render::IpAddress => {
                let octets: Vec<&str> = value.split('.').map(str::trim).collect();
                format!("IPAddress({})", octets.join(", "))
            }
        }
    }
}

/// One placeholder and the config key that fills it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Substitution {
    pub placeholder: &'static str,
    pub key: &'static str,
    pub render: Render,
}

const fn verbatim(placeholder: &'static str, key: &'static str) -> Substitution {
    Substitution { placeholder, key, render: Render::Verbatim }
}

const fn after(placeholder: &'static str, lead: &'static str, key: &'static str) -> Substitution {
    Substitution { placeholder, key, render: Render::After(lead) }
}

// *************** Substitution tables ***************

const ADVANCED: &[Substitution] = &[
    verbatim("REPLACE_WITH_YOUR_INFLUXDB_URL_OR_IP", "INFLUXDB_URL"),
    verbatim("REPLACE_WITH_YOUR_TOKEN", "INFLUXDB_TOKEN"),
    verbatim("REPLACE_WITH_YOUR_ORGANIZATION_ID", "INFLUXDB_ORG"),
    verbatim("REPLACE_WITH_YOUR_BUCKET", "INFLUXDB_BUCKET"),
    verbatim("REPLACE_WITH_YOUR_DEVICE_NAME", "DEVICE_NAME"),
    verbatim("REPLACE_WITH_YOUR_WI-FI_SSID", "Wi-Fi_SSID"),
    verbatim("REPLACE_WITH_YOUR_WI-FI_PASSWORD", "Wi-Fi_PASSWORD"),
    after("HAS_PM true", "HAS_PM ", "HAS_PM"),
    after("HAS_CO2 true", "HAS_CO2 ", "HAS_CO2"),
    after("HAS_SHT true", "HAS_SHT ", "HAS_SHT"),
    // The sketch declares these as `... ADD_TO_DB = 20;` and `... DISPLAY_INTERVAL = 30;`
    after("= 20", "= ", "ADD_TO_DB"),
    after("= 30", "= ", "DISPLAY_INTERVAL"),
    after("DATABASE_EXPORT true", "DATABASE_EXPORT ", "DATABASE_EXPORT"),
    after("FAHRENHEIT false", "FAHRENHEIT ", "FAHRENHEIT"),
    after("TEMP_OFFSET = 2.0", "TEMP_OFFSET = ", "TEMP_OFFSET"),
    verbatim("EST+5EDT,M3.2.0/2,M11.1.0/2", "TZ_INFO"),
    verbatim("time.nis.gov", "NTP_SERVER"),
];

const BASIC: &[Substitution] = &[
    verbatim("REPLACE_WITH_YOUR_INFLUXDB_URL_OR_IP", "INFLUXDB_URL"),
    verbatim("REPLACE_WITH_YOUR_TOKEN", "INFLUXDB_TOKEN"),
    verbatim("REPLACE_WITH_YOUR_ORGANIZATION_ID", "INFLUXDB_ORG"),
    verbatim("REPLACE_WITH_YOUR_BUCKET", "INFLUXDB_BUCKET"),
    verbatim("REPLACE_WITH_YOUR_DEVICE_NAME", "DEVICE_NAME"),
    verbatim("REPLACE_WITH_YOUR_WI-FI_SSID", "Wi-Fi_SSID"),
    verbatim("REPLACE_WITH_YOUR_WI-FI_PASSWORD", "Wi-Fi_PASSWORD"),
    after("HAS_PM true", "HAS_PM ", "HAS_PM"),
    after("HAS_CO2 true", "HAS_CO2 ", "HAS_CO2"),
    after("HAS_SHT true", "HAS_SHT ", "HAS_SHT"),
    after("DELAY = 30", "DELAY = ", "DELAY"),
    // Spelled this way in the basic sketch and its config.ini
    after("FAHRRENHEIT false", "FAHRRENHEIT ", "FAHRRENHEIT"),
    after("TEMP_OFFSET = 2.0", "TEMP_OFFSET = ", "TEMP_OFFSET"),
    verbatim("EST+5EDT,M3.2.0/2,M11.1.0/2", "TZ_INFO"),
    verbatim("time.nis.gov", "NTP_SERVER"),
];

const DEVICE_CONFIG: &[Substitution] = &[
    verbatim("REPLACE_WITH_YOUR_DEVICE_NAME", "DEVICE_NAME"),
    verbatim("EST+5EDT,M3.2.0/2,M11.1.0/2", "TZ_INFO"),
    verbatim("time.nis.gov", "NTP_SERVER"),
    // Wi-Fi
    after("ENABLE_WI_FI true", "ENABLE_WI_FI ", "ENABLE_WI_FI"),
    verbatim("REPLACE_WITH_YOUR_WI-FI_SSID", "Wi-Fi_SSID"),
    verbatim("REPLACE_WITH_YOUR_WI-FI_PASSWORD", "Wi-Fi_PASSWORD"),
    // InfluxDB
    after("ENABLE_INFLUXDB true", "ENABLE_INFLUXDB ", "ENABLE_INFLUXDB"),
    after("ADD_TO_INFLUXDB_INTERVAL = 30", "ADD_TO_INFLUXDB_INTERVAL = ", "ADD_TO_DB"),
    verbatim("REPLACE_WITH_YOUR_INFLUXDB_URL_OR_IP", "INFLUXDB_URL"),
    verbatim("REPLACE_WITH_YOUR_TOKEN", "INFLUXDB_TOKEN"),
    verbatim("REPLACE_WITH_YOUR_ORGANIZATION_ID", "INFLUXDB_ORG"),
    verbatim("REPLACE_WITH_YOUR_BUCKET", "INFLUXDB_BUCKET"),
    // MQTT
    after("ENABLE_MQTT false", "ENABLE_MQTT ", "ENABLE_MQTT"),
    Substitution {
        placeholder: "IPAddress(127, 0, 0, 1)",
        key: "MQTT_ADDR",
        render: Render::IpAddress,
    },
    after("ADD_TO_MQTT_INTERVAL = 30", "ADD_TO_MQTT_INTERVAL = ", "ADD_TO_MQTT_INTERVAL"),
    after("MQTT_AUTHENTICATION false", "MQTT_AUTHENTICATION ", "MQTT_AUTHENTICATION"),
    verbatim("REPLACE_WITH_YOUR_MQTT_USERNAME", "MQTT_USERNAME"),
    verbatim("REPLACE_WITH_YOUR_MQTT_PASSWORD", "MQTT_PASSWORD"),
    // Display and sensors
    after("DISPLAY_INTERVAL = 30", "DISPLAY_INTERVAL = ", "DISPLAY_INTERVAL"),
    after("HAS_SHT true", "HAS_SHT ", "HAS_SHT"),
    after("HAS_PM2_5 true", "HAS_PM2_5 ", "HAS_PM"),
    after("HAS_CO2 true", "HAS_CO2 ", "HAS_CO2"),
    after("FAHRENHEIT false", "FAHRENHEIT ", "FAHRENHEIT"),
    after("TEMP_OFFSET = 2.0", "TEMP_OFFSET = ", "TEMP_OFFSET"),
];

// *************** Rendering ***************

/// Result of personalizing a template.
#[derive(Debug)]
pub struct Rendered {
    pub text: String,
    /// Placeholders that never occurred in the template (nothing was replaced).
    pub unmatched: Vec<&'static str>,
}

/// Applies `substitutions` to `template` in order.
/// Every key is looked up even when its placeholder is absent; the first missing key fails the render.
pub fn render(template: &str, substitutions: &[Substitution], section: &Section) -> Result<Rendered> {
    let mut text = template.to_string();
    let mut unmatched = Vec::new();

    for sub in substitutions {
        let value = section.get(sub.key)?;
        let hits = text.matches(sub.placeholder).count();
        if hits == 0 {
            unmatched.push(sub.placeholder);
            continue;
        }
        debug!(placeholder = sub.placeholder, key = sub.key, hits, "Substituting");
        text = text.replace(sub.placeholder, &sub.render.apply(value));
    }

    Ok(Rendered { text, unmatched })
}

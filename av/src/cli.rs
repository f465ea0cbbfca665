//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::flows::CapabilityKind;
use crate::schema::{IrrigationInput, Language, NdviInput, PestInput, YieldInput};

/// AgriVision - Precision Agriculture Advisory
#[derive(Parser)]
#[command(
    name = "av",
    about = "Schema-validated AI advisories for precision agriculture",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Farm dashboard summary for a location
    Dashboard {
        /// State in India (defaults to the configured farm location)
        #[arg(long)]
        location: Option<String>,

        /// Output language: en, hi, pa (defaults to the configured language)
        #[arg(long)]
        language: Option<Language>,
    },

    /// Predict whether a crop needs irrigation
    Irrigation(IrrigationArgs),

    /// Estimate crop yield
    Yield(YieldArgs),

    /// Analyze an NDVI image and suggest interventions
    Ndvi(NdviArgs),

    /// Forecast pest outbreak risk
    Pest(PestArgs),

    /// Generate a user avatar image
    Avatar {
        /// Description of the avatar
        #[arg(default_value = "a farmer in a field, pixel art style")]
        prompt: String,

        /// Write the decoded image to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask a crop question
    Ask {
        /// The question
        question: String,
    },

    /// Invoke a capability with a raw JSON input object
    Invoke {
        /// Capability (irrigation, yield, ndvi, pest, dashboard, avatar, ask)
        capability: CapabilityKind,

        /// JSON input file, or - for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },

    /// Interactive crop assistant
    Assistant {
        /// First question to ask
        question: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct IrrigationArgs {
    #[arg(long, default_value = "Corn")]
    pub crop_type: String,

    /// Percent
    #[arg(long, default_value_t = 65.0)]
    pub soil_moisture: f64,

    /// Celsius
    #[arg(long, default_value_t = 25.0, allow_negative_numbers = true)]
    pub temperature: f64,

    /// Percent
    #[arg(long, default_value_t = 70.0, allow_negative_numbers = true)]
    pub humidity: f64,

    #[arg(
        long,
        default_value = "Sunny with light clouds for the next 3 days, potential rain on the 4th day."
    )]
    pub weather_forecast: String,

    #[arg(long, default_value = "Vegetative")]
    pub growth_stage: String,

    #[arg(long, default_value = "Punjab, India")]
    pub location: String,
}

impl From<IrrigationArgs> for IrrigationInput {
    fn from(args: IrrigationArgs) -> Self {
        Self {
            crop_type: args.crop_type,
            soil_moisture: args.soil_moisture,
            temperature: args.temperature,
            humidity: args.humidity,
            weather_forecast: args.weather_forecast,
            growth_stage: args.growth_stage,
            location: args.location,
        }
    }
}

#[derive(Debug, Args)]
pub struct YieldArgs {
    #[arg(long, default_value = "Soybean")]
    pub crop_type: String,

    /// Acres
    #[arg(long, default_value_t = 500.0, allow_negative_numbers = true)]
    pub farm_size: f64,

    #[arg(
        long,
        default_value = "Silty clay loam, pH 6.8, good moisture retention, medium nitrogen levels."
    )]
    pub soil_conditions: String,

    #[arg(
        long,
        default_value = "Consistent rainfall over the last month, temperatures slightly above average."
    )]
    pub environmental_data: String,

    #[arg(long, default_value = "Vigorous growth observed, canopy closure is ahead of schedule.")]
    pub growth_patterns: String,
}

impl From<YieldArgs> for YieldInput {
    fn from(args: YieldArgs) -> Self {
        Self {
            crop_type: args.crop_type,
            farm_size: args.farm_size,
            soil_conditions: args.soil_conditions,
            environmental_data: args.environmental_data,
            growth_patterns: args.growth_patterns,
        }
    }
}

#[derive(Debug, Args)]
pub struct NdviArgs {
    /// NDVI image file (png, jpg, webp, gif)
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Crop type, soil type and known issues
    #[arg(long, default_value = "")]
    pub field_description: String,

    /// Recent rainfall, temperature and humidity
    #[arg(long, default_value = "")]
    pub historical_weather_data: String,
}

impl NdviArgs {
    /// Build the input record around an already-encoded image
    pub fn into_input(self, ndvi_data: String) -> NdviInput {
        NdviInput {
            ndvi_data,
            field_description: self.field_description,
            historical_weather_data: self.historical_weather_data,
        }
    }
}

#[derive(Debug, Args)]
pub struct PestArgs {
    #[arg(
        long,
        default_value = "Last 30 days: Temp avg 28°C, high humidity, intermittent heavy rainfall."
    )]
    pub historical_weather_data: String,

    #[arg(long, default_value = "Corn, late vegetative stage, dense canopy.")]
    pub crop_data: String,

    #[arg(
        long,
        default_value = "History of corn borers and aphids in the region, especially after heavy rain."
    )]
    pub pest_data: String,

    #[arg(long, default_value = "India")]
    pub location: String,
}

impl From<PestArgs> for PestInput {
    fn from(args: PestArgs) -> Self {
        Self {
            historical_weather_data: args.historical_weather_data,
            crop_data: args.crop_data,
            pest_data: args.pest_data,
            location: args.location,
        }
    }
}

/// MIME type for an image file, from its extension
pub fn image_mime(path: &std::path::Path) -> Option<&'static str> {
    debug!(?path, "image_mime: called");
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agrivision")
        .join("logs")
        .join("agrivision.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with the log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    format!(
        "Capabilities:\n  {}\n\nLogs are written to: {}\n",
        CapabilityKind::ALL.map(|k| k.as_str()).join(", "),
        get_log_path().display()
    )
}

/// Output format for advisory results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

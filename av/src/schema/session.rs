//! Session entity records: farm settings, user profile, language

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Contract, ValidationError, Validator};

/// Placeholder shown until an avatar is generated
pub const PLACEHOLDER_AVATAR: &str = "/avatar-placeholder.png";

/// Advisory output language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Pa,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Hi, Language::Pa];

    /// ISO 639-1 code sent to the backend
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Pa => "pa",
        }
    }

    /// Native display name
    pub fn native_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Hi => "हिन्दी",
            Self::Pa => "ਪੰਜਾਬੀ",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Contract for Language {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "hi" | "hindi" => Ok(Self::Hi),
            "pa" | "punjabi" => Ok(Self::Pa),
            _ => Err(format!("Unknown language: {}. Use: en, hi, or pa", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FarmType {
    #[default]
    Arable,
    Pastoral,
    Mixed,
    Horticulture,
    Forestry,
}

impl FarmType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arable => "arable",
            Self::Pastoral => "pastoral",
            Self::Mixed => "mixed",
            Self::Horticulture => "horticulture",
            Self::Forestry => "forestry",
        }
    }
}

impl FromStr for FarmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arable" => Ok(Self::Arable),
            "pastoral" => Ok(Self::Pastoral),
            "mixed" => Ok(Self::Mixed),
            "horticulture" => Ok(Self::Horticulture),
            "forestry" => Ok(Self::Forestry),
            _ => Err(format!(
                "Unknown farm type: {}. Use: arable, pastoral, mixed, horticulture, or forestry",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FarmSettings {
    pub farm_name: String,
    pub farm_location: String,

    /// Acres
    pub farm_size: f64,
    pub farm_type: FarmType,
    pub description: String,
}

impl Default for FarmSettings {
    fn default() -> Self {
        Self {
            farm_name: "Sunny Meadows Farm".to_string(),
            farm_location: "Punjab, India".to_string(),
            farm_size: 500.0,
            farm_type: FarmType::Arable,
            description: "A family-owned farm dedicated to sustainable and innovative farming practices, \
                          specializing in corn and soybean cultivation."
                .to_string(),
        }
    }
}

impl Contract for FarmSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .min_chars("farmName", &self.farm_name, 3)
            .min_chars("farmLocation", &self.farm_location, 3)
            .positive("farmSize", self.farm_size)
            .max_chars("description", &self.description, 250)
            .finish()
    }
}

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub full_name: String,
    pub email: String,
    pub bio: String,
    pub avatar_url: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            full_name: "AgriVision User".to_string(),
            email: "farmer@agrivision.io".to_string(),
            bio: "Dedicated to sustainable and innovative farming practices.".to_string(),
            avatar_url: PLACEHOLDER_AVATAR.to_string(),
        }
    }
}

impl Contract for UserProfile {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .min_chars("fullName", &self.full_name, 2)
            .check("email", EMAIL.is_match(self.email.trim()), "must be a valid email address")
            .max_chars("bio", &self.bio, 250)
            .finish()
    }
}

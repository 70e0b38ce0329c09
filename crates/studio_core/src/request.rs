//! Generation requests and the style catalogue.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Visual style applied by the remote generator.
///
/// Parsed case-insensitively, both from text and from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String")]
pub enum Style {
    #[default]
    Editorial,
    Streetwear,
    Vintage,
    Minimalist,
    Artistic,
}

impl Style {
    pub const ALL: [Style; 5] = [
        Style::Editorial,
        Style::Streetwear,
        Style::Vintage,
        Style::Minimalist,
        Style::Artistic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Editorial => "Editorial",
            Self::Streetwear => "Streetwear",
            Self::Vintage => "Vintage",
            Self::Minimalist => "Minimalist",
            Self::Artistic => "Artistic",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|style| style.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GenerationError::Validation(format!("Unknown style: {wanted}")))
    }
}

impl TryFrom<String> for Style {
    type Error = GenerationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Unvalidated form input as handed over by a caller.
#[derive(Debug, Clone, Default)]
pub struct RawGenerationInput {
    pub image_data: String,
    pub prompt: String,
    pub style: Style,
}

impl RawGenerationInput {
    pub fn new(image_data: impl Into<String>, prompt: impl Into<String>, style: Style) -> Self {
        Self {
            image_data: image_data.into(),
            prompt: prompt.into(),
            style,
        }
    }
}

/// A request that passed validation: non-empty image reference and a
/// non-empty trimmed prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    #[serde(rename = "imageDataUrl")]
    image_data: String,
    prompt: String,
    style: Style,
}

impl GenerationRequest {
    pub fn new(
        image_data: impl Into<String>,
        prompt: impl AsRef<str>,
        style: Style,
    ) -> Result<Self, GenerationError> {
        let image_data = image_data.into();
        if image_data.is_empty() {
            return Err(GenerationError::Validation(
                "An image is required".to_string(),
            ));
        }
        let prompt = prompt.as_ref().trim();
        if prompt.is_empty() {
            return Err(GenerationError::Validation(
                "A prompt is required".to_string(),
            ));
        }
        Ok(Self {
            image_data,
            prompt: prompt.to_string(),
            style,
        })
    }

    pub fn image_data(&self) -> &str {
        &self.image_data
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn style(&self) -> Style {
        self.style
    }
}

impl TryFrom<RawGenerationInput> for GenerationRequest {
    type Error = GenerationError;

    fn try_from(raw: RawGenerationInput) -> Result<Self, Self::Error> {
        Self::new(raw.image_data, raw.prompt, raw.style)
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Fixed slack added on top of the CSS transition before the transition
/// class is removed.
const TRANSITION_PAD: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid options: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("class name {0:?} is not a valid CSS class")]
    InvalidClassName(String),
    #[error("transition duration must be a finite, non-negative number of seconds, got {0}")]
    InvalidTransitionDuration(f64),
    #[error("transition duration of {0} seconds is too long")]
    TransitionDurationTooLong(f64),
}

/// How highlighted comments look and when the highlight goes away.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HighlighterOptions {
    /// Marker class; the transition class is `<class_name>--transition`.
    pub class_name: String,
    pub clear_on_click: bool,
    /// Clearing a comment also clears all of its replies.
    pub include_children: bool,
    pub transition_duration_seconds: f64,

    pub background_color: String,
    pub background_color_dark: String,
    pub normal_text_color: String,
    pub normal_text_color_dark: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_text_color_dark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_text_color_dark: Option<String>,

    /// CSS `border` shorthand; `0` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    /// Replaces the generated style sheet entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
}

impl Default for HighlighterOptions {
    fn default() -> Self {
        Self {
            class_name: "chr-new-comment".into(),
            clear_on_click: true,
            include_children: false,
            transition_duration_seconds: 0.5,
            background_color: "#fffdcc".into(),
            background_color_dark: "#424242".into(),
            normal_text_color: "#000000".into(),
            normal_text_color_dark: "#dddddd".into(),
            link_text_color: None,
            link_text_color_dark: None,
            quote_text_color: None,
            quote_text_color_dark: None,
            border: None,
            custom_css: None,
        }
    }
}

impl HighlighterOptions {
    /// Parse and validate options from TOML. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, OptionsError> {
        let options: Self = toml::from_str(input)?;
        options.validate()?;
        Ok(options)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let options = Self::from_toml_str(&input)?;
        log::debug!("loaded highlighter options from {}", path.display());
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        let valid_class = !self.class_name.is_empty()
            && !self.class_name.starts_with(|c: char| c.is_ascii_digit())
            && self
                .class_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_class {
            return Err(OptionsError::InvalidClassName(self.class_name.clone()));
        }
        let seconds = self.transition_duration_seconds;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(OptionsError::InvalidTransitionDuration(seconds));
        }
        let delay = Duration::try_from_secs_f64(seconds)
            .ok()
            .and_then(|transition| transition.checked_add(TRANSITION_PAD));
        if delay.is_none() {
            return Err(OptionsError::TransitionDurationTooLong(seconds));
        }
        Ok(())
    }

    pub fn transition_class(&self) -> String {
        format!("{}--transition", self.class_name)
    }

    /// Time between clearing the marker and removing the transition class.
    ///
    /// Options that pass [`HighlighterOptions::validate`] always yield the
    /// configured duration plus the pad.
    pub fn transition_delay(&self) -> Duration {
        let seconds = self.transition_duration_seconds;
        match Duration::try_from_secs_f64(seconds) {
            Ok(transition) => transition.saturating_add(TRANSITION_PAD),
            Err(err) => {
                log::warn!("transition duration {seconds}s unusable ({err}), removing after the pad only");
                TRANSITION_PAD
            }
        }
    }

    pub(crate) fn border_or_default(&self) -> &str {
        self.border.as_deref().unwrap_or("0")
    }
}

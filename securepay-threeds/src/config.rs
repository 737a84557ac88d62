//! Challenge session configuration.
//!
//! Colors are hex strings (`#RRGGBB`); the vendor SDK parses them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default toolbar title of the challenge screen.
pub const DEFAULT_HEADER_TEXT: &str = "Authentication";

/// Default title of the toolbar button that cancels the challenge.
pub const DEFAULT_CANCEL_TEXT: &str = "Cancel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentEnvironment {
    Production,
    Staging,
}

/// Interfaces the challenge may be rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiType {
    Native,
    Html,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderType {
    Otp,
    Html,
    Oob,
    SingleSelect,
    MultiSelect,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub name: Option<String>,
    pub size: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolbarCustomization {
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    pub text_font: Option<Font>,
    pub header_text: Option<String>,
    pub button_text: Option<String>,
}

impl ToolbarCustomization {
    pub fn header_text_or_default(&self) -> &str {
        self.header_text.as_deref().unwrap_or(DEFAULT_HEADER_TEXT)
    }

    pub fn button_text_or_default(&self) -> &str {
        self.button_text.as_deref().unwrap_or(DEFAULT_CANCEL_TEXT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelCustomization {
    pub text_color: Option<String>,
    pub text_font: Option<Font>,
    pub heading_text_color: Option<String>,
    pub heading_text_font: Option<Font>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonCustomization {
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    pub text_font: Option<Font>,
    pub corner_radius: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBoxCustomization {
    pub text_color: Option<String>,
    pub border_color: Option<String>,
    pub text_font: Option<Font>,
    pub corner_radius: f32,
    pub border_width: f32,
}

/// Appearance of the challenge screens for one color scheme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiCustomization {
    pub toolbar: Option<ToolbarCustomization>,
    pub label: Option<LabelCustomization>,
    pub verify_button: Option<ButtonCustomization>,
    pub continue_button: Option<ButtonCustomization>,
    pub resend_button: Option<ButtonCustomization>,
    /// Derived from the toolbar: the cancel button sits on it
    pub cancel_button: Option<ButtonCustomization>,
    pub text_box: Option<TextBoxCustomization>,
}

impl UiCustomization {
    /// Fill in what the vendor needs but the caller left unset.
    ///
    /// A present toolbar gets its default texts, and its text color is carried
    /// over to the cancel button.
    pub fn resolved(&self) -> Self {
        let mut resolved = self.clone();
        if let Some(toolbar) = resolved.toolbar.as_mut() {
            toolbar
                .header_text
                .get_or_insert_with(|| DEFAULT_HEADER_TEXT.to_string());
            toolbar
                .button_text
                .get_or_insert_with(|| DEFAULT_CANCEL_TEXT.to_string());
            if resolved.cancel_button.is_none() {
                resolved.cancel_button = Some(ButtonCustomization {
                    text_color: toolbar.text_color.clone(),
                    ..Default::default()
                });
            }
        }
        resolved
    }
}

/// Configuration handed to the vendor SDK.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeConfig {
    pub deployment: DeploymentEnvironment,
    pub request_timeout: Duration,
    /// In minutes, as the vendor expects
    pub challenge_timeout: u32,
    pub ui_type: UiType,
    pub render_types: Vec<RenderType>,
    pub ui_customization: Option<UiCustomization>,
    pub dark_ui_customization: Option<UiCustomization>,
}

impl ChallengeConfig {
    pub fn new(is_live: bool) -> Self {
        Self {
            deployment: if is_live {
                DeploymentEnvironment::Production
            } else {
                DeploymentEnvironment::Staging
            },
            request_timeout: Duration::from_millis(8000),
            challenge_timeout: 8,
            ui_type: UiType::Both,
            render_types: vec![
                RenderType::Otp,
                RenderType::Html,
                RenderType::Oob,
                RenderType::SingleSelect,
                RenderType::MultiSelect,
            ],
            ui_customization: None,
            dark_ui_customization: None,
        }
    }

    pub fn with_ui_customization(mut self, customization: UiCustomization) -> Self {
        self.ui_customization = Some(customization);
        self
    }

    pub fn with_dark_ui_customization(mut self, customization: UiCustomization) -> Self {
        self.dark_ui_customization = Some(customization);
        self
    }

    /// The configuration with both customizations resolved.
    pub fn resolved(&self) -> Self {
        Self {
            ui_customization: self.ui_customization.as_ref().map(UiCustomization::resolved),
            dark_ui_customization: self
                .dark_ui_customization
                .as_ref()
                .map(UiCustomization::resolved),
            ..self.clone()
        }
    }

    /// Toolbar used by the web challenge, light scheme first.
    pub fn toolbar(&self) -> ToolbarCustomization {
        self.ui_customization
            .as_ref()
            .or(self.dark_ui_customization.as_ref())
            .and_then(|ui| ui.toolbar.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let live = ChallengeConfig::new(true);
        assert_eq!(live.deployment, DeploymentEnvironment::Production);
        assert_eq!(live.request_timeout, Duration::from_millis(8000));
        assert_eq!(live.challenge_timeout, 8);
        assert_eq!(live.ui_type, UiType::Both);
        assert_eq!(live.render_types.len(), 5);

        assert_eq!(
            ChallengeConfig::new(false).deployment,
            DeploymentEnvironment::Staging
        );
    }

    #[test]
    fn test_toolbar_defaults_apply_when_unset() {
        let ui = UiCustomization {
            toolbar: Some(ToolbarCustomization {
                text_color: Some("#FFFFFF".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let resolved = ui.resolved();
        let toolbar = resolved.toolbar.unwrap();
        assert_eq!(toolbar.header_text.as_deref(), Some("Authentication"));
        assert_eq!(toolbar.button_text.as_deref(), Some("Cancel"));
        assert_eq!(
            resolved.cancel_button.and_then(|b| b.text_color).as_deref(),
            Some("#FFFFFF")
        );
    }

    #[test]
    fn test_caller_texts_are_kept() {
        let ui = UiCustomization {
            toolbar: Some(ToolbarCustomization {
                header_text: Some("Verify".to_string()),
                button_text: Some("Back".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = ChallengeConfig::new(false).with_ui_customization(ui).resolved();

        let toolbar = config.toolbar();
        assert_eq!(toolbar.header_text_or_default(), "Verify");
        assert_eq!(toolbar.button_text_or_default(), "Back");
    }

    #[test]
    fn test_missing_toolbar_is_left_alone() {
        let resolved = UiCustomization::default().resolved();
        assert_eq!(resolved, UiCustomization::default());
        assert_eq!(
            ChallengeConfig::new(true).toolbar().header_text_or_default(),
            DEFAULT_HEADER_TEXT
        );
    }

    #[test]
    fn test_customization_from_json() {
        let ui: UiCustomization = serde_json::from_str(
            r##"{"toolbar": {"background_color": "#000000"}, "verify_button": {"corner_radius": 4.0}}"##,
        )
        .unwrap();
        assert_eq!(ui.verify_button.map(|b| b.corner_radius), Some(4.0));
        assert!(ui.label.is_none());
    }
}

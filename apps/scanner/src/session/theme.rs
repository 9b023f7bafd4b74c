use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }
}

/// Startup theme preference from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemePreference {
    Light,
    Dark,
    /// Follow the host environment.
    #[default]
    System,
}

impl FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "system" | "" => Ok(ThemePreference::System),
            other => Err(format!("unknown theme '{other}' (expected light, dark, or system)")),
        }
    }
}

impl ThemePreference {
    /// Resolves the preference once at startup.
    ///
    /// `System` reads the `COLORFGBG` hint ("fg;bg"): a background color index
    /// of 0-6 or 8 is a dark palette. No hint means light.
    pub fn resolve(self, colorfgbg: Option<&str>) -> Theme {
        match self {
            ThemePreference::Light => Theme::Light,
            ThemePreference::Dark => Theme::Dark,
            ThemePreference::System => {
                let background = colorfgbg
                    .and_then(|v| v.rsplit(';').next())
                    .and_then(|bg| bg.trim().parse::<u8>().ok());
                match background {
                    Some(0..=6) | Some(8) => Theme::Dark,
                    _ => Theme::Light,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Theme::Dark).unwrap(), "dark");
        assert_eq!(serde_json::to_value(Theme::Light).unwrap(), "light");
    }

    #[test]
    fn test_toggle_flips_both_ways() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn test_preference_parses_case_insensitively() {
        assert_eq!("DARK".parse::<ThemePreference>(), Ok(ThemePreference::Dark));
        assert_eq!(" light ".parse::<ThemePreference>(), Ok(ThemePreference::Light));
        assert_eq!("system".parse::<ThemePreference>(), Ok(ThemePreference::System));
        assert!("purple".parse::<ThemePreference>().is_err());
    }

    #[test]
    fn test_explicit_preference_ignores_host_hint() {
        assert_eq!(ThemePreference::Light.resolve(Some("15;0")), Theme::Light);
        assert_eq!(ThemePreference::Dark.resolve(None), Theme::Dark);
    }

    #[test]
    fn test_system_preference_reads_colorfgbg() {
        assert_eq!(ThemePreference::System.resolve(Some("15;0")), Theme::Dark);
        assert_eq!(ThemePreference::System.resolve(Some("0;15")), Theme::Light);
        assert_eq!(ThemePreference::System.resolve(Some("15;default;8")), Theme::Dark);
    }

    #[test]
    fn test_system_preference_defaults_to_light() {
        assert_eq!(ThemePreference::System.resolve(None), Theme::Light);
        assert_eq!(ThemePreference::System.resolve(Some("garbage")), Theme::Light);
    }
}

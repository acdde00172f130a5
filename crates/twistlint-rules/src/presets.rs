//! Checker presets for common configurations.

use twistlint_core::{CheckerBox, Config, ConfigError};

use crate::{
    comments, docstring, formatting, header, names, python3, spacing, test_class_name, Comments,
    DocstringChecker, FormattingOperation, Header, Names, Python3, Spacing, TestClassName,
};

/// Preset configurations for twistlint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// The Twisted coding standard.
    #[default]
    Standard,
    /// The standard plus physical-line hygiene messages.
    Pep8,
    /// Header, formatting and Python 3 checks only, for gradual adoption.
    Minimal,
}

impl Preset {
    /// Names of the checkers this preset registers.
    #[must_use]
    pub fn checker_names(self) -> &'static [&'static str] {
        match self {
            Self::Standard | Self::Pep8 => ALL_CHECKERS,
            Self::Minimal => &[header::NAME, formatting::NAME, python3::NAME],
        }
    }

    /// Default-off messages this preset turns on.
    #[must_use]
    pub fn enabled_messages(self) -> &'static [&'static str] {
        match self {
            Self::Pep8 => &[
                spacing::TRAILING_WHITESPACE,
                spacing::BLANK_LINE_WHITESPACE,
                spacing::BLANK_AT_EOF,
                spacing::NO_NEWLINE_AT_EOF,
            ],
            Self::Standard | Self::Minimal => &[],
        }
    }

    /// Checkers of this preset with default settings.
    #[must_use]
    pub fn checkers(self) -> Vec<CheckerBox> {
        self.checker_names()
            .iter()
            .filter_map(|name| default_checker(name))
            .collect()
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "pep8" => Ok(Self::Pep8),
            "minimal" => Ok(Self::Minimal),
            _ => Err(format!("Unknown preset: {s}")),
        }
    }
}

const ALL_CHECKERS: &[&str] = &[
    header::NAME,
    spacing::NAME,
    docstring::NAME,
    names::NAME,
    comments::NAME,
    formatting::NAME,
    python3::NAME,
    test_class_name::NAME,
];

fn default_checker(name: &str) -> Option<CheckerBox> {
    let checker: CheckerBox = match name {
        header::NAME => Box::new(Header::new()),
        spacing::NAME => Box::new(Spacing::new()),
        docstring::NAME => Box::new(DocstringChecker::new()),
        names::NAME => Box::new(Names::new()),
        comments::NAME => Box::new(Comments::new()),
        formatting::NAME => Box::new(FormattingOperation::new()),
        python3::NAME => Box::new(Python3::new()),
        test_class_name::NAME => Box::new(TestClassName::new()),
        _ => return None,
    };
    Some(checker)
}

/// Returns every available checker with default settings.
#[must_use]
pub fn all_checkers() -> Vec<CheckerBox> {
    Preset::Standard.checkers()
}

/// Builds the checkers selected by a configuration.
///
/// The preset picks the checkers, and each checker reads its own
/// `[rules.<name>]` section. Disabled checkers are left to the analyzer.
///
/// # Errors
///
/// Returns an error for an unknown preset or an invalid checker option.
pub fn checkers_from_config(config: &Config) -> Result<Vec<CheckerBox>, ConfigError> {
    let preset = preset_of(config)?;
    checkers_by_name(preset.checker_names().iter().copied(), config)
}

/// The configured preset, defaulting to [`Preset::Standard`].
///
/// # Errors
///
/// Returns an error for an unknown preset name.
pub fn preset_of(config: &Config) -> Result<Preset, ConfigError> {
    config
        .preset
        .as_deref()
        .map_or(Ok(Preset::Standard), |s| {
            s.parse().map_err(|message| ConfigError::Parse { message })
        })
}

/// Builds the named checkers, each reading its `[rules.<name>]` section.
///
/// # Errors
///
/// Returns an error for an unknown checker name or an invalid option.
pub fn checkers_by_name<'a>(
    names: impl IntoIterator<Item = &'a str>,
    config: &Config,
) -> Result<Vec<CheckerBox>, ConfigError> {
    names
        .into_iter()
        .map(|name| configured_checker(name, config))
        .collect()
}

fn configured_checker(name: &str, config: &Config) -> Result<CheckerBox, ConfigError> {
    let section = config.rule(name);
    let checker: CheckerBox = match name {
        header::NAME => Box::new(Header::from_config(&section)?),
        spacing::NAME => Box::new(Spacing::from_config(&section)),
        docstring::NAME => Box::new(DocstringChecker::from_config(&section)?),
        names::NAME => Box::new(Names::new()),
        comments::NAME => Box::new(Comments::new()),
        formatting::NAME => Box::new(FormattingOperation::new()),
        python3::NAME => Box::new(Python3::new()),
        test_class_name::NAME => Box::new(TestClassName::new()),
        other => {
            return Err(ConfigError::Parse {
                message: format!("Unknown checker: {other}"),
            })
        }
    };
    Ok(checker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_checkers() {
        assert_eq!(Preset::Standard.checkers().len(), 8);
        assert_eq!(Preset::Pep8.checkers().len(), 8);
        assert_eq!(Preset::Minimal.checkers().len(), 3);
        assert!(Preset::Standard.enabled_messages().is_empty());
        assert_eq!(Preset::Pep8.enabled_messages().len(), 4);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("PEP8".parse::<Preset>(), Ok(Preset::Pep8));
        assert!("strict".parse::<Preset>().is_err());
    }

    #[test]
    fn test_checkers_from_config() {
        let config = Config::parse("preset = \"minimal\"\n").unwrap();
        let names: Vec<_> = checkers_from_config(&config)
            .unwrap()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, vec!["header", "formatting", "python3"]);

        let bad = Config::parse("[rules.docstring]\nno_docstring_rgx = \"(\"\n").unwrap();
        assert!(matches!(
            checkers_from_config(&bad),
            Err(ConfigError::InvalidPattern { .. })
        ));

        let unknown = Config::parse("preset = \"everything\"\n").unwrap();
        assert!(checkers_from_config(&unknown).is_err());
    }

    #[test]
    fn test_checkers_by_name() {
        let config = Config::new();
        let checkers = checkers_by_name(["python3", "docstring"], &config).unwrap();
        assert_eq!(checkers.len(), 2);
        assert!(checkers_by_name(["pylint"], &config).is_err());
    }

    #[test]
    fn test_message_codes_are_unique() {
        assert!(twistlint_core::build_catalog(&all_checkers()).is_ok());
    }
}

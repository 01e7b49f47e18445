//! Artifact coordinates and repository layout

use std::fmt;

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Latest,
    Release,
    Fixed(String),
}

impl VersionSpec {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            v if v.eq_ignore_ascii_case("latest") => VersionSpec::Latest,
            v if v.eq_ignore_ascii_case("release") => VersionSpec::Release,
            v => VersionSpec::Fixed(v.to_string()),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Latest => f.write_str("latest"),
            VersionSpec::Release => f.write_str("release"),
            VersionSpec::Fixed(v) => f.write_str(v),
        }
    }
}

pub fn is_snapshot(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX)
}

/// `group:artifact` plus the packaging details shared by every version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl Coordinates {
    pub fn new(group_id: &str, artifact_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            classifier: None,
            extension: "jar".to_string(),
        }
    }

    pub fn with_classifier(mut self, classifier: Option<String>) -> Self {
        self.classifier = classifier.filter(|c| !c.is_empty());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// `org/apache/commons/commons-lang3`
    pub fn artifact_path(&self) -> String {
        format!("{}/{}", self.group_id.replace('.', "/"), self.artifact_id)
    }

    pub fn version_path(&self, version: &str) -> String {
        format!("{}/{}", self.artifact_path(), version)
    }

    /// `<artifact>-<version>[-<classifier>].<extension>`
    ///
    /// For snapshots `file_version` is the timestamped version.
    pub fn file_name(&self, file_version: &str) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, file_version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact_id, file_version, self.extension),
        }
    }

    pub fn file_path(&self, version: &str, file_version: &str) -> String {
        format!("{}/{}", self.version_path(version), self.file_name(file_version))
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        write!(f, ":{}", self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_spec() {
        assert_eq!(VersionSpec::parse("LATEST"), VersionSpec::Latest);
        assert_eq!(VersionSpec::parse("release"), VersionSpec::Release);
        assert_eq!(VersionSpec::parse("3.12.0"), VersionSpec::Fixed("3.12.0".into()));
    }

    #[test]
    fn test_layout() {
        let coords = Coordinates::new("org.apache.commons", "commons-lang3");
        assert_eq!(
            coords.file_path("3.12.0", "3.12.0"),
            "org/apache/commons/commons-lang3/3.12.0/commons-lang3-3.12.0.jar"
        );

        let sources = coords
            .with_classifier(Some("sources".into()))
            .with_extension("zip");
        assert_eq!(sources.file_name("1.0"), "commons-lang3-1.0-sources.zip");
        assert_eq!(sources.to_string(), "org.apache.commons:commons-lang3:sources:zip");
    }

    #[test]
    fn test_empty_classifier_is_none() {
        let coords = Coordinates::new("g", "a").with_classifier(Some(String::new()));
        assert_eq!(coords.classifier, None);
    }

    #[test]
    fn test_is_snapshot() {
        assert!(is_snapshot("1.0-SNAPSHOT"));
        assert!(!is_snapshot("1.0"));
    }
}

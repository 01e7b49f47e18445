//! `maven-metadata.xml`

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub versioning: Versioning,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub versions: Versions,
    #[serde(default)]
    pub snapshot: Option<Snapshot>,
    #[serde(default)]
    pub snapshot_versions: SnapshotVersions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Versions {
    #[serde(default)]
    pub version: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub build_number: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotVersions {
    #[serde(default)]
    pub snapshot_version: Vec<SnapshotVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotVersion {
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    pub value: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Metadata {
    pub fn parse(xml: &str) -> Result<Self, quick_xml::de::DeError> {
        quick_xml::de::from_str(xml)
    }

    /// `<latest>`, falling back to the last listed version
    pub fn latest_version(&self) -> Option<String> {
        non_empty(&self.versioning.latest)
            .map(String::from)
            .or_else(|| self.last_listed())
    }

    /// `<release>`, falling back to the last listed version
    pub fn release_version(&self) -> Option<String> {
        non_empty(&self.versioning.release)
            .map(String::from)
            .or_else(|| self.last_listed())
    }

    fn last_listed(&self) -> Option<String> {
        self.versioning
            .versions
            .version
            .iter()
            .rev()
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(String::from)
    }

    /// Timestamped file version of a SNAPSHOT build.
    ///
    /// Prefers the matching `<snapshotVersion>`, then
    /// `<base>-<timestamp>-<buildNumber>`.
    pub fn snapshot_file_version(
        &self,
        version: &str,
        classifier: Option<&str>,
        extension: &str,
    ) -> Option<String> {
        let matching = self
            .versioning
            .snapshot_versions
            .snapshot_version
            .iter()
            .find(|sv| {
                non_empty(&sv.classifier) == classifier
                    && non_empty(&sv.extension).unwrap_or("jar") == extension
            });
        if let Some(sv) = matching {
            return Some(sv.value.trim().to_string());
        }

        let snapshot = self.versioning.snapshot.as_ref()?;
        let timestamp = non_empty(&snapshot.timestamp)?;
        let build_number = snapshot.build_number?;
        let base = version.strip_suffix("-SNAPSHOT").unwrap_or(version);
        Some(format!("{}-{}-{}", base, timestamp, build_number))
    }
}

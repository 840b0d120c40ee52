//! Channel routing: version identifier to publish target

use crate::core::error::PipelineError;
use crate::core::secret::Secret;
use crate::release::Version;
use serde::Serialize;
use std::fmt;

/// Release channel; exactly two exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  /// Pre-release versions (carry a recognized marker)
  Snapshot,
  /// Stable versions, sent to release staging
  Release,
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Channel::Snapshot => write!(f, "snapshot"),
      Channel::Release => write!(f, "release"),
    }
  }
}

/// A configured repository endpoint and the credentials found for it
#[derive(Debug, Clone)]
pub struct Endpoint {
  pub url: String,
  pub username_env: String,
  pub password_env: String,
  pub username: Option<Secret>,
  pub password: Option<Secret>,
}

#[derive(Debug, Clone)]
pub struct RepositoryCredentials {
  pub username: Secret,
  pub password: Secret,
}

/// Where a release goes, with the authentication to get it there
#[derive(Debug, Clone)]
pub struct PublishTarget {
  pub channel: Channel,
  pub url: String,
  pub credentials: RepositoryCredentials,
}

/// Maps version identifiers onto one of the two endpoints
#[derive(Debug, Clone)]
pub struct ChannelRouter {
  markers: Vec<String>,
  snapshot: Endpoint,
  release: Endpoint,
}

impl ChannelRouter {
  pub fn new(markers: Vec<String>, snapshot: Endpoint, release: Endpoint) -> Self {
    Self {
      markers,
      snapshot,
      release,
    }
  }

  /// Pre-release iff the version ends with a marker (case-sensitive)
  pub fn classify(&self, version: &Version) -> Channel {
    if self.markers.iter().any(|m| version.as_str().ends_with(m.as_str())) {
      Channel::Snapshot
    } else {
      Channel::Release
    }
  }

  pub fn endpoint(&self, channel: Channel) -> &Endpoint {
    match channel {
      Channel::Snapshot => &self.snapshot,
      Channel::Release => &self.release,
    }
  }

  /// Select the target and attach its credentials
  ///
  /// Pure: nothing is contacted. Missing credentials for the selected channel
  /// fail here, whatever the other channel has.
  pub fn route(&self, version: &Version) -> Result<PublishTarget, PipelineError> {
    let channel = self.classify(version);
    let endpoint = self.endpoint(channel);

    match (&endpoint.username, &endpoint.password) {
      (Some(username), Some(password)) => Ok(PublishTarget {
        channel,
        url: endpoint.url.clone(),
        credentials: RepositoryCredentials {
          username: username.clone(),
          password: password.clone(),
        },
      }),
      (username, password) => {
        let mut missing = Vec::new();
        if username.is_none() {
          missing.push(endpoint.username_env.clone());
        }
        if password.is_none() {
          missing.push(endpoint.password_env.clone());
        }
        Err(PipelineError::MissingRepositoryCredentials {
          channel: channel.to_string(),
          missing,
        })
      }
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub(crate) fn endpoint(url: &str, prefix: &str, with_credentials: bool) -> Endpoint {
    Endpoint {
      url: url.to_string(),
      username_env: format!("{}_USERNAME", prefix),
      password_env: format!("{}_PASSWORD", prefix),
      username: with_credentials.then(|| Secret::new("deployer")),
      password: with_credentials.then(|| Secret::new("hunter2")),
    }
  }

  pub(crate) fn router(snapshot_url: &str, release_url: &str, snapshot_creds: bool, release_creds: bool) -> ChannelRouter {
    ChannelRouter::new(
      vec!["-SNAPSHOT".to_string()],
      endpoint(snapshot_url, "SNAPSHOT", snapshot_creds),
      endpoint(release_url, "RELEASE", release_creds),
    )
  }

  fn v(s: &str) -> Version {
    Version::new(s).unwrap()
  }

  #[test]
  fn test_snapshot_marker_routes_to_snapshot_endpoint() {
    let router = router("https://snap", "https://stage", true, true);
    let target = router.route(&v("2.1.0-SNAPSHOT")).unwrap();
    assert_eq!(target.channel, Channel::Snapshot);
    assert_eq!(target.url, "https://snap");
  }

  #[test]
  fn test_stable_version_routes_to_release_staging() {
    let router = router("https://snap", "https://stage", true, true);
    let target = router.route(&v("2.1.0")).unwrap();
    assert_eq!(target.channel, Channel::Release);
    assert_eq!(target.url, "https://stage");
  }

  #[test]
  fn test_marker_must_be_trailing_and_case_sensitive() {
    let router = router("https://snap", "https://stage", true, true);
    assert_eq!(router.classify(&v("2.1.0-SNAPSHOT.1")), Channel::Release);
    assert_eq!(router.classify(&v("2.1.0-snapshot")), Channel::Release);
    assert_eq!(router.classify(&v("1.0-SNAPSHOT")), Channel::Snapshot);
  }

  #[test]
  fn test_every_version_lands_on_exactly_one_channel() {
    let router = router("https://snap", "https://stage", true, true);
    for raw in ["0.1.0", "2.1.0-SNAPSHOT", "2.1.0-rc.1", "SNAPSHOT", "-SNAPSHOT"] {
      let version = v(raw);
      let expected = if raw.ends_with("-SNAPSHOT") { Channel::Snapshot } else { Channel::Release };
      assert_eq!(router.classify(&version), expected, "{}", raw);
    }
  }

  #[test]
  fn test_missing_credentials_for_selected_channel_only() {
    let router = router("https://snap", "https://stage", true, false);
    assert!(router.route(&v("2.1.0-SNAPSHOT")).is_ok());

    match router.route(&v("2.1.0")) {
      Err(PipelineError::MissingRepositoryCredentials { channel, missing }) => {
        assert_eq!(channel, "release");
        assert_eq!(missing, vec!["RELEASE_USERNAME", "RELEASE_PASSWORD"]);
      }
      other => panic!("expected MissingRepositoryCredentials, got {:?}", other),
    }
  }

  #[test]
  fn test_target_debug_redacts_password() {
    let router = router("https://snap", "https://stage", true, true);
    let debug = format!("{:?}", router.route(&v("2.1.0")).unwrap());
    assert!(!debug.contains("hunter2"));
  }
}

//! Session configuration: phase durations and optional roles.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

const NIGHT_STEP_SECS: (u64, u64) = (10, 120);
const DISCUSSION_SECS: (u64, u64) = (10, 300);
const VOTE_SECS: (u64, u64) = (10, 120);
const RESULT_PAUSE_SECS: (u64, u64) = (3, 30);

/// Which optional unique roles take part in the deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledRoles {
    /// Deal a seer.
    pub seer: bool,
    /// Deal a witch.
    pub witch: bool,
    /// Deal a cupid.
    pub cupid: bool,
}

impl Default for EnabledRoles {
    fn default() -> Self {
        Self {
            seer: true,
            witch: true,
            cupid: true,
        }
    }
}

/// Timings and role switches for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Window for each role's night step.
    pub night_step: Duration,
    /// Length of the day discussion.
    pub discussion: Duration,
    /// Length of the vote window.
    pub vote: Duration,
    /// Pause after a vote result.
    pub result_pause: Duration,
    /// Optional unique roles.
    pub roles: EnabledRoles,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            night_step: Duration::from_secs(22),
            discussion: Duration::from_secs(15),
            vote: Duration::from_secs(25),
            result_pause: Duration::from_secs(5),
            roles: EnabledRoles::default(),
        }
    }
}

/// Role switches as sent by a client. A missing switch means "enabled".
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RolesPatch {
    /// Deal a seer.
    #[serde(default = "enabled")]
    pub seer: bool,
    /// Deal a witch.
    #[serde(default = "enabled")]
    pub witch: bool,
    /// Deal a cupid.
    #[serde(default = "enabled")]
    pub cupid: bool,
}

fn enabled() -> bool {
    true
}

/// Reads a duration in seconds from a JSON number or a numeric string.
/// Fractions are truncated; anything else leaves the setting unchanged.
#[allow(clippy::cast_possible_truncation)]
fn lenient_secs<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    let secs = match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    };
    Ok(secs)
}

/// Partial configuration update. Durations are in seconds and get clamped.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurePatch {
    /// Night step window.
    #[serde(default, deserialize_with = "lenient_secs")]
    pub night_action: Option<i64>,
    /// Day discussion length.
    #[serde(default, deserialize_with = "lenient_secs")]
    pub day_discuss: Option<i64>,
    /// Vote window.
    #[serde(default, deserialize_with = "lenient_secs")]
    pub vote_time: Option<i64>,
    /// Pause after a vote result.
    #[serde(default, deserialize_with = "lenient_secs")]
    pub result_time: Option<i64>,
    /// Optional role switches; replaces all three when present.
    pub roles: Option<RolesPatch>,
}

fn clamp_secs(value: i64, (min, max): (u64, u64)) -> Duration {
    let secs = u64::try_from(value).unwrap_or(0).clamp(min, max);
    Duration::from_secs(secs)
}

impl SessionConfig {
    /// Applies a partial update, clamping each duration into its safe range.
    pub fn apply(&mut self, patch: &ConfigurePatch) {
        if let Some(secs) = patch.night_action {
            self.night_step = clamp_secs(secs, NIGHT_STEP_SECS);
        }
        if let Some(secs) = patch.day_discuss {
            self.discussion = clamp_secs(secs, DISCUSSION_SECS);
        }
        if let Some(secs) = patch.vote_time {
            self.vote = clamp_secs(secs, VOTE_SECS);
        }
        if let Some(secs) = patch.result_time {
            self.result_pause = clamp_secs(secs, RESULT_PAUSE_SECS);
        }
        if let Some(roles) = patch.roles {
            self.roles = EnabledRoles {
                seer: roles.seer,
                witch: roles.witch,
                cupid: roles.cupid,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_clamps_durations_into_range() {
        let mut config = SessionConfig::default();
        let patch: ConfigurePatch = serde_json::from_value(serde_json::json!({
            "nightAction": 500,
            "dayDiscuss": 1,
            "voteTime": 60,
            "resultTime": -4
        }))
        .unwrap();

        config.apply(&patch);

        assert_eq!(config.night_step, Duration::from_secs(120));
        assert_eq!(config.discussion, Duration::from_secs(10));
        assert_eq!(config.vote, Duration::from_secs(60));
        assert_eq!(config.result_pause, Duration::from_secs(3));
    }

    #[test]
    fn test_apply_leaves_missing_fields_untouched() {
        let mut config = SessionConfig::default();

        config.apply(&ConfigurePatch {
            vote_time: Some(40),
            ..ConfigurePatch::default()
        });

        assert_eq!(config.vote, Duration::from_secs(40));
        assert_eq!(config.night_step, Duration::from_secs(22));
        assert_eq!(config.roles, EnabledRoles::default());
    }

    #[test]
    fn test_roles_patch_defaults_missing_switches_to_enabled() {
        let mut config = SessionConfig::default();
        let patch: ConfigurePatch =
            serde_json::from_value(serde_json::json!({ "roles": { "witch": false } })).unwrap();

        config.apply(&patch);

        assert!(config.roles.seer);
        assert!(!config.roles.witch);
        assert!(config.roles.cupid);
    }

    #[test]
    fn test_durations_accept_numeric_strings_and_fractions() {
        let mut config = SessionConfig::default();
        let patch: ConfigurePatch = serde_json::from_value(serde_json::json!({
            "voteTime": "30",
            "dayDiscuss": 45.9,
            "resultTime": " 7 "
        }))
        .unwrap();

        config.apply(&patch);

        assert_eq!(config.vote, Duration::from_secs(30));
        assert_eq!(config.discussion, Duration::from_secs(45));
        assert_eq!(config.result_pause, Duration::from_secs(7));
    }

    #[test]
    fn test_unreadable_duration_leaves_setting_unchanged() {
        let mut config = SessionConfig::default();
        let patch: ConfigurePatch = serde_json::from_value(serde_json::json!({
            "nightAction": "soon",
            "voteTime": null
        }))
        .unwrap();

        config.apply(&patch);

        assert_eq!(config.night_step, Duration::from_secs(22));
        assert_eq!(config.vote, Duration::from_secs(25));
    }
}

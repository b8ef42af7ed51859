//! Risk heuristic: decide between auto-approval and manual review.
//!
//! Runs only after the issued code was found in the profile bio. Young
//! accounts on either side are escalated to moderators.

use biogate_types::{EngineParams, Timestamp};
use serde::Serialize;
use std::fmt;

/// One violated age threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "account", rename_all = "snake_case")]
pub enum RiskFlag {
    YoungPlatformAccount { age_days: u64, threshold_days: u64 },
    YoungExternalAccount { age_days: u64, threshold_days: u64 },
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YoungPlatformAccount {
                age_days,
                threshold_days,
            } => write!(
                f,
                "platform account is {age_days} days old (< {threshold_days} days)"
            ),
            Self::YoungExternalAccount {
                age_days,
                threshold_days,
            } => write!(
                f,
                "external account is {age_days} days old (< {threshold_days} days)"
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RiskDecision {
    AutoApprove,
    Escalate { flags: Vec<RiskFlag> },
}

impl RiskDecision {
    /// Flag summary for moderators, e.g. `"platform account is 10 days old (< 365 days)"`.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::AutoApprove => None,
            Self::Escalate { flags } => Some(
                flags
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }
}

/// Account ages, in whole days, of both identities at `now`.
pub fn account_ages(
    platform_created: Timestamp,
    external_created: Timestamp,
    now: Timestamp,
) -> (u64, u64) {
    (
        platform_created.age_in_days(now),
        external_created.age_in_days(now),
    )
}

pub fn assess(
    platform_created: Timestamp,
    external_created: Timestamp,
    now: Timestamp,
    params: &EngineParams,
) -> RiskDecision {
    let (platform_age, external_age) = account_ages(platform_created, external_created, now);
    let mut flags = Vec::new();

    if platform_age < params.min_platform_account_age_days {
        flags.push(RiskFlag::YoungPlatformAccount {
            age_days: platform_age,
            threshold_days: params.min_platform_account_age_days,
        });
    }
    if external_age < params.min_external_account_age_days {
        flags.push(RiskFlag::YoungExternalAccount {
            age_days: external_age,
            threshold_days: params.min_external_account_age_days,
        });
    }

    if flags.is_empty() {
        RiskDecision::AutoApprove
    } else {
        RiskDecision::Escalate { flags }
    }
}

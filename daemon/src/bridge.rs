//! Line-delimited JSON bridge.
//!
//! Stands in for a chat-platform connection: commands arrive one JSON object
//! per line on stdin, and every outcome, notice, marker change, review post
//! and audit event leaves as one JSON object per line on stdout.

use async_trait::async_trait;
use biogate_platform::{Notice, NotifyResult, Platform, PlatformError, ReviewPost};
use biogate_types::{MemberId, MemberInfo, ReviewId};
use biogate_verification::{AuditEvent, Resolution, VerificationOrchestrator};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// One inbound line.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    MemberJoined {
        member: MemberInfo,
    },
    MemberLeft {
        member: MemberId,
    },
    StartSession {
        member: MemberId,
    },
    ForceSession {
        actor: MemberId,
        member: MemberId,
    },
    Submit {
        member: MemberId,
        input: String,
    },
    ResolveReview {
        moderator: MemberId,
        review_id: String,
        decision: Decision,
        #[serde(default)]
        reason: Option<String>,
    },
    /// Startup membership snapshot.
    Snapshot {
        members: Vec<MemberInfo>,
    },
    Stats,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MemberJoined { .. } => "member_joined",
            Self::MemberLeft { .. } => "member_left",
            Self::StartSession { .. } => "start_session",
            Self::ForceSession { .. } => "force_session",
            Self::Submit { .. } => "submit",
            Self::ResolveReview { .. } => "resolve_review",
            Self::Snapshot { .. } => "snapshot",
            Self::Stats => "stats",
        }
    }

    /// The ordering lane this command runs in.
    pub fn lane(&self) -> Lane {
        match self {
            Self::MemberJoined { member } => Lane::Member(member.id.clone()),
            Self::MemberLeft { member }
            | Self::StartSession { member }
            | Self::ForceSession { member, .. }
            | Self::Submit { member, .. } => Lane::Member(member.clone()),
            Self::ResolveReview { .. } => Lane::Moderation,
            Self::Snapshot { .. } | Self::Stats => Lane::Global,
        }
    }
}

/// Commands sharing a lane run one at a time, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Everything that names one member.
    Member(MemberId),
    /// Review resolutions.
    Moderation,
    /// Snapshot and stats.
    Global,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Deny,
}

/// One outbound line.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    Outcome {
        command: &'static str,
        result: serde_json::Value,
    },
    Error {
        command: Option<&'static str>,
        message: String,
    },
    Notice {
        member: MemberId,
        notice: Notice,
    },
    Marker {
        member: MemberId,
        unverified: bool,
    },
    ReviewPost {
        post: ReviewPost,
    },
    Event {
        event: AuditEvent,
    },
    Stats {
        counters: BTreeMap<&'static str, u64>,
        dropped_events: u64,
    },
}

impl Output {
    fn outcome<T: Serialize>(command: &'static str, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(result) => Self::Outcome { command, result },
            Err(e) => Self::error(Some(command), e),
        }
    }

    fn error(command: Option<&'static str>, message: impl ToString) -> Self {
        Self::Error {
            command,
            message: message.to_string(),
        }
    }
}

/// Queue a line for stdout. A closed channel only happens during shutdown.
pub fn send(out: &UnboundedSender<Output>, line: Output) {
    if out.send(line).is_err() {
        debug!("output channel closed, dropping line");
    }
}

/// Serialize queued lines to `writer` until every sender is gone.
pub async fn write_lines<W>(mut rx: UnboundedReceiver<Output>, writer: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        let mut bytes = match serde_json::to_vec(&line) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to serialize output line");
                continue;
            }
        };
        bytes.push(b'\n');
        writer.write_all(&bytes).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// A [`Platform`] whose membership is fed by bridge commands and whose
/// actions are written out as JSON lines.
pub struct StdioPlatform {
    members: Mutex<HashMap<MemberId, MemberInfo>>,
    out: UnboundedSender<Output>,
}

impl StdioPlatform {
    pub fn new(out: UnboundedSender<Output>) -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
            out,
        }
    }

    fn members(&self) -> MutexGuard<'_, HashMap<MemberId, MemberInfo>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn upsert(&self, info: MemberInfo) {
        self.members().insert(info.id.clone(), info);
    }

    pub fn remove(&self, member: &MemberId) -> Option<MemberInfo> {
        self.members().remove(member)
    }

    fn set_marker(&self, member: &MemberId, unverified: bool) -> Result<(), PlatformError> {
        self.members()
            .get_mut(member)
            .ok_or_else(|| PlatformError::MemberNotFound(member.to_string()))?
            .has_unverified_marker = unverified;
        send(
            &self.out,
            Output::Marker {
                member: member.clone(),
                unverified,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl Platform for StdioPlatform {
    async fn member(&self, member: &MemberId) -> Option<MemberInfo> {
        self.members().get(member).cloned()
    }

    async fn add_unverified_marker(&self, member: &MemberId) -> Result<(), PlatformError> {
        self.set_marker(member, true)
    }

    async fn remove_unverified_marker(&self, member: &MemberId) -> Result<(), PlatformError> {
        self.set_marker(member, false)
    }

    async fn notify(&self, member: &MemberId, notice: Notice) -> NotifyResult {
        if !self.members().contains_key(member) {
            return NotifyResult::Failed(PlatformError::MemberNotFound(member.to_string()));
        }
        send(
            &self.out,
            Output::Notice {
                member: member.clone(),
                notice,
            },
        );
        NotifyResult::Delivered
    }

    async fn post_review(&self, post: ReviewPost) -> NotifyResult {
        send(&self.out, Output::ReviewPost { post });
        NotifyResult::Delivered
    }
}

#[derive(Serialize)]
struct SnapshotSummary {
    members: usize,
    verified: usize,
}

/// Run one command against the engine and describe the result.
pub async fn dispatch(
    engine: &Arc<VerificationOrchestrator>,
    platform: &StdioPlatform,
    command: Command,
) -> Output {
    let name = command.name();
    match command {
        Command::MemberJoined { member } => {
            platform.upsert(member.clone());
            Output::outcome(name, &engine.member_joined(member).await)
        }
        Command::MemberLeft { member } => {
            platform.remove(&member);
            Output::outcome(name, &engine.member_left(&member).await)
        }
        Command::StartSession { member } => {
            Output::outcome(name, &engine.start_session(&member).await)
        }
        Command::ForceSession { actor, member } => {
            match engine.force_session(&actor, &member).await {
                Ok(outcome) => Output::outcome(name, &outcome),
                Err(e) => Output::error(Some(name), e),
            }
        }
        Command::Submit { member, input } => {
            Output::outcome(name, &engine.submit_code(&member, &input).await)
        }
        Command::ResolveReview {
            moderator,
            review_id,
            decision,
            reason,
        } => {
            let review_id: ReviewId = match review_id.parse() {
                Ok(id) => id,
                Err(e) => return Output::error(Some(name), e),
            };
            let resolution = match decision {
                Decision::Approve => Resolution::Approve,
                Decision::Deny => Resolution::Deny { reason },
            };
            match engine.resolve_review(&moderator, &review_id, resolution).await {
                Ok(outcome) => Output::outcome(name, &outcome),
                Err(e) => Output::error(Some(name), e),
            }
        }
        Command::Snapshot { members } => {
            for info in &members {
                platform.upsert(info.clone());
            }
            let verified = engine.rebuild_from_snapshot(&members);
            Output::outcome(
                name,
                &SnapshotSummary {
                    members: members.len(),
                    verified,
                },
            )
        }
        Command::Stats => Output::Stats {
            counters: engine.stats(),
            dropped_events: engine.dropped_events(),
        },
    }
}

/// Move pending audit events onto the output stream.
pub fn flush_events(engine: &VerificationOrchestrator, out: &UnboundedSender<Output>) {
    for event in engine.drain_events() {
        send(out, Output::Event { event });
    }
}

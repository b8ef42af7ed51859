//! Verification orchestrator. Ties the session store, expiry timers,
//! throttles, risk engine and review queue together in response to
//! membership events, commands, code submissions and moderator decisions.
//!
//! Every operation on a member runs under that member's lock (see
//! [`MemberLocks`]), so the per-member invariants hold even though the
//! profile fetch suspends. Component state lives behind one short-lived
//! mutex that is never held across an `.await`.

use biogate_platform::{Notice, NotifyResult, Platform, ReviewPost};
use biogate_profile::{ExternalProfile, ProfileFetcher, ProfileUrl};
use biogate_types::{
    Clock, EngineParams, MemberId, MemberInfo, ReviewId, Timestamp, VerificationCode,
};
use biogate_utils::format_hours_minutes;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::VerificationError;
use crate::events::{AuditEvent, EventBuffer, DEFAULT_EVENT_CAPACITY};
use crate::expiry::{delay_until_expiry, ExpiryTimers};
use crate::member_lock::MemberLocks;
use crate::outcomes::{
    ForceOutcome, LeaveOutcome, Resolution, ResolveOutcome, StartOutcome, SubmitOutcome,
};
use crate::review::{NewReviewCase, ReviewCase, ReviewQueue};
use crate::risk::{self, RiskDecision};
use crate::session::{SessionStore, SessionToken, VerificationSession};
use crate::state::FailureCause;
use crate::stats::{Counter, EngineStats};
use crate::throttle::{ThrottleRefusal, ThrottleTracker};

const PUNISHMENT_REASON: &str = "verification code not found in profile bio";

/// Everything the engine owns, guarded together.
struct EngineState {
    sessions: SessionStore,
    timers: ExpiryTimers,
    throttle: ThrottleTracker,
    reviews: ReviewQueue,
    /// Cache of members known to be verified. The platform's marker is authoritative.
    verified: HashSet<MemberId>,
    join_times: HashMap<MemberId, Timestamp>,
    events: EventBuffer,
}

impl EngineState {
    fn record(&mut self, event: AuditEvent) {
        info!(
            target: "biogate::audit",
            kind = event.kind(),
            member = %event.member(),
            detail = ?event,
            "state transition"
        );
        self.events.push(event);
    }

    /// Remove the session `token` names and stop its timer.
    fn close_session(&mut self, member: &MemberId, token: SessionToken) -> Option<VerificationSession> {
        let closed = self.sessions.delete_if_current(member, token);
        if closed.is_some() {
            self.timers.cancel(member);
        }
        closed
    }
}

/// The verification engine façade.
pub struct VerificationOrchestrator {
    params: EngineParams,
    platform: Arc<dyn Platform>,
    fetcher: Arc<dyn ProfileFetcher>,
    clock: Arc<dyn Clock>,
    state: Mutex<EngineState>,
    locks: MemberLocks,
    stats: EngineStats,
}

impl VerificationOrchestrator {
    pub fn new(
        params: EngineParams,
        platform: Arc<dyn Platform>,
        fetcher: Arc<dyn ProfileFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let state = EngineState {
            sessions: SessionStore::new(),
            timers: ExpiryTimers::new(),
            throttle: ThrottleTracker::new(),
            reviews: ReviewQueue::new(params.review_id_bytes),
            verified: HashSet::new(),
            join_times: HashMap::new(),
            events: EventBuffer::new(DEFAULT_EVENT_CAPACITY),
        };
        Arc::new(Self {
            params,
            platform,
            fetcher,
            clock,
            state: Mutex::new(state),
            locks: MemberLocks::new(),
            stats: EngineStats::new(),
        })
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    // ── Membership ──────────────────────────────────────────────────────

    /// Populate the verified cache and join times from a platform snapshot.
    /// Returns the number of members cached as verified.
    pub fn rebuild_from_snapshot(&self, members: &[MemberInfo]) -> usize {
        let now = self.clock.now();
        let mut st = self.state();
        for m in members {
            st.join_times
                .entry(m.id.clone())
                .or_insert(m.joined_at.unwrap_or(now));
            if !m.has_unverified_marker {
                st.verified.insert(m.id.clone());
            }
        }
        let verified = st.verified.len();
        info!(members = members.len(), verified, "rebuilt membership cache from snapshot");
        verified
    }

    /// A member joined: mark them unverified and open a session.
    pub async fn member_joined(self: &Arc<Self>, mut info: MemberInfo) -> StartOutcome {
        let _guard = self.locks.lock(&info.id).await;
        let now = self.clock.now();
        self.state()
            .join_times
            .insert(info.id.clone(), info.joined_at.unwrap_or(now));
        info!(member = %info.id, name = %info.display_name, "member joined");

        if !info.has_unverified_marker {
            // A fresh join is never verified, even if the marker could not be set.
            if let Err(e) = self.platform.add_unverified_marker(&info.id).await {
                warn!(member = %info.id, error = %e, "failed to add unverified marker on join");
            }
            info.has_unverified_marker = true;
        }

        let outcome = self.start_locked(&info).await;
        if !matches!(outcome, StartOutcome::Started { .. }) {
            info!(member = %info.id, ?outcome, "verification did not start on join");
        }
        outcome
    }

    /// A member left: drop their session, cache entries and pending reviews.
    /// Throttle records are kept so leaving and rejoining does not reset them.
    pub async fn member_left(&self, member: &MemberId) -> LeaveOutcome {
        let outcome = {
            let _guard = self.locks.lock(member).await;
            let mut st = self.state();
            st.join_times.remove(member);
            st.verified.remove(member);
            st.timers.cancel(member);
            let session = st.sessions.delete(member);
            if let Some(s) = &session {
                st.record(AuditEvent::SessionFailed {
                    member: member.clone(),
                    cause: FailureCause::MemberGone,
                    attempts: s.attempts,
                });
            }
            let reviews_purged = st.reviews.purge_member(member);
            for review_id in &reviews_purged {
                st.record(AuditEvent::ReviewPurged {
                    member: member.clone(),
                    review_id: review_id.clone(),
                });
            }
            LeaveOutcome {
                session_cleared: session.is_some(),
                reviews_purged,
            }
        };
        if outcome.session_cleared {
            self.stats.increment(Counter::SessionsFailed);
        }
        info!(
            member = %member,
            session_cleared = outcome.session_cleared,
            reviews_purged = outcome.reviews_purged.len(),
            "member left"
        );
        self.locks.cleanup().await;
        outcome
    }

    // ── Session start ───────────────────────────────────────────────────

    /// Explicit request by a member to (re)start verification.
    pub async fn start_session(self: &Arc<Self>, member: &MemberId) -> StartOutcome {
        let _guard = self.locks.lock(member).await;
        match self.platform.member(member).await {
            Some(info) => self.start_locked(&info).await,
            None => {
                debug!(member = %member, "start requested by someone outside the community");
                StartOutcome::NotAMember
            }
        }
    }

    /// Administrative override: wipe every record for `member` and open a
    /// fresh session, bypassing both throttles.
    pub async fn force_session(
        self: &Arc<Self>,
        actor: &MemberId,
        member: &MemberId,
    ) -> Result<ForceOutcome, VerificationError> {
        let _guard = self.locks.lock(member).await;
        let info = self
            .platform
            .member(member)
            .await
            .ok_or_else(|| VerificationError::MemberGone(member.clone()))?;

        warn!(
            target: "biogate::admin",
            actor = %actor,
            member = %member,
            "administrative override: forcing a fresh verification session"
        );
        {
            let mut st = self.state();
            st.timers.cancel(member);
            st.sessions.delete(member);
            st.throttle.clear(member);
            st.verified.remove(member);
            st.record(AuditEvent::DebugTriggered {
                actor: actor.clone(),
                member: member.clone(),
            });
        }

        if !info.has_unverified_marker {
            if let Err(e) = self.platform.add_unverified_marker(member).await {
                warn!(target: "biogate::admin", member = %member, error = %e, "could not restore unverified marker");
            }
        }

        let session = {
            let mut st = self.state();
            self.open_session(&mut st, member, self.clock.now(), true)
        };
        let (code, expires_at) = (session.code.clone(), self.expires_at(&session));
        if self.deliver_session(session).await {
            Ok(ForceOutcome::Started { code, expires_at })
        } else {
            Ok(ForceOutcome::DmFailed)
        }
    }

    /// Session start with the member lock already held.
    async fn start_locked(self: &Arc<Self>, info: &MemberInfo) -> StartOutcome {
        let member = &info.id;
        if !info.has_unverified_marker {
            self.state().verified.insert(member.clone());
            info!(member = %member, "member is already verified");
            return StartOutcome::AlreadyVerified;
        }

        let now = self.clock.now();
        let admitted = {
            let mut st = self.state();
            st.throttle
                .admit(member, now, self.params.attempt_cooldown())
                .map(|()| self.open_session(&mut st, member, now, false))
        };

        let session = match admitted {
            Ok(session) => session,
            Err(ThrottleRefusal::Cooldown { until, remaining }) => {
                info!(member = %member, remaining = %format_hours_minutes(remaining), "start refused: punitive cooldown");
                let notice = Notice::CooldownActive {
                    remaining_secs: remaining.as_secs(),
                };
                if let NotifyResult::Failed(e) = self.platform.notify(member, notice).await {
                    debug!(member = %member, error = %e, "could not notify member about cooldown");
                }
                return StartOutcome::InCooldown {
                    until,
                    remaining_secs: remaining.as_secs(),
                    remaining: format_hours_minutes(remaining),
                };
            }
            Err(ThrottleRefusal::RateLimited { remaining }) => {
                info!(member = %member, remaining_secs = ceil_secs(remaining), "start refused: rate limited");
                return StartOutcome::RateLimited {
                    remaining_secs: ceil_secs(remaining),
                };
            }
        };

        let (code, expires_at) = (session.code.clone(), self.expires_at(&session));
        if self.deliver_session(session).await {
            StartOutcome::Started { code, expires_at }
        } else {
            StartOutcome::DmFailed
        }
    }

    /// Create the session, replace any previous one, and arm its timer.
    fn open_session(
        self: &Arc<Self>,
        st: &mut EngineState,
        member: &MemberId,
        now: Timestamp,
        forced: bool,
    ) -> VerificationSession {
        let code = VerificationCode::generate(self.params.code_bytes);
        let (session, replaced) = st.sessions.create(member.clone(), code, now);
        if let Some(old) = replaced {
            st.timers.cancel(member);
            debug!(member = %member, attempts = old.attempts, "superseded live session");
        }
        self.schedule_expiry(st, &session);
        st.record(AuditEvent::SessionCreated {
            member: member.clone(),
            created_at: session.created_at,
            expires_at: self.expires_at(&session),
            forced,
        });
        self.stats.increment(Counter::SessionsStarted);
        session
    }

    /// Send the instructions. If they cannot be delivered the session is useless, so drop it.
    async fn deliver_session(&self, session: VerificationSession) -> bool {
        let notice = Notice::SessionStarted {
            code: session.code.clone(),
            expires_at: self.expires_at(&session),
        };
        match self.platform.notify(&session.member, notice).await {
            NotifyResult::Delivered => {
                info!(member = %session.member, "verification instructions delivered");
                true
            }
            NotifyResult::Failed(e) => {
                warn!(member = %session.member, error = %e, "could not deliver verification instructions, dropping session");
                let closed = {
                    let mut st = self.state();
                    let closed = st.close_session(&session.member, session.token());
                    if let Some(s) = &closed {
                        st.record(AuditEvent::SessionFailed {
                            member: s.member.clone(),
                            cause: FailureCause::DmFailed,
                            attempts: s.attempts,
                        });
                    }
                    closed
                };
                if closed.is_some() {
                    self.stats.increment(Counter::SessionsFailed);
                }
                false
            }
        }
    }

    fn expires_at(&self, session: &VerificationSession) -> Timestamp {
        session.expires_at(self.params.session_timeout())
    }

    // ── Expiry ──────────────────────────────────────────────────────────

    fn schedule_expiry(self: &Arc<Self>, st: &mut EngineState, session: &VerificationSession) {
        let delay = delay_until_expiry(
            session.created_at,
            self.clock.now(),
            self.params.session_timeout(),
        );
        let engine = Arc::downgrade(self);
        let member = session.member.clone();
        let token = session.token();
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(engine) = engine.upgrade() {
                engine.expire_session(&member, token).await;
            }
        });
        st.timers.replace(session.member.clone(), token, handle);
    }

    /// Expire the session `token` names. A no-op (returning `false`) if that
    /// session is already gone or was superseded.
    pub async fn expire_session(&self, member: &MemberId, token: SessionToken) -> bool {
        let _guard = self.locks.lock(member).await;
        {
            let mut st = self.state();
            let Some(session) = st.sessions.delete_if_current(member, token) else {
                debug!(member = %member, "expiry fired for a session that no longer exists");
                return false;
            };
            st.timers.forget(member, token);
            st.record(AuditEvent::SessionExpired {
                member: member.clone(),
                started_at: session.created_at,
                expired_at: self.expires_at(&session),
                attempts: session.attempts,
            });
        }
        self.stats.increment(Counter::SessionsExpired);
        if let NotifyResult::Failed(e) = self.platform.notify(member, Notice::SessionExpired).await {
            debug!(member = %member, error = %e, "could not notify member about expiry");
        }
        true
    }

    // ── Code submission ─────────────────────────────────────────────────

    /// A member submitted their profile URL.
    pub async fn submit_code(self: &Arc<Self>, member: &MemberId, input: &str) -> SubmitOutcome {
        let _guard = self.locks.lock(member).await;
        let timeout = self.params.session_timeout();
        let now = self.clock.now();

        let (token, code, attempts) = {
            let mut st = self.state();
            let expired = match st.sessions.get(member) {
                Some(session) => session.is_expired(now, timeout),
                None => return SubmitOutcome::NoSession,
            };
            if expired {
                if let Some(session) = st.sessions.delete(member) {
                    st.timers.cancel(member);
                    st.record(AuditEvent::SessionExpired {
                        member: member.clone(),
                        started_at: session.created_at,
                        expired_at: self.expires_at(&session),
                        attempts: session.attempts,
                    });
                }
                self.stats.increment(Counter::SessionsExpired);
                return SubmitOutcome::Expired;
            }
            let Some(session) = st.sessions.get_mut(member) else {
                return SubmitOutcome::NoSession;
            };
            session.attempts += 1;
            (session.token(), session.code.clone(), session.attempts)
        };

        let Some(url) = ProfileUrl::parse(input) else {
            return self.reject_malformed(member, token, attempts);
        };

        info!(member = %member, url = %url, attempt = attempts, "fetching external profile");
        let fetched = self.fetcher.fetch_profile(&url).await;

        // The member lock is held across the fetch, so nothing else can touch
        // this session meanwhile. Kept as a guard should that ever change.
        if !self.state().sessions.is_current(member, token) {
            info!(member = %member, "session changed during profile fetch, discarding result");
            return SubmitOutcome::Superseded;
        }

        let profile = match fetched {
            Ok(profile) => profile,
            Err(e) if e.is_parse() => {
                warn!(member = %member, url = %url, error = %e, "profile page unreadable");
                return SubmitOutcome::ProfileUnreadable {
                    reason: e.to_string(),
                };
            }
            Err(e) => {
                warn!(member = %member, url = %url, error = %e, "profile fetch failed");
                return SubmitOutcome::FetchFailed {
                    reason: e.to_string(),
                };
            }
        };

        let Some(info) = self.platform.member(member).await else {
            {
                let mut st = self.state();
                st.close_session(member, token);
                st.record(AuditEvent::SessionFailed {
                    member: member.clone(),
                    cause: FailureCause::MemberGone,
                    attempts,
                });
            }
            self.stats.increment(Counter::SessionsFailed);
            return SubmitOutcome::MemberGone;
        };

        let now = self.clock.now();
        if !profile.bio_contains(code.as_str()) {
            return self.punish_mismatch(member, token, attempts, now);
        }

        match risk::assess(info.account_created_at, profile.created_at, now, &self.params) {
            RiskDecision::AutoApprove => self.auto_approve(member, token, profile).await,
            decision @ RiskDecision::Escalate { .. } => {
                let reason = decision.reason().unwrap_or_default();
                self.escalate(&info, token, profile, &url, code, reason, now)
                    .await
            }
        }
    }

    fn reject_malformed(&self, member: &MemberId, token: SessionToken, attempts: u32) -> SubmitOutcome {
        if attempts >= self.params.max_attempts {
            {
                let mut st = self.state();
                st.close_session(member, token);
                st.record(AuditEvent::SessionFailed {
                    member: member.clone(),
                    cause: FailureCause::AttemptsExhausted,
                    attempts,
                });
            }
            self.stats.increment(Counter::SessionsFailed);
            return SubmitOutcome::AttemptsExhausted;
        }
        let attempts_remaining = self.params.max_attempts - attempts;
        info!(member = %member, attempts, attempts_remaining, "malformed profile url");
        SubmitOutcome::InvalidFormat { attempts_remaining }
    }

    fn punish_mismatch(
        &self,
        member: &MemberId,
        token: SessionToken,
        attempts: u32,
        now: Timestamp,
    ) -> SubmitOutcome {
        let punishment = self.params.punishment();
        let until = {
            let mut st = self.state();
            st.close_session(member, token);
            let until = st.throttle.apply_punishment(member, now, punishment);
            st.record(AuditEvent::SessionFailed {
                member: member.clone(),
                cause: FailureCause::CodeMismatch,
                attempts,
            });
            st.record(AuditEvent::PunishmentApplied {
                member: member.clone(),
                until,
                reason: PUNISHMENT_REASON.to_string(),
            });
            until
        };
        self.stats.increment(Counter::SessionsFailed);
        self.stats.increment(Counter::Punishments);
        SubmitOutcome::CodeNotFound {
            cooldown_until: until,
            cooldown_remaining: format_hours_minutes(punishment),
        }
    }

    async fn auto_approve(
        &self,
        member: &MemberId,
        token: SessionToken,
        profile: ExternalProfile,
    ) -> SubmitOutcome {
        self.state().close_session(member, token);

        let marker_removed = match self.platform.remove_unverified_marker(member).await {
            Ok(()) => {
                self.state().verified.insert(member.clone());
                true
            }
            Err(e) => {
                error!(member = %member, error = %e, "approved, but the unverified marker could not be removed");
                false
            }
        };
        self.state().record(AuditEvent::AutoApproved {
            member: member.clone(),
            external_username: profile.username.clone(),
            marker_removed,
        });
        self.stats.increment(Counter::AutoApproved);

        if marker_removed {
            let notice = Notice::Approved {
                by_moderator: false,
            };
            if let NotifyResult::Failed(e) = self.platform.notify(member, notice).await {
                debug!(member = %member, error = %e, "could not notify member about approval");
            }
        }
        SubmitOutcome::AutoApproved {
            external_username: profile.username,
            marker_removed,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn escalate(
        &self,
        info: &MemberInfo,
        token: SessionToken,
        profile: ExternalProfile,
        url: &ProfileUrl,
        code: VerificationCode,
        reason: String,
        now: Timestamp,
    ) -> SubmitOutcome {
        let member = &info.id;
        let (platform_age_days, external_age_days) =
            risk::account_ages(info.account_created_at, profile.created_at, now);

        let (review_id, post) = {
            let mut st = self.state();
            st.close_session(member, token);
            let review_id = st.reviews.add(NewReviewCase {
                member: member.clone(),
                member_name: info.display_name.clone(),
                profile,
                profile_url: url.to_string(),
                expected_code: code,
                flag_reason: reason.clone(),
                created_at: now,
            });
            let post = st
                .reviews
                .get(&review_id)
                .map(|case| review_post(case, platform_age_days, external_age_days));
            st.record(AuditEvent::ReviewEscalated {
                member: member.clone(),
                review_id: review_id.clone(),
                reason: reason.clone(),
            });
            (review_id, post)
        };
        self.stats.increment(Counter::Escalated);

        if let Some(post) = post {
            if let NotifyResult::Failed(e) = self.platform.post_review(post).await {
                error!(review_id = %review_id, error = %e, "could not post review case to moderators");
            }
        }
        let notice = Notice::ReviewPending {
            review_id: review_id.clone(),
        };
        if let NotifyResult::Failed(e) = self.platform.notify(member, notice).await {
            debug!(member = %member, error = %e, "could not notify member about pending review");
        }
        SubmitOutcome::Escalated { review_id, reason }
    }

    // ── Moderator review ────────────────────────────────────────────────

    /// Apply a moderator's verdict to a pending case.
    pub async fn resolve_review(
        &self,
        moderator: &MemberId,
        review_id: &ReviewId,
        resolution: Resolution,
    ) -> Result<ResolveOutcome, VerificationError> {
        let member = self.pending_case_member(review_id)?;
        let _guard = self.locks.lock(&member).await;
        // The case may have been purged while we waited for the lock.
        self.pending_case_member(review_id)?;

        match resolution {
            Resolution::Approve => {
                if self.platform.member(&member).await.is_none() {
                    {
                        let mut st = self.state();
                        st.reviews.purge(review_id);
                        st.record(AuditEvent::ReviewPurged {
                            member: member.clone(),
                            review_id: review_id.clone(),
                        });
                    }
                    warn!(review_id = %review_id, member = %member, "approve on a member who has left");
                    return Err(VerificationError::MemberGone(member));
                }

                // On failure the case stays queued so the moderator can retry.
                self.platform.remove_unverified_marker(&member).await?;

                {
                    let mut st = self.state();
                    st.reviews.remove(review_id);
                    st.verified.insert(member.clone());
                    st.record(AuditEvent::ReviewApproved {
                        member: member.clone(),
                        review_id: review_id.clone(),
                        moderator: moderator.clone(),
                    });
                }
                self.stats.increment(Counter::ReviewsApproved);

                let notified = self
                    .platform
                    .notify(&member, Notice::Approved { by_moderator: true })
                    .await
                    .is_delivered();
                Ok(ResolveOutcome::Approved { member, notified })
            }
            Resolution::Deny { reason } => {
                let reason = reason
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| Resolution::DEFAULT_DENY_REASON.to_string());
                {
                    let mut st = self.state();
                    st.reviews.remove(review_id);
                    st.record(AuditEvent::ReviewDenied {
                        member: member.clone(),
                        review_id: review_id.clone(),
                        moderator: moderator.clone(),
                        reason: reason.clone(),
                    });
                }
                self.stats.increment(Counter::ReviewsDenied);

                let notified = if self.platform.member(&member).await.is_some() {
                    let notice = Notice::Denied {
                        review_id: review_id.clone(),
                        reason: reason.clone(),
                    };
                    self.platform.notify(&member, notice).await.is_delivered()
                } else {
                    false
                };
                Ok(ResolveOutcome::Denied {
                    member,
                    reason,
                    notified,
                })
            }
        }
    }

    /// Owner of a pending case. A case purged because its member left
    /// reports `MemberGone`, anything else unknown is `ReviewNotFound`.
    fn pending_case_member(&self, review_id: &ReviewId) -> Result<MemberId, VerificationError> {
        let st = self.state();
        if let Some(case) = st.reviews.get(review_id) {
            return Ok(case.member.clone());
        }
        Err(match st.reviews.departed_member(review_id) {
            Some(member) => VerificationError::MemberGone(member.clone()),
            None => VerificationError::ReviewNotFound(review_id.clone()),
        })
    }

    // ── Queries & maintenance ───────────────────────────────────────────

    pub fn session(&self, member: &MemberId) -> Option<VerificationSession> {
        self.state().sessions.get(member).cloned()
    }

    pub fn live_sessions(&self) -> usize {
        self.state().sessions.len()
    }

    pub fn has_expiry_timer(&self, member: &MemberId) -> bool {
        self.state().timers.is_scheduled(member)
    }

    pub fn is_verified(&self, member: &MemberId) -> bool {
        self.state().verified.contains(member)
    }

    pub fn review(&self, review_id: &ReviewId) -> Option<ReviewCase> {
        self.state().reviews.get(review_id).cloned()
    }

    pub fn pending_reviews(&self) -> Vec<ReviewCase> {
        self.state().reviews.pending()
    }

    /// Remaining punitive cooldown for `member`, if any.
    pub fn cooldown_remaining(&self, member: &MemberId) -> Option<Duration> {
        let now = self.clock.now();
        self.state()
            .throttle
            .cooldown_remaining(member, now)
            .map(|(_, remaining)| remaining)
    }

    /// How long the member has been in the community, if their join is known.
    pub fn membership_duration(&self, member: &MemberId) -> Option<Duration> {
        let now = self.clock.now();
        self.state()
            .join_times
            .get(member)
            .map(|joined| joined.elapsed_since(now))
    }

    /// Drain pending audit events for the host to process.
    pub fn drain_events(&self) -> Vec<AuditEvent> {
        self.state().events.drain()
    }

    /// Events evicted because nobody drained the buffer in time.
    pub fn dropped_events(&self) -> u64 {
        self.state().events.dropped()
    }

    pub fn stats(&self) -> BTreeMap<&'static str, u64> {
        self.stats.snapshot()
    }

    /// Drop stale throttle records and idle member locks. Call periodically.
    pub async fn maintenance(&self) {
        let now = self.clock.now();
        self.state()
            .throttle
            .prune(now, self.params.attempt_cooldown());
        self.locks.cleanup().await;
    }
}

fn review_post(case: &ReviewCase, platform_age_days: u64, external_age_days: u64) -> ReviewPost {
    ReviewPost {
        review_id: case.review_id.clone(),
        member: case.member.clone(),
        member_name: case.member_name.clone(),
        external_username: case.profile.username.clone(),
        profile_url: case.profile_url.clone(),
        flag_reason: case.flag_reason.clone(),
        code: case.expected_code.clone(),
        code_found_in_bio: case.code_found_in_bio,
        platform_age_days,
        external_age_days,
        external_level: case.profile.level,
    }
}

/// Whole seconds, rounded up, so "wait 0 seconds" is never reported.
fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

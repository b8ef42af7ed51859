//! Moderator review queue.
//!
//! Holds escalated cases until a moderator approves or denies them. Review
//! ids are never reused within the lifetime of the process, so a stale id
//! typed by a moderator can only ever resolve to "not found", or to "member
//! gone" when the case was purged because its member left.

use biogate_profile::ExternalProfile;
use biogate_types::{MemberId, ReviewId, Timestamp, VerificationCode};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Purge tombstones kept before the oldest is forgotten. Past that a stale id
/// for a departed member reports "not found" instead of "member gone".
const TOMBSTONE_CAPACITY: usize = 1024;

/// An escalated submission awaiting a human decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReviewCase {
    pub review_id: ReviewId,
    pub member: MemberId,
    pub member_name: String,
    pub profile: ExternalProfile,
    pub profile_url: String,
    pub expected_code: VerificationCode,
    pub flag_reason: String,
    pub code_found_in_bio: bool,
    pub created_at: Timestamp,
}

/// Fields of a case before the queue assigns it an id.
#[derive(Clone, Debug)]
pub struct NewReviewCase {
    pub member: MemberId,
    pub member_name: String,
    pub profile: ExternalProfile,
    pub profile_url: String,
    pub expected_code: VerificationCode,
    pub flag_reason: String,
    pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct ReviewQueue {
    cases: BTreeMap<ReviewId, ReviewCase>,
    issued: HashSet<ReviewId>,
    /// Cases dropped because the member left, kept as tombstones.
    departed: HashMap<ReviewId, MemberId>,
    /// Tombstone insertion order, oldest at the front.
    departed_order: VecDeque<ReviewId>,
    tombstone_capacity: usize,
    id_bytes: usize,
}

impl ReviewQueue {
    pub fn new(id_bytes: usize) -> Self {
        Self {
            cases: BTreeMap::new(),
            issued: HashSet::new(),
            departed: HashMap::new(),
            departed_order: VecDeque::new(),
            tombstone_capacity: TOMBSTONE_CAPACITY,
            id_bytes,
        }
    }

    /// Enqueue a case and return its freshly issued id.
    ///
    /// `code_found_in_bio` is computed here from the profile snapshot so the
    /// moderator sees exactly what the engine saw.
    pub fn add(&mut self, case: NewReviewCase) -> ReviewId {
        let review_id = loop {
            let candidate = ReviewId::generate(self.id_bytes);
            if self.issued.insert(candidate.clone()) {
                break candidate;
            }
        };
        let code_found_in_bio = case.profile.bio_contains(case.expected_code.as_str());
        self.cases.insert(
            review_id.clone(),
            ReviewCase {
                review_id: review_id.clone(),
                member: case.member,
                member_name: case.member_name,
                profile: case.profile,
                profile_url: case.profile_url,
                expected_code: case.expected_code,
                flag_reason: case.flag_reason,
                code_found_in_bio,
                created_at: case.created_at,
            },
        );
        review_id
    }

    pub fn get(&self, review_id: &ReviewId) -> Option<&ReviewCase> {
        self.cases.get(review_id)
    }

    pub fn remove(&mut self, review_id: &ReviewId) -> Option<ReviewCase> {
        self.cases.remove(review_id)
    }

    /// Remove every case belonging to `member`, returning their ids.
    pub fn purge_member(&mut self, member: &MemberId) -> Vec<ReviewId> {
        let ids: Vec<ReviewId> = self
            .cases
            .values()
            .filter(|c| &c.member == member)
            .map(|c| c.review_id.clone())
            .collect();
        for id in &ids {
            self.purge(id);
        }
        ids
    }

    /// Drop one case because its member is gone.
    pub fn purge(&mut self, review_id: &ReviewId) -> Option<ReviewCase> {
        let case = self.cases.remove(review_id)?;
        self.departed.insert(review_id.clone(), case.member.clone());
        self.departed_order.push_back(review_id.clone());
        while self.departed_order.len() > self.tombstone_capacity {
            if let Some(oldest) = self.departed_order.pop_front() {
                self.departed.remove(&oldest);
            }
        }
        Some(case)
    }

    /// The member a purged case belonged to.
    pub fn departed_member(&self, review_id: &ReviewId) -> Option<&MemberId> {
        self.departed.get(review_id)
    }

    /// Pending cases, oldest first.
    pub fn pending(&self) -> Vec<ReviewCase> {
        let mut cases: Vec<ReviewCase> = self.cases.values().cloned().collect();
        cases.sort_by_key(|c| c.created_at);
        cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(member: &str, bio: &str, at: u64) -> NewReviewCase {
        NewReviewCase {
            member: MemberId::new(member),
            member_name: format!("user-{member}"),
            profile: ExternalProfile {
                username: "ext".into(),
                external_id: 1,
                created_at: Timestamp::EPOCH,
                last_active_at: None,
                bio: bio.into(),
                level: 3,
            },
            profile_url: "https://kogama.com/profile/1/".into(),
            expected_code: VerificationCode::new("CAFEBABE"),
            flag_reason: "platform account is 3 days old (< 365 days)".into(),
            created_at: Timestamp::from_secs(at),
        }
    }

    #[test]
    fn add_issues_unique_ids_and_records_code_match() {
        let mut q = ReviewQueue::new(3);
        let a = q.add(case("a", " CAFEBABE ", 1));
        let b = q.add(case("b", "nothing", 2));
        assert_ne!(a, b);
        assert!(q.get(&a).unwrap().code_found_in_bio);
        assert!(!q.get(&b).unwrap().code_found_in_bio);
    }

    #[test]
    fn resolved_ids_are_never_reissued() {
        // One random byte leaves only 256 ids: exhaust most of them.
        let mut q = ReviewQueue::new(1);
        let mut seen = HashSet::new();
        for i in 0..200 {
            let id = q.add(case("a", "", i));
            q.remove(&id);
            assert!(seen.insert(id));
        }
    }

    #[test]
    fn purge_member_removes_only_their_cases() {
        let mut q = ReviewQueue::new(3);
        let a1 = q.add(case("a", "", 1));
        let a2 = q.add(case("a", "", 2));
        let b = q.add(case("b", "", 3));

        let mut purged = q.purge_member(&MemberId::new("a"));
        purged.sort();
        let mut expected = vec![a1, a2];
        expected.sort();
        assert_eq!(purged, expected);
        assert_eq!(q.len(), 1);
        assert!(q.get(&b).is_some());
        assert_eq!(q.departed_member(&expected[0]), Some(&MemberId::new("a")));
        assert_eq!(q.departed_member(&b), None);
    }

    #[test]
    fn resolved_cases_leave_no_tombstone() {
        let mut q = ReviewQueue::new(3);
        let id = q.add(case("a", "", 1));
        assert!(q.remove(&id).is_some());
        assert!(q.remove(&id).is_none());
        assert_eq!(q.departed_member(&id), None);
    }

    #[test]
    fn tombstones_are_bounded_oldest_first() {
        let mut q = ReviewQueue::new(3);
        q.tombstone_capacity = 2;
        let ids: Vec<ReviewId> = (0..3)
            .map(|i| {
                let member = format!("m{i}");
                let id = q.add(case(&member, "", i));
                q.purge_member(&MemberId::new(member));
                id
            })
            .collect();

        assert_eq!(q.departed.len(), 2);
        assert_eq!(q.departed_member(&ids[0]), None);
        assert_eq!(q.departed_member(&ids[1]), Some(&MemberId::new("m1")));
        assert_eq!(q.departed_member(&ids[2]), Some(&MemberId::new("m2")));
    }

    #[test]
    fn pending_is_oldest_first() {
        let mut q = ReviewQueue::new(3);
        q.add(case("late", "", 50));
        q.add(case("early", "", 10));
        let pending = q.pending();
        assert_eq!(pending[0].member, MemberId::new("early"));
        assert_eq!(pending[1].member, MemberId::new("late"));
    }
}

//! In-memory pending-workflow storage.
//!
//! Four independent per-operator maps, one per workflow kind. Entries live
//! only for the duration of a confirmation dialogue; inserting for an
//! operator who already has an entry of that kind overwrites it. The store
//! is owned by the single `NewsService` instance and dropped on process
//! exit — there is no persistence requirement.
use crate::model::{OperatorId, PendingOtherNews, PendingPpv, PendingReview, PendingWeekly};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PendingStore {
    reviews: HashMap<OperatorId, PendingReview>,
    ppv: HashMap<OperatorId, PendingPpv>,
    weekly: HashMap<OperatorId, PendingWeekly>,
    other: HashMap<OperatorId, PendingOtherNews>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_review(&mut self, operator: OperatorId, pending: PendingReview) {
        self.reviews.insert(operator, pending);
    }

    pub fn review(&self, operator: OperatorId) -> Option<&PendingReview> {
        self.reviews.get(&operator)
    }

    pub fn review_mut(&mut self, operator: OperatorId) -> Option<&mut PendingReview> {
        self.reviews.get_mut(&operator)
    }

    pub fn remove_review(&mut self, operator: OperatorId) -> Option<PendingReview> {
        self.reviews.remove(&operator)
    }

    pub fn set_ppv(&mut self, operator: OperatorId, pending: PendingPpv) {
        self.ppv.insert(operator, pending);
    }

    pub fn ppv(&self, operator: OperatorId) -> Option<&PendingPpv> {
        self.ppv.get(&operator)
    }

    pub fn remove_ppv(&mut self, operator: OperatorId) -> Option<PendingPpv> {
        self.ppv.remove(&operator)
    }

    pub fn set_weekly(&mut self, operator: OperatorId, pending: PendingWeekly) {
        self.weekly.insert(operator, pending);
    }

    pub fn weekly(&self, operator: OperatorId) -> Option<&PendingWeekly> {
        self.weekly.get(&operator)
    }

    pub fn remove_weekly(&mut self, operator: OperatorId) -> Option<PendingWeekly> {
        self.weekly.remove(&operator)
    }

    pub fn set_other(&mut self, operator: OperatorId, pending: PendingOtherNews) {
        self.other.insert(operator, pending);
    }

    pub fn other(&self, operator: OperatorId) -> Option<&PendingOtherNews> {
        self.other.get(&operator)
    }

    pub fn other_mut(&mut self, operator: OperatorId) -> Option<&mut PendingOtherNews> {
        self.other.get_mut(&operator)
    }

    pub fn remove_other(&mut self, operator: OperatorId) -> Option<PendingOtherNews> {
        self.other.remove(&operator)
    }
}

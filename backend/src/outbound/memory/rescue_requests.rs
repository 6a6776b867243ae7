//! In-memory `RescueRequestRepository`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::POISONED;
use crate::domain::ports::{
    RescueRequestFilter, RescueRequestRepository, RescueRequestRepositoryError, StatusCountScope,
    StatusCounts,
};
use crate::domain::{RescueRequest, RescueRequestId};

#[derive(Debug, Default)]
pub struct InMemoryRescueRequestRepository {
    requests: Mutex<HashMap<RescueRequestId, RescueRequest>>,
}

impl InMemoryRescueRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<RescueRequestId, RescueRequest>>, RescueRequestRepositoryError>
    {
        self.requests
            .lock()
            .map_err(|_| RescueRequestRepositoryError::query(POISONED))
    }
}

#[async_trait]
impl RescueRequestRepository for InMemoryRescueRequestRepository {
    async fn insert(&self, request: &RescueRequest) -> Result<(), RescueRequestRepositoryError> {
        let mut requests = self.lock()?;
        if requests.contains_key(&request.id()) {
            return Err(RescueRequestRepositoryError::query(format!(
                "rescue request {} already exists",
                request.id()
            )));
        }
        requests.insert(request.id(), request.clone());
        Ok(())
    }

    async fn save(&self, request: &RescueRequest) -> Result<bool, RescueRequestRepositoryError> {
        let mut requests = self.lock()?;
        match requests.get_mut(&request.id()) {
            Some(stored) => {
                *stored = request.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_id(
        &self,
        id: &RescueRequestId,
    ) -> Result<Option<RescueRequest>, RescueRequestRepositoryError> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn list(
        &self,
        filter: &RescueRequestFilter,
    ) -> Result<Vec<RescueRequest>, RescueRequestRepositoryError> {
        let mut matching: Vec<RescueRequest> = self
            .lock()?
            .values()
            .filter(|request| filter.matches(request))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(matching)
    }

    async fn delete(&self, id: &RescueRequestId) -> Result<bool, RescueRequestRepositoryError> {
        Ok(self.lock()?.remove(id).is_some())
    }

    async fn status_counts(
        &self,
        scope: &StatusCountScope,
    ) -> Result<StatusCounts, RescueRequestRepositoryError> {
        let filter = match scope {
            StatusCountScope::Informer(id) => RescueRequestFilter {
                informer: Some(id.clone()),
                ..RescueRequestFilter::default()
            },
            StatusCountScope::Assignee(id) => RescueRequestFilter {
                assigned_to: Some(id.clone()),
                ..RescueRequestFilter::default()
            },
        };

        let mut counts = StatusCounts::default();
        for request in self.lock()?.values().filter(|request| filter.matches(request)) {
            let status = request.status();
            counts.record(status, counts.get(status) + 1);
        }
        Ok(counts)
    }
}

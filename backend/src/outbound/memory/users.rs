//! In-memory `UserRepository` and `CounterStore`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::POISONED;
use crate::domain::ports::{
    CounterStore, CounterStoreError, UserFilter, UserPersistenceError, UserRepository,
};
use crate::domain::{CounterAdjustment, CounterDelta, User, UserId, Username};

/// Accounts keyed by id, with the uniqueness rules the SQL schema enforces.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<UserId, User>>, UserPersistenceError> {
        self.users
            .lock()
            .map_err(|_| UserPersistenceError::query(POISONED))
    }
}

fn check_unique(
    users: &HashMap<UserId, User>,
    candidate: &User,
) -> Result<(), UserPersistenceError> {
    let others = users.values().filter(|user| user.id() != candidate.id());
    for other in others {
        if other.username() == candidate.username() {
            return Err(UserPersistenceError::duplicate_username());
        }
        if other.email() == candidate.email() {
            return Err(UserPersistenceError::duplicate_email());
        }
    }
    Ok(())
}

fn newest_first(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    users
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = self.lock()?;
        if users.contains_key(user.id()) {
            return Err(UserPersistenceError::query(format!(
                "user {} already exists",
                user.id()
            )));
        }
        check_unique(&users, user)?;
        users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = self.lock()?;
        check_unique(&users, user)?;
        let Some(stored) = users.get_mut(user.id()) else {
            return Err(UserPersistenceError::query(format!(
                "user {} does not exist",
                user.id()
            )));
        };
        // Counters only move through `adjust`.
        *stored = user.clone().with_statistics(*stored.statistics());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .lock()?
            .values()
            .find(|user| user.username() == username)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        let users = self.lock()?;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, UserPersistenceError> {
        let users = self.lock()?;
        Ok(newest_first(
            users
                .values()
                .filter(|user| filter.matches(user))
                .cloned()
                .collect(),
        ))
    }
}

#[async_trait]
impl CounterStore for InMemoryUserRepository {
    async fn adjust(&self, delta: &CounterDelta) -> Result<CounterAdjustment, CounterStoreError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| CounterStoreError::query(POISONED))?;
        let Some(user) = users.get_mut(&delta.user_id) else {
            return Ok(CounterAdjustment::UserMissing);
        };
        let mut statistics = *user.statistics();
        let outcome = statistics.adjust(delta.counter, delta.delta);
        *user = user.clone().with_statistics(statistics);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::service_test_support::user_with_role;
    use crate::domain::{CounterKey, ProfileChanges, Role};

    #[rstest]
    #[tokio::test]
    async fn duplicate_username_and_email_are_rejected() {
        let repo = InMemoryUserRepository::new();
        let first = user_with_role(Role::Informer);
        repo.insert(&first).await.expect("first insert");

        let same_email = user_with_role(Role::Informer)
            .with_profile(ProfileChanges {
                email: Some(first.email().clone()),
                ..ProfileChanges::default()
            })
            .expect("valid profile");
        let err = repo.insert(&same_email).await.expect_err("email clash");
        assert_eq!(err, UserPersistenceError::duplicate_email());
    }

    #[rstest]
    #[tokio::test]
    async fn save_keeps_stored_counters() {
        let repo = InMemoryUserRepository::new();
        let volunteer = user_with_role(Role::Volunteer);
        repo.insert(&volunteer).await.expect("insert");
        repo.adjust(&CounterDelta {
            user_id: volunteer.id().clone(),
            counter: CounterKey::SaveCount,
            delta: 1,
        })
        .await
        .expect("adjust");

        let renamed = volunteer
            .with_profile(ProfileChanges {
                name: Some("Renamed Volunteer".to_owned()),
                ..ProfileChanges::default()
            })
            .expect("valid profile");
        repo.save(&renamed).await.expect("save");

        let stored = repo
            .find_by_id(renamed.id())
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(stored.name(), "Renamed Volunteer");
        assert_eq!(stored.statistics().save_count, 1);
    }

    #[rstest]
    #[case(-1, CounterAdjustment::Clamped, 0)]
    #[case(2, CounterAdjustment::Applied, 2)]
    #[tokio::test]
    async fn adjust_clamps_at_zero(
        #[case] delta: i64,
        #[case] expected: CounterAdjustment,
        #[case] value: u64,
    ) {
        let repo = InMemoryUserRepository::new();
        let informer = user_with_role(Role::Informer);
        repo.insert(&informer).await.expect("insert");

        let outcome = repo
            .adjust(&CounterDelta {
                user_id: informer.id().clone(),
                counter: CounterKey::HelpCount,
                delta,
            })
            .await
            .expect("adjust");

        assert_eq!(outcome, expected);
        let stored = repo
            .find_by_id(informer.id())
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(stored.statistics().help_count, value);
    }

    #[rstest]
    #[tokio::test]
    async fn adjust_reports_missing_user() {
        let repo = InMemoryUserRepository::new();
        let outcome = repo
            .adjust(&CounterDelta {
                user_id: UserId::random(),
                counter: CounterKey::RequestsSubmitted,
                delta: 1,
            })
            .await
            .expect("adjust");
        assert_eq!(outcome, CounterAdjustment::UserMissing);
    }

    #[rstest]
    #[tokio::test]
    async fn list_filters_by_role() {
        let repo = InMemoryUserRepository::new();
        for role in [Role::Volunteer, Role::Volunteer, Role::Informer] {
            repo.insert(&user_with_role(role)).await.expect("insert");
        }

        let volunteers = repo
            .list(&UserFilter {
                role: Some(Role::Volunteer),
                is_active: None,
            })
            .await
            .expect("list");

        assert_eq!(volunteers.len(), 2);
        assert!(volunteers.iter().all(|user| user.role() == Role::Volunteer));
    }
}

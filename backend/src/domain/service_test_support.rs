//! Shared fixtures for domain service unit tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    Actor, Area, EmailAddress, NewRescueRequest, PasswordHash, RescueRequest, RescueRequestChanges,
    RescueStatus, Role, User, UserDraft, UserId, UserStatistics, Username,
};

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

/// An active user with the given role. The password hash never verifies.
pub(crate) fn user_with_role(role: Role) -> User {
    let id = UserId::random();
    let handle = format!("{role}-{}", &id.as_ref()[..8]);
    User::new(UserDraft {
        id,
        name: format!("Test {role}"),
        username: Username::new(&handle).expect("valid username"),
        email: EmailAddress::new(format!("{handle}@example.org")).expect("valid email"),
        password_hash: PasswordHash::from_phc("not-a-phc-string"),
        role,
        area: (role == Role::Volunteer).then(|| Area::new("North").expect("valid area")),
        profile_picture: String::new(),
        is_active: true,
        last_login: None,
        statistics: UserStatistics::default(),
        created_at: fixture_timestamp(),
    })
    .expect("valid user")
}

pub(crate) fn actor_for(user: &User) -> Actor {
    Actor::new(user.id().clone(), user.role())
}

pub(crate) fn pending_request(informer: &UserId) -> RescueRequest {
    RescueRequest::create(
        NewRescueRequest {
            informer: informer.clone(),
            description: "Kitten stuck in a storm drain".to_owned(),
            location: "Harbour Road".to_owned(),
            image_url: None,
            coordinates: None,
        },
        fixture_timestamp(),
    )
    .expect("valid request")
}

/// Walk a pending request through the graph to `target`.
pub(crate) fn request_in(informer: &UserId, volunteer: &UserId, target: RescueStatus) -> RescueRequest {
    use RescueStatus as S;
    let path: &[S] = match target {
        S::Pending => &[],
        S::Approved => &[S::Approved],
        S::Rejected => &[S::Rejected],
        S::Assigned => &[S::Approved, S::Assigned],
        S::InProgress => &[S::Approved, S::Assigned, S::InProgress],
        S::Rescued => &[S::Approved, S::Assigned, S::Rescued],
        S::Completed => &[S::Approved, S::Assigned, S::Rescued, S::Completed],
        S::Cancelled => &[S::Approved, S::Assigned, S::Cancelled],
    };
    path.iter().fold(pending_request(informer), |request, status| {
        request
            .apply_changes(
                RescueRequestChanges {
                    status: Some(*status),
                    assigned_to: (*status == S::Assigned).then(|| volunteer.clone()),
                    ..RescueRequestChanges::default()
                },
                fixture_timestamp(),
            )
            .expect("path follows the graph")
    })
}

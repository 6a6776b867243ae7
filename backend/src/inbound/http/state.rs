//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, AccountQuery, LoginService, NotificationCommand, NotificationQuery,
    RescueRequestCommand, RescueRequestQuery, StatisticsQuery,
};
use crate::domain::{Actor, Error};
use crate::inbound::http::session::SessionContext;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn AccountCommand>,
    pub accounts_query: Arc<dyn AccountQuery>,
    pub rescue_requests: Arc<dyn RescueRequestCommand>,
    pub rescue_requests_query: Arc<dyn RescueRequestQuery>,
    pub statistics: Arc<dyn StatisticsQuery>,
    pub notifications: Arc<dyn NotificationCommand>,
    pub notifications_query: Arc<dyn NotificationQuery>,
}

impl HttpState {
    /// Resolve the session user into an acting identity.
    ///
    /// No session, a tampered cookie, and an account that has since vanished
    /// or been deactivated all yield `unauthorized`.
    pub async fn actor(&self, session: &SessionContext) -> Result<Actor, Error> {
        let user_id = session.require_user_id()?;
        self.accounts_query.actor(&user_id).await
    }
}

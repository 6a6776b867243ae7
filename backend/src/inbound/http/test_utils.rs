//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test as actix_test, web};

use crate::domain::ports::{
    MockAccountCommand, MockAccountQuery, MockLoginService, MockNotificationCommand,
    MockNotificationQuery, MockRescueRequestCommand, MockRescueRequestQuery, MockStatisticsQuery,
};
use crate::domain::{Actor, Error, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// One mock per driving port. Set expectations on the fields, then call
/// [`MockPorts::into_state`].
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub accounts: MockAccountCommand,
    pub accounts_query: MockAccountQuery,
    pub rescue_requests: MockRescueRequestCommand,
    pub rescue_requests_query: MockRescueRequestQuery,
    pub statistics: MockStatisticsQuery,
    pub notifications: MockNotificationCommand,
    pub notifications_query: MockNotificationQuery,
}

impl MockPorts {
    /// Resolve every session to `actor`.
    pub fn acting_as(mut self, actor: &Actor) -> Self {
        let actor = actor.clone();
        self.accounts_query
            .expect_actor()
            .returning(move |_| Ok(actor.clone()));
        self
    }

    pub fn into_state(self) -> HttpState {
        HttpState {
            login: Arc::new(self.login),
            accounts: Arc::new(self.accounts),
            accounts_query: Arc::new(self.accounts_query),
            rescue_requests: Arc::new(self.rescue_requests),
            rescue_requests_query: Arc::new(self.rescue_requests_query),
            statistics: Arc::new(self.statistics),
            notifications: Arc::new(self.notifications),
            notifications_query: Arc::new(self.notifications_query),
        }
    }
}

const SEED_SESSION_PATH: &str = "/test/session";

async fn seed_session(session: SessionContext, id: web::Path<String>) -> Result<HttpResponse, Error> {
    let user_id = UserId::new(id.into_inner())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::Ok().finish())
}

/// App with sessions, `state`, the handlers registered by `configure` under
/// `/api/v1`, and a helper route used by [`session_cookie`].
pub fn test_app(
    state: HttpState,
    configure: impl FnOnce(&mut web::ServiceConfig),
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .route(
            &format!("{SEED_SESSION_PATH}/{{id}}"),
            web::post().to(seed_session),
        )
        .service(web::scope("/api/v1").configure(configure))
}

/// A session cookie logged in as `user_id`.
pub async fn session_cookie<S>(app: &S, user_id: &UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = actix_test::TestRequest::post()
        .uri(&format!("{SEED_SESSION_PATH}/{user_id}"))
        .to_request();
    let response = actix_test::call_service(app, request).await;
    assert!(response.status().is_success(), "session seeding failed");
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

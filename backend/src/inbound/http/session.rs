//! Cookie session for PawResQ accounts.
//!
//! `POST /login` and `POST /register` store the account id here and nothing
//! else. Every protected handler turns that id back into an [`Actor`] through
//! [`HttpState::actor`], which re-reads the account so a role change or a
//! deactivation takes effect on the next request. A missing, unreadable or
//! tampered id is treated as "not logged in".
//!
//! [`Actor`]: crate::domain::Actor
//! [`HttpState::actor`]: crate::inbound::http::state::HttpState::actor

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// The logged-in account, as far as the cookie knows.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap the Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Remember `user_id` after a successful login or registration.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0
            .insert(USER_ID_KEY, user_id.as_ref())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the current user id from the session, if present.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let id = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        match id {
            Some(raw) => match UserId::new(raw) {
                Ok(id) => Ok(Some(id)),
                Err(error) => {
                    tracing::warn!(%error, "invalid user id in session cookie");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Log out.
    pub fn purge(&self) {
        self.0.purge();
    }

    /// Require an authenticated user id or return `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_session::Session;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::domain::Role;
    use crate::domain::service_test_support::{actor_for, user_with_role};
    use crate::inbound::http::state::HttpState;
    use crate::inbound::http::test_utils::{MockPorts, session_cookie, test_app};
    use crate::inbound::http::users::login;

    fn session_test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().wrap(crate::inbound::http::test_utils::test_session_middleware())
    }

    #[actix_web::test]
    async fn remembers_the_logged_in_account() {
        let app = test::init_service(
            session_test_app()
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6")
                            .expect("fixture id");
                        session.persist_user(&id)?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: SessionContext| async move {
                        let id = session.require_user_id()?;
                        Ok::<_, Error>(HttpResponse::Ok().body(id.to_string()))
                    }),
                ),
        )
        .await;

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        assert_eq!(set_res.status(), StatusCode::OK);
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set");

        let get_res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/get")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(get_res.status(), StatusCode::OK);
        let body = test::read_body(get_res).await;
        assert_eq!(body, "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[actix_web::test]
    async fn missing_user_is_unauthorised() {
        let app = test::init_service(session_test_app().route(
            "/require",
            web::get().to(|session: SessionContext| async move {
                let _ = session.require_user_id()?;
                Ok::<_, Error>(HttpResponse::Ok())
            }),
        ))
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/require").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn tampered_user_id_is_unauthorised() {
        let app = test::init_service(
            session_test_app()
                .route(
                    "/set-invalid",
                    web::get().to(|session: Session| async move {
                        session
                            .insert(USER_ID_KEY, "not-a-uuid")
                            .expect("set invalid user id");
                        HttpResponse::Ok()
                    }),
                )
                .route(
                    "/require",
                    web::get().to(|session: SessionContext| async move {
                        let _ = session.require_user_id()?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                ),
        )
        .await;

        let set_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/set-invalid").to_request(),
        )
        .await;
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set");

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/require")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn purge_forgets_the_user() {
        let app = test::init_service(
            session_test_app()
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        session.persist_user(&UserId::random())?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/purge",
                    web::get().to(|session: SessionContext| async move {
                        session.purge();
                        HttpResponse::Ok()
                    }),
                ),
        )
        .await;

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned();

        let purge_res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/purge")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let removal = purge_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("removal cookie sent");
        assert_eq!(removal.value(), "");
    }

    async fn whoami(
        state: web::Data<HttpState>,
        session: SessionContext,
    ) -> Result<HttpResponse, Error> {
        let actor = state.actor(&session).await?;
        Ok(HttpResponse::Ok().body(format!("{} {}", actor.id, actor.role)))
    }

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.service(login).route("/whoami", web::get().to(whoami));
    }

    #[actix_web::test]
    async fn login_cookie_resolves_to_the_acting_account() {
        let leader = user_with_role(Role::TeamLeader);
        let id = leader.id().clone();
        let mut ports = MockPorts::default();
        let login_id = id.clone();
        ports
            .login
            .expect_authenticate()
            .times(1)
            .returning(move |_| Ok(login_id.clone()));
        let profile = leader.clone();
        ports
            .accounts_query
            .expect_profile()
            .returning(move |_| Ok(profile.clone()));
        let actor = actor_for(&leader);
        let expected_id = id.clone();
        ports
            .accounts_query
            .expect_actor()
            .withf(move |user_id| user_id == &expected_id)
            .times(1)
            .returning(move |_| Ok(actor.clone()));
        let app = test::init_service(test_app(ports.into_state(), routes)).await;

        let login_res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(json!({"username": leader.username().as_str(), "password": "secret1"}))
                .to_request(),
        )
        .await;
        assert_eq!(login_res.status(), StatusCode::OK);
        let cookie = login_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned();

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/whoami")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        assert_eq!(body, format!("{id} {}", Role::TeamLeader));
    }

    #[rstest]
    #[case::deactivated("account is inactive")]
    #[case::deleted("login required")]
    #[actix_web::test]
    async fn sessions_outliving_their_account_cannot_act(#[case] message: &'static str) {
        let volunteer = user_with_role(Role::Volunteer);
        let mut ports = MockPorts::default();
        ports
            .accounts_query
            .expect_actor()
            .times(1)
            .returning(move |_| Err(Error::unauthorized(message)));
        let app = test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = session_cookie(&app, volunteer.id()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/whoami")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], message);
    }

    #[actix_web::test]
    async fn anonymous_requests_never_reach_the_account_store() {
        let mut ports = MockPorts::default();
        ports.accounts_query.expect_actor().never();
        let app = test::init_service(test_app(ports.into_state(), routes)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/whoami").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

//! Tests for account handlers.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::service_test_support::{actor_for, user_with_role};
use crate::domain::Actor;
use crate::inbound::http::test_utils::{MockPorts, session_cookie, test_app};

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(logout)
        .service(current_user)
        .service(update_current_user)
        .service(list_users)
        .service(get_user)
        .service(update_user_role);
}

fn registration_body() -> Value {
    json!({
        "name": "Mira Okafor",
        "username": "mira",
        "email": "Mira@Example.org",
        "password": "secret1",
        "role": "volunteer",
        "area": "Riverside",
    })
}

#[rstest]
#[case(json!({"username": "   ", "password": "secret1"}), "username must not be empty", "empty_username")]
#[case(json!({"username": "mira", "password": ""}), "password must not be empty", "empty_password")]
#[actix_web::test]
async fn login_rejects_blank_credentials(
    #[case] body: Value,
    #[case] message: &str,
    #[case] detail_code: &str,
) {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state(), routes)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(body)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["message"], message);
    assert_eq!(value["code"], "invalid_request");
    assert_eq!(value["details"]["code"], detail_code);
}

#[actix_web::test]
async fn login_maps_wrong_credentials_to_unauthorised() {
    let mut ports = MockPorts::default();
    ports
        .login
        .expect_authenticate()
        .returning(|_| Err(Error::unauthorized("invalid username or password")));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({"username": "mira", "password": "wrong-password"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["message"], "invalid username or password");
}

#[actix_web::test]
async fn login_sets_a_session_that_resolves_the_profile() {
    let volunteer = user_with_role(Role::Volunteer);
    let id = volunteer.id().clone();
    let mut ports = MockPorts::default().acting_as(&actor_for(&volunteer));
    let login_id = id.clone();
    ports
        .login
        .expect_authenticate()
        .returning(move |_| Ok(login_id.clone()));
    let profile = volunteer.clone();
    ports
        .accounts_query
        .expect_profile()
        .returning(move |_| Ok(profile.clone()));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;

    let login_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({"username": volunteer.username().as_str(), "password": "secret1"}))
            .to_request(),
    )
    .await;
    assert_eq!(login_res.status(), StatusCode::OK);
    let cookie = login_res
        .response()
        .cookies()
        .find(|c| c.name() == "session")
        .expect("session cookie")
        .into_owned();

    let me_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(me_res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(me_res).await;
    assert_eq!(body["id"], id.to_string());
    assert_eq!(body["role"], "volunteer");
    assert_eq!(body["statistics"]["saveCount"], 0);
    assert!(body.get("passwordHash").is_none());
}

#[actix_web::test]
async fn me_requires_a_session() {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state(), routes)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/v1/users/me").to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn register_creates_the_account_and_logs_it_in() {
    let created = user_with_role(Role::Volunteer);
    let mut ports = MockPorts::default();
    let stored = created.clone();
    ports
        .accounts
        .expect_register()
        .withf(|registration: &Registration| {
            registration.email.as_str() == "mira@example.org"
                && registration.role == Role::Volunteer
                && registration.area.as_ref().map(Area::as_str) == Some("Riverside")
        })
        .returning(move |_| Ok(stored.clone()));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/users/register")
            .set_json(registration_body())
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.response().cookies().any(|c| c.name() == "session"));
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["id"], created.id().to_string());
}

#[rstest]
#[case("name", "missing required field: name")]
#[case("role", "missing required field: role")]
#[actix_web::test]
async fn register_requires_fields(#[case] field: &str, #[case] message: &str) {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state(), routes)).await;
    let mut body = registration_body();
    body.as_object_mut().expect("object body").remove(field);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/users/register")
            .set_json(body)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["message"], message);
}

#[actix_web::test]
async fn register_rejects_short_passwords() {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state(), routes)).await;
    let mut body = registration_body();
    body["password"] = json!("12345");

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/users/register")
            .set_json(body)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["details"]["field"], "password");
}

#[actix_web::test]
async fn register_surfaces_conflicts() {
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_register()
        .returning(|_| Err(Error::conflict("Username already exists")));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/users/register")
            .set_json(registration_body())
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["message"], "Username already exists");
}

#[actix_web::test]
async fn profile_edit_ignores_blank_fields() {
    let informer = user_with_role(Role::Informer);
    let mut ports = MockPorts::default().acting_as(&actor_for(&informer));
    let updated = informer.clone();
    ports
        .accounts
        .expect_update_profile()
        .withf(|_, edit: &ProfileEdit| {
            edit.name.as_deref() == Some("New Name")
                && edit.email.is_none()
                && edit.password.is_none()
        })
        .returning(move |_, _| Ok(updated.clone()));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, informer.id()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/api/v1/users/me")
            .cookie(cookie)
            .set_json(json!({"name": "New Name", "email": "  ", "password": ""}))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn list_users_passes_the_filter() {
    let leader = user_with_role(Role::TeamLeader);
    let volunteer = user_with_role(Role::Volunteer);
    let mut ports = MockPorts::default().acting_as(&actor_for(&leader));
    ports
        .accounts_query
        .expect_list_users()
        .withf(|actor: &Actor, filter: &UserFilter| {
            actor.role == Role::TeamLeader
                && filter.role == Some(Role::Volunteer)
                && filter.is_active == Some(true)
        })
        .returning(move |_, _| Ok(vec![volunteer.clone()]));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, leader.id()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users?role=volunteer&isActive=true")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn list_users_rejects_unknown_roles() {
    let leader = user_with_role(Role::TeamLeader);
    let ports = MockPorts::default().acting_as(&actor_for(&leader));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, leader.id()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users?role=wizard")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn get_user_rejects_malformed_ids() {
    let admin = user_with_role(Role::Admin);
    let ports = MockPorts::default().acting_as(&actor_for(&admin));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, admin.id()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users/not-a-uuid")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["details"]["code"], "invalid_uuid");
}

#[actix_web::test]
async fn role_change_forwards_forbidden() {
    let leader = user_with_role(Role::TeamLeader);
    let target = UserId::random();
    let mut ports = MockPorts::default().acting_as(&actor_for(&leader));
    ports
        .accounts
        .expect_update_role()
        .returning(|_, _, _, _| Err(Error::forbidden("Only administrators can change roles")));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, leader.id()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/users/{target}/role"))
            .cookie(cookie)
            .set_json(json!({"role": "requestChecker"}))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["code"], "forbidden");
}

#[actix_web::test]
async fn logout_purges_the_session() {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state(), routes)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/logout")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let removal = response
        .response()
        .cookies()
        .find(|c| c.name() == "session")
        .expect("removal cookie");
    assert_eq!(removal.value(), "");
}

#[rstest]
fn profile_body_is_camel_case() {
    let volunteer = user_with_role(Role::Volunteer);
    let body = serde_json::to_value(UserProfileBody::from(&volunteer)).expect("serialise");
    assert_eq!(body["area"], "North");
    assert!(body.get("profilePicture").is_some());
    assert!(body.get("isActive").is_some());
}

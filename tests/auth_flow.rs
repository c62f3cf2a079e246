//! Database-backed auth tests. Need `DATABASE_URL`; run with `cargo test -- --ignored`.

mod common;

use hms::auth::{dto::SignupRequest, repo_types::Role, services};
use hms::error::Outcome;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_email_never_registers_twice(pool: PgPool) {
    common::patient(&pool, "ann@hms.test").await;

    let again = SignupRequest {
        email: "ann@hms.test".into(),
        password: "another-password".into(),
        user_type: Role::Doctor,
        name: "Someone Else".into(),
    };
    let outcome = services::register(&pool, &again).await.unwrap();
    assert_eq!(outcome.map(|u| u.profile_id), Outcome::Rejected("Email already registered".into()));

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'ann@hms.test'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn signup_links_a_profile_row(pool: PgPool) {
    let doctor_id = common::doctor(&pool, "grey@hms.test").await;
    let serial: i64 = sqlx::query_scalar("SELECT serial_number FROM doctor WHERE doctor_id = $1")
        .bind(doctor_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let role: Role = sqlx::query_scalar("SELECT usertype FROM users WHERE serial_number = $1")
        .bind(serial)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(role, Role::Doctor);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn login_checks_role_and_password(pool: PgPool) {
    let patient_id = common::patient(&pool, "ann@hms.test").await;

    let ok = services::authenticate(&pool, "ann@hms.test", "correct-horse", Role::Patient)
        .await
        .unwrap()
        .expect("patient login");
    assert_eq!(ok.profile_id, patient_id);

    assert!(services::authenticate(&pool, "ann@hms.test", "correct-horse", Role::Doctor)
        .await
        .unwrap()
        .is_none());
    assert!(services::authenticate(&pool, "ann@hms.test", "wrong", Role::Patient)
        .await
        .unwrap()
        .is_none());
    assert!(services::authenticate(&pool, "nobody@hms.test", "correct-horse", Role::Patient)
        .await
        .unwrap()
        .is_none());
}

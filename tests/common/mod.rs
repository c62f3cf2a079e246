#![allow(dead_code)]

use hms::auth::{dto::SignupRequest, repo_types::Role, services};
use hms::error::Outcome;
use sqlx::PgPool;

pub async fn signup(db: &PgPool, email: &str, name: &str, role: Role) -> i64 {
    let req = SignupRequest {
        email: email.to_string(),
        password: "correct-horse".to_string(),
        user_type: role,
        name: name.to_string(),
    };
    match services::register(db, &req).await.unwrap() {
        Outcome::Done(user) => user.profile_id,
        Outcome::Rejected(reason) => panic!("signup of {email} rejected: {reason}"),
    }
}

pub async fn doctor(db: &PgPool, email: &str) -> i64 {
    signup(db, email, "Dr. Meredith Grey", Role::Doctor).await
}

pub async fn patient(db: &PgPool, email: &str) -> i64 {
    signup(db, email, "Ann Lee", Role::Patient).await
}

//! `hms provision`: create the database, point the config file at it, apply
//! migrations and optionally seed doctor accounts.

use std::path::Path;

use anyhow::Context;
use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use serde::Deserialize;
use sqlx::{postgres::PgPoolOptions, Connection, PgConnection, PgPool};
use tracing::{info, warn};

use crate::auth::{password::hash_password, repo_types::{Role, User}};
use crate::config::DatabaseConfig;
use crate::db;
use crate::doctors::{repo as doctors, repo_types::NewDoctorProfile};

lazy_static! {
    static ref DB_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap();
}

const SEED_EMAIL_DOMAIN: &str = "hms.local";

/// One entry of the doctors seed file, in the frontend asset shape.
#[derive(Debug, Deserialize)]
pub struct DoctorSeed {
    pub name: String,
    #[serde(alias = "specialization")]
    pub speciality: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub about: String,
    #[serde(default, deserialize_with = "fees")]
    pub fees: i32,
    #[serde(default)]
    pub address: SeedAddress,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedAddress {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
}

fn fees<'de, D>(de: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let n = crate::serde_ext::id(de)?;
    i32::try_from(n).map_err(|_| serde::de::Error::custom(format!("fees {n} out of range")))
}

impl DoctorSeed {
    fn profile(&self) -> NewDoctorProfile {
        NewDoctorProfile {
            name: self.name.clone(),
            specialization: self.speciality.clone(),
            experience: self.experience.clone(),
            degree: self.degree.clone(),
            about: self.about.clone(),
            fees: self.fees,
            add_line1: self.address.line1.clone(),
            add_line2: self.address.line2.clone(),
            image_name: self
                .image
                .as_deref()
                .map(|i| i.strip_suffix(".png").unwrap_or(i).to_string()),
        }
    }
}

/// Login handed out for a seeded doctor.
#[derive(Debug, Clone)]
pub struct SeededAccount {
    pub doctor_id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn is_valid_db_name(name: &str) -> bool {
    DB_NAME.is_match(name)
}

fn random_lower(n: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

fn random_password(n: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(n)
        .map(char::from)
        .collect()
}

pub async fn run(config_path: &Path, name: &str, seed: Option<&Path>) -> anyhow::Result<Vec<SeededAccount>> {
    anyhow::ensure!(is_valid_db_name(name), "invalid database name `{name}`");

    let mut config = match DatabaseConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "no usable database config, starting from defaults");
            DatabaseConfig {
                host: "localhost".into(),
                user: "postgres".into(),
                password: "postgres".into(),
                port: 5432,
                database: name.into(),
            }
        }
    };

    create_database(&config, name).await?;

    config.database = name.to_string();
    config.save(config_path)?;
    info!(path = %config_path.display(), database = name, "config file updated");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(config.connect_options())
        .await
        .context("connect to provisioned database")?;
    db::migrate(&pool).await?;
    info!(database = name, "migrations applied");

    match seed {
        Some(path) => seed_doctors(&pool, path).await,
        None => Ok(Vec::new()),
    }
}

async fn create_database(config: &DatabaseConfig, name: &str) -> anyhow::Result<()> {
    let mut conn = PgConnection::connect_with(&config.server_options().database("postgres"))
        .await
        .context("connect to server")?;

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(name)
        .fetch_one(&mut conn)
        .await
        .context("check database exists")?;

    if exists {
        info!(database = name, "database already exists");
    } else {
        // identifiers cannot be bound; the name is validated above
        sqlx::query(&format!(r#"CREATE DATABASE "{name}""#))
            .execute(&mut conn)
            .await
            .with_context(|| format!("create database {name}"))?;
        info!(database = name, "database created");
    }

    conn.close().await.context("close server connection")?;
    Ok(())
}

/// Creates one doctor user and profile per seed entry, each with a random
/// login. Each doctor is its own transaction.
pub async fn seed_doctors(db: &PgPool, path: &Path) -> anyhow::Result<Vec<SeededAccount>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read seed file {}", path.display()))?;
    let seeds: Vec<DoctorSeed> =
        serde_json::from_str(&raw).with_context(|| format!("parse seed file {}", path.display()))?;

    let mut accounts = Vec::with_capacity(seeds.len());
    for seed in &seeds {
        let email = format!("{}@{SEED_EMAIL_DOMAIN}", random_lower(8));
        let password = random_password(10);
        let hash = hash_password(&password)?;

        let mut tx = db.begin().await.context("begin seed tx")?;
        let user = User::create_tx(&mut tx, &seed.name, &email, &hash, Role::Doctor).await?;
        let doctor_id = doctors::insert_profile_tx(&mut tx, user.serial_number, &seed.profile()).await?;
        tx.commit().await.context("commit seed tx")?;

        info!(doctor_id, name = %seed.name, "doctor seeded");
        accounts.push(SeededAccount {
            doctor_id,
            name: seed.name.clone(),
            email,
            password,
        });
    }
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_names_are_plain_identifiers() {
        assert!(is_valid_db_name("hms"));
        assert!(is_valid_db_name("hms_test_2"));
        assert!(!is_valid_db_name("2hms"));
        assert!(!is_valid_db_name("hms; DROP DATABASE postgres"));
        assert!(!is_valid_db_name("hms\"x"));
        assert!(!is_valid_db_name(""));
    }

    #[test]
    fn seed_entries_use_the_asset_shape() {
        let seeds: Vec<DoctorSeed> = serde_json::from_str(
            r#"[{"name":"Dr. Richard James","image":"doc1","speciality":"General physician",
                 "degree":"MBBS","experience":"4 Years","about":"Committed","fees":"50",
                 "address":{"line1":"17th Cross","line2":"Richmond"}}]"#,
        )
        .unwrap();
        let p = seeds[0].profile();
        assert_eq!(p.fees, 50);
        assert_eq!(p.image_name.as_deref(), Some("doc1"));
        assert_eq!(p.add_line2, "Richmond");
    }

    #[test]
    fn png_suffix_is_not_stored() {
        let seed: DoctorSeed =
            serde_json::from_str(r#"{"name":"A","speciality":"B","image":"doc2.png"}"#).unwrap();
        assert_eq!(seed.profile().image_name.as_deref(), Some("doc2"));
    }

    #[test]
    fn generated_credentials() {
        let local = random_lower(8);
        assert_eq!(local.len(), 8);
        assert!(local.chars().all(|c| c.is_ascii_lowercase()));
        let pw = random_password(10);
        assert_eq!(pw.len(), 10);
        assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

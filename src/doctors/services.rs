use bytes::Bytes;
use sqlx::PgPool;
use tracing::{debug, info};

use super::dto::{Dashboard, DoctorAsset};
use super::repo;
use crate::appointments::dto::AppointmentItem;
use crate::dates::{format_date, parse_date};
use crate::db::is_foreign_key_violation;
use crate::error::{AppError, Outcome};
use crate::storage::{mime_from_ext, AssetStore};

pub async fn list_assets(db: &PgPool) -> anyhow::Result<Vec<DoctorAsset>> {
    let doctors = repo::list(db).await?;
    Ok(doctors.into_iter().map(DoctorAsset::from).collect())
}

/// A single path segment: no separators, no parent references, not hidden.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// Loads `<usr>/<file>` (or `<file>`) from the store with its content type.
pub async fn load_image(
    store: &dyn AssetStore,
    file: &str,
    usr: Option<&str>,
) -> Result<(Bytes, &'static str), AppError> {
    if !is_plain_file_name(file) || usr.is_some_and(|u| !is_plain_file_name(u)) {
        return Err(AppError::bad_request("invalid file name"));
    }
    let key = match usr {
        Some(dir) => format!("{dir}/{file}"),
        None => file.to_string(),
    };
    debug!(%key, "loading image");
    let body = store
        .get_object(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{file} not found")))?;
    Ok((body, mime_from_ext(file)))
}

pub async fn block_date(db: &PgPool, doctor_id: i64, date: &str) -> Result<Outcome<()>, AppError> {
    let day = parse_date(date)?;
    match repo::insert_block_date(db, doctor_id, day).await {
        Ok(inserted) => {
            info!(doctor_id, %day, inserted, "date blocked");
            Ok(Outcome::Done(()))
        }
        Err(e) if is_foreign_key_violation(&e) => Ok(Outcome::reject("Unknown doctor")),
        Err(e) => Err(e.into()),
    }
}

pub async fn block_dates(db: &PgPool, doctor_id: i64) -> anyhow::Result<Vec<String>> {
    let days = repo::block_dates(db, doctor_id).await?;
    Ok(days.into_iter().map(format_date).collect())
}

pub async fn dashboard(db: &PgPool, doctor_id: i64) -> anyhow::Result<Dashboard> {
    let counts = repo::dashboard_counts(db, doctor_id).await?;
    let today = time::OffsetDateTime::now_utc().date();
    let rows = repo::appointments_on(db, doctor_id, today).await?;
    Ok(Dashboard {
        counts,
        today: rows.into_iter().map(AppointmentItem::from).collect(),
    })
}

pub async fn schedule(db: &PgPool, doctor_id: i64) -> anyhow::Result<Vec<AppointmentItem>> {
    let rows = repo::pending_schedule(db, doctor_id).await?;
    Ok(rows.into_iter().map(AppointmentItem::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStore;

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("doc1.png"));
        assert!(!is_plain_file_name("../doc1.png"));
        assert!(!is_plain_file_name("a/b.png"));
        assert!(!is_plain_file_name("a\\b.png"));
        assert!(!is_plain_file_name(".env"));
        assert!(!is_plain_file_name(""));
    }

    #[tokio::test]
    async fn traversal_is_a_bad_request() {
        let store = LocalStore::new(std::env::temp_dir());
        let err = load_image(&store, "../../etc/passwd", Some("doctor")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = load_image(&store, "doc1.png", Some("..")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn serves_existing_images_with_their_type() {
        let root = std::env::temp_dir().join(format!("hms-doctor-images-{}", std::process::id()));
        let store = LocalStore::new(&root);
        store
            .put_object("doctor/doc7.png", Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap();

        let (body, mime) = load_image(&store, "doc7.png", Some("doctor")).await.unwrap();
        assert_eq!(&body[..], b"\x89PNG");
        assert_eq!(mime, "image/png");

        let err = load_image(&store, "doc8.png", Some("doctor")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let _ = std::fs::remove_dir_all(root);
    }
}

use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};

use super::repo_types::{Referral, ReferralStatus, ReferralView};

pub async fn pending_for_tx(tx: &mut Transaction<'_, Postgres>, to_doc_id: i64) -> anyhow::Result<i64> {
    let n = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM referrals WHERE to_doc_id = $1 AND status = 'pending'",
    )
    .bind(to_doc_id)
    .fetch_one(&mut **tx)
    .await
    .context("count pending referrals")?;
    Ok(n)
}

pub struct NewReferral<'a> {
    pub from_doc_id: i64,
    pub to_doc_id: i64,
    pub patient_id: i64,
    pub app_id: i64,
    pub description: &'a str,
}

pub async fn insert_tx(tx: &mut Transaction<'_, Postgres>, r: &NewReferral<'_>) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO referrals (from_doc_id, to_doc_id, description, patient_id, status, app_id)
        VALUES ($1, $2, $3, $4, 'pending', $5)
        RETURNING refer_id
        "#,
    )
    .bind(r.from_doc_id)
    .bind(r.to_doc_id)
    .bind(r.description)
    .bind(r.patient_id)
    .bind(r.app_id)
    .fetch_one(&mut **tx)
    .await
    .context("insert referral")?;
    Ok(id)
}

/// Locks the referral row for the rest of the transaction.
pub async fn lock_tx(tx: &mut Transaction<'_, Postgres>, refer_id: i64) -> anyhow::Result<Option<Referral>> {
    let row = sqlx::query_as::<_, Referral>(
        r#"
        SELECT refer_id, from_doc_id, to_doc_id, patient_id, status, app_id
          FROM referrals
         WHERE refer_id = $1
           FOR UPDATE
        "#,
    )
    .bind(refer_id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock referral")?;
    Ok(row)
}

pub async fn set_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    refer_id: i64,
    status: ReferralStatus,
) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE referrals SET status = $2 WHERE refer_id = $1 AND status = 'pending'")
        .bind(refer_id)
        .bind(status)
        .execute(&mut **tx)
        .await
        .context("update referral status")?;
    Ok(res.rows_affected() == 1)
}

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<ReferralView>> {
    let rows = sqlx::query_as::<_, ReferralView>(
        r#"
        SELECT r.refer_id,
               r.from_doc_id, f.name AS from_doc_name, f.specialization AS from_speciality,
               r.to_doc_id,   t.name AS to_doc_name,   t.specialization AS to_speciality,
               r.patient_id,  trim(p.first_name || ' ' || p.last_name) AS patient_name,
               r.description, r.status, r.app_id, r.created_at
          FROM referrals r
          JOIN doctor f  ON f.doctor_id = r.from_doc_id
          JOIN doctor t  ON t.doctor_id = r.to_doc_id
          JOIN patient p ON p.patient_id = r.patient_id
         ORDER BY r.created_at DESC, r.refer_id DESC
        "#,
    )
    .fetch_all(db)
    .await
    .context("list referrals")?;
    Ok(rows)
}

use chrono::{DateTime, Utc};
use fulfillment_common::Vnd;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    api::PaymentQueryFilter,
    db_types::{NewPayment, OrderCode, Payment, PaymentMethod},
    traits::{InsertPaymentResult, PaymentStoreError, PaymentTransition},
};

/// Inserts a payment record. The partial unique index on pending BANKING rows turns a concurrent
/// duplicate into `AlreadyExists`, carrying the record that won the race.
pub async fn idempotent_insert(
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<InsertPaymentResult, PaymentStoreError> {
    let order_ids = serde_json::to_string(&payment.order_ids)?;
    let result = sqlx::query(
        r#"
            INSERT INTO payments (
                id, user_id, order_ids, order_code, method, total, paid_amount, status,
                qr_code, checkout_url, payment_link_id, expires_at, failure_reason
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.user_id)
    .bind(order_ids)
    .bind(payment.order_code)
    .bind(payment.method.to_string())
    .bind(payment.total)
    .bind(payment.paid_amount)
    .bind(payment.status.to_string())
    .bind(&payment.qr_code)
    .bind(&payment.checkout_url)
    .bind(&payment.payment_link_id)
    .bind(payment.expires_at)
    .bind(&payment.failure_reason)
    .execute(&mut *conn)
    .await;
    match result {
        Ok(_) => {
            let record = fetch_payment(&payment.id, conn).await?.ok_or_else(|| {
                PaymentStoreError::DatabaseError(format!("payment {} vanished after insert", payment.id))
            })?;
            Ok(InsertPaymentResult::Inserted(record))
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let survivor = fetch_active_banking_payment(payment.order_code, conn).await?.ok_or_else(|| {
                PaymentStoreError::DatabaseError(format!(
                    "duplicate insert for order code {} but no surviving record",
                    payment.order_code
                ))
            })?;
            Ok(InsertPaymentResult::AlreadyExists(survivor))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_payment(id: &str, conn: &mut SqliteConnection) -> Result<Option<Payment>, PaymentStoreError> {
    let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

/// The non-failed BANKING payment for an order code. There is at most one pending record thanks
/// to the partial unique index, and paid records are terminal, so the newest row is the one that
/// matters.
pub async fn fetch_active_banking_payment(
    order_code: OrderCode,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, PaymentStoreError> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
            SELECT * FROM payments
            WHERE order_code = $1 AND method = $2 AND status != 'FAILED'
            ORDER BY created_at DESC
            LIMIT 1
        "#,
    )
    .bind(order_code)
    .bind(PaymentMethod::Banking.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

pub async fn fetch_payment_by_link_id(
    payment_link_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, PaymentStoreError> {
    let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE payment_link_id = $1")
        .bind(payment_link_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

pub async fn fetch_payment_for_user(
    order_code: OrderCode,
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, PaymentStoreError> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
            SELECT * FROM payments
            WHERE order_code = $1 AND user_id = $2
            ORDER BY created_at DESC
            LIMIT 1
        "#,
    )
    .bind(order_code)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// `PENDING → PAID`. The status guard lives in the UPDATE itself, so a replayed webhook loses
/// the race in SQL and lands on `AlreadyTerminal`.
pub async fn mark_paid(
    id: &str,
    paid_amount: Vnd,
    paid_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<PaymentTransition, PaymentStoreError> {
    let result = sqlx::query(
        r#"
            UPDATE payments SET status = 'PAID', paid_amount = $1, updated_at = $2
            WHERE id = $3 AND status = 'PENDING'
        "#,
    )
    .bind(paid_amount)
    .bind(paid_at)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    transition_outcome(id, result.rows_affected(), conn).await
}

/// `PENDING → FAILED`, recording the reason. Settled records are left untouched.
pub async fn mark_failed(
    id: &str,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<PaymentTransition, PaymentStoreError> {
    let result = sqlx::query(
        r#"
            UPDATE payments SET status = 'FAILED', failure_reason = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'PENDING'
        "#,
    )
    .bind(reason)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    transition_outcome(id, result.rows_affected(), conn).await
}

async fn transition_outcome(
    id: &str,
    rows_affected: u64,
    conn: &mut SqliteConnection,
) -> Result<PaymentTransition, PaymentStoreError> {
    let record = fetch_payment(id, conn).await?;
    let outcome = match (rows_affected, record) {
        (0, None) => PaymentTransition::NotFound,
        (0, Some(p)) => PaymentTransition::AlreadyTerminal(p),
        (_, Some(p)) => PaymentTransition::Applied(p),
        (n, None) => {
            return Err(PaymentStoreError::DatabaseError(format!("payment {id} vanished after updating {n} rows")))
        },
    };
    Ok(outcome)
}

/// Fetches payments matching the filter, newest first.
pub async fn fetch_payments(
    filter: PaymentQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, PaymentStoreError> {
    let mut builder = QueryBuilder::new("SELECT * FROM payments ");
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = filter.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(order_code) = filter.order_code {
        where_clause.push("order_code = ");
        where_clause.push_bind_unseparated(order_code);
    }
    if let Some(method) = filter.method {
        where_clause.push("method = ");
        where_clause.push_bind_unseparated(method.to_string());
    }
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    builder.push(" ORDER BY created_at DESC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let payments = builder.build_query_as::<Payment>().fetch_all(conn).await?;
    Ok(payments)
}

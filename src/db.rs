use sqlx::{PgPool, Postgres, Transaction};

use crate::error::StoreError;

pub type Tx = Transaction<'static, Postgres>;

pub async fn begin(db: &PgPool) -> Result<Tx, StoreError> {
    Ok(db.begin().await?)
}

pub async fn commit(tx: Tx) -> Result<(), StoreError> {
    Ok(tx.commit().await?)
}

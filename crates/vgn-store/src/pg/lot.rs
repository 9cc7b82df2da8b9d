//! Lot and lot-balance store.
//!
//! A lot row is reference data; `lot_bals` carries the per-day snapshots.
//! Creating a lot seeds its opening balance on `orig_dt` as fully unsettled.
//! Balance reads use `select ... for update` so that engine calls running
//! under a unit-of-work hold row locks until commit; under the plain pool
//! the lock ends with the statement and the clause is inert.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use vgn_models::mask::overlay_lot;
use vgn_models::{Lot, LotBal, LotFilter};
use vgn_vxid::pfx;

use crate::error::StoreError;
use crate::pg::{to_vid, to_vid_opt, to_vids, to_vxid, to_vxid_opt, PgStore};
use crate::traits::LotStore;

const ENTITY: &str = "lot";
const BAL_ENTITY: &str = "lot balance";

type LotRow = (
    Uuid,
    Option<Uuid>,
    Option<Uuid>,
    Option<Uuid>,
    Option<Uuid>,
    NaiveDate,
    f64,
);

type LotBalRow = (Uuid, NaiveDate, f64, f64, f64);

const LOT_COLUMNS: &str = "id, inst_id, src_txn_id, le_org_id, acct_id, orig_dt, orig_size";
const BAL_COLUMNS: &str = "lot_id, lot_dt, lot_size, settled_size, unsettled_size";

fn from_lot_row(row: LotRow) -> Result<Lot, StoreError> {
    Ok(Lot {
        id: to_vxid(row.0, pfx::LOT)?,
        inst_id: to_vxid_opt(row.1, pfx::INSTRUMENT)?,
        src_txn_id: to_vxid_opt(row.2, pfx::TRANSACTION)?,
        le_org_id: to_vxid_opt(row.3, pfx::ORGANIZATION)?,
        acct_id: to_vxid_opt(row.4, pfx::ACCOUNT)?,
        orig_dt: row.5,
        orig_size: row.6,
        bal: Vec::new(),
    })
}

fn from_bal_row(row: LotBalRow) -> Result<LotBal, StoreError> {
    Ok(LotBal {
        lot_id: to_vxid(row.0, pfx::LOT)?,
        lot_dt: row.1,
        lot_size: row.2,
        settled_size: row.3,
        unsettled_size: row.4,
    })
}

/// Decoded reference columns of a lot, ready to bind.
struct LotVids {
    inst_id: Option<Uuid>,
    src_txn_id: Option<Uuid>,
    le_org_id: Option<Uuid>,
    acct_id: Option<Uuid>,
}

fn to_vids_of(lot: &Lot) -> Result<LotVids, StoreError> {
    Ok(LotVids {
        inst_id: to_vid_opt(lot.inst_id.as_deref(), "instrument id")?,
        src_txn_id: to_vid_opt(lot.src_txn_id.as_deref(), "source transaction id")?,
        le_org_id: to_vid_opt(lot.le_org_id.as_deref(), "legal entity org id")?,
        acct_id: to_vid_opt(lot.acct_id.as_deref(), "account id")?,
    })
}

// ---------------------------------------------------------------------------
// Lot reference data
// ---------------------------------------------------------------------------

pub(crate) async fn get_lot(
    conn: &mut PgConnection,
    id: &str,
    dt: Option<NaiveDate>,
) -> Result<Lot, StoreError> {
    let vid = to_vid(id, ENTITY)?;

    let sql = format!("select {LOT_COLUMNS} from lots where id = $1");
    let row: Option<LotRow> = sqlx::query_as(&sql)
        .bind(vid)
        .fetch_optional(&mut *conn)
        .await?;

    let mut lot = match row {
        Some(row) => from_lot_row(row)?,
        None => {
            return Err(StoreError::NotFound {
                entity: ENTITY,
                id: id.to_string(),
            })
        }
    };

    // Attach balance data when a date is asked for.
    if let Some(dt) = dt {
        lot.bal.push(get_lot_bal_by_vid(&mut *conn, vid, id, dt).await?);
    }

    Ok(lot)
}

pub(crate) async fn list_lots(
    conn: &mut PgConnection,
    filter: &LotFilter,
) -> Result<Vec<Lot>, StoreError> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("select {LOT_COLUMNS} from lots"));
    let mut sep = " where ";

    if !filter.id.is_empty() {
        qb.push(sep).push("id = any(");
        qb.push_bind(to_vids(&filter.id, "lot id")?).push(")");
        sep = " and ";
    }
    if !filter.src_txn_id.is_empty() {
        qb.push(sep).push("src_txn_id = any(");
        qb.push_bind(to_vids(&filter.src_txn_id, "source transaction id")?)
            .push(")");
    }

    qb.push(" order by id");
    if filter.page_size > 0 {
        qb.push(" limit ").push_bind(i64::from(filter.page_size));
    }

    let rows: Vec<LotRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

    rows.into_iter().map(from_lot_row).collect()
}

pub(crate) async fn update_lot(
    conn: &mut PgConnection,
    lot: &Lot,
    mask: Option<&[String]>,
) -> Result<(), StoreError> {
    // An update carrying balance rows targets the balances, not the lot row.
    if !lot.bal.is_empty() {
        for bal in &lot.bal {
            let mut bal = bal.clone();
            bal.lot_id = lot.id.clone();
            update_lot_bal(&mut *conn, &bal).await?;
        }
        return Ok(());
    }

    let merged;
    let tgt = match mask {
        Some(paths) => {
            let mut current = get_lot(&mut *conn, &lot.id, None).await?;
            overlay_lot(&mut current, lot, paths)?;
            merged = current;
            &merged
        }
        None => lot,
    };

    let vid = to_vid(&tgt.id, ENTITY)?;
    let refs = to_vids_of(tgt)?;

    let result = sqlx::query(
        "update lots set inst_id = $2, src_txn_id = $3, le_org_id = $4, acct_id = $5, \
         orig_dt = $6, orig_size = $7 where id = $1",
    )
    .bind(vid)
    .bind(refs.inst_id)
    .bind(refs.src_txn_id)
    .bind(refs.le_org_id)
    .bind(refs.acct_id)
    .bind(tgt.orig_dt)
    .bind(tgt.orig_size)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: ENTITY,
            id: tgt.id.clone(),
        });
    }

    Ok(())
}

pub(crate) async fn create_lot(conn: &mut PgConnection, lot: &Lot) -> Result<Lot, StoreError> {
    // A create carrying balance rows seeds balances for an existing lot.
    if !lot.bal.is_empty() {
        let vid = to_vid(&lot.id, ENTITY)?;
        for bal in &lot.bal {
            sqlx::query(&format!(
                "insert into lot_bals ({BAL_COLUMNS}) values ($1, $2, $3, $4, $5)"
            ))
            .bind(vid)
            .bind(bal.lot_dt)
            .bind(bal.lot_size)
            .bind(0.0_f64)
            .bind(bal.lot_size)
            .execute(&mut *conn)
            .await?;
        }
        return Ok(lot.clone());
    }

    let vid = Uuid::new_v4();
    let refs = to_vids_of(lot)?;

    sqlx::query(&format!(
        "insert into lots ({LOT_COLUMNS}) values ($1, $2, $3, $4, $5, $6, $7)"
    ))
    .bind(vid)
    .bind(refs.inst_id)
    .bind(refs.src_txn_id)
    .bind(refs.le_org_id)
    .bind(refs.acct_id)
    .bind(lot.orig_dt)
    .bind(lot.orig_size)
    .execute(&mut *conn)
    .await?;

    // Seed the opening balance: fully unsettled on the origination date.
    sqlx::query(&format!(
        "insert into lot_bals ({BAL_COLUMNS}) values ($1, $2, $3, $4, $5)"
    ))
    .bind(vid)
    .bind(lot.orig_dt)
    .bind(lot.orig_size)
    .bind(0.0_f64)
    .bind(lot.orig_size)
    .execute(&mut *conn)
    .await?;

    let mut created = lot.clone();
    created.id = to_vxid(vid, pfx::LOT)?;

    Ok(created)
}

pub(crate) async fn delete_lot(conn: &mut PgConnection, id: &str) -> Result<(), StoreError> {
    let vid = to_vid(id, ENTITY)?;

    // Balances first; the lot row carries the primary key they reference.
    sqlx::query("delete from lot_bals where lot_id = $1")
        .bind(vid)
        .execute(&mut *conn)
        .await?;

    sqlx::query("delete from lots where id = $1")
        .bind(vid)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Lot balances
// ---------------------------------------------------------------------------

async fn get_lot_bal_by_vid(
    conn: &mut PgConnection,
    vid: Uuid,
    id: &str,
    dt: NaiveDate,
) -> Result<LotBal, StoreError> {
    let sql =
        format!("select {BAL_COLUMNS} from lot_bals where lot_id = $1 and lot_dt = $2 for update");
    let row: Option<LotBalRow> = sqlx::query_as(&sql)
        .bind(vid)
        .bind(dt)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => from_bal_row(row),
        None => Err(StoreError::NotFound {
            entity: BAL_ENTITY,
            id: format!("{id} on {dt}"),
        }),
    }
}

pub(crate) async fn get_lot_bal(
    conn: &mut PgConnection,
    id: &str,
    dt: NaiveDate,
) -> Result<LotBal, StoreError> {
    let vid = to_vid(id, ENTITY)?;
    get_lot_bal_by_vid(conn, vid, id, dt).await
}

pub(crate) async fn list_lot_bals(
    conn: &mut PgConnection,
    dt: NaiveDate,
    ids: Option<&[String]>,
) -> Result<Vec<LotBal>, StoreError> {
    let rows: Vec<LotBalRow> = match ids {
        None => {
            let sql =
                format!("select {BAL_COLUMNS} from lot_bals where lot_dt = $1 order by lot_id");
            sqlx::query_as(&sql).bind(dt).fetch_all(&mut *conn).await?
        }
        Some(ids) => {
            let vids = to_vids(ids, "lot id")?;
            let sql = format!(
                "select {BAL_COLUMNS} from lot_bals where lot_dt = $1 and lot_id = any($2) \
                 order by lot_id"
            );
            sqlx::query_as(&sql)
                .bind(dt)
                .bind(vids)
                .fetch_all(&mut *conn)
                .await?
        }
    };

    rows.into_iter().map(from_bal_row).collect()
}

pub(crate) async fn update_lot_bal(conn: &mut PgConnection, bal: &LotBal) -> Result<(), StoreError> {
    let vid = to_vid(&bal.lot_id, ENTITY)?;

    let result = sqlx::query(
        "update lot_bals set lot_size = $3, settled_size = $4, unsettled_size = $5 \
         where lot_id = $1 and lot_dt = $2",
    )
    .bind(vid)
    .bind(bal.lot_dt)
    .bind(bal.lot_size)
    .bind(bal.settled_size)
    .bind(bal.unsettled_size)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: BAL_ENTITY,
            id: format!("{} on {}", bal.lot_id, bal.lot_dt),
        });
    }

    Ok(())
}

pub(crate) async fn create_lot_bal(conn: &mut PgConnection, bal: &LotBal) -> Result<(), StoreError> {
    let vid = to_vid(&bal.lot_id, ENTITY)?;

    sqlx::query(&format!(
        "insert into lot_bals ({BAL_COLUMNS}) values ($1, $2, $3, $4, $5)"
    ))
    .bind(vid)
    .bind(bal.lot_dt)
    .bind(bal.lot_size)
    .bind(bal.settled_size)
    .bind(bal.unsettled_size)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn delete_lot_bals(
    conn: &mut PgConnection,
    dt: NaiveDate,
    ids: Option<&[String]>,
) -> Result<(), StoreError> {
    match ids {
        None => {
            sqlx::query("delete from lot_bals where lot_dt = $1")
                .bind(dt)
                .execute(&mut *conn)
                .await?;
        }
        Some(ids) => {
            let vids = to_vids(ids, "lot id")?;
            sqlx::query("delete from lot_bals where lot_dt = $1 and lot_id = any($2)")
                .bind(dt)
                .bind(vids)
                .execute(&mut *conn)
                .await?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Trait impl on PgStore
// ---------------------------------------------------------------------------

#[async_trait]
impl LotStore for PgStore {
    async fn get_lot(&self, id: &str, dt: Option<NaiveDate>) -> Result<Lot, StoreError> {
        let mut conn = self.conn().await?;
        get_lot(&mut conn, id, dt).await
    }

    async fn list_lots(&self, filter: &LotFilter) -> Result<Vec<Lot>, StoreError> {
        let mut conn = self.conn().await?;
        list_lots(&mut conn, filter).await
    }

    async fn update_lot(&self, lot: &Lot, mask: Option<&[String]>) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        update_lot(&mut conn, lot, mask).await
    }

    async fn create_lot(&self, lot: &Lot) -> Result<Lot, StoreError> {
        let mut conn = self.conn().await?;
        create_lot(&mut conn, lot).await
    }

    async fn delete_lot(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        delete_lot(&mut conn, id).await
    }

    async fn get_lot_bal(&self, id: &str, dt: NaiveDate) -> Result<LotBal, StoreError> {
        let mut conn = self.conn().await?;
        get_lot_bal(&mut conn, id, dt).await
    }

    async fn list_lot_bals(
        &self,
        dt: NaiveDate,
        ids: Option<&[String]>,
    ) -> Result<Vec<LotBal>, StoreError> {
        let mut conn = self.conn().await?;
        list_lot_bals(&mut conn, dt, ids).await
    }

    async fn update_lot_bal(&self, bal: &LotBal) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        update_lot_bal(&mut conn, bal).await
    }

    async fn create_lot_bal(&self, bal: &LotBal) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        create_lot_bal(&mut conn, bal).await
    }

    async fn delete_lot_bals(
        &self,
        dt: NaiveDate,
        ids: Option<&[String]>,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        delete_lot_bals(&mut conn, dt, ids).await
    }
}

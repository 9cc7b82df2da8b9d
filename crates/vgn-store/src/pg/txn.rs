//! Transaction store.
//!
//! `list_txns` is the only dynamic query in the system: each non-empty
//! filter array becomes an `= any(...)` predicate ANDed with the rest.
//! Filter identifier values arrive external and are decoded here.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use vgn_models::mask::overlay_txn;
use vgn_models::{Txn, TxnFilter};
use vgn_vxid::pfx;

use crate::error::StoreError;
use crate::pg::{to_vid, to_vid_opt, to_vids, to_vxid, to_vxid_opt, PgStore};
use crate::traits::TxnStore;

const ENTITY: &str = "transaction";

const COLUMNS: &str = "id, parent_id, inst_id, src_lot_id, tgt_lot_id, txn_dt, settle_dt, \
     txn_type, txn_sub_type, txn_size, trade_amt_ccy_id, trade_amt_gross, trade_amt_net, \
     settle_amt_ccy_id, settle_amt_gross, settle_amt_net, state";

#[derive(sqlx::FromRow)]
struct TxnRow {
    id: Uuid,
    parent_id: Option<Uuid>,
    inst_id: Option<Uuid>,
    src_lot_id: Option<Uuid>,
    tgt_lot_id: Option<Uuid>,
    txn_dt: NaiveDate,
    settle_dt: NaiveDate,
    txn_type: String,
    txn_sub_type: Option<String>,
    txn_size: f64,
    trade_amt_ccy_id: Option<Uuid>,
    trade_amt_gross: f64,
    trade_amt_net: f64,
    settle_amt_ccy_id: Option<Uuid>,
    settle_amt_gross: f64,
    settle_amt_net: f64,
    state: String,
}

fn from_row(row: TxnRow) -> Result<Txn, StoreError> {
    Ok(Txn {
        id: to_vxid(row.id, pfx::TRANSACTION)?,
        parent_id: to_vxid_opt(row.parent_id, pfx::TRANSACTION)?,
        inst_id: to_vxid_opt(row.inst_id, pfx::INSTRUMENT)?,
        src_lot_id: to_vxid_opt(row.src_lot_id, pfx::LOT)?,
        tgt_lot_id: to_vxid_opt(row.tgt_lot_id, pfx::LOT)?,
        txn_dt: row.txn_dt,
        settle_dt: row.settle_dt,
        txn_type: row.txn_type.parse()?,
        txn_sub_type: row.txn_sub_type.as_deref().map(str::parse).transpose()?,
        txn_size: row.txn_size,
        trade_amt_ccy_id: to_vxid_opt(row.trade_amt_ccy_id, pfx::INSTRUMENT)?,
        trade_amt_gross: row.trade_amt_gross,
        trade_amt_net: row.trade_amt_net,
        settle_amt_ccy_id: to_vxid_opt(row.settle_amt_ccy_id, pfx::INSTRUMENT)?,
        settle_amt_gross: row.settle_amt_gross,
        settle_amt_net: row.settle_amt_net,
        state: row.state.parse()?,
    })
}

/// Decoded reference columns of a transaction, ready to bind.
struct TxnVids {
    parent_id: Option<Uuid>,
    inst_id: Option<Uuid>,
    src_lot_id: Option<Uuid>,
    tgt_lot_id: Option<Uuid>,
    trade_amt_ccy_id: Option<Uuid>,
    settle_amt_ccy_id: Option<Uuid>,
}

fn to_vids_of(txn: &Txn) -> Result<TxnVids, StoreError> {
    Ok(TxnVids {
        parent_id: to_vid_opt(txn.parent_id.as_deref(), "parent transaction id")?,
        inst_id: to_vid_opt(txn.inst_id.as_deref(), "instrument id")?,
        src_lot_id: to_vid_opt(txn.src_lot_id.as_deref(), "source lot id")?,
        tgt_lot_id: to_vid_opt(txn.tgt_lot_id.as_deref(), "target lot id")?,
        trade_amt_ccy_id: to_vid_opt(txn.trade_amt_ccy_id.as_deref(), "trade currency id")?,
        settle_amt_ccy_id: to_vid_opt(txn.settle_amt_ccy_id.as_deref(), "settle currency id")?,
    })
}

pub(crate) async fn get_txn(conn: &mut PgConnection, id: &str) -> Result<Txn, StoreError> {
    let vid = to_vid(id, ENTITY)?;

    let sql = format!("select {COLUMNS} from txns where id = $1");
    let row: Option<TxnRow> = sqlx::query_as(&sql)
        .bind(vid)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => from_row(row),
        None => Err(StoreError::NotFound {
            entity: ENTITY,
            id: id.to_string(),
        }),
    }
}

pub(crate) async fn list_txns(
    conn: &mut PgConnection,
    filter: &TxnFilter,
) -> Result<Vec<Txn>, StoreError> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("select {COLUMNS} from txns"));
    let mut sep = " where ";

    if !filter.id.is_empty() {
        qb.push(sep).push("id = any(");
        qb.push_bind(to_vids(&filter.id, "transaction id")?).push(")");
        sep = " and ";
    }
    if !filter.txn_type.is_empty() {
        qb.push(sep).push("txn_type = any(");
        qb.push_bind(filter.txn_type.clone()).push(")");
        sep = " and ";
    }
    if !filter.txn_type_neq.is_empty() {
        qb.push(sep).push("not (txn_type = any(");
        qb.push_bind(filter.txn_type_neq.clone()).push("))");
        sep = " and ";
    }
    if !filter.parent_id.is_empty() {
        qb.push(sep).push("parent_id = any(");
        qb.push_bind(to_vids(&filter.parent_id, "parent transaction id")?)
            .push(")");
    }

    qb.push(" order by id");
    if filter.page_size > 0 {
        qb.push(" limit ").push_bind(i64::from(filter.page_size));
    }

    let rows: Vec<TxnRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

    rows.into_iter().map(from_row).collect()
}

pub(crate) async fn update_txn(
    conn: &mut PgConnection,
    txn: &Txn,
    mask: Option<&[String]>,
) -> Result<(), StoreError> {
    let merged;
    let tgt = match mask {
        Some(paths) => {
            let mut current = get_txn(&mut *conn, &txn.id).await?;
            overlay_txn(&mut current, txn, paths)?;
            merged = current;
            &merged
        }
        None => txn,
    };

    let vid = to_vid(&tgt.id, ENTITY)?;
    let refs = to_vids_of(tgt)?;

    let result = sqlx::query(
        "update txns set parent_id = $2, inst_id = $3, src_lot_id = $4, tgt_lot_id = $5, \
         txn_dt = $6, settle_dt = $7, txn_type = $8, txn_sub_type = $9, txn_size = $10, \
         trade_amt_ccy_id = $11, trade_amt_gross = $12, trade_amt_net = $13, \
         settle_amt_ccy_id = $14, settle_amt_gross = $15, settle_amt_net = $16, state = $17 \
         where id = $1",
    )
    .bind(vid)
    .bind(refs.parent_id)
    .bind(refs.inst_id)
    .bind(refs.src_lot_id)
    .bind(refs.tgt_lot_id)
    .bind(tgt.txn_dt)
    .bind(tgt.settle_dt)
    .bind(tgt.txn_type.as_str())
    .bind(tgt.txn_sub_type.map(|s| s.as_str()))
    .bind(tgt.txn_size)
    .bind(refs.trade_amt_ccy_id)
    .bind(tgt.trade_amt_gross)
    .bind(tgt.trade_amt_net)
    .bind(refs.settle_amt_ccy_id)
    .bind(tgt.settle_amt_gross)
    .bind(tgt.settle_amt_net)
    .bind(tgt.state.as_str())
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

pub(crate) async fn create_txn(conn: &mut PgConnection, txn: &Txn) -> Result<Txn, StoreError> {
    let vid = Uuid::new_v4();
    let refs = to_vids_of(txn)?;

    sqlx::query(
        "insert into txns (id, parent_id, inst_id, src_lot_id, tgt_lot_id, txn_dt, settle_dt, \
         txn_type, txn_sub_type, txn_size, trade_amt_ccy_id, trade_amt_gross, trade_amt_net, \
         settle_amt_ccy_id, settle_amt_gross, settle_amt_net, state) \
         values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
    )
    .bind(vid)
    .bind(refs.parent_id)
    .bind(refs.inst_id)
    .bind(refs.src_lot_id)
    .bind(refs.tgt_lot_id)
    .bind(txn.txn_dt)
    .bind(txn.settle_dt)
    .bind(txn.txn_type.as_str())
    .bind(txn.txn_sub_type.map(|s| s.as_str()))
    .bind(txn.txn_size)
    .bind(refs.trade_amt_ccy_id)
    .bind(txn.trade_amt_gross)
    .bind(txn.trade_amt_net)
    .bind(refs.settle_amt_ccy_id)
    .bind(txn.settle_amt_gross)
    .bind(txn.settle_amt_net)
    .bind(txn.state.as_str())
    .execute(&mut *conn)
    .await?;

    let mut created = txn.clone();
    created.id = to_vxid(vid, pfx::TRANSACTION)?;

    Ok(created)
}

pub(crate) async fn delete_txn(conn: &mut PgConnection, id: &str) -> Result<(), StoreError> {
    let vid = to_vid(id, ENTITY)?;

    sqlx::query("delete from txns where id = $1")
        .bind(vid)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[async_trait]
impl TxnStore for PgStore {
    async fn get_txn(&self, id: &str) -> Result<Txn, StoreError> {
        let mut conn = self.conn().await?;
        get_txn(&mut conn, id).await
    }

    async fn list_txns(&self, filter: &TxnFilter) -> Result<Vec<Txn>, StoreError> {
        let mut conn = self.conn().await?;
        list_txns(&mut conn, filter).await
    }

    async fn update_txn(&self, txn: &Txn, mask: Option<&[String]>) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        update_txn(&mut conn, txn, mask).await
    }

    async fn create_txn(&self, txn: &Txn) -> Result<Txn, StoreError> {
        let mut conn = self.conn().await?;
        create_txn(&mut conn, txn).await
    }

    async fn delete_txn(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        delete_txn(&mut conn, id).await
    }
}

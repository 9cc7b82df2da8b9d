//! Instrument store. Currencies are instruments; `proxy_inst` points at
//! another instrument and forms a DAG.

use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use vgn_models::mask::overlay_inst;
use vgn_models::Inst;
use vgn_vxid::pfx;

use crate::error::StoreError;
use crate::pg::{to_vid, to_vid_opt, to_vxid, to_vxid_opt, PgStore};
use crate::traits::InstStore;

const ENTITY: &str = "instrument";

type InstRow = (Uuid, String, Option<String>, Option<Uuid>);

fn from_row(row: InstRow) -> Result<Inst, StoreError> {
    Ok(Inst {
        id: to_vxid(row.0, pfx::INSTRUMENT)?,
        name: row.1,
        symbol: row.2,
        proxy_inst: to_vxid_opt(row.3, pfx::INSTRUMENT)?,
    })
}

pub(crate) async fn get_inst(conn: &mut PgConnection, id: &str) -> Result<Inst, StoreError> {
    let vid = to_vid(id, ENTITY)?;

    let row: Option<InstRow> =
        sqlx::query_as("select id, name, symbol, proxy_inst from insts where id = $1")
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

pub(crate) async fn list_insts(conn: &mut PgConnection) -> Result<Vec<Inst>, StoreError> {
    let rows: Vec<InstRow> =
        sqlx::query_as("select id, name, symbol, proxy_inst from insts order by id")
            .fetch_all(&mut *conn)
            .await?;

    rows.into_iter().map(from_row).collect()
}

pub(crate) async fn update_inst(
    conn: &mut PgConnection,
    inst: &Inst,
    mask: Option<&[String]>,
) -> Result<(), StoreError> {
    let merged;
    let tgt = match mask {
        Some(paths) => {
            let mut current = get_inst(&mut *conn, &inst.id).await?;
            overlay_inst(&mut current, inst, paths)?;
            merged = current;
            &merged
        }
        None => inst,
    };

    let vid = to_vid(&tgt.id, ENTITY)?;
    let proxy_vid = to_vid_opt(tgt.proxy_inst.as_deref(), "proxy instrument")?;

    let result = sqlx::query("update insts set name = $2, symbol = $3, proxy_inst = $4 where id = $1")
        .bind(vid)
        .bind(&tgt.name)
        .bind(&tgt.symbol)
        .bind(proxy_vid)
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

pub(crate) async fn create_inst(conn: &mut PgConnection, inst: &Inst) -> Result<Inst, StoreError> {
    let vid = Uuid::new_v4();
    let proxy_vid = to_vid_opt(inst.proxy_inst.as_deref(), "proxy instrument")?;

    sqlx::query("insert into insts (id, name, symbol, proxy_inst) values ($1, $2, $3, $4)")
        .bind(vid)
        .bind(&inst.name)
        .bind(&inst.symbol)
        .bind(proxy_vid)
        .execute(&mut *conn)
        .await?;

    Ok(Inst {
        id: to_vxid(vid, pfx::INSTRUMENT)?,
        name: inst.name.clone(),
        symbol: inst.symbol.clone(),
        proxy_inst: inst.proxy_inst.clone(),
    })
}

pub(crate) async fn delete_inst(conn: &mut PgConnection, id: &str) -> Result<(), StoreError> {
    let vid = to_vid(id, ENTITY)?;

    sqlx::query("delete from insts where id = $1")
        .bind(vid)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[async_trait]
impl InstStore for PgStore {
    async fn get_inst(&self, id: &str) -> Result<Inst, StoreError> {
        let mut conn = self.conn().await?;
        get_inst(&mut conn, id).await
    }

    async fn list_insts(&self) -> Result<Vec<Inst>, StoreError> {
        let mut conn = self.conn().await?;
        list_insts(&mut conn).await
    }

    async fn update_inst(&self, inst: &Inst, mask: Option<&[String]>) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        update_inst(&mut conn, inst, mask).await
    }

    async fn create_inst(&self, inst: &Inst) -> Result<Inst, StoreError> {
        let mut conn = self.conn().await?;
        create_inst(&mut conn, inst).await
    }

    async fn delete_inst(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        delete_inst(&mut conn, id).await
    }
}

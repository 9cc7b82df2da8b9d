//! Stores for the four tree-shaped reference entities.
//!
//! Organization, Account, Portfolio and Strategy share the same column
//! shape (`id`, `name`, `parent_id`), so one generic implementation serves
//! all four; [`TreeEntity`] carries the per-entity table name, NotFound
//! label, id prefix and mask overlay.

use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use vgn_models::mask::{overlay_acct, overlay_org, overlay_port, overlay_strat, MaskError};
use vgn_models::{Acct, Org, Port, Strat};
use vgn_vxid::pfx;

use crate::error::StoreError;
use crate::pg::{to_vid, to_vid_opt, to_vxid, to_vxid_opt, PgStore};
use crate::traits::{AcctStore, OrgStore, PortStore, StratStore};

/// Per-entity constants and conversions for the shared tree-store SQL.
pub(crate) trait TreeEntity: Sized + Send {
    const TABLE: &'static str;
    const ENTITY: &'static str;
    const PFX: &'static str;

    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn parent_id(&self) -> Option<&str>;
    fn from_parts(id: String, name: String, parent_id: Option<String>) -> Self;
    fn overlay(dst: &mut Self, src: &Self, paths: &[String]) -> Result<(), MaskError>;
}

macro_rules! tree_entity {
    ($ty:ty, $table:literal, $entity:literal, $pfx:expr, $overlay:path) => {
        impl TreeEntity for $ty {
            const TABLE: &'static str = $table;
            const ENTITY: &'static str = $entity;
            const PFX: &'static str = $pfx;

            fn id(&self) -> &str {
                &self.id
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn parent_id(&self) -> Option<&str> {
                self.parent_id.as_deref()
            }
            fn from_parts(id: String, name: String, parent_id: Option<String>) -> Self {
                Self {
                    id,
                    name,
                    parent_id,
                }
            }
            fn overlay(dst: &mut Self, src: &Self, paths: &[String]) -> Result<(), MaskError> {
                $overlay(dst, src, paths)
            }
        }
    };
}

tree_entity!(Org, "orgs", "org", pfx::ORGANIZATION, overlay_org);
tree_entity!(Acct, "accts", "account", pfx::ACCOUNT, overlay_acct);
tree_entity!(Port, "ports", "portfolio", pfx::PORTFOLIO, overlay_port);
tree_entity!(Strat, "strats", "strategy", pfx::STRATEGY, overlay_strat);

// ---------------------------------------------------------------------------
// Shared SQL
// ---------------------------------------------------------------------------

type TreeRow = (Uuid, String, Option<Uuid>);

fn from_row<E: TreeEntity>(row: TreeRow) -> Result<E, StoreError> {
    Ok(E::from_parts(
        to_vxid(row.0, E::PFX)?,
        row.1,
        to_vxid_opt(row.2, E::PFX)?,
    ))
}

pub(crate) async fn get<E: TreeEntity>(conn: &mut PgConnection, id: &str) -> Result<E, StoreError> {
    let vid = to_vid(id, E::ENTITY)?;

    let sql = format!("select id, name, parent_id from {} where id = $1", E::TABLE);
    let row: Option<TreeRow> = sqlx::query_as(&sql)
        .bind(vid)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => from_row(row),
        None => Err(StoreError::NotFound {
            entity: E::ENTITY,
            id: id.to_string(),
        }),
    }
}

pub(crate) async fn list<E: TreeEntity>(conn: &mut PgConnection) -> Result<Vec<E>, StoreError> {
    let sql = format!("select id, name, parent_id from {} order by id", E::TABLE);
    let rows: Vec<TreeRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;

    rows.into_iter().map(from_row).collect()
}

pub(crate) async fn update<E: TreeEntity>(
    conn: &mut PgConnection,
    entity: &E,
    mask: Option<&[String]>,
) -> Result<(), StoreError> {
    // Partial update: overlay the masked fields onto the current row first.
    let merged;
    let tgt = match mask {
        Some(paths) => {
            let mut current: E = get(&mut *conn, entity.id()).await?;
            E::overlay(&mut current, entity, paths)?;
            merged = current;
            &merged
        }
        None => entity,
    };

    let vid = to_vid(tgt.id(), E::ENTITY)?;
    let parent_vid = to_vid_opt(tgt.parent_id(), "parent id")?;

    let sql = format!(
        "update {} set name = $2, parent_id = $3 where id = $1",
        E::TABLE
    );
    let result = sqlx::query(&sql)
        .bind(vid)
        .bind(tgt.name())
        .bind(parent_vid)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: E::ENTITY,
            id: tgt.id().to_string(),
        });
    }

    Ok(())
}

pub(crate) async fn create<E: TreeEntity>(
    conn: &mut PgConnection,
    entity: &E,
) -> Result<E, StoreError> {
    let vid = Uuid::new_v4();
    let parent_vid = to_vid_opt(entity.parent_id(), "parent id")?;

    let sql = format!(
        "insert into {} (id, name, parent_id) values ($1, $2, $3)",
        E::TABLE
    );
    sqlx::query(&sql)
        .bind(vid)
        .bind(entity.name())
        .bind(parent_vid)
        .execute(&mut *conn)
        .await?;

    Ok(E::from_parts(
        to_vxid(vid, E::PFX)?,
        entity.name().to_string(),
        entity.parent_id().map(String::from),
    ))
}

pub(crate) async fn delete<E: TreeEntity>(
    conn: &mut PgConnection,
    id: &str,
) -> Result<(), StoreError> {
    let vid = to_vid(id, E::ENTITY)?;

    let sql = format!("delete from {} where id = $1", E::TABLE);
    sqlx::query(&sql).bind(vid).execute(&mut *conn).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Trait impls on PgStore
// ---------------------------------------------------------------------------

macro_rules! tree_store_impl {
    ($trait:ident, $ty:ty, $get:ident, $list:ident, $update:ident, $create:ident, $delete:ident) => {
        #[async_trait]
        impl $trait for PgStore {
            async fn $get(&self, id: &str) -> Result<$ty, StoreError> {
                let mut conn = self.conn().await?;
                get(&mut conn, id).await
            }

            async fn $list(&self) -> Result<Vec<$ty>, StoreError> {
                let mut conn = self.conn().await?;
                list(&mut conn).await
            }

            async fn $update(
                &self,
                entity: &$ty,
                mask: Option<&[String]>,
            ) -> Result<(), StoreError> {
                let mut conn = self.conn().await?;
                update(&mut conn, entity, mask).await
            }

            async fn $create(&self, entity: &$ty) -> Result<$ty, StoreError> {
                let mut conn = self.conn().await?;
                create(&mut conn, entity).await
            }

            async fn $delete(&self, id: &str) -> Result<(), StoreError> {
                let mut conn = self.conn().await?;
                delete::<$ty>(&mut conn, id).await
            }
        }
    };
}

tree_store_impl!(OrgStore, Org, get_org, list_orgs, update_org, create_org, delete_org);
tree_store_impl!(AcctStore, Acct, get_acct, list_accts, update_acct, create_acct, delete_acct);
tree_store_impl!(PortStore, Port, get_port, list_ports, update_port, create_port, delete_port);
tree_store_impl!(StratStore, Strat, get_strat, list_strats, update_strat, create_strat, delete_strat);

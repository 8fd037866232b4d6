//! Collection access for watch-list records.
//!
//! The table name comes from configuration, so statements are built with
//! `sea_query` against an aliased table instead of a derived entity.

use crate::domain::{Field, FieldValue, RecordId};
use crate::models::anime::Anime;
use anyhow::Context;
use sea_orm::sea_query::{Alias, ColumnDef, Expr, Query, SimpleExpr, Table};
use sea_orm::{ConnectionTrait, DatabaseConnection, QueryResult};
use tracing::{debug, info};

pub struct AnimeRepository {
    conn: DatabaseConnection,
    collection: String,
}

fn column(field: Field) -> Alias {
    Alias::new(field.storage_name())
}

fn value_expr(value: &FieldValue) -> SimpleExpr {
    match value {
        FieldValue::Text(text) => Expr::value(text.clone()),
        FieldValue::Count(n) => Expr::value(i64::from(*n)),
        FieldValue::Flag(b) => Expr::value(*b),
    }
}

impl AnimeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, collection: String) -> Self {
        Self { conn, collection }
    }

    fn table(&self) -> Alias {
        Alias::new(self.collection.as_str())
    }

    fn map_row(row: &QueryResult) -> anyhow::Result<Anime> {
        let count = |field: Field| -> anyhow::Result<u32> {
            let raw: i64 = row.try_get("", field.storage_name())?;
            u32::try_from(raw)
                .with_context(|| format!("Stored {} is out of range: {raw}", field.storage_name()))
        };

        Ok(Anime {
            id: RecordId::new(row.try_get::<String>("", Field::Id.storage_name())?),
            name: row.try_get("", Field::Name.storage_name())?,
            link: row.try_get("", Field::Link.storage_name())?,
            current_episode: count(Field::CurrentEpisode)?,
            total_episodes: count(Field::TotalEpisodes)?,
            is_airing_finished: row.try_get("", Field::IsAiringFinished.storage_name())?,
            is_finished: row.try_get("", Field::IsFinished.storage_name())?,
        })
    }

    /// Creates the collection table when it does not exist yet.
    pub async fn ensure_collection(&self) -> anyhow::Result<()> {
        let stmt = Table::create()
            .table(self.table())
            .if_not_exists()
            .col(
                ColumnDef::new(column(Field::Id))
                    .string()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(column(Field::Name)).string().not_null())
            .col(ColumnDef::new(column(Field::Link)).string().null())
            .col(
                ColumnDef::new(column(Field::CurrentEpisode))
                    .big_integer()
                    .not_null(),
            )
            .col(
                ColumnDef::new(column(Field::TotalEpisodes))
                    .big_integer()
                    .not_null(),
            )
            .col(
                ColumnDef::new(column(Field::IsAiringFinished))
                    .boolean()
                    .not_null(),
            )
            .col(
                ColumnDef::new(column(Field::IsFinished))
                    .boolean()
                    .not_null(),
            )
            .to_owned();

        let backend = self.conn.get_database_backend();
        self.conn.execute(backend.build(&stmt)).await?;
        Ok(())
    }

    pub async fn list_all(&self) -> anyhow::Result<Vec<Anime>> {
        let stmt = Query::select()
            .columns(Field::ALL.map(column))
            .from(self.table())
            .to_owned();

        let backend = self.conn.get_database_backend();
        let rows = self.conn.query_all(backend.build(&stmt)).await?;

        rows.iter().map(Self::map_row).collect()
    }

    pub async fn insert(&self, anime: &Anime) -> anyhow::Result<()> {
        let stmt = Query::insert()
            .into_table(self.table())
            .columns(Field::ALL.map(column))
            .values([
                Expr::value(anime.id.as_str()),
                Expr::value(anime.name.clone()),
                Expr::value(anime.link.clone()),
                Expr::value(i64::from(anime.current_episode)),
                Expr::value(i64::from(anime.total_episodes)),
                Expr::value(anime.is_airing_finished),
                Expr::value(anime.is_finished),
            ])?
            .to_owned();

        let backend = self.conn.get_database_backend();
        self.conn.execute(backend.build(&stmt)).await?;

        info!("Added anime {} ({})", anime.name, anime.id);
        Ok(())
    }

    pub async fn delete(&self, id: &RecordId) -> anyhow::Result<bool> {
        let stmt = Query::delete()
            .from_table(self.table())
            .and_where(Expr::col(column(Field::Id)).eq(id.as_str()))
            .to_owned();

        let backend = self.conn.get_database_backend();
        let result = self.conn.execute(backend.build(&stmt)).await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!("Removed anime with ID: {}", id);
        }
        Ok(removed)
    }

    /// Writes one field of one record.
    pub async fn set_field(
        &self,
        id: &RecordId,
        field: Field,
        value: &FieldValue,
    ) -> anyhow::Result<bool> {
        let stmt = Query::update()
            .table(self.table())
            .value(column(field), value_expr(value))
            .and_where(Expr::col(column(Field::Id)).eq(id.as_str()))
            .to_owned();

        let backend = self.conn.get_database_backend();
        let result = self.conn.execute(backend.build(&stmt)).await?;

        debug!(%id, field = field.storage_name(), "Updated anime field");
        Ok(result.rows_affected() > 0)
    }
}

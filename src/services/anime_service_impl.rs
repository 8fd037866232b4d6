//! `SeaORM` implementation of the `AnimeService` trait.
//!
//! Every operation starts from one bulk read of the collection and filters in
//! memory; writes go through the store one record or one field at a time.

use crate::db::Store;
use crate::domain::{Field, RecordId, coerce_value, resolve_field_name};
use crate::models::anime::{Anime, AnimePattern};
use crate::services::anime_service::{
    AnimeError, AnimeService, UpdateRejection, check_update_guards, filter_matches,
    full_update_order,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// SeaORM-based implementation of [`AnimeService`].
pub struct SeaOrmAnimeService {
    store: Arc<Store>,
}

impl SeaOrmAnimeService {
    #[must_use]
    pub const fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<Anime, AnimeError> {
        self.find_matches(&AnimePattern::by_id(id.clone()), false)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AnimeError::NotFound(id.clone()))
    }
}

#[async_trait::async_trait]
impl AnimeService for SeaOrmAnimeService {
    async fn find_matches(
        &self,
        pattern: &AnimePattern,
        exact: bool,
    ) -> Result<Vec<Anime>, AnimeError> {
        let records = self.store.list_all_anime().await?;
        Ok(filter_matches(records, pattern, exact))
    }

    async fn is_duplicate_name(&self, name: &str) -> Result<bool, AnimeError> {
        let found = self.find_matches(&AnimePattern::by_name(name), true).await?;
        Ok(!found.is_empty())
    }

    async fn create(&self, anime: Anime) -> Result<Anime, AnimeError> {
        if self.is_duplicate_name(&anime.name).await? {
            info!(name = %anime.name, "Refusing to create duplicate anime");
            return Err(AnimeError::DuplicateName(anime.name));
        }

        self.store.add_anime(&anime).await?;
        Ok(anime)
    }

    async fn delete_by_id(&self, id: &RecordId) -> Result<Anime, AnimeError> {
        let anime = self.find_by_id(id).await?;

        if !self.store.remove_anime(id).await? {
            return Err(AnimeError::NotFound(id.clone()));
        }

        Ok(anime)
    }

    async fn partial_update(
        &self,
        id: &RecordId,
        field: &str,
        raw_value: &str,
    ) -> Result<Anime, AnimeError> {
        let field = resolve_field_name(field).map_err(UpdateRejection::from)?;
        let value = coerce_value(field, raw_value).map_err(UpdateRejection::from)?;

        let current = self.find_by_id(id).await?;

        if let Err(rejection) = check_update_guards(&current, field, &value) {
            warn!(%id, %field, value = raw_value, "Update rejected: {rejection}");
            return Err(rejection.into());
        }

        if let Some(name) = value.as_text().filter(|_| field == Field::Name)
            && self.is_duplicate_name(name).await?
        {
            warn!(%id, name, "Update rejected: name already in use");
            return Err(UpdateRejection::DuplicateName(name.to_string()).into());
        }

        if !self.store.set_anime_field(id, field, &value).await? {
            return Err(AnimeError::NotFound(id.clone()));
        }

        debug!(%id, %field, "Anime field updated");
        self.find_by_id(id).await
    }

    async fn full_update(
        &self,
        id: &RecordId,
        changes: &AnimePattern,
    ) -> Result<Anime, AnimeError> {
        let mut applied = 0_usize;

        for field in full_update_order(changes) {
            let Some(raw) = changes.raw_value(field) else {
                continue;
            };

            if let Err(err) = self.partial_update(id, field.wire_name(), &raw).await {
                if applied > 0 {
                    warn!(%id, %field, applied, "Full update stopped part-way; earlier fields stay written");
                }
                return Err(err);
            }
            applied += 1;
        }

        self.find_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldError;

    async fn service() -> SeaOrmAnimeService {
        let path = std::env::temp_dir().join(format!("watchlist-svc-{}.db", uuid::Uuid::new_v4()));
        let db_url = format!("sqlite:{}", path.display());
        let store = Store::new(&db_url, "Animes")
            .await
            .expect("Failed to open test store");
        SeaOrmAnimeService::new(Arc::new(store))
    }

    fn new_anime(name: &str, current: i32, total: i32) -> AnimePattern {
        AnimePattern {
            name: Some(name.to_string()),
            current_episode: Some(current),
            total_episodes: Some(total),
            is_airing_finished: Some(true),
            ..AnimePattern::default()
        }
    }

    async fn seed(svc: &SeaOrmAnimeService, name: &str, current: i32, total: i32) -> Anime {
        svc.validate_and_create(new_anime(name, current, total))
            .await
            .expect("seed record")
    }

    #[tokio::test]
    async fn error_conversions_work() {
        let db_err = sea_orm::DbErr::Custom("test".to_string());
        let anime_err: AnimeError = db_err.into();
        assert!(matches!(anime_err, AnimeError::Store(_)));
    }

    #[tokio::test]
    async fn create_then_list() {
        let svc = service().await;
        let created = seed(&svc, "Frieren", 1, 28).await;

        assert!(!created.is_finished);
        assert_eq!(created.id.as_str().len(), 24);

        let all = svc.find_matches(&AnimePattern::default(), false).await.unwrap();
        assert_eq!(all, vec![created]);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_names_in_any_case() {
        let svc = service().await;
        seed(&svc, "Frieren", 1, 28).await;

        let err = svc
            .validate_and_create(new_anime("FRIEREN", 0, 28))
            .await
            .unwrap_err();
        assert!(matches!(err, AnimeError::DuplicateName(_)));

        let all = svc.find_matches(&AnimePattern::default(), false).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn create_reports_every_validation_error() {
        let svc = service().await;
        let err = svc
            .validate_and_create(AnimePattern {
                name: Some("x".to_string()),
                current_episode: Some(5),
                total_episodes: Some(2),
                is_airing_finished: Some(false),
                is_finished: Some(true),
                ..AnimePattern::default()
            })
            .await
            .unwrap_err();

        let AnimeError::Validation(errors) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 3);
        assert!(svc.find_matches(&AnimePattern::default(), false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_update_delete_scenario() {
        let svc = service().await;
        let record = AnimePattern {
            is_finished: Some(true),
            ..new_anime("TestAnime", 0, 2)
        };

        let created = svc.validate_and_create(record.clone()).await.unwrap();
        assert!(created.is_finished);
        assert_eq!(created.id.as_str().len(), 24);

        assert!(svc.validate_and_create(record).await.is_err());

        let renamed = svc.partial_update(&created.id, "name", "!!").await.unwrap();
        assert_eq!(renamed.name, "!!");

        let lookup = AnimePattern {
            id: Some(created.id.clone()),
            name: Some("!!".to_string()),
            ..AnimePattern::default()
        };
        let found = svc.find_matches(&lookup, false).await.unwrap();
        assert_eq!(found, vec![renamed.clone()]);

        let deleted = svc.delete_by_id(&created.id).await.unwrap();
        assert_eq!(deleted, renamed);

        let err = svc.delete_by_id(&created.id).await.unwrap_err();
        assert!(matches!(err, AnimeError::NotFound(_)));
    }

    #[tokio::test]
    async fn full_update_reopens_finished_record() {
        let svc = service().await;
        let created = seed(&svc, "Mushishi", 26, 26).await;
        assert!(created.is_finished && created.is_airing_finished);

        let changes = AnimePattern {
            is_airing_finished: Some(false),
            is_finished: Some(false),
            ..AnimePattern::default()
        };
        let updated = svc
            .validate_and_full_update(&created.id, &changes)
            .await
            .unwrap();
        assert!(!updated.is_finished);
        assert!(!updated.is_airing_finished);
    }

    #[tokio::test]
    async fn largest_count_survives_create_and_update() {
        let svc = service().await;
        let created = seed(&svc, "One Piece", 1, i32::MAX).await;
        assert_eq!(i64::from(created.total_episodes), i64::from(i32::MAX));

        let changes = AnimePattern {
            total_episodes: Some(i32::MAX),
            ..AnimePattern::default()
        };
        let updated = svc
            .validate_and_full_update(&created.id, &changes)
            .await
            .unwrap();
        assert_eq!(updated.total_episodes, created.total_episodes);

        let err = svc
            .partial_update(&created.id, "total_episodes", "3000000000")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnimeError::Rejected(UpdateRejection::Field(FieldError::TypeMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn episode_guards_leave_record_unchanged() {
        let svc = service().await;
        let created = seed(&svc, "Mushishi", 5, 26).await;

        let err = svc
            .partial_update(&created.id, "current_episode", "999")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnimeError::Rejected(UpdateRejection::CurrentExceedsTotal { .. })
        ));

        let err = svc
            .partial_update(&created.id, "total_episodes", "4")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnimeError::Rejected(UpdateRejection::TotalBelowCurrent { .. })
        ));

        let stored = svc.find_by_id(&created.id).await.unwrap();
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn unknown_field_and_bad_values_are_rejected() {
        let svc = service().await;
        let created = seed(&svc, "Monster", 10, 74).await;

        let err = svc
            .partial_update(&created.id, "unknown_field", "x")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnimeError::Rejected(UpdateRejection::Field(FieldError::UnknownField(_)))
        ));

        for (field, value) in [
            ("current_episode", "-1"),
            ("current_episode", "abc"),
            ("finished", "maybe"),
        ] {
            let err = svc.partial_update(&created.id, field, value).await.unwrap_err();
            assert!(matches!(
                err,
                AnimeError::Rejected(UpdateRejection::Field(FieldError::TypeMismatch { .. }))
            ));
        }

        let err = svc
            .partial_update(&created.id, "_id", &RecordId::generate().into_inner())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnimeError::Rejected(UpdateRejection::Immutable(Field::Id))
        ));

        assert_eq!(svc.find_by_id(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn rename_to_own_name_is_rejected() {
        let svc = service().await;
        let created = seed(&svc, "Monster", 10, 74).await;

        let err = svc
            .partial_update(&created.id, "Name", "monster")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnimeError::Rejected(UpdateRejection::DuplicateName(_))
        ));
    }

    #[tokio::test]
    async fn legacy_field_names_update_storage() {
        let svc = service().await;
        let created = seed(&svc, "Mushishi", 26, 26).await;
        assert!(created.is_finished);

        let updated = svc
            .partial_update(&created.id, "DoneWatching", "FALSE")
            .await
            .unwrap();
        assert!(!updated.is_finished);

        let updated = svc
            .partial_update(&updated.id, "finished_airing", "false")
            .await
            .unwrap();
        assert!(!updated.is_airing_finished);

        let err = svc
            .partial_update(&updated.id, "is_finished", "true")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnimeError::Rejected(UpdateRejection::FinishedWhileAiring)
        ));
    }

    #[tokio::test]
    async fn partial_update_on_missing_record() {
        let svc = service().await;
        let err = svc
            .partial_update(&RecordId::generate(), "current_episode", "1")
            .await
            .unwrap_err();
        assert!(matches!(err, AnimeError::NotFound(_)));
    }

    #[tokio::test]
    async fn full_update_applies_totals_before_current() {
        let svc = service().await;
        let created = seed(&svc, "Frieren", 10, 12).await;

        let changes = AnimePattern {
            current_episode: Some(20),
            total_episodes: Some(28),
            link: Some("https://example.org/frieren/%ep".to_string()),
            ..AnimePattern::default()
        };
        let updated = svc
            .validate_and_full_update(&created.id, &changes)
            .await
            .unwrap();

        assert_eq!(updated.current_episode, 20);
        assert_eq!(updated.total_episodes, 28);
        assert_eq!(
            updated.resolved_link().as_deref(),
            Some("https://example.org/frieren/20")
        );
    }

    #[tokio::test]
    async fn full_update_keeps_fields_applied_before_a_failure() {
        let svc = service().await;
        let created = seed(&svc, "Frieren", 10, 12).await;

        let changes = AnimePattern {
            name: Some("Sousou no Frieren".to_string()),
            current_episode: Some(50),
            ..AnimePattern::default()
        };
        let err = svc.full_update(&created.id, &changes).await.unwrap_err();
        assert!(matches!(
            err,
            AnimeError::Rejected(UpdateRejection::CurrentExceedsTotal { .. })
        ));

        let stored = svc.find_by_id(&created.id).await.unwrap();
        assert_eq!(stored.name, "Sousou no Frieren");
        assert_eq!(stored.current_episode, 10);
    }

    #[tokio::test]
    async fn full_update_validates_before_writing() {
        let svc = service().await;
        let created = seed(&svc, "Frieren", 1, 28).await;

        let changes = AnimePattern {
            name: Some("ok name".to_string()),
            link: Some("http://insecure.example".to_string()),
            ..AnimePattern::default()
        };
        let err = svc
            .validate_and_full_update(&created.id, &changes)
            .await
            .unwrap_err();
        assert!(matches!(err, AnimeError::Validation(_)));
        assert_eq!(svc.find_by_id(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn exact_and_substring_lookups() {
        let svc = service().await;
        seed(&svc, "Steins;Gate", 1, 24).await;
        seed(&svc, "Steins;Gate 0", 1, 23).await;

        let loose = svc
            .find_matches(&AnimePattern::by_name("gate"), false)
            .await
            .unwrap();
        assert_eq!(loose.len(), 2);

        assert!(svc.is_duplicate_name("steins;gate").await.unwrap());
        assert!(!svc.is_duplicate_name("steins").await.unwrap());
    }

    // Guards and writes are not atomic: two updates racing on one record may
    // both pass against the same snapshot. Only the per-update outcome is
    // checked here.
    #[tokio::test]
    async fn concurrent_updates_each_land_or_fail_cleanly() {
        let svc = Arc::new(service().await);
        let created = seed(&svc, "Monster", 1, 10).await;

        let (a, b) = tokio::join!(
            svc.partial_update(&created.id, "total_episodes", "5"),
            svc.partial_update(&created.id, "current_episode", "8"),
        );
        assert!(a.is_ok() || b.is_ok());

        let stored = svc.find_by_id(&created.id).await.unwrap();
        if a.is_ok() {
            assert_eq!(stored.total_episodes, 5);
        }
        if b.is_ok() {
            assert_eq!(stored.current_episode, 8);
        }
    }
}

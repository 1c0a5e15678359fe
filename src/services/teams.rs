//! Team management.

use crate::db::pool::{self, DbPool};
use crate::db::{teams, DbError};
use crate::error::{AppError, ConflictCode};
use crate::models::Team;
use crate::services::deadline::with_deadline;
use tokio::time::Instant;

#[derive(Clone)]
pub struct TeamService {
    pool: DbPool,
}

impl TeamService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a team and upsert its members in one transaction.
    ///
    /// A member that already belongs to another team is moved to this one.
    pub async fn add_team(&self, team: Team, deadline: Instant) -> Result<Team, AppError> {
        validate_team(&team)?;

        with_deadline("AddTeam", deadline, async {
            let mut tx = pool::begin_write(&self.pool)
                .await
                .map_err(|e| AppError::from_db(e.into(), "AddTeam: begin transaction"))?;

            teams::create_team(&mut tx, &team.team_name)
                .await
                .map_err(|e| match e {
                    DbError::AlreadyExists { .. } => AppError::conflict(
                        ConflictCode::TeamExists,
                        format!("team {} already exists", team.team_name),
                    ),
                    other => AppError::from_db(other, "AddTeam: create team"),
                })?;

            teams::upsert_members(&mut tx, &team.team_name, &team.members)
                .await
                .map_err(|e| AppError::from_db(e, "AddTeam: upsert members"))?;

            let created = teams::get_team(&mut tx, &team.team_name)
                .await
                .map_err(|e| AppError::from_db(e, "AddTeam: reload team"))?;

            tx.commit()
                .await
                .map_err(|e| AppError::from_db(e.into(), "AddTeam: commit"))?;

            log::info!(
                "[teams] Added team {} with {} members",
                created.team_name,
                created.members.len()
            );

            Ok(created)
        })
        .await
    }

    /// Get a team with its members ordered by user id.
    pub async fn get_team(&self, team_name: &str, deadline: Instant) -> Result<Team, AppError> {
        with_deadline("GetTeam", deadline, async {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| AppError::from_db(e.into(), "GetTeam: acquire"))?;

            teams::get_team(&mut conn, team_name)
                .await
                .map_err(|e| AppError::from_db(e, "GetTeam: read team"))
        })
        .await
    }
}

fn validate_team(team: &Team) -> Result<(), AppError> {
    if team.team_name.trim().is_empty() {
        return Err(AppError::invalid_input_field(
            "team name must not be empty",
            "team_name",
        ));
    }

    if team.members.is_empty() {
        return Err(AppError::invalid_input_field(
            "team must have at least one member",
            "members",
        ));
    }

    if team.members.iter().any(|m| m.user_id.trim().is_empty()) {
        return Err(AppError::invalid_input_field(
            "member user_id must not be empty",
            "members",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::TeamMember;
    use crate::services::deadline::after_secs;
    use tempfile::tempdir;

    fn team(name: &str, ids: &[&str]) -> Team {
        Team {
            team_name: name.to_string(),
            members: ids
                .iter()
                .map(|id| TeamMember {
                    user_id: id.to_string(),
                    username: format!("user-{id}"),
                    is_active: true,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_add_and_get_team() {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("test.db"), 2).await.unwrap();
        let service = TeamService::new(pool);

        let created = service
            .add_team(team("backend", &["u2", "u1"]), after_secs(5))
            .await
            .unwrap();
        assert_eq!(created, team("backend", &["u1", "u2"]));

        let fetched = service.get_team("backend", after_secs(5)).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_add_existing_team_conflicts() {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("test.db"), 2).await.unwrap();
        let service = TeamService::new(pool);
        service
            .add_team(team("backend", &["u1"]), after_secs(5))
            .await
            .unwrap();

        let err = service
            .add_team(team("backend", &["u9"]), after_secs(5))
            .await
            .unwrap_err();

        assert_eq!(err.conflict_code(), Some(ConflictCode::TeamExists));
        let fetched = service.get_team("backend", after_secs(5)).await.unwrap();
        assert_eq!(fetched, team("backend", &["u1"]));
    }

    #[tokio::test]
    async fn test_missing_team_is_not_found() {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("test.db"), 2).await.unwrap();
        let service = TeamService::new(pool);

        let err = service.get_team("nobody", after_secs(5)).await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_validate_team() {
        assert!(validate_team(&team("backend", &["u1"])).is_ok());
        assert!(matches!(
            validate_team(&team(" ", &["u1"])),
            Err(AppError::InvalidInput { .. })
        ));
        assert!(matches!(
            validate_team(&team("backend", &[])),
            Err(AppError::InvalidInput { .. })
        ));
        assert!(matches!(
            validate_team(&team("backend", &[""])),
            Err(AppError::InvalidInput { .. })
        ));
    }
}

//! Database queries for teams and team membership.
//!
//! The membership lookups here decide who may review a pull request, so they
//! always run on the caller's connection (which may be an open transaction).

use super::{is_unique_violation, DbError};
use crate::models::{Team, TeamMember};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

/// Outcome of a teammate lookup for a pull request author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeammateLookup {
    /// The author has no membership record at all.
    UnknownAuthor,
    /// The author is known but no teammate qualified.
    NoCandidate,
    /// Qualifying teammates ordered by user id, never empty.
    Found(Vec<String>),
}

impl TeammateLookup {
    /// Teammate ids, or `None` for an unknown author.
    pub fn into_ids(self) -> Option<Vec<String>> {
        match self {
            Self::UnknownAuthor => None,
            Self::NoCandidate => Some(Vec::new()),
            Self::Found(ids) => Some(ids),
        }
    }
}

/// Check whether a team exists.
pub async fn team_exists(conn: &mut SqliteConnection, team_name: &str) -> Result<bool, DbError> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT team_name FROM teams WHERE team_name = ?")
            .bind(team_name)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(found.is_some())
}

/// Insert a new team.
pub async fn create_team(conn: &mut SqliteConnection, team_name: &str) -> Result<(), DbError> {
    sqlx::query("INSERT INTO teams (team_name) VALUES (?)")
        .bind(team_name)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::AlreadyExists {
                    entity: "Team",
                    id: team_name.to_string(),
                }
            } else {
                DbError::from(e)
            }
        })?;

    Ok(())
}

/// Insert or update team members.
///
/// A user that already exists is moved to `team_name` and takes the new
/// username and activity flag.
pub async fn upsert_members(
    conn: &mut SqliteConnection,
    team_name: &str,
    members: &[TeamMember],
) -> Result<(), DbError> {
    if members.is_empty() {
        return Ok(());
    }

    let mut query =
        QueryBuilder::<Sqlite>::new("INSERT INTO users (user_id, username, team_name, is_active) ");
    query.push_values(members, |mut row, member| {
        row.push_bind(member.user_id.as_str())
            .push_bind(member.username.as_str())
            .push_bind(team_name)
            .push_bind(member.is_active);
    });
    query.push(
        r#"
        ON CONFLICT (user_id) DO UPDATE SET
            username = excluded.username,
            team_name = excluded.team_name,
            is_active = excluded.is_active
        "#,
    );

    query.build().execute(&mut *conn).await?;

    Ok(())
}

/// Get a team with its members ordered by user id.
pub async fn get_team(conn: &mut SqliteConnection, team_name: &str) -> Result<Team, DbError> {
    if !team_exists(conn, team_name).await? {
        return Err(DbError::not_found("Team", team_name));
    }

    let members: Vec<TeamMember> = sqlx::query_as(
        r#"
        SELECT user_id, username, is_active
        FROM users
        WHERE team_name = ?
        ORDER BY user_id
        "#,
    )
    .bind(team_name)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Team {
        team_name: team_name.to_string(),
        members,
    })
}

/// Team of a user, or `None` if the user has no membership record.
pub async fn user_team(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<String>, DbError> {
    let team_name = sqlx::query_scalar("SELECT team_name FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(team_name)
}

/// Active teammates of `author_id`, skipping the author and `excluded`.
///
/// Returns at most `limit` ids in ascending order.
pub async fn active_teammates(
    conn: &mut SqliteConnection,
    author_id: &str,
    excluded: &[String],
    limit: i64,
) -> Result<TeammateLookup, DbError> {
    let Some(team_name) = user_team(conn, author_id).await? else {
        return Ok(TeammateLookup::UnknownAuthor);
    };

    let mut query = QueryBuilder::<Sqlite>::new("SELECT user_id FROM users WHERE team_name = ");
    query.push_bind(team_name.as_str());
    query.push(" AND is_active = 1 AND user_id != ");
    query.push_bind(author_id);

    if !excluded.is_empty() {
        query.push(" AND user_id NOT IN (");
        let mut ids = query.separated(", ");
        for id in excluded {
            ids.push_bind(id.as_str());
        }
        ids.push_unseparated(")");
    }

    query.push(" ORDER BY user_id LIMIT ");
    query.push_bind(limit);

    let ids: Vec<String> = query
        .build_query_scalar()
        .fetch_all(&mut *conn)
        .await?;

    if ids.is_empty() {
        Ok(TeammateLookup::NoCandidate)
    } else {
        Ok(TeammateLookup::Found(ids))
    }
}

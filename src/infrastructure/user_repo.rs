use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::db::DbPool;
use crate::domain::errors::WorkflowError;
use crate::domain::order::Role;
use crate::domain::ports::UserStore;
use crate::domain::user::{NewUserRecord, UserRecord};
use crate::schema::users;

use super::models::{NewUserRow, UserRow};

pub struct DieselUserStore {
    pool: DbPool,
}

impl DieselUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_record(row: UserRow) -> Result<UserRecord, WorkflowError> {
    let role = Role::parse(&row.role)
        .ok_or_else(|| WorkflowError::StoreUnavailable(format!("unknown role '{}'", row.role)))?;
    Ok(UserRecord {
        id: row.id,
        email: row.email,
        password_hash: row.password_hash,
        name: row.name,
        role,
        created_at: row.created_at,
    })
}

impl UserStore for DieselUserStore {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, WorkflowError> {
        let mut conn = self.pool.get()?;
        let row = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(to_record).transpose()
    }

    fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, WorkflowError> {
        let mut conn = self.pool.get()?;
        let row = users::table
            .filter(users::id.eq(id))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(to_record).transpose()
    }

    fn insert(&self, user: NewUserRecord) -> Result<UserRecord, WorkflowError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(users::table)
            .values(&NewUserRow {
                email: user.email,
                password_hash: user.password_hash,
                name: user.name,
                role: user.role.as_str().to_string(),
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match e {
                // The unique index on email backs the registration check.
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    WorkflowError::EmailAlreadyRegistered
                }
                other => other.into(),
            })?;
        to_record(row)
    }
}

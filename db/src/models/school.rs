use chrono::{DateTime, Datelike, Months, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryFilter};
use serde::Serialize;

use crate::error::DomainError;
use crate::models::{school_class, user};

/// Tenant root. Every role-scoped row in the system carries this id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "schools")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// Short unique identifier used on documents and in imports.
    pub code: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub sms_monthly_limit: i32,
    pub sms_used: i32,
    pub sms_reset_date: DateTime<Utc>,
    pub academic_year: String,
    pub term_system: String,
    pub grading_system: String,
    /// Minimum attendance rate (percent) before a student is flagged.
    pub attendance_threshold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    Users,
    #[sea_orm(has_many = "super::school_class::Entity")]
    Classes,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::school_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classes.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Aggregate counters surfaced by the school stats endpoints.
#[derive(Debug, Serialize)]
pub struct SchoolStats {
    pub teachers: u64,
    pub students: u64,
    pub classes: u64,
    pub sms_used: i32,
    pub sms_monthly_limit: i32,
}

impl Model {
    pub async fn create(
        db: &DbConn,
        name: &str,
        code: &str,
        address: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Model, DomainError> {
        let now = Utc::now();
        let school = ActiveModel {
            name: Set(name.to_owned()),
            code: Set(code.to_owned()),
            address: Set(address.map(str::to_owned)),
            email: Set(email.map(str::to_owned)),
            phone: Set(phone.map(str::to_owned)),
            sms_monthly_limit: Set(1000),
            sms_used: Set(0),
            sms_reset_date: Set(now),
            academic_year: Set(format!("{}", now.year())),
            term_system: Set("three_term".to_owned()),
            grading_system: Set("standard".to_owned()),
            attendance_threshold: Set(75),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        school
            .insert(db)
            .await
            .map_err(|e| DomainError::on_conflict(e, "A school with this code already exists"))
    }

    /// Count one outbound SMS against the school's monthly quota.
    ///
    /// Invoked by the notification sender collaborator; refuses once the
    /// quota is exhausted.
    pub async fn increment_sms_used(db: &DbConn, school_id: i64) -> Result<Model, DomainError> {
        let school = Entity::find_by_id(school_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("School not found"))?;

        if school.sms_used >= school.sms_monthly_limit {
            return Err(DomainError::invalid("Monthly SMS quota exhausted"));
        }

        let used = school.sms_used;
        let mut active: ActiveModel = school.into();
        active.sms_used = Set(used + 1);
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    /// Zero the usage counter and advance the reset date one month, but only
    /// once the current period has elapsed. Intended for an external
    /// scheduler; calling early is a no-op.
    pub async fn reset_sms_if_due(
        db: &DbConn,
        school_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Model, DomainError> {
        let school = Entity::find_by_id(school_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("School not found"))?;

        if now < school.sms_reset_date {
            return Ok(school);
        }

        tracing::info!(school_id, used = school.sms_used, "Resetting monthly SMS usage");

        let next_reset = now
            .checked_add_months(Months::new(1))
            .unwrap_or(now);

        let mut active: ActiveModel = school.into();
        active.sms_used = Set(0);
        active.sms_reset_date = Set(next_reset);
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    pub async fn stats(db: &DbConn, school_id: i64) -> Result<SchoolStats, DomainError> {
        let school = Entity::find_by_id(school_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("School not found"))?;

        let teachers = user::Entity::find()
            .filter(user::Column::SchoolId.eq(school_id))
            .filter(user::Column::Role.eq(user::Role::Teacher))
            .count(db)
            .await?;

        let students = user::Entity::find()
            .filter(user::Column::SchoolId.eq(school_id))
            .filter(user::Column::Role.eq(user::Role::Student))
            .count(db)
            .await?;

        let classes = school_class::Entity::find()
            .filter(school_class::Column::SchoolId.eq(school_id))
            .count(db)
            .await?;

        Ok(SchoolStats {
            teachers,
            students,
            classes,
            sms_used: school.sms_used,
            sms_monthly_limit: school.sms_monthly_limit,
        })
    }
}

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::Serialize;

use crate::error::DomainError;

/// Per-school, per-grade subject catalog entry.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "subjects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub school_id: i64,
    pub name: String,
    /// Unique within the school.
    pub code: String,
    pub grade_level: i32,
    pub max_marks: i32,
    pub pass_marks: i32,
    /// Optional school-specific band table kept for report rendering;
    /// grade derivation itself uses the fixed table in `crate::grading`.
    pub grade_scale: Option<Json>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school::Entity",
        from = "Column::SchoolId",
        to = "super::school::Column::Id"
    )]
    School,
}

impl Related<super::school::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DbConn,
        school_id: i64,
        name: &str,
        code: &str,
        grade_level: i32,
        max_marks: i32,
        pass_marks: i32,
        grade_scale: Option<Json>,
    ) -> Result<Model, DomainError> {
        let existing = Entity::find()
            .filter(Column::SchoolId.eq(school_id))
            .filter(Column::Code.eq(code))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(DomainError::conflict(
                "A subject with this code already exists for this school",
            ));
        }

        let subject = ActiveModel {
            school_id: Set(school_id),
            name: Set(name.to_owned()),
            code: Set(code.to_owned()),
            grade_level: Set(grade_level),
            max_marks: Set(max_marks),
            pass_marks: Set(pass_marks),
            grade_scale: Set(grade_scale),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        subject.insert(db).await.map_err(|e| {
            DomainError::on_conflict(e, "A subject with this code already exists for this school")
        })
    }

    pub async fn list_for_school(db: &DbConn, school_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::SchoolId.eq(school_id))
            .order_by_asc(Column::Code)
            .all(db)
            .await
    }
}

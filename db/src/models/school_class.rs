use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryFilter, QuerySelect};
use serde::Serialize;

use crate::models::{class_student, class_subject, class_subject_teacher};

/// One class (homeroom) within a school.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub school_id: i64,
    pub name: String,
    pub grade_level: i32,
    pub class_teacher_id: i64,
    pub academic_year: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school::Entity",
        from = "Column::SchoolId",
        to = "super::school::Column::Id"
    )]
    School,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ClassTeacherId",
        to = "super::user::Column::Id"
    )]
    ClassTeacher,
    #[sea_orm(has_many = "super::class_student::Entity")]
    Students,
    #[sea_orm(has_many = "super::class_subject::Entity")]
    Subjects,
}

impl Related<super::school::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::class_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
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
        grade_level: i32,
        class_teacher_id: i64,
        academic_year: &str,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let class = ActiveModel {
            school_id: Set(school_id),
            name: Set(name.to_owned()),
            grade_level: Set(grade_level),
            class_teacher_id: Set(class_teacher_id),
            academic_year: Set(academic_year.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        class.insert(db).await
    }

    pub async fn enroll_student(db: &DbConn, class_id: i64, student_id: i64) -> Result<(), DbErr> {
        class_student::ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
        }
        .insert(db)
        .await?;
        Ok(())
    }

    pub async fn add_subject_teacher(
        db: &DbConn,
        class_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbErr> {
        class_subject_teacher::ActiveModel {
            class_id: Set(class_id),
            teacher_id: Set(teacher_id),
        }
        .insert(db)
        .await?;
        Ok(())
    }

    pub async fn add_subject(
        db: &DbConn,
        class_id: i64,
        name: &str,
        teacher_id: i64,
    ) -> Result<(), DbErr> {
        class_subject::ActiveModel {
            class_id: Set(class_id),
            name: Set(name.to_owned()),
            teacher_id: Set(teacher_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(())
    }

    pub async fn is_enrolled(db: &DbConn, class_id: i64, student_id: i64) -> Result<bool, DbErr> {
        let count = class_student::Entity::find()
            .filter(class_student::Column::ClassId.eq(class_id))
            .filter(class_student::Column::StudentId.eq(student_id))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    /// A teacher "teaches" a class when they are its class teacher, one of
    /// its subject teachers, or the named teacher of one of its subjects.
    pub async fn teaches(db: &DbConn, teacher_id: i64, class_id: i64) -> Result<bool, DbErr> {
        let Some(class) = Entity::find_by_id(class_id).one(db).await? else {
            return Ok(false);
        };

        if class.class_teacher_id == teacher_id {
            return Ok(true);
        }

        let as_subject_teacher = class_subject_teacher::Entity::find()
            .filter(class_subject_teacher::Column::ClassId.eq(class_id))
            .filter(class_subject_teacher::Column::TeacherId.eq(teacher_id))
            .count(db)
            .await?;
        if as_subject_teacher > 0 {
            return Ok(true);
        }

        let as_named_teacher = class_subject::Entity::find()
            .filter(class_subject::Column::ClassId.eq(class_id))
            .filter(class_subject::Column::TeacherId.eq(teacher_id))
            .count(db)
            .await?;

        Ok(as_named_teacher > 0)
    }

    /// Every class id the teacher is linked to, across all three link kinds.
    pub async fn class_ids_for_teacher(db: &DbConn, teacher_id: i64) -> Result<Vec<i64>, DbErr> {
        let mut ids: HashSet<i64> = HashSet::new();

        let as_class_teacher: Vec<i64> = Entity::find()
            .filter(Column::ClassTeacherId.eq(teacher_id))
            .select_only()
            .column(Column::Id)
            .into_tuple()
            .all(db)
            .await?;
        ids.extend(as_class_teacher);

        let as_subject_teacher: Vec<i64> = class_subject_teacher::Entity::find()
            .filter(class_subject_teacher::Column::TeacherId.eq(teacher_id))
            .select_only()
            .column(class_subject_teacher::Column::ClassId)
            .into_tuple()
            .all(db)
            .await?;
        ids.extend(as_subject_teacher);

        let as_named_teacher: Vec<i64> = class_subject::Entity::find()
            .filter(class_subject::Column::TeacherId.eq(teacher_id))
            .select_only()
            .column(class_subject::Column::ClassId)
            .into_tuple()
            .all(db)
            .await?;
        ids.extend(as_named_teacher);

        let mut ids: Vec<i64> = ids.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

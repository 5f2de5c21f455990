use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::QueryFilter;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Platform-wide role carried by every account.
///
/// Unlike per-class assignments (see `class_subject_teachers`), the role is
/// global to the user: it decides which tenant scope applies to each request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,

    #[sea_orm(string_value = "school_admin")]
    SchoolAdmin,

    #[sea_orm(string_value = "teacher")]
    Teacher,

    #[sea_orm(string_value = "student")]
    Student,
}

/// Represents a user in the `users` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Primary key ID (auto-incremented).
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Securely hashed password string, never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// Tenant link; `None` only for super admins.
    pub school_id: Option<i64>,
    /// Staff number, teachers only.
    pub employee_id: Option<String>,
    /// Admission number, students only.
    pub student_no: Option<String>,
    /// The single class a student is enrolled in.
    pub class_id: Option<i64>,
    pub phone: Option<String>,
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
    fn hash_password(password: &str) -> Result<String, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DbErr::Custom(format!("Failed to hash password: {e}")))
    }

    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    pub async fn create(
        db: &DbConn,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
        school_id: Option<i64>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let user = ActiveModel {
            username: Set(username.to_owned()),
            email: Set(email.to_owned()),
            password_hash: Set(Self::hash_password(password)?),
            role: Set(role),
            school_id: Set(school_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        user.insert(db).await
    }

    pub async fn create_teacher(
        db: &DbConn,
        username: &str,
        email: &str,
        password: &str,
        school_id: i64,
        employee_id: &str,
        phone: Option<&str>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let user = ActiveModel {
            username: Set(username.to_owned()),
            email: Set(email.to_owned()),
            password_hash: Set(Self::hash_password(password)?),
            role: Set(Role::Teacher),
            school_id: Set(Some(school_id)),
            employee_id: Set(Some(employee_id.to_owned())),
            phone: Set(phone.map(str::to_owned)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        user.insert(db).await
    }

    pub async fn create_student(
        db: &DbConn,
        username: &str,
        email: &str,
        password: &str,
        school_id: i64,
        student_no: &str,
        class_id: i64,
        phone: Option<&str>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let user = ActiveModel {
            username: Set(username.to_owned()),
            email: Set(email.to_owned()),
            password_hash: Set(Self::hash_password(password)?),
            role: Set(Role::Student),
            school_id: Set(Some(school_id)),
            student_no: Set(Some(student_no.to_owned())),
            class_id: Set(Some(class_id)),
            phone: Set(phone.map(str::to_owned)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        user.insert(db).await
    }

    pub async fn find_by_username(db: &DbConn, username: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Username.eq(username))
            .one(db)
            .await
    }

    /// Whether `actor` may view `student`'s records (attendance, results,
    /// report cards). Students see only themselves; teachers only students
    /// enrolled in a class they teach; school admins their own school.
    pub async fn can_view_student(
        db: &DbConn,
        actor: &Model,
        student: &Model,
    ) -> Result<bool, DbErr> {
        match actor.role {
            Role::SuperAdmin => Ok(true),
            Role::SchoolAdmin => {
                Ok(actor.school_id.is_some() && actor.school_id == student.school_id)
            }
            Role::Student => Ok(actor.id == student.id),
            Role::Teacher => {
                let class_ids =
                    super::school_class::Model::class_ids_for_teacher(db, actor.id).await?;
                if class_ids.is_empty() {
                    return Ok(false);
                }
                let enrolled = super::class_student::Entity::find()
                    .filter(super::class_student::Column::ClassId.is_in(class_ids))
                    .filter(super::class_student::Column::StudentId.eq(student.id))
                    .count(db)
                    .await?;
                Ok(enrolled > 0)
            }
        }
    }
}

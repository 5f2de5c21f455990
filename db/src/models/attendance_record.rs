use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::DomainError;
use crate::grading::round2;
use crate::models::{class_student, school_class, user};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Status {
    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "absent")]
    Absent,

    #[sea_orm(string_value = "late")]
    Late,

    #[sea_orm(string_value = "excused")]
    Excused,
}

impl Status {
    /// Late and excused both count toward the attendance rate; only an
    /// outright absence does not.
    pub fn counts_as_present(self) -> bool {
        !matches!(self, Status::Absent)
    }
}

/// One student's attendance for one class on one date.
///
/// `school_id` is denormalized from the class so tenant-scoped queries
/// never need a join.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub school_id: i64,
    pub date: Date,
    pub status: Status,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
    pub is_half_day: bool,
    pub remarks: Option<String>,
    pub period_details: Option<Json>,
    pub marked_by: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::school_class::Entity",
        from = "Column::ClassId",
        to = "super::school_class::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::school::Entity",
        from = "Column::SchoolId",
        to = "super::school::Column::Id"
    )]
    School,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::school_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields accepted when marking a single student.
#[derive(Debug, Clone)]
pub struct MarkInput {
    pub student_id: i64,
    pub date: NaiveDate,
    pub status: Status,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
    pub is_half_day: bool,
    pub remarks: Option<String>,
    pub period_details: Option<Json>,
}

/// One row of a bulk mark for a single class/date.
#[derive(Debug, Clone)]
pub struct BulkMarkEntry {
    pub student_id: i64,
    pub status: Status,
    pub remarks: Option<String>,
}

/// Per-status counts plus the attendance rate over the counted records.
#[derive(Debug, Default, Serialize)]
pub struct StatusBreakdown {
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    pub excused: u64,
    pub total: u64,
    pub attendance_rate: f64,
}

impl StatusBreakdown {
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Status>,
    {
        let mut breakdown = StatusBreakdown::default();
        for status in statuses {
            breakdown.total += 1;
            match status {
                Status::Present => breakdown.present += 1,
                Status::Absent => breakdown.absent += 1,
                Status::Late => breakdown.late += 1,
                Status::Excused => breakdown.excused += 1,
            }
        }
        if breakdown.total > 0 {
            let counted = breakdown.present + breakdown.late + breakdown.excused;
            breakdown.attendance_rate =
                round2(counted as f64 / breakdown.total as f64 * 100.0);
        }
        breakdown
    }
}

/// One student's slice of a class attendance report.
#[derive(Debug, Serialize)]
pub struct StudentAttendanceSummary {
    pub student_id: i64,
    pub username: String,
    #[serde(flatten)]
    pub breakdown: StatusBreakdown,
}

#[derive(Debug, Serialize)]
pub struct ClassAttendanceReport {
    pub class_id: i64,
    pub students: Vec<StudentAttendanceSummary>,
    /// Mean of the per-student rates, rounded to two decimals.
    pub class_attendance_rate: f64,
}

impl Model {
    /// Mark one student's attendance. The caller must be a teacher assigned
    /// to the class and the student must be enrolled in it; one record per
    /// (student, class, date).
    pub async fn mark(
        db: &DbConn,
        marker: &user::Model,
        class_id: i64,
        input: MarkInput,
    ) -> Result<Model, DomainError> {
        if marker.role != user::Role::Teacher {
            return Err(DomainError::forbidden("Only teachers may mark attendance"));
        }

        let class = school_class::Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("Class not found"))?;

        if !school_class::Model::teaches(db, marker.id, class_id).await? {
            return Err(DomainError::forbidden(
                "You are not assigned to this class",
            ));
        }

        let student = user::Entity::find_by_id(input.student_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("Student not found"))?;
        if student.role != user::Role::Student {
            return Err(DomainError::invalid("Target user is not a student"));
        }
        if !school_class::Model::is_enrolled(db, class_id, student.id).await? {
            return Err(DomainError::invalid(
                "Student is not enrolled in this class",
            ));
        }

        let existing = Entity::find()
            .filter(Column::StudentId.eq(student.id))
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Date.eq(input.date))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(DomainError::conflict(
                "Attendance already marked for this student on this date",
            ));
        }

        let now = Utc::now();
        let record = ActiveModel {
            student_id: Set(student.id),
            class_id: Set(class_id),
            school_id: Set(class.school_id),
            date: Set(input.date),
            status: Set(input.status),
            time_in: Set(input.time_in),
            time_out: Set(input.time_out),
            is_half_day: Set(input.is_half_day),
            remarks: Set(input.remarks),
            period_details: Set(input.period_details),
            marked_by: Set(marker.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        record.insert(db).await.map_err(|e| {
            DomainError::on_conflict(e, "Attendance already marked for this student on this date")
        })
    }

    /// Mark a whole class for one date in a single transaction.
    ///
    /// The batch is rejected outright when any record already exists for the
    /// class/date, when a listed student is not enrolled, or when the unique
    /// index trips mid-insert (two racing bulk calls). Either all rows land
    /// or none do.
    pub async fn mark_bulk(
        db: &DbConn,
        marker: &user::Model,
        class_id: i64,
        date: NaiveDate,
        entries: Vec<BulkMarkEntry>,
    ) -> Result<Vec<Model>, DomainError> {
        if marker.role != user::Role::Teacher {
            return Err(DomainError::forbidden("Only teachers may mark attendance"));
        }
        if entries.is_empty() {
            return Err(DomainError::invalid("No students supplied"));
        }

        let mut seen: HashSet<i64> = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.student_id) {
                return Err(DomainError::invalid(format!(
                    "Student {} appears more than once in the batch",
                    entry.student_id
                )));
            }
        }

        let class = school_class::Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("Class not found"))?;

        if !school_class::Model::teaches(db, marker.id, class_id).await? {
            return Err(DomainError::forbidden(
                "You are not assigned to this class",
            ));
        }

        let already_marked = Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Date.eq(date))
            .count(db)
            .await?;
        if already_marked > 0 {
            return Err(DomainError::conflict(
                "Attendance already marked for this class on this date",
            ));
        }

        let roster: HashSet<i64> = class_student::Entity::find()
            .filter(class_student::Column::ClassId.eq(class_id))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.student_id)
            .collect();
        for entry in &entries {
            if !roster.contains(&entry.student_id) {
                return Err(DomainError::invalid(format!(
                    "Student {} is not enrolled in this class",
                    entry.student_id
                )));
            }
        }

        let now = Utc::now();
        let txn = db.begin().await.map_err(DomainError::Db)?;

        let mut inserted = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = ActiveModel {
                student_id: Set(entry.student_id),
                class_id: Set(class_id),
                school_id: Set(class.school_id),
                date: Set(date),
                status: Set(entry.status),
                remarks: Set(entry.remarks),
                is_half_day: Set(false),
                marked_by: Set(marker.id),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            let row = record.insert(&txn).await.map_err(|e| {
                DomainError::on_conflict(
                    e,
                    "Attendance already marked for this class on this date",
                )
            })?;
            inserted.push(row);
        }

        txn.commit().await.map_err(DomainError::Db)?;
        Ok(inserted)
    }

    /// Update/delete rule: the original marker, a school admin of the same
    /// school, or a super admin.
    pub fn authorize_modify(actor: &user::Model, record: &Model) -> Result<(), DomainError> {
        match actor.role {
            user::Role::SuperAdmin => Ok(()),
            user::Role::SchoolAdmin if actor.school_id == Some(record.school_id) => Ok(()),
            user::Role::Teacher if record.marked_by == actor.id => Ok(()),
            _ => Err(DomainError::forbidden(
                "You may not modify this attendance record",
            )),
        }
    }

    /// Filter limiting listings to what the caller is allowed to see.
    pub async fn scope_condition(
        db: &DbConn,
        actor: &user::Model,
    ) -> Result<Condition, DomainError> {
        let condition = match actor.role {
            user::Role::SuperAdmin => Condition::all(),
            user::Role::SchoolAdmin => {
                let school_id = actor.school_id.ok_or_else(|| {
                    DomainError::forbidden("School administrator is not linked to a school")
                })?;
                Condition::all().add(Column::SchoolId.eq(school_id))
            }
            user::Role::Teacher => {
                let class_ids = school_class::Model::class_ids_for_teacher(db, actor.id).await?;
                if class_ids.is_empty() {
                    // No classes, no records.
                    Condition::all().add(Column::Id.eq(-1))
                } else {
                    Condition::all().add(Column::ClassId.is_in(class_ids))
                }
            }
            user::Role::Student => Condition::all().add(Column::StudentId.eq(actor.id)),
        };
        Ok(condition)
    }

    /// Per-status counts over every record matching `condition`.
    pub async fn status_breakdown(
        db: &DbConn,
        condition: Condition,
    ) -> Result<StatusBreakdown, DbErr> {
        let statuses = Entity::find()
            .filter(condition)
            .all(db)
            .await?
            .into_iter()
            .map(|record| record.status);
        Ok(StatusBreakdown::from_statuses(statuses))
    }

    /// Per-student counts and rates for one class over an optional date
    /// range, plus the class-level average rate.
    pub async fn class_report(
        db: &DbConn,
        class_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<ClassAttendanceReport, DomainError> {
        school_class::Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("Class not found"))?;

        let mut query = Entity::find().filter(Column::ClassId.eq(class_id));
        if let Some(from) = from {
            query = query.filter(Column::Date.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(Column::Date.lte(to));
        }
        let records = query.all(db).await?;

        let mut per_student: HashMap<i64, Vec<Status>> = HashMap::new();
        for record in records {
            per_student
                .entry(record.student_id)
                .or_default()
                .push(record.status);
        }

        let usernames: HashMap<i64, String> = if per_student.is_empty() {
            HashMap::new()
        } else {
            let ids: Vec<i64> = per_student.keys().copied().collect();
            user::Entity::find()
                .filter(user::Column::Id.is_in(ids))
                .all(db)
                .await?
                .into_iter()
                .map(|u| (u.id, u.username))
                .collect()
        };

        let mut students: Vec<StudentAttendanceSummary> = per_student
            .into_iter()
            .map(|(student_id, statuses)| StudentAttendanceSummary {
                student_id,
                username: usernames.get(&student_id).cloned().unwrap_or_default(),
                breakdown: StatusBreakdown::from_statuses(statuses),
            })
            .collect();
        students.sort_by_key(|s| s.student_id);

        let class_attendance_rate = if students.is_empty() {
            0.0
        } else {
            round2(
                students
                    .iter()
                    .map(|s| s.breakdown.attendance_rate)
                    .sum::<f64>()
                    / students.len() as f64,
            )
        };

        Ok(ClassAttendanceReport {
            class_id,
            students,
            class_attendance_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{school, school_class, user};
    use crate::test_utils::setup_test_db;

    async fn seed(db: &DbConn) -> (user::Model, user::Model, school_class::Model) {
        let school = school::Model::create(db, "Test School", "TST", None, None, None)
            .await
            .unwrap();
        let teacher = user::Model::create_teacher(
            db,
            "att_teacher",
            "att_teacher@test.com",
            "password",
            school.id,
            "EMP001",
            None,
        )
        .await
        .unwrap();
        let class = school_class::Model::create(db, school.id, "Grade 5A", 5, teacher.id, "2026")
            .await
            .unwrap();
        let student = user::Model::create_student(
            db,
            "att_student",
            "att_student@test.com",
            "password",
            school.id,
            "S001",
            class.id,
            None,
        )
        .await
        .unwrap();
        school_class::Model::enroll_student(db, class.id, student.id)
            .await
            .unwrap();
        (teacher, student, class)
    }

    fn mark_input(student_id: i64, date: NaiveDate, status: Status) -> MarkInput {
        MarkInput {
            student_id,
            date,
            status,
            time_in: None,
            time_out: None,
            is_half_day: false,
            remarks: None,
            period_details: None,
        }
    }

    #[tokio::test]
    async fn mark_inserts_and_denormalizes_school() {
        let db = setup_test_db().await;
        let (teacher, student, class) = seed(&db).await;

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut input = mark_input(student.id, date, Status::Present);
        input.time_in = Some("07:45".into());
        input.period_details = Some(serde_json::json!({ "period_1": "present" }));
        let record = Model::mark(&db, &teacher, class.id, input).await.unwrap();

        assert_eq!(record.school_id, class.school_id);
        assert_eq!(record.marked_by, teacher.id);
        assert_eq!(record.status, Status::Present);
        assert!(record.period_details.is_some());
    }

    #[tokio::test]
    async fn duplicate_mark_conflicts() {
        let db = setup_test_db().await;
        let (teacher, student, class) = seed(&db).await;

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        Model::mark(
            &db,
            &teacher,
            class.id,
            mark_input(student.id, date, Status::Present),
        )
        .await
        .unwrap();

        let err = Model::mark(
            &db,
            &teacher,
            class.id,
            mark_input(student.id, date, Status::Late),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn mark_rejects_unenrolled_student() {
        let db = setup_test_db().await;
        let (teacher, _student, class) = seed(&db).await;

        let outsider = user::Model::create_student(
            &db,
            "outsider",
            "outsider@test.com",
            "password",
            class.school_id,
            "S099",
            class.id,
            None,
        )
        .await
        .unwrap();
        // Never added to the roster.

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let err = Model::mark(
            &db,
            &teacher,
            class.id,
            mark_input(outsider.id, date, Status::Present),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::Invalid(_)));
    }

    #[tokio::test]
    async fn bulk_mark_is_all_or_nothing() {
        let db = setup_test_db().await;
        let (teacher, student, class) = seed(&db).await;

        let other = user::Model::create_student(
            &db,
            "att_student2",
            "att_student2@test.com",
            "password",
            class.school_id,
            "S002",
            class.id,
            None,
        )
        .await
        .unwrap();
        school_class::Model::enroll_student(&db, class.id, other.id)
            .await
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        // One enrolled student plus one unknown id: nothing may land.
        let err = Model::mark_bulk(
            &db,
            &teacher,
            class.id,
            date,
            vec![
                BulkMarkEntry {
                    student_id: student.id,
                    status: Status::Present,
                    remarks: None,
                },
                BulkMarkEntry {
                    student_id: 999_999,
                    status: Status::Absent,
                    remarks: None,
                },
            ],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::Invalid(_)));

        let count = Entity::find()
            .filter(Column::ClassId.eq(class.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(count, 0);

        // Valid batch inserts every row.
        let inserted = Model::mark_bulk(
            &db,
            &teacher,
            class.id,
            date,
            vec![
                BulkMarkEntry {
                    student_id: student.id,
                    status: Status::Present,
                    remarks: None,
                },
                BulkMarkEntry {
                    student_id: other.id,
                    status: Status::Absent,
                    remarks: Some("sick".into()),
                },
            ],
        )
        .await
        .unwrap();
        assert_eq!(inserted.len(), 2);

        // A second batch for the same class/date is rejected wholesale.
        let err = Model::mark_bulk(
            &db,
            &teacher,
            class.id,
            date,
            vec![BulkMarkEntry {
                student_id: student.id,
                status: Status::Late,
                remarks: None,
            }],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn breakdown_matches_documented_example() {
        // 7 records: 4 present, 1 absent, 1 late, 1 excused -> 6/7 = 85.71
        let statuses = vec![
            Status::Present,
            Status::Present,
            Status::Present,
            Status::Present,
            Status::Absent,
            Status::Late,
            Status::Excused,
        ];
        let breakdown = StatusBreakdown::from_statuses(statuses);
        assert_eq!(breakdown.present, 4);
        assert_eq!(breakdown.absent, 1);
        assert_eq!(breakdown.late, 1);
        assert_eq!(breakdown.excused, 1);
        assert_eq!(breakdown.total, 7);
        assert_eq!(breakdown.attendance_rate, 85.71);
    }

    #[test]
    fn breakdown_of_nothing_is_zero() {
        let breakdown = StatusBreakdown::from_statuses(Vec::new());
        assert_eq!(breakdown.total, 0);
        assert_eq!(breakdown.attendance_rate, 0.0);
    }

    #[tokio::test]
    async fn teacher_cannot_modify_someone_elses_record() {
        let db = setup_test_db().await;
        let (teacher, student, class) = seed(&db).await;

        let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let record = Model::mark(
            &db,
            &teacher,
            class.id,
            mark_input(student.id, date, Status::Present),
        )
        .await
        .unwrap();

        let other_teacher = user::Model::create_teacher(
            &db,
            "att_teacher2",
            "att_teacher2@test.com",
            "password",
            class.school_id,
            "EMP002",
            None,
        )
        .await
        .unwrap();
        school_class::Model::add_subject_teacher(&db, class.id, other_teacher.id)
            .await
            .unwrap();

        // Teaches the same class, but did not author the record.
        assert!(Model::authorize_modify(&other_teacher, &record).is_err());
        assert!(Model::authorize_modify(&teacher, &record).is_ok());
    }
}

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::DomainError;
use crate::grading::{grade_for, percentage, round2};
use crate::models::{class_student, result_revision, school_class, user};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "term")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Term {
    #[sea_orm(string_value = "first")]
    First,

    #[sea_orm(string_value = "second")]
    Second,

    #[sea_orm(string_value = "third")]
    Third,

    #[sea_orm(string_value = "annual")]
    Annual,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "assessment_type")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AssessmentType {
    #[sea_orm(string_value = "quiz")]
    Quiz,

    #[sea_orm(string_value = "test")]
    Test,

    #[sea_orm(string_value = "midterm")]
    Midterm,

    #[sea_orm(string_value = "final")]
    Final,

    #[sea_orm(string_value = "project")]
    Project,

    #[sea_orm(string_value = "assignment")]
    Assignment,

    #[sea_orm(string_value = "practical")]
    Practical,

    #[sea_orm(string_value = "oral")]
    Oral,
}

/// One graded assessment for one student.
///
/// `percentage`, `grade` and `gpa` are derived from the marks on every
/// write; `percentage` is stored unrounded so banding never wobbles.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub school_id: i64,
    /// Author; only this teacher (or a school admin) may amend the record.
    pub teacher_id: i64,
    pub subject: String,
    pub assessment_type: AssessmentType,
    pub term: Term,
    pub academic_year: String,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub percentage: f64,
    pub grade: String,
    pub gpa: f64,
    pub is_published: bool,
    pub remarks: Option<String>,
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
    #[sea_orm(has_many = "super::result_revision::Entity")]
    Revisions,
}

impl Related<super::result_revision::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Revisions.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields accepted when recording a single result.
#[derive(Debug, Clone)]
pub struct NewResult {
    pub student_id: i64,
    pub class_id: i64,
    pub subject: String,
    pub assessment_type: AssessmentType,
    pub term: Term,
    pub academic_year: String,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub is_published: bool,
    pub remarks: Option<String>,
}

/// One row of a bulk create for a single class/subject/assessment.
#[derive(Debug, Clone)]
pub struct BulkResultEntry {
    pub student_id: i64,
    pub marks_obtained: f64,
}

/// Patchable fields; marks changes require a reason and append a revision.
#[derive(Debug, Clone, Default)]
pub struct UpdateResult {
    pub marks_obtained: Option<f64>,
    pub total_marks: Option<f64>,
    pub reason: Option<String>,
    pub is_published: Option<bool>,
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssessmentLine {
    pub assessment_type: AssessmentType,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub percentage: f64,
    pub grade: String,
}

#[derive(Debug, Serialize)]
pub struct SubjectReport {
    pub subject: String,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub percentage: f64,
    pub grade: String,
    pub gpa: f64,
    pub assessments: Vec<AssessmentLine>,
}

#[derive(Debug, Serialize)]
pub struct ReportCard {
    pub student_id: i64,
    pub term: Term,
    pub academic_year: String,
    pub subjects: Vec<SubjectReport>,
    pub total_marks_obtained: f64,
    pub total_marks: f64,
    pub overall_percentage: f64,
    pub overall_grade: String,
    /// Mean of the per-subject gpa values, rounded to two decimals.
    pub gpa: f64,
}

#[derive(Debug, Serialize)]
pub struct ClassResultSummary {
    pub class_id: i64,
    pub subject: String,
    pub term: Term,
    pub academic_year: String,
    pub students: u64,
    pub average_percentage: f64,
    pub highest_percentage: f64,
    pub lowest_percentage: f64,
    pub grade_distribution: BTreeMap<String, u64>,
}

fn validate_marks(obtained: f64, total: f64) -> Result<(), DomainError> {
    if total <= 0.0 {
        return Err(DomainError::invalid("Total marks must be greater than zero"));
    }
    if obtained < 0.0 || obtained > total {
        return Err(DomainError::invalid(
            "Marks obtained must be between zero and the total marks",
        ));
    }
    Ok(())
}

impl Model {
    async fn check_teacher_and_student(
        db: &DbConn,
        teacher: &user::Model,
        class_id: i64,
        student_id: i64,
    ) -> Result<school_class::Model, DomainError> {
        if teacher.role != user::Role::Teacher {
            return Err(DomainError::forbidden("Only teachers may record results"));
        }

        let class = school_class::Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("Class not found"))?;

        if !school_class::Model::teaches(db, teacher.id, class_id).await? {
            return Err(DomainError::forbidden(
                "You are not assigned to this class",
            ));
        }

        let student = user::Entity::find_by_id(student_id)
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

        Ok(class)
    }

    pub async fn create(
        db: &DbConn,
        teacher: &user::Model,
        input: NewResult,
    ) -> Result<Model, DomainError> {
        let class =
            Self::check_teacher_and_student(db, teacher, input.class_id, input.student_id).await?;
        validate_marks(input.marks_obtained, input.total_marks)?;

        let existing = Entity::find()
            .filter(Column::StudentId.eq(input.student_id))
            .filter(Column::Subject.eq(input.subject.as_str()))
            .filter(Column::AssessmentType.eq(input.assessment_type))
            .filter(Column::Term.eq(input.term))
            .filter(Column::AcademicYear.eq(input.academic_year.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(DomainError::conflict(
                "A result for this assessment already exists",
            ));
        }

        let pct = percentage(input.marks_obtained, input.total_marks);
        let band = grade_for(pct);
        let now = Utc::now();

        let result = ActiveModel {
            student_id: Set(input.student_id),
            class_id: Set(input.class_id),
            school_id: Set(class.school_id),
            teacher_id: Set(teacher.id),
            subject: Set(input.subject),
            assessment_type: Set(input.assessment_type),
            term: Set(input.term),
            academic_year: Set(input.academic_year),
            marks_obtained: Set(input.marks_obtained),
            total_marks: Set(input.total_marks),
            percentage: Set(pct),
            grade: Set(band.grade.to_owned()),
            gpa: Set(band.gpa),
            is_published: Set(input.is_published),
            remarks: Set(input.remarks),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        result
            .insert(db)
            .await
            .map_err(|e| DomainError::on_conflict(e, "A result for this assessment already exists"))
    }

    /// Record one assessment for many students of a class in a single
    /// transaction; either every row lands or none do.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_bulk(
        db: &DbConn,
        teacher: &user::Model,
        class_id: i64,
        subject: &str,
        assessment_type: AssessmentType,
        term: Term,
        academic_year: &str,
        total_marks: f64,
        is_published: bool,
        entries: Vec<BulkResultEntry>,
    ) -> Result<Vec<Model>, DomainError> {
        if teacher.role != user::Role::Teacher {
            return Err(DomainError::forbidden("Only teachers may record results"));
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
            validate_marks(entry.marks_obtained, total_marks)?;
        }

        let class = school_class::Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("Class not found"))?;

        if !school_class::Model::teaches(db, teacher.id, class_id).await? {
            return Err(DomainError::forbidden(
                "You are not assigned to this class",
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

        let student_ids: Vec<i64> = entries.iter().map(|e| e.student_id).collect();
        let duplicates = Entity::find()
            .filter(Column::StudentId.is_in(student_ids))
            .filter(Column::Subject.eq(subject))
            .filter(Column::AssessmentType.eq(assessment_type))
            .filter(Column::Term.eq(term))
            .filter(Column::AcademicYear.eq(academic_year))
            .count(db)
            .await?;
        if duplicates > 0 {
            return Err(DomainError::conflict(
                "A result for this assessment already exists for one of the students",
            ));
        }

        let now = Utc::now();
        let txn = db.begin().await.map_err(DomainError::Db)?;

        let mut inserted = Vec::with_capacity(entries.len());
        for entry in entries {
            let pct = percentage(entry.marks_obtained, total_marks);
            let band = grade_for(pct);
            let result = ActiveModel {
                student_id: Set(entry.student_id),
                class_id: Set(class_id),
                school_id: Set(class.school_id),
                teacher_id: Set(teacher.id),
                subject: Set(subject.to_owned()),
                assessment_type: Set(assessment_type),
                term: Set(term),
                academic_year: Set(academic_year.to_owned()),
                marks_obtained: Set(entry.marks_obtained),
                total_marks: Set(total_marks),
                percentage: Set(pct),
                grade: Set(band.grade.to_owned()),
                gpa: Set(band.gpa),
                is_published: Set(is_published),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            let row = result.insert(&txn).await.map_err(|e| {
                DomainError::on_conflict(
                    e,
                    "A result for this assessment already exists for one of the students",
                )
            })?;
            inserted.push(row);
        }

        txn.commit().await.map_err(DomainError::Db)?;
        Ok(inserted)
    }

    /// Update/delete rule: the authoring teacher, a school admin of the same
    /// school, or a super admin.
    pub fn authorize_modify(actor: &user::Model, record: &Model) -> Result<(), DomainError> {
        match actor.role {
            user::Role::SuperAdmin => Ok(()),
            user::Role::SchoolAdmin if actor.school_id == Some(record.school_id) => Ok(()),
            user::Role::Teacher if record.teacher_id == actor.id => Ok(()),
            _ => Err(DomainError::forbidden("You may not modify this result")),
        }
    }

    /// Apply a patch. A change to the obtained marks requires a reason and
    /// appends one revision row; the derived fields are recomputed whenever
    /// either marks value changes.
    pub async fn apply_update(
        db: &DbConn,
        actor: &user::Model,
        result_id: i64,
        patch: UpdateResult,
    ) -> Result<Model, DomainError> {
        let record = Entity::find_by_id(result_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("Result not found"))?;

        Self::authorize_modify(actor, &record)?;

        let new_obtained = patch.marks_obtained.unwrap_or(record.marks_obtained);
        let new_total = patch.total_marks.unwrap_or(record.total_marks);
        let marks_changed = new_obtained != record.marks_obtained;
        let any_marks_changed = marks_changed || new_total != record.total_marks;

        if any_marks_changed {
            validate_marks(new_obtained, new_total)?;
        }
        if marks_changed {
            match patch.reason.as_deref().map(str::trim) {
                Some(reason) if !reason.is_empty() => {}
                _ => {
                    return Err(DomainError::invalid(
                        "A reason is required when changing marks",
                    ));
                }
            }
        }

        let old_obtained = record.marks_obtained;
        let now = Utc::now();

        let mut active: ActiveModel = record.into();
        if let Some(published) = patch.is_published {
            active.is_published = Set(published);
        }
        if let Some(remarks) = patch.remarks {
            active.remarks = Set(Some(remarks));
        }
        if any_marks_changed {
            let pct = percentage(new_obtained, new_total);
            let band = grade_for(pct);
            active.marks_obtained = Set(new_obtained);
            active.total_marks = Set(new_total);
            active.percentage = Set(pct);
            active.grade = Set(band.grade.to_owned());
            active.gpa = Set(band.gpa);
        }
        active.updated_at = Set(now);

        let txn = db.begin().await.map_err(DomainError::Db)?;
        let updated = active.update(&txn).await.map_err(DomainError::Db)?;

        if marks_changed {
            // Reason presence was checked above.
            let reason = patch.reason.unwrap_or_default();
            result_revision::ActiveModel {
                result_id: Set(updated.id),
                old_marks: Set(old_obtained),
                new_marks: Set(new_obtained),
                reason: Set(reason),
                edited_by: Set(actor.id),
                edited_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(DomainError::Db)?;
        }

        txn.commit().await.map_err(DomainError::Db)?;
        Ok(updated)
    }

    /// Filter limiting listings to what the caller is allowed to see.
    /// Students additionally only ever see published results.
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
                    Condition::all().add(Column::Id.eq(-1))
                } else {
                    Condition::all().add(Column::ClassId.is_in(class_ids))
                }
            }
            user::Role::Student => Condition::all()
                .add(Column::StudentId.eq(actor.id))
                .add(Column::IsPublished.eq(true)),
        };
        Ok(condition)
    }

    /// Published results for one student/term/year folded per subject, plus
    /// the overall totals and banded grade.
    pub async fn report_card(
        db: &DbConn,
        student_id: i64,
        term: Term,
        academic_year: &str,
    ) -> Result<ReportCard, DomainError> {
        let results = Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Term.eq(term))
            .filter(Column::AcademicYear.eq(academic_year))
            .filter(Column::IsPublished.eq(true))
            .all(db)
            .await?;

        let mut per_subject: HashMap<String, Vec<Model>> = HashMap::new();
        for result in results {
            per_subject
                .entry(result.subject.clone())
                .or_default()
                .push(result);
        }

        let mut subjects: Vec<SubjectReport> = per_subject
            .into_iter()
            .map(|(subject, results)| {
                let obtained: f64 = results.iter().map(|r| r.marks_obtained).sum();
                let total: f64 = results.iter().map(|r| r.total_marks).sum();
                let pct = percentage(obtained, total);
                let band = grade_for(pct);
                let assessments = results
                    .into_iter()
                    .map(|r| AssessmentLine {
                        assessment_type: r.assessment_type,
                        marks_obtained: r.marks_obtained,
                        total_marks: r.total_marks,
                        percentage: round2(r.percentage),
                        grade: r.grade,
                    })
                    .collect();
                SubjectReport {
                    subject,
                    marks_obtained: obtained,
                    total_marks: total,
                    percentage: round2(pct),
                    grade: band.grade.to_owned(),
                    gpa: band.gpa,
                    assessments,
                }
            })
            .collect();
        subjects.sort_by(|a, b| a.subject.cmp(&b.subject));

        let total_obtained: f64 = subjects.iter().map(|s| s.marks_obtained).sum();
        let total_marks: f64 = subjects.iter().map(|s| s.total_marks).sum();
        let overall_pct = percentage(total_obtained, total_marks);
        let overall_band = grade_for(overall_pct);
        let gpa = if subjects.is_empty() {
            0.0
        } else {
            round2(subjects.iter().map(|s| s.gpa).sum::<f64>() / subjects.len() as f64)
        };

        Ok(ReportCard {
            student_id,
            term,
            academic_year: academic_year.to_owned(),
            subjects,
            total_marks_obtained: total_obtained,
            total_marks,
            overall_percentage: round2(overall_pct),
            overall_grade: overall_band.grade.to_owned(),
            gpa,
        })
    }

    /// Class average/highest/lowest percentage plus a grade histogram for
    /// one class/subject/term/year.
    pub async fn class_summary(
        db: &DbConn,
        class_id: i64,
        subject: &str,
        term: Term,
        academic_year: &str,
    ) -> Result<ClassResultSummary, DomainError> {
        school_class::Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("Class not found"))?;

        let results = Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Subject.eq(subject))
            .filter(Column::Term.eq(term))
            .filter(Column::AcademicYear.eq(academic_year))
            .all(db)
            .await?;

        let mut distribution: BTreeMap<String, u64> = BTreeMap::new();
        let mut highest = f64::MIN;
        let mut lowest = f64::MAX;
        let mut sum = 0.0;
        for result in &results {
            *distribution.entry(result.grade.clone()).or_insert(0) += 1;
            highest = highest.max(result.percentage);
            lowest = lowest.min(result.percentage);
            sum += result.percentage;
        }

        let students = results.len() as u64;
        let (average, highest, lowest) = if results.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                round2(sum / results.len() as f64),
                round2(highest),
                round2(lowest),
            )
        };

        Ok(ClassResultSummary {
            class_id,
            subject: subject.to_owned(),
            term,
            academic_year: academic_year.to_owned(),
            students,
            average_percentage: average,
            highest_percentage: highest,
            lowest_percentage: lowest,
            grade_distribution: distribution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{school, school_class, user};
    use crate::test_utils::setup_test_db;

    struct Ctx {
        teacher: user::Model,
        student: user::Model,
        class: school_class::Model,
    }

    async fn seed(db: &DbConn) -> Ctx {
        let school = school::Model::create(db, "Result School", "RES", None, None, None)
            .await
            .unwrap();
        let teacher = user::Model::create_teacher(
            db,
            "res_teacher",
            "res_teacher@test.com",
            "password",
            school.id,
            "EMP101",
            None,
        )
        .await
        .unwrap();
        let class = school_class::Model::create(db, school.id, "Grade 6B", 6, teacher.id, "2026")
            .await
            .unwrap();
        let student = user::Model::create_student(
            db,
            "res_student",
            "res_student@test.com",
            "password",
            school.id,
            "S101",
            class.id,
            None,
        )
        .await
        .unwrap();
        school_class::Model::enroll_student(db, class.id, student.id)
            .await
            .unwrap();
        Ctx {
            teacher,
            student,
            class,
        }
    }

    fn new_result(ctx: &Ctx, subject: &str, assessment: AssessmentType, marks: f64) -> NewResult {
        NewResult {
            student_id: ctx.student.id,
            class_id: ctx.class.id,
            subject: subject.to_owned(),
            assessment_type: assessment,
            term: Term::First,
            academic_year: "2026".to_owned(),
            marks_obtained: marks,
            total_marks: 60.0,
            is_published: true,
            remarks: None,
        }
    }

    #[tokio::test]
    async fn create_derives_percentage_and_grade() {
        let db = setup_test_db().await;
        let ctx = seed(&db).await;

        let result = Model::create(&db, &ctx.teacher, new_result(&ctx, "Maths", AssessmentType::Test, 42.0))
            .await
            .unwrap();

        assert_eq!(result.percentage, 70.0);
        assert_eq!(result.grade, "B+");
        assert_eq!(result.gpa, 3.0);
        assert_eq!(result.school_id, ctx.class.school_id);
    }

    #[tokio::test]
    async fn duplicate_assessment_conflicts() {
        let db = setup_test_db().await;
        let ctx = seed(&db).await;

        Model::create(&db, &ctx.teacher, new_result(&ctx, "Maths", AssessmentType::Quiz, 30.0))
            .await
            .unwrap();
        let err = Model::create(&db, &ctx.teacher, new_result(&ctx, "Maths", AssessmentType::Quiz, 40.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn marks_out_of_range_are_invalid() {
        let db = setup_test_db().await;
        let ctx = seed(&db).await;

        let err = Model::create(&db, &ctx.teacher, new_result(&ctx, "Maths", AssessmentType::Test, 61.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Invalid(_)));
    }

    #[tokio::test]
    async fn update_appends_exactly_one_revision_per_mark_change() {
        let db = setup_test_db().await;
        let ctx = seed(&db).await;

        let result = Model::create(&db, &ctx.teacher, new_result(&ctx, "Maths", AssessmentType::Test, 42.0))
            .await
            .unwrap();

        // Publish flip alone leaves the history untouched.
        let updated = Model::apply_update(
            &db,
            &ctx.teacher,
            result.id,
            UpdateResult {
                is_published: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(!updated.is_published);
        let history = result_revision::Model::for_result(&db, result.id)
            .await
            .unwrap();
        assert!(history.is_empty());

        // Changing marks without a reason is rejected.
        let err = Model::apply_update(
            &db,
            &ctx.teacher,
            result.id,
            UpdateResult {
                marks_obtained: Some(48.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::Invalid(_)));

        // A proper correction recomputes the derived fields and appends one row.
        let updated = Model::apply_update(
            &db,
            &ctx.teacher,
            result.id,
            UpdateResult {
                marks_obtained: Some(48.0),
                reason: Some("Transcription error".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.marks_obtained, 48.0);
        assert_eq!(updated.percentage, 80.0);
        assert_eq!(updated.grade, "A");

        let history = result_revision::Model::for_result(&db, result.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_marks, 42.0);
        assert_eq!(history[0].new_marks, 48.0);

        // A second correction only grows the history.
        Model::apply_update(
            &db,
            &ctx.teacher,
            result.id,
            UpdateResult {
                marks_obtained: Some(50.0),
                reason: Some("Re-mark".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let history = result_revision::Model::for_result(&db, result.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].old_marks, 42.0);
        assert_eq!(history[1].old_marks, 48.0);
    }

    #[tokio::test]
    async fn report_card_folds_subjects_and_totals() {
        let db = setup_test_db().await;
        let ctx = seed(&db).await;

        Model::create(&db, &ctx.teacher, new_result(&ctx, "Maths", AssessmentType::Test, 42.0))
            .await
            .unwrap();
        Model::create(&db, &ctx.teacher, new_result(&ctx, "Maths", AssessmentType::Final, 54.0))
            .await
            .unwrap();
        Model::create(&db, &ctx.teacher, new_result(&ctx, "English", AssessmentType::Test, 30.0))
            .await
            .unwrap();
        // Unpublished: must not appear on the card.
        let mut hidden = new_result(&ctx, "History", AssessmentType::Test, 12.0);
        hidden.is_published = false;
        Model::create(&db, &ctx.teacher, hidden).await.unwrap();

        let card = Model::report_card(&db, ctx.student.id, Term::First, "2026")
            .await
            .unwrap();

        assert_eq!(card.subjects.len(), 2);
        let maths = card.subjects.iter().find(|s| s.subject == "Maths").unwrap();
        assert_eq!(maths.marks_obtained, 96.0);
        assert_eq!(maths.total_marks, 120.0);
        assert_eq!(maths.percentage, 80.0);
        assert_eq!(maths.grade, "A");
        assert_eq!(maths.assessments.len(), 2);

        assert_eq!(card.total_marks_obtained, 126.0);
        assert_eq!(card.total_marks, 180.0);
        assert_eq!(card.overall_percentage, 70.0);
        assert_eq!(card.overall_grade, "B+");
        // Maths A (3.5) and English C+ (2.0) -> 2.75
        assert_eq!(card.gpa, 2.75);
    }

    #[tokio::test]
    async fn class_summary_histogram() {
        let db = setup_test_db().await;
        let ctx = seed(&db).await;

        let second = user::Model::create_student(
            &db,
            "res_student2",
            "res_student2@test.com",
            "password",
            ctx.class.school_id,
            "S102",
            ctx.class.id,
            None,
        )
        .await
        .unwrap();
        school_class::Model::enroll_student(&db, ctx.class.id, second.id)
            .await
            .unwrap();

        Model::create_bulk(
            &db,
            &ctx.teacher,
            ctx.class.id,
            "Maths",
            AssessmentType::Midterm,
            Term::First,
            "2026",
            60.0,
            true,
            vec![
                BulkResultEntry {
                    student_id: ctx.student.id,
                    marks_obtained: 54.0,
                },
                BulkResultEntry {
                    student_id: second.id,
                    marks_obtained: 30.0,
                },
            ],
        )
        .await
        .unwrap();

        let summary =
            Model::class_summary(&db, ctx.class.id, "Maths", Term::First, "2026")
                .await
                .unwrap();

        assert_eq!(summary.students, 2);
        assert_eq!(summary.highest_percentage, 90.0);
        assert_eq!(summary.lowest_percentage, 50.0);
        assert_eq!(summary.average_percentage, 70.0);
        assert_eq!(summary.grade_distribution.get("A+"), Some(&1));
        assert_eq!(summary.grade_distribution.get("C+"), Some(&1));
    }
}

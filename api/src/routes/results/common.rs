use db::models::{result, subject};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub school_id: i64,
    pub teacher_id: i64,
    pub subject: String,
    pub assessment_type: String,
    pub term: String,
    pub academic_year: String,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub percentage: f64,
    pub grade: String,
    pub gpa: f64,
    pub is_published: bool,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<result::Model> for ResultResponse {
    fn from(result: result::Model) -> Self {
        Self {
            id: result.id,
            student_id: result.student_id,
            class_id: result.class_id,
            school_id: result.school_id,
            teacher_id: result.teacher_id,
            subject: result.subject,
            assessment_type: result.assessment_type.to_string(),
            term: result.term.to_string(),
            academic_year: result.academic_year,
            marks_obtained: result.marks_obtained,
            total_marks: result.total_marks,
            percentage: result.percentage,
            grade: result.grade,
            gpa: result.gpa,
            is_published: result.is_published,
            remarks: result.remarks,
            created_at: result.created_at.to_rfc3339(),
            updated_at: result.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsListResponse {
    pub results: Vec<ResultResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

#[derive(Debug, Serialize, Default)]
pub struct SubjectResponse {
    pub id: i64,
    pub school_id: i64,
    pub name: String,
    pub code: String,
    pub grade_level: i32,
    pub max_marks: i32,
    pub pass_marks: i32,
    pub grade_scale: Option<Value>,
    pub created_at: String,
}

impl From<subject::Model> for SubjectResponse {
    fn from(subject: subject::Model) -> Self {
        Self {
            id: subject.id,
            school_id: subject.school_id,
            name: subject.name,
            code: subject.code,
            grade_level: subject.grade_level,
            max_marks: subject.max_marks,
            pass_marks: subject.pass_marks,
            grade_scale: subject.grade_scale,
            created_at: subject.created_at.to_rfc3339(),
        }
    }
}

use db::models::school;
use serde::Serialize;

#[derive(Debug, Serialize, Default)]
pub struct SchoolResponse {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub sms_monthly_limit: i32,
    pub sms_used: i32,
    pub sms_reset_date: String,
    pub academic_year: String,
    pub term_system: String,
    pub grading_system: String,
    pub attendance_threshold: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<school::Model> for SchoolResponse {
    fn from(school: school::Model) -> Self {
        Self {
            id: school.id,
            name: school.name,
            code: school.code,
            address: school.address,
            email: school.email,
            phone: school.phone,
            sms_monthly_limit: school.sms_monthly_limit,
            sms_used: school.sms_used,
            sms_reset_date: school.sms_reset_date.to_rfc3339(),
            academic_year: school.academic_year,
            term_system: school.term_system,
            grading_system: school.grading_system,
            attendance_threshold: school.attendance_threshold,
            created_at: school.created_at.to_rfc3339(),
            updated_at: school.updated_at.to_rfc3339(),
        }
    }
}

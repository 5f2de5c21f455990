use db::models::attendance_record::{self, StatusBreakdown};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub school_id: i64,
    pub date: String,
    pub status: String,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
    pub is_half_day: bool,
    pub remarks: Option<String>,
    pub period_details: Option<Value>,
    pub marked_by: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<attendance_record::Model> for AttendanceResponse {
    fn from(record: attendance_record::Model) -> Self {
        Self {
            id: record.id,
            student_id: record.student_id,
            class_id: record.class_id,
            school_id: record.school_id,
            date: record.date.to_string(),
            status: record.status.to_string(),
            time_in: record.time_in,
            time_out: record.time_out,
            is_half_day: record.is_half_day,
            remarks: record.remarks,
            period_details: record.period_details,
            marked_by: record.marked_by,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttendanceListResponse {
    pub records: Vec<AttendanceResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    /// Counts and rate over everything matching the filters, not just the
    /// returned page.
    pub breakdown: StatusBreakdown,
}

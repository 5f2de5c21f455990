use db::models::{school_class, user};
use serde::{Deserialize, Serialize};

/// Canonical user shape returned by auth and user-management endpoints.
#[derive(Debug, Serialize, Default)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub school_id: Option<i64>,
    pub employee_id: Option<String>,
    pub student_no: Option<String>,
    pub class_id: Option<i64>,
    pub phone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            school_id: user.school_id,
            employee_id: user.employee_id,
            student_no: user.student_no,
            class_id: user.class_id,
            phone: user.phone,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct ClassResponse {
    pub id: i64,
    pub school_id: i64,
    pub name: String,
    pub grade_level: i32,
    pub class_teacher_id: i64,
    pub academic_year: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<school_class::Model> for ClassResponse {
    fn from(class: school_class::Model) -> Self {
        Self {
            id: class.id,
            school_id: class.school_id,
            name: class.name,
            grade_level: class.grade_level,
            class_teacher_id: class.class_teacher_id,
            academic_year: class.academic_year,
            created_at: class.created_at.to_rfc3339(),
            updated_at: class.updated_at.to_rfc3339(),
        }
    }
}

/// Shared pagination parameters for listing endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PageQuery {
    /// Page number (1-based) and clamped page size.
    pub fn resolve(&self) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page)
    }
}

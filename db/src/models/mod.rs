pub mod attendance_record;
pub mod class_student;
pub mod class_subject;
pub mod class_subject_teacher;
pub mod result;
pub mod result_revision;
pub mod school;
pub mod school_class;
pub mod subject;
pub mod user;

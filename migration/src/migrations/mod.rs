pub mod m202608080001_create_schools;
pub mod m202608080002_create_users;
pub mod m202608080003_create_classes;
pub mod m202608080004_create_subjects;
pub mod m202608080005_create_attendance_records;
pub mod m202608080006_create_results;
pub mod m202608080007_create_result_revisions;

use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202608080001_create_schools::Migration),
            Box::new(migrations::m202608080002_create_users::Migration),
            Box::new(migrations::m202608080003_create_classes::Migration),
            Box::new(migrations::m202608080004_create_subjects::Migration),
            Box::new(migrations::m202608080005_create_attendance_records::Migration),
            Box::new(migrations::m202608080006_create_results::Migration),
            Box::new(migrations::m202608080007_create_result_revisions::Migration),
        ]
    }
}

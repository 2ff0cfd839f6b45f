pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_colleges;
mod m20261001_000002_create_users;
mod m20261002_000003_create_profiles;
mod m20261003_000004_create_subjects;
mod m20261003_000005_create_academic_records;
mod m20261005_000006_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_colleges::Migration),
            Box::new(m20261001_000002_create_users::Migration),
            Box::new(m20261002_000003_create_profiles::Migration),
            Box::new(m20261003_000004_create_subjects::Migration),
            Box::new(m20261003_000005_create_academic_records::Migration),
            Box::new(m20261005_000006_create_notifications::Migration),
        ]
    }
}

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_credentials;
mod m20260301_000003_create_hospitals_and_roles;
mod m20260301_000004_create_staff;
mod m20260301_000005_create_sessions;
mod m20260301_000006_create_security_events;
mod m20260301_000007_create_key_rotations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_credentials::Migration),
            Box::new(m20260301_000003_create_hospitals_and_roles::Migration),
            Box::new(m20260301_000004_create_staff::Migration),
            Box::new(m20260301_000005_create_sessions::Migration),
            Box::new(m20260301_000006_create_security_events::Migration),
            Box::new(m20260301_000007_create_key_rotations::Migration),
        ]
    }
}

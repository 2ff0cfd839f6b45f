use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subject::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Subject::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Subject::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Subject::Code)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Subject::ProfessorId).uuid().null())
                    .col(
                        ColumnDef::new(Subject::Credits)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(ColumnDef::new(Subject::CollegeId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subject_professor")
                            .from(Subject::Table, Subject::ProfessorId)
                            .to(Professor::Table, Professor::UserId)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subject_college")
                            .from(Subject::Table, Subject::CollegeId)
                            .to(College::Table, College::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subject::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Subject {
    Table,
    Id,
    Name,
    Code,
    ProfessorId,
    Credits,
    CollegeId,
}

#[derive(Iden)]
enum Professor {
    Table,
    UserId,
}

#[derive(Iden)]
enum College {
    Table,
    Id,
}

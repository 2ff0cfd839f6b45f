use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // result
        manager
            .create_table(
                Table::create()
                    .table(ExamResult::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ExamResult::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ExamResult::StudentId).uuid().not_null())
                    .col(ColumnDef::new(ExamResult::SubjectId).uuid().not_null())
                    .col(ColumnDef::new(ExamResult::CollegeId).uuid().not_null())
                    .col(
                        ColumnDef::new(ExamResult::Marks)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExamResult::Grade).string_len(5).not_null())
                    .col(
                        ColumnDef::new(ExamResult::DateRecorded)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_result_student")
                            .from(ExamResult::Table, ExamResult::StudentId)
                            .to(Student::Table, Student::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_result_subject")
                            .from(ExamResult::Table, ExamResult::SubjectId)
                            .to(Subject::Table, Subject::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_result_college")
                            .from(ExamResult::Table, ExamResult::CollegeId)
                            .to(College::Table, College::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_result_student_subject_college")
                    .table(ExamResult::Table)
                    .col(ExamResult::StudentId)
                    .col(ExamResult::SubjectId)
                    .col(ExamResult::CollegeId)
                    .to_owned(),
            )
            .await?;

        // attendance
        manager
            .create_table(
                Table::create()
                    .table(Attendance::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Attendance::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Attendance::StudentId).uuid().not_null())
                    .col(ColumnDef::new(Attendance::SubjectId).uuid().not_null())
                    .col(ColumnDef::new(Attendance::CollegeId).uuid().not_null())
                    .col(ColumnDef::new(Attendance::Date).date().not_null())
                    .col(
                        ColumnDef::new(Attendance::IsPresent)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_student")
                            .from(Attendance::Table, Attendance::StudentId)
                            .to(Student::Table, Student::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_subject")
                            .from(Attendance::Table, Attendance::SubjectId)
                            .to(Subject::Table, Subject::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_college")
                            .from(Attendance::Table, Attendance::CollegeId)
                            .to(College::Table, College::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("uq_attendance_student_subject_date_college")
                    .table(Attendance::Table)
                    .col(Attendance::StudentId)
                    .col(Attendance::SubjectId)
                    .col(Attendance::Date)
                    .col(Attendance::CollegeId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attendance::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExamResult::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ExamResult {
    #[iden = "result"]
    Table,
    Id,
    StudentId,
    SubjectId,
    CollegeId,
    Marks,
    Grade,
    DateRecorded,
}

#[derive(Iden)]
enum Attendance {
    Table,
    Id,
    StudentId,
    SubjectId,
    CollegeId,
    Date,
    IsPresent,
}

#[derive(Iden)]
enum Student {
    Table,
    UserId,
}

#[derive(Iden)]
enum Subject {
    Table,
    Id,
}

#[derive(Iden)]
enum College {
    Table,
    Id,
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(College::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(College::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(College::Name)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(College::Province).string_len(100).not_null())
                    .col(ColumnDef::new(College::Address).text().null())
                    .col(ColumnDef::new(College::ContactEmail).string_len(254).null())
                    .col(ColumnDef::new(College::PhoneNumber).string_len(20).null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(College::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum College {
    Table,
    Id,
    Name,
    Province,
    Address,
    ContactEmail,
    PhoneNumber,
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OcspResponses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OcspResponses::SerialNumber)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OcspResponses::AuthorityKeyIdentifier)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OcspResponses::Body).text().not_null())
                    .col(
                        ColumnDef::new(OcspResponses::Expiry)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_ocsp_responses")
                            .col(OcspResponses::SerialNumber)
                            .col(OcspResponses::AuthorityKeyIdentifier),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ocsp_responses_expiry")
                    .table(OcspResponses::Table)
                    .col(OcspResponses::Expiry)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OcspResponses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OcspResponses {
    Table,
    SerialNumber,
    AuthorityKeyIdentifier,
    Body,
    Expiry,
}

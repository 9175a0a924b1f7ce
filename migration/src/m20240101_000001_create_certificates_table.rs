use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certificates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Certificates::SerialNumber)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Certificates::AuthorityKeyIdentifier)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Certificates::CaLabel).string_len(128))
                    .col(
                        ColumnDef::new(Certificates::Status)
                            .string_len(16)
                            .not_null()
                            .default("good"),
                    )
                    .col(
                        ColumnDef::new(Certificates::Reason)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Certificates::Expiry)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Certificates::RevokedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Certificates::Pem).text().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_certificates")
                            .col(Certificates::SerialNumber)
                            .col(Certificates::AuthorityKeyIdentifier),
                    )
                    .to_owned(),
            )
            .await?;

        // 过期扫描索引
        manager
            .create_index(
                Index::create()
                    .name("idx_certificates_expiry")
                    .table(Certificates::Table)
                    .col(Certificates::Expiry)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certificates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Certificates {
    Table,
    SerialNumber,
    AuthorityKeyIdentifier,
    CaLabel,
    Status,
    Reason,
    Expiry,
    RevokedAt,
    Pem,
}

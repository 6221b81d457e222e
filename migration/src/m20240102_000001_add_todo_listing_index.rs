use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 一覧表示のデフォルト並び順 (Djangoの `Meta.ordering`) に合わせたインデックス。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_todo_listing")
                    .table(Todo::Table)
                    .col(Todo::IsResolved)
                    .col(Todo::Priority)
                    .col(Todo::DueDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_todo_listing")
                    .table(Todo::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Todo {
    Table,
    IsResolved,
    Priority,
    DueDate,
}

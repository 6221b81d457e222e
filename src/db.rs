use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection, DbErr};

use crate::config::Settings;

/// データベース接続をセットアップします。
/// Djangoでは `settings.py` の `DATABASES` 設定と `migrate` コマンドに相当します。
pub async fn set_up_db(settings: &Settings) -> Result<DatabaseConnection, DbErr> {
    // Database::connect は接続プールを自動的に作成します。
    let db = Database::connect(settings.database_url.as_str()).await?;

    if settings.run_migrations {
        Migrator::up(&db, None).await?;
        tracing::info!("migrations applied");
    }

    Ok(db)
}

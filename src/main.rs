use rust_django_todo::build_rocket;
use rust_django_todo::config::Settings;
use tracing_subscriber::EnvFilter;

/// アプリケーションのメインエントリーポイント。
/// Djangoの `manage.py runserver` 実行時の動きに相当します。
#[rocket::main]
async fn main() -> anyhow::Result<()> {
    // ログ設定 (Djangoの `LOGGING` 設定に相当)。`RUST_LOG` で上書き可能
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().ok();

    let settings = Settings::load()?;
    tracing::info!(run_migrations = settings.run_migrations, "starting todo app");

    let rocket = build_rocket(&settings).await?;
    rocket
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("rocket failed: {}", e))?;

    Ok(())
}

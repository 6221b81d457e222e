use rocket::figment::providers::{Env, Serialized};
use rocket::figment::Figment;
use serde::{Deserialize, Serialize};

/// アプリケーション設定。
/// Djangoの `settings.py` (DATABASES など) に相当します。
///
/// 優先順位: デフォルト値 < `DATABASE_URL` < `TODO_` で始まる環境変数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub database_url: String,
    /// 起動時にマイグレーションを実行するか (Django: `migrate`)
    pub run_migrations: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://todo.db?mode=rwc".to_string(),
            run_migrations: true,
        }
    }
}

impl Settings {
    /// `.env` と環境変数から設定を読み込みます。
    pub fn load() -> Result<Self, rocket::figment::Error> {
        dotenvy::dotenv().ok();
        Self::extract(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Env::raw().only(&["DATABASE_URL"]))
            .merge(Env::prefixed("TODO_"))
    }

    pub fn extract(figment: Figment) -> Result<Self, rocket::figment::Error> {
        figment.extract()
    }

    /// テスト用のインメモリSQLite設定
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            run_migrations: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::extract(Figment::from(Serialized::defaults(Settings::default()))).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.run_migrations);
    }

    #[test]
    fn test_override() {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(("database_url", "postgres://localhost/todo"))
            .merge(("run_migrations", false));
        let settings = Settings::extract(figment).unwrap();
        assert_eq!(settings.database_url, "postgres://localhost/todo");
        assert!(!settings.run_migrations);
    }
}

pub mod app_template;

pub use app_template::AppTemplate;

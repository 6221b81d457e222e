use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::todo::{self, Priority};

/// タイトルの最大文字数 (Django: `CharField(max_length=200)`)
pub const TITLE_MAX_LENGTH: u64 = 200;

/// TODOフォームの入力データ。
/// Djangoの `forms.ModelForm` (TodoForm) の生データに相当します。
/// 全フィールドが文字列のまま届くので、型変換とバリデーションは `validate` で行います。
#[derive(FromForm, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoForm {
    #[field(default = String::new())]
    pub title: String,
    #[field(default = String::new())]
    pub description: String,
    /// `YYYY-MM-DD` (空文字は未設定)
    #[field(default = String::new())]
    pub due_date: String,
    #[field(default = String::new())]
    pub priority: String,
    #[field(default = false)]
    pub is_resolved: bool,
}

impl From<&todo::Model> for TodoForm {
    /// 編集フォームの初期値 (Django: `instance` から `initial` を作る処理)
    fn from(model: &todo::Model) -> Self {
        Self {
            title: model.title.clone(),
            description: model.description.clone().unwrap_or_default(),
            due_date: model.due_date.map(|d| d.to_string()).unwrap_or_default(),
            priority: model.priority.as_str().to_owned(),
            is_resolved: model.is_resolved,
        }
    }
}

/// バリデーション済みのフィールド (Django: `form.cleaned_data`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub is_resolved: bool,
}

/// フィールド単位のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("This field is required.")]
    Required,
    #[error("Ensure this value has at most {max} characters.")]
    MaxLength { max: u64 },
    #[error("Enter a valid date.")]
    InvalidDate,
    #[error("Due date cannot be in the past.")]
    PastDate,
}

/// フィールド名ごとのエラー一覧 (Django: `form.errors`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<FieldError>>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, error: FieldError) {
        self.0.entry(field).or_default().push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[FieldError] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// テンプレートに渡すメッセージ一覧
    pub fn messages(&self) -> BTreeMap<&'static str, Vec<String>> {
        self.0
            .iter()
            .map(|(field, errors)| (*field, errors.iter().map(ToString::to_string).collect()))
            .collect()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, errors) in &self.0 {
            for error in errors {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, error)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// 文字数チェックは validator に任せる
#[derive(Debug, Validate)]
struct TitleValidation {
    #[validate(length(min = 1, max = 200))]
    title: String,
}

/// フォームのバリデーション。
/// Djangoの `form.is_valid()` + `clean_due_date` に相当します。
///
/// 期限日が過去でないかのチェックは新規作成 (`is_new`) のときだけ行います。
/// 既存のTODOは期限を過ぎても、また過去の日付に変更しても再チェックされません。
pub fn validate(form: &TodoForm, is_new: bool, today: NaiveDate) -> Result<ValidatedTodo, FieldErrors> {
    let mut errors = FieldErrors::default();

    let title = form.title.trim();
    let title_check = TitleValidation { title: title.to_owned() };
    if title_check.validate().is_err() {
        if title.is_empty() {
            errors.add("title", FieldError::Required);
        } else {
            errors.add("title", FieldError::MaxLength { max: TITLE_MAX_LENGTH });
        }
    }

    let description = Some(form.description.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_owned);

    let due_date = match form.due_date.trim() {
        "" => None,
        raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => {
                if is_new && date < today {
                    errors.add("due_date", FieldError::PastDate);
                }
                Some(date)
            }
            Err(_) => {
                errors.add("due_date", FieldError::InvalidDate);
                None
            }
        },
    };

    let priority = match form.priority.trim() {
        "" => Priority::default(),
        raw => raw.parse().unwrap_or_else(|e| {
            tracing::debug!("{}, falling back to {}", e, Priority::default());
            Priority::default()
        }),
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedTodo {
        title: title.to_owned(),
        description,
        due_date,
        priority,
        is_resolved: form.is_resolved,
    })
}

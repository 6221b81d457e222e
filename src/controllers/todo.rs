use std::collections::BTreeMap;

use chrono::NaiveDate;
use rocket::form::Form;
use rocket::request::{FlashMessage, Request};
use rocket::response::{self, Flash, Redirect, Responder};
use rocket::State;
use rocket_dyn_templates::context;
use serde::Serialize;

use crate::entities::todo::{self, Priority};
use crate::errors::AppError;
use crate::repository::FilterKeyword;
use crate::services::TodoService;
use crate::validation::{FieldErrors, TodoForm};
use crate::views::AppTemplate;

/// 成功時のリダイレクト先 (Django: `success_url = reverse_lazy('todo-list')`)
const LIST_URL: &str = "/";

/// フォームのフィールド名。エラー表示用に全キーを必ずテンプレートに渡す。
const FORM_FIELDS: [&str; 5] = ["title", "description", "due_date", "priority", "is_resolved"];

/// テンプレート用のTODO行。モデルに派生値を足したもの。
#[derive(Serialize)]
struct TodoRow<'a> {
    #[serde(flatten)]
    todo: &'a todo::Model,
    is_overdue: bool,
    priority_label: &'static str,
    url: String,
}

impl<'a> TodoRow<'a> {
    fn new(todo: &'a todo::Model, today: NaiveDate) -> Self {
        Self {
            todo,
            is_overdue: todo.is_overdue(today),
            priority_label: todo.priority.label(),
            url: todo.absolute_url(),
        }
    }
}

#[derive(Serialize)]
struct Choice {
    value: &'static str,
    label: &'static str,
}

/// フラッシュメッセージ (Django: `messages`)
#[derive(Serialize)]
struct Notice {
    kind: String,
    text: String,
}

fn priority_choices() -> Vec<Choice> {
    Priority::ALL
        .iter()
        .map(|p| Choice {
            value: p.as_str(),
            label: p.label(),
        })
        .collect()
}

/// 作成・編集フォームのテンプレート。
/// バリデーションエラー時は入力値とエラーを添えて再表示する (Django: `form_invalid`)。
fn form_template(form: &TodoForm, errors: &FieldErrors, todo: Option<&todo::Model>) -> AppTemplate {
    let messages = errors.messages();
    let field_errors: BTreeMap<&str, Vec<String>> = FORM_FIELDS
        .iter()
        .map(|field| (*field, messages.get(field).cloned().unwrap_or_default()))
        .collect();
    let today = TodoService::today();

    AppTemplate::new("todos/todo_form", context! {
        form: form,
        errors: field_errors,
        has_errors: !errors.is_empty(),
        priorities: priority_choices(),
        selected_priority: form.priority.parse::<Priority>().unwrap_or_default().as_str(),
        is_edit: todo.is_some(),
        todo: todo.map(|t| TodoRow::new(t, today)),
    })
}

/// フォーム送信の結果。保存できればリダイレクト、できなければフォーム再表示。
pub enum FormOutcome {
    Saved(Flash<Redirect>),
    Invalid(AppTemplate),
}

impl<'r> Responder<'r, 'static> for FormOutcome {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        match self {
            FormOutcome::Saved(redirect) => redirect.respond_to(request),
            FormOutcome::Invalid(template) => template.respond_to(request),
        }
    }
}

/// TODO一覧を表示。
/// Djangoの `TodoListView` に相当します。
#[get("/?<filter>&<page>")]
pub async fn list_todos(
    service: &State<TodoService>,
    flash: Option<FlashMessage<'_>>,
    filter: Option<&str>,
    page: Option<u64>,
) -> Result<AppTemplate, AppError> {
    let listing = service.list(FilterKeyword::parse(filter), page).await?;
    let today = TodoService::today();
    let rows: Vec<TodoRow<'_>> = listing.todos.iter().map(|t| TodoRow::new(t, today)).collect();
    let notice = flash.map(|f| Notice {
        kind: f.kind().to_owned(),
        text: f.message().to_owned(),
    });

    Ok(AppTemplate::new("todos/todo_list", context! {
        todos: rows,
        filter_type: listing.filter.as_str(),
        total_count: listing.counts.total,
        active_count: listing.counts.active,
        completed_count: listing.counts.completed,
        page: listing.page,
        num_pages: listing.num_pages,
        has_previous: listing.has_previous(),
        has_next: listing.has_next(),
        previous_page: listing.page.saturating_sub(1),
        next_page: listing.page.saturating_add(1),
        notice: notice,
    }))
}

/// TODO作成フォーム (GET)
#[get("/create")]
pub fn create_todo_form() -> AppTemplate {
    form_template(&TodoForm::default(), &FieldErrors::default(), None)
}

/// TODO作成処理 (POST)
/// Djangoの `TodoCreateView` に相当します。
#[post("/create", data = "<form>")]
pub async fn create_todo(service: &State<TodoService>, form: Form<TodoForm>) -> Result<FormOutcome, AppError> {
    match service.create(&form).await {
        Ok(_) => Ok(FormOutcome::Saved(Flash::success(
            Redirect::to(LIST_URL),
            "TODO created successfully!",
        ))),
        Err(AppError::Validation(errors)) => Ok(FormOutcome::Invalid(form_template(&form, &errors, None))),
        Err(e) => Err(e),
    }
}

/// TODO詳細 (Django: `TodoDetailView`)
#[get("/todo/<id>")]
pub async fn todo_detail(service: &State<TodoService>, id: i32) -> Result<AppTemplate, AppError> {
    let todo = service.get(id).await?;
    Ok(AppTemplate::new("todos/todo_detail", context! {
        todo: TodoRow::new(&todo, TodoService::today()),
    }))
}

/// TODO編集フォーム (GET)
#[get("/todo/<id>/edit")]
pub async fn edit_todo_form(service: &State<TodoService>, id: i32) -> Result<AppTemplate, AppError> {
    let todo = service.get(id).await?;
    Ok(form_template(&TodoForm::from(&todo), &FieldErrors::default(), Some(&todo)))
}

/// TODO編集処理 (POST)
/// Djangoの `TodoUpdateView` に相当します。
#[post("/todo/<id>/edit", data = "<form>")]
pub async fn edit_todo(service: &State<TodoService>, id: i32, form: Form<TodoForm>) -> Result<FormOutcome, AppError> {
    match service.update(id, &form).await {
        Ok(_) => Ok(FormOutcome::Saved(Flash::success(
            Redirect::to(LIST_URL),
            "TODO updated successfully!",
        ))),
        Err(AppError::Validation(errors)) => {
            // 再表示用に元のレコードを取り直す (更新はされていない)
            let todo = service.get(id).await?;
            Ok(FormOutcome::Invalid(form_template(&form, &errors, Some(&todo))))
        }
        Err(e) => Err(e),
    }
}

/// 削除確認画面 (GET)
#[get("/todo/<id>/delete")]
pub async fn delete_todo_confirm(service: &State<TodoService>, id: i32) -> Result<AppTemplate, AppError> {
    let todo = service.get(id).await?;
    Ok(AppTemplate::new("todos/todo_confirm_delete", context! {
        todo: TodoRow::new(&todo, TodoService::today()),
    }))
}

/// 削除処理 (POST)
/// Djangoの `TodoDeleteView` に相当します。
#[post("/todo/<id>/delete")]
pub async fn delete_todo(service: &State<TodoService>, id: i32) -> Result<Flash<Redirect>, AppError> {
    service.delete(id).await?;
    Ok(Flash::success(Redirect::to(LIST_URL), "TODO deleted successfully!"))
}

/// 完了/未完了の切り替え。
/// 互換性のため GET のまま (副作用のある GET)。
#[get("/todo/<id>/toggle")]
pub async fn toggle_todo(service: &State<TodoService>, id: i32) -> Result<Flash<Redirect>, AppError> {
    let (_, status) = service.toggle(id).await?;
    Ok(Flash::success(
        Redirect::to(LIST_URL),
        format!("TODO marked as {}!", status.as_str()),
    ))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list_todos,
        create_todo_form,
        create_todo,
        todo_detail,
        edit_todo_form,
        edit_todo,
        delete_todo_confirm,
        delete_todo,
        toggle_todo
    ]
}

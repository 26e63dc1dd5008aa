//! Rule sets for the task endpoints.

use std::sync::LazyLock;

use super::{FieldChain, RuleSet};
use crate::models::TaskStatus;

const MAX_TITLE_LENGTH: usize = 255;
const MAX_ESTIMATE_HOURS: f64 = 120.0;
/// Page numbers are `u32` downstream.
const MAX_PAGE: i64 = u32::MAX as i64;

fn title(optional: bool) -> FieldChain {
    let chain = FieldChain::new("title").trim();
    let chain = if optional { chain.optional() } else { chain };
    chain
        .not_empty("Title required!")
        .is_length(1, Some(MAX_TITLE_LENGTH), "Title is too long!")
}

fn content(optional: bool) -> FieldChain {
    let chain = FieldChain::new("content").trim();
    let chain = if optional { chain.optional() } else { chain };
    chain.not_empty("Content required!")
}

fn status() -> FieldChain {
    FieldChain::new("status")
        .optional()
        .not_empty("Status required!")
        .is_in(TaskStatus::WIRE_VALUES, "Invalid status value!")
}

fn start_date(optional: bool) -> FieldChain {
    let chain = FieldChain::new("start_date");
    let chain = if optional { chain.optional() } else { chain };
    chain
        .not_empty("Start date required!")
        .is_date("Invalid start date!")
}

fn end_date(optional: bool) -> FieldChain {
    let chain = FieldChain::new("end_date");
    let chain = if optional { chain.optional() } else { chain };
    chain.not_empty("End date required!").is_date("Invalid end date!")
}

fn estimate_time(optional: bool) -> FieldChain {
    let chain = FieldChain::new("estimate_time");
    let chain = if optional { chain.optional() } else { chain };
    chain
        .not_empty("Estimate time required!")
        .is_float(0.0, MAX_ESTIMATE_HOURS, "Maximum of estimate time is 120h!")
}

fn page() -> FieldChain {
    FieldChain::new("page")
        .not_empty("Page value required!")
        .is_int(1, MAX_PAGE, "Invalid page value!")
}

fn project_id(message: &'static str) -> FieldChain {
    FieldChain::new("id").not_empty(message)
}

fn task_id() -> FieldChain {
    FieldChain::new("id")
        .not_empty("No task id provided!")
        .is_entity_id("Invalid id param value!")
}

pub static ADD_TASK: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(400)
        .field(title(false))
        .field(content(false))
        .field(status())
        .field(start_date(false))
        .field(end_date(false))
        .field(estimate_time(false))
        .field(FieldChain::new("asignee").not_empty("Please provide an asignee!"))
        .field(project_id("Project id required!"))
});

pub static GET_TASKS: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(422)
        .field(project_id("Project id required!"))
        .field(page())
});

pub static GET_TASKS_BY_MEMBER: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(422)
        .field(project_id("Project id required!"))
        .field(FieldChain::new("member_id").not_empty("Member id required!"))
        .field(page())
});

pub static GET_TASKS_BY_STATUS: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(422)
        .field(project_id("No id provided!"))
        .field(
            FieldChain::new("status")
                .not_empty("No status provided!")
                .is_in(TaskStatus::WIRE_VALUES, "Invalid status value!"),
        )
        .field(page())
});

pub static GET_TASKS_BY_TITLE: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(422)
        .field(project_id("No id provided!"))
        .field(FieldChain::new("title").trim().not_empty("No title provided!"))
        .field(page())
});

pub static UPDATE_TASK: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(400)
        .field(task_id())
        .field(title(true))
        .field(content(true))
        .field(status())
        .field(start_date(true))
        .field(end_date(true))
        .field(estimate_time(true))
});

pub static REMOVE_TASK: LazyLock<RuleSet> = LazyLock::new(|| RuleSet::new(422).field(task_id()));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{FieldError, RequestFields, UNKNOWN_FIELD_MESSAGE};
    use serde_json::{json, Map, Value};

    const PROJECT: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn with_project(body: Value) -> RequestFields {
        let Value::Object(body) = body else {
            panic!("expected object");
        };
        let mut params = Map::new();
        params.insert("id".to_string(), json!(PROJECT));
        RequestFields::new(params, Map::new(), body)
    }

    fn valid_task() -> Value {
        json!({
            "title": "Write docs",
            "content": "API reference",
            "start_date": "2024-03-01",
            "end_date": "2024/03/05",
            "estimate_time": 8,
            "asignee": PROJECT
        })
    }

    #[test]
    fn test_add_task_accepts_valid_body() {
        assert!(ADD_TASK.validate(&mut with_project(valid_task())).is_ok());
    }

    #[test]
    fn test_add_task_rejects_out_of_set_status() {
        let mut body = valid_task();
        body["status"] = json!(7);
        let failure = ADD_TASK.validate(&mut with_project(body)).unwrap_err();
        assert_eq!(failure.status, 400);
        assert_eq!(
            failure.errors,
            vec![FieldError::new("status", "Invalid status value!")]
        );
    }

    #[test]
    fn test_add_task_reports_every_missing_field() {
        let failure = ADD_TASK.validate(&mut with_project(json!({}))).unwrap_err();
        let messages: Vec<_> = failure.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Title required!",
                "Content required!",
                "Start date required!",
                "End date required!",
                "Estimate time required!",
                "Please provide an asignee!",
            ]
        );
    }

    #[test]
    fn test_add_task_rejects_estimate_above_limit() {
        let mut body = valid_task();
        body["estimate_time"] = json!(120.5);
        let failure = ADD_TASK.validate(&mut with_project(body)).unwrap_err();
        assert_eq!(failure.errors[0].message, "Maximum of estimate time is 120h!");
    }

    #[test]
    fn test_add_task_rejects_unknown_field() {
        let mut body = valid_task();
        body["priority"] = json!("high");
        let failure = ADD_TASK.validate(&mut with_project(body)).unwrap_err();
        assert_eq!(
            failure.errors,
            vec![FieldError::new("priority", UNKNOWN_FIELD_MESSAGE)]
        );
    }

    #[test]
    fn test_get_tasks_requires_positive_page_with_422() {
        let mut fields = with_project(json!({}));
        fields.insert_query("page", json!("0"));
        let failure = GET_TASKS.validate(&mut fields).unwrap_err();
        assert_eq!(failure.status, 422);
        assert_eq!(failure.errors, vec![FieldError::new("page", "Invalid page value!")]);
    }

    #[test]
    fn test_get_tasks_rejects_page_beyond_u32() {
        let mut fields = with_project(json!({}));
        fields.insert_query("page", json!("4294967296"));
        let failure = GET_TASKS.validate(&mut fields).unwrap_err();
        assert_eq!(failure.status, 422);
        assert_eq!(failure.errors, vec![FieldError::new("page", "Invalid page value!")]);

        fields.insert_query("page", json!("4294967295"));
        assert!(GET_TASKS.validate(&mut fields).is_ok());
    }

    #[test]
    fn test_get_tasks_by_title_trims_query() {
        let mut fields = with_project(json!({}));
        fields.insert_query("title", json!("  docs "));
        fields.insert_query("page", json!("1"));
        GET_TASKS_BY_TITLE.validate(&mut fields).unwrap();
        assert_eq!(fields.query()["title"], json!("docs"));
    }

    #[test]
    fn test_get_tasks_by_title_requires_title() {
        let mut fields = with_project(json!({}));
        fields.insert_query("title", json!("   "));
        fields.insert_query("page", json!("1"));
        let failure = GET_TASKS_BY_TITLE.validate(&mut fields).unwrap_err();
        assert_eq!(failure.errors, vec![FieldError::new("title", "No title provided!")]);
    }

    #[test]
    fn test_title_fits_column() {
        let mut body = valid_task();
        body["title"] = json!("x".repeat(255));
        assert!(ADD_TASK.validate(&mut with_project(body.clone())).is_ok());

        body["title"] = json!("x".repeat(256));
        let failure = ADD_TASK.validate(&mut with_project(body)).unwrap_err();
        assert_eq!(failure.errors, vec![FieldError::new("title", "Title is too long!")]);
    }

    #[test]
    fn test_update_task_allows_partial_body() {
        let mut fields = with_project(json!({"status": "3"}));
        assert!(UPDATE_TASK.validate(&mut fields).is_ok());
    }

    #[test]
    fn test_remove_task_rejects_malformed_id() {
        let mut fields = RequestFields::default();
        fields.insert_param("id", json!("abc"));
        let failure = REMOVE_TASK.validate(&mut fields).unwrap_err();
        assert_eq!(failure.status, 422);
        assert_eq!(failure.errors[0].message, "Invalid id param value!");
    }
}

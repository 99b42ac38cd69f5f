//! Content fixtures.

use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::model::{Ad, AdKind, Choice, Department, Options, Question};
use quizgate_core::repository::ContentStore;
use uuid::Uuid;

/// Builds a user id.
///
/// # Panics
///
/// Panics if `raw` is not positive.
#[must_use]
pub fn user_id(raw: i64) -> UserId {
    UserId::new(raw).expect("fixture user ids are positive")
}

/// Builds question `number` of `department` whose key is `answer`.
#[must_use]
pub fn question(department: &DepartmentId, number: u32, answer: Choice) -> Question {
    Question {
        department_id: department.clone(),
        question_number: number,
        question_text: format!("Question {number} of {department}?"),
        options: Options {
            a: format!("Option A{number}"),
            b: format!("Option B{number}"),
            c: format!("Option C{number}"),
            d: format!("Option D{number}"),
        },
        answer,
        explanation: Some(format!("Because {answer} is right for {number}.")),
    }
}

/// Stores an active department with `count` questions, all keyed `a`.
///
/// # Panics
///
/// Panics if `name` is not a valid department id or the store fails.
pub async fn seed_department(store: &dyn ContentStore, name: &str, count: u32) -> DepartmentId {
    let id = DepartmentId::new(name).expect("fixture department ids are valid");
    let questions: Vec<Question> = (1..=count).map(|n| question(&id, n, Choice::A)).collect();
    let department = Department {
        id: id.clone(),
        display_name: name.to_owned(),
        is_active: true,
        total_questions: count,
    };
    store
        .put_department(&department, &questions)
        .await
        .expect("seeding content succeeds");
    id
}

/// Builds an active text ad at `order_index`.
#[must_use]
pub fn text_ad(order_index: i64, body: &str) -> Ad {
    Ad {
        id: Uuid::new_v4(),
        kind: AdKind::Text {
            body: body.to_owned(),
        },
        caption: String::new(),
        order_index,
        is_active: true,
    }
}

/// Builds an active photo ad at `order_index`.
#[must_use]
pub fn media_ad(order_index: i64, media_ref: &str, caption: &str) -> Ad {
    Ad {
        id: Uuid::new_v4(),
        kind: AdKind::Photo {
            media_ref: media_ref.to_owned(),
        },
        caption: caption.to_owned(),
        order_index,
        is_active: true,
    }
}

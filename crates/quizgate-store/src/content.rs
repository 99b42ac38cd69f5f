//! `ContentStore` over the `departments`, `questions` and `ads` tables.

use async_trait::async_trait;
use quizgate_core::error::DomainError;
use quizgate_core::ids::DepartmentId;
use quizgate_core::model::{Ad, Department, Question};
use quizgate_core::repository::ContentStore;

use crate::error::{StoreError, param_i32};
use crate::pg_store::PgStore;
use crate::rows::{AdRow, DepartmentRow, QuestionRow, ad_columns};

const DEPARTMENT_COLUMNS: &str = "id, display_name, is_active, total_questions";
const QUESTION_COLUMNS: &str = "department_id, question_number, question_text, \
     option_a, option_b, option_c, option_d, answer, explanation";

impl PgStore {
    async fn fetch_department(&self, id: &DepartmentId) -> Result<Option<Department>, StoreError> {
        let row: Option<DepartmentRow> = sqlx::query_as(&format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Department::try_from).transpose()
    }

    async fn fetch_question(
        &self,
        department_id: &DepartmentId,
        question_number: u32,
    ) -> Result<Option<Question>, StoreError> {
        let row: Option<QuestionRow> = sqlx::query_as(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE department_id = $1 AND question_number = $2"
        ))
        .bind(department_id.as_str())
        .bind(param_i32(question_number, "question_number")?)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Question::try_from).transpose()
    }

    async fn fetch_active_departments(&self) -> Result<Vec<Department>, StoreError> {
        let rows: Vec<DepartmentRow> = sqlx::query_as(&format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE is_active ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Department::try_from).collect()
    }

    async fn fetch_active_ads(&self) -> Result<Vec<Ad>, StoreError> {
        let rows: Vec<AdRow> = sqlx::query_as(
            "SELECT id, kind, media_ref, body, caption, order_index, is_active \
             FROM ads WHERE is_active ORDER BY order_index, id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Ad::try_from).collect()
    }

    async fn replace_department(
        &self,
        department: &Department,
        questions: &[Question],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO departments (id, display_name, is_active, total_questions) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET display_name = EXCLUDED.display_name, \
             is_active = EXCLUDED.is_active, total_questions = EXCLUDED.total_questions",
        )
        .bind(department.id.as_str())
        .bind(&department.display_name)
        .bind(department.is_active)
        .bind(param_i32(department.total_questions, "total_questions")?)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM questions WHERE department_id = $1")
            .bind(department.id.as_str())
            .execute(&mut *tx)
            .await?;

        for question in questions {
            sqlx::query(&format!(
                "INSERT INTO questions ({QUESTION_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
            ))
            .bind(department.id.as_str())
            .bind(param_i32(question.question_number, "question_number")?)
            .bind(&question.question_text)
            .bind(&question.options.a)
            .bind(&question.options.b)
            .bind(&question.options.c)
            .bind(&question.options.d)
            .bind(question.answer.as_str())
            .bind(question.explanation.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_ad(&self, ad: &Ad) -> Result<(), StoreError> {
        let (kind, media_ref, body) = ad_columns(&ad.kind);
        sqlx::query(
            "INSERT INTO ads (id, kind, media_ref, body, caption, order_index, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(ad.id)
        .bind(kind)
        .bind(media_ref)
        .bind(body)
        .bind(&ad.caption)
        .bind(ad.order_index)
        .bind(ad.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn get_department(&self, id: &DepartmentId) -> Result<Option<Department>, DomainError> {
        self.bounded("get_department", self.fetch_department(id))
            .await
    }

    async fn get_question(
        &self,
        department_id: &DepartmentId,
        question_number: u32,
    ) -> Result<Option<Question>, DomainError> {
        self.bounded(
            "get_question",
            self.fetch_question(department_id, question_number),
        )
        .await
    }

    async fn list_active_departments(&self) -> Result<Vec<Department>, DomainError> {
        self.bounded("list_active_departments", self.fetch_active_departments())
            .await
    }

    async fn list_active_ads(&self) -> Result<Vec<Ad>, DomainError> {
        self.bounded("list_active_ads", self.fetch_active_ads())
            .await
    }

    async fn put_department(
        &self,
        department: &Department,
        questions: &[Question],
    ) -> Result<(), DomainError> {
        self.bounded(
            "put_department",
            self.replace_department(department, questions),
        )
        .await
    }

    async fn add_ad(&self, ad: &Ad) -> Result<(), DomainError> {
        self.bounded("add_ad", self.insert_ad(ad)).await
    }
}

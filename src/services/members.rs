//! Member management service

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{Member, MemberRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Arc<dyn Repository>,
}

impl MembersService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Member>> {
        let mut uow = self.repository.begin().await?;
        uow.list_members().await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Member> {
        let mut uow = self.repository.begin().await?;
        uow.find_member(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Enroll a new member, stamped with the current time
    pub async fn create(&self, request: &MemberRequest) -> AppResult<Member> {
        let mut uow = self.repository.begin().await?;
        let member = uow.insert_member(&request.name, Utc::now()).await?;
        uow.commit().await?;
        tracing::info!("Member id={} enrolled", member.id);
        Ok(member)
    }

    /// Rename a member; the enrollment date is kept
    pub async fn update(&self, id: i64, request: &MemberRequest) -> AppResult<Member> {
        let mut uow = self.repository.begin().await?;

        let mut member = uow
            .lock_member(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))?;
        member.name = request.name.clone();

        let member = uow.update_member(&member).await?;
        uow.commit().await?;
        Ok(member)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut uow = self.repository.begin().await?;

        let member = uow
            .lock_member(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))?;

        if uow.count_borrowings_by_member(member.id).await? > 0 {
            return Err(AppError::Conflict(format!("Member with id {} is borrowing a book", id)));
        }

        uow.delete_member(member.id).await?;
        uow.commit().await?;
        tracing::info!("Member id={} deleted", id);
        Ok(())
    }
}

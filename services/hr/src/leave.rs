//! Leave request workflow
//!
//! Requests are created Pending by their owner and decided once, by an actor
//! whose authority covers the owner. The decision is a compare-and-swap on the
//! Pending status, so concurrent approvals cannot both land.

use std::sync::Arc;

use chrono::NaiveDate;
use common::error::DatabaseError;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::authority::AuthorityResolver;
use crate::clock::Clock;
use crate::models::{AuthUser, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest};
use crate::repositories::{LeaveStore, UserDirectory};

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("a reason is required")]
    EmptyReason,

    #[error("leave request not found")]
    NotFound,

    #[error("not allowed to decide this leave request")]
    Forbidden,

    #[error("cannot move a {from} request to {to}")]
    InvalidTransition { from: LeaveStatus, to: LeaveStatus },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type LeaveResult<T> = Result<T, LeaveError>;

#[derive(Clone)]
pub struct LeaveWorkflow<L, U> {
    leaves: L,
    resolver: AuthorityResolver<U>,
    clock: Arc<dyn Clock>,
}

impl<L: LeaveStore, U: UserDirectory> LeaveWorkflow<L, U> {
    pub fn new(leaves: L, resolver: AuthorityResolver<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            leaves,
            resolver,
            clock,
        }
    }

    pub async fn create(
        &self,
        user_id: &str,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
    ) -> LeaveResult<LeaveRequest> {
        if end_date < start_date {
            return Err(LeaveError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LeaveError::EmptyReason);
        }

        let request = NewLeaveRequest {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            leave_type,
            start_date,
            end_date,
            reason: reason.to_string(),
            requested_at: self.clock.now(),
        };

        let created = self.leaves.insert(&request).await?;
        info!(
            request_id = %created.id,
            user_id,
            leave_type = %leave_type,
            "leave request submitted"
        );

        Ok(created)
    }

    pub async fn decide(
        &self,
        request_id: Uuid,
        actor: &AuthUser,
        decision: LeaveStatus,
    ) -> LeaveResult<LeaveRequest> {
        let request = self
            .leaves
            .find_by_id(request_id)
            .await?
            .ok_or(LeaveError::NotFound)?;

        let authority = self.resolver.resolve(actor).await?;
        if !authority.covers(&request.user_id) {
            warn!(
                target: "audit",
                actor_id = %actor.id,
                actor_role = %actor.role,
                owner_id = %request.user_id,
                %request_id,
                "leave decision denied: owner outside actor authority"
            );
            return Err(LeaveError::Forbidden);
        }

        if !request.status.can_transition_to(decision) {
            return Err(LeaveError::InvalidTransition {
                from: request.status,
                to: decision,
            });
        }

        let decided = self
            .leaves
            .transition(
                request_id,
                LeaveStatus::Pending,
                decision,
                &actor.id,
                self.clock.now(),
            )
            .await?;

        match decided {
            Some(request) => {
                info!(
                    target: "audit",
                    actor_id = %actor.id,
                    owner_id = %request.user_id,
                    %request_id,
                    status = %decision,
                    "leave request decided"
                );
                Ok(request)
            }
            None => {
                // Another decision landed between the read and the write
                let current = self
                    .leaves
                    .find_by_id(request_id)
                    .await?
                    .ok_or(LeaveError::NotFound)?;
                Err(LeaveError::InvalidTransition {
                    from: current.status,
                    to: decision,
                })
            }
        }
    }

    /// Newest request first
    pub async fn list_mine(&self, user_id: &str) -> LeaveResult<Vec<LeaveRequest>> {
        Ok(self.leaves.list_by_user(user_id).await?)
    }

    /// Pending requests the actor may decide, newest first
    pub async fn list_pending_for(&self, actor: &AuthUser) -> LeaveResult<Vec<LeaveRequest>> {
        let authority = self.resolver.resolve(actor).await?;
        if authority.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.leaves.list_pending(&authority).await?)
    }
}

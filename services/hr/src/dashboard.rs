//! Dashboard statistics over an actor's team
//!
//! The team is the actor's authority scope: direct reports, or everyone for
//! the administrative role.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use common::error::DatabaseResult;
use serde::Serialize;

use crate::authority::AuthorityResolver;
use crate::clock::OfficeCalendar;
use crate::models::{AuthUser, LeaveRequest, LeaveStatus, LeaveType, TimeLog, User};
use crate::repositories::{LeaveStore, TimeLogStore, UserDirectory};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LateArrival {
    pub user_id: String,
    pub name: String,
    pub avatar: String,
    /// Local check-in time, `HH:MM`
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveTally {
    pub leave_type: LeaveType,
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub late_arrivals: Vec<LateArrival>,
    pub leave_data: Vec<LeaveTally>,
    pub team_member_count: usize,
    pub pending_approvals: usize,
    pub leaves_today: usize,
}

/// Build the statistics from already-scoped records
pub fn compute(
    members: &[User],
    today_logs: &[TimeLog],
    requests: &[LeaveRequest],
    today: NaiveDate,
    calendar: &OfficeCalendar,
) -> DashboardStats {
    let by_id: HashMap<&str, &User> = members.iter().map(|u| (u.id.as_str(), u)).collect();

    let mut late: Vec<(DateTime<Utc>, LateArrival)> = today_logs
        .iter()
        .filter(|log| log.date == today)
        .filter_map(|log| {
            let member = by_id.get(log.user_id.as_str())?;
            let check_in = log.check_in.filter(|at| calendar.is_late(*at))?;
            Some((
                check_in,
                LateArrival {
                    user_id: member.id.clone(),
                    name: member.name.clone(),
                    avatar: member.avatar.clone(),
                    time: calendar.local_time(check_in).format("%H:%M").to_string(),
                },
            ))
        })
        .collect();
    late.sort_by_key(|(at, _)| *at);

    let mut days: HashMap<LeaveType, i64> = HashMap::new();
    for request in requests.iter().filter(|r| r.status == LeaveStatus::Approved) {
        *days.entry(request.leave_type).or_default() += request.days();
    }

    DashboardStats {
        late_arrivals: late.into_iter().map(|(_, arrival)| arrival).collect(),
        leave_data: LeaveType::ALL
            .into_iter()
            .map(|leave_type| LeaveTally {
                leave_type,
                days: days.get(&leave_type).copied().unwrap_or(0),
            })
            .collect(),
        team_member_count: members.len(),
        pending_approvals: requests
            .iter()
            .filter(|r| r.status == LeaveStatus::Pending)
            .count(),
        leaves_today: requests
            .iter()
            .filter(|r| r.status == LeaveStatus::Approved && r.covers(today))
            .count(),
    }
}

#[derive(Clone)]
pub struct Dashboard<T, L, U> {
    time_logs: T,
    leaves: L,
    resolver: AuthorityResolver<U>,
    calendar: OfficeCalendar,
}

impl<T: TimeLogStore, L: LeaveStore, U: UserDirectory> Dashboard<T, L, U> {
    pub fn new(
        time_logs: T,
        leaves: L,
        resolver: AuthorityResolver<U>,
        calendar: OfficeCalendar,
    ) -> Self {
        Self {
            time_logs,
            leaves,
            resolver,
            calendar,
        }
    }

    pub async fn stats(&self, actor: &AuthUser, today: NaiveDate) -> DatabaseResult<DashboardStats> {
        let members = self.resolver.members(actor).await?;
        let authority = self.resolver.resolve(actor).await?;

        let today_logs = self.time_logs.list_for_date(today).await?;
        let requests = if authority.is_empty() {
            Vec::new()
        } else {
            self.leaves.list_in_scope(&authority).await?
        };

        Ok(compute(
            &members,
            &today_logs,
            &requests,
            today,
            &self.calendar,
        ))
    }
}

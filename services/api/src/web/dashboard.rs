//! services/api/src/web/dashboard.rs
//!
//! The teacher dashboard: a fixed set of actions and tabs, each mapped to one
//! handler function. The tab registry is built once at startup and shared
//! through `AppState`.

use crate::error::ApiError;
use crate::web::middleware::CurrentUser;
use crate::web::rest::{progress_response, ProgressResponse, StudentProfile};
use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    response::Json,
    Extension,
};
use coursebuilder_core::domain::CourseSection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

/// Dashboard actions. Only the teacher dashboard exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardAction {
    TeacherDashboard,
}

impl DashboardAction {
    pub const DEFAULT: DashboardAction = DashboardAction::TeacherDashboard;

    pub fn as_str(self) -> &'static str {
        match self {
            DashboardAction::TeacherDashboard => "teacher_dashboard",
        }
    }
}

impl FromStr for DashboardAction {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teacher_dashboard" => Ok(DashboardAction::TeacherDashboard),
            other => Err(ApiError::NotFound(format!("Unknown dashboard action '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardTab {
    Sections,
    Student,
    TeacherReg,
}

impl DashboardTab {
    pub const ALL: [DashboardTab; 3] = [
        DashboardTab::Sections,
        DashboardTab::Student,
        DashboardTab::TeacherReg,
    ];

    pub const DEFAULT: DashboardTab = DashboardTab::Sections;

    pub fn key(self) -> &'static str {
        match self {
            DashboardTab::Sections => "sections",
            DashboardTab::Student => "student",
            DashboardTab::TeacherReg => "teacher_reg",
        }
    }

    fn label(self) -> &'static str {
        match self {
            DashboardTab::Sections => "Sections",
            DashboardTab::Student => "Student Profile",
            DashboardTab::TeacherReg => "Register Teacher",
        }
    }
}

impl fmt::Display for DashboardTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DashboardTab {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DashboardTab::ALL
            .into_iter()
            .find(|tab| tab.key() == s)
            .ok_or_else(|| ApiError::NotFound(format!("Unknown dashboard tab '{}'", s)))
    }
}

/// One navigable tab as shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TabEntry {
    pub key: String,
    pub label: String,
    pub href: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tab '{0}' is registered twice")]
    Duplicate(String),
    #[error("tab '{0}' has no registration")]
    Missing(String),
}

/// Tabs available under an action, in display order.
#[derive(Debug, Clone)]
pub struct TabRegistry {
    action: DashboardAction,
    tabs: Vec<(DashboardTab, TabEntry)>,
}

impl TabRegistry {
    /// Builds a registry, checking that every tab is registered exactly once.
    pub fn new(
        action: DashboardAction,
        tabs: impl IntoIterator<Item = DashboardTab>,
    ) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for tab in tabs {
            if !seen.insert(tab) {
                return Err(RegistryError::Duplicate(tab.key().to_string()));
            }
            entries.push((
                tab,
                TabEntry {
                    key: tab.key().to_string(),
                    label: tab.label().to_string(),
                    href: format!("/dashboard?action={}&tab={}", action.as_str(), tab.key()),
                },
            ));
        }
        if let Some(missing) = DashboardTab::ALL.into_iter().find(|t| !seen.contains(t)) {
            return Err(RegistryError::Missing(missing.key().to_string()));
        }
        Ok(Self {
            action,
            tabs: entries,
        })
    }

    /// The registry used by the service.
    pub fn teacher_dashboard() -> Result<Self, RegistryError> {
        Self::new(DashboardAction::TeacherDashboard, DashboardTab::ALL)
    }

    pub fn action(&self) -> DashboardAction {
        self.action
    }

    pub fn entries(&self) -> Vec<TabEntry> {
        self.tabs.iter().map(|(_, entry)| entry.clone()).collect()
    }
}

//=========================================================================================
// Handler
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    pub action: Option<String>,
    pub tab: Option<String>,
    /// Student email, used by the `student` tab.
    pub email: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardPage {
    pub action: String,
    pub tab: String,
    pub tabs: Vec<TabEntry>,
    #[schema(value_type = Object)]
    pub content: Value,
}

#[derive(Serialize)]
struct StudentTab {
    profile: StudentProfile,
    progress: ProgressResponse,
}

/// Render a dashboard tab.
#[utoipa::path(
    get,
    path = "/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard tab", body = DashboardPage),
        (status = 403, description = "Caller is not a teacher"),
        (status = 404, description = "Unknown action or tab")
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardPage>, ApiError> {
    let action = match query.action.as_deref().filter(|a| !a.is_empty()) {
        Some(raw) => raw.parse()?,
        None => DashboardAction::DEFAULT,
    };
    if action != state.tabs.action() {
        return Err(ApiError::NotFound(format!("Action '{}' is not served here", action.as_str())));
    }
    let tab = match query.tab.as_deref().filter(|t| !t.is_empty()) {
        Some(raw) => raw.parse()?,
        None => DashboardTab::DEFAULT,
    };

    let content = match tab {
        DashboardTab::Sections => sections_tab(&state, &user).await?,
        DashboardTab::Student => student_tab(&state, &user, query.email.as_deref()).await?,
        DashboardTab::TeacherReg => teacher_reg_tab(&state, &user)?,
    };

    Ok(Json(DashboardPage {
        action: action.as_str().to_string(),
        tab: tab.to_string(),
        tabs: state.tabs.entries(),
        content,
    }))
}

async fn sections_tab(state: &AppState, user: &CurrentUser) -> Result<Value, ApiError> {
    let teacher = state.current_teacher(user).await?;
    let sections: Vec<CourseSection> = state.sections.list_sections(&teacher.email).await?;
    Ok(json!({ "sections": sections }))
}

async fn student_tab(
    state: &AppState,
    user: &CurrentUser,
    email: Option<&str>,
) -> Result<Value, ApiError> {
    state.current_teacher(user).await?;
    let email = email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("email is required for the student tab".to_string()))?;

    let student = state.students.get_student_by_email(email).await?;
    let outline = state.catalog.load_outline().await?;
    let snapshot = state.tracker.load_progress(&student.user_id, &outline).await?;
    let tab = StudentTab {
        profile: StudentProfile::from(&student),
        progress: progress_response(&outline, &snapshot, true),
    };
    serde_json::to_value(tab).map_err(|e| ApiError::Internal(e.to_string()))
}

fn teacher_reg_tab(state: &AppState, user: &CurrentUser) -> Result<Value, ApiError> {
    state.require_admin(user)?;
    Ok(json!({
        "submit": { "method": "POST", "href": "/teachers" },
        "fields": ["email", "school", "additional_fields"],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_tab_once() {
        let registry = TabRegistry::teacher_dashboard().unwrap();
        let keys: Vec<_> = registry.entries().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["sections", "student", "teacher_reg"]);
        assert_eq!(
            registry.entries()[0].href,
            "/dashboard?action=teacher_dashboard&tab=sections"
        );
    }

    #[test]
    fn registry_rejects_duplicates_and_gaps() {
        let dup = TabRegistry::new(
            DashboardAction::TeacherDashboard,
            [DashboardTab::Sections, DashboardTab::Sections],
        );
        assert_eq!(dup.unwrap_err(), RegistryError::Duplicate("sections".into()));

        let gap = TabRegistry::new(DashboardAction::TeacherDashboard, [DashboardTab::Sections]);
        assert_eq!(gap.unwrap_err(), RegistryError::Missing("student".into()));
    }

    #[test]
    fn tabs_parse_from_their_keys() {
        for tab in DashboardTab::ALL {
            assert_eq!(tab.key().parse::<DashboardTab>().unwrap(), tab);
        }
        assert!("analytics".parse::<DashboardTab>().is_err());
        assert!("edit".parse::<DashboardAction>().is_err());
    }
}

//! Typed response records for the admin and restriction endpoints.
//!
//! Every record is defaulted at deserialization time: a missing or `null`
//! field reads as its default, so `success` becomes `false`, lists are
//! empty, optional fields are `None` and an unrecognized company status
//! becomes [`CompanyStatus::Unknown`].
//! Renderers never see loosely-typed JSON.

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// GET /api/v1/dashboard/overview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OverviewResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub statistics: OverviewStatistics,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OverviewStatistics {
    #[serde(deserialize_with = "null_as_default")]
    pub total_companies: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub active_subscriptions: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_revenue: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pending_cancellations: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub trial_users: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_growth: f64,
}

// ---------------------------------------------------------------------------
// GET /api/v1/companies, GET /api/v1/companies/{id}
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompaniesResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompanyResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    pub company: Option<Company>,
}

/// Subscription status of a company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompanyStatus {
    Active,
    Trial,
    Cancelled,
    Pending,
    #[default]
    Unknown,
}

impl CompanyStatus {
    /// Map the wire value; anything outside the fixed set is `Unknown`.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "active" => Self::Active,
            "trial" => Self::Trial,
            "cancelled" => Self::Cancelled,
            "pending" => Self::Pending,
            _ => Self::Unknown,
        }
    }

    /// Bootstrap badge class.
    pub fn badge_class(self) -> &'static str {
        match self {
            Self::Active => "bg-success",
            Self::Trial => "bg-warning",
            Self::Cancelled => "bg-danger",
            Self::Pending => "bg-info",
            Self::Unknown => "bg-secondary",
        }
    }

    /// Localized label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "アクティブ",
            Self::Trial => "トライアル",
            Self::Cancelled => "解約済み",
            Self::Pending => "保留中",
            Self::Unknown => "不明",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Company {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub industry: Option<String>,
    pub employee_count: Option<u64>,
    #[serde(deserialize_with = "lenient_status")]
    pub status: CompanyStatus,
    pub created_at: Option<String>,
}

impl Company {
    /// Industry if set; an empty string counts as unset.
    pub fn industry(&self) -> Option<&str> {
        self.industry.as_deref().filter(|s| !s.is_empty())
    }

    /// Employee count if set; zero counts as unset.
    pub fn employee_count(&self) -> Option<u64> {
        self.employee_count.filter(|&n| n != 0)
    }
}

/// Read an explicit `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_status<'de, D>(deserializer: D) -> Result<CompanyStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => CompanyStatus::from_wire(&s),
        _ => CompanyStatus::Unknown,
    })
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RevenueResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonthlyRevenue {
    #[serde(deserialize_with = "null_as_default")]
    pub month: String,
    #[serde(deserialize_with = "null_as_default")]
    pub revenue: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CancellationResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_cancellations: Vec<MonthlyCancellation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonthlyCancellation {
    #[serde(deserialize_with = "null_as_default")]
    pub month: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cancellation_rate: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotificationResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub daily_notifications: Vec<DailyNotification>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DailyNotification {
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub count: f64,
}

// ---------------------------------------------------------------------------
// GET /api/v1/dashboard/activities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivitiesResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub activities: Vec<Activity>,
}

/// Kind of a feed event; drives the icon and its colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    CompanyCreated,
    CompanyUpdated,
    CompanyCancelled,
    PaymentSuccess,
    PaymentFailed,
    NotificationSent,
    Other,
}

impl ActivityKind {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "company_created" => Self::CompanyCreated,
            "company_updated" => Self::CompanyUpdated,
            "company_cancelled" => Self::CompanyCancelled,
            "payment_success" => Self::PaymentSuccess,
            "payment_failed" => Self::PaymentFailed,
            "notification_sent" => Self::NotificationSent,
            _ => Self::Other,
        }
    }

    /// Background class of the icon bubble.
    pub fn icon_class(self) -> &'static str {
        match self {
            Self::CompanyCreated | Self::PaymentSuccess => "bg-success",
            Self::CompanyUpdated => "bg-info",
            Self::CompanyCancelled => "bg-warning",
            Self::PaymentFailed => "bg-danger",
            Self::NotificationSent => "bg-primary",
            Self::Other => "bg-secondary",
        }
    }

    /// Font Awesome icon classes.
    pub fn icon(self) -> &'static str {
        match self {
            Self::CompanyCreated => "fas fa-building",
            Self::CompanyUpdated => "fas fa-edit",
            Self::CompanyCancelled => "fas fa-times",
            Self::PaymentSuccess => "fas fa-check",
            Self::PaymentFailed => "fas fa-exclamation-triangle",
            Self::NotificationSent => "fas fa-bell",
            Self::Other => "fas fa-info",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Activity {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
}

impl Activity {
    pub fn kind(&self) -> ActivityKind {
        ActivityKind::from_wire(&self.kind)
    }
}

// ---------------------------------------------------------------------------
// POST /line/check_restriction/{contentType}
// POST /line/restriction_message/{contentType}
// ---------------------------------------------------------------------------

/// Request body of both restriction endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct RestrictionRequest<'a> {
    pub line_user_id: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestrictionCheckResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub restricted: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestrictionMessageResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub restricted: bool,
    pub message: Option<RestrictionMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestrictionMessage {
    pub template: Option<MessageTemplate>,
}

/// Display template of the restriction overlay.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageTemplate {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub actions: Vec<TemplateAction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplateAction {
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    pub uri: Option<String>,
}

impl TemplateAction {
    /// Target to open in a new tab, for `uri` actions that carry one.
    pub fn link(&self) -> Option<&str> {
        if self.kind == "uri" {
            self.uri.as_deref()
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lookup_covers_fixed_set_and_fallback() {
        let cases = [
            ("active", "bg-success", "アクティブ"),
            ("trial", "bg-warning", "トライアル"),
            ("cancelled", "bg-danger", "解約済み"),
            ("pending", "bg-info", "保留中"),
            ("suspended", "bg-secondary", "不明"),
            ("", "bg-secondary", "不明"),
            ("ACTIVE", "bg-secondary", "不明"),
        ];
        for (raw, class, label) in cases {
            let status = CompanyStatus::from_wire(raw);
            assert_eq!(status.badge_class(), class, "class for {raw:?}");
            assert_eq!(status.label(), label, "label for {raw:?}");
        }
    }

    #[test]
    fn activity_lookup_covers_fixed_set_and_fallback() {
        let cases = [
            ("company_created", "bg-success", "fas fa-building"),
            ("company_updated", "bg-info", "fas fa-edit"),
            ("company_cancelled", "bg-warning", "fas fa-times"),
            ("payment_success", "bg-success", "fas fa-check"),
            ("payment_failed", "bg-danger", "fas fa-exclamation-triangle"),
            ("notification_sent", "bg-primary", "fas fa-bell"),
            ("login", "bg-secondary", "fas fa-info"),
        ];
        for (raw, class, icon) in cases {
            let kind = ActivityKind::from_wire(raw);
            assert_eq!(kind.icon_class(), class, "class for {raw:?}");
            assert_eq!(kind.icon(), icon, "icon for {raw:?}");
        }
    }

    #[test]
    fn company_defaults_missing_and_null_fields() {
        let company: Company = serde_json::from_str(
            r#"{"id": 7, "name": "Acme", "industry": null, "status": null}"#,
        )
        .unwrap();
        assert_eq!(company.id, 7);
        assert_eq!(company.industry(), None);
        assert_eq!(company.employee_count(), None);
        assert_eq!(company.status, CompanyStatus::Unknown);
        assert_eq!(company.created_at, None);
    }

    #[test]
    fn company_treats_empty_industry_and_zero_employees_as_unset() {
        let company: Company = serde_json::from_str(
            r#"{"id": 1, "name": "X", "industry": "", "employee_count": 0, "status": "trial"}"#,
        )
        .unwrap();
        assert_eq!(company.industry(), None);
        assert_eq!(company.employee_count(), None);
        assert_eq!(company.status, CompanyStatus::Trial);
    }

    #[test]
    fn explicit_nulls_read_as_defaults() {
        let overview: OverviewResponse = serde_json::from_str(
            r#"{"success": true, "statistics": {"total_companies": null, "monthly_growth": null}}"#,
        )
        .unwrap();
        assert_eq!(overview.statistics.total_companies, 0);
        assert_eq!(overview.statistics.monthly_growth, 0.0);
        let overview: OverviewResponse =
            serde_json::from_str(r#"{"success": null, "statistics": null}"#).unwrap();
        assert!(!overview.success);

        let companies: CompaniesResponse = serde_json::from_str(
            r#"{"success": true, "companies": [{"id": null, "name": null, "status": "active"}]}"#,
        )
        .unwrap();
        assert_eq!(companies.companies[0].id, 0);
        assert_eq!(companies.companies[0].name, "");
        let companies: CompaniesResponse =
            serde_json::from_str(r#"{"success": true, "companies": null}"#).unwrap();
        assert!(companies.companies.is_empty());

        let revenue: RevenueResponse = serde_json::from_str(
            r#"{"success": true, "monthly_revenue": [{"month": null, "revenue": null}]}"#,
        )
        .unwrap();
        assert_eq!(revenue.monthly_revenue[0].month, "");
        assert_eq!(revenue.monthly_revenue[0].revenue, 0.0);

        let cancellations: CancellationResponse = serde_json::from_str(
            r#"{"success": true, "monthly_cancellations": [{"month": "2024-01", "cancellation_rate": null}]}"#,
        )
        .unwrap();
        assert_eq!(cancellations.monthly_cancellations[0].cancellation_rate, 0.0);

        let notifications: NotificationResponse = serde_json::from_str(
            r#"{"success": true, "daily_notifications": [{"date": null, "count": 4}]}"#,
        )
        .unwrap();
        assert_eq!(notifications.daily_notifications[0].date, "");
        assert_eq!(notifications.daily_notifications[0].count, 4.0);

        let activities: ActivitiesResponse = serde_json::from_str(
            r#"{"success": true, "activities": [{"type": null, "title": "t", "description": null, "timestamp": null}]}"#,
        )
        .unwrap();
        let activity = &activities.activities[0];
        assert_eq!(activity.kind(), ActivityKind::Other);
        assert_eq!(activity.description, "");

        let message: RestrictionMessageResponse = serde_json::from_str(
            r#"{"restricted": true, "message": {"template": {"title": null, "text": "x", "actions": null}}}"#,
        )
        .unwrap();
        let template = message.message.unwrap().template.unwrap();
        assert_eq!(template.title, "");
        assert!(template.actions.is_empty());

        let check: RestrictionCheckResponse =
            serde_json::from_str(r#"{"restricted": null}"#).unwrap();
        assert!(!check.restricted);
    }

    #[test]
    fn responses_default_success_to_false() {
        let overview: OverviewResponse = serde_json::from_str("{}").unwrap();
        assert!(!overview.success);
        let companies: CompaniesResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(companies.success);
        assert!(companies.companies.is_empty());
    }

    #[test]
    fn restriction_message_parses_template() {
        let json = r#"{
            "restricted": true,
            "message": {"template": {
                "title": "ご利用制限",
                "text": "公式LINEへ",
                "actions": [
                    {"label": "友だち追加", "type": "uri", "uri": "https://line.me/R/ti/p/@ai"},
                    {"label": "閉じる", "type": "message"}
                ]
            }}
        }"#;
        let resp: RestrictionMessageResponse = serde_json::from_str(json).unwrap();
        assert!(resp.restricted);
        let template = resp.message.unwrap().template.unwrap();
        assert_eq!(template.actions.len(), 2);
        assert_eq!(template.actions[0].link(), Some("https://line.me/R/ti/p/@ai"));
        assert_eq!(template.actions[1].link(), None);
    }

    #[test]
    fn uri_action_without_target_has_no_link() {
        let action: TemplateAction =
            serde_json::from_str(r#"{"label": "開く", "type": "uri"}"#).unwrap();
        assert_eq!(action.link(), None);
    }
}

//! Content-type classification from the embedding page's URL.

use std::fmt;

/// Product offering the widget is embedded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    ScheduleSecretary,
    AccountingSecretary,
    TaskConcierge,
}

impl ContentType {
    /// Classify by ordered substring match over the full URL (query and
    /// fragment included). The first matching rule wins.
    pub fn from_url(url: &str) -> Option<Self> {
        const RULES: [(&str, &str, ContentType); 3] = [
            ("schedule", "ai_schedule_secretary", ContentType::ScheduleSecretary),
            ("accounting", "ai_accounting_secretary", ContentType::AccountingSecretary),
            ("task", "ai_task_concierge", ContentType::TaskConcierge),
        ];

        RULES
            .iter()
            .find(|(short, long, _)| url.contains(*short) || url.contains(*long))
            .map(|(_, _, content_type)| *content_type)
    }

    /// Identifier sent to the restriction endpoints.
    pub fn label(self) -> &'static str {
        match self {
            Self::ScheduleSecretary => "AI予定秘書",
            Self::AccountingSecretary => "AI経理秘書",
            Self::TaskConcierge => "AIタスクコンシェルジュ",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

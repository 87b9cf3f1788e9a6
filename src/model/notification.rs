use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

string_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationTarget {
    Country { country_id: i64 },
    Broadcast,
}

impl NotificationTarget {
    pub fn country_id(&self) -> Option<i64> {
        match self {
            NotificationTarget::Country { country_id } => Some(*country_id),
            NotificationTarget::Broadcast => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub target: NotificationTarget,
    pub category: String,
    pub priority: Priority,
}

impl Notification {
    pub fn to_country(
        country_id: i64,
        category: &str,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            target: NotificationTarget::Country { country_id },
            category: category.to_string(),
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_tagged() {
        let json = serde_json::to_value(NotificationTarget::Country { country_id: 7 }).unwrap();
        assert_eq!(json["type"], "country");
        assert_eq!(json["country_id"], 7);
        let json = serde_json::to_value(NotificationTarget::Broadcast).unwrap();
        assert_eq!(json["type"], "broadcast");
    }
}

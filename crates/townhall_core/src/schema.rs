use crate::filter::{ListRecord, SortValue};
use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::Schema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub type RecordId = u64;

// Closed enums with an `Other` catch-all that keeps the server's value: an
// unexpected status must not fail the whole list, and it still filters and
// prints under its own name.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            fn known(wire: &str) -> Option<Self> {
                match wire {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn from_wire(wire: String) -> Self {
                Self::known(&wire).unwrap_or_else(|| $name::Other(wire))
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Other(wire) => wire.as_str(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        /// Strict: only the known wire names parse.
        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::known(s).ok_or_else(|| {
                    format!(
                        "unknown {} `{s}`; expected one of: {}",
                        stringify!($name),
                        [$($wire),+].join(", ")
                    )
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer).map(Self::from_wire)
            }
        }

        impl JsonSchema for $name {
            fn schema_name() -> String {
                stringify!($name).to_string()
            }

            fn json_schema(generator: &mut SchemaGenerator) -> Schema {
                String::json_schema(generator)
            }
        }
    };
}

wire_enum!(ComplaintStatus {
    Pending => "pending",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

wire_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

wire_enum!(BillStatus {
    Draft => "draft",
    Published => "published",
    UnderReview => "under_review",
    Approved => "approved",
    Rejected => "rejected",
    Implemented => "implemented",
    Archived => "archived",
});

wire_enum!(LicenseStatus {
    Active => "active",
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Expired => "expired",
});

wire_enum!(EventStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Cancelled => "cancelled",
});

wire_enum!(VoteType {
    Support => "support",
    Oppose => "oppose",
});

wire_enum!(Role {
    Citizen => "citizen",
    Business => "business",
    Government => "government",
});

wire_enum!(AnnouncementStatus {
    Published => "published",
    Draft => "draft",
});

impl Priority {
    fn rank(&self) -> i64 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
            Priority::Other(_) => 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ComplaintComment {
    pub id: RecordId,
    pub text: String,
    pub author: String,
    pub date: Option<String>,
    pub is_notification: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Complaint {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: Option<ComplaintStatus>,
    pub priority: Option<Priority>,
    pub location: Option<String>,
    #[serde(alias = "created")]
    pub created_at: Option<String>,
    #[serde(alias = "assignedTo")]
    pub assigned_to: Option<String>,
    #[serde(alias = "estimatedResolution")]
    pub estimated_resolution: Option<String>,
    #[serde(alias = "citizenName")]
    pub citizen_name: Option<String>,
    pub comments: Vec<ComplaintComment>,
}

/// Bills carry the department as a bare name in lists and as an object in
/// the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DepartmentRef {
    Name(String),
    Summary { id: RecordId, name: String },
}

impl DepartmentRef {
    pub fn name(&self) -> &str {
        match self {
            DepartmentRef::Name(name) => name,
            DepartmentRef::Summary { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Bill {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub summary: Option<String>,
    pub status: Option<BillStatus>,
    pub priority: Option<Priority>,
    pub department: Option<DepartmentRef>,
    pub created_by: Option<String>,
    pub support_count: u64,
    pub oppose_count: u64,
    pub total_votes: u64,
    pub comment_count: u64,
    pub created_at: Option<String>,
    pub review_deadline: Option<String>,
    pub tags: Vec<String>,
    pub user_vote: Option<VoteType>,
}

impl Bill {
    pub fn department_name(&self) -> Option<&str> {
        self.department.as_ref().map(DepartmentRef::name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BillComment {
    pub id: RecordId,
    pub comment_text: String,
    pub author: String,
    pub author_role: Option<String>,
    pub likes: u64,
    pub created_at: Option<String>,
}

/// Licenses, permits and license applications share one shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct License {
    pub id: RecordId,
    pub license_type: String,
    pub license_number: Option<String>,
    pub business_name: Option<String>,
    #[serde(alias = "businessOwner")]
    pub business_owner: Option<String>,
    pub description: Option<String>,
    pub status: Option<LicenseStatus>,
    pub application_date: Option<String>,
    pub created_at: Option<String>,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
    pub fee: Option<f64>,
    pub fee_paid: bool,
    pub requirements: Vec<String>,
    pub documents: Vec<serde_json::Value>,
    pub attachments: Vec<serde_json::Value>,
    pub review_comment: Option<String>,
}

impl License {
    /// The government list reports `created_at`; the sample applications
    /// carry an explicit `application_date`.
    pub fn applied_on(&self) -> Option<&str> {
        self.application_date
            .as_deref()
            .or(self.created_at.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Event {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub location: Option<String>,
    pub status: Option<EventStatus>,
    pub current_attendees: u64,
    pub max_attendees: Option<u64>,
    pub business_name: Option<String>,
}

impl Event {
    pub fn is_full(&self) -> bool {
        self.max_attendees
            .is_some_and(|max| self.current_attendees >= max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Department {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct User {
    pub id: RecordId,
    pub email: String,
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    pub role: Option<Role>,
    pub is_superuser: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Announcement {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    /// Creation day, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub priority: Option<Priority>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<AnnouncementStatus>,
    pub views: u64,
    pub author: Option<String>,
    pub department: Option<String>,
    pub tags: Vec<String>,
    #[serde(alias = "lastUpdated")]
    pub last_updated: Option<String>,
    #[serde(alias = "publishDate")]
    pub publish_date: Option<String>,
    #[serde(alias = "expiryDate")]
    pub expiry_date: Option<String>,
    pub town_name: Option<String>,
    pub question_count: u64,
    pub answered_count: u64,
    pub pending_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnnouncementQuestion {
    pub id: RecordId,
    pub question: String,
    pub answer: Option<String>,
    pub is_answered: bool,
    pub citizen_name: Option<String>,
    pub answered_by: Option<String>,
    pub answered_at: Option<String>,
    pub created_at: Option<String>,
}

/// Citizen and business inboxes share this shape; each fills in its own
/// `related` ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Notification {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: Option<String>,
    pub complaint_id: Option<RecordId>,
    pub complaint_title: Option<String>,
    pub related_license_id: Option<RecordId>,
    pub related_event_id: Option<RecordId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TownSummary {
    pub id: RecordId,
    pub name: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Official {
    pub id: RecordId,
    pub user_id: RecordId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone_number: Option<String>,
    pub office_address: Option<String>,
    pub town: Option<TownSummary>,
    pub can_view_users: bool,
    pub can_approve_users: bool,
    pub is_approved: bool,
    pub created_at: Option<String>,
}

impl Official {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// A row of the administrators' user list. Keyed by `user_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct UserAccount {
    pub user_id: RecordId,
    pub email: String,
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    pub role: Option<Role>,
    pub is_approved: bool,
    pub town: Option<String>,
    pub created_at: Option<String>,
}

impl UserAccount {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

fn date_value(value: &Option<String>) -> SortValue {
    SortValue::text(value.as_deref())
}

fn priority_rank(priority: Option<&Priority>) -> SortValue {
    priority.map_or(SortValue::Missing, |p| SortValue::Number(p.rank()))
}

impl ListRecord for Complaint {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.title.as_str(),
            self.description.as_str(),
            self.category.as_str(),
        ];
        if let Some(name) = &self.citizen_name {
            fields.push(name);
        }
        fields
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "status" => self.status.as_ref().map(ComplaintStatus::as_str),
            "priority" => self.priority.as_ref().map(Priority::as_str),
            "category" => Some(self.category.as_str()),
            _ => None,
        }
    }

    fn in_bucket(&self, bucket: &str) -> bool {
        match bucket {
            "open" => matches!(
                self.status,
                Some(ComplaintStatus::Pending | ComplaintStatus::InProgress)
            ),
            "done" => matches!(
                self.status,
                Some(ComplaintStatus::Resolved | ComplaintStatus::Closed)
            ),
            _ => true,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "date" | "created_at" => date_value(&self.created_at),
            "title" => SortValue::text(Some(self.title.as_str())),
            "priority" => priority_rank(self.priority.as_ref()),
            "status" => SortValue::text(self.status.as_ref().map(ComplaintStatus::as_str)),
            _ => SortValue::Missing,
        }
    }
}

impl ListRecord for Bill {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str()]
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "status" => self.status.as_ref().map(BillStatus::as_str),
            "priority" => self.priority.as_ref().map(Priority::as_str),
            "department" => self.department_name(),
            _ => None,
        }
    }

    fn in_bucket(&self, bucket: &str) -> bool {
        match bucket {
            "voted" => self.user_vote.is_some(),
            "not_voted" => self.user_vote.is_none(),
            _ => true,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "date" | "created_at" => date_value(&self.created_at),
            "title" => SortValue::text(Some(self.title.as_str())),
            "votes" => SortValue::Number((self.support_count + self.oppose_count) as i64),
            "support" => SortValue::Number(self.support_count as i64),
            "comments" => SortValue::Number(self.comment_count as i64),
            _ => SortValue::Missing,
        }
    }
}

impl ListRecord for License {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.license_type.as_str()];
        fields.extend(self.business_name.as_deref());
        fields.extend(self.business_owner.as_deref());
        fields.extend(self.license_number.as_deref());
        fields.extend(self.description.as_deref());
        fields
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "status" => self.status.as_ref().map(LicenseStatus::as_str),
            "license_type" | "type" => Some(self.license_type.as_str()),
            _ => None,
        }
    }

    fn in_bucket(&self, bucket: &str) -> bool {
        match bucket {
            "pending" => self.status == Some(LicenseStatus::Pending),
            "issued" => matches!(
                self.status,
                Some(LicenseStatus::Active | LicenseStatus::Approved)
            ),
            _ => true,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "date" | "application_date" => SortValue::text(self.applied_on()),
            "expiry" | "expiry_date" => date_value(&self.expiry_date),
            "name" => SortValue::text(self.business_name.as_deref()),
            "type" => SortValue::text(Some(self.license_type.as_str())),
            _ => SortValue::Missing,
        }
    }
}

impl ListRecord for Event {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.description.as_str()];
        fields.extend(self.category.as_deref());
        fields.extend(self.business_name.as_deref());
        fields
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "status" => self.status.as_ref().map(EventStatus::as_str),
            "category" => self.category.as_deref(),
            _ => None,
        }
    }

    fn in_bucket(&self, bucket: &str) -> bool {
        match bucket {
            "open" => self.status == Some(EventStatus::Approved) && !self.is_full(),
            "review" => self.status == Some(EventStatus::Pending),
            _ => true,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "date" | "event_date" => date_value(&self.event_date),
            "title" => SortValue::text(Some(self.title.as_str())),
            "attendees" => SortValue::Number(self.current_attendees as i64),
            _ => SortValue::Missing,
        }
    }
}

impl ListRecord for Department {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }

    fn facet(&self, _name: &str) -> Option<&str> {
        None
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "name" => SortValue::text(Some(self.name.as_str())),
            _ => SortValue::Missing,
        }
    }
}

impl ListRecord for Announcement {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.content.as_str()];
        fields.extend(self.description.as_deref());
        fields.extend(self.department.as_deref());
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "status" => self.status.as_ref().map(AnnouncementStatus::as_str),
            "priority" => self.priority.as_ref().map(Priority::as_str),
            "type" => self.kind.as_deref(),
            "department" => self.department.as_deref(),
            _ => None,
        }
    }

    fn in_bucket(&self, bucket: &str) -> bool {
        match bucket {
            "unanswered" => self.pending_count > 0,
            _ => true,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "date" => date_value(&self.date),
            "title" => SortValue::text(Some(self.title.as_str())),
            "priority" => priority_rank(self.priority.as_ref()),
            "views" => SortValue::Number(self.views as i64),
            "questions" => SortValue::Number(self.question_count as i64),
            _ => SortValue::Missing,
        }
    }
}

impl ListRecord for Notification {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.message.as_str()];
        fields.extend(self.complaint_title.as_deref());
        fields
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "type" => Some(self.kind.as_str()),
            _ => None,
        }
    }

    fn in_bucket(&self, bucket: &str) -> bool {
        match bucket {
            "unread" => !self.is_read,
            "read" => self.is_read,
            _ => true,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "date" | "created_at" => date_value(&self.created_at),
            "title" => SortValue::text(Some(self.title.as_str())),
            _ => SortValue::Missing,
        }
    }
}

impl ListRecord for Official {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
        ];
        fields.extend(self.department.as_deref());
        fields.extend(self.position.as_deref());
        fields.extend(self.town.as_ref().map(|t| t.name.as_str()));
        fields
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "department" | "category" => self.department.as_deref(),
            "town" => self.town.as_ref().map(|t| t.name.as_str()),
            _ => None,
        }
    }

    fn in_bucket(&self, bucket: &str) -> bool {
        match bucket {
            "pending" => !self.is_approved,
            "approvers" => self.can_approve_users,
            "viewers" => self.can_view_users,
            _ => true,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "date" | "created_at" => date_value(&self.created_at),
            "name" => SortValue::text(Some(self.full_name().as_str())),
            "email" => SortValue::text(Some(self.email.as_str())),
            _ => SortValue::Missing,
        }
    }
}

impl ListRecord for UserAccount {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
        ];
        fields.extend(self.town.as_deref());
        fields
    }

    fn facet(&self, name: &str) -> Option<&str> {
        match name {
            "role" | "type" => self.role.as_ref().map(Role::as_str),
            "town" => self.town.as_deref(),
            _ => None,
        }
    }

    fn in_bucket(&self, bucket: &str) -> bool {
        match bucket {
            "pending" => !self.is_approved,
            "approved" => self.is_approved,
            _ => true,
        }
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "date" | "created_at" => date_value(&self.created_at),
            "name" => SortValue::text(Some(self.full_name().as_str())),
            "email" => SortValue::text(Some(self.email.as_str())),
            _ => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{apply, DateRange, ListQuery};
    use pretty_assertions::assert_eq;

    fn complaint(title: &str, status: ComplaintStatus) -> Complaint {
        Complaint {
            title: title.to_string(),
            status: Some(status),
            ..Complaint::default()
        }
    }

    #[test]
    fn pothole_and_streetlight() {
        let complaints = vec![
            complaint("Pothole", ComplaintStatus::Pending),
            complaint("Streetlight", ComplaintStatus::Resolved),
        ];
        let titles = |q: ListQuery| -> Vec<String> {
            apply(&complaints, &q)
                .into_iter()
                .map(|c| c.title.clone())
                .collect()
        };

        assert_eq!(titles(ListQuery::new().search("pot")), vec!["Pothole"]);
        assert_eq!(
            titles(ListQuery::new().facet("status", "resolved")),
            vec!["Streetlight"]
        );
        assert!(titles(ListQuery::new().search("pot").facet("status", "resolved")).is_empty());
    }

    #[test]
    fn complaint_reads_server_field_names() {
        let raw = serde_json::json!({
            "id": 7,
            "title": "Broken hydrant",
            "description": "Leaking since Monday",
            "status": "in_progress",
            "priority": "urgent",
            "created": "2024-03-01",
            "category": "water",
            "assignedTo": "Public Works",
            "citizenName": "Sam Doe",
            "attachments": []
        });
        let c: Complaint = serde_json::from_value(raw).unwrap();
        assert_eq!(c.status, Some(ComplaintStatus::InProgress));
        assert_eq!(c.priority, Some(Priority::Urgent));
        assert_eq!(c.created_at.as_deref(), Some("2024-03-01"));
        assert_eq!(c.assigned_to.as_deref(), Some("Public Works"));
        assert!(matches_name(&c, "sam"));
    }

    fn matches_name(c: &Complaint, term: &str) -> bool {
        crate::filter::matches_search(c, term)
    }

    #[test]
    fn unknown_status_keeps_the_server_value() {
        let raw = serde_json::json!({"id": 1, "title": "x", "status": "escalated"});
        let c: Complaint = serde_json::from_value(raw).unwrap();
        assert_eq!(c.status, Some(ComplaintStatus::Other("escalated".into())));
        assert_eq!(c.facet("status"), Some("escalated"));

        let back = serde_json::to_value(&c).unwrap();
        assert_eq!(back["status"], serde_json::json!("escalated"));

        let list = vec![c, complaint("Pothole", ComplaintStatus::Pending)];
        let kept = apply(&list, &ListQuery::new().facet("status", "escalated"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "x");
    }

    #[test]
    fn known_values_still_decode_to_their_variant() {
        let status: LicenseStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(status, LicenseStatus::Active);
        assert_eq!(
            LicenseStatus::from_wire("suspended".into()).to_string(),
            "suspended"
        );
        assert!("suspended".parse::<LicenseStatus>().is_err());
    }

    fn bill(title: &str, vote: Option<VoteType>) -> Bill {
        Bill {
            title: title.to_string(),
            user_vote: vote,
            ..Bill::default()
        }
    }

    #[test]
    fn bill_buckets_split_on_the_users_vote() {
        let bills = vec![
            bill("Bike lanes", Some(VoteType::Support)),
            bill("Park levy", None),
            bill("Noise rules", Some(VoteType::Oppose)),
        ];
        let titles = |bucket: &str| -> Vec<String> {
            apply(&bills, &ListQuery::new().bucket(bucket))
                .into_iter()
                .map(|b| b.title.clone())
                .collect()
        };
        assert_eq!(titles("voted"), vec!["Bike lanes", "Noise rules"]);
        assert_eq!(titles("not_voted"), vec!["Park levy"]);
    }

    fn license(license_type: &str, status: LicenseStatus) -> License {
        License {
            license_type: license_type.to_string(),
            status: Some(status),
            ..License::default()
        }
    }

    #[test]
    fn license_buckets_pending_and_issued() {
        let licenses = vec![
            license("Food Vendor", LicenseStatus::Pending),
            license("Liquor", LicenseStatus::Active),
            license("Signage", LicenseStatus::Approved),
            license("Street Food Cart", LicenseStatus::Rejected),
        ];
        let types = |query: ListQuery| -> Vec<String> {
            apply(&licenses, &query)
                .into_iter()
                .map(|l| l.license_type.clone())
                .collect()
        };
        assert_eq!(types(ListQuery::new().bucket("pending")), vec!["Food Vendor"]);
        assert_eq!(types(ListQuery::new().bucket("issued")), vec!["Liquor", "Signage"]);
        assert_eq!(
            types(ListQuery::new().facet("license_type", "Liquor")),
            vec!["Liquor"]
        );
    }

    #[test]
    fn license_type_contains_matches_like_the_server() {
        let licenses = vec![
            license("Food Vendor", LicenseStatus::Pending),
            license("Street Food Cart", LicenseStatus::Pending),
            license("Liquor", LicenseStatus::Pending),
        ];
        let kept = apply(&licenses, &ListQuery::new().facet_contains("license_type", "food"));
        assert_eq!(kept.len(), 2);
        assert!(apply(&licenses, &ListQuery::new().facet("license_type", "food")).is_empty());
    }

    #[test]
    fn license_search_covers_the_owner() {
        let raw = serde_json::json!({
            "id": 4,
            "license_type": "Food Vendor",
            "business_name": "Corner Tacos",
            "business_owner": "Maria Gomez",
            "status": "pending"
        });
        let l: License = serde_json::from_value(raw).unwrap();
        assert_eq!(l.business_owner.as_deref(), Some("Maria Gomez"));
        assert!(crate::filter::matches_search(&l, "gomez"));
        assert!(!crate::filter::matches_search(&l, "smith"));
    }

    #[test]
    fn event_review_bucket_holds_pending_events() {
        let events = vec![
            Event {
                title: "Night market".into(),
                status: Some(EventStatus::Pending),
                ..Event::default()
            },
            Event {
                title: "Farmers market".into(),
                status: Some(EventStatus::Approved),
                ..Event::default()
            },
        ];
        let review = apply(&events, &ListQuery::new().bucket("review"));
        assert_eq!(review.len(), 1);
        assert_eq!(review[0].title, "Night market");
        let open = apply(&events, &ListQuery::new().bucket("open"));
        assert_eq!(open[0].title, "Farmers market");
    }

    #[test]
    fn search_reaches_description_and_category() {
        let mut c = complaint("Broken bench", ComplaintStatus::Pending);
        c.description = "Splinters near the fountain".into();
        c.category = "parks".into();
        let list = vec![c, complaint("Pothole", ComplaintStatus::Pending)];

        let hits = apply(&list, &ListQuery::new().search("fountain"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Broken bench");
        let hits = apply(&list, &ListQuery::new().search("PARKS"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Broken bench");
    }

    #[test]
    fn complaint_dates_filter_on_filing_day() {
        let mut early = complaint("Early", ComplaintStatus::Pending);
        early.created_at = Some("2024-01-10".into());
        let mut late = complaint("Late", ComplaintStatus::Pending);
        late.created_at = Some("2024-06-02 14:05".into());
        let list = vec![early, late, complaint("Undated", ComplaintStatus::Pending)];

        let from = crate::filter::parse_date("2024-02-01").unwrap();
        let kept = apply(&list, &ListQuery::new().dates(DateRange::new(Some(from), None)));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Late");
    }

    #[test]
    fn announcement_reads_list_payload() {
        let raw = serde_json::json!({
            "id": 3,
            "title": "Water main work",
            "description": "Elm St closed",
            "content": "Crews will replace the main on Elm St.",
            "date": "2024-05-02",
            "priority": "high",
            "type": "alert",
            "status": "published",
            "department": "Public Works",
            "lastUpdated": "2024-05-03",
            "question_count": 2,
            "answered_count": 1,
            "pending_count": 1
        });
        let a: Announcement = serde_json::from_value(raw).unwrap();
        assert_eq!(a.kind.as_deref(), Some("alert"));
        assert_eq!(a.status, Some(AnnouncementStatus::Published));
        assert_eq!(a.last_updated.as_deref(), Some("2024-05-03"));
        assert_eq!(a.facet("type"), Some("alert"));
        assert!(a.in_bucket("unanswered"));
        assert_eq!(serde_json::to_value(&a).unwrap()["type"], serde_json::json!("alert"));
    }

    #[test]
    fn notification_buckets_follow_read_state() {
        let list = vec![
            Notification {
                title: "Complaint updated".into(),
                kind: "complaint_update".into(),
                ..Notification::default()
            },
            Notification {
                title: "Welcome".into(),
                kind: "general".into(),
                is_read: true,
                ..Notification::default()
            },
        ];
        let unread = apply(&list, &ListQuery::new().bucket("unread"));
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].title, "Complaint updated");
        let general = apply(&list, &ListQuery::new().facet("type", "general"));
        assert_eq!(general[0].title, "Welcome");
    }

    #[test]
    fn user_accounts_filter_by_role_and_approval() {
        let raw = serde_json::json!([
            {"user_id": 8, "email": "b@x.io", "firstName": "Bo", "lastName": "Ng", "role": "business", "is_approved": false, "town": "Ashby"},
            {"user_id": 9, "email": "c@x.io", "firstName": "Cy", "lastName": "Oz", "role": "citizen", "is_approved": true, "town": "Ashby"}
        ]);
        let users: Vec<UserAccount> = serde_json::from_value(raw).unwrap();
        let pending = apply(&users, &ListQuery::new().bucket("pending"));
        assert_eq!(pending[0].user_id, 8);
        let citizens = apply(&users, &ListQuery::new().facet("role", "citizen"));
        assert_eq!(citizens[0].full_name(), "Cy Oz");
    }

    #[test]
    fn bill_department_in_both_shapes() {
        let listed: Bill =
            serde_json::from_value(serde_json::json!({"id": 1, "department": "Parks"})).unwrap();
        let detail: Bill = serde_json::from_value(
            serde_json::json!({"id": 1, "department": {"id": 4, "name": "Parks"}}),
        )
        .unwrap();
        assert_eq!(listed.department_name(), Some("Parks"));
        assert_eq!(detail.department_name(), Some("Parks"));
    }

    #[test]
    fn null_user_vote_decodes_as_none() {
        let bill: Bill =
            serde_json::from_value(serde_json::json!({"id": 3, "user_vote": null})).unwrap();
        assert_eq!(bill.user_vote, None);
    }

    #[test]
    fn complaint_priority_sorts_by_rank() {
        let mut low = complaint("a", ComplaintStatus::Pending);
        low.priority = Some(Priority::Low);
        let mut urgent = complaint("b", ComplaintStatus::Pending);
        urgent.priority = Some(Priority::Urgent);
        let list = vec![low, urgent];
        let out = apply(&list, &ListQuery::new().sort("-priority"));
        assert_eq!(out[0].title, "b");
    }

    #[test]
    fn wire_enums_parse_their_wire_names() {
        assert_eq!("under_review".parse::<BillStatus>(), Ok(BillStatus::UnderReview));
        assert!("nope".parse::<EventStatus>().is_err());
        assert_eq!(VoteType::Support.to_string(), "support");
    }

    #[test]
    fn full_event_leaves_open_bucket() {
        let event = Event {
            status: Some(EventStatus::Approved),
            current_attendees: 20,
            max_attendees: Some(20),
            ..Event::default()
        };
        assert!(event.is_full());
        assert!(!event.in_bucket("open"));
    }

    #[test]
    fn login_response_accepts_camel_case_user() {
        let raw = serde_json::json!({
            "token": "abc",
            "user": {"id": 2, "email": "a@b.c", "firstName": "Ana", "lastName": "Lee", "role": "citizen"}
        });
        let login: LoginResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(login.user.display_name(), "Ana Lee");
        assert_eq!(login.user.role, Some(Role::Citizen));
    }
}

use crate::client::{ApiClient, Auth};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use townhall_core::ClientError;
use townhall_core::schema::{
    AnnouncementQuestion, BillComment, ComplaintStatus, LoginResponse, Priority, RecordId, Role,
    User, VoteType,
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Ack {
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Ack {
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(rename = "userType")]
    pub user_type: Role,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "userType")]
    pub user_type: Option<Role>,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "townId", skip_serializing_if = "Option::is_none")]
    pub town_id: Option<RecordId>,
    #[serde(rename = "businessName", skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupReply {
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// Partial update: only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComplaintUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ComplaintStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_resolution: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BillDraft {
    pub title: String,
    pub description: String,
    pub department_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_deadline: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BillUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize)]
pub struct LicenseReview {
    pub action: ReviewAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_days: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Approve,
    Reject,
    Cancel,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD`
    pub event_date: String,
    /// `HH:MM`
    pub event_time: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DepartmentForm {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnouncementDraft {
    pub title: String,
    pub content: String,
    pub department_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnouncementUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbox {
    Citizen,
    Business,
}

impl Inbox {
    pub fn path(&self) -> &'static str {
        match self {
            Inbox::Citizen => "citizen/notifications/",
            Inbox::Business => "business/notifications/",
        }
    }
}

/// Sent as `status`; the server also takes `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccountAction {
    #[serde(rename = "approved")]
    Approve,
    #[serde(rename = "rejected")]
    Reject,
    #[serde(rename = "deactivate")]
    Deactivate,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OfficialPermissions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_view_users: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_approve_users: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Summary,
    Users,
    Complaints,
    Licenses,
    Towns,
}

impl ReportKind {
    pub fn path(&self) -> &'static str {
        match self {
            ReportKind::Summary => "auth/admin/reports/summary/",
            ReportKind::Users => "auth/admin/reports/users/",
            ReportKind::Complaints => "auth/admin/reports/complaints/",
            ReportKind::Licenses => "auth/admin/reports/licenses/",
            ReportKind::Towns => "auth/admin/reports/towns/",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::Summary => "summary",
            ReportKind::Users => "users",
            ReportKind::Complaints => "complaints",
            ReportKind::Licenses => "licenses",
            ReportKind::Towns => "towns",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    user: User,
}

impl ApiClient {
    pub fn login(&self, credentials: &Credentials<'_>) -> Result<LoginResponse, ClientError> {
        self.post("auth/login/", credentials, Auth::Public)
    }

    pub fn signup(&self, request: &SignupRequest) -> Result<SignupReply, ClientError> {
        self.post("auth/signup/", request, Auth::Public)
    }

    pub fn logout(&self) -> Result<Ack, ClientError> {
        self.post("auth/logout/", &json!({}), Auth::Required)
    }

    pub fn me(&self) -> Result<User, ClientError> {
        let envelope: ProfileEnvelope = self.get("auth/users/me/", &[], Auth::Required)?;
        Ok(envelope.user)
    }

    pub fn report(&self, kind: ReportKind, query: &[(&str, &str)]) -> Result<Value, ClientError> {
        self.get(kind.path(), query, Auth::Required)
    }

    pub fn create_complaint(&self, complaint: &NewComplaint) -> Result<Ack, ClientError> {
        self.post("citizen/complaints/", complaint, Auth::Required)
    }

    pub fn update_complaint(
        &self,
        id: RecordId,
        update: &ComplaintUpdate,
    ) -> Result<Ack, ClientError> {
        self.put(&format!("citizen/complaints/{id}/"), update)
    }

    pub fn comment_on_complaint(&self, id: RecordId, comment: &str) -> Result<Ack, ClientError> {
        self.post(
            &format!("citizen/complaints/{id}/comments/"),
            &json!({ "comment": comment }),
            Auth::Required,
        )
    }

    pub fn create_bill(&self, draft: &BillDraft) -> Result<Ack, ClientError> {
        self.post("government/bills/", draft, Auth::Required)
    }

    pub fn update_bill(&self, id: RecordId, update: &BillUpdate) -> Result<Ack, ClientError> {
        self.put(&format!("government/bills/{id}/"), update)
    }

    pub fn delete_bill(&self, id: RecordId) -> Result<(), ClientError> {
        self.delete(&format!("government/bills/{id}/"))
    }

    pub fn vote_on_bill(&self, id: RecordId, vote: VoteType) -> Result<Ack, ClientError> {
        self.post(
            &format!("government/bills/{id}/vote/"),
            &json!({ "vote_type": vote.as_str() }),
            Auth::Required,
        )
    }

    pub fn withdraw_bill_vote(&self, id: RecordId) -> Result<(), ClientError> {
        self.delete(&format!("government/bills/{id}/vote/delete/"))
    }

    pub fn bill_comments(&self, id: RecordId) -> Result<Vec<BillComment>, ClientError> {
        self.get(&format!("government/bills/{id}/comments/"), &[], Auth::Required)
    }

    pub fn comment_on_bill(&self, id: RecordId, comment: &str) -> Result<Ack, ClientError> {
        self.post(
            &format!("government/bills/{id}/comments/"),
            &json!({ "comment": comment }),
            Auth::Required,
        )
    }

    pub fn review_license(&self, id: RecordId, review: &LicenseReview) -> Result<Ack, ClientError> {
        self.post(
            &format!("government/licenses/{id}/review/"),
            review,
            Auth::Required,
        )
    }

    pub fn license_statistics(&self) -> Result<Value, ClientError> {
        self.get("government/licenses/statistics/", &[], Auth::Required)
    }

    pub fn create_event(&self, event: &NewEvent) -> Result<Ack, ClientError> {
        self.post("business/events/", event, Auth::Required)
    }

    pub fn review_event(&self, id: RecordId, action: EventAction) -> Result<Ack, ClientError> {
        self.post(
            &format!("business/events/{id}/"),
            &json!({ "action": action }),
            Auth::Required,
        )
    }

    pub fn register_for_event(&self, id: RecordId, notes: Option<&str>) -> Result<Ack, ClientError> {
        self.post(
            &format!("business/events/{id}/registrations/"),
            &json!({ "notes": notes.unwrap_or_default() }),
            Auth::Required,
        )
    }

    pub fn create_department(&self, form: &DepartmentForm) -> Result<Ack, ClientError> {
        self.post("government/departments/", form, Auth::Required)
    }

    pub fn update_department(&self, id: RecordId, form: &DepartmentForm) -> Result<Ack, ClientError> {
        self.put(&format!("government/departments/{id}/"), form)
    }

    pub fn delete_department(&self, id: RecordId) -> Result<(), ClientError> {
        self.delete(&format!("government/departments/{id}/"))
    }

    pub fn create_announcement(&self, draft: &AnnouncementDraft) -> Result<Ack, ClientError> {
        self.post("government/announcements/", draft, Auth::Required)
    }

    pub fn update_announcement(
        &self,
        id: RecordId,
        update: &AnnouncementUpdate,
    ) -> Result<Ack, ClientError> {
        self.patch(&format!("government/announcements/{id}/"), update)
    }

    pub fn delete_announcement(&self, id: RecordId) -> Result<(), ClientError> {
        self.delete(&format!("government/announcements/{id}/"))
    }

    pub fn announcement_questions(
        &self,
        id: RecordId,
    ) -> Result<Vec<AnnouncementQuestion>, ClientError> {
        self.get(
            &format!("government/announcements/{id}/questions/"),
            &[],
            Auth::Required,
        )
    }

    pub fn ask_question(&self, id: RecordId, question: &str) -> Result<Ack, ClientError> {
        self.post(
            &format!("government/announcements/{id}/questions/"),
            &json!({ "question": question }),
            Auth::Required,
        )
    }

    pub fn answer_question(
        &self,
        id: RecordId,
        question_id: RecordId,
        answer: &str,
    ) -> Result<Ack, ClientError> {
        self.post(
            &format!("government/announcements/{id}/questions/{question_id}/answers/"),
            &json!({ "answer": answer }),
            Auth::Required,
        )
    }

    pub fn mark_notification_read(&self, inbox: Inbox, id: RecordId) -> Result<Ack, ClientError> {
        self.patch(&format!("{}{id}/", inbox.path()), &json!({}))
    }

    pub fn update_account(&self, user_id: RecordId, action: AccountAction) -> Result<Ack, ClientError> {
        self.patch(
            &format!("auth/users/{user_id}/"),
            &json!({ "status": action }),
        )
    }

    pub fn set_official_permissions(
        &self,
        id: RecordId,
        permissions: &OfficialPermissions,
    ) -> Result<Ack, ClientError> {
        self.patch(&format!("government/officials/{id}/"), permissions)
    }
}

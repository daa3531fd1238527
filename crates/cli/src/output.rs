use anyhow::Result;
use serde::Serialize;
use townhall_core::Notice;
use townhall_core::schema::{
    Announcement, AnnouncementQuestion, Bill, BillComment, Complaint, Department, Event, License,
    Notification, Official, User, UserAccount,
};

/// How a record shows up in `list` tables, `show` output and CSV exports.
pub trait Tabular {
    const HEADERS: &'static [&'static str];
    /// Field paths passed to the CSV exporter.
    const CSV_COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
    fn detail(&self) -> Vec<(&'static str, String)>;
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn label<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl Tabular for Complaint {
    const HEADERS: &'static [&'static str] = &["ID", "TITLE", "CATEGORY", "STATUS", "PRIORITY", "FILED"];
    const CSV_COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "category",
        "status",
        "priority",
        "location",
        "created_at",
        "assigned_to",
        "description",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.category.clone(),
            label(self.status.as_ref()),
            label(self.priority.as_ref()),
            opt(self.created_at.as_deref()),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("Title", self.title.clone()),
            ("Status", label(self.status.as_ref())),
            ("Priority", label(self.priority.as_ref())),
            ("Category", self.category.clone()),
            ("Location", opt(self.location.as_deref())),
            ("Filed", opt(self.created_at.as_deref())),
            ("Filed by", opt(self.citizen_name.as_deref())),
            ("Assigned to", opt(self.assigned_to.as_deref())),
            ("Est. resolution", opt(self.estimated_resolution.as_deref())),
            ("Description", self.description.clone()),
        ];
        for comment in &self.comments {
            lines.push(("Comment", format!("{}: {}", comment.author, comment.text)));
        }
        lines
    }
}

impl Tabular for Bill {
    const HEADERS: &'static [&'static str] =
        &["ID", "TITLE", "STATUS", "DEPARTMENT", "SUPPORT", "OPPOSE", "YOUR VOTE"];
    const CSV_COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "status",
        "priority",
        "support_count",
        "oppose_count",
        "comment_count",
        "created_at",
        "review_deadline",
        "user_vote",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            label(self.status.as_ref()),
            opt(self.department_name()),
            self.support_count.to_string(),
            self.oppose_count.to_string(),
            label(self.user_vote.as_ref()),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Title", self.title.clone()),
            ("Status", label(self.status.as_ref())),
            ("Priority", label(self.priority.as_ref())),
            ("Department", opt(self.department_name())),
            ("Proposed by", opt(self.created_by.as_deref())),
            ("Support", self.support_count.to_string()),
            ("Oppose", self.oppose_count.to_string()),
            ("Comments", self.comment_count.to_string()),
            ("Your vote", label(self.user_vote.as_ref())),
            ("Review deadline", opt(self.review_deadline.as_deref())),
            ("Tags", self.tags.join(", ")),
            ("Summary", opt(self.summary.as_deref())),
            ("Description", self.description.clone()),
        ]
    }
}

impl Tabular for License {
    const HEADERS: &'static [&'static str] = &["ID", "TYPE", "BUSINESS", "STATUS", "APPLIED", "EXPIRES"];
    const CSV_COLUMNS: &'static [&'static str] = &[
        "id",
        "license_number",
        "license_type",
        "business_name",
        "business_owner",
        "status",
        "application_date",
        "issue_date",
        "expiry_date",
        "fee",
        "fee_paid",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.license_type.clone(),
            opt(self.business_name.as_deref()),
            label(self.status.as_ref()),
            opt(self.applied_on()),
            opt(self.expiry_date.as_deref()),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Type", self.license_type.clone()),
            ("Number", opt(self.license_number.as_deref())),
            ("Business", opt(self.business_name.as_deref())),
            ("Owner", opt(self.business_owner.as_deref())),
            ("Status", label(self.status.as_ref())),
            ("Applied", opt(self.applied_on())),
            ("Issued", opt(self.issue_date.as_deref())),
            ("Expires", opt(self.expiry_date.as_deref())),
            ("Fee", label(self.fee)),
            ("Fee paid", self.fee_paid.to_string()),
            ("Requirements", self.requirements.join(", ")),
            ("Documents", (self.documents.len() + self.attachments.len()).to_string()),
            ("Review comment", opt(self.review_comment.as_deref())),
            ("Description", opt(self.description.as_deref())),
        ]
    }
}

impl Tabular for Event {
    const HEADERS: &'static [&'static str] = &["ID", "TITLE", "DATE", "STATUS", "ATTENDEES", "HOST"];
    const CSV_COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "category",
        "event_date",
        "event_time",
        "location",
        "status",
        "current_attendees",
        "max_attendees",
        "business_name",
    ];

    fn cells(&self) -> Vec<String> {
        let capacity = match self.max_attendees {
            Some(max) => format!("{}/{max}", self.current_attendees),
            None => self.current_attendees.to_string(),
        };
        vec![
            self.id.to_string(),
            self.title.clone(),
            opt(self.event_date.as_deref()),
            label(self.status.as_ref()),
            capacity,
            opt(self.business_name.as_deref()),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Title", self.title.clone()),
            ("Status", label(self.status.as_ref())),
            ("Category", opt(self.category.as_deref())),
            ("Date", opt(self.event_date.as_deref())),
            ("Time", opt(self.event_time.as_deref())),
            ("Location", opt(self.location.as_deref())),
            ("Attendees", self.current_attendees.to_string()),
            ("Capacity", label(self.max_attendees)),
            ("Full", self.is_full().to_string()),
            ("Host", opt(self.business_name.as_deref())),
            ("Description", self.description.clone()),
        ]
    }
}

impl Tabular for Department {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "EMAIL", "PHONE"];
    const CSV_COLUMNS: &'static [&'static str] =
        &["id", "name", "description", "contact_email", "contact_phone"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt(self.contact_email.as_deref()),
            opt(self.contact_phone.as_deref()),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.name.clone()),
            ("Email", opt(self.contact_email.as_deref())),
            ("Phone", opt(self.contact_phone.as_deref())),
            ("Description", opt(self.description.as_deref())),
        ]
    }
}

impl Tabular for Announcement {
    const HEADERS: &'static [&'static str] =
        &["ID", "TITLE", "TYPE", "PRIORITY", "STATUS", "DATE", "QUESTIONS"];
    const CSV_COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "type",
        "priority",
        "status",
        "department",
        "author",
        "date",
        "views",
        "question_count",
        "pending_count",
        "description",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            opt(self.kind.as_deref()),
            label(self.priority.as_ref()),
            label(self.status.as_ref()),
            opt(self.date.as_deref()),
            format!("{}/{}", self.answered_count, self.question_count),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Title", self.title.clone()),
            ("Type", opt(self.kind.as_deref())),
            ("Priority", label(self.priority.as_ref())),
            ("Status", label(self.status.as_ref())),
            ("Department", opt(self.department.as_deref())),
            ("Author", opt(self.author.as_deref())),
            ("Date", opt(self.date.as_deref())),
            ("Published", opt(self.publish_date.as_deref())),
            ("Expires", opt(self.expiry_date.as_deref())),
            ("Views", self.views.to_string()),
            (
                "Questions",
                format!("{} ({} unanswered)", self.question_count, self.pending_count),
            ),
            ("Tags", self.tags.join(", ")),
            ("Content", self.content.clone()),
        ]
    }
}

impl Tabular for Notification {
    const HEADERS: &'static [&'static str] = &["ID", "TYPE", "TITLE", "READ", "RECEIVED"];
    const CSV_COLUMNS: &'static [&'static str] =
        &["id", "type", "title", "message", "is_read", "created_at", "complaint_id"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.kind.clone(),
            self.title.clone(),
            if self.is_read { "yes" } else { "no" }.to_string(),
            opt(self.created_at.as_deref()),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("Title", self.title.clone()),
            ("Type", self.kind.clone()),
            ("Read", self.is_read.to_string()),
            ("Received", opt(self.created_at.as_deref())),
            ("Message", self.message.clone()),
        ];
        if let Some(title) = &self.complaint_title {
            lines.push(("Complaint", title.clone()));
        }
        lines
    }
}

impl Tabular for Official {
    const HEADERS: &'static [&'static str] =
        &["ID", "NAME", "EMAIL", "DEPARTMENT", "TOWN", "VIEW USERS", "APPROVE USERS"];
    const CSV_COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "email",
        "first_name",
        "last_name",
        "department",
        "position",
        "town.name",
        "can_view_users",
        "can_approve_users",
        "is_approved",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.full_name(),
            self.email.clone(),
            opt(self.department.as_deref()),
            opt(self.town.as_ref().map(|t| t.name.as_str())),
            self.can_view_users.to_string(),
            self.can_approve_users.to_string(),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.full_name()),
            ("Email", self.email.clone()),
            ("Employee ID", opt(self.employee_id.as_deref())),
            ("Department", opt(self.department.as_deref())),
            ("Position", opt(self.position.as_deref())),
            ("Phone", opt(self.phone_number.as_deref())),
            ("Town", opt(self.town.as_ref().map(|t| t.name.as_str()))),
            ("Can view users", self.can_view_users.to_string()),
            ("Can approve users", self.can_approve_users.to_string()),
            ("Approved", self.is_approved.to_string()),
        ]
    }
}

impl Tabular for UserAccount {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "EMAIL", "ROLE", "TOWN", "APPROVED"];
    const CSV_COLUMNS: &'static [&'static str] = &[
        "user_id",
        "email",
        "first_name",
        "last_name",
        "role",
        "town",
        "is_approved",
        "created_at",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.user_id.to_string(),
            self.full_name(),
            self.email.clone(),
            label(self.role.as_ref()),
            opt(self.town.as_deref()),
            self.is_approved.to_string(),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.full_name()),
            ("Email", self.email.clone()),
            ("Role", label(self.role.as_ref())),
            ("Town", opt(self.town.as_deref())),
            ("Approved", self.is_approved.to_string()),
            ("Joined", opt(self.created_at.as_deref())),
        ]
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_table<T: Tabular>(records: &[&T]) {
    if records.is_empty() {
        println!("No records found.");
        return;
    }
    let rows: Vec<Vec<String>> = records.iter().map(|r| r.cells()).collect();
    let mut widths: Vec<usize> = T::HEADERS.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let headers: Vec<String> = T::HEADERS.iter().map(|h| h.to_string()).collect();
    print_row(&headers, &widths);
    for row in &rows {
        print_row(row, &widths);
    }
}

fn print_row(cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    println!("{}", line.join("  ").trim_end());
}

pub fn print_detail<T: Tabular>(record: &T) {
    let pad = record
        .detail()
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, value) in record.detail() {
        println!("{:<pad$}  {value}", format!("{name}:"), pad = pad + 1);
    }
}

pub fn print_bill_comments(comments: &[BillComment]) {
    if comments.is_empty() {
        println!("No comments yet.");
    }
    for comment in comments {
        let role = comment.author_role.as_deref().unwrap_or("member");
        println!(
            "#{} {} ({role}) {}: {}",
            comment.id,
            comment.author,
            comment.created_at.as_deref().unwrap_or(""),
            comment.comment_text
        );
    }
}

pub fn print_questions(questions: &[AnnouncementQuestion]) {
    if questions.is_empty() {
        println!("No questions yet.");
    }
    for q in questions {
        let asker = q.citizen_name.as_deref().unwrap_or("citizen");
        println!("#{} {asker}: {}", q.id, q.question);
        match &q.answer {
            Some(answer) if q.is_answered => {
                let by = q.answered_by.as_deref().unwrap_or("official");
                println!("    {by}: {answer}");
            }
            _ => println!("    (unanswered)"),
        }
    }
}

pub fn print_user(user: &User) {
    println!("{} <{}>", user.display_name(), user.email);
    println!("role: {}", label(user.role.as_ref()));
    if user.is_superuser {
        println!("administrator");
    }
}

/// The one place failures reach the terminal.
pub fn report_failure(notice: &Notice, json: bool) {
    if json {
        match serde_json::to_string(notice) {
            Ok(line) => eprintln!("{line}"),
            Err(_) => eprintln!("{notice}"),
        }
    } else {
        eprintln!("{notice}");
    }
}

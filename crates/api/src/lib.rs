//! Blocking HTTP client for the TownHall REST API.

pub mod client;
pub mod collections;
pub mod resources;

pub use client::{ApiClient, Auth};
pub use collections::RemoteCollection;
pub use resources::{
    AccountAction, Ack, AnnouncementDraft, AnnouncementUpdate, BillDraft, BillUpdate,
    ComplaintUpdate, Credentials, DepartmentForm, EventAction, Inbox, LicenseReview,
    NewComplaint, NewEvent, OfficialPermissions, ReportKind, ReviewAction, SignupReply,
    SignupRequest,
};

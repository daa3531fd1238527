mod args;
mod output;

use anyhow::{Context, Result, anyhow};
use args::{ExportArgs, LicenseScope, ListArgs, ReportArg, TypeFilter};
use clap::{Args, Parser, Subcommand};
use output::Tabular;
use schemars::schema_for;
use serde::Serialize;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use townhall_api::{
    AccountAction, AnnouncementDraft, AnnouncementUpdate, ApiClient, BillDraft, BillUpdate,
    ComplaintUpdate, Credentials, DepartmentForm, EventAction, Inbox, LicenseReview, NewComplaint,
    NewEvent, OfficialPermissions, ReportKind, ReviewAction, SignupRequest,
};
use townhall_core::config::ClientConfig;
use townhall_core::listing::{CollectionSource, Keyed, RemoteFilter, ResourceList};
use townhall_core::schema::{
    Announcement, Bill, Complaint, ComplaintStatus, Department, Event, License, Notification,
    Official, Priority, RecordId, Role, UserAccount, VoteType,
};
use townhall_core::session::{Session, SessionStore};
use townhall_core::{ClientError, ListQuery, ListRecord, Notice, Selection};
use townhall_export::ExportFormat;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TOWNHALL_LOG";

#[derive(Parser)]
#[command(name = "townhall")]
#[command(about = "TownHall civic portal client", long_about = None)]
struct Cli {
    /// Config file (default: $TOWNHALL_CONFIG, then ~/.townhall/townhall.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TOWNHALL_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "citizen")]
        role: Role,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TOWNHALL_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, default_value = "citizen")]
        role: Role,
        #[arg(long)]
        town_id: Option<RecordId>,
        #[arg(long)]
        business_name: Option<String>,
    },
    /// Sign out and forget the session
    Logout,
    /// Show the signed-in user
    Whoami,
    Complaints {
        #[command(subcommand)]
        command: ComplaintCommands,
    },
    Bills {
        #[command(subcommand)]
        command: BillCommands,
    },
    Licenses {
        #[command(subcommand)]
        command: LicenseCommands,
    },
    Events {
        #[command(subcommand)]
        command: EventCommands,
    },
    Departments {
        #[command(subcommand)]
        command: DepartmentCommands,
    },
    Announcements {
        #[command(subcommand)]
        command: AnnouncementCommands,
    },
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },
    /// Accounts awaiting or holding town access
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Government officials and their user permissions (administrators)
    Officials {
        #[command(subcommand)]
        command: OfficialCommands,
    },
    /// Administrator reports
    Reports {
        #[arg(value_enum)]
        kind: ReportArg,
        /// Reporting window in days (server default: 30)
        #[arg(long)]
        days: Option<u32>,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Export JSON Schemas for the record types
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(Subcommand)]
enum ComplaintCommands {
    List {
        #[command(flatten)]
        filters: ListArgs,
        /// Complaints addressed to the signed-in business
        #[arg(long)]
        business: bool,
    },
    Show {
        id: RecordId,
    },
    /// File a new complaint
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Change status, priority or assignment
    Update {
        id: RecordId,
        #[arg(long)]
        status: Option<ComplaintStatus>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        assigned_to: Option<String>,
        #[arg(long)]
        estimated_resolution: Option<String>,
    },
    Comment {
        id: RecordId,
        text: String,
    },
}

#[derive(Subcommand)]
enum BillCommands {
    List {
        #[command(flatten)]
        filters: ListArgs,
    },
    Show {
        id: RecordId,
        /// Also print the discussion
        #[arg(long)]
        comments: bool,
    },
    /// Propose a bill
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long = "department")]
        department_id: RecordId,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        review_deadline: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    Update {
        id: RecordId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
    },
    Delete {
        id: RecordId,
    },
    Vote {
        id: RecordId,
        vote: VoteType,
    },
    /// Withdraw your vote
    Unvote {
        id: RecordId,
    },
    Comments {
        id: RecordId,
    },
    Comment {
        id: RecordId,
        text: String,
    },
}

#[derive(Subcommand)]
enum LicenseCommands {
    List {
        #[command(flatten)]
        filters: ListArgs,
        #[arg(long, value_enum, default_value_t = LicenseScope::Review)]
        scope: LicenseScope,
    },
    Show {
        id: RecordId,
        #[arg(long, value_enum, default_value_t = LicenseScope::Review)]
        scope: LicenseScope,
    },
    Approve {
        id: RecordId,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        fee: Option<f64>,
        #[arg(long)]
        expiry_days: Option<u32>,
    },
    Reject {
        id: RecordId,
        #[arg(long)]
        comment: String,
    },
    /// Review counts for the town
    Stats,
}

#[derive(Subcommand)]
enum EventCommands {
    List {
        #[command(flatten)]
        filters: ListArgs,
    },
    Show {
        id: RecordId,
    },
    /// Submit an event for approval
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        time: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        max_attendees: Option<u64>,
    },
    Approve {
        id: RecordId,
    },
    Reject {
        id: RecordId,
    },
    Cancel {
        id: RecordId,
    },
    Register {
        id: RecordId,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum DepartmentCommands {
    List {
        #[command(flatten)]
        filters: ListArgs,
    },
    Create {
        #[command(flatten)]
        form: DepartmentArgs,
    },
    Update {
        id: RecordId,
        #[command(flatten)]
        form: DepartmentArgs,
    },
    Delete {
        id: RecordId,
    },
}

#[derive(Subcommand)]
enum AnnouncementCommands {
    List {
        #[command(flatten)]
        filters: ListArgs,
    },
    Show {
        id: RecordId,
        /// Also print the questions
        #[arg(long)]
        questions: bool,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long = "department")]
        department_id: RecordId,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        /// e.g. `alert`, `event`, `news`
        #[arg(long = "type")]
        kind: Option<String>,
        /// Publish right away instead of saving a draft
        #[arg(long)]
        publish: bool,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    Update {
        id: RecordId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        publish: Option<bool>,
    },
    Delete {
        id: RecordId,
    },
    Questions {
        id: RecordId,
    },
    /// Ask a question about an announcement
    Ask {
        id: RecordId,
        text: String,
    },
    Answer {
        id: RecordId,
        question_id: RecordId,
        text: String,
    },
}

#[derive(Subcommand)]
enum NotificationCommands {
    List {
        #[command(flatten)]
        filters: ListArgs,
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
        /// Read the business inbox instead of the citizen one
        #[arg(long)]
        business: bool,
    },
    /// Mark a notification as read
    Read {
        id: RecordId,
        #[arg(long)]
        business: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    List {
        #[command(flatten)]
        filters: ListArgs,
        /// Only accounts awaiting approval
        #[arg(long)]
        pending: bool,
    },
    Approve {
        id: RecordId,
    },
    Reject {
        id: RecordId,
    },
    Deactivate {
        id: RecordId,
    },
}

#[derive(Subcommand)]
enum OfficialCommands {
    List {
        #[command(flatten)]
        filters: ListArgs,
    },
    /// Change what an official may do with user accounts
    Permissions {
        id: RecordId,
        #[arg(long)]
        view_users: Option<bool>,
        #[arg(long)]
        approve_users: Option<bool>,
    },
}

#[derive(Args)]
struct DepartmentArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

impl From<DepartmentArgs> for DepartmentForm {
    fn from(args: DepartmentArgs) -> Self {
        DepartmentForm {
            name: args.name,
            description: args.description,
            contact_email: args.email,
            contact_phone: args.phone,
        }
    }
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for the record types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

/// Everything a command needs, built once per run.
struct App {
    api: ApiClient,
    store: SessionStore,
    session: Option<Session>,
    json: bool,
}

impl App {
    fn load(config_path: Option<&Path>, json: bool) -> Result<Self> {
        let config = ClientConfig::load(config_path)?;
        let store = SessionStore::open(&config.session_path).with_context(|| {
            format!("opening session store {}", config.session_path.display())
        })?;
        let session = store.load()?;

        let mut api = ApiClient::new(&config)?;
        if let Some(session) = &session {
            api = api.with_token(session.token.as_str());
        }
        debug!(
            base_url = api.base_url(),
            signed_in = session.is_some(),
            "client ready"
        );

        Ok(Self {
            api,
            store,
            session,
            json,
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let json = cli.json;
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::report_failure(&notice_for(&err), json);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn notice_for(err: &anyhow::Error) -> Notice {
    if let Some(notice) = err.downcast_ref::<Notice>() {
        return notice.clone();
    }
    if let Some(client) = err.downcast_ref::<ClientError>() {
        return Notice::from(client);
    }
    Notice::application(format!("{err:#}"))
}

fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Commands::Schema {
            command: SchemaCommands::Export { out_dir },
        } => return schema_export(out_dir),
        command => command,
    };

    let app = App::load(cli.config.as_deref(), cli.json)?;
    match command {
        Commands::Login {
            email,
            password,
            role,
        } => login(&app, &email, &password, role),
        Commands::Signup {
            email,
            password,
            first_name,
            last_name,
            role,
            town_id,
            business_name,
        } => {
            let reply = app.api.signup(&SignupRequest {
                email,
                password,
                user_type: Some(role),
                first_name,
                last_name,
                town_id,
                business_name,
            })?;
            if app.json {
                return output::print_json(&reply.user);
            }
            println!(
                "{}",
                reply.message.as_deref().unwrap_or("Account created.")
            );
            println!("Run `townhall login --email {}` to sign in.", reply.user.email);
            Ok(())
        }
        Commands::Logout => logout(&app),
        Commands::Whoami => {
            let user = app.api.me()?;
            if app.json {
                output::print_json(&user)
            } else {
                output::print_user(&user);
                Ok(())
            }
        }
        Commands::Complaints { command } => complaints(&app, command),
        Commands::Bills { command } => bills(&app, command),
        Commands::Licenses { command } => licenses(&app, command),
        Commands::Events { command } => events(&app, command),
        Commands::Departments { command } => departments(&app, command),
        Commands::Announcements { command } => announcements(&app, command),
        Commands::Notifications { command } => notifications(&app, command),
        Commands::Users { command } => users(&app, command),
        Commands::Officials { command } => officials(&app, command),
        Commands::Reports { kind, days, export } => report(&app, kind.into(), days, &export),
        Commands::Schema { .. } => Ok(()),
    }
}

fn login(app: &App, email: &str, password: &str, role: Role) -> Result<()> {
    let login = app.api.login(&Credentials {
        email,
        password,
        user_type: role,
    })?;
    app.store.save(&login.token, &login.user)?;

    if app.json {
        return output::print_json(&login.user);
    }
    let role = login.user.role.as_ref().map_or("unknown", Role::as_str);
    println!("Signed in as {} ({role})", login.user.display_name());
    Ok(())
}

fn logout(app: &App) -> Result<()> {
    if app.session.is_none() {
        println!("Not signed in.");
        return Ok(());
    }
    // The local session goes either way; a dead token cannot be revoked.
    if let Err(err) = app.api.logout() {
        warn!(error = %err, "server-side logout failed");
    }
    app.store.clear()?;
    println!("Signed out.");
    Ok(())
}

fn complaints(app: &App, command: ComplaintCommands) -> Result<()> {
    let api = &app.api;
    let source = api.complaints();
    match command {
        ComplaintCommands::List { filters, business } => {
            if business {
                list(app, &api.business_complaints(), &filters, "business-complaints")
            } else {
                list(app, &source, &filters, "complaints")
            }
        }
        ComplaintCommands::Show { id } => show(app, &source, id),
        ComplaintCommands::Create {
            title,
            description,
            category,
            location,
            priority,
        } => {
            let complaint = NewComplaint {
                title,
                description,
                category,
                location,
                priority,
            };
            let (ack, list) = act(&source, None, |_| api.create_complaint(&complaint))?;
            finish(app, ack.message_or("Complaint submitted."), &list, None)
        }
        ComplaintCommands::Update {
            id,
            status,
            priority,
            assigned_to,
            estimated_resolution,
        } => {
            let update = ComplaintUpdate {
                status,
                priority,
                assigned_to,
                estimated_resolution,
            };
            let (ack, list) = act(&source, Some(id), |_| api.update_complaint(id, &update))?;
            finish(app, ack.message_or("Complaint updated."), &list, Some(id))
        }
        ComplaintCommands::Comment { id, text } => {
            let (ack, list) = act(&source, Some(id), |_| api.comment_on_complaint(id, &text))?;
            finish(app, ack.message_or("Comment added."), &list, Some(id))
        }
    }
}

fn bills(app: &App, command: BillCommands) -> Result<()> {
    let api = &app.api;
    let source = api.bills();
    match command {
        BillCommands::List { filters } => list(app, &source, &filters, "bills"),
        BillCommands::Show { id, comments } => {
            show(app, &source, id)?;
            if comments {
                let thread = api.bill_comments(id)?;
                if app.json {
                    output::print_json(&thread)?;
                } else {
                    println!();
                    output::print_bill_comments(&thread);
                }
            }
            Ok(())
        }
        BillCommands::Create {
            title,
            description,
            department_id,
            summary,
            status,
            priority,
            review_deadline,
            tags,
        } => {
            let draft = BillDraft {
                title,
                description,
                department_id,
                summary,
                status,
                priority,
                review_deadline,
                tags,
            };
            let (ack, list) = act(&source, None, |_| api.create_bill(&draft))?;
            finish(app, ack.message_or("Bill proposed."), &list, None)
        }
        BillCommands::Update {
            id,
            title,
            description,
            status,
            priority,
        } => {
            let update = BillUpdate {
                title,
                description,
                status,
                priority,
            };
            let (ack, list) = act(&source, Some(id), |_| api.update_bill(id, &update))?;
            finish(app, ack.message_or("Bill updated."), &list, Some(id))
        }
        BillCommands::Delete { id } => {
            let ((), list) = act(&source, Some(id), |_| api.delete_bill(id))?;
            finish(app, "Bill deleted.", &list, None)
        }
        BillCommands::Vote { id, vote } => {
            let (ack, list) = act(&source, Some(id), |_| api.vote_on_bill(id, vote))?;
            finish(app, ack.message_or("Vote recorded."), &list, Some(id))
        }
        BillCommands::Unvote { id } => {
            let ((), list) = act(&source, Some(id), |_| api.withdraw_bill_vote(id))?;
            finish(app, "Vote withdrawn.", &list, Some(id))
        }
        BillCommands::Comments { id } => {
            let thread = api.bill_comments(id)?;
            if app.json {
                output::print_json(&thread)
            } else {
                output::print_bill_comments(&thread);
                Ok(())
            }
        }
        BillCommands::Comment { id, text } => {
            let (ack, list) = act(&source, Some(id), |_| api.comment_on_bill(id, &text))?;
            finish(app, ack.message_or("Comment added."), &list, Some(id))
        }
    }
}

fn licenses(app: &App, command: LicenseCommands) -> Result<()> {
    let api = &app.api;
    let scoped = |scope: LicenseScope| match scope {
        LicenseScope::Review => (api.licenses(), "licenses"),
        LicenseScope::Business => (api.business_licenses(), "business-licenses"),
        LicenseScope::Applications => (api.applications(), "applications"),
    };
    let review_source = api.licenses();
    let review = |id: RecordId, review: LicenseReview, fallback: &str| -> Result<()> {
        let (ack, list) = act(&review_source, Some(id), |_| api.review_license(id, &review))?;
        finish(app, ack.message_or(fallback), &list, Some(id))
    };

    match command {
        LicenseCommands::List { filters, scope } => {
            let (source, stem) = scoped(scope);
            list(app, &source, &filters, stem)
        }
        LicenseCommands::Show { id, scope } => show(app, &scoped(scope).0, id),
        LicenseCommands::Approve {
            id,
            comment,
            fee,
            expiry_days,
        } => review(
            id,
            LicenseReview {
                action: ReviewAction::Approve,
                review_comment: comment,
                fee,
                expiry_days,
            },
            "License approved.",
        ),
        LicenseCommands::Reject { id, comment } => review(
            id,
            LicenseReview {
                action: ReviewAction::Reject,
                review_comment: Some(comment),
                fee: None,
                expiry_days: None,
            },
            "License rejected.",
        ),
        LicenseCommands::Stats => output::print_json(&api.license_statistics()?),
    }
}

fn events(app: &App, command: EventCommands) -> Result<()> {
    let api = &app.api;
    let source = api.events();
    let review = |id: RecordId, action: EventAction, fallback: &str| -> Result<()> {
        let (ack, list) = act(&source, Some(id), |_| api.review_event(id, action))?;
        finish(app, ack.message_or(fallback), &list, Some(id))
    };

    match command {
        EventCommands::List { filters } => list(app, &source, &filters, "events"),
        EventCommands::Show { id } => show(app, &source, id),
        EventCommands::Create {
            title,
            description,
            date,
            time,
            location,
            max_attendees,
        } => {
            let event = NewEvent {
                title,
                description,
                event_date: date,
                event_time: time,
                location,
                max_attendees,
            };
            let (ack, list) = act(&source, None, |_| api.create_event(&event))?;
            finish(app, ack.message_or("Event submitted for approval."), &list, None)
        }
        EventCommands::Approve { id } => review(id, EventAction::Approve, "Event approved."),
        EventCommands::Reject { id } => review(id, EventAction::Reject, "Event rejected."),
        EventCommands::Cancel { id } => review(id, EventAction::Cancel, "Event cancelled."),
        EventCommands::Register { id, notes } => {
            let (ack, list) = act(&source, Some(id), |_| {
                api.register_for_event(id, notes.as_deref())
            })?;
            finish(app, ack.message_or("Registered."), &list, Some(id))
        }
    }
}

fn departments(app: &App, command: DepartmentCommands) -> Result<()> {
    let api = &app.api;
    let source = api.departments();
    match command {
        DepartmentCommands::List { filters } => list(app, &source, &filters, "departments"),
        DepartmentCommands::Create { form } => {
            let form = DepartmentForm::from(form);
            let (ack, list) = act(&source, None, |_| api.create_department(&form))?;
            finish(app, ack.message_or("Department created."), &list, None)
        }
        DepartmentCommands::Update { id, form } => {
            let form = DepartmentForm::from(form);
            let (ack, list) = act(&source, Some(id), |_| api.update_department(id, &form))?;
            finish(app, ack.message_or("Department updated."), &list, Some(id))
        }
        DepartmentCommands::Delete { id } => {
            let ((), list) = act(&source, Some(id), |_| api.delete_department(id))?;
            finish(app, "Department deleted.", &list, None)
        }
    }
}

fn announcements(app: &App, command: AnnouncementCommands) -> Result<()> {
    let api = &app.api;
    let source = api.announcements();
    match command {
        AnnouncementCommands::List { filters } => list(app, &source, &filters, "announcements"),
        AnnouncementCommands::Show { id, questions } => {
            show(app, &source, id)?;
            if questions {
                let thread = api.announcement_questions(id)?;
                if app.json {
                    output::print_json(&thread)?;
                } else {
                    println!();
                    output::print_questions(&thread);
                }
            }
            Ok(())
        }
        AnnouncementCommands::Create {
            title,
            content,
            department_id,
            description,
            priority,
            kind,
            publish,
            tags,
        } => {
            let draft = AnnouncementDraft {
                title,
                content,
                department_id,
                description,
                priority,
                kind,
                is_published: publish,
                tags,
            };
            let (ack, list) = act(&source, None, |_| api.create_announcement(&draft))?;
            finish(app, ack.message_or("Announcement created."), &list, None)
        }
        AnnouncementCommands::Update {
            id,
            title,
            content,
            description,
            priority,
            kind,
            publish,
        } => {
            let update = AnnouncementUpdate {
                title,
                content,
                description,
                priority,
                kind,
                is_published: publish,
            };
            let (ack, list) = act(&source, Some(id), |_| api.update_announcement(id, &update))?;
            finish(app, ack.message_or("Announcement updated."), &list, Some(id))
        }
        AnnouncementCommands::Delete { id } => {
            let ((), list) = act(&source, Some(id), |_| api.delete_announcement(id))?;
            finish(app, "Announcement deleted.", &list, None)
        }
        AnnouncementCommands::Questions { id } => {
            let thread = api.announcement_questions(id)?;
            if app.json {
                output::print_json(&thread)
            } else {
                output::print_questions(&thread);
                Ok(())
            }
        }
        AnnouncementCommands::Ask { id, text } => {
            let (ack, list) = act(&source, Some(id), |_| api.ask_question(id, &text))?;
            finish(app, ack.message_or("Question submitted."), &list, Some(id))
        }
        AnnouncementCommands::Answer {
            id,
            question_id,
            text,
        } => {
            let (ack, list) = act(&source, Some(id), |_| {
                api.answer_question(id, question_id, &text)
            })?;
            finish(app, ack.message_or("Answer submitted."), &list, Some(id))
        }
    }
}

fn inbox_for(business: bool) -> (Inbox, &'static str) {
    if business {
        (Inbox::Business, "business-notifications")
    } else {
        (Inbox::Citizen, "notifications")
    }
}

fn notifications(app: &App, command: NotificationCommands) -> Result<()> {
    let api = &app.api;
    match command {
        NotificationCommands::List {
            filters,
            unread,
            business,
        } => {
            let (inbox, stem) = inbox_for(business);
            let mut remote = filters.remote_filter::<Notification>();
            let mut query = filters.query::<Notification>();
            if unread {
                remote.set("is_read", Selection::parse("false"));
                query = query.bucket("unread");
            }
            let source = api.notifications(inbox);
            list_filtered(app, &source, remote, &query, &filters.export, stem)
        }
        NotificationCommands::Read { id, business } => {
            let (inbox, _) = inbox_for(business);
            let source = api.notifications(inbox);
            let (ack, list) = act(&source, Some(id), |_| api.mark_notification_read(inbox, id))?;
            finish(app, ack.message_or("Notification marked as read."), &list, Some(id))
        }
    }
}

fn users(app: &App, command: UserCommands) -> Result<()> {
    let api = &app.api;
    let source = api.users();
    let account = |id: RecordId, action: AccountAction, fallback: &str| -> Result<()> {
        let (ack, list) = act(&source, Some(id), |_| api.update_account(id, action))?;
        finish(app, ack.message_or(fallback), &list, Some(id))
    };

    match command {
        UserCommands::List { filters, pending } => {
            let mut remote = filters.remote_filter::<UserAccount>();
            if pending {
                remote.set("status", Selection::parse("pending"));
            }
            let query = filters.query::<UserAccount>();
            list_filtered(app, &source, remote, &query, &filters.export, "users")
        }
        UserCommands::Approve { id } => account(id, AccountAction::Approve, "User approved."),
        UserCommands::Reject { id } => account(id, AccountAction::Reject, "User rejected."),
        UserCommands::Deactivate { id } => {
            account(id, AccountAction::Deactivate, "User deactivated.")
        }
    }
}

fn officials(app: &App, command: OfficialCommands) -> Result<()> {
    let api = &app.api;
    let source = api.officials();
    match command {
        OfficialCommands::List { filters } => list(app, &source, &filters, "officials"),
        OfficialCommands::Permissions {
            id,
            view_users,
            approve_users,
        } => {
            let permissions = OfficialPermissions {
                can_view_users: view_users,
                can_approve_users: approve_users,
            };
            let (ack, list) = act(&source, Some(id), |_| {
                api.set_official_permissions(id, &permissions)
            })?;
            finish(app, ack.message_or("Permissions updated."), &list, Some(id))
        }
    }
}

fn list<S>(app: &App, source: &S, filters: &ListArgs, stem: &str) -> Result<()>
where
    S: CollectionSource,
    S::Record: ListRecord + Tabular + TypeFilter + Serialize,
{
    let remote = filters.remote_filter::<S::Record>();
    let query = filters.query::<S::Record>();
    list_filtered(app, source, remote, &query, &filters.export, stem)
}

fn list_filtered<S>(
    app: &App,
    source: &S,
    remote: RemoteFilter,
    query: &ListQuery,
    export: &ExportArgs,
    stem: &str,
) -> Result<()>
where
    S: CollectionSource,
    S::Record: ListRecord + Tabular + Serialize,
{
    let mut list = ResourceList::new(remote);
    list.refresh(source);
    if let Some(notice) = list.error() {
        return Err(anyhow::Error::new(notice.clone()));
    }

    let rows = list.view(query);
    if let Some(format) = export.export {
        return export_records(&rows, stem, format.into(), export.out.as_deref());
    }
    if app.json {
        output::print_json(&rows)
    } else {
        output::print_table(&rows);
        Ok(())
    }
}

fn show<S>(app: &App, source: &S, id: RecordId) -> Result<()>
where
    S: CollectionSource,
    S::Record: Keyed + Clone + Tabular + Serialize,
{
    let mut list = ResourceList::new(RemoteFilter::new());
    let dialog = list.open_fresh(id, source)?;
    let Some(record) = &dialog.record else {
        return Ok(());
    };
    if app.json {
        output::print_json(record)
    } else {
        output::print_detail(record);
        Ok(())
    }
}

/// Runs one mutation through a dialog: open the record (or a blank form),
/// submit once, and hand back the list as re-fetched afterwards.
fn act<S, R>(
    source: &S,
    id: Option<RecordId>,
    action: impl FnOnce(&S) -> Result<R, ClientError>,
) -> Result<(R, ResourceList<S::Record>)>
where
    S: CollectionSource,
    S::Record: Keyed + Clone,
{
    let mut list = ResourceList::new(RemoteFilter::new());
    match id {
        Some(id) => {
            list.open_fresh(id, source)?;
        }
        None => list.open_new(),
    }

    let value = list.submit(source, action)?;
    if let Some(notice) = list.error() {
        warn!(error = %notice.message, "re-fetch after action failed");
    }
    Ok((value, list))
}

fn finish<T>(app: &App, message: &str, list: &ResourceList<T>, id: Option<RecordId>) -> Result<()>
where
    T: Keyed + Clone + Tabular + Serialize,
{
    let record = id.and_then(|id| list.find(id));
    if app.json {
        return output::print_json(&json!({ "message": message, "record": record }));
    }
    println!("{message}");
    if let Some(record) = record {
        output::print_detail(record);
    }
    Ok(())
}

fn export_records<T: Tabular + Serialize>(
    rows: &[&T],
    stem: &str,
    format: ExportFormat,
    out: Option<&Path>,
) -> Result<()> {
    let contents = match format {
        ExportFormat::Json => townhall_export::to_json(rows)?,
        ExportFormat::Csv => townhall_export::to_csv(rows, T::CSV_COLUMNS)?,
    };
    let path = townhall_export::write_export(&contents, stem, format, out, Path::new("."))?;
    println!("Exported {} records to {}", rows.len(), path.display());
    Ok(())
}

fn report(app: &App, kind: ReportKind, days: Option<u32>, export: &ExportArgs) -> Result<()> {
    let days = days.map(|d| d.to_string());
    let query: Vec<(&str, &str)> = days.iter().map(|d| ("days", d.as_str())).collect();
    let payload = app.api.report(kind, &query)?;
    let stem = format!("report-{}", kind.name());

    let Some(format) = export.export.map(ExportFormat::from) else {
        return output::print_json(&payload);
    };
    let contents = match format {
        ExportFormat::Json => townhall_export::to_json(&payload)?,
        ExportFormat::Csv => {
            let rows = report_rows(&payload)
                .ok_or_else(|| anyhow!("the {} report is not tabular; export it as json", kind.name()))?;
            let columns = report_columns(rows);
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            townhall_export::to_csv(rows, &columns)?
        }
    };
    let path = townhall_export::write_export(&contents, &stem, format, export.out.as_deref(), Path::new("."))?;
    println!("Exported {} report to {}", kind.name(), path.display());
    Ok(())
}

/// A report is tabular if it is an array of objects, or an object holding
/// exactly one such array.
fn report_rows(payload: &Value) -> Option<&[Value]> {
    let is_table = |rows: &Vec<Value>| rows.iter().all(Value::is_object);
    match payload {
        Value::Array(rows) if is_table(rows) => Some(rows.as_slice()),
        Value::Object(map) => {
            let mut tables = map
                .values()
                .filter_map(Value::as_array)
                .filter(|rows| !rows.is_empty() && is_table(*rows));
            match (tables.next(), tables.next()) {
                (Some(rows), None) => Some(rows.as_slice()),
                _ => None,
            }
        }
        _ => None,
    }
}

fn report_columns(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    let schemas = [
        ("Complaint", schema_for!(Complaint)),
        ("Bill", schema_for!(Bill)),
        ("License", schema_for!(License)),
        ("Event", schema_for!(Event)),
        ("Department", schema_for!(Department)),
        ("Announcement", schema_for!(Announcement)),
        ("Notification", schema_for!(Notification)),
        ("Official", schema_for!(Official)),
        ("UserAccount", schema_for!(UserAccount)),
        ("User", schema_for!(townhall_core::schema::User)),
    ];
    for (name, schema) in schemas {
        let json = serde_json::to_string_pretty(&schema)?;
        fs::write(out_dir.join(format!("{name}.schema.json")), json)?;
    }

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}

use clap::{Args, ValueEnum};
use std::path::PathBuf;
use townhall_api::ReportKind;
use townhall_core::filter::{Date, DateRange, ListQuery, Selection, parse_date};
use townhall_core::listing::RemoteFilter;
use townhall_core::schema::{
    Announcement, Bill, Complaint, Department, Event, License, Notification, Official,
    UserAccount,
};
use townhall_export::ExportFormat;

/// How `--type` reaches the server and the local filter for one record kind.
pub trait TypeFilter {
    /// Query parameter the server reads `--type` from.
    const TYPE_PARAM: &'static str = "type";
    /// The server matches the type as a case-insensitive substring.
    const TYPE_CONTAINS: bool = false;
}

impl TypeFilter for License {
    const TYPE_PARAM: &'static str = "license_type";
    const TYPE_CONTAINS: bool = true;
}

impl TypeFilter for Complaint {}
impl TypeFilter for Bill {}
impl TypeFilter for Event {}
impl TypeFilter for Department {}
impl TypeFilter for Announcement {}
impl TypeFilter for Notification {}
impl TypeFilter for Official {}
impl TypeFilter for UserAccount {}

/// Filters shared by every `list` command.
///
/// Facet flags (`--status`, `--priority`, `--category`, `--type`) go to the
/// server and are applied again locally. `--search`, `--bucket`, `--from`,
/// `--to` and `--sort` are local only.
#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// Case-insensitive text search over the record's main fields
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    /// Status to keep (`all` keeps everything)
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Record type, e.g. a license type or an announcement type
    #[arg(long = "type")]
    pub kind: Option<String>,

    /// Tab to show, e.g. `open`, `done`, `voted`, `not_voted`, `pending`
    #[arg(long)]
    pub bucket: Option<String>,

    /// Sort key; prefix with `-` for descending
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort key passed to the server
    #[arg(long)]
    pub server_sort: Option<String>,

    /// Earliest date to keep (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<Date>,

    /// Latest date to keep (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<Date>,

    #[command(flatten)]
    pub export: ExportArgs,
}

impl ListArgs {
    fn facets(&self) -> Vec<(&'static str, &str)> {
        [
            ("status", self.status.as_deref()),
            ("priority", self.priority.as_deref()),
            ("category", self.category.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }

    pub fn remote_filter<T: TypeFilter>(&self) -> RemoteFilter {
        let mut filter = RemoteFilter::new();
        for (name, value) in self.facets() {
            filter.set(name, Selection::parse(value));
        }
        if let Some(kind) = &self.kind {
            filter.set(T::TYPE_PARAM, Selection::parse(kind));
        }
        match self.server_sort.as_deref() {
            Some(key) => filter.sort(key),
            None => filter,
        }
    }

    pub fn query<T: TypeFilter>(&self) -> ListQuery {
        let mut query = ListQuery::new()
            .search(self.search.as_str())
            .dates(DateRange::new(self.from, self.to));
        for (name, value) in self.facets() {
            query = query.facet(name, value);
        }
        if let Some(kind) = &self.kind {
            query = if T::TYPE_CONTAINS {
                query.facet_contains("type", kind)
            } else {
                query.facet("type", kind)
            };
        }
        if let Some(bucket) = &self.bucket {
            query = query.bucket(bucket.as_str());
        }
        if let Some(sort) = &self.sort {
            query = query.sort(sort);
        }
        query
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct ExportArgs {
    /// Write the result to a file instead of printing it
    #[arg(long, value_enum)]
    pub export: Option<FormatArg>,

    /// Export path (default: `<resource>-<date>.<ext>` in the current directory)
    #[arg(long, requires = "export")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportArg {
    Summary,
    Users,
    Complaints,
    Licenses,
    Towns,
}

impl From<ReportArg> for ReportKind {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::Summary => ReportKind::Summary,
            ReportArg::Users => ReportKind::Users,
            ReportArg::Complaints => ReportKind::Complaints,
            ReportArg::Licenses => ReportKind::Licenses,
            ReportArg::Towns => ReportKind::Towns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LicenseScope {
    /// Licenses awaiting the town's review
    Review,
    /// The signed-in business's licenses and permits
    Business,
    /// Business applications in the town's review queue (officials only)
    Applications,
}

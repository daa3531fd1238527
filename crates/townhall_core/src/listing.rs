//! The list-filter-detail controller shared by every resource. Every fetch
//! carries a generation number and only the newest one may land.

use crate::error::ClientError;
use crate::filter::{self, ListQuery, ListRecord, Selection};
use crate::notice::Notice;
use crate::schema::{
    Announcement, Bill, Complaint, Department, Event, License, Notification, Official, RecordId,
    UserAccount,
};
use std::collections::BTreeMap;
use tracing::debug;

pub trait Keyed {
    fn key(&self) -> RecordId;
}

pub trait CollectionSource {
    type Record;

    fn fetch(&self, filter: &RemoteFilter) -> Result<Vec<Self::Record>, ClientError>;

    fn fetch_one(&self, id: RecordId) -> Result<Self::Record, ClientError>;
}

/// Query-string parameters. `Selection::All` is never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFilter {
    params: BTreeMap<String, String>,
}

impl RemoteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, selection: Selection) -> Self {
        self.set(name, selection);
        self
    }

    pub fn set(&mut self, name: &str, selection: Selection) {
        match selection {
            Selection::All => {
                self.params.remove(name);
            }
            Selection::Only(value) | Selection::Contains(value) => {
                self.params.insert(name.to_string(), value);
            }
        }
    }

    pub fn status(self, raw: &str) -> Self {
        self.with("status", Selection::parse(raw))
    }

    pub fn priority(self, raw: &str) -> Self {
        self.with("priority", Selection::parse(raw))
    }

    pub fn category(self, raw: &str) -> Self {
        self.with("category", Selection::parse(raw))
    }

    pub fn sort(self, key: &str) -> Self {
        self.with("sort", Selection::parse(key))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Fresh,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dialog<T> {
    pub record: Option<T>,
    pub error: Option<Notice>,
}

#[derive(Debug)]
pub struct SubmitGuard {
    _private: (),
}

#[derive(Debug, Clone)]
pub struct ResourceList<T> {
    items: Vec<T>,
    error: Option<Notice>,
    filter: RemoteFilter,
    generation: u64,
    in_flight: Option<u64>,
    submitting: bool,
    dialog: Option<Dialog<T>>,
}

impl<T> Default for ResourceList<T> {
    fn default() -> Self {
        Self::new(RemoteFilter::default())
    }
}

impl<T> ResourceList<T> {
    pub fn new(filter: RemoteFilter) -> Self {
        Self {
            items: Vec::new(),
            error: None,
            filter,
            generation: 0,
            in_flight: None,
            submitting: false,
            dialog: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn error(&self) -> Option<&Notice> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn filter(&self) -> &RemoteFilter {
        &self.filter
    }

    /// Fetches started before the change are dropped when they land.
    pub fn set_filter(&mut self, filter: RemoteFilter) {
        self.filter = filter;
        self.generation += 1;
        self.in_flight = None;
    }

    pub fn dialog(&self) -> Option<&Dialog<T>> {
        self.dialog.as_ref()
    }

    pub fn open_new(&mut self) {
        self.dialog = Some(Dialog {
            record: None,
            error: None,
        });
    }

    pub fn close(&mut self) {
        self.dialog = None;
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Lands a fetch result. A failure empties the list rather than leaving
    /// stale rows next to the error.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<T>, ClientError>,
    ) -> Applied {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping stale fetch result"
            );
            return Applied::Stale;
        }
        self.in_flight = None;
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
            }
            Err(err) => {
                self.items.clear();
                self.error = Some(Notice::from(&err));
            }
        }
        Applied::Fresh
    }

    pub fn refresh<S>(&mut self, source: &S) -> Applied
    where
        S: CollectionSource<Record = T>,
    {
        let ticket = self.begin_fetch();
        let result = source.fetch(&self.filter);
        self.finish_fetch(ticket, result)
    }

    pub fn begin_submit(&mut self) -> Result<SubmitGuard, Notice> {
        if self.submitting {
            return Err(Notice::from(ClientError::Busy));
        }
        self.submitting = true;
        Ok(SubmitGuard { _private: () })
    }

    /// Lands an action result. Success closes the dialog and re-fetches the
    /// list once; failure keeps the dialog open with the server's message.
    pub fn finish_submit<S, R>(
        &mut self,
        _guard: SubmitGuard,
        source: &S,
        result: Result<R, ClientError>,
    ) -> Result<R, Notice>
    where
        S: CollectionSource<Record = T>,
    {
        self.submitting = false;
        match result {
            Ok(value) => {
                self.dialog = None;
                self.refresh(source);
                Ok(value)
            }
            Err(err) => {
                let notice = Notice::from(&err);
                if let Some(dialog) = self.dialog.as_mut() {
                    dialog.error = Some(notice.clone());
                }
                Err(notice)
            }
        }
    }

    pub fn submit<S, R, F>(&mut self, source: &S, action: F) -> Result<R, Notice>
    where
        S: CollectionSource<Record = T>,
        F: FnOnce(&S) -> Result<R, ClientError>,
    {
        let guard = self.begin_submit()?;
        let result = action(source);
        self.finish_submit(guard, source, result)
    }
}

impl<T: ListRecord> ResourceList<T> {
    pub fn view(&self, query: &ListQuery) -> Vec<&T> {
        filter::apply(&self.items, query)
    }
}

impl<T: Keyed + Clone> ResourceList<T> {
    pub fn find(&self, id: RecordId) -> Option<&T> {
        self.items.iter().find(|item| item.key() == id)
    }

    /// Opens the detail dialog, reusing the listed record when present.
    pub fn open<S>(&mut self, id: RecordId, source: &S) -> Result<&Dialog<T>, Notice>
    where
        S: CollectionSource<Record = T>,
    {
        let record = match self.find(id) {
            Some(record) => record.clone(),
            None => source.fetch_one(id).map_err(Notice::from)?,
        };
        Ok(self.show(record))
    }

    pub fn open_fresh<S>(&mut self, id: RecordId, source: &S) -> Result<&Dialog<T>, Notice>
    where
        S: CollectionSource<Record = T>,
    {
        let record = source.fetch_one(id).map_err(Notice::from)?;
        Ok(self.show(record))
    }

    fn show(&mut self, record: T) -> &Dialog<T> {
        self.dialog.insert(Dialog {
            record: Some(record),
            error: None,
        })
    }
}

macro_rules! keyed_by_id {
    ($($ty:ty),+) => {
        $(impl Keyed for $ty {
            fn key(&self) -> RecordId {
                self.id
            }
        })+
    };
}

keyed_by_id!(Complaint, Bill, License, Event, Department, Announcement, Notification, Official);

impl Keyed for UserAccount {
    fn key(&self) -> RecordId {
        self.user_id
    }
}

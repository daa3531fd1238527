use crate::client::{ApiClient, Auth};
use crate::resources::Inbox;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use townhall_core::ClientError;
use townhall_core::listing::{CollectionSource, Keyed, RemoteFilter};
use townhall_core::schema::{
    Announcement, Bill, Complaint, Department, Event, License, Notification, Official, RecordId,
    UserAccount,
};

/// Without a detail endpoint, `fetch_one` lists and picks the matching id.
#[derive(Debug)]
pub struct RemoteCollection<'a, T> {
    client: &'a ApiClient,
    path: &'static str,
    auth: Auth,
    has_detail: bool,
    envelope: Option<&'static str>,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T> RemoteCollection<'a, T> {
    pub fn new(client: &'a ApiClient, path: &'static str) -> Self {
        Self {
            client,
            path,
            auth: Auth::Required,
            has_detail: false,
            envelope: None,
            _record: PhantomData,
        }
    }

    #[must_use]
    pub fn public(mut self) -> Self {
        self.auth = Auth::Public;
        self
    }

    #[must_use]
    pub fn with_detail(mut self) -> Self {
        self.has_detail = true;
        self
    }

    /// The list arrives wrapped in an object, under `key`.
    #[must_use]
    pub fn enveloped(mut self, key: &'static str) -> Self {
        self.envelope = Some(key);
        self
    }

    pub fn path(&self) -> &'static str {
        self.path
    }
}

impl<T> CollectionSource for RemoteCollection<'_, T>
where
    T: DeserializeOwned + Keyed,
{
    type Record = T;

    fn fetch(&self, filter: &RemoteFilter) -> Result<Vec<T>, ClientError> {
        let query = filter.query_pairs();
        let Some(key) = self.envelope else {
            return self.client.get(self.path, &query, self.auth);
        };
        let mut body: Value = self.client.get(self.path, &query, self.auth)?;
        let rows = body
            .get_mut(key)
            .map(Value::take)
            .ok_or_else(|| ClientError::Decode(format!("response has no `{key}` list")))?;
        serde_json::from_value(rows).map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn fetch_one(&self, id: RecordId) -> Result<T, ClientError> {
        if self.has_detail {
            return self
                .client
                .get(&format!("{}{id}/", self.path), &[], self.auth);
        }
        self.fetch(&RemoteFilter::new())?
            .into_iter()
            .find(|record| record.key() == id)
            .ok_or_else(|| ClientError::server(404, format!("No record with id {id}")))
    }
}

impl ApiClient {
    pub fn complaints(&self) -> RemoteCollection<'_, Complaint> {
        RemoteCollection::new(self, "citizen/complaints/")
    }

    pub fn business_complaints(&self) -> RemoteCollection<'_, Complaint> {
        RemoteCollection::new(self, "business/complaints/")
    }

    pub fn bills(&self) -> RemoteCollection<'_, Bill> {
        RemoteCollection::new(self, "government/bills/").with_detail()
    }

    /// Licenses under review by the signed-in official's town.
    pub fn licenses(&self) -> RemoteCollection<'_, License> {
        RemoteCollection::new(self, "government/licenses/").with_detail()
    }

    pub fn business_licenses(&self) -> RemoteCollection<'_, License> {
        RemoteCollection::new(self, "business/licenses/")
    }

    pub fn applications(&self) -> RemoteCollection<'_, License> {
        RemoteCollection::new(self, "business/applications/")
    }

    pub fn events(&self) -> RemoteCollection<'_, Event> {
        RemoteCollection::new(self, "business/events/")
    }

    pub fn departments(&self) -> RemoteCollection<'_, Department> {
        RemoteCollection::new(self, "government/departments/").public()
    }

    pub fn announcements(&self) -> RemoteCollection<'_, Announcement> {
        RemoteCollection::new(self, "government/announcements/").with_detail()
    }

    pub fn notifications(&self, inbox: Inbox) -> RemoteCollection<'_, Notification> {
        RemoteCollection::new(self, inbox.path()).enveloped("notifications")
    }

    pub fn officials(&self) -> RemoteCollection<'_, Official> {
        RemoteCollection::new(self, "government/officials/")
    }

    pub fn users(&self) -> RemoteCollection<'_, UserAccount> {
        RemoteCollection::new(self, "auth/users/")
    }
}

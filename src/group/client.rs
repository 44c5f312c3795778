use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::group::dto::{AutoJoinRequest, CreateGroupRequest, GroupSnapshot, LocationType};
use crate::group::store::GroupStore;
use crate::http::{unwrap_envelope, Api};
use crate::session::SessionProvider;
use crate::state::LivenessToken;

/// Location-specific inputs for group creation.
#[derive(Debug, Clone)]
pub enum GroupLocation {
    Table { table_id: String },
    Pickup,
    Delivery { address: Value },
}

impl GroupLocation {
    fn location_type(&self) -> LocationType {
        match self {
            GroupLocation::Table { .. } => LocationType::Table,
            GroupLocation::Pickup => LocationType::Pickup,
            GroupLocation::Delivery { .. } => LocationType::Delivery,
        }
    }
}

/// Synchronization client for order groups. Membership changes go through
/// the store's wholesale join/leave operations; the server remains the
/// authority on who belongs to what.
#[derive(Clone)]
pub struct GroupClient {
    api: Arc<dyn Api>,
    store: Arc<GroupStore>,
    session: Arc<SessionProvider>,
    poll_interval: Duration,
}

impl GroupClient {
    pub fn new(
        api: Arc<dyn Api>,
        store: Arc<GroupStore>,
        session: Arc<SessionProvider>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            api,
            store,
            session,
            poll_interval,
        }
    }

    /// Creates a group and joins it locally. `active_ordergroup_exists`
    /// propagates untouched — the caller must send the user to their
    /// existing group, never force a second membership.
    pub async fn create(
        &self,
        restaurant_id: i64,
        location: GroupLocation,
    ) -> Result<GroupSnapshot, ApiError> {
        let request = CreateGroupRequest {
            restaurant_id,
            location_type: location.location_type(),
            table_id: match &location {
                GroupLocation::Table { table_id } => Some(table_id.clone()),
                _ => None,
            },
            location_details: match location {
                GroupLocation::Delivery { address } => Some(address),
                _ => None,
            },
        };
        let seq = self.store.begin();
        let value = self
            .api
            .post("order-groups/create", serde_json::to_value(&request)?)
            .await?;
        let snapshot: GroupSnapshot = unwrap_envelope(value)?;
        self.store.join_order_group(seq, snapshot.clone());
        info!(group_id = snapshot.id, restaurant_id, "order group created");
        Ok(snapshot)
    }

    /// Resolves a human-entered join code to a group, joins it on the
    /// server, then commits the snapshot locally.
    pub async fn join_by_code(&self, code: &str) -> Result<GroupSnapshot, ApiError> {
        let value = self
            .api
            .get(&format!("order-groups/by-code/{code}"))
            .await?;
        let snapshot: GroupSnapshot = unwrap_envelope(value)?;

        let seq = self.store.begin();
        self.api
            .post(&format!("order-groups/{}/join", snapshot.id), json!({}))
            .await?;
        self.store.join_order_group(seq, snapshot.clone());
        info!(group_id = snapshot.id, "joined order group by code");
        Ok(snapshot)
    }

    /// Table-QR entry point: the server resolves the table to an existing
    /// open group or creates one, atomically, so two diners scanning the
    /// same code land in the same group.
    pub async fn auto_join_or_create(
        &self,
        restaurant_id: i64,
        table_id: &str,
    ) -> Result<GroupSnapshot, ApiError> {
        let request = AutoJoinRequest {
            restaurant_id,
            table_id: table_id.to_string(),
            session_id: self.session.session_id().await,
        };
        let seq = self.store.begin();
        let value = self
            .api
            .post("order-groups/auto-join-or-create", serde_json::to_value(&request)?)
            .await?;
        let snapshot: GroupSnapshot = unwrap_envelope(value)?;
        self.store.join_order_group(seq, snapshot.clone());
        Ok(snapshot)
    }

    /// Leaves the current group, locally and on the server. A group the
    /// server no longer knows about counts as already left.
    pub async fn leave(&self) -> Result<(), ApiError> {
        if let Some(group) = self.store.current() {
            match self
                .api
                .post(&format!("order-groups/{}/leave", group.id), json!({}))
                .await
            {
                Ok(_) | Err(ApiError::NotFound) => {}
                Err(e) => return Err(e),
            }
        }
        self.store.leave_order_group();
        Ok(())
    }

    /// Refreshes the group snapshot. Not-found means the group ended:
    /// local membership is cleared and `None` returned, not an error.
    pub async fn fetch_status(&self, group_id: i64) -> Result<Option<GroupSnapshot>, ApiError> {
        let seq = self.store.begin();
        match self
            .api
            .get(&format!("order-groups/{group_id}/status"))
            .await
        {
            Ok(value) => {
                let snapshot: GroupSnapshot = unwrap_envelope(value)?;
                if !self.store.join_order_group(seq, snapshot.clone()) {
                    debug!(group_id, "dropping stale group status response");
                }
                Ok(Some(snapshot))
            }
            Err(ApiError::NotFound) => {
                if self.store.is_in_order_group() {
                    info!(group_id, "group no longer exists; leaving locally");
                    self.store.leave_order_group();
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Closes the group to further additions (staff/owner action), then
    /// refreshes the snapshot.
    pub async fn finalize(&self, group_id: i64) -> Result<(), ApiError> {
        self.api
            .post(&format!("order-groups/{group_id}/finalize"), json!({}))
            .await?;
        self.fetch_status(group_id).await?;
        Ok(())
    }

    /// Polls the group status for as long as `token` stays alive. The
    /// first tick fires immediately, then every poll interval; a slow
    /// response skips ticks instead of queueing them, and stale responses
    /// are dropped by the store's sequence guard. Exits on cancellation or
    /// when the group ends.
    pub fn spawn_status_poller(&self, group_id: i64, token: LivenessToken) -> JoinHandle<()> {
        let client = self.clone();
        let mut token = token;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(client.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !token.is_live() {
                            break;
                        }
                        match client.fetch_status(group_id).await {
                            Ok(Some(_)) => {}
                            Ok(None) => break,
                            Err(e) => warn!(error = %e, group_id, "group status poll failed"),
                        }
                    }
                }
            }
            debug!(group_id, "group status poller stopped");
        })
    }
}

//! Aligns the stored inventory of one account with freshly fetched provider state.
//!
//! The diff is computed by [`plan`] over a single snapshot of the store and
//! applied afterwards by [`reconcile`]. Matching relies on the
//! ascending-by-uid contract of [`ResourceStore::get_resources`]; the snapshot
//! is never re-sorted here.

use observability::ResourceMetrics;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::error::CloudResourceResult;
use crate::models::{CloudAccountRef, DiscoveredResource, Resource};
use crate::repository::ResourceStore;

/// A fetched resource that matched a stored one and keeps its ID
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate {
    pub id: Uuid,
    pub resource: DiscoveredResource,
}

/// Writes needed to make the store match the provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub inserts: Vec<DiscoveredResource>,
    pub updates: Vec<PlannedUpdate>,
    pub removals: Vec<Resource>,
}

/// Index of the stored resource with `uid`; `stored` must be ascending by uid.
pub fn find_by_uid(stored: &[Resource], uid: &str) -> Option<usize> {
    stored
        .binary_search_by(|resource| resource.uid.as_str().cmp(uid))
        .ok()
}

/// Diff `fetched` against the `stored` snapshot.
///
/// Every matched resource yields an update regardless of whether its status
/// changed. Stored resources that no fetched resource matched are removed.
pub fn plan(stored: &[Resource], fetched: Vec<DiscoveredResource>) -> ReconcilePlan {
    let mut visited = vec![false; stored.len()];
    let mut plan = ReconcilePlan::default();

    for resource in fetched {
        match find_by_uid(stored, &resource.uid) {
            Some(index) => {
                visited[index] = true;
                plan.updates.push(PlannedUpdate {
                    id: stored[index].id,
                    resource,
                });
            }
            None => plan.inserts.push(resource),
        }
    }

    plan.removals = stored
        .iter()
        .zip(visited)
        .filter(|(_, seen)| !seen)
        .map(|(resource, _)| resource.clone())
        .collect();

    plan
}

/// Reconcile the inventory of `account` against `fetched` and return the
/// inventory as the store sees it afterwards.
///
/// Failing to load the snapshot or the final inventory is surfaced. A single
/// failed insert, update or removal is logged and the pass continues.
#[instrument(skip(store, fetched), fields(account_id = %account.id, provider = %account.provider))]
pub async fn reconcile<S>(
    store: &S,
    account: CloudAccountRef,
    fetched: Vec<DiscoveredResource>,
) -> CloudResourceResult<Vec<Resource>>
where
    S: ResourceStore + ?Sized,
{
    let stored = store.get_resources(account.id, &[]).await?;
    let plan = plan(&stored, fetched);

    debug!(
        inserts = plan.inserts.len(),
        updates = plan.updates.len(),
        removals = plan.removals.len(),
        "Computed reconcile plan"
    );

    apply(store, account, plan).await;

    let inventory = store.get_resources(account.id, &[]).await?;
    ResourceMetrics::set_resources_count(&account.provider.to_string(), inventory.len());

    Ok(inventory)
}

async fn apply<S>(store: &S, account: CloudAccountRef, plan: ReconcilePlan)
where
    S: ResourceStore + ?Sized,
{
    let provider = account.provider.to_string();

    for resource in plan.inserts {
        let uid = resource.uid.clone();
        let resource_type = resource.resource_type.to_string();

        match store.insert_resource(resource).await {
            Ok(created) => {
                debug!(resource_id = %created.id, uid = %uid, "Inserted resource");
                ResourceMetrics::record_resource_created(&provider, &resource_type);
            }
            Err(e) => {
                error!(uid = %uid, error = %e, "Failed to insert resource");
                ResourceMetrics::record_change_failed(&provider, "insert");
            }
        }
    }

    for update in plan.updates {
        let resource_type = update.resource.resource_type.to_string();

        match store.update_status(update.id, &update.resource.status).await {
            Ok(()) => {
                ResourceMetrics::record_resource_updated(&provider, &resource_type);
            }
            Err(e) => {
                error!(resource_id = %update.id, error = %e, "Failed to update resource status");
                ResourceMetrics::record_change_failed(&provider, "update");
            }
        }
    }

    for resource in plan.removals {
        match store.remove_resource(resource.id).await {
            Ok(()) => {
                info!(resource_id = %resource.id, uid = %resource.uid, "Removed resource no longer on provider");
                ResourceMetrics::record_resource_deleted(
                    &provider,
                    &resource.resource_type.to_string(),
                );
            }
            Err(e) => {
                error!(resource_id = %resource.id, error = %e, "Failed to remove resource");
                ResourceMetrics::record_change_failed(&provider, "remove");
            }
        }
    }
}

//! Plan persistence
//!
//! Plans are written once and never updated. The on-disk store keeps three
//! fjall keyspaces: `plans` (plan id to plan), `owners` (owner to plan ids)
//! and `legs` (plan id to trip legs), all postcard-encoded.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use fjall::Keyspace;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, RwLock};
use tokio::task;

use crate::models::{PlanId, TravelPlan, TripLeg};

#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Insert a new plan record. Either the whole record is stored or nothing is.
    async fn insert_plan(&self, plan: &TravelPlan) -> Result<()>;
    async fn get_plan(&self, id: PlanId) -> Result<Option<TravelPlan>>;
    /// Plans owned by `owner`, newest first
    async fn list_plans(&self, owner: &str) -> Result<Vec<TravelPlan>>;
    async fn insert_trip_leg(&self, leg: &TripLeg) -> Result<()>;
    /// Legs of a plan ordered by sequence
    async fn list_trip_legs(&self, plan_id: PlanId) -> Result<Vec<TripLeg>>;
}

pub struct FjallPlanStore {
    plans: Keyspace,
    owners: Keyspace,
    legs: Keyspace,
    /// Serializes read-modify-write of the index entries
    index_lock: Mutex<()>,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn plan_key(id: PlanId) -> Vec<u8> {
    id.0.as_bytes().to_vec()
}

impl FjallPlanStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let plans = db.keyspace("plans", fjall::KeyspaceCreateOptions::default)?;
        let owners = db.keyspace("owners", fjall::KeyspaceCreateOptions::default)?;
        let legs = db.keyspace("legs", fjall::KeyspaceCreateOptions::default)?;
        Ok(Self {
            plans,
            owners,
            legs,
            index_lock: Mutex::new(()),
        })
    }

    async fn read<T: DeserializeOwned + Send + 'static>(
        store: &Keyspace,
        key: Vec<u8>,
    ) -> Result<Option<T>> {
        let store = store.clone();
        let maybe_bytes = task::spawn_blocking(move || get_from_store(store, key)).await??;
        maybe_bytes
            .map(|bytes| postcard::from_bytes(&bytes).map_err(Into::into))
            .transpose()
    }

    async fn write<T: Serialize + Sync>(store: &Keyspace, key: Vec<u8>, value: &T) -> Result<()> {
        let store = store.clone();
        let bytes = postcard::to_stdvec(value)?;
        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    async fn remove(store: &Keyspace, key: Vec<u8>) -> Result<()> {
        let store = store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

#[async_trait]
impl PlanStore for FjallPlanStore {
    #[tracing::instrument(name = "insert_plan", level = "debug", skip_all)]
    async fn insert_plan(&self, plan: &TravelPlan) -> Result<()> {
        let _guard = self.index_lock.lock().await;
        let owner_key = plan.owner.as_bytes().to_vec();
        let mut ids: Vec<PlanId> = Self::read(&self.owners, owner_key.clone())
            .await?
            .unwrap_or_default();

        Self::write(&self.plans, plan_key(plan.id), plan).await?;
        ids.push(plan.id);
        if let Err(err) = Self::write(&self.owners, owner_key, &ids).await {
            // Without an index entry the plan is unreachable; drop it again
            Self::remove(&self.plans, plan_key(plan.id)).await?;
            return Err(err);
        }
        tracing::debug!("Stored plan for owner {}", plan.owner);
        Ok(())
    }

    async fn get_plan(&self, id: PlanId) -> Result<Option<TravelPlan>> {
        Self::read(&self.plans, plan_key(id)).await
    }

    async fn list_plans(&self, owner: &str) -> Result<Vec<TravelPlan>> {
        let ids: Vec<PlanId> = Self::read(&self.owners, owner.as_bytes().to_vec())
            .await?
            .unwrap_or_default();
        let mut plans = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_plan(id).await? {
                Some(plan) => plans.push(plan),
                None => tracing::warn!("Owner index of {} references missing plan {}", owner, id),
            }
        }
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    async fn insert_trip_leg(&self, leg: &TripLeg) -> Result<()> {
        let _guard = self.index_lock.lock().await;
        if self.get_plan(leg.plan_id).await?.is_none() {
            return Err(anyhow!("plan {} does not exist", leg.plan_id));
        }
        let key = plan_key(leg.plan_id);
        let mut legs: Vec<TripLeg> = Self::read(&self.legs, key.clone())
            .await?
            .unwrap_or_default();
        legs.push(leg.clone());
        Self::write(&self.legs, key, &legs).await
    }

    async fn list_trip_legs(&self, plan_id: PlanId) -> Result<Vec<TripLeg>> {
        let mut legs: Vec<TripLeg> = Self::read(&self.legs, plan_key(plan_id))
            .await?
            .unwrap_or_default();
        legs.sort_by_key(|leg| leg.sequence);
        Ok(legs)
    }
}

/// In-process store for the `memory` backend and tests
#[derive(Default)]
pub struct MemoryPlanStore {
    plans: RwLock<HashMap<PlanId, TravelPlan>>,
    legs: RwLock<HashMap<PlanId, Vec<TripLeg>>>,
}

impl MemoryPlanStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn insert_plan(&self, plan: &TravelPlan) -> Result<()> {
        self.plans.write().await.insert(plan.id, plan.clone());
        Ok(())
    }

    async fn get_plan(&self, id: PlanId) -> Result<Option<TravelPlan>> {
        Ok(self.plans.read().await.get(&id).cloned())
    }

    async fn list_plans(&self, owner: &str) -> Result<Vec<TravelPlan>> {
        let mut plans: Vec<TravelPlan> = self
            .plans
            .read()
            .await
            .values()
            .filter(|plan| plan.owner == owner)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    async fn insert_trip_leg(&self, leg: &TripLeg) -> Result<()> {
        if !self.plans.read().await.contains_key(&leg.plan_id) {
            return Err(anyhow!("plan {} does not exist", leg.plan_id));
        }
        self.legs
            .write()
            .await
            .entry(leg.plan_id)
            .or_default()
            .push(leg.clone());
        Ok(())
    }

    async fn list_trip_legs(&self, plan_id: PlanId) -> Result<Vec<TripLeg>> {
        let mut legs = self
            .legs
            .read()
            .await
            .get(&plan_id)
            .cloned()
            .unwrap_or_default();
        legs.sort_by_key(|leg| leg.sequence);
        Ok(legs)
    }
}

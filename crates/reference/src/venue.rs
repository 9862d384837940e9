//! Resolving an event to the entities the dashboard looks up.

use crate::geo::GeoTable;
use crate::states::StateRegions;
use async_trait::async_trait;
use etl_core::{EntityId, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Event and venue fields the dashboard needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub name: String,
    pub description: String,
    pub start_time: String,
    pub venue_id: String,
    pub address: String,
    pub postal_code: String,
}

/// Source of event details, such as a ticketing API.
#[async_trait]
pub trait EventLookup: Send + Sync {
    /// `Ok(None)` when the event does not exist.
    async fn event(&self, event_id: &str) -> Result<Option<EventDetails>>;
}

/// An event with the county and HHS region it takes place in.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLocation {
    pub event: EventDetails,
    pub state: String,
    pub county: EntityId,
    pub region: EntityId,
}

/// Resolves an event through the geo table and the states list.
pub async fn resolve_event<L>(
    lookup: &L,
    geo: &GeoTable,
    states: &StateRegions,
    event_id: &str,
) -> Result<EventLocation>
where
    L: EventLookup + ?Sized,
{
    let event = lookup
        .event(event_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("event {}", event_id)))?;

    let location = geo.lookup(&event.postal_code).ok_or_else(|| {
        Error::not_found(format!(
            "postal code {} of event {} not in geo table",
            event.postal_code, event_id
        ))
    })?;
    let county = location.entity();
    let state = location.state.clone();
    let region = states.region_entity(&state)?;

    debug!(
        event_id = event_id,
        county = %county,
        region = %region,
        "Resolved event location"
    );

    Ok(EventLocation {
        event,
        state,
        county,
        region,
    })
}

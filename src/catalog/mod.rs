//! Query catalog: fetching it and presenting it as selectable cards.
//!
//! A refresh returns the new catalog as a value; the view is rebuilt from
//! that value wholesale. Each card carries its own descriptor, so activating
//! a card never consults any other state.

use anyhow::{Context, Result};

use crate::api::{DashboardApi, QueryDescriptor};
use crate::params::DateFields;
use crate::render::RenderSink;
use crate::runner::{QueryRunner, RunOutcome};

/// One selectable card, bound to its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCard {
    /// 1-based position in the catalog.
    pub index: usize,
    pub descriptor: QueryDescriptor,
}

impl QueryCard {
    /// Run this card's query.
    pub fn activate<A: DashboardApi>(
        &self,
        runner: &mut QueryRunner<A>,
        fields: &DateFields,
        sink: &mut dyn RenderSink,
    ) -> Result<RunOutcome> {
        runner.run(&self.descriptor, fields, sink)
    }
}

/// Fetch the current catalog from the backend.
pub fn refresh(api: &dyn DashboardApi) -> Result<Vec<QueryDescriptor>> {
    api.list_queries().context("catalog refresh failed")
}

/// The visible set of query cards.
#[derive(Debug, Default)]
pub struct CatalogView {
    cards: Vec<QueryCard>,
}

impl CatalogView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every card with one per descriptor, in catalog order.
    pub fn render(&mut self, queries: Vec<QueryDescriptor>, sink: &mut dyn RenderSink) {
        self.cards = queries
            .into_iter()
            .enumerate()
            .map(|(i, descriptor)| QueryCard {
                index: i + 1,
                descriptor,
            })
            .collect();
        sink.cards(&self.cards);
    }

    pub fn cards(&self) -> &[QueryCard] {
        &self.cards
    }

    /// Card at a 1-based position.
    pub fn card(&self, index: usize) -> Option<&QueryCard> {
        index.checked_sub(1).and_then(|i| self.cards.get(i))
    }

    /// Card whose descriptor has the given id.
    pub fn find(&self, id: &str) -> Option<&QueryCard> {
        self.cards.iter().find(|c| c.descriptor.id == id)
    }
}

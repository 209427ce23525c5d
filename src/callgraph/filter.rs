//! Row filtering on a call-graph frame, with optional squash of the result.

use super::{CallGraphFrame, SquashOptions};
use crate::query::Filter;
use crate::utils::error::FrameError;
use log::debug;
use std::sync::Arc;

impl CallGraphFrame {
    /// Keep only the rows selected by `filter`
    ///
    /// The graph is shared with `self` and left untouched, so the result is
    /// not consistent until it is squashed.
    ///
    /// # Errors
    /// * `FrameError::InvalidFilter` - the filter could not be compiled
    /// * `FrameError::EmptyFilter` - no row survived
    pub fn filter(&self, filter: &Filter) -> Result<CallGraphFrame, FrameError> {
        let keep = filter.select(&self.graph, &self.table)?;
        let table = self.table.filter_rows(|row| keep.contains(row.key()));
        if table.is_empty() {
            return Err(FrameError::EmptyFilter);
        }
        debug!("Filter kept {} of {} rows", table.len(), self.table.len());
        Ok(CallGraphFrame::from_parts(
            Arc::clone(&self.graph),
            table,
            self.exc_metrics.clone(),
            self.inc_metrics.clone(),
        ))
    }

    /// [`filter`](Self::filter) followed by [`squash`](Self::squash)
    pub fn filter_squash(
        &self,
        filter: &Filter,
        options: &SquashOptions,
    ) -> Result<CallGraphFrame, FrameError> {
        self.filter(filter)?.squash(options)
    }
}

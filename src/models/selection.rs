use std::collections::BTreeMap;

use crate::models::base::FacilityId;
use crate::models::reservation::{dedup_in_order, AvailabilityMap};

pub const MAX_SELECTED_BASES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionAction {
    Create,
    Update { row: u32, facility: Option<FacilityId> },
    Delete { row: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("At most 4 bases can be reserved at once")]
    TooManyRows,
    #[error("At least one base row must remain")]
    LastRow,
    #[error("No base row with id {0}")]
    UnknownRow(u32),
}

/// Rows of base choices for a single reservation. Always holds between one and
/// `MAX_SELECTED_BASES` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSelection {
    last_row: u32,
    rows: BTreeMap<u32, Option<FacilityId>>,
}

impl Default for BaseSelection {
    fn default() -> Self {
        Self {
            last_row: 0,
            rows: BTreeMap::from([(0, None)]),
        }
    }
}

impl BaseSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// One row per facility, in the given order.
    pub fn from_facilities(facilities: &[FacilityId]) -> Result<Self, SelectionError> {
        let mut selection = Self::new();
        for (index, facility) in facilities.iter().enumerate() {
            if index > 0 {
                selection.apply(SelectionAction::Create)?;
            }
            let row = selection.last_row;
            selection.apply(SelectionAction::Update {
                row,
                facility: Some(*facility),
            })?;
        }
        Ok(selection)
    }

    pub fn apply(&mut self, action: SelectionAction) -> Result<(), SelectionError> {
        match action {
            SelectionAction::Create => {
                if !self.can_add() {
                    return Err(SelectionError::TooManyRows);
                }
                self.last_row += 1;
                self.rows.insert(self.last_row, None);
            }
            SelectionAction::Update { row, facility } => {
                let slot = self
                    .rows
                    .get_mut(&row)
                    .ok_or(SelectionError::UnknownRow(row))?;
                *slot = facility;
            }
            SelectionAction::Delete { row } => {
                if !self.rows.contains_key(&row) {
                    return Err(SelectionError::UnknownRow(row));
                }
                if !self.can_delete() {
                    return Err(SelectionError::LastRow);
                }
                self.rows.remove(&row);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn can_add(&self) -> bool {
        self.rows.len() < MAX_SELECTED_BASES
    }

    pub fn can_delete(&self) -> bool {
        self.rows.len() > 1
    }

    pub fn facility_ids(&self) -> Vec<FacilityId> {
        dedup_in_order(self.rows.values().flatten().copied())
    }

    /// Selected facilities the availability check reported as taken.
    pub fn conflicts(&self, availability: &AvailabilityMap) -> Vec<FacilityId> {
        self.facility_ids()
            .into_iter()
            .filter(|id| availability.get(id) == Some(&false))
            .collect()
    }

    pub fn is_ready(&self, availability: &AvailabilityMap) -> bool {
        self.rows.values().all(Option::is_some) && self.conflicts(availability).is_empty()
    }
}

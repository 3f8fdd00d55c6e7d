use serde::{Deserialize, Serialize};

use crate::error::{Result, SchematicError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub path: usize,
}

/// A bundle of links entering or leaving a component at one column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkColumn {
    pub upstream: i64,
    pub downstream: i64,
    pub key: String,
    /// Rows (path indices) that travel along this link.
    #[serde(default)]
    pub participants: Vec<usize>,
}

impl LinkColumn {
    pub fn new(upstream: i64, downstream: i64, key: impl Into<String>) -> Self {
        Self {
            upstream,
            downstream,
            key: key.into(),
            participants: Vec::new(),
        }
    }

    pub fn with_participants(mut self, participants: Vec<usize>) -> Self {
        self.participants = participants;
        self
    }

    /// Lossy identity shared by every `(u, d)` pair with the same product.
    pub fn fingerprint(&self) -> i64 {
        (self.upstream + 1) * (self.downstream + 1)
    }

    pub fn pair(&self) -> (i64, i64) {
        (self.upstream, self.downstream)
    }

    /// Links between neighbouring bins are drawn as connectors.
    pub fn is_connector(&self) -> bool {
        self.downstream == self.upstream + 1
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub index: usize,
    pub first_bin: i64,
    pub last_bin: i64,
    pub num_bin: i64,
    pub offset: i64,
    pub arrivals: Vec<LinkColumn>,
    pub departures: Vec<LinkColumn>,
    pub occupants: Vec<Option<Occupant>>,
}

impl Component {
    pub fn new(
        index: usize,
        first_bin: i64,
        last_bin: i64,
        offset: i64,
        arrivals: Vec<LinkColumn>,
        departures: Vec<LinkColumn>,
        occupants: Vec<Option<Occupant>>,
    ) -> Self {
        Self {
            index,
            first_bin,
            last_bin,
            num_bin: last_bin - first_bin + 1,
            offset,
            arrivals,
            departures,
            occupants,
        }
    }

    /// Departure columns that get drawn; the last slot closes the component.
    pub fn rendered_departures(&self) -> &[LinkColumn] {
        let end = self.departures.len().saturating_sub(1);
        &self.departures[..end]
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn overlaps(&self, window: BinWindow) -> bool {
        self.last_bin >= window.begin && self.first_bin <= window.end
    }

    pub fn validate(&self, position: usize) -> Result<()> {
        if self.departures.is_empty() {
            return Err(SchematicError::invalid_component(
                position,
                "component has no departure columns",
            ));
        }

        if self.last_bin < self.first_bin {
            return Err(SchematicError::invalid_component(
                position,
                format!(
                    "last bin {} precedes first bin {}",
                    self.last_bin, self.first_bin
                ),
            ));
        }

        let expected = self.last_bin - self.first_bin + 1;
        if self.num_bin != expected {
            return Err(SchematicError::invalid_component(
                position,
                format!("num_bin is {} but the bin range spans {expected}", self.num_bin),
            ));
        }

        Ok(())
    }
}

/// Inclusive range of bins shown on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinWindow {
    pub begin: i64,
    pub end: i64,
}

impl BinWindow {
    pub fn new(begin: i64, end: i64) -> Self {
        Self { begin, end }
    }

    pub fn width(self) -> i64 {
        self.end - self.begin
    }

    pub fn shifted(self, delta: i64) -> Self {
        Self {
            begin: self.begin + delta,
            end: self.end + delta,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentRequest {
    pub window: BinWindow,
    pub use_connector: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(departures: usize) -> Component {
        Component::new(
            0,
            4,
            6,
            0,
            Vec::new(),
            (0..departures)
                .map(|index| LinkColumn::new(6, 10 + index as i64, format!("d{index}")))
                .collect(),
            vec![Some(Occupant { path: 0 }), None],
        )
    }

    #[test]
    fn num_bin_is_inclusive() {
        assert_eq!(component(1).num_bin, 3);
    }

    #[test]
    fn last_departure_is_not_rendered() {
        let component = component(3);
        assert_eq!(component.rendered_departures().len(), 2);
        assert_eq!(component.rendered_departures()[1].key, "d1");
    }

    #[test]
    fn validate_rejects_missing_departures() {
        let error = component(0).validate(7).unwrap_err();
        assert!(matches!(
            error,
            SchematicError::InvalidComponentData { index: 7, .. }
        ));
    }

    #[test]
    fn validate_rejects_inconsistent_bin_count() {
        let mut component = component(1);
        component.num_bin = 9;
        assert!(component.validate(0).is_err());
    }

    #[test]
    fn fingerprint_collides_for_equal_products() {
        let a = LinkColumn::new(2, 3, "a");
        let b = LinkColumn::new(1, 5, "b");
        assert_eq!(a.fingerprint(), 12);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.pair(), b.pair());
    }

    #[test]
    fn overlap_is_inclusive_on_both_ends() {
        let component = component(1);
        assert!(component.overlaps(BinWindow::new(6, 20)));
        assert!(component.overlaps(BinWindow::new(0, 4)));
        assert!(!component.overlaps(BinWindow::new(7, 20)));
    }
}

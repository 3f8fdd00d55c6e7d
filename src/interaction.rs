//! Hover highlighting and click selection of links.

use std::time::Duration;

use log::debug;

use crate::config::InteractionTimings;
use crate::model::LinkColumn;

/// Single-slot timer: arming replaces whatever was pending.
#[derive(Debug)]
pub struct TimerSlot<T> {
    armed: Option<ArmedTimer<T>>,
    generation: u64,
}

#[derive(Debug)]
struct ArmedTimer<T> {
    deadline: Duration,
    generation: u64,
    payload: T,
}

impl<T> Default for TimerSlot<T> {
    fn default() -> Self {
        Self {
            armed: None,
            generation: 0,
        }
    }
}

impl<T> TimerSlot<T> {
    pub fn arm(&mut self, now: Duration, delay: Duration, payload: T) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.armed = Some(ArmedTimer {
            deadline: now + delay,
            generation: self.generation,
            payload,
        });
        self.generation
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.armed.as_ref().map(|timer| timer.deadline)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    fn take_due(&mut self, now: Duration) -> Option<(u64, T)> {
        if self.deadline().is_none_or(|deadline| deadline > now) {
            return None;
        }
        self.armed
            .take()
            .map(|timer| (timer.generation, timer.payload))
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightState {
    pub highlighted_link: Option<LinkColumn>,
    pub selected_link: Option<LinkColumn>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    Highlighted(Option<LinkColumn>),
    Selected(LinkColumn),
    SelectionExpired,
}

#[derive(Debug, Default)]
pub struct InteractionController {
    state: HighlightState,
    timings: InteractionTimings,
    hover_target: Option<LinkColumn>,
    hover_timer: TimerSlot<Option<LinkColumn>>,
    selection_timer: TimerSlot<LinkColumn>,
}

impl InteractionController {
    pub fn new(timings: InteractionTimings) -> Self {
        Self {
            timings,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &HighlightState {
        &self.state
    }

    pub fn highlighted(&self) -> Option<&LinkColumn> {
        self.state.highlighted_link.as_ref()
    }

    pub fn selected(&self) -> Option<&LinkColumn> {
        self.state.selected_link.as_ref()
    }

    pub fn set_timings(&mut self, timings: InteractionTimings) {
        self.timings = timings;
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.hover_timer.deadline(), self.selection_timer.deadline()) {
            (Some(hover), Some(selection)) => Some(hover.min(selection)),
            (hover, selection) => hover.or(selection),
        }
    }

    pub fn on_hover(&mut self, link: &LinkColumn, now: Duration) {
        if self.state.selected_link.is_some() {
            return;
        }

        self.hover_timer.cancel();
        self.hover_target = Some(link.clone());
        if self.state.highlighted_link.as_ref() != Some(link) {
            self.hover_timer
                .arm(now, self.timings.hover_delay(), Some(link.clone()));
        }
    }

    pub fn on_hover_end(&mut self, now: Duration) {
        if self.state.selected_link.is_some() {
            return;
        }

        self.hover_timer.cancel();
        self.hover_target = None;
        if self.state.highlighted_link.is_some() {
            self.hover_timer.arm(now, self.timings.hover_delay(), None);
        }
    }

    pub fn on_click(&mut self, link: &LinkColumn, now: Duration) -> Option<InteractionEvent> {
        let mut event = None;
        if self.state.selected_link.as_ref() != Some(link) {
            self.hover_timer.cancel();
            self.state.highlighted_link = Some(link.clone());
            self.state.selected_link = Some(link.clone());
            debug!("selected link {}", link.key);
            event = Some(InteractionEvent::Selected(link.clone()));
        }

        self.selection_timer
            .arm(now, self.timings.selection_timeout(), link.clone());
        event
    }

    // The selection, if any, stays.
    pub fn clear_highlight(&mut self) -> bool {
        self.hover_timer.cancel();
        self.hover_target = None;
        self.state.highlighted_link.take().is_some()
    }

    /// Fires every timer due at `now`, earliest deadline first.
    pub fn advance(&mut self, now: Duration) -> Vec<InteractionEvent> {
        let mut events = Vec::new();
        loop {
            let hover_due = self.hover_timer.deadline().filter(|&deadline| deadline <= now);
            let selection_due = self
                .selection_timer
                .deadline()
                .filter(|&deadline| deadline <= now);

            let event = match (hover_due, selection_due) {
                (None, None) => break,
                (Some(hover), Some(selection)) if selection < hover => self.fire_selection(now),
                (Some(_), _) => self.fire_hover(now),
                (None, Some(_)) => self.fire_selection(now),
            };
            events.extend(event);
        }
        events
    }

    fn fire_hover(&mut self, now: Duration) -> Option<InteractionEvent> {
        let (generation, target) = self.hover_timer.take_due(now)?;
        if !self.hover_timer.is_latest(generation)
            || target != self.hover_target
            || self.state.selected_link.is_some()
        {
            return None;
        }

        debug!(
            "highlight committed: {}",
            target.as_ref().map_or("none", |link| link.key.as_str())
        );
        self.state.highlighted_link = target.clone();
        Some(InteractionEvent::Highlighted(target))
    }

    fn fire_selection(&mut self, now: Duration) -> Option<InteractionEvent> {
        let (generation, link) = self.selection_timer.take_due(now)?;
        if !self.selection_timer.is_latest(generation)
            || self.state.selected_link.as_ref() != Some(&link)
        {
            return None;
        }

        debug!("selection of link {} expired", link.key);
        self.hover_timer.cancel();
        self.hover_target = None;
        self.state.selected_link = None;
        self.state.highlighted_link = None;
        Some(InteractionEvent::SelectionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn link(upstream: i64, downstream: i64) -> LinkColumn {
        LinkColumn::new(upstream, downstream, format!("{upstream}-{downstream}"))
    }

    fn controller() -> InteractionController {
        InteractionController::new(InteractionTimings::default())
    }

    #[test]
    fn hover_commits_after_delay() {
        let mut controller = controller();
        let a = link(1, 2);
        controller.on_hover(&a, ms(0));

        assert!(controller.advance(ms(599)).is_empty());
        assert_eq!(controller.highlighted(), None);
        assert_eq!(
            controller.advance(ms(600)),
            vec![InteractionEvent::Highlighted(Some(a.clone()))]
        );
        assert_eq!(controller.highlighted(), Some(&a));
    }

    #[test]
    fn later_hover_supersedes_pending_one() {
        let mut controller = controller();
        let a = link(1, 2);
        let b = link(4, 8);
        controller.on_hover(&a, ms(0));
        controller.on_hover(&b, ms(200));

        assert!(controller.advance(ms(700)).is_empty());
        assert_eq!(controller.highlighted(), None);
        assert_eq!(
            controller.advance(ms(900)),
            vec![InteractionEvent::Highlighted(Some(b.clone()))]
        );
        assert_eq!(controller.highlighted(), Some(&b));
    }

    #[test]
    fn hover_end_clears_after_delay() {
        let mut controller = controller();
        let a = link(1, 2);
        controller.on_hover(&a, ms(0));
        controller.advance(ms(600));

        controller.on_hover_end(ms(1000));
        assert!(controller.advance(ms(1500)).is_empty());
        assert_eq!(controller.advance(ms(1600)), vec![InteractionEvent::Highlighted(None)]);
        assert_eq!(controller.highlighted(), None);
    }

    #[test]
    fn returning_to_the_highlighted_link_keeps_it() {
        let mut controller = controller();
        let a = link(1, 2);
        controller.on_hover(&a, ms(0));
        controller.advance(ms(600));

        controller.on_hover_end(ms(1000));
        controller.on_hover(&a, ms(1200));
        assert!(controller.advance(ms(5000)).is_empty());
        assert_eq!(controller.highlighted(), Some(&a));
    }

    #[test]
    fn hover_end_without_highlight_arms_nothing() {
        let mut controller = controller();
        controller.on_hover(&link(1, 2), ms(0));
        controller.on_hover_end(ms(100));
        assert_eq!(controller.next_deadline(), None);
        assert!(controller.advance(ms(10_000)).is_empty());
    }

    #[test]
    fn click_commits_immediately() {
        let mut controller = controller();
        let s = link(3, 5);
        assert_eq!(
            controller.on_click(&s, ms(0)),
            Some(InteractionEvent::Selected(s.clone()))
        );
        assert_eq!(controller.selected(), Some(&s));
        assert_eq!(controller.highlighted(), Some(&s));
    }

    #[test]
    fn selection_blocks_hover() {
        let mut controller = controller();
        let s = link(3, 5);
        let t = link(6, 7);
        controller.on_click(&s, ms(0));
        controller.on_hover(&t, ms(100));
        controller.on_hover_end(ms(200));

        assert!(controller.advance(ms(1000)).is_empty());
        assert_eq!(controller.highlighted(), Some(&s));
    }

    #[test]
    fn click_cancels_pending_hover() {
        let mut controller = controller();
        let a = link(1, 2);
        let s = link(3, 5);
        controller.on_hover(&a, ms(0));
        controller.on_click(&s, ms(100));

        assert!(controller.advance(ms(700)).is_empty());
        assert_eq!(controller.highlighted(), Some(&s));
    }

    #[test]
    fn selection_expires() {
        let mut controller = controller();
        let s = link(3, 5);
        controller.on_click(&s, ms(0));

        assert!(controller.advance(ms(4999)).is_empty());
        assert_eq!(controller.advance(ms(5000)), vec![InteractionEvent::SelectionExpired]);
        assert_eq!(controller.state(), &HighlightState::default());
    }

    #[test]
    fn reclick_only_restarts_expiry() {
        let mut controller = controller();
        let s = link(3, 5);
        controller.on_click(&s, ms(0));
        assert_eq!(controller.on_click(&s, ms(4000)), None);

        assert!(controller.advance(ms(8999)).is_empty());
        assert_eq!(controller.selected(), Some(&s));
        assert_eq!(controller.advance(ms(9000)), vec![InteractionEvent::SelectionExpired]);
    }

    #[test]
    fn new_selection_replaces_old_expiry() {
        let mut controller = controller();
        let s = link(3, 5);
        let t = link(6, 7);
        controller.on_click(&s, ms(0));
        controller.on_click(&t, ms(3000));

        assert!(controller.advance(ms(5000)).is_empty());
        assert_eq!(controller.selected(), Some(&t));
        assert_eq!(controller.advance(ms(8000)), vec![InteractionEvent::SelectionExpired]);
    }

    #[test]
    fn hover_works_again_after_expiry() {
        let mut controller = controller();
        let s = link(3, 5);
        let t = link(6, 7);
        controller.on_click(&s, ms(0));
        controller.advance(ms(5000));

        controller.on_hover(&t, ms(5100));
        controller.advance(ms(5700));
        assert_eq!(controller.highlighted(), Some(&t));
    }

    #[test]
    fn clear_highlight_keeps_selection() {
        let mut controller = controller();
        let a = link(1, 2);
        controller.on_hover(&a, ms(0));
        controller.advance(ms(600));
        assert!(controller.clear_highlight());
        assert_eq!(controller.highlighted(), None);

        let s = link(3, 5);
        controller.on_click(&s, ms(1000));
        controller.clear_highlight();
        assert_eq!(controller.selected(), Some(&s));
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        let mut controller = controller();
        let s = link(3, 5);
        controller.on_click(&s, ms(0));
        assert_eq!(controller.next_deadline(), Some(ms(5000)));

        let events = controller.advance(ms(60_000));
        assert_eq!(events, vec![InteractionEvent::SelectionExpired]);
        assert_eq!(controller.next_deadline(), None);
    }

    #[test]
    fn timer_slot_replaces_pending_payload() {
        let mut slot = TimerSlot::default();
        slot.arm(ms(0), ms(100), "first");
        slot.arm(ms(50), ms(100), "second");
        assert_eq!(slot.deadline(), Some(ms(150)));
        assert_eq!(slot.take_due(ms(120)), None);
        assert_eq!(slot.take_due(ms(150)).map(|(_, payload)| payload), Some("second"));
        assert!(!slot.is_armed());
    }
}

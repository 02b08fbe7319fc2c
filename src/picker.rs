//! Collection of the two (frequency, wavenumber) picks that define a velocity band.
//!
//! The accumulator is a plain value owned by the caller. An interactive front end translates its
//! input events into [`PickEvent`]s and sends them over a channel; [`collect_picks`] blocks on that
//! channel and feeds the accumulator.

use crate::error::{FkError, Result};
use crate::filters::fk_spectrum::SpectralPoint;
use crossbeam_channel::Receiver;

/// Number of picks that define a velocity band.
pub const REQUIRED_PICKS: usize = 2;

/// Accumulates picked points until the band is finalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickAccumulator {
    points: Vec<SpectralPoint>,
}

impl PickAccumulator {
    pub fn new() -> Self {
        PickAccumulator::default()
    }

    pub fn add_point(&mut self, point: SpectralPoint) {
        log::debug!(
            "picked f = {:e} Hz, k = {:e} (pick {})",
            point.frequency,
            point.wavenumber,
            self.points.len() + 1
        );
        self.points.push(point);
    }

    /// Removes and returns the most recent pick.
    pub fn remove_last(&mut self) -> Option<SpectralPoint> {
        self.points.pop()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True once exactly two points are held.
    pub fn is_complete(&self) -> bool {
        self.points.len() == REQUIRED_PICKS
    }

    pub fn points(&self) -> &[SpectralPoint] {
        &self.points
    }

    /// Consumes the accumulator and returns the two picks.
    ///
    /// Fewer than two points is [`FkError::InsufficientInput`], more than two is
    /// [`FkError::AmbiguousInput`]; extra points are never dropped silently.
    pub fn finalize(self) -> Result<[SpectralPoint; 2]> {
        require_two(&self.points)
    }
}

/// Checks that exactly two points were picked.
pub fn require_two(points: &[SpectralPoint]) -> Result<[SpectralPoint; 2]> {
    match points {
        [first, second] => Ok([*first, *second]),
        _ if points.len() < REQUIRED_PICKS => Err(FkError::InsufficientInput { got: points.len() }),
        _ => Err(FkError::AmbiguousInput { got: points.len() }),
    }
}

/// Input events of an interactive picker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickEvent {
    /// A point was clicked in the spectrum.
    Point(SpectralPoint),
    /// Undo the last point.
    Undo,
    /// The user is done picking.
    Done,
    /// The user aborted picking.
    Cancel,
}

/// Blocks on `events` and collects picks until [`PickEvent::Done`].
///
/// [`PickEvent::Cancel`] or a disconnected sender end the wait with zero points, which is
/// reported as [`FkError::InsufficientInput`].
pub fn collect_picks(events: &Receiver<PickEvent>) -> Result<[SpectralPoint; 2]> {
    let mut picks = PickAccumulator::new();
    loop {
        match events.recv() {
            Ok(PickEvent::Point(point)) => picks.add_point(point),
            Ok(PickEvent::Undo) => {
                picks.remove_last();
            }
            Ok(PickEvent::Done) => return picks.finalize(),
            Ok(PickEvent::Cancel) => {
                log::info!("picking cancelled after {} points", picks.len());
                picks.clear();
                return picks.finalize();
            }
            Err(_) => {
                log::warn!("pick channel disconnected before picking was done");
                picks.clear();
                return picks.finalize();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn point(f: f64) -> SpectralPoint {
        SpectralPoint::new(f, 0.125)
    }

    #[test]
    fn test_pick_count_validation() {
        for n in [0, 1] {
            let mut picks = PickAccumulator::new();
            (0..n).for_each(|i| picks.add_point(point(i as f64)));
            assert_eq!(picks.finalize(), Err(FkError::InsufficientInput { got: n }));
        }
        for n in [3, 4, 7] {
            let mut picks = PickAccumulator::new();
            (0..n).for_each(|i| picks.add_point(point(i as f64)));
            assert_eq!(picks.finalize(), Err(FkError::AmbiguousInput { got: n }));
        }
        let mut picks = PickAccumulator::new();
        picks.add_point(point(1.0));
        picks.add_point(point(2.0));
        assert!(picks.is_complete());
        assert_eq!(picks.finalize(), Ok([point(1.0), point(2.0)]));
    }

    #[test]
    fn test_remove_last() {
        let mut picks = PickAccumulator::new();
        assert_eq!(picks.remove_last(), None);
        picks.add_point(point(1.0));
        picks.add_point(point(2.0));
        picks.add_point(point(3.0));
        assert_eq!(picks.remove_last(), Some(point(3.0)));
        assert_eq!(picks.points(), &[point(1.0), point(2.0)]);
        assert_eq!(picks.finalize(), Ok([point(1.0), point(2.0)]));
    }

    #[test]
    fn test_collect_picks_from_channel() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let sender = thread::spawn(move || {
            for event in [
                PickEvent::Point(point(1.0)),
                PickEvent::Point(point(5.0)),
                PickEvent::Undo,
                PickEvent::Point(point(2.0)),
                PickEvent::Done,
            ] {
                tx.send(event).unwrap();
            }
        });
        assert_eq!(collect_picks(&rx), Ok([point(1.0), point(2.0)]));
        sender.join().unwrap();
    }

    #[test]
    fn test_collect_picks_done_with_too_many_points() {
        let (tx, rx) = crossbeam_channel::unbounded();
        for f in [1.0, 2.0, 3.0] {
            tx.send(PickEvent::Point(point(f))).unwrap();
        }
        tx.send(PickEvent::Done).unwrap();
        assert_eq!(collect_picks(&rx), Err(FkError::AmbiguousInput { got: 3 }));
    }

    #[test]
    fn test_cancel_and_disconnect_yield_insufficient_input() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(PickEvent::Point(point(1.0))).unwrap();
        tx.send(PickEvent::Point(point(2.0))).unwrap();
        tx.send(PickEvent::Cancel).unwrap();
        assert_eq!(collect_picks(&rx), Err(FkError::InsufficientInput { got: 0 }));

        let (tx, rx) = crossbeam_channel::unbounded::<PickEvent>();
        tx.send(PickEvent::Point(point(1.0))).unwrap();
        drop(tx);
        assert_eq!(collect_picks(&rx), Err(FkError::InsufficientInput { got: 0 }));
    }
}

//! Coordinate-wise parameter sweep
//!
//! Within one outer iteration the coordinates are updated in order
//! `0, 1, …, P-1`. A proposal for coordinate `p` starts from the latest
//! accepted vector: coordinates `< p` carry this iteration's values,
//! coordinates `≥ p` the previous iteration's.

use nalgebra::DMatrix;
use rand::Rng;

use crate::model::{ConfigError, ConfigResult, Distribution};

/// Tracks which coordinates have been updated in the current iteration
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSweep {
    current: Vec<f64>,
    next: usize,
}

impl CoordinateSweep {
    /// Start a sweep from the iteration-0 parameter vector.
    pub fn new(initial: Vec<f64>) -> Self {
        Self {
            current: initial,
            next: 0,
        }
    }

    /// Number of coordinates P.
    pub fn num_coordinates(&self) -> usize {
        self.current.len()
    }

    /// Coordinate expected next. Coordinates below it carry this
    /// iteration's values.
    pub fn next_coordinate(&self) -> usize {
        self.next
    }

    /// Latest accepted value of every coordinate.
    pub fn current_vector(&self) -> &[f64] {
        &self.current
    }

    /// `count` proposals for coordinate `p`, one per row ([count, P]).
    ///
    /// Each row is [`Self::current_vector`] with an independent draw from
    /// `update` added to coordinate `p`.
    pub fn propose<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        p: usize,
        update: &Distribution,
        count: usize,
    ) -> ConfigResult<DMatrix<f64>> {
        self.expect_next(p)?;
        let increments = update.draw(rng, count)?;
        let mut proposals = DMatrix::from_fn(count, self.current.len(), |_, c| self.current[c]);
        for (d, step) in increments.into_iter().enumerate() {
            proposals[(d, p)] += step;
        }
        Ok(proposals)
    }

    /// Accept `value` for coordinate `p`.
    pub fn accept(&mut self, p: usize, value: f64) -> ConfigResult<()> {
        self.expect_next(p)?;
        self.current[p] = value;
        self.next += 1;
        Ok(())
    }

    /// Close the iteration once every coordinate is accepted; returns the
    /// new parameter vector.
    pub fn finish(&mut self) -> ConfigResult<Vec<f64>> {
        if self.next != self.current.len() {
            return Err(ConfigError::invalid(
                "coordinate",
                format!(
                    "iteration closed after {} of {} coordinates",
                    self.next,
                    self.current.len()
                ),
            ));
        }
        self.next = 0;
        Ok(self.current.clone())
    }

    fn expect_next(&self, p: usize) -> ConfigResult<()> {
        if p != self.next {
            return Err(ConfigError::invalid(
                "coordinate",
                format!("expected coordinate {}, got {}", self.next, p),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::rng::SimpleRng;

    #[test]
    fn test_proposals_mix_current_and_previous() {
        let mut sweep = CoordinateSweep::new(vec![1.0, 2.0, 3.0]);
        let mut rng = SimpleRng::new(3);

        sweep.accept(0, 10.0).unwrap();
        let proposals = sweep
            .propose(&mut rng, 1, &Distribution::random_walk(0.1), 5)
            .unwrap();
        assert_eq!(proposals.shape(), (5, 3));
        for d in 0..5 {
            assert_eq!(proposals[(d, 0)], 10.0);
            assert_ne!(proposals[(d, 1)], 2.0);
            assert_eq!(proposals[(d, 2)], 3.0);
        }
        assert_eq!(sweep.next_coordinate(), 1);
        assert_eq!(sweep.current_vector(), &[10.0, 2.0, 3.0]);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut sweep = CoordinateSweep::new(vec![1.0, 2.0]);
        let mut rng = SimpleRng::new(3);
        assert!(sweep.accept(1, 0.0).is_err());
        assert!(sweep
            .propose(&mut rng, 1, &Distribution::random_walk(0.1), 2)
            .is_err());
        sweep.accept(0, 5.0).unwrap();
        assert!(sweep.finish().is_err());
        sweep.accept(1, 6.0).unwrap();
        assert!(sweep.accept(1, 7.0).is_err());
    }

    #[test]
    fn test_finish_starts_next_iteration() {
        let mut sweep = CoordinateSweep::new(vec![1.0, 2.0]);
        sweep.accept(0, 5.0).unwrap();
        sweep.accept(1, 6.0).unwrap();
        assert_eq!(sweep.finish().unwrap(), vec![5.0, 6.0]);
        assert_eq!(sweep.current_vector(), &[5.0, 6.0]);
        assert_eq!(sweep.next_coordinate(), 0);
        let mut rng = SimpleRng::new(4);
        let proposals = sweep
            .propose(&mut rng, 0, &Distribution::random_walk(0.1), 3)
            .unwrap();
        for d in 0..3 {
            assert_eq!(proposals[(d, 1)], 6.0);
        }
    }
}

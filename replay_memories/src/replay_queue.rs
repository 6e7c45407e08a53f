use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use replay_data::{Batch, Transition};
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot sample {requested} transitions from a replay queue holding {available}")]
pub struct InsufficientData {
    pub requested: usize,
    pub available: usize,
}

/// Fixed-capacity FIFO of transitions. Once full, every insertion evicts the
/// oldest transition.
pub struct ReplayQueue {
    transitions: VecDeque<Transition>,
    max_size: usize,
    rng: StdRng,
}

impl ReplayQueue {
    pub fn with_max_size(max_size: usize) -> Self {
        Self::with_rng(max_size, StdRng::from_entropy())
    }
    pub fn with_max_size_and_seed(max_size: usize, seed: u64) -> Self {
        Self::with_rng(max_size, StdRng::seed_from_u64(seed))
    }
    fn with_rng(max_size: usize, rng: StdRng) -> Self {
        assert!(max_size > 0, "replay queue needs a positive max size");
        Self {
            transitions: VecDeque::with_capacity(max_size),
            max_size,
            rng,
        }
    }
    pub fn add_transition(&mut self, transition: Transition) {
        if self.transitions.len() >= self.max_size {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }
    /// Draws `batch_size` transitions uniformly, with replacement, so the same
    /// transition may appear several times in one batch.
    pub fn sample_batch(&mut self, batch_size: usize) -> Result<Batch, InsufficientData> {
        let available = self.transitions.len();
        if available == 0 || batch_size > available {
            return Err(InsufficientData {
                requested: batch_size,
                available,
            });
        }
        let mut batch = Batch::with_capacity(batch_size);
        for _ in 0..batch_size {
            let index = self.rng.gen_range(0..available);
            batch.push(&self.transitions[index]);
        }
        Ok(batch)
    }
    pub fn len(&self) -> usize {
        self.transitions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
    pub fn max_size(&self) -> usize {
        self.max_size
    }
    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_data::{Action, StateVector, STATE_SIZE};
    use rstest::rstest;

    /// Transition tagged by `id` in every float field so it can be recognised
    /// after sampling.
    fn tagged(id: usize) -> Transition {
        let value = id as f32;
        Transition {
            state: StateVector([value; STATE_SIZE]),
            action: Action::from_index(id % Action::COUNT).unwrap(),
            reward: value,
            next_state: StateVector([value + 0.5; STATE_SIZE]),
            done: id % 2 == 0,
        }
    }

    fn filled(max_size: usize, count: usize) -> ReplayQueue {
        let mut queue = ReplayQueue::with_max_size_and_seed(max_size, 7);
        for id in 0..count {
            queue.add_transition(tagged(id));
        }
        queue
    }

    #[rstest]
    #[case(1, 5)]
    #[case(3, 3)]
    #[case(4, 11)]
    #[case(10, 25)]
    fn keeps_most_recent_transitions_in_order(#[case] max_size: usize, #[case] count: usize) {
        let queue = filled(max_size, count);
        let kept = queue.len();
        assert_eq!(kept, max_size.min(count));
        let rewards: Vec<f32> = queue.iter().map(|t| t.reward).collect();
        let expected: Vec<f32> = (count - kept..count).map(|id| id as f32).collect();
        assert_eq!(rewards, expected);
    }

    #[test]
    fn sampling_more_than_stored_fails() {
        let mut queue = filled(100, 50);
        assert_eq!(queue.sample_batch(50).unwrap().len(), 50);
        assert_eq!(
            queue.sample_batch(51).unwrap_err(),
            InsufficientData {
                requested: 51,
                available: 50
            }
        );
        queue.add_transition(tagged(50));
        assert_eq!(queue.len(), 51);
        assert!(queue.sample_batch(51).is_ok());
    }

    #[test]
    fn push_into_full_queue_evicts_oldest() {
        let mut queue = filled(50, 50);
        queue.add_transition(tagged(50));
        assert_eq!(queue.len(), 50);
        assert_eq!(queue.iter().next().unwrap().reward, 1.0);
        assert_eq!(queue.iter().last().unwrap().reward, 50.0);
    }

    #[test]
    fn empty_queue_cannot_be_sampled() {
        let mut queue = ReplayQueue::with_max_size_and_seed(8, 0);
        assert!(queue.sample_batch(0).is_err());
        assert!(queue.sample_batch(1).is_err());
    }

    #[test]
    fn batch_columns_stay_aligned() {
        let mut queue = filled(20, 20);
        let batch = queue.sample_batch(20).unwrap();
        for i in 0..batch.len() {
            let id = batch.rewards[i] as usize;
            assert_eq!(batch.states[i], tagged(id).state);
            assert_eq!(batch.next_states[i], tagged(id).next_state);
            assert_eq!(batch.actions[i], tagged(id).action);
            assert_eq!(batch.dones[i], tagged(id).done);
        }
    }

    #[test]
    fn sampling_is_with_replacement_and_roughly_uniform() {
        const SIZE: usize = 10;
        const ROUNDS: usize = 2_000;
        let mut queue = filled(SIZE, SIZE);
        let mut counts = [0usize; SIZE];
        let mut saw_duplicate = false;
        for _ in 0..ROUNDS {
            let batch = queue.sample_batch(SIZE).unwrap();
            let mut seen = [false; SIZE];
            for reward in &batch.rewards {
                let id = *reward as usize;
                saw_duplicate |= seen[id];
                seen[id] = true;
                counts[id] += 1;
            }
        }
        // a full-size batch drawn without replacement would never repeat
        assert!(saw_duplicate);
        let expected = (ROUNDS * SIZE / SIZE) as f64;
        for count in counts {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(deviation < 0.1, "count {count} too far from {expected}");
        }
    }
}

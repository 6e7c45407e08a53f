use serde::{Deserialize, Serialize};

/// Series of `(x, y)` points where each point averages `data_per_point`
/// consecutive data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    points: Vec<(f64, f64)>,
    current_n: usize,
    current_sum: f64,
    data_per_point: usize,
}

impl Plot {
    pub fn new(data_per_point: usize) -> Self {
        Self {
            points: vec![],
            current_n: 0,
            current_sum: 0.0,
            data_per_point: data_per_point.max(1),
        }
    }
    /// The point is placed at the `x` of the last datum it averages.
    pub fn add_datum(&mut self, (x, y): (f64, f64)) {
        self.current_n += 1;
        self.current_sum += y;
        if self.current_n == self.data_per_point {
            let y_average = self.current_sum / (self.data_per_point as f64);
            self.points.push((x, y_average));
            self.current_n = 0;
            self.current_sum = 0.0;
        }
    }
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

pub type Float = f64;

/// A feature column and its value in one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attr {
    pub aid: usize,
    pub value: Float,
}

impl Attr {
    pub fn new(aid: usize, value: Float) -> Self {
        Self { aid, value }
    }
}

pub type Item = Vec<Attr>;

/// Sparse feature matrix, one row per token.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub rows: Vec<Item>,
    num_columns: usize,
}

impl FeatureMatrix {
    pub fn new(num_columns: usize) -> Self {
        Self {
            rows: Vec::new(),
            num_columns,
        }
    }

    pub fn push(&mut self, item: Item) {
        debug_assert!(item.iter().all(|a| a.aid < self.num_columns));
        self.rows.push(item);
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn get(&self, row: usize, column: usize) -> Float {
        self.rows
            .get(row)
            .map(|item| item.iter().filter(|a| a.aid == column).map(|a| a.value).sum())
            .unwrap_or_default()
    }

    pub fn to_dense(&self) -> Vec<Vec<Float>> {
        self.rows
            .iter()
            .map(|item| {
                let mut row = vec![0.0; self.num_columns];
                for attr in item {
                    row[attr.aid] += attr.value;
                }
                row
            })
            .collect()
    }
}

/// Encoded training data: feature rows and their label ids.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TrainingMatrix {
    pub features: FeatureMatrix,
    pub labels: Vec<usize>,
}

impl TrainingMatrix {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Serialize, Serializer};

use crate::schema::{is_improvable_name, MetricName};
use crate::table::Table;
use crate::value::MetricValue;

/// A column seen in some partition. Registry metrics sort first, in canonical
/// order; columns only found in older files sort after them by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnKey {
    Known(MetricName),
    Other(String),
}

impl ColumnKey {
    pub fn from_header(name: &str) -> Self {
        match MetricName::lookup(name) {
            Some(metric) => ColumnKey::Known(metric),
            None => ColumnKey::Other(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ColumnKey::Known(metric) => metric.as_str(),
            ColumnKey::Other(name) => name,
        }
    }

    /// Whether deltas for this column mean anything. Unknown columns are
    /// judged by name alone; their values still have to parse as numbers.
    pub fn is_improvable(&self) -> bool {
        match self {
            ColumnKey::Known(metric) => metric.is_improvable(),
            ColumnKey::Other(name) => is_improvable_name(name),
        }
    }

    fn parse(&self, raw: &str) -> MetricValue {
        match self {
            ColumnKey::Known(metric) => MetricValue::for_metric(*metric, raw),
            ColumnKey::Other(_) => MetricValue::infer(raw),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ColumnKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Parsed values of one test in one partition. Unset cells are absent.
#[derive(Debug, Clone, Default)]
pub struct TestValues {
    pub test_name: String,
    pub values: BTreeMap<ColumnKey, MetricValue>,
}

/// One partition's rows, still in table order.
#[derive(Debug, Clone)]
pub struct PartitionValues {
    pub label: String,
    rows: Vec<TestValues>,
    index: HashMap<String, usize>,
}

impl PartitionValues {
    pub fn from_table(label: &str, table: &Table) -> Self {
        let columns: Vec<ColumnKey> = table
            .metric_columns()
            .iter()
            .map(|name| ColumnKey::from_header(name))
            .collect();

        let mut rows = Vec::with_capacity(table.len());
        let mut index = HashMap::with_capacity(table.len());
        for row in table.rows() {
            let values = columns
                .iter()
                .zip(&row.cells)
                .filter(|(_, cell)| !cell.trim().is_empty())
                .map(|(column, cell)| (column.clone(), column.parse(cell)))
                .collect();
            index.insert(row.test_name.clone(), rows.len());
            rows.push(TestValues {
                test_name: row.test_name.clone(),
                values,
            });
        }

        Self {
            label: label.to_string(),
            rows,
            index,
        }
    }

    pub fn rows(&self) -> &[TestValues] {
        &self.rows
    }

    pub fn test(&self, test_name: &str) -> Option<&TestValues> {
        self.index.get(test_name).map(|&idx| &self.rows[idx])
    }

    /// Value of `column` from the first row, in table order, that has one.
    pub fn first_value(&self, column: &ColumnKey) -> Option<&MetricValue> {
        self.rows.iter().find_map(|row| row.values.get(column))
    }
}

/// `label -> test -> metric -> value` across partitions, labels ascending.
#[derive(Debug, Clone, Default)]
pub struct VersionView {
    partitions: Vec<PartitionValues>,
}

impl VersionView {
    pub fn new(mut partitions: Vec<PartitionValues>) -> Self {
        partitions.sort_by(|a, b| a.label.cmp(&b.label));
        Self { partitions }
    }

    pub fn labels(&self) -> Vec<String> {
        self.partitions.iter().map(|p| p.label.clone()).collect()
    }

    pub fn partitions(&self) -> &[PartitionValues] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Every test name seen in any partition, sorted.
    pub fn test_names(&self) -> BTreeSet<&str> {
        self.partitions
            .iter()
            .flat_map(|p| p.rows.iter().map(|row| row.test_name.as_str()))
            .collect()
    }

    /// Every column with a value for `test_name` in any partition.
    pub fn columns_for(&self, test_name: &str) -> BTreeSet<&ColumnKey> {
        self.partitions
            .iter()
            .filter_map(|p| p.test(test_name))
            .flat_map(|test| test.values.keys())
            .collect()
    }

    /// Per-label values for one test and column, in label order.
    pub fn values(&self, test_name: &str, column: &ColumnKey) -> Vec<Option<&MetricValue>> {
        self.partitions
            .iter()
            .map(|p| p.test(test_name).and_then(|test| test.values.get(column)))
            .collect()
    }

    /// Per-label first-match values for `column`, in label order.
    pub fn first_values(&self, column: &ColumnKey) -> Vec<Option<&MetricValue>> {
        self.partitions.iter().map(|p| p.first_value(column)).collect()
    }
}

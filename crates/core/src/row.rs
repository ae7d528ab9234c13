use super::*;
use std::sync::Arc;

/// One result row: values in column order, sharing column names with
/// every other row of the same result.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
    /// Looks up a value by column name. The first matching column wins.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
    }
    /// Moves the value at `index` out of the row, or `Null` if absent.
    pub fn take(self, index: usize) -> Value {
        self.values.into_iter().nth(index).unwrap_or_default()
    }
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl IntoIterator for Row {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn sample() -> Row {
        let columns: Arc<[String]> = vec!["id".to_string(), "name".to_string()].into();
        Row::new(columns, vec![Value::Int(1), Value::from("ada")])
    }
    #[test]
    fn field_by_name() {
        let row = sample();
        assert_eq!(row.field("name"), Some(&Value::from("ada")));
        assert_eq!(row.field("missing"), None);
    }
    #[test]
    fn take_out_of_range_is_null() {
        assert_eq!(sample().take(0), Value::Int(1));
        assert_eq!(sample().take(5), Value::Null);
    }
}

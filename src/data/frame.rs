use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// A small columnar table: named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<Column>,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Every column must have the same number of rows.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have as many rows as the columns already in
    /// the frame.
    pub fn with_column<S: Into<String>>(mut self, name: S, values: Vec<Value>) -> Self {
        if let Some(first) = self.columns.first() {
            assert_eq!(
                first.values.len(),
                values.len(),
                "all columns of a frame must have the same length"
            );
        }
        self.columns.push(Column {
            name: name.into(),
            values,
        });
        self
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        let rows = self.columns.first().map_or(0, |c| c.values.len());
        (rows, self.columns.len())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// A new frame holding only the named columns, in the order given.
    /// Returns the first name that has no matching column on failure.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<DataFrame, String> {
        let mut selected = DataFrame::new();
        for name in names {
            let name = name.as_ref();
            let column = self.column(name).ok_or_else(|| name.to_string())?;
            selected.columns.push(column.clone());
        }
        Ok(selected)
    }

    /// Render as comma separated text: a header row, then one line per
    /// record, no index column, newline terminated.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| escape_field(&c.name)).collect();
        out.push_str(&header.join(","));
        out.push('\n');

        let (rows, _) = self.shape();
        for row in 0..rows {
            let fields: Vec<String> = self
                .columns
                .iter()
                .map(|c| render_cell(&c.values[row]))
                .collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape_field(s),
        other => escape_field(&other.to_string()),
    }
}

fn escape_field(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DataFrame {
        DataFrame::new()
            .with_column("a", vec![json!(1), json!(2)])
            .with_column("b", vec![json!("x"), json!("y, z")])
    }

    #[test]
    fn test_shape() {
        assert_eq!(sample().shape(), (2, 2));
        assert_eq!(DataFrame::new().shape(), (0, 0));
    }

    #[test]
    fn test_to_csv_quotes_only_when_needed() {
        assert_eq!(sample().to_csv(), "a,b\n1,x\n2,\"y, z\"\n");
    }

    #[test]
    fn test_select_reorders_and_reports_missing() {
        let frame = sample();
        let selected = frame.select(&["b", "a"]).unwrap();
        assert_eq!(selected.column_names(), vec!["b", "a"]);
        assert_eq!(frame.select(&["a", "nope"]).unwrap_err(), "nope");
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_with_column_rejects_ragged_columns() {
        DataFrame::new()
            .with_column("a", vec![json!(1)])
            .with_column("b", vec![]);
    }
}

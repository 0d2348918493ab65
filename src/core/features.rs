//! Checked per-row feature columns.
//!
//! A [`FeatureTable`] maps feature names to `f64` columns that all have one
//! value per vertex or point. The row count is fixed once known and every
//! insertion is checked against it, so a table can never hold a column that
//! is out of step with the geometry it annotates.

use crate::util::{Error, Result};

/// Column-oriented table of named numeric per-row attributes.
///
/// Columns keep their insertion order; the first column is what readers pick
/// as the default coloring attribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureTable {
    /// `None` until the row count is known (default table with no columns).
    rows: Option<usize>,
    columns: Vec<(String, Vec<f64>)>,
}

impl FeatureTable {
    /// Create an empty table for `rows` rows.
    pub fn new(rows: usize) -> Self {
        Self {
            rows: Some(rows),
            columns: Vec::new(),
        }
    }

    /// Build a table from `(name, values)` pairs. All columns must have the
    /// same length.
    pub fn from_columns<S, I>(columns: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f64>)>,
    {
        let mut table = Self::default();
        for (name, values) in columns {
            table.insert(name, values)?;
        }
        Ok(table)
    }

    /// Insert or replace a column.
    ///
    /// Fails with [`Error::FeatureLength`] when `values` does not have exactly
    /// [`num_rows`](Self::num_rows) entries. A default-constructed table takes
    /// its row count from the first column inserted.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        let expected = *self.rows.get_or_insert(values.len());
        if values.len() != expected {
            return Err(Error::FeatureLength {
                name,
                expected,
                actual: values.len(),
            });
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, column)) => *column = values,
            None => self.columns.push((name, values)),
        }
        Ok(())
    }

    /// Remove a column, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<f64>> {
        let pos = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(pos).1)
    }

    /// Values of the column called `name`.
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Column names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// `(name, values)` pairs in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Name of the first column, if any.
    pub fn first_name(&self) -> Option<&str> {
        self.columns.first().map(|(n, _)| n.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of rows every column has.
    pub fn num_rows(&self) -> usize {
        self.rows.unwrap_or(0)
    }

    /// Fix the row count of a table that has none yet, or check an existing
    /// one against `rows`.
    pub(crate) fn bind_rows(mut self, rows: usize) -> Result<Self> {
        match (self.rows, self.columns.first()) {
            (Some(n), Some((name, _))) if n != rows => Err(Error::FeatureLength {
                name: name.clone(),
                expected: rows,
                actual: n,
            }),
            _ => {
                self.rows = Some(rows);
                Ok(self)
            }
        }
    }

    /// New table holding only the given rows, in the given order.
    ///
    /// Indices must be in range.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            rows: Some(indices.len()),
            columns: self
                .columns
                .iter()
                .map(|(n, v)| (n.clone(), indices.iter().map(|&i| v[i]).collect()))
                .collect(),
        }
    }

    /// Concatenate tables row-wise.
    ///
    /// Each part comes with the number of rows it stands for, so a part with
    /// no columns still contributes its rows. The result has the union of all
    /// column names in first-seen order; rows from parts lacking a column are
    /// filled with NaN.
    pub fn concat<'a>(parts: impl IntoIterator<Item = (&'a FeatureTable, usize)>) -> Self {
        let parts: Vec<(&FeatureTable, usize)> = parts.into_iter().collect();
        let total: usize = parts.iter().map(|(_, rows)| rows).sum();

        let mut names: Vec<&str> = Vec::new();
        for (table, _) in &parts {
            for name in table.names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let columns = names
            .iter()
            .map(|&name| {
                let mut values = Vec::with_capacity(total);
                for (table, rows) in &parts {
                    match table.get(name) {
                        Some(v) => values.extend_from_slice(v),
                        None => values.extend(std::iter::repeat(f64::NAN).take(*rows)),
                    }
                }
                (name.to_string(), values)
            })
            .collect();

        Self {
            rows: Some(total),
            columns,
        }
    }
}

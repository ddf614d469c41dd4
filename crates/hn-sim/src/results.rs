//! Time series of recorded outputs.

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::{DateTime, Utc};
use hn_components::{OutputValue, Quantity};
use hn_core::ElementId;

/// Column identity: element, connection point (if any) and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnKey {
    pub element: ElementId,
    pub port: Option<usize>,
    pub quantity: Quantity,
}

/// One row per recorded timestep, one column per [`ColumnKey`].
///
/// Columns that first appear after the first row are back-filled with NaN,
/// as are columns missing from a later row.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    times: Vec<DateTime<Utc>>,
    names: BTreeMap<ElementId, String>,
    columns: BTreeMap<ColumnKey, Vec<f64>>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_element_name(&mut self, element: ElementId, name: impl Into<String>) {
        self.names.insert(element, name.into());
    }

    pub fn element_name(&self, element: ElementId) -> Option<&str> {
        self.names.get(&element).map(String::as_str)
    }

    pub fn record(
        &mut self,
        time: DateTime<Utc>,
        values: impl IntoIterator<Item = (ElementId, OutputValue)>,
    ) {
        let row = self.times.len();
        self.times.push(time);
        for (element, value) in values {
            let key = ColumnKey {
                element,
                port: value.port,
                quantity: value.quantity,
            };
            let column = self
                .columns
                .entry(key)
                .or_insert_with(|| vec![f64::NAN; row]);
            column.push(value.value);
        }
        for column in self.columns.values_mut() {
            column.resize(row + 1, f64::NAN);
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&[f64]> {
        self.columns.get(key).map(Vec::as_slice)
    }

    pub fn series(
        &self,
        element: ElementId,
        port: Option<usize>,
        quantity: Quantity,
    ) -> Option<&[f64]> {
        self.column(&ColumnKey {
            element,
            port,
            quantity,
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = (&ColumnKey, &[f64])> {
        self.columns.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Header label such as `house[0].temperature` or `house.heat_supplied`.
    pub fn column_label(&self, key: &ColumnKey) -> String {
        let name = self
            .element_name(key.element)
            .map(str::to_string)
            .unwrap_or_else(|| key.element.to_string());
        match key.port {
            Some(port) => format!("{name}[{port}].{}", key.quantity),
            None => format!("{name}.{}", key.quantity),
        }
    }

    /// Writes the table as CSV with an RFC 3339 time column.
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        let mut header = vec!["time".to_string()];
        header.extend(self.columns.keys().map(|k| self.column_label(k)));
        writeln!(out, "{}", header.join(","))?;
        for (row, time) in self.times.iter().enumerate() {
            write!(out, "{}", time.to_rfc3339())?;
            for column in self.columns.values() {
                write!(out, ",{}", column[row])?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

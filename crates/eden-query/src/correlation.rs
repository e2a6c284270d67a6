use crate::error::{TableError, TableResult};
use crate::query::Scope;
use crate::table::DataTable;
use eden_columnar::{Column, ColumnId};
use serde::{Deserialize, Serialize};

/// Pearson correlation between numeric columns of a [`DataTable`].
///
/// Results are computed on request and never cached; callers recompute after the table
/// changes.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationEngine;

impl CorrelationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Correlation of two enabled double or temporal columns over `scope`.
    ///
    /// Only rows non-missing in both columns take part. Returns `None` when fewer than two
    /// such rows exist or when either column is constant over them.
    pub fn correlation(
        &self,
        table: &DataTable,
        a: ColumnId,
        b: ColumnId,
        scope: Scope,
    ) -> TableResult<Option<f64>> {
        let a = numeric_column(table, a)?;
        let b = numeric_column(table, b)?;
        Ok(pearson(table, a, b, scope))
    }

    /// All pairwise correlations of the enabled numeric columns, in display order.
    pub fn correlation_matrix(&self, table: &DataTable, scope: Scope) -> CorrelationMatrix {
        let columns: Vec<&Column> = table
            .enabled_columns()
            .filter(|c| c.column_type().is_numeric())
            .collect();
        let n = columns.len();
        let mut values = vec![None; n * n];
        for i in 0..n {
            for j in i..n {
                let r = pearson(table, columns[i], columns[j], scope);
                values[i * n + j] = r;
                values[j * n + i] = r;
            }
        }
        CorrelationMatrix {
            columns: columns.iter().map(|c| c.id()).collect(),
            values,
        }
    }
}

/// Symmetric matrix of correlation coefficients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    columns: Vec<ColumnId>,
    /// Row-major, `columns.len()` squared.
    values: Vec<Option<f64>>,
}

impl CorrelationMatrix {
    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, a: ColumnId, b: ColumnId) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a)?;
        let j = self.columns.iter().position(|c| *c == b)?;
        self.values[i * self.columns.len() + j]
    }

    pub fn row(&self, a: ColumnId) -> Option<&[Option<f64>]> {
        let n = self.columns.len();
        let i = self.columns.iter().position(|c| *c == a)?;
        Some(&self.values[i * n..(i + 1) * n])
    }
}

fn numeric_column(table: &DataTable, id: ColumnId) -> TableResult<&Column> {
    let column = table.column_by_id(id)?;
    if !column.is_enabled() {
        return Err(TableError::ColumnDisabled {
            column: column.name().to_string(),
        });
    }
    if !column.column_type().is_numeric() {
        return Err(TableError::TypeMismatch {
            column: column.name().to_string(),
            expected: "double or temporal",
            actual: column.column_type(),
        });
    }
    Ok(column)
}

fn pearson(table: &DataTable, a: &Column, b: &Column, scope: Scope) -> Option<f64> {
    let mask = table.query().scope_mask(scope);
    let rows: Box<dyn Iterator<Item = usize> + '_> = match &mask {
        Some(mask) => Box::new(mask.iter_ones()),
        None => Box::new(0..table.tuple_count()),
    };
    let pairs: Vec<(f64, f64)> = rows
        .filter_map(|row| Some((a.axis_value(row)?, b.axis_value(row)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    // Constant columns are detected exactly; sums of squared deviations can round to a
    // tiny nonzero value for constants without an exact binary form.
    let (x0, y0) = pairs[0];
    if pairs.iter().all(|p| p.0 == x0) || pairs.iter().all(|p| p.1 == y0) {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

//! Plain-text report of a clustering run.
//!
//! A [`Report`] reads the raw table and a [`PipelineOutput`] and renders,
//! in order:
//!
//! 1. dataset overview
//! 2. column info
//! 3. outcome value counts
//! 4. descriptive statistics of numeric columns
//! 5. pairwise-complete Pearson correlations
//! 6. selected features and encoding summary
//! 7. head of the dissimilarity matrix
//! 8. head of the linkage tree
//! 9. dendrogram summary with height thresholds
//! 10. group sizes per cut
//! 11. cross-tabulations against the first cut
//! 12. agreement between the first cut and the outcome
//!
//! Nothing here mutates the run's outputs.

mod table;

pub use table::{fmt_num, TextTable};

use crate::config::Config;
use crate::data::{compare_labels, dictionary_encode, Column, Table};
use crate::error::Result;
use crate::features::{quantile_sorted, sorted_present, FeatureRole};
use crate::metrics::{ari, nmi, purity, Crosstab};
use crate::pipeline::{group_column, PipelineOutput};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fmt;

/// Rows shown by the "head" sections.
const HEAD: usize = 5;

/// One titled block of the report.
#[derive(Debug, Clone, Default)]
pub struct Section {
    /// Heading, without the section number.
    pub title: String,
    /// Tables in display order.
    pub tables: Vec<TextTable>,
    /// Free-text lines printed after the tables.
    pub notes: Vec<String>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn table(mut self, table: TextTable) -> Self {
        self.tables.push(table);
        self
    }

    fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        for note in &self.notes {
            writeln!(f, "{note}")?;
        }
        for table in &self.tables {
            writeln!(f)?;
            write!(f, "{table}")?;
        }
        Ok(())
    }
}

/// Report over one run.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    config: &'a Config,
    raw: &'a Table,
    output: &'a PipelineOutput,
}

impl<'a> Report<'a> {
    /// `raw` must be the table `output` was computed from.
    pub fn new(config: &'a Config, raw: &'a Table, output: &'a PipelineOutput) -> Self {
        Self {
            config,
            raw,
            output,
        }
    }

    /// All sections, in report order.
    pub fn sections(&self) -> Result<Vec<Section>> {
        Ok(vec![
            self.overview(),
            self.column_info(),
            self.value_counts(),
            self.describe(),
            self.correlation(),
            self.feature_summary(),
            self.dissimilarity_head(),
            self.linkage_head(),
            self.dendrogram_summary()?,
            self.group_sizes(),
            self.crosstabs()?,
            self.agreement(),
        ])
    }

    /// The whole report as text.
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();
        for (i, section) in self.sections()?.into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("{}. {section}", i + 1));
        }
        Ok(out)
    }

    fn overview(&self) -> Section {
        let mut t = TextTable::new(["", "value"]);
        t.push_row(["rows".to_string(), self.raw.n_rows().to_string()]);
        t.push_row(["columns".to_string(), self.raw.n_cols().to_string()]);
        t.push_row(["missing cells".to_string(), self.raw.missing_count().to_string()]);
        Section::new("Dataset overview").table(t)
    }

    fn column_info(&self) -> Section {
        let mut t = TextTable::new(["column", "kind", "non-null", "levels"]);
        for (name, col) in self.raw.iter() {
            let levels = match col {
                Column::Categorical { levels, .. } => levels.len().to_string(),
                Column::Numeric(_) => "-".to_string(),
            };
            t.push_row([
                name.to_string(),
                col.kind().to_string(),
                (col.len() - col.missing_count()).to_string(),
                levels,
            ]);
        }
        Section::new("Column info").table(t)
    }

    fn value_counts(&self) -> Section {
        let name = &self.config.outcome_column;
        let section = Section::new(format!("Value counts of {name}"));
        let Some(col) = self.raw.column(name) else {
            return section.note(format!("column {name} not present"));
        };

        let mut counts: HashMap<String, usize> = HashMap::new();
        for r in 0..col.len() {
            if let Some(label) = col.label(r) {
                *counts.entry(label).or_insert(0) += 1;
            }
        }
        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|(la, ca), (lb, cb)| cb.cmp(ca).then_with(|| compare_labels(la, lb)));

        let present: usize = counts.iter().map(|(_, c)| c).sum();
        let mut t = TextTable::new([name.as_str(), "count", "share"]);
        for (label, count) in counts {
            t.push_row([label, count.to_string(), fmt_num(count as f64 / present as f64, 4)]);
        }
        section.table(t)
    }

    fn numeric_columns(&self) -> Vec<(&str, &[Option<f64>])> {
        self.raw
            .iter()
            .filter_map(|(name, col)| col.as_numeric().map(|v| (name, v)))
            .collect()
    }

    fn describe(&self) -> Section {
        let mut t = TextTable::new([
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max",
        ]);
        for (name, values) in self.numeric_columns() {
            let sorted = sorted_present(values);
            let mut row = vec![name.to_string(), sorted.len().to_string()];
            if sorted.is_empty() {
                row.extend(std::iter::repeat("NaN".to_string()).take(7));
            } else {
                let mean = sorted.iter().mean();
                let std = sorted.iter().std_dev();
                row.push(fmt_num(mean, 4));
                row.push(fmt_num(std, 4));
                for p in [0.0, 0.25, 0.5, 0.75, 1.0] {
                    row.push(fmt_num(quantile_sorted(&sorted, p), 4));
                }
            }
            t.push_row(row);
        }
        Section::new("Descriptive statistics").table(t)
    }

    fn correlation(&self) -> Section {
        let columns = self.numeric_columns();
        let header = std::iter::once("").chain(columns.iter().map(|(name, _)| *name));
        let mut t = TextTable::new(header);
        for (name, a) in &columns {
            let mut row = vec![name.to_string()];
            for (_, b) in &columns {
                row.push(fmt_num(pearson(a, b), 3));
            }
            t.push_row(row);
        }
        Section::new("Correlation (pairwise complete)").table(t)
    }

    fn feature_summary(&self) -> Section {
        let mut t = TextTable::new(["feature", "role", "source"]);
        for feature in &self.config.features.features {
            let (role, source) = match &feature.role {
                FeatureRole::Numeric => ("numeric".to_string(), feature.name.clone()),
                FeatureRole::Categorical => ("categorical".to_string(), feature.name.clone()),
                FeatureRole::Binned { source, quantiles } => {
                    (format!("binned (q={quantiles})"), source.clone())
                }
            };
            t.push_row([feature.name.clone(), role, source]);
        }

        let encoded = &self.output.encoded;
        let indicators = encoded.categorical.iter().filter(|&&c| c).count();
        Section::new("Features")
            .note(format!("feature set: {}", self.config.features.id))
            .note(format!(
                "encoded columns: {} ({} numeric, {} indicator)",
                encoded.n_cols(),
                encoded.n_cols() - indicators,
                indicators
            ))
            .note(format!(
                "rows clustered: {}, dropped for missing features: {}",
                encoded.n_rows(),
                self.output.dropped_rows()
            ))
            .table(t)
    }

    fn dissimilarity_head(&self) -> Section {
        let d = &self.output.dissimilarity;
        let ids = &self.output.encoded.row_ids;
        let head = d.head(HEAD, HEAD);

        let header = std::iter::once(String::new())
            .chain(ids.iter().take(head.first().map_or(0, Vec::len)).map(|r| r.to_string()));
        let mut t = TextTable::new(header);
        for (i, values) in head.iter().enumerate() {
            let row = std::iter::once(ids[i].to_string()).chain(values.iter().map(|v| fmt_num(*v, 4)));
            t.push_row(row);
        }
        Section::new("Dissimilarity matrix (head)")
            .note(format!(
                "{} x {} Gower dissimilarities, {} bytes condensed",
                d.n(),
                d.n(),
                d.memory_bytes()
            ))
            .table(t)
    }

    fn linkage_head(&self) -> Section {
        let mut t = TextTable::new(["", "id1", "id2", "dist", "n"]);
        for (m, merge) in self.output.tree.merges().take(HEAD).enumerate() {
            t.push_row([
                m.to_string(),
                merge.left.to_string(),
                merge.right.to_string(),
                fmt_num(merge.distance, 4),
                merge.size.to_string(),
            ]);
        }
        Section::new("Linkage tree (head)").table(t)
    }

    fn dendrogram_summary(&self) -> Result<Section> {
        let tree = &self.output.tree;
        let n = tree.n_items();

        let mut top = TextTable::new(["node", "left", "right", "dist", "n"]).with_title("Top merges");
        let merges: Vec<_> = tree.merges().collect();
        for (m, merge) in merges.iter().enumerate().rev().take(HEAD) {
            top.push_row([
                (n + m).to_string(),
                merge.left.to_string(),
                merge.right.to_string(),
                fmt_num(merge.distance, 4),
                merge.size.to_string(),
            ]);
        }

        let mut thresholds =
            TextTable::new(["groups", "threshold", "groups at threshold"]).with_title("Height thresholds");
        for &(groups, threshold) in &self.config.color_thresholds {
            let at = tree.cut_at_distance(threshold)?;
            thresholds.push_row([groups.to_string(), fmt_num(threshold, 4), at.k().to_string()]);
        }

        let height = merges.last().map_or(0.0, |m| m.distance);
        Ok(Section::new("Dendrogram summary")
            .note(format!("leaves: {n}, merges: {}", tree.n_merges()))
            .note(format!("height: {}", fmt_num(height, 4)))
            .note(format!("monotone: {}", tree.is_monotone()))
            .table(top)
            .table(thresholds))
    }

    fn group_sizes(&self) -> Section {
        let total = self.output.encoded.n_rows() as f64;
        let mut section = Section::new("Group sizes");
        for assignment in &self.output.assignments {
            let mut t = TextTable::new(["group", "size", "share"]).with_title(group_column(assignment.k()));
            for (g, size) in assignment.sizes().into_iter().enumerate() {
                t.push_row([(g + 1).to_string(), size.to_string(), fmt_num(size as f64 / total, 4)]);
            }
            section = section.table(t);
        }
        section
    }

    /// Label of the first cut for each raw row; `None` for dropped rows.
    fn primary_groups(&self) -> Option<(usize, Vec<Option<usize>>)> {
        let assignment = self.output.assignments.first()?;
        let mut groups = vec![None; self.raw.n_rows()];
        for (i, &row) in self.output.encoded.row_ids.iter().enumerate() {
            groups[row] = Some(assignment.label(i));
        }
        Some((assignment.k(), groups))
    }

    fn crosstabs(&self) -> Result<Section> {
        let Some((k, groups)) = self.primary_groups() else {
            return Ok(Section::new("Cross-tabulations").note("no cuts"));
        };
        let mut section = Section::new(format!("Cross-tabulations against {}", group_column(k)));

        let rows = &self.config.crosstab_rows;
        let mut keys: Vec<Vec<&str>> = Vec::new();
        if let Some(first) = rows.first() {
            keys.push(vec![first.as_str()]);
            if self.raw.column(&self.config.outcome_column).is_some() && first != &self.config.outcome_column {
                keys.push(vec![first.as_str(), self.config.outcome_column.as_str()]);
            }
        }
        keys.extend(rows.iter().skip(1).map(|r| vec![r.as_str()]));

        for key in keys {
            let columns = key
                .iter()
                .map(|name| self.raw.require(name))
                .collect::<Result<Vec<_>>>()?;
            let pairs = groups.iter().enumerate().filter_map(|(r, g)| {
                let labels = columns.iter().map(|c| c.label(r)).collect::<Option<Vec<_>>>()?;
                Some((labels, (*g)?))
            });
            let ct = Crosstab::from_pairs(pairs);
            section = section.table(crosstab_table(&ct, &key, k));
        }
        Ok(section)
    }

    fn agreement(&self) -> Section {
        let outcome = &self.config.outcome_column;
        let Some((k, groups)) = self.primary_groups() else {
            return Section::new("Agreement").note("no cuts");
        };
        let section = Section::new(format!("Agreement of {} with {outcome}", group_column(k)));
        let Some(col) = self.raw.column(outcome) else {
            return section.note(format!("column {outcome} not present"));
        };

        let (pred, labels): (Vec<usize>, Vec<Option<String>>) = groups
            .iter()
            .enumerate()
            .filter_map(|(r, g)| Some(((*g)?, Some(col.label(r)?))))
            .unzip();
        if pred.is_empty() {
            return section.note("no rows with both a group and an outcome");
        }
        let (codes, _) = dictionary_encode(&labels);
        let truth: Vec<usize> = codes.into_iter().flatten().map(|c| c as usize).collect();

        let mut t = TextTable::new(["score", "value"]);
        t.push_row(["NMI".to_string(), fmt_num(nmi(&pred, &truth), 4)]);
        t.push_row(["ARI".to_string(), fmt_num(ari(&pred, &truth), 4)]);
        t.push_row(["purity".to_string(), fmt_num(purity(&pred, &truth), 4)]);
        section
            .note(format!("rows compared: {}", pred.len()))
            .table(t)
    }
}

fn crosstab_table(ct: &Crosstab, key: &[&str], k: usize) -> TextTable {
    let header = key
        .iter()
        .map(|s| s.to_string())
        .chain(ct.col_keys().iter().map(|g| g.to_string()))
        .chain(std::iter::once("All".to_string()));
    let mut t = TextTable::new(header)
        .with_title(format!("{} x {}", key.join(", "), group_column(k)))
        .with_label_columns(key.len());

    for (r, row_key) in ct.row_keys().iter().enumerate() {
        let row = row_key
            .iter()
            .cloned()
            .chain((0..ct.col_keys().len()).map(|c| ct.count(r, c).to_string()))
            .chain(std::iter::once(ct.row_total(r).to_string()));
        t.push_row(row);
    }

    let mut totals: Vec<String> = vec![String::new(); key.len()];
    totals[0] = "All".to_string();
    totals.extend(ct.col_totals().iter().map(|c| c.to_string()));
    totals.push(ct.total().to_string());
    t.push_row(totals);
    t
}

/// Pearson correlation over rows where both values are present.
fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();
    if xs.len() < 2 {
        return f64::NAN;
    }
    let sx = xs.iter().std_dev();
    let sy = ys.iter().std_dev();
    if sx == 0.0 || sy == 0.0 {
        return f64::NAN;
    }
    xs.iter().covariance(ys.iter()) / (sx * sy)
}

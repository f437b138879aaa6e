use anyhow::{bail, Result};
use clap::ValueEnum;

use std::{
    fmt::Write as _,
    io::{self, Write},
};

use crate::{
    aggregate::{
        ranked_revenue, ranked_ticket, revenue_by_month, revenue_by_year, Dimension, Ranking,
    },
    brl::{thousands, Brl},
    chart::{BarChart, Chart, LineChart, PieChart, Series},
    table::SalesTable,
};

/// Which of the two sales layouts a file holds.
///
/// The dataset decides the default input file, the wording of headings and
/// chart titles, and which [`Stage`]s the report runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    /// Car sales by model, seller, and dealer.
    #[default]
    Cars,
    /// Confectionery sales by product, category, seller, and city.
    Confectionery,
}

impl Dataset {
    /// Returns the file read when no path is given.
    #[must_use]
    pub fn default_path(self) -> &'static str {
        match self {
            Self::Cars => "vendas_carros.csv",
            Self::Confectionery => "vendas_mondelez.csv",
        }
    }

    /// Returns the columns a file of this dataset must have.
    #[must_use]
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Cars => &[
                "DATA",
                "MODELO",
                "VENDEDOR",
                "CONCESSIONARIA",
                "QTD",
                "VALOR_UNIT",
                "VALOR_TOTAL",
            ],
            Self::Confectionery => &[
                "DATA",
                "DESCRICAO",
                "CATEGORIA",
                "VENDEDOR",
                "LOCAL",
                "QTD",
                "VALOR_UNIT",
                "VALOR_TOTAL",
            ],
        }
    }

    /// Returns the report stages for this dataset, in the order they run.
    #[must_use]
    pub fn stages(self) -> &'static [Stage] {
        use Stage::*;
        match self {
            Self::Cars => &[
                Overview,
                Metrics,
                YearlyRevenue,
                MonthlyRevenue,
                TopItems,
                Distribution,
                BySeller,
                ByLocation,
                TicketByItem,
                Conclusions,
            ],
            Self::Confectionery => &[
                Overview,
                Metrics,
                YearlyRevenue,
                MonthlyRevenue,
                TopItems,
                Distribution,
                BySeller,
                ByLocation,
                Conclusions,
            ],
        }
    }

    fn labels(self) -> Labels {
        match self {
            Self::Cars => Labels {
                item: "Modelo",
                items: "modelos",
                top_title: "Modelos de Carros por Receita",
                share: Dimension::Item,
                share_title: "Distribuição de Receita por Modelo",
                location: "Concessionária",
                location_title: "Receita Total por Concessionaria",
            },
            Self::Confectionery => Labels {
                item: "Produto",
                items: "produtos",
                top_title: "Produtos por Receita",
                share: Dimension::Category,
                share_title: "Distribuição de Receita por Categoria",
                location: "Local",
                location_title: "Receita Total por Local de Venda",
            },
        }
    }
}

/// Wording that differs between datasets.
struct Labels {
    item: &'static str,
    items: &'static str,
    top_title: &'static str,
    /// The dimension shown in the distribution (pie) chart.
    share: Dimension,
    share_title: &'static str,
    location: &'static str,
    location_title: &'static str,
}

/// One step of the report: some text, a chart, or both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Preview of the table, column info, statistics, and counts.
    Overview,
    /// Total revenue, units, and average ticket.
    Metrics,
    YearlyRevenue,
    /// Revenue per month, one line per year.
    MonthlyRevenue,
    TopItems,
    /// Share of revenue per model (cars) or category (confectionery).
    Distribution,
    BySeller,
    ByLocation,
    TicketByItem,
    Conclusions,
}

/// The output of one [`Stage`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Section {
    pub text: String,
    pub chart: Option<Chart>,
}

/// Produces the sales report for a loaded table.
///
/// To create a `Report`, use [`Report::new`], which checks that the table has
/// the dataset's columns. To change how many groups the "top" views keep, set
/// [`Report::top`].
///
/// Each stage is computed from the table on its own, when it is rendered;
/// no stage depends on another's results.
#[derive(Debug)]
pub struct Report<'a> {
    table: &'a SalesTable,
    dataset: Dataset,
    pub top: usize,
}

impl<'a> Report<'a> {
    /// Creates a report on `table`, laid out for `dataset`.
    ///
    /// # Errors
    ///
    /// Returns an error naming every column of [`Dataset::required_columns`]
    /// that the table lacks.
    pub fn new(table: &'a SalesTable, dataset: Dataset) -> Result<Self> {
        let missing: Vec<&str> = dataset
            .required_columns()
            .iter()
            .copied()
            .filter(|name| !table.has_column(name))
            .collect();
        if !missing.is_empty() {
            bail!(
                "missing columns for {dataset:?} sales: {}",
                missing.join(", ")
            );
        }
        Ok(Self {
            table,
            dataset,
            top: 10,
        })
    }

    /// Writes every stage to `out` in order, calling `pause` after each chart.
    ///
    /// `pause` is where an interactive caller waits for the user before the
    /// next stage is drawn.
    ///
    /// # Errors
    ///
    /// Returns any error from writing to `out`, or from `pause`.
    pub fn render(
        &self,
        out: &mut impl Write,
        mut pause: impl FnMut() -> io::Result<()>,
    ) -> Result<()> {
        for &stage in self.dataset.stages() {
            log::debug!("rendering {stage:?}");
            let section = self.section(stage)?;
            if !section.text.is_empty() {
                writeln!(out)?;
                write!(out, "{}", section.text)?;
            }
            if let Some(chart) = &section.chart {
                writeln!(out)?;
                write!(out, "{chart}")?;
                out.flush()?;
                pause()?;
            }
        }
        Ok(())
    }

    /// Computes the output of `stage`.
    ///
    /// # Errors
    ///
    /// Only fails if formatting the text fails.
    pub fn section(&self, stage: Stage) -> Result<Section> {
        let labels = self.dataset.labels();
        let records = self.table.records();
        let mut section = Section::default();
        let text = &mut section.text;
        match stage {
            Stage::Overview => {
                writeln!(text, "Visualizando a base de dados:")?;
                write!(text, "{}", self.table.head(5))?;
                writeln!(text)?;
                writeln!(text, "Informações gerais:")?;
                self.write_info(text)?;
                writeln!(text)?;
                writeln!(text, "Estatísticas básicas:")?;
                write!(text, "{}", self.table.describe())?;
                writeln!(text)?;
                writeln!(
                    text,
                    "Total de linhas: {} | Total de colunas: {}",
                    self.table.len(),
                    self.table.column_count()
                )?;
            }
            Stage::Metrics => {
                let totals = self.table.totals();
                writeln!(text, "Métricas gerais:")?;
                writeln!(text, "Receita total: {}", totals.revenue)?;
                writeln!(text, "Quantidade total vendida: {}", thousands(totals.units))?;
                writeln!(text, "Ticket médio: {}", totals.ticket())?;
            }
            Stage::YearlyRevenue => {
                let years = revenue_by_year(records);
                writeln!(text, "Receita total por ano:")?;
                for (year, revenue) in &years {
                    writeln!(text, "{year} {revenue:>18}")?;
                }
                section.chart = Some(Chart::Bar(
                    BarChart::new("Receita Total por Ano", "Ano", "Valor em R$").with_bars(years),
                ));
            }
            Stage::MonthlyRevenue => {
                let series = revenue_by_month(records)
                    .into_iter()
                    .map(|(year, months)| Series {
                        name: year.to_string(),
                        points: months.into_iter().collect(),
                    })
                    .collect();
                section.chart = Some(Chart::Line(LineChart {
                    title: "Evolução Mensal da Receita".into(),
                    x_label: "Mês".into(),
                    y_label: "Receita (R$)".into(),
                    series,
                }));
            }
            Stage::TopItems => {
                let top = ranked_revenue(records, Dimension::Item).top(self.top);
                writeln!(
                    text,
                    "Top {} {} mais vendidos (por receita):",
                    self.top, labels.items
                )?;
                write!(text, "{top}")?;
                section.chart = Some(Chart::Bar(
                    BarChart::new(
                        &format!("Top {} {}", self.top, labels.top_title),
                        labels.item,
                        "Receita (R$)",
                    )
                    .with_bars(top.iter()),
                ));
            }
            Stage::Distribution => {
                let shares = ranked_revenue(records, labels.share);
                section.chart = Some(Chart::Pie(PieChart {
                    title: labels.share_title.into(),
                    slices: shares.iter().map(|(k, v)| (k.to_string(), v)).collect(),
                }));
            }
            Stage::BySeller => {
                let sellers = ranked_revenue(records, Dimension::Seller);
                section.chart = Some(Chart::Bar(
                    BarChart::new("Receita Total por Vendedor", "Vendedor", "Valor em R$")
                        .with_bars(sellers.iter()),
                ));
            }
            Stage::ByLocation => {
                let locations = ranked_revenue(records, Dimension::Location);
                section.chart = Some(Chart::Bar(
                    BarChart::new(labels.location_title, labels.location, "Valor em R$")
                        .with_bars(locations.iter()),
                ));
            }
            Stage::TicketByItem => {
                let ticket = ranked_ticket(records, Dimension::Item).top(self.top);
                section.chart = Some(Chart::Bar(
                    BarChart::new(
                        &format!("Ticket Médio por {} (Top {})", labels.item, self.top),
                        labels.item,
                        "Ticket Médio (R$)",
                    )
                    .with_bars(ticket.iter()),
                ));
            }
            Stage::Conclusions => {
                writeln!(text, "Conclusões rápidas:")?;
                for line in self.conclusions() {
                    writeln!(text, "- {line}")?;
                }
            }
        }
        Ok(section)
    }

    fn write_info(&self, text: &mut String) -> std::fmt::Result {
        let info = self.table.info();
        let width = info
            .iter()
            .map(|c| c.name.chars().count())
            .chain(["Column".len()])
            .max()
            .unwrap_or(0);
        writeln!(text, " #  {:width$}  {:<16}  Dtype", "Column", "Non-Null Count")?;
        writeln!(text, "--- {:-<width$}  {:-<16}  -----", "", "")?;
        for (i, column) in info.iter().enumerate() {
            let count = format!("{} non-null", column.non_null);
            writeln!(text, "{i:>2}  {:width$}  {count:<16}  {}", column.name, column.kind)?;
        }
        Ok(())
    }

    /// Returns short findings drawn from the data, one per line.
    fn conclusions(&self) -> Vec<String> {
        let labels = self.dataset.labels();
        let records = self.table.records();
        let mut lines = Vec::new();

        let years = revenue_by_year(records);
        match (years.iter().next(), years.iter().next_back()) {
            (Some((first, from)), Some((last, to))) if first != last => {
                if from.amount() == 0.0 {
                    lines.push(format!(
                        "A receita foi de {from} em {first} para {to} em {last} (ver gráfico anual)."
                    ));
                } else {
                    lines.push(format!(
                        "A receita variou {:+.1}% de {first} para {last} (ver gráfico anual).",
                        (to.amount() - from.amount()) / from.amount() * 100.0
                    ));
                }
            }
            (Some((year, _)), _) => lines.push(format!("Só há vendas datadas em {year}.")),
            _ => lines.push("Nenhuma venda tem data válida.".into()),
        }
        if let Some(line) = leader(&ranked_revenue(records, labels.share)) {
            lines.push(format!("{line} (ver gráfico de pizza)."));
        }
        if let Some(line) = leader(&ranked_revenue(records, Dimension::Seller)) {
            lines.push(format!("Entre os vendedores, {line}."));
        }
        if let Some(line) = leader(&ranked_revenue(records, Dimension::Location)) {
            lines.push(format!("Por {}, {line}.", labels.location.to_lowercase()));
        }
        let tickets: Vec<Brl> = ranked_ticket(records, Dimension::Item)
            .iter()
            .map(|(_, v)| v)
            .filter(|v| v.amount().is_finite())
            .collect();
        if let (Some(high), Some(low)) = (tickets.first(), tickets.last()) {
            lines.push(format!(
                "O ticket médio varia de {low} a {high} entre {}.",
                labels.items
            ));
        }
        lines
    }
}

/// Describes the leading group of `ranking` and its share of the ranking's
/// total.
fn leader(ranking: &Ranking) -> Option<String> {
    let (key, value) = ranking.iter().next()?;
    let share = value.amount() / ranking.total().amount() * 100.0;
    Some(format!("{key} lidera com {share:.1}% da receita"))
}

#[cfg(test)]
mod tests {
    use encoding_rs::{UTF_8, WINDOWS_1252};

    use super::*;

    fn load(dataset: Dataset) -> SalesTable {
        let path = format!("testdata/{}", dataset.default_path());
        SalesTable::read_csv(path, WINDOWS_1252).unwrap()
    }

    fn render(dataset: Dataset) -> (String, usize) {
        let table = load(dataset);
        let report = Report::new(&table, dataset).unwrap();
        let mut out = Vec::new();
        let mut pauses = 0;
        report
            .render(&mut out, || {
                pauses += 1;
                Ok(())
            })
            .unwrap();
        (String::from_utf8(out).unwrap(), pauses)
    }

    fn chart_titles(dataset: Dataset) -> Vec<String> {
        let table = load(dataset);
        let report = Report::new(&table, dataset).unwrap();
        dataset
            .stages()
            .iter()
            .filter_map(|&s| report.section(s).unwrap().chart)
            .map(|c| c.title().to_string())
            .collect()
    }

    #[test]
    fn render_fn_pauses_once_per_chart() {
        assert_eq!(render(Dataset::Cars).1, 7);
        assert_eq!(render(Dataset::Confectionery).1, 6);
    }

    #[test]
    fn car_report_draws_charts_in_fixed_order() {
        assert_eq!(
            chart_titles(Dataset::Cars),
            vec![
                "Receita Total por Ano",
                "Evolução Mensal da Receita",
                "Top 10 Modelos de Carros por Receita",
                "Distribuição de Receita por Modelo",
                "Receita Total por Vendedor",
                "Receita Total por Concessionaria",
                "Ticket Médio por Modelo (Top 10)",
            ]
        );
    }

    #[test]
    fn confectionery_report_has_category_pie_and_no_ticket_chart() {
        assert_eq!(
            chart_titles(Dataset::Confectionery),
            vec![
                "Receita Total por Ano",
                "Evolução Mensal da Receita",
                "Top 10 Produtos por Receita",
                "Distribuição de Receita por Categoria",
                "Receita Total por Vendedor",
                "Receita Total por Local de Venda",
            ]
        );
    }

    #[test]
    fn metrics_section_formats_totals() {
        let table = load(Dataset::Cars);
        let report = Report::new(&table, Dataset::Cars).unwrap();
        let text = report.section(Stage::Metrics).unwrap().text;
        assert!(text.contains("Receita total: R$ 1,871,200.00"), "{text}");
        assert!(text.contains("Quantidade total vendida: 17"), "{text}");
        assert!(text.contains("Ticket médio: R$ 110,070.59"), "{text}");
    }

    #[test]
    fn overview_section_reports_table_shape() {
        let table = load(Dataset::Confectionery);
        let report = Report::new(&table, Dataset::Confectionery).unwrap();
        let text = report.section(Stage::Overview).unwrap().text;
        assert!(text.contains("Total de linhas: 10 | Total de colunas: 8"));
        assert!(text.contains("CATEGORIA"));
        assert!(text.contains("10 non-null"));
        assert!(text.contains("float64"));
    }

    #[test]
    fn yearly_section_leaves_out_undated_rows() {
        let table = load(Dataset::Cars);
        let report = Report::new(&table, Dataset::Cars).unwrap();
        let Some(Chart::Bar(chart)) = report.section(Stage::YearlyRevenue).unwrap().chart else {
            panic!("expected a bar chart");
        };
        let total: Brl = chart.bars.iter().map(|(_, v)| *v).sum();
        assert_eq!(chart.bars.len(), 2);
        assert_eq!(total, table.totals().revenue + Brl::new(-65_000.0));
    }

    #[test]
    fn monthly_section_has_one_series_per_year() {
        let table = load(Dataset::Confectionery);
        let report = Report::new(&table, Dataset::Confectionery).unwrap();
        let Some(Chart::Line(chart)) = report.section(Stage::MonthlyRevenue).unwrap().chart else {
            panic!("expected a line chart");
        };
        let names: Vec<_> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["2024", "2025"]);
        assert_eq!(chart.series[0].points[0], (1, Brl::new(260.0)));
    }

    #[test]
    fn top_items_section_respects_top_setting() {
        let table = load(Dataset::Cars);
        let mut report = Report::new(&table, Dataset::Cars).unwrap();
        report.top = 3;
        let section = report.section(Stage::TopItems).unwrap();
        assert!(section.text.starts_with("Top 3 modelos mais vendidos"));
        let Some(Chart::Bar(chart)) = section.chart else {
            panic!("expected a bar chart");
        };
        let names: Vec<_> = chart.bars.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["Compass", "Onix", "HB20"]);
    }

    #[test]
    fn conclusions_are_drawn_from_the_data() {
        let table = load(Dataset::Confectionery);
        let report = Report::new(&table, Dataset::Confectionery).unwrap();
        let lines = report.conclusions();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("Chocolates lidera"), "{}", lines[1]);
        assert!(lines[2].contains("Marina lidera"), "{}", lines[2]);
        assert!(lines[3].starts_with("Por local, São Paulo lidera"), "{}", lines[3]);
    }

    #[test]
    fn new_fn_rejects_table_without_dataset_columns() {
        let table = load(Dataset::Cars);
        let err = Report::new(&table, Dataset::Confectionery).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("CATEGORIA"), "{msg}");
        assert!(msg.contains("DESCRICAO") && msg.contains("LOCAL"), "{msg}");

        let table = load(Dataset::Confectionery);
        let err = Report::new(&table, Dataset::Cars).unwrap_err();
        assert!(err.to_string().contains("MODELO"), "{err}");
    }

    #[test]
    fn conclusions_handle_first_year_without_revenue() {
        let data = "DATA;MODELO;VENDEDOR;CONCESSIONARIA;QTD;VALOR_UNIT;VALOR_TOTAL\n\
                    01/01/2024;Brinde;Ana;Centro;1;0,0;0,0\n\
                    01/01/2025;Onix;Ana;Centro;1;100,0;100,0\n";
        let table = SalesTable::from_bytes(data.as_bytes(), UTF_8).unwrap();
        let report = Report::new(&table, Dataset::Cars).unwrap();
        let lines = report.conclusions();
        assert_eq!(
            lines[0],
            "A receita foi de R$ 0.00 em 2024 para R$ 100.00 em 2025 (ver gráfico anual)."
        );
        assert!(lines.iter().all(|l| !l.contains("inf")), "{lines:?}");
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render(Dataset::Cars).0, render(Dataset::Cars).0);
    }
}

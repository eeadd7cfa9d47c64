//! Plot renderer: stacked-area chart of the generation mix with an optional
//! consumption overlay.
//!
//! Band geometry is computed separately from drawing so the cumulative stack
//! can be checked without a backend. All styling is threaded through
//! [`PlotStyle`]; nothing touches process-wide state, so re-rendering the
//! same inputs yields the same chart.

use std::collections::HashMap;
use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use plotters::coord::types::RangedDateTime;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use crate::error::PlotError;
use crate::palette::{self, LOAD_DISPLAY_NAME, TOTAL_LOAD};
use crate::table::HourlyTable;

/// What to draw: the columns to stack (bottom to top, in this order), scale
/// factors, optional inclusive calendar-day bounds, a title and the
/// consumption overlay switch.
#[derive(Debug, Clone)]
pub struct PlotSpec {
    /// Stack order is caller-visible contract: the first column sits at the
    /// bottom of the stack.
    pub columns: Vec<String>,
    /// Multiplicative factors applied to named columns before stacking. Keys
    /// naming no table column are ignored; an empty map means no scaling.
    pub scale_factors: HashMap<String, f64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub title: String,
    /// Draw the `TotalLoad` column as a dashed line above the stack.
    pub draw_load: bool,
}

impl PlotSpec {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            scale_factors: HashMap::new(),
            start: None,
            end: None,
            title: "Danmarks elsystem".to_string(),
            draw_load: true,
        }
    }
}

/// Chart styling, passed explicitly to every render call.
#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub font_family: String,
    pub width: u32,
    pub height: u32,
    pub title_size: u32,
    pub label_size: u32,
    pub tick_size: u32,
    pub legend_size: u32,
    /// Opacity of the stacked fills.
    pub band_alpha: f64,
    pub outline_width: u32,
    pub load_line_width: u32,
    /// Right-hand gutter reserved for the legend, in pixels.
    pub legend_gutter: u32,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            width: 1200,
            height: 600,
            title_size: 28,
            label_size: 17,
            tick_size: 15,
            legend_size: 16,
            band_alpha: 0.6,
            outline_width: 1,
            load_line_width: 2,
            legend_gutter: 220,
        }
    }
}

/// One stacked band: cumulative baseline and top per hour, in index order.
#[derive(Debug, Clone)]
struct StackedBand {
    label: String,
    color: RGBColor,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

/// Builds the cumulative stack for the selected columns in caller order.
/// Each band runs from the running baseline to baseline + value, then the
/// baseline advances by that column's values.
fn build_stack(table: &HourlyTable, spec: &PlotSpec) -> Result<Vec<StackedBand>, PlotError> {
    let mut baseline = vec![0.0; table.len()];
    let mut bands = Vec::with_capacity(spec.columns.len());
    for column in &spec.columns {
        let values = table
            .column_values(column)
            .ok_or_else(|| PlotError::MissingColumn(column.clone()))?;
        let upper: Vec<f64> = baseline.iter().zip(&values).map(|(b, v)| b + v).collect();
        bands.push(StackedBand {
            label: annotated_label(palette::series_name(column), column, &spec.scale_factors),
            color: palette::series_color(column),
            lower: std::mem::replace(&mut baseline, upper.clone()),
            upper,
        });
    }
    Ok(bands)
}

/// Display label plus a ` (×f)` suffix when the column was scaled.
fn annotated_label(base: &str, column: &str, scale_factors: &HashMap<String, f64>) -> String {
    match scale_factors.get(column) {
        Some(factor) => format!("{base} (×{factor})"),
        None => base.to_string(),
    }
}

/// Tick label format adapted to the plotted span: densest for sub-day
/// windows, coarsest beyond a year.
fn date_label_format(span: Duration) -> &'static str {
    if span <= Duration::days(1) {
        "%H:%M"
    } else if span <= Duration::days(14) {
        "%d-%m %H:%M"
    } else if span <= Duration::days(365) {
        "%d-%m-%Y"
    } else {
        "%Y-%m"
    }
}

/// Legend marker shapes, one entry per drawn series in draw order.
enum LegendEntry {
    Band { label: String, color: RGBColor },
    Load { label: String },
}

/// Renders the chart onto `area`. The chart is the side effect; the caller's
/// table is never mutated.
pub fn render<DB>(
    table: &HourlyTable,
    spec: &PlotSpec,
    style: &PlotStyle,
    area: &DrawingArea<DB, Shift>,
) -> Result<(), PlotError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    // Private copy: scaling and windowing must not leak back to the caller.
    let mut scaled = table.clone();
    for (column, factor) in &spec.scale_factors {
        scaled.scale_column(column, *factor);
    }
    let windowed = scaled.restrict(spec.start, spec.end);
    if windowed.is_empty() {
        return Err(PlotError::EmptyRange);
    }

    let bands = build_stack(&windowed, spec)?;
    let load = if spec.draw_load {
        let values = windowed
            .column_values(TOTAL_LOAD)
            .ok_or_else(|| PlotError::MissingColumn(TOTAL_LOAD.to_string()))?;
        let label = annotated_label(LOAD_DISPLAY_NAME, TOTAL_LOAD, &spec.scale_factors);
        Some((label, values))
    } else {
        None
    };

    tracing::debug!(
        rows = windowed.len(),
        series = bands.len(),
        draw_load = spec.draw_load,
        "rendering stacked balance chart"
    );

    draw(&windowed, spec, style, area, &bands, load.as_ref())
        .map_err(|e| PlotError::Backend(e.to_string()))
}

/// Renders to a file, picking the backend by extension: `.svg` gets the SVG
/// backend, anything else the bitmap backend.
pub fn render_to_file(
    table: &HourlyTable,
    spec: &PlotSpec,
    style: &PlotStyle,
    path: &Path,
) -> Result<(), PlotError> {
    let dims = (style.width, style.height);
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);
    if is_svg {
        let root = SVGBackend::new(path, dims).into_drawing_area();
        render(table, spec, style, &root)?;
        root.present().map_err(|e| PlotError::Backend(e.to_string()))
    } else {
        let root = BitMapBackend::new(path, dims).into_drawing_area();
        render(table, spec, style, &root)?;
        root.present().map_err(|e| PlotError::Backend(e.to_string()))
    }
}

fn draw<DB>(
    table: &HourlyTable,
    spec: &PlotSpec,
    style: &PlotStyle,
    area: &DrawingArea<DB, Shift>,
    bands: &[StackedBand],
    load: Option<&(String, Vec<f64>)>,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;

    let (width, _) = area.dim_in_pixel();
    let (plot_area, legend_area) =
        area.split_horizontally(width.saturating_sub(style.legend_gutter));

    // Axis extent: explicit bounds win, otherwise the data extent. The end
    // bound covers its whole calendar day.
    let first = table.first_hour().unwrap_or_default();
    let last = table.last_hour().unwrap_or_default();
    let x_min = spec
        .start
        .map(|d| d.and_time(NaiveTime::MIN))
        .unwrap_or(first);
    let mut x_max = spec
        .end
        .and_then(|d| d.succ_opt())
        .map(|d| d.and_time(NaiveTime::MIN))
        .unwrap_or(last);
    if x_max <= x_min {
        x_max = x_min + Duration::hours(1);
    }

    // Headroom: the y axis tops out at 105% of the tallest stack.
    let mut y_max = bands
        .last()
        .map(|b| b.upper.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .unwrap_or(0.0);
    if !y_max.is_finite() || y_max <= 0.0 {
        y_max = 1.0;
    }

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(&spec.title, (style.font_family.as_str(), style.title_size))
        .margin(10)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(RangedDateTime::from(x_min..x_max), 0.0..y_max * 1.05)?;

    let tick_format = date_label_format(x_max - x_min);
    chart
        .configure_mesh()
        .x_desc("Dato")
        .y_desc("Effekt (MW)")
        .x_labels(8)
        .x_label_formatter(&|dt: &NaiveDateTime| dt.format(tick_format).to_string())
        .label_style((style.font_family.as_str(), style.tick_size))
        .axis_desc_style((style.font_family.as_str(), style.label_size))
        .light_line_style(BLACK.mix(0.15))
        .draw()?;

    let hours: Vec<NaiveDateTime> = table.hours().collect();
    let mut legend = Vec::with_capacity(bands.len() + 1);

    for band in bands {
        let polygon: Vec<(NaiveDateTime, f64)> = hours
            .iter()
            .copied()
            .zip(band.upper.iter().copied())
            .chain(
                hours
                    .iter()
                    .rev()
                    .copied()
                    .zip(band.lower.iter().rev().copied()),
            )
            .collect();
        chart.draw_series(std::iter::once(Polygon::new(
            polygon,
            band.color.mix(style.band_alpha).filled(),
        )))?;
        chart.draw_series(LineSeries::new(
            hours.iter().copied().zip(band.upper.iter().copied()),
            BLACK.stroke_width(style.outline_width),
        ))?;
        legend.push(LegendEntry::Band {
            label: band.label.clone(),
            color: band.color,
        });
    }

    // Consumption goes on top of the stack, dashed.
    if let Some((label, values)) = load {
        chart.draw_series(DashedLineSeries::new(
            hours.iter().copied().zip(values.iter().copied()),
            8,
            5,
            BLACK.stroke_width(style.load_line_width),
        ))?;
        legend.push(LegendEntry::Load {
            label: label.clone(),
        });
    }

    draw_legend(&legend_area, &legend, style)
}

/// Legend lives outside the plot area in the reserved right gutter,
/// upper-left anchored, one swatch per series in draw order.
fn draw_legend<DB>(
    legend_area: &DrawingArea<DB, Shift>,
    entries: &[LegendEntry],
    style: &PlotStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let text_style = (style.font_family.as_str(), style.legend_size)
        .into_font()
        .color(&BLACK);
    let row_height = style.legend_size as i32 + 10;
    for (i, entry) in entries.iter().enumerate() {
        let y = 44 + i as i32 * row_height;
        match entry {
            LegendEntry::Band { label, color } => {
                legend_area.draw(&Rectangle::new(
                    [(8, y - 7), (28, y + 7)],
                    color.mix(style.band_alpha).filled(),
                ))?;
                legend_area.draw(&Text::new(
                    label.clone(),
                    (34, y - style.legend_size as i32 / 2),
                    text_style.clone(),
                ))?;
            }
            LegendEntry::Load { label } => {
                legend_area.draw(&PathElement::new(
                    vec![(8, y), (16, y)],
                    BLACK.stroke_width(style.load_line_width),
                ))?;
                legend_area.draw(&PathElement::new(
                    vec![(20, y), (28, y)],
                    BLACK.stroke_width(style.load_line_width),
                ))?;
                legend_area.draw(&Text::new(
                    label.clone(),
                    (34, y - style.legend_size as i32 / 2),
                    text_style.clone(),
                ))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn two_column_table() -> HourlyTable {
        let mut t = HourlyTable::new();
        t.add(hour(1, 0), "A", 3.0);
        t.add(hour(1, 0), "B", 4.0);
        t.add(hour(1, 1), "A", 1.0);
        t.add(hour(1, 1), "B", 2.0);
        t
    }

    #[test]
    fn stack_tops_accumulate_in_caller_order() {
        let table = two_column_table();
        let spec = PlotSpec::new(["A", "B"]);
        let bands = build_stack(&table, &spec).unwrap();
        assert_eq!(bands[0].upper[0], 3.0);
        assert_eq!(bands[1].lower[0], 3.0);
        assert_eq!(bands[1].upper[0], 7.0);
    }

    #[test]
    fn reversing_columns_reverses_the_stack() {
        let table = two_column_table();
        let spec = PlotSpec::new(["B", "A"]);
        let bands = build_stack(&table, &spec).unwrap();
        assert_eq!(bands[0].upper[0], 4.0);
        assert_eq!(bands[1].upper[0], 7.0);
    }

    #[test]
    fn scale_factors_feed_the_stack() {
        let table = two_column_table();
        let mut spec = PlotSpec::new(["A", "B"]);
        spec.scale_factors.insert("A".to_string(), 2.0);
        let mut scaled = table.clone();
        for (column, factor) in &spec.scale_factors {
            scaled.scale_column(column, *factor);
        }
        let bands = build_stack(&scaled, &spec).unwrap();
        assert_eq!(bands[0].upper[0], 6.0);
        assert_eq!(bands[1].upper[0], 10.0);
    }

    #[test]
    fn missing_stack_column_is_reported() {
        let table = two_column_table();
        let spec = PlotSpec::new(["A", "C"]);
        let err = build_stack(&table, &spec).unwrap_err();
        assert!(matches!(err, PlotError::MissingColumn(c) if c == "C"));
    }

    #[test]
    fn scaled_series_label_carries_the_factor() {
        let mut factors = HashMap::new();
        factors.insert("SolarPower".to_string(), 0.5);
        assert_eq!(
            annotated_label(palette::series_name("SolarPower"), "SolarPower", &factors),
            "Sol (×0.5)"
        );
        assert_eq!(
            annotated_label(palette::series_name("SolarPower"), "SolarPower", &HashMap::new()),
            "Sol"
        );
    }

    #[test]
    fn unrecognized_column_keeps_its_raw_name() {
        assert_eq!(
            annotated_label(palette::series_name("HydroPower"), "HydroPower", &HashMap::new()),
            "HydroPower"
        );
    }

    #[test]
    fn date_format_tracks_the_span() {
        assert_eq!(date_label_format(Duration::hours(12)), "%H:%M");
        assert_eq!(date_label_format(Duration::days(1)), "%H:%M");
        assert_eq!(date_label_format(Duration::days(10)), "%d-%m %H:%M");
        assert_eq!(date_label_format(Duration::days(14)), "%d-%m %H:%M");
        assert_eq!(date_label_format(Duration::days(20)), "%d-%m-%Y");
        assert_eq!(date_label_format(Duration::days(365)), "%d-%m-%Y");
        assert_eq!(date_label_format(Duration::days(400)), "%Y-%m");
    }

    #[test]
    fn empty_window_is_rejected_before_drawing() {
        let table = two_column_table();
        let mut spec = PlotSpec::new(["A"]);
        spec.draw_load = false;
        spec.start = NaiveDate::from_ymd_opt(2024, 3, 1);
        spec.end = NaiveDate::from_ymd_opt(2024, 3, 2);
        let mut buffer = String::new();
        {
            let root = SVGBackend::with_string(&mut buffer, (640, 480)).into_drawing_area();
            let err = render(&table, &spec, &PlotStyle::default(), &root).unwrap_err();
            assert!(matches!(err, PlotError::EmptyRange));
        }
    }

    #[test]
    fn missing_load_column_is_reported_when_overlay_enabled() {
        let table = two_column_table();
        let spec = PlotSpec::new(["A"]);
        let mut buffer = String::new();
        {
            let root = SVGBackend::with_string(&mut buffer, (640, 480)).into_drawing_area();
            let err = render(&table, &spec, &PlotStyle::default(), &root).unwrap_err();
            assert!(matches!(err, PlotError::MissingColumn(c) if c == TOTAL_LOAD));
        }
    }

    #[test]
    fn renderer_leaves_the_callers_table_untouched() {
        let mut table = two_column_table();
        table.add(hour(1, 0), TOTAL_LOAD, 9.0);
        table.add(hour(1, 1), TOTAL_LOAD, 9.0);
        let before = table.clone();

        let mut spec = PlotSpec::new(["A", "B"]);
        spec.scale_factors.insert("A".to_string(), 2.0);
        let mut buffer = String::new();
        {
            let root = SVGBackend::with_string(&mut buffer, (640, 480)).into_drawing_area();
            let _ = render(&table, &spec, &PlotStyle::default(), &root);
        }
        assert_eq!(table, before);
    }

    #[test]
    fn render_to_svg_draws_stack_and_load_labels() -> anyhow::Result<()> {
        let mut table = HourlyTable::new();
        for h in 0..24 {
            table.add(hour(1, h), "SolarPower", 100.0 + h as f64);
            table.add(hour(1, h), "OnshoreWindPower", 400.0);
            table.add(hour(1, h), TOTAL_LOAD, 900.0);
        }
        let spec = PlotSpec::new(["SolarPower", "OnshoreWindPower"]);
        let mut buffer = String::new();
        {
            let root = SVGBackend::with_string(&mut buffer, (1200, 600)).into_drawing_area();
            render(&table, &spec, &PlotStyle::default(), &root)?;
            root.present()
                .map_err(|e| PlotError::Backend(e.to_string()))?;
        }
        assert!(buffer.contains("<svg"));
        assert!(buffer.contains("Sol"));
        assert!(buffer.contains("Landvind"));
        assert!(buffer.contains("Forbrug"));
        Ok(())
    }

    #[test]
    fn identical_inputs_render_identical_output() -> anyhow::Result<()> {
        let mut table = HourlyTable::new();
        for h in 0..6 {
            table.add(hour(1, h), "SolarPower", 10.0 * h as f64);
            table.add(hour(1, h), TOTAL_LOAD, 80.0);
        }
        let spec = PlotSpec::new(["SolarPower"]);
        let style = PlotStyle::default();

        let mut first = String::new();
        {
            let root = SVGBackend::with_string(&mut first, (800, 400)).into_drawing_area();
            render(&table, &spec, &style, &root)?;
            root.present()
                .map_err(|e| PlotError::Backend(e.to_string()))?;
        }
        let mut second = String::new();
        {
            let root = SVGBackend::with_string(&mut second, (800, 400)).into_drawing_area();
            render(&table, &spec, &style, &root)?;
            root.present()
                .map_err(|e| PlotError::Backend(e.to_string()))?;
        }
        assert_eq!(first, second);
        Ok(())
    }
}

//! PNG rendering of the trajectory and robustness charts.

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::ranged1d::Ranged;
use plotters::coord::types::RangedCoordf64;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use crate::config::ReportConfig;
use crate::series::StrategySeries;
use crate::SeedGapError;

const FONT: &str = "sans-serif";
const TITLE_PT: f64 = 14.0;
const LABEL_PT: f64 = 12.0;
const TICK_PT: f64 = 10.0;
const LINE_PT: f64 = 2.5;
const AXIS_PT: f64 = 1.2;
const BAND_ALPHA: f64 = 0.2;

/// matplotlib's `tab10` cycle.
const TAB10: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

/// Figure size in inches at a fixed DPI; point sizes scale with it.
#[derive(Debug, Clone, Copy)]
pub struct Figure {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
}

impl Figure {
    pub fn new(width_in: f64, height_in: f64, dpi: u32) -> Self {
        Self {
            width_in,
            height_in,
            dpi,
        }
    }

    pub fn size_px(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi as f64).round() as u32,
            (self.height_in * self.dpi as f64).round() as u32,
        )
    }

    /// Convert typographic points to pixels.
    pub fn px(&self, pt: f64) -> u32 {
        ((pt * self.dpi as f64 / 72.0).round() as u32).max(1)
    }

    fn font(&self, pt: f64) -> FontDesc<'static> {
        (FONT, self.px(pt) as f64).into_font()
    }
}

/// Label to colour assignment shared by every chart of a report.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<(String, RGBColor)>,
}

impl Palette {
    pub fn tab10(labels: &[String]) -> Self {
        let entries = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), TAB10[i % TAB10.len()]))
            .collect();
        Self { entries }
    }

    pub fn color(&self, label: &str) -> RGBColor {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(TAB10[7])
    }
}

fn plot_err<E>(err: DrawingAreaErrorKind<E>) -> SeedGapError
where
    E: std::error::Error + Send + Sync,
{
    SeedGapError::Plot(err.to_string())
}

/// Band, line, markers and legend entry for every series.
///
/// `floor` clamps the lower band edge, which keeps log axes finite.
fn draw_strategy_series<'a, DB, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, Y>>,
    series: &[StrategySeries],
    palette: &Palette,
    fig: &Figure,
    marker_pt: f64,
    floor: f64,
) -> Result<(), SeedGapError>
where
    DB: DrawingBackend + 'a,
    Y: Ranged<ValueType = f64>,
{
    for s in series {
        let color = palette.color(&s.label);

        if s.points.len() > 1 && s.points.iter().any(|p| p.sd.is_some()) {
            let mut band: Vec<(f64, f64)> = s.points.iter().map(|p| (p.x, p.upper())).collect();
            band.extend(s.points.iter().rev().map(|p| (p.x, p.lower().max(floor))));
            chart
                .draw_series(std::iter::once(Polygon::new(
                    band,
                    color.mix(BAND_ALPHA).filled(),
                )))
                .map_err(plot_err)?;
        }

        let line = color.stroke_width(fig.px(LINE_PT));
        let legend_len = fig.px(20.0) as i32;
        chart
            .draw_series(LineSeries::new(
                s.points.iter().map(|p| (p.x, p.mean)),
                line,
            ))
            .map_err(plot_err)?
            .label(s.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + legend_len, y)], line));

        let radius = fig.px(marker_pt / 2.0);
        chart
            .draw_series(
                s.points
                    .iter()
                    .map(|p| Circle::new((p.x, p.mean), radius, color.filled())),
            )
            .map_err(plot_err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .margin(fig.px(6.0))
        .label_font(fig.font(LABEL_PT))
        .background_style(&WHITE.mix(0.9))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;
    Ok(())
}

fn log_bounds(series: &[StrategySeries]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for p in series.iter().flat_map(|s| &s.points) {
        let low = if p.lower() > 0.0 { p.lower() } else { p.mean };
        lo = lo.min(low);
        hi = hi.max(p.upper());
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.1, 1.0);
    }
    let (lo, hi) = (lo * 0.9, hi * 1.1);
    if hi <= lo {
        (lo, lo * 10.0)
    } else {
        (lo, hi)
    }
}

/// Built-in y label of the trajectory chart.
///
/// Empty when ticks are configured: log axes always emit key points, so the
/// labels are blanked and the configured ticks are drawn by hand.
fn trajectory_y_label(v: f64, custom_ticks: bool) -> String {
    if custom_ticks {
        String::new()
    } else {
        format!("{v:.2}")
    }
}

/// Error over query count on a logarithmic y axis.
pub fn render_trajectory(
    path: &Path,
    series: &[StrategySeries],
    palette: &Palette,
    cfg: &ReportConfig,
) -> Result<(), SeedGapError> {
    let fig = Figure::new(12.0, 7.0, cfg.dpi);
    // Non-positive means have no place on a log axis.
    let series: Vec<StrategySeries> = series
        .iter()
        .map(|s| StrategySeries {
            label: s.label.clone(),
            points: s.points.iter().copied().filter(|p| p.mean > 0.0).collect(),
        })
        .filter(|s| !s.points.is_empty())
        .collect();
    let (y_lo, y_hi) = log_bounds(&series);

    let root = BitMapBackend::new(path, fig.size_px()).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Performance of Different Acquisition Strategies",
            fig.font(TITLE_PT),
        )
        .margin(fig.px(10.0))
        .x_label_area_size(fig.px(36.0))
        .y_label_area_size(fig.px(48.0))
        .build_cartesian_2d(0.0..cfg.max_queries as f64, (y_lo..y_hi).log_scale())
        .map_err(plot_err)?;

    let ticks: Vec<f64> = cfg
        .trajectory_y_ticks
        .iter()
        .flatten()
        .copied()
        .filter(|t| *t >= y_lo && *t <= y_hi)
        .collect();

    let custom_ticks = cfg.trajectory_y_ticks.is_some();
    let y_fmt = |v: &f64| trajectory_y_label(*v, custom_ticks);
    chart
        .configure_mesh()
        .disable_mesh()
        .axis_style(BLACK.stroke_width(fig.px(AXIS_PT)))
        .label_style(fig.font(TICK_PT))
        .axis_desc_style(fig.font(LABEL_PT))
        .x_desc("Number of Queries")
        .y_desc("MSE (Log Scale)")
        .y_label_formatter(&y_fmt)
        .draw()
        .map_err(plot_err)?;

    if !ticks.is_empty() {
        let tick_len = fig.px(4.0) as i32;
        let style = TextStyle::from(fig.font(TICK_PT)).pos(Pos::new(HPos::Right, VPos::Center));
        for t in &ticks {
            let (px, py) = chart.backend_coord(&(0.0, *t));
            root.draw(&PathElement::new(
                vec![(px - tick_len, py), (px, py)],
                BLACK.stroke_width(fig.px(AXIS_PT)),
            ))
            .map_err(plot_err)?;
            root.draw(&Text::new(format!("{t}"), (px - 2 * tick_len, py), style.clone()))
                .map_err(plot_err)?;
        }
    }

    draw_strategy_series(&mut chart, &series, palette, &fig, 8.0, y_lo)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Error at the final query count against latent variance, linear axes from zero.
pub fn render_robustness(
    path: &Path,
    series: &[StrategySeries],
    palette: &Palette,
    cfg: &ReportConfig,
    seed_count: usize,
) -> Result<(), SeedGapError> {
    let fig = Figure::new(10.0, 6.0, cfg.dpi);

    let xs = series.iter().flat_map(|s| &s.points).map(|p| p.x);
    let (x_min, x_max) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
        (lo.min(x), hi.max(x))
    });
    let (x_lo, x_hi) = if !x_min.is_finite() || !x_max.is_finite() {
        (0.0, 1.0)
    } else if (x_max - x_min).abs() < 1e-12 {
        (x_min - 0.01, x_max + 0.01)
    } else {
        let pad = 0.05 * (x_max - x_min);
        (x_min - pad, x_max + pad)
    };
    let y_max = series
        .iter()
        .flat_map(|s| &s.points)
        .map(|p| p.upper())
        .fold(0.0f64, f64::max);
    let y_hi = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let root = BitMapBackend::new(path, fig.size_px()).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "Final Robustness at {} Queries (Top {} Seeds)",
                cfg.final_query, seed_count
            ),
            fig.font(TITLE_PT),
        )
        .margin(fig.px(10.0))
        .x_label_area_size(fig.px(36.0))
        .y_label_area_size(fig.px(48.0))
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)
        .map_err(plot_err)?;

    let x_fmt = |v: &f64| format!("{v:.3}");
    chart
        .configure_mesh()
        .disable_mesh()
        .axis_style(BLACK.stroke_width(fig.px(AXIS_PT)))
        .label_style(fig.font(TICK_PT))
        .axis_desc_style(fig.font(LABEL_PT))
        .x_desc("Target Latent Variance (U_var)")
        .y_desc("MSE")
        .x_label_formatter(&x_fmt)
        .draw()
        .map_err(plot_err)?;

    draw_strategy_series(&mut chart, series, palette, &fig, 10.0, 0.0)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SeriesPoint;

    fn point(x: f64, mean: f64, sd: Option<f64>) -> SeriesPoint {
        SeriesPoint { x, mean, sd, n: 2 }
    }

    #[test]
    fn figure_scales_with_dpi() {
        let fig = Figure::new(12.0, 7.0, 300);
        assert_eq!(fig.size_px(), (3600, 2100));
        assert_eq!(fig.px(72.0), 300);
        assert_eq!(Figure::new(1.0, 1.0, 1).px(0.1), 1);
    }

    #[test]
    fn palette_is_stable_and_cycles() {
        let labels: Vec<String> = (0..11).map(|i| format!("s{i}")).collect();
        let palette = Palette::tab10(&labels);
        assert_eq!(palette.color("s0"), TAB10[0]);
        assert_eq!(palette.color("s10"), TAB10[0]);
        assert_eq!(palette.color("unknown"), TAB10[7]);
    }

    #[test]
    fn log_bounds_skip_non_positive_lower_edges() {
        let series = vec![StrategySeries {
            label: "a".into(),
            points: vec![point(1.0, 0.5, Some(1.0)), point(2.0, 2.0, Some(0.5))],
        }];
        let (lo, hi) = log_bounds(&series);
        assert!(lo > 0.0);
        assert!((lo - 0.45).abs() < 1e-12);
        assert!((hi - 2.75).abs() < 1e-12);
    }

    #[test]
    fn log_bounds_default_when_empty() {
        assert_eq!(log_bounds(&[]), (0.1, 1.0));
    }

    #[test]
    fn custom_ticks_blank_builtin_labels() {
        assert_eq!(trajectory_y_label(1.0, false), "1.00");
        assert_eq!(trajectory_y_label(1.0, true), "");
        assert_eq!(trajectory_y_label(0.3, true), "");
    }

    fn two_strategies() -> Vec<StrategySeries> {
        vec![
            StrategySeries {
                label: "Random".into(),
                points: vec![point(5.0, 1.2, Some(0.2)), point(45.0, 0.6, Some(0.1))],
            },
            StrategySeries {
                label: "CME uncertainty".into(),
                points: vec![point(5.0, 0.9, Some(0.3)), point(45.0, 0.25, None)],
            },
        ]
    }

    #[test]
    fn trajectory_with_custom_ticks_renders() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = crate::Config::preset(crate::Variant::Continuous).report;
        cfg.dpi = 30;
        let series = two_strategies();
        let labels: Vec<String> = series.iter().map(|s| s.label.clone()).collect();
        let palette = Palette::tab10(&labels);

        let path = dir.path().join("ticks.png");
        render_trajectory(&path, &series, &palette, &cfg).unwrap();
        assert!(path.metadata().unwrap().len() > 0);

        // A tick outside the data range leaves the axis without labels.
        cfg.trajectory_y_ticks = Some(vec![0.123]);
        let path = dir.path().join("out_of_range.png");
        render_trajectory(&path, &series, &palette, &cfg).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn robustness_renders_single_variance() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = crate::Config::default().report;
        cfg.dpi = 30;
        let series = vec![StrategySeries {
            label: "Random".into(),
            points: vec![point(0.05, 0.4, Some(0.1))],
        }];
        let path = dir.path().join("robustness.png");
        let palette = Palette::tab10(&["Random".to_string()]);
        render_robustness(&path, &series, &palette, &cfg, 1).unwrap();
        assert!(path.exists());
    }
}

//! Histogram rendering: an SVG line plot and a terminal bar chart.

use super::Histogram;
use std::fmt::Write;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 50.0;

/// Line plot of bin center against count.
pub fn render_svg(hist: &Histogram, title: &str) -> String {
    let mut svg = String::new();
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" viewBox=\"0 0 {WIDTH} {HEIGHT}\">"
    );
    svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");
    let _ = writeln!(
        svg,
        "  <text x=\"{:.1}\" y=\"25\" text-anchor=\"middle\" font-family=\"monospace\" font-size=\"14\">{}</text>",
        WIDTH / 2.0,
        escape(title)
    );

    let (x0, x1) = (MARGIN, WIDTH - MARGIN);
    let (y0, y1) = (HEIGHT - MARGIN, MARGIN);
    let _ = writeln!(svg, "  <line x1=\"{x0}\" y1=\"{y0}\" x2=\"{x1}\" y2=\"{y0}\" stroke=\"#333\"/>");
    let _ = writeln!(svg, "  <line x1=\"{x0}\" y1=\"{y0}\" x2=\"{x0}\" y2=\"{y1}\" stroke=\"#333\"/>");

    if !hist.is_empty() {
        let min_x = hist.x.iter().copied().fold(f32::INFINITY, f32::min) as f64;
        let max_x = hist.x.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
        let max_y = hist.y.iter().copied().max().unwrap_or(0).max(1) as f64;
        let span = if max_x > min_x { max_x - min_x } else { 1.0 };

        let points: Vec<String> = hist
            .x
            .iter()
            .zip(&hist.y)
            .map(|(&x, &y)| {
                let px = x0 + (x as f64 - min_x) / span * (x1 - x0);
                let py = y0 - y as f64 / max_y * (y0 - y1);
                format!("{px:.2},{py:.2}")
            })
            .collect();
        let _ = writeln!(
            svg,
            "  <polyline fill=\"none\" stroke=\"#1f77b4\" stroke-width=\"1.5\" points=\"{}\"/>",
            points.join(" ")
        );

        let label = "font-family=\"monospace\" font-size=\"11\"";
        let _ = writeln!(svg, "  <text x=\"{x0}\" y=\"{:.1}\" {label}>{min_x:.4}</text>", y0 + 18.0);
        let _ = writeln!(
            svg,
            "  <text x=\"{x1}\" y=\"{:.1}\" text-anchor=\"end\" {label}>{max_x:.4}</text>",
            y0 + 18.0
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{y1}\" text-anchor=\"end\" {label}>{max_y}</text>",
            x0 - 6.0
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Bar chart with at most `rows` lines, merging neighbouring bins.
pub fn render_ascii(hist: &Histogram, rows: usize, width: usize) -> String {
    if hist.is_empty() || rows == 0 {
        return String::new();
    }
    let per_row = hist.len().div_ceil(rows);
    let groups: Vec<(f32, f32, u64)> = hist
        .x
        .chunks(per_row)
        .zip(hist.y.chunks(per_row))
        .map(|(xs, ys)| (xs[0], xs[xs.len() - 1], ys.iter().sum()))
        .collect();

    let max_count = groups.iter().map(|g| g.2).max().unwrap_or(0).max(1);
    let mut out = String::new();
    for (lo, hi, count) in groups {
        let bar = (count as f64 / max_count as f64 * width as f64).round() as usize;
        let _ = writeln!(out, "{lo:>10.4} .. {hi:<10.4} |{} {count}", "█".repeat(bar));
    }
    out
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

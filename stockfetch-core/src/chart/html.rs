//! Standalone HTML chart documents rendered with plotly.js.
//!
//! The figure (traces + layout) is built as JSON and embedded in a small page
//! that loads plotly.js from its CDN, so each file opens directly in a browser.

use super::sma::sma;
use super::{ChartError, ChartKind, ChartOptions, ChartRenderer};
use crate::domain::{Bar, Interval, Ticker};
use serde_json::{json, Value};

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const UP_COLOR: &str = "green";
const DOWN_COLOR: &str = "red";

/// Renders candlestick and moving-average charts as HTML pages.
#[derive(Debug, Clone, Default)]
pub struct PlotlyHtmlRenderer {
    options: ChartOptions,
}

impl PlotlyHtmlRenderer {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }

    /// Build the plotly figure for a chart kind.
    pub fn figure(&self, kind: ChartKind, bars: &[Bar], ticker: &Ticker, interval: Interval) -> Value {
        let x: Vec<String> = bars.iter().map(|b| b.label(interval)).collect();
        let include_volume = self.options.include_volume;

        let mut traces = vec![json!({
            "type": "candlestick",
            "name": "OHLC",
            "x": x,
            "open": finite(bars.iter().map(|b| b.open)),
            "high": finite(bars.iter().map(|b| b.high)),
            "low": finite(bars.iter().map(|b| b.low)),
            "close": finite(bars.iter().map(|b| b.close)),
            "xaxis": "x",
            "yaxis": "y",
        })];

        if include_volume {
            let colors: Vec<&str> = bars
                .iter()
                .map(|b| if b.is_down() { DOWN_COLOR } else { UP_COLOR })
                .collect();
            traces.push(json!({
                "type": "bar",
                "name": "Volume",
                "x": x,
                "y": bars.iter().map(|b| b.volume).collect::<Vec<_>>(),
                "marker": { "color": colors },
                "opacity": 0.5,
                "xaxis": "x",
                "yaxis": "y2",
            }));
        }

        if kind == ChartKind::Technical {
            let unit = if interval.is_intraday() { "bar" } else { "day" };
            for &period in &self.options.ma_periods {
                traces.push(json!({
                    "type": "scatter",
                    "mode": "lines",
                    "name": format!("{period}-{unit} MA"),
                    "x": x,
                    "y": finite(sma(bars, period).into_iter()),
                    "line": { "width": 1 },
                    "xaxis": "x",
                    "yaxis": "y",
                }));
            }
        }

        let title = match kind {
            ChartKind::Candlestick if include_volume => format!("{ticker} Stock Price and Volume"),
            ChartKind::Candlestick => format!("{ticker} Stock Price"),
            ChartKind::Technical => format!("{ticker} Technical Analysis"),
        };

        // 70/30 split with a small gap, price on top
        let (price_domain, volume_domain) = if include_volume {
            ([0.3, 1.0], Some([0.0, 0.27]))
        } else {
            ([0.0, 1.0], None)
        };

        let mut layout = json!({
            "title": { "text": format!("{title} ({interval})"), "x": 0.5 },
            "showlegend": true,
            "height": self.options.height,
            "margin": { "t": 100, "l": 50, "r": 50, "b": 50 },
            "paper_bgcolor": "#111111",
            "plot_bgcolor": "#111111",
            "font": { "color": "#f2f5fa" },
            "xaxis": {
                "rangeslider": { "visible": false },
                "anchor": if include_volume { "y2" } else { "y" },
                "gridcolor": "#283442",
            },
            "yaxis": { "domain": price_domain, "title": { "text": "Price" }, "gridcolor": "#283442" },
        });
        if let (Some(domain), Some(obj)) = (volume_domain, layout.as_object_mut()) {
            obj.insert(
                "yaxis2".into(),
                json!({ "domain": domain, "title": { "text": "Volume" }, "gridcolor": "#283442" }),
            );
        }

        json!({ "data": traces, "layout": layout })
    }
}

impl ChartRenderer for PlotlyHtmlRenderer {
    fn render(
        &self,
        kind: ChartKind,
        bars: &[Bar],
        ticker: &Ticker,
        interval: Interval,
    ) -> Result<String, ChartError> {
        if bars.is_empty() {
            return Err(ChartError::NoData);
        }
        let figure = self.figure(kind, bars, ticker, interval);
        let payload = serde_json::to_string(&figure)
            .map_err(|e| ChartError::Serialize(e.to_string()))?
            // keep the payload from closing the <script> element
            .replace("</", "<\\/");

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{ticker} {kind} ({interval})</title>
<script src="{PLOTLY_CDN}" charset="utf-8"></script>
<style>body {{ margin: 0; background: #111111; }}</style>
</head>
<body>
<div id="chart" style="width:100%;height:{height}px;"></div>
<script>
const figure = {payload};
Plotly.newPlot("chart", figure.data, figure.layout, {{ responsive: true }});
</script>
</body>
</html>
"#,
            kind = kind.as_str(),
            height = self.options.height,
        ))
    }
}

/// NaN and infinities become JSON null so plotly leaves a gap.
fn finite(values: impl Iterator<Item = f64>) -> Vec<Option<f64>> {
    values.map(|v| v.is_finite().then_some(v)).collect()
}

//! Chart datasets produced by the presenter, and the redraw slot that owns a
//! rendered chart.

use serde::Serialize;
use serde_json::{json, Value};

const LEGEND_COLOR: &str = "#a0a0b0";

/// Y-axis title of the AL(k) chart.
pub const AL_AXIS_TITLE: &str = "Alignment Score";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MethodColor {
    pub rgb: (u8, u8, u8),
}

impl MethodColor {
    /// Fixed colours for the well-known methods; everything else is cyan.
    pub fn for_method(method: &str) -> Self {
        let rgb = match method {
            "Base" => (239, 68, 68),
            "RAG" => (245, 158, 11),
            "PersonaSteer" => (99, 102, 241),
            "ALOE" => (16, 185, 129),
            "RLPA" => (139, 92, 246),
            _ => (6, 182, 212),
        };
        Self { rgb }
    }

    pub fn border(&self) -> String {
        let (r, g, b) = self.rgb;
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn background(&self) -> String {
        let (r, g, b) = self.rgb;
        format!("rgba({r}, {g}, {b}, 0.2)")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineDataset {
    pub label: String,
    pub data: Vec<f64>,
    pub color: MethodColor,
}

/// AL(k) time series: one dataset per method over `Turn 1..Turn n`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineChart {
    pub labels: Vec<String>,
    pub datasets: Vec<LineDataset>,
    pub y_min: f64,
    pub y_max: f64,
}

impl LineChart {
    pub fn to_chartjs(&self, y_title: &str) -> Value {
        let datasets: Vec<Value> = self
            .datasets
            .iter()
            .map(|ds| {
                json!({
                    "label": ds.label,
                    "data": ds.data,
                    "borderColor": ds.color.border(),
                    "backgroundColor": ds.color.background(),
                    "borderWidth": 3,
                    "fill": true,
                    "tension": 0.4,
                    "pointRadius": 4,
                    "pointHoverRadius": 6
                })
            })
            .collect();
        json!({
            "type": "line",
            "data": { "labels": self.labels, "datasets": datasets },
            "options": {
                "responsive": true,
                "maintainAspectRatio": true,
                "plugins": {
                    "legend": { "position": "top", "labels": { "color": LEGEND_COLOR, "font": { "size": 12 } } },
                    "tooltip": { "mode": "index", "intersect": false }
                },
                "scales": {
                    "x": { "grid": { "color": "rgba(255,255,255,0.05)" }, "ticks": { "color": LEGEND_COLOR } },
                    "y": {
                        "min": self.y_min,
                        "max": self.y_max,
                        "grid": { "color": "rgba(255,255,255,0.05)" },
                        "ticks": { "color": LEGEND_COLOR },
                        "title": { "display": true, "text": y_title, "color": LEGEND_COLOR }
                    }
                },
                "interaction": { "mode": "nearest", "axis": "x", "intersect": false }
            }
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RadarDataset {
    pub label: String,
    /// One entry per radar dimension; `None` where the server sent no value.
    pub data: Vec<Option<f64>>,
    pub color: MethodColor,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RadarChart {
    pub labels: Vec<String>,
    pub datasets: Vec<RadarDataset>,
    pub r_min: f64,
    pub r_max: f64,
}

impl RadarChart {
    pub fn to_chartjs(&self) -> Value {
        let datasets: Vec<Value> = self
            .datasets
            .iter()
            .map(|ds| {
                json!({
                    "label": ds.label,
                    "data": ds.data,
                    "borderColor": ds.color.border(),
                    "backgroundColor": ds.color.background(),
                    "borderWidth": 2,
                    "pointRadius": 4
                })
            })
            .collect();
        json!({
            "type": "radar",
            "data": { "labels": self.labels, "datasets": datasets },
            "options": {
                "responsive": true,
                "maintainAspectRatio": true,
                "plugins": {
                    "legend": { "position": "top", "labels": { "color": LEGEND_COLOR, "font": { "size": 12 } } }
                },
                "scales": {
                    "r": {
                        "min": self.r_min,
                        "max": self.r_max,
                        "grid": { "color": "rgba(255,255,255,0.1)" },
                        "angleLines": { "color": "rgba(255,255,255,0.1)" },
                        "pointLabels": { "color": LEGEND_COLOR, "font": { "size": 11 } },
                        "ticks": { "color": "#606070", "backdropColor": "transparent", "stepSize": 20 }
                    }
                }
            }
        })
    }
}

/// A rendered chart that holds resources until explicitly released.
pub trait Disposable {
    fn dispose(self);
}

/// Holds at most one rendered chart for a drawing surface.
#[derive(Debug)]
pub struct ChartSlot<H: Disposable> {
    current: Option<H>,
}

impl<H: Disposable> Default for ChartSlot<H> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<H: Disposable> ChartSlot<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_occupied(&self) -> bool {
        self.current.is_some()
    }

    /// Dispose the previous chart, then draw and keep the new one.
    pub fn redraw<F>(&mut self, draw: F)
    where
        F: FnOnce() -> Option<H>,
    {
        self.clear();
        self.current = draw();
    }

    pub fn clear(&mut self) {
        if let Some(old) = self.current.take() {
            old.dispose();
        }
    }
}

impl<H: Disposable> Drop for ChartSlot<H> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Handle {
        id: u32,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Disposable for Handle {
        fn dispose(self) {
            self.log.borrow_mut().push(format!("dispose {}", self.id));
        }
    }

    #[test]
    fn redraw_disposes_previous_before_drawing() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut slot = ChartSlot::new();
        for id in 0..3 {
            let log_draw = log.clone();
            slot.redraw(|| {
                log_draw.borrow_mut().push(format!("draw {id}"));
                Some(Handle { id, log: log_draw.clone() })
            });
        }
        assert_eq!(
            *log.borrow(),
            vec!["draw 0", "dispose 0", "draw 1", "dispose 1", "draw 2"]
        );
        drop(slot);
        assert_eq!(log.borrow().last().map(String::as_str), Some("dispose 2"));
    }

    #[test]
    fn colours_match_palette() {
        assert_eq!(MethodColor::for_method("RAG").border(), "#f59e0b");
        assert_eq!(MethodColor::for_method("Base").background(), "rgba(239, 68, 68, 0.2)");
        assert_eq!(MethodColor::for_method("Mine").border(), "#06b6d4");
    }

    #[test]
    fn radar_gaps_become_null() {
        let chart = RadarChart {
            labels: vec!["AVG".into(), "N_IR".into()],
            datasets: vec![RadarDataset {
                label: "RAG".into(),
                data: vec![Some(80.0), None],
                color: MethodColor::for_method("RAG"),
            }],
            r_min: 0.0,
            r_max: 100.0,
        };
        let config = chart.to_chartjs();
        assert_eq!(config["data"]["datasets"][0]["data"], json!([80.0, null]));
        assert_eq!(config["options"]["scales"]["r"]["max"], json!(100.0));
    }
}

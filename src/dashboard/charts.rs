//! Chart slots and their Chart.js configurations.
//!
//! Each of the three charts owns one slot in the [`ChartRegistry`]. A render
//! destroys whatever instance the slot holds and binds a fresh one to the
//! slot's canvas; nothing is patched in place. The configuration is written
//! to the canvas's `data-chart-config` attribute, where the served page's
//! bootstrap script hands it to Chart.js.

use std::collections::HashMap;

use serde::Serialize;

use crate::api::types::{CancellationResponse, NotificationResponse, RevenueResponse};
use crate::dom::{Document, NodeId};
use crate::utils::format::{format_number, format_plain_number};

/// Attribute carrying the serialized configuration.
pub const CONFIG_ATTR: &str = "data-chart-config";

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartSlot {
    Revenue,
    Cancellation,
    Notification,
}

impl ChartSlot {
    pub const ALL: [ChartSlot; 3] = [Self::Revenue, Self::Cancellation, Self::Notification];

    pub fn canvas_id(self) -> &'static str {
        match self {
            Self::Revenue => "revenue-chart",
            Self::Cancellation => "cancellation-chart",
            Self::Notification => "notification-chart",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Revenue => "月次収益推移",
            Self::Cancellation => "月次解約率推移",
            Self::Notification => "日次通知送信数",
        }
    }

    pub fn dataset_label(self) -> &'static str {
        match self {
            Self::Revenue => "月次収益",
            Self::Cancellation => "解約率",
            Self::Notification => "通知送信数",
        }
    }

    fn chart_type(self) -> &'static str {
        match self {
            Self::Revenue | Self::Cancellation => "line",
            Self::Notification => "bar",
        }
    }

    fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Revenue => (75, 192, 192),
            Self::Cancellation => (255, 99, 132),
            Self::Notification => (54, 162, 235),
        }
    }

    pub fn tick_format(self) -> TickFormat {
        match self {
            Self::Revenue => TickFormat::Yen,
            Self::Cancellation => TickFormat::Percent,
            Self::Notification => TickFormat::Plain,
        }
    }
}

/// How y-axis tick values are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TickFormat {
    /// `¥1,234`
    Yen,
    /// `12.5%`
    Percent,
    Plain,
}

impl TickFormat {
    pub fn apply(self, value: f64) -> String {
        match self {
            Self::Yen => format!("¥{}", format_number(value)),
            Self::Percent => format!("{}%", format_plain_number(value)),
            Self::Plain => format_plain_number(value),
        }
    }
}

// ---------------------------------------------------------------------------
// Chart.js configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub data: ChartData,
    pub options: ChartOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub border_color: String,
    pub background_color: String,
    pub tension: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub responsive: bool,
    pub plugins: Plugins,
    pub scales: Scales,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plugins {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub display: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scales {
    pub y: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    pub begin_at_zero: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticks: Option<Ticks>,
}

/// Tick labelling; the page script turns `format` into a callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticks {
    pub format: TickFormat,
}

impl ChartConfig {
    /// Configuration for `slot` over the given series.
    pub fn for_slot(slot: ChartSlot, labels: Vec<String>, values: Vec<f64>) -> Self {
        let (r, g, b) = slot.rgb();
        let ticks = match slot.tick_format() {
            TickFormat::Plain => None,
            format => Some(Ticks { format }),
        };

        Self {
            chart_type: slot.chart_type().to_string(),
            data: ChartData {
                labels,
                datasets: vec![Dataset {
                    label: slot.dataset_label().to_string(),
                    data: values,
                    border_color: format!("rgb({r}, {g}, {b})"),
                    background_color: format!("rgba({r}, {g}, {b}, 0.2)"),
                    tension: 0.1,
                }],
            },
            options: ChartOptions {
                responsive: true,
                plugins: Plugins {
                    title: Title {
                        display: true,
                        text: slot.title().to_string(),
                    },
                },
                scales: Scales {
                    y: Axis {
                        begin_at_zero: true,
                        ticks,
                    },
                },
            },
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.data.labels
    }

    pub fn values(&self) -> &[f64] {
        self.data
            .datasets
            .first()
            .map(|d| d.data.as_slice())
            .unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// A chart bound to a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartInstance {
    /// Monotonic per registry; a new instance always gets a new id.
    pub id: u64,
    pub slot: ChartSlot,
    pub canvas: NodeId,
    pub config: ChartConfig,
}

/// One held chart instance per slot.
#[derive(Debug, Default)]
pub struct ChartRegistry {
    slots: HashMap<ChartSlot, ChartInstance>,
    next_id: u64,
    destroyed: u64,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: ChartSlot) -> Option<&ChartInstance> {
        self.slots.get(&slot)
    }

    /// Destroy the slot's instance; a no-op when the slot is empty.
    pub fn destroy(&mut self, slot: ChartSlot) -> Option<ChartInstance> {
        let old = self.slots.remove(&slot);
        if old.is_some() {
            self.destroyed += 1;
        }
        old
    }

    /// Destroy the slot's instance and hold a new one in its place.
    pub fn replace(&mut self, slot: ChartSlot, canvas: NodeId, config: ChartConfig) -> u64 {
        self.destroy(slot);
        self.next_id += 1;
        self.slots.insert(
            slot,
            ChartInstance {
                id: self.next_id,
                slot,
                canvas,
                config,
            },
        );
        self.next_id
    }

    /// Number of instances destroyed over the registry's lifetime.
    pub fn destroyed_count(&self) -> u64 {
        self.destroyed
    }
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

/// Bind a new chart for `slot` to its canvas. Returns `false` (and leaves the
/// registry untouched) when the canvas is missing.
pub fn render_chart(
    doc: &mut Document,
    charts: &mut ChartRegistry,
    slot: ChartSlot,
    labels: Vec<String>,
    values: Vec<f64>,
) -> bool {
    let Some(canvas) = doc.get_element_by_id(slot.canvas_id()) else {
        return false;
    };

    let config = ChartConfig::for_slot(slot, labels, values);
    let json = serde_json::to_string(&config).unwrap_or_default();
    let id = charts.replace(slot, canvas, config);

    doc.set_attr(canvas, CONFIG_ATTR, json);
    doc.set_attr(canvas, "data-chart-id", id.to_string());
    true
}

pub fn update_revenue_chart(doc: &mut Document, charts: &mut ChartRegistry, data: &RevenueResponse) {
    if !data.success {
        return;
    }
    let (labels, values) = data
        .monthly_revenue
        .iter()
        .map(|item| (item.month.clone(), item.revenue))
        .unzip();
    render_chart(doc, charts, ChartSlot::Revenue, labels, values);
}

pub fn update_cancellation_chart(
    doc: &mut Document,
    charts: &mut ChartRegistry,
    data: &CancellationResponse,
) {
    if !data.success {
        return;
    }
    let (labels, values) = data
        .monthly_cancellations
        .iter()
        .map(|item| (item.month.clone(), item.cancellation_rate))
        .unzip();
    render_chart(doc, charts, ChartSlot::Cancellation, labels, values);
}

pub fn update_notification_chart(
    doc: &mut Document,
    charts: &mut ChartRegistry,
    data: &NotificationResponse,
) {
    if !data.success {
        return;
    }
    let (labels, values) = data
        .daily_notifications
        .iter()
        .map(|item| (item.date.clone(), item.count))
        .unzip();
    render_chart(doc, charts, ChartSlot::Notification, labels, values);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
